//! Type-keyed translator table with declared-ancestor fallback.
//!
//! Rust has no runtime subtyping, so "ancestor" is an explicit declaration:
//! [`TranslatorRegistry::declare_ancestor`] records that values of a
//! concrete type `C` may be served by the translator of a family type `A`
//! (typically an enum or boxed contract), together with the conversions
//! between the two. Declarations are direct only; they do not chain.
//!
//! Resolution tries the exact type first. On a miss, the configured
//! [`FallbackPolicy`] decides which declared ancestor (if any) serves it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::translator::{
    AimTranslator, BlockPosTranslator, BoolTranslator, BytesTranslator, CharTranslator,
    CompoundTranslator, DynTranslator, Erased, F32Translator, F64Translator, FacingTranslator,
    I8Translator, I16Translator, I32Translator, I64Translator, ObjectLookup, TextTranslator,
    Translator, UuidTranslator, Vec3Translator,
};
use crate::tree::Tag;
use crate::type_key::TypeKey;
use crate::wire::{WireReader, WireWriter};

/// How a type with no exact translator is served.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// First registered translator (in registration order) whose type is a
    /// declared ancestor. Logs a warning when several ancestors match.
    #[default]
    FirstRegistered,
    /// First ancestor in declaration order that has a translator.
    NearestDeclared,
    /// No fallback; only exact registrations resolve.
    ExactOnly,
}

struct Entry {
    key: TypeKey,
    translator: Arc<dyn DynTranslator>,
}

type BridgeFn = dyn Fn(Arc<dyn DynTranslator>) -> Arc<dyn DynTranslator> + Send + Sync;

struct Ancestor {
    key: TypeKey,
    bridge: Arc<BridgeFn>,
}

#[derive(Default)]
struct Table {
    /// Registration order.
    entries: Vec<Entry>,
    index: HashMap<TypeId, usize>,
    /// Declared ancestors per concrete type, in declaration order.
    ancestors: HashMap<TypeId, Vec<Ancestor>>,
}

/// Maps value types to their translators.
///
/// Registration and lookup may interleave across threads; the write lock
/// is held only for the duration of a single insertion.
#[derive(Default)]
pub struct TranslatorRegistry {
    table: RwLock<Table>,
    policy: FallbackPolicy,
}

impl TranslatorRegistry {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            policy,
        }
    }

    /// A registry pre-populated with every built-in translator.
    ///
    /// `lookup` resolves object references inside aim results.
    pub fn with_builtins(policy: FallbackPolicy, lookup: Arc<dyn ObjectLookup>) -> Self {
        let registry = Self::new(policy);
        registry.register(TextTranslator);
        registry.register(I8Translator);
        registry.register(I16Translator);
        registry.register(I32Translator);
        registry.register(I64Translator);
        registry.register(F32Translator);
        registry.register(F64Translator);
        registry.register(BoolTranslator);
        registry.register(CharTranslator);
        registry.register(BytesTranslator);
        registry.register(Vec3Translator);
        registry.register(BlockPosTranslator);
        registry.register(FacingTranslator);
        registry.register(UuidTranslator);
        registry.register(AimTranslator::new(lookup));
        registry.register(CompoundTranslator);
        registry
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Register `translator` for its value type. Re-registering a type
    /// replaces the previous translator but keeps its registration position.
    pub fn register<T: Translator>(&self, translator: T) {
        let key = TypeKey::of::<T::Value>();
        let translator: Arc<dyn DynTranslator> = Arc::new(Erased(translator));

        let mut table = self.table.write();
        match table.index.get(&key.id()).copied() {
            Some(slot) => {
                log::debug!("Replacing translator for {key}");
                table.entries[slot].translator = translator;
            }
            None => {
                log::debug!("Registering translator for {key}");
                let slot = table.entries.len();
                table.entries.push(Entry { key, translator });
                table.index.insert(key.id(), slot);
            }
        }
    }

    /// Declare `A` an ancestor of `C`: a `C` with no translator of its own
    /// may be encoded as `upcast(c)` with `A`'s translator, and decoded back
    /// through `downcast`. A decoded `A` that is not a `C` is handed on
    /// unchanged, and the receiving field falls back to its default.
    pub fn declare_ancestor<C, A>(&self, upcast: fn(&C) -> A, downcast: fn(A) -> Result<C, A>)
    where
        C: 'static,
        A: 'static,
    {
        let bridge: Arc<BridgeFn> = Arc::new(
            move |inner: Arc<dyn DynTranslator>| -> Arc<dyn DynTranslator> {
                Arc::new(Bridged::<C, A> {
                    inner,
                    upcast,
                    downcast,
                })
            },
        );
        let ancestor = Ancestor {
            key: TypeKey::of::<A>(),
            bridge,
        };

        let mut table = self.table.write();
        let declared = table.ancestors.entry(TypeId::of::<C>()).or_default();
        declared.retain(|a| a.key != ancestor.key);
        declared.push(ancestor);
    }

    /// Resolve the translator serving values of type `key`.
    pub fn resolve(&self, key: TypeKey) -> CodecResult<Arc<dyn DynTranslator>> {
        let table = self.table.read();
        if let Some(&slot) = table.index.get(&key.id()) {
            return Ok(table.entries[slot].translator.clone());
        }

        let no_translator = || CodecError::NoTranslator {
            type_name: key.name(),
        };
        let declared = match (self.policy, table.ancestors.get(&key.id())) {
            (FallbackPolicy::ExactOnly, _) | (_, None) => return Err(no_translator()),
            (_, Some(declared)) => declared,
        };

        let (ancestor, entry) = match self.policy {
            FallbackPolicy::FirstRegistered => {
                let mut matches = table.entries.iter().filter_map(|entry| {
                    declared
                        .iter()
                        .find(|a| a.key == entry.key)
                        .map(|a| (a, entry))
                });
                let first = matches.next().ok_or_else(no_translator)?;
                let others: Vec<_> = matches.map(|(a, _)| a.key.name()).collect();
                if !others.is_empty() {
                    log::warn!(
                        "{key} has several registered ancestors; using {} over {}",
                        first.0.key,
                        others.join(", ")
                    );
                }
                first
            }
            FallbackPolicy::NearestDeclared => declared
                .iter()
                .find_map(|a| {
                    let slot = *table.index.get(&a.key.id())?;
                    Some((a, &table.entries[slot]))
                })
                .ok_or_else(no_translator)?,
            FallbackPolicy::ExactOnly => return Err(no_translator()),
        };

        log::debug!("Serving {key} with the translator for ancestor {}", ancestor.key);
        Ok((ancestor.bridge)(entry.translator.clone()))
    }

    /// Typed shorthand for [`resolve`](Self::resolve).
    pub fn resolve_for<V: 'static>(&self) -> CodecResult<Arc<dyn DynTranslator>> {
        self.resolve(TypeKey::of::<V>())
    }

    /// Whether an exact translator is registered for `key`.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.table.read().index.contains_key(&key.id())
    }

    /// Number of registered translators.
    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered value types, in registration order.
    pub fn registered_types(&self) -> Vec<TypeKey> {
        self.table.read().entries.iter().map(|e| e.key).collect()
    }
}

// ---------------------------------------------------------------------------
// Ancestor bridge
// ---------------------------------------------------------------------------

/// Serves a `C` through the translator of its declared ancestor `A`.
struct Bridged<C, A> {
    inner: Arc<dyn DynTranslator>,
    upcast: fn(&C) -> A,
    downcast: fn(A) -> Result<C, A>,
}

impl<C: 'static, A: 'static> Bridged<C, A> {
    fn lift(&self, value: &dyn Any) -> CodecResult<A> {
        let concrete = value
            .downcast_ref::<C>()
            .ok_or(CodecError::ValueMismatch {
                expected: std::any::type_name::<C>(),
            })?;
        Ok((self.upcast)(concrete))
    }

    fn lower(&self, decoded: Box<dyn Any>) -> CodecResult<Box<dyn Any>> {
        let family = decoded
            .downcast::<A>()
            .map_err(|_| CodecError::ValueMismatch {
                expected: std::any::type_name::<A>(),
            })?;
        Ok(match (self.downcast)(*family) {
            Ok(concrete) => Box::new(concrete),
            Err(other) => Box::new(other),
        })
    }
}

impl<C: 'static, A: 'static> DynTranslator for Bridged<C, A> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<C>()
    }

    fn encode_wire(&self, value: &dyn Any, sink: &mut WireWriter) -> CodecResult<()> {
        self.inner.encode_wire(&self.lift(value)?, sink)
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Box<dyn Any>> {
        self.lower(self.inner.decode_wire(source)?)
    }

    fn encode_tree(&self, value: &dyn Any) -> CodecResult<Option<Tag>> {
        self.inner.encode_tree(&self.lift(value)?)
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> Box<dyn Any> {
        let decoded = self.inner.decode_tree(tag);
        match decoded.downcast::<A>() {
            Ok(family) => match (self.downcast)(*family) {
                Ok(concrete) => Box::new(concrete),
                Err(other) => Box::new(other),
            },
            Err(other) => other,
        }
    }
}
