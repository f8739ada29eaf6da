//! Per-type field metadata: discovery, ordering, translator binding, caching.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CodecError, CodecResult};
use crate::record::{Assign, FieldAccess, FieldKind, FieldTable, Persist, Record};
use crate::registry::TranslatorRegistry;
use crate::translator::DynTranslator;
use crate::tree::Tag;
use crate::type_key::TypeKey;
use crate::wire::{WireReader, WireWriter};

// ---------------------------------------------------------------------------
// FieldDescriptor
// ---------------------------------------------------------------------------

/// One persisted field of a record, with its translator already bound.
pub struct FieldDescriptor {
    name: &'static str,
    declaring_type: &'static str,
    record: &'static str,
    tree: bool,
    wire: bool,
    translator: Arc<dyn DynTranslator>,
    access: Arc<dyn FieldAccess>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the record (or inherited part) that declares this field.
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    /// Whether the full-object tree codec includes this field.
    pub fn is_tree(&self) -> bool {
        self.tree
    }

    /// Whether the full-object wire codec includes this field.
    pub fn is_wire(&self) -> bool {
        self.wire
    }

    /// Declared value type of the field.
    pub fn value_type(&self) -> TypeKey {
        self.access.value_type()
    }

    pub fn translator(&self) -> &Arc<dyn DynTranslator> {
        &self.translator
    }

    fn read<'a>(&self, owner: &'a dyn Any) -> CodecResult<&'a dyn Any> {
        self.access.get(owner).ok_or(CodecError::ValueMismatch {
            expected: self.record,
        })
    }

    fn store(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> CodecResult<()> {
        match self.access.assign(owner, value) {
            Assign::Set => Ok(()),
            Assign::Substituted => {
                log::warn!(
                    "Decoded value for {}.{} is not a {}; assigned its default instead",
                    self.record,
                    self.name,
                    self.value_type()
                );
                Ok(())
            }
            Assign::WrongOwner => Err(CodecError::ValueMismatch {
                expected: self.record,
            }),
        }
    }

    pub(crate) fn encode_wire(&self, owner: &dyn Any, sink: &mut WireWriter) -> CodecResult<()> {
        self.translator.encode_wire(self.read(owner)?, sink)
    }

    pub(crate) fn decode_wire(&self, source: &mut WireReader, owner: &mut dyn Any) -> CodecResult<()> {
        let value = self.translator.decode_wire(source)?;
        self.store(owner, value)
    }

    pub(crate) fn encode_tree(&self, owner: &dyn Any) -> CodecResult<Option<Tag>> {
        self.translator.encode_tree(self.read(owner)?)
    }

    pub(crate) fn decode_tree(&self, tag: Option<&Tag>, owner: &mut dyn Any) -> CodecResult<()> {
        let value = self.translator.decode_tree(tag);
        self.store(owner, value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("tree", &self.tree)
            .field("wire", &self.wire)
            .field("value_type", &self.value_type())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TypeMetadata
// ---------------------------------------------------------------------------

/// Ordered field descriptors for one record type.
///
/// Fields are sorted by name, then declaring type. Names are unique, so the
/// order is fully determined by the field table and is identical on every
/// build. The full-object wire codec depends on this.
#[derive(Debug)]
pub struct TypeMetadata {
    type_key: TypeKey,
    record: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl TypeMetadata {
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// The record's `NAME`.
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .binary_search_by(|f| f.name.cmp(name))
            .ok()
            .map(|i| &self.fields[i])
    }

    /// Fields included by the full-object tree codec, in order.
    pub fn tree_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.tree)
    }

    /// Fields included by the full-object wire codec, in order.
    pub fn wire_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.wire)
    }
}

// ---------------------------------------------------------------------------
// FieldIntrospector
// ---------------------------------------------------------------------------

/// Builds [`TypeMetadata`] from a record's field table.
pub struct FieldIntrospector;

impl FieldIntrospector {
    /// Build metadata for `T`.
    ///
    /// Manual fields are dropped. Fields without explicit flags are dropped
    /// unless `include_unannotated` is set, in which case they persist in
    /// both formats. Every remaining field's translator is resolved now, so
    /// a missing translator fails here rather than on first use.
    pub fn build<T: Record>(
        registry: &TranslatorRegistry,
        include_unannotated: bool,
    ) -> CodecResult<TypeMetadata> {
        let mut fields = Vec::new();
        for entry in FieldTable::<T>::collect().into_entries() {
            let FieldKind::Persisted { flags, access } = entry.kind else {
                continue;
            };
            let Persist { tree, wire } = match flags {
                Some(flags) => flags,
                None if include_unannotated => Persist::BOTH,
                None => continue,
            };
            let translator = registry.resolve(access.value_type())?;
            fields.push(FieldDescriptor {
                name: entry.name,
                declaring_type: entry.declaring_type,
                record: T::NAME,
                tree,
                wire,
                translator,
                access,
            });
        }

        fields.sort_by(|a, b| {
            a.name
                .cmp(b.name)
                .then_with(|| a.declaring_type.cmp(b.declaring_type))
        });
        if let Some(pair) = fields.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(CodecError::DuplicateField {
                field: pair[0].name,
                record: T::NAME,
                first: pair[0].declaring_type,
                second: pair[1].declaring_type,
            });
        }

        log::debug!("Built metadata for {} ({} fields)", T::NAME, fields.len());
        Ok(TypeMetadata {
            type_key: TypeKey::of::<T>(),
            record: T::NAME,
            fields,
        })
    }
}

// ---------------------------------------------------------------------------
// MetadataCache
// ---------------------------------------------------------------------------

/// Whether [`MetadataCache::get_or_build`] may return an existing entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildPolicy {
    #[default]
    ReuseCached,
    /// Build afresh and replace the cached entry.
    Rebuild,
}

/// Built metadata keyed by record type.
///
/// Entries are immutable once published. A rebuild swaps in a new `Arc`,
/// so holders of the old one keep a consistent view.
#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<TypeMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Record>(&self) -> Option<Arc<TypeMetadata>> {
        self.entries.read().get(&TypeId::of::<T>()).cloned()
    }

    pub fn get_or_build<T: Record>(
        &self,
        registry: &TranslatorRegistry,
        include_unannotated: bool,
        policy: BuildPolicy,
    ) -> CodecResult<Arc<TypeMetadata>> {
        if policy == BuildPolicy::ReuseCached {
            if let Some(cached) = self.get::<T>() {
                return Ok(cached);
            }
        }

        // Built outside the lock; resolution may take the registry lock.
        let built = Arc::new(FieldIntrospector::build::<T>(registry, include_unannotated)?);

        let mut entries = self.entries.write();
        match policy {
            BuildPolicy::ReuseCached => Ok(entries
                .entry(TypeId::of::<T>())
                .or_insert(built)
                .clone()),
            BuildPolicy::Rebuild => {
                log::debug!("Replacing cached metadata for {}", T::NAME);
                entries.insert(TypeId::of::<T>(), built.clone());
                Ok(built)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FallbackPolicy;
    use crate::translator::DetachedLookup;

    fn registry() -> TranslatorRegistry {
        TranslatorRegistry::with_builtins(FallbackPolicy::default(), Arc::new(DetachedLookup))
    }

    #[derive(Default)]
    struct Base {
        zeta: i32,
        alpha: String,
    }

    impl Record for Base {
        const NAME: &'static str = "Base";

        fn describe(table: &mut FieldTable<Self>) {
            table
                .persist("zeta", Persist::WIRE_ONLY, |b| &b.zeta, |b| &mut b.zeta)
                .field("alpha", |b| &b.alpha, |b| &mut b.alpha);
        }
    }

    #[derive(Default)]
    #[allow(dead_code)]
    struct Outer {
        base: Base,
        mid: f64,
        handled: i64,
    }

    impl Record for Outer {
        const NAME: &'static str = "Outer";

        fn describe(table: &mut FieldTable<Self>) {
            table
                .field("mid", |o| &o.mid, |o| &mut o.mid)
                .inherit::<Base>(|o| &o.base, |o| &mut o.base)
                .manual("handled");
        }
    }

    struct Clash {
        a: i32,
        b: Base,
    }

    impl Record for Clash {
        const NAME: &'static str = "Clash";

        fn describe(table: &mut FieldTable<Self>) {
            table
                .persist("zeta", Persist::BOTH, |c| &c.a, |c| &mut c.a)
                .inherit::<Base>(|c| &c.b, |c| &mut c.b);
        }
    }

    struct Opaque;

    struct NeedsOpaque {
        inner: Opaque,
    }

    impl Default for Opaque {
        fn default() -> Self {
            Opaque
        }
    }

    impl Record for NeedsOpaque {
        const NAME: &'static str = "NeedsOpaque";

        fn describe(table: &mut FieldTable<Self>) {
            table.persist("inner", Persist::BOTH, |n| &n.inner, |n| &mut n.inner);
        }
    }

    fn names(meta: &TypeMetadata) -> Vec<(&'static str, &'static str)> {
        meta.fields()
            .iter()
            .map(|f| (f.name(), f.declaring_type()))
            .collect()
    }

    #[test]
    fn fields_sorted_and_manual_excluded() {
        let meta = FieldIntrospector::build::<Outer>(&registry(), true).unwrap();
        assert_eq!(
            names(&meta),
            vec![("alpha", "Base"), ("mid", "Outer"), ("zeta", "Base")]
        );
        assert!(meta.field("handled").is_none());
        assert_eq!(meta.field("mid").map(|f| f.value_type()), Some(TypeKey::of::<f64>()));
    }

    #[test]
    fn unannotated_fields_dropped_when_excluded() {
        let meta = FieldIntrospector::build::<Outer>(&registry(), false).unwrap();
        assert_eq!(names(&meta), vec![("zeta", "Base")]);
    }

    #[test]
    fn eligibility_flags() {
        let meta = FieldIntrospector::build::<Outer>(&registry(), true).unwrap();
        let wire: Vec<_> = meta.wire_fields().map(|f| f.name()).collect();
        let tree: Vec<_> = meta.tree_fields().map(|f| f.name()).collect();
        assert_eq!(wire, vec!["alpha", "mid", "zeta"]);
        assert_eq!(tree, vec!["alpha", "mid"]);
    }

    #[test]
    fn duplicate_names_rejected() {
        match FieldIntrospector::build::<Clash>(&registry(), true) {
            Err(CodecError::DuplicateField {
                field,
                first,
                second,
                ..
            }) => {
                assert_eq!(field, "zeta");
                assert_eq!((first, second), ("Base", "Clash"));
            }
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn unresolvable_field_fails_fast() {
        assert!(matches!(
            FieldIntrospector::build::<NeedsOpaque>(&registry(), true),
            Err(CodecError::NoTranslator { .. })
        ));
    }

    #[test]
    fn cache_reuses_and_rebuilds() {
        let registry = registry();
        let cache = MetadataCache::new();
        let first = cache
            .get_or_build::<Outer>(&registry, true, BuildPolicy::ReuseCached)
            .unwrap();
        let again = cache
            .get_or_build::<Outer>(&registry, false, BuildPolicy::ReuseCached)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(names(&first), names(&again));

        let rebuilt = cache
            .get_or_build::<Outer>(&registry, false, BuildPolicy::Rebuild)
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.len(), 1);
        // The old snapshot is untouched.
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&cache.get::<Outer>().unwrap(), &rebuilt));
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache = MetadataCache::new();
        assert!(
            cache
                .get_or_build::<NeedsOpaque>(&registry(), true, BuildPolicy::ReuseCached)
                .is_err()
        );
        assert!(cache.is_empty());
    }
}
