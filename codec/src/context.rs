//! The codec context and the full-object codec.
//!
//! A [`CodecContext`] bundles the translator registry, the metadata cache
//! and the configuration. It is built once at startup and passed by
//! reference wherever records are encoded or decoded; there is no global
//! registry. Separate contexts are fully isolated from each other.
//!
//! The full-object codec lives here:
//!
//! - **Tree**: every tree-eligible field is stored under its name. A field
//!   whose translator yields "absent" is omitted, and a missing key decodes
//!   to the translator's default, so old or pruned trees still load.
//! - **Wire**: every wire-eligible field is written in metadata order with
//!   no framing at all. Sender and receiver must agree on the record's
//!   field set; nothing on the wire detects a mismatch.

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::metadata::{BuildPolicy, MetadataCache, TypeMetadata};
use crate::record::Record;
use crate::registry::{FallbackPolicy, TranslatorRegistry};
use crate::translator::{DetachedLookup, ObjectLookup};
use crate::tree::{Compound, Tag};
use crate::type_key::TypeKey;
use crate::wire::{WireLimits, WireReader, WireWriter};

/// Registry, metadata cache and settings shared by every encode/decode call.
pub struct CodecContext {
    registry: TranslatorRegistry,
    metadata: MetadataCache,
    config: CodecConfig,
}

impl CodecContext {
    /// Create a context with every built-in translator registered.
    pub fn new(config: CodecConfig, lookup: Arc<dyn ObjectLookup>) -> Self {
        Self {
            registry: TranslatorRegistry::with_builtins(config.fallback, lookup),
            metadata: MetadataCache::new(),
            config,
        }
    }

    pub fn builder() -> CodecContextBuilder {
        CodecContextBuilder::default()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The translator registry. Translators may be added at any time, but
    /// records whose metadata is already cached keep their old bindings
    /// until [`rebuild_record`](Self::rebuild_record).
    pub fn registry(&self) -> &TranslatorRegistry {
        &self.registry
    }

    /// A wire reader over `bytes` using this context's limits.
    pub fn reader(&self, bytes: impl Into<Bytes>) -> WireReader {
        WireReader::with_limits(bytes, self.config.limits)
    }

    /// An empty wire writer using this context's limits, so everything it
    /// accepts is readable through [`reader`](Self::reader).
    pub fn writer(&self) -> WireWriter {
        WireWriter::with_limits(self.config.limits)
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Build and cache `T`'s metadata now, surfacing resolution errors at
    /// startup instead of on first use.
    pub fn register_record<T: Record>(&self) -> CodecResult<Arc<TypeMetadata>> {
        self.register_record_with::<T>(self.config.include_unannotated)
    }

    /// Like [`register_record`](Self::register_record) with an explicit
    /// choice for fields without persistence flags. Has no effect if `T`
    /// is already cached.
    pub fn register_record_with<T: Record>(
        &self,
        include_unannotated: bool,
    ) -> CodecResult<Arc<TypeMetadata>> {
        self.metadata
            .get_or_build::<T>(&self.registry, include_unannotated, BuildPolicy::ReuseCached)
    }

    /// Discard `T`'s cached metadata and build it again, picking up any
    /// translators registered since.
    pub fn rebuild_record<T: Record>(&self) -> CodecResult<Arc<TypeMetadata>> {
        self.metadata.get_or_build::<T>(
            &self.registry,
            self.config.include_unannotated,
            BuildPolicy::Rebuild,
        )
    }

    /// `T`'s metadata, building it on first use.
    pub fn metadata<T: Record>(&self) -> CodecResult<Arc<TypeMetadata>> {
        self.register_record::<T>()
    }

    // -----------------------------------------------------------------------
    // Full-object codec
    // -----------------------------------------------------------------------

    pub fn serialize_to_tree<T: Record>(&self, object: &T, out: &mut Compound) -> CodecResult<()> {
        let meta = self.metadata::<T>()?;
        for field in meta.tree_fields() {
            if let Some(tag) = field.encode_tree(object)? {
                out.insert(field.name(), tag);
            }
        }
        Ok(())
    }

    pub fn deserialize_from_tree<T: Record>(&self, tree: &Compound, object: &mut T) -> CodecResult<()> {
        let meta = self.metadata::<T>()?;
        for field in meta.tree_fields() {
            field.decode_tree(tree.get(field.name()), object)?;
        }
        Ok(())
    }

    pub fn serialize_to_wire<T: Record>(&self, object: &T, sink: &mut WireWriter) -> CodecResult<()> {
        let meta = self.metadata::<T>()?;
        for field in meta.wire_fields() {
            field.encode_wire(object, sink)?;
        }
        Ok(())
    }

    pub fn deserialize_from_wire<T: Record>(
        &self,
        source: &mut WireReader,
        object: &mut T,
    ) -> CodecResult<()> {
        let meta = self.metadata::<T>()?;
        for field in meta.wire_fields() {
            field.decode_wire(source, object)?;
        }
        Ok(())
    }

    /// Encode `object` into a fresh tree.
    pub fn to_tree<T: Record>(&self, object: &T) -> CodecResult<Compound> {
        let mut tree = Compound::new();
        self.serialize_to_tree(object, &mut tree)?;
        Ok(tree)
    }

    /// Decode a tree into a default-constructed `T`.
    pub fn from_tree<T: Record + Default>(&self, tree: &Compound) -> CodecResult<T> {
        let mut object = T::default();
        self.deserialize_from_tree(tree, &mut object)?;
        Ok(object)
    }

    /// Encode `object` into a fresh wire buffer.
    pub fn to_wire<T: Record>(&self, object: &T) -> CodecResult<Bytes> {
        let mut sink = self.writer();
        self.serialize_to_wire(object, &mut sink)?;
        Ok(sink.freeze())
    }

    /// Decode wire bytes into a default-constructed `T`.
    pub fn from_wire<T: Record + Default>(&self, bytes: impl Into<Bytes>) -> CodecResult<T> {
        let mut object = T::default();
        self.deserialize_from_wire(&mut self.reader(bytes), &mut object)?;
        Ok(object)
    }

    // -----------------------------------------------------------------------
    // Single values
    // -----------------------------------------------------------------------

    /// Write one value with the translator registered for its type.
    pub fn write_value<V: 'static>(&self, value: &V, sink: &mut WireWriter) -> CodecResult<()> {
        self.registry.resolve_for::<V>()?.encode_wire(value, sink)
    }

    /// Read one value of type `V`.
    pub fn read_value<V: 'static>(&self, source: &mut WireReader) -> CodecResult<V> {
        let decoded = self.registry.resolve_for::<V>()?.decode_wire(source)?;
        unbox(decoded)
    }

    /// Tree form of one value, or `None` if it encodes as absent.
    pub fn encode_value_tree<V: 'static>(&self, value: &V) -> CodecResult<Option<Tag>> {
        self.registry.resolve_for::<V>()?.encode_tree(value)
    }

    /// Rebuild one value from its tree form; `None` yields the default.
    pub fn decode_value_tree<V: 'static>(&self, tag: Option<&Tag>) -> CodecResult<V> {
        unbox(self.registry.resolve_for::<V>()?.decode_tree(tag))
    }
}

impl Default for CodecContext {
    fn default() -> Self {
        Self::new(CodecConfig::default(), Arc::new(DetachedLookup))
    }
}

fn unbox<V: 'static>(value: Box<dyn Any>) -> CodecResult<V> {
    value
        .downcast::<V>()
        .map(|v| *v)
        .map_err(|_| CodecError::ValueMismatch {
            expected: TypeKey::of::<V>().name(),
        })
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Step-by-step construction of a [`CodecContext`].
pub struct CodecContextBuilder {
    config: CodecConfig,
    lookup: Arc<dyn ObjectLookup>,
}

impl Default for CodecContextBuilder {
    fn default() -> Self {
        Self {
            config: CodecConfig::default(),
            lookup: Arc::new(DetachedLookup),
        }
    }
}

impl CodecContextBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn include_unannotated(mut self, include: bool) -> Self {
        self.config.include_unannotated = include;
        self
    }

    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.config.fallback = policy;
        self
    }

    pub fn limits(mut self, limits: WireLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Collaborator used to resolve object references in aim results.
    pub fn lookup(mut self, lookup: Arc<dyn ObjectLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn build(self) -> CodecContext {
        CodecContext::new(self.config, self.lookup)
    }
}
