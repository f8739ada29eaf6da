//! # Emberwire
//!
//! Type-directed object codec. Records are converted to and from two
//! independent representations:
//!
//! - a compact **wire** format: positional, big-endian, no framing, for
//!   transmission between endpoints running the same build;
//! - a self-describing **tree** format ([`Compound`] of named [`Tag`]s), for
//!   persistence that must survive added or removed fields.
//!
//! ## Core Types
//!
//! - [`Translator`]: Bidirectional codec for one value type, both formats
//! - [`TranslatorRegistry`]: Value type to translator, with ancestor fallback
//! - [`Record`] / [`FieldTable`]: Statically declared field list of a record
//! - [`FieldIntrospector`] / [`TypeMetadata`]: Ordered, translator-bound field metadata
//! - [`CodecContext`]: Registry, metadata cache and config; home of the
//!   full-object codec and the selective (partial update) codec
//!
//! ## Quick start
//!
//! ```ignore
//! #[derive(Default, Record)]
//! struct Beacon {
//!     count: i32,
//!     label: String,
//!     at: BlockPos,
//! }
//!
//! let ctx = CodecContext::default();
//! ctx.register_record::<Beacon>()?;
//!
//! let bytes = ctx.to_wire(&beacon)?;
//! let copy: Beacon = ctx.from_wire(bytes)?;
//!
//! let mut update = ctx.writer();
//! ctx.serialize_fields(&beacon, &["label"], &mut update)?;
//! ```

// Lets the derive macro name `::emberwire` from inside this crate's own tests.
extern crate self as emberwire;

mod config;
mod context;
mod error;
pub mod format;
mod metadata;
mod record;
mod registry;
mod selective;
pub mod translator;
mod tree;
mod type_key;
pub mod wire;

pub use config::CodecConfig;
pub use context::{CodecContext, CodecContextBuilder};
pub use emberwire_macro::Record;
pub use error::{CodecError, CodecResult};
pub use format::Format;
pub use metadata::{BuildPolicy, FieldDescriptor, FieldIntrospector, MetadataCache, TypeMetadata};
pub use record::{Assign, FieldAccess, FieldTable, Persist, Record};
pub use registry::{FallbackPolicy, TranslatorRegistry};
pub use translator::{
    AimKind, AimResult, BlockPos, DynTranslator, Facing, LiveObject, ObjectLookup, ObjectTarget,
    Translator,
};
pub use tree::{Compound, Tag};
pub use type_key::TypeKey;
pub use wire::{WireLimits, WireReader, WireWriter};
