//! Bidirectional value codecs.
//!
//! A [`Translator`] converts one semantic value type to and from both the
//! wire format and the tree format. The two directions of each format must
//! be exact inverses:
//!
//! - `decode_wire(encode_wire(v)) == v` for every legal `v`
//! - `decode_tree(encode_tree(v)) == v` whenever `encode_tree(v)` is `Some`
//! - `decode_tree(None)` yields the translator's default and never fails
//!
//! The registry stores translators behind the object-safe [`DynTranslator`],
//! which moves values as `&dyn Any` / `Box<dyn Any>`.
//!
//! # Adding a translator
//!
//! ```ignore
//! struct CelsiusTranslator;
//!
//! impl Translator for CelsiusTranslator {
//!     type Value = Celsius;
//!
//!     fn encode_wire(&self, value: &Celsius, sink: &mut WireWriter) -> CodecResult<()> {
//!         sink.write_f32(value.0);
//!         Ok(())
//!     }
//!
//!     fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Celsius> {
//!         Ok(Celsius(source.read_f32()?))
//!     }
//!
//!     fn encode_tree(&self, value: &Celsius) -> Option<Tag> {
//!         Some(Tag::Float(value.0))
//!     }
//!
//!     fn decode_tree(&self, tag: Option<&Tag>) -> Celsius {
//!         match tag {
//!             Some(Tag::Float(v)) => Celsius(*v),
//!             _ => Celsius(0.0),
//!         }
//!     }
//! }
//!
//! ctx.registry().register(CelsiusTranslator);
//! ```

mod aim;
mod compound;
mod geometry;
mod identity;
mod primitives;

use std::any::Any;

pub use aim::{AimKind, AimResult, AimTranslator, DetachedLookup, LiveObject, ObjectLookup, ObjectTarget};
pub use compound::CompoundTranslator;
pub use geometry::{BlockPos, BlockPosTranslator, Facing, FacingTranslator, Vec3Translator};
pub use identity::UuidTranslator;
pub use primitives::{
    BoolTranslator, BytesTranslator, CharTranslator, F32Translator, F64Translator, I8Translator,
    I16Translator, I32Translator, I64Translator, TextTranslator,
};

use crate::error::{CodecError, CodecResult};
use crate::tree::Tag;
use crate::type_key::TypeKey;
use crate::wire::{WireReader, WireWriter};

/// Codec for one value type across both formats.
pub trait Translator: Send + Sync + 'static {
    /// The value type this translator handles.
    type Value: 'static;

    /// Append the wire form of `value` to `sink`.
    fn encode_wire(&self, value: &Self::Value, sink: &mut WireWriter) -> CodecResult<()>;

    /// Read one value from `source`.
    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Self::Value>;

    /// Tree form of `value`, or `None` to omit the field entirely.
    fn encode_tree(&self, value: &Self::Value) -> Option<Tag>;

    /// Rebuild a value from its tree form. `None` (or a tag of the wrong
    /// kind) must produce the default value.
    fn decode_tree(&self, tag: Option<&Tag>) -> Self::Value;
}

/// Type-erased [`Translator`], as stored by the registry.
pub trait DynTranslator: Send + Sync {
    /// The value type accepted and produced by this translator.
    fn value_type(&self) -> TypeKey;

    fn encode_wire(&self, value: &dyn Any, sink: &mut WireWriter) -> CodecResult<()>;

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Box<dyn Any>>;

    fn encode_tree(&self, value: &dyn Any) -> CodecResult<Option<Tag>>;

    fn decode_tree(&self, tag: Option<&Tag>) -> Box<dyn Any>;
}

/// Adapter from a typed [`Translator`] to [`DynTranslator`].
pub(crate) struct Erased<T>(pub T);

impl<T: Translator> Erased<T> {
    fn downcast<'a>(&self, value: &'a dyn Any) -> CodecResult<&'a T::Value> {
        value
            .downcast_ref::<T::Value>()
            .ok_or(CodecError::ValueMismatch {
                expected: std::any::type_name::<T::Value>(),
            })
    }
}

impl<T: Translator> DynTranslator for Erased<T> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<T::Value>()
    }

    fn encode_wire(&self, value: &dyn Any, sink: &mut WireWriter) -> CodecResult<()> {
        self.0.encode_wire(self.downcast(value)?, sink)
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Box<dyn Any>> {
        Ok(Box::new(self.0.decode_wire(source)?))
    }

    fn encode_tree(&self, value: &dyn Any) -> CodecResult<Option<Tag>> {
        Ok(self.0.encode_tree(self.downcast(value)?))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> Box<dyn Any> {
        Box::new(self.0.decode_tree(tag))
    }
}
