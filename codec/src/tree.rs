//! Tree format adapter: self-describing compound nodes with named leaves.
//!
//! A [`Compound`] maps names to [`Tag`]s and preserves insertion order.
//! Setting an existing name overwrites it in place. Typed getters return
//! `None` both for a missing name and for a present name of another kind,
//! so translators can treat both cases as "absent".
//!
//! Trees implement serde so the storage collaborator can persist them via
//! [`format`](crate::format). A compact binary form ([`Compound::write_wire`])
//! exists for carrying a whole tree as a single wire value.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::wire::{WireReader, WireWriter};

/// A single tree leaf or nested compound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    Compound(Compound),
}

impl Tag {
    /// Numeric id of this tag kind in the binary tree encoding. `0` is
    /// reserved for the end-of-compound marker.
    pub fn id(&self) -> u8 {
        match self {
            Tag::Byte(_) => 1,
            Tag::Short(_) => 2,
            Tag::Int(_) => 3,
            Tag::Long(_) => 4,
            Tag::Float(_) => 5,
            Tag::Double(_) => 6,
            Tag::ByteArray(_) => 7,
            Tag::String(_) => 8,
            Tag::Compound(_) => 10,
        }
    }

    /// Human-readable kind name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Tag::Byte(_) => "byte",
            Tag::Short(_) => "short",
            Tag::Int(_) => "int",
            Tag::Long(_) => "long",
            Tag::Float(_) => "float",
            Tag::Double(_) => "double",
            Tag::ByteArray(_) => "byte array",
            Tag::String(_) => "string",
            Tag::Compound(_) => "compound",
        }
    }

    fn write_payload(&self, sink: &mut WireWriter, depth: usize) -> CodecResult<()> {
        match self {
            Tag::Byte(v) => sink.write_i8(*v),
            Tag::Short(v) => sink.write_i16(*v),
            Tag::Int(v) => sink.write_i32(*v),
            Tag::Long(v) => sink.write_i64(*v),
            Tag::Float(v) => sink.write_f32(*v),
            Tag::Double(v) => sink.write_f64(*v),
            Tag::ByteArray(v) => sink.write_bytes(v)?,
            Tag::String(v) => sink.write_str(v)?,
            Tag::Compound(v) => v.write_nested(sink, depth + 1)?,
        }
        Ok(())
    }

    fn read_payload(id: u8, source: &mut WireReader, depth: usize) -> CodecResult<Self> {
        Ok(match id {
            1 => Tag::Byte(source.read_i8()?),
            2 => Tag::Short(source.read_i16()?),
            3 => Tag::Int(source.read_i32()?),
            4 => Tag::Long(source.read_i64()?),
            5 => Tag::Float(source.read_f32()?),
            6 => Tag::Double(source.read_f64()?),
            7 => Tag::ByteArray(source.read_bytes()?),
            8 => Tag::String(source.read_str()?),
            10 => Tag::Compound(Compound::read_nested(source, depth + 1)?),
            other => return Err(CodecError::InvalidTag(other)),
        })
    }
}

/// An ordered set of named tags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

macro_rules! typed_accessors {
    ($($get:ident, $set:ident, $variant:ident, $ty:ty;)*) => {
        $(
            pub fn $get(&self, name: &str) -> Option<$ty> {
                match self.get(name) {
                    Some(Tag::$variant(v)) => Some(*v),
                    _ => None,
                }
            }

            pub fn $set(&mut self, name: impl Into<String>, value: $ty) {
                self.insert(name, Tag::$variant(value));
            }
        )*
    };
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }

    /// Insert or overwrite a named tag. Overwriting keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = tag,
            None => self.entries.push((name, tag)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    typed_accessors! {
        get_byte, set_byte, Byte, i8;
        get_short, set_short, Short, i16;
        get_int, set_int, Int, i32;
        get_long, set_long, Long, i64;
        get_float, set_float, Float, f32;
        get_double, set_double, Double, f64;
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Tag::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn set_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, Tag::String(value.into()));
    }

    pub fn get_byte_array(&self, name: &str) -> Option<&[u8]> {
        match self.get(name) {
            Some(Tag::ByteArray(v)) => Some(v),
            _ => None,
        }
    }

    pub fn set_byte_array(&mut self, name: impl Into<String>, value: Vec<u8>) {
        self.insert(name, Tag::ByteArray(value));
    }

    /// Booleans are stored as a byte; any non-zero value reads as `true`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_byte(name).map(|b| b != 0)
    }

    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) {
        self.set_byte(name, value as i8);
    }

    pub fn get_compound(&self, name: &str) -> Option<&Compound> {
        match self.get(name) {
            Some(Tag::Compound(v)) => Some(v),
            _ => None,
        }
    }

    pub fn set_compound(&mut self, name: impl Into<String>, value: Compound) {
        self.insert(name, Tag::Compound(value));
    }

    // -----------------------------------------------------------------------
    // Binary tree encoding
    // -----------------------------------------------------------------------

    /// Write this tree as `(tag id, name, payload)*` followed by a `0` end marker.
    ///
    /// Nesting deeper than the writer's `max_tree_depth` is refused, matching
    /// what [`read_wire`](Self::read_wire) accepts.
    pub fn write_wire(&self, sink: &mut WireWriter) -> CodecResult<()> {
        self.write_nested(sink, 1)
    }

    fn write_nested(&self, sink: &mut WireWriter, depth: usize) -> CodecResult<()> {
        let limit = sink.limits().max_tree_depth;
        if depth > limit {
            return Err(CodecError::NestingTooDeep { limit });
        }
        for (name, tag) in &self.entries {
            sink.write_u8(tag.id());
            sink.write_str(name)?;
            tag.write_payload(sink, depth)?;
        }
        sink.write_u8(0);
        Ok(())
    }

    /// Read a tree written by [`write_wire`](Self::write_wire), bounded by the
    /// reader's `max_tree_depth`.
    pub fn read_wire(source: &mut WireReader) -> CodecResult<Self> {
        Self::read_nested(source, 1)
    }

    fn read_nested(source: &mut WireReader, depth: usize) -> CodecResult<Self> {
        let limit = source.limits().max_tree_depth;
        if depth > limit {
            return Err(CodecError::NestingTooDeep { limit });
        }
        let mut compound = Compound::new();
        loop {
            let id = source.read_u8()?;
            if id == 0 {
                return Ok(compound);
            }
            let name = source.read_str()?;
            let tag = Tag::read_payload(id, source, depth)?;
            compound.insert(name, tag);
        }
    }
}
