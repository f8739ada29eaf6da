//! Scalar, text and byte-block translators.

use super::Translator;
use crate::error::{CodecError, CodecResult};
use crate::tree::Tag;
use crate::wire::{WireReader, WireWriter};

macro_rules! numeric_translator {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $write:ident, $read:ident, $variant:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Translator for $name {
            type Value = $ty;

            fn encode_wire(&self, value: &$ty, sink: &mut WireWriter) -> CodecResult<()> {
                sink.$write(*value);
                Ok(())
            }

            fn decode_wire(&self, source: &mut WireReader) -> CodecResult<$ty> {
                source.$read()
            }

            fn encode_tree(&self, value: &$ty) -> Option<Tag> {
                Some(Tag::$variant(*value))
            }

            fn decode_tree(&self, tag: Option<&Tag>) -> $ty {
                match tag {
                    Some(Tag::$variant(v)) => *v,
                    _ => <$ty>::default(),
                }
            }
        }
    };
}

numeric_translator!(
    /// `i8` as one byte / a byte leaf.
    I8Translator, i8, write_i8, read_i8, Byte
);
numeric_translator!(
    /// `i16` as two big-endian bytes / a short leaf.
    I16Translator, i16, write_i16, read_i16, Short
);
numeric_translator!(
    /// `i32` as four big-endian bytes / an int leaf.
    I32Translator, i32, write_i32, read_i32, Int
);
numeric_translator!(
    /// `i64` as eight big-endian bytes / a long leaf.
    I64Translator, i64, write_i64, read_i64, Long
);
numeric_translator!(
    /// `f32` as its IEEE-754 bits / a float leaf.
    F32Translator, f32, write_f32, read_f32, Float
);
numeric_translator!(
    /// `f64` as its IEEE-754 bits / a double leaf.
    F64Translator, f64, write_f64, read_f64, Double
);

/// `bool` as one byte on the wire and a 0/1 byte leaf in the tree.
/// Any non-zero byte reads back as `true`, as with [`Compound::get_bool`](crate::Compound::get_bool).
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolTranslator;

impl Translator for BoolTranslator {
    type Value = bool;

    fn encode_wire(&self, value: &bool, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_bool(*value);
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<bool> {
        source.read_bool()
    }

    fn encode_tree(&self, value: &bool) -> Option<Tag> {
        Some(Tag::Byte(*value as i8))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> bool {
        matches!(tag, Some(Tag::Byte(b)) if *b != 0)
    }
}

/// A Unicode scalar value as its `i32` code point, both on the wire and as an
/// int leaf. Surrogates and values past `U+10FFFF` are rejected on the wire
/// and read as `'\0'` from a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTranslator;

impl Translator for CharTranslator {
    type Value = char;

    fn encode_wire(&self, value: &char, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_i32(*value as i32);
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<char> {
        let code = source.read_i32()?;
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or(CodecError::InvalidOrdinal {
                kind: "char",
                ordinal: code,
            })
    }

    fn encode_tree(&self, value: &char) -> Option<Tag> {
        Some(Tag::Int(*value as i32))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> char {
        match tag {
            Some(Tag::Int(code)) => u32::try_from(*code)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or_default(),
            _ => char::default(),
        }
    }
}

/// UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTranslator;

impl Translator for TextTranslator {
    type Value = String;

    fn encode_wire(&self, value: &String, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_str(value)
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<String> {
        source.read_str()
    }

    fn encode_tree(&self, value: &String) -> Option<Tag> {
        Some(Tag::String(value.clone()))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> String {
        match tag {
            Some(Tag::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// Length-prefixed opaque byte blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesTranslator;

impl Translator for BytesTranslator {
    type Value = Vec<u8>;

    fn encode_wire(&self, value: &Vec<u8>, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_bytes(value)
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Vec<u8>> {
        source.read_bytes()
    }

    fn encode_tree(&self, value: &Vec<u8>) -> Option<Tag> {
        Some(Tag::ByteArray(value.clone()))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> Vec<u8> {
        match tag {
            Some(Tag::ByteArray(b)) => b.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::testing::{tree_round_trip, wire_round_trip};

    #[test]
    fn integers_round_trip() {
        for v in [i8::MIN, -1, 0, 1, i8::MAX] {
            assert_eq!(wire_round_trip(&I8Translator, &v), v);
            assert_eq!(tree_round_trip(&I8Translator, &v), v);
        }
        for v in [i16::MIN, 0, 12_345, i16::MAX] {
            assert_eq!(wire_round_trip(&I16Translator, &v), v);
            assert_eq!(tree_round_trip(&I16Translator, &v), v);
        }
        for v in [i32::MIN, -7, 0, 7, i32::MAX] {
            assert_eq!(wire_round_trip(&I32Translator, &v), v);
            assert_eq!(tree_round_trip(&I32Translator, &v), v);
        }
        for v in [i64::MIN, 0, 1 << 40, i64::MAX] {
            assert_eq!(wire_round_trip(&I64Translator, &v), v);
            assert_eq!(tree_round_trip(&I64Translator, &v), v);
        }
    }

    #[test]
    fn floats_round_trip_bitwise() {
        for v in [0.0f32, -0.0, 1.5, f32::MIN_POSITIVE, f32::INFINITY] {
            assert_eq!(wire_round_trip(&F32Translator, &v).to_bits(), v.to_bits());
        }
        for v in [0.0f64, -2.25, f64::MAX, f64::NEG_INFINITY] {
            assert_eq!(wire_round_trip(&F64Translator, &v).to_bits(), v.to_bits());
            assert_eq!(tree_round_trip(&F64Translator, &v).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn bool_and_text_and_bytes() {
        assert!(wire_round_trip(&BoolTranslator, &true));
        assert!(!tree_round_trip(&BoolTranslator, &false));

        let s = "Ünïcødé ✓".to_string();
        assert_eq!(wire_round_trip(&TextTranslator, &s), s);
        assert_eq!(tree_round_trip(&TextTranslator, &s), s);

        let b = vec![0u8, 255, 7];
        assert_eq!(wire_round_trip(&BytesTranslator, &b), b);
        assert_eq!(tree_round_trip(&BytesTranslator, &b), b);
    }

    #[test]
    fn bool_tree_matches_compound_reading() {
        for byte in [-1i8, 0, 1, 2, i8::MIN] {
            let mut c = crate::tree::Compound::new();
            c.set_byte("b", byte);
            assert_eq!(
                BoolTranslator.decode_tree(c.get("b")),
                c.get_bool("b").unwrap_or_default(),
                "byte {byte}"
            );
        }
        assert!(BoolTranslator.decode_tree(Some(&Tag::Byte(-1))));
    }

    #[test]
    fn char_round_trip() {
        for c in ['a', '\0', 'é', '✓', '🦀', char::MAX] {
            assert_eq!(wire_round_trip(&CharTranslator, &c), c);
            assert_eq!(tree_round_trip(&CharTranslator, &c), c);
        }
        assert_eq!(CharTranslator.encode_tree(&'A'), Some(Tag::Int(65)));
    }

    #[test]
    fn invalid_char_code_points() {
        for code in [0xD800, 0x11_0000, -1] {
            let mut w = WireWriter::new();
            w.write_i32(code);
            let mut r = WireReader::new(w.freeze());
            assert!(matches!(
                CharTranslator.decode_wire(&mut r),
                Err(CodecError::InvalidOrdinal { kind: "char", ordinal }) if ordinal == code
            ));
            assert_eq!(CharTranslator.decode_tree(Some(&Tag::Int(code))), '\0');
        }
        assert_eq!(CharTranslator.decode_tree(None), '\0');
    }

    #[test]
    fn absent_yields_defaults() {
        assert_eq!(I32Translator.decode_tree(None), 0);
        assert_eq!(F64Translator.decode_tree(None), 0.0);
        assert!(!BoolTranslator.decode_tree(None));
        assert_eq!(TextTranslator.decode_tree(None), "");
        assert!(BytesTranslator.decode_tree(None).is_empty());
    }

    #[test]
    fn wrong_kind_yields_default() {
        assert_eq!(I32Translator.decode_tree(Some(&Tag::Long(9))), 0);
        assert_eq!(TextTranslator.decode_tree(Some(&Tag::Int(1))), "");
    }
}
