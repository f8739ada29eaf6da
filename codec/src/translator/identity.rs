use uuid::Uuid;

use super::Translator;
use crate::error::CodecResult;
use crate::tree::{Compound, Tag};
use crate::wire::{WireReader, WireWriter};

/// 128-bit identifiers as two `i64` halves (most significant first).
///
/// The tree form is a compound with `Most` and `Least` longs. A missing
/// half reads as zero, so an absent tree decodes to the nil UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTranslator;

fn halves(value: &Uuid) -> (i64, i64) {
    let (most, least) = value.as_u64_pair();
    (most as i64, least as i64)
}

fn join(most: i64, least: i64) -> Uuid {
    Uuid::from_u64_pair(most as u64, least as u64)
}

impl Translator for UuidTranslator {
    type Value = Uuid;

    fn encode_wire(&self, value: &Uuid, sink: &mut WireWriter) -> CodecResult<()> {
        let (most, least) = halves(value);
        sink.write_i64(most);
        sink.write_i64(least);
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Uuid> {
        let most = source.read_i64()?;
        let least = source.read_i64()?;
        Ok(join(most, least))
    }

    fn encode_tree(&self, value: &Uuid) -> Option<Tag> {
        let (most, least) = halves(value);
        let mut c = Compound::new();
        c.set_long("Most", most);
        c.set_long("Least", least);
        Some(Tag::Compound(c))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> Uuid {
        match tag {
            Some(Tag::Compound(c)) => join(
                c.get_long("Most").unwrap_or_default(),
                c.get_long("Least").unwrap_or_default(),
            ),
            _ => Uuid::nil(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::testing::{tree_round_trip, wire_round_trip};

    #[test]
    fn round_trip() {
        let samples = [
            Uuid::nil(),
            Uuid::from_u128(u128::MAX),
            Uuid::from_u128(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210),
        ];
        for id in samples {
            assert_eq!(wire_round_trip(&UuidTranslator, &id), id);
            assert_eq!(tree_round_trip(&UuidTranslator, &id), id);
        }
    }

    #[test]
    fn wire_is_most_then_least() {
        let id = Uuid::from_u128(0x0000_0000_0000_0001_0000_0000_0000_0002);
        let mut w = WireWriter::new();
        UuidTranslator.encode_wire(&id, &mut w).unwrap();
        assert_eq!(
            w.as_slice(),
            &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2]
        );
    }

    #[test]
    fn absent_is_nil() {
        assert!(UuidTranslator.decode_tree(None).is_nil());
    }
}
