use super::Translator;
use crate::error::CodecResult;
use crate::tree::{Compound, Tag};
use crate::wire::{WireReader, WireWriter};

/// Stores a tree node as a field value, unchanged.
///
/// On the wire the compound uses its own self-describing encoding
/// ([`Compound::write_wire`]), so arbitrary nested data can ride along a
/// positional record. An empty compound is omitted from the tree form.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundTranslator;

impl Translator for CompoundTranslator {
    type Value = Compound;

    fn encode_wire(&self, value: &Compound, sink: &mut WireWriter) -> CodecResult<()> {
        value.write_wire(sink)
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Compound> {
        Compound::read_wire(source)
    }

    fn encode_tree(&self, value: &Compound) -> Option<Tag> {
        (!value.is_empty()).then(|| Tag::Compound(value.clone()))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> Compound {
        match tag {
            Some(Tag::Compound(c)) => c.clone(),
            _ => Compound::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::testing::{tree_round_trip, wire_round_trip};

    #[test]
    fn pass_through() {
        let mut c = Compound::new();
        c.set_int("level", 3);
        c.set_string("owner", "nobody");
        assert_eq!(wire_round_trip(&CompoundTranslator, &c), c);
        assert_eq!(tree_round_trip(&CompoundTranslator, &c), c);
    }

    #[test]
    fn empty_is_absent() {
        assert_eq!(CompoundTranslator.encode_tree(&Compound::new()), None);
        assert!(CompoundTranslator.decode_tree(None).is_empty());
        assert!(wire_round_trip(&CompoundTranslator, &Compound::new()).is_empty());
    }
}
