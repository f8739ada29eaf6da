//! Self-describing partial updates.
//!
//! Layout: an `i32` entry count, then per entry the field name (wire text)
//! followed by the field's wire value. Because every entry is named, the
//! receiver tolerates any order and any field set, as long as each name it
//! receives exists on its own record.

use crate::context::CodecContext;
use crate::error::{CodecError, CodecResult};
use crate::metadata::FieldDescriptor;
use crate::record::Record;
use crate::wire::{WireReader, WireWriter};

impl CodecContext {
    /// Write the named fields of `object`, in the order given.
    ///
    /// Any field in `T`'s metadata may be named, whatever its eligibility
    /// flags. Names are validated before anything is written, so an unknown
    /// name leaves `sink` untouched.
    pub fn serialize_fields<T: Record>(
        &self,
        object: &T,
        names: &[&str],
        sink: &mut WireWriter,
    ) -> CodecResult<()> {
        let meta = self.metadata::<T>()?;
        let fields = names
            .iter()
            .map(|&name| {
                meta.field(name).ok_or_else(|| CodecError::MissingField {
                    field: name.to_owned(),
                    record: T::NAME,
                })
            })
            .collect::<CodecResult<Vec<&FieldDescriptor>>>()?;
        let count = i32::try_from(fields.len()).map_err(|_| CodecError::LengthOutOfBounds {
            len: fields.len() as i64,
            limit: i32::MAX as usize,
        })?;

        sink.write_i32(count);
        for field in fields {
            log::trace!("Writing {}.{}", T::NAME, field.name());
            sink.write_str(field.name())?;
            field.encode_wire(object, sink)?;
        }
        Ok(())
    }

    /// Apply a partial update to `object` and return the number of fields read.
    ///
    /// Fields not named in the update keep their current values. On
    /// [`CodecError::MissingField`] (or any decode error) the fields decoded
    /// before the failing entry stay assigned.
    pub fn deserialize_fields<T: Record>(
        &self,
        source: &mut WireReader,
        object: &mut T,
    ) -> CodecResult<usize> {
        let meta = self.metadata::<T>()?;
        let count = source.read_i32()?;
        let count = usize::try_from(count).map_err(|_| CodecError::LengthOutOfBounds {
            len: i64::from(count),
            limit: i32::MAX as usize,
        })?;

        for _ in 0..count {
            let name = source.read_str()?;
            let Some(field) = meta.field(&name) else {
                return Err(CodecError::MissingField {
                    field: name,
                    record: T::NAME,
                });
            };
            log::trace!("Reading {}.{}", T::NAME, field.name());
            field.decode_wire(source, object)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldTable, Persist};

    #[derive(Debug, Default, PartialEq)]
    struct Gauge {
        level: i16,
        label: String,
        hidden: bool,
    }

    impl Record for Gauge {
        const NAME: &'static str = "Gauge";

        fn describe(table: &mut FieldTable<Self>) {
            table
                .field("level", |g| &g.level, |g| &mut g.level)
                .field("label", |g| &g.label, |g| &mut g.label)
                .persist("hidden", Persist::TREE_ONLY, |g| &g.hidden, |g| &mut g.hidden);
        }
    }

    #[test]
    fn entries_follow_requested_order() {
        let ctx = CodecContext::default();
        let gauge = Gauge {
            level: 4,
            label: "oil".into(),
            hidden: true,
        };
        let mut sink = WireWriter::new();
        ctx.serialize_fields(&gauge, &["level", "label"], &mut sink)
            .unwrap();

        let mut expected = WireWriter::new();
        expected.write_i32(2);
        expected.write_str("level").unwrap();
        expected.write_i16(4);
        expected.write_str("label").unwrap();
        expected.write_str("oil").unwrap();
        assert_eq!(sink.as_slice(), expected.as_slice());
    }

    #[test]
    fn non_wire_field_can_be_selected() {
        let ctx = CodecContext::default();
        let gauge = Gauge {
            hidden: true,
            ..Default::default()
        };
        let mut sink = WireWriter::new();
        ctx.serialize_fields(&gauge, &["hidden"], &mut sink).unwrap();

        let mut target = Gauge::default();
        let read = ctx
            .deserialize_fields(&mut ctx.reader(sink.freeze()), &mut target)
            .unwrap();
        assert_eq!(read, 1);
        assert!(target.hidden);
    }

    #[test]
    fn unknown_name_on_encode_writes_nothing() {
        let ctx = CodecContext::default();
        let mut sink = WireWriter::new();
        let result = ctx.serialize_fields(&Gauge::default(), &["level", "nope"], &mut sink);
        assert!(matches!(result, Err(CodecError::MissingField { ref field, .. }) if field == "nope"));
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_update() {
        let ctx = CodecContext::default();
        let mut sink = WireWriter::new();
        ctx.serialize_fields(&Gauge::default(), &[], &mut sink).unwrap();
        assert_eq!(sink.as_slice(), &[0, 0, 0, 0]);

        let mut target = Gauge {
            level: 9,
            ..Default::default()
        };
        let read = ctx
            .deserialize_fields(&mut ctx.reader(sink.freeze()), &mut target)
            .unwrap();
        assert_eq!(read, 0);
        assert_eq!(target.level, 9);
    }

    #[test]
    fn negative_count_rejected() {
        let ctx = CodecContext::default();
        let mut sink = WireWriter::new();
        sink.write_i32(-1);
        let result = ctx.deserialize_fields(&mut ctx.reader(sink.freeze()), &mut Gauge::default());
        assert!(matches!(
            result,
            Err(CodecError::LengthOutOfBounds { len: -1, .. })
        ));
    }
}
