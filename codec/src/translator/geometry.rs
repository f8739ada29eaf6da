//! Spatial value types and their translators.

use glam::DVec3;

use super::Translator;
use crate::error::{CodecError, CodecResult};
use crate::tree::{Compound, Tag};
use crate::wire::{WireReader, WireWriter};

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

const XZ_BITS: u32 = 26;
const Y_BITS: u32 = 12;
const X_SHIFT: u32 = Y_BITS + XZ_BITS;
const Y_SHIFT: u32 = XZ_BITS;
const XZ_MASK: i64 = (1 << XZ_BITS) - 1;
const Y_MASK: i64 = (1 << Y_BITS) - 1;

/// A discretized 3-D integer coordinate.
///
/// The packed 64-bit form stores `x` in the top 26 bits, `y` in the next 12
/// and `z` in the low 26, each two's complement. Components outside
/// `[-2^25, 2^25)` (x, z) or `[-2^11, 2^11)` (y) do not survive packing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn pack(self) -> i64 {
        ((self.x as i64 & XZ_MASK) << X_SHIFT)
            | ((self.y as i64 & Y_MASK) << Y_SHIFT)
            | (self.z as i64 & XZ_MASK)
    }

    pub fn unpack(packed: i64) -> Self {
        // Shift each field to the top, then arithmetic-shift back down to sign-extend.
        let x = packed >> X_SHIFT;
        let y = (packed << (64 - X_SHIFT)) >> (64 - Y_BITS);
        let z = (packed << (64 - XZ_BITS)) >> (64 - XZ_BITS);
        Self::new(x as i32, y as i32, z as i32)
    }

    /// The neighbouring position one step towards `facing`. Components wrap
    /// at the `i32` bounds.
    pub fn offset(self, facing: Facing) -> Self {
        let (dx, dy, dz) = facing.step();
        Self::new(
            self.x.wrapping_add(dx),
            self.y.wrapping_add(dy),
            self.z.wrapping_add(dz),
        )
    }
}

/// Three `i32` on the wire, one packed `Long` in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockPosTranslator;

impl Translator for BlockPosTranslator {
    type Value = BlockPos;

    fn encode_wire(&self, value: &BlockPos, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_i32(value.x);
        sink.write_i32(value.y);
        sink.write_i32(value.z);
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<BlockPos> {
        Ok(BlockPos::new(
            source.read_i32()?,
            source.read_i32()?,
            source.read_i32()?,
        ))
    }

    fn encode_tree(&self, value: &BlockPos) -> Option<Tag> {
        Some(Tag::Long(value.pack()))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> BlockPos {
        match tag {
            Some(Tag::Long(packed)) => BlockPos::unpack(*packed),
            _ => BlockPos::ORIGIN,
        }
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// One of the six axis-aligned directions, stored by ordinal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    #[default]
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Facing {
    pub const ALL: [Facing; 6] = [
        Facing::Down,
        Facing::Up,
        Facing::North,
        Facing::South,
        Facing::West,
        Facing::East,
    ];

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing::Down => Facing::Up,
            Facing::Up => Facing::Down,
            Facing::North => Facing::South,
            Facing::South => Facing::North,
            Facing::West => Facing::East,
            Facing::East => Facing::West,
        }
    }

    /// Unit step along this direction (north is -z, east is +x).
    pub fn step(self) -> (i32, i32, i32) {
        match self {
            Facing::Down => (0, -1, 0),
            Facing::Up => (0, 1, 0),
            Facing::North => (0, 0, -1),
            Facing::South => (0, 0, 1),
            Facing::West => (-1, 0, 0),
            Facing::East => (1, 0, 0),
        }
    }
}

/// `i32` ordinal on the wire, `Byte` ordinal in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacingTranslator;

impl Translator for FacingTranslator {
    type Value = Facing;

    fn encode_wire(&self, value: &Facing, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_i32(value.index());
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<Facing> {
        let ordinal = source.read_i32()?;
        Facing::from_index(ordinal).ok_or(CodecError::InvalidOrdinal {
            kind: "facing",
            ordinal,
        })
    }

    fn encode_tree(&self, value: &Facing) -> Option<Tag> {
        Some(Tag::Byte(value.index() as i8))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> Facing {
        match tag {
            Some(Tag::Byte(b)) => Facing::from_index(i32::from(*b)).unwrap_or_default(),
            _ => Facing::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// `glam::DVec3` as three `f64` on the wire and an `X`/`Y`/`Z` compound in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vec3Translator;

impl Vec3Translator {
    pub(crate) fn write(value: DVec3, sink: &mut WireWriter) {
        sink.write_f64(value.x);
        sink.write_f64(value.y);
        sink.write_f64(value.z);
    }

    pub(crate) fn read(source: &mut WireReader) -> CodecResult<DVec3> {
        Ok(DVec3::new(
            source.read_f64()?,
            source.read_f64()?,
            source.read_f64()?,
        ))
    }
}

impl Translator for Vec3Translator {
    type Value = DVec3;

    fn encode_wire(&self, value: &DVec3, sink: &mut WireWriter) -> CodecResult<()> {
        Self::write(*value, sink);
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<DVec3> {
        Self::read(source)
    }

    fn encode_tree(&self, value: &DVec3) -> Option<Tag> {
        let mut c = Compound::new();
        c.set_double("X", value.x);
        c.set_double("Y", value.y);
        c.set_double("Z", value.z);
        Some(Tag::Compound(c))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> DVec3 {
        match tag {
            Some(Tag::Compound(c)) => DVec3::new(
                c.get_double("X").unwrap_or_default(),
                c.get_double("Y").unwrap_or_default(),
                c.get_double("Z").unwrap_or_default(),
            ),
            _ => DVec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::testing::{tree_round_trip, wire_round_trip};

    #[test]
    fn pack_layout() {
        assert_eq!(BlockPos::new(0, 0, 1).pack(), 1);
        assert_eq!(BlockPos::new(0, 1, 0).pack(), 1 << 26);
        assert_eq!(BlockPos::new(1, 0, 0).pack(), 1 << 38);
        assert_eq!(BlockPos::new(-1, -1, -1).pack(), -1);
    }

    #[test]
    fn pack_round_trip_extremes() {
        let samples = [
            BlockPos::ORIGIN,
            BlockPos::new(1, 2, 3),
            BlockPos::new(-1, -2, -3),
            BlockPos::new((1 << 25) - 1, (1 << 11) - 1, (1 << 25) - 1),
            BlockPos::new(-(1 << 25), -(1 << 11), -(1 << 25)),
            BlockPos::new(-30_000_000, 255, 29_999_999),
        ];
        for pos in samples {
            assert_eq!(BlockPos::unpack(pos.pack()), pos, "{pos:?}");
            assert_eq!(tree_round_trip(&BlockPosTranslator, &pos), pos);
            assert_eq!(wire_round_trip(&BlockPosTranslator, &pos), pos);
        }
    }

    #[test]
    fn block_pos_wire_is_three_ints() {
        let mut w = WireWriter::new();
        BlockPosTranslator
            .encode_wire(&BlockPos::new(1, 2, 3), &mut w)
            .unwrap();
        assert_eq!(w.as_slice(), &[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3]);
    }

    #[test]
    fn facing_helpers() {
        for f in Facing::ALL {
            assert_eq!(f.opposite().opposite(), f);
            assert_eq!(Facing::from_index(f.index()), Some(f));
            let (x, y, z) = f.step();
            let (ox, oy, oz) = f.opposite().step();
            assert_eq!((x + ox, y + oy, z + oz), (0, 0, 0));
        }
        assert_eq!(Facing::from_index(6), None);
        assert_eq!(Facing::from_index(-1), None);
        assert_eq!(
            BlockPos::ORIGIN.offset(Facing::East),
            BlockPos::new(1, 0, 0)
        );
    }

    #[test]
    fn offset_wraps_at_i32_bounds() {
        let edge = BlockPos::new(i32::MAX, i32::MIN, 0);
        assert_eq!(edge.offset(Facing::East), BlockPos::new(i32::MIN, i32::MIN, 0));
        assert_eq!(edge.offset(Facing::Down), BlockPos::new(i32::MAX, i32::MAX, 0));
    }

    #[test]
    fn facing_round_trip() {
        for f in Facing::ALL {
            assert_eq!(wire_round_trip(&FacingTranslator, &f), f);
            assert_eq!(tree_round_trip(&FacingTranslator, &f), f);
        }
    }

    #[test]
    fn facing_bad_ordinal() {
        let mut w = WireWriter::new();
        w.write_i32(9);
        let mut r = WireReader::new(w.freeze());
        assert!(matches!(
            FacingTranslator.decode_wire(&mut r),
            Err(CodecError::InvalidOrdinal { ordinal: 9, .. })
        ));
        assert_eq!(FacingTranslator.decode_tree(Some(&Tag::Byte(9))), Facing::Down);
        assert_eq!(FacingTranslator.decode_tree(None), Facing::Down);
    }

    #[test]
    fn vec3_round_trip() {
        let v = DVec3::new(1.5, -2.0, 1e300);
        assert_eq!(wire_round_trip(&Vec3Translator, &v), v);
        assert_eq!(tree_round_trip(&Vec3Translator, &v), v);
        assert_eq!(Vec3Translator.decode_tree(None), DVec3::ZERO);
    }

    #[test]
    fn vec3_partial_tree() {
        let mut c = Compound::new();
        c.set_double("Y", 4.0);
        let v = Vec3Translator.decode_tree(Some(&Tag::Compound(c)));
        assert_eq!(v, DVec3::new(0.0, 4.0, 0.0));
    }
}
