//! Aim (ray-cast) results, including a lazily resolved object reference.
//!
//! An aim result that hit an object only carries the object's `(world, id)`
//! pair across either format. On decode the pair is resolved against an
//! [`ObjectLookup`]. An object that no longer exists decodes as
//! [`ObjectTarget::Gone`] instead of failing the whole record.

use std::fmt;
use std::sync::Arc;

use glam::DVec3;

use super::Translator;
use super::geometry::{BlockPos, Facing, Vec3Translator};
use crate::error::{CodecError, CodecResult};
use crate::tree::{Compound, Tag};
use crate::wire::{WireReader, WireWriter};

/// Wire/tree values written for [`ObjectTarget::Gone`].
const GONE_WORLD: i32 = 0;
const GONE_ID: i32 = -1;

/// An object living in some world, addressable by `(world_id, object_id)`.
pub trait LiveObject: Send + Sync {
    fn world_id(&self) -> i32;
    fn object_id(&self) -> i32;
}

/// Resolves object references while decoding.
pub trait ObjectLookup: Send + Sync {
    fn lookup(&self, world_id: i32, object_id: i32) -> Option<Arc<dyn LiveObject>>;
}

/// Lookup with no live world attached. Every reference resolves to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedLookup;

impl ObjectLookup for DetachedLookup {
    fn lookup(&self, _world_id: i32, _object_id: i32) -> Option<Arc<dyn LiveObject>> {
        None
    }
}

/// The object an aim result points at.
#[derive(Clone)]
pub enum ObjectTarget {
    Live(Arc<dyn LiveObject>),
    /// The referenced object no longer exists (or never resolved).
    Gone,
}

impl ObjectTarget {
    /// `(world_id, object_id)` as written to either format.
    pub fn address(&self) -> (i32, i32) {
        match self {
            ObjectTarget::Live(obj) => (obj.world_id(), obj.object_id()),
            ObjectTarget::Gone => (GONE_WORLD, GONE_ID),
        }
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, ObjectTarget::Gone)
    }
}

impl PartialEq for ObjectTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ObjectTarget::Gone, ObjectTarget::Gone) => true,
            (ObjectTarget::Live(_), ObjectTarget::Live(_)) => self.address() == other.address(),
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectTarget::Live(obj) => f
                .debug_struct("Live")
                .field("world_id", &obj.world_id())
                .field("object_id", &obj.object_id())
                .finish(),
            ObjectTarget::Gone => f.write_str("Gone"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum AimKind {
    #[default]
    Miss,
    Surface {
        face: Facing,
        pos: BlockPos,
    },
    Object(ObjectTarget),
}

impl AimKind {
    /// Ordinal written for this kind: 0 miss, 1 surface, 2 object.
    pub fn ordinal(&self) -> i32 {
        match self {
            AimKind::Miss => 0,
            AimKind::Surface { .. } => 1,
            AimKind::Object(_) => 2,
        }
    }
}

/// Where an aim ray ended and what it hit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AimResult {
    pub hit: DVec3,
    pub kind: AimKind,
}

impl AimResult {
    pub fn miss(hit: DVec3) -> Self {
        Self {
            hit,
            kind: AimKind::Miss,
        }
    }

    pub fn surface(hit: DVec3, face: Facing, pos: BlockPos) -> Self {
        Self {
            hit,
            kind: AimKind::Surface { face, pos },
        }
    }

    pub fn object(hit: DVec3, target: ObjectTarget) -> Self {
        Self {
            hit,
            kind: AimKind::Object(target),
        }
    }
}

/// Translator for [`AimResult`].
///
/// Wire: `i32` kind, three `f64` hit coordinates, then for objects `i32`
/// world and `i32` id, for surfaces `i32` face and three `i32` coordinates.
/// Tree: `TypeOfHit`, `HitX`/`HitY`/`HitZ`, plus `ObjectWorld`/`Object` or
/// `SideHit`/`BlockX`/`BlockY`/`BlockZ`.
#[derive(Clone)]
pub struct AimTranslator {
    lookup: Arc<dyn ObjectLookup>,
}

impl AimTranslator {
    pub fn new(lookup: Arc<dyn ObjectLookup>) -> Self {
        Self { lookup }
    }

    fn resolve(&self, world_id: i32, object_id: i32) -> ObjectTarget {
        match self.lookup.lookup(world_id, object_id) {
            Some(obj) => ObjectTarget::Live(obj),
            None => {
                log::debug!(
                    "Aim target {object_id} in world {world_id} no longer exists, decoding as gone"
                );
                ObjectTarget::Gone
            }
        }
    }
}

impl Default for AimTranslator {
    fn default() -> Self {
        Self::new(Arc::new(DetachedLookup))
    }
}

impl Translator for AimTranslator {
    type Value = AimResult;

    fn encode_wire(&self, value: &AimResult, sink: &mut WireWriter) -> CodecResult<()> {
        sink.write_i32(value.kind.ordinal());
        Vec3Translator::write(value.hit, sink);
        match &value.kind {
            AimKind::Miss => {}
            AimKind::Surface { face, pos } => {
                sink.write_i32(face.index());
                sink.write_i32(pos.x);
                sink.write_i32(pos.y);
                sink.write_i32(pos.z);
            }
            AimKind::Object(target) => {
                let (world, id) = target.address();
                sink.write_i32(world);
                sink.write_i32(id);
            }
        }
        Ok(())
    }

    fn decode_wire(&self, source: &mut WireReader) -> CodecResult<AimResult> {
        let ordinal = source.read_i32()?;
        let hit = Vec3Translator::read(source)?;
        let kind = match ordinal {
            0 => AimKind::Miss,
            1 => {
                let face_ordinal = source.read_i32()?;
                let face = Facing::from_index(face_ordinal).ok_or(CodecError::InvalidOrdinal {
                    kind: "facing",
                    ordinal: face_ordinal,
                })?;
                let pos = BlockPos::new(source.read_i32()?, source.read_i32()?, source.read_i32()?);
                AimKind::Surface { face, pos }
            }
            2 => {
                let world = source.read_i32()?;
                let id = source.read_i32()?;
                AimKind::Object(self.resolve(world, id))
            }
            other => {
                return Err(CodecError::InvalidOrdinal {
                    kind: "aim kind",
                    ordinal: other,
                });
            }
        };
        Ok(AimResult { hit, kind })
    }

    fn encode_tree(&self, value: &AimResult) -> Option<Tag> {
        let mut c = Compound::new();
        c.set_int("TypeOfHit", value.kind.ordinal());
        c.set_double("HitX", value.hit.x);
        c.set_double("HitY", value.hit.y);
        c.set_double("HitZ", value.hit.z);
        match &value.kind {
            AimKind::Miss => {}
            AimKind::Surface { face, pos } => {
                c.set_int("SideHit", face.index());
                c.set_int("BlockX", pos.x);
                c.set_int("BlockY", pos.y);
                c.set_int("BlockZ", pos.z);
            }
            AimKind::Object(target) => {
                let (world, id) = target.address();
                c.set_int("ObjectWorld", world);
                c.set_int("Object", id);
            }
        }
        Some(Tag::Compound(c))
    }

    fn decode_tree(&self, tag: Option<&Tag>) -> AimResult {
        let Some(Tag::Compound(c)) = tag else {
            return AimResult::default();
        };
        let int = |name: &str| c.get_int(name).unwrap_or_default();
        let hit = DVec3::new(
            c.get_double("HitX").unwrap_or_default(),
            c.get_double("HitY").unwrap_or_default(),
            c.get_double("HitZ").unwrap_or_default(),
        );
        let kind = match int("TypeOfHit") {
            1 => AimKind::Surface {
                face: Facing::from_index(int("SideHit")).unwrap_or_default(),
                pos: BlockPos::new(int("BlockX"), int("BlockY"), int("BlockZ")),
            },
            2 => AimKind::Object(self.resolve(
                c.get_int("ObjectWorld").unwrap_or(GONE_WORLD),
                c.get_int("Object").unwrap_or(GONE_ID),
            )),
            _ => AimKind::Miss,
        };
        AimResult { hit, kind }
    }
}
