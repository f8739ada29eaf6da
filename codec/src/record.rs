//! Statically declared field tables.
//!
//! A persistable type implements [`Record`] (usually via
//! `#[derive(Record)]`) and lists its fields once in
//! [`describe`](Record::describe). Each entry pairs a field name with a
//! plain accessor/mutator pair, so encoding never needs runtime
//! introspection.
//!
//! ```ignore
//! impl Record for Crate {
//!     const NAME: &'static str = "Crate";
//!
//!     fn describe(table: &mut FieldTable<Self>) {
//!         table.inherit::<Container>(|c| &c.base, |c| &mut c.base);
//!         table.persist("label", Persist::BOTH, |c| &c.label, |c| &mut c.label);
//!         table.field("weight", |c| &c.weight, |c| &mut c.weight);
//!         table.manual("cache");
//!     }
//! }
//! ```

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::type_key::TypeKey;

/// A type whose fields can be encoded by the object and selective codecs.
pub trait Record: Send + Sync + Sized + 'static {
    /// Name of this record kind, used as the declaring type of its fields.
    const NAME: &'static str;

    /// List every field of `Self` (including inherited parts) into `table`.
    fn describe(table: &mut FieldTable<Self>);
}

/// Per-format persistence flags carried by an annotated field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Persist {
    pub tree: bool,
    pub wire: bool,
}

impl Persist {
    pub const BOTH: Self = Self {
        tree: true,
        wire: true,
    };
    pub const TREE_ONLY: Self = Self {
        tree: true,
        wire: false,
    };
    pub const WIRE_ONLY: Self = Self {
        tree: false,
        wire: true,
    };
}

impl Default for Persist {
    fn default() -> Self {
        Self::BOTH
    }
}

// ---------------------------------------------------------------------------
// Erased field access
// ---------------------------------------------------------------------------

/// Outcome of [`FieldAccess::assign`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assign {
    /// The decoded value was stored.
    Set,
    /// The decoded value had the wrong type; the field's default was stored.
    Substituted,
    /// The owner is not the record this accessor belongs to.
    WrongOwner,
}

/// Type-erased read/write access to one field of one record type.
pub trait FieldAccess: Send + Sync {
    /// Declared type of the field.
    fn value_type(&self) -> TypeKey;

    /// Borrow the field out of `owner`, or `None` if `owner` is another type.
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;

    /// Store `value` into the field of `owner`.
    fn assign(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> Assign;
}

struct Direct<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V> FieldAccess for Direct<T, V>
where
    T: 'static,
    V: Default + 'static,
{
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<V>()
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let owner = owner.downcast_ref::<T>()?;
        Some((self.get)(owner) as &dyn Any)
    }

    fn assign(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> Assign {
        let Some(owner) = owner.downcast_mut::<T>() else {
            return Assign::WrongOwner;
        };
        let slot = (self.get_mut)(owner);
        match value.downcast::<V>() {
            Ok(value) => {
                *slot = *value;
                Assign::Set
            }
            Err(_) => {
                *slot = V::default();
                Assign::Substituted
            }
        }
    }
}

/// Access to a field of an inherited part `P`, re-rooted onto the outer record `T`.
struct Nested<T, P> {
    get: fn(&T) -> &P,
    get_mut: fn(&mut T) -> &mut P,
    inner: Arc<dyn FieldAccess>,
}

impl<T: 'static, P: 'static> FieldAccess for Nested<T, P> {
    fn value_type(&self) -> TypeKey {
        self.inner.value_type()
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let owner = owner.downcast_ref::<T>()?;
        self.inner.get((self.get)(owner))
    }

    fn assign(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> Assign {
        let Some(owner) = owner.downcast_mut::<T>() else {
            return Assign::WrongOwner;
        };
        self.inner.assign((self.get_mut)(owner), value)
    }
}

// ---------------------------------------------------------------------------
// FieldTable
// ---------------------------------------------------------------------------

/// How a declared field is to be treated.
#[derive(Clone)]
pub(crate) enum FieldKind {
    /// The owner encodes this field itself; the codec never touches it.
    Manual,
    /// `flags` is `None` for a field without explicit persistence flags.
    Persisted {
        flags: Option<Persist>,
        access: Arc<dyn FieldAccess>,
    },
}

#[derive(Clone)]
pub(crate) struct FieldEntry {
    pub name: &'static str,
    pub declaring_type: &'static str,
    pub kind: FieldKind,
}

/// Builder through which a [`Record`] lists its fields.
pub struct FieldTable<T> {
    declaring_type: &'static str,
    entries: Vec<FieldEntry>,
    _owner: PhantomData<fn(&T)>,
}

impl<T: Record> FieldTable<T> {
    /// Collect the full field list of `T`.
    pub(crate) fn collect() -> Self {
        let mut table = Self {
            declaring_type: T::NAME,
            entries: Vec::new(),
            _owner: PhantomData,
        };
        T::describe(&mut table);
        table
    }

    pub(crate) fn into_entries(self) -> Vec<FieldEntry> {
        self.entries
    }

    fn push(&mut self, name: &'static str, kind: FieldKind) -> &mut Self {
        self.entries.push(FieldEntry {
            name,
            declaring_type: self.declaring_type,
            kind,
        });
        self
    }

    fn persisted<V: Default + 'static>(
        &mut self,
        name: &'static str,
        flags: Option<Persist>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        let access: Arc<dyn FieldAccess> = Arc::new(Direct { get, get_mut });
        self.push(name, FieldKind::Persisted { flags, access })
    }

    /// A field with no explicit persistence flags. Whether it is encoded at
    /// all depends on the codec's `include_unannotated` setting.
    pub fn field<V: Default + 'static>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.persisted(name, None, get, get_mut)
    }

    /// A field with explicit per-format persistence flags.
    pub fn persist<V: Default + 'static>(
        &mut self,
        name: &'static str,
        flags: Persist,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.persisted(name, Some(flags), get, get_mut)
    }

    /// A field its owner encodes by hand. It is never read or written by the codec.
    pub fn manual(&mut self, name: &'static str) -> &mut Self {
        self.push(name, FieldKind::Manual)
    }

    /// Pull in every field of the embedded part `P`. Its fields keep
    /// `P::NAME` as their declaring type.
    pub fn inherit<P: Record>(
        &mut self,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> &mut Self {
        for entry in FieldTable::<P>::collect().entries {
            let kind = match entry.kind {
                FieldKind::Manual => FieldKind::Manual,
                FieldKind::Persisted { flags, access } => FieldKind::Persisted {
                    flags,
                    access: Arc::new(Nested {
                        get,
                        get_mut,
                        inner: access,
                    }),
                },
            };
            self.entries.push(FieldEntry { kind, ..entry });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Base {
        id: i64,
    }

    impl Record for Base {
        const NAME: &'static str = "Base";

        fn describe(table: &mut FieldTable<Self>) {
            table.persist("id", Persist::BOTH, |b| &b.id, |b| &mut b.id);
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
        name: String,
    }

    impl Record for Derived {
        const NAME: &'static str = "Derived";

        fn describe(table: &mut FieldTable<Self>) {
            table
                .inherit::<Base>(|d| &d.base, |d| &mut d.base)
                .field("name", |d| &d.name, |d| &mut d.name)
                .manual("scratch");
        }
    }

    fn access(entry: &FieldEntry) -> &Arc<dyn FieldAccess> {
        match &entry.kind {
            FieldKind::Persisted { access, .. } => access,
            FieldKind::Manual => panic!("{} is manual", entry.name),
        }
    }

    #[test]
    fn collect_lists_inherited_and_own_fields() {
        let entries = FieldTable::<Derived>::collect().into_entries();
        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.name, e.declaring_type))
            .collect();
        assert_eq!(
            summary,
            vec![("id", "Base"), ("name", "Derived"), ("scratch", "Derived")]
        );
        assert!(matches!(entries[2].kind, FieldKind::Manual));
    }

    #[test]
    fn nested_access_reads_and_writes_through_parent() {
        let entries = FieldTable::<Derived>::collect().into_entries();
        let id = access(&entries[0]);
        assert_eq!(id.value_type(), TypeKey::of::<i64>());

        let mut record = Derived::default();
        assert_eq!(id.assign(&mut record, Box::new(42i64)), Assign::Set);
        assert_eq!(record.base.id, 42);

        let value = id.get(&record).and_then(|v| v.downcast_ref::<i64>());
        assert_eq!(value, Some(&42));
    }

    #[test]
    fn mismatched_value_substitutes_default() {
        let entries = FieldTable::<Derived>::collect().into_entries();
        let name = access(&entries[1]);

        let mut record = Derived {
            name: "kept?".into(),
            ..Default::default()
        };
        assert_eq!(name.assign(&mut record, Box::new(5i32)), Assign::Substituted);
        assert_eq!(record.name, "");
    }

    #[test]
    fn wrong_owner_is_reported() {
        let entries = FieldTable::<Derived>::collect().into_entries();
        let mut other = Base::default();
        assert!(access(&entries[1]).get(&other).is_none());
        assert_eq!(
            access(&entries[1]).assign(&mut other, Box::new(String::new())),
            Assign::WrongOwner
        );
    }
}
