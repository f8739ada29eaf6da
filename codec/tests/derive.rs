use emberwire::{BlockPos, CodecContext, CodecError, Compound, Facing, Record, WireWriter};
use glam::DVec3;
use uuid::Uuid;

#[derive(Debug, Default, PartialEq, Record)]
struct Beacon {
    count: i32,
    label: String,
    at: BlockPos,
}

#[derive(Debug, Default, PartialEq, Record)]
#[record(name = "machine")]
struct Machine {
    #[persist]
    energy: i64,
    #[persist(wire = false)]
    owner: Uuid,
    #[persist(tree = false)]
    ticks: i32,
}

#[derive(Debug, Default, PartialEq)]
struct RecipeBook(Vec<String>);

#[derive(Debug, Default, PartialEq, Record)]
struct Furnace {
    #[inherit]
    machine: Machine,
    #[persist]
    fuel: i16,
    #[manual]
    recipes: RecipeBook,
    #[skip]
    scratch: RecipeBook,
    facing: Facing,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Clashing {
    #[inherit]
    machine: Machine,
    #[persist]
    energy: i64,
}

#[test]
fn derived_name_and_fields() {
    assert_eq!(Beacon::NAME, "Beacon");
    assert_eq!(Machine::NAME, "machine");

    let ctx = CodecContext::default();
    let meta = ctx.register_record::<Furnace>().unwrap();
    let fields: Vec<_> = meta
        .fields()
        .iter()
        .map(|f| (f.name(), f.declaring_type(), f.is_tree(), f.is_wire()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("energy", "machine", true, true),
            ("facing", "Furnace", true, true),
            ("fuel", "Furnace", true, true),
            ("owner", "machine", true, false),
            ("ticks", "machine", false, true),
        ]
    );
}

#[test]
fn unannotated_fields_follow_context_setting() {
    let ctx = CodecContext::builder().include_unannotated(false).build();
    let meta = ctx.register_record::<Furnace>().unwrap();
    let names: Vec<_> = meta.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["energy", "fuel", "owner", "ticks"]);

    let beacon = ctx.register_record::<Beacon>().unwrap();
    assert!(beacon.is_empty());
}

#[test]
fn derived_record_wire_round_trip() {
    let ctx = CodecContext::default();
    let original = Beacon {
        count: 7,
        label: "beta".into(),
        at: BlockPos::new(1, 2, 3),
    };
    let back: Beacon = ctx.from_wire(ctx.to_wire(&original).unwrap()).unwrap();
    assert_eq!(back, original);
}

#[test]
fn manual_and_skipped_fields_are_untouched() {
    let ctx = CodecContext::default();
    let furnace = Furnace {
        machine: Machine {
            energy: 500,
            owner: Uuid::from_u128(3),
            ticks: 12,
        },
        fuel: 64,
        recipes: RecipeBook(vec!["ingot".into()]),
        scratch: RecipeBook(vec!["tmp".into()]),
        facing: Facing::West,
    };

    let tree = ctx.to_tree(&furnace).unwrap();
    assert!(!tree.contains("recipes"));
    assert!(!tree.contains("scratch"));
    assert!(!tree.contains("ticks"));

    let mut target = Furnace {
        recipes: RecipeBook(vec!["mine".into()]),
        ..Default::default()
    };
    ctx.deserialize_from_tree(&tree, &mut target).unwrap();
    assert_eq!(target.recipes, RecipeBook(vec!["mine".into()]));
    assert_eq!(target.machine.energy, 500);
    assert_eq!(target.machine.owner, Uuid::from_u128(3));
    assert_eq!(target.machine.ticks, 0);
    assert_eq!(target.facing, Facing::West);

    let back: Furnace = ctx.from_wire(ctx.to_wire(&furnace).unwrap()).unwrap();
    assert_eq!(back.machine.ticks, 12);
    assert_eq!(back.machine.owner, Uuid::nil());
    assert_eq!(back.fuel, 64);
    assert_eq!(back.recipes, RecipeBook::default());
}

#[test]
fn selective_update_on_inherited_field() {
    let ctx = CodecContext::default();
    let mut sender = Furnace::default();
    sender.machine.energy = 1234;
    sender.fuel = 9;

    let mut sink = WireWriter::new();
    ctx.serialize_fields(&sender, &["energy"], &mut sink).unwrap();

    let mut receiver = Furnace {
        fuel: 2,
        ..Default::default()
    };
    ctx.deserialize_fields(&mut ctx.reader(sink.freeze()), &mut receiver)
        .unwrap();
    assert_eq!(receiver.machine.energy, 1234);
    assert_eq!(receiver.fuel, 2);
}

#[test]
fn inherited_name_clash_is_rejected() {
    let ctx = CodecContext::default();
    match ctx.register_record::<Clashing>() {
        Err(CodecError::DuplicateField {
            field,
            record,
            first,
            second,
        }) => {
            assert_eq!(field, "energy");
            assert_eq!(record, "Clashing");
            assert_eq!((first, second), ("Clashing", "machine"));
        }
        other => panic!("expected DuplicateField, got {other:?}"),
    }
}

#[test]
fn generic_tree_helpers_accept_derived_records() {
    #[derive(Default, Record)]
    struct Probe {
        offset: DVec3,
    }

    let ctx = CodecContext::default();
    let tree = ctx
        .to_tree(&Probe {
            offset: DVec3::new(1.0, 2.0, 3.0),
        })
        .unwrap();
    let offset = tree.get_compound("offset").cloned().unwrap_or_else(Compound::new);
    assert_eq!(offset.get_double("Y"), Some(2.0));
}
