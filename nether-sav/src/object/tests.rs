//! Tests for records, entities and trailers

use super::*;
use crate::context::Registries;
use crate::types::*;

const CONVEYOR: &str =
    "/Game/FactoryGame/Buildable/Factory/ConveyorBeltMk3/Build_ConveyorBeltMk3.Build_ConveyorBeltMk3_C";
const POWER_LINE: &str =
    "/Game/FactoryGame/Buildable/Factory/PowerLine/Build_PowerLine.Build_PowerLine_C";
const GAME_STATE: &str = "/Game/FactoryGame/-Shared/Blueprint/BP_GameState.BP_GameState_C";
const CIRCUITS: &str =
    "/Game/FactoryGame/-Shared/Blueprint/BP_CircuitSubsystem.BP_CircuitSubsystem_C";
const LOCOMOTIVE: &str =
    "/Game/FactoryGame/Buildable/Vehicle/Train/Locomotive/BP_Locomotive.BP_Locomotive_C";
const TRUCK: &str = "/Game/FactoryGame/Buildable/Vehicle/Truck/BP_Truck.BP_Truck_C";
const CONSTRUCTOR: &str =
    "/Game/FactoryGame/Buildable/Factory/ConstructorMk1/Build_ConstructorMk1.Build_ConstructorMk1_C";

fn with_ctx<T>(f: impl FnOnce(&CodecContext<'_>) -> T) -> T {
    let header = SaveHeader::default();
    let registries = Registries::default();
    f(&CodecContext::new(&header, &registries))
}

fn reference(path: &str) -> ObjectReference {
    ObjectReference::new(format!("Persistent_Level:PersistentLevel.{path}"))
}

fn actor(class_name: &str, path: &str) -> ObjectRecord {
    ObjectRecord::actor(class_name, reference(path), Transform::default())
}

fn entity_roundtrip(record: &ObjectRecord, entity: &Entity) -> Entity {
    with_ctx(|ctx| {
        let mut w = ByteWriter::new();
        let len = write_entity(&mut w, ctx, record, entity).unwrap();
        assert_eq!(len as usize + 4, w.len());

        let mut r = ByteReader::new(w.as_slice());
        let decoded = read_entity(&mut r, ctx, record).unwrap();
        assert_eq!(r.position(), w.len() as u64);
        decoded
    })
}

fn slot(name: &str) -> VehicleSlot {
    VehicleSlot {
        name: name.into(),
        data: (0..VEHICLE_SLOT_DATA_LEN as u8).collect(),
    }
}

#[test]
fn test_object_record_roundtrip() {
    with_ctx(|ctx| {
        let record = ObjectRecord::object(
            "/Script/FactoryGame.FGInventoryComponent",
            reference("Build_StorageContainerMk1_C_1.StorageInventory"),
            "Persistent_Level:PersistentLevel.Build_StorageContainerMk1_C_1",
        );
        let mut w = ByteWriter::new();
        write_record(&mut w, ctx, &record);
        assert_eq!(&w.as_slice()[0..4], &0i32.to_le_bytes());

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(read_record(&mut r, ctx).unwrap(), record);
    });
}

#[test]
fn test_actor_record_roundtrip() {
    with_ctx(|ctx| {
        let mut record = actor(CONSTRUCTOR, "Build_ConstructorMk1_C_7");
        if let RecordKind::Actor(header) = &mut record.kind {
            header.need_transform = 1;
            header.was_placed_in_level = 1;
            header.transform = Transform {
                rotation: Vec4::new(0.0, 0.0, 0.7071, 0.7071),
                translation: Vec3::new(-499_999.0, 500_000.0, 12.0),
                scale: Vec3::new(1.0, 1.0, 2.0),
            };
        }
        let mut w = ByteWriter::new();
        write_record(&mut w, ctx, &record);
        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(read_record(&mut r, ctx).unwrap(), record);
    });
}

#[test]
fn test_out_of_bounds_actor_clamped() {
    with_ctx(|ctx| {
        let mut record = actor(CONSTRUCTOR, "Build_ConstructorMk1_C_8");
        if let RecordKind::Actor(header) = &mut record.kind {
            header.transform.translation = Vec3::new(600_000.0, 0.0, 50.0);
        }
        let mut w = ByteWriter::new();
        write_record(&mut w, ctx, &record);
        let mut r = ByteReader::new(w.as_slice());
        let decoded = read_record(&mut r, ctx).unwrap();
        match decoded.kind {
            RecordKind::Actor(header) => {
                assert_eq!(header.transform.translation, SAFE_TRANSLATION);
                assert_eq!(header.transform.scale, Vec3::new(1.0, 1.0, 1.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    });
}

#[test]
fn test_unknown_record_type() {
    with_ctx(|ctx| {
        let mut w = ByteWriter::new();
        w.write_i32(2);
        w.write_string("Class");
        w.write_string("Level");
        w.write_string("Path");
        let mut r = ByteReader::new(w.as_slice());
        assert!(matches!(
            read_record(&mut r, ctx),
            Err(SavError::CorruptData(_))
        ));
    });
}

#[test]
fn test_actor_entity_with_links() {
    let record = actor(CONSTRUCTOR, "Build_ConstructorMk1_C_1");
    let entity = Entity {
        links: Some(ActorLinks {
            parent: ObjectReference::null(),
            children: vec![
                reference("Build_ConstructorMk1_C_1.InputInventory"),
                reference("Build_ConstructorMk1_C_1.PowerConnection"),
            ],
        }),
        force_empty: false,
        properties: vec![
            Property::new("mCurrentRecipe", PropertyValue::Object(reference("Recipe"))),
            Property::new("mIsProducing", PropertyValue::Bool(true)),
        ],
        trailer: Trailer::None,
    };
    assert_eq!(entity_roundtrip(&record, &entity), entity);
}

#[test]
fn test_object_entity_has_no_links() {
    let record = ObjectRecord::object("/Script/FactoryGame.FGPowerInfoComponent", reference("P"), "O");
    let entity = Entity::with_properties(vec![Property::new(
        "mTargetConsumption",
        PropertyValue::Float(30.0),
    )]);
    assert_eq!(entity_roundtrip(&record, &entity), entity);
}

#[test]
fn test_force_empty_entities() {
    let record = actor(CONSTRUCTOR, "Build_ConstructorMk1_C_2");
    let entity = Entity {
        links: Some(ActorLinks::default()),
        force_empty: true,
        properties: vec![Property::new("ignored", PropertyValue::Int(1))],
        trailer: Trailer::None,
    };
    let decoded = entity_roundtrip(&record, &entity);
    assert!(decoded.force_empty);
    assert!(decoded.properties.is_empty());
    assert_eq!(decoded.links, Some(ActorLinks::default()));

    let object = ObjectRecord::object("/Script/Engine.SceneComponent", reference("C"), "O");
    with_ctx(|ctx| {
        let mut w = ByteWriter::new();
        let len = write_entity(
            &mut w,
            ctx,
            &object,
            &Entity {
                force_empty: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(len, 0);
        let mut r = ByteReader::new(w.as_slice());
        assert!(read_entity(&mut r, ctx, &object).unwrap().force_empty);
    });
}

#[test]
fn test_entity_body_overrun_is_corrupt() {
    let record = ObjectRecord::object("/Script/FactoryGame.FGTest", reference("T"), "O");
    let entity = Entity::with_properties(vec![Property::new("mValue", PropertyValue::Int(3))]);
    with_ctx(|ctx| {
        let mut w = ByteWriter::new();
        write_entity(&mut w, ctx, &record, &entity).unwrap();
        let mut bytes = w.into_inner();
        bytes[0..4].copy_from_slice(&8i32.to_le_bytes());
        let mut r = ByteReader::new(bytes.as_slice());
        assert!(matches!(
            read_entity(&mut r, ctx, &record),
            Err(SavError::CorruptData(_))
        ));
    });
}

#[test]
fn test_unknown_class_trailer_kept_verbatim() {
    let record = ObjectRecord::object("/Mods/Unknown.Thing_C", reference("M"), "O");
    let entity = Entity {
        trailer: Trailer::Opaque(vec![1, 2, 3, 4, 5, 6, 7]),
        ..Default::default()
    };
    assert_eq!(entity_roundtrip(&record, &entity), entity);

    let empty = Entity {
        trailer: Trailer::Opaque(vec![]),
        ..Default::default()
    };
    assert_eq!(entity_roundtrip(&record, &empty), empty);
}

#[test]
fn test_registered_trailers_roundtrip() {
    let cases = vec![
        (
            actor(CONVEYOR, "Belt"),
            Trailer::Conveyor {
                count: 0,
                items: vec![ConveyorItem {
                    length: 0,
                    name: "/Game/FactoryGame/Resource/Parts/IronPlate/Desc_IronPlate.Desc_IronPlate_C"
                        .into(),
                    state_level_name: String::new(),
                    state_path_name: String::new(),
                    position: 1.25,
                }],
            },
        ),
        (
            actor(GAME_STATE, "GameState"),
            Trailer::GameState {
                count: 0,
                objects: vec![reference("Char_Player_C_0"), reference("Char_Player_C_1")],
            },
        ),
        (
            actor(POWER_LINE, "Line"),
            Trailer::PowerLine {
                count: 0,
                source: reference("A.PowerConnection"),
                target: reference("B.PowerConnection"),
            },
        ),
        (
            actor(CIRCUITS, "Circuits"),
            Trailer::CircuitSubsystem {
                count: 0,
                circuits: vec![Circuit {
                    circuit_id: 7,
                    reference: reference("PowerCircuit_7"),
                }],
            },
        ),
        (
            actor(LOCOMOTIVE, "Loco"),
            Trailer::Train {
                count: 0,
                slots: vec![slot("VehicleWheel_0")],
                previous: ObjectReference::null(),
                next: reference("Wagon"),
            },
        ),
        (
            actor(TRUCK, "Truck"),
            Trailer::Vehicle {
                count: 0,
                slots: vec![slot("Wheel_0"), slot("Wheel_1")],
            },
        ),
    ];

    for (record, trailer) in cases {
        let entity = Entity {
            links: Some(ActorLinks::default()),
            trailer,
            ..Default::default()
        };
        assert_eq!(entity_roundtrip(&record, &entity), entity, "{}", record.class_name);
    }
}

#[test]
fn test_registered_trailer_leftover_is_corrupt() {
    let record = actor(POWER_LINE, "Line");
    let entity = Entity {
        links: Some(ActorLinks::default()),
        trailer: Trailer::PowerLine {
            count: 0,
            source: reference("A"),
            target: reference("B"),
        },
        ..Default::default()
    };
    with_ctx(|ctx| {
        let mut w = ByteWriter::new();
        let len = write_entity(&mut w, ctx, &record, &entity).unwrap();
        let mut bytes = w.into_inner();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        bytes[0..4].copy_from_slice(&(len as i32 + 2).to_le_bytes());

        let mut r = ByteReader::new(bytes.as_slice());
        assert!(matches!(
            read_entity(&mut r, ctx, &record),
            Err(SavError::CorruptData(_))
        ));
    });
}

#[test]
fn test_custom_trailer_registration() {
    let mut registries = Registries::default();
    registries
        .trailers
        .register("/Mods/Carts/BP_Cart.BP_Cart_C", TrailerShape::Vehicle);
    assert_eq!(
        registries.trailers.shape("/Mods/Carts/BP_Cart.BP_Cart_C"),
        TrailerShape::Vehicle
    );
    assert_eq!(registries.trailers.shape(CONSTRUCTOR), TrailerShape::Opaque);
    assert_eq!(registries.trailers.shape(CONVEYOR), TrailerShape::Conveyor);
    assert_eq!(
        registries.trailers.shape(
            "/Game/FactoryGame/Buildable/Factory/ConveyorLiftMk6/Build_ConveyorLiftMk6.Build_ConveyorLiftMk6_C"
        ),
        TrailerShape::Conveyor
    );
}
