//! In-memory save fixtures shared by the integration tests

#![allow(dead_code)]

use std::io::Read;

use flate2::read::ZlibDecoder;
use nether_sav::*;

pub const CONSTRUCTOR: &str =
    "/Game/FactoryGame/Buildable/Factory/ConstructorMk1/Build_ConstructorMk1.Build_ConstructorMk1_C";
pub const CONVEYOR: &str =
    "/Game/FactoryGame/Buildable/Factory/ConveyorBeltMk1/Build_ConveyorBeltMk1.Build_ConveyorBeltMk1_C";
pub const INVENTORY: &str = "/Script/FactoryGame.FGInventoryComponent";
pub const SIGN: &str = "/Game/FactoryGame/Buildable/Factory/SignDigital/Build_StandaloneWidgetSign_Square.Build_StandaloneWidgetSign_Square_C";

/// Header with every gated field populated when its gate is open
pub fn header(save_header_type: i32, save_version: i32, build_version: i32) -> SaveHeader {
    SaveHeader {
        save_header_type,
        save_version,
        build_version,
        map_name: "Persistent_Level".into(),
        map_options: "?startloc=Grass Fields?sessionName=Fixture".into(),
        session_name: "Fixture".into(),
        play_duration_seconds: 3600,
        save_date_time: 638_400_000_000_000_000,
        session_visibility: 1,
        editor_object_version: if save_header_type >= 7 { 46 } else { 0 },
        mod_metadata: if save_header_type >= 8 {
            r#"{"Version":1,"Mods":[]}"#.into()
        } else {
            String::new()
        },
        is_modded_save: i32::from(save_header_type >= 8),
        save_identifier: if save_header_type >= 10 {
            "fixture-0001".into()
        } else {
            String::new()
        },
    }
}

fn reference(level: Option<&str>, path: String) -> ObjectReference {
    match level {
        Some(level) => ObjectReference::in_level(level, path),
        None => ObjectReference::new(path),
    }
}

fn path(level: Option<&str>, name: &str) -> String {
    format!("{}:PersistentLevel.{name}", level.unwrap_or("Persistent_Level"))
}

fn struct_property(name: &str, type_name: &str, value: StructValue) -> Property {
    Property::new(
        name,
        PropertyValue::Struct(StructProperty {
            type_name: type_name.into(),
            struct_guid: [0; 16],
            value,
        }),
    )
}

/// A sign's text; the `None` history only carries a string on newer builds
fn sign_text(build_version: i32, n: usize) -> TextValue {
    if build_version >= TEXT_CULTURE_INVARIANT_BUILD {
        TextValue {
            flags: 0,
            history: TextHistory::None {
                culture_invariant: Some(format!("Sign {n}")),
            },
        }
    } else {
        TextValue::base("", format!("K{n}"), format!("Sign {n}"))
    }
}

fn machine_properties(n: usize, inventory: &ObjectReference) -> Vec<Property> {
    vec![
        Property::new("mCurrentRecipe", PropertyValue::Object(ObjectReference::new(
            "/Game/FactoryGame/Recipes/Constructor/Recipe_IronPlate.Recipe_IronPlate_C",
        ))),
        Property::new("mOutputInventory", PropertyValue::Object(inventory.clone())),
        Property::new("mCurrentManufacturingProgress", PropertyValue::Float(n as f32 / 10.0)),
        Property::new("mTimeSinceStartStopProducing", PropertyValue::Double(12.5)),
        Property::new("mIsProducing", PropertyValue::Bool(n % 2 == 0)),
        struct_property(
            "mColorSlot",
            "LinearColor",
            StructValue::LinearColor(LinearColor {
                r: 0.5,
                g: 0.25,
                b: 1.0,
                a: 1.0,
            }),
        ),
        Property::new(
            "mProductionShards",
            PropertyValue::Array(ArrayValue::Int(vec![1, 2, 3])),
        ),
    ]
}

fn inventory_properties(n: usize) -> Vec<Property> {
    let stack = StructValue::Properties(vec![
        struct_property(
            "Item",
            "InventoryItem",
            StructValue::InventoryItem(InventoryItem {
                unknown: 0,
                item_name: "/Game/FactoryGame/Resource/Parts/IronPlate/Desc_IronPlate.Desc_IronPlate_C"
                    .into(),
                item_state: ObjectReference::null(),
                state: None,
            }),
        ),
        Property::new("NumItems", PropertyValue::Int(n as i32 * 7)),
    ]);
    vec![
        Property::new(
            "mInventoryStacks",
            PropertyValue::Array(ArrayValue::Struct(StructArray {
                type_name: "InventoryStack".into(),
                struct_guid: [0; 16],
                elements: vec![stack],
            })),
        ),
        Property::new(
            "mArbitrarySlotSizes",
            PropertyValue::Array(ArrayValue::Int(vec![0; 4])),
        ),
        Property::new(
            "mItemFilters",
            PropertyValue::Map(MapValue {
                key_type: PropertyKind::Int,
                value_type: PropertyKind::Object,
                mode: MapMode::Plain,
                entries: vec![MapEntry {
                    key: MapKey::Int(n as i32),
                    value: MapItem::Object(ObjectReference::null()),
                }],
            }),
        ),
    ]
}

/// Build a save with `per_level` machine/inventory pairs in every level.
///
/// Each level also gets a conveyor with an item trailer and a sign with text.
pub fn sample_game(header: SaveHeader, levels: &[Option<&str>], per_level: usize) -> SaveGame {
    let build_version = header.build_version;
    let mut game = SaveGame::new(header);

    for &level in levels {
        for n in 0..per_level {
            let machine_path = path(level, &format!("Build_ConstructorMk1_C_{n}"));
            let inventory_path = format!("{machine_path}.OutputInventory");
            let inventory = reference(level, inventory_path.clone());

            let mut transform = Transform::default();
            transform.translation = Vec3::new(n as f32 * 800.0, -1200.0, 300.0);
            let machine = ObjectRecord::actor(CONSTRUCTOR, reference(level, machine_path.clone()), transform);
            let entity = Entity {
                links: Some(ActorLinks {
                    parent: ObjectReference::null(),
                    children: vec![inventory.clone()],
                }),
                force_empty: false,
                properties: machine_properties(n, &inventory),
                trailer: if n % 3 == 0 {
                    Trailer::Opaque(vec![0xDE, 0xAD, 0xBE, 0xEF, n as u8])
                } else {
                    Trailer::None
                },
            };
            game.insert_object(level, machine, entity)
                .expect("unique machine path");

            let component = ObjectRecord::object(INVENTORY, inventory, machine_path);
            game.insert_object(level, component, Entity::with_properties(inventory_properties(n)))
                .expect("unique inventory path");
        }

        let belt = ObjectRecord::actor(
            CONVEYOR,
            reference(level, path(level, "Build_ConveyorBeltMk1_C_0")),
            Transform::default(),
        );
        let belt_entity = Entity {
            links: Some(ActorLinks::default()),
            force_empty: false,
            properties: vec![Property::new("mLength", PropertyValue::Float(800.0))],
            trailer: Trailer::Conveyor {
                count: 0,
                items: vec![ConveyorItem {
                    length: 0,
                    name: "/Game/FactoryGame/Resource/Parts/IronRod/Desc_IronRod.Desc_IronRod_C"
                        .into(),
                    state_level_name: String::new(),
                    state_path_name: String::new(),
                    position: 3.5,
                }],
            },
        };
        game.insert_object(level, belt, belt_entity)
            .expect("unique belt path");

        let sign = ObjectRecord::actor(
            SIGN,
            reference(level, path(level, "Build_StandaloneWidgetSign_Square_C_0")),
            Transform::default(),
        );
        let sign_entity = Entity {
            links: Some(ActorLinks::default()),
            force_empty: false,
            properties: vec![Property::new(
                "mSignText",
                PropertyValue::Text(sign_text(build_version, per_level)),
            )],
            trailer: Trailer::None,
        };
        game.insert_object(level, sign, sign_entity)
            .expect("unique sign path");

        let slot = game
            .levels
            .iter_mut()
            .find(|l| l.name.as_deref() == level)
            .expect("level created by insert_object");
        slot.collectables = vec![reference(level, path(level, "BP_Crystal_C_0"))];
    }
    game
}

/// Objects of a decoded or built game, in index order
pub fn objects(game: &SaveGame) -> Vec<IndexedObject> {
    game.index.iter().cloned().collect()
}

/// Encoded length of the uncompressed header
pub fn header_len(header: &SaveHeader) -> usize {
    let mut w = ByteWriter::new();
    nether_sav::stream::write_header(&mut w, header);
    w.len()
}

/// Parse chunk frames after `header_len`, returning each chunk's inflated payload
pub fn inflate_chunks(bytes: &[u8], header_len: usize) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut at = header_len;
    while at < bytes.len() {
        let word = |i: usize| {
            let start = at + i * 4;
            u32::from_le_bytes(bytes[start..start + 4].try_into().unwrap())
        };
        assert_eq!(word(0), PACKAGE_FILE_TAG);
        let compressed = word(4) as usize;
        let uncompressed = word(6) as usize;
        let payload = &bytes[at + 48..at + 48 + compressed];

        let mut inflated = Vec::new();
        ZlibDecoder::new(payload).read_to_end(&mut inflated).unwrap();
        assert_eq!(inflated.len(), uncompressed);
        chunks.push(inflated);
        at += 48 + compressed;
    }
    chunks
}

pub fn config(max_chunk_size: usize, batch_size: usize) -> CodecConfig {
    CodecConfig {
        max_chunk_size,
        batch_size,
        ..Default::default()
    }
}
