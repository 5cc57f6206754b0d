//! Class-specific entity trailers

use std::io::Read;

use hashbrown::HashMap;
use tracing::warn;

use crate::{
    context::CodecContext,
    error::{Result, SavError},
    primitive::{ByteReader, ByteWriter},
    types::{Circuit, ConveyorItem, Trailer, VEHICLE_SLOT_DATA_LEN, VehicleSlot},
};

/// Layout of the block following an entity's property list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrailerShape {
    Conveyor,
    GameState,
    PowerLine,
    CircuitSubsystem,
    Train,
    Vehicle,
    /// Unknown content: kept verbatim
    Opaque,
}

const GAME_STATE_CLASSES: &[&str] = &[
    "/Game/FactoryGame/-Shared/Blueprint/BP_GameState.BP_GameState_C",
    "/Game/FactoryGame/-Shared/Blueprint/BP_GameMode.BP_GameMode_C",
];

const POWER_LINE_CLASSES: &[&str] = &[
    "/Game/FactoryGame/Buildable/Factory/PowerLine/Build_PowerLine.Build_PowerLine_C",
    "/Game/FactoryGame/Events/Christmas/Buildings/PowerLineLights/Build_XmassLightsLine.Build_XmassLightsLine_C",
    "/FlexSplines/PowerLine/Build_FlexPowerline.Build_FlexPowerline_C",
    "/AB_CableMod/Visuals1/Build_AB-PLCopper.Build_AB-PLCopper_C",
    "/AB_CableMod/Visuals1/Build_AB-PLCaterium.Build_AB-PLCaterium_C",
    "/AB_CableMod/Visuals3/Build_AB-PLHeavy.Build_AB-PLHeavy_C",
    "/AB_CableMod/Visuals4/Build_AB-SPLight.Build_AB-SPLight_C",
    "/AB_CableMod/Visuals3/Build_AB-PLPaintable.Build_AB-PLPaintable_C",
];

const CIRCUIT_SUBSYSTEM_CLASS: &str =
    "/Game/FactoryGame/-Shared/Blueprint/BP_CircuitSubsystem.BP_CircuitSubsystem_C";

const TRAIN_CLASSES: &[&str] = &[
    "/Game/FactoryGame/Buildable/Vehicle/Train/Locomotive/BP_Locomotive.BP_Locomotive_C",
    "/Game/FactoryGame/Buildable/Vehicle/Train/Wagon/BP_FreightWagon.BP_FreightWagon_C",
];

const VEHICLE_CLASSES: &[&str] = &[
    "/Game/FactoryGame/Buildable/Vehicle/Tractor/BP_Tractor.BP_Tractor_C",
    "/Game/FactoryGame/Buildable/Vehicle/Truck/BP_Truck.BP_Truck_C",
    "/Game/FactoryGame/Buildable/Vehicle/Explorer/BP_Explorer.BP_Explorer_C",
    "/Game/FactoryGame/Buildable/Vehicle/Cyberwagon/Testa_BP_WB.Testa_BP_WB_C",
    "/Game/FactoryGame/Buildable/Vehicle/Golfcart/BP_Golfcart.BP_Golfcart_C",
    "/Game/FactoryGame/Buildable/Vehicle/Golfcart/BP_GolfcartGold.BP_GolfcartGold_C",
];

/// className → trailer shape table; unlisted classes are [`TrailerShape::Opaque`]
#[derive(Debug, Clone)]
pub struct TrailerRegistry {
    shapes: HashMap<String, TrailerShape>,
}

impl Default for TrailerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailerRegistry {
    /// Registry with the built-in classes
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for tier in 1..=6 {
            for kind in ["ConveyorBelt", "ConveyorLift"] {
                registry.register(
                    format!(
                        "/Game/FactoryGame/Buildable/Factory/{kind}Mk{tier}/Build_{kind}Mk{tier}.Build_{kind}Mk{tier}_C"
                    ),
                    TrailerShape::Conveyor,
                );
            }
        }
        let tables: [(&[&str], TrailerShape); 5] = [
            (GAME_STATE_CLASSES, TrailerShape::GameState),
            (POWER_LINE_CLASSES, TrailerShape::PowerLine),
            (&[CIRCUIT_SUBSYSTEM_CLASS], TrailerShape::CircuitSubsystem),
            (TRAIN_CLASSES, TrailerShape::Train),
            (VEHICLE_CLASSES, TrailerShape::Vehicle),
        ];
        for (classes, shape) in tables {
            for class in classes {
                registry.register(*class, shape);
            }
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            shapes: HashMap::new(),
        }
    }

    pub fn register(&mut self, class_name: impl Into<String>, shape: TrailerShape) {
        self.shapes.insert(class_name.into(), shape);
    }

    pub fn shape(&self, class_name: &str) -> TrailerShape {
        self.shapes
            .get(class_name)
            .copied()
            .unwrap_or(TrailerShape::Opaque)
    }
}

impl Trailer {
    pub fn shape(&self) -> TrailerShape {
        match self {
            Self::Conveyor { .. } => TrailerShape::Conveyor,
            Self::GameState { .. } => TrailerShape::GameState,
            Self::PowerLine { .. } => TrailerShape::PowerLine,
            Self::CircuitSubsystem { .. } => TrailerShape::CircuitSubsystem,
            Self::Train { .. } => TrailerShape::Train,
            Self::Vehicle { .. } => TrailerShape::Vehicle,
            Self::None | Self::Opaque(_) => TrailerShape::Opaque,
        }
    }
}

fn write_slots(w: &mut ByteWriter, slots: &[VehicleSlot]) {
    w.write_i32(slots.len() as i32);
    for slot in slots {
        w.write_string(&slot.name);
        if slot.data.len() == VEHICLE_SLOT_DATA_LEN {
            w.write_bytes(&slot.data);
        } else {
            warn!(
                slot = %slot.name,
                len = slot.data.len(),
                "vehicle slot data resized to {VEHICLE_SLOT_DATA_LEN} bytes"
            );
            let mut data = slot.data.clone();
            data.resize(VEHICLE_SLOT_DATA_LEN, 0);
            w.write_bytes(&data);
        }
    }
}

fn read_slots<R: Read>(r: &mut ByteReader<R>) -> Result<Vec<VehicleSlot>> {
    let count = r.read_count("vehicle slot")?;
    let mut slots = Vec::new();
    for _ in 0..count {
        slots.push(VehicleSlot {
            name: r.read_string()?,
            data: r.read_bytes(VEHICLE_SLOT_DATA_LEN)?,
        });
    }
    Ok(slots)
}

/// Write the trailer of an entity of class `class_name`
pub fn write_trailer(w: &mut ByteWriter, ctx: &CodecContext<'_>, class_name: &str, trailer: &Trailer) {
    let registered = ctx.trailers().shape(class_name);
    if registered != trailer.shape() {
        warn!(
            class = class_name,
            "writing {:?} trailer for a class registered as {registered:?}",
            trailer.shape()
        );
    }

    match trailer {
        Trailer::None => w.write_i32(0),
        Trailer::Opaque(bytes) => w.write_bytes(bytes),
        Trailer::Conveyor { count, items } => {
            w.write_i32(*count);
            w.write_i32(items.len() as i32);
            for item in items {
                w.write_i32(item.length);
                w.write_string(&item.name);
                w.write_string(&item.state_level_name);
                w.write_string(&item.state_path_name);
                w.write_f32(item.position);
            }
        }
        Trailer::GameState { count, objects } => {
            w.write_i32(*count);
            w.write_i32(objects.len() as i32);
            for object in objects {
                ctx.write_reference(w, object);
            }
        }
        Trailer::PowerLine {
            count,
            source,
            target,
        } => {
            w.write_i32(*count);
            ctx.write_reference(w, source);
            ctx.write_reference(w, target);
        }
        Trailer::CircuitSubsystem { count, circuits } => {
            w.write_i32(*count);
            w.write_i32(circuits.len() as i32);
            for circuit in circuits {
                w.write_i32(circuit.circuit_id);
                ctx.write_reference(w, &circuit.reference);
            }
        }
        Trailer::Train {
            count,
            slots,
            previous,
            next,
        } => {
            w.write_i32(*count);
            write_slots(w, slots);
            ctx.write_reference(w, previous);
            ctx.write_reference(w, next);
        }
        Trailer::Vehicle { count, slots } => {
            w.write_i32(*count);
            write_slots(w, slots);
        }
    }
}

/// Read the trailer occupying the last `remaining` bytes of an entity body
pub fn read_trailer<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    class_name: &str,
    remaining: usize,
) -> Result<Trailer> {
    let start = r.position();
    let trailer = match ctx.trailers().shape(class_name) {
        TrailerShape::Opaque => {
            let bytes = r.read_bytes(remaining)?;
            if bytes == [0, 0, 0, 0] {
                Trailer::None
            } else {
                Trailer::Opaque(bytes)
            }
        }
        TrailerShape::Conveyor => {
            let count = r.read_i32()?;
            let len = r.read_count("conveyor item")?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(ConveyorItem {
                    length: r.read_i32()?,
                    name: r.read_string()?,
                    state_level_name: r.read_string()?,
                    state_path_name: r.read_string()?,
                    position: r.read_f32()?,
                });
            }
            Trailer::Conveyor { count, items }
        }
        TrailerShape::GameState => {
            let count = r.read_i32()?;
            let len = r.read_count("game state object")?;
            let mut objects = Vec::new();
            for _ in 0..len {
                objects.push(ctx.read_reference(r)?);
            }
            Trailer::GameState { count, objects }
        }
        TrailerShape::PowerLine => Trailer::PowerLine {
            count: r.read_i32()?,
            source: ctx.read_reference(r)?,
            target: ctx.read_reference(r)?,
        },
        TrailerShape::CircuitSubsystem => {
            let count = r.read_i32()?;
            let len = r.read_count("circuit")?;
            let mut circuits = Vec::new();
            for _ in 0..len {
                circuits.push(Circuit {
                    circuit_id: r.read_i32()?,
                    reference: ctx.read_reference(r)?,
                });
            }
            Trailer::CircuitSubsystem { count, circuits }
        }
        TrailerShape::Train => Trailer::Train {
            count: r.read_i32()?,
            slots: read_slots(r)?,
            previous: ctx.read_reference(r)?,
            next: ctx.read_reference(r)?,
        },
        TrailerShape::Vehicle => Trailer::Vehicle {
            count: r.read_i32()?,
            slots: read_slots(r)?,
        },
    };

    let consumed = r.position() - start;
    if consumed != remaining as u64 {
        return Err(SavError::length_mismatch(
            &format!("trailer of '{class_name}'"),
            remaining as u64,
            consumed,
        ));
    }
    Ok(trailer)
}
