//! Tagged property codec
//!
//! Every property is written as:
//!
//! ```text
//! name | "<Kind>Property" | i32 size | i32 index | tag data | u8 hasGuid [guid] | payload
//! ```
//!
//! `size` counts the payload only. It is measured from the writer's running
//! position, so nested containers never need a scratch buffer. A list of
//! properties ends with the name `None`.
//!
//! Struct payloads are resolved through a [`StructRegistry`]; unknown struct
//! types are nested property lists.

mod decode;
mod encode;
mod structs;
mod text;

pub use decode::{read_properties, read_property};
pub use encode::{write_properties, write_property};
pub use structs::{StructRegistry, StructShape};

pub(crate) use structs::{read_vec3, read_vec4, write_vec3, write_vec4};
