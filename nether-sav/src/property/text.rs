//! Localized text payloads

use std::io::Read;

use tracing::warn;

use crate::{
    TEXT_CULTURE_INVARIANT_BUILD,
    context::CodecContext,
    error::{Result, SavError},
    primitive::{ByteReader, ByteWriter},
    types::{FormatArgument, FormatArgumentValue, TextHistory, TextValue},
};

/// Why `text` cannot be written, if anything
pub(crate) fn text_problem(text: &TextValue) -> Option<String> {
    match &text.history {
        TextHistory::Base { .. } | TextHistory::None { .. } => None,
        TextHistory::Format {
            history_type,
            source,
            arguments,
        } => {
            if !matches!(*history_type, 1 | 3) {
                return Some(format!("format text with history type {history_type}"));
            }
            text_problem(source).or_else(|| {
                arguments.iter().find_map(|argument| match &argument.value {
                    FormatArgumentValue::Text(text) => text_problem(text),
                    _ => None,
                })
            })
        }
        TextHistory::Transform { source, .. } => text_problem(source),
    }
}

/// Write a text payload; `text` must pass [`text_problem`]
pub(crate) fn write_text(w: &mut ByteWriter, ctx: &CodecContext<'_>, text: &TextValue) {
    w.write_i32(text.flags);
    w.write_u8(text.history.history_type());

    match &text.history {
        TextHistory::Base {
            namespace,
            key,
            value,
        } => {
            w.write_string(namespace);
            w.write_string(key);
            w.write_string(value);
        }
        TextHistory::Format {
            source, arguments, ..
        } => {
            write_text(w, ctx, source);
            w.write_i32(arguments.len() as i32);
            for argument in arguments {
                w.write_string(&argument.name);
                w.write_u8(argument.value.value_type());
                match &argument.value {
                    FormatArgumentValue::Int(v) => w.write_i64(*v),
                    FormatArgumentValue::UInt(v) => w.write_u64(*v),
                    FormatArgumentValue::Float(v) => w.write_f32(*v),
                    FormatArgumentValue::Double(v) => w.write_f64(*v),
                    FormatArgumentValue::Text(v) => write_text(w, ctx, v),
                    FormatArgumentValue::Gender(v) => w.write_u8(*v),
                }
            }
        }
        TextHistory::Transform {
            source,
            transform_type,
        } => {
            write_text(w, ctx, source);
            w.write_u8(*transform_type);
        }
        TextHistory::None { culture_invariant } => {
            if ctx.build_version() >= TEXT_CULTURE_INVARIANT_BUILD {
                match culture_invariant {
                    Some(value) => {
                        w.write_i32(1);
                        w.write_string(value);
                    }
                    None => w.write_i32(0),
                }
            } else if let Some(value) = culture_invariant {
                warn!(
                    build = ctx.build_version(),
                    value = %value,
                    "dropping culture invariant string before build {TEXT_CULTURE_INVARIANT_BUILD}"
                );
            }
        }
    }
}

pub(crate) fn read_text<R: Read>(r: &mut ByteReader<R>, ctx: &CodecContext<'_>) -> Result<TextValue> {
    let flags = r.read_i32()?;
    let history_type = r.read_u8()?;

    let history = match history_type {
        0 => TextHistory::Base {
            namespace: r.read_string()?,
            key: r.read_string()?,
            value: r.read_string()?,
        },
        1 | 3 => {
            let source = Box::new(read_text(r, ctx)?);
            let count = r.read_count("text argument")?;
            let mut arguments = Vec::new();
            for _ in 0..count {
                let name = r.read_string()?;
                let value = match r.read_u8()? {
                    0 => FormatArgumentValue::Int(r.read_i64()?),
                    1 => FormatArgumentValue::UInt(r.read_u64()?),
                    2 => FormatArgumentValue::Float(r.read_f32()?),
                    3 => FormatArgumentValue::Double(r.read_f64()?),
                    4 => FormatArgumentValue::Text(read_text(r, ctx)?),
                    5 => FormatArgumentValue::Gender(r.read_u8()?),
                    other => {
                        return Err(SavError::UnsupportedProperty(format!(
                            "text argument value type {other}"
                        )));
                    }
                };
                arguments.push(FormatArgument { name, value });
            }
            TextHistory::Format {
                history_type,
                source,
                arguments,
            }
        }
        10 => TextHistory::Transform {
            source: Box::new(read_text(r, ctx)?),
            transform_type: r.read_u8()?,
        },
        255 => {
            let culture_invariant = if ctx.build_version() >= TEXT_CULTURE_INVARIANT_BUILD {
                match r.read_i32()? {
                    0 => None,
                    1 => Some(r.read_string()?),
                    other => {
                        return Err(SavError::CorruptData(format!(
                            "culture invariant flag {other}"
                        )));
                    }
                }
            } else {
                None
            };
            TextHistory::None { culture_invariant }
        }
        other => {
            return Err(SavError::UnsupportedProperty(format!(
                "text history type {other}"
            )));
        }
    };

    Ok(TextValue { flags, history })
}
