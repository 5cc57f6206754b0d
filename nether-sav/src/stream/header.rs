//! Uncompressed save header

use std::io::Read;

use crate::{
    error::Result,
    primitive::{ByteReader, ByteWriter},
    types::SaveHeader,
};

pub fn write_header(w: &mut ByteWriter, header: &SaveHeader) {
    w.write_i32(header.save_header_type);
    w.write_i32(header.save_version);
    w.write_i32(header.build_version);
    w.write_string(&header.map_name);
    w.write_string(&header.map_options);
    w.write_string(&header.session_name);
    w.write_i32(header.play_duration_seconds);
    w.write_i64(header.save_date_time);
    w.write_u8(header.session_visibility);

    if header.has_editor_object_version() {
        w.write_i32(header.editor_object_version);
    }
    if header.has_mod_metadata() {
        w.write_string(&header.mod_metadata);
        w.write_i32(header.is_modded_save);
    }
    if header.has_save_identifier() {
        w.write_string(&header.save_identifier);
    }
}

/// Read the header; fields gated off by `save_header_type` keep their defaults
pub fn read_header<R: Read>(r: &mut ByteReader<R>) -> Result<SaveHeader> {
    let mut header = SaveHeader {
        save_header_type: r.read_i32()?,
        save_version: r.read_i32()?,
        build_version: r.read_i32()?,
        map_name: r.read_string()?,
        map_options: r.read_string()?,
        session_name: r.read_string()?,
        play_duration_seconds: r.read_i32()?,
        save_date_time: r.read_i64()?,
        session_visibility: r.read_u8()?,
        editor_object_version: 0,
        mod_metadata: String::new(),
        is_modded_save: 0,
        save_identifier: String::new(),
    };

    if header.has_editor_object_version() {
        header.editor_object_version = r.read_i32()?;
    }
    if header.has_mod_metadata() {
        header.mod_metadata = r.read_string()?;
        header.is_modded_save = r.read_i32()?;
    }
    if header.has_save_identifier() {
        header.save_identifier = r.read_string()?;
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(save_header_type: i32) -> SaveHeader {
        SaveHeader {
            save_header_type,
            save_version: 30,
            build_version: 211_839,
            map_name: "Persistent_Level".into(),
            map_options: "?startloc=Grass Fields".into(),
            session_name: "Tölpel".into(),
            play_duration_seconds: 86_400,
            save_date_time: 638_000_000_000_000_000,
            session_visibility: 1,
            editor_object_version: if save_header_type >= 7 { 46 } else { 0 },
            mod_metadata: if save_header_type >= 8 { "{}".into() } else { String::new() },
            is_modded_save: if save_header_type >= 8 { 1 } else { 0 },
            save_identifier: if save_header_type >= 10 { "abc123".into() } else { String::new() },
        }
    }

    #[test]
    fn test_header_gates() {
        let mut sizes = Vec::new();
        for header_type in [6, 7, 8, 10] {
            let header = sample(header_type);
            let mut w = ByteWriter::new();
            write_header(&mut w, &header);
            sizes.push(w.len());

            let mut r = ByteReader::new(w.as_slice());
            assert_eq!(read_header(&mut r).unwrap(), header);
            assert_eq!(r.position(), w.len() as u64);
        }

        // editor object version: 4, mod metadata "{}" + flag: 7 + 4, identifier: 11
        assert_eq!(sizes[1] - sizes[0], 4);
        assert_eq!(sizes[2] - sizes[1], 11);
        assert_eq!(sizes[3] - sizes[2], 11);
    }

    #[test]
    fn test_gated_fields_ignored_below_threshold() {
        let mut header = sample(6);
        header.save_identifier = "dropped".into();
        let mut w = ByteWriter::new();
        write_header(&mut w, &header);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(read_header(&mut r).unwrap().save_identifier, "");
    }
}
