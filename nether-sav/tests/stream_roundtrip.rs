//! Whole-file encode/decode scenarios

mod common;

use common::*;
use nether_sav::*;

fn read_i32(body: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(body[at..at + 4].try_into().unwrap())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[tokio::test]
async fn test_chunk_size_does_not_change_graph() {
    let game = sample_game(
        header(10, 30, 211_839),
        &[Some("Level_1"), Some("Level_2"), None],
        6,
    );

    let mut chunk_counts = Vec::new();
    for max in [64, 1024, 131_072] {
        let bytes = game.encode(config(max, 5000), &mut NoProgress).await.unwrap();
        let decoded = decode_save(bytes.as_slice()).unwrap();

        assert_eq!(decoded.header, game.header);
        assert_eq!(decoded.levels, game.levels);
        assert_eq!(objects(&decoded), objects(&game), "max chunk size {max}");

        let again = decoded.encode(config(max, 5000), &mut NoProgress).await.unwrap();
        assert_eq!(again, bytes, "re-encode with max chunk size {max}");
        chunk_counts.push(decoded.chunk_count);
    }

    assert!(chunk_counts[0] > chunk_counts[1]);
    assert_eq!(chunk_counts[2], 1);
}

#[tokio::test]
async fn test_batch_size_does_not_change_bytes() {
    let game = sample_game(header(10, 30, 211_839), &[Some("Level_1"), None], 5);
    let one = game.encode(config(1024, 1), &mut NoProgress).await.unwrap();
    let all = game.encode(config(1024, 5000), &mut NoProgress).await.unwrap();
    assert_eq!(one, all);
}

#[tokio::test]
async fn test_section_lengths_patched_across_many_chunks() {
    let game = sample_game(header(10, 30, 211_839), &[Some("Level_1"), None], 8);
    let bytes = game.encode(config(64, 1), &mut NoProgress).await.unwrap();

    let decoded = decode_save(bytes.as_slice()).unwrap();
    assert!(decoded.chunk_count > 20);
    assert_eq!(objects(&decoded), objects(&game));

    let chunks = inflate_chunks(&bytes, header_len(&game.header));
    let body: Vec<u8> = chunks.concat();
    assert_eq!(read_i32(&body, 0) as usize, body.len() - 4);
}

#[tokio::test]
async fn test_level_layout_follows_save_version() {
    let legacy = sample_game(header(10, 28, 155_000), &[None], 2);
    let bytes = legacy.encode(config(131_072, 5000), &mut NoProgress).await.unwrap();
    let body = inflate_chunks(&bytes, header_len(&legacy.header)).concat();
    assert_eq!(read_i32(&body, 0) as usize, body.len() - 4);
    // No level count or section length: the object count follows directly
    assert_eq!(read_i32(&body, 4) as usize, legacy.index.len());

    let streamed = sample_game(
        header(10, 30, 155_000),
        &[Some("Level_1"), Some("Level_2"), None],
        2,
    );
    let bytes = streamed.encode(config(131_072, 5000), &mut NoProgress).await.unwrap();
    let body = inflate_chunks(&bytes, header_len(&streamed.header)).concat();
    assert_eq!(read_i32(&body, 4), 2);
    assert_eq!(read_i32(&body, 8), 8);
    assert_eq!(&body[12..20], b"Level_1\0");
    let per_level = streamed.level(Some("Level_1")).unwrap().object_keys.len();
    assert_eq!(read_i32(&body, 24) as usize, per_level);

    let decoded = decode_save(bytes.as_slice()).unwrap();
    assert_eq!(decoded.levels.len(), 3);
    assert_eq!(decoded.levels[2].name, None);
}

#[tokio::test]
async fn test_legacy_version_rejects_multiple_levels() {
    let game = sample_game(header(10, 28, 155_000), &[None], 1);
    let plans = [LevelPlan::named("Level_1"), LevelPlan::persistent()];
    let mut encoder = SaveEncoder::new(game.header.clone(), CodecConfig::default()).unwrap();
    let mut provider = IndexProvider::new(&game);

    let result = encoder.encode(&plans, &mut provider, &mut NoProgress).await;
    assert!(matches!(result, Err(SavError::InvalidConfig(_))));
    assert_eq!(encoder.state(), &EncodeState::Failed);
}

#[tokio::test]
async fn test_every_gate_reproduces_byte_exactly() {
    for header_type in [6, 8, 10] {
        for save_version in [28, 30] {
            for build_version in [140_000, 211_839] {
                let levels: &[Option<&str>] = if save_version >= LEVEL_STREAMING_SAVE_VERSION {
                    &[Some("Level_1"), None]
                } else {
                    &[None]
                };
                let game = sample_game(header(header_type, save_version, build_version), levels, 2);
                let bytes = game.encode(config(1024, 5000), &mut NoProgress).await.unwrap();

                let decoded = decode_save(bytes.as_slice()).unwrap();
                assert_eq!(decoded.header, game.header);
                assert_eq!(objects(&decoded), objects(&game));

                let again = decoded.encode(config(1024, 5000), &mut NoProgress).await.unwrap();
                assert_eq!(
                    again, bytes,
                    "header type {header_type}, version {save_version}, build {build_version}"
                );
            }
        }
    }
}

#[tokio::test]
async fn test_oversized_entity_ends_its_chunk() {
    let object = |name: &str| {
        ObjectRecord::object(
            INVENTORY,
            ObjectReference::new(format!("Persistent_Level:PersistentLevel.{name}")),
            "",
        )
    };
    let mut game = SaveGame::new(header(10, 30, 211_839));
    game.insert_object(
        None,
        object("Small_A"),
        Entity::with_properties(vec![Property::new("mFirst", PropertyValue::Int(1))]),
    )
    .unwrap();
    game.insert_object(
        None,
        object("Huge_B"),
        Entity::with_properties(vec![Property::new(
            "mPayload",
            PropertyValue::Str("x".repeat(1000)),
        )]),
    )
    .unwrap();
    game.insert_object(
        None,
        object("Small_C"),
        Entity::with_properties(vec![Property::new(
            "mMarkerAfterOversized",
            PropertyValue::Int(3),
        )]),
    )
    .unwrap();

    let bytes = game.encode(config(256, 5000), &mut NoProgress).await.unwrap();
    let chunks = inflate_chunks(&bytes, header_len(&game.header));
    let body = chunks.concat();

    // body length prefix, then the property name's string length prefix
    let marker = find(&body, b"mMarkerAfterOversized").unwrap();
    let entity_start = marker - 8;
    let boundaries: Vec<usize> = chunks
        .iter()
        .scan(0, |end, chunk| {
            *end += chunk.len();
            Some(*end)
        })
        .collect();
    assert!(
        boundaries.contains(&entity_start),
        "entity after the oversized one starts at {entity_start}, chunk ends {boundaries:?}"
    );

    let decoded = decode_save(bytes.as_slice()).unwrap();
    assert_eq!(objects(&decoded), objects(&game));
}

#[tokio::test]
async fn test_truncated_file_is_corrupt() {
    let game = sample_game(header(10, 30, 211_839), &[None], 2);
    let bytes = game.encode(config(1024, 5000), &mut NoProgress).await.unwrap();

    let header_len = header_len(&game.header);
    let err = decode_save(&bytes[..header_len - 2]).unwrap_err();
    assert!(matches!(err, SavError::CorruptData(_)));

    let err = decode_save(&bytes[..bytes.len() - 10]).unwrap_err();
    assert!(matches!(err, SavError::InvalidChunk(_)));
}

#[tokio::test]
async fn test_duplicate_path_name_is_corrupt() {
    let record = ObjectRecord::object(
        INVENTORY,
        ObjectReference::new("Persistent_Level:PersistentLevel.Dup"),
        "",
    );
    let mut game = SaveGame::new(header(10, 30, 211_839));
    game.insert_object(None, record, Entity::default()).unwrap();
    // Listing the key twice makes the provider serve the same object twice
    let key = game.levels[0].object_keys[0].clone();
    game.levels[0].object_keys.push(key);

    let bytes = game.encode(CodecConfig::default(), &mut NoProgress).await.unwrap();
    assert!(matches!(
        decode_save(bytes.as_slice()),
        Err(SavError::CorruptData(msg)) if msg.contains("duplicate")
    ));
}
