use super::*;
use crate::bridge;
use crate::codec::index::encode_index;
use crate::codec::pack;
use crate::error::JonxError;
use crate::kernels::ZstdCodec;
use crate::types::{Record, StorageType};
use rand::Rng;
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn sample_records() -> Vec<Record> {
    vec![
        record(json!({"id": 3, "price": 10.5, "name": "pear", "ok": true, "meta": {"k": 1}})),
        record(json!({"id": 1, "price": 20.25, "name": "apple", "ok": false, "meta": [1, 2]})),
        record(json!({"id": 2, "price": -1.0, "name": "fig", "ok": true, "meta": null})),
    ]
}

fn sample_container() -> Vec<u8> {
    bridge::encode(&sample_records()).unwrap()
}

/// Lays out hand-built columns and indexes, bypassing detection and row checks.
fn assemble(columns: &[(&str, StorageType, Vec<Value>)], indexes: &[(&str, Vec<u32>)]) -> Vec<u8> {
    let codec = ZstdCodec::new(3);
    let schema = Schema::from_columns(columns.iter().map(|(name, ty, _)| (*name, *ty)));
    let parts = ContainerParts {
        schema_block: codec.compress(&schema.to_block().unwrap()).unwrap(),
        schema,
        column_blocks: columns
            .iter()
            .map(|(_, ty, values)| codec.compress(&pack(values, *ty).unwrap()).unwrap())
            .collect(),
        index_blocks: indexes
            .iter()
            .map(|(name, index)| {
                let block = codec.compress(&encode_index(index).unwrap()).unwrap();
                (name.to_string(), block)
            })
            .collect(),
    };
    to_bytes(&parts).unwrap()
}

#[test]
fn test_reader_exposes_schema_in_field_order() {
    let file = JonxFile::from_bytes(sample_container()).unwrap();
    assert_eq!(file.version(), FILE_FORMAT_VERSION);
    assert_eq!(file.fields(), ["id", "price", "name", "ok", "meta"]);
    assert_eq!(file.storage_type("id").unwrap(), StorageType::Int16);
    assert_eq!(file.storage_type("price").unwrap(), StorageType::Float16);
    assert_eq!(file.storage_type("name").unwrap(), StorageType::Str);
    assert_eq!(file.storage_type("ok").unwrap(), StorageType::Bool);
    assert_eq!(file.storage_type("meta").unwrap(), StorageType::Json);
    assert_eq!(file.num_rows().unwrap(), 3);
}

#[test]
fn test_lazy_column_access() {
    let file = JonxFile::from_bytes(sample_container()).unwrap();
    assert_eq!(
        file.get_column("name").unwrap(),
        vec![json!("pear"), json!("apple"), json!("fig")]
    );
    assert_eq!(
        file.get_column("meta").unwrap(),
        vec![json!({"k": 1}), json!([1, 2]), Value::Null]
    );
    assert!(matches!(
        file.get_column("missing"),
        Err(JonxError::FieldNotFound(name)) if name == "missing"
    ));
}

#[test]
fn test_indexes_exist_only_for_numeric_columns() {
    let file = JonxFile::from_bytes(sample_container()).unwrap();
    assert_eq!(file.index_names().collect::<Vec<_>>(), vec!["id", "price"]);
    assert!(file.has_index("id"));
    assert!(!file.has_index("name"));
    assert_eq!(file.get_index("id").unwrap(), Some(vec![1, 2, 0]));
    assert_eq!(file.get_index("ok").unwrap(), None);
}

#[test]
fn test_find_min_with_and_without_index_agree() {
    let file = JonxFile::from_bytes(sample_container()).unwrap();
    for field in ["id", "price"] {
        let indexed = file.find_min(field, true).unwrap();
        let scanned = file.find_min(field, false).unwrap();
        assert_eq!(indexed, scanned);
    }
    assert_eq!(file.find_min("id", true).unwrap(), Some(json!(1)));
    assert_eq!(file.find_min("price", true).unwrap(), Some(json!(-1.0)));
    assert_eq!(file.find_min("name", true).unwrap(), Some(json!("apple")));
    assert!(matches!(
        file.find_min("meta", false),
        Err(JonxError::UnsupportedType(_))
    ));
}

#[test]
fn test_every_truncation_fails_cleanly() {
    let bytes = sample_container();
    for cut in 0..bytes.len() {
        let result = JonxFile::from_bytes(bytes[..cut].to_vec());
        match result {
            Err(JonxError::TruncatedData { .. }) | Err(JonxError::Format(_)) => {}
            other => panic!("cut at {} gave {:?}", cut, other.map(|f| f.fields().to_vec())),
        }
    }
}

#[test]
fn test_random_truncations_never_decode() {
    let bytes = sample_container();
    let mut rng = rand::rng();
    for _ in 0..64 {
        let cut = rng.random_range(0..bytes.len());
        assert!(bridge::decode(&bytes[..cut]).is_err(), "cut at {}", cut);
    }
}

#[test]
fn test_corrupted_magic_is_a_format_error() {
    let mut bytes = sample_container();
    bytes[0] = b'X';
    assert!(matches!(JonxFile::from_bytes(bytes), Err(JonxError::Format(_))));
}

#[test]
fn test_trailing_bytes_are_rejected() {
    let mut bytes = sample_container();
    bytes.push(0);
    assert!(matches!(
        JonxFile::from_bytes(bytes),
        Err(JonxError::Format(msg)) if msg.contains("trailing")
    ));
}

#[test]
fn test_index_on_unknown_field_is_rejected() {
    let records = vec![record(json!({"a": 1}))];
    let parts = bridge::build_container_parts(&records, &Default::default()).unwrap();
    let ghost = parts.index_blocks[0].1.clone();
    // The writer refuses unknown names, so the second entry is appended by hand.
    let mut bytes = to_bytes(&parts).unwrap();
    let count_at = bytes.len() - (4 + 1 + 4 + ghost.len()) - 4;
    bytes[count_at..count_at + 4].copy_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(b"z");
    bytes.extend_from_slice(&(ghost.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&ghost);
    assert!(matches!(
        JonxFile::from_bytes(bytes),
        Err(JonxError::Format(msg)) if msg.contains("'z'")
    ));
}

#[test]
fn test_open_reads_from_disk() {
    let path = std::env::temp_dir().join(format!("jonx-reader-{}.jonx", std::process::id()));
    std::fs::write(&path, sample_container()).unwrap();
    let file = JonxFile::open(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(file.num_rows().unwrap(), 3);
    assert!(matches!(JonxFile::open(&path), Err(JonxError::Io(_))));
}

#[test]
fn test_find_min_reads_the_first_index_position() {
    let values = vec![json!(5), json!(1), json!(3)];
    // Not a permutation, but the first position is the true minimum.
    let bytes = assemble(&[("a", StorageType::Int16, values)], &[("a", vec![1, 1, 2])]);
    let file = JonxFile::from_bytes(bytes).unwrap();

    assert_eq!(file.find_min("a", true).unwrap(), Some(json!(1)));
    assert!(matches!(file.get_index("a"), Err(JonxError::SchemaMismatch(_))));
}

#[test]
fn test_find_min_rejects_index_of_wrong_length() {
    let values = vec![json!(5), json!(1), json!(3)];
    let bytes = assemble(&[("a", StorageType::Int16, values)], &[("a", vec![1, 2])]);
    let file = JonxFile::from_bytes(bytes).unwrap();

    assert!(matches!(file.find_min("a", true), Err(JonxError::SchemaMismatch(_))));
    assert_eq!(file.find_min("a", false).unwrap(), Some(json!(1)));
}

#[test]
fn test_short_column_is_caught_by_checked_access_and_decode() {
    let bytes = assemble(
        &[
            ("a", StorageType::Int16, vec![json!(1), json!(2)]),
            ("b", StorageType::Int16, vec![json!(7)]),
        ],
        &[],
    );
    let file = JonxFile::from_bytes(bytes.clone()).unwrap();

    assert_eq!(file.get_column("b").unwrap(), vec![json!(7)]);
    assert!(matches!(
        file.get_column_checked("b"),
        Err(JonxError::SchemaMismatch(_))
    ));
    assert_eq!(file.get_column_checked("a").unwrap(), vec![json!(1), json!(2)]);
    assert!(matches!(bridge::decode(&bytes), Err(JonxError::SchemaMismatch(_))));
}
