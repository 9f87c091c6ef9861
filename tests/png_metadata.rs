//! End-to-end scenarios: typed containers round-tripping through real PNG files.

use image::{DynamicImage, Rgba, RgbaImage};
use png_stamp::metadata::{MetadataKeyValue, MetadataWriter};
use png_stamp::{Error, MetadataContainer};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum::VariantArray;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
enum UnitTestMetadata {
    Metadata1,
    Metadata2,
    Metadata3,
    Metadata4,
    Metadata5,
}

/// A 32×32 checkerboard PNG with no metadata, copied into `dir`.
fn fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("img.png");
    let img = RgbaImage::from_fn(32, 32, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([20, 40, 60, 200])
        }
    });
    img.save(&path).unwrap();
    path
}

fn pixels(path: &Path) -> RgbaImage {
    image::open(path).unwrap().to_rgba8()
}

#[test]
fn fixture_without_metadata_loads_empty() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.len(), 0);
}

#[test]
fn update_fixture_with_text() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);
    let before = pixels(&path);
    let text = "valeur à écrire";

    let container = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    container.add(UnitTestMetadata::Metadata4, text);
    container.update(&path).unwrap();

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.try_get(UnitTestMetadata::Metadata4), Some(json!(text)));
    assert_eq!(pixels(&path), before);
}

#[test]
fn save_new_blank_image() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new.png");
    let text = "valeur à écrire";

    let container: MetadataContainer<UnitTestMetadata> =
        [(UnitTestMetadata::Metadata4, text)].into_iter().collect();
    container
        .save_new(&path, &DynamicImage::new_rgb8(10, 10))
        .unwrap();

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.try_get_string(UnitTestMetadata::Metadata4).as_deref(), Some(text));
}

#[test]
fn json_string_value_is_kept_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);
    let text = r#"{"Id":75,"Name":"Robert"}"#;

    let container = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    container.add(UnitTestMetadata::Metadata4, text);
    container.update(&path).unwrap();

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.try_get(UnitTestMetadata::Metadata4), Some(Value::String(text.into())));
}

#[test]
fn five_keys_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);
    let expected: HashMap<UnitTestMetadata, Value> = UnitTestMetadata::VARIANTS
        .iter()
        .enumerate()
        .map(|(i, &key)| {
            let text = format!(r#"{{"Id":75,"Name":"Robert{}"}}"#, i + 1);
            (key, Value::String(text))
        })
        .collect();

    let container = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    for (key, value) in &expected {
        container.add(*key, value.clone());
    }
    container.update(&path).unwrap();

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.len(), 5);
    let actual: HashMap<_, _> = result.entries().into_iter().collect();
    assert_eq!(actual, expected);
}

#[test]
fn update_merges_over_previous_save() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);

    let first = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    first.add(UnitTestMetadata::Metadata1, "one");
    first.update(&path).unwrap();

    let second = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    second.add(UnitTestMetadata::Metadata2, json!({"nested": [1, 2, 3]}));
    second.update(&path).unwrap();

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.try_get(UnitTestMetadata::Metadata1), Some(json!("one")));
    assert_eq!(
        result.try_get(UnitTestMetadata::Metadata2),
        Some(json!({"nested": [1, 2, 3]}))
    );
}

#[test]
fn empty_container_update_does_not_touch_file() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);
    let before = fs::read(&path).unwrap();

    let container = MetadataContainer::<UnitTestMetadata>::new();
    container.add(UnitTestMetadata::Metadata1, Value::Null);
    container.update(&path).unwrap();

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn save_new_over_existing_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);
    let before = fs::read(&path).unwrap();

    let container = MetadataContainer::<UnitTestMetadata>::new();
    container.add(UnitTestMetadata::Metadata1, "x");
    let err = container
        .save_new(&path, &DynamicImage::new_rgb8(10, 10))
        .unwrap_err();

    assert!(matches!(err, Error::AlreadyExists(_)));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn unknown_stored_keys_are_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.png");
    MetadataWriter::default()
        .create_new(
            &path,
            &DynamicImage::new_rgb8(10, 10),
            &[
                MetadataKeyValue::new("Metadata3", "known"),
                MetadataKeyValue::new("RemovedInV2", "unknown"),
            ],
        )
        .unwrap();

    let result = MetadataContainer::<UnitTestMetadata>::load(&path).unwrap();
    assert_eq!(result.entries(), vec![(UnitTestMetadata::Metadata3, json!("known"))]);
}

#[tokio::test]
async fn async_load_reads_saved_data() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);
    let text = r#"{"Id":75,"Name":"Robert"}"#;

    let container = MetadataContainer::<UnitTestMetadata>::new();
    container.add(UnitTestMetadata::Metadata4, text);
    container.update(&path).unwrap();

    let token = CancellationToken::new();
    let loaded = MetadataContainer::<UnitTestMetadata>::load_async(&path, &token)
        .await
        .unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.try_get_string(UnitTestMetadata::Metadata4).as_deref(), Some(text));
}

#[tokio::test]
async fn async_load_cancelled_up_front() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir);

    let token = CancellationToken::new();
    token.cancel();
    let result = MetadataContainer::<UnitTestMetadata>::load_async(&path, &token).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}
