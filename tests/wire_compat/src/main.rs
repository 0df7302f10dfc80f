fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use sitereport_protocol::{ItemSnapshot, MetadataPatch, PhotoMetadata, PhotoType, UploadStatus};
    use sitereport_storage::StorageConfig;
    use sitereport_upload::{NewReport, UploadConfig};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Item snapshots ---

    #[test]
    fn fixture_item_snapshot_completed() {
        let item: ItemSnapshot = roundtrip_test("item_snapshot_completed.json");
        assert_eq!(item.status, UploadStatus::Completed);
        assert_eq!(item.metadata.photo_type, PhotoType::After);
        assert!(item.remote_url.is_some());
        assert!(!item.degraded);
    }

    #[test]
    fn fixture_item_snapshot_error() {
        let item: ItemSnapshot = roundtrip_test("item_snapshot_error.json");
        assert_eq!(item.status, UploadStatus::Error);
        assert_eq!(item.progress, 40);
        assert!(item.remote_url.is_none());
        assert!(item.degraded);
    }

    #[test]
    fn fixture_item_snapshot_pending() {
        let item: ItemSnapshot = roundtrip_test("item_snapshot_pending.json");
        assert_eq!(item.status, UploadStatus::Pending);
        assert!(item.preview_id.is_none());
    }

    // --- Metadata ---

    #[test]
    fn fixture_metadata_patch() {
        let patch: MetadataPatch = roundtrip_test("metadata_patch.json");
        let mut meta = PhotoMetadata {
            comment: "kept".into(),
            ..Default::default()
        };
        meta.apply(patch);
        assert_eq!(meta.photo_type, PhotoType::Other);
        assert_eq!(meta.title, "Scaffolding");
        assert_eq!(meta.comment, "kept");
    }

    #[test]
    fn metadata_without_optional_text_fills_defaults() {
        let meta: PhotoMetadata =
            serde_json::from_value(serde_json::json!({"photoType": "before"})).unwrap();
        assert_eq!(meta.photo_type, PhotoType::Before);
        assert!(meta.title.is_empty());
        assert!(meta.customer_feedback.is_empty());
    }

    #[test]
    fn unknown_photo_type_is_rejected() {
        let result = serde_json::from_value::<PhotoMetadata>(
            serde_json::json!({"photoType": "sideways", "title": "x"}),
        );
        assert!(result.is_err());
    }

    // --- Configuration ---

    #[test]
    fn fixture_upload_config() {
        let cfg: UploadConfig = roundtrip_test("upload_config.json");
        assert_eq!(cfg, UploadConfig::default());
    }

    #[test]
    fn fixture_storage_config() {
        let cfg: StorageConfig = roundtrip_test("storage_config.json");
        assert_eq!(cfg.bucket, "photos");
        assert_eq!(cfg.api_key.as_deref(), Some("anon-key"));
    }

    // --- Reports ---

    #[test]
    fn fixture_new_report() {
        let report: NewReport = roundtrip_test("new_report.json");
        assert_eq!(report.photos.len(), 2);
        assert_eq!(report.photos[0].comment, None);
        assert_eq!(report.photos[1].sort_order, 1);
    }
}
