//! Integration tests for the catalog module

#[cfg(test)]
mod integration_tests {
    use crate::catalog::{Catalog, CatalogResponse, MappingData, MappingIndex};
    use crate::lifecycle::LifecycleState;

    /// A catalog and mapping pair shaped like real server output
    fn server_fixture() -> (Catalog, MappingData) {
        let catalog_json = r#"{
            "custom_nodes": [
                {
                    "author": "ltdrdata",
                    "title": "Impact Pack",
                    "reference": "https://github.com/ltdrdata/ComfyUI-Impact-Pack",
                    "files": ["https://github.com/ltdrdata/ComfyUI-Impact-Pack"],
                    "install_type": "git-clone",
                    "pip": ["ultralytics"],
                    "description": "Detector, detailer and upscaler nodes",
                    "installed": "True"
                },
                {
                    "author": "someone",
                    "title": "Dynamic Nodes",
                    "reference": "https://github.com/someone/dynamic",
                    "files": ["https://github.com/someone/dynamic"],
                    "install_type": "git-clone",
                    "nodename_pattern": "^Dyn",
                    "description": "Runtime generated nodes",
                    "installed": "False"
                },
                {
                    "author": "someone else",
                    "title": "Broken Pattern",
                    "reference": "https://example.com/broken",
                    "files": ["https://example.com/broken.py"],
                    "install_type": "copy",
                    "nodename_pattern": "[a-",
                    "description": "Declares an invalid pattern",
                    "installed": "Disabled"
                }
            ]
        }"#;

        let mappings_json = r#"{
            "https://github.com/ltdrdata/ComfyUI-Impact-Pack": [
                ["DetailerForEach", "SAMLoader", "UltralyticsDetectorProvider"],
                {"title_aux": "Impact Pack"}
            ],
            "https://example.com/broken.py": [
                ["BrokenNode"],
                {"title_aux": "Broken Pattern"}
            ]
        }"#;

        let response = CatalogResponse::from_json(catalog_json).unwrap();
        let catalog = Catalog::from_packages(response.custom_nodes);
        let mappings = MappingData::from_json(mappings_json).unwrap();
        (catalog, mappings)
    }

    #[test]
    fn test_index_from_server_data() {
        let (catalog, mappings) = server_fixture();
        let index = MappingIndex::build(catalog.packages(), &mappings);

        assert_eq!(
            index.resolve("SAMLoader"),
            Some("https://github.com/ltdrdata/ComfyUI-Impact-Pack")
        );
        assert_eq!(
            index.resolve("DynLoader"),
            Some("https://github.com/someone/dynamic")
        );
        // The broken pattern is skipped but its exact names still resolve
        assert_eq!(
            index.resolve("BrokenNode"),
            Some("https://example.com/broken.py")
        );
        assert_eq!(index.pattern_errors().len(), 1);
        assert_eq!(index.resolve("KSampler"), None);
    }

    #[test]
    fn test_snapshot_states() {
        let (catalog, _) = server_fixture();

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.get("Impact Pack").unwrap().state,
            LifecycleState::Installed
        );
        assert_eq!(
            catalog.get("Broken Pattern").unwrap().state,
            LifecycleState::Disabled
        );

        let not_installed = catalog.search("", Some(LifecycleState::NotInstalled));
        assert_eq!(not_installed.len(), 1);
        assert_eq!(not_installed[0].title, "Dynamic Nodes");
    }

    #[test]
    fn test_descriptor_round_trips_passthrough_fields() {
        let (catalog, _) = server_fixture();
        let pkg = catalog.get("Impact Pack").unwrap();

        let value = serde_json::to_value(pkg).unwrap();
        assert_eq!(value["installed"], "True");
        assert_eq!(value["install_type"], "git-clone");
        assert!(value.get("nodename_pattern").is_none());
        assert_eq!(value["pip"], serde_json::json!(["ultralytics"]));
    }
}
