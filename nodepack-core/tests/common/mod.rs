//! Test helper functions for integration tests
//!
//! Shared across the test files using the tests/common/ pattern.

#![allow(dead_code)]

use nodepack_core::catalog::{MappingData, PackageDescriptor};
use nodepack_core::graph::ResolvedNodeRegistry;
use nodepack_core::lifecycle::LifecycleState;
use std::collections::BTreeSet;
use std::sync::Once;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn node_types(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn registry(names: &[&str]) -> ResolvedNodeRegistry {
    names.iter().copied().collect()
}

pub fn titles(packages: &[&PackageDescriptor]) -> Vec<String> {
    packages.iter().map(|p| p.title.clone()).collect()
}

/// A catalog with one package per lifecycle state plus a pattern package
pub fn mixed_catalog() -> Vec<PackageDescriptor> {
    vec![
        PackageDescriptor::new("Impact Pack", &["impact.git"])
            .with_state(LifecycleState::Installed),
        PackageDescriptor::new("Video Helper", &["video.git"]),
        PackageDescriptor::new("Old Pack", &["old.py"]).with_state(LifecycleState::Disabled),
        PackageDescriptor::new("Upscalers", &["up.git", "up_extra.py"])
            .with_state(LifecycleState::UpdateAvailable),
        PackageDescriptor::new("Mystery", &["mystery.git"]).with_state(LifecycleState::Unknown),
        PackageDescriptor::new("Dynamic Nodes", &["dyn.git"]).with_pattern("^Dyn"),
    ]
}

pub fn mixed_mappings() -> MappingData {
    MappingData::from_json(
        r#"{
            "impact.git": [["DetailerForEach", "SAMLoader"], {"title_aux": "Impact Pack"}],
            "video.git": [["VHS_LoadVideo", "VHS_VideoCombine"]],
            "old.py": [{"OldNode": "OldNode"}],
            "up_extra.py": [["UpscaleExtra"]],
            "mystery.git": [["MysteryNode"]]
        }"#,
    )
    .unwrap()
}
