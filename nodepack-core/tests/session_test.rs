//! Manager session over the in-memory backend

mod common;

use common::{init_test_logging, mixed_catalog, mixed_mappings, registry};
use nodepack_core::backend::MemoryBackend;
use nodepack_core::config::ManagerConfig;
use nodepack_core::graph::GraphSnapshot;
use nodepack_core::lifecycle::{BackendAction, LifecycleState, PackageAction};
use nodepack_core::selection::SelectionCoordinator;
use nodepack_core::session::ManagerSession;
use nodepack_core::ManagerError;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

async fn open(backend: &MemoryBackend) -> ManagerSession {
    init_test_logging();
    ManagerSession::open(Arc::new(backend.clone()), ManagerConfig::default())
        .await
        .unwrap()
}

fn graph(types: &[&str]) -> GraphSnapshot {
    GraphSnapshot::from_node_types(types.iter().copied())
}

#[tokio::test]
async fn test_open_fails_when_catalog_unavailable() {
    init_test_logging();
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings());
    backend.fail_catalog(true);

    let result = ManagerSession::open(Arc::new(backend), ManagerConfig::default()).await;
    assert!(matches!(result, Err(ManagerError::Fetch(_))));
}

#[tokio::test]
async fn test_filtered_catalog_for_graph() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings())
        .with_component_node_types(vec!["OldNode".to_string()]);
    let session = open(&backend).await;

    let missing = session
        .filtered_catalog(
            &graph(&["KSampler", "VHS_LoadVideo", "DynCrop", "Unheard"]),
            &registry(&["KSampler"]),
        )
        .await
        .unwrap();

    let titles: Vec<_> = missing.packages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Video Helper", "Old Pack", "Dynamic Nodes"]);
    assert!(missing.unprovided.contains("Unheard"));
    assert_eq!(missing.skipped_patterns, 0);
}

#[tokio::test]
async fn test_mapping_failure_is_reported() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings());
    let session = open(&backend).await;
    backend.fail_mappings(true);

    let err = session
        .filtered_catalog(&graph(&["SAMLoader"]), &registry(&[]))
        .await
        .unwrap_err();
    match err {
        ManagerError::Fetch(e) => assert_eq!(e.operation, "fetch node mappings"),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_component_failure_is_not_fatal() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings())
        .with_component_node_types(vec!["OldNode".to_string()]);
    backend.fail_components(true);
    let session = open(&backend).await;

    let missing = session
        .filtered_catalog(&graph(&["SAMLoader"]), &registry(&[]))
        .await
        .unwrap();

    let titles: Vec<_> = missing.packages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Impact Pack"]);
}

#[tokio::test]
async fn test_empty_graph_needs_nothing() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings())
        .with_component_node_types(vec!["OldNode".to_string()]);
    let session = open(&backend).await;

    let missing = session
        .filtered_catalog(&GraphSnapshot::default(), &registry(&[]))
        .await
        .unwrap();
    assert!(missing.packages.is_empty());
    assert!(missing.unresolved.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_action_on_busy_package_is_refused() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings())
        .with_action_delay(Duration::from_millis(200));
    let session = open(&backend).await;

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.perform("Video Helper", PackageAction::Install).await })
    };

    // Let the first action take the package
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(session.is_busy("Video Helper"));

    let second = session
        .perform("Video Helper", PackageAction::TryInstall)
        .await;
    assert!(matches!(second, Err(ManagerError::ActionInFlight { .. })));

    let state = first.await.unwrap().unwrap();
    assert_eq!(state, LifecycleState::Installed);
    assert!(!session.is_busy("Video Helper"));
    assert_eq!(
        backend.performed(),
        vec![("Video Helper".to_string(), BackendAction::Install)]
    );
}

#[tokio::test]
async fn test_actions_on_different_packages_run_together() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings())
        .with_action_delay(Duration::from_millis(20));
    let session = open(&backend).await;

    let (a, b) = tokio::join!(
        session.perform("Impact Pack", PackageAction::Disable),
        session.perform("Old Pack", PackageAction::Enable),
    );

    assert_eq!(a.unwrap(), LifecycleState::Disabled);
    assert_eq!(b.unwrap(), LifecycleState::Installed);
    assert_eq!(backend.performed().len(), 2);
    assert!(backend
        .performed()
        .iter()
        .all(|(_, action)| *action == BackendAction::ToggleActive));
}

#[tokio::test]
async fn test_update_then_uninstall() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings());
    let session = open(&backend).await;

    assert_eq!(
        session
            .perform("Upscalers", PackageAction::Update)
            .await
            .unwrap(),
        LifecycleState::Installed
    );
    assert_eq!(
        session
            .perform("Upscalers", PackageAction::Uninstall)
            .await
            .unwrap(),
        LifecycleState::NotInstalled
    );
    assert!(matches!(
        session.perform("Upscalers", PackageAction::Update).await,
        Err(ManagerError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn test_unknown_state_only_offers_try_install() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings());
    let session = open(&backend).await;

    let actions = session.allowed_actions("Mystery").await.unwrap();
    assert_eq!(actions.primary, PackageAction::TryInstall);
    assert!(actions.secondary.is_empty());

    assert_eq!(
        session
            .perform("Mystery", PackageAction::TryInstall)
            .await
            .unwrap(),
        LifecycleState::Installed
    );
}

#[tokio::test]
async fn test_failed_try_install_stays_unknown() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings());
    backend.fail_actions_for("Mystery", true);
    let session = open(&backend).await;

    let err = session
        .perform("Mystery", PackageAction::TryInstall)
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Fetch(_)));
    assert_eq!(
        session.package("Mystery").await.unwrap().state,
        LifecycleState::Unknown
    );
    assert!(!session.is_busy("Mystery"));

    // The package can be tried again once the server recovers
    backend.fail_actions_for("Mystery", false);
    assert_eq!(
        session
            .perform("Mystery", PackageAction::TryInstall)
            .await
            .unwrap(),
        LifecycleState::Installed
    );
}

#[tokio::test]
async fn test_batch_action_drives_selection() {
    let backend = MemoryBackend::new(mixed_catalog(), mixed_mappings());
    let session = open(&backend).await;
    let catalog = session.catalog().await;

    let mut selection = SelectionCoordinator::new(catalog.packages());
    selection.apply_selection("Video Helper", true).unwrap();
    selection.apply_selection("Dynamic Nodes", true).unwrap();
    assert!(selection.apply_selection("Impact Pack", true).is_err());

    let batch = selection.batch_actions().unwrap();
    assert!(batch.contains(PackageAction::Install));

    let titles = selection.selection().titles;
    let results = session.perform_batch(&titles, PackageAction::Install).await;
    for (title, result) in results {
        selection.update_state(&title, result.unwrap()).unwrap();
    }

    assert!(selection.selection().is_empty());
    assert_eq!(selection.target_state(), None);
    assert!(selection.is_enabled("Impact Pack"));
}
