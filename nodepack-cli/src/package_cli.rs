//! Package commands
//!
//! Each command opens a manager session against the configured server,
//! then either reports on the catalog or runs one lifecycle action.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;

use nodepack_core::backend::{HttpBackend, ManagerBackend};
use nodepack_core::catalog::PackageDescriptor;
use nodepack_core::config::ManagerConfig;
use nodepack_core::graph::{GraphSnapshot, ResolvedNodeRegistry};
use nodepack_core::lifecycle::{LifecycleState, PackageAction};
use nodepack_core::session::{ManagerSession, MissingPackages};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the packages a saved graph needs
    Missing {
        /// Serialized graph (JSON with a "nodes" array)
        #[clap(long)]
        graph: PathBuf,

        /// Known node types: object_info JSON or a JSON array of names.
        /// Fetched from the server when omitted.
        #[clap(long)]
        registry: Option<PathBuf>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Browse the package catalog
    List {
        /// Keyword matched against title, author and description
        #[clap(long)]
        search: Option<String>,

        /// all, installed, not-installed, disabled, update or unknown
        #[clap(long, default_value = "all")]
        state: String,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Install a package
    Install { title: String },

    /// Uninstall a package
    Uninstall {
        title: String,

        /// Don't ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },

    /// Update a package
    Update { title: String },

    /// Enable a disabled package
    Enable { title: String },

    /// Disable an installed package
    Disable { title: String },
}

impl Command {
    pub async fn execute(self, config: ManagerConfig) -> Result<()> {
        let backend = Arc::new(HttpBackend::new(&config)?);

        match self {
            Command::Missing {
                graph,
                registry,
                json,
            } => execute_missing(backend, config, &graph, registry.as_deref(), json).await,
            Command::List {
                search,
                state,
                json,
            } => execute_list(backend, config, search.as_deref(), &state, json).await,
            Command::Install { title } => {
                execute_action(backend, config, &title, PackageAction::Install, false).await
            }
            Command::Uninstall { title, yes } => {
                execute_action(backend, config, &title, PackageAction::Uninstall, yes).await
            }
            Command::Update { title } => {
                execute_action(backend, config, &title, PackageAction::Update, false).await
            }
            Command::Enable { title } => {
                execute_action(backend, config, &title, PackageAction::Enable, false).await
            }
            Command::Disable { title } => {
                execute_action(backend, config, &title, PackageAction::Disable, false).await
            }
        }
    }
}

async fn open_session(backend: Arc<HttpBackend>, config: ManagerConfig) -> Result<ManagerSession> {
    let backend: Arc<dyn ManagerBackend> = backend;
    ManagerSession::open(backend, config)
        .await
        .context("Could not load the package catalog")
}

fn read_registry(path: &Path) -> Result<ResolvedNodeRegistry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry file: {}", path.display()))?;

    let registry = if content.trim_start().starts_with('[') {
        ResolvedNodeRegistry::from_json_list(&content)?
    } else {
        ResolvedNodeRegistry::from_object_info(&content)?
    };
    Ok(registry)
}

fn parse_state_filter(state: &str) -> Result<Option<LifecycleState>> {
    if state.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match LifecycleState::from_filter_name(state) {
        Some(state) => Ok(Some(state)),
        None => bail!(
            "Unknown state filter '{state}' (expected all, installed, not-installed, disabled, update or unknown)"
        ),
    }
}

/// Install on a package of unknown status is sent as a best-effort install
fn effective_action(requested: PackageAction, state: LifecycleState) -> PackageAction {
    match (requested, state) {
        (PackageAction::Install, LifecycleState::Unknown) => PackageAction::TryInstall,
        _ => requested,
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn action_labels(state: LifecycleState) -> String {
    state
        .allowed_actions()
        .iter()
        .map(|a| a.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table row for catalog listings
#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Actions")]
    actions: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&PackageDescriptor> for PackageRow {
    fn from(pkg: &PackageDescriptor) -> Self {
        Self {
            title: pkg.title.clone(),
            author: pkg.author.clone(),
            state: pkg.state.to_string(),
            actions: action_labels(pkg.state),
            description: truncate(&pkg.description, 50),
        }
    }
}

fn print_packages<'a, I>(packages: I)
where
    I: IntoIterator<Item = &'a PackageDescriptor>,
{
    let rows: Vec<PackageRow> = packages.into_iter().map(PackageRow::from).collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
}

async fn execute_missing(
    backend: Arc<HttpBackend>,
    config: ManagerConfig,
    graph_path: &Path,
    registry_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(graph_path)
        .with_context(|| format!("Failed to read graph: {}", graph_path.display()))?;
    let graph = GraphSnapshot::from_json(&content)?;

    let registry = match registry_path {
        Some(path) => read_registry(path)?,
        None => backend
            .fetch_registered_node_types()
            .await
            .context("Could not fetch the node types known to the server")?,
    };
    debug!("Registry holds {} node types", registry.len());

    let session = open_session(backend, config).await?;
    let missing = session.filtered_catalog(&graph, &registry).await?;

    if json_output {
        print_missing_json(&missing)?;
        return Ok(());
    }

    if missing.unresolved.is_empty() {
        println!("Every node in the graph is available.");
        return Ok(());
    }

    if missing.packages.is_empty() {
        println!("No package in the catalog provides the missing nodes.");
    } else {
        println!("\n{} package(s) provide missing nodes:\n", missing.packages.len());
        print_packages(&missing.packages);
    }

    if !missing.unprovided.is_empty() {
        println!("\nNo known provider for:");
        for node_type in &missing.unprovided {
            println!("  {node_type}");
        }
    }

    if missing.skipped_patterns > 0 {
        println!(
            "\n{} catalog pattern(s) were invalid and ignored.",
            missing.skipped_patterns
        );
    }

    Ok(())
}

fn print_missing_json(missing: &MissingPackages) -> Result<()> {
    let output = serde_json::json!({
        "packages": missing.packages,
        "unresolved": missing.unresolved,
        "unprovided": missing.unprovided,
        "skipped_patterns": missing.skipped_patterns,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute_list(
    backend: Arc<HttpBackend>,
    config: ManagerConfig,
    search: Option<&str>,
    state: &str,
    json_output: bool,
) -> Result<()> {
    let state = parse_state_filter(state)?;
    let session = open_session(backend, config).await?;
    let catalog = session.catalog().await;

    let results = catalog.search(search.unwrap_or(""), state);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    println!("\nFound {} package(s):\n", results.len());
    print_packages(results.iter().copied());

    let summary: Vec<String> = catalog
        .state_counts()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(state, count)| format!("{count} {state}"))
        .collect();
    println!("\nCatalog: {}", summary.join(", "));

    Ok(())
}

async fn execute_action(
    backend: Arc<HttpBackend>,
    config: ManagerConfig,
    title: &str,
    requested: PackageAction,
    confirmed: bool,
) -> Result<()> {
    let session = open_session(backend, config).await?;
    let package = session.package(title).await?;
    let action = effective_action(requested, package.state);

    if action.requires_confirmation() && !confirmed {
        bail!("{} '{title}' needs confirmation; re-run with --yes", action.label());
    }

    let previous = package.state;
    let state = session.perform(title, action).await?;
    println!("{} '{title}': {previous} -> {state}", action.label());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_filter() {
        assert_eq!(parse_state_filter("all").unwrap(), None);
        assert_eq!(
            parse_state_filter("not-installed").unwrap(),
            Some(LifecycleState::NotInstalled)
        );
        assert_eq!(
            parse_state_filter("Update").unwrap(),
            Some(LifecycleState::UpdateAvailable)
        );
        assert!(parse_state_filter("broken").is_err());
    }

    #[test]
    fn test_install_on_unknown_is_try_install() {
        assert_eq!(
            effective_action(PackageAction::Install, LifecycleState::Unknown),
            PackageAction::TryInstall
        );
        assert_eq!(
            effective_action(PackageAction::Install, LifecycleState::NotInstalled),
            PackageAction::Install
        );
        assert_eq!(
            effective_action(PackageAction::Disable, LifecycleState::Unknown),
            PackageAction::Disable
        );
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_read_registry_formats() {
        let dir = tempfile::tempdir().unwrap();

        let list = dir.path().join("list.json");
        std::fs::write(&list, r#"["KSampler", "CLIPTextEncode"]"#).unwrap();
        let registry = read_registry(&list).unwrap();
        assert!(registry.contains("KSampler"));
        assert_eq!(registry.len(), 2);

        let info = dir.path().join("object_info.json");
        std::fs::write(&info, r#"{"KSampler": {"input": {}}, "VAEDecode": {}}"#).unwrap();
        let registry = read_registry(&info).unwrap();
        assert!(registry.contains("VAEDecode"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_row_lists_allowed_actions() {
        let pkg = PackageDescriptor::new("Pack", &["pack.git"])
            .with_state(LifecycleState::UpdateAvailable);
        let row = PackageRow::from(&pkg);
        assert_eq!(row.state, "update available");
        assert_eq!(row.actions, "Uninstall, Update, Disable");
    }
}
