//! HTTP backend for the manager server
//!
//! Implements the ManagerBackend trait against the manager's REST routes:
//! - `GET  /customnode/getlist?mode=..[&skip_update=true]`
//! - `GET  /customnode/getmappings?mode=..`
//! - `GET  /component/get_unresolved`
//! - `POST /customnode/{install,uninstall,update,toggle_active}`

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::ManagerBackend;
use crate::catalog::{CatalogResponse, MappingData, PackageDescriptor};
use crate::config::{DbMode, ManagerConfig};
use crate::error::FetchError;
use crate::graph::ResolvedNodeRegistry;
use crate::lifecycle::BackendAction;

/// Manager server reached over HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UnresolvedResponse {
    #[serde(default)]
    nodes: Vec<String>,
}

impl HttpBackend {
    pub fn new(config: &ManagerConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("nodepack/", env!("CARGO_PKG_VERSION")))
            .timeout(config.effective_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {} from {}", response.status(), url);
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }

    async fn get_catalog(&self, mode: DbMode, skip_update_check: bool) -> Result<CatalogResponse> {
        let mut path = format!("/customnode/getlist?mode={mode}");
        if skip_update_check {
            path.push_str("&skip_update=true");
        }
        let body = self.get_text(&path).await?;
        Ok(CatalogResponse::from_json(&body)?)
    }

    async fn get_mappings(&self, mode: DbMode) -> Result<MappingData> {
        let body = self
            .get_text(&format!("/customnode/getmappings?mode={mode}"))
            .await?;
        Ok(MappingData::from_json(&body)?)
    }

    async fn get_unresolved(&self) -> Result<Vec<String>> {
        let body = self.get_text("/component/get_unresolved").await?;
        let parsed: UnresolvedResponse =
            serde_json::from_str(&body).context("Invalid unresolved component response")?;
        Ok(parsed.nodes)
    }

    async fn post_action(&self, package: &PackageDescriptor, action: BackendAction) -> Result<()> {
        let url = self.url(&format!("/customnode/{}", action.as_str()));
        debug!("POST {} for '{}'", url, package.title);

        let response = self
            .client
            .post(&url)
            .json(package)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {} from {}", response.status(), url);
        }
        Ok(())
    }

    /// Node types the host currently knows, from its `object_info` route
    pub async fn fetch_registered_node_types(&self) -> Result<ResolvedNodeRegistry, FetchError> {
        let operation = "fetch registered node types";
        let body = self
            .get_text("/object_info")
            .await
            .map_err(|e| FetchError::from_anyhow(operation, &e))?;
        ResolvedNodeRegistry::from_object_info(&body).map_err(|e| FetchError::new(operation, e))
    }
}

#[async_trait]
impl ManagerBackend for HttpBackend {
    async fn fetch_catalog(
        &self,
        mode: DbMode,
        skip_update_check: bool,
    ) -> Result<Vec<PackageDescriptor>, FetchError> {
        let response = self
            .get_catalog(mode, skip_update_check)
            .await
            .map_err(|e| FetchError::from_anyhow("fetch package catalog", &e))?;

        info!(
            "Fetched {} packages from {} (mode: {})",
            response.custom_nodes.len(),
            self.base_url,
            mode
        );
        Ok(response.custom_nodes)
    }

    async fn fetch_mappings(&self, mode: DbMode) -> Result<MappingData, FetchError> {
        let mappings = self
            .get_mappings(mode)
            .await
            .map_err(|e| FetchError::from_anyhow("fetch node mappings", &e))?;

        debug!("Fetched mappings for {} sources", mappings.source_count());
        Ok(mappings)
    }

    async fn fetch_unresolved_component_node_types(&self) -> Vec<String> {
        match self.get_unresolved().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("Could not fetch unresolved component nodes: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn perform_action(
        &self,
        package: &PackageDescriptor,
        action: BackendAction,
    ) -> Result<(), FetchError> {
        self.post_action(package, action).await.map_err(|e| {
            FetchError::from_anyhow(format!("{} '{}'", action.as_str(), package.title), &e)
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
