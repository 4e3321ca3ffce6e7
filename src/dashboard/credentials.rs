use std::path::PathBuf;

use async_trait::async_trait;
use log::{error, info};
use serde::Deserialize;

use crate::auth::Token;
use crate::config::DEFAULT_UPSTREAM_URL;
use crate::error::Result;
use crate::seqera::WorkspaceId;

use super::DashboardError;

/// Session credentials, obtained once and passed to every outbound call.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: Token,
    pub workspace_id: WorkspaceId,
    pub api_base: String,
}

/// Configuration as delivered by the host runtime or assembled from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub seqera_token: Option<String>,
    #[serde(default)]
    pub seqera_api: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
}

impl AppConfig {
    pub fn token(&self) -> Option<Token> {
        self.seqera_token
            .as_deref()
            .map(Token::from)
            .filter(|token| !token.is_empty())
    }

    pub fn api_base(&self) -> String {
        self.seqera_api
            .clone()
            .filter(|api| !api.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string())
    }

    /// Organization and workspace names, when both are present.
    pub fn names(&self) -> Option<(&str, &str)> {
        let org = self.organization_name.as_deref().filter(|s| !s.is_empty())?;
        let workspace = self.workspace_name.as_deref().filter(|s| !s.is_empty())?;
        Some((org, workspace))
    }
}

/// The plugin runtime that hosts the dashboard.
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Tells the host the app has started.
    fn ready(&self);

    async fn get_app_config(&self) -> Result<AppConfig>;
}

/// Host runtime that hands over its app config as a JSON file.
pub struct FileHostRuntime {
    path: PathBuf,
}

impl FileHostRuntime {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl HostRuntime for FileHostRuntime {
    fn ready(&self) {
        info!("Host runtime initialized ({})", self.path.display());
    }

    async fn get_app_config(&self) -> Result<AppConfig> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        info!("Host config received from {}", self.path.display());
        Ok(config)
    }
}

/// Source of the dashboard's app configuration, chosen once at startup.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Startup signal, sent once before the configuration is requested.
    fn ready(&self) {}

    async fn app_config(&self) -> std::result::Result<AppConfig, DashboardError>;
}

/// Reads configuration from the host runtime.
pub struct HostConfigProvider {
    runtime: Box<dyn HostRuntime>,
}

impl HostConfigProvider {
    pub fn new(runtime: Box<dyn HostRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ConfigProvider for HostConfigProvider {
    fn name(&self) -> &'static str {
        "host"
    }

    fn ready(&self) {
        self.runtime.ready();
    }

    async fn app_config(&self) -> std::result::Result<AppConfig, DashboardError> {
        self.runtime.get_app_config().await.map_err(|e| {
            error!("Failed to get host config: {e}");
            DashboardError::HostConfig(e)
        })
    }
}

/// Fallback configuration from command-line flags and environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    pub token: Option<String>,
    pub workspace_id: Option<String>,
    pub organization: Option<String>,
    pub workspace: Option<String>,
}

#[async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn app_config(&self) -> std::result::Result<AppConfig, DashboardError> {
        let workspace_id = match self.workspace_id.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(
                raw.parse::<WorkspaceId>()
                    .map_err(|_| DashboardError::InvalidWorkspaceId(raw.to_string()))?,
            ),
        };

        let config = AppConfig {
            seqera_token: self.token.clone(),
            seqera_api: None,
            organization_name: self.organization.clone(),
            workspace_name: self.workspace.clone(),
            workspace_id,
        };

        if config.token().is_none() || (workspace_id.is_none() && config.names().is_none()) {
            return Err(DashboardError::MissingCredentials);
        }

        Ok(config)
    }
}

/// Picks the host provider when a host config is available, the environment otherwise.
pub fn select_provider(
    host_config: Option<PathBuf>,
    fallback: EnvConfigProvider,
) -> Box<dyn ConfigProvider> {
    match host_config {
        Some(path) => Box::new(HostConfigProvider::new(Box::new(FileHostRuntime::new(path)))),
        None => Box::new(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeqDashError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubHost {
        config: Option<AppConfig>,
        ready_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl HostRuntime for StubHost {
        fn ready(&self) {
            self.ready_calls.fetch_add(1, Ordering::SeqCst);
        }

        async fn get_app_config(&self) -> Result<AppConfig> {
            self.config
                .clone()
                .ok_or_else(|| SeqDashError::Config("host unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_host_provider_delegates_to_runtime() {
        let ready_calls = Arc::new(AtomicUsize::new(0));
        let provider = HostConfigProvider::new(Box::new(StubHost {
            config: Some(AppConfig {
                seqera_token: Some("tok".into()),
                organization_name: Some("Acme".into()),
                workspace_name: Some("Prod".into()),
                ..AppConfig::default()
            }),
            ready_calls: Arc::clone(&ready_calls),
        }));

        provider.ready();
        let config = provider.app_config().await.unwrap();

        assert_eq!(ready_calls.load(Ordering::SeqCst), 1);
        assert_eq!(config.names(), Some(("Acme", "Prod")));
        assert_eq!(config.api_base(), "https://api.cloud.seqera.io");
    }

    #[tokio::test]
    async fn test_host_provider_failure() {
        let provider = HostConfigProvider::new(Box::new(StubHost {
            config: None,
            ready_calls: Arc::new(AtomicUsize::new(0)),
        }));

        let err = provider.app_config().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load configuration from host");
    }

    #[tokio::test]
    async fn test_file_host_runtime_reads_app_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app-config.json");
        std::fs::write(
            &path,
            r#"{"seqeraToken":"tok","seqeraApi":"https://seqera.example.com/api","organizationName":"Acme","workspaceName":"Prod"}"#,
        )
        .unwrap();

        let config = FileHostRuntime::new(path).get_app_config().await.unwrap();
        assert_eq!(config.token(), Some(Token::from("tok")));
        assert_eq!(config.api_base(), "https://seqera.example.com/api");
        assert_eq!(config.names(), Some(("Acme", "Prod")));
    }

    #[tokio::test]
    async fn test_env_provider_requires_token_and_workspace() {
        let missing = EnvConfigProvider {
            token: Some("tok".into()),
            ..EnvConfigProvider::default()
        };
        let err = missing.app_config().await.unwrap_err();
        assert_eq!(err.to_string(), "Please configure your Seqera credentials");

        let no_token = EnvConfigProvider {
            workspace_id: Some("42".into()),
            ..EnvConfigProvider::default()
        };
        assert!(matches!(
            no_token.app_config().await,
            Err(DashboardError::MissingCredentials)
        ));

        let complete = EnvConfigProvider {
            token: Some("tok".into()),
            workspace_id: Some("42".into()),
            ..EnvConfigProvider::default()
        };
        let config = complete.app_config().await.unwrap();
        assert_eq!(config.workspace_id, Some(42));
    }

    #[tokio::test]
    async fn test_env_provider_rejects_non_numeric_workspace() {
        let provider = EnvConfigProvider {
            token: Some("tok".into()),
            workspace_id: Some("prod".into()),
            ..EnvConfigProvider::default()
        };
        assert!(matches!(
            provider.app_config().await,
            Err(DashboardError::InvalidWorkspaceId(id)) if id == "prod"
        ));
    }

    #[test]
    fn test_select_provider() {
        let host = select_provider(Some(PathBuf::from("/run/host.json")), EnvConfigProvider::default());
        assert_eq!(host.name(), "host");

        let env = select_provider(None, EnvConfigProvider::default());
        assert_eq!(env.name(), "environment");
    }
}
