use log::{debug, info, warn};
use serde::Serialize;

use crate::seqera::{resolve_workspace_id, Pipeline, Run, SeqeraClient, WorkspaceId};

use super::credentials::{ConfigProvider, Credentials};
use super::resource::Resource;
use super::DashboardError;

/// Obtains the session credentials.
///
/// Signals the provider ready, reads its app config and, when the config only
/// names the organization and workspace, resolves the workspace id through the
/// relay. Returns the client that the list fetches go through.
pub async fn initialize(
    provider: &dyn ConfigProvider,
    relay_url: &str,
) -> Result<(SeqeraClient, Credentials), DashboardError> {
    info!("Loading configuration from the {} provider", provider.name());
    provider.ready();

    let config = provider.app_config().await?;
    let token = config.token().ok_or(DashboardError::MissingCredentials)?;
    let client = SeqeraClient::new(relay_url, token.clone())?;

    let workspace_id = match (config.workspace_id, config.names()) {
        (Some(id), _) => id,
        (None, Some((organization, workspace))) => {
            resolve_workspace_id(&client, organization, workspace).await?
        }
        (None, None) => return Err(DashboardError::MissingCredentials),
    };

    let credentials = Credentials {
        token,
        workspace_id,
        api_base: config.api_base(),
    };

    info!("Using workspace {workspace_id} via {}", client.api_url());
    debug!("Token: {}", credentials.token.log_prefix());
    Ok((client, credentials))
}

/// The two independently loaded lists of one dashboard session.
pub struct Dashboard {
    client: SeqeraClient,
    credentials: Credentials,
    runs_limit: usize,
    pipelines: Resource<Vec<Pipeline>>,
    runs: Resource<Vec<Run>>,
}

/// Borrowed snapshot of a dashboard, as rendered or exported.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView<'a> {
    pub workspace_id: WorkspaceId,
    pub api_base: &'a str,
    pub pipelines: &'a Resource<Vec<Pipeline>>,
    pub runs: &'a Resource<Vec<Run>>,
}

impl Dashboard {
    pub fn new(client: SeqeraClient, credentials: Credentials, runs_limit: usize) -> Self {
        Self {
            client,
            credentials,
            runs_limit,
            pipelines: Resource::Loading,
            runs: Resource::Loading,
        }
    }

    /// Fetches pipelines and runs concurrently; each result lands in its own slot.
    pub async fn load(&mut self) {
        self.pipelines.retry();
        self.runs.retry();

        let workspace_id = self.credentials.workspace_id;
        let (pipelines, runs) = tokio::join!(
            self.client.list_pipelines(workspace_id),
            self.client.list_runs(workspace_id, self.runs_limit),
        );

        log_outcome("pipelines", &pipelines);
        log_outcome("runs", &runs);

        self.pipelines.settle(pipelines);
        self.runs.settle(runs);
    }

    pub async fn retry_pipelines(&mut self) {
        self.pipelines.retry();
        let pipelines = self
            .client
            .list_pipelines(self.credentials.workspace_id)
            .await;
        log_outcome("pipelines", &pipelines);
        self.pipelines.settle(pipelines);
    }

    pub async fn retry_runs(&mut self) {
        self.runs.retry();
        let runs = self
            .client
            .list_runs(self.credentials.workspace_id, self.runs_limit)
            .await;
        log_outcome("runs", &runs);
        self.runs.settle(runs);
    }

    pub fn pipelines(&self) -> &Resource<Vec<Pipeline>> {
        &self.pipelines
    }

    pub fn runs(&self) -> &Resource<Vec<Run>> {
        &self.runs
    }

    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            workspace_id: self.credentials.workspace_id,
            api_base: &self.credentials.api_base,
            pipelines: &self.pipelines,
            runs: &self.runs,
        }
    }
}

fn log_outcome<T, E: std::fmt::Display>(list: &str, outcome: &Result<Vec<T>, E>) {
    match outcome {
        Ok(items) => info!("Fetched {} {list}", items.len()),
        Err(e) => warn!("Failed to fetch {list}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::credentials::EnvConfigProvider;
    use mockito::Matcher;

    const PIPELINES: &str = r#"{"pipelines":[
        {"pipelineId":12,"name":"rnaseq","orgName":"acme","workspaceName":"prod"},
        {"pipelineId":13,"name":"sarek","orgName":"acme","workspaceName":"prod"}
    ]}"#;
    const RUNS: &str = r#"{"workflows":[{"workflow":{"id":"a1","runName":"happy_turing","status":"SUCCEEDED"}}]}"#;

    async fn mock_list(
        server: &mut mockito::ServerGuard,
        path: &str,
        status: usize,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("GET", path)
            .match_query(Matcher::UrlEncoded("workspaceId".into(), "7".into()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    fn env_provider(workspace_id: Option<&str>) -> EnvConfigProvider {
        EnvConfigProvider {
            token: Some("tok".into()),
            workspace_id: workspace_id.map(String::from),
            organization: Some("acme".into()),
            workspace: Some("PROD".into()),
        }
    }

    #[tokio::test]
    async fn test_initialize_resolves_names_then_loads_both_lists() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/orgs")
            .match_header("x-seqera-token", "tok")
            .with_header("content-type", "application/json")
            .with_body(r#"{"organizations":[{"orgId":1,"name":"Acme"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/orgs/1/workspaces")
            .with_header("content-type", "application/json")
            .with_body(r#"{"workspaces":[{"id":7,"name":"Prod"}]}"#)
            .create_async()
            .await;
        mock_list(&mut server, "/api/pipelines", 200, PIPELINES).await;
        mock_list(&mut server, "/api/workflow", 200, RUNS).await;

        let (client, credentials) = initialize(&env_provider(None), &server.url())
            .await
            .unwrap();
        assert_eq!(credentials.workspace_id, 7);
        assert_eq!(credentials.api_base, "https://api.cloud.seqera.io");

        let mut dashboard = Dashboard::new(client, credentials, 25);
        assert!(matches!(dashboard.pipelines(), Resource::Loading));

        dashboard.load().await;

        assert_eq!(dashboard.pipelines().data().map(Vec::len), Some(2));
        assert_eq!(dashboard.runs().data().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_initialize_with_workspace_id_skips_resolution() {
        let mut server = mockito::Server::new_async().await;
        let orgs = server
            .mock("GET", "/api/orgs")
            .expect(0)
            .create_async()
            .await;

        let (_, credentials) = initialize(&env_provider(Some("7")), &server.url())
            .await
            .unwrap();

        assert_eq!(credentials.workspace_id, 7);
        orgs.assert_async().await;
    }

    #[tokio::test]
    async fn test_initialize_reports_resolution_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/orgs")
            .with_header("content-type", "application/json")
            .with_body(r#"{"organizations":[]}"#)
            .create_async()
            .await;

        let err = initialize(&env_provider(None), &server.url())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to resolve workspace: Organization \"acme\" not found"
        );
    }

    #[tokio::test]
    async fn test_lists_fail_independently_and_retry_recovers() {
        let mut server = mockito::Server::new_async().await;
        let failing = mock_list(&mut server, "/api/pipelines", 500, r#"{"message":"boom"}"#).await;
        mock_list(&mut server, "/api/workflow", 200, RUNS).await;

        let (client, credentials) = initialize(&env_provider(Some("7")), &server.url())
            .await
            .unwrap();
        let mut dashboard = Dashboard::new(client, credentials, 25);
        dashboard.load().await;

        assert_eq!(dashboard.pipelines().error(), Some("API error: 500"));
        assert_eq!(dashboard.runs().data().map(Vec::len), Some(1));

        failing.remove_async().await;
        mock_list(&mut server, "/api/pipelines", 200, PIPELINES).await;

        dashboard.retry_pipelines().await;
        assert_eq!(dashboard.pipelines().data().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_view_serializes_states() {
        let mut server = mockito::Server::new_async().await;
        mock_list(&mut server, "/api/pipelines", 200, PIPELINES).await;
        mock_list(&mut server, "/api/workflow", 403, "{}").await;

        let (client, credentials) = initialize(&env_provider(Some("7")), &server.url())
            .await
            .unwrap();
        let mut dashboard = Dashboard::new(client, credentials, 25);
        dashboard.load().await;

        let json = serde_json::to_value(dashboard.view()).unwrap();
        assert_eq!(json["workspaceId"], 7);
        assert_eq!(json["pipelines"]["state"], "loaded");
        assert_eq!(json["pipelines"]["data"][0]["pipelineId"], 12);
        assert_eq!(json["runs"]["state"], "failed");
        assert_eq!(json["runs"]["data"], "API error: 403");
    }
}
