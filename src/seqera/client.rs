use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, SeqDashError};

use super::types::{
    extract_list, Organization, OrganizationsResponse, Pipeline, Run, Workspace, WorkspaceId,
    WorkspacesResponse,
};

/// Header the relay reads the caller's bearer token from.
pub const TOKEN_HEADER: &str = "X-Seqera-Token";

/// Seqera Platform client that goes through the same-origin relay.
///
/// Every request carries the token in [`TOKEN_HEADER`]; the relay turns it
/// into an `Authorization` header for the upstream API.
#[derive(Debug)]
pub struct SeqeraClient {
    client: Client,
    api_url: Url,
    token: Token,
}

impl SeqeraClient {
    pub fn new(relay_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("SeqDash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SeqDashError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = relay_api_url(relay_url)?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// The relay's `/api/` base URL this client sends requests to.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = self.api_url.join(path)?;
        debug!("GET {url} {query:?}");

        let response = self
            .client
            .get(url)
            .query(query)
            .header(TOKEN_HEADER, self.token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        Ok(response)
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        let response = self.get("orgs", &[]).await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Organization lookup failed with status {status}");
            return Err(SeqDashError::Api(format!(
                "Failed to fetch organizations: {}",
                status.as_u16()
            )));
        }

        let body: OrganizationsResponse = response.json().await?;
        Ok(body.organizations.unwrap_or_default())
    }

    pub async fn list_workspaces(&self, org_id: i64) -> Result<Vec<Workspace>> {
        let response = self.get(&format!("orgs/{org_id}/workspaces"), &[]).await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Workspace lookup for org {org_id} failed with status {status}");
            return Err(SeqDashError::Api(format!(
                "Failed to fetch workspaces: {}",
                status.as_u16()
            )));
        }

        let body: WorkspacesResponse = response.json().await?;
        Ok(body.workspaces.unwrap_or_default())
    }

    pub async fn list_pipelines(&self, workspace_id: WorkspaceId) -> Result<Vec<Pipeline>> {
        let query = [("workspaceId", workspace_id.to_string())];
        let body = self.get_list_body("pipelines", &query).await?;
        extract_list(body, "pipelines")
    }

    pub async fn list_runs(&self, workspace_id: WorkspaceId, limit: usize) -> Result<Vec<Run>> {
        let query = [
            ("offset", "0".to_string()),
            ("max", limit.to_string()),
            ("workspaceId", workspace_id.to_string()),
            ("attributes", "labels,minimal".to_string()),
        ];
        let body = self.get_list_body("workflow", &query).await?;
        extract_list(body, "workflows")
    }

    async fn get_list_body(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(path, query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SeqDashError::Api(format!("API error: {}", status.as_u16())));
        }

        Ok(response.json().await?)
    }
}

/// Appends `api/` to the relay base, keeping any path prefix the relay is mounted under.
fn relay_api_url(relay_url: &str) -> Result<Url> {
    let mut base = Url::parse(relay_url)
        .map_err(|e| SeqDashError::Config(format!("Invalid relay URL: {e}")))?;

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    Ok(base.join("api/")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> SeqeraClient {
        SeqeraClient::new(&server.url(), Token::from("test-token")).unwrap()
    }

    #[test]
    fn test_relay_api_url_keeps_prefix() {
        assert_eq!(
            relay_api_url("http://localhost:3001").unwrap().as_str(),
            "http://localhost:3001/api/"
        );
        assert_eq!(
            relay_api_url("https://apps.example.com/seqera").unwrap().as_str(),
            "https://apps.example.com/seqera/api/"
        );
        assert!(relay_api_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_list_pipelines_sends_token_header_and_workspace() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/pipelines")
            .match_header("x-seqera-token", "test-token")
            .match_query(Matcher::UrlEncoded("workspaceId".into(), "42".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"pipelines":[{"pipelineId":1,"name":"rnaseq"},{"pipelineId":2}],"totalSize":2}"#)
            .create_async()
            .await;

        let pipelines = client_for(&server).list_pipelines(42).await.unwrap();

        mock.assert_async().await;
        assert_eq!(pipelines.len(), 2);
        assert_eq!(pipelines[0].name.as_deref(), Some("rnaseq"));
    }

    #[tokio::test]
    async fn test_list_runs_query_and_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/workflow")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("max".into(), "25".into()),
                Matcher::UrlEncoded("workspaceId".into(), "7".into()),
                Matcher::UrlEncoded("attributes".into(), "labels,minimal".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"workflows":[{"workflow":{"id":"a1","status":"RUNNING"}}]}"#)
            .create_async()
            .await;

        let runs = client_for(&server).list_runs(7, 25).await.unwrap();

        mock.assert_async().await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status(), Some("RUNNING"));
    }

    #[tokio::test]
    async fn test_list_pipelines_reports_status_on_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/pipelines")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Forbidden"}"#)
            .create_async()
            .await;

        let err = client_for(&server).list_pipelines(1).await.unwrap_err();
        assert_eq!(err.to_string(), "API error: 403");
    }

    #[tokio::test]
    async fn test_list_organizations_reports_status_on_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/orgs")
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).list_organizations().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch organizations: 401");
    }
}
