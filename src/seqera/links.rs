use super::types::{Pipeline, Run};

/// Builds the launch form URL for a launchpad pipeline.
///
/// # Arguments
///
/// * `web_url` - Seqera web UI base URL (e.g., <https://cloud.seqera.io>)
/// * `pipeline` - Pipeline carrying its organization and workspace names
///
/// # Returns
///
/// A URL such as
/// <https://cloud.seqera.io/orgs/acme/workspaces/prod/launchpad/12/form/new-form>
pub fn launch_url(web_url: &str, pipeline: &Pipeline) -> String {
    let base = web_url.trim_end_matches('/');
    let org = pipeline.org_name.as_deref().unwrap_or_default();
    let workspace = pipeline.workspace_name.as_deref().unwrap_or_default();
    let id = pipeline
        .pipeline_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    format!("{base}/orgs/{org}/workspaces/{workspace}/launchpad/{id}/form/new-form")
}

/// Builds the relaunch form URL for a previous run.
pub fn relaunch_url(web_url: &str, run: &Run) -> String {
    let base = web_url.trim_end_matches('/');
    let org = run.organization_name().unwrap_or_default();
    let workspace = run.workspace_name().unwrap_or_default();
    let id = run.id().unwrap_or_default();
    format!(
        "{base}/orgs/{org}/workspaces/{workspace}/launchpad/launch/new-form?resume=false&workflowId={id}"
    )
}
