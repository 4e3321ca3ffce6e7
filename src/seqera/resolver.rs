use log::{debug, info};
use thiserror::Error;

use crate::error::SeqDashError;

use super::client::SeqeraClient;
use super::types::WorkspaceId;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Organization \"{0}\" not found")]
    OrganizationNotFound(String),

    #[error("Workspace \"{workspace}\" not found in organization \"{organization}\"")]
    WorkspaceNotFound {
        organization: String,
        workspace: String,
    },

    #[error(transparent)]
    Request(#[from] SeqDashError),
}

/// Resolves a workspace id from organization and workspace names.
///
/// Both names are matched case-insensitively. The workspace list is only
/// requested once the organization has been found. Nothing is cached.
pub async fn resolve_workspace_id(
    client: &SeqeraClient,
    organization: &str,
    workspace: &str,
) -> Result<WorkspaceId, ResolveError> {
    info!("Resolving workspace '{workspace}' in organization '{organization}'");

    let organizations = client.list_organizations().await?;
    let org = organizations
        .iter()
        .find(|o| o.name.to_lowercase() == organization.to_lowercase())
        .ok_or_else(|| ResolveError::OrganizationNotFound(organization.to_string()))?;

    debug!("Organization '{}' has id {}", org.name, org.org_id);

    let workspaces = client.list_workspaces(org.org_id).await?;
    let found = workspaces
        .iter()
        .find(|w| w.name.to_lowercase() == workspace.to_lowercase())
        .ok_or_else(|| ResolveError::WorkspaceNotFound {
            organization: organization.to_string(),
            workspace: workspace.to_string(),
        })?;

    info!("Resolved workspace '{}' to id {}", found.name, found.id);
    Ok(found.id)
}
