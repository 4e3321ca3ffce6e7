mod client;
mod links;
mod resolver;
mod types;

pub use client::{SeqeraClient, TOKEN_HEADER};
pub use links::{launch_url, relaunch_url};
pub use resolver::{resolve_workspace_id, ResolveError};
pub use types::{Label, Pipeline, Run, WorkspaceId};
