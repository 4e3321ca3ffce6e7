mod credentials;
pub mod display;
mod resource;
mod session;

use thiserror::Error;

use crate::error::SeqDashError;
use crate::seqera::ResolveError;

pub use credentials::{select_provider, EnvConfigProvider};
pub use resource::Resource;
pub use session::{initialize, Dashboard, DashboardView};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Please configure your Seqera credentials")]
    MissingCredentials,

    #[error("Invalid workspace id: {0}")]
    InvalidWorkspaceId(String),

    #[error("Failed to load configuration from host")]
    HostConfig(#[source] SeqDashError),

    #[error("Failed to resolve workspace: {0}")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Client(#[from] SeqDashError),
}
