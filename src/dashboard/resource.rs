use std::fmt::Display;

use serde::Serialize;

/// Fetch state of one dashboard list.
///
/// Every list starts in `Loading`, settles into `Loaded` or `Failed`, and goes
/// back to `Loading` through [`Resource::retry`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum Resource<T> {
    #[default]
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Resource<T> {
    /// Records the outcome of a fetch.
    pub fn settle<E: Display>(&mut self, outcome: Result<T, E>) {
        *self = match outcome {
            Ok(data) => Resource::Loaded(data),
            Err(e) => Resource::Failed(e.to_string()),
        };
    }

    /// Re-enters `Loading` ahead of a repeated fetch.
    pub fn retry(&mut self) {
        *self = Resource::Loading;
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Resource::Failed(message) => Some(message),
            _ => None,
        }
    }
}
