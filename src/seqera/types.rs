use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;

pub type WorkspaceId = i64;

/// An organization the token's user belongs to (`GET /orgs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub org_id: i64,
    pub name: String,
}

/// A workspace inside an organization (`GET /orgs/{orgId}/workspaces`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrganizationsResponse {
    #[serde(default)]
    pub organizations: Option<Vec<Organization>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WorkspacesResponse {
    #[serde(default)]
    pub workspaces: Option<Vec<Workspace>>,
}

/// A launchpad pipeline as returned by `GET /pipelines`.
///
/// Fields the dashboard does not read are kept in `extra` so the record can be
/// re-serialized without loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A run label: either a bare string or a name/value pair with a visibility flag.
///
/// `resource` marks labels attached to compute resources rather than the run itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Bare(String),
    Tagged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<bool>,
    },
}

/// Run attributes as they appear either on a `/workflow` list entry or on its
/// nested `workflow` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub submit: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
}

/// One entry of the run history (`GET /workflow`).
///
/// Every accessor prefers the nested `workflow` object and falls back to the
/// entry's own field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<RunFields>,
    #[serde(flatten)]
    pub entry: RunFields,
}

impl Run {
    fn text<'a>(&'a self, get: impl Fn(&'a RunFields) -> Option<&'a String>) -> Option<&'a str> {
        let non_empty =
            |value: Option<&'a String>| value.map(String::as_str).filter(|s| !s.is_empty());
        self.workflow
            .as_ref()
            .and_then(|w| non_empty(get(w)))
            .or_else(|| non_empty(get(&self.entry)))
    }

    pub fn id(&self) -> Option<&str> {
        self.text(|f| f.id.as_ref())
    }

    pub fn run_name(&self) -> Option<&str> {
        self.text(|f| f.run_name.as_ref())
    }

    pub fn project_name(&self) -> Option<&str> {
        self.text(|f| f.project_name.as_ref())
    }

    pub fn status(&self) -> Option<&str> {
        self.text(|f| f.status.as_ref())
    }

    pub fn user_name(&self) -> Option<&str> {
        self.text(|f| f.user_name.as_ref())
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.text(|f| f.organization_name.as_ref())
    }

    pub fn workspace_name(&self) -> Option<&str> {
        self.text(|f| f.workspace_name.as_ref())
    }

    pub fn submit(&self) -> Option<DateTime<Utc>> {
        self.workflow
            .as_ref()
            .and_then(|w| w.submit)
            .or(self.entry.submit)
    }

    pub fn starred(&self) -> bool {
        self.workflow.as_ref().and_then(|w| w.starred).unwrap_or(false)
            || self.entry.starred.unwrap_or(false)
    }

    pub fn labels(&self) -> &[Label] {
        self.workflow
            .as_ref()
            .and_then(|w| w.labels.as_deref())
            .or(self.entry.labels.as_deref())
            .unwrap_or(&[])
    }
}

/// Timestamps with an offset are taken as is, naive ones as UTC. Anything else
/// is treated as missing.
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::String(raw)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Ok(Some(naive.and_utc())),
        Err(_) => {
            warn!("Ignoring unparseable timestamp: {raw}");
            Ok(None)
        }
    }
}

/// Pulls a list out of a response that is either `{ <key>: [...] }` or a bare array.
///
/// Any other shape yields an empty list. Entries are decoded one by one; an
/// entry that does not decode is logged and skipped.
pub(super) fn extract_list<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>> {
    let items = match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(list)) => list,
            _ => return Ok(Vec::new()),
        },
        Value::Array(list) => list,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping {key} entry {index}: {e}");
                None
            }
        })
        .collect())
}
