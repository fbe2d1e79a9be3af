//! Request and response bodies for the `/v4` API.
//!
//! # Design
//! Fields that travel in the URL path (repo, series and view names) are
//! `#[serde(skip)]` so they never leak into a JSON body. The mock-server
//! crate defines its own copies of these shapes; the integration test
//! catches drift between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepoInput {
    #[serde(skip)]
    pub repo_name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDesc {
    #[serde(rename = "name")]
    pub repo_name: String,
    pub region: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub deleting: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListReposOutput {
    #[serde(default)]
    pub repos: Vec<RepoDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRepoMetadataInput {
    #[serde(skip)]
    pub repo_name: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeriesInput {
    #[serde(skip)]
    pub repo_name: String,
    #[serde(skip)]
    pub series_name: String,
    /// Retention period in the service's notation, e.g. `"30d"`.
    pub retention: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDesc {
    pub name: String,
    pub retention: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub deleting: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSeriesMetadataInput {
    #[serde(skip)]
    pub repo_name: String,
    #[serde(skip)]
    pub series_name: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateViewInput {
    #[serde(skip)]
    pub repo_name: String,
    #[serde(skip)]
    pub view_name: String,
    pub sql: String,
    pub retention: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDesc {
    pub name: String,
    pub sql: String,
    pub retention: String,
    #[serde(default)]
    pub deleting: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    #[serde(skip)]
    pub repo_name: String,
    pub sql: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    #[serde(default)]
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub series: Vec<Serie>,
}

/// One result table. Cell values are left as raw JSON; decoding points is
/// up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Serie {
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}
