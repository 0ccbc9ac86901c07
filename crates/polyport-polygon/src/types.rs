//! Typed Polygon API responses

use serde::Deserialize;

/// One entry of `problems.list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: i64,
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub favourite: bool,
    pub access_type: String,
    pub revision: i64,
    #[serde(default)]
    pub modified: bool,
    #[serde(default)]
    pub latest_package: Option<i64>,
}

/// One entry of `problem.packages`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i64,
    pub revision: i64,
    pub creation_time_seconds: i64,
    /// `PENDING`, `READY`, or `FAILED`
    pub state: String,
    #[serde(default)]
    pub comment: String,
    /// `standard`, `linux`, or `windows`
    #[serde(rename = "type")]
    pub kind: String,
}

impl Package {
    /// Whether this package can be downloaded
    pub fn is_ready(&self) -> bool {
        self.state == "READY"
    }
}
