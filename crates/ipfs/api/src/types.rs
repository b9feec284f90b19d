use serde::Deserialize;

/// Identity of the local daemon as reported by `/api/v0/id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerInfo {
    #[serde(rename = "ID")]
    pub id: String,

    /// Advertised multiaddresses. The daemon sends `null` when it has none.
    #[serde(rename = "Addresses", default, deserialize_with = "null_as_empty")]
    pub addresses: Vec<String>,
}

/// Repository statistics from `/api/v0/repo/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RepoStat {
    /// Bytes currently used by the repository.
    #[serde(rename = "RepoSize")]
    pub repo_size: u64,

    /// Configured storage maximum in bytes.
    #[serde(rename = "StorageMax", default)]
    pub storage_max: u64,
}

impl RepoStat {
    /// Used bytes as a signed value, saturating at `i64::MAX`.
    pub fn used_bytes_i64(&self) -> i64 {
        i64::try_from(self.repo_size).unwrap_or(i64::MAX)
    }
}

#[derive(Deserialize)]
pub(crate) struct VersionResponse {
    #[serde(rename = "Version")]
    pub(crate) version: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
