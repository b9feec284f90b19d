//! Human readable durations (`"30s"`, `"1m 30s"`) for config fields.
//!
//! Plain integers are accepted as seconds, which keeps environment overrides
//! such as `CAIRN_INTERVALS__POLL=45` working.

use serde::{Deserialize, Deserializer, Serializer, de::Error};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Text(String),
    Secs(u64),
}

pub(crate) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => humantime::parse_duration(text.trim()).map_err(D::Error::custom),
        Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
    }
}
