use serde::{de, Deserialize, Deserializer, Serialize};

/// A stop exactly as the Ayna API returns it. Coordinates stay raw strings
/// here, they only become numbers in [`crate::model::db_model::StopDb`].
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AynaStop {
    /// Missing ids are caught when converting to the db model, not here,
    /// so one broken record can be reported with its position.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "coordinate_token")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "coordinate_token")]
    pub latitude: Option<String>,
    #[serde(rename = "isTransportHub", default)]
    pub is_transport_hub: bool,
}

// The API is not consistent about whether coordinates are strings or bare
// numbers, so both are accepted and carried as the raw token.
fn coordinate_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;

    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number coordinate, got {other}"
        ))),
    }
}
