use sqlx::prelude::FromRow;

use crate::coordinate::normalize_coordinate;

use super::ayna_api_model::AynaStop;

/// A stop as persisted in `ayna.stops`.
#[derive(Clone, Debug, FromRow)]
pub struct StopDb {
    pub id: i64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub is_transport_hub: bool,
}

#[derive(thiserror::Error, Debug)]
#[error("stop record is missing the required \"id\" field")]
pub struct MissingStopId;

impl StopDb {
    /// The id is required. Unparseable coordinates are logged and become
    /// NULL, the stop itself is kept.
    pub fn try_from_ayna_stop(value: AynaStop) -> Result<Self, MissingStopId> {
        let id = value.id.ok_or(MissingStopId)?;

        Ok(StopDb {
            id,
            longitude: normalize_coordinate(value.longitude.as_deref()),
            latitude: normalize_coordinate(value.latitude.as_deref()),
            is_transport_hub: value.is_transport_hub,
        })
    }
}
