//! Responsible for fetching the stops and replacing the `ayna.stops` table
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};

use reqwest::Client;
use sqlx::{Pool, Postgres};
use tracing::{info, info_span, warn, Instrument};

use crate::{
    dal,
    model::{ayna_api_model::AynaStop, db_model::StopDb},
    statistics::summarize,
};

/// What a successful run did. Produced for the final summary log and then
/// discarded, nothing is persisted besides the table itself.
#[derive(Debug)]
pub struct SyncReport {
    pub fetched: usize,
    pub persisted: u64,
    pub total_in_table: i64,
    pub elapsed: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum SyncStopsError {
    #[error("database connection check failed")]
    Connection(#[source] sqlx::Error),

    #[error("error fetching the stops")]
    Fetch(#[from] FetchStopsError),

    #[error("the API returned 0 stops, leaving ayna.stops untouched")]
    NoStops,

    #[error("stop record at index {index} is missing the required \"id\" field")]
    MissingId { index: usize },

    #[error("table ayna.stops does not exist, run migrations first")]
    MissingTable,

    #[error("error saving the stops to the database")]
    Persistence(#[source] sqlx::Error),
}

/// Replaces the contents of `ayna.stops` with a fresh snapshot from the API.
///
/// Truncate and insert run in one transaction, so a failed run leaves the
/// previous snapshot in place.
#[tracing::instrument(err, skip(pool, client))]
pub async fn sync_stops(
    pool: &Pool<Postgres>,
    client: &Client,
    endpoint: &str,
) -> Result<SyncReport, SyncStopsError> {
    let started = Instant::now();

    dal::test_connection(pool)
        .await
        .map_err(SyncStopsError::Connection)?;

    let stops = fetch_stops(client, endpoint).await?;
    if stops.is_empty() {
        return Err(SyncStopsError::NoStops);
    }
    let fetched = stops.len();

    summarize(&stops).log();

    let mut db_stops = Vec::with_capacity(stops.len());
    for (index, stop) in stops.into_iter().enumerate() {
        let db_stop = StopDb::try_from_ayna_stop(stop)
            .map_err(|_| SyncStopsError::MissingId { index })?;
        db_stops.push(db_stop);
    }

    if !dal::stops_table_exists(pool)
        .await
        .map_err(SyncStopsError::Persistence)?
    {
        return Err(SyncStopsError::MissingTable);
    }

    info!("replacing contents of ayna.stops with {fetched} stops");

    let mut tx = pool.begin().await.map_err(SyncStopsError::Persistence)?;
    dal::truncate_stops(&mut tx)
        .await
        .map_err(SyncStopsError::Persistence)?;
    let persisted = dal::insert_stops(&db_stops, &mut tx)
        .await
        .map_err(SyncStopsError::Persistence)?;
    tx.commit().await.map_err(SyncStopsError::Persistence)?;

    let total_in_table = dal::stop_count(pool)
        .await
        .map_err(SyncStopsError::Persistence)?;
    if total_in_table != persisted as i64 {
        warn!("row count after insert is {total_in_table}, expected {persisted}");
    }
    info!("saved {persisted} stops, table now holds {total_in_table}");

    Ok(SyncReport {
        fetched,
        persisted,
        total_in_table,
        elapsed: started.elapsed(),
    })
}

#[derive(thiserror::Error, Debug)]
pub enum FetchStopsError {
    #[error("error fetching the stops \n{} \n{}", source, backtrace)]
    HttpRequestError {
        #[from]
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    #[error("error parsing the stops \n{} \n{} \n{}", source, body, backtrace)]
    ParsingError {
        source: serde_json::Error,
        backtrace: Backtrace,
        body: String,
    },

    #[error("expected a JSON array of stops but got {got}")]
    UnexpectedShape { got: &'static str },
}

#[tracing::instrument(err, skip(client))]
pub async fn fetch_stops(client: &Client, endpoint: &str) -> Result<Vec<AynaStop>, FetchStopsError> {
    let response = client
        .get(endpoint)
        .send()
        .instrument(info_span!("Fetching stops"))
        .await?
        .error_for_status()?;

    let body = response
        .text()
        .instrument(info_span!("Reading body of response"))
        .await?;

    let stops = decode_stops(body)?;

    info!("got {} stops", stops.len());

    Ok(stops)
}

fn decode_stops(body: String) -> Result<Vec<AynaStop>, FetchStopsError> {
    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(source) => {
            return Err(FetchStopsError::ParsingError {
                source,
                backtrace: Backtrace::capture(),
                body,
            });
        }
    };

    if !value.is_array() {
        return Err(FetchStopsError::UnexpectedShape {
            got: json_type_name(&value),
        });
    }

    match serde_json::from_value(value) {
        Ok(stops) => Ok(stops),
        Err(source) => Err(FetchStopsError::ParsingError {
            source,
            backtrace: Backtrace::capture(),
            body,
        }),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_an_array_of_stops() {
        let stops = decode_stops(
            r#"[
                {"id": 1, "longitude": "50,206,297", "latitude": "40,43885", "isTransportHub": true},
                {"id": 2, "longitude": null, "latitude": null}
            ]"#
            .to_string(),
        )
        .unwrap();

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].id, Some(1));
        assert!(stops[0].is_transport_hub);
        assert_eq!(stops[1].longitude, None);
        assert!(!stops[1].is_transport_hub);
    }

    #[test]
    fn a_non_array_body_is_an_unexpected_shape() {
        let err = decode_stops(r#"{"stops": []}"#.to_string()).unwrap_err();

        assert!(matches!(
            err,
            FetchStopsError::UnexpectedShape { got: "an object" }
        ));
    }

    #[test]
    fn a_malformed_body_is_a_parsing_error() {
        let err = decode_stops("not json".to_string()).unwrap_err();

        assert!(matches!(err, FetchStopsError::ParsingError { .. }));
    }

    #[test]
    fn an_array_of_the_wrong_element_type_is_a_parsing_error() {
        let err = decode_stops(r#"[{"id": "not-a-number"}]"#.to_string()).unwrap_err();

        assert!(matches!(err, FetchStopsError::ParsingError { .. }));
    }

    #[test]
    fn an_empty_array_decodes_to_no_stops() {
        assert!(decode_stops("[]".to_string()).unwrap().is_empty());
    }

    // The 2-record example from the API docs end to end through conversion:
    // row values the pipeline would hand to the insert.
    #[test]
    fn decoded_stops_convert_to_the_expected_rows() {
        let stops = decode_stops(
            r#"[
                {"id": 1, "longitude": "50,206,297", "latitude": "40,43885", "isTransportHub": true},
                {"id": 2, "longitude": null, "latitude": null, "isTransportHub": false}
            ]"#
            .to_string(),
        )
        .unwrap();

        let rows: Vec<StopDb> = stops
            .into_iter()
            .map(|s| StopDb::try_from_ayna_stop(s).unwrap())
            .collect();

        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].longitude, Some(50.206297));
        assert_eq!(rows[0].latitude, Some(40.43885));
        assert!(rows[0].is_transport_hub);

        assert_eq!(rows[1].id, 2);
        assert_eq!(rows[1].longitude, None);
        assert_eq!(rows[1].latitude, None);
        assert!(!rows[1].is_transport_hub);
    }
}
