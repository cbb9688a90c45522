use itertools::Itertools;
use sqlx::{query, query_scalar, Pool, Postgres, QueryBuilder, Transaction};
use tracing::{info_span, Instrument};

use crate::model::db_model::StopDb;

pub async fn test_connection(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;

    Ok(())
}

pub async fn stops_table_exists(pool: &Pool<Postgres>) -> Result<bool, sqlx::Error> {
    let exists: bool = query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'ayna' AND table_name = 'stops'
        )",
    )
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn truncate_stops(tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
    query("TRUNCATE TABLE ayna.stops")
        .execute(&mut **tx)
        .instrument(info_span!("Truncating stops"))
        .await?;

    Ok(())
}

/// Multi-row insert in chunks of 1000. No conflict clause, the table was
/// truncated in the same transaction. Returns the number of inserted rows.
pub async fn insert_stops(
    stops: &[StopDb],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    let stops_chunks = stops.chunks(1000).collect_vec();
    for stops in stops_chunks {
        let mut query_builder = QueryBuilder::new(
            "INSERT INTO ayna.stops (
                id,
                longitude,
                latitude,
                is_transport_hub
            )",
        );

        query_builder.push_values(stops, |mut b, stop| {
            b.push_bind(stop.id)
                .push_bind(stop.longitude)
                .push_bind(stop.latitude)
                .push_bind(stop.is_transport_hub);
        });

        let result = query_builder
            .build()
            .execute(&mut **tx)
            .instrument(info_span!("Inserting stops"))
            .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

pub async fn stop_count(pool: &Pool<Postgres>) -> Result<i64, sqlx::Error> {
    query_scalar("SELECT COUNT(*) FROM ayna.stops")
        .fetch_one(pool)
        .await
}
