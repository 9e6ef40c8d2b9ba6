//! Direct reads from a ChEMBL PostgreSQL dump
//!
//! The whole result set is collected before the synchronous converter runs.

use bioconv_common::{ConvertError, Result};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

/// Molecule and parent ChEMBL ids from `molecule_hierarchy`
pub const HIERARCHY_QUERY: &str = "SELECT md.chembl_id, parent.chembl_id AS parent_chembl_id \
     FROM molecule_dictionary AS md \
     JOIN molecule_hierarchy AS mh ON md.molregno = mh.molregno \
     JOIN molecule_dictionary AS parent ON parent.molregno = mh.parent_molregno";

const CONNECT_TIMEOUT_SECS: u64 = 30;

fn database_error(e: sqlx::Error) -> ConvertError {
    ConvertError::Database(e.to_string())
}

/// Fetch every `(chembl_id, parent_chembl_id)` pair
pub async fn fetch_chembl_hierarchy(database_url: &str) -> Result<Vec<(String, String)>> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .connect(database_url)
        .await
        .map_err(database_error)?;

    let rows: Vec<(String, String)> = sqlx::query_as(HIERARCHY_QUERY)
        .fetch_all(&pool)
        .await
        .map_err(database_error)?;

    pool.close().await;
    info!(rows = rows.len(), "Fetched ChEMBL hierarchy");
    Ok(rows)
}
