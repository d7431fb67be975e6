//! Storing the outcome of one discovery run.

use sqlx::PgPool;
use ugci_trends::DiscoveryOutcome;

use crate::clusters::upsert_cluster;
use crate::tiles::upsert_tile;
use crate::trends::upsert_trend;
use crate::DbError;

/// What [`persist_discovery`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistedDiscovery {
    pub clusters: usize,
    pub trends: usize,
    pub tiles: usize,
}

/// Store every cluster, the signals that met the confidence floor and their
/// tiles, all in one transaction. Rows are upserted by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn persist_discovery(
    pool: &PgPool,
    outcome: &DiscoveryOutcome,
) -> Result<PersistedDiscovery, DbError> {
    let mut tx = pool.begin().await?;

    for cluster in &outcome.clusters {
        upsert_cluster(&mut *tx, &cluster.snapshot()).await?;
    }
    for signal in &outcome.signals {
        upsert_trend(&mut *tx, &signal.snapshot()).await?;
    }
    for tile in &outcome.tiles {
        upsert_tile(&mut *tx, tile).await?;
    }

    tx.commit().await?;

    let persisted = PersistedDiscovery {
        clusters: outcome.clusters.len(),
        trends: outcome.signals.len(),
        tiles: outcome.tiles.len(),
    };
    tracing::info!(
        clusters = persisted.clusters,
        trends = persisted.trends,
        tiles = persisted.tiles,
        "persisted discovery outcome"
    );
    Ok(persisted)
}
