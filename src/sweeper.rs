//! Expiration Sweeper (spec component C4): a single cooperative background
//! task that flips overdue `active` reservations to `expired` on a fixed
//! cadence. Grounded in the original's `reservation_expiration.py`
//! (`expire_reservations_once`, `_reservation_expiration_loop`), reworked
//! around a `tokio::time::interval` in place of the asyncio sleep loop.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LockType, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{error, info, instrument};

use crate::db::with_retry;
use crate::entities::reservation::{self, ReservationStatus};
use crate::errors::AppError;
use crate::notifier::ChangeNotifier;

/// Locks and flips every overdue `active` reservation to `expired` in one
/// transaction. Returns the number of rows flipped. Safe to call
/// concurrently with user operations: both compete for the same row locks,
/// and whichever loses simply re-reads the now-expired row on its next
/// attempt.
#[instrument(skip(conn))]
pub async fn expire_once(conn: &DatabaseConnection) -> Result<u64, AppError> {
    with_retry("expiration_sweep", || async {
        let now = Utc::now();
        let txn = conn.begin().await?;

        let overdue = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .filter(reservation::Column::ExpiresAt.lt(now))
            .order_by_asc(reservation::Column::Id)
            .lock(LockType::Update)
            .all(&txn)
            .await?;

        let flipped = overdue.len() as u64;

        for r in overdue {
            let mut active_model: reservation::ActiveModel = r.into();
            active_model.status = Set(ReservationStatus::Expired.as_str().to_string());
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(flipped)
    })
    .await
}

/// Runs `expire_once` forever on `interval`, signaling the change notifier
/// whenever a tick flips at least one row. Intended to be spawned exactly
/// once per process via `tokio::spawn`; never started in the test
/// environment.
pub async fn run(conn: DatabaseConnection, notifier: Arc<ChangeNotifier>, interval: StdDuration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match expire_once(&conn).await {
            Ok(0) => {}
            Ok(flipped) => {
                info!(flipped, "expiration sweeper flipped overdue reservations");
                notifier.broadcast();
            }
            Err(err) => error!(%err, "expiration sweeper tick failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    // Exercised against a real database in `tests/reservation_lifecycle_test.rs`
    // (scenario S6); this module holds no pure-function logic worth unit
    // testing in isolation.
}
