// src/mission/flusher.rs

//! Periodic batch writer, one per mission.
//!
//! Each tick drains up to `batch_size` records from the mission ring, renders
//! them and hands the whole batch to the database as one transaction. A
//! failed batch is dropped; the next tick starts fresh.

use log::Level;
use metrics::counter;
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use super::registry::Mission;
use crate::comms::record::RawRecord;
use crate::config::InsertMode;
use crate::db::Database;
use crate::sql::{dml, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered; the database was not touched.
    Idle,
    Flushed { rows: u64, skipped: usize },
    Failed { dropped: usize },
}

pub struct BatchFlusher {
    mission: Arc<Mission>,
    db: Arc<dyn Database>,
    mode: InsertMode,
}

impl BatchFlusher {
    pub fn new(mission: Arc<Mission>, db: Arc<dyn Database>, mode: InsertMode) -> Self {
        Self { mission, db, mode }
    }

    pub fn mission(&self) -> &Arc<Mission> {
        &self.mission
    }

    /// Flush at most one batch.
    pub async fn tick(&self) -> FlushOutcome {
        let batch = self.mission.ring().drain(self.mission.batch_size());
        if batch.is_empty() {
            return FlushOutcome::Idle;
        }
        let name = self.mission.name().to_owned();
        let table = self.mission.table();

        let (written, skipped, result) = match self.mode {
            InsertMode::Literal => {
                let (statements, skipped) = self.render(&batch, |r| dml::insert_literal(table, r));
                if statements.is_empty() {
                    return FlushOutcome::Flushed { rows: 0, skipped };
                }
                (statements.len(), skipped, self.db.execute_batch(&statements).await)
            }
            InsertMode::Prepared => {
                let (params, skipped) = self.render(&batch, |r| dml::insert_params(table, r));
                if params.is_empty() {
                    return FlushOutcome::Flushed { rows: 0, skipped };
                }
                let len = params.len();
                (len, skipped, self.db.execute_prepared_batch(self.mission.insert_sql(), params).await)
            }
        };

        match result {
            Ok(rows) => {
                okra_log!(Level::Debug, "flusher", "mission '{}' flushed {} row(s)", name, rows);
                counter!("okra_flush_batches_total", "mission" => name.clone()).increment(1);
                counter!("okra_flush_rows_total", "mission" => name).increment(rows);
                FlushOutcome::Flushed { rows, skipped }
            }
            Err(e) => {
                okra_log!(Level::Error, "flusher", "mission '{}' dropped a batch of {}: {}", name, written, e);
                counter!("okra_flush_failures_total", "mission" => name.clone()).increment(1);
                counter!("okra_records_dropped_total", "mission" => name, "reason" => "flush_failed")
                    .increment(written as u64);
                FlushOutcome::Failed { dropped: written }
            }
        }
    }

    /// Render every record, logging and counting the ones that fail.
    fn render<T, F>(&self, batch: &[RawRecord], mut f: F) -> (Vec<T>, usize)
    where
        F: FnMut(&RawRecord) -> Result<T, RenderError>,
    {
        let mut out = Vec::with_capacity(batch.len());
        let mut skipped = 0;
        for record in batch {
            match f(record) {
                Ok(item) => out.push(item),
                Err(e) => {
                    skipped += 1;
                    okra_log!(Level::Warn, "flusher", "mission '{}' skipped a record: {}", self.mission.name(), e);
                }
            }
        }
        if skipped > 0 {
            counter!("okra_records_dropped_total", "mission" => self.mission.name().to_owned(), "reason" => "render")
                .increment(skipped as u64);
        }
        (out, skipped)
    }

    /// Flush until the ring is empty or the database fails.
    pub async fn drain(&self) -> u64 {
        let mut total = 0;
        loop {
            match self.tick().await {
                FlushOutcome::Flushed { rows, .. } => total += rows,
                FlushOutcome::Idle | FlushOutcome::Failed { .. } => return total,
            }
        }
    }

    /// Run `tick` every flush interval until `shutdown` flips to `true` (or
    /// its sender goes away), then flush what is left.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let name = self.mission.name().to_owned();
            let mut interval = tokio::time::interval(self.mission.flush_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;
            okra_log!(Level::Info, "flusher", "mission '{}' flusher started", name);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            let rows = self.drain().await;
            okra_log!(Level::Info, "flusher", "mission '{}' flusher stopped after a final {} row(s)", name, rows);
        })
    }
}
