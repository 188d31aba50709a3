//! Background settlement monitors.
//!
//! A monitor repeatedly runs a settlement check for one transaction, starting immediately, until the transaction is
//! paid or its payment deadline passes. The deadline is measured from the moment the transaction was created, so a
//! monitor resumed after a restart only runs for whatever time the customer has left.
//!
//! [`PaymentMonitor`] supervises the monitor tasks. It keeps at most one live monitor per transaction. Tasks remove
//! themselves from the registry when they exit, and can be cancelled one at a time or all together on shutdown.
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use chrono::Utc;
use log::*;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    db_types::Transaction,
    tix_api::{settlement_api::SettlementApi, transaction_objects::PaymentCheckOutcome},
    traits::{TicketingDatabase, TicketingError},
    SqliteDatabase,
};

#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Time between settlement checks
    pub poll_interval: Duration,
    /// How long after a transaction is created its monitor gives up
    pub deadline: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(10), deadline: Duration::from_secs(30 * 60) }
    }
}

/// A running monitor. `generation` tells a monitor apart from a later one for the same transaction.
struct MonitorHandle {
    generation: u64,
    handle: JoinHandle<()>,
}

type Registry = Arc<Mutex<HashMap<Uuid, MonitorHandle>>>;

#[derive(Clone)]
pub struct PaymentMonitor {
    settlement: Arc<SettlementApi<SqliteDatabase>>,
    config: MonitorConfig,
    monitors: Registry,
    generations: Arc<AtomicU64>,
}

impl Debug for PaymentMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentMonitor({:?}, {} active)", self.config, self.active_count())
    }
}

impl PaymentMonitor {
    pub fn new(settlement: Arc<SettlementApi<SqliteDatabase>>, config: MonitorConfig) -> Self {
        Self {
            settlement,
            config,
            monitors: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Starts a monitor for the transaction.
    ///
    /// Returns `false` without starting anything if the transaction is already paid, its deadline has passed, or a
    /// monitor for it is already running.
    pub fn watch(&self, transaction: &Transaction) -> bool {
        if transaction.is_paid() {
            return false;
        }
        let Some(remaining) = self.time_remaining(transaction) else {
            debug!("🕰️ The payment deadline for transaction {} has already passed", transaction.id);
            return false;
        };
        let id = transaction.id;
        let mut monitors = lock(&self.monitors);
        if monitors.get(&id).is_some_and(|m| !m.handle.is_finished()) {
            trace!("🕰️ Transaction {id} is already being monitored");
            return false;
        }
        let settlement = Arc::clone(&self.settlement);
        let registry = Arc::clone(&self.monitors);
        let poll_interval = self.config.poll_interval;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(async move {
            run_monitor(settlement, id, poll_interval, remaining).await;
            forget(&registry, &id, generation);
        });
        monitors.insert(id, MonitorHandle { generation, handle });
        info!("🕰️ Monitoring transaction {id} for payment for the next {}s", remaining.as_secs());
        true
    }

    /// Cancels the monitor for a transaction. Returns `true` if one was running.
    pub fn stop(&self, transaction_id: &Uuid) -> bool {
        match lock(&self.monitors).remove(transaction_id) {
            Some(MonitorHandle { handle, .. }) => {
                let was_running = !handle.is_finished();
                handle.abort();
                debug!("🕰️ Monitor for transaction {transaction_id} cancelled");
                was_running
            },
            None => false,
        }
    }

    /// Cancels every running monitor.
    pub fn stop_all(&self) {
        let handles = lock(&self.monitors).drain().collect::<Vec<_>>();
        info!("🕰️ Stopping {} payment monitors", handles.len());
        for (_, monitor) in handles {
            monitor.handle.abort();
        }
    }

    pub fn active_count(&self) -> usize {
        lock(&self.monitors).values().filter(|m| !m.handle.is_finished()).count()
    }

    pub fn is_watching(&self, transaction_id: &Uuid) -> bool {
        lock(&self.monitors).get(transaction_id).is_some_and(|m| !m.handle.is_finished())
    }

    /// Starts monitors for every pending transaction whose deadline has not passed yet. Returns the number started.
    pub async fn resume_pending(&self) -> Result<usize, TicketingError> {
        let pending = self.settlement.db().fetch_pending_transactions().await?;
        let started = pending.iter().filter(|t| self.watch(t)).count();
        info!("🕰️ Resumed monitoring for {started} of {} pending transactions", pending.len());
        Ok(started)
    }

    fn time_remaining(&self, transaction: &Transaction) -> Option<Duration> {
        let deadline = chrono::Duration::from_std(self.config.deadline).ok()?;
        let remaining = (transaction.locked_at + deadline - Utc::now()).to_std().ok()?;
        (!remaining.is_zero()).then_some(remaining)
    }
}

fn lock(registry: &Registry) -> std::sync::MutexGuard<'_, HashMap<Uuid, MonitorHandle>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes the registry entry for `id` if it still belongs to the monitor of the given generation. A monitor that was
/// replaced after it was cancelled must not remove its successor.
fn forget(registry: &Registry, id: &Uuid, generation: u64) {
    let mut monitors = lock(registry);
    if monitors.get(id).is_some_and(|m| m.generation == generation) {
        monitors.remove(id);
    }
}

async fn run_monitor(
    settlement: Arc<SettlementApi<SqliteDatabase>>,
    id: Uuid,
    poll_interval: Duration,
    remaining: Duration,
) {
    let mut timer = tokio::time::interval(poll_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = tokio::time::sleep_until(Instant::now() + remaining);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("🕰️ No payment for transaction {id} arrived before the deadline. Monitoring stopped.");
                break;
            }
            _ = timer.tick() => {
                match settlement.check_payment_for(&id).await {
                    Ok(outcome) if outcome.is_settled() => {
                        info!("🕰️ Transaction {id} is paid. Monitoring stopped.");
                        break;
                    },
                    Ok(PaymentCheckOutcome::ChainUnavailable { reason }) => {
                        debug!("🕰️ Chain unavailable while monitoring {id}. Trying again later. {reason}");
                    },
                    Ok(_) => trace!("🕰️ No payment for transaction {id} yet"),
                    Err(TicketingError::TransactionNotFound(_)) => {
                        warn!("🕰️ Transaction {id} no longer exists. Monitoring stopped.");
                        break;
                    },
                    Err(e) => error!("🕰️ Error checking payment for transaction {id}. {e}"),
                }
            }
        }
    }
}
