//! The accrual service: single writer around the engine, periodic tick task,
//! and event fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use minebank_accrual::{AccrualEngine, AccrualResult, NoOpReason, UnitBalance};
use minebank_store::Backend;
use minebank_store_lmdb::LmdbEnvironment;
use minebank_types::{AccrualParams, Amount, Clock, SystemClock, Timestamp, Unit};
use minebank_utils::{format_duration, StatsCounter};

use crate::config::ServiceConfig;
use crate::event::AccrualEvent;
use crate::shutdown::ShutdownController;
use crate::ServiceError;

const STAT_TICKS: &str = "ticks";
const STAT_APPLIED: &str = "applied";
const STAT_WITHHELD: &str = "withheld";
const STAT_NOOP: &str = "noop";
const STAT_ERRORS: &str = "errors";

const LMDB_MAX_DBS: u32 = 4;

/// Point-in-time view for status displays.
#[derive(Clone, Debug)]
pub struct ServiceStatus {
    pub engine: AccrualEngine,
    pub now: Timestamp,
    pub seconds_until_next_accrual: Option<u64>,
    pub stats: BTreeMap<&'static str, u64>,
}

struct ServiceInner {
    engine: Mutex<AccrualEngine>,
    store: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    params: AccrualParams,
    events: broadcast::Sender<AccrualEvent>,
    stats: StatsCounter,
}

/// Hosts the accrual engine.
///
/// Every tick and control operation runs as one exclusive store update: the
/// engine is loaded from what the store holds at that moment, changed, and
/// written back before any other writer (another daemon process included)
/// can commit. The engine lock serializes callers within this process.
pub struct AccrualService {
    inner: Arc<ServiceInner>,
    shutdown: ShutdownController,
    tick_cadence: Duration,
    task: Option<JoinHandle<()>>,
}

impl AccrualService {
    /// Build a service over an arbitrary backend and clock.
    ///
    /// A fresh store is initialized from `params` and persisted immediately.
    pub fn new(
        store: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        params: AccrualParams,
        config: &ServiceConfig,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        let now = clock.now();
        let fresh = store.get_accrual_state()?.is_none();
        let (engine, ()) = AccrualEngine::update_in_store(&*store, &params, now, |_| {
            Ok::<_, ServiceError>(())
        })?;
        if fresh {
            tracing::info!(%now, "initialized accrual store with defaults");
        }

        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let inner = ServiceInner {
            engine: Mutex::new(engine),
            store,
            clock,
            params,
            events,
            stats: StatsCounter::new(&[
                STAT_TICKS,
                STAT_APPLIED,
                STAT_WITHHELD,
                STAT_NOOP,
                STAT_ERRORS,
            ]),
        };

        Ok(Self {
            inner: Arc::new(inner),
            shutdown: ShutdownController::new(),
            tick_cadence: config.tick_cadence(),
            task: None,
        })
    }

    /// Open the LMDB store under `config.data_dir` with the system clock.
    pub fn open(config: &ServiceConfig, params: AccrualParams) -> Result<Self, ServiceError> {
        let env = LmdbEnvironment::open(&config.data_dir, LMDB_MAX_DBS, config.lmdb_map_size)?;
        let store: Arc<dyn Backend> = Arc::new(env.accrual_store());
        Self::new(store, Arc::new(SystemClock), params, config)
    }

    /// Override the scheduler cadence (tests use sub-second cadences).
    pub fn with_tick_cadence(mut self, cadence: Duration) -> Self {
        self.tick_cadence = cadence;
        self
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AccrualEvent> {
        self.inner.events.subscribe()
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawn the periodic tick task.
    pub fn start(&mut self) -> Result<(), ServiceError> {
        if self.is_running() {
            return Err(ServiceError::AlreadyRunning);
        }

        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.shutdown.subscribe();
        let cadence = self.tick_cadence;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(cadence);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("accrual tick task shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = inner.tick().await {
                            inner.stats.increment(STAT_ERRORS);
                            tracing::warn!(error = %e, "accrual tick failed");
                        }
                    }
                }
            }
        });

        tracing::info!(cadence = ?cadence, "accrual tick task started");
        self.task = Some(handle);
        Ok(())
    }

    /// Signal the tick task to stop and wait for it.
    pub async fn stop(&mut self) -> Result<(), ServiceError> {
        self.shutdown.shutdown();
        if let Some(handle) = self.task.take() {
            handle
                .await
                .map_err(|e| ServiceError::Task(e.to_string()))?;
        }
        Ok(())
    }

    /// Run one tick immediately, outside the schedule.
    pub async fn tick_now(&self) -> Result<AccrualResult, ServiceError> {
        self.inner.tick().await
    }

    /// Current engine state, counters, and time to the next accrual.
    pub async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        let inner = &self.inner;
        let mut engine = inner.engine.lock().await;
        inner.reload(&mut engine)?;
        let now = inner.clock.now();
        Ok(ServiceStatus {
            engine: engine.clone(),
            now,
            seconds_until_next_accrual: engine.state().seconds_until_next_accrual(now),
            stats: inner.stats.snapshot(),
        })
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), ServiceError> {
        self.inner
            .mutate(|engine, now| {
                let settled = engine.set_enabled(enabled, now)?;
                tracing::info!(enabled, "accrual {}", if enabled { "enabled" } else { "disabled" });
                Ok(Change::settled((), settled, AccrualEvent::Toggled { enabled }))
            })
            .await
    }

    pub async fn set_target_unit(&self, symbol: &str) -> Result<Unit, ServiceError> {
        self.inner
            .mutate(|engine, _| {
                let unit = engine.set_target_unit(symbol)?;
                tracing::info!(%unit, "target unit changed");
                let event = AccrualEvent::RoutingChanged {
                    auto_credit: engine.state().auto_credit,
                    target_unit: unit,
                };
                Ok(Change::new(unit, event))
            })
            .await
    }

    pub async fn set_auto_credit(&self, enabled: bool, unit: Option<Unit>) -> Result<(), ServiceError> {
        self.inner
            .mutate(|engine, _| {
                engine.set_auto_credit(enabled, unit)?;
                let target_unit = engine.state().target_unit;
                tracing::info!(auto_credit = enabled, %target_unit, "routing changed");
                let event = AccrualEvent::RoutingChanged {
                    auto_credit: enabled,
                    target_unit,
                };
                Ok(Change::new((), event))
            })
            .await
    }

    /// Change the rate after settling intervals due at the old rate.
    pub async fn set_rate(&self, rate: Amount) -> Result<(), ServiceError> {
        self.inner
            .mutate(|engine, now| {
                let settled = engine.set_rate(rate, now)?;
                tracing::info!(rate = %rate, "accrual rate changed");
                Ok(Change::settled((), settled, AccrualEvent::RateChanged { rate }))
            })
            .await
    }

    pub async fn set_wallet_address(&self, address: String) -> Result<(), ServiceError> {
        self.inner
            .mutate(|engine, _| {
                engine.set_wallet_address(address.clone());
                tracing::info!(address = %address, "mining wallet address updated");
                Ok(Change::new((), AccrualEvent::WalletAddressChanged { address }))
            })
            .await
    }

    /// Admin overwrite of a unit's address and/or balance.
    pub async fn update_unit_wallet(
        &self,
        unit: Unit,
        address: Option<String>,
        balance: Option<Amount>,
    ) -> Result<UnitBalance, ServiceError> {
        self.inner
            .mutate(|engine, _| {
                let entry = engine.update_unit_wallet(unit, address, balance).clone();
                tracing::info!(%unit, balance = %entry.balance, "unit wallet updated");
                let event = AccrualEvent::UnitWalletUpdated {
                    unit,
                    address: entry.address.clone(),
                    balance: entry.balance,
                };
                Ok(Change::new(entry, event))
            })
            .await
    }

    /// Wipe the store and restore defaults.
    pub async fn reset(&self) -> Result<(), ServiceError> {
        let inner = &self.inner;
        let mut engine = inner.engine.lock().await;
        let now = inner.clock.now();
        *engine = AccrualEngine::reset(&*inner.store, &inner.params, now)?;
        tracing::warn!(%now, "accrual store reset to defaults");
        inner.publish(AccrualEvent::Reset);
        Ok(())
    }
}

impl Drop for AccrualService {
    fn drop(&mut self) {
        self.shutdown.shutdown();
    }
}

/// What a control operation produced: its return value, the tick it settled
/// first (if any), and the event to publish once persisted.
struct Change<T> {
    value: T,
    settled: Option<AccrualResult>,
    event: AccrualEvent,
}

impl<T> Change<T> {
    fn new(value: T, event: AccrualEvent) -> Self {
        Self {
            value,
            settled: None,
            event,
        }
    }

    fn settled(value: T, settled: AccrualResult, event: AccrualEvent) -> Self {
        Self {
            value,
            settled: Some(settled),
            event,
        }
    }
}

impl ServiceInner {
    /// Replace the cached engine with what the store holds now.
    fn reload(&self, engine: &mut AccrualEngine) -> Result<(), ServiceError> {
        *engine = AccrualEngine::load_from_store(&*self.store, &self.params, self.clock.now())?;
        Ok(())
    }

    async fn tick(&self) -> Result<AccrualResult, ServiceError> {
        let mut engine = self.engine.lock().await;
        let now = self.clock.now();
        let (updated, result) =
            AccrualEngine::update_in_store(&*self.store, &self.params, now, |working| {
                Ok::<_, ServiceError>(working.tick(now))
            })?;
        *engine = updated;
        self.stats.increment(STAT_TICKS);

        self.record(&result);
        if let AccrualResult::NoOp(NoOpReason::BelowInterval { .. }) = result {
            if let Some(secs) = engine.state().seconds_until_next_accrual(now) {
                tracing::trace!(next_in = %format_duration(secs), "no whole interval yet");
            }
        }
        Ok(result)
    }

    /// Count, log, and publish a tick outcome.
    fn record(&self, result: &AccrualResult) {
        match result {
            AccrualResult::Applied(accrual) => {
                self.stats.increment(STAT_APPLIED);
                tracing::info!(
                    intervals = accrual.intervals,
                    gross = %accrual.gross,
                    credited = %accrual.credited_amount,
                    target = %accrual.credited_to,
                    balance = %accrual.new_balance,
                    "accrual applied"
                );
                self.publish(AccrualEvent::Accrued(accrual.clone()));
            }
            AccrualResult::Withheld { intervals, reason } => {
                self.stats.increment(STAT_WITHHELD);
                tracing::warn!(intervals, %reason, "accrual withheld");
                self.publish(AccrualEvent::Withheld {
                    intervals: *intervals,
                    reason: *reason,
                });
            }
            AccrualResult::NoOp(reason) => {
                self.stats.increment(STAT_NOOP);
                if let NoOpReason::ClockRegression { behind_secs } = reason {
                    tracing::warn!(behind_secs, "clock moved backwards, skipping tick");
                }
            }
        }
    }

    fn publish(&self, event: AccrualEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Apply `op` inside one store update, then publish.
    ///
    /// On error the cached engine and the store are left as they were.
    async fn mutate<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut AccrualEngine, Timestamp) -> Result<Change<T>, ServiceError>,
    {
        let mut engine = self.engine.lock().await;
        let now = self.clock.now();
        let (updated, change) =
            AccrualEngine::update_in_store(&*self.store, &self.params, now, |working| {
                op(working, now)
            })?;
        *engine = updated;

        if let Some(settled) = &change.settled {
            if !matches!(settled, AccrualResult::NoOp(_)) {
                self.record(settled);
            }
        }
        self.publish(change.event);
        Ok(change.value)
    }
}
