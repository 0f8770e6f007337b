//! Sharded single-writer workers
//!
//! Subjects are routed to a shard by `xxh3(subject) % shards`. Each shard is a
//! dedicated thread owning its own `AnomalyService`, so every mutation and
//! recomputation for one subject is applied in arrival order by one writer,
//! while different shards run in parallel.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use pawtrack_core::{
    ActivityEvent, AnomalyAlert, AnomalyService, DailyTotals, DetectorConfig, EventId,
    FixedClock, RegistryConfig, Severity, StoreError, SystemClock,
};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::metrics::{
    ALERTS_TOTAL, CACHED_SUBJECTS, DROPPED_TOTAL, EVENTS_TOTAL, RECOMPUTE_LATENCY, RECOMPUTE_TOTAL,
};

type Reply<T> = oneshot::Sender<T>;

/// Work item sent to a shard
pub enum Command {
    AddEvent {
        event: ActivityEvent,
        reply: Reply<(EventId, Vec<AnomalyAlert>)>,
    },
    UpdateEvent {
        id: EventId,
        event: ActivityEvent,
        reply: Reply<Result<Vec<AnomalyAlert>, StoreError>>,
    },
    RemoveEvent {
        subject_id: String,
        id: EventId,
        reply: Reply<Result<Vec<AnomalyAlert>, StoreError>>,
    },
    Recompute {
        subject_id: String,
        reply: Reply<Vec<AnomalyAlert>>,
    },
    GetAnomalies {
        subject_id: String,
        reply: Reply<Vec<AnomalyAlert>>,
    },
    DailyTotals {
        subject_id: String,
        reply: Reply<Vec<DailyTotals>>,
    },
    Evict {
        subject_id: String,
        reply: Reply<bool>,
    },
}

/// Errors reaching a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Shard queue is full
    Backpressure,
    /// Shard thread has stopped
    Unavailable,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backpressure => write!(f, "Shard queue is full"),
            Self::Unavailable => write!(f, "Shard is not running"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Settings shared by every shard
#[derive(Debug, Clone)]
pub struct ShardSettings {
    pub detector: DetectorConfig,
    pub registry: RegistryConfig,
    pub utc_offset_minutes: i32,
    pub queue_depth: usize,
    /// Freeze "now" for every shard instead of reading the wall clock
    pub fixed_clock: Option<FixedClock>,
}

impl Default for ShardSettings {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            registry: RegistryConfig::default(),
            utc_offset_minutes: 0,
            queue_depth: 10_000,
            fixed_clock: None,
        }
    }
}

struct ShardWorker {
    id: usize,
    rx: Receiver<Command>,
    service: AnomalyService,
}

impl ShardWorker {
    fn spawn(
        id: usize,
        rx: Receiver<Command>,
        settings: ShardSettings,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("pawtrack-shard-{}", id))
            .spawn(move || {
                let service = AnomalyService::in_memory(settings.detector)
                    .with_registry_config(settings.registry);
                let service = match settings.fixed_clock {
                    Some(clock) => service.with_clock(clock),
                    None => service
                        .with_clock(SystemClock::with_offset_minutes(settings.utc_offset_minutes)),
                };
                let mut worker = ShardWorker { id, rx, service };
                worker.run();
                info!(shard = id, "Shard worker stopped.");
            })
    }

    fn run(&mut self) {
        info!(shard = self.id, "Shard worker active.");

        // Ends when every sender (the pool handles) has been dropped
        while let Ok(command) = self.rx.recv() {
            self.handle(command);
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::AddEvent { event, reply } => {
                EVENTS_TOTAL.with_label_values(&["add"]).inc();
                let subject = event.subject_id.clone();
                let id = self.timed(|svc| svc.add_event(event));
                let alerts = self.observe(&subject);
                let _ = reply.send((id, alerts));
            }
            Command::UpdateEvent { id, event, reply } => {
                let subject = event.subject_id.clone();
                let result = self
                    .timed(|svc| svc.update_event(id, event))
                    .map(|_| self.observe(&subject));
                if result.is_ok() {
                    EVENTS_TOTAL.with_label_values(&["update"]).inc();
                }
                let _ = reply.send(result);
            }
            Command::RemoveEvent {
                subject_id,
                id,
                reply,
            } => {
                let owned = self.service.store().subject_of(id) == Some(subject_id.as_str());
                let result = if owned {
                    self.timed(|svc| svc.remove_event(id))
                        .map(|_| self.observe(&subject_id))
                } else {
                    Err(StoreError::UnknownEvent(id))
                };
                if result.is_ok() {
                    EVENTS_TOTAL.with_label_values(&["remove"]).inc();
                }
                let _ = reply.send(result);
            }
            Command::Recompute { subject_id, reply } => {
                self.timed(|svc| {
                    svc.recalc_anomalies(&subject_id);
                });
                let _ = reply.send(self.observe(&subject_id));
            }
            Command::GetAnomalies { subject_id, reply } => {
                let _ = reply.send(self.service.get_anomalies(&subject_id).to_vec());
            }
            Command::DailyTotals { subject_id, reply } => {
                let daily = match self.service.daily_totals(&subject_id) {
                    Some(daily) => daily.to_vec(),
                    None => {
                        self.timed(|svc| {
                            svc.recalc_anomalies(&subject_id);
                        });
                        self.observe(&subject_id);
                        self.service
                            .daily_totals(&subject_id)
                            .map(|d| d.to_vec())
                            .unwrap_or_default()
                    }
                };
                let _ = reply.send(daily);
            }
            Command::Evict { subject_id, reply } => {
                let evicted = self.service.evict(&subject_id);
                self.update_gauge();
                let _ = reply.send(evicted);
            }
        }
    }

    /// Run a mutating call under the latency histogram
    fn timed<T>(&mut self, f: impl FnOnce(&mut AnomalyService) -> T) -> T {
        let timer = RECOMPUTE_LATENCY.start_timer();
        RECOMPUTE_TOTAL.inc();
        let out = f(&mut self.service);
        timer.observe_duration();
        out
    }

    /// Record the freshly computed set for a subject and hand it back
    fn observe(&self, subject_id: &str) -> Vec<AnomalyAlert> {
        let alerts = self.service.get_anomalies(subject_id).to_vec();

        for alert in &alerts {
            ALERTS_TOTAL
                .with_label_values(&[
                    alert.metric.as_str(),
                    alert.kind.as_str(),
                    alert.severity.as_str(),
                ])
                .inc();

            if alert.severity == Severity::Critical {
                warn!(
                    shard = self.id,
                    subject = subject_id,
                    alert = %alert.id,
                    "CRITICAL ALERT: {}",
                    alert.description
                );
            }
        }

        self.update_gauge();
        alerts
    }

    fn update_gauge(&self) {
        let shard = self.id.to_string();
        CACHED_SUBJECTS
            .with_label_values(&[shard.as_str()])
            .set(self.service.registry_stats().total_subjects as i64);
    }
}

/// Cloneable handle routing commands to shard workers
#[derive(Clone)]
pub struct ShardPool {
    txs: Arc<Vec<Sender<Command>>>,
}

impl ShardPool {
    /// Start `shards` workers. Dropping every pool clone stops them.
    pub fn spawn(
        shards: usize,
        settings: ShardSettings,
    ) -> std::io::Result<(Self, Vec<thread::JoinHandle<()>>)> {
        let shards = shards.max(1);
        let mut txs = Vec::with_capacity(shards);
        let mut handles = Vec::with_capacity(shards);

        for i in 0..shards {
            let (tx, rx) = bounded::<Command>(settings.queue_depth.max(1));
            txs.push(tx);
            handles.push(ShardWorker::spawn(i, rx, settings.clone())?);
        }

        Ok((Self { txs: Arc::new(txs) }, handles))
    }

    pub fn shard_count(&self) -> usize {
        self.txs.len()
    }

    pub fn shard_for(&self, subject_id: &str) -> usize {
        (xxhash_rust::xxh3::xxh3_64(subject_id.as_bytes()) as usize) % self.txs.len()
    }

    /// Send a command to the subject's shard and await its reply
    pub async fn request<T>(
        &self,
        subject_id: &str,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, PoolError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let shard = self.shard_for(subject_id);

        match self.txs[shard].try_send(build(reply_tx)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                DROPPED_TOTAL.inc();
                return Err(PoolError::Backpressure);
            }
            Err(TrySendError::Disconnected(_)) => return Err(PoolError::Unavailable),
        }

        reply_rx.await.map_err(|_| PoolError::Unavailable)
    }

    pub async fn add_event(
        &self,
        event: ActivityEvent,
    ) -> Result<(EventId, Vec<AnomalyAlert>), PoolError> {
        let subject = event.subject_id.clone();
        self.request(&subject, |reply| Command::AddEvent { event, reply })
            .await
    }

    pub async fn update_event(
        &self,
        id: EventId,
        event: ActivityEvent,
    ) -> Result<Result<Vec<AnomalyAlert>, StoreError>, PoolError> {
        let subject = event.subject_id.clone();
        self.request(&subject, |reply| Command::UpdateEvent { id, event, reply })
            .await
    }

    pub async fn remove_event(
        &self,
        subject_id: &str,
        id: EventId,
    ) -> Result<Result<Vec<AnomalyAlert>, StoreError>, PoolError> {
        let owned = subject_id.to_string();
        self.request(subject_id, |reply| Command::RemoveEvent {
            subject_id: owned,
            id,
            reply,
        })
        .await
    }

    pub async fn recompute(&self, subject_id: &str) -> Result<Vec<AnomalyAlert>, PoolError> {
        let owned = subject_id.to_string();
        self.request(subject_id, |reply| Command::Recompute {
            subject_id: owned,
            reply,
        })
        .await
    }

    pub async fn anomalies(&self, subject_id: &str) -> Result<Vec<AnomalyAlert>, PoolError> {
        let owned = subject_id.to_string();
        self.request(subject_id, |reply| Command::GetAnomalies {
            subject_id: owned,
            reply,
        })
        .await
    }

    pub async fn daily_totals(&self, subject_id: &str) -> Result<Vec<DailyTotals>, PoolError> {
        let owned = subject_id.to_string();
        self.request(subject_id, |reply| Command::DailyTotals {
            subject_id: owned,
            reply,
        })
        .await
    }

    pub async fn evict(&self, subject_id: &str) -> Result<bool, PoolError> {
        let owned = subject_id.to_string();
        self.request(subject_id, |reply| Command::Evict {
            subject_id: owned,
            reply,
        })
        .await
    }
}
