//! Oracle Service - Core orchestration
//!
//! Wraps the synchronous [`ConsensusEngine`] with persistence, downstream
//! delivery and event publication.
//!
//! Every mutating call runs in three steps:
//! 1. Apply the operation to the engine under the write lock
//! 2. Persist the snapshot, still under the lock
//! 3. Release the lock, queue a completion for delivery, publish events,
//!    then wait for the delivery outcome
//!
//! Persisting before delivery means a restart never re-delivers a frame.
//! Deliveries run on a dedicated task fed in completion order, so a caller
//! that stops waiting (timeout, `select!`, aborted task) cannot lose one.
//! Everything before that wait is synchronous.

use crate::domain::{
    BeaconSpec, CompletedFrame, CompletionStatus, ConsensusEngine, EpochRange, FrameStatus,
    FrameWindow, MemberAddress, Timestamp, VariantSupport,
};
use crate::error::{OracleError, OracleResult};
use crate::events::{OracleEvent, ReportSubmission};
use crate::metrics;
use crate::ports::inbound::OracleApi;
use crate::ports::outbound::{BeaconReportReceiver, OracleStateStore, TimeSource};
use crate::types::OracleConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};


/// Beacon oracle service
pub struct OracleService<R, S, T>
where
    R: BeaconReportReceiver,
    S: OracleStateStore,
    T: TimeSource,
{
    engine: Arc<RwLock<ConsensusEngine>>,
    deliveries: mpsc::UnboundedSender<Delivery>,
    store: Arc<S>,
    time: Arc<T>,
    events: broadcast::Sender<OracleEvent>,
    /// Serializes mutating calls including their downstream delivery
    op_lock: Mutex<()>,
    _receiver: PhantomData<R>,
}

/// Completed frame queued for the delivery task
struct Delivery {
    frame: CompletedFrame,
    outcome: oneshot::Sender<OracleResult<()>>,
}

impl<R, S, T> OracleService<R, S, T>
where
    R: BeaconReportReceiver,
    S: OracleStateStore,
    T: TimeSource,
{
    /// Create the service, resuming from the store when it holds a snapshot
    ///
    /// `config` only seeds a fresh oracle; persisted state wins otherwise.
    /// Spawns the delivery task, so it must be called within a Tokio runtime.
    pub fn new(
        config: OracleConfig,
        receiver: Arc<R>,
        store: Arc<S>,
        time: Arc<T>,
    ) -> OracleResult<Self>
    where
        R: 'static,
    {
        let engine = match store.load()? {
            Some(snapshot) => {
                let engine = ConsensusEngine::restore(snapshot)?;
                info!(
                    frame_id = engine.current_frame(time.now()).frame_id,
                    members = engine.membership().len(),
                    quorum = engine.quorum(),
                    last_completed_epoch = ?engine.last_completed_epoch(),
                    "Resumed oracle state from store"
                );
                engine
            }
            None => {
                let engine =
                    ConsensusEngine::with_membership(config.spec, config.membership()?, time.now())?;
                store.save(&engine.snapshot())?;
                info!(
                    members = engine.membership().len(),
                    quorum = engine.quorum(),
                    "Initialized fresh oracle state"
                );
                engine
            }
        };

        metrics::set_quorum(engine.quorum());
        metrics::set_member_count(engine.membership().len());

        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (deliveries, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_deliveries(receiver, queue));

        Ok(Self {
            engine: Arc::new(RwLock::new(engine)),
            deliveries,
            store,
            time,
            events,
            op_lock: Mutex::new(()),
            _receiver: PhantomData,
        })
    }

    /// Subscribe to events published after each successful operation
    pub fn subscribe(&self) -> broadcast::Receiver<OracleEvent> {
        self.events.subscribe()
    }

    /// Run `op` against the engine and persist the result
    ///
    /// A rejected operation leaves the engine untouched and is not persisted.
    /// The returned inner result carries the persistence outcome.
    fn apply<O>(
        &self,
        op: impl FnOnce(&mut ConsensusEngine) -> OracleResult<O>,
    ) -> OracleResult<(O, OracleResult<()>)> {
        let mut engine = self.engine.write();
        let output = op(&mut engine)?;

        let persisted = self.store.save(&engine.snapshot());
        if let Err(err) = &persisted {
            error!(error = %err, "Failed to persist oracle state");
        }

        metrics::set_quorum(engine.quorum());
        metrics::set_member_count(engine.membership().len());
        Ok((output, persisted))
    }

    /// Queue a completion, publish events, then report the first failure
    ///
    /// The completion is handed to the delivery task before the first await,
    /// so it reaches downstream even if this future is dropped.
    async fn finish(
        &self,
        persisted: OracleResult<()>,
        completed: Option<CompletedFrame>,
        mut events: Vec<OracleEvent>,
    ) -> OracleResult<()> {
        let pending = completed.map(|frame| {
            metrics::record_frame_completed();
            events.push(OracleEvent::completed(&frame));
            (frame.epoch_id(), self.enqueue(frame))
        });
        self.publish(events);

        let delivered = match pending {
            Some((epoch_id, outcome)) => outcome.await.unwrap_or_else(|_| {
                Err(OracleError::DownstreamRejected {
                    epoch_id,
                    reason: "delivery task stopped".to_string(),
                })
            }),
            None => Ok(()),
        };

        persisted?;
        delivered
    }

    fn enqueue(&self, frame: CompletedFrame) -> oneshot::Receiver<OracleResult<()>> {
        let (frame_id, epoch_id) = (frame.frame_id, frame.epoch_id());
        let (outcome, result) = oneshot::channel();
        if self.deliveries.send(Delivery { frame, outcome }).is_err() {
            // The dropped sender resolves `result` as an error
            error!(
                frame_id,
                epoch_id,
                "Delivery task is gone; completed frame not delivered"
            );
        }
        result
    }

    fn publish(&self, events: Vec<OracleEvent>) {
        for event in events {
            let name = event.name();
            // Err only means nobody is subscribed
            if let Ok(receivers) = self.events.send(event) {
                debug!(event = name, receivers, "Published oracle event");
            }
        }
    }
}

/// Deliver queued completions one at a time, in queue order
async fn run_deliveries<R: BeaconReportReceiver>(
    receiver: Arc<R>,
    mut queue: mpsc::UnboundedReceiver<Delivery>,
) {
    while let Some(Delivery { frame, outcome }) = queue.recv().await {
        let result = deliver(receiver.as_ref(), &frame).await;
        // The caller may have stopped waiting; the delivery happened anyway
        let _ = outcome.send(result);
    }
}

async fn deliver<R: BeaconReportReceiver>(receiver: &R, frame: &CompletedFrame) -> OracleResult<()> {
    let report = frame.report;
    let result = receiver
        .on_frame_completed(
            report.epoch_id,
            report.beacon_balance,
            report.beacon_validators,
        )
        .await;

    match result {
        Ok(()) => {
            debug!(
                frame_id = frame.frame_id,
                epoch_id = report.epoch_id,
                "Completed frame delivered downstream"
            );
            Ok(())
        }
        Err(err) => {
            metrics::record_downstream_failure();
            warn!(
                frame_id = frame.frame_id,
                epoch_id = report.epoch_id,
                error = %err,
                "Downstream receiver rejected completed frame"
            );
            Err(match err {
                OracleError::DownstreamRejected { .. } => err,
                other => OracleError::DownstreamRejected {
                    epoch_id: report.epoch_id,
                    reason: other.to_string(),
                },
            })
        }
    }
}

#[async_trait]
impl<R, S, T> OracleApi for OracleService<R, S, T>
where
    R: BeaconReportReceiver + 'static,
    S: OracleStateStore + 'static,
    T: TimeSource + 'static,
{
    async fn submit_report(
        &self,
        submission: ReportSubmission,
    ) -> OracleResult<CompletionStatus> {
        let _serial = self.op_lock.lock().await;
        let ReportSubmission {
            member,
            report,
            now,
        } = submission;

        let (status, persisted) =
            match self.apply(|engine| engine.submit_report(member, report, now)) {
                Ok(applied) => applied,
                Err(err) => {
                    metrics::record_report_rejected(err.label());
                    debug!(
                        %member,
                        epoch_id = report.epoch_id,
                        error = %err,
                        "Beacon report rejected"
                    );
                    return Err(err);
                }
            };
        metrics::record_report_accepted();

        let completed = match status {
            CompletionStatus::Completed(frame) => Some(frame),
            CompletionStatus::Collecting { .. } => None,
        };
        self.finish(
            persisted,
            completed,
            vec![OracleEvent::reported(member, &report)],
        )
        .await?;
        Ok(status)
    }

    async fn add_member(&self, member: MemberAddress) -> OracleResult<()> {
        let _serial = self.op_lock.lock().await;
        let ((), persisted) = self.apply(|engine| engine.add_member(member))?;
        self.finish(persisted, None, vec![OracleEvent::MemberAdded { member }])
            .await
    }

    async fn remove_member(&self, member: MemberAddress) -> OracleResult<Option<CompletedFrame>> {
        let _serial = self.op_lock.lock().await;
        let now = self.time.now();
        let (completed, persisted) = self.apply(|engine| engine.remove_member(member, now))?;
        self.finish(
            persisted,
            completed,
            vec![OracleEvent::MemberRemoved { member }],
        )
        .await?;
        Ok(completed)
    }

    async fn set_quorum(&self, quorum: u32) -> OracleResult<Option<CompletedFrame>> {
        let _serial = self.op_lock.lock().await;
        let now = self.time.now();
        let (completed, persisted) = self.apply(|engine| engine.set_quorum(quorum, now))?;
        self.finish(
            persisted,
            completed,
            vec![OracleEvent::QuorumChanged { quorum }],
        )
        .await?;
        Ok(completed)
    }

    async fn set_beacon_spec(&self, spec: BeaconSpec) -> OracleResult<()> {
        let _serial = self.op_lock.lock().await;
        let now = self.time.now();
        let ((), persisted) = self.apply(|engine| engine.set_beacon_spec(spec, now))?;
        self.finish(persisted, None, vec![OracleEvent::BeaconSpecSet { spec }])
            .await
    }

    async fn get_beacon_spec(&self) -> BeaconSpec {
        self.engine.read().spec()
    }

    async fn get_reportable_epoch_range(&self, now: Timestamp) -> EpochRange {
        self.engine.read().reportable_epoch_range(now)
    }

    async fn get_current_frame(&self) -> FrameWindow {
        let now = self.time.now();
        self.engine.read().current_frame(now)
    }

    async fn get_current_frame_status(&self) -> FrameStatus {
        let now = self.time.now();
        self.engine.read().current_frame_status(now)
    }

    async fn get_last_completed_epoch(&self) -> u64 {
        self.engine.read().last_completed_epoch().unwrap_or(0)
    }

    async fn get_last_completed_report(&self) -> Option<CompletedFrame> {
        self.engine.read().last_completed_report()
    }

    async fn get_quorum(&self) -> u32 {
        self.engine.read().quorum()
    }

    async fn get_members(&self) -> Vec<MemberAddress> {
        self.engine.read().members()
    }

    async fn get_current_variants(&self) -> Vec<VariantSupport> {
        let now = self.time.now();
        self.engine.read().current_variants(now)
    }

    async fn get_current_reporters(&self) -> Vec<MemberAddress> {
        let now = self.time.now();
        self.engine.read().current_reporters(now)
    }
}
