//! Sync driver: runs the refresh cycle on a fixed interval.
//!
//! The driver alternates between two states:
//! - [`DriverState::Fetching`]: fetch, reconcile, build, diff, hand off.
//! - [`DriverState::Idle`]: sleeping until the next cycle.
//!
//! The first cycle starts immediately. The sleep begins after a cycle ends,
//! so the period is processing time plus the interval. Cycles never overlap:
//! the next fetch starts only after the previous update was handed to the
//! channel. A failed cycle pushes nothing, so the consumer keeps showing the
//! last good view model.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use walletview_rpc::{RpcTransport, WalletClient};
use walletview_utils::{format_duration, Clock, StatsCounter};

use crate::backoff::Backoff;
use crate::diff::{diff_rows, RowChange};
use crate::fetcher::StateFetcher;
use crate::format::resolve_timezone;
use crate::reconcile::reconcile;
use crate::shutdown::ShutdownController;
use crate::view::{TransactionRow, ViewModel, ViewModelBuilder};
use crate::{SyncConfig, SyncError};

pub const CYCLES_COMPLETED: &str = "cycles_completed";
pub const CYCLES_FAILED: &str = "cycles_failed";
pub const TRANSPORT_FAILURES: &str = "transport_failures";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Fetching,
}

/// A completed cycle, as delivered to the consumer.
#[derive(Clone, Debug)]
pub struct ViewUpdate {
    /// 1 for the first delivered model, incremented per delivery.
    pub sequence: u64,
    pub model: ViewModel,
    /// Row changes relative to the previously delivered model.
    pub changes: Vec<RowChange>,
}

pub struct SyncDriver<T, C> {
    fetcher: StateFetcher<T>,
    builder: ViewModelBuilder,
    clock: C,
    backoff: Backoff,
    channel_capacity: usize,
    previous_rows: Vec<TransactionRow>,
    sequence: u64,
    stats: Arc<StatsCounter>,
    state: watch::Sender<DriverState>,
}

impl<T, C> SyncDriver<T, C>
where
    T: RpcTransport + 'static,
    C: Clock + 'static,
{
    pub fn new(client: WalletClient<T>, clock: C, config: &SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let tz = resolve_timezone(config.timezone.as_deref())?;
        let (state, _) = watch::channel(DriverState::Idle);

        Ok(Self {
            fetcher: StateFetcher::new(client, config.call_timeout()),
            builder: ViewModelBuilder::new(tz),
            clock,
            backoff: Backoff::new(config.refresh_interval(), config.max_backoff()),
            channel_capacity: config.channel_capacity,
            previous_rows: Vec::new(),
            sequence: 0,
            stats: Arc::new(StatsCounter::new(&[
                CYCLES_COMPLETED,
                CYCLES_FAILED,
                TRANSPORT_FAILURES,
            ])),
            state,
        })
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> Arc<StatsCounter> {
        Arc::clone(&self.stats)
    }

    /// Run one fetch → reconcile → build → diff pass.
    ///
    /// On success the rows become the baseline for the next diff; on failure
    /// the baseline is untouched.
    pub async fn run_cycle(&mut self) -> Result<ViewUpdate, SyncError> {
        let snapshot = self.fetcher.fetch().await?;
        let reconciled = reconcile(snapshot.blocks(), snapshot.status().block_count);
        let model = self.builder.build(&snapshot, &reconciled, self.clock.now());

        let changes = diff_rows(&self.previous_rows, &model.transactions);
        self.previous_rows = model.transactions.clone();
        self.sequence += 1;

        tracing::debug!(
            sequence = self.sequence,
            transactions = model.transactions.len(),
            changes = changes.len(),
            "built view model"
        );
        Ok(ViewUpdate {
            sequence: self.sequence,
            model,
            changes,
        })
    }

    /// Drive cycles until `shutdown` fires or the update receiver is dropped.
    pub async fn run(
        mut self,
        updates: mpsc::Sender<ViewUpdate>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            interval = %format_duration(self.backoff.base()),
            "sync driver started"
        );

        loop {
            self.state.send_replace(DriverState::Fetching);
            let outcome = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                outcome = self.run_cycle() => outcome,
            };

            match outcome {
                Ok(update) => {
                    self.backoff.reset();
                    self.stats.increment(CYCLES_COMPLETED);
                    let sent = tokio::select! {
                        biased;
                        _ = shutdown.recv() => break,
                        sent = updates.send(update) => sent,
                    };
                    if sent.is_err() {
                        tracing::info!("view model receiver dropped, stopping sync driver");
                        break;
                    }
                }
                Err(e) => {
                    self.stats.increment(CYCLES_FAILED);
                    if e.is_transport() {
                        self.stats.increment(TRANSPORT_FAILURES);
                        self.backoff.record_transport_failure();
                    } else {
                        self.backoff.reset();
                    }
                    tracing::warn!(
                        error = %e,
                        consecutive_failures = self.backoff.consecutive_failures(),
                        retry_in = %format_duration(self.backoff.next_delay()),
                        "sync cycle failed"
                    );
                }
            }

            self.state.send_replace(DriverState::Idle);
            let delay = self.backoff.next_delay();
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(DriverState::Idle);
        tracing::info!("sync driver stopped");
    }

    /// Spawn the driver on the tokio runtime.
    ///
    /// Returns the task handle (which owns the shutdown signal) and the
    /// receiving end of the update channel.
    pub fn spawn(self) -> (SyncHandle, mpsc::Receiver<ViewUpdate>) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let shutdown = ShutdownController::new();
        let state = self.subscribe_state();
        let stats = self.stats();
        let task = tokio::spawn(self.run(tx, shutdown.subscribe()));

        let handle = SyncHandle {
            task,
            shutdown,
            state,
            stats,
        };
        (handle, rx)
    }
}

/// A running driver task together with its shutdown signal.
///
/// Dropping the handle also stops the driver.
pub struct SyncHandle {
    task: JoinHandle<()>,
    shutdown: ShutdownController,
    state: watch::Receiver<DriverState>,
    stats: Arc<StatsCounter>,
}

impl SyncHandle {
    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state.clone()
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the driver to stop and wait for it to exit.
    pub async fn shutdown(self) -> Result<(), SyncError> {
        self.shutdown.shutdown();
        self.task
            .await
            .map_err(|e| SyncError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;
    use walletview_nullables::{NullClock, NullTransport};
    use walletview_rpc::client::{GET_BALANCE, GET_STATUS};
    use walletview_types::{Balance, Block, RawTransaction, Status, Timestamp, Transfer};

    const INTERVAL: Duration = Duration::from_secs(5);

    fn tx(hash: &str, amount: i64) -> RawTransaction {
        RawTransaction {
            transaction_hash: hash.to_string(),
            amount,
            timestamp: Timestamp::new(1_500_000_000),
            transfers: vec![Transfer::new("PEER", amount.abs())],
            ..Default::default()
        }
    }

    fn transport() -> NullTransport {
        let transport = NullTransport::new();
        transport.set_balance(Balance {
            available: 125_000,
            locked: 0,
        });
        transport.set_addresses(&["PRIMARY"]);
        transport.set_status(Status {
            block_count: 1000,
            peer_count: 8,
            ..Default::default()
        });
        transport.set_blocks(vec![Block {
            block_hash: None,
            transactions: vec![tx("a", 100)],
        }]);
        transport
    }

    fn config() -> SyncConfig {
        SyncConfig {
            timezone: Some("UTC".into()),
            ..Default::default()
        }
    }

    fn driver(transport: &NullTransport) -> SyncDriver<NullTransport, NullClock> {
        SyncDriver::new(
            WalletClient::new(transport.clone()),
            NullClock::new(1_500_000_000),
            &config(),
        )
        .unwrap()
    }

    fn balance_call_offsets(transport: &NullTransport, start: Instant) -> Vec<Duration> {
        transport
            .calls()
            .into_iter()
            .filter(|c| c.method == GET_BALANCE)
            .map(|c| c.at.duration_since(start))
            .collect()
    }

    #[tokio::test]
    async fn cycle_builds_model_and_diffs_against_previous() {
        let transport = transport();
        let mut driver = driver(&transport);

        let first = driver.run_cycle().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.model.transactions.len(), 1);
        assert_eq!(first.changes.len(), 1);

        transport.set_blocks(vec![
            Block {
                block_hash: None,
                transactions: vec![tx("a", 100)],
            },
            Block {
                block_hash: None,
                transactions: vec![tx("b", -50)],
            },
        ]);
        let second = driver.run_cycle().await.unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.changes.len(), 1);
        assert!(matches!(
            &second.changes[0],
            RowChange::Insert { index: 0, row } if row.key == "b"
        ));

        let third = driver.run_cycle().await.unwrap();
        assert!(third.changes.is_empty());
    }

    #[tokio::test]
    async fn failed_cycle_keeps_diff_baseline() {
        let transport = transport();
        let mut driver = driver(&transport);
        driver.run_cycle().await.unwrap();

        transport.fail_next(GET_STATUS, 1);
        assert!(driver.run_cycle().await.is_err());

        let next = driver.run_cycle().await.unwrap();
        assert_eq!(next.sequence, 2);
        assert!(next.changes.is_empty());
    }

    #[tokio::test]
    async fn invalid_timezone_is_rejected() {
        let config = SyncConfig {
            timezone: Some("Nowhere/Special".into()),
            ..Default::default()
        };
        let result = SyncDriver::new(
            WalletClient::new(NullTransport::new()),
            NullClock::new(0),
            &config,
        );
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately_then_every_interval() {
        let transport = transport();
        let start = Instant::now();
        let (handle, mut rx) = driver(&transport).spawn();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.model.available_balance, "1,250.00");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.sequence, 2);

        assert_eq!(
            balance_call_offsets(&transport, start),
            vec![Duration::ZERO, INTERVAL]
        );
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_pushes_nothing_and_retries_after_one_interval() {
        let transport = transport();
        transport.fail_next(GET_STATUS, 1);
        let start = Instant::now();
        let (handle, mut rx) = driver(&transport).spawn();

        let update = rx.recv().await.unwrap();
        assert_eq!(update.sequence, 1);
        assert_eq!(Instant::now().duration_since(start), INTERVAL);
        assert_eq!(handle.stats().get(CYCLES_FAILED), 1);
        assert_eq!(handle.stats().get(TRANSPORT_FAILURES), 1);
        assert_eq!(handle.stats().get(CYCLES_COMPLETED), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_transport_failures_back_off() {
        let transport = transport();
        transport.fail_next(GET_BALANCE, 3);
        let start = Instant::now();
        let (handle, mut rx) = driver(&transport).spawn();

        rx.recv().await.unwrap();
        assert_eq!(
            balance_call_offsets(&transport, start),
            vec![
                Duration::ZERO,
                Duration::from_secs(5),
                Duration::from_secs(15),
                Duration::from_secs(35),
            ]
        );

        // success resets the delay to one interval
        rx.recv().await.unwrap();
        assert_eq!(
            balance_call_offsets(&transport, start).last().copied(),
            Some(Duration::from_secs(40))
        );
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_response_does_not_grow_backoff() {
        let transport = transport();
        transport.respond_with_once(GET_STATUS, serde_json::json!({"blockCount": "nope"}));
        transport.respond_with_once(GET_STATUS, serde_json::json!({"peerCount": 1}));
        let start = Instant::now();
        let (handle, mut rx) = driver(&transport).spawn();

        rx.recv().await.unwrap();
        assert_eq!(
            balance_call_offsets(&transport, start),
            vec![Duration::ZERO, INTERVAL, INTERVAL * 2]
        );
        assert_eq!(handle.stats().get(TRANSPORT_FAILURES), 0);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out_and_next_cycle_proceeds() {
        let transport = transport();
        transport.hang_once(GET_STATUS);
        let start = Instant::now();
        let (handle, mut rx) = driver(&transport).spawn();

        rx.recv().await.unwrap();
        // 10s call timeout, then one interval
        assert_eq!(
            balance_call_offsets(&transport, start),
            vec![Duration::ZERO, Duration::from_secs(15)]
        );
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_sleep() {
        let transport = transport();
        let (handle, mut rx) = driver(&transport).spawn();
        rx.recv().await.unwrap();

        let before = Instant::now();
        handle.shutdown().await.unwrap();
        assert!(Instant::now().duration_since(before) < INTERVAL);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_stops_driver() {
        let transport = transport();
        let (handle, rx) = driver(&transport).spawn();
        drop(rx);

        let mut state = handle.subscribe_state();
        tokio::time::timeout(Duration::from_secs(60), async {
            while !handle.is_finished() {
                let _ = state.changed().await;
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(handle.state(), DriverState::Idle);
        assert_eq!(transport.calls().len(), 4);
    }
}
