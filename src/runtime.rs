use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::PollingConfig;
use crate::connector::{ConnectionState, ConnectorKind, RpcWalletConnector, WalletConnector};
use crate::contract::{PresaleContract, RpcPresaleContract};
use crate::notify::Notifier;
use crate::presale::{PresaleController, PresaleView, SessionSettings};

/// Wall clock in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Connects through `kind` and, when the connection is usable, builds a
/// controller for it and performs the initial refresh.
pub async fn open_session<N: Notifier>(
    connector: &RpcWalletConnector,
    kind: ConnectorKind,
    polling: &PollingConfig,
    settings: SessionSettings,
    notifier: N,
) -> (
    ConnectionState,
    Option<PresaleController<RpcPresaleContract, N>>,
) {
    let state = connector.connect(kind).await;
    let Some(session) = connector.session() else {
        return (state, None);
    };
    let contract = RpcPresaleContract::new(session, settings.contracts.clone(), polling);
    let controller = PresaleController::new(contract, notifier, state.clone(), settings);
    controller.refresh_all().await;
    (state, Some(controller))
}

/// Drives the countdown and total-raised timers of one controller.
///
/// Shutdown stops both timers. Total-raised refreshes already spawned run to
/// completion.
pub struct PresalePoller {
    shutdown_tx: watch::Sender<bool>,
    tasks: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl PresalePoller {
    pub fn start<C, N>(
        controller: PresaleController<C, N>,
        polling: &PollingConfig,
        views: mpsc::UnboundedSender<PresaleView>,
    ) -> Self
    where
        C: PresaleContract + 'static,
        N: Notifier + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let countdown = tokio::spawn(countdown_loop(
            controller.clone(),
            polling.countdown_interval(),
            views,
            shutdown_rx.clone(),
        ));
        let raised = tokio::spawn(total_raised_loop(
            controller,
            polling.total_raised_interval(),
            shutdown_rx,
        ));
        Self {
            shutdown_tx,
            tasks: AsyncMutex::new(vec![countdown, raised]),
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let mut tasks = self.tasks.lock().await;
        for handle in tasks.drain(..) {
            if let Err(error) = handle.await {
                warn!(%error, "presale poller task failed");
            }
        }
    }
}

fn ticker(period: Duration) -> time::Interval {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn countdown_loop<C, N>(
    controller: PresaleController<C, N>,
    period: Duration,
    views: mpsc::UnboundedSender<PresaleView>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    C: PresaleContract + 'static,
    N: Notifier + 'static,
{
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {
                if views.send(controller.view(now_ms())).is_err() {
                    debug!("view receiver dropped, stopping countdown");
                    break;
                }
            }
        }
    }
}

async fn total_raised_loop<C, N>(
    controller: PresaleController<C, N>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    C: PresaleContract + 'static,
    N: Notifier + 'static,
{
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {
                let controller = controller.clone();
                tokio::spawn(async move { controller.refresh_total_raised().await });
            }
        }
    }
}
