use std::sync::Arc;
use std::time::Duration;

use hk_app::AppContext;
use hk_dispatch::{DecisionListener, DecisionRequest, DispatchConfig, Dispatcher};
use tokio::sync::broadcast;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// Capacity of the decision request broadcast channel.
const DECISION_CHANNEL_CAPACITY: usize = 256;

/// Shared state handed to every handler through axum's `State`.
#[derive(Clone)]
pub struct ServerState {
    pub ctx: Arc<AppContext>,
    pub decisions_tx: broadcast::Sender<DecisionRequest>,
}

impl ServerState {
    pub fn new(config: DispatchConfig) -> Self {
        let (decisions_tx, _) = broadcast::channel(DECISION_CHANNEL_CAPACITY);
        let listener = Arc::new(BroadcastListener {
            tx: decisions_tx.clone(),
        });
        let dispatcher = Arc::new(Dispatcher::new(config).with_listener(listener));
        Self {
            ctx: Arc::new(AppContext::new().with_dispatcher(dispatcher)),
            decisions_tx,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.ctx.dispatcher()
    }
}

/// Bridges decision requests from the simulation thread into the async
/// world; every connected WebSocket holds a receiver.
struct BroadcastListener {
    tx: broadcast::Sender<DecisionRequest>,
}

impl DecisionListener for BroadcastListener {
    fn on_request(&self, request: &DecisionRequest) {
        if self.tx.send(request.clone()).is_err() {
            debug!(request_id = %request.request_id, "no operator connected");
        }
    }
}

/// Background task: drop resolved decision requests past their retention
/// every `period`.
pub async fn run_decision_cleanup(dispatcher: Arc<Dispatcher>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        dispatcher.prune_resolved();
    }
}
