//! Cross-thread behaviour of the dispatcher.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use hk_components::{Decision, DecisionGate, Resolution};
use hk_core::AgentId;
use hk_dispatch::{
    DecisionListener, DecisionRequest, DecisionState, DispatchConfig, Dispatcher, SubmitAck,
};
use serde_json::{Map, json};

/// Forwards request ids to the test thread, like the server's WebSocket bridge.
struct ChannelListener {
    tx: Mutex<mpsc::Sender<String>>,
}

impl DecisionListener for ChannelListener {
    fn on_request(&self, request: &DecisionRequest) {
        let _ = self.tx.lock().unwrap().send(request.request_id.clone());
    }
}

fn dispatcher(timeout: Duration) -> (Arc<Dispatcher>, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel();
    let listener = Arc::new(ChannelListener { tx: Mutex::new(tx) });
    let config = DispatchConfig {
        decision_timeout: timeout,
        ..DispatchConfig::default()
    };
    (Arc::new(Dispatcher::new(config).with_listener(listener)), rx)
}

#[test]
fn defaults() {
    let config = DispatchConfig::default();
    assert_eq!(config.decision_timeout, Duration::from_secs(30));
    assert_eq!(config.fail_safe, Decision::Reject);
    assert_eq!(config.resolved_retention, Duration::from_secs(600));
}

#[test]
fn decision_from_another_thread_unblocks_the_requester() {
    let (dispatcher, requests) = dispatcher(Duration::from_secs(10));

    let gate = Arc::clone(&dispatcher);
    let sim = thread::spawn(move || gate.request(&AgentId::new("pump"), json!({"proposed": 1.0})));

    let request_id = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    let pending = dispatcher.pending_decisions();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].agent_id, Some(AgentId::new("pump")));

    let ack = dispatcher
        .submit_decision(&request_id, Decision::Override { value: 0.4 })
        .unwrap();
    assert_eq!(ack, SubmitAck::Accepted);

    let outcome = sim.join().unwrap();
    assert_eq!(outcome.request_id, request_id);
    assert_eq!(outcome.decision, Decision::Override { value: 0.4 });
    assert_eq!(outcome.resolution, Resolution::Fulfilled);
    assert!(dispatcher.pending_decisions().is_empty());
}

#[test]
fn unanswered_request_expires_with_fail_safe() {
    let (dispatcher, requests) = dispatcher(Duration::from_millis(20));

    let outcome = dispatcher.request(&AgentId::new("gate"), json!({}));
    let request_id = requests.try_recv().unwrap();

    assert_eq!(outcome.resolution, Resolution::Expired);
    assert_eq!(outcome.decision, Decision::Reject);
    assert_eq!(
        dispatcher.decision_state(&request_id),
        Some(DecisionState::Expired)
    );
    assert!(dispatcher.submit_decision(&request_id, Decision::Approve).is_err());
}

#[test]
fn status_updates_race_with_snapshots() {
    let dispatcher = Arc::new(Dispatcher::default());

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for i in 0..100 {
                    let mut values = Map::new();
                    values.insert("seq".to_string(), json!(i));
                    dispatcher.update_device_status(format!("dev-{w}"), values);
                }
            })
        })
        .collect();

    for _ in 0..50 {
        let snapshot = dispatcher.get_all_statuses();
        assert!(snapshot.len() <= 4);
        for status in snapshot.values() {
            assert!(status.values["seq"].as_u64().unwrap() < 100);
        }
    }
    for writer in writers {
        writer.join().unwrap();
    }

    let all = dispatcher.get_all_statuses();
    assert_eq!(all.len(), 4);
    assert!(all.values().all(|s| s.values["seq"] == json!(99)));
}

#[test]
fn new_requests_prune_resolved_ones_past_retention() {
    let dispatcher = Dispatcher::new(DispatchConfig {
        decision_timeout: Duration::from_millis(5),
        resolved_retention: Duration::from_millis(250),
        ..DispatchConfig::default()
    });
    let pump = AgentId::new("pump");

    let first = dispatcher.request(&pump, json!({}));
    assert_eq!(first.resolution, Resolution::Expired);
    let open = dispatcher
        .decisions()
        .request_decision(Some(pump.clone()), json!({}))
        .0;
    assert_eq!(dispatcher.decisions().len(), 2);

    thread::sleep(Duration::from_millis(400));
    let second = dispatcher.request(&pump, json!({}));

    assert_eq!(dispatcher.decision_state(&first.request_id), None);
    assert_eq!(
        dispatcher.decision_state(&open.request_id),
        Some(DecisionState::Pending)
    );
    assert_eq!(
        dispatcher.decision_state(&second.request_id),
        Some(DecisionState::Expired)
    );
    assert_eq!(dispatcher.decisions().len(), 2);
    assert_eq!(dispatcher.prune_resolved(), 0);
}
