use std::{collections::HashMap, collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use shared::protocol::ServiceRequest;
use tokio::sync::{oneshot, Mutex};

use crate::transport::{RawResponse, Transport, TransportError};

pub type Reply = Result<RawResponse, TransportError>;

enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct Script {
    calls: Vec<ServiceRequest>,
    routes: HashMap<&'static str, Reply>,
    queue: VecDeque<Scripted>,
}

/// In-memory transport. Requests whose path has a route get that reply every
/// time; everything else consumes queued replies in call order. Gated replies
/// resolve only when the test sends on the returned channel.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn route(&self, path: &'static str, reply: Reply) {
        self.script.lock().await.routes.insert(path, reply);
    }

    pub async fn push_ready(&self, reply: Reply) {
        self.script.lock().await.queue.push_back(Scripted::Ready(reply));
    }

    pub async fn push_gated(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().await.queue.push_back(Scripted::Gated(rx));
        tx
    }

    pub async fn calls(&self) -> Vec<ServiceRequest> {
        self.script.lock().await.calls.clone()
    }

    pub async fn wait_for_calls(&self, expected: usize) {
        for _ in 0..400 {
            if self.script.lock().await.calls.len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("transport never saw {expected} calls");
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ServiceRequest) -> Result<RawResponse, TransportError> {
        let next = {
            let mut script = self.script.lock().await;
            let routed = script.routes.get(request.path()).cloned();
            script.calls.push(request);
            match routed {
                Some(reply) => Scripted::Ready(reply),
                None => match script.queue.pop_front() {
                    Some(next) => next,
                    None => Scripted::Ready(Err(TransportError::Network(
                        "no scripted reply".into(),
                    ))),
                },
            }
        };

        match next {
            Scripted::Ready(reply) => reply,
            Scripted::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Network("reply gate dropped".into()))),
        }
    }
}

pub fn ok_json(body: Value) -> Reply {
    Ok(RawResponse::ok(body))
}
