//! Request lifecycle for analysis and search submissions.
//!
//! Every submission is tagged with a [`RequestSeq`]. Only the most recently
//! issued submission may change the visible [`RequestState`]; anything older
//! is aborted at its network await point and, should a response still race
//! in, discarded when it resolves.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{Issue, Query, RequestSeq, SearchFilters, SearchQuery, Submission},
    error::{ErrorKind, RequestError},
    protocol::{AnalyzeResponse, RawIssue, SearchResponse, ServiceRequest},
};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

use crate::{
    normalizer::normalize_batch,
    transport::{RawResponse, Transport, TransportError},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Pending {
        query: Submission,
    },
    Success {
        query: Submission,
        issues: Vec<Issue>,
    },
    /// `query` is `None` when the input never made it to a request.
    Failed {
        query: Option<Submission>,
        error: RequestError,
    },
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { error, .. } => Some(error.kind),
            _ => None,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Success { issues, .. } => issues,
            _ => &[],
        }
    }
}

/// What happened to one `submit`/`search` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The call's outcome is now the visible state.
    Applied(RequestState),
    /// A newer submission was issued before this one resolved.
    Superseded(RequestSeq),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateChanged {
    pub seq: RequestSeq,
    pub state: RequestState,
}

struct Lifecycle {
    latest: RequestSeq,
    state: RequestState,
}

type DecodeIssues = fn(RawResponse) -> Result<Vec<RawIssue>, TransportError>;

pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    lifecycle: Mutex<Lifecycle>,
    issued: watch::Sender<RequestSeq>,
    events: broadcast::Sender<StateChanged>,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        let (issued, _) = watch::channel(RequestSeq(0));
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            transport,
            lifecycle: Mutex::new(Lifecycle {
                latest: RequestSeq(0),
                state: RequestState::Idle,
            }),
            issued,
            events,
        })
    }

    pub async fn state(&self) -> RequestState {
        self.lifecycle.lock().await.state.clone()
    }

    pub async fn latest_seq(&self) -> RequestSeq {
        self.lifecycle.lock().await.latest
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.events.subscribe()
    }

    /// Analyzes `text` for the selected group and category.
    pub async fn submit(&self, text: &str, group: &str, category: &str) -> Completion {
        let query = match Query::new(text, group, category) {
            Ok(query) => query,
            Err(error) => return self.reject(error).await,
        };
        let request = ServiceRequest::Analyze((&query).into());
        self.run(Submission::Analyze(query), request, decode_analyze)
            .await
    }

    /// Searches previously extracted issues.
    pub async fn search(&self, text: &str, filters: SearchFilters) -> Completion {
        let query = match SearchQuery::new(text, filters) {
            Ok(query) => query,
            Err(error) => return self.reject(error).await,
        };
        let request = ServiceRequest::Search((&query).into());
        self.run(Submission::Search(query), request, decode_search)
            .await
    }

    /// Returns to `Idle`; anything in flight becomes stale.
    pub async fn reset(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let seq = self.issue_next(&mut lifecycle);
        self.apply(&mut lifecycle, seq, RequestState::Idle);
    }

    async fn run(
        &self,
        submission: Submission,
        request: ServiceRequest,
        decode: DecodeIssues,
    ) -> Completion {
        let endpoint = request.path();
        let seq = self.begin(submission.clone()).await;
        let mut issued = self.issued.subscribe();

        let sent = tokio::select! {
            biased;
            _ = wait_until_superseded(&mut issued, seq) => None,
            result = self.transport.send(request) => Some(result),
        };
        let Some(result) = sent else {
            debug!(%seq, endpoint, "request superseded while in flight; aborted");
            return Completion::Superseded(seq);
        };

        let next = match result.and_then(decode) {
            Ok(raw) => {
                let issues = normalize_batch(
                    raw,
                    submission.fallback_group(),
                    submission.fallback_category(),
                );
                RequestState::Success {
                    query: submission,
                    issues,
                }
            }
            Err(err) => {
                warn!(%seq, endpoint, error = %err, "analysis service request failed");
                RequestState::Failed {
                    query: Some(submission),
                    error: err.into(),
                }
            }
        };
        self.resolve(seq, next).await
    }

    async fn begin(&self, submission: Submission) -> RequestSeq {
        let mut lifecycle = self.lifecycle.lock().await;
        let seq = self.issue_next(&mut lifecycle);
        info!(
            %seq,
            mode = submission.mode(),
            text_len = submission.text().len(),
            "request pending"
        );
        self.apply(
            &mut lifecycle,
            seq,
            RequestState::Pending { query: submission },
        );
        seq
    }

    /// Applies `next` only if `seq` is still the latest issued request.
    async fn resolve(&self, seq: RequestSeq, next: RequestState) -> Completion {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.latest != seq {
            warn!(%seq, latest = %lifecycle.latest, "discarding stale response");
            return Completion::Superseded(seq);
        }
        info!(
            %seq,
            issues = next.issues().len(),
            error = ?next.error_kind(),
            "request resolved"
        );
        self.apply(&mut lifecycle, seq, next.clone());
        Completion::Applied(next)
    }

    /// Local validation failure: no request is sent, but the failure still
    /// supersedes whatever was in flight.
    async fn reject(&self, error: RequestError) -> Completion {
        let mut lifecycle = self.lifecycle.lock().await;
        let seq = self.issue_next(&mut lifecycle);
        debug!(%seq, reason = %error.message, "rejected submission before sending");
        let next = RequestState::Failed { query: None, error };
        self.apply(&mut lifecycle, seq, next.clone());
        Completion::Applied(next)
    }

    fn issue_next(&self, lifecycle: &mut Lifecycle) -> RequestSeq {
        let seq = lifecycle.latest.next();
        lifecycle.latest = seq;
        self.issued.send_replace(seq);
        seq
    }

    fn apply(&self, lifecycle: &mut Lifecycle, seq: RequestSeq, state: RequestState) {
        lifecycle.state = state.clone();
        // No subscribers is fine.
        let _ = self.events.send(StateChanged { seq, state });
    }
}

async fn wait_until_superseded(issued: &mut watch::Receiver<RequestSeq>, seq: RequestSeq) {
    loop {
        if *issued.borrow_and_update() != seq {
            return;
        }
        if issued.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn decode_analyze(raw: RawResponse) -> Result<Vec<RawIssue>, TransportError> {
    raw.decode::<AnalyzeResponse>().map(|response| response.issues)
}

fn decode_search(raw: RawResponse) -> Result<Vec<RawIssue>, TransportError> {
    raw.decode::<SearchResponse>().map(|response| response.results)
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
