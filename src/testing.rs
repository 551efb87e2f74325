//! Scripted transport for unit tests.

use crate::{
    auth::Auth,
    client::{Client, ClientBuilder},
    transport::{Body, Transport, TransportError, TransportRequest, TransportResponse},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

type Scripted = Result<TransportResponse, TransportError>;

/// Replays queued responses in order and records every request it receives.
///
/// When the queue runs dry it answers `200 {}`.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<MockTransport> {
        Arc::new(MockTransport::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(Ok(TransportResponse::new(status, body.to_string())));
    }

    pub fn push_failure(&self, message: &str) {
        self.push(Err(TransportError::new(message)));
    }

    pub fn push(&self, response: Scripted) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(200, "{}")))
    }
}

/// Client wired to `transport` with a static token and no retry delay.
pub fn client_with(transport: Arc<MockTransport>) -> Client {
    ClientBuilder::new()
        .auth(Auth::with_token("test-token"))
        .retry_interval(Duration::ZERO)
        .transport(transport)
        .build()
        .expect("test client")
}

/// JSON body of a recorded request.
pub fn json_body(request: &TransportRequest) -> Value {
    match &request.body {
        Some(Body::Json(json)) => serde_json::from_str(json).expect("valid json body"),
        other => panic!("expected JSON body, found {:?}", other),
    }
}
