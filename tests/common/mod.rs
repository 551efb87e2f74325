//! Scripted transport shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use vagrant_cloud::{
    auth::Auth,
    client::{Client, ClientBuilder},
    transport::{Body, Transport, TransportError, TransportRequest, TransportResponse},
};

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<MockTransport> {
        Arc::new(MockTransport::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(TransportResponse::new(status, body.to_string())));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError::new(message)));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `METHOD path` of every recorded request
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| format!("{} {}", request.method, request.url.path()))
            .collect()
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

pub fn builder(transport: Arc<MockTransport>) -> ClientBuilder {
    ClientBuilder::new()
        .retry_interval(Duration::ZERO)
        .transport(transport)
}

pub fn client(transport: Arc<MockTransport>) -> Client {
    builder(transport)
        .auth(Auth::with_token("integration-token"))
        .build()
        .unwrap()
}

pub fn json_body(request: &TransportRequest) -> Value {
    match &request.body {
        Some(Body::Json(json)) => serde_json::from_str(json).unwrap(),
        other => panic!("expected JSON body, found {:?}", other),
    }
}
