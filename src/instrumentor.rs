//! Named event instrumentation.
//!
//! The client reports what it does as `namespace.event` events carrying a
//! parameter map. A [`Collection`] fans each event out to its registered
//! [`Instrumentor`]s and to any matching subscriptions. Credentials are
//! redacted before anything outside the collection sees the parameters.

use glob::{Pattern, PatternError};
use serde_json::{json, Map, Value};
use std::{
    future::Future,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, error, info};

/// Replacement value for redacted parameters
pub const REDACTED: &str = "REDACTED";

/// Keys whose scalar values never leave the collection unredacted
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "access_token",
    "client_secret",
    "token",
    "authorization",
    "proxy-authorization",
];

pub type Params = Map<String, Value>;

/// Receiver of every instrumented event.
pub trait Instrumentor: Send + Sync {
    fn instrument(&self, name: &str, params: &Params);
}

/// Subscription callback, receives the event name and its parameters
pub type Subscriber = Arc<dyn Fn(&str, &Params) + Send + Sync>;

/// Which event names a subscription receives.
#[derive(Debug, Clone)]
pub enum EventMatcher {
    Exact(String),
    Pattern(Pattern),
}

impl EventMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        EventMatcher::Exact(name.into())
    }

    /// Glob style match such as `request.*`.
    pub fn pattern(pattern: &str) -> Result<Self, PatternError> {
        Ok(EventMatcher::Pattern(Pattern::new(pattern)?))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            EventMatcher::Exact(exact) => exact == name,
            EventMatcher::Pattern(pattern) => pattern.matches(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrumentorId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Start of a measured operation.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    started_at: SystemTime,
    started: Instant,
}

impl Timing {
    pub fn start() -> Self {
        Timing {
            started_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    /// `start_time`, `complete_time` and `duration` in seconds.
    pub fn finish(&self) -> Value {
        let duration = self.started.elapsed().as_secs_f64();
        let start_time = epoch_seconds(self.started_at);
        json!({
            "start_time": start_time,
            "complete_time": start_time + duration,
            "duration": duration,
        })
    }
}

fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Default)]
struct Members {
    next_id: u64,
    instrumentors: Vec<(InstrumentorId, Arc<dyn Instrumentor>)>,
    subscriptions: Vec<(SubscriptionId, EventMatcher, Subscriber)>,
}

impl Members {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Set of instrumentors and subscriptions sharing one event stream.
pub struct Collection {
    members: RwLock<Members>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members = self.read();
        f.debug_struct("Collection")
            .field("instrumentors", &members.instrumentors.len())
            .field("subscriptions", &members.subscriptions.len())
            .finish()
    }
}

impl Default for Collection {
    fn default() -> Self {
        Collection::new()
    }
}

impl Collection {
    /// Collection with the [`LogInstrumentor`] already registered.
    pub fn new() -> Self {
        let collection = Collection::empty();
        collection.add(Arc::new(LogInstrumentor));
        collection
    }

    pub fn empty() -> Self {
        Collection {
            members: RwLock::new(Members::default()),
        }
    }

    pub fn add(&self, instrumentor: Arc<dyn Instrumentor>) -> InstrumentorId {
        let mut members = self.write();
        let id = InstrumentorId(members.next_id());
        members.instrumentors.push((id, instrumentor));
        id
    }

    pub fn remove(&self, id: InstrumentorId) -> bool {
        let mut members = self.write();
        let before = members.instrumentors.len();
        members.instrumentors.retain(|(existing, _)| *existing != id);
        members.instrumentors.len() != before
    }

    pub fn subscribe<F>(&self, matcher: EventMatcher, subscriber: F) -> SubscriptionId
    where
        F: Fn(&str, &Params) + Send + Sync + 'static,
    {
        let mut members = self.write();
        let id = SubscriptionId(members.next_id());
        members
            .subscriptions
            .push((id, matcher, Arc::new(subscriber)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut members = self.write();
        let before = members.subscriptions.len();
        members.subscriptions.retain(|(existing, _, _)| *existing != id);
        members.subscriptions.len() != before
    }

    /// Dispatch an event whose operation started at `timing`.
    pub fn instrument(&self, name: &str, mut params: Params, timing: Timing) {
        params.insert("timing".to_string(), timing.finish());
        redact(&mut params);

        // Snapshot so callbacks may subscribe or unsubscribe without deadlocking
        let (instrumentors, subscriptions): (Vec<_>, Vec<_>) = {
            let members = self.read();
            (
                members
                    .instrumentors
                    .iter()
                    .map(|(_, instrumentor)| instrumentor.clone())
                    .collect(),
                members
                    .subscriptions
                    .iter()
                    .filter(|(_, matcher, _)| matcher.matches(name))
                    .map(|(_, _, subscriber)| subscriber.clone())
                    .collect(),
            )
        };

        for instrumentor in instrumentors {
            instrumentor.instrument(name, &params);
        }
        for subscriber in subscriptions {
            subscriber(name, &params);
        }
    }

    /// Run `action` and report it as `name` once it completes.
    pub async fn measure<F, T>(&self, name: &str, params: Params, action: F) -> T
    where
        F: Future<Output = T>,
    {
        let timing = Timing::start();
        let result = action.await;
        self.instrument(name, params, timing);
        result
    }

    fn read(&self) -> RwLockReadGuard<'_, Members> {
        self.members
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Members> {
        self.members
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Replace credential values anywhere in `params` with [`REDACTED`].
pub fn redact(params: &mut Params) {
    for (key, value) in params.iter_mut() {
        let sensitive = SENSITIVE_KEYS
            .iter()
            .any(|sensitive| key.eq_ignore_ascii_case(sensitive));
        match value {
            Value::Object(nested) => redact(nested),
            Value::Array(items) => redact_items(items),
            Value::Null => {}
            _ if sensitive => *value = Value::String(REDACTED.to_string()),
            _ => {}
        }
    }
}

fn redact_items(items: &mut [Value]) {
    for item in items {
        match item {
            Value::Object(nested) => redact(nested),
            Value::Array(inner) => redact_items(inner),
            _ => {}
        }
    }
}

/// Renders events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogInstrumentor;

impl LogInstrumentor {
    fn summary(event: &str, params: &Params) -> Params {
        let keys: &[&str] = match event {
            "request" | "retry" => &["method", "identifier", "url", "query"],
            "response" => &["status", "identifier", "url"],
            _ => return params.clone(),
        };
        let mut info: Params = keys
            .iter()
            .filter_map(|key| params.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect();
        let duration = params
            .get("timing")
            .and_then(|timing| timing.get("duration"))
            .and_then(Value::as_f64)
            .unwrap_or_default();
        info.insert(
            "duration".to_string(),
            Value::String(format!("{}ms", (duration * 1000.0) as u64)),
        );
        info
    }
}

fn format_output(info: &Params) -> String {
    info.iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Instrumentor for LogInstrumentor {
    fn instrument(&self, name: &str, params: &Params) {
        let (namespace, event) = name.split_once('.').unwrap_or((name, ""));
        let label = event.to_uppercase();

        if event == "error" {
            let message = params.get("error").cloned().unwrap_or(Value::Null);
            error!("{} {} {}", namespace, label, message);
            return;
        }

        info!(
            "{} {} {}",
            namespace,
            label,
            format_output(&Self::summary(event, params))
        );
        debug!("{} {} {}", namespace, label, format_output(params));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, Params)>>,
    }

    impl Instrumentor for Recorder {
        fn instrument(&self, name: &str, params: &Params) {
            self.events
                .lock()
                .unwrap()
                .push((name.to_string(), params.clone()));
        }
    }

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_events_reach_instrumentors_with_timing() {
        let collection = Collection::empty();
        let recorder = Arc::new(Recorder::default());
        collection.add(recorder.clone());

        collection.instrument("request.request", params(json!({"method": "get"})), Timing::start());

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let (name, recorded) = &events[0];
        assert_eq!(name, "request.request");
        let timing = recorded.get("timing").unwrap();
        assert!(timing.get("start_time").is_some());
        assert!(timing.get("complete_time").is_some());
        assert!(timing.get("duration").unwrap().as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn test_removed_instrumentor_stops_receiving() {
        let collection = Collection::empty();
        let recorder = Arc::new(Recorder::default());
        let id = collection.add(recorder.clone());
        assert!(collection.remove(id));
        assert!(!collection.remove(id));

        collection.instrument("request.request", Params::new(), Timing::start());
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscriptions_match_exact_and_pattern() {
        let collection = Collection::empty();
        let exact = Arc::new(Mutex::new(Vec::new()));
        let pattern = Arc::new(Mutex::new(Vec::new()));

        let sink = exact.clone();
        collection.subscribe(EventMatcher::exact("request.response"), move |name, _| {
            sink.lock().unwrap().push(name.to_string())
        });
        let sink = pattern.clone();
        let id = collection.subscribe(EventMatcher::pattern("request.*").unwrap(), move |name, _| {
            sink.lock().unwrap().push(name.to_string())
        });

        collection.instrument("request.request", Params::new(), Timing::start());
        collection.instrument("request.response", Params::new(), Timing::start());
        collection.instrument("auth.token", Params::new(), Timing::start());

        assert_eq!(*exact.lock().unwrap(), vec!["request.response"]);
        assert_eq!(
            *pattern.lock().unwrap(),
            vec!["request.request", "request.response"]
        );

        assert!(collection.unsubscribe(id));
        collection.instrument("request.retry", Params::new(), Timing::start());
        assert_eq!(pattern.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_credentials_redacted_before_dispatch() {
        let collection = Collection::empty();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        collection.subscribe(EventMatcher::exact("request.request"), move |_, params| {
            *sink.lock().unwrap() = Some(params.clone())
        });

        collection.instrument(
            "request.request",
            params(json!({
                "password": "hunter2",
                "access_token": "abc",
                "headers": {"Authorization": "Bearer abc", "Accept": "application/json"},
                "proxy": {"password": "proxy-secret", "host": "proxy"},
                "body": {"user": {"login": "jo", "password": "pw"}, "token": {"description": "ci"}}
            })),
            Timing::start(),
        );

        let seen = seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen["password"], REDACTED);
        assert_eq!(seen["access_token"], REDACTED);
        assert_eq!(seen["headers"]["Authorization"], REDACTED);
        assert_eq!(seen["headers"]["Accept"], "application/json");
        assert_eq!(seen["proxy"]["password"], REDACTED);
        assert_eq!(seen["proxy"]["host"], "proxy");
        assert_eq!(seen["body"]["user"]["password"], REDACTED);
        assert_eq!(seen["body"]["user"]["login"], "jo");
        assert_eq!(seen["body"]["token"]["description"], "ci");
    }

    #[tokio::test]
    async fn test_measure_returns_action_result() {
        let collection = Collection::empty();
        let recorder = Arc::new(Recorder::default());
        collection.add(recorder.clone());

        let value = collection
            .measure("auth.token", Params::new(), async { 42 })
            .await;

        assert_eq!(value, 42);
        assert_eq!(recorder.events.lock().unwrap()[0].0, "auth.token");
    }

    #[test]
    fn test_log_summary_formats_duration() {
        let summary = LogInstrumentor::summary(
            "response",
            &params(json!({"status": 200, "body": {}, "timing": {"duration": 0.25}})),
        );
        assert_eq!(summary["status"], 200);
        assert_eq!(summary["duration"], "250ms");
        assert!(summary.get("body").is_none());
    }
}
