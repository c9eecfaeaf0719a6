use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const DEFAULT_API_KEY: &str = "test-master-key";

#[derive(Clone)]
struct State {
    bins: Arc<Mutex<HashMap<String, Value>>>,
    next_id: Arc<AtomicU64>,
    outage: Arc<AtomicBool>,
    api_key: Arc<str>,
}

impl State {
    fn new(api_key: &str) -> Self {
        Self {
            bins: Arc::default(),
            next_id: Arc::default(),
            outage: Arc::default(),
            api_key: Arc::from(api_key),
        }
    }

    fn check(&self, request: &Request) -> Option<ResponseTemplate> {
        if self.outage.load(Ordering::SeqCst) {
            return Some(
                ResponseTemplate::new(503).set_body_json(json!({ "message": "Service Unavailable" })),
            );
        }
        let key = request
            .headers
            .get("X-Master-Key")
            .and_then(|v| v.to_str().ok());
        if key != Some(&*self.api_key) {
            return Some(ResponseTemplate::new(401).set_body_json(
                json!({ "message": "You need to pass X-Master-Key in the header" }),
            ));
        }
        None
    }

    fn insert(&self, record: Value) -> String {
        let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.bins.lock().insert(id.clone(), record);
        id
    }
}

fn bin_id(request: &Request) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.nth(1))
        .unwrap_or_default()
        .to_string()
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404)
        .set_body_json(json!({ "message": "Bin not found or it doesn't belong to your account" }))
}

struct ReadLatest(State);

impl Respond for ReadLatest {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if let Some(rejected) = self.0.check(request) {
            return rejected;
        }
        let id = bin_id(request);
        match self.0.bins.lock().get(&id) {
            Some(record) => ResponseTemplate::new(200).set_body_json(json!({
                "record": record,
                "metadata": { "id": id, "private": true },
            })),
            None => not_found(),
        }
    }
}

struct Replace(State);

impl Respond for Replace {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if let Some(rejected) = self.0.check(request) {
            return rejected;
        }
        let Ok(record) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid JSON" }));
        };
        let id = bin_id(request);
        let mut bins = self.0.bins.lock();
        let Some(slot) = bins.get_mut(&id) else {
            return not_found();
        };
        *slot = record.clone();
        ResponseTemplate::new(200).set_body_json(json!({
            "record": record,
            "metadata": { "parentId": id, "private": true },
        }))
    }
}

struct Create(State);

impl Respond for Create {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if let Some(rejected) = self.0.check(request) {
            return rejected;
        }
        let Ok(record) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid JSON" }));
        };
        let name = request
            .headers
            .get("X-Bin-Name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let id = self.0.insert(record.clone());
        ResponseTemplate::new(200).set_body_json(json!({
            "record": record,
            "metadata": {
                "id": id,
                "createdAt": jiff::Timestamp::now().to_string(),
                "private": true,
                "name": name,
            },
        }))
    }
}

/// A fake JSONBin v3 API.
///
/// Supports reading the latest version of a bin, replacing a bin and
/// creating bins. Every request must carry the configured master key.
pub struct JsonBinServer {
    server: MockServer,
    state: State,
}

impl JsonBinServer {
    pub async fn start() -> Self {
        Self::with_api_key(DEFAULT_API_KEY).await
    }

    pub async fn with_api_key(api_key: &str) -> Self {
        let server = MockServer::start().await;
        let state = State::new(api_key);

        Mock::given(method("GET"))
            .and(path_regex(r"^/b/[^/]+/latest$"))
            .respond_with(ReadLatest(state.clone()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/b/[^/]+$"))
            .respond_with(Replace(state.clone()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/b"))
            .respond_with(Create(state.clone()))
            .mount(&server)
            .await;

        Self { server, state }
    }

    /// Base URL to use as the client's API base.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn api_key(&self) -> &str {
        &self.state.api_key
    }

    /// Creates a bin directly, bypassing HTTP, and returns its id.
    pub fn create_bin_with(&self, record: Value) -> String {
        self.state.insert(record)
    }

    /// Current content of a bin.
    pub fn record(&self, bin_id: &str) -> Option<Value> {
        self.state.bins.lock().get(bin_id).cloned()
    }

    /// Makes every request fail with 503 until switched back off.
    pub fn set_outage(&self, outage: bool) {
        self.state.outage.store(outage, Ordering::SeqCst);
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}
