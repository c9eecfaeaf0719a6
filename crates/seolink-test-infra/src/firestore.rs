use jiff::Timestamp;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use typed_builder::TypedBuilder;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Settings of a [`FirestoreServer`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct FirestoreServerConfig {
    #[builder(default = "demo-project".to_string(), setter(into))]
    pub project_id: String,
    #[builder(default = "test-api-key".to_string(), setter(into))]
    pub api_key: String,
    /// Reject queries combining a field filter with an order, like a
    /// database whose composite index has not been deployed.
    #[builder(default = false)]
    pub require_composite_index: bool,
}

type Fields = Map<String, Value>;

#[derive(Clone)]
struct State {
    config: Arc<FirestoreServerConfig>,
    // keyed by "{collection}/{id}"
    documents: Arc<Mutex<BTreeMap<String, Fields>>>,
    require_index: Arc<AtomicBool>,
    outage: Arc<AtomicBool>,
}

enum Target<'a> {
    Query,
    Collection(&'a str),
    Document(&'a str, &'a str),
}

fn error(code: u16, status: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "error": { "code": code, "message": message, "status": status }
    }))
}

fn now() -> String {
    Timestamp::now().to_string()
}

impl State {
    fn prefix(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.config.project_id)
    }

    fn name(&self, key: &str) -> String {
        format!("{}/{}", self.prefix(), key)
    }

    fn document(&self, key: &str, fields: &Fields) -> Value {
        json!({
            "name": self.name(key),
            "fields": fields,
            "createTime": now(),
            "updateTime": now(),
        })
    }

    fn query_values(request: &Request, param: &str) -> Vec<String> {
        request
            .url
            .query_pairs()
            .filter(|(k, _)| k == param)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    fn target<'p>(&self, path: &'p str) -> Option<Target<'p>> {
        // /v1/projects/{project}/databases/{database}/documents[...]
        let rest = path.strip_prefix("/v1/projects/")?;
        let rest = rest.strip_prefix(self.config.project_id.as_str())?;
        let rest = rest.strip_prefix("/databases/")?;
        let (_, rest) = rest.split_once('/')?;
        let rest = rest.strip_prefix("documents")?;

        if rest == ":runQuery" {
            return Some(Target::Query);
        }
        let segments: Vec<&str> = rest.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            [collection] if !collection.is_empty() => Some(Target::Collection(collection)),
            [collection, id] => Some(Target::Document(collection, id)),
            _ => None,
        }
    }

    fn create(&self, request: &Request, collection: &str) -> ResponseTemplate {
        let Some(id) = Self::query_values(request, "documentId").pop() else {
            return error(400, "INVALID_ARGUMENT", "documentId is required");
        };
        let Some(fields) = body_fields(request) else {
            return error(400, "INVALID_ARGUMENT", "Invalid JSON payload");
        };
        let key = format!("{}/{}", collection, id);
        let mut documents = self.documents.lock();
        if documents.contains_key(&key) {
            return error(
                409,
                "ALREADY_EXISTS",
                &format!("Document already exists: {}", self.name(&key)),
            );
        }
        documents.insert(key.clone(), fields.clone());
        ResponseTemplate::new(200).set_body_json(self.document(&key, &fields))
    }

    fn get(&self, key: &str) -> ResponseTemplate {
        match self.documents.lock().get(key) {
            Some(fields) => ResponseTemplate::new(200).set_body_json(self.document(key, fields)),
            None => error(404, "NOT_FOUND", &format!("Document \"{}\" not found.", self.name(key))),
        }
    }

    fn patch(&self, request: &Request, key: &str) -> ResponseTemplate {
        let Some(body) = body_fields(request) else {
            return error(400, "INVALID_ARGUMENT", "Invalid JSON payload");
        };
        let must_exist = Self::query_values(request, "currentDocument.exists")
            .iter()
            .any(|v| v == "true");
        let mask = Self::query_values(request, "updateMask.fieldPaths");

        let mut documents = self.documents.lock();
        if must_exist && !documents.contains_key(key) {
            return error(404, "NOT_FOUND", &format!("No document to update: {}", self.name(key)));
        }
        let stored = documents.entry(key.to_string()).or_default();
        if mask.is_empty() {
            *stored = body;
        } else {
            for field in mask {
                match body.get(&field) {
                    Some(value) => stored.insert(field, value.clone()),
                    None => stored.remove(&field),
                };
            }
        }
        let document = self.document(key, stored);
        ResponseTemplate::new(200).set_body_json(document)
    }

    fn delete(&self, request: &Request, key: &str) -> ResponseTemplate {
        let must_exist = Self::query_values(request, "currentDocument.exists")
            .iter()
            .any(|v| v == "true");
        let removed = self.documents.lock().remove(key).is_some();
        if must_exist && !removed {
            return error(404, "NOT_FOUND", &format!("No document to delete: {}", self.name(key)));
        }
        ResponseTemplate::new(200).set_body_json(json!({}))
    }

    fn run_query(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return error(400, "INVALID_ARGUMENT", "Invalid JSON payload");
        };
        let query = &body["structuredQuery"];
        let Some(collection) = query["from"][0]["collectionId"].as_str() else {
            return error(400, "INVALID_ARGUMENT", "from.collectionId is required");
        };

        let filter = &query["where"]["fieldFilter"];
        let order = query["orderBy"].as_array().and_then(|o| o.first());

        if self.require_index.load(Ordering::SeqCst) && filter.is_object() && order.is_some() {
            return ResponseTemplate::new(400).set_body_json(json!([{
                "error": {
                    "code": 400,
                    "message": "The query requires an index. You can create it here: https://console.firebase.google.com/project/demo/firestore/indexes",
                    "status": "FAILED_PRECONDITION",
                }
            }]));
        }

        let prefix = format!("{}/", collection);
        let documents = self.documents.lock();
        let mut matched: Vec<(&String, &Fields)> = documents
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .filter(|(_, fields)| matches_filter(filter, fields))
            .collect();

        if let Some(order) = order {
            let field = order["field"]["fieldPath"].as_str().unwrap_or_default();
            let descending = order["direction"] == "DESCENDING";
            // documents without the ordered field are excluded
            matched.retain(|(_, fields)| fields.contains_key(field));
            matched.sort_by(|(ka, a), (kb, b)| {
                let ordering = sort_key(&a[field])
                    .cmp(&sort_key(&b[field]))
                    .then_with(|| ka.cmp(kb));
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let read_time = now();
        let mut results: Vec<Value> = matched
            .into_iter()
            .map(|(key, fields)| json!({ "document": self.document(key, fields), "readTime": read_time }))
            .collect();
        if results.is_empty() {
            results.push(json!({ "readTime": read_time }));
        }
        ResponseTemplate::new(200).set_body_json(Value::Array(results))
    }
}

fn body_fields(request: &Request) -> Option<Fields> {
    let body: Value = serde_json::from_slice(&request.body).ok()?;
    match body.get("fields") {
        Some(Value::Object(fields)) => Some(fields.clone()),
        None => Some(Fields::new()),
        Some(_) => None,
    }
}

fn matches_filter(filter: &Value, fields: &Fields) -> bool {
    if !filter.is_object() {
        return true;
    }
    let field = filter["field"]["fieldPath"].as_str().unwrap_or_default();
    match filter["op"].as_str() {
        Some("EQUAL") => fields.get(field) == Some(&filter["value"]),
        _ => false,
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Timestamp(Timestamp),
    Text(String),
    Other,
}

fn sort_key(value: &Value) -> SortKey {
    if let Some(ts) = value["timestampValue"]
        .as_str()
        .and_then(|raw| raw.parse::<Timestamp>().ok())
    {
        return SortKey::Timestamp(ts);
    }
    match value["stringValue"].as_str() {
        Some(text) => SortKey::Text(text.to_string()),
        None => SortKey::Other,
    }
}

struct Dispatch(State);

impl Respond for Dispatch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let state = &self.0;
        if state.outage.load(Ordering::SeqCst) {
            return error(503, "UNAVAILABLE", "The service is currently unavailable.");
        }
        let key = State::query_values(request, "key").pop();
        if key.as_deref() != Some(state.config.api_key.as_str()) {
            return error(403, "PERMISSION_DENIED", "The request is missing a valid API key.");
        }

        let Some(target) = state.target(request.url.path()) else {
            return error(404, "NOT_FOUND", "Unknown resource");
        };
        match (request.method.as_str(), target) {
            ("POST", Target::Query) => state.run_query(request),
            ("POST", Target::Collection(collection)) => state.create(request, collection),
            ("GET", Target::Document(collection, id)) => state.get(&format!("{collection}/{id}")),
            ("PATCH", Target::Document(collection, id)) => {
                state.patch(request, &format!("{collection}/{id}"))
            }
            ("DELETE", Target::Document(collection, id)) => {
                state.delete(request, &format!("{collection}/{id}"))
            }
            _ => error(405, "INVALID_ARGUMENT", "Unsupported method"),
        }
    }
}

/// A fake Firestore REST API for one project.
///
/// Keeps documents in memory and supports document get, create, patch and
/// delete with their `currentDocument` preconditions, plus `runQuery` with a
/// single equality filter and a single order.
pub struct FirestoreServer {
    server: MockServer,
    state: State,
}

impl FirestoreServer {
    pub async fn start() -> Self {
        Self::with_config(FirestoreServerConfig::builder().build()).await
    }

    pub async fn with_config(config: FirestoreServerConfig) -> Self {
        let server = MockServer::start().await;
        let state = State {
            require_index: Arc::new(AtomicBool::new(config.require_composite_index)),
            config: Arc::new(config),
            documents: Arc::default(),
            outage: Arc::default(),
        };

        Mock::given(any())
            .respond_with(Dispatch(state.clone()))
            .mount(&server)
            .await;

        Self { server, state }
    }

    /// Base URL to use as the client's API base.
    pub fn api_base(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    pub fn project_id(&self) -> &str {
        &self.state.config.project_id
    }

    pub fn api_key(&self) -> &str {
        &self.state.config.api_key
    }

    pub fn require_composite_index(&self, required: bool) {
        self.state.require_index.store(required, Ordering::SeqCst);
    }

    /// Makes every request fail with 503 until switched back off.
    pub fn set_outage(&self, outage: bool) {
        self.state.outage.store(outage, Ordering::SeqCst);
    }

    /// Stores a document directly, bypassing HTTP.
    pub fn insert_document(&self, collection: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        };
        self.state
            .documents
            .lock()
            .insert(format!("{}/{}", collection, id), fields);
    }

    /// Stored fields of a document, in Firestore's typed-value encoding.
    pub fn document_fields(&self, collection: &str, id: &str) -> Option<Value> {
        self.state
            .documents
            .lock()
            .get(&format!("{}/{}", collection, id))
            .cloned()
            .map(Value::Object)
    }

    pub fn document_count(&self) -> usize {
        self.state.documents.lock().len()
    }
}
