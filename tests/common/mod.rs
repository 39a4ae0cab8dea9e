//! Test helpers: an in-memory Grafana library elements API on wiremock.

#![allow(dead_code)]

use dashcode::grafana::auth::Credentials;
use dashcode::provider::GrafanaProvider;
use dashcode::resource::{LibraryPanelHandler, Registry, Resource, API_VERSION};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const ELEMENTS_PATH: &str = "/api/library-elements";
const ELEMENT_PATH_REGEX: &str = r"^/api/library-elements/[^/]+$";

type Store = Arc<Mutex<Vec<Value>>>;

/// Stub Grafana holding library elements in memory, in insertion order.
pub struct StubGrafana {
    pub server: MockServer,
    store: Store,
}

impl StubGrafana {
    pub async fn start() -> Self {
        Self::start_with_page_cap(None).await
    }

    /// Like `start`, but list pages never hold more than `cap` elements,
    /// whatever `perPage` asks for
    pub async fn start_with_page_cap(cap: Option<usize>) -> Self {
        let server = MockServer::start().await;
        let store: Store = Arc::default();

        Mock::given(method("GET"))
            .and(path(ELEMENTS_PATH))
            .respond_with(ListElements {
                store: store.clone(),
                cap,
            })
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(ELEMENT_PATH_REGEX))
            .respond_with(GetElement(store.clone()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ELEMENTS_PATH))
            .respond_with(CreateElement(store.clone()))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path_regex(ELEMENT_PATH_REGEX))
            .respond_with(PatchElement(store.clone()))
            .mount(&server)
            .await;

        Self { server, store }
    }

    /// Insert an element directly, as if created through the UI
    pub fn seed(&self, uid: &str, model: Value) {
        let mut store = self.store.lock().unwrap();
        let id = store.len() as i64 + 1;
        let element_type = model.get("type").cloned().unwrap_or(json!(""));
        store.push(json!({
            "id": id,
            "orgId": 1,
            "uid": uid,
            "name": uid,
            "kind": 1,
            "type": element_type,
            "model": model,
            "version": 1,
        }));
    }

    pub fn element(&self, uid: &str) -> Option<Value> {
        self.store
            .lock()
            .unwrap()
            .iter()
            .find(|e| e["uid"] == uid)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn provider(&self) -> Arc<GrafanaProvider> {
        Arc::new(GrafanaProvider::new(
            Some(self.server.uri()),
            Credentials::Token("test-token".to_string()),
        ))
    }

    pub fn handler(&self) -> LibraryPanelHandler {
        LibraryPanelHandler::new(self.provider())
    }

    pub fn registry(&self) -> Registry {
        Registry::with_defaults(self.provider())
    }

    pub async fn requests(&self, verb: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == verb)
            .count()
    }
}

/// A `LibraryPanel` resource with the given spec
pub fn panel(name: &str, spec: Value) -> Resource {
    let spec: Map<String, Value> = spec.as_object().cloned().unwrap_or_default();
    Resource::new(API_VERSION, "LibraryPanel", name, spec)
}

fn uid_from(request: &Request) -> String {
    let segment = request.url.path().rsplit('/').next().unwrap_or_default();
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"message": "library element could not be found"}))
}

struct ListElements {
    store: Store,
    cap: Option<usize>,
}

impl Respond for ListElements {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query = |key: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let page = query("page").unwrap_or(1).max(1);
        let requested = query("perPage").unwrap_or(100).max(1);
        let per_page = self.cap.map_or(requested, |cap| requested.min(cap));

        let store = self.store.lock().unwrap();
        let elements: Vec<Value> = store
            .iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "totalCount": store.len(),
                "page": page,
                "perPage": per_page,
                "elements": elements,
            }
        }))
    }
}

struct GetElement(Store);

impl Respond for GetElement {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let uid = uid_from(request);
        let store = self.0.lock().unwrap();
        match store.iter().find(|e| e["uid"] == uid.as_str()) {
            Some(element) => ResponseTemplate::new(200).set_body_json(json!({"result": element})),
            None => not_found(),
        }
    }
}

struct CreateElement(Store);

impl Respond for CreateElement {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = request.body_json::<Value>() else {
            return ResponseTemplate::new(400).set_body_json(json!({"message": "bad request data"}));
        };

        let mut store = self.0.lock().unwrap();
        if store.iter().any(|e| e["uid"] == body["uid"]) {
            return ResponseTemplate::new(400)
                .set_body_json(json!({"message": "library element with that uid already exists"}));
        }

        let element = json!({
            "id": store.len() as i64 + 1,
            "orgId": 1,
            "folderUid": body.get("folderUid").cloned().unwrap_or(json!("")),
            "uid": body["uid"],
            "name": body["name"],
            "kind": body["kind"],
            "model": body["model"],
            "version": 1,
        });
        store.push(element.clone());

        ResponseTemplate::new(200).set_body_json(json!({"result": element}))
    }
}

struct PatchElement(Store);

impl Respond for PatchElement {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let uid = uid_from(request);
        let Ok(body) = request.body_json::<Value>() else {
            return ResponseTemplate::new(400).set_body_json(json!({"message": "bad request data"}));
        };

        let mut store = self.0.lock().unwrap();
        let Some(element) = store.iter_mut().find(|e| e["uid"] == uid.as_str()) else {
            return not_found();
        };

        if body["version"] != element["version"] {
            return ResponseTemplate::new(412)
                .set_body_json(json!({"message": "the library element has a different version"}));
        }

        let version = element["version"].as_i64().unwrap_or(0) + 1;
        element["model"] = body["model"].clone();
        element["name"] = body["name"].clone();
        element["version"] = json!(version);

        ResponseTemplate::new(200).set_body_json(json!({"result": element.clone()}))
    }
}
