// Mock Azure AI Foundry project API used by the integration tests.
//
// Serves a paged agent listing and the responses endpoint on an ephemeral
// port, recording what the client sent.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PROJECT_PATH: &str = "/api/projects/demo";
pub const TOKEN: &str = "test-token";
pub const PAGE_SIZE: usize = 2;

#[derive(Default)]
pub struct MockState {
    pub agents: Mutex<Vec<Value>>,
    pub list_queries: Mutex<Vec<HashMap<String, String>>>,
    pub response_bodies: Mutex<Vec<Value>>,
    pub authorizations: Mutex<Vec<String>>,
    pub fail_listing: Mutex<bool>,
}

impl MockState {
    pub fn set_agents(&self, agents: Vec<Value>) {
        *self.agents.lock().expect("agents lock") = agents;
    }

    pub fn set_fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().expect("fail lock") = fail;
    }

    pub fn list_queries(&self) -> Vec<HashMap<String, String>> {
        self.list_queries.lock().expect("queries lock").clone()
    }

    pub fn response_bodies(&self) -> Vec<Value> {
        self.response_bodies.lock().expect("bodies lock").clone()
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.authorizations.lock().expect("auth lock").clone()
    }
}

pub struct MockFoundry {
    pub endpoint: String,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl Drop for MockFoundry {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn agent(name: &str, description: &str) -> Value {
    json!({
        "object": "agent",
        "id": format!("{}-id", name.to_lowercase().replace(' ', "-")),
        "name": name,
        "description": description,
        "versions": {
            "latest": {
                "version": "1",
                "definition": { "kind": "prompt", "model": "gpt-4o" }
            }
        }
    })
}

pub async fn spawn(agents: Vec<Value>) -> MockFoundry {
    let state = Arc::new(MockState::default());
    state.set_agents(agents);

    let app = Router::new()
        .route(&format!("{PROJECT_PATH}/agents"), get(list_agents))
        .route(&format!("{PROJECT_PATH}/openai/responses"), post(create_response))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
    let addr = listener.local_addr().expect("mock addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    MockFoundry {
        endpoint: format!("http://{addr}{PROJECT_PATH}"),
        state,
        handle,
    }
}

fn record_auth(state: &MockState, headers: &HeaderMap) {
    let value = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.authorizations.lock().expect("auth lock").push(value);
}

async fn list_agents(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_auth(&state, &headers);
    state
        .list_queries
        .lock()
        .expect("queries lock")
        .push(query.clone());

    if *state.fail_listing.lock().expect("fail lock") && query.contains_key("after") {
        return (StatusCode::SERVICE_UNAVAILABLE, "listing unavailable").into_response();
    }

    let agents = state.agents.lock().expect("agents lock").clone();
    let start = match query.get("after") {
        Some(after) => agents
            .iter()
            .position(|agent| agent["id"].as_str() == Some(after.as_str()))
            .map(|index| index + 1)
            .unwrap_or(agents.len()),
        None => 0,
    };
    let page: Vec<Value> = agents.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let has_more = start + page.len() < agents.len();
    let last_id = page.last().and_then(|agent| agent["id"].as_str()).map(str::to_string);

    Json(json!({
        "object": "list",
        "data": page,
        "has_more": has_more,
        "first_id": null,
        "last_id": last_id,
    }))
    .into_response()
}

async fn create_response(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    state
        .response_bodies
        .lock()
        .expect("bodies lock")
        .push(body.clone());

    let name = body["agent"]["name"].as_str().unwrap_or_default().to_string();
    let known = state
        .agents
        .lock()
        .expect("agents lock")
        .iter()
        .any(|agent| agent["name"].as_str() == Some(name.as_str()));
    if !known {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": "not_found", "message": "agent not found"}})),
        )
            .into_response();
    }

    let input = body["input"].as_str().unwrap_or_default();
    Json(json!({
        "id": "resp_1",
        "object": "response",
        "status": "completed",
        "output_text": "",
        "output": [
            {
                "type": "message",
                "content": [
                    { "type": "output_text", "text": format!("{name} received") },
                    { "type": "output_text", "text": input }
                ]
            }
        ]
    }))
    .into_response()
}
