//! An in-memory fake of the Graph API.
//!
//! Reproduces the response shapes clients have to cope with: objects,
//! `data`/`paging` envelopes, `error` envelopes, bare `true`/`false`, and
//! non-JSON bodies. Requests without `access_token` are anonymous; any token
//! other than `VALID_TOKEN` is rejected.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const VALID_TOKEN: &str = "mock-token";

/// Id of the user `me` resolves to.
pub const ME: &str = "4";

const DEFAULT_LIMIT: usize = 25;

type Params = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: String,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct Graph {
    nodes: HashMap<String, Node>,
    /// Post ids per owner, newest first.
    feeds: HashMap<String, Vec<String>>,
}

impl Graph {
    pub fn insert(&mut self, kind: &str, body: Value) {
        if let Some(id) = body.get("id").and_then(Value::as_str) {
            self.nodes.insert(
                id.to_string(),
                Node {
                    kind: kind.to_string(),
                    body,
                },
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn feed(&self, owner: &str) -> Vec<Value> {
        self.feeds
            .get(owner)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.nodes.get(id))
                    .map(|node| node.body.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn publish(&mut self, owner: &str, message: &str) -> String {
        let id = format!("{owner}_{}", Uuid::new_v4().simple());
        self.insert(
            "post",
            json!({ "id": id, "from": { "id": owner }, "message": message }),
        );
        self.feeds.entry(owner.to_string()).or_default().insert(0, id.clone());
        id
    }

    fn remove(&mut self, id: &str) -> bool {
        let removed = self.nodes.remove(id).is_some();
        if removed {
            for ids in self.feeds.values_mut() {
                ids.retain(|post| post != id);
            }
        }
        removed
    }
}

/// The fixture graph every fresh `app()` starts from.
pub fn seed() -> Graph {
    let mut graph = Graph::default();
    graph.insert("user", json!({ "id": ME, "name": "Mark Zuckerberg", "username": "zuck" }));
    graph.insert("user", json!({ "id": "5", "name": "Chris Hughes" }));
    graph.insert("page", json!({ "id": "40796308305", "name": "Coca-Cola", "category": "Food/beverages" }));
    graph.insert("place", json!({ "id": "110843418940484", "name": "Coffee Corner" }));
    graph.insert("group", json!({ "id": "2204501798", "name": "Coffee Lovers" }));
    graph
}

pub type Db = Arc<RwLock<Graph>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/search", get(search))
        .route("/{id}", get(get_object).delete(delete_object))
        .route("/{id}/feed", get(get_feed).post(post_feed))
        .route("/{id}/picture", get(get_picture))
        .route("/{id}/photo", get(get_photo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock graph api listening");
    }
    axum::serve(listener, app()).await
}

enum Auth {
    Anonymous,
    Valid,
    Invalid,
}

fn auth(params: &Params) -> Auth {
    match params.get("access_token").map(String::as_str) {
        None | Some("") => Auth::Anonymous,
        Some(VALID_TOKEN) => Auth::Valid,
        Some(_) => Auth::Invalid,
    }
}

fn graph_error(status: StatusCode, message: &str, kind: &str, code: u32) -> Response {
    debug!(%status, message, "mock graph api error");
    (
        status,
        Json(json!({ "error": { "message": message, "type": kind, "code": code } })),
    )
        .into_response()
}

fn invalid_token() -> Response {
    graph_error(StatusCode::BAD_REQUEST, "Invalid OAuth access token.", "OAuthException", 190)
}

fn token_required(action: &str) -> Response {
    graph_error(
        StatusCode::BAD_REQUEST,
        &format!("An active access token must be used to {action}."),
        "OAuthException",
        2500,
    )
}

/// Resolve `me`, which needs a valid token, to a concrete id.
fn resolve(id: &str, auth: &Auth) -> Result<String, Response> {
    match (id, auth) {
        (_, Auth::Invalid) => Err(invalid_token()),
        ("me", Auth::Valid) => Ok(ME.to_string()),
        ("me", Auth::Anonymous) => Err(token_required("query information about the current user")),
        (id, _) => Ok(id.to_string()),
    }
}

/// Keep `id` plus the comma-separated `fields`, when given.
fn select_fields(body: &Value, fields: Option<&String>) -> Value {
    let (Some(fields), Some(object)) = (fields, body.as_object()) else {
        return body.clone();
    };
    let mut selected = Map::new();
    for field in std::iter::once("id").chain(fields.split(',')) {
        if let Some(value) = object.get(field) {
            selected.insert(field.to_string(), value.clone());
        }
    }
    Value::Object(selected)
}

fn parse_usize(params: &Params, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

async fn get_object(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    let id = match resolve(&id, &auth(&params)) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let graph = db.read().await;
    match graph.get(&id) {
        Some(node) => Json(select_fields(&node.body, params.get("fields"))).into_response(),
        None => Json(false).into_response(),
    }
}

async fn get_feed(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    let id = match resolve(&id, &auth(&params)) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let graph = db.read().await;
    if graph.get(&id).is_none() {
        return Json(false).into_response();
    }

    let limit = parse_usize(&params, "limit", DEFAULT_LIMIT);
    let offset = parse_usize(&params, "offset", 0);
    let posts = graph.feed(&id);
    let page: Vec<Value> = posts.iter().skip(offset).take(limit).cloned().collect();
    let mut paging = Map::new();
    let next = offset.saturating_add(limit);
    if next < posts.len() {
        paging.insert(
            "next".to_string(),
            json!(format!("/{id}/feed?limit={limit}&offset={next}")),
        );
    }
    Json(json!({ "data": page, "paging": paging })).into_response()
}

async fn post_feed(
    State(db): State<Db>,
    Path(id): Path<String>,
    Form(form): Form<Params>,
) -> Response {
    let auth = auth(&form);
    if matches!(auth, Auth::Anonymous) {
        return token_required("publish");
    }
    let id = match resolve(&id, &auth) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(message) = form.get("message").filter(|m| !m.is_empty()) else {
        return graph_error(
            StatusCode::BAD_REQUEST,
            "(#100) A message is required",
            "OAuthException",
            100,
        );
    };

    let mut graph = db.write().await;
    if graph.get(&id).is_none() {
        return Json(false).into_response();
    }
    let post_id = graph.publish(&id, message);
    Json(json!({ "id": post_id })).into_response()
}

async fn delete_object(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    match auth(&params) {
        Auth::Anonymous => return token_required("delete objects"),
        Auth::Invalid => return invalid_token(),
        Auth::Valid => {}
    }
    let removed = db.write().await.remove(&id);
    Json(removed).into_response()
}

async fn get_picture(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let graph = db.read().await;
    match graph.get(&id) {
        Some(_) => (StatusCode::OK, format!("picture of {id}")).into_response(),
        None => Json(false).into_response(),
    }
}

/// JPEG magic bytes; deliberately not UTF-8.
pub const JPEG_HEADER: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, b'J', b'F', b'I', b'F'];

async fn get_photo(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let graph = db.read().await;
    match graph.get(&id) {
        Some(_) => ([(header::CONTENT_TYPE, "image/jpeg")], JPEG_HEADER).into_response(),
        None => Json(false).into_response(),
    }
}

async fn search(State(db): State<Db>, Query(params): Query<Params>) -> Response {
    if matches!(auth(&params), Auth::Invalid) {
        return invalid_token();
    }
    let (Some(q), Some(kind)) = (params.get("q"), params.get("type")) else {
        return graph_error(
            StatusCode::BAD_REQUEST,
            "(#100) Missing q or type parameter",
            "OAuthException",
            100,
        );
    };

    let needle = q.to_lowercase();
    let graph = db.read().await;
    let mut hits: Vec<Value> = graph
        .nodes
        .values()
        .filter(|node| &node.kind == kind)
        .filter(|node| {
            node.body
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .map(|node| node.body.clone())
        .collect();
    hits.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));

    Json(json!({ "data": hits, "paging": {} })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_contains_me() {
        let graph = seed();
        let me = graph.get(ME).unwrap();
        assert_eq!(me.kind, "user");
        assert_eq!(me.body["username"], "zuck");
    }

    #[test]
    fn publish_puts_newest_first() {
        let mut graph = seed();
        let first = graph.publish(ME, "first");
        let second = graph.publish(ME, "second");
        let feed = graph.feed(ME);
        assert_eq!(feed[0]["id"], second.as_str());
        assert_eq!(feed[1]["id"], first.as_str());
        assert!(first.starts_with("4_"));
    }

    #[test]
    fn remove_drops_post_from_feed() {
        let mut graph = seed();
        let id = graph.publish(ME, "gone soon");
        assert!(graph.remove(&id));
        assert!(graph.feed(ME).is_empty());
        assert!(!graph.remove(&id));
    }

    #[test]
    fn select_fields_keeps_id_and_requested() {
        let body = json!({ "id": "4", "name": "Mark", "username": "zuck" });
        let fields = "name".to_string();
        assert_eq!(
            select_fields(&body, Some(&fields)),
            json!({ "id": "4", "name": "Mark" })
        );
        assert_eq!(select_fields(&body, None), body);
    }

    #[test]
    fn auth_classifies_tokens() {
        let mut params = Params::new();
        assert!(matches!(auth(&params), Auth::Anonymous));
        params.insert("access_token".to_string(), VALID_TOKEN.to_string());
        assert!(matches!(auth(&params), Auth::Valid));
        params.insert("access_token".to_string(), "nope".to_string());
        assert!(matches!(auth(&params), Auth::Invalid));
    }
}
