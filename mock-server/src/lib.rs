use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<serde_json::Value>,
}

/// Keys and limits the server enforces.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub api_key: String,
    /// Accepted by the chat endpoint in addition to `api_key`.
    pub embeddings_api_key: Option<String>,
    /// Chat calls allowed before the trial limit kicks in.
    pub chat_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: "test-key".to_string(),
            embeddings_api_key: None,
            chat_limit: 20,
        }
    }
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    items: BTreeMap<u64, Item>,
    chat_usage: u32,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    store: Arc<RwLock<Store>>,
}

pub fn app(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/{id}", get(get_item).patch(update_item).delete(delete_item))
        .route("/api/rag/chat", post(chat))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

fn error(status: StatusCode, body: serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, json!({ "message": "Item not found" }))
}

fn authorize(headers: &HeaderMap, accepted: &[Option<&str>]) -> Result<(), Response> {
    let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    match presented {
        Some(key) if accepted.iter().flatten().any(|k| *k == key) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, json!({ "message": "Invalid API key" }))),
    }
}

fn authorize_items(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    authorize(headers, &[Some(state.config.api_key.as_str())])
}

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.parse().map_err(|_| not_found())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Item>>, Response> {
    authorize_items(&state, &headers)?;
    let store = state.store.read().await;
    Ok(Json(store.items.values().cloned().collect()))
}

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<Item>), Response> {
    authorize_items(&state, &headers)?;
    let Some(title) = non_empty(input.title) else {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "errors": ["Title can't be blank"] }),
        ));
    };

    let mut store = state.store.write().await;
    store.next_id += 1;
    let item = Item {
        id: store.next_id,
        title,
        url: non_empty(input.url),
        text: non_empty(input.text),
        tags: input.tags,
    };
    store.items.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Item>, Response> {
    authorize_items(&state, &headers)?;
    let id = parse_id(&id)?;
    let store = state.store.read().await;
    store.items.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, Response> {
    authorize_items(&state, &headers)?;
    let id = parse_id(&id)?;
    if input.title.as_deref() == Some("") {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "errors": ["Title can't be blank"] }),
        ));
    }

    let mut store = state.store.write().await;
    let item = store.items.get_mut(&id).ok_or_else(not_found)?;
    if let Some(title) = input.title {
        item.title = title;
    }
    if let Some(url) = input.url {
        item.url = Some(url);
    }
    if let Some(text) = input.text {
        item.text = Some(text);
    }
    if let Some(tags) = input.tags {
        item.tags = tags;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Response> {
    authorize_items(&state, &headers)?;
    let id = parse_id(&id)?;
    let mut store = state.store.write().await;
    store
        .items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ChatInput>,
) -> Result<Json<serde_json::Value>, Response> {
    authorize(
        &headers,
        &[
            Some(state.config.api_key.as_str()),
            state.config.embeddings_api_key.as_deref(),
        ],
    )?;
    if input.message.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, json!({ "message": "Message is required" })));
    }

    let mut store = state.store.write().await;
    if store.chat_usage >= state.config.chat_limit {
        return Err(error(
            StatusCode::FORBIDDEN,
            json!({ "message": "Trial limit reached, please upgrade your plan" }),
        ));
    }
    store.chat_usage += 1;

    Ok(Json(json!({
        "reply": format!("You said: {} ({} earlier turns)", input.message, input.history.len()),
        "usage": store.chat_usage,
        "limit": state.config.chat_limit,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_serializes_to_json() {
        let item = Item {
            id: 1,
            title: "Test".to_string(),
            url: None,
            text: Some("body".to_string()),
            tags: vec!["a".to_string()],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Test");
        assert!(json["url"].is_null());
        assert_eq!(json["tags"], json!(["a"]));
    }

    #[test]
    fn create_item_tags_default_to_empty() {
        let input: CreateItem = serde_json::from_str(r#"{"title":"No tags"}"#).unwrap();
        assert_eq!(input.title.as_deref(), Some("No tags"));
        assert!(input.tags.is_empty());
    }

    #[test]
    fn update_item_all_fields_optional() {
        let input: UpdateItem = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.url.is_none());
        assert!(input.text.is_none());
        assert!(input.tags.is_none());
    }

    #[test]
    fn authorize_accepts_any_configured_key() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "rag".parse().unwrap());
        assert!(authorize(&headers, &[Some("main"), Some("rag")]).is_ok());
        assert!(authorize(&headers, &[Some("main"), None]).is_err());
        assert!(authorize(&HeaderMap::new(), &[Some("main")]).is_err());
    }
}
