use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Item, ServerConfig};
use tower::ServiceExt;

const KEY: &str = "test-key";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, key: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", key)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, key: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", key)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_key_returns_401() {
    let resp = app(ServerConfig::default())
        .oneshot(Request::builder().uri("/api/items").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn embeddings_key_is_rejected_for_items() {
    let config = ServerConfig {
        embeddings_api_key: Some("rag-key".to_string()),
        ..ServerConfig::default()
    };
    let resp = app(config)
        .oneshot(request("GET", "/api/items", "rag-key"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- list ---

#[tokio::test]
async fn list_items_empty() {
    let resp = app(ServerConfig::default())
        .oneshot(request("GET", "/api/items", KEY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let items: Vec<Item> = body_json(resp).await;
    assert!(items.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_item_returns_201() {
    let resp = app(ServerConfig::default())
        .oneshot(json_request(
            "POST",
            "/api/items",
            KEY,
            r#"{"title":"Rugby rules","tags":["sport"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let item: Item = body_json(resp).await;
    assert_eq!(item.id, 1);
    assert_eq!(item.title, "Rugby rules");
    assert_eq!(item.tags, vec!["sport".to_string()]);
    assert!(item.url.is_none());
}

#[tokio::test]
async fn create_item_blank_title_returns_422_with_errors() {
    let resp = app(ServerConfig::default())
        .oneshot(json_request("POST", "/api/items", KEY, r#"{"title":""}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["errors"][0], "Title can't be blank");
}

// --- get ---

#[tokio::test]
async fn get_item_not_found() {
    let resp = app(ServerConfig::default())
        .oneshot(request("GET", "/api/items/999", KEY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_item_non_numeric_id_is_not_found() {
    let resp = app(ServerConfig::default())
        .oneshot(request("GET", "/api/items/abc", KEY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- update / delete ---

#[tokio::test]
async fn update_item_not_found() {
    let resp = app(ServerConfig::default())
        .oneshot(json_request("PATCH", "/api/items/5", KEY, r#"{"title":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_item_not_found() {
    let resp = app(ServerConfig::default())
        .oneshot(request("DELETE", "/api/items/5", KEY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- chat ---

#[tokio::test]
async fn chat_accepts_embeddings_key() {
    let config = ServerConfig {
        embeddings_api_key: Some("rag-key".to_string()),
        ..ServerConfig::default()
    };
    let resp = app(config)
        .oneshot(json_request("POST", "/api/rag/chat", "rag-key", r#"{"message":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["reply"], "You said: hi (0 earlier turns)");
    assert_eq!(body["usage"], 1);
    assert_eq!(body["limit"], 20);
}

#[tokio::test]
async fn chat_blank_message_returns_400() {
    let resp = app(ServerConfig::default())
        .oneshot(json_request("POST", "/api/rag/chat", KEY, r#"{"message":" "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "Message is required");
}

#[tokio::test]
async fn chat_enforces_trial_limit() {
    use tower::Service;

    let config = ServerConfig {
        chat_limit: 1,
        ..ServerConfig::default()
    };
    let mut app = app(config).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/rag/chat", KEY, r#"{"message":"one"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/rag/chat", KEY, r#"{"message":"two"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("Trial limit"));
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app(ServerConfig::default()).into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/items",
            KEY,
            r#"{"title":"Walk dog","url":"https://example.com/dog"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Item = body_json(resp).await;
    assert_eq!(created.title, "Walk dog");
    let id = created.id;

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/api/items", KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items, vec![created.clone()]);

    // patch: only text
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("/api/items/{id}"),
            KEY,
            r#"{"text":"twice a day"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Item = body_json(resp).await;
    assert_eq!(updated.title, "Walk dog"); // unchanged
    assert_eq!(updated.url.as_deref(), Some("https://example.com/dog")); // unchanged
    assert_eq!(updated.text.as_deref(), Some("twice a day"));

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/api/items/{id}"), KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Item = body_json(resp).await;
    assert_eq!(fetched, updated);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &format!("/api/items/{id}"), KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("/api/items/{id}"), KEY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
