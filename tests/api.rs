//! API integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use secrecy::SecretString;
use tower::ServiceExt;
use unzip_bot::api::webhooks::telegram::SECRET_TOKEN_HEADER;
use unzip_bot::{ApiState, Outcome, UpdateHandler};

mod common;
use common::{MockBot, Sent, build_zip, extract_config, is_empty_dir};

const PATH_SECRET: &str = "path-s3cret";
const HEADER_SECRET: &str = "header-s3cret";

fn build_test_router(bot: &Arc<MockBot>, tmp: &std::path::Path, header: bool) -> axum::Router {
    let state = Arc::new(ApiState {
        handler: Arc::new(UpdateHandler::new(bot.clone(), extract_config(tmp))),
        path_secret: SecretString::from(PATH_SECRET.to_string()),
        webhook_secret: header.then(|| SecretString::from(HEADER_SECRET.to_string())),
    });
    unzip_bot::api::router(state)
}

fn text_update_json(chat_id: i64) -> String {
    serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": { "id": chat_id, "type": "private" },
            "from": { "id": chat_id, "is_bot": false, "first_name": "Ann" },
            "text": "hello"
        }
    })
    .to_string()
}

fn post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_webhook_processes_update() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), false);

    let response = app
        .oneshot(post(&format!("/webhook/{PATH_SECRET}"), text_update_json(77)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ok"], true);

    // Processing finishes before the response
    let sent = bot.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Message { chat_id: 77, text } if text.starts_with("Welcome")));
}

#[tokio::test]
async fn test_webhook_wrong_path_secret() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), false);

    let response = app
        .oneshot(post("/webhook/guess", text_update_json(77)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["ok"], false);
    assert!(bot.sent().await.is_empty());
}

#[tokio::test]
async fn test_webhook_secrets_differing_in_last_byte() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), true);

    let mut request = post("/webhook/path-s3creT", text_update_json(77));
    request
        .headers_mut()
        .insert(SECRET_TOKEN_HEADER, HEADER_SECRET.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let mut request = post(&format!("/webhook/{PATH_SECRET}"), text_update_json(77));
    request
        .headers_mut()
        .insert(SECRET_TOKEN_HEADER, "header-s3creT".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert!(bot.sent().await.is_empty());
}

#[tokio::test]
async fn test_webhook_unknown_route() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), false);

    let response = app
        .oneshot(post("/somewhere/else", text_update_json(77)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_requires_header_secret_when_configured() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), true);
    let uri = format!("/webhook/{PATH_SECRET}");

    let missing = app
        .clone()
        .oneshot(post(&uri, text_update_json(77)))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::FORBIDDEN);

    let mut wrong = post(&uri, text_update_json(77));
    wrong
        .headers_mut()
        .insert(SECRET_TOKEN_HEADER, "nope".parse().unwrap());
    let wrong = app.clone().oneshot(wrong).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
    assert!(bot.sent().await.is_empty());

    let mut right = post(&uri, text_update_json(77));
    right
        .headers_mut()
        .insert(SECRET_TOKEN_HEADER, HEADER_SECRET.parse().unwrap());
    let right = app.oneshot(right).await.unwrap();
    assert_eq!(right.status(), StatusCode::OK);
    assert_eq!(bot.sent().await.len(), 1);
}

#[tokio::test]
async fn test_webhook_malformed_update() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new());
    let app = build_test_router(&bot, tmp.path(), false);

    let response = app
        .oneshot(post(
            &format!("/webhook/{PATH_SECRET}"),
            "{\"not\": \"an update\"".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["ok"], false);
    assert!(bot.sent().await.is_empty());
}

#[tokio::test]
async fn test_webhook_ok_even_when_archive_is_invalid() {
    let tmp = tempfile::tempdir().unwrap();
    let bot = Arc::new(MockBot::new().with_file("junk", b"not a zip".to_vec()));
    let app = build_test_router(&bot, tmp.path(), false);

    let update = serde_json::json!({
        "update_id": 2,
        "message": {
            "message_id": 11,
            "chat": { "id": 5 },
            "document": { "file_id": "junk", "file_name": "junk.zip", "file_size": 9 }
        }
    });

    let response = app
        .oneshot(post(&format!("/webhook/{PATH_SECRET}"), update.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ok"], true);
    assert_eq!(bot.messages().await.len(), 1);
    assert!(is_empty_dir(tmp.path()));
}

#[tokio::test]
async fn test_webhook_delivers_document() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = build_zip(&[("story.fb2", b"<FictionBook/>")]);
    let size = archive.len();
    let bot = Arc::new(MockBot::new().with_file("book", archive));
    let handler = UpdateHandler::new(bot.clone(), extract_config(tmp.path()));
    let app = build_test_router(&bot, tmp.path(), false);

    let update = serde_json::json!({
        "update_id": 3,
        "message": {
            "message_id": 12,
            "chat": { "id": 9 },
            "document": { "file_id": "book", "file_name": "story.zip", "file_size": size }
        }
    });

    let response = app
        .oneshot(post(&format!("/webhook/{PATH_SECRET}"), update.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let documents = bot.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].file_name, "story.fb2");

    // Same update through the handler directly reports the branch taken
    let update = serde_json::from_value(update).unwrap();
    assert_eq!(handler.handle(update).await, Outcome::Delivered);
    assert!(is_empty_dir(tmp.path()));
}
