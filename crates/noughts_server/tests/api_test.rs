//! End-to-end tests of the HTTP router.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use noughts_server::{
    AppState, Collaborators, DbPersister, GameRepository, LogNotifier, Persister, QuoteClient,
    Session, router, spawn_finish_worker,
};

struct TestApp {
    _db: NamedTempFile,
    repo: GameRepository,
    app: Router,
}

fn setup_app() -> TestApp {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db.path().to_str().expect("Invalid path").to_string();
    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");

    let persisters: Vec<Arc<dyn Persister>> = vec![Arc::new(DbPersister::new(repo.clone()))];
    let collaborators = Collaborators::new(Arc::new(LogNotifier), persisters);
    let (sink, _worker) = spawn_finish_worker(collaborators);
    let session = Arc::new(Session::new(sink));
    // Nothing listens on the discard port.
    let quotes = QuoteClient::new("http://127.0.0.1:9/".to_string()).expect("Client failed");

    TestApp {
        _db: db,
        repo: repo.clone(),
        app: router(AppState::new(session, repo, quotes)),
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Router failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn join_both(app: &Router) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/join",
        Some(json!({"identity": "ann@example.com", "name": "Ann"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"symbol": "X"}));

    let (status, body) = send(
        app,
        Method::POST,
        "/api/join",
        Some(json!({"email": "bob@example.com", "nick": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"symbol": "O"}));
}

async fn play(app: &Router, symbol: &str, pos: usize) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/move",
        Some(json!({"symbol": symbol, "pos": pos})),
    )
    .await
}

#[tokio::test]
async fn test_state_before_join() {
    let t = setup_app();
    let (status, body) = send(&t.app, Method::GET, "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"started": false, "players": 0}));
}

#[tokio::test]
async fn test_join_rejects_missing_fields_and_third_player() {
    let t = setup_app();

    let (status, _) = send(&t.app, Method::POST, "/api/join", Some(json!({"name": "Ann"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, Method::POST, "/api/join", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    join_both(&t.app).await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/join",
        Some(json!({"identity": "eve@example.com", "name": "Eve"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "full"}));
}

#[tokio::test]
async fn test_move_before_start() {
    let t = setup_app();
    let (status, body) = play(&t.app, "X", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "not started"}));
}

#[tokio::test]
async fn test_rejected_moves_carry_reason() {
    let t = setup_app();
    join_both(&t.app).await;

    let (status, body) = play(&t.app, "O", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"ok": false, "error": "move rejected", "reason": "wrong_turn"})
    );

    let (status, body) = play(&t.app, "X", 9).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "out_of_bounds");

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/move",
        Some(json!({"symbol": "Z", "position": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);

    let (status, _) = play(&t.app, "X", 0).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = play(&t.app, "O", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "occupied");
}

#[tokio::test]
async fn test_full_match_is_persisted() {
    let t = setup_app();
    join_both(&t.app).await;

    for (symbol, pos) in [("X", 0), ("O", 3), ("X", 1), ("O", 4)] {
        let (status, body) = play(&t.app, symbol, pos).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["over"], false);
    }

    let (status, body) = play(&t.app, "X", 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "ok": true,
            "board": ["X", "X", "X", "O", "O", " ", " ", " ", " "],
            "turn": "X",
            "over": true,
            "winner": "X",
        })
    );

    let (_, state) = send(&t.app, Method::GET, "/api/state", None).await;
    assert_eq!(state["started"], true);
    assert_eq!(state["over"], true);
    assert_eq!(state["winner"], "X");
    assert_eq!(state["nicks"], json!({"X": "Ann", "O": "Bob"}));

    let (status, body) = play(&t.app, "O", 5).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "finished");

    // Persistence runs in the background; wait for the record to land.
    let mut stored = None;
    for _ in 0..50 {
        let repo = t.repo.clone();
        let page = tokio::task::spawn_blocking(move || repo.list_games(1, 10))
            .await
            .expect("Task failed")
            .expect("List failed");
        if let Some(record) = page.records().first() {
            stored = Some(record.clone());
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let stored = stored.expect("Finished match was not persisted");
    assert_eq!(stored.winner().as_deref(), Some("X"));
    assert_eq!(stored.player_o_nick(), "Bob");
}

#[tokio::test]
async fn test_reset_clears_session() {
    let t = setup_app();
    join_both(&t.app).await;
    play(&t.app, "X", 4).await;

    let (status, body) = send(&t.app, Method::POST, "/api/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (_, state) = send(&t.app, Method::GET, "/api/state", None).await;
    assert_eq!(state, json!({"started": false, "players": 0}));
}

#[tokio::test]
async fn test_record_crud() {
    let t = setup_app();

    let (status, created) = send(
        &t.app,
        Method::POST,
        "/api/games",
        Some(json!({
            "player_x_email": "ann@example.com",
            "player_x_nick": "Ann",
            "player_o_email": "bob@example.com",
            "player_o_nick": "Bob",
            "winner": "DRAW",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["winner"], "DRAW");
    assert_eq!(created["status"], "completed");
    assert_eq!(created["player_x"], json!({"email": "ann@example.com", "nick": "Ann"}));
    let id = created["id"].as_i64().expect("id missing");

    let (status, fetched) = send(&t.app, Method::GET, &format!("/api/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["board"], json!([" ", " ", " ", " ", " ", " ", " ", " ", " "]));

    let (status, updated) = send(
        &t.app,
        Method::PUT,
        &format!("/api/games/{id}"),
        Some(json!({"winner": "O"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["winner"], "O");

    let (status, page) = send(&t.app, Method::GET, "/api/games?page=1&per_page=500", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["per_page"], 100);
    assert_eq!(page["pages"], 1);
    assert_eq!(page["games"].as_array().map(Vec::len), Some(1));

    let (status, stats) = send(&t.app, Method::GET, "/api/games/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({"total": 1, "x_wins": 0, "o_wins": 1, "draws": 0, "completed": 1})
    );

    let (status, _) = send(&t.app, Method::DELETE, &format!("/api/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, Method::GET, &format!("/api/games/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_page_far_past_the_end() {
    let t = setup_app();
    let uri = format!("/api/games?page={}&per_page=100", i64::MAX);
    let (status, page) = send(&t.app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["games"], json!([]));
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_unreachable_store_is_service_unavailable() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("no_such_dir").join("games.db");
    let repo = GameRepository::new(missing.to_string_lossy().into_owned())
        .expect("Failed to create repository");
    let (sink, _worker) = spawn_finish_worker(Collaborators::new(Arc::new(LogNotifier), vec![]));
    let quotes = QuoteClient::new("http://127.0.0.1:9/".to_string()).expect("Client failed");
    let app = router(AppState::new(Arc::new(Session::new(sink)), repo, quotes));

    let (status, body) = send(&app, Method::GET, "/api/games", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_record_requires_players() {
    let t = setup_app();
    let (status, _) = send(
        &t.app,
        Method::POST,
        "/api/games",
        Some(json!({
            "player_x_email": "",
            "player_x_nick": "Ann",
            "player_o_email": "bob@example.com",
            "player_o_nick": "Bob",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_upstream_failure_is_bad_gateway() {
    let t = setup_app();
    let (status, body) = send(&t.app, Method::GET, "/api/quote", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}
