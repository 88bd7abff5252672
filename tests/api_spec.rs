use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{FixedOffset, NaiveDate};
use missionlog::api::{create_router, AppState};
use missionlog_core::{Clock, Database, FixedClock, StatsConfig};
use serde_json::{json, Value};

const USER: HeaderName = HeaderName::from_static("x-user-id");

fn alice() -> HeaderValue {
    HeaderValue::from_static("alice")
}

fn bob() -> HeaderValue {
    HeaderValue::from_static("bob")
}

fn server() -> TestServer {
    let db = Database::open_memory().expect("Failed to create test database");
    db.migrate().expect("Failed to migrate");
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_day(
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        FixedOffset::east_opt(0).unwrap(),
    ));
    let app = create_router(AppState::new(db, clock, StatsConfig::default()));
    TestServer::new(app).expect("Failed to start test server")
}

async fn create_task(server: &TestServer, body: Value) -> Value {
    let response = server
        .post("/api/tasks")
        .add_header(USER, alice())
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn health_needs_no_identity() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let server = server();
    let response = server.get("/api/tasks").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "unauthorized");
}

#[tokio::test]
async fn create_then_list_for_day() {
    let server = server();
    let parent = create_task(&server, json!({ "title": "Morning routine" })).await;
    let parent_id = parent["id"].as_str().unwrap().to_string();
    create_task(&server, json!({ "title": "Water", "parent_id": parent_id })).await;

    let response = server
        .get("/api/tasks")
        .add_query_param("date", "2025-03-10")
        .add_header(USER, alice())
        .await;

    response.assert_status_ok();
    let missions = response.json::<Value>();
    let missions = missions.as_array().unwrap();
    assert_eq!(missions.len(), 1);
    assert_eq!(missions[0]["title"], "Morning routine");
    assert_eq!(missions[0]["kind"], "DAILY");
    assert_eq!(missions[0]["current_state"], "NOT_STARTED");
    assert_eq!(missions[0]["date"], "2025-03-10");
    assert_eq!(missions[0]["subtasks"][0]["title"], "Water");
}

#[tokio::test]
async fn set_state_cascades_to_the_parent() {
    let server = server();
    let parent = create_task(&server, json!({ "title": "Routine" })).await;
    let parent_id = parent["id"].as_str().unwrap().to_string();
    let sub = create_task(&server, json!({ "title": "Step", "parent_id": parent_id })).await;
    let sub_id = sub["id"].as_str().unwrap();

    let response = server
        .patch(&format!("/api/tasks/{}/state", sub_id))
        .add_header(USER, alice())
        .json(&json!({ "state": "COMPLETED", "date": "2025-03-10" }))
        .await;
    response.assert_status_ok();
    let change = response.json::<Value>();
    assert_eq!(change["state"], "COMPLETED");
    assert_eq!(change["cascaded_parent"], parent_id.as_str());

    let response = server
        .get(&format!("/api/tasks/{}/state", parent_id))
        .add_query_param("date", "2025-03-10")
        .add_header(USER, alice())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["state"], "COMPLETED");
}

#[tokio::test]
async fn bad_state_and_bad_date_are_bad_requests() {
    let server = server();
    let task = create_task(&server, json!({ "title": "Walk" })).await;
    let path = format!("/api/tasks/{}/state", task["id"].as_str().unwrap());

    let response = server
        .patch(&path)
        .add_header(USER, alice())
        .json(&json!({ "state": "DONE" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "invalid_input");

    let response = server
        .patch(&path)
        .add_header(USER, alice())
        .json(&json!({ "state": "COMPLETED", "date": "03/10/2025" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_users_tasks_are_not_found() {
    let server = server();
    let task = create_task(&server, json!({ "title": "Private" })).await;
    let id = task["id"].as_str().unwrap();

    let response = server
        .patch(&format!("/api/tasks/{}/state", id))
        .add_header(USER, bob())
        .json(&json!({ "state": "COMPLETED" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .delete(&format!("/api/tasks/{}", id))
        .add_header(USER, bob())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reorder_with_foreign_task_is_forbidden() {
    let server = server();
    let mine = create_task(&server, json!({ "title": "Mine" })).await;
    let theirs = server
        .post("/api/tasks")
        .add_header(USER, bob())
        .json(&json!({ "title": "Theirs" }))
        .await
        .json::<Value>();

    let response = server
        .patch("/api/tasks/order")
        .add_header(USER, alice())
        .json(&json!([
            { "task_id": mine["id"], "order": 3 },
            { "task_id": theirs["id"], "order": 4 },
        ]))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stats_report_days_and_streaks() {
    let server = server();
    let task = create_task(&server, json!({ "title": "Read" })).await;
    let path = format!("/api/tasks/{}/state", task["id"].as_str().unwrap());
    for day in ["2025-03-09", "2025-03-10"] {
        server
            .patch(&path)
            .add_header(USER, alice())
            .json(&json!({ "state": "COMPLETED", "date": day }))
            .await
            .assert_status_ok();
    }

    let response = server
        .get("/api/stats")
        .add_query_param("start", "2025-03-08")
        .add_query_param("end", "2025-03-10")
        .add_header(USER, alice())
        .await;
    response.assert_status_ok();
    let stats = response.json::<Value>();

    assert_eq!(stats["range"], json!({ "start": "2025-03-08", "end": "2025-03-10" }));
    assert_eq!(stats["daily_breakdown"].as_array().unwrap().len(), 3);
    assert_eq!(stats["daily_breakdown"][2]["status"], "FLAWLESS");
    assert_eq!(stats["streaks"], json!({ "current": 2, "best": 2 }));
    assert_eq!(stats["day_stats"], json!({ "good": 0, "flawless": 2, "total": 3 }));

    let response = server
        .get("/api/stats")
        .add_query_param("start", "2025-03-10")
        .add_query_param("end", "2025-03-01")
        .add_header(USER, alice())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_one_time_and_cancel_daily() {
    let server = server();
    let daily = create_task(&server, json!({ "title": "Daily" })).await;
    let once = create_task(
        &server,
        json!({ "title": "Once", "kind": "ONE_TIME", "due_date": "2025-03-10" }),
    )
    .await;

    for task in [&daily, &once] {
        server
            .delete(&format!("/api/tasks/{}", task["id"].as_str().unwrap()))
            .add_header(USER, alice())
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let missions = server
        .get("/api/tasks")
        .add_header(USER, alice())
        .await
        .json::<Value>();
    assert!(missions.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn focus_list_round_trip() {
    let server = server();
    let task = create_task(&server, json!({ "title": "Deep work" })).await;
    let id = task["id"].as_str().unwrap().to_string();

    server
        .post("/api/focus")
        .add_header(USER, alice())
        .json(&json!({ "task_id": id }))
        .await
        .assert_status(StatusCode::CREATED);

    let items = server
        .get("/api/focus")
        .add_header(USER, alice())
        .await
        .json::<Value>();
    assert_eq!(items[0]["task_id"], id.as_str());
    assert_eq!(items[0]["current_state"], "NOT_STARTED");

    server
        .delete(&format!("/api/focus/{}", id))
        .add_header(USER, alice())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&format!("/api/focus/{}", id))
        .add_header(USER, alice())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_are_seeded() {
    let server = server();
    let response = server.get("/api/categories").add_header(USER, alice()).await;
    response.assert_status_ok();

    let names: Vec<String> = response
        .json::<Vec<Value>>()
        .iter()
        .map(|category| category["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["MAIN", "MORNING", "FOOD", "BOOKS", "COURSES"]);
}

#[tokio::test]
async fn concurrent_writes_for_one_day_keep_one_state() {
    let server = server();
    let task = create_task(&server, json!({ "title": "Stretch" })).await;
    let path = format!("/api/tasks/{}/state", task["id"].as_str().unwrap());

    let (first, second) = tokio::join!(
        server
            .patch(&path)
            .add_header(USER, alice())
            .json(&json!({ "state": "COMPLETED", "date": "2025-03-10" })),
        server
            .patch(&path)
            .add_header(USER, alice())
            .json(&json!({ "state": "SKIPPED", "date": "2025-03-10" })),
    );
    first.assert_status_ok();
    second.assert_status_ok();

    let state = server
        .get(&path)
        .add_query_param("date", "2025-03-10")
        .add_header(USER, alice())
        .await
        .json::<Value>();
    let state = state["state"].as_str().unwrap();
    assert!(state == "COMPLETED" || state == "SKIPPED");
}
