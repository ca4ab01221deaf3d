//! E2E HTTP API tests.
//!
//! Each test builds the full router over a fresh in-memory store and drives
//! it with `tower::ServiceExt::oneshot`, one request at a time.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use helpdesk_core::TicketStore;
use helpdesk_core::config::TicketConfig;
use helpdesk_server::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn app() -> Router {
    let store = TicketStore::open_in_memory(TicketConfig::default()).expect("open store");
    build_router(Arc::new(AppState::new(store)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON response body")
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn patch(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

async fn create_ticket(app: &Router, body: Value) -> Value {
    let (status, ticket) = post(app, "/tickets", body).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {ticket}");
    ticket
}

fn id_of(ticket: &Value) -> &str {
    ticket["id"].as_str().expect("ticket id")
}

fn numbers(list: &Value) -> Vec<&str> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|t| t["ticket_number"].as_str().expect("ticket_number"))
        .collect()
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn printer_down_scenario() {
    let app = app();

    let ticket = create_ticket(
        &app,
        json!({"title": "Printer down", "description": "Third floor printer jams"}),
    )
    .await;
    assert_eq!(ticket["ticket_number"], "INF-1001");
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["priority"], "medium");
    assert_eq!(ticket["category"], "General");
    assert_eq!(ticket["assigned_to"], Value::Null);
    assert_eq!(ticket["is_deleted"], false);
    let id = id_of(&ticket).to_string();

    let (status, updated) = patch(
        &app,
        &format!("/tickets/{id}"),
        json!({"status": "in_progress", "performed_by": "dana"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");

    let (status, comment) = post(
        &app,
        "/comments",
        json!({"ticket_id": id.as_str(), "author": "sam", "content": "Ordered a new fuser"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["ticket_id"], id.as_str());
    assert_eq!(comment["author"], "sam");

    let (status, details) = get(&app, &format!("/tickets/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["ticket"]["status"], "in_progress");
    assert_eq!(details["comments"].as_array().map(Vec::len), Some(1));

    let logs = details["activityLogs"].as_array().expect("activityLogs");
    let actions: Vec<_> = logs.iter().map(|e| e["action"].as_str().unwrap()).collect();
    assert_eq!(actions, vec!["comment_added", "status_changed", "ticket_created"]);
    assert_eq!(logs[0]["new_value"], "Comment by sam");
    assert_eq!(logs[1]["old_value"], "open");
    assert_eq!(logs[1]["new_value"], "in_progress");
    assert_eq!(logs[1]["performed_by"], "dana");
    assert_eq!(logs[2]["performed_by"], "System");

    let (status, stats) = get(&app, "/tickets/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["total"].as_u64().unwrap() >= 1);
    assert!(stats["in_progress"].as_u64().unwrap() >= 1);
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_requires_title_and_description() {
    let app = app();

    for body in [
        json!({"description": "no title"}),
        json!({"title": "no description"}),
        json!({"title": "   ", "description": "blank title"}),
        json!({"title": "", "description": ""}),
    ] {
        let (status, err) = post(&app, "/tickets", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Title and description are required");
        assert_eq!(err["code"], "E2002");
    }

    let (_, list) = get(&app, "/tickets").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn create_rejects_unknown_priority() {
    let app = app();
    let (status, err) = post(
        &app,
        "/tickets",
        json!({"title": "t", "description": "d", "priority": "critical"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "E2005");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tickets")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn numbers_increase_without_gaps() {
    let app = app();
    for i in 0..5 {
        create_ticket(&app, json!({"title": format!("t{i}"), "description": "d"})).await;
    }
    let (_, list) = get(&app, "/tickets").await;
    assert_eq!(
        numbers(&list),
        vec!["INF-1005", "INF-1004", "INF-1003", "INF-1002", "INF-1001"]
    );
}

#[tokio::test]
async fn list_filters_and_all_keyword() {
    let app = app();
    create_ticket(
        &app,
        json!({"title": "VPN", "description": "d", "category": "Network", "priority": "high"}),
    )
    .await;
    create_ticket(
        &app,
        json!({"title": "Mouse", "description": "d", "category": "Hardware", "priority": "low"}),
    )
    .await;

    let (status, list) = get(&app, "/tickets?category=Network").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&list), vec!["INF-1001"]);

    let (_, list) = get(&app, "/tickets?priority=low&status=open").await;
    assert_eq!(numbers(&list), vec!["INF-1002"]);

    let (_, list) = get(&app, "/tickets?status=all&priority=all&category=all").await;
    assert_eq!(list.as_array().map(Vec::len), Some(2));

    let (_, list) = get(&app, "/tickets?status=closed").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn unknown_filter_value_is_rejected() {
    let app = app();
    let (status, err) = get(&app, "/tickets?status=pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "E2005");
}

#[tokio::test]
async fn unknown_ticket_is_404() {
    let app = app();
    let (status, err) = get(&app, "/tickets/00000000-0000-4000-8000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "E2001");

    let (status, _) = get(&app, "/tickets/INF-1001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = patch(&app, "/tickets/nope", json!({"status": "closed"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_logs_changes_in_fixed_order() {
    let app = app();
    let ticket = create_ticket(&app, json!({"title": "t", "description": "d"})).await;
    let id = id_of(&ticket);

    let (status, updated) = patch(
        &app,
        &format!("/tickets/{id}"),
        json!({
            "is_deleted": true,
            "assigned_to": "sam",
            "priority": "urgent",
            "status": "resolved"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["assigned_to"], "sam");
    assert_eq!(updated["is_deleted"], true);

    let (_, details) = get(&app, &format!("/tickets/{id}")).await;
    let actions: Vec<_> = details["activityLogs"]
        .as_array()
        .unwrap()
        .iter()
        .rev()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        vec![
            "ticket_created",
            "status_changed",
            "priority_changed",
            "assigned",
            "ticket_deleted"
        ]
    );
    assert!(
        details["activityLogs"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["action"] != "ticket_created")
            .all(|e| e["performed_by"] == "Admin")
    );
}

#[tokio::test]
async fn patch_with_same_values_logs_nothing() {
    let app = app();
    let ticket = create_ticket(&app, json!({"title": "t", "description": "d"})).await;
    let id = id_of(&ticket);

    let (status, same) = patch(
        &app,
        &format!("/tickets/{id}"),
        json!({"status": "open", "priority": "medium", "assigned_to": null}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(same["updated_at"], ticket["updated_at"]);

    let (_, details) = get(&app, &format!("/tickets/{id}")).await;
    assert_eq!(details["activityLogs"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn patch_rejects_unknown_status_without_writing() {
    let app = app();
    let ticket = create_ticket(&app, json!({"title": "t", "description": "d"})).await;
    let id = id_of(&ticket);

    let (status, _) = patch(
        &app,
        &format!("/tickets/{id}"),
        json!({"status": "pending", "priority": "high"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, details) = get(&app, &format!("/tickets/{id}")).await;
    assert_eq!(details["ticket"]["priority"], "medium");
    assert_eq!(details["activityLogs"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unassign_with_null() {
    let app = app();
    let ticket = create_ticket(&app, json!({"title": "t", "description": "d"})).await;
    let uri = format!("/tickets/{}", id_of(&ticket));

    patch(&app, &uri, json!({"assigned_to": "sam"})).await;
    let (status, updated) = patch(&app, &uri, json!({"assigned_to": null})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["assigned_to"], Value::Null);

    let (_, details) = get(&app, &uri).await;
    let latest = &details["activityLogs"][0];
    assert_eq!(latest["action"], "assigned");
    assert_eq!(latest["old_value"], "sam");
    assert_eq!(latest["new_value"], Value::Null);
}

#[tokio::test]
async fn soft_delete_hides_from_list_and_stats() {
    let app = app();
    create_ticket(&app, json!({"title": "keep", "description": "d"})).await;
    let gone = create_ticket(&app, json!({"title": "gone", "description": "d", "priority": "urgent"})).await;
    let uri = format!("/tickets/{}", id_of(&gone));

    patch(&app, &uri, json!({"is_deleted": true})).await;

    let (_, list) = get(&app, "/tickets").await;
    assert_eq!(numbers(&list), vec!["INF-1001"]);
    let (_, stats) = get(&app, "/tickets/stats").await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["high_priority"], 0);

    let (status, details) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["ticket"]["is_deleted"], true);

    patch(&app, &uri, json!({"is_deleted": false})).await;
    let (_, stats) = get(&app, "/tickets/stats").await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["high_priority"], 1);
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comment_on_unknown_ticket_is_404() {
    let app = app();
    let (status, err) = post(
        &app,
        "/comments",
        json!({
            "ticket_id": "00000000-0000-4000-8000-000000000000",
            "author": "sam",
            "content": "hello"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "E2001");
}

#[tokio::test]
async fn comment_requires_all_fields() {
    let app = app();
    let ticket = create_ticket(&app, json!({"title": "t", "description": "d"})).await;

    let (status, err) = post(
        &app,
        "/comments",
        json!({"ticket_id": id_of(&ticket), "author": "sam"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Ticket ID, author, and content are required");
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn routes_are_also_served_under_api_prefix() {
    let app = app();
    let (status, ticket) = post(
        &app,
        "/api/tickets",
        json!({"title": "t", "description": "d"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = get(&app, "/api/tickets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&list), vec!["INF-1001"]);

    let (status, _) = get(&app, &format!("/api/tickets/{}", id_of(&ticket))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, stats) = get(&app, "/api/tickets/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
