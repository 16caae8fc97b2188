//! Exercise the HTTP fieldbus surface the way a supervisor client would:
//! read the tree, write assignment inputs, watch the published state move.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

use liftcell_core::{Cell, CellConfig};
use liftcell_server::http::{router, AppState};

fn test_app() -> (Router, Arc<Mutex<Cell>>) {
    let cell = Arc::new(Mutex::new(
        Cell::new(CellConfig::default(), Instant::now()).unwrap(),
    ));
    (router(AppState { cell: cell.clone() }), cell)
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), 256 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn status_reports_both_stations() {
    let (app, _) = test_app();
    let res = app
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["station_count"], 2);
    assert_eq!(json["lifts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn variables_round_trip_through_the_wire() {
    let (app, _) = test_app();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/vars/EcoToPlc/xWatchDog")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, serde_json::json!({ "Bool": false }));

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/vars/EcoToPlc/Elevator1/Elevator1EcoSystAssignment/iTaskType")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"I64":2}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/vars/EcoToPlc/Elevator1/Elevator1EcoSystAssignment/iTaskType")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(res).await, serde_json::json!({ "I64": 2 }));
}

#[tokio::test]
async fn bad_writes_are_rejected_with_useful_codes() {
    let (app, _) = test_app();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/vars/EcoToPlc/NoSuchVariable")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"I64":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/vars/EcoToPlc/xWatchDog")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"I64":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn published_state_moves_with_the_tick_loop() {
    let (app, cell) = test_app();

    {
        let mut cell = cell.lock().await;
        let mut now = Instant::now();
        for _ in 0..3 {
            now += cell.config().tick_period();
            cell.tick(now).unwrap();
        }
    }

    let res = app
        .oneshot(
            Request::builder()
                .uri("/vars/PlcToEco/StationData/1/iCycle")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(res).await, serde_json::json!({ "I32": 10 }));
}
