#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sunburst::app::{router, AppState};
use sunburst::downloader::{to_data_url, XLSX_CONTENT_TYPE};
use sunburst::ingest::Pipeline;
use sunburst::saving::{MemoryStore, NoStore};
use sunburst::DEFAULT_DATASET;

fn app_with_default() -> Router {
    let pipeline = Pipeline::new(
        Arc::new(MemoryStore::new()),
        Some(DEFAULT_DATASET.to_vec()),
    );
    router(Arc::new(AppState::new(pipeline)))
}

async fn post_figure(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/figure")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_default_figure_without_upload() {
    let (status, body) = post_figure(app_with_default(), json!({ "contents": null })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["origin"], "default");
    assert_eq!(body["figure"]["data"][0]["ids"][0], "Electronics - Computers - Laptops");
    assert_eq!(body["figure"]["data"][0]["ids"].as_array().unwrap().len(), 20);
    assert!(body["download_href"]
        .as_str()
        .unwrap()
        .starts_with(&format!("data:{};base64,", XLSX_CONTENT_TYPE)));
    println!("✓ Default chart and download link served");
}

#[tokio::test]
async fn test_upload_then_stored_figure() {
    let app = app_with_default();
    let contents = to_data_url("text/csv", b"a,b,c,d\nA,B,C,10\nA,B,D,5\n");

    let (status, body) = post_figure(app.clone(), json!({ "contents": contents })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "upload");
    assert_eq!(body["download_href"], "");
    let trace = &body["figure"]["data"][0];
    assert_eq!(trace["ids"], json!(["A - B - C", "A - B - D"]));
    assert_eq!(trace["parents"], json!(["A - B", "A - B"]));
    assert_eq!(trace["labels"], json!(["C", "D"]));
    assert_eq!(trace["values"], json!([10.0, 5.0]));

    let (_, body) = post_figure(app, json!({})).await;
    assert_eq!(body["origin"], "stored");
    assert_eq!(body["figure"]["data"][0]["ids"], json!(["A - B - C", "A - B - D"]));
    println!("✓ Upload persisted and replayed on the next request");
}

#[tokio::test]
async fn test_errors_are_reported_verbatim() {
    let contents = to_data_url("text/csv", b"a,b,c\nA,B,C\n");
    let (status, body) = post_figure(app_with_default(), json!({ "contents": contents })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "The spreadsheet needs at least 4 columns: MainClass, SubClass, SubSubClass and Value."
    );
    assert!(body["figure"].is_null());

    let (status, body) =
        post_figure(app_with_default(), json!({ "contents": "garbage" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("data URL"));
    println!("✓ Structural errors returned as messages");
}

#[tokio::test]
async fn test_empty_prompt_without_any_data() {
    let pipeline = Pipeline::new(Arc::new(NoStore), None);
    let app = router(Arc::new(AppState::new(pipeline)));

    let (status, body) = post_figure(app, json!({ "contents": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "empty");
    assert!(body["prompt"].as_str().unwrap().starts_with("Upload an Excel file"));
    assert_eq!(body["figure"]["data"][0]["ids"], json!([]));
    println!("✓ Upload prompt when there is nothing to show");
}

#[tokio::test]
async fn test_multipart_upload() {
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
         Content-Type: text/csv\r\n\r\na,b,c,d\nX,Y,Z,3\n\r\n--{b}--\r\n",
        b = boundary
    );

    let response = app_with_default()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["origin"], "upload");
    assert_eq!(body["figure"]["data"][0]["ids"], json!(["X - Y - Z"]));
    println!("✓ Multipart upload handled");
}

#[tokio::test]
async fn test_default_workbook_download() {
    let response = app_with_default()
        .oneshot(
            Request::builder()
                .uri("/api/default.xlsx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("default_data.xlsx"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
    println!("✓ Default workbook downloadable");
}

#[tokio::test]
async fn test_png_preview_and_landing_page() {
    let app = app_with_default();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sunburst.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Interactive Sunburst Chart"));
    println!("✓ PNG preview and landing page served");
}

#[tokio::test]
async fn test_mislabelled_upload_rejected_over_http() {
    let app = app_with_default();
    let good = to_data_url("text/csv", b"a,b,c,d\nA,B,C,10\n");
    let (status, _) = post_figure(app.clone(), json!({ "contents": good })).await;
    assert_eq!(status, StatusCode::OK);

    let text_as_xlsx = to_data_url(XLSX_CONTENT_TYPE, b"just some words");
    let (status, body) = post_figure(app.clone(), json!({ "contents": text_as_xlsx })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");

    let (_, body) = post_figure(app.clone(), json!({})).await;
    assert_eq!(body["origin"], "stored");
    assert_eq!(body["figure"]["data"][0]["ids"], json!(["A - B - C"]));

    let response = app
        .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    println!("✓ Mislabelled upload rejected, stored chart unchanged");
}
