use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_conversions_newest_first(ctx: &TestContext) {
    let first = ctx.convert("The first conversion.").await;
    let second = ctx.convert("The second conversion.").await;

    let response = ctx.client.get("/api/history").await.unwrap();
    response.assert_status(StatusCode::OK);

    let items = response.field("items").as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], second.as_str());
    assert_eq!(items[1]["id"], first.as_str());
    assert_eq!(items[0]["content_preview"], "The second conversion.");
    assert_eq!(items[0]["input_type"], "paste");
    assert_eq!(items[0]["audio_url"], format!("/api/audio/{}", second).as_str());
    assert_eq!(response.field("page"), 1);
    assert_eq!(response.field("has_more"), false);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_search_history_text(ctx: &TestContext) {
    ctx.convert("Notes about the garden.").await;
    ctx.convert("Minutes of the budget meeting.").await;

    let response = ctx.client.get("/api/history?q=BUDGET").await.unwrap();
    response.assert_status(StatusCode::OK);

    let items = response.field("items").as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["content_preview"], "Minutes of the budget meeting.");

    let none = ctx.client.get("/api/history?q=zebra").await.unwrap();
    assert!(none.field("items").as_array().unwrap().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_filter_history_by_date(ctx: &TestContext) {
    ctx.convert("Written today.").await;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();

    let response = ctx
        .client
        .get(&format!("/api/history?from={}&to={}", today, today))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.field("items").as_array().unwrap().len(), 1);

    let past = ctx
        .client
        .get("/api/history?from=2001-01-01&to=2001-12-31")
        .await
        .unwrap();
    assert!(past.field("items").as_array().unwrap().is_empty());

    ctx.client
        .get("/api/history?from=yesterday")
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid date");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_paginate_history(ctx: &TestContext) {
    let mut jobs = Vec::new();
    for i in 0..21 {
        jobs.push(ctx.start_conversion(&format!("Conversion number {}.", i)).await);
    }
    for job_id in &jobs {
        let status = ctx.wait_for_job(job_id).await;
        assert_eq!(status["status"], "completed");
    }

    let first = ctx.client.get("/api/history").await.unwrap();
    assert_eq!(first.field("items").as_array().unwrap().len(), 20);
    assert_eq!(first.field("per_page"), 20);
    assert_eq!(first.field("has_more"), true);

    let second = ctx.client.get("/api/history?page=2").await.unwrap();
    assert_eq!(second.field("items").as_array().unwrap().len(), 1);
    assert_eq!(second.field("page"), 2);
    assert_eq!(second.field("has_more"), false);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_show_full_text_in_detail(ctx: &TestContext) {
    let id = ctx.convert("**Bold** claims need evidence.").await;

    let response = ctx.client.get(&format!("/api/history/{}", id)).await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.field("full_text"), "Bold claims need evidence.");
    assert_eq!(response.field("title"), "Bold claims need evidence.");
    assert_eq!(response.field("voice"), "af_alloy");
    assert!(response.body.as_ref().unwrap().get("original_filename").is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_delete_entry_and_audio(ctx: &TestContext) {
    let id = ctx.convert("Delete me soon.").await;
    assert!(ctx.storage.current_usage().await > 0);

    ctx.client
        .delete(&format!("/api/history/{}", id))
        .await
        .unwrap()
        .assert_status(StatusCode::NO_CONTENT);

    ctx.client
        .get(&format!("/api/history/{}", id))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("Conversion not found");
    ctx.client
        .get(&format!("/api/audio/{}", id))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(ctx.storage.current_usage().await, 0);

    ctx.client
        .delete(&format!("/api/history/{}", id))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_ids(ctx: &TestContext) {
    let response = ctx.client.get("/api/history/not-a-uuid").await.unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}
