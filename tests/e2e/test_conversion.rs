use crate::e2e::helpers;

use helpers::api_client::FormPart;
use helpers::fake_tts::FRAME_LEN;
use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;
use tinytts_backend::infrastructure::repositories::SynthesisError;

const ARTICLE: &str = "# Weekly notes\n\nThe team shipped the new importer. It handles 50% more files.\n\n- Faster parsing\n- Fewer errors\n\nNext review is on 01/15/2024.";

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_voices_and_speeds(ctx: &TestContext) {
    let response = ctx.client.get("/api/voices").await.unwrap();

    response.assert_status(StatusCode::OK);
    let voices = response.field("voices").as_array().unwrap();
    assert_eq!(voices.len(), 10);
    assert_eq!(response.field("default_voice"), "af_alloy");
    assert_eq!(response.field("default_speed"), 1.0);
    assert_eq!(response.field("speeds").as_array().unwrap().len(), 8);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_convert_text_to_a_completed_job(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/convert", &json!({ "text": ARTICLE, "voice": "am_echo", "speed": 1.25 }))
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    assert_eq!(response.field("content_length"), ARTICLE.chars().count());
    assert!(response.body.as_ref().unwrap().get("warning").is_none());

    let job_id = response.field("job_id").as_str().unwrap().to_string();
    let status = ctx.wait_for_job(&job_id).await;

    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["chunks_done"], status["chunks_total"]);
    assert!(status["chunks_total"].as_u64().unwrap() > 1);
    assert!(status["result_id"].is_string());

    // Every chunk reached the backend normalized, with the requested voice
    let calls = ctx.tts.calls();
    assert_eq!(calls.len() as u64, status["chunks_total"].as_u64().unwrap());
    let spoken: Vec<&str> = calls.iter().map(|(text, _, _)| text.as_str()).collect();
    let spoken = spoken.join(" ");
    assert!(spoken.contains("50 percent"));
    assert!(spoken.contains("January 15th, 2024"));
    assert!(!spoken.contains('#'));
    assert!(calls.iter().all(|(text, voice, speed)| {
        text.chars().count() <= 60 && voice == "am_echo" && *speed == 1.25
    }));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_the_result_and_audio(ctx: &TestContext) {
    let result_id = ctx.convert("Short and sweet.").await;

    let response = ctx
        .client
        .get(&format!("/api/result/{}", result_id))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.field("audio_url"), &json!(format!("/api/audio/{}", result_id)));
    assert_eq!(response.field("audio_size"), FRAME_LEN);
    assert!(response.field("audio_duration").as_f64().unwrap() > 0.0);

    let audio = ctx
        .client
        .get(&format!("/api/audio/{}", result_id))
        .await
        .unwrap();
    audio
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg")
        .assert_header("content-disposition", "inline");
    assert_eq!(audio.body_bytes.len(), FRAME_LEN);

    let download = ctx
        .client
        .get(&format!("/api/audio/{}?download=1", result_id))
        .await
        .unwrap();
    download.assert_status(StatusCode::OK);
    assert!(download
        .header("content-disposition")
        .unwrap()
        .starts_with("attachment; filename=\"tinytts-"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_retry_transient_backend_failures(ctx: &TestContext) {
    ctx.tts
        .fail_next(SynthesisError::RateLimited("slow down".to_string()), 2);

    let job_id = ctx.start_conversion("One sentence only.").await;
    let status = ctx.wait_for_job(&job_id).await;

    assert_eq!(status["status"], "completed");
    assert_eq!(ctx.tts.calls().len(), 3);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_the_job_when_retries_run_out(ctx: &TestContext) {
    ctx.tts
        .fail_next(SynthesisError::Transport("connection refused".to_string()), 3);

    let job_id = ctx.start_conversion("One sentence only.").await;
    let status = ctx.wait_for_job(&job_id).await;

    assert_eq!(status["status"], "failed");
    assert_eq!(status["chunks_done"], 0);
    assert_eq!(status["error"]["kind"], "synthesis");
    assert!(status.get("result_id").is_none());

    let history = ctx.client.get("/api/history").await.unwrap();
    assert_eq!(history.field("items").as_array().unwrap().len(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_input_without_speakable_text(ctx: &TestContext) {
    let job_id = ctx.start_conversion("```\nlet x = 1;\n```").await;
    let status = ctx.wait_for_job(&job_id).await;

    assert_eq!(status["status"], "failed");
    assert_eq!(status["error"]["kind"], "no_speakable_text");
    assert!(ctx.tts.calls().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_requests(ctx: &TestContext) {
    ctx.client
        .post("/api/convert", &json!({ "text": "   " }))
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("No text provided");

    ctx.client
        .post("/api/convert", &json!({ "text": "Hello.", "voice": "robot" }))
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Unknown voice");

    ctx.client
        .post("/api/convert", &json!({ "text": "Hello.", "speed": 9.0 }))
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Speed must be between");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_warn_about_large_inputs(ctx: &TestContext) {
    let text = "A fairly long sentence goes here. ".repeat(20);
    let response = ctx
        .client
        .post("/api/convert", &json!({ "text": text }))
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    assert!(response.field("warning").as_str().unwrap().contains("Large input"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_jobs(ctx: &TestContext) {
    let unknown = uuid::Uuid::new_v4();

    ctx.client
        .get(&format!("/api/status/{}", unknown))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);

    ctx.client
        .post_empty(&format!("/api/cancel/{}", unknown))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_leave_finished_jobs_alone_on_cancel(ctx: &TestContext) {
    let job_id = ctx.start_conversion("Finish quickly.").await;
    ctx.wait_for_job(&job_id).await;

    let response = ctx
        .client
        .post_empty(&format!("/api/cancel/{}", job_id))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.field("status"), "completed");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_convert_an_uploaded_markdown_file(ctx: &TestContext) {
    let response = ctx
        .client
        .post_multipart(
            "/api/convert/upload",
            &[
                FormPart::File {
                    name: "file",
                    filename: "notes.md",
                    content_type: "text/markdown",
                    bytes: b"## Reminder\n\nBuy **milk** and eggs.",
                },
                FormPart::Text("voice", "bm_george"),
                FormPart::Text("speed", "1.5"),
            ],
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    let job_id = response.field("job_id").as_str().unwrap().to_string();
    let status = ctx.wait_for_job(&job_id).await;
    assert_eq!(status["status"], "completed");

    let result_id = status["result_id"].as_str().unwrap();
    let detail = ctx
        .client
        .get(&format!("/api/history/{}", result_id))
        .await
        .unwrap();
    detail.assert_status(StatusCode::OK);
    assert_eq!(detail.field("input_type"), "upload");
    assert_eq!(detail.field("title"), "notes.md");
    assert_eq!(detail.field("voice"), "bm_george");
    assert_eq!(detail.field("speed"), 1.5);
    assert_eq!(detail.field("full_text"), "Reminder\n\nBuy milk and eggs.");

    let download = ctx
        .client
        .get(&format!("/api/audio/{}?download=1", result_id))
        .await
        .unwrap();
    download.assert_header("content-disposition", "attachment; filename=\"notes.mp3\"");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unsupported_uploads(ctx: &TestContext) {
    ctx.client
        .post_multipart(
            "/api/convert/upload",
            &[FormPart::File {
                name: "file",
                filename: "slides.pptx",
                content_type: "application/vnd.ms-powerpoint",
                bytes: b"PK\x03\x04",
            }],
        )
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("unsupported file type");

    ctx.client
        .post_multipart(
            "/api/convert/upload",
            &[FormPart::File {
                name: "file",
                filename: "paper.pdf",
                content_type: "application/pdf",
                bytes: b"%PDF-1.7",
            }],
        )
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("could not read document");

    ctx.client
        .post_multipart("/api/convert/upload", &[FormPart::Text("voice", "af_alloy")])
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("No file uploaded");
}
