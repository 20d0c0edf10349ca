use std::time::Duration;

use pretty_assertions::assert_eq;
use prioritizer_engine::{
    ApiSettings, FailureKind, ReqwestStoryApi, StoryApi, StoryRequest,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestStoryApi {
    ReqwestStoryApi::new(&ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .unwrap()
}

fn stories_body() -> serde_json::Value {
    json!({
        "stories_with_epics": [
            {"epic": "E1", "user_story": "S1", "description": "D1"},
            {"epic": "E2", "user_story": "S2", "description": "D2"},
        ]
    })
}

#[tokio::test]
async fn generate_posts_json_and_returns_stories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-user-stories"))
        .and(body_json(json!({
            "vision": "Track parcels",
            "mvp": "Scan and list",
            "model": "gpt-4o-mini",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories_body()))
        .mount(&server)
        .await;

    let rows = api_for(&server)
        .call(&StoryRequest::Generate {
            vision: "Track parcels".into(),
            mvp: "Scan and list".into(),
            model: "gpt-4o-mini".into(),
        })
        .await
        .expect("generate ok");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["user_story"], "S1");
    assert_eq!(rows[1]["epic"], "E2");
}

#[tokio::test]
async fn csv_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("epic,user_story"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories_body()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("stories.csv");
    std::fs::write(&csv, "epic,user_story\nE1,S1\n").unwrap();

    let rows = api_for(&server)
        .call(&StoryRequest::UploadCsv { file: csv })
        .await
        .expect("upload ok");
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn file_generation_sends_both_files_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-user-stories-by-files"))
        .and(body_string_contains("name=\"vision_file\""))
        .and(body_string_contains("name=\"mvp_file\""))
        .and(body_string_contains("name=\"model\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(stories_body()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let vision = dir.path().join("vision.txt");
    let mvp = dir.path().join("mvp.txt");
    std::fs::write(&vision, "A parcel tracker").unwrap();
    std::fs::write(&mvp, "Scan parcels").unwrap();

    let rows = api_for(&server)
        .call(&StoryRequest::GenerateFromFiles {
            vision_file: vision,
            mvp_file: mvp,
            model: "gpt-4o".into(),
        })
        .await
        .expect("files ok");
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn missing_upload_file_is_io_failure() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let err = api_for(&server)
        .call(&StoryRequest::UploadCsv {
            file: dir.path().join("absent.csv"),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn quality_check_sends_framework_and_stories() {
    let server = MockServer::start().await;
    let story = json!({"epic": "E1", "user_story": "S1", "key": 0});
    Mock::given(method("POST"))
        .and(path("/api/check-user-stories-quality"))
        .and(body_json(json!({
            "framework": "INVEST framework",
            "stories": [story.clone()],
            "model": "gpt-4o-mini",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stories_with_epics": [{"user_story": "S1", "compliance": "Yes", "issues": []}]
        })))
        .mount(&server)
        .await;

    let rows = api_for(&server)
        .call(&StoryRequest::CheckQuality {
            framework: "INVEST framework".into(),
            stories: vec![story.as_object().cloned().unwrap()],
            model: "gpt-4o-mini".into(),
        })
        .await
        .expect("check ok");
    assert_eq!(rows[0]["compliance"], "Yes");
}

#[tokio::test]
async fn server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-user-stories"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .call(&StoryRequest::Generate {
            vision: "v".into(),
            mvp: "m".into(),
            model: "gpt-4o-mini".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn unexpected_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-user-stories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stories": []})))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .call(&StoryRequest::Generate {
            vision: "v".into(),
            mvp: "m".into(),
            model: "gpt-4o-mini".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-user-stories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(stories_body()),
        )
        .mount(&server)
        .await;

    let api = ReqwestStoryApi::new(&ApiSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    })
    .unwrap();
    let err = api
        .call(&StoryRequest::Generate {
            vision: "v".into(),
            mvp: "m".into(),
            model: "gpt-4o-mini".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}
