use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use listingdesk_api_types::{AnalyticsPeriod, JobStatus};
use serde_json::json;
use tempfile::NamedTempFile;

use super::{ApiClient, PostForm};
use crate::application::gateway::{AccountGateway, ApiError, JobStatusSource, PostGateway};
use crate::application::session::Credentials;
use crate::application::storage::{KeyValueStore, MemoryStore, keys};
use crate::config::{ApiSettings, normalize_base_url};

fn client(server: &MockServer, store: Arc<MemoryStore>) -> ApiClient {
    let settings = ApiSettings {
        base_url: normalize_base_url(&server.url("/api")).expect("base url"),
        timeout: Duration::from_secs(5),
        user_agent: "listingdesk-test".to_string(),
    };
    ApiClient::new(&settings, Credentials::new(store)).expect("client")
}

fn temp_file(suffix: &str) -> NamedTempFile {
    tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("tmp file")
}

fn logged_in() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_entries([
        (keys::TOKEN, "tok-123"),
        (keys::USER, r#"{"id":1,"username":"ops","email":"ops@example.com"}"#),
    ]))
}

const POST_JSON: &str = r#"{
    "id": 10,
    "account": {"id": 1, "email": "seller@example.com", "session_exists": true, "created_at": "2024-05-01T08:00:00Z"},
    "title": "Desk lamp",
    "description": "Brass, works",
    "price": "25.00",
    "image": null,
    "scheduled_time": "2024-05-02T09:30:00Z",
    "posted": false,
    "status": "pending",
    "retry_count": 0
}"#;

#[tokio::test]
async fn requests_carry_stored_bearer_token() -> Result<(), ApiError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/posts/")
            .header("authorization", "Bearer tok-123");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!("[{POST_JSON}]"));
    });

    let posts = client(&server, logged_in()).list_posts().await?;

    mock.assert();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].price.as_str(), "25.00");
    Ok(())
}

#[tokio::test]
async fn unauthorized_clears_credentials() -> Result<(), ApiError> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/accounts/");
        then.status(401)
            .header("content-type", "application/json")
            .body(r#"{"detail":"Given token not valid for any token type"}"#);
    });
    let store = logged_in();

    let err = client(&server, store.clone())
        .list_accounts()
        .await
        .expect_err("401 must fail");

    assert!(err.is_unauthorized());
    assert_eq!(store.get(keys::TOKEN)?, None);
    assert_eq!(store.get(keys::USER)?, None);
    Ok(())
}

#[tokio::test]
async fn server_error_text_is_extracted() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/posts/start-posting/");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"error":"No pending posts found with the provided IDs"}"#);
    });
    server.mock(|when, then| {
        when.method("DELETE").path("/api/posts/7/");
        then.status(500).body("<html>oops</html>");
    });
    let api = client(&server, logged_in());

    let err = api.start_posting(&[1, 2]).await.expect_err("400");
    assert_eq!(
        err.user_message("Failed to start posting process"),
        "No pending posts found with the provided IDs"
    );

    let err = api.delete_post(7).await.expect_err("500");
    assert!(matches!(err, ApiError::Server { status: 500, message: None }));
    assert_eq!(err.user_message("Failed to delete post"), "Failed to delete post");
}

#[tokio::test]
async fn start_posting_sends_id_list() -> Result<(), ApiError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/posts/start-posting/")
            .json_body(json!({"post_ids": [1, 2, 3]}));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"message":"Started","job_id":"abc","pending_count":3,"total_selected":3}"#);
    });

    let response = client(&server, logged_in()).start_posting(&[1, 2, 3]).await?;

    mock.assert();
    assert_eq!(response.job_id.as_deref(), Some("abc"));
    Ok(())
}

#[tokio::test]
async fn job_status_uses_job_status_path() -> Result<(), ApiError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/api/posts/job-status/abc/");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"job_id":"abc","status":"running","total_posts":3,"completed_posts":1,"failed_posts":0,"progress_percentage":33.3}"#);
    });

    let job = client(&server, logged_in()).job_status("abc").await?;

    mock.assert();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.completed_posts, 1);
    Ok(())
}

#[tokio::test]
async fn job_id_is_escaped_as_one_path_segment() -> Result<(), ApiError> {
    let server = MockServer::start();
    let api = client(&server, logged_in());

    let url = api.segment_url("posts/job-status/", "a/b?c#d")?;
    assert_eq!(url.path(), "/api/posts/job-status/a%2Fb%3Fc%23d/");
    assert_eq!(url.query(), None);
    assert_eq!(url.fragment(), None);
    Ok(())
}

#[tokio::test]
async fn analytics_passes_period_and_account() -> Result<(), ApiError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/analytics/")
            .query_param("period", "weekly")
            .query_param("account", "seller@example.com");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{
                "period": "weekly",
                "summary": {"total_created": 4, "total_posted": 2, "currently_posted": 2, "currently_pending": 2, "not_posted": 2},
                "by_account": [{"account_email": "seller@example.com", "created_count": 4, "posted_count": 2}],
                "daily_breakdown": [{"date": "2024-05-02", "created": 4, "posted": 2}]
            }"#);
    });

    let report = client(&server, logged_in())
        .analytics(AnalyticsPeriod::Weekly, Some("seller@example.com"))
        .await?;

    mock.assert();
    assert_eq!(report.summary.total_posted, 2);
    assert_eq!(report.by_account.len(), 1);
    Ok(())
}

#[tokio::test]
async fn login_stores_access_token_and_user() -> Result<(), ApiError> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login/")
            .json_body(json!({"email": "ops@example.com", "password": "Str0ng!pass"}));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"user":{"id":5,"username":"ops","email":"ops@example.com","is_approved":true},"tokens":{"access":"new-access","refresh":"new-refresh"}}"#);
    });
    let store = Arc::new(MemoryStore::new());

    client(&server, store.clone())
        .login("ops@example.com", "Str0ng!pass")
        .await?;

    assert_eq!(store.get(keys::TOKEN)?.as_deref(), Some("new-access"));
    assert!(store.get(keys::USER)?.is_some_and(|user| user.contains("\"id\":5")));
    Ok(())
}

#[tokio::test]
async fn invalid_login_reports_invalid_credentials() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login/");
        then.status(401)
            .header("content-type", "application/json")
            .body(r#"{"error":"Invalid credentials"}"#);
    });

    let err = client(&server, Arc::new(MemoryStore::new()))
        .login("ops@example.com", "wrong")
        .await
        .expect_err("bad password");
    assert_eq!(err.user_message("Login failed"), "Invalid credentials");
}

#[tokio::test]
async fn users_list_unwraps_envelope() -> Result<(), ApiError> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/auth/users/");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"users":[{"id":2,"username":"new","email":"new@example.com","is_approved":false,"is_staff":false,"is_superuser":false,"date_joined":"2024-05-01T08:00:00Z"}]}"#);
    });

    let users = client(&server, logged_in()).list_users().await?;
    assert_eq!(users.len(), 1);
    assert!(!users[0].is_approved);
    Ok(())
}

#[tokio::test]
async fn invalid_inputs_never_reach_the_server() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method("POST").path("/api/accounts/bulk-upload/");
        then.status(200).body("{}");
    });
    let create = server.mock(|when, then| {
        when.method("POST").path("/api/posts/");
        then.status(201).body("{}");
    });
    let api = client(&server, logged_in());

    let mut csv = temp_file(".csv");
    writeln!(csv, "email:password").expect("write");
    let err = api
        .bulk_upload_accounts(csv.path())
        .await
        .expect_err("accounts need a .txt file");
    assert!(matches!(err, ApiError::Validation(_)));

    let form = PostForm {
        account_id: 1,
        title: "Desk lamp".to_string(),
        description: "Brass".to_string(),
        price: "0".to_string(),
        scheduled_time: time::macros::datetime!(2024-05-02 09:30 UTC),
        image: None,
    };
    let err = api.create_post(&form).await.expect_err("price must be positive");
    assert_eq!(err.to_string(), "Please enter a valid price");

    upload.assert_calls(0);
    create.assert_calls(0);
}

#[tokio::test]
async fn bulk_account_upload_posts_multipart_file() -> Result<(), ApiError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/accounts/bulk-upload/")
            .header_exists("content-type");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"message":"Processing 1 account(s)"}"#);
    });
    let mut txt = temp_file(".txt");
    writeln!(txt, "seller@example.com:hunter2").expect("write");

    let response = client(&server, logged_in())
        .bulk_upload_accounts(txt.path())
        .await?;

    mock.assert();
    assert_eq!(response["message"], "Processing 1 account(s)");
    Ok(())
}
