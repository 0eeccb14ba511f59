#![deny(clippy::all, clippy::pedantic)]

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn token_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write token");
    file
}

fn listingdesk(server: &MockServer, data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("listingdesk"));
    cmd.env("LISTINGDESK_API_URL", server.url("/api/"))
        .env_remove("LISTINGDESK_TOKEN")
        .env_remove("LISTINGDESK_TOKEN_FILE")
        .arg("--data-dir")
        .arg(data_dir.path());
    cmd
}

#[test]
fn posts_list_works_end_to_end() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/posts/")
            .header("authorization", "Bearer cli-token");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":10,"account":{"id":1,"email":"seller@example.com","session_exists":true,"created_at":"2024-05-01T08:00:00Z"},"title":"Desk lamp","description":"Brass","price":"25.00","scheduled_time":"2024-05-02T09:30:00Z","posted":false}]"#);
    });
    let token = token_file("cli-token");
    let data_dir = TempDir::new().expect("tempdir");

    let assert = listingdesk(&server, &data_dir)
        .env("LISTINGDESK_TOKEN_FILE", token.path())
        .args(["posts", "list"])
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"title\": \"Desk lamp\""));
    mock.assert();
}

#[test]
fn expired_session_exits_with_login_hint() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/accounts/");
        then.status(401).body(r#"{"detail":"expired"}"#);
    });
    let token = token_file("stale");
    let data_dir = TempDir::new().expect("tempdir");

    listingdesk(&server, &data_dir)
        .env("LISTINGDESK_TOKEN_FILE", token.path())
        .args(["accounts", "list"])
        .assert()
        .code(3)
        .stderr(contains("log in again"));
}

#[test]
fn invalid_price_fails_before_any_request() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method("POST").path("/api/posts/");
        then.status(201).body("{}");
    });
    let data_dir = TempDir::new().expect("tempdir");

    listingdesk(&server, &data_dir)
        .args([
            "posts",
            "create",
            "--account-id",
            "1",
            "--title",
            "Desk lamp",
            "--description",
            "Brass",
            "--price",
            "0",
            "--scheduled-time",
            "2024-05-02T09:30:00Z",
        ])
        .assert()
        .code(2)
        .stderr(contains("Please enter a valid price"));
    create.assert_calls(0);
}

#[test]
fn activity_log_survives_between_runs() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/posts/");
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"id":11,"account":{"id":1,"email":"seller@example.com","session_exists":true,"created_at":"2024-05-01T08:00:00Z"},"title":"Desk lamp","description":"Brass","price":"25.00","scheduled_time":"2024-05-02T09:30:00Z","posted":false}"#);
    });
    let data_dir = TempDir::new().expect("tempdir");

    listingdesk(&server, &data_dir)
        .args([
            "posts",
            "create",
            "--account-id",
            "1",
            "--title",
            "Desk lamp",
            "--description",
            "Brass",
            "--price",
            "25.00",
            "--scheduled-time",
            "2024-05-02T09:30:00Z",
        ])
        .assert()
        .success();

    listingdesk(&server, &data_dir)
        .args(["activity", "list"])
        .assert()
        .success()
        .stdout(contains("Post created"));
}

#[test]
fn help_lists_resources() {
    Command::new(assert_cmd::cargo::cargo_bin!("listingdesk"))
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("accounts"))
        .stdout(contains("posts"));
}
