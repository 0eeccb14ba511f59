#![deny(clippy::all, clippy::pedantic)]

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use httpmock::MockServer;
use listingdesk::application::confirm::{AutoConfirm, Confirm, ScriptedConfirm};
use listingdesk::application::storage::{KeyValueStore, MemoryStore, keys};
use listingdesk::config::{self, SettingsOverrides};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::args::{
    AccountsCmd, ActivityCmd, AuthCmd, Cli, Commands, PartitionArg, PasswordInput, PostsCmd,
    UsersCmd,
};
use crate::client::{CliError, Ctx, build_ctx_from_cli};
use crate::handlers::{accounts, activity, auth, posts, users};

const POSTS_JSON: &str = r#"[
    {"id": 10, "account": {"id": 1, "email": "seller@example.com", "session_exists": true, "created_at": "2024-05-01T08:00:00Z"},
     "title": "Desk lamp", "description": "Brass", "price": "25.00", "scheduled_time": "2024-05-02T09:30:00Z", "posted": false},
    {"id": 20, "account": {"id": 1, "email": "seller@example.com", "session_exists": true, "created_at": "2024-05-01T08:00:00Z"},
     "title": "Bookshelf", "description": "Oak", "price": "80", "scheduled_time": "2024-05-02T10:00:00Z", "posted": false},
    {"id": 30, "account": {"id": 1, "email": "seller@example.com", "session_exists": true, "created_at": "2024-05-01T08:00:00Z"},
     "title": "Chair", "description": "Pine", "price": "15", "scheduled_time": "2024-05-01T10:00:00Z", "posted": true}
]"#;

fn overrides(server: &MockServer) -> SettingsOverrides {
    SettingsOverrides {
        api_url: Some(server.url("/api/")),
        poll_interval_ms: Some(10),
        ..SettingsOverrides::default()
    }
}

fn ctx_with(server: &MockServer, store: Arc<MemoryStore>, confirm: Arc<dyn Confirm>) -> Ctx {
    let settings = config::load(&overrides(server)).expect("settings");
    Ctx::new(settings, store, None, confirm).expect("ctx")
}

fn ctx(server: &MockServer) -> Ctx {
    let store = Arc::new(MemoryStore::with_entries([(keys::TOKEN, "tok")]));
    ctx_with(server, store, Arc::new(AutoConfirm))
}

fn tmp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write tmp");
    file
}

fn mock_posts(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method("GET").path("/api/posts/");
        then.status(200)
            .header("content-type", "application/json")
            .body(POSTS_JSON);
    })
}

#[tokio::test]
async fn build_ctx_prefers_token_file() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/stats/dashboard/")
            .header("authorization", "Bearer file-token");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"total_accounts":1,"active_accounts":1,"total_posts":3,"pending_posts":2,"posted_today":1,"success_rate":50.0}"#);
    });
    let file = tmp_file("file-token\n");
    let data_dir = tempfile::tempdir().expect("tempdir");
    let api_url = server.url("/api/");
    let cli = Cli::try_parse_from([
        "listingdesk",
        "--api-url",
        api_url.as_str(),
        "--data-dir",
        data_dir.path().to_str().expect("utf8 path"),
        "--token-file",
        file.path().to_str().expect("utf8 path"),
        "--yes",
        "stats",
    ])
    .expect("parse");

    let settings = config::load(&cli.settings)?;
    let ctx = build_ctx_from_cli(&cli, settings)?;
    crate::handlers::reports::stats(&ctx).await?;

    mock.assert();
    assert!(data_dir.path().exists());
    Ok(())
}

#[test]
fn is_yes_accepts_short_and_long_forms() {
    assert!(crate::prompt::is_yes("y\n"));
    assert!(crate::prompt::is_yes(" YES "));
    assert!(!crate::prompt::is_yes(""));
    assert!(!crate::prompt::is_yes("no"));
}

#[test]
fn parse_time_rejects_invalid() {
    let err = crate::io::parse_time("tomorrow").expect_err("invalid time");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[test]
fn password_file_wins_over_env() -> Result<(), CliError> {
    let file = tmp_file("from-file\nignored");
    let input = PasswordInput {
        password_file: Some(file.path().to_path_buf()),
        password_env: Some("from-env".into()),
    };
    assert_eq!(crate::io::read_password(&input)?, "from-file");

    let err = crate::io::read_password(&PasswordInput::default()).expect_err("no password");
    assert!(matches!(err, CliError::InvalidInput(_)));
    Ok(())
}

#[tokio::test]
async fn posts_list_filters_partition() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = mock_posts(&server);

    posts::handle(
        &ctx(&server),
        PostsCmd::List {
            partition: Some(PartitionArg::Posted),
        },
    )
    .await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn delete_selected_reports_partial_failure() {
    let server = MockServer::start();
    mock_posts(&server);
    let ok = server.mock(|when, then| {
        when.method("DELETE").path("/api/posts/10/");
        then.status(204);
    });
    let failing = server.mock(|when, then| {
        when.method("DELETE").path("/api/posts/20/");
        then.status(500)
            .header("content-type", "application/json")
            .body(r#"{"error":"locked"}"#);
    });
    let ctx = ctx(&server);

    let err = posts::handle(
        &ctx,
        PostsCmd::DeleteSelected {
            partition: PartitionArg::Pending,
            all: false,
            ids: vec![10, 20],
        },
    )
    .await
    .expect_err("one delete failed");

    assert!(matches!(
        err,
        CliError::Partial {
            failed: 1,
            attempted: 2
        }
    ));
    ok.assert();
    failing.assert();
    let entries = ctx.activity.entries();
    assert_eq!(entries[0].message, "Bulk deletion");
    assert_eq!(entries[0].details, "1 pending posts removed from queue");
}

#[tokio::test]
async fn bulk_delete_rejected_with_401_is_session_expiry() {
    let server = MockServer::start();
    mock_posts(&server);
    let deletes: Vec<_> = [10, 20]
        .into_iter()
        .map(|id| {
            server.mock(move |when, then| {
                when.method("DELETE").path(format!("/api/posts/{id}/"));
                then.status(401).body(r#"{"detail":"expired"}"#);
            })
        })
        .collect();
    let store = Arc::new(MemoryStore::with_entries([(keys::TOKEN, "tok")]));
    let ctx = ctx_with(&server, store.clone(), Arc::new(AutoConfirm));

    let err = posts::handle(
        &ctx,
        PostsCmd::DeleteSelected {
            partition: PartitionArg::Pending,
            all: false,
            ids: vec![10, 20],
        },
    )
    .await
    .expect_err("every delete is unauthorized");

    assert!(matches!(err, CliError::SessionExpired));
    for delete in &deletes {
        delete.assert();
    }
    assert_eq!(store.get(keys::TOKEN).expect("store"), None);
}

#[tokio::test]
async fn delete_selected_rejects_ids_from_other_partition() {
    let server = MockServer::start();
    mock_posts(&server);
    let delete = server.mock(|when, then| {
        when.method("DELETE").path("/api/posts/30/");
        then.status(204);
    });

    let err = posts::handle(
        &ctx(&server),
        PostsCmd::DeleteSelected {
            partition: PartitionArg::Pending,
            all: false,
            ids: vec![30],
        },
    )
    .await
    .expect_err("30 is posted");

    assert!(matches!(err, CliError::InvalidInput(_)));
    delete.assert_calls(0);
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let server = MockServer::start();
    mock_posts(&server);
    let delete = server.mock(|when, then| {
        when.method("DELETE").path("/api/posts/10/");
        then.status(204);
    });
    let store = Arc::new(MemoryStore::with_entries([(keys::TOKEN, "tok")]));
    let ctx = ctx_with(&server, store, Arc::new(ScriptedConfirm::declining()));

    let err = posts::handle(&ctx, PostsCmd::Delete { id: 10 })
        .await
        .expect_err("declined");

    assert!(matches!(err, CliError::Declined));
    delete.assert_calls(0);
}

#[tokio::test]
async fn start_with_watch_follows_job_to_completion() -> Result<(), CliError> {
    let server = MockServer::start();
    let list = mock_posts(&server);
    let start = server.mock(|when, then| {
        when.method("POST")
            .path("/api/posts/start-posting/")
            .json_body(json!({"post_ids": [10]}));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"message":"Started","job_id":"job-1"}"#);
    });
    let status = server.mock(|when, then| {
        when.method("GET").path("/api/posts/job-status/job-1/");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"job_id":"job-1","status":"completed","total_posts":1,"completed_posts":1,"failed_posts":0,"progress_percentage":100.0}"#);
    });

    posts::handle(
        &ctx(&server),
        PostsCmd::Start {
            ids: vec![10],
            watch: true,
        },
    )
    .await?;

    start.assert();
    status.assert();
    // initial load plus the refresh after completion
    list.assert_calls(2);
    Ok(())
}

#[tokio::test]
async fn unauthorized_maps_to_session_expired() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/accounts/");
        then.status(401).body(r#"{"detail":"expired"}"#);
    });
    let store = Arc::new(MemoryStore::with_entries([(keys::TOKEN, "tok")]));
    let ctx = ctx_with(&server, store.clone(), Arc::new(AutoConfirm));

    let err = accounts::handle(&ctx, AccountsCmd::List)
        .await
        .expect_err("401");

    assert!(matches!(err, CliError::SessionExpired));
    assert_eq!(store.get(keys::TOKEN).expect("store"), None);
}

#[tokio::test]
async fn accounts_delete_many_settles_all() -> Result<(), CliError> {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method("DELETE").path("/api/accounts/1/");
        then.status(204);
    });
    let second = server.mock(|when, then| {
        when.method("DELETE").path("/api/accounts/2/");
        then.status(204);
    });

    accounts::handle(&ctx(&server), AccountsCmd::Delete { ids: vec![1, 2] }).await?;
    first.assert();
    second.assert();
    Ok(())
}

#[tokio::test]
async fn login_reads_password_file_and_stores_token() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login/")
            .json_body(json!({"email": "ops@example.com", "password": "Str0ng!pass"}));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"user":{"id":5,"username":"ops","email":"ops@example.com"},"tokens":{"access":"fresh","refresh":"r"}}"#);
    });
    let password = tmp_file("Str0ng!pass\n");
    let store = Arc::new(MemoryStore::new());
    let ctx = ctx_with(&server, store.clone(), Arc::new(AutoConfirm));

    auth::handle(
        &ctx,
        AuthCmd::Login {
            email: "ops@example.com".into(),
            password: PasswordInput {
                password_file: Some(password.path().to_path_buf()),
                password_env: None,
            },
        },
    )
    .await?;

    mock.assert();
    assert_eq!(store.get(keys::TOKEN)?.as_deref(), Some("fresh"));
    Ok(())
}

#[tokio::test]
async fn disapprove_asks_first() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/auth/users/4/disapprove/");
        then.status(200).body(r#"{"message":"ok"}"#);
    });
    let store = Arc::new(MemoryStore::with_entries([(keys::TOKEN, "tok")]));
    let confirm = Arc::new(ScriptedConfirm::declining());
    let ctx = ctx_with(&server, store, confirm.clone());

    let err = users::handle(&ctx, UsersCmd::Disapprove { id: 4 })
        .await
        .expect_err("declined");

    assert!(matches!(err, CliError::Declined));
    assert_eq!(confirm.asked()[0].title, "Disapprove User");
    mock.assert_calls(0);
}

#[test]
fn activity_clear_empties_log() -> Result<(), CliError> {
    let server = MockServer::start();
    let ctx = ctx(&server);
    ctx.activity.append(
        listingdesk::application::activity::ActivityKind::Create,
        "Post created",
        "New post added to pending posts",
    )?;

    activity::handle(&ctx, ActivityCmd::Clear)?;
    assert!(ctx.activity.is_empty());
    Ok(())
}

#[test]
fn commands_parse_multi_id_delete() {
    let cli = Cli::try_parse_from(["listingdesk", "accounts", "delete", "3", "4"]).expect("parse");
    match cli.command {
        Commands::Accounts(args) => {
            assert!(matches!(args.action, AccountsCmd::Delete { ids } if ids == vec![3, 4]));
        }
        other => panic!("unexpected command {other:?}"),
    }
}
