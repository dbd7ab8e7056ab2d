use crate::*;
use fileshelf::error::Result;
use predicates::prelude::*;
use serde_json::json;
use tokio::fs;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

pub fn tests(tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        test_cli_ls_shows_files,
        test_cli_ls_empty,
        test_cli_ls_json,
        test_cli_put_reports_refresh_hint,
        test_cli_get_saves_file,
        test_cli_get_missing_file_fails,
        test_cli_rm_asks_for_confirmation,
        test_cli_rm_aborted,
        test_cli_rm_partial_failure,
        test_cli_shell_session
    ));
}

async fn mount_listing(env: &TestEnv, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&env.server)
        .await;
}

async fn mount_delete(env: &TestEnv, name: &str, status: u16) {
    Mock::given(method("DELETE"))
        .and(path(format!("/files/{name}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(&env.server)
        .await;
}

async fn test_cli_ls_shows_files(env: TestEnv) -> Result<()> {
    mount_listing(
        &env,
        json!({ "files": ["notes.txt", { "name": "report.pdf", "contentType": "application/pdf" }] }),
    )
    .await;

    env.command()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt"))
        .stdout(predicate::str::contains("application/pdf"))
        .stdout(predicate::str::contains("report.pdf"));
    Ok(())
}

async fn test_cli_ls_empty(env: TestEnv) -> Result<()> {
    mount_listing(&env, json!({ "files": [] })).await;

    env.command()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No files uploaded yet."));
    Ok(())
}

async fn test_cli_ls_json(env: TestEnv) -> Result<()> {
    mount_listing(
        &env,
        json!({ "files": [{ "name": "a.txt", "uploaded_at": "2024-01-01T00:00:00" }] }),
    )
    .await;

    env.command()
        .args(["ls", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"files":[{"name":"a.txt","uploadedAt":"2024-01-01T00:00:00Z"}]}"#,
        ));
    Ok(())
}

async fn test_cli_put_reports_refresh_hint(env: TestEnv) -> Result<()> {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&env.server)
        .await;
    let local = tempfile::tempdir()?;
    let file = local.path().join("upload-me.txt");
    fs::write(&file, b"content").await?;

    env.command()
        .arg("put")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded 'upload-me.txt'."))
        .stdout(predicate::str::contains("Refresh to see the updated list."));

    assert_eq!(env.request_count("GET", "/files").await, 0);
    Ok(())
}

async fn test_cli_get_saves_file(env: TestEnv) -> Result<()> {
    let name = new_file_name();
    let content = random_content(1..64 * 1024);
    Mock::given(method("GET"))
        .and(path(format!("/files/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&env.server)
        .await;

    env.command()
        .args(["get", &name])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Downloaded '{name}'")));

    assert_eq!(fs::read(env.downloaded(&name)).await?, content);
    Ok(())
}

async fn test_cli_get_missing_file_fails(env: TestEnv) -> Result<()> {
    env.command()
        .args(["get", "ghost.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to download 'ghost.txt': 'ghost.txt' was not found on the server",
        ));

    assert!(!env.downloaded("ghost.txt").exists());
    Ok(())
}

async fn test_cli_rm_asks_for_confirmation(env: TestEnv) -> Result<()> {
    mount_delete(&env, "old.txt", 200).await;

    env.command()
        .args(["rm", "old.txt"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("About to delete 1 file(s):"))
        .stdout(predicate::str::contains("Deleted 'old.txt'."));

    assert_eq!(env.request_count("DELETE", "/files/old.txt").await, 1);
    Ok(())
}

async fn test_cli_rm_aborted(env: TestEnv) -> Result<()> {
    env.command()
        .args(["rm", "keep.txt"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));

    assert_eq!(env.total_requests().await, 0);
    Ok(())
}

async fn test_cli_rm_partial_failure(env: TestEnv) -> Result<()> {
    mount_delete(&env, "a.txt", 200).await;
    mount_delete(&env, "b.txt", 404).await;

    env.command()
        .args(["rm", "-f", "a.txt", "b.txt"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Deleted 'a.txt'."))
        .stderr(predicate::str::contains("Failed to delete 'b.txt'"))
        .stderr(predicate::str::contains("Failed to delete 1 file(s): b.txt"));
    Ok(())
}

async fn test_cli_shell_session(env: TestEnv) -> Result<()> {
    mount_listing(&env, json!({ "files": ["shell.txt"] })).await;
    mount_delete(&env, "shell.txt", 200).await;

    env.command()
        .arg("shell")
        .write_stdin("status\nrm shell.txt\ny\nls\nbogus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("shell.txt"))
        .stdout(predicate::str::contains("Idle."))
        .stdout(predicate::str::contains("Deleted 'shell.txt'."))
        .stderr(predicate::str::contains("unknown command 'bogus'"));

    assert_eq!(env.request_count("GET", "/files").await, 1);
    assert_eq!(env.request_count("DELETE", "/files/shell.txt").await, 1);
    Ok(())
}
