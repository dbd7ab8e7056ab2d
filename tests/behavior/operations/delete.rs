use crate::*;
use fileshelf::error::{Result, TransferError};
use fileshelf::storage::Deleter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

pub fn tests(tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        test_remove_single_file,
        test_remove_missing_file_is_not_found,
        test_remove_all_files
    ));
}

async fn test_remove_single_file(env: TestEnv) -> Result<()> {
    let name = new_file_name();
    Mock::given(method("DELETE"))
        .and(path(format!("/files/{name}")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&env.server)
        .await;

    env.client.remove(&name).await.expect("remove");

    assert_eq!(env.request_count("DELETE", &format!("/files/{name}")).await, 1);
    Ok(())
}

async fn test_remove_missing_file_is_not_found(env: TestEnv) -> Result<()> {
    Mock::given(method("DELETE"))
        .and(path("/files/ghost.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&env.server)
        .await;

    let err = env.client.remove("ghost.txt").await.unwrap_err();

    assert!(matches!(&err, TransferError::NotFound { name } if name == "ghost.txt"));
    // Not retried.
    assert_eq!(env.total_requests().await, 1);
    Ok(())
}

async fn test_remove_all_files(env: TestEnv) -> Result<()> {
    Mock::given(method("DELETE"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&env.server)
        .await;

    env.client.remove_all().await.expect("remove all");

    assert_eq!(env.request_count("DELETE", "/files").await, 1);
    Ok(())
}
