use crate::*;
use fileshelf::error::{Result, TransferError};
use fileshelf::storage::Uploader;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, ResponseTemplate};

pub fn tests(tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        test_upload_sends_multipart_file_field,
        test_upload_binary_content,
        test_upload_rejected_by_server
    ));
}

async fn test_upload_sends_multipart_file_field(env: TestEnv) -> Result<()> {
    let name = new_file_name();
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains(format!("filename=\"{name}\"")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "filename": name })))
        .expect(1)
        .mount(&env.server)
        .await;

    env.client
        .upload(b"hello upload".to_vec(), &name)
        .await
        .expect("upload");

    let requests = env.server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(contains_bytes(&requests[0].body, b"hello upload"));
    Ok(())
}

async fn test_upload_binary_content(env: TestEnv) -> Result<()> {
    let name = new_file_name();
    let content = random_content(1..256 * 1024);
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&env.server)
        .await;

    env.client
        .upload(content.clone(), &name)
        .await
        .expect("upload");

    let requests = env.server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(contains_bytes(&requests[0].body, &content));
    Ok(())
}

async fn test_upload_rejected_by_server(env: TestEnv) -> Result<()> {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&env.server)
        .await;

    let err = env
        .client
        .upload(b"x".to_vec(), &new_file_name())
        .await
        .unwrap_err();

    assert!(
        matches!(
            &err,
            TransferError::ServerRejected { status: 500, detail: Some(d) } if d == "disk full"
        ),
        "unexpected error: {err}"
    );
    Ok(())
}
