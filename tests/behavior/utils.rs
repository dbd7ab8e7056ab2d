use fileshelf::config::ClientConfig;
use fileshelf::error::Result;
use fileshelf::local::DirectorySaver;
use fileshelf::manager::FileManager;
use fileshelf::storage::StorageClient;
use libtest_mimic::{Failed, Trial};
use rand::Rng;
use rand::prelude::*;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::MockServer;

pub static TEST_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
});

/// Endpoint nothing listens on, for transport failures.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9";

/// Latency used to keep a transfer in flight while a test observes it.
pub const SLOW_RESPONSE: Duration = Duration::from_millis(400);

/// A mock storage service plus a client and download directory pointed at it.
pub struct TestEnv {
    pub server: MockServer,
    pub client: StorageClient,
    pub download_dir: TempDir,
}

impl TestEnv {
    pub async fn start() -> Result<Self> {
        let server = MockServer::start().await;
        let client = StorageClient::new(&Self::config_for(&server.uri()))?;
        let download_dir = tempfile::tempdir()?;

        Ok(Self {
            server,
            client,
            download_dir,
        })
    }

    fn config_for(endpoint: &str) -> ClientConfig {
        ClientConfig {
            endpoint: endpoint.to_string(),
            timeout: Some(Duration::from_secs(5)),
            ..ClientConfig::default()
        }
    }

    /// A manager wired to the mock server, saving into the temp download dir.
    pub fn manager(&self) -> FileManager<StorageClient, DirectorySaver> {
        let saver = DirectorySaver::new(self.download_dir.path()).expect("download dir saver");
        FileManager::new(self.client.clone(), saver)
    }

    /// A manager whose client cannot reach any server.
    pub fn unreachable_manager(&self) -> FileManager<StorageClient, DirectorySaver> {
        let client =
            StorageClient::new(&Self::config_for(UNREACHABLE_ENDPOINT)).expect("client");
        let saver = DirectorySaver::new(self.download_dir.path()).expect("download dir saver");
        FileManager::new(client, saver)
    }

    pub fn downloaded(&self, name: &str) -> PathBuf {
        self.download_dir.path().join(name)
    }

    /// Number of requests the mock server saw for `method` on `path`.
    pub async fn request_count(&self, method: &str, path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == method && r.url.path() == path)
            .count()
    }

    pub async fn total_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }

    /// The `fileshelf` binary with a clean environment pointed at the mock server.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("fileshelf").unwrap();
        cmd.env_clear()
            .env("RUST_LOG", "warn")
            .env("FILESHELF_ENDPOINT", self.server.uri())
            .env("FILESHELF_DOWNLOAD_DIR", self.download_dir.path())
            .env("FILESHELF_TIMEOUT_SECS", "5");
        cmd
    }
}

pub fn new_file_name() -> String {
    format!("{}.bin", Uuid::new_v4())
}

pub fn random_content(range: std::ops::Range<usize>) -> Vec<u8> {
    let mut rng = rand::rng();
    let size = rng.random_range(range);
    let mut content = vec![0; size];
    rng.fill_bytes(&mut content);
    content
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

pub fn build_async_trial<F, Fut>(name: &str, f: F) -> Trial
where
    F: FnOnce(TestEnv) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>>,
{
    let handle = TEST_RUNTIME.handle().clone();

    Trial::test(format!("behavior::{name}"), move || {
        handle
            .block_on(async move {
                let env = TestEnv::start().await?;
                f(env).await
            })
            .map_err(|err| Failed::from(err.to_string()))
    })
}

#[macro_export]
macro_rules! async_trials {
    ($($test:ident),* $(,)?) => {
        vec![$(build_async_trial(stringify!($test), $test),)*]
    };
}
