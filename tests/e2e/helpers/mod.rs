use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tinytts_backend::controllers::{
    conversion::ConversionController, health::HealthState, history::HistoryController,
};
use tinytts_backend::domain::conversion::{ConversionService, ConversionSettings};
use tinytts_backend::domain::history::HistoryService;
use tinytts_backend::domain::storage::StorageManager;
use tinytts_backend::infrastructure::audio::Mp3Assembler;
use tinytts_backend::infrastructure::config::Config;
use tinytts_backend::infrastructure::extraction::UploadExtractor;
use tinytts_backend::infrastructure::http::{create_router, Controllers};
use tinytts_backend::infrastructure::repositories::InMemoryHistoryRepository;
use tokio::net::TcpListener;

pub mod api_client;
pub mod fake_tts;

use api_client::TestClient;
use fake_tts::FakeTts;

pub struct TestContext {
    pub client: TestClient,
    pub tts: Arc<FakeTts>,
    pub storage: Arc<StorageManager>,
    #[allow(dead_code)]
    pub config: Config,
    _data_dir: TempDir,
}

/// Test configuration: small chunks, fast retries, 1 MiB uploads
pub fn test_config(data_dir: &TempDir) -> Config {
    let data_dir = data_dir.path().to_string_lossy().to_string();
    let vars = [
        ("HOST", "127.0.0.1"),
        ("PORT", "0"),
        ("DATA_DIR", data_dir.as_str()),
        ("CHUNK_SIZE", "60"),
        ("SYNTHESIS_RETRY_DELAY_MS", "1"),
        ("LARGE_INPUT_WARNING", "500"),
        ("MAX_UPLOAD_BYTES", "1048576"),
    ];
    Config::from_lookup(|key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    })
    .expect("Failed to build test config")
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let data_dir = tempfile::tempdir().expect("Failed to create data dir");
            let config = test_config(&data_dir);

            let history_repo = Arc::new(InMemoryHistoryRepository::new());
            let storage = Arc::new(
                StorageManager::open(config.audio_dir(), history_repo.clone())
                    .await
                    .expect("Failed to open storage"),
            );
            let tts = Arc::new(FakeTts::default());

            let conversion_service = Arc::new(ConversionService::new(
                tts.clone(),
                history_repo.clone(),
                storage.clone(),
                Arc::new(Mp3Assembler),
                Arc::new(UploadExtractor::default()),
                ConversionSettings::from_config(&config),
            ));
            let history_service = Arc::new(HistoryService::new(history_repo, storage.clone()));

            let controllers = Controllers {
                health: Arc::new(HealthState {
                    pool: None,
                    storage: storage.clone(),
                    quota_bytes: config.quota_bytes(),
                }),
                conversion: Arc::new(ConversionController::new(conversion_service)),
                history: Arc::new(HistoryController::new(history_service)),
            };
            let app = create_router(controllers, config.max_upload_bytes);

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                client: TestClient::new(&base_url),
                tts,
                storage,
                config,
                _data_dir: data_dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Data directory is removed when the TempDir drops
        }
    }
}

impl TestContext {
    /// Start converting `text` with default voice and speed, returning the job id
    pub async fn start_conversion(&self, text: &str) -> String {
        let response = self
            .client
            .post("/api/convert", &serde_json::json!({ "text": text }))
            .await
            .unwrap();
        response.assert_status(hyper::StatusCode::ACCEPTED);
        response.field("job_id").as_str().unwrap().to_string()
    }

    /// Poll the status endpoint until the job is completed or failed
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..200 {
            let response = self
                .client
                .get(&format!("/api/status/{}", job_id))
                .await
                .unwrap();
            response.assert_status(hyper::StatusCode::OK);
            let body = response.body.clone().unwrap();
            if matches!(body["status"].as_str(), Some("completed" | "failed")) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job {} did not finish in time", job_id);
    }

    /// Convert `text` and return the id of the resulting history entry
    pub async fn convert(&self, text: &str) -> String {
        let job_id = self.start_conversion(text).await;
        let status = self.wait_for_job(&job_id).await;
        assert_eq!(status["status"], "completed", "job failed: {}", status);
        status["result_id"].as_str().unwrap().to_string()
    }
}
