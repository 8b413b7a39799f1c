use std::sync::Arc;
use std::time::Duration;
use tinytts_backend::controllers::{
    conversion::ConversionController, health::HealthState, history::HistoryController,
};
use tinytts_backend::domain::conversion::{ConversionService, ConversionSettings};
use tinytts_backend::domain::history::HistoryService;
use tinytts_backend::domain::storage::StorageManager;
use tinytts_backend::infrastructure::audio::Mp3Assembler;
use tinytts_backend::infrastructure::config::{Config, LogFormat};
use tinytts_backend::infrastructure::db::{check_connection, create_pool, run_migrations, DbPool};
use tinytts_backend::infrastructure::extraction::UploadExtractor;
use tinytts_backend::infrastructure::http::{create_router, start_http_server, Controllers};
use tinytts_backend::infrastructure::repositories::{
    HistoryRepository, InMemoryHistoryRepository, OpenAiCompatibleTtsRepository,
    PgHistoryRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting TinyTTS Backend on {}:{}",
        config.host,
        config.port
    );

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. History persistence: Postgres when configured, memory otherwise
    let (pool, history_repo) = open_history(&config).await?;

    // 2. Audio storage
    let storage = Arc::new(StorageManager::open(config.audio_dir(), history_repo.clone()).await?);
    tracing::info!(
        audio_dir = %storage.audio_dir().display(),
        max_storage_gb = config.max_storage_gb,
        "Audio storage ready"
    );

    // 3. Speech backend client
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.tts_request_timeout_secs))
        .build()?;
    let tts_repo = Arc::new(OpenAiCompatibleTtsRepository::new(
        http_client,
        &config.tts_base_url,
        config.tts_api_key.clone(),
        config.tts_model.clone(),
    ));
    tracing::info!(
        base_url = %config.tts_base_url,
        model = %config.tts_model,
        "Speech backend client initialized"
    );

    // 4. Services
    tracing::info!("Instantiating services...");
    let conversion_service = Arc::new(ConversionService::new(
        tts_repo,
        history_repo.clone(),
        storage.clone(),
        Arc::new(Mp3Assembler),
        Arc::new(UploadExtractor::default()),
        ConversionSettings::from_config(&config),
    ));
    let history_service = Arc::new(HistoryService::new(history_repo, storage.clone()));

    // 5. Controllers
    tracing::info!("Instantiating controllers...");
    let controllers = Controllers {
        health: Arc::new(HealthState {
            pool,
            storage,
            quota_bytes: config.quota_bytes(),
        }),
        conversion: Arc::new(ConversionController::new(conversion_service)),
        history: Arc::new(HistoryController::new(history_service)),
    };

    // Start HTTP server with all routes
    let router = create_router(controllers, config.max_upload_bytes);
    start_http_server(config, router).await?;

    Ok(())
}

async fn open_history(
    config: &Config,
) -> Result<(Option<Arc<DbPool>>, Arc<dyn HistoryRepository>), Box<dyn std::error::Error>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, conversion history will not survive a restart");
        return Ok((None, Arc::new(InMemoryHistoryRepository::new())));
    };

    // Create database connection pool
    let pool = create_pool(database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let pool = Arc::new(pool);
    let repo: Arc<dyn HistoryRepository> = Arc::new(PgHistoryRepository::new(pool.clone()));
    Ok((Some(pool), repo))
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "tinytts_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "tinytts_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
