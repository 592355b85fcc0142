use std::process;
use std::sync::Arc;
use std::time::Duration;

use auth_state::WaAuthState;
use database::Database;
use engine::{ConversationEngine, EngineConfig, ProfileStore};
use openai_backend::OpenAiBackend;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tutor_bot::{BotConfig, ConnectionSupervisor, SupervisorExit, WaTransport};
use wa_gateway::WaClient;

/// Delay before re-running transport initialization after an unexpected
/// failure (gateway unreachable, stream setup error).
const RESTART_DELAY: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env();

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let auth = Arc::new(WaAuthState::init(db.clone()).await);
    let backend = Arc::new(OpenAiBackend::from_env()?);

    info!(
        "Starting tutor bot (gateway: {}, mirror mode: {})",
        config.gateway_url, config.mirror_mode
    );

    loop {
        match run_session(&config, &db, auth.clone(), backend.clone()).await {
            Ok(SupervisorExit::RestartAfterReset) => {
                // Deliberate exit 0: the process manager restarts us into
                // a fresh pairing flow.
                info!("Credentials wiped; exiting for a supervised restart");
                process::exit(0);
            }
            Ok(SupervisorExit::LoggedOut) => {
                error!("Session logged out; a new pairing is required");
                process::exit(1);
            }
            Err(e) => {
                error!(
                    "Transport initialization failed: {}; retrying in {:?}",
                    e, RESTART_DELAY
                );
                tokio::time::sleep(RESTART_DELAY).await;
            }
        }
    }
}

/// Connect to the gateway, wire the engine, and supervise the session.
async fn run_session(
    config: &BotConfig,
    db: &Database,
    auth: Arc<WaAuthState>,
    backend: Arc<OpenAiBackend>,
) -> Result<SupervisorExit, wa_gateway::GatewayError> {
    let client = WaClient::connect(config.gateway_config()).await?;

    let transport = Arc::new(WaTransport::new(client.clone()));
    let engine = Arc::new(ConversationEngine::new(
        ProfileStore::new(db.clone()),
        transport,
        backend.clone(),
        backend.clone(),
        backend.clone(),
        EngineConfig {
            mirror_mode: config.mirror_mode,
        },
    ));

    let health_monitor = client.start_health_monitor(Duration::from_secs(60));

    let supervisor =
        ConnectionSupervisor::new(client, auth, engine, config.reconnect_delay);
    let result = supervisor.run().await;
    health_monitor.abort();
    result
}
