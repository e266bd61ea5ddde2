//! Cargomail - contacts backend
//!
//! Opens the store, applies the schema and reports its state.

use cargomail::db::pool::{get_pool_stats, health_check};
use cargomail::models::SequenceKind;
use cargomail::{config, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cargomail=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::init();
    tracing::info!("Opening contact store at {}", config.database.path);

    let state = AppState::new().await?;
    health_check(&state.db).await?;

    let stats = get_pool_stats(&state.db);
    tracing::info!(
        size = stats.size,
        idle = stats.idle,
        max_connections = stats.max_connections,
        "Database pool ready"
    );

    for user in state.users.list().await? {
        let timeline = state.sequencer.current(user.id, SequenceKind::Timeline).await?;
        let history = state.sequencer.current(user.id, SequenceKind::History).await?;
        tracing::info!(
            user_id = user.id,
            user = %user.display(),
            timeline,
            history,
            "Contact sequences"
        );
    }

    tracing::info!("Contact store initialized");

    Ok(())
}
