use std::sync::Arc;

use wellness_onboarding::adapters::{FileLocalStore, HttpOnboardingApi, InMemoryLocalStore};
use wellness_onboarding::application::{OnboardingEngine, PersistenceAdapter};
use wellness_onboarding::config::{AppConfig, StorageBackend};
use wellness_onboarding::domain::onboarding::{FlowDefinition, FlowVariant};
use wellness_onboarding::ports::LocalStore;
use wellness_onboarding::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init(&config.logging)?;

    let variant: FlowVariant = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => FlowVariant::Client,
    };

    let local: Arc<dyn LocalStore> = match config.storage.backend {
        StorageBackend::File => Arc::new(FileLocalStore::new(&config.storage.dir)),
        StorageBackend::Memory => Arc::new(InMemoryLocalStore::new()),
    };
    let remote = Arc::new(HttpOnboardingApi::from_config(&config.api)?);

    tracing::info!(
        %variant,
        storage = ?config.storage.backend,
        api = %config.api.base_url,
        "Starting onboarding"
    );

    let engine = OnboardingEngine::mount_with(
        FlowDefinition::for_variant(variant),
        PersistenceAdapter::new(local, remote),
        config.engine.policy(),
    );

    let progress = engine.progress();
    eprintln!("{} ({}% complete)", progress.step_label(), progress.percent_complete());
    println!("{}", serde_json::to_string_pretty(&progress)?);

    engine.unmount();
    Ok(())
}
