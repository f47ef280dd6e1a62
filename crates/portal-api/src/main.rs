use portal_api::setup;
use portal_core::Config;

// Use mimalloc as the global allocator for lower fragmentation in long-running containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, database, storage, services, routes)
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Background maintenance
    let _sweeper = state.sweeper.clone().start();
    let _limiter_cleanup = setup::routes::spawn_limiter_cleanup(&state);

    setup::server::start_server(&config, router).await?;

    Ok(())
}
