use mediaquery_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under many small
// allocations, especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (catalog, detector, routes, consumer)
    let app = mediaquery_api::setup::initialize_app(config.clone()).await?;

    // Serve until SIGINT/SIGTERM, then drain the consumer
    mediaquery_api::setup::server::run(&config, app).await?;

    Ok(())
}
