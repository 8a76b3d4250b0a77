use safelens_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, classifier, state, routes)
    let (_state, router) = safelens_web::setup::initialize_app(config.clone()).await?;

    // Start the server
    safelens_web::setup::server::start_server(&config, router).await?;

    Ok(())
}
