use hirebase_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (registry, router, services, routes)
    let (state, router) = hirebase_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    hirebase_api::setup::server::start_server(&config, router).await?;

    state.router.close_all().await;
    Ok(())
}
