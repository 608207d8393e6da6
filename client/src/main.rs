mod cli;

use cli::Config;
use env_logger::Env;
use log::info;
use x402_request::{Identity, batch, x402::X402Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    let client = X402Client::from_config(&config.x402)?;
    let identity = Identity::new(config.auth_scheme, config.credential.clone())?;

    let text = tokio::fs::read_to_string(&config.request_file).await?;
    let items = batch::parse_items(&text)?;
    info!(
        "Running {} request(s) from {} via wallet service {} ({:?})",
        items.len(),
        config.request_file,
        config.x402.wallet_api_url,
        identity.scheme()
    );

    let outputs = batch::run_batch(&client, &identity, items, config.continue_on_fail).await?;
    println!("{}", serde_json::to_string_pretty(&outputs)?);

    Ok(())
}
