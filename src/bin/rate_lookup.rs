use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use shiprate::{cli::StoreArgs, LookupService};
use tracing::info;

/// Look up the stored rates for a package weight
#[derive(Parser, Debug)]
#[command(name = "rate_lookup")]
struct Args {
    /// Package weight in pounds; rounded half-to-even to a whole pound
    #[arg(long, short = 'w', allow_hyphen_values = true)]
    weight: String,

    /// Destination ZIP code, echoed back in the response
    #[arg(long, short = 'z')]
    zip: String,

    #[command(flatten)]
    store: StoreArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    shiprate::cli::init_logging();
    let args = Args::parse();

    let config = args.store.to_config().context("resolving store config")?;
    let service = LookupService::from_config(&config).context("building lookup service")?;

    let request = json!({ "weight": args.weight, "destination_zip": args.zip });
    let response = service.handle_request(&request).await;
    info!(ok = response.get("error").is_none(), "lookup finished");

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
