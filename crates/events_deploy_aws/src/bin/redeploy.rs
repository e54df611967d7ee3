use clap::Parser;
use events_deploy_aws::adapters::AwsCloud;
use events_deploy_aws::cli::TargetArgs;
use events_deploy_aws::telemetry::init_tracing;
use events_deploy_core::gateway::teardown_gateways;
use events_deploy_core::wait::ThreadSleeper;

#[derive(Parser)]
#[command(
    name = "redeploy",
    about = "Delete every Events API gateway so the next deploy starts clean"
)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Cli::parse().target.config();

    let cloud = AwsCloud::connect(&config.region).await;
    let deleted = teardown_gateways(&cloud, &ThreadSleeper, &config.api_name)?;

    if deleted.is_empty() {
        println!("No API named {} found", config.api_name);
    }
    for api_id in &deleted {
        println!("Deleted API {api_id}");
    }
    println!("\nNow run: deploy");
    Ok(())
}
