use clap::Parser;
use events_deploy_aws::adapters::AwsCloud;
use events_deploy_aws::cli::DeployArgs;
use events_deploy_aws::telemetry::init_tracing;
use events_deploy_core::artifact::PipResolver;
use events_deploy_core::wait::ThreadSleeper;
use events_deploy_core::{run_deploy, Services};

#[derive(Parser)]
#[command(
    name = "deploy",
    about = "Provision the Events API: table, execution role, function and gateway"
)]
struct Cli {
    #[command(flatten)]
    deploy: DeployArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.deploy.config();

    let cloud = AwsCloud::connect(&config.region).await;
    let resolver = PipResolver::new(cli.deploy.pip.clone());
    let services = Services::from_cloud(&cloud, &resolver, &ThreadSleeper);
    let report = run_deploy(&config, &services)?;

    println!("table:      {}", report.table_name);
    println!("role:       {}", report.role_arn);
    println!(
        "artifact:   {} bytes ({})",
        report.artifact_size_bytes,
        report.delivery.as_str()
    );
    println!("function:   {} ({:?})", report.function_arn, report.function_outcome);
    println!("api:        {}", report.api_id);
    println!("\nAPI URL: {}", report.invocation_url);
    Ok(())
}
