use clap::Parser;
use events_deploy_aws::adapters::AwsCloud;
use events_deploy_aws::cli::TargetArgs;
use events_deploy_aws::telemetry::init_tracing;
use events_deploy_core::inspect::inspect_function;

#[derive(Parser)]
#[command(name = "inspect", about = "Show the deployed function's configuration and recent logs")]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Cli::parse().target.config();

    let cloud = AwsCloud::connect(&config.region).await;
    let inspection = inspect_function(&cloud, &cloud, &config.function_name)?;

    let function = &inspection.configuration;
    println!("Function: {}", function.name);
    println!("Runtime:  {}", function.runtime);
    println!("Handler:  {}", function.handler);
    println!("Role:     {}", function.role);
    println!("Memory:   {} MB", function.memory_mb);
    println!("Timeout:  {} s", function.timeout_secs);
    println!(
        "Environment:\n{}",
        serde_json::to_string_pretty(&function.environment)?
    );

    match (&inspection.log_stream, &inspection.log_error) {
        (_, Some(error)) => println!("\nCould not read logs: {error}"),
        (None, None) => println!("\nNo log streams in {}", inspection.log_group),
        (Some(stream), None) => {
            println!("\nRecent events from {stream}:");
            for event in &inspection.recent_events {
                println!("{event}");
            }
        }
    }
    Ok(())
}
