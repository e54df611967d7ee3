//! Optional flags layered over [`DeployConfig::default`]. No binary requires
//! an argument.

use std::path::PathBuf;

use clap::Args;
use events_deploy_core::DeployConfig;

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// AWS region to deploy into
    #[arg(long, env = "AWS_REGION", default_value = "us-west-2")]
    pub region: String,

    /// Table name, also exported to the function as DYNAMODB_TABLE
    #[arg(long, env = "DYNAMODB_TABLE")]
    pub table_name: Option<String>,

    /// Function name (defaults to EventsApiFunction)
    #[arg(long)]
    pub function_name: Option<String>,
}

impl TargetArgs {
    pub fn config(&self) -> DeployConfig {
        let table_name = self.table_name.clone();
        let mut config = DeployConfig::default().with_table_override(table_name);
        config.region = self.region.clone();
        let function_name = self.function_name.as_deref().map(str::trim);
        if let Some(name) = function_name.filter(|name| !name.is_empty()) {
            config.function_name = name.to_string();
        }
        config
    }
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Directory holding the function sources and requirements.txt
    #[arg(long, env = "EVENTS_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Delete every API with the same name before creating a new one
    #[arg(long)]
    pub replace_existing_gateway: bool,

    /// Program used to install requirements.txt
    #[arg(long, default_value = "pip")]
    pub pip: String,
}

impl DeployArgs {
    pub fn config(&self) -> DeployConfig {
        let mut config = self.target.config();
        if let Some(dir) = &self.source_dir {
            config = config.with_source_dir(dir);
        }
        config.replace_existing_gateway = self.replace_existing_gateway;
        config
    }
}
