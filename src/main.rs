mod admin;
mod binding;
mod config;
mod error;
mod identity;
mod manifest;
mod mongo_admin;
mod plan;
mod secret;
#[cfg(test)]
mod testing;
mod topology;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use binding::Binder;
use config::AdapterConfig;
use error::BindingError;
use manifest::{DeploymentTopology, Manifest};
use mongo_admin::MongoAdminConnector;
use plan::PlanConfig;
use secret::OsSecretGenerator;
use topology::SequentialLayout;

/// Service adapter that provisions per-binding MongoDB accounts.
///
/// Invoked by the on-demand broker once per binding lifecycle event.
/// Results are written to stdout as JSON; logs go to stderr.
#[derive(Parser)]
#[command(name = "mongodb-service-adapter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Creates and removes MongoDB accounts for service bindings", long_about = None)]
struct Cli {
    /// Adapter settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision an account and print its credentials
    CreateBinding(BindingArgs),
    /// Remove the account belonging to a binding
    DeleteBinding(BindingArgs),
}

#[derive(Args)]
struct BindingArgs {
    binding_id: String,
    /// Instance group to host list, JSON
    bosh_vms: String,
    /// Deployment manifest, YAML
    manifest: String,
    /// Bind request parameters, JSON
    request_params: String,
}

/// Inputs decoded once at the process boundary.
struct BindingInput {
    binding_id: String,
    topology: DeploymentTopology,
    plan: PlanConfig,
}

impl BindingInput {
    fn decode(args: BindingArgs) -> Result<Self> {
        let topology = DeploymentTopology::from_json(&args.bosh_vms)?;
        let manifest = Manifest::from_yaml(&args.manifest)?;
        manifest::parse_request_params(&args.request_params)?;
        let plan = PlanConfig::from_properties(manifest.plan_properties()?)?;
        tracing::debug!(
            "Deployment {} has {} data nodes",
            manifest.name.as_deref().unwrap_or("<unnamed>"),
            topology.mongod_nodes().len()
        );

        Ok(Self {
            binding_id: args.binding_id,
            topology,
            plan,
        })
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AdapterConfig::load(cli.config.as_deref())?;

    let connector = MongoAdminConnector::new(&config);
    let binder = Binder::new(&connector, &OsSecretGenerator, &SequentialLayout);

    match cli.command {
        Command::CreateBinding(args) => {
            let input = BindingInput::decode(args)?;
            let result = binder
                .create_binding(&input.binding_id, input.topology.mongod_nodes(), &input.plan)
                .await?;
            let output = serde_json::json!({ "credentials": result });
            println!("{}", serde_json::to_string(&output)?);
        }
        Command::DeleteBinding(args) => {
            let input = BindingInput::decode(args)?;
            binder
                .delete_binding(&input.binding_id, input.topology.mongod_nodes(), &input.plan)
                .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mongodb_service_adapter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            let code = e
                .downcast_ref::<BindingError>()
                .map_or(1, BindingError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
