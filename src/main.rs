mod cli;
mod config;
mod error;
mod model;
mod predict;
mod schema;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use model::{ArtifactRegistry, ArtifactStore};
use schema::{Disease, FeatureVector};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;

    match cli.command {
        Commands::Fetch { disease } => {
            let store = ArtifactStore::from_config(config)?;
            let targets = match disease {
                Some(disease) => vec![disease],
                None => Disease::ALL.to_vec(),
            };

            for disease in targets {
                let path = store.ensure_local(disease)?;
                println!("✓ {}: {:?}", disease, path);
            }
        }

        Commands::List => {
            let store = ArtifactStore::from_config(config)?;
            let registry = ArtifactRegistry::load_or_default(store.config());

            println!("Model artifacts in {:?}:\n", store.config().models_dir);
            for disease in Disease::ALL {
                let path = store.local_path(disease);
                let status = if path.exists() { "cached" } else { "missing" };
                println!("  {} ({})", disease, status);
                println!("    Source: {}", store.remote_url(disease));
                if let Some(info) = registry.get(disease) {
                    println!("    Fetched: {} ({} bytes)", info.fetched_at, info.bytes);
                }
                println!();
            }
        }

        Commands::Schema { disease } => {
            println!("{} ({} fields):\n", disease.title(), disease.width());
            for (i, field) in disease.fields().iter().enumerate() {
                println!(
                    "  {:>2}. {:<28} {:<8} {}",
                    i + 1,
                    field.name,
                    format!("{:?}", field.kind).to_lowercase(),
                    field.label
                );
            }
        }

        Commands::Predict {
            disease,
            values,
            input,
            json,
        } => {
            let features = assemble(disease, &values, &input)?;

            let store = ArtifactStore::from_config(config)?;
            let model = store.load(disease)?;
            let label = predict::predict(&model, &features)?;
            let outcome = predict::Outcome {
                disease,
                label,
                message: predict::message(disease, label),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.message);
            }
        }

        Commands::Serve { port, host } => {
            let store = ArtifactStore::from_config(config)?;
            let models = store.load_all()?;
            let state = server::AppState::new(models);

            println!("🚀 Medpredict server starting...");
            println!("   Listening on: http://{}:{}", host, port);
            println!("   Health: http://{}:{}/api/health", host, port);
            println!("   Predict: http://{}:{}/api/predict/<disease>", host, port);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(&host, port, state))?;
        }
    }

    Ok(())
}

fn assemble(disease: Disease, values: &[f64], inputs: &[(String, f64)]) -> Result<FeatureVector> {
    if !values.is_empty() {
        return disease.assemble(values);
    }

    disease.assemble_inputs(inputs.iter().map(|(name, value)| (name.as_str(), *value)))
}
