use crate::schema::Disease;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "medpredict")]
#[command(version, about = "Multiple disease prediction assistant", long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Download model artifacts that are not cached yet
	///
	/// Artifacts are fetched as `<base_url>/<disease>_model.json` and must be
	/// JSON model documents. The built-in base URL only serves the legacy
	/// pickled `.sav` models, so point MEDPREDICT_BASE_URL (or `base_url` in
	/// the config file) at a host that publishes the JSON artifacts.
	Fetch {
		/// Model to fetch (all models when omitted)
		#[arg(value_enum)]
		disease: Option<Disease>,
	},

	/// Show which model artifacts are cached locally
	List,

	/// Print the ordered input fields of a model
	Schema {
		#[arg(value_enum)]
		disease: Disease,
	},

	/// Run a single prediction
	Predict {
		#[arg(value_enum)]
		disease: Disease,

		/// Full feature vector in schema order (e.g. "6,148,72,35,0,33.6,0.627,50")
		#[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "input")]
		values: Vec<f64>,

		/// Named form input; unspecified fields default to 0 (e.g. --input glucose=148)
		#[arg(long, value_parser = parse_input)]
		input: Vec<(String, f64)>,

		/// Print the outcome as JSON
		#[arg(long)]
		json: bool,
	},

	/// Start the HTTP API server (all models loaded at startup)
	Serve {
		/// Port to listen on
		#[arg(long, default_value = "8080")]
		port: u16,

		/// Host to bind to
		#[arg(long, default_value = "0.0.0.0")]
		host: String,
	},
}

fn parse_input(s: &str) -> Result<(String, f64), String> {
	let (name, value) = s
		.split_once('=')
		.ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;

	let value = value
		.trim()
		.parse::<f64>()
		.map_err(|e| format!("invalid value for {}: {}", name, e))?;

	Ok((name.trim().to_string(), value))
}
