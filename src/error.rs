use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Model not found: {0}")]
	ModelNotFound(String),

	#[error("Failed to load model: {0}")]
	ModelLoadFailed(String),

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Schema mismatch for {model}: expected {expected} features, got {actual}")]
	SchemaMismatch {
		model: String,
		expected: usize,
		actual: usize,
	},

	#[error("Download failed: {0}")]
	DownloadFailed(String),

	#[error("Configuration error: {0}")]
	ConfigError(String),

	#[error("Prediction error: {0}")]
	PredictionError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	SerializationError(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::de::Error> for Error {
	fn from(err: toml::de::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

impl From<toml::ser::Error> for Error {
	fn from(err: toml::ser::Error) -> Self {
		Error::SerializationError(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_mismatch_message_names_both_widths() {
		let err = Error::SchemaMismatch {
			model: "heart".to_string(),
			expected: 13,
			actual: 12,
		};
		assert_eq!(
			err.to_string(),
			"Schema mismatch for heart: expected 13 features, got 12"
		);
	}

	#[test]
	fn io_errors_convert() {
		let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
		let err: Error = io.into();
		assert!(matches!(err, Error::IoError(_)));
		assert_eq!(err.to_string(), "IO error: gone");
	}
}
