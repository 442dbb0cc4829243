use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Brain tumor MRI classification API.
#[derive(Debug, Clone, Parser)]
#[command(name = "brain-tumor-api")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// ONNX export of the trained classifier.
    #[arg(long, env = "MODEL_PATH", default_value = "models/brain_tumor_vit_model.onnx")]
    pub model_path: PathBuf,

    /// Largest accepted upload, in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Number of HTTP worker threads (defaults to the number of CPUs).
    #[arg(long, env = "WORKERS")]
    pub workers: Option<usize>,

    /// Default log filter, overridden by `RUST_LOG`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse_from(["brain-tumor-api"]);

        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.workers.is_none());
    }

    #[test]
    fn every_option_has_help_text() {
        use clap::CommandFactory;

        let command = Config::command();
        for arg in command.get_arguments() {
            if matches!(arg.get_id().as_str(), "help" | "version") {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{} has no help", arg.get_id());
        }
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "brain-tumor-api",
            "--model-path",
            "/srv/model.onnx",
            "--log-format",
            "json",
            "--workers",
            "2",
        ]);

        assert_eq!(config.model_path, PathBuf::from("/srv/model.onnx"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.workers, Some(2));
    }
}
