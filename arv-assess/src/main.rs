//! arv-assess - Assessment view driver
//!
//! Loads a JSON dataset into in-memory collaborators and prints list or
//! detail views as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use arv_assess::memory::MemoryBackend;
use arv_assess::{AssessmentViewService, Collaborators};
use arv_common::config::{load_config, resolve_config_path, TomlConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arv-assess", version, about = "Materialize assessment views from a dataset")]
struct Cli {
    /// Config file (overrides ARV_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON dataset to serve collaborators from
    #[arg(long, env = "ARV_DATASET")]
    dataset: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List rows for every assessment (or the given ids)
    List {
        #[arg(long, value_delimiter = ',')]
        assessment_ids: Vec<String>,
    },
    /// Detail record for one assessment
    Detail { assessment_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config_logged(cli.config.as_deref(), std::io::stderr)?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid logging level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting arv-assess");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match resolve_config_path(cli.config.as_deref()) {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: defaults"),
    }
    info!("Dataset: {}", cli.dataset.display());

    let backend = Arc::new(
        MemoryBackend::from_json_file(&cli.dataset)
            .with_context(|| format!("Failed to load dataset {}", cli.dataset.display()))?,
    );
    let assessments = backend.dataset().assessments.clone();
    let service = AssessmentViewService::new(Collaborators::from_backend(backend), config.engine);

    let output = match cli.command {
        Command::List { assessment_ids } => {
            let selected: Vec<_> = assessments
                .into_iter()
                .filter(|a| assessment_ids.is_empty() || assessment_ids.contains(&a.id))
                .collect();
            serde_json::to_string_pretty(&service.list_views(selected).await?)?
        }
        Command::Detail { assessment_id } => {
            let assessment = assessments
                .into_iter()
                .find(|a| a.id == assessment_id)
                .with_context(|| format!("Assessment {} not in dataset", assessment_id))?;
            serde_json::to_string_pretty(&service.detail_view(assessment).await?)?
        }
    };

    println!("{}", output);
    Ok(())
}

/// Load configuration under a warn-level bootstrap subscriber
///
/// The global subscriber depends on the configured level, so config warnings
/// are emitted before it exists.
fn load_config_logged<W>(cli_arg: Option<&Path>, writer: W) -> arv_common::Result<TomlConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || load_config(cli_arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_config_warning_is_emitted() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        let captured = Captured::default();
        let sink = captured.clone();

        let config = load_config_logged(Some(&missing), move || sink.clone()).unwrap();

        assert_eq!(config, TomlConfig::default());
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("not found, using defaults"), "output: {}", output);
        assert!(output.contains("absent.toml"));
    }

    #[test]
    fn test_cli_parses_detail_command() {
        let cli = Cli::try_parse_from(["arv-assess", "--dataset", "data.json", "detail", "a1"]).unwrap();
        assert_eq!(cli.dataset, PathBuf::from("data.json"));
        assert!(matches!(cli.command, Command::Detail { assessment_id } if assessment_id == "a1"));
    }
}
