mod app;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use entigraph::ViewerConfig;
use entigraph::source::DirectorySource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding `<name>.json` datasets.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Dataset to open first; defaults to the first one found.
    #[arg(long)]
    dataset: Option<String>,

    /// Node attribute mapped to radius [default: pagerank]
    #[arg(long)]
    size_metric: Option<String>,

    /// Node attribute mapped to color [default: referenced_by_count]
    #[arg(long)]
    color_metric: Option<String>,

    /// JSON viewer config with layout tunables and drag behaviour.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => match ViewerConfig::from_path(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err:#}");
                return ExitCode::FAILURE;
            }
        },
        None => ViewerConfig::default(),
    };
    if let Some(metric) = args.size_metric {
        config.encoding.size_metric = metric;
    }
    if let Some(metric) = args.color_metric {
        config.encoding.color_metric = metric;
    }

    let source = Arc::new(DirectorySource::new(args.data_dir));
    let dataset = args.dataset;
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "entigraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::EntigraphApp::new(
                cc,
                source,
                config,
                dataset,
            )))
        }),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("viewer exited with an error: {err}");
            ExitCode::FAILURE
        }
    }
}
