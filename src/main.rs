use std::{io::BufReader, path::PathBuf, process::exit};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use socialwall::{
    config::Config, controls, error, filter::Filter, sources::socketio::SocketIoSource,
    view::ViewController, wall::Wall,
};

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Toml configuration. Defaults are used when the file does not exist.
    #[clap(short, long, value_parser, default_value = "socialwall.toml")]
    config: String,

    /// Rendered page. Overrides `output` from config.
    #[clap(short, long, value_parser)]
    output: Option<String>,

    /// Initial filter: all, youtube, instagram or tiktok.
    #[clap(short, long, value_parser, default_value = "all")]
    filter: String,

    /// Backend origin. Overrides `endpoint` from config.
    #[clap(long, value_parser)]
    endpoint: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("socialwall=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to read config {}: {}", args.config, e);
            exit(1);
        }
    };

    if let Some(endpoint) = args.endpoint {
        cfg.endpoint = endpoint;
    }
    let output = PathBuf::from(args.output.unwrap_or_else(|| cfg.output.clone()));

    let filter: Filter = match args.filter.parse() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cfg, output, filter)) {
        eprintln!("[FAILURE] {}", e);
        exit(1);
    }
}

async fn run(cfg: Config, output: PathBuf, filter: Filter) -> error::Result<()> {
    let source = SocketIoSource::new(cfg.endpoint, cfg.event);
    let view = ViewController::new(filter, cfg.page.instructions_open);
    let mut wall = Wall::mount(&source, view, cfg.page, output);

    let commands = controls::spawn_reader(BufReader::new(std::io::stdin()));

    tokio::select! {
        res = wall.run(Box::pin(commands)) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(())
        }
    }
}
