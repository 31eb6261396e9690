use mango_loader::client::MangaClient;
use mango_loader::config::{required_env, Config, OutputExt, VolumeRange};
use mango_loader::loader::MangaLoader;
use mango_loader::Result;

use clap::Parser;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

use std::path::PathBuf;
use std::process::ExitCode;

/// Download one manga volume (or volume range) into a single archive
#[derive(Parser, Debug)]
#[command(name = "mango-loader")]
struct Args {
    /// Manga name as it appears in the site url
    #[arg(long)]
    name: String,

    /// Worker count of the concurrent stages
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Volume number, the start of the range when --to is given
    #[arg(long, default_value_t = 1)]
    volume: u32,

    /// Last volume of the range, inclusive
    #[arg(long)]
    to: Option<u32>,

    /// Extension of the output file: cbz, cbr or zip
    #[arg(long, default_value_t = OutputExt::Cbz)]
    ext: OutputExt,

    /// Keep the staging directory after archiving
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // a missing .env is fine, the variables may come from the environment itself
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).compact())
        .with(filter)
        .init();

    let args = Args::parse();

    let volumes = match args.to {
        Some(to) if to < args.volume => {
            tracing::error!(
                from = args.volume,
                to,
                "volume range start cannot be greater than its end"
            );
            return ExitCode::FAILURE;
        }
        Some(to) => VolumeRange {
            from: args.volume,
            to,
        },
        None => VolumeRange::single(args.volume),
    };

    match run(args, volumes).await {
        Ok(artifact) => {
            tracing::info!(artifact = %artifact.display(), "volume downloaded");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "load error");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, volumes: VolumeRange) -> Result<PathBuf> {
    let config = Config::builder()
        .api_base_url(required_env("API_URL")?)
        .image_base_url(required_env("IMAGE_URL")?)
        .slug(args.name)
        .volumes(volumes)
        .workers(args.workers)
        .extension(args.ext)
        .retain_staging(args.debug)
        .build();

    let client = MangaClient::new()?;
    let loader = MangaLoader::new(client, config);

    loader.run().await
}
