use clap::{Parser, Subcommand};
use fitting_room::credentials::EnvCredentials;
use fitting_room::fetch::{ProxyImageFetcher, ProxySettings};
use fitting_room::generation::{GenerationClient, GenerationSettings, HttpGenerationBackend};
use fitting_room::imaging::{ImageNormalizer, Quality, RustBackend};
use fitting_room::orchestrator::TryOnOrchestrator;
use fitting_room::payload::ImagePayload;
use fitting_room::types::TryOnRequest;
use fitting_room::{catalog, config, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "fitting-room")]
#[command(about = "Virtual try-on: see yourself wearing a catalog product")]
#[command(long_about = "\
Virtual try-on: see yourself wearing a catalog product

Given a photo of a person and a product from the catalog, fitting-room:

  1. fetches the product image (through a resize proxy, or from an
     embedded data: URI),
  2. asks the generation backend to recommend a size (XS, S, M, L, XL, XXL),
  3. asks it to render the person wearing the product,
  4. saves the composite image.

The API key is read from the environment variable named by
backend.api_key_env (default API_KEY) on every backend call.

Logs go to stderr; set RUST_LOG (e.g. RUST_LOG=debug) to adjust.

Run 'fitting-room gen-config' to generate a documented fitting-room.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Product catalog
    #[arg(long, default_value = "catalog.toml", global = true)]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the products in the catalog
    Catalog,
    /// Run one try-on attempt and save the composite
    TryOn(TryOnArgs),
    /// Print a stock fitting-room.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct TryOnArgs {
    /// Photo of the person (JPEG, PNG, WebP, GIF or BMP)
    #[arg(long)]
    photo: PathBuf,

    /// Product id from the catalog
    #[arg(long)]
    product: String,

    /// Where to save the composite [default: try-on.<ext>]
    #[arg(long)]
    out: Option<PathBuf>,

    /// Require an explicitly selected key before starting
    #[arg(long)]
    gated: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Err(e) = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("tracing init failed: {e}");
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Catalog => {
            let products = catalog::load_catalog(&cli.catalog)?;
            output::print_catalog(&products);
        }
        Command::TryOn(args) => {
            return try_on(cli.config.as_deref(), &cli.catalog, args).await;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn try_on(
    config_path: Option<&Path>,
    catalog_path: &Path,
    args: TryOnArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let products = catalog::load_catalog(catalog_path)?;
    let product = catalog::find_product(&products, &args.product).ok_or_else(|| {
        format!(
            "unknown product '{}'; run 'fitting-room catalog' to list products",
            args.product
        )
    })?;
    let photo = ImagePayload::from_bytes(std::fs::read(&args.photo)?)?;

    let orchestrator = build_orchestrator(&config)?.requiring_key_selection(args.gated);

    let mut progress = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let stage = progress.borrow_and_update().stage;
            output::print_stage(stage);
            if stage.is_terminal() {
                break;
            }
        }
    });

    let request = TryOnRequest {
        user_image: photo,
        product: product.clone(),
    };
    let outcome = orchestrator.run(&request).await;
    if let Err(e) = printer.await {
        warn!(error = %e, "progress printer stopped");
    }

    match outcome {
        Ok(result) => {
            let out = args.out.unwrap_or_else(|| {
                PathBuf::from(format!("try-on.{}", result.composite.file_extension()))
            });
            std::fs::write(&out, result.composite.data())?;
            output::print_result(&result, &out);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            output::print_error(&error, &config.backend.api_key_env);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn build_orchestrator(
    config: &config::AppConfig,
) -> Result<TryOnOrchestrator, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(config.backend.timeout_secs);
    let credentials = Arc::new(EnvCredentials::new(config.backend.api_key_env.clone()));

    let backend = HttpGenerationBackend::new(config.backend.endpoint_url()?, timeout)?;
    let normalizer = ImageNormalizer::new(
        Arc::new(RustBackend::new()),
        Quality::new(config.images.quality),
    );
    let client = GenerationClient::new(
        Arc::new(backend),
        credentials.clone(),
        normalizer,
        GenerationSettings::from_config(config),
    );

    let fetcher = ProxyImageFetcher::new(
        ProxySettings {
            endpoint: config.proxy.endpoint_url()?,
            width: config.proxy.width,
            format: config.proxy.format.clone(),
        },
        timeout,
    )?;

    Ok(TryOnOrchestrator::new(Arc::new(fetcher), client, credentials)
        .with_pacing(Duration::from_millis(config.pacing.delay_ms)))
}
