use clap::{Parser, Subcommand};
use makerfolio::{admin, config, output, pipeline, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "makerfolio")]
#[command(about = "Static site builder for a maker portfolio")]
#[command(long_about = "\
Static site builder for a maker portfolio

Every folder under the image root that directly holds images becomes a
project gallery. The build writes thumbnails, one JSON manifest per project,
a site index and the HTML pages.

Site layout (all paths configurable in config.toml):

  site/
  ├── config.toml                  # Optional, see 'makerfolio gen-config'
  ├── projects-metadata.json       # Titles, years, tags, site settings
  ├── image-orders.json            # Custom image order per project
  ├── hidden-images.json           # Images left out of the public gallery
  ├── images/
  │   ├── Gokart/                  # Project 'gokart'
  │   │   ├── img1.jpg
  │   │   └── final/               # Staging folder, skipped
  │   └── BSA/
  │       └── Camporee/            # Project 'bsa-camporee'
  ├── gen/                         # thumbnails/, manifests/, site-index.json
  ├── projects/                    # <slug>.html
  └── index.html

The admin server ('serve') reads its password from ADMIN_PASSWORD.
Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → thumbnails → manifests → pages → index
    Build,
    /// List the projects the scanner finds, without writing anything
    Scan,
    /// Generate missing or stale thumbnails only
    Thumbnails,
    /// Rewrite the per-project manifests only
    Manifests,
    /// Serve the site with the admin API
    Serve {
        /// Listen address (overrides [server] address)
        #[arg(long)]
        address: Option<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        command => run(command, &cli.root)?,
    }

    Ok(())
}

/// Run a command that works on a site root.
fn run(command: Command, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let site_config = config::load_config(root)?;
    let layout = site_config.layout(root);

    match command {
        Command::Build => {
            init_thread_pool(&site_config.processing);
            println!("==> Building {}", root.display());
            let report = pipeline::run_build(root, &site_config)?;
            output::print_build_summary(&report, &layout.images);
            println!("==> Build complete");
        }
        Command::Scan => {
            println!("==> Scanning {}", layout.images.display());
            let result = scan::scan(&layout.images, &site_config.exclusion_policy())?;
            output::print_scan_output(&result, &layout.images);
        }
        Command::Thumbnails => {
            init_thread_pool(&site_config.processing);
            let stats = pipeline::write_all_thumbnails(root, &site_config)?;
            println!("{}", output::format_thumbnail_stats(&stats));
        }
        Command::Manifests => {
            let manifests = pipeline::write_all_manifests(root, &site_config)?;
            output::print_manifests_output(&manifests);
        }
        Command::Serve { address } => {
            init_thread_pool(&site_config.processing);
            let address = address.unwrap_or_else(|| site_config.server.address.clone());
            let state = admin::AdminState::from_env(root, site_config);
            tokio::runtime::Runtime::new()?.block_on(admin::serve(state, &address))?;
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores; config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
