//! Command line front end for the gym discovery client.
//!
//! Runs the full discovery flow against the HTTP catalog. The device position
//! is taken from `--lat`/`--lon` and location permission is always granted, so
//! a session goes straight from the permission probe to acquisition and search.
//!
//! ```text
//! gym-discovery --lat 28.6139 --lon 77.2090 --radius 5 --pages 2
//! gym-discovery --lat 28.6139 --lon 77.2090 --detail 64f1c0ffee
//! ```
//!
//! Configuration comes from `--config <file.toml>` when given, otherwise from
//! `GYM_DISCOVERY_*` environment variables; flags override both.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use gym_discovery::location::{
    AcquireOptions, Fix, Geolocator, LocationPermissionApi, PermissionStatus, PlatformError,
};
use gym_discovery::observability::init_tracing;
use gym_discovery::ui::render_text;
use gym_discovery::{initialize, Config, DiscoveryPhase, Platform, Position};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gym-discovery")]
#[command(about = "Find gyms near a position", long_about = None)]
struct Cli {
    /// Latitude of the device position
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the device position
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Search radius in kilometers (default from configuration)
    #[arg(short, long)]
    radius: Option<f64>,

    /// Number of pages to load
    #[arg(short, long, default_value_t = 1)]
    pages: u32,

    /// Quick filter applied to the loaded list
    #[arg(short, long)]
    filter: Option<String>,

    /// Print the profile of this gym instead of searching
    #[arg(long)]
    detail: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog base URL
    #[arg(long)]
    api_base_url: Option<String>,

    /// Print log events to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Reports the command line position as the device fix.
struct FixedGeolocator {
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self, _options: AcquireOptions) -> Result<Fix, PlatformError> {
        Ok(Fix::now(self.latitude, self.longitude))
    }
}

struct GrantedPermissions;

#[async_trait]
impl LocationPermissionApi for GrantedPermissions {
    async fn check(&self) -> Result<PermissionStatus, PlatformError> {
        Ok(PermissionStatus::Granted)
    }

    async fn request(&self) -> Result<PermissionStatus, PlatformError> {
        Ok(PermissionStatus::Granted)
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::from_env(),
    };

    if let Some(url) = &cli.api_base_url {
        config.api_base_url.clone_from(url);
    }
    if let Some(radius) = cli.radius {
        config.default_radius_km = radius;
    }
    config.log_to_stderr |= cli.verbose;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let wanted = Position::new(cli.lat, cli.lon).context("invalid --lat/--lon")?;
    init_tracing(&config);

    let platform = Platform {
        permissions: Arc::new(GrantedPermissions),
        geolocator: Arc::new(FixedGeolocator {
            latitude: cli.lat,
            longitude: cli.lon,
        }),
        map: None,
    };
    let mut coordinator = initialize(&config, platform).context("failed to start discovery")?;

    if let Some(id) = &cli.detail {
        match coordinator.gym_detail(id).await? {
            Some(detail) => println!("{detail:#?}"),
            None => println!("No gym with id {id}"),
        }
        return Ok(());
    }

    coordinator.mount()?;
    coordinator.settle().await?;
    // The cache may still hold a position from an earlier run.
    if coordinator.state().position.is_some_and(|cached| cached != wanted) {
        coordinator.refresh()?;
        coordinator.settle().await?;
    }

    for _ in 1..cli.pages {
        if !coordinator.state().session.has_more() {
            break;
        }
        coordinator.load_more()?;
        coordinator.settle().await?;
    }

    if let Some(query) = &cli.filter {
        coordinator.filter_list(query)?;
    }

    print!("{}", render_text(&coordinator.view_model()));

    if let DiscoveryPhase::Error(failure) = coordinator.phase() {
        bail!("discovery failed: {failure}");
    }
    Ok(())
}
