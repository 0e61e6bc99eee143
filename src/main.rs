use std::{env, path::PathBuf};

use scan_ingest::{
    device::path_source::PathImageSource,
    entities::asset::CaptureSource,
    logging,
    settings::AppConfig,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&config);
    tracing::info!("Loaded configuration: {:?}", config);

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: scan_ingest <image>...");
        std::process::exit(2);
    }

    let uploads = paths.len();
    let state = AppState::new(&config, PathImageSource::new(paths)).await?;
    let home = &state.home;

    tracing::info!(
        "Starting {} v{} for {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        home.greeting_name()
    );

    let mut succeeded = 0;
    for _ in 0..uploads {
        if let Some(result) = home.upload_from(CaptureSource::Library).await {
            tracing::info!("Scan {} available at {}", result.scan_id, result.download_url);
            succeeded += 1;
        }
    }

    if home.view_history() {
        home.scans.fetch_total_count().await;
        home.scans.fetch_page(1, config.history_page_size).await;
    }

    let snapshot = home.scans.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!("{}", serde_json::to_string_pretty(&home.latest_scan_panel())?);

    tracing::info!("{}/{} scans uploaded", succeeded, uploads);
    Ok(())
}
