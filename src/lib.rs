use std::sync::Arc;

use anyhow::Context;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod logging;

pub use domain::{entities, use_cases};
pub use interfaces::repositories;
pub use infrastructure::{auth, db, device, imaging, notify, storage};

use auth::local_session::{StaticAuthProvider, StaticProfileGuard};
use db::memory::InMemoryScanRepo;
use device::path_source::PathImageSource;
use imaging::jpeg::JpegCompressor;
use notify::log::TracingNotifier;
use repositories::session::{AuthProvider, ProfileGuard};
use storage::local::LocalObjectStorage;
use use_cases::{
    home::HomeScreenController,
    scan_cache::{ScanCache, ScanCacheOptions},
    upload::UploadScanHandler,
};

pub type LocalUploadHandler = UploadScanHandler<JpegCompressor, LocalObjectStorage, InMemoryScanRepo>;
pub type LocalHomeScreen = HomeScreenController<JpegCompressor, LocalObjectStorage, InMemoryScanRepo, PathImageSource>;

/// Services wired from configuration with the local adapters.
pub struct AppState {
    pub home: LocalHomeScreen,
    pub scan_repo: InMemoryScanRepo,
    pub auth: Arc<StaticAuthProvider>,
    pub profile: Arc<StaticProfileGuard>,
}

impl AppState {
    pub async fn new(config: &settings::AppConfig, image_source: PathImageSource) -> anyhow::Result<Self> {
        let auth = Arc::new(StaticAuthProvider::from(config));
        let profile = Arc::new(StaticProfileGuard::new(config.profile_complete));
        let notifier = Arc::new(TracingNotifier);
        let scan_repo = InMemoryScanRepo::new();

        let user = auth
            .current_user()
            .context("a signed-in user is required to open the scan cache")?;

        let storage = LocalObjectStorage::new(&config.storage_root, config.public_base_url.as_deref())
            .context("invalid object storage configuration")?;
        let compressor = JpegCompressor::new(&config.scratch_dir, config.jpeg_quality);

        let uploader = UploadScanHandler::new(
            compressor,
            storage,
            scan_repo.clone(),
            auth.clone(),
            notifier.clone(),
        );

        let scans = ScanCache::open(
            scan_repo.clone(),
            user.uid,
            ScanCacheOptions {
                initial_page_size: config.initial_page_size,
                enabled: profile.is_profile_complete(),
            },
            notifier.clone(),
        )
        .await;

        let home = HomeScreenController::new(uploader, scans, image_source, auth.clone(), profile.clone(), notifier);

        Ok(AppState {
            home,
            scan_repo,
            auth,
            profile,
        })
    }
}
