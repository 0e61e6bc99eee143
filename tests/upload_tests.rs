
use std::sync::{atomic::Ordering, Arc};

use parking_lot::Mutex;
use scan_ingest::{
    db::memory::InMemoryScanRepo,
    entities::{
        asset::{CompressedImage, ImageFormat, ScanAsset},
        scan::{ScanId, ScanStatus, StoredObject},
    },
    errors::{BackendError, PreprocessError, ScanError},
    imaging::jpeg::JpegCompressor,
    repositories::scan::ScanRepository,
    storage::local::LocalObjectStorage,
    use_cases::upload::UploadScanHandler,
};
use test_utils::*;

fn fake_compressed() -> CompressedImage {
    CompressedImage::new("/nonexistent/compressed.jpg".into(), ImageFormat::Jpeg, 0.75, 10)
}

#[tokio::test]
async fn upload_stores_binary_then_record_with_matching_scan_id() {
    let repo = InMemoryScanRepo::new();
    let storage = RecordingStorage::default();
    let notifier = Arc::new(RecordingNotifier::default());
    let handler = UploadScanHandler::new(
        PassthroughPreprocessor::default(),
        storage.clone(),
        repo.clone(),
        signed_in(),
        notifier.clone(),
    );

    let result = handler.upload_scan(&ScanAsset::new("/photos/a.png")).await.unwrap();

    assert_eq!(result.storage_path, format!("scans/{}/{}.jpg", TEST_USER, result.scan_id));
    assert_eq!(storage.uploads.lock().len(), 1);

    let listed = repo.list_scans(TEST_USER, 1, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].scan_id, result.scan_id);
    assert_eq!(listed[0].image_path, result.storage_path);
    assert_eq!(listed[0].download_url, result.download_url);
    assert_eq!(listed[0].status, ScanStatus::PendingAnalysis);

    assert!(notifier.notices().is_empty());
    assert!(!handler.is_uploading());
}

#[tokio::test]
async fn upload_without_user_performs_no_io() {
    let mut preprocessor = MockPreprocessor::new();
    preprocessor.expect_compress().times(0);
    let mut storage = MockStorage::new();
    storage.expect_upload_scan_image().times(0);
    let mut repo = MockScanRepo::new();
    repo.expect_create_scan_document().times(0);

    let notifier = Arc::new(RecordingNotifier::default());
    let handler = UploadScanHandler::new(preprocessor, storage, repo, signed_out(), notifier.clone());

    let result = handler.upload_scan(&ScanAsset::new("/photos/a.png")).await;

    assert!(result.is_none());
    assert_eq!(notifier.titles(), ["Authentication Required"]);
    assert!(!handler.is_uploading());
}

#[tokio::test]
async fn try_upload_reports_authentication_required() {
    let handler = UploadScanHandler::new(
        MockPreprocessor::new(),
        MockStorage::new(),
        MockScanRepo::new(),
        signed_out(),
        Arc::new(RecordingNotifier::default()),
    );

    let err = handler.try_upload_scan(&ScanAsset::new("/photos/a.png")).await.unwrap_err();
    assert!(matches!(err, ScanError::AuthenticationRequired));
}

#[tokio::test]
async fn preprocess_failure_aborts_before_storage() {
    let mut preprocessor = MockPreprocessor::new();
    preprocessor
        .expect_compress()
        .times(1)
        .returning(|_| Err(PreprocessError::UnsupportedFormat("image/heic".into())));
    let mut storage = MockStorage::new();
    storage.expect_upload_scan_image().times(0);
    let mut repo = MockScanRepo::new();
    repo.expect_create_scan_document().times(0);

    let notifier = Arc::new(RecordingNotifier::default());
    let handler = UploadScanHandler::new(preprocessor, storage, repo, signed_in(), notifier.clone());

    assert!(handler.upload_scan(&ScanAsset::new("/photos/a.heic")).await.is_none());
    assert_eq!(notifier.titles(), ["Upload Failed"]);
    assert!(!handler.is_uploading());
}

#[tokio::test]
async fn storage_failure_never_creates_a_document() {
    let mut preprocessor = MockPreprocessor::new();
    preprocessor.expect_compress().returning(|_| Ok(fake_compressed()));
    let mut storage = MockStorage::new();
    storage
        .expect_upload_scan_image()
        .times(1)
        .returning(|_, _, _| Err(BackendError::Transport("timeout".into())));
    let mut repo = MockScanRepo::new();
    repo.expect_create_scan_document().times(0);

    let notifier = Arc::new(RecordingNotifier::default());
    let handler = UploadScanHandler::new(preprocessor, storage, repo, signed_in(), notifier.clone());

    let err = handler.try_upload_scan(&ScanAsset::new("/photos/a.png")).await.unwrap_err();
    assert!(matches!(err, ScanError::UploadFailed(_)));
    assert!(!handler.is_uploading());
}

#[tokio::test]
async fn record_failure_after_upload_is_a_full_failure() {
    let mut preprocessor = MockPreprocessor::new();
    preprocessor.expect_compress().returning(|_| Ok(fake_compressed()));

    let stored_id: Arc<Mutex<Option<ScanId>>> = Arc::default();
    let seen = stored_id.clone();
    let mut storage = MockStorage::new();
    storage
        .expect_upload_scan_image()
        .times(1)
        .returning(move |user, scan_id, _| {
            assert_eq!(user, TEST_USER);
            *seen.lock() = Some(scan_id.clone());
            Ok(StoredObject {
                storage_path: format!("scans/{}/{}.jpg", user, scan_id),
                download_url: "https://storage.test/x".into(),
            })
        });

    let expected = stored_id.clone();
    let mut repo = MockScanRepo::new();
    repo.expect_create_scan_document()
        .withf(move |record| {
            Some(&record.scan_id) == expected.lock().as_ref()
                && record.status == ScanStatus::PendingAnalysis
                && record.image_path.ends_with(&format!("{}.jpg", record.scan_id))
        })
        .times(1)
        .returning(|_| Err(BackendError::Validation("rejected".into())));

    let notifier = Arc::new(RecordingNotifier::default());
    let handler = UploadScanHandler::new(preprocessor, storage, repo, signed_in(), notifier.clone());

    assert!(handler.upload_scan(&ScanAsset::new("/photos/a.png")).await.is_none());
    assert_eq!(notifier.titles(), ["Upload Failed"]);
    assert!(stored_id.lock().is_some());
}

#[tokio::test]
async fn empty_asset_uri_fails_without_compressing() {
    let mut preprocessor = MockPreprocessor::new();
    preprocessor.expect_compress().times(0);
    let handler = UploadScanHandler::new(
        preprocessor,
        MockStorage::new(),
        MockScanRepo::new(),
        signed_in(),
        Arc::new(RecordingNotifier::default()),
    );

    let err = handler.try_upload_scan(&ScanAsset::new("")).await.unwrap_err();
    assert!(matches!(err, ScanError::UploadFailed(_)));
}

#[tokio::test]
async fn concurrent_uploads_each_get_their_own_scan() {
    let repo = InMemoryScanRepo::new();
    let handler = UploadScanHandler::new(
        PassthroughPreprocessor::default(),
        RecordingStorage::default(),
        repo.clone(),
        signed_in(),
        Arc::new(RecordingNotifier::default()),
    );

    let a = ScanAsset::new("/photos/a.png");
    let b = ScanAsset::new("/photos/b.png");
    let (first, second) = futures::join!(handler.upload_scan(&a), handler.upload_scan(&b));

    let first = first.unwrap();
    let second = second.unwrap();
    assert_ne!(first.scan_id, second.scan_id);
    assert_eq!(repo.count_scans(TEST_USER).await.unwrap(), 2);
    assert_eq!(handler.preprocessor.calls.load(Ordering::SeqCst), 2);
    assert!(!handler.is_uploading());
}

#[tokio::test]
async fn uploading_flag_tracks_every_call_in_flight() {
    let repo = InMemoryScanRepo::new();
    let storage = RecordingStorage::default();
    storage.hold_uploads();
    let handler = UploadScanHandler::new(
        PassthroughPreprocessor::default(),
        storage.clone(),
        repo.clone(),
        signed_in(),
        Arc::new(RecordingNotifier::default()),
    );
    assert!(!handler.is_uploading());

    let a = ScanAsset::new("/photos/a.png");
    let b = ScanAsset::new("/photos/b.png");
    let control = async {
        storage.wait_for_held(2).await;
        assert!(handler.is_uploading());

        storage.release_one();
        while repo.count_scans(TEST_USER).await.unwrap() < 1 {
            tokio::task::yield_now().await;
        }
        assert_eq!(storage.held(), 1);
        assert!(handler.is_uploading(), "one upload is still running");

        storage.release_one();
    };

    let (first, second, ()) = futures::join!(handler.upload_scan(&a), handler.upload_scan(&b), control);

    assert!(first.is_some());
    assert!(second.is_some());
    assert!(!handler.is_uploading());
    assert_eq!(repo.count_scans(TEST_USER).await.unwrap(), 2);
}

#[tokio::test]
async fn uploading_flag_is_released_after_a_failed_upload() {
    let storage = RecordingStorage::default();
    storage.hold_uploads();
    storage.fail.store(true, Ordering::SeqCst);
    let handler = UploadScanHandler::new(
        PassthroughPreprocessor::default(),
        storage.clone(),
        InMemoryScanRepo::new(),
        signed_in(),
        Arc::new(RecordingNotifier::default()),
    );

    let asset = ScanAsset::new("/photos/a.png");
    let control = async {
        storage.wait_for_held(1).await;
        assert!(handler.is_uploading());
        storage.release_one();
    };
    let (result, ()) = futures::join!(handler.upload_scan(&asset), control);

    assert!(result.is_none());
    assert!(!handler.is_uploading());
}

#[tokio::test]
async fn real_image_is_compressed_and_stored_on_disk() {
    let dir = scratch_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let source = dir.join("capture.png");
    image::RgbImage::from_fn(16, 16, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 90]))
        .save(&source)
        .unwrap();

    let repo = InMemoryScanRepo::new();
    let handler = UploadScanHandler::new(
        JpegCompressor::new(dir.join("scratch"), 0.75),
        LocalObjectStorage::new(dir.join("bucket"), None).unwrap(),
        repo.clone(),
        signed_in(),
        Arc::new(RecordingNotifier::default()),
    );

    let result = handler.upload_scan(&ScanAsset::from_path(&source)).await.unwrap();

    let stored = std::fs::read(dir.join("bucket").join(&result.storage_path)).unwrap();
    assert_eq!(infer::get(&stored).unwrap().mime_type(), "image/jpeg");
    assert!(result.download_url.starts_with("file://"));

    let leftovers = std::fs::read_dir(dir.join("scratch")).unwrap().count();
    assert_eq!(leftovers, 0, "transient compressed file should be removed");

    assert_eq!(repo.count_scans(TEST_USER).await.unwrap(), 1);
    std::fs::remove_dir_all(dir).ok();
}
