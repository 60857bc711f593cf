mod common;

use cogview::io::{AsyncReadRange, MemoryReader};
use cogview::{
    Cog, CogSource, PreviewController, RasterHandle, RasterReference, RasterSource, ReadOptions,
    RefreshPolicy, RefreshStatus,
};
use common::{build_cog, temp_path, two_level_cog, TestLevel, ORIGIN};
use std::io::Cursor;
use std::sync::Arc;

#[test]
fn opens_levels_and_georeference() {
    let cog = Cog::open(&mut Cursor::new(two_level_cog())).unwrap();
    assert_eq!(cog.levels().len(), 2);
    assert_eq!(cog.full_dimensions(), (32, 32));
    assert_eq!(cog.levels()[1].dimensions, (16, 16));
    assert_eq!(cog.extent(), (320.0, 320.0));
    assert_eq!(cog.geo().origin, ORIGIN);
    assert_eq!(cog.pixel_size(&cog.levels()[1]), (20.0, 20.0));
}

#[tokio::test]
async fn grows_header_prefix() {
    let bytes = two_level_cog();
    let reader = MemoryReader::new(bytes);
    let cog = Cog::open_async(&reader, 16).await.unwrap();
    assert_eq!(cog.levels().len(), 2);
}

#[tokio::test]
async fn reads_bands_at_each_resolution() {
    let reader: Arc<dyn AsyncReadRange> = Arc::new(MemoryReader::new(two_level_cog()));
    let cog = Cog::open_async(reader.as_ref(), 1024).await.unwrap();

    // Overviews come back at their native size, never shrunk to the target
    let coarse = cog.read_bands(reader.clone(), (1000.0, 1000.0)).await.unwrap();
    assert_eq!((coarse.width, coarse.height), (16, 16));
    assert!(coarse.bands[0].iter().all(|v| *v == 110));
    assert!(coarse.bands[2].iter().all(|v| *v == 130));

    let overview = cog.read_bands(reader.clone(), (20.5, 20.5)).await.unwrap();
    assert_eq!((overview.width, overview.height), (16, 16));

    // A 20 m overview is not finer than a 20 m target
    let full = cog.read_bands(reader.clone(), (20.0, 20.0)).await.unwrap();
    assert_eq!((full.width, full.height), (32, 32));
    assert_eq!(full.bands[0][0], 10);
    assert_eq!(full.bands[2][0], 30);
    // Bottom right tile is sparse
    assert_eq!(full.bands[0][32 * 32 - 1], 0);

    let fallback = cog.read_bands(reader, (1.0, 1.0)).await.unwrap();
    assert_eq!((fallback.width, fallback.height), (32, 32));
}

#[tokio::test]
async fn single_level_rasters_fall_back_to_full_resolution() {
    let bytes = build_cog(&[TestLevel::new(16, 16, 16, [1, 2, 3])]);
    let reader: Arc<dyn AsyncReadRange> = Arc::new(MemoryReader::new(bytes));
    let cog = Cog::open_async(reader.as_ref(), 64).await.unwrap();
    assert_eq!(cog.level_for_resolution((1.0, 1.0)), 0);
    let bands = cog.read_bands(reader, (5.0, 5.0)).await.unwrap();
    assert_eq!((bands.width, bands.height), (16, 16));
    assert_eq!(bands.bands[1][0], 2);
}

#[tokio::test]
async fn empty_levels_are_skipped() {
    let bytes = build_cog(&[
        TestLevel::new(32, 32, 16, [10, 20, 30]),
        TestLevel::new(16, 0, 16, [110, 120, 130]),
    ]);
    let reader: Arc<dyn AsyncReadRange> = Arc::new(MemoryReader::new(bytes));
    let cog = Cog::open_async(reader.as_ref(), 1024).await.unwrap();
    assert_eq!(cog.levels().len(), 1);
    let bands = cog.read_bands(reader, (1000.0, 1000.0)).await.unwrap();
    assert_eq!((bands.width, bands.height), (32, 32));

    let empty = build_cog(&[TestLevel::new(0, 16, 16, [1, 2, 3])]);
    assert!(Cog::open(&mut Cursor::new(empty)).is_err());
}

#[tokio::test]
async fn corrected_policy_fails_on_empty_rasters() {
    let path = temp_path("empty");
    std::fs::write(&path, build_cog(&[TestLevel::new(0, 0, 16, [1, 2, 3])])).unwrap();
    let reference = RasterReference::new(path.to_string_lossy());

    let mut controller =
        PreviewController::new(Arc::new(CogSource::default()), RefreshPolicy::Corrected);
    controller.select_raster(Some(reference));
    controller.evaluate_refresh();
    assert_eq!(controller.process_next().await, Some(false));
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(controller.status(), RefreshStatus::Failed(_)));
}

#[tokio::test]
async fn source_opens_local_files() {
    let path = temp_path("source");
    std::fs::write(&path, two_level_cog()).unwrap();
    let reference = RasterReference::new(path.to_string_lossy());

    let handle = CogSource::default().open(&reference).await.unwrap();
    let bands = handle.read_bands(ReadOptions::uniform(1000.0)).await;
    std::fs::remove_file(&path).unwrap();

    let bands = bands.unwrap();
    assert_eq!((bands.width, bands.height), (16, 16));
    assert_eq!(
        (bands.bands[0][0], bands.bands[1][0], bands.bands[2][0]),
        (110, 120, 130)
    );
}

#[tokio::test]
async fn zoom_drives_preview_resolution() {
    let path = temp_path("controller");
    std::fs::write(&path, two_level_cog()).unwrap();
    let reference = RasterReference::new(path.to_string_lossy());
    let mut controller =
        PreviewController::new(Arc::new(CogSource::default()), RefreshPolicy::Faithful);

    controller.select_raster(Some(reference.clone()));
    controller.set_zoom_level(6.0);
    assert!(controller.evaluate_refresh().is_some());
    assert_eq!(controller.process_next().await, Some(true));
    let preview = controller.state().preview();
    assert_eq!((preview.width(), preview.height()), (16, 16));
    assert_eq!(&preview.to_rgb_bytes()[..3], &[110, 120, 130]);
    assert_eq!(controller.state().used_overview(), 12);

    controller.set_zoom_level(8.0);
    assert!(controller.evaluate_refresh().is_none());

    controller.set_zoom_level(12.0);
    assert!(controller.evaluate_refresh().is_some());
    assert_eq!(controller.process_next().await, Some(true));
    assert_eq!(controller.state().preview().width(), 16);
    assert_eq!(controller.state().used_overview(), 15);

    controller.set_zoom_level(15.5);
    assert!(controller.evaluate_refresh().is_some());
    assert_eq!(controller.process_next().await, Some(true));
    let preview = controller.state().preview();
    assert_eq!((preview.width(), preview.height()), (32, 32));
    assert_eq!(preview.red().len(), preview.blue().len());
    assert_eq!(controller.status(), RefreshStatus::Idle);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn corrected_policy_surfaces_bad_rasters() {
    let path = temp_path("corrupt");
    let mut bytes = two_level_cog();
    bytes.truncate(bytes.len() / 2);
    std::fs::write(&path, bytes).unwrap();
    let reference = RasterReference::new(path.to_string_lossy());

    let mut controller =
        PreviewController::new(Arc::new(CogSource::default()), RefreshPolicy::Corrected);
    controller.select_raster(Some(reference));
    controller.evaluate_refresh();
    assert_eq!(controller.process_next().await, Some(false));
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(controller.status(), RefreshStatus::Failed(_)));
    assert!(controller.state().preview().is_empty());
}
