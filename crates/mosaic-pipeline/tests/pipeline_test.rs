//! End-to-end tests for the two loops over a shared temp filesystem.

use std::path::Path;
use std::sync::Arc;

use mosaic_core::RetryPolicy;
use mosaic_embed::mock::MockEmbeddingBackend;
use mosaic_map::mock::{MapMockOutcome, MockMapBackend};
use mosaic_pipeline::{run_processor, MapUploader, ProcessorConfig, UploaderConfig};
use mosaic_store::scan_result_files;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];

fn populate(raw: &Path, participant: &str, count: usize) {
    for i in 0..count {
        let path = raw.join(participant).join(format!("img_{:04}.jpg", i));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, JPEG_MAGIC).unwrap();
    }
}

fn processor_config(root: &Path) -> ProcessorConfig {
    let mut config = ProcessorConfig::default().with_run_once(true);
    config.raw_dir = root.join("raw");
    config.results_dir = root.join("embeddings");
    config.state_dir = root.join("state");
    config
}

fn uploader_config(root: &Path) -> UploaderConfig {
    let mut config = UploaderConfig::default().with_run_once(true);
    config.results_dir = root.join("embeddings");
    config.state_dir = root.join("state");
    config.map_name = "Test Exhibition".to_string();
    config
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, 1, 5)
}

#[tokio::test]
async fn test_processor_run_once_embeds_everything_in_batches() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 45);

    let backend = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), backend.clone())
        .await
        .unwrap();

    // 45 images at batch size 16: 16 + 16 + 13 across three result files.
    let files = scan_result_files(&dir.path().join("embeddings"))
        .await
        .unwrap();
    assert_eq!(files.len(), 3);

    let mut counts = Vec::new();
    for file in &files {
        counts.push(mosaic_store::read_result_file(file).await.unwrap().len());
    }
    assert_eq!(counts, vec![16, 16, 13]);
}

#[tokio::test]
async fn test_processor_rerun_produces_zero_new_records() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 10);

    let backend = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), backend.clone())
        .await
        .unwrap();
    let first_run_calls = backend.call_count();
    assert!(first_run_calls > 0);

    // Restart with the same state directory: the reloaded ledger makes
    // the whole tree a no-op.
    run_processor(processor_config(dir.path()), backend.clone())
        .await
        .unwrap();
    assert_eq!(backend.call_count(), first_run_calls);

    let files = scan_result_files(&dir.path().join("embeddings"))
        .await
        .unwrap();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_no_id_appears_in_two_records_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 7);

    let backend = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), backend.clone())
        .await
        .unwrap();

    // More images arrive between runs.
    populate(&dir.path().join("raw"), "p02", 7);
    run_processor(processor_config(dir.path()), backend.clone())
        .await
        .unwrap();

    let mut all_ids = Vec::new();
    for file in scan_result_files(&dir.path().join("embeddings"))
        .await
        .unwrap()
    {
        for record in mosaic_store::read_result_file(&file).await.unwrap() {
            all_ids.push(record.id);
        }
    }
    assert_eq!(all_ids.len(), 14);

    let mut deduped = all_ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), all_ids.len(), "duplicate record ids found");
    assert!(deduped.contains(&"p01/img_0000".to_string()));
    assert!(deduped.contains(&"p02/img_0006".to_string()));
}

#[tokio::test]
async fn test_uploader_creates_once_then_extends() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 20);

    let embed = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), embed).await.unwrap();
    let files = scan_result_files(&dir.path().join("embeddings"))
        .await
        .unwrap();
    assert_eq!(files.len(), 2);

    let map = Arc::new(MockMapBackend::new());
    let mut uploader = MapUploader::open(map.clone(), uploader_config(dir.path()))
        .await
        .unwrap()
        .with_retry(fast_retry());

    let uploaded = uploader.run_cycle().await.unwrap();
    assert_eq!(uploaded, 2);

    // One create for the first file, one extend for the second — both
    // against the same persisted id.
    assert_eq!(map.create_count(), 1);
    assert_eq!(map.extends().len(), 1);
    assert_eq!(map.creates()[0].0, "Test Exhibition");
    assert_eq!(map.extends()[0].0, "map-mock-1");
    assert_eq!(uploader.map_id(), Some("map-mock-1"));
}

#[tokio::test]
async fn test_uploader_restart_never_reuploads_or_recreates() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 5);

    let embed = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), embed.clone())
        .await
        .unwrap();

    let map = Arc::new(MockMapBackend::new());
    {
        let mut uploader = MapUploader::open(map.clone(), uploader_config(dir.path()))
            .await
            .unwrap()
            .with_retry(fast_retry());
        assert_eq!(uploader.run_cycle().await.unwrap(), 1);
    }

    // A new batch lands while the uploader is down.
    populate(&dir.path().join("raw"), "p02", 5);
    run_processor(processor_config(dir.path()), embed).await.unwrap();

    // Restarted uploader: persisted map id means extend, and the ledger
    // keeps the first file from going out twice.
    let mut uploader = MapUploader::open(map.clone(), uploader_config(dir.path()))
        .await
        .unwrap()
        .with_retry(fast_retry());
    assert_eq!(uploader.run_cycle().await.unwrap(), 1);

    assert_eq!(map.create_count(), 1);
    assert_eq!(map.extends().len(), 1);

    // A third cycle with nothing new uploads nothing.
    assert_eq!(uploader.run_cycle().await.unwrap(), 0);
    assert_eq!(map.create_count(), 1);
    assert_eq!(map.extends().len(), 1);
}

#[tokio::test]
async fn test_uploader_retries_failed_file_on_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 3);

    let embed = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), embed).await.unwrap();

    let map = Arc::new(MockMapBackend::new());
    // Exhaust every attempt of the first cycle's create.
    for _ in 0..3 {
        map.push_outcome(MapMockOutcome::Transient);
    }

    let mut uploader = MapUploader::open(map.clone(), uploader_config(dir.path()))
        .await
        .unwrap()
        .with_retry(fast_retry());

    // The failed file is left unmarked and no map id is persisted.
    assert_eq!(uploader.run_cycle().await.unwrap(), 0);
    assert_eq!(uploader.map_id(), None);

    // Next cycle the service has recovered.
    assert_eq!(uploader.run_cycle().await.unwrap(), 1);
    assert_eq!(uploader.map_id(), Some("map-mock-4"));
}

#[tokio::test]
async fn test_force_new_map_creates_fresh_map() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 2);

    let embed = Arc::new(MockEmbeddingBackend::new(8));
    run_processor(processor_config(dir.path()), embed.clone())
        .await
        .unwrap();

    let map = Arc::new(MockMapBackend::new());
    {
        let mut uploader = MapUploader::open(map.clone(), uploader_config(dir.path()))
            .await
            .unwrap()
            .with_retry(fast_retry());
        uploader.run_cycle().await.unwrap();
        assert_eq!(uploader.map_id(), Some("map-mock-1"));
    }

    // Another batch, this time with the force-new flag set.
    populate(&dir.path().join("raw"), "p02", 2);
    run_processor(processor_config(dir.path()), embed).await.unwrap();

    let mut config = uploader_config(dir.path());
    config.force_new_map = true;
    let mut uploader = MapUploader::open(map.clone(), config)
        .await
        .unwrap()
        .with_retry(fast_retry());
    uploader.run_cycle().await.unwrap();

    assert_eq!(map.create_count(), 2);
    assert_eq!(uploader.map_id(), Some("map-mock-2"));
}

#[tokio::test]
async fn test_dry_run_marks_ledger_like_real_backend() {
    let dir = tempfile::tempdir().unwrap();
    populate(&dir.path().join("raw"), "p01", 4);

    let mut config = processor_config(dir.path());
    config.dry_run = true;
    let backend = Arc::new(mosaic_embed::StubEmbeddingBackend::new(16, 32));
    run_processor(config, backend).await.unwrap();

    let files = scan_result_files(&dir.path().join("embeddings"))
        .await
        .unwrap();
    assert_eq!(files.len(), 1);
    let records = mosaic_store::read_result_file(&files[0]).await.unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.embedding.len() == 16));
    assert!(records.iter().all(|r| r.embedding.iter().all(|x| *x == 0.0)));

    // A real re-run (non-dry) now sees everything embedded.
    let real = Arc::new(MockEmbeddingBackend::new(16));
    run_processor(processor_config(dir.path()), real.clone())
        .await
        .unwrap();
    assert_eq!(real.call_count(), 0);
}
