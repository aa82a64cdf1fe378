//! The job workspace is gone when `extract` returns, whatever the outcome.

mod helpers;

use helpers::*;
use pagescan::{Job, PageScanError, ScanConfig};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_no_workspace_left_after_success() {
    let root = tempfile::tempdir().unwrap();
    let rasterizer = Arc::new(ScriptedRasterizer::default());
    let extractor = extractor(
        test_config(root.path()),
        Arc::clone(&rasterizer),
        Arc::new(ScriptedEngine::default()),
    );

    let report = extractor
        .extract(Job::new(create_pdf(&["a", "b"]), "eng"))
        .await
        .unwrap();

    assert_eq!(report.pages_recognized, 2);
    let seen = rasterizer.seen_workspaces.lock().clone();
    assert!(seen.iter().all(|dir| !dir.exists()));
    assert_eq!(residue(root.path()), 0);
}

#[tokio::test]
async fn test_no_workspace_left_after_partial_failure() {
    let root = tempfile::tempdir().unwrap();
    let extractor = extractor(
        test_config(root.path()),
        Arc::new(ScriptedRasterizer::failing(&[1])),
        Arc::new(ScriptedEngine::failing(&[2])),
    );

    let report = extractor
        .extract(Job::new(create_pdf(&["a", "b", "c"]), "eng"))
        .await
        .unwrap();

    assert_eq!(report.pages_recognized, 1);
    assert_eq!(residue(root.path()), 0);
}

#[tokio::test]
async fn test_no_workspace_left_after_fatal_error() {
    let root = tempfile::tempdir().unwrap();
    let extractor = extractor(
        test_config(root.path()),
        Arc::new(ScriptedRasterizer::default()),
        Arc::new(ScriptedEngine::default()),
    );

    let err = extractor
        .extract(Job::new(b"%PDF-1.7\ntruncated".to_vec(), "eng"))
        .await
        .unwrap_err();

    assert!(matches!(err, PageScanError::Input { .. }));
    assert_eq!(residue(root.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timeout_returns_error_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let engine = Arc::new(ScriptedEngine::uniform(Duration::from_millis(100)));
    let mut config = test_config(root.path());
    config.ocr.max_concurrent_pages = 1;
    config.job_timeout_ms = 150;
    let extractor = extractor(config, Arc::new(ScriptedRasterizer::default()), Arc::clone(&engine));

    let err = extractor
        .extract(Job::new(create_pdf(&["a", "b", "c", "d", "e", "f", "g", "h"]), "eng"))
        .await
        .unwrap_err();

    assert!(matches!(err, PageScanError::Timeout { limit_ms: 150 }));
    assert_eq!(err.to_string(), "Job timed out after 150 ms");
    assert_eq!(residue(root.path()), 0);

    // Queued pages are abandoned with the job, not recognized in the background.
    let calls_at_timeout = engine.calls.load(Ordering::SeqCst);
    assert!(calls_at_timeout < 8);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(engine.calls.load(Ordering::SeqCst), calls_at_timeout);
}

#[tokio::test]
async fn test_cancelled_job_removes_workspace() {
    let root = tempfile::tempdir().unwrap();
    let rasterizer = Arc::new(ScriptedRasterizer::default());
    let extractor = extractor(
        test_config(root.path()),
        Arc::clone(&rasterizer),
        Arc::new(ScriptedEngine::uniform(Duration::from_secs(10))),
    );

    let job = extractor.extract(Job::new(create_pdf(&["a"]), "eng"));
    let outcome = tokio::time::timeout(Duration::from_millis(100), job).await;

    assert!(outcome.is_err());
    assert!(!rasterizer.seen_workspaces.lock().is_empty());
    assert_eq!(residue(root.path()), 0);
}

#[tokio::test]
async fn test_input_errors_create_no_workspace() {
    let root = tempfile::tempdir().unwrap();
    let rasterizer = Arc::new(ScriptedRasterizer::default());
    let extractor = extractor(
        test_config(root.path()),
        Arc::clone(&rasterizer),
        Arc::new(ScriptedEngine::default()),
    );

    let cases = vec![
        Job::new(Vec::<u8>::new(), "eng"),
        Job::new(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec(), "eng"),
        Job::new(create_pdf(&["a"]), "eng").with_file_name("notes.txt"),
        Job::new(create_pdf(&["a"]), "not_a_language"),
    ];

    for job in cases {
        let err = extractor.extract(job).await.unwrap_err();
        assert!(matches!(err, PageScanError::Input { .. }), "unexpected error: {err}");
        assert!(err.is_client_error());
    }

    assert_eq!(rasterizer.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(residue(root.path()), 0);
}

#[tokio::test]
async fn test_unwritable_root_is_workspace_error() {
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();

    let mut config = ScanConfig::default();
    config.workspace.root = blocker.join("nested");
    let extractor = extractor(
        config,
        Arc::new(ScriptedRasterizer::default()),
        Arc::new(ScriptedEngine::default()),
    );

    let err = extractor
        .extract(Job::new(create_pdf(&["a"]), "eng"))
        .await
        .unwrap_err();

    assert!(matches!(err, PageScanError::Workspace { .. }));
    assert!(!err.is_client_error());
}
