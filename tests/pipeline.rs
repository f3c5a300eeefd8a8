//! Pipeline Integration Tests
//!
//! Run-level behavior with in-memory collaborators: listing, skipping,
//! per-record failure isolation, and write-back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use mockito::{Matcher, Server};
use notion_asr::adapters::{AcsClient, AudioFetcher, RecordStore};
use notion_asr::domain::{
    AttachedFile, Completion, FailureReason, Record, RecordOutcome, SkipReason,
};
use notion_asr::transcribe::{ScanTranscriber, Transcriber};
use notion_asr::Orchestrator;

/// In-memory record store
#[derive(Default)]
struct FakeStore {
    records: Vec<Record>,
    fail_listing: bool,
    fail_updates: bool,
    list_calls: AtomicUsize,
    completions: Mutex<Vec<(String, Completion)>>,
}

impl FakeStore {
    fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    fn completions(&self) -> Vec<(String, Completion)> {
        self.completions.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn pending_records(&self) -> Result<Vec<Record>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            anyhow::bail!("database unavailable");
        }
        Ok(self.records.clone())
    }

    async fn complete_record(&self, record_id: &str, completion: &Completion) -> Result<()> {
        if self.fail_updates {
            anyhow::bail!("conflict");
        }
        self.completions
            .lock()
            .unwrap()
            .push((record_id.to_string(), completion.clone()));
        Ok(())
    }
}

/// Fetcher that serves fixed bytes, failing for URLs containing "broken"
#[derive(Default)]
struct FakeFetcher {
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioFetcher for FakeFetcher {
    async fn fetch_audio(&self, file: &AttachedFile) -> Result<Vec<u8>> {
        let url = file.download_url().unwrap_or_default().to_string();
        self.fetched.lock().unwrap().push(url.clone());
        if url.contains("broken") {
            anyhow::bail!("Audio download failed (404 Not Found)");
        }
        Ok(b"audio-bytes".to_vec())
    }
}

/// Transcriber returning a canned answer
struct FakeTranscriber {
    answer: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeTranscriber {
    fn new(answer: Option<&str>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                answer: answer.map(str::to_string),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    fn name(&self) -> &str {
        "fake"
    }

    async fn transcribe(&self, _audio: &[u8]) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

fn record_with_audio(id: &str, url: &str) -> Record {
    Record::pending(id, Some(AttachedFile::new("memo.m4a", url)))
}

#[tokio::test]
async fn test_empty_listing_invokes_nothing_else() {
    let store = Arc::new(FakeStore::default());
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, calls) = FakeTranscriber::new(Some("unused"));

    let orchestrator = Orchestrator::new(store.clone(), fetcher.clone(), Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(report.summary.total(), 0);
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    assert!(fetcher.fetched().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(store.completions().is_empty());
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let store = Arc::new(FakeStore {
        fail_listing: true,
        ..Default::default()
    });
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, calls) = FakeTranscriber::new(Some("unused"));

    let orchestrator = Orchestrator::new(store, fetcher.clone(), Box::new(transcriber));
    let err = orchestrator.run().await.unwrap_err();

    assert!(format!("{:#}", err).contains("database unavailable"));
    assert!(fetcher.fetched().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_record_without_audio_is_skipped() {
    let store = Arc::new(FakeStore::with_records(vec![
        Record::pending("no-audio", None),
        record_with_audio("with-audio", "https://files.example/a.m4a"),
    ]));
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, calls) = FakeTranscriber::new(Some("transcribed"));

    let orchestrator = Orchestrator::new(store.clone(), fetcher.clone(), Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    assert_eq!(
        report.outcomes[0],
        RecordOutcome::Skipped {
            record_id: "no-audio".to_string(),
            reason: SkipReason::NoAudio,
        }
    );
    assert!(report.outcomes[1].is_completed());

    // Only the second record reached the fetcher, transcriber and updater
    assert_eq!(fetcher.fetched(), vec!["https://files.example/a.m4a".to_string()]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let completions = store.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].0, "with-audio");
}

#[tokio::test]
async fn test_attachment_without_url_fails_and_run_continues() {
    let store = Arc::new(FakeStore::with_records(vec![
        Record::pending("upload", Some(AttachedFile::without_url("a.m4a"))),
        record_with_audio("hosted", "https://files.example/b.m4a"),
    ]));
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, calls) = FakeTranscriber::new(Some("text"));

    let orchestrator = Orchestrator::new(store.clone(), fetcher.clone(), Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    assert_eq!(
        report.outcomes[0],
        RecordOutcome::Failed {
            record_id: "upload".to_string(),
            reason: FailureReason::UnusableAttachment("a.m4a".to_string()),
        }
    );
    assert!(report.outcomes[1].is_completed());
    assert_eq!(report.summary.skipped, 0);
    assert_eq!(report.summary.failed, 1);

    // Nothing was fetched or transcribed for the unusable attachment
    assert_eq!(fetcher.fetched(), vec!["https://files.example/b.m4a".to_string()]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.completions().len(), 1);
}

#[tokio::test]
async fn test_download_failure_does_not_stop_run() {
    let store = Arc::new(FakeStore::with_records(vec![
        record_with_audio("first", "https://files.example/broken.m4a"),
        record_with_audio("second", "https://files.example/ok.m4a"),
    ]));
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, calls) = FakeTranscriber::new(Some("ok"));

    let orchestrator = Orchestrator::new(store.clone(), fetcher.clone(), Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    match &report.outcomes[0] {
        RecordOutcome::Failed {
            record_id,
            reason: FailureReason::Error(message),
        } => {
            assert_eq!(record_id, "first");
            assert!(message.contains("404"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.outcomes[1].is_completed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.summary.completed, 1);
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn test_empty_transcript_leaves_record_pending() {
    for answer in [None, Some("")] {
        let store = Arc::new(FakeStore::with_records(vec![record_with_audio(
            "page-1",
            "https://files.example/a.m4a",
        )]));
        let fetcher = Arc::new(FakeFetcher::default());
        let (transcriber, _calls) = FakeTranscriber::new(answer);

        let orchestrator = Orchestrator::new(store.clone(), fetcher, Box::new(transcriber));
        let report = orchestrator.run().await.unwrap();

        assert_eq!(
            report.outcomes[0],
            RecordOutcome::Failed {
                record_id: "page-1".to_string(),
                reason: FailureReason::NoTranscript,
            }
        );
        assert!(store.completions().is_empty());
    }
}

#[tokio::test]
async fn test_update_failure_is_recorded() {
    let store = Arc::new(FakeStore {
        records: vec![record_with_audio("page-1", "https://files.example/a.m4a")],
        fail_updates: true,
        ..Default::default()
    });
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, _calls) = FakeTranscriber::new(Some("text"));

    let orchestrator = Orchestrator::new(store, fetcher, Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.summary.failed, 1);
    assert!(matches!(
        &report.outcomes[0],
        RecordOutcome::Failed { reason: FailureReason::Error(m), .. } if m.contains("conflict")
    ));
}

#[tokio::test]
async fn test_long_transcript_gets_truncated_summary() {
    let transcript = "x".repeat(400);
    let store = Arc::new(FakeStore::with_records(vec![record_with_audio(
        "page-1",
        "https://files.example/a.m4a",
    )]));
    let fetcher = Arc::new(FakeFetcher::default());
    let (transcriber, _calls) = FakeTranscriber::new(Some(&transcript));

    let orchestrator = Orchestrator::new(store.clone(), fetcher, Box::new(transcriber));
    orchestrator.run().await.unwrap();

    let (_, completion) = &store.completions()[0];
    assert_eq!(completion.transcript, transcript);
    assert_eq!(completion.summary.chars().count(), 153);
    assert!(completion.summary.ends_with("..."));
}

#[tokio::test]
async fn test_end_to_end_scan_completes_record() {
    let mut server = Server::new_async().await;
    let scan = server
        .mock("POST", Matcher::Regex("^/".to_string()))
        .match_header("x-acs-action", "FileAsyncScan")
        .match_body("audio-bytes")
        .with_status(200)
        .with_body(r#"{"RequestId":"r1","Result":[{"Text":"hello"},{"Text":"world"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(FakeStore::with_records(vec![record_with_audio(
        "page-1",
        "https://files.example/a.m4a",
    )]));
    let fetcher = Arc::new(FakeFetcher::default());
    let transcriber = ScanTranscriber::new(
        AcsClient::new("id".to_string(), "secret".to_string()),
        server.url(),
    );

    let orchestrator = Orchestrator::new(store.clone(), fetcher, Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    scan.assert_async().await;
    assert_eq!(report.summary.completed, 1);

    let completions = store.completions();
    assert_eq!(completions.len(), 1);
    let (record_id, completion) = &completions[0];
    assert_eq!(record_id, "page-1");
    assert_eq!(completion.transcript, "hello\nworld");
    assert_eq!(completion.summary, "hello\nworld");
    assert!(!completion.processed_at.to_rfc3339().is_empty());
}

#[tokio::test]
async fn test_end_to_end_scan_server_error_keeps_pending() {
    let mut server = Server::new_async().await;
    let _scan = server
        .mock("POST", Matcher::Regex("^/".to_string()))
        .with_status(503)
        .with_body(r#"{"Code":"ServiceUnavailable","Message":"busy","RequestId":"r2"}"#)
        .create_async()
        .await;

    let store = Arc::new(FakeStore::with_records(vec![record_with_audio(
        "page-1",
        "https://files.example/a.m4a",
    )]));
    let fetcher = Arc::new(FakeFetcher::default());
    let transcriber = ScanTranscriber::new(
        AcsClient::new("id".to_string(), "secret".to_string()),
        server.url(),
    );

    let orchestrator = Orchestrator::new(store.clone(), fetcher, Box::new(transcriber));
    let report = orchestrator.run().await.unwrap();

    assert_eq!(
        report.outcomes[0],
        RecordOutcome::Failed {
            record_id: "page-1".to_string(),
            reason: FailureReason::NoTranscript,
        }
    );
    assert!(store.completions().is_empty());
}
