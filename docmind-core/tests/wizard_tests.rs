// Tests for the scan -> select -> import wizard

use docmind_client::wire::{ImportResponse, PageRef, ScanResponse, UrlGroup};
use docmind_client::{ApiClient, ClientError};
use docmind_core::wizard::DEFAULT_SCAN_TIMEOUT;
use docmind_core::{CrawlBackend, CrawlWizard, Selection, WizardError, WizardState};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone)]
enum ScanBehavior {
    Respond(ScanResponse),
    Hang,
    Reject(u16, String),
}

#[derive(Clone)]
enum ImportBehavior {
    Accept(Option<usize>),
    Hang,
    Fail(u16, String),
}

/// In-memory backend that records what the wizard sends.
#[derive(Clone)]
struct FakeBackend {
    scan: Arc<Mutex<ScanBehavior>>,
    import: Arc<Mutex<ImportBehavior>>,
    scanned: Arc<Mutex<Vec<String>>>,
    imported: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeBackend {
    fn new(scan: ScanBehavior) -> Self {
        Self {
            scan: Arc::new(Mutex::new(scan)),
            import: Arc::new(Mutex::new(ImportBehavior::Accept(None))),
            scanned: Arc::new(Mutex::new(Vec::new())),
            imported: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set_scan(&self, behavior: ScanBehavior) {
        *self.scan.lock().unwrap() = behavior;
    }

    fn set_import(&self, behavior: ImportBehavior) {
        *self.import.lock().unwrap() = behavior;
    }

    fn import_calls(&self) -> Vec<Vec<String>> {
        self.imported.lock().unwrap().clone()
    }
}

impl CrawlBackend for FakeBackend {
    async fn scan_website(&self, url: &str) -> Result<ScanResponse, ClientError> {
        self.scanned.lock().unwrap().push(url.to_string());
        let behavior = self.scan.lock().unwrap().clone();
        match behavior {
            ScanBehavior::Respond(response) => Ok(response),
            ScanBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(ScanResponse::default())
            }
            ScanBehavior::Reject(status, body) => Err(ClientError::Status { status, body }),
        }
    }

    async fn import_urls(&self, urls: &[String]) -> Result<ImportResponse, ClientError> {
        self.imported.lock().unwrap().push(urls.to_vec());
        let behavior = self.import.lock().unwrap().clone();
        match behavior {
            ImportBehavior::Accept(imported) => Ok(ImportResponse {
                status: Some("success".to_string()),
                imported,
            }),
            ImportBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(ImportResponse::default())
            }
            ImportBehavior::Fail(status, body) => Err(ClientError::Status { status, body }),
        }
    }
}

fn group(name: &str, urls: &[&str]) -> UrlGroup {
    UrlGroup::new(name, urls.iter().map(|u| PageRef::from(*u)).collect())
}

/// Main 1, Blog 2, Docs 5.
fn site_response() -> ScanResponse {
    let groups = vec![
        group("Main", &["https://example.com/"]),
        group("Blog", &["https://example.com/blog/a", "https://example.com/blog/b"]),
        group(
            "Docs",
            &[
                "https://example.com/docs/intro",
                "https://example.com/docs/setup",
                "https://example.com/docs/guides/one",
                "https://example.com/docs/guides/two",
                "https://example.com/docs/guides/three",
            ],
        ),
    ];
    let all_urls = groups
        .iter()
        .flat_map(|g| g.urls.iter().map(|p| p.url().to_string()))
        .collect::<Vec<_>>();
    ScanResponse {
        base_url: Some("https://example.com".to_string()),
        total_count: all_urls.len(),
        groups,
        all_urls,
        ..Default::default()
    }
}

fn state_recorder() -> (Arc<Mutex<Vec<WizardState>>>, docmind_core::wizard::StateCallback) {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = states.clone();
    (states, Arc::new(move |s: WizardState| sink.lock().unwrap().push(s)))
}

// ============================================================================
// Scanning
// ============================================================================

#[tokio::test]
async fn test_scan_selects_everything() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    let (states, on_state) = state_recorder();
    let mut wizard = CrawlWizard::new(backend.clone()).with_state_callback(on_state);

    let pages = wizard.scan("example.com").await.unwrap().page_count();

    assert_eq!(pages, 8);
    assert_eq!(wizard.state(), WizardState::AwaitingSelection);
    assert_eq!(wizard.selection().unwrap().len(), 8);
    assert!(wizard.last_error().is_none());
    assert_eq!(*backend.scanned.lock().unwrap(), vec!["https://example.com".to_string()]);
    assert_eq!(
        *states.lock().unwrap(),
        vec![WizardState::Scanning, WizardState::AwaitingSelection]
    );
}

#[tokio::test(start_paused = true)]
async fn test_scan_times_out() {
    let backend = FakeBackend::new(ScanBehavior::Hang);
    let mut wizard = CrawlWizard::new(backend);
    assert_eq!(wizard.scan_timeout(), DEFAULT_SCAN_TIMEOUT);

    let err = wizard.scan("https://example.com").await.unwrap_err();

    assert_eq!(err, WizardError::ScanTimeout(DEFAULT_SCAN_TIMEOUT));
    assert_eq!(wizard.state(), WizardState::ScanFailed);
    assert!(wizard.tree().is_none());
    assert_eq!(wizard.last_error(), Some(&err));
    assert!(err.to_string().contains("180 seconds"));
}

#[tokio::test(start_paused = true)]
async fn test_custom_scan_timeout() {
    let backend = FakeBackend::new(ScanBehavior::Hang);
    let mut wizard = CrawlWizard::new(backend).with_scan_timeout(Duration::from_secs(5));

    let started = tokio::time::Instant::now();
    let err = wizard.scan("https://example.com").await.unwrap_err();

    assert_eq!(err, WizardError::ScanTimeout(Duration::from_secs(5)));
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < DEFAULT_SCAN_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_scan_does_not_block_next_scan() {
    let backend = FakeBackend::new(ScanBehavior::Hang);
    let mut wizard = CrawlWizard::new(backend.clone());

    // The caller gives up first, dropping the scan future mid-request.
    let abandoned = tokio::time::timeout(Duration::from_secs(1), wizard.scan("https://example.com")).await;
    assert!(abandoned.is_err());
    assert_eq!(wizard.state(), WizardState::Scanning);

    backend.set_scan(ScanBehavior::Respond(site_response()));
    let tree = wizard.scan("https://example.com").await.unwrap();
    assert_eq!(tree.page_count(), 8);
    assert_eq!(wizard.state(), WizardState::AwaitingSelection);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_submit_allows_retry() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    backend.set_import(ImportBehavior::Hang);
    let mut wizard = CrawlWizard::new(backend.clone());
    wizard.scan("https://example.com").await.unwrap();

    let abandoned = tokio::time::timeout(Duration::from_secs(1), wizard.submit()).await;
    assert!(abandoned.is_err());
    assert_eq!(wizard.state(), WizardState::Submitting);

    // Edits and a second submit work on the kept selection.
    assert_eq!(wizard.toggle_subtree("/blog", false).unwrap(), 6);
    assert_eq!(wizard.state(), WizardState::SubmitFailed);
    backend.set_import(ImportBehavior::Accept(None));
    assert_eq!(wizard.submit().await.unwrap(), 6);
    assert_eq!(wizard.state(), WizardState::Done);
}

#[tokio::test]
async fn test_zero_pages_is_scan_failure() {
    let response = ScanResponse {
        total_count: 0,
        ..Default::default()
    };
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Respond(response)));

    let err = wizard.scan("https://example.com").await.unwrap_err();

    assert_eq!(err, WizardError::ScanEmptyResult("https://example.com".to_string()));
    assert_eq!(wizard.state(), WizardState::ScanFailed);
    assert!(wizard.tree().is_none());
}

#[tokio::test]
async fn test_backend_error_field_is_rejection() {
    let response = ScanResponse {
        total_count: 3,
        error: Some("robots.txt disallows crawling".to_string()),
        ..Default::default()
    };
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Respond(response)));

    let err = wizard.scan("https://example.com").await.unwrap_err();
    assert_eq!(err, WizardError::ScanRejected("robots.txt disallows crawling".to_string()));
}

#[tokio::test]
async fn test_backend_status_is_rejection_with_detail() {
    let backend = FakeBackend::new(ScanBehavior::Reject(500, r#"{"detail":"crawler crashed"}"#.to_string()));
    let mut wizard = CrawlWizard::new(backend);

    let err = wizard.scan("https://example.com").await.unwrap_err();
    assert_eq!(err, WizardError::ScanRejected("crawler crashed".to_string()));
    assert_eq!(wizard.state(), WizardState::ScanFailed);
}

#[tokio::test]
async fn test_invalid_url_never_reaches_backend() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    let mut wizard = CrawlWizard::new(backend.clone());

    let err = wizard.scan("   ").await.unwrap_err();

    assert!(matches!(err, WizardError::InvalidUrl(_)));
    assert_eq!(wizard.state(), WizardState::ScanFailed);
    assert!(backend.scanned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rescan_after_failure_replaces_tree() {
    let backend = FakeBackend::new(ScanBehavior::Reject(502, "bad gateway".to_string()));
    let mut wizard = CrawlWizard::new(backend.clone());
    assert!(wizard.scan("https://example.com").await.is_err());

    backend.set_scan(ScanBehavior::Respond(site_response()));
    wizard.scan("https://example.com").await.unwrap();

    assert_eq!(wizard.state(), WizardState::AwaitingSelection);
    assert!(wizard.last_error().is_none());
    assert_eq!(wizard.selection().unwrap().len(), 8);
}

#[tokio::test]
async fn test_rescan_discards_previous_selection() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    let mut wizard = CrawlWizard::new(backend);

    wizard.scan("https://example.com").await.unwrap();
    wizard.deselect_all().unwrap();
    wizard.scan("https://example.com").await.unwrap();

    assert_eq!(wizard.selection().unwrap().len(), 8);
}

// ============================================================================
// Selection edits
// ============================================================================

#[tokio::test]
async fn test_selection_edits_through_wizard() {
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Respond(site_response())));
    wizard.scan("https://example.com").await.unwrap();

    assert_eq!(wizard.toggle_subtree("/blog", false).unwrap(), 6);
    assert_eq!(wizard.toggle_single("https://example.com/blog/a", true).unwrap(), 7);
    assert_eq!(wizard.deselect_all().unwrap(), 0);
    assert_eq!(wizard.select_all().unwrap(), 8);

    assert_eq!(
        wizard.toggle_subtree("/shop", true),
        Err(WizardError::UnknownNode("/shop".to_string()))
    );
    assert_eq!(
        wizard.toggle_single("https://elsewhere.org/", true),
        Err(WizardError::UnknownNode("https://elsewhere.org/".to_string()))
    );
}

#[tokio::test]
async fn test_set_selection_drops_unknown_urls() {
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Respond(site_response())));
    wizard.scan("https://example.com").await.unwrap();

    let mut edited = Selection::new();
    edited.toggle_single("https://example.com/docs/intro", true);
    edited.toggle_single("https://elsewhere.org/", true);

    assert_eq!(wizard.set_selection(edited).unwrap(), 1);
}

#[test]
fn test_edits_rejected_before_scan() {
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Hang));
    assert_eq!(
        wizard.select_all(),
        Err(WizardError::NotReady {
            action: "change the selection",
            state: WizardState::Idle,
        })
    );
}

// ============================================================================
// Submitting
// ============================================================================

#[tokio::test]
async fn test_submit_sends_selected_urls_and_notifies() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let mut wizard = CrawlWizard::new(backend.clone()).with_imported_callback(Arc::new(move |n: usize| {
        seen.store(n, Ordering::SeqCst);
    }));

    wizard.scan("https://example.com").await.unwrap();
    wizard.toggle_subtree("/blog", false).unwrap();
    let imported = wizard.submit().await.unwrap();

    assert_eq!(imported, 6);
    assert_eq!(counter.load(Ordering::SeqCst), 6);
    assert_eq!(wizard.state(), WizardState::Done);
    assert!(wizard.tree().is_none());

    let calls = backend.import_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 6);
    assert!(!calls[0].iter().any(|u| u.contains("/blog/")));
    assert_eq!(calls[0][0], "https://example.com/");
}

#[tokio::test]
async fn test_submit_uses_backend_count_when_given() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    backend.set_import(ImportBehavior::Accept(Some(5)));
    let mut wizard = CrawlWizard::new(backend);

    wizard.scan("https://example.com").await.unwrap();
    assert_eq!(wizard.submit().await.unwrap(), 5);
}

#[tokio::test]
async fn test_submit_empty_selection_is_rejected_locally() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    let mut wizard = CrawlWizard::new(backend.clone());

    wizard.scan("https://example.com").await.unwrap();
    wizard.deselect_all().unwrap();

    assert_eq!(wizard.submit().await, Err(WizardError::EmptySelection));
    assert_eq!(wizard.state(), WizardState::AwaitingSelection);
    assert!(backend.import_calls().is_empty());
}

#[tokio::test]
async fn test_submit_failure_keeps_selection_for_retry() {
    let backend = FakeBackend::new(ScanBehavior::Respond(site_response()));
    backend.set_import(ImportBehavior::Fail(500, r#"{"detail":"vector store offline"}"#.to_string()));
    let calls = Arc::new(AtomicUsize::new(0));
    let hits = calls.clone();
    let mut wizard = CrawlWizard::new(backend.clone()).with_imported_callback(Arc::new(move |_: usize| {
        hits.fetch_add(1, Ordering::SeqCst);
    }));

    wizard.scan("https://example.com").await.unwrap();
    wizard.toggle_subtree("/docs", false).unwrap();
    let before = wizard.selection().unwrap().clone();

    let err = wizard.submit().await.unwrap_err();
    assert_eq!(err, WizardError::SubmitNetworkError("vector store offline".to_string()));
    assert_eq!(wizard.state(), WizardState::SubmitFailed);
    assert_eq!(wizard.selection(), Some(&before));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Retry without rescanning.
    backend.set_import(ImportBehavior::Accept(None));
    assert_eq!(wizard.submit().await.unwrap(), 3);
    assert_eq!(wizard.state(), WizardState::Done);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.import_calls().len(), 2);
    assert_eq!(backend.import_calls()[0], backend.import_calls()[1]);
}

#[tokio::test]
async fn test_submit_before_scan_is_not_ready() {
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Respond(site_response())));
    assert_eq!(
        wizard.submit().await,
        Err(WizardError::NotReady {
            action: "submit",
            state: WizardState::Idle,
        })
    );
}

#[tokio::test]
async fn test_reset_returns_to_idle() {
    let mut wizard = CrawlWizard::new(FakeBackend::new(ScanBehavior::Respond(site_response())));
    wizard.scan("https://example.com").await.unwrap();
    wizard.reset();
    assert_eq!(wizard.state(), WizardState::Idle);
    assert!(wizard.tree().is_none());
}

// ============================================================================
// Against an HTTP backend
// ============================================================================

#[tokio::test]
async fn test_wizard_with_api_client() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crawl/scan"))
        .and(header("user-id", "owner_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_url": "https://example.com",
            "total_count": 3,
            "groups": [
                {"name": "Main", "count": 1, "urls": ["https://example.com/"]},
                {"name": "Blog", "count": 2, "urls": [
                    "https://example.com/blog/a",
                    "https://example.com/blog/b"
                ]}
            ],
            "all_urls": [
                "https://example.com/",
                "https://example.com/blog/a",
                "https://example.com/blog/b"
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/crawl/import"))
        .and(body_json(json!({"urls": ["https://example.com/"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), "owner_1").unwrap();
    let mut wizard = CrawlWizard::new(client);

    wizard.scan("https://example.com").await.unwrap();
    wizard.toggle_subtree("/blog", false).unwrap();
    assert_eq!(wizard.submit().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = ApiClient::with_timeout(&uri, "owner_1", 2).unwrap();
    let mut wizard = CrawlWizard::new(client);

    let err = wizard.scan("https://example.com").await.unwrap_err();
    assert!(matches!(err, WizardError::ScanNetworkError(_)), "got {:?}", err);
    assert_eq!(wizard.state(), WizardState::ScanFailed);
}

#[tokio::test]
async fn test_client_request_timeout_is_scan_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crawl/scan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"total_count": 0}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    // The HTTP client gives up before the wizard does.
    let client = ApiClient::new(&server.uri(), "owner_1")
        .unwrap()
        .with_scan_timeout(Duration::from_secs(1));
    let mut wizard = CrawlWizard::new(client).with_scan_timeout(Duration::from_secs(3));

    let err = wizard.scan("https://example.com").await.unwrap_err();
    assert_eq!(err, WizardError::ScanTimeout(Duration::from_secs(3)));
    assert!(err.to_string().contains("timed out"));
    assert_eq!(wizard.state(), WizardState::ScanFailed);
}
