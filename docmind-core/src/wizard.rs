use crate::selection::Selection;
use crate::tree::{CrawlTree, TreeError, build_tree};
use docmind_client::wire::{ImportResponse, ScanResponse, UrlGroup};
use docmind_client::{ApiClient, ClientError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(180);

/// The two backend calls the wizard needs.
pub trait CrawlBackend {
    fn scan_website(&self, url: &str) -> impl Future<Output = Result<ScanResponse, ClientError>> + Send;

    fn import_urls(&self, urls: &[String]) -> impl Future<Output = Result<ImportResponse, ClientError>> + Send;
}

impl CrawlBackend for ApiClient {
    async fn scan_website(&self, url: &str) -> Result<ScanResponse, ClientError> {
        ApiClient::scan_website(self, url).await
    }

    async fn import_urls(&self, urls: &[String]) -> Result<ImportResponse, ClientError> {
        ApiClient::import_urls(self, urls).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Idle,
    Scanning,
    ScanFailed,
    AwaitingSelection,
    Submitting,
    SubmitFailed,
    Done,
}

impl WizardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardState::Idle => "idle",
            WizardState::Scanning => "scanning",
            WizardState::ScanFailed => "scan failed",
            WizardState::AwaitingSelection => "awaiting selection",
            WizardState::Submitting => "submitting",
            WizardState::SubmitFailed => "submit failed",
            WizardState::Done => "done",
        }
    }

    /// Whether the scan control would be enabled in this state.
    pub fn can_scan(&self) -> bool {
        !matches!(self, WizardState::Scanning | WizardState::Submitting)
    }

    /// Whether a tree is on screen and may be edited and submitted.
    pub fn has_selection(&self) -> bool {
        matches!(self, WizardState::AwaitingSelection | WizardState::SubmitFailed)
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Scan timed out after {} seconds. Large sites take longer to crawl; try again or start from a smaller section.", .0.as_secs())]
    ScanTimeout(Duration),

    #[error("Could not reach the server while scanning: {0}")]
    ScanNetworkError(String),

    #[error("No pages found at {0}. Check the address and try again.")]
    ScanEmptyResult(String),

    #[error("The server could not scan this site: {0}")]
    ScanRejected(String),

    #[error("Import failed: {0}. Your selection was kept, so you can retry without rescanning.")]
    SubmitNetworkError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Select at least one page to import")]
    EmptySelection,

    #[error("Cannot {action} while the wizard is {state}")]
    NotReady {
        action: &'static str,
        state: WizardState,
    },

    #[error("Unknown page or section: {0}")]
    UnknownNode(String),
}

/// Invoked with the number of imported URLs so the document list can refresh.
pub type ImportedCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Invoked on every state transition.
pub type StateCallback = Arc<dyn Fn(WizardState) + Send + Sync>;

struct Session {
    tree: CrawlTree,
    selection: Selection,
}

/// Drives scan -> select -> import for one website.
///
/// `scan` and `submit` take `&mut self`, so one wizard never has two requests
/// in flight. Only the scan is abandoned on timeout; a submit runs to
/// completion once issued.
pub struct CrawlWizard<B> {
    backend: B,
    scan_timeout: Duration,
    state: WizardState,
    session: Option<Session>,
    last_error: Option<WizardError>,
    on_imported: Option<ImportedCallback>,
    on_state: Option<StateCallback>,
}

impl<B: CrawlBackend> CrawlWizard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            state: WizardState::Idle,
            session: None,
            last_error: None,
            on_imported: None,
            on_state: None,
        }
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn with_imported_callback(mut self, callback: ImportedCallback) -> Self {
        self.on_imported = Some(callback);
        self
    }

    pub fn with_state_callback(mut self, callback: StateCallback) -> Self {
        self.on_state = Some(callback);
        self
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn last_error(&self) -> Option<&WizardError> {
        self.last_error.as_ref()
    }

    pub fn tree(&self) -> Option<&CrawlTree> {
        self.session.as_ref().map(|s| &s.tree)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.session.as_ref().map(|s| &s.selection)
    }

    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    fn set_state(&mut self, state: WizardState) {
        debug!("Wizard {} -> {}", self.state, state);
        self.state = state;
        if let Some(ref callback) = self.on_state {
            callback(state);
        }
    }

    /// Holding `&mut self` means nothing is in flight, so a `Scanning` or
    /// `Submitting` state here was left by a future dropped before it finished.
    fn recover_abandoned(&mut self) {
        match self.state {
            WizardState::Scanning => {
                warn!("Previous scan was abandoned before it finished");
                self.session = None;
                self.set_state(WizardState::ScanFailed);
            }
            WizardState::Submitting => {
                warn!("Previous import was abandoned before the backend answered");
                self.set_state(WizardState::SubmitFailed);
            }
            _ => {}
        }
    }

    fn fail_scan(&mut self, error: WizardError) -> WizardError {
        warn!("Scan failed: {}", error);
        self.session = None;
        self.last_error = Some(error.clone());
        self.set_state(WizardState::ScanFailed);
        error
    }

    /// Crawl `root_url` and, on success, hold the resulting tree with every page selected.
    pub async fn scan(&mut self, root_url: &str) -> Result<&CrawlTree, WizardError> {
        self.recover_abandoned();
        if !self.state.can_scan() {
            return Err(WizardError::NotReady {
                action: "scan",
                state: self.state,
            });
        }

        self.session = None;
        self.last_error = None;

        let root_url = match normalize_root_url(root_url) {
            Ok(url) => url,
            Err(e) => return Err(self.fail_scan(e)),
        };

        info!("Scanning {} (timeout {:?})", root_url, self.scan_timeout);
        self.set_state(WizardState::Scanning);

        // Dropping the request future on timeout aborts the HTTP request.
        let timeout = self.scan_timeout;
        let response = match tokio::time::timeout(timeout, self.backend.scan_website(&root_url)).await {
            Err(_) => return Err(self.fail_scan(WizardError::ScanTimeout(timeout))),
            Ok(Err(e)) => return Err(self.fail_scan(classify_scan_error(&e, timeout))),
            Ok(Ok(response)) => response,
        };

        let tree = match tree_from_response(&root_url, response) {
            Ok(tree) => tree,
            Err(e) => return Err(self.fail_scan(e)),
        };

        info!("Scan of {} found {} pages", root_url, tree.page_count());
        let selection = Selection::all(&tree);
        self.set_state(WizardState::AwaitingSelection);
        let session = self.session.insert(Session { tree, selection });
        Ok(&session.tree)
    }

    /// Send the selected URLs for ingestion. Returns how many were imported.
    pub async fn submit(&mut self) -> Result<usize, WizardError> {
        self.recover_abandoned();
        if !self.state.has_selection() {
            return Err(WizardError::NotReady {
                action: "submit",
                state: self.state,
            });
        }
        let urls = match self.session {
            Some(ref session) => session.selection.selected_urls(&session.tree),
            None => {
                return Err(WizardError::NotReady {
                    action: "submit",
                    state: self.state,
                });
            }
        };
        if urls.is_empty() {
            self.last_error = Some(WizardError::EmptySelection);
            return Err(WizardError::EmptySelection);
        }

        let previous = self.state;
        self.last_error = None;
        self.set_state(WizardState::Submitting);
        info!("Submitting {} URLs for import", urls.len());

        match self.backend.import_urls(&urls).await {
            Ok(response) => {
                let imported = response.imported.unwrap_or(urls.len());
                info!("Import accepted ({} URLs)", imported);
                self.session = None;
                self.set_state(WizardState::Done);
                if let Some(ref callback) = self.on_imported {
                    callback(imported);
                }
                Ok(imported)
            }
            Err(e) => {
                let error = WizardError::SubmitNetworkError(e.detail());
                warn!("Import failed after {}: {}", previous, error);
                self.last_error = Some(error.clone());
                self.set_state(WizardState::SubmitFailed);
                Err(error)
            }
        }
    }

    fn session_mut(&mut self, action: &'static str) -> Result<&mut Session, WizardError> {
        self.recover_abandoned();
        let state = self.state;
        if !state.has_selection() {
            return Err(WizardError::NotReady { action, state });
        }
        self.session
            .as_mut()
            .ok_or(WizardError::NotReady { action, state })
    }

    /// Select or deselect every page under the node `node_id`. Returns the new selection size.
    pub fn toggle_subtree(&mut self, node_id: &str, select: bool) -> Result<usize, WizardError> {
        let Session { tree, selection } = self.session_mut("change the selection")?;
        let node = tree
            .find(node_id)
            .ok_or_else(|| WizardError::UnknownNode(node_id.to_string()))?;
        selection.toggle_subtree(node, select);
        Ok(selection.len())
    }

    pub fn toggle_single(&mut self, url: &str, select: bool) -> Result<usize, WizardError> {
        let Session { tree, selection } = self.session_mut("change the selection")?;
        if !tree.contains_url(url) {
            return Err(WizardError::UnknownNode(url.to_string()));
        }
        selection.toggle_single(url, select);
        Ok(selection.len())
    }

    pub fn select_all(&mut self) -> Result<usize, WizardError> {
        let Session { tree, selection } = self.session_mut("change the selection")?;
        selection.select_all(tree);
        Ok(selection.len())
    }

    pub fn deselect_all(&mut self) -> Result<usize, WizardError> {
        let Session { tree, selection } = self.session_mut("change the selection")?;
        selection.deselect_all(tree);
        Ok(selection.len())
    }

    /// Replace the selection wholesale, e.g. with one edited in a UI. URLs not in the tree are dropped.
    pub fn set_selection(&mut self, mut new_selection: Selection) -> Result<usize, WizardError> {
        let Session { tree, selection } = self.session_mut("change the selection")?;
        new_selection.retain_in(tree);
        *selection = new_selection;
        Ok(selection.len())
    }

    /// Forget the current tree and selection.
    pub fn reset(&mut self) {
        self.session = None;
        self.last_error = None;
        self.set_state(WizardState::Idle);
    }
}

/// Add a scheme when the user typed a bare host, and reject anything that is not http(s).
pub fn normalize_root_url(input: &str) -> Result<String, WizardError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WizardError::InvalidUrl("a website address is required".to_string()));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some() => Ok(candidate),
        _ => Err(WizardError::InvalidUrl(trimmed.to_string())),
    }
}

/// A request that timed out inside the client still counts as a scan timeout.
fn classify_scan_error(error: &ClientError, timeout: Duration) -> WizardError {
    if error.is_timeout() {
        WizardError::ScanTimeout(timeout)
    } else if error.is_transport() {
        WizardError::ScanNetworkError(error.to_string())
    } else {
        WizardError::ScanRejected(error.detail())
    }
}

fn tree_from_response(root_url: &str, response: ScanResponse) -> Result<CrawlTree, WizardError> {
    if let Some(error) = response.error.filter(|e| !e.trim().is_empty()) {
        return Err(WizardError::ScanRejected(error));
    }
    if response.total_count == 0 {
        return Err(WizardError::ScanEmptyResult(root_url.to_string()));
    }

    let base_url = response
        .base_url
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| root_url.to_string());

    let built = if let Some(node) = response.tree {
        CrawlTree::from_node(&base_url, &node)
    } else if !response.groups.is_empty() {
        build_tree(&base_url, &response.groups)
    } else {
        let pages = response.all_urls.iter().map(|u| u.as_str().into()).collect();
        build_tree(&base_url, &[UrlGroup::new("", pages)])
    };

    built.map_err(|e| match e {
        TreeError::Empty => WizardError::ScanEmptyResult(root_url.to_string()),
        TreeError::InvalidUrl(_) => WizardError::ScanRejected(e.to_string()),
    })
}
