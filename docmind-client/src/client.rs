use crate::error::{ClientError, Result};
use crate::wire::{
    ChatLogEntry, ChatRequest, ChatResponse, DeleteDocumentRequest, Document, DocumentList, HealthResponse,
    ImportRequest, ImportResponse, InviteRequest, ScanRequest, ScanResponse, TeamMember, UploadResponse,
    WidgetSettings,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Header the backend uses to scope every call to one tenant.
pub const USER_ID_HEADER: &str = "user-id";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    user_id: String,
    scan_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, user_id: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, user_id, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, user_id: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("DocMind/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            user_id: user_id.into(),
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
        })
    }

    /// Upper bound for the scan request itself. Scans routinely outlive the
    /// per-request timeout, so they get their own ceiling.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self.request_url(method, url))
    }

    fn request_url(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header(USER_ID_HEADER, &self.user_id)
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Backend returned {}: {}", status, body);
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let response = Self::send(builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        Self::json(self.request(reqwest::Method::GET, "/")?).await
    }

    /// Ask the backend to crawl `url`. Can take minutes on large sites.
    pub async fn scan_website(&self, url: &str) -> Result<ScanResponse> {
        info!("Requesting scan of {}", url);
        let start = Instant::now();
        let builder = self
            .request(reqwest::Method::POST, "/crawl/scan")?
            .timeout(self.scan_timeout)
            .json(&ScanRequest {
                url: url.to_string(),
            });
        let response: ScanResponse = Self::json(builder).await?;
        info!(
            "Scan of {} answered in {:?} ({} pages)",
            url,
            start.elapsed(),
            response.total_count
        );
        Ok(response)
    }

    /// Hand the chosen URLs to the backend for ingestion.
    pub async fn import_urls(&self, urls: &[String]) -> Result<ImportResponse> {
        info!("Importing {} URLs", urls.len());
        let builder = self
            .request(reqwest::Method::POST, "/crawl/import")?
            .json(&ImportRequest {
                urls: urls.to_vec(),
            });
        let response = Self::send(builder).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ImportResponse::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let list: DocumentList = Self::json(self.request(reqwest::Method::GET, "/documents")?).await?;
        debug!("Backend lists {} documents", list.documents.len());
        Ok(list.documents)
    }

    pub async fn delete_document(&self, source: &str) -> Result<()> {
        info!("Deleting document {}", source);
        let builder = self
            .request(reqwest::Method::DELETE, "/documents")?
            .json(&DeleteDocumentRequest {
                source: source.to_string(),
            });
        Self::send(builder).await?;
        Ok(())
    }

    pub async fn get_settings(&self) -> Result<WidgetSettings> {
        Self::json(self.request(reqwest::Method::GET, "/user/settings")?).await
    }

    /// The backend replaces the whole record; send a fully merged value.
    pub async fn update_settings(&self, settings: &WidgetSettings) -> Result<WidgetSettings> {
        let builder = self
            .request(reqwest::Method::POST, "/user/settings")?
            .json(settings);
        Self::json(builder).await
    }

    pub async fn upload_document(&self, path: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        info!("Uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let builder = self.request(reqwest::Method::POST, "/upload")?.multipart(form);
        Self::json(builder).await
    }

    pub async fn chat(&self, question: &str, session_id: Option<&str>) -> Result<ChatResponse> {
        let builder = self
            .request(reqwest::Method::POST, "/chat")?
            .json(&ChatRequest {
                question: question.to_string(),
                session_id: session_id.map(str::to_string),
            });
        Self::json(builder).await
    }

    pub async fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        let members: Vec<TeamMember> = Self::json(self.request(reqwest::Method::GET, "/team")?).await?;
        debug!("Team has {} members", members.len());
        Ok(members)
    }

    pub async fn invite_team_member(&self, email: &str) -> Result<()> {
        info!("Inviting {}", email);
        let builder = self
            .request(reqwest::Method::POST, "/team/invite")?
            .json(&InviteRequest {
                email: email.to_string(),
            });
        Self::send(builder).await?;
        Ok(())
    }

    pub async fn remove_team_member(&self, member_id: &str) -> Result<()> {
        info!("Removing team member {}", member_id);
        let mut url = self.endpoint("/team")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .push(member_id);
        Self::send(self.request_url(reqwest::Method::DELETE, url)).await?;
        Ok(())
    }

    /// Stored chat messages for this account, in backend order.
    pub async fn chat_logs(&self) -> Result<Vec<ChatLogEntry>> {
        Self::json(self.request(reqwest::Method::GET, "/logs")?).await
    }
}

/// Base URLs are joined against, so they must end in `/` to keep any path prefix.
fn normalize_base(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl(format!(
            "{}: only http and https are supported",
            base_url
        )));
    }
    Ok(url)
}
