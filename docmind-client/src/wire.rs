use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_BOT_NAME: &str = "DocMind";
pub const DEFAULT_WIDGET_COLOR: &str = "#4F46E5";
pub const DEFAULT_INITIAL_MESSAGE: &str = "Hello! How can I help you today?";

/// A crawled page as the backend reports it: either a bare URL or a URL with a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRef {
    Url(String),
    Titled {
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
}

impl PageRef {
    pub fn url(&self) -> &str {
        match self {
            PageRef::Url(url) => url,
            PageRef::Titled { url, .. } => url,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            PageRef::Url(_) => None,
            PageRef::Titled { title, .. } => title.as_deref().filter(|t| !t.trim().is_empty()),
        }
    }
}

impl From<&str> for PageRef {
    fn from(url: &str) -> Self {
        PageRef::Url(url.to_string())
    }
}

/// One first-path-segment bucket of a crawl result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlGroup {
    pub name: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub urls: Vec<PageRef>,
}

impl UrlGroup {
    pub fn new(name: impl Into<String>, urls: Vec<PageRef>) -> Self {
        Self {
            name: name.into(),
            count: urls.len(),
            urls,
        }
    }
}

/// Backend-built hierarchy, used by backends that return `{ "tree": ... }` instead of groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub urls: Vec<PageRef>,
    #[serde(default)]
    pub children: Vec<WireNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub groups: Vec<UrlGroup>,
    #[serde(default)]
    pub all_urls: Vec<String>,
    #[serde(default)]
    pub tree: Option<WireNode>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub imported: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    File,
    Url,
    #[serde(other)]
    Other,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::File => "file",
            DocumentKind::Url => "url",
            DocumentKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    #[serde(default)]
    pub original_source: Option<String>,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
}

impl Document {
    /// The key the backend expects when deleting this document.
    pub fn delete_key(&self) -> &str {
        self.original_source.as_deref().unwrap_or(&self.source)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteDocumentRequest {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Per-tenant bot and widget presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSettings {
    #[serde(default)]
    pub message_count: u64,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "default_widget_color")]
    pub widget_color: String,
    #[serde(default)]
    pub header_logo: String,
    #[serde(default = "default_initial_message")]
    pub initial_message: String,
}

fn default_bot_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}
fn default_widget_color() -> String {
    DEFAULT_WIDGET_COLOR.to_string()
}
fn default_initial_message() -> String {
    DEFAULT_INITIAL_MESSAGE.to_string()
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            message_count: 0,
            bot_name: default_bot_name(),
            system_prompt: String::new(),
            widget_color: default_widget_color(),
            header_logo: String::new(),
            initial_message: default_initial_message(),
        }
    }
}

/// Row id as the backend sends it; some tables use integers, others strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: RecordId,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteRequest {
    pub email: String,
}

/// One message from a conversation with the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub id: RecordId,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ChatLogEntry {
    pub fn is_user(&self) -> bool {
        self.role.eq_ignore_ascii_case("user")
    }
}
