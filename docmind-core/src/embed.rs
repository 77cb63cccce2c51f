//! Copy-paste snippets for putting the chat widget on a customer's site.

/// Snippets for one bot, served from `host` (the frontend origin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSnippets {
    host: String,
    owner_id: String,
}

impl EmbedSnippets {
    pub fn new(host: &str, owner_id: &str) -> Self {
        Self {
            host: host.trim().trim_end_matches('/').to_string(),
            owner_id: owner_id.trim().to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn embed_url(&self) -> String {
        format!("{}/embed/{}", self.host, self.owner_id)
    }

    pub fn loader_url(&self) -> String {
        format!("{}/loader.js", self.host)
    }

    pub fn widget_url(&self) -> String {
        format!("{}/standalone-widget", self.host)
    }

    /// Inline chat panel.
    pub fn iframe(&self) -> String {
        format!(
            r#"<iframe
    src="{}"
    width="100%"
    height="600"
    frameborder="0"
    style="border-radius: 12px; box-shadow: 0 4px 12px rgba(0,0,0,0.1);"
></iframe>"#,
            escape_attr(&self.embed_url())
        )
    }

    /// Config object plus async loader.
    pub fn script(&self) -> String {
        format!(
            r#"<script>
  window.DocMindConfig = {{
    botId: "{}",
    host: "{}"
  }};
</script>
<script src="{}" async></script>"#,
            escape_js(&self.owner_id),
            escape_js(&self.host),
            escape_attr(&self.loader_url())
        )
    }

    /// Floating chat bubble in the bottom-right corner.
    pub fn bubble(&self) -> String {
        format!(
            r#"<script src="{}" data-owner-id="{}" data-widget-url="{}" defer></script>"#,
            escape_attr(&self.loader_url()),
            escape_attr(&self.owner_id),
            escape_attr(&self.widget_url())
        )
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_js(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
