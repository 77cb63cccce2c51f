//! Hierarchical view of a website crawl.
//!
//! The backend answers a scan with URLs bucketed by their first path segment.
//! [`build_tree`] turns those buckets into a path hierarchy so whole sections
//! of a site (`/blog/*`) can be included or excluded at once. The tree is an
//! immutable value: selection lives in [`crate::selection::Selection`] and is
//! recomputed against the tree on every query.

use docmind_client::wire::{PageRef, UrlGroup, WireNode};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use url::Url;

pub const ROOT_ID: &str = "/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("crawl result contains no pages")]
    Empty,

    #[error("malformed URL in crawl result: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlNode {
    pub id: String,
    pub name: String,
    pub urls: Vec<PageEntry>,
    pub children: Vec<CrawlNode>,
}

impl CrawlNode {
    /// Every URL at or below this node, own pages first, then children in order.
    pub fn all_urls(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.page_count());
        self.collect_urls(&mut out);
        out
    }

    fn collect_urls<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.extend(self.urls.iter().map(|p| p.url.as_str()));
        for child in &self.children {
            child.collect_urls(out);
        }
    }

    /// Number of pages in the whole subtree.
    pub fn page_count(&self) -> usize {
        self.urls.len() + self.children.iter().map(CrawlNode::page_count).sum::<usize>()
    }

    /// Pages attached directly to this node.
    pub fn direct_count(&self) -> usize {
        self.urls.len()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.children.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&CrawlNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.urls.iter().any(|p| p.url == url) || self.children.iter().any(|c| c.contains_url(url))
    }

    /// Pre-order walk yielding `(depth, node)`.
    pub fn walk(&self) -> Vec<(usize, &CrawlNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTree {
    base_url: String,
    root: CrawlNode,
}

impl CrawlTree {
    pub fn root(&self) -> &CrawlNode {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn find(&self, id: &str) -> Option<&CrawlNode> {
        self.root.find(id)
    }

    /// Resolve a user-typed section such as `blog`, `/blog/` or `/Blog`.
    pub fn find_by_path(&self, path: &str) -> Option<&CrawlNode> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Some(&self.root);
        }
        let wanted = format!("/{}", trimmed);
        self.find(&wanted).or_else(|| {
            self.root
                .walk()
                .into_iter()
                .map(|(_, node)| node)
                .find(|node| node.id.eq_ignore_ascii_case(&wanted) || node.name.eq_ignore_ascii_case(trimmed))
        })
    }

    pub fn all_urls(&self) -> Vec<&str> {
        self.root.all_urls()
    }

    pub fn page_count(&self) -> usize {
        self.root.page_count()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.root.contains_url(url)
    }

    /// Normalize a backend-built hierarchy: drop duplicate URLs (first wins),
    /// prune empty nodes and make ids unique.
    pub fn from_node(base_url: &str, node: &WireNode) -> Result<Self, TreeError> {
        let mut seen = HashSet::new();
        let mut used_ids = HashSet::new();
        let root = normalize_node(node, None, &mut seen, &mut used_ids)?;
        match root {
            Some(mut root) if !root.is_empty() => {
                if root.name.trim().is_empty() {
                    root.name = host_label(base_url);
                }
                Ok(Self {
                    base_url: base_url.to_string(),
                    root,
                })
            }
            _ => Err(TreeError::Empty),
        }
    }
}

/// Build the pruned path hierarchy from the backend's grouped crawl result.
///
/// Pages with an empty path sit on the root. A page at `/a/b/c` sits in the
/// node for directory `/a/b`; a page at `/a` or `/a/b` sits in the top-level
/// node `/a`, which is labelled with its group name when the backend gave one.
/// Duplicate URLs are dropped, first occurrence wins.
pub fn build_tree(base_url: &str, groups: &[UrlGroup]) -> Result<CrawlTree, TreeError> {
    let mut root = NodeBuilder::new(ROOT_ID.to_string(), host_label(base_url));
    let mut seen: HashSet<String> = HashSet::new();

    for group in groups {
        for page in &group.urls {
            let raw = page.url().trim();
            if raw.is_empty() || seen.contains(raw) {
                continue;
            }
            let parsed = Url::parse(raw).map_err(|_| TreeError::InvalidUrl(raw.to_string()))?;
            seen.insert(raw.to_string());

            let segments: Vec<&str> = parsed
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            let dir_len = match segments.len() {
                0 => 0,
                n => (n - 1).max(1),
            };

            let mut node = &mut root;
            for (depth, segment) in segments[..dir_len].iter().enumerate() {
                let label = if depth == 0 && !group.name.trim().is_empty() {
                    group.name.trim().to_string()
                } else {
                    humanize(segment)
                };
                node = node.child(segment, label);
            }

            node.urls.push(PageEntry {
                url: raw.to_string(),
                title: page_title(page, &parsed, &segments),
            });
        }
    }

    let root = root.finish().ok_or(TreeError::Empty)?;
    Ok(CrawlTree {
        base_url: base_url.to_string(),
        root,
    })
}

struct NodeBuilder {
    id: String,
    name: String,
    urls: Vec<PageEntry>,
    children: Vec<NodeBuilder>,
    index: HashMap<String, usize>,
}

impl NodeBuilder {
    fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            urls: Vec::new(),
            children: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn child(&mut self, segment: &str, label: String) -> &mut NodeBuilder {
        let idx = match self.index.get(segment) {
            Some(&idx) => idx,
            None => {
                let id = if self.id == ROOT_ID {
                    format!("/{}", segment)
                } else {
                    format!("{}/{}", self.id, segment)
                };
                self.children.push(NodeBuilder::new(id, label));
                self.index.insert(segment.to_string(), self.children.len() - 1);
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    fn finish(self) -> Option<CrawlNode> {
        let children: Vec<CrawlNode> = self.children.into_iter().filter_map(NodeBuilder::finish).collect();
        if self.urls.is_empty() && children.is_empty() {
            return None;
        }
        Some(CrawlNode {
            id: self.id,
            name: self.name,
            urls: self.urls,
            children,
        })
    }
}

fn normalize_node(
    node: &WireNode,
    parent_id: Option<&str>,
    seen: &mut HashSet<String>,
    used_ids: &mut HashSet<String>,
) -> Result<Option<CrawlNode>, TreeError> {
    let id = unique_id(node, parent_id, used_ids);

    let mut urls = Vec::new();
    for page in &node.urls {
        let raw = page.url().trim();
        if raw.is_empty() || seen.contains(raw) {
            continue;
        }
        let parsed = Url::parse(raw).map_err(|_| TreeError::InvalidUrl(raw.to_string()))?;
        seen.insert(raw.to_string());
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        urls.push(PageEntry {
            url: raw.to_string(),
            title: page_title(page, &parsed, &segments),
        });
    }

    let mut children = Vec::new();
    for child in &node.children {
        if let Some(child) = normalize_node(child, Some(&id), seen, used_ids)? {
            children.push(child);
        }
    }

    if urls.is_empty() && children.is_empty() {
        return Ok(None);
    }
    Ok(Some(CrawlNode {
        id,
        name: node.name.clone(),
        urls,
        children,
    }))
}

fn unique_id(node: &WireNode, parent_id: Option<&str>, used_ids: &mut HashSet<String>) -> String {
    let candidate = match (&node.id, parent_id) {
        (Some(id), _) if !id.trim().is_empty() => id.trim().to_string(),
        (_, None) => ROOT_ID.to_string(),
        (_, Some(parent)) => {
            let slug = slugify(&node.name);
            if parent == ROOT_ID {
                format!("/{}", slug)
            } else {
                format!("{}/{}", parent, slug)
            }
        }
    };

    let mut id = candidate.clone();
    let mut n = 2;
    while used_ids.contains(&id) {
        id = format!("{}-{}", candidate, n);
        n += 1;
    }
    used_ids.insert(id.clone());
    id
}

fn page_title(page: &PageRef, parsed: &Url, segments: &[&str]) -> String {
    if let Some(title) = page.title() {
        return title.trim().to_string();
    }
    match segments.last() {
        Some(last) => humanize(last),
        None => parsed.host_str().unwrap_or(parsed.as_str()).to_string(),
    }
}

fn host_label(base_url: &str) -> String {
    Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| base_url.to_string())
}

/// `getting-started.html` -> `Getting Started`
pub fn humanize(segment: &str) -> String {
    let stem = [".html", ".htm", ".php", ".aspx"]
        .iter()
        .find_map(|ext| segment.strip_suffix(ext))
        .unwrap_or(segment);

    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() { "section".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("getting-started"), "Getting Started");
        assert_eq!(humanize("api_reference.html"), "Api Reference");
        assert_eq!(humanize("FAQ"), "Faq");
        assert_eq!(humanize("2024"), "2024");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Blog Posts"), "blog-posts");
        assert_eq!(slugify("  !!  "), "section");
    }

    #[test]
    fn test_walk_is_preorder() {
        let groups = vec![UrlGroup::new(
            "Docs",
            vec![
                "https://example.com/docs/intro".into(),
                "https://example.com/docs/guides/setup".into(),
            ],
        )];
        let tree = build_tree("https://example.com", &groups).unwrap();
        let ids: Vec<&str> = tree.root().walk().iter().map(|(_, n)| n.id.as_str()).collect();
        assert_eq!(ids, vec!["/", "/docs", "/docs/guides"]);
    }

    #[test]
    fn test_unique_id_suffixes_duplicates() {
        let mut used = HashSet::new();
        let node = WireNode {
            id: None,
            name: "Blog".to_string(),
            urls: vec![],
            children: vec![],
        };
        assert_eq!(unique_id(&node, Some(ROOT_ID), &mut used), "/blog");
        assert_eq!(unique_id(&node, Some(ROOT_ID), &mut used), "/blog-2");
    }
}
