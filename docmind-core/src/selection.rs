use crate::tree::{CrawlNode, CrawlTree};
use std::collections::HashSet;

/// Visual state of a node's checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl CheckState {
    pub fn marker(&self) -> &'static str {
        match self {
            CheckState::Checked => "[x]",
            CheckState::Unchecked => "[ ]",
            CheckState::Indeterminate => "[-]",
        }
    }
}

/// The set of URLs the user currently wants to import.
///
/// Holds only leaf URLs. Every per-node answer (counts, tri-state) is derived
/// from this set on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything in the tree selected; the state right after a scan.
    pub fn all(tree: &CrawlTree) -> Self {
        let mut selection = Self::new();
        selection.select_all(tree);
        selection
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.selected.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn toggle_single(&mut self, url: &str, select: bool) {
        if select {
            self.selected.insert(url.to_string());
        } else {
            self.selected.remove(url);
        }
    }

    pub fn toggle_subtree(&mut self, node: &CrawlNode, select: bool) {
        for url in node.all_urls() {
            self.toggle_single(url, select);
        }
    }

    pub fn select_all(&mut self, tree: &CrawlTree) {
        self.toggle_subtree(tree.root(), true);
    }

    pub fn deselect_all(&mut self, tree: &CrawlTree) {
        self.toggle_subtree(tree.root(), false);
    }

    /// Flip a node the way a checkbox click does: anything short of fully
    /// selected becomes fully selected, fully selected becomes empty.
    pub fn flip_subtree(&mut self, node: &CrawlNode) -> bool {
        let select = !self.is_fully_selected(node);
        self.toggle_subtree(node, select);
        select
    }

    pub fn selected_count(&self, node: &CrawlNode) -> usize {
        node.all_urls().into_iter().filter(|u| self.selected.contains(*u)).count()
    }

    pub fn is_fully_selected(&self, node: &CrawlNode) -> bool {
        let total = node.page_count();
        total > 0 && self.selected_count(node) == total
    }

    pub fn is_partially_selected(&self, node: &CrawlNode) -> bool {
        let count = self.selected_count(node);
        count > 0 && count < node.page_count()
    }

    pub fn check_state(&self, node: &CrawlNode) -> CheckState {
        let count = self.selected_count(node);
        if count == 0 {
            CheckState::Unchecked
        } else if count == node.page_count() {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }

    /// Selected URLs in tree order, ready to send for import.
    pub fn selected_urls(&self, tree: &CrawlTree) -> Vec<String> {
        tree.all_urls()
            .into_iter()
            .filter(|u| self.selected.contains(*u))
            .map(str::to_string)
            .collect()
    }

    /// Drop anything that is not a page of `tree`.
    pub fn retain_in(&mut self, tree: &CrawlTree) {
        let known: HashSet<&str> = tree.all_urls().into_iter().collect();
        self.selected.retain(|u| known.contains(u.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_tree;
    use docmind_client::wire::UrlGroup;

    fn small_tree() -> CrawlTree {
        build_tree(
            "https://example.com",
            &[
                UrlGroup::new("Main", vec!["https://example.com/".into()]),
                UrlGroup::new(
                    "Blog",
                    vec![
                        "https://example.com/blog/a".into(),
                        "https://example.com/blog/b".into(),
                    ],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_flip_subtree_from_partial_selects_everything() {
        let tree = small_tree();
        let blog = tree.find("/blog").unwrap();
        let mut selection = Selection::new();
        selection.toggle_single("https://example.com/blog/a", true);
        assert_eq!(selection.check_state(blog), CheckState::Indeterminate);

        assert!(selection.flip_subtree(blog));
        assert_eq!(selection.check_state(blog), CheckState::Checked);

        assert!(!selection.flip_subtree(blog));
        assert_eq!(selection.check_state(blog), CheckState::Unchecked);
    }

    #[test]
    fn test_retain_in_drops_foreign_urls() {
        let tree = small_tree();
        let mut selection = Selection::all(&tree);
        selection.toggle_single("https://elsewhere.org/", true);
        selection.retain_in(&tree);
        assert_eq!(selection.len(), 3);
        assert!(!selection.contains("https://elsewhere.org/"));
    }

    #[test]
    fn test_selected_urls_follow_tree_order() {
        let tree = small_tree();
        let selection = Selection::all(&tree);
        assert_eq!(
            selection.selected_urls(&tree),
            vec![
                "https://example.com/",
                "https://example.com/blog/a",
                "https://example.com/blog/b",
            ]
        );
    }

    #[test]
    fn test_markers() {
        assert_eq!(CheckState::Checked.marker(), "[x]");
        assert_eq!(CheckState::Unchecked.marker(), "[ ]");
        assert_eq!(CheckState::Indeterminate.marker(), "[-]");
    }
}
