use crate::selection::Selection;
use crate::tree::{CrawlNode, CrawlTree};

/// Render the tree with tri-state checkboxes and `selected/total` counts.
///
/// ```text
/// [-] example.com  6/8
/// ├── [x] Home  (https://example.com/)
/// ├── [ ] Blog  0/2
/// └── [x] Docs  5/5
/// ```
pub fn render_tree(tree: &CrawlTree, selection: &Selection, show_pages: bool) -> String {
    let root = tree.root();
    let mut out = format!(
        "{} {}  {}/{}\n",
        selection.check_state(root).marker(),
        root.name,
        selection.selected_count(root),
        root.page_count()
    );
    render_children(root, selection, show_pages, "", &mut out);
    out
}

fn render_children(node: &CrawlNode, selection: &Selection, show_pages: bool, prefix: &str, out: &mut String) {
    let page_lines = if show_pages { node.urls.len() } else { 0 };
    let total = page_lines + node.children.len();

    for (i, page) in node.urls.iter().take(page_lines).enumerate() {
        let connector = if i + 1 == total { "└── " } else { "├── " };
        let marker = if selection.contains(&page.url) { "[x]" } else { "[ ]" };
        out.push_str(&format!("{}{}{} {}  ({})\n", prefix, connector, marker, page.title, page.url));
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last = page_lines + i + 1 == total;
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(&format!(
            "{}{}{} {}  {}/{}\n",
            prefix,
            connector,
            selection.check_state(child).marker(),
            child.name,
            selection.selected_count(child),
            child.page_count()
        ));
        let extension = if is_last { "    " } else { "│   " };
        render_children(child, selection, show_pages, &format!("{}{}", prefix, extension), out);
    }
}

/// One-line overview, e.g. `6 of 8 pages selected (3 sections)`.
pub fn selection_summary(tree: &CrawlTree, selection: &Selection) -> String {
    let root = tree.root();
    let sections = root.walk().len() - 1;
    format!(
        "{} of {} pages selected ({} section{})",
        selection.selected_count(root),
        root.page_count(),
        sections,
        if sections == 1 { "" } else { "s" }
    )
}
