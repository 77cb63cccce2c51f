use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use docmind_core::report::selection_summary;
use docmind_core::tree::{CrawlNode, CrawlTree, PageEntry};
use docmind_core::{CheckState, Selection};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::collections::HashSet;
use std::io;
use std::time::Duration;

const PAGE_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOutcome {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum RowKind<'a> {
    Section(&'a CrawlNode),
    Page(&'a PageEntry),
}

#[derive(Debug, Clone, Copy)]
struct Row<'a> {
    depth: usize,
    kind: RowKind<'a>,
    parent: Option<usize>,
}

/// Interactive checkbox tree over one crawl result.
pub struct TreeSelector<'a> {
    tree: &'a CrawlTree,
    selection: Selection,
    expanded: HashSet<String>,
    cursor: usize,
    scroll: usize,
    status: Option<String>,
    outcome: Option<SelectorOutcome>,
}

impl<'a> TreeSelector<'a> {
    /// Starts with the root and its direct sections expanded.
    pub fn new(tree: &'a CrawlTree, selection: Selection) -> Self {
        let mut expanded = HashSet::new();
        expanded.insert(tree.root().id.clone());
        for child in &tree.root().children {
            if child.child_count() > 0 {
                expanded.insert(child.id.clone());
            }
        }
        Self {
            tree,
            selection,
            expanded,
            cursor: 0,
            scroll: 0,
            status: None,
            outcome: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn into_selection(self) -> Selection {
        self.selection
    }

    pub fn outcome(&self) -> Option<SelectorOutcome> {
        self.outcome
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded.contains(node_id)
    }

    fn rows(&self) -> Vec<Row<'a>> {
        let mut rows = Vec::new();
        self.push_rows(self.tree.root(), 0, None, &mut rows);
        rows
    }

    fn push_rows(&self, node: &'a CrawlNode, depth: usize, parent: Option<usize>, rows: &mut Vec<Row<'a>>) {
        let index = rows.len();
        rows.push(Row {
            depth,
            kind: RowKind::Section(node),
            parent,
        });
        if !self.expanded.contains(&node.id) {
            return;
        }
        for page in &node.urls {
            rows.push(Row {
                depth: depth + 1,
                kind: RowKind::Page(page),
                parent: Some(index),
            });
        }
        for child in &node.children {
            self.push_rows(child, depth + 1, Some(index), rows);
        }
    }

    /// Visible rows as plain text, e.g. `  ▸ [-] Blog  1/2`.
    pub fn visible_lines(&self) -> Vec<String> {
        self.rows().iter().map(|row| self.row_text(row)).collect()
    }

    fn row_text(&self, row: &Row<'_>) -> String {
        let indent = "  ".repeat(row.depth);
        match row.kind {
            RowKind::Section(node) => {
                let arrow = if self.expanded.contains(&node.id) { "▾" } else { "▸" };
                format!(
                    "{}{} {} {}  {}/{}",
                    indent,
                    arrow,
                    self.selection.check_state(node).marker(),
                    node.name,
                    self.selection.selected_count(node),
                    node.page_count()
                )
            }
            RowKind::Page(page) => {
                let marker = if self.selection.contains(&page.url) {
                    CheckState::Checked.marker()
                } else {
                    CheckState::Unchecked.marker()
                };
                format!("{}  {} {}  {}", indent, marker, page.title, page.url)
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status = None;
        let rows = self.rows();
        let last = rows.len().saturating_sub(1);

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.outcome = Some(SelectorOutcome::Cancelled);
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.outcome = Some(SelectorOutcome::Cancelled);
            }
            KeyCode::Enter => {
                if self.selection.is_empty() {
                    self.status = Some("Select at least one page to import".to_string());
                } else {
                    self.outcome = Some(SelectorOutcome::Confirmed);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(last);
            }
            KeyCode::PageUp => {
                self.cursor = self.cursor.saturating_sub(PAGE_STEP);
            }
            KeyCode::PageDown => {
                self.cursor = (self.cursor + PAGE_STEP).min(last);
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = last,
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(RowKind::Section(node)) = rows.get(self.cursor).map(|r| r.kind) {
                    self.expanded.insert(node.id.clone());
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if let Some(row) = rows.get(self.cursor) {
                    match row.kind {
                        RowKind::Section(node) if self.expanded.contains(&node.id) => {
                            self.expanded.remove(&node.id);
                        }
                        _ => {
                            if let Some(parent) = row.parent {
                                self.cursor = parent;
                            }
                        }
                    }
                }
            }
            KeyCode::Char(' ') => {
                if let Some(row) = rows.get(self.cursor) {
                    match row.kind {
                        RowKind::Section(node) => {
                            self.selection.flip_subtree(node);
                        }
                        RowKind::Page(page) => {
                            let select = !self.selection.contains(&page.url);
                            self.selection.toggle_single(&page.url, select);
                        }
                    }
                }
            }
            KeyCode::Char('a') => self.selection.select_all(self.tree),
            KeyCode::Char('n') => self.selection.deselect_all(self.tree),
            _ => {}
        }

        // Collapsing can shrink the list under the cursor.
        let visible = self.rows().len();
        self.cursor = self.cursor.min(visible.saturating_sub(1));
    }

    fn render_tree(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.tree.base_url()))
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        f.render_widget(block, area);

        let height = (inner.height as usize).max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }

        let rows = self.rows();
        let items: Vec<ListItem> = rows
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(height)
            .map(|(idx, row)| {
                let color = match row.kind {
                    RowKind::Section(node) => match self.selection.check_state(node) {
                        CheckState::Checked => Color::Green,
                        CheckState::Indeterminate => Color::Yellow,
                        CheckState::Unchecked => Color::DarkGray,
                    },
                    RowKind::Page(page) if self.selection.contains(&page.url) => Color::White,
                    RowKind::Page(_) => Color::DarkGray,
                };

                let mut style = Style::default().fg(color);
                if matches!(row.kind, RowKind::Section(_)) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if idx == self.cursor {
                    style = style.bg(Color::DarkGray).fg(Color::White);
                }
                ListItem::new(self.row_text(row)).style(style)
            })
            .collect();

        f.render_widget(List::new(items), inner);
    }

    fn render_summary(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Selection ")
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut text = vec![Line::from(Span::styled(
            selection_summary(self.tree, &self.selection),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))];
        if let Some(ref status) = self.status {
            text.push(Line::from(Span::styled(status.clone(), Style::default().fg(Color::Red))));
        }

        f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
    }

    fn render_hints(&self, f: &mut Frame, area: Rect) {
        let key = Style::default().fg(Color::Black).bg(Color::Gray);
        let hints = Line::from(vec![
            Span::styled(" ↑/↓ ", key),
            Span::raw(" Move  "),
            Span::styled(" ←/→ ", key),
            Span::raw(" Collapse/Expand  "),
            Span::styled(" Space ", key),
            Span::raw(" Toggle  "),
            Span::styled(" a/n ", key),
            Span::raw(" All/None  "),
            Span::styled(" Enter ", key),
            Span::raw(" Import  "),
            Span::styled(" q/ESC ", key),
            Span::raw(" Cancel"),
        ]);

        let paragraph = Paragraph::new(hints).style(Style::default().bg(Color::Black).fg(Color::Gray));
        f.render_widget(paragraph, area);
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Tree
                Constraint::Length(4), // Summary + status
                Constraint::Length(1), // Hints bar
            ])
            .split(f.area());

        self.render_tree(f, chunks[0]);
        self.render_summary(f, chunks[1]);
        self.render_hints(f, chunks[2]);
    }
}

/// Let the user edit `selection` over `tree` in a full-screen picker.
///
/// Returns the edited selection when confirmed with Enter, `None` when cancelled.
pub fn run_selector(tree: &CrawlTree, selection: Selection) -> Result<Option<Selection>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut selector = TreeSelector::new(tree, selection);
    let result = event_loop(&mut terminal, &mut selector);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    match selector.outcome() {
        Some(SelectorOutcome::Confirmed) => Ok(Some(selector.into_selection())),
        _ => Ok(None),
    }
}

fn event_loop<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, selector: &mut TreeSelector<'_>) -> Result<()> {
    while selector.outcome().is_none() {
        terminal.draw(|f| selector.draw(f))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            selector.handle_key(key);
        }
    }
    Ok(())
}
