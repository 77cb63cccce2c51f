use clap::ArgMatches;
use colored::Colorize;
use docmind_client::ApiClient;
use docmind_client::wire::{ChatLogEntry, Document, DocumentKind, TeamMember, WidgetSettings};
use docmind_core::config::{Config, DEFAULT_CONFIG_DIR, config_file_in};
use docmind_core::embed::EmbedSnippets;
use docmind_core::report::{render_tree, selection_summary};
use docmind_core::settings::{SettingsUpdate, header_text_color};
use docmind_core::{CrawlTree, CrawlWizard, Selection, WizardError};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// File types the backend knows how to ingest.
pub const SUPPORTED_UPLOAD_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Extra room on the HTTP scan request so the wizard's own timeout fires first.
const SCAN_REQUEST_GRACE: Duration = Duration::from_secs(15);

// Helper functions shared by the handlers

/// HTTP ceiling for the scan request. Saturates so `--timeout` near `u64::MAX` stays valid.
pub fn scan_request_timeout(wizard_timeout: Duration) -> Duration {
    wizard_timeout.saturating_add(SCAN_REQUEST_GRACE)
}

/// Config file named by `--config`, or the default location.
pub fn config_path(args: &ArgMatches) -> PathBuf {
    match args.get_one::<String>("config") {
        Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
        None => Config::default_path(),
    }
}

/// Load the config file (defaults if missing) and apply `--api` / `--user`.
pub fn load_config(args: &ArgMatches) -> Result<Config, String> {
    let path = config_path(args);
    debug!("Loading config from {}", path.display());
    let config = Config::load_or_default(&path).map_err(|e| e.to_string())?;
    apply_overrides(config, args.get_one::<Url>("api"), args.get_one::<String>("user"))
}

pub fn apply_overrides(mut config: Config, api: Option<&Url>, user: Option<&String>) -> Result<Config, String> {
    if let Some(api) = api {
        config.api_base_url = api.to_string();
    }
    if let Some(user) = user {
        config.user_id = Some(user.trim().to_string());
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

pub fn build_client(config: &Config) -> Result<ApiClient, String> {
    let user = config.user_id.as_deref().ok_or_else(|| {
        "No user id configured. Pass --user or set user_id in the config file (see `docmind init`).".to_string()
    })?;
    ApiClient::with_timeout(&config.api_base_url, user, config.request_timeout_secs).map_err(|e| e.to_string())
}

/// Deselect each named section (`/blog`, `blog`, `Blog`) in `selection`.
pub fn exclude_sections(tree: &CrawlTree, selection: &mut Selection, sections: &[String]) -> Result<(), String> {
    for section in sections {
        let node = tree
            .find_by_path(section)
            .ok_or_else(|| format!("No section matches '{}'", section))?;
        selection.toggle_subtree(node, false);
    }
    Ok(())
}

pub fn filter_documents(documents: Vec<Document>, kind: Option<DocumentKind>) -> Vec<Document> {
    match kind {
        Some(kind) => documents.into_iter().filter(|d| d.kind == kind).collect(),
        None => documents,
    }
}

pub fn parse_document_kind(value: &str) -> Result<DocumentKind, String> {
    match value.trim().to_lowercase().as_str() {
        "file" => Ok(DocumentKind::File),
        "url" => Ok(DocumentKind::Url),
        other => Err(format!("Unknown document type '{}', expected file or url", other)),
    }
}

/// Match what the user typed against either the displayed or the stored name.
pub fn find_document<'a>(documents: &'a [Document], source: &str) -> Option<&'a Document> {
    documents
        .iter()
        .find(|d| d.source == source || d.original_source.as_deref() == Some(source))
}

pub fn check_upload_path(path: &Path) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(format!(
            "Unsupported file type '{}'. Supported: {}",
            path.display(),
            SUPPORTED_UPLOAD_EXTENSIONS.join(", ")
        ));
    }
    Ok(())
}

pub fn settings_update_from_args(args: &ArgMatches) -> SettingsUpdate {
    let value = |name: &str| args.get_one::<String>(name).cloned();
    SettingsUpdate {
        bot_name: value("name"),
        system_prompt: value("prompt"),
        widget_color: value("color"),
        header_logo: value("logo"),
        initial_message: value("greeting"),
    }
}

/// Trimmed address if it looks like `name@domain.tld`.
pub fn check_invite_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email.to_string())
    } else {
        Err(format!("'{}' is not an email address", email))
    }
}

/// Match a member by id or, case-insensitively, by email.
pub fn find_member<'a>(members: &'a [TeamMember], key: &str) -> Option<&'a TeamMember> {
    let key = key.trim();
    members
        .iter()
        .find(|m| m.id.to_string() == key || m.email.eq_ignore_ascii_case(key))
}

pub fn limit_logs(mut logs: Vec<ChatLogEntry>, limit: Option<usize>) -> Vec<ChatLogEntry> {
    if let Some(limit) = limit {
        logs.truncate(limit);
    }
    logs
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String, String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().map_err(|e| e.to_string())?;
    let mut response = String::new();
    io::stdin().read_line(&mut response).map_err(|e| e.to_string())?;
    Ok(response.trim().to_string())
}

fn confirm(msg: &str, default_yes: bool) -> Result<bool, String> {
    let response = print_prompt(msg)?.to_lowercase();
    Ok(match response.as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default_yes,
    })
}

fn spinner(message: String) -> Result<ProgressBar, String> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .map_err(|e| e.to_string())?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    Ok(spinner)
}

pub fn handle_init(args: &ArgMatches) -> Result<(), String> {
    print_divider();
    println!("{}", "  DOCMIND SETUP".bright_white().bold());
    print_divider();
    println!();

    let dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let path = config_file_in(dir);

    println!(
        "{} Target: {}",
        "→".blue(),
        path.display().to_string().bright_white()
    );
    println!();

    if path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A config file already exists at that location.");
        if !confirm("Overwrite it? [y/N]:", false)? {
            println!("{} Setup cancelled.", "✗".red().bold());
            return Ok(());
        }
        println!();
    }

    let mut config = apply_overrides(
        Config::default(),
        args.get_one::<Url>("api"),
        args.get_one::<String>("user"),
    )?;

    if config.user_id.is_none() && !force {
        let user = print_prompt("Your DocMind user id (leave blank to set it later):")?;
        if !user.is_empty() {
            config.user_id = Some(user);
        }
        println!();
    }

    config.save(&path).map_err(|e| e.to_string())?;

    print_divider();
    println!("{}", "  SETUP COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config: {}",
        "✓".green().bold(),
        path.display().to_string().bright_white()
    );
    println!("{} Backend: {}", "✓".green().bold(), config.api_base_url.bright_white());
    match config.user_id {
        Some(ref user) => println!("{} User: {}", "✓".green().bold(), user.bright_white()),
        None => println!(
            "{} No user id yet. Add user_id to the config or pass --user.",
            "ℹ".blue()
        ),
    }
    println!();
    Ok(())
}

pub async fn handle_status(config: &Config) -> Result<(), String> {
    let user = config.user_id.clone().unwrap_or_default();
    let client = ApiClient::with_timeout(&config.api_base_url, user, config.request_timeout_secs)
        .map_err(|e| e.to_string())?;
    let health = client.health().await.map_err(|e| e.to_string())?;
    println!(
        "{} {} is up: {}",
        "✓".green().bold(),
        client.base_url().as_str().bright_white(),
        health.message
    );
    Ok(())
}

pub async fn handle_crawl(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let url = args
        .get_one::<String>("url")
        .ok_or_else(|| "--url is required".to_string())?;
    let timeout = args
        .get_one::<u64>("timeout")
        .map(|secs| Duration::from_secs(*secs))
        .unwrap_or_else(|| config.scan_timeout());
    let excludes: Vec<String> = args
        .get_many::<String>("exclude")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let assume_yes = args.get_flag("yes");
    let show_pages = args.get_flag("show-pages");
    let use_tui = !args.get_flag("no-tui") && !assume_yes && io::stdout().is_terminal();

    let client = build_client(config)?.with_scan_timeout(scan_request_timeout(timeout));
    let refresh_client = client.clone();

    let (imported_tx, mut imported_rx) = mpsc::unbounded_channel::<usize>();
    let mut wizard = CrawlWizard::new(client)
        .with_scan_timeout(timeout)
        .with_imported_callback(Arc::new(move |count: usize| {
            let _ = imported_tx.send(count);
        }));

    let progress = spinner(format!(
        "Scanning {} (large sites can take a few minutes)",
        url
    ))?;
    let scanned = wizard.scan(url).await.map(|tree| tree.page_count());
    progress.finish_and_clear();
    let pages = scanned.map_err(|e| e.to_string())?;
    println!("{} Found {} pages", "✓".green().bold(), pages.to_string().cyan());

    if !excludes.is_empty() {
        let mut selection = wizard.selection().cloned().unwrap_or_default();
        if let Some(tree) = wizard.tree() {
            exclude_sections(tree, &mut selection, &excludes)?;
        }
        wizard.set_selection(selection).map_err(|e| e.to_string())?;
    }

    if use_tui {
        let edited = match (wizard.tree(), wizard.selection()) {
            (Some(tree), Some(selection)) => docmind_tui::run_selector(tree, selection.clone())
                .map_err(|e| format!("Page picker failed: {}", e))?,
            _ => None,
        };
        match edited {
            Some(selection) => {
                wizard.set_selection(selection).map_err(|e| e.to_string())?;
            }
            None => {
                println!("{} Import cancelled", "✗".red().bold());
                return Ok(());
            }
        }
    }

    if let (Some(tree), Some(selection)) = (wizard.tree(), wizard.selection()) {
        println!();
        print!("{}", render_tree(tree, selection, show_pages));
        println!();
        println!("{} {}", "→".blue(), selection_summary(tree, selection));
    }

    if !assume_yes && !use_tui {
        let count = wizard.selection().map(Selection::len).unwrap_or(0);
        if !confirm(&format!("Import {} pages? [Y/n]:", count), true)? {
            println!("{} Import cancelled", "✗".red().bold());
            return Ok(());
        }
    }

    loop {
        let count = wizard.selection().map(Selection::len).unwrap_or(0);
        let progress = spinner(format!("Importing {} pages", count))?;
        let submitted = wizard.submit().await;
        progress.finish_and_clear();

        match submitted {
            Ok(imported) => {
                println!(
                    "{} Imported {} pages into your knowledge base",
                    "✓".green().bold(),
                    imported.to_string().cyan()
                );
                break;
            }
            Err(e @ WizardError::SubmitNetworkError(_)) => {
                eprintln!("{} {}", "✗".red().bold(), e);
                let can_retry = !assume_yes && io::stdin().is_terminal();
                if !can_retry || !confirm("Retry the import? [Y/n]:", true)? {
                    return Err("Import did not complete".to_string());
                }
            }
            Err(e) => return Err(e.to_string()),
        }
    }

    if imported_rx.try_recv().is_ok() {
        refresh_documents(&refresh_client).await;
    }
    Ok(())
}

async fn refresh_documents(client: &ApiClient) {
    match client.list_documents().await {
        Ok(documents) => println!(
            "{} Knowledge base now holds {} documents",
            "ℹ".blue(),
            documents.len().to_string().cyan()
        ),
        Err(e) => debug!("Could not refresh document list: {}", e),
    }
}

pub async fn handle_documents_list(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let kind = args
        .get_one::<String>("type")
        .map(|t| parse_document_kind(t.as_str()))
        .transpose()?;
    let client = build_client(config)?;
    let documents = filter_documents(client.list_documents().await.map_err(|e| e.to_string())?, kind);

    if documents.is_empty() {
        println!("No documents yet. Add some with `docmind upload` or `docmind crawl`.");
        return Ok(());
    }

    for doc in &documents {
        let tag = match doc.kind {
            DocumentKind::File => "file".cyan(),
            DocumentKind::Url => " url".green(),
            DocumentKind::Other => doc.kind.as_str().dimmed(),
        };
        println!("  {} {}", tag, doc.source.bright_white());
    }
    println!();
    println!("{} document(s)", documents.len());
    Ok(())
}

pub async fn handle_documents_delete(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let source = args
        .get_one::<String>("SOURCE")
        .ok_or_else(|| "SOURCE is required".to_string())?;
    let client = build_client(config)?;
    let documents = client.list_documents().await.map_err(|e| e.to_string())?;
    let document =
        find_document(&documents, source).ok_or_else(|| format!("No document named '{}'", source))?;

    client
        .delete_document(document.delete_key())
        .await
        .map_err(|e| e.to_string())?;
    println!("{} Deleted {}", "✓".green().bold(), document.source.bright_white());
    Ok(())
}

pub async fn handle_upload(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let path = args
        .get_one::<PathBuf>("FILE")
        .ok_or_else(|| "FILE is required".to_string())?;
    check_upload_path(path)?;
    let client = build_client(config)?;

    let progress = spinner(format!("Uploading {}", path.display()))?;
    let uploaded = client.upload_document(path).await;
    progress.finish_and_clear();
    let response = uploaded.map_err(|e| e.to_string())?;

    println!(
        "{} {} {} ({} chunks)",
        "✓".green().bold(),
        response.filename.bright_white(),
        response.status,
        response.chunks.to_string().cyan()
    );
    Ok(())
}

fn print_settings(settings: &WidgetSettings) {
    let text_color = match header_text_color(settings) {
        Ok(color) => color.to_hex(),
        Err(_) => "n/a".to_string(),
    };
    let or_none = |value: &str| {
        if value.trim().is_empty() {
            "(none)".dimmed().to_string()
        } else {
            value.to_string()
        }
    };

    println!("{:>16}  {}", "Bot name".blue(), settings.bot_name.bright_white());
    println!(
        "{:>16}  {} (text {})",
        "Colour".blue(),
        settings.widget_color.bright_white(),
        text_color
    );
    println!("{:>16}  {}", "Logo".blue(), or_none(&settings.header_logo));
    println!("{:>16}  {}", "Greeting".blue(), or_none(&settings.initial_message));
    println!("{:>16}  {}", "Instructions".blue(), or_none(&settings.system_prompt));
    println!("{:>16}  {}", "Messages".blue(), settings.message_count);
}

pub async fn handle_widget_show(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let client = build_client(config)?;
    let settings = client.get_settings().await.map_err(|e| e.to_string())?;

    if args.get_flag("json") {
        let json = serde_json::to_string_pretty(&settings).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }

    print_divider();
    println!("{}", "  WIDGET".bright_white().bold());
    print_divider();
    print_settings(&settings);
    println!();

    let snippets = EmbedSnippets::new(&config.widget_host, client.user_id());
    println!("{} {}", "Embed page:".blue().bold(), snippets.embed_url().bright_white());
    println!();
    println!("{}", "Inline chat (iframe):".blue().bold());
    println!("{}", snippets.iframe());
    println!();
    println!("{}", "Floating chat bubble:".blue().bold());
    println!("{}", snippets.bubble());
    println!();
    println!("{}", "Script with config:".blue().bold());
    println!("{}", snippets.script());
    Ok(())
}

pub async fn handle_widget_set(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let update = settings_update_from_args(args);
    if update.is_empty() {
        return Err("Nothing to change. Pass at least one of --name, --color, --logo, --greeting, --prompt".to_string());
    }
    update.validate().map_err(|e| e.to_string())?;

    let client = build_client(config)?;
    let mut settings = client.get_settings().await.map_err(|e| e.to_string())?;
    update.apply_to(&mut settings).map_err(|e| e.to_string())?;
    let saved = client
        .update_settings(&settings)
        .await
        .map_err(|e| e.to_string())?;

    println!("{} Widget settings saved", "✓".green().bold());
    print_settings(&saved);
    Ok(())
}

pub async fn handle_chat(config: &Config, args: &ArgMatches, quiet: bool) -> Result<(), String> {
    let question = args
        .get_one::<String>("QUESTION")
        .ok_or_else(|| "QUESTION is required".to_string())?;
    let session = args
        .get_one::<String>("session")
        .cloned()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let client = build_client(config)?;
    let response = client
        .chat(question, Some(&session))
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", response.answer);
    if !quiet {
        println!();
        println!("{} {}", "session:".dimmed(), session.dimmed());
    }
    Ok(())
}

pub async fn handle_team_list(config: &Config) -> Result<(), String> {
    let client = build_client(config)?;
    let members = client.list_team_members().await.map_err(|e| e.to_string())?;

    if members.is_empty() {
        println!("No team members yet. Invite someone with `docmind team invite <EMAIL>`.");
        return Ok(());
    }

    for member in &members {
        let role = if member.role.is_empty() { "member" } else { member.role.as_str() };
        println!(
            "  {:>6}  {}  {}",
            member.id.to_string().dimmed(),
            member.email.bright_white(),
            role.blue()
        );
    }
    println!();
    println!("{} member(s)", members.len());
    Ok(())
}

pub async fn handle_team_invite(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let email = args
        .get_one::<String>("EMAIL")
        .ok_or_else(|| "EMAIL is required".to_string())?;
    let email = check_invite_email(email)?;
    let client = build_client(config)?;

    client.invite_team_member(&email).await.map_err(|e| {
        format!("Could not invite {}: {}. They might already be invited.", email, e.detail())
    })?;
    println!("{} Invited {}", "✓".green().bold(), email.bright_white());
    Ok(())
}

pub async fn handle_team_remove(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let key = args
        .get_one::<String>("MEMBER")
        .ok_or_else(|| "MEMBER is required".to_string())?;
    let client = build_client(config)?;
    let members = client.list_team_members().await.map_err(|e| e.to_string())?;
    let member = find_member(&members, key).ok_or_else(|| format!("No team member matches '{}'", key))?;

    if !args.get_flag("yes") && !confirm(&format!("Remove {} from the team? [y/N]:", member.email), false)? {
        println!("{} Nothing removed", "✗".red().bold());
        return Ok(());
    }

    client
        .remove_team_member(&member.id.to_string())
        .await
        .map_err(|e| e.to_string())?;
    println!("{} Removed {}", "✓".green().bold(), member.email.bright_white());
    Ok(())
}

pub async fn handle_logs(config: &Config, args: &ArgMatches) -> Result<(), String> {
    let client = build_client(config)?;
    let logs = limit_logs(
        client.chat_logs().await.map_err(|e| e.to_string())?,
        args.get_one::<usize>("limit").copied(),
    );

    if logs.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }

    for entry in &logs {
        let speaker = if entry.is_user() {
            "User".cyan().bold()
        } else {
            "Assistant".magenta().bold()
        };
        println!("{} {}", speaker, entry.created_at.as_deref().unwrap_or("").dimmed());
        for line in entry.content.lines() {
            println!("  │ {}", line);
        }
        println!();
    }
    Ok(())
}
