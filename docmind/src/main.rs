use clap::ArgMatches;
use colored::Colorize;
use docmind::commands::command_argument_builder;
use docmind::handlers::*;
use docmind_core::config::Config;
use docmind_core::print_banner;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        None => Ok(()),
        Some(("init", primary_command)) => handle_init(primary_command),
        Some((name, primary_command)) => match load_config(&chosen_command) {
            Ok(config) => dispatch(name, primary_command, &config, quiet).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn dispatch(name: &str, primary_command: &ArgMatches, config: &Config, quiet: bool) -> Result<(), String> {
    match name {
        "status" => handle_status(config).await,
        "crawl" => handle_crawl(config, primary_command).await,
        "documents" => match primary_command.subcommand() {
            Some(("list", secondary_command)) => handle_documents_list(config, secondary_command).await,
            Some(("delete", secondary_command)) => handle_documents_delete(config, secondary_command).await,
            _ => unreachable!("clap should ensure we don't get here"),
        },
        "upload" => handle_upload(config, primary_command).await,
        "widget" => match primary_command.subcommand() {
            Some(("show", secondary_command)) => handle_widget_show(config, secondary_command).await,
            Some(("set", secondary_command)) => handle_widget_set(config, secondary_command).await,
            _ => unreachable!("clap should ensure we don't get here"),
        },
        "chat" => handle_chat(config, primary_command, quiet).await,
        "team" => match primary_command.subcommand() {
            Some(("list", _)) => handle_team_list(config).await,
            Some(("invite", secondary_command)) => handle_team_invite(config, secondary_command).await,
            Some(("remove", secondary_command)) => handle_team_remove(config, secondary_command).await,
            _ => unreachable!("clap should ensure we don't get here"),
        },
        "logs" => handle_logs(config, primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

/// `RUST_LOG` wins unless `--verbose` asks for debug output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("docmind=debug,docmind_core=debug,docmind_client=debug,docmind_tui=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
