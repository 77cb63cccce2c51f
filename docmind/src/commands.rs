use clap::{arg, command};
use docmind_core::config::DEFAULT_CONFIG_DIR;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("docmind")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("docmind")
        .about("Build a chatbot knowledge base from your documents and websites")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Show debug logging").required(false))
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Config file to use (default: ~/.config/docmind/config.toml)"),
        )
        .arg(
            arg!(--"api" <URL>)
                .required(false)
                .global(true)
                .help("Backend base URL, overrides the config file")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(--"user" <USER_ID>)
                .required(false)
                .global(true)
                .help("Account id sent with every request, overrides the config file"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes a DocMind config file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the config in")
                        .default_value(DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing config without asking")
                        .required(false),
                ),
        )
        .subcommand(command!("status").about("Checks that the backend is reachable"))
        .subcommand(
            command!("crawl")
                .about(
                    "Scan a website, choose which pages to keep and import them into the \
                knowledge base.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Website to scan, e.g. example.com or https://example.com/docs"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Give up on the scan after this many seconds (default: from config, 180)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    arg!(-x --"exclude" <SECTION>)
                        .required(false)
                        .action(clap::ArgAction::Append)
                        .help("Leave a section out of the import, e.g. /blog. May be repeated."),
                )
                .arg(
                    arg!(-y --"yes")
                        .required(false)
                        .help("Import without asking for confirmation")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-tui")
                        .required(false)
                        .help("Print the page tree instead of opening the interactive picker")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"show-pages")
                        .required(false)
                        .help("List individual pages in the printed tree")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("documents")
                .about("Manage the documents in your knowledge base")
                .subcommand_required(true)
                .subcommand(
                    command!("list").about("List imported files and pages").arg(
                        arg!(-t --"type" <TYPE>)
                            .required(false)
                            .help("Only show one kind of document")
                            .value_parser(["file", "url"]),
                    ),
                )
                .subcommand(
                    command!("delete").about("Remove a document from the knowledge base").arg(
                        arg!(<SOURCE>)
                            .required(true)
                            .help("File name or URL as shown by `documents list`"),
                    ),
                ),
        )
        .subcommand(
            command!("upload").about("Upload a PDF, text or markdown file").arg(
                arg!(<FILE>)
                    .required(true)
                    .help("Path of the file to upload")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            ),
        )
        .subcommand(
            command!("widget")
                .about("Customize and embed the chat widget")
                .subcommand_required(true)
                .subcommand(
                    command!("show")
                        .about("Show widget settings and embed code")
                        .arg(
                            arg!(--"json")
                                .required(false)
                                .help("Print the settings as JSON")
                                .action(clap::ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    command!("set")
                        .about("Change widget settings")
                        .arg(arg!(--"name" <NAME>).required(false).help("Bot name shown in the header"))
                        .arg(
                            arg!(--"color" <HEX>)
                                .required(false)
                                .help("Brand colour, e.g. #4F46E5"),
                        )
                        .arg(
                            arg!(--"logo" <URL>)
                                .required(false)
                                .help("Header logo URL, or an empty string to remove it"),
                        )
                        .arg(
                            arg!(--"greeting" <TEXT>)
                                .required(false)
                                .help("First message the bot sends"),
                        )
                        .arg(
                            arg!(--"prompt" <TEXT>)
                                .required(false)
                                .help("Extra instructions for the bot"),
                        ),
                ),
        )
        .subcommand(
            command!("chat")
                .about("Ask your knowledge base a question")
                .arg(arg!(<QUESTION>).required(true).help("The question to ask"))
                .arg(
                    arg!(-s --"session" <ID>)
                        .required(false)
                        .help("Continue an earlier conversation"),
                ),
        )
        .subcommand(
            command!("team")
                .about("Manage who can work on this knowledge base")
                .subcommand_required(true)
                .subcommand(command!("list").about("List team members"))
                .subcommand(
                    command!("invite")
                        .about("Invite someone by email")
                        .arg(arg!(<EMAIL>).required(true).help("Email address to invite")),
                )
                .subcommand(
                    command!("remove")
                        .about("Remove a team member")
                        .arg(
                            arg!(<MEMBER>)
                                .required(true)
                                .help("Member id or email as shown by `team list`"),
                        )
                        .arg(
                            arg!(-y --"yes")
                                .required(false)
                                .help("Remove without asking for confirmation")
                                .action(clap::ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            command!("logs").about("Show recent conversations with your bot").arg(
                arg!(-n --"limit" <COUNT>)
                    .required(false)
                    .help("Show at most this many messages")
                    .value_parser(clap::value_parser!(usize)),
            ),
        )
}
