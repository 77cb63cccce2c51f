pub mod color;
pub mod config;
pub mod embed;
pub mod report;
pub mod selection;
pub mod settings;
pub mod tree;
pub mod wizard;

pub use selection::{CheckState, Selection};
pub use tree::{CrawlNode, CrawlTree, PageEntry, TreeError, build_tree};
pub use wizard::{CrawlBackend, CrawlWizard, WizardError, WizardState};

const BANNER: &str = r#"
    ____             __  ____           __
   / __ \____  _____/  |/  (_)___  ____/ /
  / / / / __ \/ ___/ /|_/ / / __ \/ __  /
 / /_/ / /_/ / /__/ /  / / / / / / /_/ /
/_____/\____/\___/_/  /_/_/_/ /_/\__,_/
"#;

pub fn print_banner() {
    println!("{}", BANNER);
    println!("  your docs, your bot  v{}\n", env!("CARGO_PKG_VERSION"));
}
