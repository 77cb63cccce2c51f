//! Full-screen page picker shown between a website scan and the import.

pub mod selector;

pub use selector::{SelectorOutcome, TreeSelector, run_selector};
