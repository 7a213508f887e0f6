mod banner;
mod error;
mod progress;
mod tables;

use std::io::{self, IsTerminal};

pub use banner::{banner_for_help, print_banner};
pub use error::print_error;
pub use progress::Progress;
pub use tables::{print_inputs, print_rate_breakdown, print_top1_summary};

#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub interactive: bool,
}

impl Context {
    /// Interactive only when stderr is a terminal; stdout carries results.
    pub fn detect() -> Self {
        Self {
            interactive: io::stderr().is_terminal(),
        }
    }

    pub fn with_quiet(self, quiet: bool) -> Self {
        if quiet {
            Self { interactive: false }
        } else {
            self
        }
    }
}
