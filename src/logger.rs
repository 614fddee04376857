use colored::*;

/// Logging collaborator passed by reference into each component.
///
/// Verbosity is decided once at startup from the --debug flag and is
/// read-only afterwards. All output goes to stderr so the document and
/// the formatted answer stay clean on stdout.
pub struct Logger {
    debug_enabled: bool,
}

impl Logger {
    pub fn new(debug: bool) -> Self {
        Logger {
            debug_enabled: debug,
        }
    }

    pub fn info(&self, msg: &str) {
        eprintln!("{}", msg);
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), msg);
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", "error:".red().bold(), msg);
    }

    pub fn debug(&self, msg: &str) {
        if self.debug_enabled {
            eprintln!("{} {}", "debug:".dimmed(), msg);
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }
}
