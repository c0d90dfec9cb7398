//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the CORAL CLI.

use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the CORAL banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                r#"
   {}
   {}
   {}
   {}
"#,
                "  ____ ___  ____      _    _     ".bright_cyan().bold(),
                " / ___/ _ \\|  _ \\    / \\  | |    ".bright_cyan().bold(),
                "| |__| |_| |  _ <   / ___ \\| |___ ".cyan().bold(),
                " \\____\\___/|_| \\_\\ /_/   \\_\\_____|".blue().bold(),
            );
            println!(
                "   {} {}\n",
                "Concurrent Orchestrated Research Agent Library"
                    .bright_white()
                    .bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!(
                r#"
  ____ ___  ____      _    _
 / ___/ _ \|  _ \    / \  | |
| |__| |_| |  _ <   / ___ \| |___
 \____\___/|_| \_\ /_/   \_\_____|

   Concurrent Orchestrated Research Agent Library v{}
"#,
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("[ok] {}", message);
        }
    }

    /// Print an informational message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("{} {}", "•".cyan(), message);
        } else {
            println!("[..] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            eprintln!("{} {}", "!".yellow().bold(), message);
        } else {
            eprintln!("[warn] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("{} {}", "✗".red().bold(), message);
        } else {
            eprintln!("[err] {}", message);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.colored {
            println!("\n{}", title.bright_white().bold());
        } else {
            println!("\n== {} ==", title);
        }
    }
}
