use std::env;

use atty::Stream;
use color_eyre::owo_colors::{OwoColorize, Style as Paint};
use storefront_core::CommandStatus;

use crate::output::OutputOptions;

/// Terminal colouring; a no-op unless stdout is a terminal and colour has not
/// been turned off.
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn from_options(opts: &OutputOptions) -> Self {
        Self::new(opts.no_color, atty::is(Stream::Stdout))
    }

    pub fn status(&self, status: &CommandStatus, text: &str) -> String {
        let (symbol, paint) = match status {
            CommandStatus::Ok => ("✔", Paint::new().green().bold()),
            CommandStatus::UserError => ("✗", Paint::new().yellow().bold()),
            CommandStatus::Failure => ("✖", Paint::new().red().bold()),
        };
        self.apply(&format!("{symbol} {text}"), paint)
    }

    pub fn info(&self, text: &str) -> String {
        self.apply(text, Paint::new().cyan())
    }

    pub fn warning(&self, text: &str) -> String {
        self.apply(text, Paint::new().yellow())
    }

    pub fn table_header(&self, text: &str) -> String {
        self.apply(text, Paint::new().bold())
    }

    pub fn muted(&self, text: &str) -> String {
        self.apply(text, Paint::new().dimmed())
    }

    fn apply(&self, text: &str, paint: Paint) -> String {
        if self.enabled {
            text.style(paint).to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_when_not_a_terminal() {
        let style = Style::new(false, false);
        assert_eq!(
            style.status(&CommandStatus::UserError, "cart is empty"),
            "✗ cart is empty"
        );
        assert_eq!(style.table_header("Name"), "Name");
    }

    #[test]
    fn no_color_flag_wins_over_a_terminal() {
        let style = Style::new(true, true);
        assert_eq!(style.status(&CommandStatus::Ok, "done"), "✔ done");
        assert_eq!(style.muted("Rp 0"), "Rp 0");
    }

    #[test]
    fn colour_wraps_text_in_escape_codes() {
        let style = Style { enabled: true };
        let line = style.status(&CommandStatus::Failure, "boom");
        assert!(line.starts_with('\u{1b}'), "{line:?}");
        assert!(line.contains("✖ boom"), "{line:?}");
    }
}
