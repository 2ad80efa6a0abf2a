//! Status lines for the CLI. Notices and errors go to stderr so that
//! stdout stays clean for `--json` output.

use crate::ui::Icons;
use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static PALETTE: OnceLock<Palette> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Palette {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
}

impl Palette {
    /// Colored on a terminal, plain when piped
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() {
            Self {
                header: Style::new().cyan().bold(),
                success: Style::new().green().bold(),
                error: Style::new().red().bold(),
                warn: Style::new().yellow().bold(),
                info: Style::new().magenta(),
                dim: Style::new().white().dimmed(),
            }
        } else {
            let plain = Style::new();
            Self {
                header: plain.clone(),
                success: plain.clone(),
                error: plain.clone(),
                warn: plain.clone(),
                info: plain.clone(),
                dim: plain,
            }
        }
    }
}

pub fn palette() -> &'static Palette {
    PALETTE.get_or_init(Palette::detect)
}

pub fn header(text: &str) {
    println!("{} {}", Icons::BUILDING, text.style(palette().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(palette().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(palette().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(palette().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(palette().info.clone()),
        label.style(palette().dim.clone()),
        value
    );
}

/// Like `info`, on stderr
pub fn note(label: &str, value: &str) {
    eprintln!(
        "{} {}: {}",
        Icons::INFO.style(palette().info.clone()),
        label.style(palette().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(palette().header.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(palette().dim.clone()), value);
}
