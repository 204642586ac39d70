//! Status lines on stderr, right-aligned under a coloured label:
//!
//! ```text
//!    Resolving compile
//!     Resolved compile (3 modules, 4 files)
//!     Conflict org.b:b 1.0 -> 2.0 (highest version wins)
//! ```

use std::io::Write;

use console::Style;

const LABEL_WIDTH: usize = 12;

fn line(style: Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>LABEL_WIDTH$} {message}",
        style.apply_to(label),
    );
}

/// Progress of an action, bold green label.
pub fn status(label: &str, message: &str) {
    line(Style::new().green().bold(), label, message);
}

/// Bold yellow label.
pub fn status_warn(label: &str, message: &str) {
    line(Style::new().yellow().bold(), label, message);
}

/// `compile (3 modules, 1 file)`
pub fn resolved_summary(configuration: &str, modules: usize, files: usize) -> String {
    format!(
        "{configuration} ({}, {})",
        counted(modules, "module"),
        counted(files, "file")
    )
}

/// `org.b:b 1.0 -> 2.0 (forced)`
pub fn redirect_summary(module: &str, requested: &str, selected: &str, reason: &str) -> String {
    format!("{module} {requested} -> {selected} ({reason})")
}

fn counted(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
