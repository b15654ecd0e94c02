//! Plain-text rendering for non-JSON command output.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write;

use cvalign::nav::shell::{NavEntry, NavShell, SIGN_OUT_LABEL};
use cvalign::routes::guard::Decision;
use cvalign::routes::table;
use cvalign::views::cv_filters::{CvRow, score_band};
use cvalign::views::forms::FieldErrors;

fn marker(active: bool) -> char {
    if active { '*' } else { ' ' }
}

/// Navigation bar as an indented list; the active entry is starred.
pub fn nav(shell: &NavShell, current_path: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {:<16}{}", "CV", shell.logo_path());
    for entry in shell.entries {
        match entry {
            NavEntry::Link(link) => {
                let _ = writeln!(out, "{} {:<16}{}", marker(entry.is_active(current_path)), link.label, link.path);
            }
            NavEntry::Menu { label, children } => {
                let _ = writeln!(out, "{} {label}", marker(entry.is_active(current_path)));
                for child in *children {
                    let _ = writeln!(
                        out,
                        "    {} {:<12}{}",
                        marker(child.path == current_path),
                        child.label,
                        child.path
                    );
                }
            }
        }
    }
    let _ = writeln!(out, "  {SIGN_OUT_LABEL}");
    out
}

/// One line describing the guard outcome for `path`.
pub fn decision(path: &str, decision: Decision) -> String {
    let title = table::resolve(path).map_or("unknown page", |route| route.title);
    match decision {
        Decision::Pending => format!("pending  {path} ({title})"),
        Decision::Allow => format!("allow    {path} ({title})"),
        Decision::RedirectTo(target) => format!("redirect {path} ({title}) -> {target}"),
    }
}

/// Fixed-width CV table.
pub fn cv_table(rows: &[&CvRow]) -> String {
    let mut out = format!("{:>5}  {:<14}{:<10}{:<28}{}\n", "SCORE", "BAND", "STATUS", "FILE", "UPLOADED BY");
    for row in rows {
        let _ = writeln!(
            out,
            "{:>5}  {:<14}{:<10}{:<28}{}",
            row.score,
            score_band(row.score).label(),
            row.status.as_str(),
            row.file_name,
            row.uploaded_by
        );
    }
    out
}

/// `field: message` pairs joined for a single error line.
pub fn field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
