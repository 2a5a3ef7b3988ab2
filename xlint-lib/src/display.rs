//! Human-readable and JSON formatting of lint results and listings.

use crate::lint::result::{LintStatus, ResultSet, Severity};
use crate::lint::LintMetadata;
use crate::XlintError;
use serde::Serialize;

/// Format a result set as human-readable text, one lint per line, followed
/// by a summary line.
///
/// With `failures_only`, Pass/NA/NE entries are omitted.
pub fn display_results(results: &ResultSet, failures_only: bool) -> String {
    let mut out = String::new();
    for (name, outcome) in results.iter() {
        let notable = match outcome.status {
            LintStatus::Checked(severity) => severity > Severity::Pass,
            LintStatus::InitializationFailed => true,
            _ => false,
        };
        if failures_only && !notable {
            continue;
        }
        out.push_str(&format!("  {:<8} {}", outcome.status.as_str(), name));
        if let Some(err) = &outcome.internal_error {
            out.push_str(&format!(" [internal error: {}]", err));
        } else if let Some(details) = &outcome.details {
            out.push_str(&format!(" ({})", details));
        }
        out.push('\n');
    }
    out.push_str(&format!("Summary: {}\n", results.summary()));
    out
}

/// Format lint metadata as a name/source/citation table.
pub fn display_listing<'a>(lints: impl IntoIterator<Item = &'a LintMetadata>) -> String {
    let lints: Vec<_> = lints.into_iter().collect();
    let width = lints.iter().map(|m| m.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for meta in lints {
        out.push_str(&format!(
            "{:<width$}  {:<9}  {}\n",
            meta.name,
            meta.source.as_str(),
            meta.citation,
            width = width
        ));
    }
    out
}

/// Serialize any result value as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, XlintError> {
    Ok(serde_json::to_string_pretty(value)?)
}
