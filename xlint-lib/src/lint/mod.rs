//! The lint capability contract and catalog entries.
//!
//! A lint is a small, independent check. It implements [`Lint`] and is bound
//! to immutable [`LintMetadata`] in a [`LintEntry`]; entries are collected in
//! a [`registry::Registry`] and driven by the [`engine::Engine`]. Adding a new
//! check never requires touching the engine.

pub mod config;
pub mod engine;
pub mod registry;
pub mod result;

use crate::fields::{CertificateInfo, DateTime};
use crate::XlintError;
use result::Severity;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

/// Effective date meaning "always in force".
pub const ZERO_DATE: i64 = 0;

/// One normative check.
///
/// Implementations must be stateless apart from whatever `initialize`
/// installs; `check_applies` and `execute` take `&self` and are called
/// concurrently from many threads.
pub trait Lint: Send + Sync {
    /// One-time setup, run lazily before the first evaluation of this lint.
    /// A failure disables the lint for the life of the process.
    fn initialize(&self) -> Result<(), XlintError> {
        Ok(())
    }

    /// Whether this lint is meaningful for the certificate's shape.
    fn check_applies(&self, cert: &CertificateInfo) -> bool;

    /// Evaluate the requirement. Only called when `check_applies` is true.
    fn execute(&self, cert: &CertificateInfo) -> LintResult;
}

/// Verdict returned by [`Lint::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintResult {
    pub severity: Severity,
    pub details: Option<String>,
}

impl LintResult {
    pub fn new(severity: Severity) -> Self {
        LintResult {
            severity,
            details: None,
        }
    }

    pub fn pass() -> Self {
        Self::new(Severity::Pass)
    }

    pub fn with_details(severity: Severity, details: impl Into<String>) -> Self {
        LintResult {
            severity,
            details: Some(details.into()),
        }
    }
}

impl From<Severity> for LintResult {
    fn from(severity: Severity) -> Self {
        LintResult::new(severity)
    }
}

/// The normative document family a lint enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "CABF_BR")]
    CabfBaselineRequirements,
    #[serde(rename = "CABF_EV")]
    CabfEvGuidelines,
    #[serde(rename = "RFC5280")]
    Rfc5280,
    #[serde(rename = "RFC5891")]
    Rfc5891,
    #[serde(rename = "AWSLabs")]
    AwsLabs,
    #[serde(rename = "Community")]
    Community,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::CabfBaselineRequirements,
        Source::CabfEvGuidelines,
        Source::Rfc5280,
        Source::Rfc5891,
        Source::AwsLabs,
        Source::Community,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::CabfBaselineRequirements => "CABF_BR",
            Source::CabfEvGuidelines => "CABF_EV",
            Source::Rfc5280 => "RFC5280",
            Source::Rfc5891 => "RFC5891",
            Source::AwsLabs => "AWSLabs",
            Source::Community => "Community",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = XlintError;

    /// Case-insensitive match on the string form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|src| src.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| XlintError::UnknownSource(s.to_string()))
    }
}

/// Descriptive metadata of a lint, as shown in rule listings.
#[derive(Debug, Clone, Serialize)]
pub struct LintMetadata {
    /// Unique name. The prefix (`e_`, `w_`, ...) is a convention only.
    pub name: String,
    pub description: String,
    /// Pointer into the source document, e.g. "BRs: 7.1.6.1".
    pub citation: String,
    pub source: Source,
    /// Unix timestamp from which the requirement applies; [`ZERO_DATE`] for always.
    #[serde(serialize_with = "serialize_effective_date")]
    pub effective_date: i64,
}

fn serialize_effective_date<S: serde::Serializer>(ts: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&DateTime::from_timestamp(*ts).iso8601)
}

impl LintMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        citation: impl Into<String>,
        source: Source,
        effective_date: i64,
    ) -> Self {
        LintMetadata {
            name: name.into(),
            description: description.into(),
            citation: citation.into(),
            source,
            effective_date,
        }
    }

    /// Whether a certificate dated `reference` falls under this requirement.
    pub fn is_effective_at(&self, reference: i64) -> bool {
        self.effective_date == ZERO_DATE || reference >= self.effective_date
    }
}

/// A catalog entry: metadata, the bound capability, and its init guard.
pub struct LintEntry {
    metadata: LintMetadata,
    lint: Box<dyn Lint>,
    init: OnceLock<Result<(), String>>,
}

impl LintEntry {
    pub fn new(metadata: LintMetadata, lint: impl Lint + 'static) -> Self {
        LintEntry {
            metadata,
            lint: Box::new(lint),
            init: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &LintMetadata {
        &self.metadata
    }

    pub fn lint(&self) -> &dyn Lint {
        self.lint.as_ref()
    }

    /// Run `initialize` exactly once for the life of this entry.
    ///
    /// Concurrent first callers block until the single initializer finishes
    /// and then all observe the same outcome.
    pub(crate) fn ensure_initialized(&self) -> Result<(), &str> {
        let outcome = self.init.get_or_init(|| {
            let name = self.name();
            match catch_unwind(AssertUnwindSafe(|| self.lint.initialize())) {
                Ok(Ok(())) => {
                    tracing::debug!(lint = name, "lint initialized");
                    Ok(())
                }
                Ok(Err(e)) => {
                    tracing::warn!(lint = name, error = %e, "lint initialization failed");
                    Err(e.to_string())
                }
                Err(payload) => {
                    let msg = format!("initialize panicked: {}", panic_message(payload.as_ref()));
                    tracing::warn!(lint = name, error = %msg, "lint initialization failed");
                    Err(msg)
                }
            }
        });
        match outcome {
            Ok(()) => Ok(()),
            Err(msg) => Err(msg.as_str()),
        }
    }
}

impl std::fmt::Debug for LintEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LintEntry")
            .field("metadata", &self.metadata)
            .field("initialized", &self.init.get().map(|r| r.is_ok()))
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
