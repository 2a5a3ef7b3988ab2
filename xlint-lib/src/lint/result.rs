//! Status taxonomy and per-certificate result sets.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Verdict severity, totally ordered: `Pass < Info < Warn < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Pass,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Pass => "pass",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

/// Final status of one lint for one certificate.
///
/// Only `Checked` carries a severity; the other variants are assigned by
/// the engine and sit outside the severity ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LintStatus {
    /// Placeholder; never present in a finished result set.
    Reserved,
    /// `check_applies` returned false.
    NotApplicable,
    /// The certificate predates the lint's effective date.
    NotEffective,
    /// The lint's one-time initialization failed.
    InitializationFailed,
    Checked(Severity),
}

impl LintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintStatus::Reserved => "reserved",
            LintStatus::NotApplicable => "NA",
            LintStatus::NotEffective => "NE",
            LintStatus::InitializationFailed => "init_failed",
            LintStatus::Checked(severity) => severity.as_str(),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            LintStatus::Checked(severity) => Some(*severity),
            _ => None,
        }
    }
}

impl std::fmt::Display for LintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LintStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// One entry of a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOutcome {
    pub status: LintStatus,
    pub details: Option<String>,
    /// Set when the status stems from a fault inside the lint rather than a
    /// normative verdict.
    pub internal_error: Option<String>,
}

impl LintOutcome {
    pub fn new(status: LintStatus) -> Self {
        LintOutcome {
            status,
            details: None,
            internal_error: None,
        }
    }

    pub fn is_internal_error(&self) -> bool {
        self.internal_error.is_some()
    }
}

impl Serialize for LintOutcome {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.details.is_some()) + usize::from(self.internal_error.is_some());
        let mut st = s.serialize_struct("LintOutcome", len)?;
        st.serialize_field("result", &self.status)?;
        if let Some(details) = &self.details {
            st.serialize_field("details", details)?;
        }
        if let Some(err) = &self.internal_error {
            st.serialize_field("internal_error", err)?;
        }
        st.end()
    }
}

/// Per-certificate mapping from lint name to outcome.
///
/// Entries and the derived name lists are kept in ascending name order, so
/// two evaluations of the same inputs compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    results: BTreeMap<String, LintOutcome>,
    warnings: Vec<String>,
    errors: Vec<String>,
    fatals: Vec<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. The engine inserts in ascending name order, which
    /// keeps the derived lists sorted without re-sorting.
    pub(crate) fn insert(&mut self, name: &str, outcome: LintOutcome) {
        match outcome.status {
            LintStatus::Checked(Severity::Warn) => self.warnings.push(name.to_string()),
            LintStatus::Checked(Severity::Error) => self.errors.push(name.to_string()),
            LintStatus::Checked(Severity::Fatal) => self.fatals.push(name.to_string()),
            _ => {}
        }
        self.results.insert(name.to_string(), outcome);
    }

    pub fn get(&self, name: &str) -> Option<&LintOutcome> {
        self.results.get(name)
    }

    pub fn status(&self, name: &str) -> Option<LintStatus> {
        self.results.get(name).map(|o| o.status)
    }

    /// Iterate outcomes in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LintOutcome)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn fatals(&self) -> &[String] {
        &self.fatals
    }

    /// Whether any lint reported Error or Fatal.
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty() || !self.fatals.is_empty()
    }

    /// Names of lints whose outcome is an internal fault.
    pub fn internal_errors(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, o)| o.is_internal_error())
            .map(|(k, _)| k.as_str())
    }

    /// Counts per status plus the ordered non-pass name lists.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for (name, outcome) in &self.results {
            match outcome.status {
                LintStatus::Checked(Severity::Pass) => summary.pass += 1,
                LintStatus::Checked(Severity::Info) => {
                    summary.info += 1;
                    summary.infos.push(name.clone());
                }
                LintStatus::Checked(Severity::Warn) => summary.warn += 1,
                LintStatus::Checked(Severity::Error) => summary.error += 1,
                LintStatus::Checked(Severity::Fatal) => summary.fatal += 1,
                LintStatus::NotApplicable => summary.not_applicable += 1,
                LintStatus::NotEffective => summary.not_effective += 1,
                LintStatus::InitializationFailed => summary.init_failed += 1,
                LintStatus::Reserved => {}
            }
        }
        summary.warnings = self.warnings.clone();
        summary.errors = self.errors.clone();
        summary.fatals = self.fatals.clone();
        summary
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.results.len()))?;
        for (name, outcome) in &self.results {
            map.serialize_entry(name, outcome)?;
        }
        map.end()
    }
}

/// Aggregate view of a [`ResultSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub pass: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub fatal: usize,
    pub not_applicable: usize,
    pub not_effective: usize,
    pub init_failed: usize,
    pub infos: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub fatals: Vec<String>,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pass, {} info, {} warn, {} error, {} fatal ({} NA, {} NE, {} init failed)",
            self.pass,
            self.info,
            self.warn,
            self.error,
            self.fatal,
            self.not_applicable,
            self.not_effective,
            self.init_failed
        )
    }
}
