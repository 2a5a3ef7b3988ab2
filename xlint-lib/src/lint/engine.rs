//! Lint execution.
//!
//! For each certificate the engine walks the registry in name order and, per
//! entry: applies the selection filter, gates on the effective date, runs the
//! lint's one-time initialization, checks applicability and finally executes
//! it. Panics raised by a lint are contained to that lint and certificate.

use super::config::LintConfig;
use super::registry::{self, Registry};
use super::result::{LintOutcome, LintStatus, ResultSet, Severity};
use super::{panic_message, LintEntry};
use crate::fields::CertificateInfo;
use crate::XlintError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs registry lints against certificates.
///
/// Holds only a shared reference to a frozen [`Registry`], so one engine can
/// be used from any number of threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'r> {
    registry: &'r Registry,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Engine { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Evaluate every selected lint against `cert`.
    ///
    /// The result contains exactly one entry per selected lint; excluded
    /// lints are absent.
    pub fn run(&self, cert: &CertificateInfo, config: &LintConfig) -> ResultSet {
        let reference = config.reference_time.resolve(cert);
        let mut results = ResultSet::new();
        for entry in self.registry.filter(|meta| config.selects(meta)) {
            let outcome = evaluate(entry, cert, reference);
            results.insert(entry.name(), outcome);
        }
        results
    }
}

fn evaluate(entry: &LintEntry, cert: &CertificateInfo, reference: i64) -> LintOutcome {
    if !entry.metadata().is_effective_at(reference) {
        return LintOutcome::new(LintStatus::NotEffective);
    }

    if let Err(msg) = entry.ensure_initialized() {
        return LintOutcome {
            status: LintStatus::InitializationFailed,
            details: Some(msg.to_string()),
            internal_error: None,
        };
    }

    let lint = entry.lint();
    match catch_unwind(AssertUnwindSafe(|| lint.check_applies(cert))) {
        Ok(true) => {}
        Ok(false) => return LintOutcome::new(LintStatus::NotApplicable),
        Err(payload) => return internal_fault(entry, "check_applies", payload.as_ref()),
    }

    match catch_unwind(AssertUnwindSafe(|| lint.execute(cert))) {
        Ok(result) => LintOutcome {
            status: LintStatus::Checked(result.severity),
            details: result.details,
            internal_error: None,
        },
        Err(payload) => internal_fault(entry, "execute", payload.as_ref()),
    }
}

fn internal_fault(
    entry: &LintEntry,
    stage: &str,
    payload: &(dyn std::any::Any + Send),
) -> LintOutcome {
    let msg = format!("{} panicked: {}", stage, panic_message(payload));
    tracing::warn!(lint = entry.name(), error = %msg, "lint fault contained");
    LintOutcome {
        status: LintStatus::Checked(Severity::Fatal),
        details: None,
        internal_error: Some(msg),
    }
}

/// Lint `cert` with every lint in the process-wide registry.
pub fn lint_certificate(cert: &CertificateInfo) -> Result<ResultSet, XlintError> {
    let registry = registry::global()?;
    Ok(Engine::new(registry).run(cert, &LintConfig::default()))
}
