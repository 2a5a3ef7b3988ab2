//! Lint selection configuration.
//!
//! Plain data describing which lints run and which timestamp drives the
//! effective-date gate. Typically built from CLI flags, optionally starting
//! from a TOML file:
//!
//! ```toml
//! include = ["e_cert_policy_ov_requires_org"]
//! exclude = ["w_issuer_dn_leading_whitespace"]
//! sources = ["CABF_BR", "RFC5280"]
//! reference_time = { fixed = 1700000000 }
//! ```

use super::registry::Registry;
use super::{LintMetadata, Source};
use crate::fields::CertificateInfo;
use crate::XlintError;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Which lints to run for an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// If set, only these lints run.
    pub include: Option<BTreeSet<String>>,
    /// Lints that never run. Takes precedence over `include`.
    pub exclude: BTreeSet<String>,
    /// If set, only lints from these sources run.
    pub sources: Option<BTreeSet<Source>>,
    pub reference_time: ReferenceTime,
}

/// Timestamp compared against each lint's effective date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTime {
    /// The certificate's notBefore.
    #[default]
    NotBefore,
    /// A fixed unix timestamp for every certificate.
    Fixed(i64),
}

impl ReferenceTime {
    pub fn resolve(&self, cert: &CertificateInfo) -> i64 {
        match self {
            ReferenceTime::NotBefore => cert.not_before.timestamp,
            ReferenceTime::Fixed(ts) => *ts,
        }
    }
}

/// A selection problem that does not stop evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("included lint '{0}' is not registered")]
    UnknownInclude(String),
    #[error("excluded lint '{0}' is not registered")]
    UnknownExclude(String),
    #[error("source filter is empty; no lints will run")]
    EmptySources,
    #[error("selection matches no registered lint")]
    NothingSelected,
}

impl LintConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, XlintError> {
        Ok(toml::from_str(s)?)
    }

    /// Whether the lint described by `meta` is selected.
    pub fn selects(&self, meta: &LintMetadata) -> bool {
        if self.exclude.contains(&meta.name) {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.contains(&meta.name) {
                return false;
            }
        }
        match &self.sources {
            Some(sources) => sources.contains(&meta.source),
            None => true,
        }
    }

    /// Report names that do not resolve against `registry`, plus empty
    /// selections. Evaluation proceeds with whatever does resolve.
    pub fn validate(&self, registry: &Registry) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        for name in self.include.iter().flatten() {
            if !registry.contains(name) {
                warnings.push(ConfigWarning::UnknownInclude(name.clone()));
            }
        }
        for name in &self.exclude {
            if !registry.contains(name) {
                warnings.push(ConfigWarning::UnknownExclude(name.clone()));
            }
        }
        if self.sources.as_ref().is_some_and(BTreeSet::is_empty) {
            warnings.push(ConfigWarning::EmptySources);
        } else if !registry.is_empty() && registry.filter(|m| self.selects(m)).next().is_none() {
            warnings.push(ConfigWarning::NothingSelected);
        }
        warnings
    }

    /// Restrict to the given lints (merged with any existing allow-list).
    pub fn with_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include
            .get_or_insert_with(BTreeSet::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.sources
            .get_or_insert_with(BTreeSet::new)
            .extend(sources);
        self
    }

    pub fn with_reference_time(mut self, reference_time: ReferenceTime) -> Self {
        self.reference_time = reference_time;
        self
    }
}
