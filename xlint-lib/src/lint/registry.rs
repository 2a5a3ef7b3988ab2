//! The lint catalog.
//!
//! A registry has two phases: a [`RegistryBuilder`] collects entries during
//! startup and rejects duplicate names, then [`RegistryBuilder::build`]
//! freezes it into a [`Registry`] that is only ever read. Iteration is always
//! in ascending name order, independent of registration order.

use super::{LintEntry, LintMetadata};
use crate::XlintError;
use std::collections::BTreeMap;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Build phase of a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<String, LintEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Fails if an entry with the same name already exists.
    pub fn register(&mut self, entry: LintEntry) -> Result<(), XlintError> {
        if self.entries.contains_key(entry.name()) {
            return Err(XlintError::DuplicateLint(entry.name().to_string()));
        }
        self.entries.insert(entry.name().to_string(), entry);
        Ok(())
    }

    /// Register every entry, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        entries: impl IntoIterator<Item = LintEntry>,
    ) -> Result<(), XlintError> {
        entries.into_iter().try_for_each(|e| self.register(e))
    }

    pub fn build(self) -> Registry {
        tracing::debug!(lints = self.entries.len(), "lint registry frozen");
        Registry {
            entries: self.entries,
        }
    }
}

/// Frozen, concurrently readable lint catalog.
#[derive(Debug)]
pub struct Registry {
    entries: BTreeMap<String, LintEntry>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry containing every built-in lint.
    pub fn builtin() -> Result<Registry, XlintError> {
        let mut builder = RegistryBuilder::new();
        builder.register_all(crate::lints::builtin())?;
        Ok(builder.build())
    }

    /// All entries in ascending name order. Call again to restart.
    pub fn all(&self) -> impl Iterator<Item = &LintEntry> {
        self.entries.values()
    }

    /// The ordered subsequence whose metadata matches `pred`.
    pub fn filter<'a, P>(&'a self, pred: P) -> impl Iterator<Item = &'a LintEntry> + 'a
    where
        P: Fn(&LintMetadata) -> bool + 'a,
    {
        self.entries.values().filter(move |e| pred(e.metadata()))
    }

    pub fn get(&self, name: &str) -> Result<&LintEntry, XlintError> {
        self.entries
            .get(name)
            .ok_or_else(|| XlintError::LintNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry's metadata as JSON, one object per line.
    pub fn list_json(&self) -> Result<String, XlintError> {
        let mut out = String::new();
        for entry in self.all() {
            out.push_str(&serde_json::to_string(entry.metadata())?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Make `registry` the process-wide catalog.
///
/// Only the first call wins; later calls get the already installed registry
/// back and their argument is dropped.
pub fn install(registry: Registry) -> &'static Registry {
    let installed = GLOBAL.get_or_init(|| registry);
    tracing::debug!(lints = installed.len(), "global lint registry installed");
    installed
}

/// The process-wide catalog, installing the built-in registry on first use.
pub fn global() -> Result<&'static Registry, XlintError> {
    if let Some(registry) = GLOBAL.get() {
        return Ok(registry);
    }
    Ok(install(Registry::builtin()?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::CertificateInfo;
    use crate::lint::{Lint, LintResult, Source, ZERO_DATE};

    struct Noop;

    impl Lint for Noop {
        fn check_applies(&self, _cert: &CertificateInfo) -> bool {
            true
        }

        fn execute(&self, _cert: &CertificateInfo) -> LintResult {
            LintResult::pass()
        }
    }

    fn entry(name: &str, source: Source) -> LintEntry {
        LintEntry::new(
            LintMetadata::new(name, "test lint", "none", source, ZERO_DATE),
            Noop,
        )
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut builder = Registry::builder();
        builder.register(entry("w_dup", Source::Community)).unwrap();
        let err = builder.register(entry("w_dup", Source::Rfc5280)).unwrap_err();
        assert!(matches!(err, XlintError::DuplicateLint(name) if name == "w_dup"));
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn iteration_is_sorted_regardless_of_registration_order() {
        let mut builder = Registry::builder();
        for name in ["w_c", "e_a", "n_b"] {
            builder.register(entry(name, Source::Community)).unwrap();
        }
        let registry = builder.build();
        let names: Vec<_> = registry.all().map(LintEntry::name).collect();
        assert_eq!(names, vec!["e_a", "n_b", "w_c"]);
        // restartable
        assert_eq!(registry.all().count(), 3);
    }

    #[test]
    fn filter_and_get() {
        let mut builder = Registry::builder();
        builder.register(entry("e_rfc", Source::Rfc5280)).unwrap();
        builder.register(entry("e_br", Source::CabfBaselineRequirements)).unwrap();
        builder.register(entry("w_rfc", Source::Rfc5280)).unwrap();
        let registry = builder.build();

        let rfc: Vec<_> = registry
            .filter(|m| m.source == Source::Rfc5280)
            .map(LintEntry::name)
            .collect();
        assert_eq!(rfc, vec!["e_rfc", "w_rfc"]);
        assert_eq!(registry.get("e_br").unwrap().metadata().source, Source::CabfBaselineRequirements);
        assert!(matches!(registry.get("e_missing"), Err(XlintError::LintNotFound(_))));
    }

    #[test]
    fn list_json_has_one_line_per_lint() {
        let mut builder = Registry::builder();
        builder.register(entry("w_b", Source::AwsLabs)).unwrap();
        builder.register(entry("e_a", Source::Rfc5280)).unwrap();
        let listing = builder.build().list_json().unwrap();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines.first().unwrap()).unwrap();
        assert_eq!(first["name"], "e_a");
        assert_eq!(first["effective_date"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn builtin_registry_has_unique_sorted_names() {
        let registry = Registry::builtin().unwrap();
        assert!(!registry.is_empty());
        let names: Vec<_> = registry.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
