//! xlint-lib: Rule registry and execution engine for linting X.509 certificates.
//!
//! Certificates are parsed into a [`CertificateInfo`] view and evaluated
//! against a catalog of independently authored lints. The catalog lives in a
//! [`Registry`] that is built once at startup and then shared read-only across
//! worker threads; the [`Engine`] selects, gates and invokes each lint and
//! returns a deterministic [`ResultSet`].

mod convert;
mod display;
mod fields;
mod fingerprint;
pub mod lint;
pub mod lints;
pub mod oid;
mod parser;
mod util;

pub use convert::{base64_to_der, der_to_base64};
pub use display::{display_listing, display_results, to_json};
pub use fields::{
    BasicConstraints, CertificateInfo, DateTime, DistinguishedName, ExplicitText, Extension,
    PolicyInfo, PublicKeyInfo, SanEntry, TextEncoding,
};
pub use lint::config::{ConfigWarning, LintConfig, ReferenceTime};
pub use lint::engine::{lint_certificate, Engine};
pub use lint::registry::{Registry, RegistryBuilder};
pub use lint::result::{LintOutcome, LintStatus, ResultSet, Severity, Summary};
pub use lint::{Lint, LintEntry, LintMetadata, LintResult, Source, ZERO_DATE};
pub use parser::{parse_cert, parse_der, parse_pem};
pub use util::rdn_sequence_whitespace;

/// Errors returned by xlint-lib.
#[derive(Debug, thiserror::Error)]
pub enum XlintError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Duplicate lint name: {0}")]
    DuplicateLint(String),

    #[error("Lint not found: {0}")]
    LintNotFound(String),

    #[error("Unknown lint source: {0}")]
    UnknownSource(String),

    #[error("Lint initialization failed: {0}")]
    LintInit(String),

    #[error("Invalid lint configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
