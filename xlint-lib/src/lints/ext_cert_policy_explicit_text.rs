//! RFC 5280 Section 4.2.1.4 constraints on user notice explicitText.
//!
//! explicitText is at most 200 characters and MUST NOT be an IA5String.

use super::RFC6818_DATE;
use crate::fields::{CertificateInfo, TextEncoding};
use crate::lint::result::Severity;
use crate::lint::{Lint, LintEntry, LintMetadata, LintResult, Source};

const MAX_EXPLICIT_TEXT_LEN: usize = 200;

fn has_explicit_text(cert: &CertificateInfo) -> bool {
    cert.explicit_texts().next().is_some()
}

struct ExplicitTextTooLong;

impl Lint for ExplicitTextTooLong {
    fn check_applies(&self, cert: &CertificateInfo) -> bool {
        has_explicit_text(cert)
    }

    fn execute(&self, cert: &CertificateInfo) -> LintResult {
        // Length is measured in encoded octets.
        match cert
            .explicit_texts()
            .find(|t| t.bytes.len() > MAX_EXPLICIT_TEXT_LEN)
        {
            Some(text) => LintResult::with_details(
                Severity::Error,
                format!("explicitText is {} bytes", text.bytes.len()),
            ),
            None => LintResult::pass(),
        }
    }
}

struct ExplicitTextIa5String;

impl Lint for ExplicitTextIa5String {
    fn check_applies(&self, cert: &CertificateInfo) -> bool {
        has_explicit_text(cert)
    }

    fn execute(&self, cert: &CertificateInfo) -> LintResult {
        if cert
            .explicit_texts()
            .any(|t| t.encoding == TextEncoding::Ia5String)
        {
            LintResult::new(Severity::Error)
        } else {
            LintResult::pass()
        }
    }
}

pub(super) fn too_long_entry() -> LintEntry {
    LintEntry::new(
        LintMetadata::new(
            "e_ext_cert_policy_explicit_text_too_long",
            "Explicit text has a maximum size of 200 characters",
            "RFC 6818: 3",
            Source::Rfc5280,
            RFC6818_DATE,
        ),
        ExplicitTextTooLong,
    )
}

pub(super) fn ia5_string_entry() -> LintEntry {
    LintEntry::new(
        LintMetadata::new(
            "e_ext_cert_policy_explicit_text_ia5_string",
            "Compliant certificates must not encode explicitText as an IA5String",
            "RFC 6818: 3",
            Source::Rfc5280,
            RFC6818_DATE,
        ),
        ExplicitTextIa5String,
    )
}
