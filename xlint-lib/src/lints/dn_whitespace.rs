//! Leading/trailing whitespace in issuer and subject attribute values.

use crate::fields::{CertificateInfo, DistinguishedName};
use crate::lint::result::Severity;
use crate::lint::{Lint, LintEntry, LintMetadata, LintResult, Source, ZERO_DATE};
use crate::util::rdn_sequence_whitespace;

#[derive(Debug, Clone, Copy)]
enum Field {
    Issuer,
    Subject,
}

#[derive(Debug, Clone, Copy)]
enum Position {
    Leading,
    Trailing,
}

/// One lint per (field, position) pair; all share the RDN walk.
struct DnWhitespace {
    field: Field,
    position: Position,
}

impl DnWhitespace {
    fn name_of<'a>(&self, cert: &'a CertificateInfo) -> &'a DistinguishedName {
        match self.field {
            Field::Issuer => &cert.issuer,
            Field::Subject => &cert.subject,
        }
    }
}

impl Lint for DnWhitespace {
    fn check_applies(&self, _cert: &CertificateInfo) -> bool {
        true
    }

    fn execute(&self, cert: &CertificateInfo) -> LintResult {
        match rdn_sequence_whitespace(&self.name_of(cert).raw) {
            Ok((leading, trailing)) => {
                let found = match self.position {
                    Position::Leading => leading,
                    Position::Trailing => trailing,
                };
                if found {
                    LintResult::new(Severity::Warn)
                } else {
                    LintResult::pass()
                }
            }
            Err(e) => LintResult::with_details(Severity::Fatal, e.to_string()),
        }
    }
}

fn make(field: Field, position: Position) -> LintEntry {
    let field_name = match field {
        Field::Issuer => "issuer",
        Field::Subject => "subject",
    };
    let pos_name = match position {
        Position::Leading => "leading",
        Position::Trailing => "trailing",
    };
    LintEntry::new(
        LintMetadata::new(
            format!("w_{}_dn_{}_whitespace", field_name, pos_name),
            format!(
                "AttributeValue in {} RelativeDistinguishedName sequence SHOULD NOT have {} whitespace",
                field_name, pos_name
            ),
            "AWSLabs certlint",
            Source::AwsLabs,
            ZERO_DATE,
        ),
        DnWhitespace { field, position },
    )
}

pub(super) fn issuer_leading_entry() -> LintEntry {
    make(Field::Issuer, Position::Leading)
}

pub(super) fn issuer_trailing_entry() -> LintEntry {
    make(Field::Issuer, Position::Trailing)
}

pub(super) fn subject_leading_entry() -> LintEntry {
    make(Field::Subject, Position::Leading)
}

pub(super) fn subject_trailing_entry() -> LintEntry {
    make(Field::Subject, Position::Trailing)
}
