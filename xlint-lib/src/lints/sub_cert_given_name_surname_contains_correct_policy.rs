use super::CAB_GIVEN_NAME_DATE;
use crate::fields::CertificateInfo;
use crate::lint::result::Severity;
use crate::lint::{Lint, LintEntry, LintMetadata, LintResult, Source};
use crate::oid;

struct SubCertGivenNameSurnamePolicy;

impl Lint for SubCertGivenNameSurnamePolicy {
    fn check_applies(&self, cert: &CertificateInfo) -> bool {
        cert.is_subscriber() && (cert.subject.contains("GN") || cert.subject.contains("SN"))
    }

    fn execute(&self, cert: &CertificateInfo) -> LintResult {
        if cert.asserts_policy(oid::BR_INDIVIDUAL_VALIDATED) {
            LintResult::pass()
        } else {
            LintResult::new(Severity::Error)
        }
    }
}

pub(super) fn entry() -> LintEntry {
    LintEntry::new(
        LintMetadata::new(
            "e_sub_cert_given_name_surname_contains_correct_policy",
            "Subscriber Certificate: A certificate containing a subject:givenName field or subject:surname field MUST contain the (2.23.140.1.2.3) certPolicy OID",
            "BRs: 7.1.4.2.2",
            Source::CabfBaselineRequirements,
            CAB_GIVEN_NAME_DATE,
        ),
        SubCertGivenNameSurnamePolicy,
    )
}
