//! OV policy requires subject:organizationName.

use super::CAB_EFFECTIVE_DATE;
use crate::fields::CertificateInfo;
use crate::lint::result::Severity;
use crate::lint::{Lint, LintEntry, LintMetadata, LintResult, Source};
use crate::oid;

struct CertPolicyRequiresOrg;

impl Lint for CertPolicyRequiresOrg {
    fn check_applies(&self, cert: &CertificateInfo) -> bool {
        cert.asserts_policy(oid::BR_ORGANIZATION_VALIDATED)
    }

    fn execute(&self, cert: &CertificateInfo) -> LintResult {
        if cert.subject.contains("O") {
            LintResult::pass()
        } else {
            LintResult::new(Severity::Error)
        }
    }
}

pub(super) fn entry() -> LintEntry {
    LintEntry::new(
        LintMetadata::new(
            "e_cert_policy_ov_requires_org",
            "If certificate policy 2.23.140.1.2.2 is included, organizationName MUST be included in subject",
            "BRs: 7.1.6.1",
            Source::CabfBaselineRequirements,
            CAB_EFFECTIVE_DATE,
        ),
        CertPolicyRequiresOrg,
    )
}
