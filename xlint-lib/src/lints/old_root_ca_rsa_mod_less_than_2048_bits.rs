use super::NO_RSA_1024_ROOT_DATE;
use crate::fields::CertificateInfo;
use crate::lint::result::Severity;
use crate::lint::{Lint, LintEntry, LintMetadata, LintResult, Source, ZERO_DATE};

const MIN_MODULUS_BITS: u32 = 2048;

struct RootCaModSize;

impl Lint for RootCaModSize {
    fn check_applies(&self, cert: &CertificateInfo) -> bool {
        cert.public_key.is_rsa()
            && cert.public_key.key_size.is_some()
            && cert.is_root_ca()
            && cert.not_before.timestamp < NO_RSA_1024_ROOT_DATE
    }

    fn execute(&self, cert: &CertificateInfo) -> LintResult {
        match cert.public_key.key_size {
            Some(bits) if bits < MIN_MODULUS_BITS => LintResult::with_details(
                Severity::Error,
                format!("RSA modulus is {} bits", bits),
            ),
            _ => LintResult::pass(),
        }
    }
}

pub(super) fn entry() -> LintEntry {
    LintEntry::new(
        LintMetadata::new(
            "e_old_root_ca_rsa_mod_less_than_2048_bits",
            "In a validity period beginning on or before 31 Dec 2010, root CA certificates using RSA public key algorithm MUST use a 2048 bit modulus",
            "BRs: 6.1.5",
            Source::CabfBaselineRequirements,
            ZERO_DATE,
        ),
        RootCaModSize,
    )
}
