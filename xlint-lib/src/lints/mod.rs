//! Built-in lints.
//!
//! Every lint module exposes an `entry()` constructor; [`builtin`] calls each
//! of them once. Order here does not matter, the registry sorts by name.

mod cert_policy_ov_requires_org;
mod dn_whitespace;
mod ext_cert_policy_explicit_text;
mod old_root_ca_rsa_mod_less_than_2048_bits;
mod sub_cert_given_name_surname_contains_correct_policy;

use crate::lint::LintEntry;

/// 2012-07-01T00:00:00Z, Baseline Requirements effective date.
pub const CAB_EFFECTIVE_DATE: i64 = 1_341_100_800;
/// 2011-01-01T00:00:00Z, last day RSA-1024 roots were tolerated.
pub const NO_RSA_1024_ROOT_DATE: i64 = 1_293_840_000;
/// 2016-09-07T00:00:00Z, BR ballot 136 (givenName/surname).
pub const CAB_GIVEN_NAME_DATE: i64 = 1_473_206_400;

/// 2013-01-01T00:00:00Z, RFC 6818 explicitText requirements.
pub const RFC6818_DATE: i64 = 1_356_998_400;

const CONSTRUCTORS: &[fn() -> LintEntry] = &[
    cert_policy_ov_requires_org::entry,
    dn_whitespace::issuer_leading_entry,
    dn_whitespace::issuer_trailing_entry,
    dn_whitespace::subject_leading_entry,
    dn_whitespace::subject_trailing_entry,
    ext_cert_policy_explicit_text::too_long_entry,
    ext_cert_policy_explicit_text::ia5_string_entry,
    old_root_ca_rsa_mod_less_than_2048_bits::entry,
    sub_cert_given_name_surname_contains_correct_policy::entry,
];

/// Construct one entry per built-in lint.
pub fn builtin() -> Vec<LintEntry> {
    CONSTRUCTORS.iter().map(|ctor| ctor()).collect()
}
