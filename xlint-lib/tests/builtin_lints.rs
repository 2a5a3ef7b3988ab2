#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Built-in lints evaluated over certificates generated with rcgen and
//! round-tripped through the DER parser.

use rcgen::{CertificateParams, CustomExtension, DnType, IsCa, KeyPair};
use xlint_lib::*;

// ---------------------------------------------------------------------------
// DER helpers for the certificatePolicies extension
// ---------------------------------------------------------------------------

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

fn oid_der(arcs: &[u64]) -> Vec<u8> {
    let mut body = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for &arc in &arcs[2..] {
        let mut chunk = vec![(arc & 0x7f) as u8];
        let mut rest = arc >> 7;
        while rest > 0 {
            chunk.push(((rest & 0x7f) as u8) | 0x80);
            rest >>= 7;
        }
        chunk.reverse();
        body.extend(chunk);
    }
    tlv(0x06, &body)
}

const UTF8_STRING: u8 = 0x0c;
const IA5_STRING: u8 = 0x16;

/// certificatePolicies with one policy and an optional user notice.
fn policies_ext(policy: &[u64], notice: Option<(u8, &[u8])>) -> CustomExtension {
    let mut info = oid_der(policy);
    if let Some((tag, text)) = notice {
        let user_notice = tlv(0x30, &tlv(tag, text));
        let mut qualifier = oid_der(&[1, 3, 6, 1, 5, 5, 7, 2, 2]);
        qualifier.extend(user_notice);
        info.extend(tlv(0x30, &tlv(0x30, &qualifier)));
    }
    let content = tlv(0x30, &tlv(0x30, &info));
    CustomExtension::from_oid_content(&[2, 5, 29, 32], content)
}

const OV: &[u64] = &[2, 23, 140, 1, 2, 2];
const IV: &[u64] = &[2, 23, 140, 1, 2, 3];

fn params(cn: &str, year: i32) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name = rcgen::DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    params.not_before = rcgen::date_time_ymd(year, 1, 1);
    params.not_after = rcgen::date_time_ymd(year + 1, 1, 1);
    params
}

fn issue(params: CertificateParams) -> CertificateInfo {
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    parse_der(cert.der()).unwrap()
}

/// Issue a leaf from a freshly generated CA so the leaf is not self-signed.
fn issue_from_ca(params: CertificateParams) -> CertificateInfo {
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
    ca_params.distinguished_name = rcgen::DistinguishedName::new();
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Test Issuing CA");
    ca_params.is_ca = IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let ca_key = KeyPair::generate().unwrap();
    let ca = ca_params.self_signed(&ca_key).unwrap();

    let key = KeyPair::generate().unwrap();
    let cert = params.signed_by(&key, &ca, &ca_key).unwrap();
    parse_der(cert.der()).unwrap()
}

fn with_given_name(mut params: CertificateParams) -> CertificateParams {
    params
        .distinguished_name
        .push(DnType::CustomDnType(vec![2, 5, 4, 42]), "Alice");
    params
}

fn lint(cert: &CertificateInfo) -> ResultSet {
    let registry = Registry::builtin().unwrap();
    Engine::new(&registry).run(cert, &LintConfig::default())
}

fn checked(severity: Severity) -> Option<LintStatus> {
    Some(LintStatus::Checked(severity))
}

// =========================================================================
// Parser
// =========================================================================

#[test]
fn parser_extracts_policies_and_explicit_text() {
    let mut p = params("policy.example", 2017);
    p.custom_extensions
        .push(policies_ext(OV, Some((UTF8_STRING, b"Relying party terms"))));
    let cert = issue(p);

    assert_eq!(cert.version, 3);
    assert!(cert.is_self_issued());
    assert!(cert.asserts_policy(oid::BR_ORGANIZATION_VALIDATED));
    let texts: Vec<_> = cert.explicit_texts().collect();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].encoding, TextEncoding::Utf8String);
    assert_eq!(texts[0].bytes, b"Relying party terms");
    assert_eq!(cert.public_key.algorithm, "EC");
    assert_eq!(cert.public_key.key_size, Some(256));
    assert_eq!(cert.fingerprint_sha256().len(), 64);
}

// =========================================================================
// Whitespace
// =========================================================================

#[test]
fn leading_whitespace_in_self_signed_names() {
    let results = lint(&issue(params(" leading.example", 2017)));

    assert_eq!(results.status("w_issuer_dn_leading_whitespace"), checked(Severity::Warn));
    assert_eq!(results.status("w_subject_dn_leading_whitespace"), checked(Severity::Warn));
    assert_eq!(results.status("w_issuer_dn_trailing_whitespace"), checked(Severity::Pass));
    assert_eq!(results.status("w_subject_dn_trailing_whitespace"), checked(Severity::Pass));
}

#[test]
fn trailing_whitespace_detected() {
    let results = lint(&issue(params("trailing.example ", 2017)));
    assert_eq!(results.status("w_subject_dn_trailing_whitespace"), checked(Severity::Warn));
    assert_eq!(results.status("w_subject_dn_leading_whitespace"), checked(Severity::Pass));
}

// =========================================================================
// Certificate policies
// =========================================================================

#[test]
fn ov_policy_requires_organization() {
    let mut without_org = params("ov.example", 2017);
    without_org.custom_extensions.push(policies_ext(OV, None));
    let results = lint(&issue(without_org));
    assert_eq!(results.status("e_cert_policy_ov_requires_org"), checked(Severity::Error));
    assert!(results.errors().contains(&"e_cert_policy_ov_requires_org".to_string()));

    let mut with_org = params("ov.example", 2017);
    with_org
        .distinguished_name
        .push(DnType::OrganizationName, "Example Org");
    with_org.custom_extensions.push(policies_ext(OV, None));
    let results = lint(&issue(with_org));
    assert_eq!(results.status("e_cert_policy_ov_requires_org"), checked(Severity::Pass));
}

#[test]
fn ov_lint_is_not_effective_before_baseline_requirements() {
    let mut p = params("old.example", 2011);
    p.custom_extensions.push(policies_ext(OV, None));
    let results = lint(&issue(p));
    assert_eq!(results.status("e_cert_policy_ov_requires_org"), Some(LintStatus::NotEffective));
}

#[test]
fn given_name_requires_individual_policy() {
    let mut p = with_given_name(params("person.example", 2017));
    p.custom_extensions.push(policies_ext(OV, None));
    let cert = issue_from_ca(p);
    assert!(cert.is_subscriber());
    let results = lint(&cert);
    assert_eq!(
        results.status("e_sub_cert_given_name_surname_contains_correct_policy"),
        checked(Severity::Error)
    );

    let mut p = params("person.example", 2017);
    p.distinguished_name
        .push(DnType::CustomDnType(vec![2, 5, 4, 4]), "Smith");
    p.custom_extensions.push(policies_ext(IV, None));
    let results = lint(&issue_from_ca(p));
    assert_eq!(
        results.status("e_sub_cert_given_name_surname_contains_correct_policy"),
        checked(Severity::Pass)
    );
}

#[test]
fn self_signed_leaf_is_not_a_subscriber() {
    let mut p = with_given_name(params("person.example", 2018));
    p.is_ca = IsCa::ExplicitNoCa;
    p.custom_extensions.push(policies_ext(OV, None));
    let cert = issue(p);
    assert!(!cert.is_ca());
    assert!(cert.is_self_signed());
    assert!(!cert.is_subscriber());
    assert_eq!(
        lint(&cert).status("e_sub_cert_given_name_surname_contains_correct_policy"),
        Some(LintStatus::NotApplicable)
    );
}

#[test]
fn mismatched_key_identifiers_are_not_self_signed() {
    let mut cert = issue(params("same.example", 2017));
    assert!(cert.is_self_issued());

    cert.subject_key_id = Some("0a0b0c".into());
    cert.authority_key_id = Some("0a0b0c".into());
    assert!(cert.is_self_signed());

    // Same names, but the issuer key is a different one.
    cert.authority_key_id = Some("ffeedd".into());
    assert!(cert.is_self_issued());
    assert!(!cert.is_self_signed());
    assert!(cert.is_subscriber());

    cert.authority_key_id = None;
    assert!(cert.is_self_signed());
}

#[test]
fn parser_reads_key_identifiers() {
    let mut p = params("Key Id Root", 2017);
    p.is_ca = IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    p.key_identifier_method = rcgen::KeyIdMethod::PreSpecified(vec![0x0a, 0x0b, 0x0c]);
    let cert = issue(p);
    assert_eq!(cert.subject_key_id.as_deref(), Some("0a0b0c"));
    assert!(cert.is_root_ca());

    let mut leaf_params = params("leaf.example", 2017);
    leaf_params.use_authority_key_identifier_extension = true;
    let leaf = issue_from_ca(leaf_params);
    assert!(leaf.authority_key_id.is_some());
    assert_ne!(leaf.authority_key_id, leaf.subject_key_id);
}

#[test]
fn given_name_lint_skips_certs_without_names() {
    let results = lint(&issue(params("plain.example", 2017)));
    assert_eq!(
        results.status("e_sub_cert_given_name_surname_contains_correct_policy"),
        Some(LintStatus::NotApplicable)
    );
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_too_long"),
        Some(LintStatus::NotApplicable)
    );
}

#[test]
fn explicit_text_length_limit() {
    let long = vec![b'a'; 201];
    let mut p = params("notice.example", 2017);
    p.custom_extensions
        .push(policies_ext(OV, Some((UTF8_STRING, &long))));
    let results = lint(&issue(p));
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_too_long"),
        checked(Severity::Error)
    );
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_ia5_string"),
        checked(Severity::Pass)
    );

    let exact = vec![b'a'; 200];
    let mut p = params("notice.example", 2017);
    p.custom_extensions
        .push(policies_ext(OV, Some((UTF8_STRING, &exact))));
    let results = lint(&issue(p));
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_too_long"),
        checked(Severity::Pass)
    );
}

#[test]
fn explicit_text_lints_not_effective_before_rfc6818() {
    let long = vec![b'a'; 201];
    let mut p = params("notice.example", 2012);
    p.custom_extensions
        .push(policies_ext(OV, Some((IA5_STRING, &long))));
    let results = lint(&issue(p));
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_too_long"),
        Some(LintStatus::NotEffective)
    );
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_ia5_string"),
        Some(LintStatus::NotEffective)
    );

    let registry = Registry::builtin().unwrap();
    for name in [
        "e_ext_cert_policy_explicit_text_too_long",
        "e_ext_cert_policy_explicit_text_ia5_string",
    ] {
        let meta = registry.get(name).unwrap().metadata();
        assert_eq!(meta.effective_date, 1_356_998_400, "{}", name);
    }
}

#[test]
fn explicit_text_must_not_be_ia5() {
    let mut p = params("notice.example", 2017);
    p.custom_extensions
        .push(policies_ext(OV, Some((IA5_STRING, b"short notice"))));
    let results = lint(&issue(p));
    assert_eq!(
        results.status("e_ext_cert_policy_explicit_text_ia5_string"),
        checked(Severity::Error)
    );
}

// =========================================================================
// Root CA key size
// =========================================================================

#[test]
fn old_rsa_root_with_small_modulus() {
    let mut p = params("Old Root", 2009);
    p.is_ca = IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let mut cert = issue(p);
    assert!(cert.is_root_ca());

    // rcgen only generates EC keys here; present the key as RSA-1024.
    cert.public_key = PublicKeyInfo {
        algorithm: "RSA".into(),
        key_size: Some(1024),
        curve: None,
        exponent: Some(65537),
    };
    let results = lint(&cert);
    let outcome = results.get("e_old_root_ca_rsa_mod_less_than_2048_bits").unwrap();
    assert_eq!(outcome.status, LintStatus::Checked(Severity::Error));
    assert_eq!(outcome.details.as_deref(), Some("RSA modulus is 1024 bits"));

    cert.public_key.key_size = Some(2048);
    assert_eq!(
        lint(&cert).status("e_old_root_ca_rsa_mod_less_than_2048_bits"),
        checked(Severity::Pass)
    );
}

#[test]
fn newer_or_ec_roots_are_not_applicable() {
    let mut p = params("EC Root", 2009);
    p.is_ca = IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let results = lint(&issue(p));
    assert_eq!(
        results.status("e_old_root_ca_rsa_mod_less_than_2048_bits"),
        Some(LintStatus::NotApplicable)
    );
}

// =========================================================================
// Global registry
// =========================================================================

#[test]
fn lint_certificate_uses_every_builtin_lint() {
    let cert = issue(params("global.example", 2017));
    let results = lint_certificate(&cert).unwrap();
    let registry = Registry::builtin().unwrap();
    assert_eq!(results.len(), registry.len());
    assert!(results.iter().all(|(_, o)| o.status != LintStatus::Reserved));
}
