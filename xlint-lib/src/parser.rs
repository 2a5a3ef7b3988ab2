//! Certificate parsing from PEM and DER formats.

use crate::fields::{
    BasicConstraints, CertificateInfo, DateTime, DistinguishedName, ExplicitText, Extension,
    PolicyInfo, PublicKeyInfo, SanEntry, TextEncoding,
};
use crate::oid;
use crate::util;
use crate::XlintError;
use x509_parser::der_parser::asn1_rs::{Any, FromDer, Tag};
use x509_parser::extensions::{PolicyInformation, PolicyQualifierInfo};
use x509_parser::prelude::*;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<CertificateInfo, XlintError> {
    if input.is_empty() {
        return Err(XlintError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse a certificate from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<CertificateInfo, XlintError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| XlintError::PemError(format!("{}", e)))?;

    if pem.label != "CERTIFICATE"
        && pem.label != "TRUSTED CERTIFICATE"
        && pem.label != "X509 CERTIFICATE"
    {
        return Err(XlintError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<CertificateInfo, XlintError> {
    let (remaining, x509) =
        X509Certificate::from_der(input).map_err(|e| XlintError::DerError(format!("{}", e)))?;

    // Trailing bytes are not part of the certificate and must not affect
    // the fingerprint.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_certificate_info(&x509, cert_der)
}

fn build_certificate_info(
    x509: &X509Certificate,
    raw_der: &[u8],
) -> Result<CertificateInfo, XlintError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(XlintError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let mut info = CertificateInfo {
        version: raw_version + 1,
        serial: format_serial(tbs.raw_serial()),
        signature_algorithm: format_sig_algorithm(&x509.signature_algorithm),
        issuer: build_dn(&tbs.issuer),
        subject: build_dn(&tbs.subject),
        not_before: DateTime::from_timestamp(tbs.validity.not_before.timestamp()),
        not_after: DateTime::from_timestamp(tbs.validity.not_after.timestamp()),
        public_key: build_public_key_info(&tbs.subject_pki),
        basic_constraints: None,
        key_usage: None,
        ext_key_usage: None,
        san: Vec::new(),
        subject_key_id: None,
        authority_key_id: None,
        policies: Vec::new(),
        extensions: Vec::new(),
        raw_der: raw_der.to_vec(),
    };

    for ext in tbs.extensions() {
        apply_extension(&mut info, ext);
    }

    Ok(info)
}

/// Format a serial number as a colon-separated uppercase hex string,
/// stripping leading zero bytes but keeping at least one byte.
fn format_serial(raw: &[u8]) -> String {
    let stripped = match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    };
    util::hex_colon_upper(stripped)
}

fn format_sig_algorithm(algo: &AlgorithmIdentifier) -> String {
    match algo.algorithm.to_id_string().as_str() {
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ED25519 => "Ed25519".into(),
        other => other.to_string(),
    }
}

fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName {
        components,
        raw: name.as_raw().to_vec(),
    }
}

fn build_public_key_info(spki: &SubjectPublicKeyInfo) -> PublicKeyInfo {
    let oid_str = spki.algorithm.algorithm.to_id_string();

    match oid_str.as_str() {
        oid::RSA_ENCRYPTION => {
            let params = extract_rsa_params(&spki.subject_public_key.data);
            PublicKeyInfo {
                algorithm: "RSA".into(),
                key_size: params.map(|(bits, _)| bits),
                curve: None,
                exponent: params.map(|(_, exp)| exp),
            }
        }
        oid::EC_PUBLIC_KEY => {
            let curve = extract_ec_curve(&spki.algorithm);
            let key_size = match curve.as_str() {
                "P-256" => Some(256),
                "P-384" => Some(384),
                "P-521" => Some(521),
                _ => None,
            };
            PublicKeyInfo {
                algorithm: "EC".into(),
                key_size,
                curve: Some(curve),
                exponent: None,
            }
        }
        oid::ED25519 => PublicKeyInfo {
            algorithm: "Ed25519".into(),
            key_size: Some(256),
            curve: None,
            exponent: None,
        },
        _ => PublicKeyInfo {
            algorithm: oid_str,
            key_size: None,
            curve: None,
            exponent: None,
        },
    }
}

/// Extract the RSA modulus bit length and public exponent.
///
/// Returns `None` if the RSAPublicKey structure cannot be parsed.
fn extract_rsa_params(data: &[u8]) -> Option<(u32, u64)> {
    let (_, parsed) = x509_parser::der_parser::parse_der(data).ok()?;
    let seq = parsed.as_sequence().ok()?;
    let bigint = seq.first().and_then(|m| m.as_bigint().ok())?;
    let exponent = seq.get(1).and_then(|e| e.as_u64().ok())?;
    Some((modulus_bits(&bigint.to_bytes_be().1), exponent))
}

/// Exact bit length of a big-endian unsigned integer.
fn modulus_bits(bytes: &[u8]) -> u32 {
    let Some(first) = bytes.iter().position(|&b| b != 0) else {
        return 0;
    };
    let significant = bytes.len() - first;
    let lead = bytes.get(first).copied().unwrap_or(0);
    (significant as u32 - 1) * 8 + (8 - lead.leading_zeros())
}

fn extract_ec_curve(algo: &AlgorithmIdentifier) -> String {
    if let Some(params) = &algo.parameters {
        if let Ok(oid) = params.as_oid() {
            return match oid.to_id_string().as_str() {
                oid::CURVE_P256 => "P-256".into(),
                oid::CURVE_P384 => "P-384".into(),
                oid::CURVE_P521 => "P-521".into(),
                other => other.to_string(),
            };
        }
    }
    "unknown".into()
}

fn apply_extension(info: &mut CertificateInfo, ext: &X509Extension) {
    let ext_oid = ext.oid.to_id_string();
    info.extensions.push(Extension {
        name: extension_oid_to_name(&ext_oid),
        oid: ext_oid,
        critical: ext.critical,
    });

    match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => {
            info.basic_constraints = Some(BasicConstraints {
                ca: bc.ca,
                path_len: bc.path_len_constraint,
            });
        }
        ParsedExtension::KeyUsage(ku) => {
            let flags = [
                (ku.digital_signature(), "Digital Signature"),
                (ku.non_repudiation(), "Non Repudiation"),
                (ku.key_encipherment(), "Key Encipherment"),
                (ku.data_encipherment(), "Data Encipherment"),
                (ku.key_agreement(), "Key Agreement"),
                (ku.key_cert_sign(), "Certificate Sign"),
                (ku.crl_sign(), "CRL Sign"),
                (ku.encipher_only(), "Encipher Only"),
                (ku.decipher_only(), "Decipher Only"),
            ];
            info.key_usage = Some(
                flags
                    .iter()
                    .filter(|(set, _)| *set)
                    .map(|(_, name)| name.to_string())
                    .collect(),
            );
        }
        ParsedExtension::ExtendedKeyUsage(eku) => {
            let mut usages = Vec::new();
            if eku.any {
                usages.push("2.5.29.37.0".to_string());
            }
            if eku.server_auth {
                usages.push("1.3.6.1.5.5.7.3.1".to_string());
            }
            if eku.client_auth {
                usages.push("1.3.6.1.5.5.7.3.2".to_string());
            }
            if eku.code_signing {
                usages.push("1.3.6.1.5.5.7.3.3".to_string());
            }
            if eku.email_protection {
                usages.push("1.3.6.1.5.5.7.3.4".to_string());
            }
            if eku.time_stamping {
                usages.push("1.3.6.1.5.5.7.3.8".to_string());
            }
            if eku.ocsp_signing {
                usages.push("1.3.6.1.5.5.7.3.9".to_string());
            }
            usages.extend(eku.other.iter().map(|o| o.to_id_string()));
            info.ext_key_usage = Some(usages);
        }
        ParsedExtension::SubjectAlternativeName(san) => {
            info.san = san
                .general_names
                .iter()
                .map(general_name_to_san_entry)
                .collect();
        }
        ParsedExtension::SubjectKeyIdentifier(ski) => {
            info.subject_key_id = Some(hex::encode(ski.0));
        }
        ParsedExtension::AuthorityKeyIdentifier(aki) => {
            info.authority_key_id = aki.key_identifier.as_ref().map(|k| hex::encode(k.0));
        }
        ParsedExtension::CertificatePolicies(policies) => {
            info.policies = policies.iter().map(build_policy_info).collect();
        }
        _ => {}
    }
}

fn build_policy_info(policy: &PolicyInformation) -> PolicyInfo {
    let mut info = PolicyInfo {
        oid: policy.policy_id.to_id_string(),
        explicit_texts: Vec::new(),
        cps_uris: Vec::new(),
    };
    for qualifier in policy.policy_qualifiers.iter().flatten() {
        apply_policy_qualifier(&mut info, qualifier);
    }
    info
}

/// Decode one PolicyQualifierInfo. Malformed qualifiers are skipped; lints
/// only see what could be decoded.
fn apply_policy_qualifier(info: &mut PolicyInfo, qualifier: &PolicyQualifierInfo) {
    let Ok((_, value)) = Any::from_der(qualifier.qualifier) else {
        return;
    };
    match qualifier.policy_qualifier_id.to_id_string().as_str() {
        oid::QUALIFIER_CPS => {
            info.cps_uris
                .push(String::from_utf8_lossy(value.data).into_owned());
        }
        oid::QUALIFIER_USER_NOTICE if value.header.tag() == Tag::Sequence => {
            // UserNotice ::= SEQUENCE { noticeRef OPTIONAL, explicitText OPTIONAL }
            let mut rest = value.data;
            while let Ok((next, item)) = Any::from_der(rest) {
                if let Some(encoding) = display_text_encoding(item.header.tag()) {
                    info.explicit_texts.push(ExplicitText {
                        encoding,
                        bytes: item.data.to_vec(),
                    });
                }
                rest = next;
            }
        }
        _ => {}
    }
}

fn display_text_encoding(tag: Tag) -> Option<TextEncoding> {
    match tag {
        Tag::Utf8String => Some(TextEncoding::Utf8String),
        Tag::Ia5String => Some(TextEncoding::Ia5String),
        Tag::VisibleString => Some(TextEncoding::VisibleString),
        Tag::BmpString => Some(TextEncoding::BmpString),
        Tag::Sequence => None,
        _ => Some(TextEncoding::Other),
    }
}

fn extension_oid_to_name(oid_str: &str) -> String {
    match oid_str {
        oid::EXT_SUBJECT_KEY_ID => "Subject Key Identifier".into(),
        oid::EXT_KEY_USAGE => "Key Usage".into(),
        oid::EXT_SUBJECT_ALT_NAME => "Subject Alternative Name".into(),
        oid::EXT_BASIC_CONSTRAINTS => "Basic Constraints".into(),
        oid::EXT_NAME_CONSTRAINTS => "Name Constraints".into(),
        oid::EXT_CRL_DISTRIBUTION_POINTS => "CRL Distribution Points".into(),
        oid::EXT_CERTIFICATE_POLICIES => "Certificate Policies".into(),
        oid::EXT_AUTHORITY_KEY_ID => "Authority Key Identifier".into(),
        oid::EXT_EXTENDED_KEY_USAGE => "Extended Key Usage".into(),
        oid::EXT_AUTHORITY_INFO_ACCESS => "Authority Information Access".into(),
        other => other.to_string(),
    }
}

fn general_name_to_san_entry(gn: &GeneralName) -> SanEntry {
    match gn {
        GeneralName::DNSName(name) => SanEntry::Dns(name.to_string()),
        GeneralName::RFC822Name(email) => SanEntry::Email(email.to_string()),
        GeneralName::IPAddress(ip_bytes) => SanEntry::Ip(format_ip_bytes(ip_bytes)),
        GeneralName::URI(uri) => SanEntry::Uri(uri.to_string()),
        GeneralName::DirectoryName(dn) => SanEntry::DirName(build_dn(dn).to_oneline()),
        other => SanEntry::Other(format!("{:?}", other)),
    }
}

fn format_ip_bytes(bytes: &[u8]) -> String {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        std::net::Ipv4Addr::from(octets).to_string()
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        std::net::Ipv6Addr::from(octets).to_string()
    } else {
        hex::encode(bytes)
    }
}
