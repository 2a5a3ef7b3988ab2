//! Shared encoding utilities.

use crate::oid;
use crate::XlintError;
use x509_parser::der_parser::asn1_rs::{Any, FromDer};

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Whether the input looks like PEM (begins with `-----BEGIN` after whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Map a DN attribute OID to its conventional short name.
pub fn oid_short_name(attr_oid: &str) -> String {
    match attr_oid {
        oid::COMMON_NAME => "CN".into(),
        oid::SURNAME => "SN".into(),
        oid::SERIAL_NUMBER => "serialNumber".into(),
        oid::COUNTRY => "C".into(),
        oid::LOCALITY => "L".into(),
        oid::STATE_OR_PROVINCE => "ST".into(),
        oid::STREET_ADDRESS => "street".into(),
        oid::ORGANIZATION => "O".into(),
        oid::ORGANIZATIONAL_UNIT => "OU".into(),
        oid::TITLE => "title".into(),
        oid::POSTAL_CODE => "postalCode".into(),
        oid::GIVEN_NAME => "GN".into(),
        oid::EMAIL_ADDRESS => "emailAddress".into(),
        oid::DOMAIN_COMPONENT => "DC".into(),
        other => other.to_string(),
    }
}

fn der_err(e: impl std::fmt::Display) -> XlintError {
    XlintError::DerError(e.to_string())
}

/// Walk an encoded RDNSequence and report whether any attribute value has
/// leading or trailing whitespace, as `(leading, trailing)`.
///
/// Works on the raw encoding so that values in any string type are covered.
pub fn rdn_sequence_whitespace(raw: &[u8]) -> Result<(bool, bool), XlintError> {
    let (_, name) = Any::from_der(raw).map_err(der_err)?;
    let mut leading = false;
    let mut trailing = false;

    let mut rdns = name.data;
    while !rdns.is_empty() {
        let (rest, rdn) = Any::from_der(rdns).map_err(der_err)?;
        let mut atvs = rdn.data;
        while !atvs.is_empty() {
            let (rest_atv, atv) = Any::from_der(atvs).map_err(der_err)?;
            // AttributeTypeAndValue ::= SEQUENCE { type OID, value ANY }
            let (value_der, _attr_type) = Any::from_der(atv.data).map_err(der_err)?;
            let (_, value) = Any::from_der(value_der).map_err(der_err)?;
            if value.data.first().is_some_and(|b| *b == b' ') {
                leading = true;
            }
            if value.data.last().is_some_and(|b| *b == b' ') {
                trailing = true;
            }
            atvs = rest_atv;
        }
        rdns = rest;
    }
    Ok((leading, trailing))
}
