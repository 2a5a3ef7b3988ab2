//! Certificate data types consumed by lints.
//!
//! `CertificateInfo` is the read-only view the engine hands to every lint. It
//! is built once per certificate by the parser and never mutated afterwards.

use crate::oid;
use serde::Serialize;

/// A parsed X.509 certificate with the fields lints inspect.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    /// Certificate version (1, 2, or 3).
    pub version: u32,
    /// Serial number as a colon-separated hex string.
    pub serial: String,
    /// Signature algorithm name.
    pub signature_algorithm: String,
    /// Issuer distinguished name.
    pub issuer: DistinguishedName,
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Validity start date.
    pub not_before: DateTime,
    /// Validity end date.
    pub not_after: DateTime,
    /// Public key information.
    pub public_key: PublicKeyInfo,
    /// Basic Constraints, if the extension is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_constraints: Option<BasicConstraints>,
    /// Key Usage names, if the extension is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_usage: Option<Vec<String>>,
    /// Extended Key Usage OIDs, if the extension is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_key_usage: Option<Vec<String>>,
    /// Subject Alternative Name entries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub san: Vec<SanEntry>,
    /// Subject Key Identifier as lowercase hex, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_key_id: Option<String>,
    /// Authority Key Identifier keyIdentifier as lowercase hex, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority_key_id: Option<String>,
    /// Certificate policies in extension order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyInfo>,
    /// All X.509v3 extensions present, in certificate order.
    pub extensions: Vec<Extension>,

    /// Raw DER bytes of the entire certificate (for fingerprint computation).
    #[serde(skip)]
    pub raw_der: Vec<u8>,
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DistinguishedName {
    /// Ordered list of (attribute_type, value) pairs.
    /// Attribute types use short names where known (e.g., "CN", "O", "C").
    pub components: Vec<(String, String)>,
    /// DER encoding of the Name, for encoding-level checks.
    #[serde(skip)]
    pub raw: Vec<u8>,
}

impl DistinguishedName {
    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    pub fn to_oneline(&self) -> String {
        self.components
            .iter()
            .map(|(k, v)| format!("{} = {}", k, escape_dn_value(v)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether an attribute with the given short name is present and non-empty.
    pub fn contains(&self, attr: &str) -> bool {
        self.components
            .iter()
            .any(|(k, v)| k == attr && !v.is_empty())
    }

    /// All values of the given attribute, in order.
    pub fn values<'a>(&'a self, attr: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.components
            .iter()
            .filter(move |(k, _)| k == attr)
            .map(|(_, v)| v.as_str())
    }
}

fn escape_dn_value(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for ch in v.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            '=' => out.push_str("\\="),
            _ => out.push(ch),
        }
    }
    out
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// Public key information.
#[derive(Debug, Clone, Serialize)]
pub struct PublicKeyInfo {
    /// Algorithm name: "RSA", "EC", "Ed25519", or the OID if unknown.
    pub algorithm: String,
    /// Key size in bits. For RSA this is the exact modulus bit length.
    pub key_size: Option<u32>,
    /// Named curve for EC keys (e.g., "P-256", "P-384").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
    /// RSA exponent (only for RSA keys, typically 65537).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<u64>,
}

impl PublicKeyInfo {
    pub fn is_rsa(&self) -> bool {
        self.algorithm == "RSA"
    }
}

/// Decoded Basic Constraints extension.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
}

/// A certificate extension as it appears in the certificate.
#[derive(Debug, Clone, Serialize)]
pub struct Extension {
    /// OID as a dotted-decimal string.
    pub oid: String,
    /// Human-readable name (or OID string if unknown).
    pub name: String,
    /// Whether this extension is marked critical.
    pub critical: bool,
}

/// Subject Alternative Name entry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum SanEntry {
    Dns(String),
    Email(String),
    Ip(String),
    Uri(String),
    DirName(String),
    Other(String),
}

/// One PolicyInformation from the Certificate Policies extension.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyInfo {
    /// Policy identifier OID.
    pub oid: String,
    /// Explicit texts from user notice qualifiers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_texts: Vec<ExplicitText>,
    /// CPS pointer qualifiers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cps_uris: Vec<String>,
}

/// The `explicitText` of a user notice, kept with its ASN.1 string type.
#[derive(Debug, Clone, Serialize)]
pub struct ExplicitText {
    pub encoding: TextEncoding,
    /// Content octets of the encoded string.
    #[serde(serialize_with = "serialize_text_bytes")]
    pub bytes: Vec<u8>,
}

fn serialize_text_bytes<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}

/// ASN.1 string types permitted for DisplayText.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8String,
    Ia5String,
    VisibleString,
    BmpString,
    Other,
}

/// Date-time representation.
#[derive(Debug, Clone, Serialize)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl DateTime {
    /// Build from a unix timestamp, rendering the ISO 8601 form in UTC.
    pub fn from_timestamp(ts: i64) -> Self {
        let iso = match ::time::OffsetDateTime::from_unix_timestamp(ts) {
            Ok(dt) => format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
            Err(_) => format!("{}", ts),
        };
        DateTime {
            iso8601: iso,
            timestamp: ts,
        }
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso8601)
    }
}

impl CertificateInfo {
    /// Return the subject as a one-line string.
    pub fn subject_string(&self) -> String {
        self.subject.to_oneline()
    }

    /// Return the issuer as a one-line string.
    pub fn issuer_string(&self) -> String {
        self.issuer.to_oneline()
    }

    /// SHA-256 fingerprint of the DER encoding as lowercase hex.
    pub fn fingerprint_sha256(&self) -> String {
        crate::fingerprint::sha256_hex(&self.raw_der)
    }

    /// Whether Basic Constraints asserts cA.
    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_some_and(|bc| bc.ca)
    }

    /// Subject and issuer encode the same Name.
    pub fn is_self_issued(&self) -> bool {
        self.subject.raw == self.issuer.raw
    }

    /// Self-issued, and the authority key identifier (when both key
    /// identifiers are present) names the certificate's own key.
    ///
    /// The signature is not verified against the subject key, so a
    /// certificate that omits either identifier is judged by its names alone.
    pub fn is_self_signed(&self) -> bool {
        if !self.is_self_issued() {
            return false;
        }
        match (&self.authority_key_id, &self.subject_key_id) {
            (Some(aki), Some(ski)) => aki == ski,
            _ => true,
        }
    }

    /// A self-signed CA certificate.
    pub fn is_root_ca(&self) -> bool {
        self.is_ca() && self.is_self_signed()
    }

    /// An end-entity certificate: neither a CA nor self-signed.
    pub fn is_subscriber(&self) -> bool {
        !self.is_ca() && !self.is_self_signed()
    }

    /// Iterate over asserted policy OIDs.
    pub fn policy_oids(&self) -> impl Iterator<Item = &str> {
        self.policies.iter().map(|p| p.oid.as_str())
    }

    /// Whether the given policy OID is asserted.
    pub fn asserts_policy(&self, policy_oid: &str) -> bool {
        self.policy_oids().any(|p| p == policy_oid)
    }

    /// Iterate over every explicit text across all policies.
    pub fn explicit_texts(&self) -> impl Iterator<Item = &ExplicitText> {
        self.policies.iter().flat_map(|p| p.explicit_texts.iter())
    }

    /// Whether an extension with the given OID is present.
    pub fn has_extension(&self, ext_oid: &str) -> bool {
        self.extensions.iter().any(|e| e.oid == ext_oid)
    }

    /// Whether the Certificate Policies extension is present.
    pub fn has_certificate_policies(&self) -> bool {
        self.has_extension(oid::EXT_CERTIFICATE_POLICIES)
    }
}
