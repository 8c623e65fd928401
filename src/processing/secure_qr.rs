use chrono::{NaiveDate, NaiveDateTime};
use flate2::read::{GzDecoder, ZlibDecoder};
use log::{debug, warn};
use num_bigint::BigUint;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::models::{AddressParts, DateFormat, IdentityRecord, UniqueIdentifier};
use crate::processing::date_normalizer::DateNormalizer;
use crate::validation::signature::SignatureVerifier;
use crate::validation::trust_store::CertificateTrustStore;

pub const DEFAULT_DELIMITER: u8 = 255;
pub const DEFAULT_SIGNATURE_LEN: usize = 256;
pub const DEFAULT_HASH_LEN: usize = 32;
pub const DEFAULT_MAX_DECOMPRESSED: usize = 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const REFERENCE_DIGITS: usize = 4;
const TIMESTAMP_LEN: usize = 17;
const FULL_IDENTIFIER_LEN: usize = 12;

/// Text fields that can appear in a Secure QR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QrField {
    EmailMobileIndicator,
    ReferenceId,
    Name,
    DateOfBirth,
    Gender,
    CareOf,
    District,
    Landmark,
    House,
    Location,
    PostalCode,
    PostOffice,
    State,
    Street,
    SubDistrict,
    Vtc,
    MobileLastDigits,
    CertificateId,
}

const LEGACY_FIELDS: [QrField; 16] = [
    QrField::EmailMobileIndicator,
    QrField::ReferenceId,
    QrField::Name,
    QrField::DateOfBirth,
    QrField::Gender,
    QrField::CareOf,
    QrField::District,
    QrField::Landmark,
    QrField::House,
    QrField::Location,
    QrField::PostalCode,
    QrField::PostOffice,
    QrField::State,
    QrField::Street,
    QrField::SubDistrict,
    QrField::Vtc,
];

/// Byte layout of one payload version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSchema {
    /// Marker in the first field; `None` for payloads that predate markers.
    pub version: Option<String>,
    pub delimiter: u8,
    /// Text fields in order, after the marker when there is one.
    pub fields: Vec<QrField>,
    pub signature_len: usize,
    pub hash_len: usize,
}

impl QrSchema {
    pub fn legacy() -> Self {
        QrSchema {
            version: None,
            delimiter: DEFAULT_DELIMITER,
            fields: LEGACY_FIELDS.to_vec(),
            signature_len: DEFAULT_SIGNATURE_LEN,
            hash_len: DEFAULT_HASH_LEN,
        }
    }

    pub fn v2() -> Self {
        QrSchema {
            version: Some("V2".to_string()),
            ..Self::legacy()
        }
    }

    pub fn v3() -> Self {
        let mut fields = LEGACY_FIELDS.to_vec();
        fields.push(QrField::MobileLastDigits);
        QrSchema {
            version: Some("V3".to_string()),
            fields,
            ..Self::legacy()
        }
    }

    pub fn with_signature_len(mut self, len: usize) -> Self {
        self.signature_len = len;
        self
    }
}

/// Versioned schemas; the legacy entry applies when no marker matches.
#[derive(Debug, Clone)]
pub struct SchemaTable {
    legacy: QrSchema,
    versioned: Vec<QrSchema>,
}

impl Default for SchemaTable {
    fn default() -> Self {
        SchemaTable {
            legacy: QrSchema::legacy(),
            versioned: vec![QrSchema::v2(), QrSchema::v3()],
        }
    }
}

impl SchemaTable {
    /// Adds or replaces the schema for its version marker.
    pub fn register(&mut self, schema: QrSchema) {
        match &schema.version {
            None => self.legacy = schema,
            Some(version) => {
                self.versioned.retain(|s| s.version.as_ref() != Some(version));
                self.versioned.push(schema);
            }
        }
    }

    /// Applies `f` to every registered schema.
    pub fn map_all(mut self, f: impl Fn(QrSchema) -> QrSchema) -> Self {
        self.legacy = f(self.legacy);
        self.versioned = self.versioned.into_iter().map(&f).collect();
        self
    }

    pub fn detect(&self, payload: &[u8]) -> &QrSchema {
        self.versioned
            .iter()
            .find(|schema| {
                let marker = schema.version.as_deref().unwrap_or_default().as_bytes();
                let first = payload
                    .split(|b| *b == schema.delimiter)
                    .next()
                    .unwrap_or_default();
                first == marker
            })
            .unwrap_or(&self.legacy)
    }
}

/// Payload split into its parts, before interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitPayload {
    pub version: Option<String>,
    pub values: HashMap<QrField, String>,
    /// Bytes after the last text field: photo then contact hashes.
    pub trailer: Vec<u8>,
    pub signed_data: Vec<u8>,
    pub signature: Option<Vec<u8>>,
}

/// Keeps only ASCII digits, in order.
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Big-endian bytes of the base-10 number in `digits`.
pub fn reconstruct_bytes(digits: &str) -> Option<Vec<u8>> {
    if digits.is_empty() {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 10).map(|n| n.to_bytes_be())
}

/// Gzip when the magic bytes say so, otherwise zlib. Output above `limit`
/// bytes counts as a failure.
pub fn decompress(bytes: &[u8], limit: usize) -> Option<Vec<u8>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        read_limited(GzDecoder::new(bytes), limit)
    } else {
        read_limited(ZlibDecoder::new(bytes), limit)
    }
}

fn read_limited<R: Read>(reader: R, limit: usize) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    match reader.take(limit as u64 + 1).read_to_end(&mut out) {
        Ok(_) if out.len() <= limit && !out.is_empty() => Some(out),
        Ok(_) => None,
        Err(err) => {
            debug!("Decompression failed: {}", err);
            None
        }
    }
}

/// Splits a decompressed payload per `schema`. Short payloads leave the
/// trailing fields absent.
pub fn split_payload(schema: &QrSchema, payload: &[u8]) -> SplitPayload {
    let (signed, signature) = if payload.len() > schema.signature_len {
        let at = payload.len() - schema.signature_len;
        (&payload[..at], Some(payload[at..].to_vec()))
    } else {
        (payload, None)
    };

    let skip = usize::from(schema.version.is_some());
    let mut segments = signed.splitn(skip + schema.fields.len() + 1, |b| *b == schema.delimiter);
    let version = if skip == 1 {
        segments.next().map(decode_text)
    } else {
        None
    };

    let mut values = HashMap::new();
    for field in &schema.fields {
        match segments.next() {
            Some(segment) => {
                values.insert(*field, decode_text(segment));
            }
            None => break,
        }
    }

    SplitPayload {
        version,
        values,
        trailer: segments.next().map(<[u8]>::to_vec).unwrap_or_default(),
        signed_data: signed.to_vec(),
        signature,
    }
}

// UTF-8 when valid, otherwise ISO-8859-1.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Decodes Secure QR scans into identity records and checks their signature.
#[derive(Debug, Clone)]
pub struct SecureQrDecoder {
    schemas: SchemaTable,
    verifier: SignatureVerifier,
    max_decompressed: usize,
}

impl SecureQrDecoder {
    pub fn new(trust_store: Arc<CertificateTrustStore>) -> Self {
        SecureQrDecoder {
            schemas: SchemaTable::default(),
            verifier: SignatureVerifier::new(trust_store),
            max_decompressed: DEFAULT_MAX_DECOMPRESSED,
        }
    }

    pub fn with_schemas(mut self, schemas: SchemaTable) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_max_decompressed(mut self, limit: usize) -> Self {
        self.max_decompressed = limit;
        self
    }

    pub fn trust_store(&self) -> &CertificateTrustStore {
        self.verifier.trust_store()
    }

    /// Total over any input: the returned record always carries `raw`
    /// verbatim, and stages that fail leave their fields empty.
    pub fn decode(&self, raw: &str) -> IdentityRecord {
        let mut record = IdentityRecord::raw_only(raw);

        let digits = sanitize(raw);
        let Some(bytes) = reconstruct_bytes(&digits) else {
            warn!("QR payload has no usable digits");
            return record;
        };
        let Some(payload) = decompress(&bytes, self.max_decompressed) else {
            warn!("QR payload could not be decompressed ({} bytes)", bytes.len());
            return record;
        };

        let schema = self.schemas.detect(&payload);
        debug!("Decoding QR payload with schema {:?}", schema.version);
        let split = split_payload(schema, &payload);
        populate(&mut record, schema, &split);

        let check = self.verifier.check(
            split.values.get(&QrField::CertificateId).map(String::as_str),
            &split.signed_data,
            split.signature.as_deref(),
        );
        record.certificate_id = check.certificate_id;
        record.signature_valid = check.valid;

        record
    }
}

fn populate(record: &mut IdentityRecord, schema: &QrSchema, split: &SplitPayload) {
    let text = |field: QrField| {
        split
            .values
            .get(&field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    record.version = split.version.clone();
    record.name = text(QrField::Name);
    record.gender = text(QrField::Gender);
    record.care_of = text(QrField::CareOf);
    record.postal_code = text(QrField::PostalCode);
    record.mobile_last_digits = text(QrField::MobileLastDigits);
    record.date_of_birth = text(QrField::DateOfBirth).map(|dob| {
        DateNormalizer::normalize_lenient(&dob, DateFormat::Generic).unwrap_or(dob)
    });

    record.address_parts = AddressParts {
        house: text(QrField::House),
        street: text(QrField::Street),
        landmark: text(QrField::Landmark),
        location: text(QrField::Location),
        vtc: text(QrField::Vtc),
        post_office: text(QrField::PostOffice),
        sub_district: text(QrField::SubDistrict),
        district: text(QrField::District),
        state: text(QrField::State),
    };
    record.address = record.address_parts.compose(record.care_of.as_deref());

    if let Some(reference) = text(QrField::ReferenceId) {
        apply_reference(record, &reference);
    }

    let (photo, email_hash, mobile_hash) = split_trailer(
        &split.trailer,
        text(QrField::EmailMobileIndicator).as_deref(),
        schema.hash_len,
    );
    record.photo = photo;
    record.email_hash = email_hash;
    record.mobile_hash = mobile_hash;
    record.signature = split.signature.clone();
}

fn apply_reference(record: &mut IdentityRecord, reference: &str) {
    let all_digits = reference.bytes().all(|b| b.is_ascii_digit());

    if all_digits && reference.len() == FULL_IDENTIFIER_LEN {
        record.unique_identifier = Some(UniqueIdentifier::Full(reference.to_string()));
    } else if reference.len() >= REFERENCE_DIGITS
        && reference.bytes().take(REFERENCE_DIGITS).all(|b| b.is_ascii_digit())
    {
        record.unique_identifier = Some(UniqueIdentifier::Reference(
            reference[..REFERENCE_DIGITS].to_string(),
        ));
        record.issued_at = reference
            .get(REFERENCE_DIGITS..REFERENCE_DIGITS + TIMESTAMP_LEN)
            .and_then(parse_timestamp);
    }

    record.masked_document_number = record
        .unique_identifier
        .as_ref()
        .map(|id| format!("XXXX XXXX {}", id.last_digits()));
    record.enrollment_reference = Some(reference.to_string());
}

// YYYYMMDDHHMMSSsss
fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if ts.len() != TIMESTAMP_LEN || !ts.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let num = |range: std::ops::Range<usize>| ts[range].parse::<u32>().ok();
    NaiveDate::from_ymd_opt(num(0..4)? as i32, num(4..6)?, num(6..8)?)?.and_hms_milli_opt(
        num(8..10)?,
        num(10..12)?,
        num(12..14)?,
        num(14..17)?,
    )
}

type Trailer = (Option<Vec<u8>>, Option<Vec<u8>>, Option<Vec<u8>>);

// Photo, then the email hash (indicator 1 or 3), then the mobile hash (2 or 3).
fn split_trailer(trailer: &[u8], indicator: Option<&str>, hash_len: usize) -> Trailer {
    let (has_email, has_mobile) = match indicator {
        Some("1") => (true, false),
        Some("2") => (false, true),
        Some("3") => (true, true),
        _ => (false, false),
    };

    let mut end = trailer.len();
    let mut take_hash = |present: bool| {
        if present && end >= hash_len {
            end -= hash_len;
            Some(trailer[end..end + hash_len].to_vec())
        } else {
            None
        }
    };
    let mobile_hash = take_hash(has_mobile);
    let email_hash = take_hash(has_email);

    let photo = Some(trailer[..end].to_vec()).filter(|p| !p.is_empty());
    (photo, email_hash, mobile_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use rsa::{RsaPrivateKey, RsaPublicKey};
    use sha2::Sha256;
    use std::io::Write;

    const SIG_LEN: usize = 128;

    fn text_fields(indicator: &str) -> Vec<&str> {
        vec![
            indicator,
            "123420190311103045123",
            "Asha Kumari",
            "21-05-1979",
            "F",
            "W/O Ravi Kumar",
            "Pune",
            "Near Temple",
            "12",
            "Kothrud",
            "411038",
            "Kothrud",
            "Maharashtra",
            "MG Road",
            "Haveli",
            "Pune City",
        ]
    }

    fn build_payload(prefix: &[&str], fields: &[&str], trailer: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        for field in prefix.iter().chain(fields) {
            payload.extend_from_slice(field.as_bytes());
            payload.push(DEFAULT_DELIMITER);
        }
        payload.extend_from_slice(trailer);
        payload
    }

    fn to_digits(payload: &[u8]) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();
        BigUint::from_bytes_be(&compressed).to_str_radix(10)
    }

    fn signed(private: &RsaPrivateKey, body: Vec<u8>) -> Vec<u8> {
        let signature = SigningKey::<Sha256>::new(private.clone()).sign(&body).to_vec();
        assert_eq!(signature.len(), SIG_LEN);
        let mut payload = body;
        payload.extend_from_slice(&signature);
        payload
    }

    fn key_pair() -> (RsaPrivateKey, RsaPublicKey) {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), SIG_LEN * 8).unwrap();
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    fn decoder(store: CertificateTrustStore) -> SecureQrDecoder {
        SecureQrDecoder::new(Arc::new(store))
            .with_schemas(SchemaTable::default().map_all(|s| s.with_signature_len(SIG_LEN)))
    }

    #[test]
    fn test_raw_data_preserved_on_garbage() {
        let decoder = decoder(CertificateTrustStore::empty());
        for raw in ["", "garbage", "   ", "12345", "ABC 987 xyz", "\u{fffd}\u{0}"] {
            let record = decoder.decode(raw);
            assert_eq!(record.raw_qr_data, raw);
            assert!(!record.has_fields());
            assert!(!record.signature_valid);
            assert_eq!(record.name, None);
        }
    }

    #[test]
    fn test_decodes_v2_fields() {
        let photo = vec![0xff, 0x4f, 0xff, 0x51, 0x00, 0x2f];
        let body = build_payload(&["V2"], &text_fields("0"), &photo);
        let (private, _) = key_pair();
        let raw = to_digits(&signed(&private, body));

        let record = decoder(CertificateTrustStore::empty()).decode(&raw);
        assert_eq!(record.raw_qr_data, raw);
        assert_eq!(record.version.as_deref(), Some("V2"));
        assert_eq!(record.name.as_deref(), Some("Asha Kumari"));
        assert_eq!(record.date_of_birth.as_deref(), Some("21/05/1979"));
        assert_eq!(record.gender.as_deref(), Some("F"));
        assert_eq!(record.postal_code.as_deref(), Some("411038"));
        assert_eq!(
            record.address.as_deref(),
            Some("W/O Ravi Kumar, 12, MG Road, Near Temple, Kothrud, Pune City, Kothrud, Haveli, Pune, Maharashtra")
        );
        assert_eq!(record.masked_document_number.as_deref(), Some("XXXX XXXX 1234"));
        assert_eq!(
            record.unique_identifier,
            Some(UniqueIdentifier::Reference("1234".to_string()))
        );
        assert_eq!(record.enrollment_reference.as_deref(), Some("123420190311103045123"));
        assert_eq!(
            record.issued_at,
            NaiveDate::from_ymd_opt(2019, 3, 11).and_then(|d| d.and_hms_milli_opt(10, 30, 45, 123))
        );
        assert_eq!(record.photo, Some(photo));
        assert_eq!(record.signature.as_ref().map(Vec::len), Some(SIG_LEN));
        assert!(!record.signature_valid);
    }

    #[test]
    fn test_signature_verified_against_trust_store() {
        let (private, public) = key_pair();
        let body = build_payload(&["V2"], &text_fields("0"), &[1, 2, 3]);
        let raw = to_digits(&signed(&private, body));

        let store = CertificateTrustStore::from_keys([("uidai_2023".to_string(), public)]);
        let record = decoder(store).decode(&raw);
        assert!(record.signature_valid);
        assert_eq!(record.certificate_id.as_deref(), Some("uidai_2023"));
    }

    #[test]
    fn test_wrong_key_is_invalid_but_fields_survive() {
        let (private, _) = key_pair();
        let (_, other_public) = key_pair();
        let body = build_payload(&["V2"], &text_fields("0"), &[1, 2, 3]);
        let raw = to_digits(&signed(&private, body));

        let store = CertificateTrustStore::from_keys([("uidai_2023".to_string(), other_public)]);
        let record = decoder(store).decode(&raw);
        assert!(!record.signature_valid);
        assert_eq!(record.name.as_deref(), Some("Asha Kumari"));
    }

    #[test]
    fn test_embedded_certificate_id_selects_key() {
        let (private, public) = key_pair();
        let mut fields = vec![QrField::CertificateId];
        fields.extend_from_slice(&LEGACY_FIELDS);
        let schema = QrSchema {
            version: Some("V9".to_string()),
            fields,
            ..QrSchema::legacy()
        }
        .with_signature_len(SIG_LEN);

        let mut values = vec!["cert_b"];
        values.extend(text_fields("0"));
        let body = build_payload(&["V9"], &values, &[]);
        let raw = to_digits(&signed(&private, body));

        let store = CertificateTrustStore::from_keys([
            ("cert_a".to_string(), key_pair().1),
            ("cert_b".to_string(), public),
        ]);
        let mut table = SchemaTable::default().map_all(|s| s.with_signature_len(SIG_LEN));
        table.register(schema);
        let record = SecureQrDecoder::new(Arc::new(store)).with_schemas(table).decode(&raw);

        assert_eq!(record.version.as_deref(), Some("V9"));
        assert_eq!(record.certificate_id.as_deref(), Some("cert_b"));
        assert!(record.signature_valid);
    }

    #[test]
    fn test_noise_tolerance() {
        let (private, _) = key_pair();
        let body = build_payload(&["V3"], &text_fields("3"), &[]);
        let raw = to_digits(&signed(&private, body));

        let noisy: String = raw
            .chars()
            .enumerate()
            .flat_map(|(i, c)| match i % 40 {
                7 => vec![' ', c],
                19 => vec!['O', c, '\n'],
                _ => vec![c],
            })
            .collect();

        let decoder = decoder(CertificateTrustStore::empty());
        let clean = decoder.decode(&raw);
        let dirty = decoder.decode(&noisy);
        assert_eq!(dirty.raw_qr_data, noisy);
        assert_eq!(dirty.name, clean.name);
        assert_eq!(dirty.address, clean.address);
        assert_eq!(dirty.signature, clean.signature);
        assert!(dirty.name.is_some());
    }

    #[test]
    fn test_v3_contact_hashes_and_mobile_digits() {
        let (private, _) = key_pair();
        let email_hash = [0xaa; DEFAULT_HASH_LEN];
        let mobile_hash = [0xbb; DEFAULT_HASH_LEN];
        let mut fields = text_fields("3");
        fields.push("9876");
        let mut trailer = vec![0x01, 0x02];
        trailer.extend_from_slice(&email_hash);
        trailer.extend_from_slice(&mobile_hash);
        let body = build_payload(&["V3"], &fields, &trailer);
        let raw = to_digits(&signed(&private, body));

        let record = decoder(CertificateTrustStore::empty()).decode(&raw);
        assert_eq!(record.mobile_last_digits.as_deref(), Some("9876"));
        assert_eq!(record.email_hash, Some(email_hash.to_vec()));
        assert_eq!(record.mobile_hash, Some(mobile_hash.to_vec()));
        assert_eq!(record.photo, Some(vec![0x01, 0x02]));
    }

    #[test]
    fn test_legacy_payload_without_marker() {
        let (private, _) = key_pair();
        let body = build_payload(&[], &text_fields("2"), &[0x07; DEFAULT_HASH_LEN]);
        let raw = to_digits(&signed(&private, body));

        let record = decoder(CertificateTrustStore::empty()).decode(&raw);
        assert_eq!(record.version, None);
        assert_eq!(record.name.as_deref(), Some("Asha Kumari"));
        assert_eq!(record.mobile_hash, Some(vec![0x07; DEFAULT_HASH_LEN]));
        assert_eq!(record.email_hash, None);
        assert_eq!(record.photo, None);
    }

    #[test]
    fn test_short_payload_leaves_trailing_fields_absent() {
        let payload = build_payload(&["V2"], &["0", "123420190311103045123", "Asha"], &[]);
        let raw = to_digits(&payload);

        let record = decoder(CertificateTrustStore::empty()).decode(&raw);
        assert_eq!(record.name.as_deref(), Some("Asha"));
        assert_eq!(record.gender, None);
        assert_eq!(record.address, None);
        assert_eq!(record.signature, None);
        assert!(!record.signature_valid);
    }

    #[test]
    fn test_non_ascii_birth_date_kept_raw() {
        let payload = build_payload(&["V2"], &["0", "123420190311103045123", "Asha", "२१०५१९७९"], &[]);
        let record = decoder(CertificateTrustStore::empty()).decode(&to_digits(&payload));
        assert_eq!(record.name.as_deref(), Some("Asha"));
        assert_eq!(record.date_of_birth.as_deref(), Some("२१०५१९७९"));
    }

    #[test]
    fn test_full_identifier_form() {
        let payload = build_payload(&["V2"], &["0", "999988887777", "Asha"], &[]);
        let record = decoder(CertificateTrustStore::empty()).decode(&to_digits(&payload));
        assert_eq!(
            record.unique_identifier,
            Some(UniqueIdentifier::Full("999988887777".to_string()))
        );
        assert_eq!(record.masked_document_number.as_deref(), Some("XXXX XXXX 7777"));
        assert_eq!(record.issued_at, None);
    }

    #[test]
    fn test_decompression_limit() {
        let payload = vec![b'A'; 4096];
        let raw = to_digits(&payload);
        let limited = decoder(CertificateTrustStore::empty()).with_max_decompressed(1024);
        let record = limited.decode(&raw);
        assert_eq!(record, IdentityRecord::raw_only(&raw));
    }

    #[test]
    fn test_zlib_stream_accepted() {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello").unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(decompress(&compressed, 1024), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_sanitize_and_reconstruct() {
        assert_eq!(sanitize("12 3a4\n5"), "12345");
        assert_eq!(sanitize("no digits"), "");
        assert_eq!(reconstruct_bytes(""), None);
        assert_eq!(reconstruct_bytes("256"), Some(vec![1, 0]));
    }

    #[test]
    fn test_latin1_text_fallback() {
        assert_eq!(decode_text(&[0x4a, 0xf6, 0x72, 0x67]), "Jörg");
        assert_eq!(decode_text("Jörg".as_bytes()), "Jörg");
    }

    #[test]
    fn test_decode_is_deterministic() {
        let payload = build_payload(&["V2"], &text_fields("0"), &[9, 9]);
        let decoder = decoder(CertificateTrustStore::empty());
        let first = decoder.decode(&to_digits(&payload));
        let second = decoder.decode(&first.raw_qr_data);
        assert_eq!(first, second);
    }
}
