//! Salted password hash records.
//!
//! The directory stores door passwords in the classic LDAP userPassword
//! scheme notation:
//!
//! ```text
//! {SSHA512}base64(digest ‖ salt)
//! ```
//!
//! The tag between braces names the digest algorithm, case-insensitively,
//! with an optional leading `s` marking the salted variant (`SSHA512` and
//! `SHA512` parse identically; the salt is whatever bytes follow the digest
//! either way, possibly none). The base64 payload is the fixed-size digest
//! immediately followed by the salt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{DirectoryError, DirectoryResult};

/// Digest algorithms accepted in hash records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    /// Tagged `SHA` in record notation.
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms, in tag order.
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Parse a record tag, case-insensitively.
    ///
    /// The leading `s` of the salted variants (`SMD5`, `SSHA`, `SSHA512`,
    /// ...) is accepted and ignored; salt presence is determined by the
    /// payload length alone.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        fn bare(tag: &str) -> Option<HashAlgorithm> {
            match tag {
                "md5" => Some(HashAlgorithm::Md5),
                "sha" => Some(HashAlgorithm::Sha1),
                "sha256" => Some(HashAlgorithm::Sha256),
                "sha384" => Some(HashAlgorithm::Sha384),
                "sha512" => Some(HashAlgorithm::Sha512),
                _ => None,
            }
        }

        let tag = tag.to_ascii_lowercase();
        bare(&tag).or_else(|| tag.strip_prefix('s').and_then(bare))
    }

    /// The canonical record tag (salted variant, upper case).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "SMD5",
            HashAlgorithm::Sha1 => "SSHA",
            HashAlgorithm::Sha256 => "SSHA256",
            HashAlgorithm::Sha384 => "SSHA384",
            HashAlgorithm::Sha512 => "SSHA512",
        }
    }

    /// Fixed digest output size in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Compute the digest of `data`.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A decoded password hash record: algorithm, digest, and trailing salt.
///
/// Invariant: `digest.len()` always equals `algorithm.digest_len()`; the
/// salt is whatever remained after the digest and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
    salt: Vec<u8>,
}

impl HashRecord {
    /// Construct a record from raw parts, enforcing the digest-length
    /// invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if the digest is not exactly the algorithm's output
    /// size.
    pub fn new(
        algorithm: HashAlgorithm,
        digest: Vec<u8>,
        salt: Vec<u8>,
    ) -> DirectoryResult<Self> {
        if digest.len() != algorithm.digest_len() {
            return Err(DirectoryError::invalid_record(format!(
                "digest must be {} bytes for {}, got {}",
                algorithm.digest_len(),
                algorithm,
                digest.len()
            )));
        }
        Ok(Self {
            algorithm,
            digest,
            salt,
        })
    }

    /// Hash `password` with `salt` under `algorithm` and build the record.
    ///
    /// Used for provisioning directory entries and for test fixtures.
    #[must_use]
    pub fn from_password(algorithm: HashAlgorithm, password: &str, salt: &[u8]) -> Self {
        let mut input = Vec::with_capacity(password.len() + salt.len());
        input.extend_from_slice(password.as_bytes());
        input.extend_from_slice(salt);
        Self {
            algorithm,
            digest: algorithm.digest(&input),
            salt: salt.to_vec(),
        }
    }

    /// Parse the directory attribute notation `{TAG}base64(digest‖salt)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the braces are missing, the tag is not a
    /// supported algorithm, the payload is not valid base64, or the decoded
    /// payload is shorter than the algorithm's digest size.
    pub fn parse(value: &str) -> DirectoryResult<Self> {
        let rest = value
            .strip_prefix('{')
            .ok_or_else(|| DirectoryError::invalid_record("missing leading '{'"))?;
        let (tag, payload) = rest
            .split_once('}')
            .ok_or_else(|| DirectoryError::invalid_record("missing closing '}'"))?;

        let algorithm = HashAlgorithm::from_tag(tag)
            .ok_or_else(|| DirectoryError::UnsupportedAlgorithm(tag.to_string()))?;

        let decoded = BASE64
            .decode(payload)
            .map_err(|e| DirectoryError::invalid_record(format!("invalid base64: {e}")))?;

        let digest_len = algorithm.digest_len();
        if decoded.len() < digest_len {
            return Err(DirectoryError::invalid_record(format!(
                "payload holds {} bytes, {} digest needs {}",
                decoded.len(),
                algorithm,
                digest_len
            )));
        }

        let (digest, salt) = decoded.split_at(digest_len);
        Ok(Self {
            algorithm,
            digest: digest.to_vec(),
            salt: salt.to_vec(),
        })
    }

    /// Serialize back to the directory attribute notation, with the
    /// canonical upper-case salted tag.
    #[must_use]
    pub fn to_attribute_value(&self) -> String {
        let mut payload = Vec::with_capacity(self.digest.len() + self.salt.len());
        payload.extend_from_slice(&self.digest);
        payload.extend_from_slice(&self.salt);
        format!("{{{}}}{}", self.algorithm.tag(), BASE64.encode(payload))
    }

    /// Verify `password` against the stored digest.
    ///
    /// Recomputes `HASH(password ‖ salt)` and compares it in constant time;
    /// the comparison never short-circuits on the first mismatching byte.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let mut input = Vec::with_capacity(password.len() + self.salt.len());
        input.extend_from_slice(password.as_bytes());
        input.extend_from_slice(&self.salt);
        let computed = self.algorithm.digest(&input);
        computed.ct_eq(&self.digest).into()
    }

    /// The record's digest algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The trailing salt bytes (may be empty).
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HashAlgorithm::Md5, 16)]
    #[case(HashAlgorithm::Sha1, 20)]
    #[case(HashAlgorithm::Sha256, 32)]
    #[case(HashAlgorithm::Sha384, 48)]
    #[case(HashAlgorithm::Sha512, 64)]
    fn digest_len_matches_output(#[case] algorithm: HashAlgorithm, #[case] len: usize) {
        assert_eq!(algorithm.digest_len(), len);
        assert_eq!(algorithm.digest(b"probe").len(), len);
    }

    #[rstest]
    #[case("md5", HashAlgorithm::Md5)]
    #[case("MD5", HashAlgorithm::Md5)]
    #[case("smd5", HashAlgorithm::Md5)]
    #[case("sha", HashAlgorithm::Sha1)]
    #[case("SSHA", HashAlgorithm::Sha1)]
    #[case("sha256", HashAlgorithm::Sha256)]
    #[case("Ssha384", HashAlgorithm::Sha384)]
    #[case("SSHA512", HashAlgorithm::Sha512)]
    #[case("sha512", HashAlgorithm::Sha512)]
    fn tag_parsing(#[case] tag: &str, #[case] expected: HashAlgorithm) {
        assert_eq!(HashAlgorithm::from_tag(tag), Some(expected));
    }

    #[rstest]
    #[case("sha3")]
    #[case("ssha1024")]
    #[case("crypt")]
    #[case("")]
    #[case("s")]
    fn unknown_tags_rejected(#[case] tag: &str) {
        assert_eq!(HashAlgorithm::from_tag(tag), None);
    }

    #[rstest]
    #[case(HashAlgorithm::Md5)]
    #[case(HashAlgorithm::Sha1)]
    #[case(HashAlgorithm::Sha256)]
    #[case(HashAlgorithm::Sha384)]
    #[case(HashAlgorithm::Sha512)]
    fn round_trip_verifies(#[case] algorithm: HashAlgorithm) {
        let record = HashRecord::from_password(algorithm, "correct horse", b"pepper");
        let reparsed = HashRecord::parse(&record.to_attribute_value()).unwrap();

        assert_eq!(reparsed, record);
        assert!(reparsed.verify("correct horse"));
        assert!(!reparsed.verify("correct horsf"));
        assert!(!reparsed.verify(""));
    }

    #[test]
    fn empty_salt_round_trip() {
        let record = HashRecord::from_password(HashAlgorithm::Sha512, "secret", b"");
        let reparsed = HashRecord::parse(&record.to_attribute_value()).unwrap();

        assert!(reparsed.salt().is_empty());
        assert!(reparsed.verify("secret"));
        assert!(!reparsed.verify("Secret"));
    }

    #[test]
    fn salted_and_bare_tags_parse_identically() {
        let record = HashRecord::from_password(HashAlgorithm::Sha512, "secret", b"NaCl");
        let salted = record.to_attribute_value();
        let bare = salted.replacen("{SSHA512}", "{sha512}", 1);

        let a = HashRecord::parse(&salted).unwrap();
        let b = HashRecord::parse(&bare).unwrap();
        assert_eq!(a, b);
    }

    #[rstest]
    #[case("SSHA512}payload")] // no opening brace
    #[case("{SSHA512 payload")] // no closing brace
    #[case("{SSHA512}not!!base64")] // bad encoding
    fn malformed_records_rejected(#[case] value: &str) {
        assert!(matches!(
            HashRecord::parse(value),
            Err(DirectoryError::InvalidHashRecord(_))
        ));
    }

    #[test]
    fn unsupported_algorithm_rejected() {
        let err = HashRecord::parse("{CRYPT}YWJjZGVm").unwrap_err();
        assert!(matches!(err, DirectoryError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn truncated_payload_rejected() {
        // 8 bytes of payload cannot hold a 64-byte SHA-512 digest.
        let value = format!("{{SSHA512}}{}", BASE64.encode([0u8; 8]));
        assert!(matches!(
            HashRecord::parse(&value),
            Err(DirectoryError::InvalidHashRecord(_))
        ));
    }

    #[test]
    fn new_enforces_digest_length() {
        let err =
            HashRecord::new(HashAlgorithm::Sha256, vec![0u8; 31], vec![]).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidHashRecord(_)));

        let ok = HashRecord::new(HashAlgorithm::Sha256, vec![0u8; 32], vec![1, 2]);
        assert!(ok.is_ok());
    }

    #[test]
    fn equal_length_mismatch_rejected() {
        // Same-length forged digest must still fail; the constant-time
        // comparison walks every byte either way.
        let record = HashRecord::from_password(HashAlgorithm::Sha256, "secret", b"salt");
        let mut forged_digest = record.algorithm().digest(b"other input");
        forged_digest.truncate(record.algorithm().digest_len());
        let forged =
            HashRecord::new(HashAlgorithm::Sha256, forged_digest, record.salt().to_vec())
                .unwrap();
        assert!(!forged.verify("secret"));
    }

    #[test]
    fn salt_changes_digest() {
        let a = HashRecord::from_password(HashAlgorithm::Sha512, "secret", b"salt-a");
        let b = HashRecord::from_password(HashAlgorithm::Sha512, "secret", b"salt-b");
        assert_ne!(a.to_attribute_value(), b.to_attribute_value());
        assert!(a.verify("secret"));
        assert!(b.verify("secret"));
    }
}
