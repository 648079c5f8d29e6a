//! Human-readable unique code formats.
//!
//! Candidate synthesis is pure: a SHA-256 mix of the wall-clock microsecond
//! timestamp and a caller-supplied salt, mapped onto the target charset and
//! width. Uniqueness is *not* guaranteed here — the generator loop in the
//! engine probes the backing store inside the caller's open transaction and
//! retries on collision.

use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};

/// The code families the portal issues.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// `SBU-<year>-<4 digits>` — assigned when an application is created.
    ApplicationNumber,
    /// `TRX-<10 digits>` — assigned when an invoice is created.
    TransactionNumber,
    /// `SBU-KI-<year>-<5 digits>` — assigned at certificate issuance.
    CertificateNumber,
    /// `NRN-<yyyymmdd>-<8 hex>` — national registration number, assigned at
    /// certificate issuance.
    NationalRegistration,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::ApplicationNumber => "application_number",
            CodeKind::TransactionNumber => "transaction_number",
            CodeKind::CertificateNumber => "certificate_number",
            CodeKind::NationalRegistration => "national_registration_number",
        }
    }

    /// Synthesize one candidate code for this kind.
    ///
    /// Deterministic in `(now, salt)`; callers wanting fresh candidates pass a
    /// fresh random salt per attempt.
    pub fn candidate(&self, now: DateTime<Utc>, salt: u64) -> String {
        let mixed = mix(now.timestamp_micros(), salt);
        match self {
            CodeKind::ApplicationNumber => {
                format!("SBU-{}-{:04}", now.year(), mixed % 10_000)
            }
            CodeKind::TransactionNumber => {
                format!("TRX-{:010}", mixed % 10_000_000_000)
            }
            CodeKind::CertificateNumber => {
                format!("SBU-KI-{}-{:05}", now.year(), mixed % 100_000)
            }
            CodeKind::NationalRegistration => {
                format!("NRN-{}-{:08X}", now.format("%Y%m%d"), (mixed & 0xFFFF_FFFF) as u32)
            }
        }
    }
}

impl core::fmt::Display for CodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash timestamp + salt down to a u64 of entropy.
fn mix(micros: i64, salt: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(micros.to_le_bytes());
    hasher.update(salt.to_le_bytes());
    let digest = hasher.finalize();
    u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn application_number_format() {
        let code = CodeKind::ApplicationNumber.candidate(fixed_now(), 1);
        assert!(code.starts_with("SBU-2025-"));
        let digits = code.strip_prefix("SBU-2025-").unwrap();
        assert_eq!(digits.len(), 4);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn transaction_number_format() {
        let code = CodeKind::TransactionNumber.candidate(fixed_now(), 2);
        let digits = code.strip_prefix("TRX-").unwrap();
        assert_eq!(digits.len(), 10);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn certificate_number_format() {
        let code = CodeKind::CertificateNumber.candidate(fixed_now(), 3);
        let digits = code.strip_prefix("SBU-KI-2025-").unwrap();
        assert_eq!(digits.len(), 5);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn national_registration_format() {
        let code = CodeKind::NationalRegistration.candidate(fixed_now(), 4);
        let hex = code.strip_prefix("NRN-20250314-").unwrap();
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn deterministic_in_time_and_salt() {
        let a = CodeKind::TransactionNumber.candidate(fixed_now(), 42);
        let b = CodeKind::TransactionNumber.candidate(fixed_now(), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn different_salts_give_different_candidates() {
        let a = CodeKind::TransactionNumber.candidate(fixed_now(), 1);
        let b = CodeKind::TransactionNumber.candidate(fixed_now(), 2);
        assert_ne!(a, b);
    }
}
