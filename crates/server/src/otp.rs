//! In-process one-time-code registry for the registration handshake.
//!
//! One live code per email; issuing replaces the previous entry. Codes
//! expire after ten minutes and must be verified before registration
//! consumes them. Storage is process-local and not part of the
//! client-visible contract.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

const OTP_TTL_MINUTES: i64 = 10;

#[derive(Clone, Debug)]
struct OtpEntry {
    code: String,
    expires_at: DateTime<Utc>,
    verified: bool,
}

#[derive(Default)]
pub struct OtpService {
    entries: std::sync::Mutex<HashMap<String, OtpEntry>>,
}

impl OtpService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh 6-digit code for an email, replacing any previous one.
    pub fn issue(&self, email: &str, now: DateTime<Utc>) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        entries.insert(
            email.to_string(),
            OtpEntry {
                code: code.clone(),
                expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
                verified: false,
            },
        );
        code
    }

    /// Check a submitted code and mark the email verified on success.
    pub fn verify(&self, email: &str, code: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        match entries.get_mut(email) {
            Some(entry) if entry.code == code && entry.expires_at > now => {
                entry.verified = true;
                true
            }
            _ => false,
        }
    }

    /// Consume a verified, unexpired entry; registration calls this once.
    pub fn take_verified(&self, email: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        match entries.get(email) {
            Some(entry) if entry.verified && entry.expires_at > now => {
                entries.remove(email);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn verify_accepts_the_issued_code_once_registered() {
        let otp = OtpService::new();
        let code = otp.issue("a@example.com", now());
        assert!(otp.verify("a@example.com", &code, now()));
        assert!(otp.take_verified("a@example.com", now()));
        // Consumed: a second registration attempt fails.
        assert!(!otp.take_verified("a@example.com", now()));
    }

    #[test]
    fn verify_rejects_wrong_or_foreign_codes() {
        let otp = OtpService::new();
        let code = otp.issue("a@example.com", now());
        assert!(!otp.verify("a@example.com", "000000", now()));
        assert!(!otp.verify("b@example.com", &code, now()));
    }

    #[test]
    fn codes_expire_after_ttl() {
        let otp = OtpService::new();
        let code = otp.issue("a@example.com", now());
        let late = now() + Duration::minutes(OTP_TTL_MINUTES + 1);
        assert!(!otp.verify("a@example.com", &code, late));
    }

    #[test]
    fn reissue_replaces_the_previous_code() {
        let otp = OtpService::new();
        let first = otp.issue("a@example.com", now());
        let second = otp.issue("a@example.com", now());
        if first != second {
            assert!(!otp.verify("a@example.com", &first, now()));
        }
        assert!(otp.verify("a@example.com", &second, now()));
    }

    #[test]
    fn unverified_entries_cannot_register() {
        let otp = OtpService::new();
        otp.issue("a@example.com", now());
        assert!(!otp.take_verified("a@example.com", now()));
    }
}
