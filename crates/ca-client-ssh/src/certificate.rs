// ABOUTME: Best-effort inspection of signed certificates returned by the CA.
// ABOUTME: Extracts key id, principals and validity window for display.

use chrono::DateTime;
use ssh_key::Certificate;

/// What an operator wants to know about a freshly issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub key_id: String,
    pub principals: Vec<String>,
    pub valid_after: u64,
    pub valid_before: u64,
}

impl CertificateSummary {
    /// Parse an OpenSSH certificate line. Returns `None` for anything else;
    /// the CA payload is opaque and does not have to be a certificate line.
    pub fn parse(payload: &str) -> Option<Self> {
        let cert = Certificate::from_openssh(payload.trim()).ok()?;
        Some(Self {
            key_id: cert.key_id().to_string(),
            principals: cert.valid_principals().to_vec(),
            valid_after: cert.valid_after(),
            valid_before: cert.valid_before(),
        })
    }

    /// Expiry rendered in UTC, or "never" for certificates without an upper bound.
    pub fn expires(&self) -> String {
        if self.valid_before == u64::MAX {
            return "never".to_string();
        }
        i64::try_from(self.valid_before)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| self.valid_before.to_string())
    }
}
