// ABOUTME: File naming convention for per-CA keypairs and certificates.
// ABOUTME: Derives {ssh_dir}/{ca}_rsa, {ca}_rsa.pub and {ca}_rsa-cert.pub.

use crate::error::{Result, SshError};
use std::path::{Path, PathBuf};

/// Get the user's SSH directory (~/.ssh).
pub fn default_ssh_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ssh"))
        .ok_or(SshError::NoHomeDirectory)
}

/// The three files that belong to one CA name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
    pub certificate: PathBuf,
}

impl KeyPaths {
    pub fn new(ssh_dir: &Path, ca_name: &str) -> Self {
        Self {
            private_key: ssh_dir.join(format!("{ca_name}_rsa")),
            public_key: ssh_dir.join(format!("{ca_name}_rsa.pub")),
            certificate: ssh_dir.join(format!("{ca_name}_rsa-cert.pub")),
        }
    }

    /// File name used when uploading the public key.
    pub fn public_key_file_name(&self) -> String {
        self.public_key
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "id_rsa.pub".to_string())
    }
}
