// ABOUTME: Error types for local SSH key and agent operations using thiserror.
// ABOUTME: Separates the actionable agent-unavailable case from plain I/O failures.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while managing local keys and the SSH agent.
#[derive(Error, Debug)]
pub enum SshError {
    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// Failed to create a directory.
    #[error("failed to create directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set file permissions.
    #[error("failed to set permissions on {path}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a public key from disk.
    #[error("failed to read public key from {path}")]
    ReadPublicKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a certificate to disk.
    #[error("failed to write certificate to {path}")]
    WriteCertificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local tool could not be started at all.
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Key generation exited unsuccessfully.
    #[error("ssh-keygen failed for {path} ({status})")]
    KeyGeneration { path: PathBuf, status: String },

    /// Key generation reported success but left no public key behind.
    #[error("ssh-keygen did not produce a public key at {path}")]
    MissingPublicKey { path: PathBuf },

    /// The SSH agent could not be reached.
    #[error("Unable to access SSH keychain. Please run 'eval `ssh-agent -s`'")]
    AgentUnavailable,
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
