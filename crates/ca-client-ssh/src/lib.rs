// ABOUTME: Local SSH side of ca-client: keypairs, certificate files and the ssh-agent.
// ABOUTME: Re-exports the key store, tooling traits and error types.

//! # ca-client-ssh
//!
//! Everything `ca-client` does on the local machine. Each CA name owns three
//! files in `~/.ssh`:
//!
//! ```text
//! ~/.ssh/{ca}_rsa           private key (generated once, no passphrase)
//! ~/.ssh/{ca}_rsa.pub       public key uploaded for signing
//! ~/.ssh/{ca}_rsa-cert.pub  certificate, replaced on every signing
//! ```
//!
//! Key generation and agent control go through the [`KeyGenerator`] and
//! [`KeyAgent`] traits so callers can substitute them in tests.

mod certificate;
mod error;
mod keystore;
mod paths;
mod tooling;

pub use certificate::CertificateSummary;
pub use error::{Result, SshError};
pub use keystore::LocalKeys;
pub use paths::{default_ssh_dir, KeyPaths};
pub use tooling::{KeyAgent, KeyGenerator, SshAdd, SshKeygen};
