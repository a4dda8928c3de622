// ABOUTME: Per-CA keypair, certificate file, and agent identity management.
// ABOUTME: Wraps a KeyGenerator and KeyAgent with the ~/.ssh/{ca}_rsa naming convention.

use crate::error::{Result, SshError};
use crate::paths::{default_ssh_dir, KeyPaths};
use crate::tooling::{KeyAgent, KeyGenerator, SshAdd, SshKeygen};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Local key material for every CA name, rooted at one SSH directory.
#[derive(Debug)]
pub struct LocalKeys<G, A> {
    ssh_dir: PathBuf,
    generator: G,
    agent: A,
}

impl LocalKeys<SshKeygen, SshAdd> {
    /// Uses `~/.ssh` with the OpenSSH command-line tools.
    pub fn openssh() -> Result<Self> {
        Ok(Self::new(
            default_ssh_dir()?,
            SshKeygen::default(),
            SshAdd::default(),
        ))
    }
}

impl<G: KeyGenerator, A: KeyAgent> LocalKeys<G, A> {
    pub fn new(ssh_dir: impl Into<PathBuf>, generator: G, agent: A) -> Self {
        Self {
            ssh_dir: ssh_dir.into(),
            generator,
            agent,
        }
    }

    pub fn ssh_dir(&self) -> &Path {
        &self.ssh_dir
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn paths(&self, ca_name: &str) -> KeyPaths {
        KeyPaths::new(&self.ssh_dir, ca_name)
    }

    /// Generate a keypair for `ca_name` unless its public key is already on disk.
    ///
    /// A present public key is taken as proof of the whole pair, even when the
    /// private key has been removed separately. Returns `true` when a new pair
    /// was generated.
    ///
    /// # Errors
    /// Returns an error if the SSH directory cannot be created or generation fails.
    pub fn ensure_keypair_exists(&self, ca_name: &str) -> Result<bool> {
        let paths = self.paths(ca_name);
        if paths.public_key.is_file() {
            debug!(path = %paths.public_key.display(), "public key already present");
            return Ok(false);
        }

        self.ensure_ssh_dir()?;
        self.generator.generate(&paths.private_key)?;

        if !paths.public_key.is_file() {
            return Err(SshError::MissingPublicKey {
                path: paths.public_key,
            });
        }

        info!(ca = ca_name, "generated new keypair");
        Ok(true)
    }

    /// Read the public key file contents for upload.
    pub fn read_public_key(&self, ca_name: &str) -> Result<Vec<u8>> {
        let path = self.paths(ca_name).public_key;
        std::fs::read(&path).map_err(|e| SshError::ReadPublicKey { path, source: e })
    }

    /// Overwrite the certificate for `ca_name` with `payload`.
    pub fn write_certificate(&self, ca_name: &str, payload: &str) -> Result<PathBuf> {
        let path = self.paths(ca_name).certificate;
        std::fs::write(&path, payload.as_bytes()).map_err(|e| SshError::WriteCertificate {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), bytes = payload.len(), "certificate written");
        Ok(path)
    }

    pub fn agent_identity_count(&self) -> Result<usize> {
        self.agent.identity_count()
    }

    pub fn remove_identity(&self, ca_name: &str) -> Result<()> {
        self.agent.remove(&self.paths(ca_name).private_key)
    }

    pub fn add_identity(&self, ca_name: &str) -> Result<()> {
        self.agent.add(&self.paths(ca_name).private_key)
    }

    fn ensure_ssh_dir(&self) -> Result<()> {
        if self.ssh_dir.is_dir() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.ssh_dir).map_err(|e| SshError::CreateDirectory {
            path: self.ssh_dir.clone(),
            source: e,
        })?;

        // ssh refuses keys from a group or world readable directory (0700 = rwx------)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.ssh_dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| SshError::SetPermissions {
                    path: self.ssh_dir.clone(),
                    source: e,
                })?;
        }

        Ok(())
    }
}
