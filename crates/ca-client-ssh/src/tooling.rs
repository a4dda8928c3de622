// ABOUTME: Capability traits over local SSH tooling and their OpenSSH implementations.
// ABOUTME: ssh-keygen creates keypairs; ssh-add counts, loads and unloads agent identities.

use crate::error::{Result, SshError};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// `ssh-add` exit status when it cannot talk to an agent.
const AGENT_UNREACHABLE: i32 = 2;

/// `ssh-add -l` exit status when the agent holds no identities.
const AGENT_EMPTY: i32 = 1;

/// Produces a passphrase-less keypair at a given private key path.
pub trait KeyGenerator {
    /// Writes `path` and `path.pub`.
    fn generate(&self, private_key: &Path) -> Result<()>;
}

/// Control surface of a running SSH agent.
pub trait KeyAgent {
    /// Number of identities currently loaded.
    fn identity_count(&self) -> Result<usize>;

    /// Loads the identity (and any sibling certificate) for a private key.
    fn add(&self, private_key: &Path) -> Result<()>;

    /// Unloads the identity for a private key. Absent identities are not an error.
    fn remove(&self, private_key: &Path) -> Result<()>;
}

/// [`KeyGenerator`] backed by the `ssh-keygen` binary.
#[derive(Debug, Clone)]
pub struct SshKeygen {
    program: PathBuf,
}

impl SshKeygen {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SshKeygen {
    fn default() -> Self {
        Self::with_program("ssh-keygen")
    }
}

impl KeyGenerator for SshKeygen {
    fn generate(&self, private_key: &Path) -> Result<()> {
        debug!(path = %private_key.display(), "generating keypair");

        let status = Command::new(&self.program)
            .args(["-t", "rsa", "-q", "-N", ""])
            .arg("-f")
            .arg(private_key)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| spawn_error(&self.program, e))?;

        if !status.success() {
            return Err(SshError::KeyGeneration {
                path: private_key.to_path_buf(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}

/// [`KeyAgent`] backed by the `ssh-add` binary and the agent named in `SSH_AUTH_SOCK`.
#[derive(Debug, Clone)]
pub struct SshAdd {
    program: PathBuf,
}

impl SshAdd {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SshAdd {
    fn default() -> Self {
        Self::with_program("ssh-add")
    }
}

impl KeyAgent for SshAdd {
    fn identity_count(&self) -> Result<usize> {
        let output = Command::new(&self.program)
            .arg("-l")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(&self.program, e))?;

        parse_identity_listing(output.status.code(), &output.stdout)
    }

    fn add(&self, private_key: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg(private_key)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| spawn_error(&self.program, e))?;

        check_agent_status(status.code())?;
        if !status.success() {
            warn!(path = %private_key.display(), %status, "ssh-add did not load identity");
        }
        Ok(())
    }

    fn remove(&self, private_key: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("-d")
            .arg(private_key)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| spawn_error(&self.program, e))?;

        check_agent_status(status.code())?;
        if !status.success() {
            debug!(path = %private_key.display(), %status, "identity was not loaded");
        }
        Ok(())
    }
}

/// Interprets the result of `ssh-add -l`.
///
/// Every listed identity is one line of stdout. "The agent has no identities"
/// comes with exit status 1 and counts as zero.
pub(crate) fn parse_identity_listing(code: Option<i32>, stdout: &[u8]) -> Result<usize> {
    match code {
        Some(AGENT_UNREACHABLE) => Err(SshError::AgentUnavailable),
        Some(AGENT_EMPTY) => Ok(0),
        _ => Ok(String::from_utf8_lossy(stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .count()),
    }
}

/// Maps the agent-unreachable exit status to an error; every other status passes.
pub(crate) fn check_agent_status(code: Option<i32>) -> Result<()> {
    match code {
        Some(AGENT_UNREACHABLE) => Err(SshError::AgentUnavailable),
        _ => Ok(()),
    }
}

fn spawn_error(program: &Path, source: std::io::Error) -> SshError {
    SshError::Spawn {
        program: program.display().to_string(),
        source,
    }
}
