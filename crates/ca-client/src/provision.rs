// ABOUTME: Certificate provisioning workflow: keypair, signing, certificate file, agent refresh
// ABOUTME: Linear pipeline that stops at the first failure and never retries

use ca_client_ssh::{CertificateSummary, KeyAgent, KeyGenerator, KeyPaths, LocalKeys, SshError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, CertificateSigner, Credentials, PublicKeyUpload};

/// Most identities the agent may already hold before we load another one.
pub const MAX_LOADED_IDENTITIES: usize = 3;

/// ssh offers agent identities in turn and servers give up after this many attempts.
pub const AGENT_IDENTITY_LIMIT: usize = 5;

/// Steps of the workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    KeyEnsured,
    Signed,
    CertWritten,
    AgentUpdated,
    AgentSkipped,
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("failed to prepare keypair for CA {ca}")]
    Keypair {
        ca: String,
        #[source]
        source: SshError,
    },

    #[error(transparent)]
    Sign(ApiError),

    #[error(transparent)]
    Agent(SshError),

    #[error(transparent)]
    Store(SshError),

    /// The certificate is on disk but the agent could not be refreshed.
    #[error(transparent)]
    AgentRefresh(SshError),
}

impl ProvisionError {
    /// Last stage completed before the failure.
    pub fn stage(&self) -> Stage {
        match self {
            ProvisionError::Keypair { .. } => Stage::Init,
            ProvisionError::Sign(_) => Stage::KeyEnsured,
            ProvisionError::Agent(_) | ProvisionError::Store(_) => Stage::Signed,
            ProvisionError::AgentRefresh(_) => Stage::CertWritten,
        }
    }
}

/// What happened to the agent after the certificate was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOutcome {
    Loaded,
    /// The agent already held `loaded` identities, more than [`MAX_LOADED_IDENTITIES`].
    Skipped { loaded: usize },
}

/// Result of a successful provisioning run.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub ca_name: String,
    pub paths: KeyPaths,
    pub key_generated: bool,
    pub agent: AgentOutcome,
    pub summary: Option<CertificateSummary>,
}

impl Provisioned {
    pub fn stage(&self) -> Stage {
        match self.agent {
            AgentOutcome::Loaded => Stage::AgentUpdated,
            AgentOutcome::Skipped { .. } => Stage::AgentSkipped,
        }
    }
}

/// Obtains a fresh certificate for `ca_name` and loads it into the agent if there is room.
///
/// The certificate is written before the agent capacity check, so a full agent
/// still leaves a usable certificate on disk.
///
/// # Errors
/// Fails without touching the certificate file or the agent when key
/// preparation or signing fails. An unreachable agent aborts the run.
pub async fn provision<S, G, A>(
    signer: &S,
    keys: &LocalKeys<G, A>,
    ca_name: &str,
    credentials: &Credentials,
) -> Result<Provisioned, ProvisionError>
where
    S: CertificateSigner + ?Sized,
    G: KeyGenerator,
    A: KeyAgent,
{
    let paths = keys.paths(ca_name);
    let keypair_error = |source| ProvisionError::Keypair {
        ca: ca_name.to_string(),
        source,
    };

    let key_generated = keys.ensure_keypair_exists(ca_name).map_err(keypair_error)?;
    let contents = keys.read_public_key(ca_name).map_err(keypair_error)?;
    debug!(stage = ?Stage::KeyEnsured, ca = ca_name, key_generated);

    let upload = PublicKeyUpload {
        file_name: paths.public_key_file_name(),
        contents,
    };
    let payload = signer
        .sign(ca_name, credentials, upload)
        .await
        .map_err(ProvisionError::Sign)?;
    debug!(stage = ?Stage::Signed, ca = ca_name);

    // An identity left in the agent would keep pointing at the previous certificate.
    keys.remove_identity(ca_name).map_err(ProvisionError::Agent)?;
    keys.write_certificate(ca_name, &payload).map_err(ProvisionError::Store)?;
    debug!(stage = ?Stage::CertWritten, path = %paths.certificate.display());

    let loaded = keys
        .agent_identity_count()
        .map_err(ProvisionError::AgentRefresh)?;

    let agent = if loaded > MAX_LOADED_IDENTITIES {
        warn!(loaded, limit = MAX_LOADED_IDENTITIES, "agent full, identity not loaded");
        AgentOutcome::Skipped { loaded }
    } else {
        keys.add_identity(ca_name)
            .map_err(ProvisionError::AgentRefresh)?;
        info!(ca = ca_name, "identity loaded into agent");
        AgentOutcome::Loaded
    };

    Ok(Provisioned {
        ca_name: ca_name.to_string(),
        summary: CertificateSummary::parse(&payload),
        paths,
        key_generated,
        agent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_leaves_headroom_below_agent_limit() {
        assert!(MAX_LOADED_IDENTITIES < AGENT_IDENTITY_LIMIT);
    }

    #[test]
    fn test_error_stages() {
        let err = ProvisionError::Sign(ApiError::MissingPayload {
            url: "http://ca/sign".to_string(),
        });
        assert_eq!(err.stage(), Stage::KeyEnsured);

        let err = ProvisionError::Agent(SshError::AgentUnavailable);
        assert_eq!(err.stage(), Stage::Signed);
        assert!(err.to_string().contains("ssh-agent -s"));

        let err = ProvisionError::AgentRefresh(SshError::AgentUnavailable);
        assert_eq!(err.stage(), Stage::CertWritten);
    }
}
