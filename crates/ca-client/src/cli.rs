// ABOUTME: Command-line front end: flag parsing, user/password resolution and dispatch
// ABOUTME: Renders server answers and the provisioning report for the operator

use anyhow::{Context, Result};
use ca_client_ssh::{KeyAgent, KeyGenerator, LocalKeys};
use clap::{ArgGroup, Parser};
use colored::Colorize;
use dialoguer::Password;
use std::path::PathBuf;
use tracing::debug;

use crate::api::{ApiError, CaInfo, CaServerClient, Credentials, Role};
use crate::config::{ConfigStore, CONFIG_ENV};
use crate::provision::{provision, AgentOutcome, Provisioned, AGENT_IDENTITY_LIMIT};

/// Environment variables consulted for the login name, in order.
const LOGIN_NAME_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

#[derive(Parser)]
#[command(
    name = "ca-client",
    about = "Tool to sign your public SSH key",
    version,
    group(ArgGroup::new("action").multiple(false))
)]
pub struct Cli {
    /// Certificate signing request against CA
    #[arg(short = 's', long, value_name = "CA", group = "action")]
    pub sign: Option<String>,

    /// Optional username for signing request (defaults to the login name)
    #[arg(short = 'u', long, value_name = "NAME")]
    pub user: Option<String>,

    /// List my authorized roles
    #[arg(short = 'r', long, group = "action")]
    pub list_roles: bool,

    /// List available CAs
    #[arg(short = 'c', long, group = "action")]
    pub list_cas: bool,

    /// Show the public key of CA
    #[arg(short = 'k', long, value_name = "CA", group = "action")]
    pub get_key: Option<String>,

    /// Optional password for signing request (prompted for when absent)
    #[arg(
        short = 'p',
        long,
        value_name = "PASS",
        env = "CA_CLIENT_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Configuration file (defaults to ~/.ca-client/config.json)
    #[arg(long, value_name = "PATH", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// What one invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Sign(String),
    ListRoles,
    ListCas,
    GetKey(String),
}

impl Cli {
    /// Selected action; signing against `default_ca` when nothing was chosen.
    pub fn action(&self, default_ca: &str) -> Action {
        if self.list_roles {
            Action::ListRoles
        } else if self.list_cas {
            Action::ListCas
        } else if let Some(ca) = &self.get_key {
            Action::GetKey(ca.clone())
        } else {
            Action::Sign(
                self.sign
                    .clone()
                    .unwrap_or_else(|| default_ca.to_string()),
            )
        }
    }
}

/// Full invocation: configuration, health check, then the selected action.
pub async fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::resolve(cli.config.clone())?;
    let config = store.load_or_prompt()?;
    println!("Loading configuration from {}", store.path().display());

    let server = CaServerClient::connect(&config.base_url).await?;

    let username = resolve_username(cli.user.clone())?;
    let action = cli.action(&config.default_ca);

    let keys = LocalKeys::openssh()?;
    execute(&server, &keys, action, &username, cli.password).await
}

/// Runs one action against a server that already passed its health check.
///
/// Server-reported errors are shown and treated as success, except while
/// signing where they fail the run.
pub async fn execute<G: KeyGenerator, A: KeyAgent>(
    server: &CaServerClient,
    keys: &LocalKeys<G, A>,
    action: Action,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    match action {
        Action::ListRoles => show(server.list_roles(username).await, print_roles),
        Action::ListCas => show(server.list_cas().await, print_cas),
        Action::GetKey(ca) => show(server.get_public_key(&ca).await, print_public_key),
        Action::Sign(ca) => {
            let password = match given_password(password) {
                Some(password) => password,
                None => prompt_password(username)?,
            };
            let credentials = Credentials::new(username, password);
            let provisioned = provision(server, keys, &ca, &credentials)
                .await
                .inspect_err(|e| debug!(stage = ?e.stage(), "provisioning stopped"))?;
            debug!(stage = ?provisioned.stage(), "provisioning finished");
            print_provisioned(&provisioned);
            Ok(())
        }
    }
}

/// Login name from the environment, unless one was given explicitly.
pub fn resolve_username(explicit: Option<String>) -> Result<String> {
    if let Some(user) = explicit {
        return Ok(user);
    }
    LOGIN_NAME_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.is_empty())
        .context("Could not determine username. Use --user to provide one.")
}

/// A password passed on the command line; an empty one still prompts.
fn given_password(explicit: Option<String>) -> Option<String> {
    explicit.filter(|password| !password.is_empty())
}

fn prompt_password(username: &str) -> Result<String> {
    Password::new()
        .with_prompt(format!("Please enter password for {}", username))
        .interact()
        .context("Failed to read password")
}

fn show<T>(result: std::result::Result<T, ApiError>, render: impl FnOnce(T)) -> Result<()> {
    match result {
        Ok(value) => {
            render(value);
            Ok(())
        }
        Err(ApiError::Server(e)) => {
            println!();
            println!("{}", e.message);
            println!();
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_roles(roles: Vec<Role>) {
    if roles.is_empty() {
        println!();
        println!("currently have no roles assigned to you.");
        println!();
        return;
    }

    for role in roles {
        println!();
        println!("{} {}", "Role:              ".dimmed(), role.name.bold());
        println!(
            "{} {}",
            "Description:       ".dimmed(),
            role.description.unwrap_or_default()
        );
        println!(
            "{} {}",
            "Allowed Principals:".dimmed(),
            role.allowed_principals.join(", ")
        );
        println!(
            "{} {}",
            "Allowed CAs:       ".dimmed(),
            role.allowed_cas.join(", ")
        );
    }
    println!();
}

fn print_cas(cas: Vec<CaInfo>) {
    for ca in cas {
        println!();
        println!("{} {}", "CA name:     ".dimmed(), ca.name.bold());
        println!("{} {}", "Max duration:".dimmed(), ca.max_duration);
    }
    println!();
}

fn print_public_key(key: String) {
    println!();
    println!("Update /etc/ssh/sshd_config on remote host to include:");
    println!();
    println!("    {}", "TrustedUserCAKeys /etc/ssh/user_ca.pub".cyan());
    println!();
    println!("Add the following to /etc/ssh/user_ca.pub:");
    println!();
    println!("    {}", format!("ssh-rsa {}", key).cyan());
    println!();
    println!(
        "You can login if the principal your cert is signed with exists on the remote host."
    );
    println!();
}

fn print_provisioned(provisioned: &Provisioned) {
    let paths = &provisioned.paths;

    if provisioned.key_generated {
        println!(
            "{} SSH public key created for {}.",
            "✓".green(),
            provisioned.ca_name
        );
    }

    println!();
    println!("{} {} updated", "✓".green(), paths.certificate.display());
    if let Some(summary) = &provisioned.summary {
        println!("  Key ID:     {}", summary.key_id.dimmed());
        println!("  Principals: {}", summary.principals.join(", "));
        println!("  Expires:    {}", summary.expires());
    }
    println!();

    match provisioned.agent {
        AgentOutcome::Skipped { loaded } => {
            println!(
                "{} Identity could not be loaded for ssh-agent ({} already loaded)",
                "ERROR:".red().bold(),
                loaded
            );
            println!(
                "ssh-agent should not exceed {} identities",
                AGENT_IDENTITY_LIMIT
            );
            println!(
                "Use ssh with -i to use new key or remove unneeded identities from ssh-agent using {}",
                "ssh-add -d".cyan()
            );
            println!();
        }
        AgentOutcome::Loaded => {
            println!(
                "Identity loaded for current session but ssh-agent will not persist identities on reboot"
            );
            println!();
            println!("If using bash you can add the following command to your .bash_profile");
            println!(
                "  {}",
                format!("ssh-add {}", paths.private_key.display()).cyan()
            );
            println!();
        }
    }
}
