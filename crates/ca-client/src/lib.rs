// ABOUTME: Library components for the ca-client certificate request tool.
// ABOUTME: Configuration, CA server API, provisioning workflow and CLI dispatch.

//! # ca-client
//!
//! Requests short-lived SSH user certificates from a CA server and installs
//! them for the local SSH agent.
//!
//! ```text
//! ca-client                      # sign against the configured default CA
//! ├── --sign CA                  # sign against a specific CA
//! ├── --list-roles [--user NAME] # roles the user may request
//! ├── --list-cas                 # CAs offered by the server
//! └── --get-key CA               # CA public key for sshd configuration
//! ```
//!
//! Every run loads `~/.ca-client/config.json` (prompting on first use),
//! checks the server's API version, and then performs exactly one action.

pub mod api;
pub mod cli;
pub mod config;
pub mod provision;

/// Version of the ca-client binary
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
