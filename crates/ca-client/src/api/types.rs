// ABOUTME: Payload types returned by the CA server.
// ABOUTME: Roles, CA listings and the credentials used for signing.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// A role the user may request certificates under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_principals: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_cas: Vec<String>,
}

/// A certificate authority offered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaInfo {
    pub name: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub max_duration: String,
}

/// HTTP basic credentials for the signing endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public key file as uploaded in the `file` form field.
#[derive(Debug, Clone)]
pub struct PublicKeyUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Text(text)) => text,
        Some(Scalar::Number(number)) => number.to_string(),
    })
}
