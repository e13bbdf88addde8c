//! AWS credential resolution.
//!
//! Resolution chain, first match wins: explicit config keys, then the
//! standard environment variables, then a profile in the shared credentials
//! file. Anything less is a `Credentials` error; there is no anonymous mode.

use crate::core::config::AwsConfig;
use crate::core::{RelayError, Result};
use std::path::PathBuf;

/// A resolved set of AWS credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token for temporary credentials, signed when present.
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets stay out of logs.
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Resolve credentials for one invocation.
pub async fn resolve(config: &AwsConfig) -> Result<Credentials> {
    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        tracing::debug!("using explicitly configured credentials");
        return Ok(Credentials {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
        });
    }

    if let (Ok(access_key_id), Ok(secret_access_key)) = (
        std::env::var("AWS_ACCESS_KEY_ID"),
        std::env::var("AWS_SECRET_ACCESS_KEY"),
    ) {
        if !access_key_id.is_empty() && !secret_access_key.is_empty() {
            tracing::debug!("using credentials from the environment");
            return Ok(Credentials {
                access_key_id,
                secret_access_key,
                session_token: std::env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty()),
            });
        }
    }

    let profile = config
        .profile
        .clone()
        .or_else(|| std::env::var("AWS_PROFILE").ok().filter(|p| !p.is_empty()))
        .unwrap_or_else(|| "default".to_string());
    let path = shared_credentials_path().ok_or_else(|| {
        RelayError::credentials("no home directory to locate ~/.aws/credentials")
    })?;
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        RelayError::credentials(format!("couldn't read {}: {e}", path.display()))
    })?;
    let credentials = from_shared_file(&content, &profile).ok_or_else(|| {
        RelayError::credentials(format!(
            "profile {:?} not found in {}",
            profile,
            path.display()
        ))
    })?;
    tracing::debug!(%profile, "using credentials from the shared file");
    Ok(credentials)
}

/// `AWS_SHARED_CREDENTIALS_FILE`, falling back to `~/.aws/credentials`.
fn shared_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir().map(|home| home.join(".aws").join("credentials"))
}

/// Parse one profile out of a shared credentials file.
///
/// The format is the INI subset the AWS CLI writes: `[profile]` section
/// headers, `key = value` lines, `#`/`;` comments.
pub fn from_shared_file(content: &str, profile: &str) -> Option<Credentials> {
    let mut in_profile = false;
    let mut access_key_id = None;
    let mut secret_access_key = None;
    let mut session_token = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_profile = section.trim() == profile;
            continue;
        }
        if !in_profile {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" => access_key_id = Some(value),
            "aws_secret_access_key" => secret_access_key = Some(value),
            "aws_session_token" => session_token = Some(value),
            _ => {}
        }
    }

    Some(Credentials {
        access_key_id: access_key_id?,
        secret_access_key: secret_access_key?,
        session_token,
    })
}
