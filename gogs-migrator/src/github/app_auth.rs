//! GitHub App authentication.
//!
//! The app signs a short-lived JWT, picks its first installation and
//! exchanges the JWT for an installation token. The token's permissions
//! decide what the migration may do.

use crate::config::MigrationSettings;
use crate::github::{ApiRequest, AuthError, Operator, Transport};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lifetime of the app JWT. GitHub accepts at most ten minutes.
const JWT_LIFETIME_SECS: u64 = 9 * 60;

/// Backdating of `iat` to absorb clock drift.
const CLOCK_DRIFT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct Claims {
    iat: u64,
    exp: u64,
    iss: String,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    token: String,
    #[serde(default)]
    permissions: HashMap<String, String>,
}

/// Result of authenticating as an installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationToken {
    /// Installation access token.
    pub token: String,
    /// False when pull requests must be migrated as issues.
    pub pull_requests_enabled: bool,
}

/// Reads the app's PEM private key.
///
/// # Errors
///
/// Returns [`AuthError::KeyFileNotFound`] if the file does not exist.
pub fn load_app_key(path: &Path) -> Result<String, AuthError> {
    if !path.exists() {
        return Err(AuthError::KeyFileNotFound {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| AuthError::KeyFileRead {
        path: path.display().to_string(),
        source: e,
    })
}

/// Signs an RS256 app JWT valid from `now` for nine minutes.
///
/// # Errors
///
/// Returns [`AuthError::InvalidKey`] if `pem` is not an RSA private key.
pub fn sign_app_jwt(app_id: u64, pem: &str, now: u64) -> Result<String, AuthError> {
    let key = EncodingKey::from_rsa_pem(pem.as_bytes())?;
    let claims = Claims {
        iat: now.saturating_sub(CLOCK_DRIFT_SECS),
        exp: now + JWT_LIFETIME_SECS,
        iss: app_id.to_string(),
    };
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &key,
    )?)
}

fn has_write(permissions: &HashMap<String, String>, permission: &str) -> bool {
    permissions.get(permission).map(String::as_str) == Some("write")
}

/// Exchanges the app JWT for an installation token and checks its
/// permissions.
///
/// `issues: write` is always required, `pull_requests: write` when
/// `pull_requests.migrate` is set. Pull requests migrated only as issues
/// need neither. Without `contents: write` pull requests cannot
/// be opened; the operator decides whether to migrate them as issues
/// instead.
///
/// # Errors
///
/// Returns [`AuthError`] if GitHub rejects the app, there is no
/// installation, a required permission is missing, or the operator declines
/// to continue.
pub async fn authenticate_installation(
    app: &dyn Transport,
    settings: &MigrationSettings,
    operator: &mut dyn Operator,
) -> Result<InstallationToken, AuthError> {
    let create_pull_requests = settings.create_pull_requests();
    let response = app.send(&ApiRequest::get("/app/installations")).await?;
    if let Some(message) = response.body.get("message").and_then(Value::as_str) {
        return Err(AuthError::Rejected {
            message: message.to_string(),
        });
    }

    let installation_id = response
        .body
        .as_array()
        .and_then(|installations| installations.first())
        .and_then(|installation| installation.get("id"))
        .and_then(Value::as_u64)
        .ok_or(AuthError::NoInstallation)?;
    debug!(installation_id, "Using first app installation");

    let route = format!("/app/installations/{installation_id}/access_tokens");
    let response = app.send(&ApiRequest::post_empty(route)).await?;
    if !response.is_success() {
        let message = response
            .body
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| format!("status {}", response.status), str::to_owned);
        return Err(AuthError::Rejected { message });
    }
    let access: AccessToken =
        serde_json::from_value(response.body).map_err(|e| AuthError::Rejected {
            message: format!("unexpected access token response: {e}"),
        })?;

    if !has_write(&access.permissions, "issues") {
        return Err(AuthError::InsufficientPermissions {
            permission: "issues".to_string(),
        });
    }

    let mut pull_requests_enabled = create_pull_requests;
    if create_pull_requests {
        if !has_write(&access.permissions, "pull_requests") {
            return Err(AuthError::InsufficientPermissions {
                permission: "pull_requests".to_string(),
            });
        }
        if !has_write(&access.permissions, "contents") {
            warn!("GitHub App has no write access to contents, pull requests cannot be created");
            let question = "Pull requests can only be migrated as issues without write access \
                            to contents. Continue?";
            if !operator.confirm(question) {
                return Err(AuthError::Aborted);
            }
            pull_requests_enabled = false;
        }
    }

    info!(pull_requests_enabled, "Authenticated as GitHub App installation");
    Ok(InstallationToken {
        token: access.token,
        pull_requests_enabled,
    })
}

/// Checks that the installation can see `repository`.
///
/// # Errors
///
/// Returns [`AuthError::RepositoryNotAccessible`] if it cannot.
pub async fn verify_repository_access(
    installation: &dyn Transport,
    repository: &str,
) -> Result<(), AuthError> {
    let wanted = repository.to_lowercase();
    let mut page = 1u32;
    loop {
        let page_number = page.to_string();
        let request = ApiRequest::get("/installation/repositories")
            .with_query(&[("per_page", "100"), ("page", page_number.as_str())]);
        let response = installation.send(&request).await?;

        let repositories = response
            .body
            .get("repositories")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let found = repositories.iter().any(|repo| {
            repo.get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase() == wanted)
        });
        if found {
            debug!(repository, "Installation has access to repository");
            return Ok(());
        }
        if !response.is_success() || repositories.len() < 100 {
            return Err(AuthError::RepositoryNotAccessible {
                repository: repository.to_string(),
            });
        }
        page += 1;
    }
}
