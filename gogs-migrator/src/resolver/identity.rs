//! Gogs user to GitHub login resolution.

use crate::source::{SourceError, SourceUser};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Looks up GitHub accounts.
#[async_trait]
pub trait UserDirectory: Send {
    /// Login of the account whose public email is `email`.
    async fn find_user_by_email(&mut self, email: &str) -> Option<String>;
}

/// Known Gogs users and manually mapped GitHub logins.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    emails: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl IdentityMap {
    /// Builds the map from the Gogs user table.
    #[must_use]
    pub fn new(users: &[SourceUser]) -> Self {
        let emails = users
            .iter()
            .filter(|user| !user.name.is_empty())
            .map(|user| (user.name.to_lowercase(), user.email.clone()))
            .collect();
        Self {
            emails,
            overrides: HashMap::new(),
        }
    }

    /// Maps `name` to `login`, taking precedence over email lookups.
    pub fn add_override(&mut self, name: &str, login: &str) {
        self.overrides
            .insert(name.to_lowercase(), login.to_string());
    }

    /// Returns true if `name` is a Gogs user.
    #[must_use]
    pub fn is_source_user(&self, name: &str) -> bool {
        self.emails.contains_key(&name.to_lowercase())
    }

    /// Email of the Gogs user `name`.
    #[must_use]
    pub fn email_for(&self, name: &str) -> Option<&str> {
        self.emails
            .get(&name.to_lowercase())
            .map(String::as_str)
            .filter(|email| !email.is_empty())
    }

    /// Manually mapped login for `name`.
    #[must_use]
    pub fn override_for(&self, name: &str) -> Option<&str> {
        self.overrides.get(&name.to_lowercase()).map(String::as_str)
    }

    /// GitHub login of `name`: manual mapping first, then the account
    /// registered with the user's email.
    pub async fn resolve(&self, name: &str, directory: &mut dyn UserDirectory) -> Option<String> {
        if let Some(login) = self.override_for(name) {
            return Some(login.to_string());
        }
        let email = self.email_for(name)?;
        directory.find_user_by_email(email).await
    }
}

/// Parses `gogs-name github-login` lines.
///
/// Blank lines and `#` comments are skipped; malformed lines are logged and
/// skipped.
#[must_use]
pub fn parse_accounts(content: &str) -> Vec<(String, String)> {
    let mut accounts = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [name, login] => accounts.push((name.to_string(), login.to_string())),
            _ => warn!(line = number + 1, content = line, "Skipping malformed account mapping"),
        }
    }
    accounts
}

/// Reads the accounts file. A missing file means no manual mappings.
///
/// # Errors
///
/// Returns [`SourceError::AccountsFile`] if the file exists but cannot be
/// read.
pub fn read_accounts_file(path: &Path) -> Result<Vec<(String, String)>, SourceError> {
    if !path.exists() {
        debug!(path = %path.display(), "No accounts file");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| SourceError::AccountsFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_accounts(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Directory(HashMap<String, String>);

    #[async_trait]
    impl UserDirectory for Directory {
        async fn find_user_by_email(&mut self, email: &str) -> Option<String> {
            self.0.get(email).cloned()
        }
    }

    fn user(name: &str, email: &str) -> SourceUser {
        SourceUser {
            id: 1,
            name: name.to_string(),
            full_name: String::new(),
            email: email.to_string(),
        }
    }

    #[test]
    fn parses_accounts() {
        let accounts = parse_accounts("# comment\n\nada  ada-gh\nbroken\nbob bob-gh extra\n");
        assert_eq!(accounts, vec![("ada".to_string(), "ada-gh".to_string())]);
    }

    #[tokio::test]
    async fn override_beats_email() {
        let mut identities = IdentityMap::new(&[user("Ada", "ada@example.com")]);
        let mut directory = Directory(HashMap::from([(
            "ada@example.com".to_string(),
            "ada-by-mail".to_string(),
        )]));

        assert_eq!(
            identities.resolve("ada", &mut directory).await,
            Some("ada-by-mail".to_string())
        );

        identities.add_override("ADA", "ada-manual");
        assert_eq!(
            identities.resolve("Ada", &mut directory).await,
            Some("ada-manual".to_string())
        );
        assert_eq!(identities.resolve("ghost", &mut directory).await, None);
    }

    #[test]
    fn missing_accounts_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(read_accounts_file(&temp.path().join("github-accounts"))
            .unwrap()
            .is_empty());

        let path = temp.path().join("accounts");
        fs::write(&path, "ada ada-gh\n").unwrap();
        assert_eq!(read_accounts_file(&path).unwrap().len(), 1);
    }
}
