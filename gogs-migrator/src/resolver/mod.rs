//! Rewriting of migrated text.
//!
//! Issue references (`#N`) are pointed at the new GitHub numbers, `@name`
//! mentions at GitHub accounts, and indented code is optionally fenced.

mod codeblock;
mod identity;
mod issue_map;

pub use codeblock::fence_indented_code;
pub use identity::{parse_accounts, read_accounts_file, IdentityMap, UserDirectory};
pub use issue_map::IssueMap;

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Replacement for references to items that were not migrated.
pub const NOT_MIGRATED: &str = "<not_migrated>";

/// `#N`, optionally preceded by `&` (HTML entities such as `&#39;`).
static ISSUE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(&?)#(\d+)").expect("Invalid issue reference regex"));

/// `@name`, optionally preceded by a word character (email addresses).
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w?)@(\w(?:[\w.]*\w)?)").expect("Invalid mention regex")
});

/// Rewrites references and mentions in migrated text.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    live_mentions: bool,
    code_language: Option<String>,
}

impl ReferenceResolver {
    /// `live_mentions` renders `@login` instead of a profile link.
    /// `code_language` enables fencing of indented code.
    #[must_use]
    pub fn new(live_mentions: bool, code_language: Option<String>) -> Self {
        Self {
            live_mentions,
            code_language,
        }
    }

    /// Renders a user for GitHub: bold old name when unmapped, otherwise a
    /// profile link or a live mention.
    #[must_use]
    pub fn format_user(&self, old: &str, new: Option<&str>) -> String {
        match new {
            None => format!("**{old}**"),
            Some(login) if self.live_mentions => format!("@{login}"),
            Some(login) => format!("[@{login}](https://github.com/{login})"),
        }
    }

    /// Renders the Gogs user `name` as its GitHub account.
    pub async fn user(
        &self,
        name: &str,
        identities: &IdentityMap,
        directory: &mut dyn UserDirectory,
    ) -> String {
        let login = identities.resolve(name, directory).await;
        self.format_user(name, login.as_deref())
    }

    /// Rewrites issue references, mentions and indented code in `text`.
    pub async fn rewrite(
        &self,
        text: &str,
        issue_map: &IssueMap,
        identities: &IdentityMap,
        directory: &mut dyn UserDirectory,
    ) -> String {
        let text = rewrite_issue_references(text, issue_map);
        let text = self.rewrite_mentions(&text, identities, directory).await;
        match &self.code_language {
            Some(language) => fence_indented_code(&text, language),
            None => text,
        }
    }

    async fn rewrite_mentions(
        &self,
        text: &str,
        identities: &IdentityMap,
        directory: &mut dyn UserDirectory,
    ) -> String {
        let names: Vec<String> = MENTION
            .captures_iter(text)
            .filter(|caps| caps[1].is_empty())
            .map(|caps| caps[2].to_string())
            .collect();

        let mut replacements: HashMap<String, Option<String>> = HashMap::new();
        for name in names {
            if replacements.contains_key(&name) {
                continue;
            }
            let replacement = self.mention(&name, identities, directory).await;
            replacements.insert(name, replacement);
        }

        MENTION
            .replace_all(text, |caps: &Captures<'_>| {
                let unchanged = caps[0].to_string();
                if !caps[1].is_empty() {
                    return unchanged;
                }
                replacements
                    .get(&caps[2])
                    .cloned()
                    .flatten()
                    .unwrap_or(unchanged)
            })
            .into_owned()
    }

    /// Replacement for `@name`, or `None` to leave it as is.
    async fn mention(
        &self,
        name: &str,
        identities: &IdentityMap,
        directory: &mut dyn UserDirectory,
    ) -> Option<String> {
        if let Some(login) = identities.resolve(name, directory).await {
            debug!(name, login = %login, "Replaced mention");
            return Some(self.format_user(name, Some(&login)));
        }
        // Only rewrite names that are Gogs users; anything else may be a
        // code annotation.
        if identities.is_source_user(name) {
            debug!(name, "Mention of unmapped Gogs user");
            return Some(self.format_user(name, Some(name)));
        }
        debug!(name, "Mention not present in mapping, leaving as is");
        None
    }
}

/// Points `#N` at the new issue number for every `N` in `issue_map`.
///
/// Items mapped to `None` become `#<not_migrated>`; unknown numbers are
/// left as written.
#[must_use]
pub fn rewrite_issue_references(text: &str, issue_map: &IssueMap) -> String {
    ISSUE_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| {
            let unchanged = caps[0].to_string();
            if !caps[1].is_empty() {
                return unchanged;
            }
            let Ok(index) = caps[2].parse::<i64>() else {
                return unchanged;
            };
            match issue_map.get(index) {
                Some(Some(number)) => format!("#{number}"),
                Some(None) => format!("#{NOT_MIGRATED}"),
                None => unchanged,
            }
        })
        .into_owned()
}
