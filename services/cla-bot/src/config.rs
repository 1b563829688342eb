//! Job Configuration
//!
//! Fixed endpoints and identifiers used by both jobs. The structs are
//! injected into clients so tests can substitute a mock server.

use std::time::Duration;

use crate::error::{ClaBotError, Result};

/// GitHub issue search endpoint
pub const SEARCH_API_URL: &str = "https://api.github.com/search/issues";

/// GitHub REST API base
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Repository whose pull requests are checked
pub const DEFAULT_REPOSITORY: &str = "MiguelWeezardo/trino";

/// Label the CLA bot applies once the author has signed
pub const SIGNED_LABEL: &str = "cla-signed";

/// Comment that makes the CLA bot re-check a pull request
pub const CLA_BOT_COMMENT: &str = "@cla-bot check";

/// The search API stops at 1000 results: 10 pages of 100
pub const MAX_SEARCH_PAGES: u32 = 10;
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Delay before each comment post
pub const POST_DELAY: Duration = Duration::from_secs(1);

/// CLA signup form responses
pub const SPREADSHEET_ID: &str = "1oj5pnThQeQhSsQ80wJIz_sqGRZ4JZGlFQJtC9Ra9p00";
pub const SHEET_RANGE: &str = "Form Responses 1!G2:G";

/// Google Sheets API base
pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// OAuth scope requested for the service account
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const USER_AGENT: &str = "trino-cla-bot";

/// Settings for the PR-summon job
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Full URL of the issue search endpoint
    pub search_url: String,
    /// REST API base used for comment posts
    pub api_url: String,
    /// Label marking pull requests whose author already signed
    pub signed_label: String,
    /// Comment body posted on each pull request
    pub comment: String,
    pub max_pages: u32,
    pub page_size: u32,
    pub post_delay: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        let (owner, repo) = DEFAULT_REPOSITORY
            .split_once('/')
            .unwrap_or((DEFAULT_REPOSITORY, ""));
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            search_url: SEARCH_API_URL.to_string(),
            api_url: GITHUB_API_URL.to_string(),
            signed_label: SIGNED_LABEL.to_string(),
            comment: CLA_BOT_COMMENT.to_string(),
            max_pages: MAX_SEARCH_PAGES,
            page_size: SEARCH_PAGE_SIZE,
            post_delay: POST_DELAY,
        }
    }
}

impl GitHubConfig {
    /// Build a config for an `owner/repo` slug, keeping every other default
    pub fn for_repository(slug: &str) -> Result<Self> {
        let (owner, repo) = parse_repository(slug)?;
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            ..Self::default()
        })
    }

    /// Point both endpoints at another API base (GitHub Enterprise or a mock server)
    pub fn with_api_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.search_url = format!("{}/search/issues", base);
        self.api_url = base.to_string();
        self
    }

    /// `owner/repo`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Comment endpoint for one pull request
    pub fn comments_url(&self, pr_number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, pr_number
        )
    }
}

/// Split an `owner/repo` slug
pub fn parse_repository(slug: &str) -> Result<(&str, &str)> {
    match slug.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(ClaBotError::InvalidRepository(slug.to_string())),
    }
}

/// Settings for the contributor-diff job
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// A1-notation range; only the first column is read
    pub range: String,
    pub api_url: String,
    pub scope: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            range: SHEET_RANGE.to_string(),
            api_url: SHEETS_API_URL.to_string(),
            scope: SHEETS_READONLY_SCOPE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_repository() {
        let config = GitHubConfig::default();
        assert_eq!(config.repository(), "MiguelWeezardo/trino");
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_comments_url() {
        let config = GitHubConfig::for_repository("trinodb/trino").unwrap();
        assert_eq!(
            config.comments_url(42),
            "https://api.github.com/repos/trinodb/trino/issues/42/comments"
        );
    }

    #[test]
    fn test_with_api_base() {
        let config = GitHubConfig::default().with_api_base("http://127.0.0.1:8080/");
        assert_eq!(config.search_url, "http://127.0.0.1:8080/search/issues");
        assert_eq!(
            config.comments_url(7),
            "http://127.0.0.1:8080/repos/MiguelWeezardo/trino/issues/7/comments"
        );
    }

    #[test]
    fn test_parse_repository_rejects_bad_slugs() {
        assert!(parse_repository("trino").is_err());
        assert!(parse_repository("/trino").is_err());
        assert!(parse_repository("trinodb/").is_err());
        assert!(parse_repository("a/b/c").is_err());
        assert_eq!(parse_repository("a/b").unwrap(), ("a", "b"));
    }
}
