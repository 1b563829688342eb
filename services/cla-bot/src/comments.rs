//! Comment Posting
//!
//! Posts the CLA bot summon comment on each pull request, one at a time,
//! with a fixed pause before every post.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::GitHubConfig;
use crate::error::Result;
use crate::github::GitHubApi;

/// Capability interface for the delay between posts
#[async_trait]
pub trait Pause: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real delay on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Post the comment on every pull request, stopping at the first failure
///
/// Returns the raw responses in the order the pull requests were processed.
pub async fn post_comments<A, P>(
    api: &A,
    pause: &P,
    config: &GitHubConfig,
    pr_numbers: &BTreeSet<u64>,
) -> Result<Vec<Value>>
where
    A: GitHubApi + ?Sized,
    P: Pause + ?Sized,
{
    let mut responses = Vec::with_capacity(pr_numbers.len());

    for &pr_number in pr_numbers {
        pause.sleep(config.post_delay).await;

        match api.create_comment(pr_number, &config.comment).await {
            Ok(response) => {
                debug!(pr = pr_number, "Comment posted");
                responses.push(response);
            }
            Err(e) => {
                error!(
                    pr = pr_number,
                    posted = responses.len(),
                    remaining = pr_numbers.len() - responses.len() - 1,
                    error = %e,
                    "Comment post failed, aborting"
                );
                return Err(e);
            }
        }
    }

    Ok(responses)
}

/// Result of commenting on one pull request
#[derive(Debug, Clone, Serialize)]
pub struct CommentOutcome {
    pub pr_number: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommentOutcome {
    pub fn success(pr_number: u64) -> Self {
        Self {
            pr_number,
            success: true,
            error: None,
        }
    }

    pub fn failure(pr_number: u64, error: impl Into<String>) -> Self {
        Self {
            pr_number,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Per-run report for `post_comments_keep_going`
#[derive(Debug, Clone, Serialize)]
pub struct CommentSummary {
    pub repository: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<CommentOutcome>,
}

impl CommentSummary {
    pub fn from_results(repository: String, results: Vec<CommentOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            repository,
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Post the comment on every pull request, recording failures instead of stopping
pub async fn post_comments_keep_going<A, P>(
    api: &A,
    pause: &P,
    config: &GitHubConfig,
    pr_numbers: &BTreeSet<u64>,
) -> CommentSummary
where
    A: GitHubApi + ?Sized,
    P: Pause + ?Sized,
{
    let mut results = Vec::with_capacity(pr_numbers.len());

    for &pr_number in pr_numbers {
        pause.sleep(config.post_delay).await;

        let outcome = match api.create_comment(pr_number, &config.comment).await {
            Ok(_) => CommentOutcome::success(pr_number),
            Err(e) => {
                warn!(pr = pr_number, error = %e, "Comment post failed, continuing");
                CommentOutcome::failure(pr_number, e.to_string())
            }
        };
        results.push(outcome);
    }

    CommentSummary::from_results(config.repository(), results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClaBotError;
    use crate::testing::{FakeGitHub, RecordingPause};

    async fn post(pr_numbers: &[u64]) -> (Vec<Value>, FakeGitHub, RecordingPause) {
        let config = GitHubConfig::default();
        let api = FakeGitHub::new(config.clone());
        let pause = RecordingPause::default();
        let set: BTreeSet<u64> = pr_numbers.iter().copied().collect();
        let responses = post_comments(&api, &pause, &config, &set).await.unwrap();
        (responses, api, pause)
    }

    #[tokio::test]
    async fn test_empty_set_makes_no_calls() {
        let (responses, api, pause) = post(&[]).await;
        assert!(responses.is_empty());
        assert!(api.comment_calls().is_empty());
        assert!(pause.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_single_comment() {
        let (responses, api, pause) = post(&[1]).await;
        assert_eq!(
            responses,
            vec![serde_json::json!({
                "url": "https://api.github.com/repos/MiguelWeezardo/trino/issues/1/comments"
            })]
        );
        assert_eq!(api.comment_calls(), vec![1]);
        assert_eq!(pause.pauses(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_one_call_and_one_pause_per_pull_request() {
        let config = GitHubConfig::default();
        let (responses, api, pause) = post(&[1, 2, 3]).await;

        let urls: BTreeSet<String> = responses
            .iter()
            .map(|r| r["url"].as_str().unwrap().to_string())
            .collect();
        let expected: BTreeSet<String> = [1, 2, 3].iter().map(|&n| config.comments_url(n)).collect();

        assert_eq!(urls, expected);
        assert_eq!(api.comment_calls().len(), 3);
        assert_eq!(pause.pauses().len(), 3);
        assert!(api
            .comment_bodies()
            .iter()
            .all(|body| body == "@cla-bot check"));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_posts() {
        let config = GitHubConfig::default();
        let api = FakeGitHub::new(config.clone()).failing_on(2);
        let pause = RecordingPause::default();
        let set = BTreeSet::from([1, 2, 3]);

        let err = post_comments(&api, &pause, &config, &set).await.unwrap_err();
        assert!(matches!(err, ClaBotError::Api { status: 500, .. }));
        assert_eq!(api.comment_calls(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_keep_going_reports_every_pull_request() {
        let config = GitHubConfig::default();
        let api = FakeGitHub::new(config.clone()).failing_on(2);
        let pause = RecordingPause::default();
        let set = BTreeSet::from([1, 2, 3]);

        let summary = post_comments_keep_going(&api, &pause, &config, &set).await;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert_eq!(api.comment_calls(), vec![1, 2, 3]);
        assert_eq!(pause.pauses().len(), 3);

        let failed: Vec<u64> = summary
            .results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.pr_number)
            .collect();
        assert_eq!(failed, vec![2]);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = CommentSummary::from_results(
            "trinodb/trino".to_string(),
            vec![CommentOutcome::success(1), CommentOutcome::failure(2, "boom")],
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failed"], 1);
        assert!(json["results"][0].get("error").is_none());
        assert_eq!(json["results"][1]["error"], "boom");
    }
}
