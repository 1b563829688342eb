//! Embedded Self-Check
//!
//! The `--test` flag of each binary runs these cases against the
//! in-process fakes instead of doing the real job. Nothing here touches
//! the network.

use std::collections::BTreeSet;

use tracing::info;

use crate::comments::post_comments;
use crate::config::GitHubConfig;
use crate::contributors::{find_new_contributors, SheetRow};
use crate::discovery::find_pull_requests;
use crate::error::{ClaBotError, Result};
use crate::testing::{FakeGitHub, RecordingPause};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn rows(cells: &[&str]) -> Vec<SheetRow> {
    cells.iter().map(|c| vec![c.to_string()]).collect()
}

fn check<T: PartialEq + std::fmt::Debug>(case: &str, actual: T, expected: T) -> Result<()> {
    if actual != expected {
        return Err(ClaBotError::SelfCheck(format!(
            "{}: expected {:?}, got {:?}",
            case, expected, actual
        )));
    }
    info!("ok: {}", case);
    Ok(())
}

/// Cases for the contributor diff
pub fn run_contributor_checks() -> Result<()> {
    let known = strings(&["a", "b", "c"]);

    let cases: [(&str, Vec<SheetRow>, Vec<String>); 3] = [
        ("empty sheet", Vec::new(), Vec::new()),
        (
            "signup of existing contributor is ignored",
            rows(&["a", "@a", "a, @b"]),
            Vec::new(),
        ),
        (
            "signup of new contributors is returned",
            rows(&["d", "@d", "c, @c, d, @e"]),
            strings(&["d", "e"]),
        ),
    ];

    for (case, sheet, expected) in cases {
        check(case, find_new_contributors(&known, &sheet)?, expected)?;
    }
    Ok(())
}

/// Cases for pull request discovery and comment posting
pub async fn run_summon_checks() -> Result<()> {
    let config = GitHubConfig::default();
    let authors = strings(&["a", "b", "c"]);

    let discovery_cases: [(&str, Vec<Vec<u64>>, BTreeSet<u64>, usize); 4] = [
        ("empty results", Vec::new(), BTreeSet::new(), 1),
        (
            "single page is returned, with duplicates removed",
            vec![vec![1, 2, 3, 3, 3]],
            BTreeSet::from([1, 2, 3]),
            2,
        ),
        (
            "multiple pages are merged, and duplicates removed",
            vec![vec![1, 2, 3, 4], vec![4, 5, 6, 7], vec![6, 7, 8, 9]],
            (1..=9).collect(),
            4,
        ),
        (
            "no page is requested after an empty one",
            vec![vec![1], Vec::new(), vec![2]],
            BTreeSet::from([1]),
            2,
        ),
    ];

    for (case, pages, expected, expected_calls) in discovery_cases {
        let api = FakeGitHub::new(config.clone()).with_pages(pages);
        let found = find_pull_requests(&api, &config, &authors).await?;
        check(case, (found, api.search_calls().len()), (expected, expected_calls))?;
    }

    let posting_cases: [(&str, BTreeSet<u64>); 3] = [
        ("no pull requests, no comments", BTreeSet::new()),
        ("single pull request comment", BTreeSet::from([1])),
        ("multiple pull request comments", BTreeSet::from([1, 2, 3])),
    ];

    for (case, pr_numbers) in posting_cases {
        let api = FakeGitHub::new(config.clone());
        let pause = RecordingPause::default();
        let responses = post_comments(&api, &pause, &config, &pr_numbers).await?;

        let urls: BTreeSet<String> = responses
            .iter()
            .filter_map(|r| r["url"].as_str().map(str::to_string))
            .collect();
        let expected: BTreeSet<String> = pr_numbers
            .iter()
            .map(|&n| config.comments_url(n))
            .collect();

        check(
            case,
            (urls, responses.len(), pause.pauses().len()),
            (expected, pr_numbers.len(), pr_numbers.len()),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contributor_checks_pass() {
        run_contributor_checks().unwrap();
    }

    #[tokio::test]
    async fn test_summon_checks_pass() {
        run_summon_checks().await.unwrap();
    }

    #[test]
    fn test_mismatch_is_reported() {
        let err = check("case", 1, 2).unwrap_err();
        assert_eq!(err.to_string(), "Self-check failed: case: expected 2, got 1");
    }
}
