//! Pull Request Discovery
//!
//! Pages through issue search results and merges them into one set of
//! pull request numbers.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::GitHubConfig;
use crate::error::{ClaBotError, Result};
use crate::github::{GitHubApi, SearchQuery};

#[derive(Debug, Deserialize)]
struct SearchPage {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    number: u64,
}

/// Pull request numbers on one search page
pub fn page_numbers(page: u32, body: &Value) -> Result<Vec<u64>> {
    let parsed = SearchPage::deserialize(body).map_err(|source| {
        error!(page, response = %body, error = %source, "Unexpected search response shape");
        ClaBotError::MalformedSearchResponse { page, source }
    })?;

    Ok(parsed.items.into_iter().map(|item| item.number).collect())
}

/// Union of page results, duplicates removed
pub fn merge_pages<I>(pages: I) -> BTreeSet<u64>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = u64>,
{
    pages.into_iter().flatten().collect()
}

/// Find open pull requests without the signed label authored by any of `authors`
///
/// Pages are requested in increasing order up to `config.max_pages`; the
/// first empty page ends the search. A page without an `items` array is
/// fatal.
pub async fn find_pull_requests<A>(
    api: &A,
    config: &GitHubConfig,
    authors: &[String],
) -> Result<BTreeSet<u64>>
where
    A: GitHubApi + ?Sized,
{
    if authors.is_empty() {
        return Ok(BTreeSet::new());
    }

    let query = SearchQuery::new(config, authors).to_string();
    debug!(query = %query, "Searching pull requests");

    let mut pages = Vec::new();

    for page in 1..=config.max_pages {
        let body = api.search_issues(&query, page, config.page_size).await?;
        let numbers = page_numbers(page, &body)?;
        debug!(page, "New PR numbers: {:?}", numbers);

        if numbers.is_empty() {
            break;
        }
        pages.push(numbers);
    }

    let pr_numbers = merge_pages(pages);
    info!(
        count = pr_numbers.len(),
        "Found open pull requests by new contributors"
    );
    Ok(pr_numbers)
}
