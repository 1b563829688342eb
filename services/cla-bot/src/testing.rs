//! In-process fakes for the capability traits
//!
//! Used by unit tests and by the `--test` self-check of both binaries.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::comments::Pause;
use crate::config::GitHubConfig;
use crate::error::{ClaBotError, Result};
use crate::github::GitHubApi;

/// One recorded search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub query: String,
    pub page: u32,
    pub per_page: u32,
}

/// Scripted GitHub: serves queued search pages, then empty ones, and
/// answers comment posts with the endpoint URL
#[derive(Debug)]
pub struct FakeGitHub {
    config: GitHubConfig,
    pages: Mutex<VecDeque<Value>>,
    failing: HashSet<u64>,
    search_calls: Mutex<Vec<SearchCall>>,
    comment_calls: Mutex<Vec<(u64, String)>>,
}

impl FakeGitHub {
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            pages: Mutex::new(VecDeque::new()),
            failing: HashSet::new(),
            search_calls: Mutex::new(Vec::new()),
            comment_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue one search page per list of pull request numbers
    pub fn with_pages(self, pages: Vec<Vec<u64>>) -> Self {
        for numbers in pages {
            let items: Vec<Value> = numbers.iter().map(|n| json!({ "number": n })).collect();
            self.queue(json!({ "items": items }));
        }
        self
    }

    /// Queue a search response body as-is
    pub fn with_raw_page(self, body: Value) -> Self {
        self.queue(body);
        self
    }

    /// Make comment posts on `pr_number` fail
    pub fn failing_on(mut self, pr_number: u64) -> Self {
        self.failing.insert(pr_number);
        self
    }

    fn queue(&self, body: Value) {
        lock(&self.pages).push_back(body);
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        lock(&self.search_calls).clone()
    }

    /// Pull request numbers commented on, in call order
    pub fn comment_calls(&self) -> Vec<u64> {
        lock(&self.comment_calls).iter().map(|(n, _)| *n).collect()
    }

    pub fn comment_bodies(&self) -> Vec<String> {
        lock(&self.comment_calls).iter().map(|(_, b)| b.clone()).collect()
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn search_issues(&self, query: &str, page: u32, per_page: u32) -> Result<Value> {
        lock(&self.search_calls).push(SearchCall {
            query: query.to_string(),
            page,
            per_page,
        });
        Ok(lock(&self.pages)
            .pop_front()
            .unwrap_or_else(|| json!({ "items": [] })))
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<Value> {
        lock(&self.comment_calls).push((pr_number, body.to_string()));
        let url = self.config.comments_url(pr_number);

        if self.failing.contains(&pr_number) {
            return Err(ClaBotError::Api {
                endpoint: url,
                status: 500,
                body: "Server Error".to_string(),
            });
        }
        Ok(json!({ "url": url }))
    }
}

/// Records requested pauses without sleeping
#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn pauses(&self) -> Vec<Duration> {
        lock(&self.pauses).clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn sleep(&self, duration: Duration) {
        lock(&self.pauses).push(duration);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
