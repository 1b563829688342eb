//! GitHub API Access
//!
//! The `GitHubApi` trait is the seam between the jobs and GitHub: one
//! call per search page, one call per comment. `GitHubClient` is the
//! reqwest implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{GitHubConfig, GITHUB_API_VERSION, USER_AGENT};
use crate::error::{ClaBotError, Result};

/// Capability interface over the two GitHub endpoints the jobs use
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Fetch one page of issue search results as raw JSON
    async fn search_issues(&self, query: &str, page: u32, per_page: u32) -> Result<Value>;

    /// Comment on a pull request; returns the raw response body
    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<Value>;
}

/// Search query for open, unsigned pull requests by any of the given authors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    repository: String,
    excluded_label: String,
    authors: Vec<String>,
}

impl SearchQuery {
    pub fn new(config: &GitHubConfig, authors: &[String]) -> Self {
        Self {
            repository: config.repository(),
            excluded_label: config.signed_label.clone(),
            authors: authors.to_vec(),
        }
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Juxtaposed author terms are OR'd by the search API; the rest are AND'd
        write!(
            f,
            "type:pull-request repo:{} state:open -label:{}",
            self.repository, self.excluded_label
        )?;
        for author in &self.authors {
            write!(f, " author:{}", author)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// GitHub REST client authenticated with a bearer token
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    token: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("config", &self.config)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitHubClient {
    pub fn new(token: String, config: GitHubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClaBotError::Http {
                endpoint: config.api_url.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            config,
            token,
        })
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    async fn read_json(endpoint: &str, response: Response) -> Result<Value> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClaBotError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| ClaBotError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn search_issues(&self, query: &str, page: u32, per_page: u32) -> Result<Value> {
        let url = &self.config.search_url;

        let response = self
            .with_headers(self.client.get(url))
            .query(&[
                ("q", query.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ClaBotError::Http {
                endpoint: url.clone(),
                source: e,
            })?;

        let body = Self::read_json(url, response).await?;
        debug!(page, "Response from {}: {}", url, body);
        Ok(body)
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<Value> {
        let url = self.config.comments_url(pr_number);

        let response = self
            .with_headers(self.client.post(&url))
            .json(&CommentRequest { body })
            .send()
            .await
            .map_err(|e| ClaBotError::Http {
                endpoint: url.clone(),
                source: e,
            })?;

        let response_body = Self::read_json(&url, response).await?;
        debug!(pr = pr_number, "Response from {}: {}", url, response_body);
        Ok(response_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GitHubClient {
        let config = GitHubConfig::for_repository("trinodb/trino")
            .unwrap()
            .with_api_base(&server.uri());
        GitHubClient::new("ghs_test".to_string(), config).unwrap()
    }

    #[test]
    fn test_query_rendering() {
        let config = GitHubConfig::for_repository("trinodb/trino").unwrap();
        let query = SearchQuery::new(&config, &["alice".to_string(), "bob".to_string()]);
        assert_eq!(
            query.to_string(),
            "type:pull-request repo:trinodb/trino state:open -label:cla-signed author:alice author:bob"
        );
    }

    #[tokio::test]
    async fn test_search_issues_sends_query_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .and(query_param("q", "type:pull-request author:alice"))
            .and(query_param("page", "3"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer ghs_test"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_count": 1,
                "items": [{"number": 12}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .search_issues("type:pull-request author:alice", 3, 100)
            .await
            .unwrap();
        assert_eq!(page["items"][0]["number"], 12);
    }

    #[tokio::test]
    async fn test_create_comment_posts_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/trinodb/trino/issues/42/comments"))
            .and(body_json(serde_json::json!({"body": "@cla-bot check"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 1,
                "url": "https://api.github.com/repos/trinodb/trino/issues/comments/1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .create_comment(42, "@cla-bot check")
            .await
            .unwrap();
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Resource not accessible"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_comment(42, "@cla-bot check")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaBotError::Api { status: 403, ref body, .. } if body.contains("not accessible")));
    }
}
