//! Google Sheets Values Client
//!
//! Reads the CLA signup responses with a service-account access token.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::auth::{fetch_access_token, ServiceAccountKey};
use crate::config::{SheetsConfig, USER_AGENT};
use crate::contributors::SheetRow;
use crate::error::{ClaBotError, Result};

/// `spreadsheets.values.get` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    range: Option<String>,
    /// Absent when the range holds no data
    #[serde(default)]
    values: Vec<SheetRow>,
}

/// Sheets API client bound to one spreadsheet range
pub struct SheetsClient {
    client: Client,
    config: SheetsConfig,
    access_token: String,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("config", &self.config)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl SheetsClient {
    pub fn new(client: Client, config: SheetsConfig, access_token: String) -> Self {
        Self {
            client,
            config,
            access_token,
        }
    }

    /// Authenticate with a service-account key and build the client
    pub async fn authenticate(config: SheetsConfig, key: &ServiceAccountKey) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClaBotError::Http {
                endpoint: config.api_url.clone(),
                source: e,
            })?;

        let access_token = fetch_access_token(&client, key, &config.scope).await?;
        Ok(Self::new(client, config, access_token))
    }

    fn values_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.spreadsheet_id,
            urlencoding::encode(&self.config.range)
        )
    }

    /// Fetch every row of the configured range
    pub async fn fetch_rows(&self) -> Result<Vec<SheetRow>> {
        let url = self.values_url();
        debug!(url = %url, "Reading sheet values");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ClaBotError::Http {
                endpoint: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClaBotError::Api {
                endpoint: url,
                status: status.as_u16(),
                body,
            });
        }

        let value_range = response
            .json::<ValueRange>()
            .await
            .map_err(|e| ClaBotError::Http {
                endpoint: url.clone(),
                source: e,
            })?;

        debug!(
            range = value_range.range.as_deref().unwrap_or_default(),
            rows = value_range.values.len(),
            "Sheet values: {:?}",
            value_range.values
        );
        Ok(value_range.values)
    }
}
