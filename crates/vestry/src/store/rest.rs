// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.


use super::BackingStore;
use crate::config::{ConfigError, StoreConfig};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use vestry_contracts::{Payload, RecordKey, StoreError};

#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// PostgREST-style client: one table per URL segment, row filters as query
/// parameters, errors as `{code, message, details, hint}` JSON bodies.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        let base_url = config.parsed_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Network(format!("Store URL {} has no path", self.base_url)))?
            .pop_if_empty()
            .push(table);
        Ok(url)
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, StoreError> {
        let response = self.authorised(request).send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(%status, "Received response from store");

        if !status.is_success() {
            return Err(rejection(status, response).await);
        }

        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| StoreError::Serialisation(format!("Failed to parse store response: {e}")))
    }
}

#[async_trait]
impl BackingStore for RestStore {
    async fn insert(&self, table: &str, payload: &Payload) -> Result<(), StoreError> {
        let url = self.table_url(table)?;
        debug!(%table, fields = payload.len(), "Inserting record");
        self.execute(self.client.post(url).json(payload)).await?;
        Ok(())
    }

    async fn update_by_key(
        &self,
        table: &str,
        key: &RecordKey,
        payload: &Payload,
    ) -> Result<(), StoreError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{key}"));
        debug!(%table, %key, fields = payload.len(), "Updating record");

        let rows = self.execute(self.client.patch(url).json(payload)).await?;
        match rows {
            Value::Array(updated) if updated.is_empty() => {
                warn!(%table, %key, "Update matched no rows");
                Err(StoreError::NotFound(format!("{table} {key}")))
            }
            _ => Ok(()),
        }
    }

    fn store_name(&self) -> &'static str {
        "rest"
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    if error.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Network(error.to_string())
    }
}

async fn rejection(status: StatusCode, response: Response) -> StoreError {
    let body = response.text().await.unwrap_or_default();
    let parsed: RestErrorBody = serde_json::from_str(&body).unwrap_or_default();
    if parsed.details.is_some() || parsed.hint.is_some() {
        debug!(details = ?parsed.details, hint = ?parsed.hint, "Store error context");
    }

    let message = match parsed.message.filter(|message| !message.trim().is_empty()) {
        Some(message) => message,
        None if body.trim().is_empty() => status.to_string(),
        None => body.trim().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorised(message),
        _ => StoreError::Rejected {
            status: Some(status.as_u16()),
            code: parsed.code,
            message,
        },
    }
}
