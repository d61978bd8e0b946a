// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search service orchestration
//!
//! Minimal host for a single engine: prepares the request template, lets the
//! engine fill it in, dispatches it over HTTP and hands the body back to the
//! engine. There is no retry; failures are returned to the caller as-is.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Client;
use tracing::{debug, info, warn};

use super::engine::SearchEngine;
use super::types::{RequestParams, SearchError, SearchResponse};

/// Search service that dispatches requests built by one engine
pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    client: Client,
    request_timeout: Duration,
}

impl SearchService {
    /// Create a new search service
    ///
    /// # Arguments
    /// * `engine` - Initialized engine
    /// * `request_timeout` - Timeout applied to every dispatched request
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        request_timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| SearchError::Http {
                status: 0,
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            engine,
            client,
            request_timeout,
        })
    }

    /// The engine this service dispatches for
    pub fn engine(&self) -> &dyn SearchEngine {
        self.engine.as_ref()
    }

    /// Build the request for `query` without sending it
    pub fn prepare(&self, query: &str, pageno: u32) -> Result<RequestParams, SearchError> {
        let mut params = RequestParams::for_page(pageno).with_timeout(self.request_timeout);
        params
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        self.engine.request(query, params)
    }

    /// Perform a search
    ///
    /// # Arguments
    /// * `query` - The search query
    /// * `pageno` - Optional 1-based page number (first page if None)
    ///
    /// # Returns
    /// Search response with results, or error
    pub async fn search(
        &self,
        query: &str,
        pageno: Option<u32>,
    ) -> Result<SearchResponse, SearchError> {
        let start = Instant::now();
        let params = self.prepare(query, pageno.unwrap_or(1))?;

        debug!("Dispatching {} request to {}", self.engine.name(), params.url);
        let body = self.dispatch(&params).await?;
        let results = self.engine.response(&body)?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Search complete: {} results from {} in {}ms",
            results.len(),
            self.engine.name(),
            elapsed_ms
        );

        Ok(SearchResponse {
            query: query.to_string(),
            result_count: results.len(),
            results,
            search_time_ms: elapsed_ms,
            engine: self.engine.name().to_string(),
        })
    }

    async fn dispatch(&self, params: &RequestParams) -> Result<String, SearchError> {
        let response = self
            .client
            .request(params.method.clone(), &params.url)
            .headers(params.headers.clone())
            .body(params.body.clone())
            .timeout(params.timeout)
            .send()
            .await
            .map_err(|e| SearchError::from_transport(e, params.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::from_transport(e, params.timeout))?;

        if !status.is_success() {
            warn!("{} backend answered {}", self.engine.name(), status);
            // Elasticsearch reports query errors in the body of 4xx/5xx responses
            if let Err(err @ SearchError::BackendApi { .. }) = self.engine.response(&text) {
                return Err(err);
            }
            return Err(SearchError::Http {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(text)
    }
}
