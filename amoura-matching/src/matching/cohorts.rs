use serde::de::DeserializeOwned;
use serde::Serialize;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::ApiResponse;

use super::scoring::{Candidate, CohortLists, ViewerAttrs};

/// Read side of the aggregator: the user service owns profiles and edges and
/// computes the candidate set and cohort id-lists store-side; this client
/// just fetches them.
#[derive(Clone)]
pub struct CohortFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl CohortFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Discoverable candidate set for a viewer: discovery on, viewer and
    /// anyone blocking the viewer excluded, gender preference applied.
    pub async fn discoverable_candidates(&self, member_ref: &str) -> AppResult<Vec<Candidate>> {
        self.fetch(
            &format!("{}/internal/discover/{member_ref}", self.base_url),
            ErrorCode::CandidateFetchFailed,
            "could not load candidate profiles",
        )
        .await
    }

    /// The nine attribute cohorts plus the two edge-derived lists.
    pub async fn cohort_lists(&self, member_ref: &str) -> AppResult<CohortLists> {
        self.fetch(
            &format!("{}/internal/cohorts/{member_ref}", self.base_url),
            ErrorCode::CohortFetchFailed,
            "could not load cohort lists",
        )
        .await
    }

    /// Viewer-side scoring attributes (passions/interests).
    pub async fn viewer_attrs(&self, member_ref: &str) -> AppResult<ViewerAttrs> {
        self.fetch(
            &format!("{}/internal/attrs/{member_ref}", self.base_url),
            ErrorCode::CohortFetchFailed,
            "could not load viewer attributes",
        )
        .await
    }

    async fn fetch<T: DeserializeOwned + Serialize>(
        &self,
        url: &str,
        code: ErrorCode,
        message: &str,
    ) -> AppResult<T> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "user service unreachable");
                AppError::new(code, message)
            })?;

        if !resp.status().is_success() {
            tracing::error!(status = %resp.status(), url = %url, "user service returned an error");
            return Err(AppError::new(code, message));
        }

        let body: ApiResponse<T> = resp.json().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "unparseable user service response");
            AppError::new(code, message)
        })?;

        Ok(body.data)
    }
}
