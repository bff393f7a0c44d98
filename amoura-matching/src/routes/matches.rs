use axum::extract::{Query, State};
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use amoura_shared::errors::AppResult;
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::ApiResponse;

use crate::matching::paging::{self, PageControl, PAGE_SIZE};
use crate::matching::scoring::{self, RankedMatch};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    #[serde(default = "default_page_number")]
    pub page: usize,
    /// Session seed: the client threads the value from the first response
    /// through subsequent page requests so equal-score order holds steady
    /// while paging. Absent on the first request; a fresh one is drawn.
    pub seed: Option<u64>,
}

fn default_page_number() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct MatchesPage {
    pub items: Vec<RankedMatch>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub page_controls: Vec<PageControl>,
    pub session_seed: u64,
}

/// GET /matches?page=N&seed=S - the viewer's ranked matches grid
pub async fn my_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchesQuery>,
) -> AppResult<Json<ApiResponse<MatchesPage>>> {
    let session_seed = query.seed.unwrap_or_else(|| rand::thread_rng().gen());

    let viewer = state.cohorts.viewer_attrs(&user.member_ref).await?;
    let candidates = state.cohorts.discoverable_candidates(&user.member_ref).await?;
    let cohorts = state.cohorts.cohort_lists(&user.member_ref).await?;

    let ranked = scoring::compute_matches(&viewer, candidates, &cohorts, session_seed);

    let total = ranked.len();
    let total_pages = paging::total_pages(total);
    let items = paging::page(&ranked, query.page).to_vec();

    tracing::debug!(
        member_ref = %user.member_ref,
        total = total,
        page = query.page,
        "matches computed"
    );

    Ok(Json(ApiResponse::ok(MatchesPage {
        items,
        page: query.page,
        page_size: PAGE_SIZE,
        total,
        total_pages,
        page_controls: paging::page_controls(total_pages, query.page),
        session_seed,
    })))
}
