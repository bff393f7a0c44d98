use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use amoura_shared::clients::db::id_batches;
use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::{ApiResponse, MemberSnapshot};

use crate::models::Profile;
use crate::schema::{blocks, favorites, profiles, shortlists};
use crate::AppState;

// --- Service-to-service DTOs ---

#[derive(Debug, Deserialize)]
pub struct BatchProfilesRequest {
    pub member_refs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PairBlockStatus {
    pub a_blocks_b: bool,
    pub b_blocks_a: bool,
}

/// Candidate payload for the matching service: the snapshot plus the
/// attributes the aggregator scores in memory.
#[derive(Debug, Serialize)]
pub struct DiscoverCandidate {
    pub member_ref: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub city: Option<String>,
    pub is_online: bool,
    pub passions: Vec<String>,
    pub interests: Vec<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct CohortListsPayload {
    pub same_day_job: Vec<String>,
    pub same_religion: Vec<String>,
    pub same_degree: Vec<String>,
    pub same_origin_country: Vec<String>,
    pub same_settled_country: Vec<String>,
    pub same_city: Vec<String>,
    pub same_mother_tongue: Vec<String>,
    pub same_star_sign: Vec<String>,
    pub shortlisted: Vec<String>,
    pub likes_me: Vec<String>,
    pub liked: Vec<String>,
}

// --- Handlers ---

#[derive(Debug, Deserialize)]
pub struct PresenceUpdate {
    pub member_ref: String,
    pub online: bool,
}

/// POST /internal/presence - called by the messaging socket layer
pub async fn update_presence(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PresenceUpdate>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::update(profiles::table.filter(profiles::member_ref.eq(&req.member_ref)))
        .set(profiles::is_online.eq(req.online))
        .execute(&mut conn)?;

    let key = format!("online:{}", req.member_ref);
    if req.online {
        let _ = state.redis.set(&key, "1", 120).await;
    } else {
        let _ = state.redis.del(&key).await;
    }

    Ok(Json(ApiResponse::ok(serde_json::json!({ "member_ref": req.member_ref, "online": req.online }))))
}

/// POST /internal/profiles/batch - snapshots for a list of member refs.
/// Reads are chunked to the store's id-batch limit and merged.
pub async fn batch_profiles(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchProfilesRequest>,
) -> AppResult<Json<ApiResponse<Vec<MemberSnapshot>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let snapshots = load_snapshots(&state, &mut conn, &req.member_refs).await?;
    Ok(Json(ApiResponse::ok(snapshots)))
}

/// Shared snapshot loader: chunked `member_ref IN (...)` reads, merged, with
/// presence enriched from Redis. Refs that resolve to nothing are dropped;
/// callers that need placeholders add them on their side.
pub async fn load_snapshots(
    state: &AppState,
    conn: &mut diesel::pg::PgConnection,
    member_refs: &[String],
) -> AppResult<Vec<MemberSnapshot>> {
    let mut loaded: Vec<Profile> = Vec::with_capacity(member_refs.len());
    for batch in id_batches(member_refs) {
        let mut rows = profiles::table
            .filter(profiles::member_ref.eq_any(batch))
            .load::<Profile>(conn)?;
        loaded.append(&mut rows);
    }

    // Preserve the caller's ordering
    loaded.sort_by_key(|p| {
        member_refs
            .iter()
            .position(|r| *r == p.member_ref)
            .unwrap_or(usize::MAX)
    });

    let keys: Vec<String> = loaded.iter().map(|p| format!("online:{}", p.member_ref)).collect();
    let online = state
        .redis
        .exists_multi(&keys)
        .await
        .unwrap_or_else(|_| vec![false; loaded.len()]);

    let snapshots = loaded
        .into_iter()
        .zip(online.into_iter().chain(std::iter::repeat(false)))
        .map(|(p, is_online)| MemberSnapshot {
            photo_url: p.primary_photo(),
            member_ref: p.member_ref,
            display_name: p.display_name,
            city: p.city,
            is_online: is_online || p.is_online,
        })
        .collect();

    Ok(snapshots)
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub a: String,
    pub b: String,
}

/// GET /internal/blocks/pair?a=..&b=.. - block edges between two members,
/// both directions. Messaging derives its conversation flags from this.
pub async fn pair_block_status(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PairQuery>,
) -> AppResult<Json<ApiResponse<PairBlockStatus>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let edges: Vec<(String, String)> = blocks::table
        .filter(
            blocks::blocker.eq(&q.a).and(blocks::blocked.eq(&q.b)).or(
                blocks::blocker.eq(&q.b).and(blocks::blocked.eq(&q.a)),
            ),
        )
        .select((blocks::blocker, blocks::blocked))
        .load::<(String, String)>(&mut conn)?;

    let status = PairBlockStatus {
        a_blocks_b: edges.iter().any(|(blocker, _)| *blocker == q.a),
        b_blocks_a: edges.iter().any(|(blocker, _)| *blocker == q.b),
    };

    Ok(Json(ApiResponse::ok(status)))
}

/// GET /internal/discover/:member_ref - the discoverable candidate set for a
/// viewer: discovery on, viewer excluded, gender preference applied, and
/// anyone who blocked the viewer removed. All filters run store-side.
pub async fn discover_candidates(
    State(state): State<Arc<AppState>>,
    Path(member_ref): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<DiscoverCandidate>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profiles::table
        .filter(profiles::member_ref.eq(&member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "viewer profile not found"))?;

    // Members who have blocked the viewer never appear
    let blockers: Vec<String> = blocks::table
        .filter(blocks::blocked.eq(&member_ref))
        .select(blocks::blocker)
        .load::<String>(&mut conn)?;

    let mut query = profiles::table
        .filter(profiles::profile_discovery.eq(true))
        .filter(profiles::onboarding_complete.eq(true))
        .filter(profiles::member_ref.ne(&member_ref))
        .into_boxed();

    if !blockers.is_empty() {
        query = query.filter(profiles::member_ref.ne_all(blockers));
    }

    if let Some(wanted) = complementary_gender(&viewer.gender_preference) {
        query = query.filter(profiles::gender.eq(wanted.to_string()));
    }

    let rows: Vec<Profile> = query.load::<Profile>(&mut conn)?;

    let keys: Vec<String> = rows.iter().map(|p| format!("online:{}", p.member_ref)).collect();
    let online = state
        .redis
        .exists_multi(&keys)
        .await
        .unwrap_or_else(|_| vec![false; rows.len()]);

    let candidates = rows
        .into_iter()
        .zip(online.into_iter().chain(std::iter::repeat(false)))
        .map(|(p, is_online)| DiscoverCandidate {
            photo_url: p.primary_photo(),
            passions: p.passions_list(),
            interests: p.interests_list(),
            member_ref: p.member_ref,
            display_name: p.display_name,
            city: p.city,
            is_online: is_online || p.is_online,
        })
        .collect();

    Ok(Json(ApiResponse::ok(candidates)))
}

/// Gender the viewer's preference selects for, if the preference narrows at
/// all. `Everyone` and anything unrecognized apply no filter.
pub fn complementary_gender(preference: &str) -> Option<&'static str> {
    match preference {
        "Female" => Some("Female"),
        "Male" => Some("Male"),
        _ => None,
    }
}

/// Attributes the aggregator scores in memory for the viewer side.
#[derive(Debug, Serialize)]
pub struct ViewerAttrsPayload {
    pub member_ref: String,
    pub passions: Vec<String>,
    pub interests: Vec<String>,
}

/// GET /internal/attrs/:member_ref - viewer-side scoring attributes
pub async fn viewer_attrs(
    State(state): State<Arc<AppState>>,
    Path(member_ref): Path<String>,
) -> AppResult<Json<ApiResponse<ViewerAttrsPayload>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profiles::table
        .filter(profiles::member_ref.eq(&member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "viewer profile not found"))?;

    Ok(Json(ApiResponse::ok(ViewerAttrsPayload {
        passions: viewer.passions_list(),
        interests: viewer.interests_list(),
        member_ref: viewer.member_ref,
    })))
}

/// GET /internal/cohorts/:member_ref - the cohort id-lists for a viewer.
/// One store-side equality query per attribute the viewer has filled in;
/// edge-derived lists come straight off the edge tables.
pub async fn cohort_lists(
    State(state): State<Arc<AppState>>,
    Path(member_ref): Path<String>,
) -> AppResult<Json<ApiResponse<CohortListsPayload>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profiles::table
        .filter(profiles::member_ref.eq(&member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "viewer profile not found"))?;

    // One equality query per attribute the viewer has filled in; an unset
    // attribute yields an empty cohort.
    macro_rules! attribute_cohort {
        ($column:expr, $viewer_value:expr) => {
            match $viewer_value.as_deref() {
                Some(value) => profiles::table
                    .filter(profiles::profile_discovery.eq(true))
                    .filter(profiles::member_ref.ne(&member_ref))
                    .filter($column.eq(value))
                    .select(profiles::member_ref)
                    .load::<String>(&mut conn)?,
                None => vec![],
            }
        };
    }

    let mut payload = CohortListsPayload::default();

    payload.same_day_job = attribute_cohort!(profiles::day_job, viewer.day_job);
    payload.same_religion = attribute_cohort!(profiles::religion, viewer.religion);
    payload.same_degree = attribute_cohort!(profiles::degree, viewer.degree);
    payload.same_origin_country = attribute_cohort!(profiles::origin_country, viewer.origin_country);
    payload.same_settled_country = attribute_cohort!(profiles::settled_country, viewer.settled_country);
    payload.same_city = attribute_cohort!(profiles::city, viewer.city);
    payload.same_mother_tongue = attribute_cohort!(profiles::mother_tongue, viewer.mother_tongue);
    payload.same_star_sign = attribute_cohort!(profiles::star_sign, viewer.star_sign);

    payload.shortlisted = shortlists::table
        .filter(shortlists::shortlisted_by.eq(&member_ref))
        .select(shortlists::shortlisted_user)
        .load::<String>(&mut conn)?;

    payload.likes_me = favorites::table
        .filter(favorites::liked_user.eq(&member_ref))
        .select(favorites::liked_by)
        .load::<String>(&mut conn)?;

    payload.liked = favorites::table
        .filter(favorites::liked_by.eq(&member_ref))
        .select(favorites::liked_user)
        .load::<String>(&mut conn)?;

    Ok(Json(ApiResponse::ok(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everyone_preference_keeps_both_genders() {
        assert_eq!(complementary_gender("Everyone"), None);
        assert_eq!(complementary_gender(""), None);
        assert_eq!(complementary_gender("nonbinary-unset"), None);
    }

    #[test]
    fn narrow_preference_selects_that_gender() {
        assert_eq!(complementary_gender("Female"), Some("Female"));
        assert_eq!(complementary_gender("Male"), Some("Male"));
    }
}
