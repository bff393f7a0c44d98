use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::api::ApiResponse;
use amoura_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::models::{find_plan, NewSubscription, Plan, Subscription, PLANS};
use crate::schema::subscriptions;
use crate::AppState;

/// GET /plans - the purchasable plan catalogue
pub async fn list_plans() -> Json<ApiResponse<Vec<Plan>>> {
    Json(ApiResponse::ok(PLANS.to_vec()))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub session_id: String,
}

/// POST /checkout - create a gateway checkout session for a plan
pub async fn create_checkout(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let plan = find_plan(&req.plan_id)
        .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound, "unknown plan"))?;

    let session = state
        .gateway
        .create_session(
            &user.member_ref,
            plan.id,
            plan.price_cents,
            &state.config.checkout_success_url,
            &state.config.checkout_cancel_url,
        )
        .await?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let pending = NewSubscription {
        member_ref: user.member_ref.clone(),
        plan: plan.id.to_string(),
        status: "pending".to_string(),
        checkout_session_id: session.id.clone(),
    };
    diesel::insert_into(subscriptions::table)
        .values(&pending)
        .execute(&mut conn)?;

    tracing::info!(
        member_ref = %user.member_ref,
        plan = %plan.id,
        session_id = %session.id,
        "checkout session created"
    );

    Ok(Json(ApiResponse::ok(CheckoutResponse {
        checkout_url: session.url,
        session_id: session.id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: String,
}

/// GET /checkout/success?session_id=... - the post-payment redirect target.
/// The session id from the redirect is only a lookup key; the gateway's own
/// API decides whether anything was paid.
pub async fn checkout_success(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<SuccessQuery>,
) -> AppResult<Json<ApiResponse<Subscription>>> {
    let status = state.gateway.verify_session(&q.session_id).await?;

    if !status.is_paid() {
        tracing::warn!(
            member_ref = %user.member_ref,
            session_id = %q.session_id,
            payment_status = %status.payment_status,
            "checkout redirect without a paid session"
        );
        return Err(AppError::new(ErrorCode::PaymentNotVerified, "payment has not completed"));
    }

    let subscription = activate(&state, &q.session_id).await?;
    Ok(Json(ApiResponse::ok(subscription)))
}

/// Flip a pending subscription to active and announce it. Idempotent: a
/// second activation of the same session returns the active row unchanged.
pub async fn activate(state: &AppState, session_id: &str) -> AppResult<Subscription> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let subscription: Subscription = subscriptions::table
        .filter(subscriptions::checkout_session_id.eq(session_id))
        .first::<Subscription>(&mut conn)
        .optional()?
        .ok_or_else(|| {
            AppError::new(ErrorCode::CheckoutSessionNotFound, "unknown checkout session")
        })?;

    if subscription.status == "active" {
        return Ok(subscription);
    }

    let activated: Subscription = diesel::update(subscriptions::table.find(subscription.id))
        .set((
            subscriptions::status.eq("active"),
            subscriptions::activated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    publisher::publish_subscription_activated(&state.rabbitmq, &activated.member_ref, &activated.plan)
        .await;

    tracing::info!(
        member_ref = %activated.member_ref,
        plan = %activated.plan,
        "subscription activated"
    );

    Ok(activated)
}

/// GET /subscription - the viewer's current subscription, if any
pub async fn my_subscription(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Option<Subscription>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let subscription = subscriptions::table
        .filter(subscriptions::member_ref.eq(&user.member_ref))
        .filter(subscriptions::status.eq("active"))
        .order(subscriptions::created_at.desc())
        .first::<Subscription>(&mut conn)
        .optional()?;

    Ok(Json(ApiResponse::ok(subscription)))
}
