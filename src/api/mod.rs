// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    attendance::UserCheckin,
    blockchain::{CheckInEventData, VerifiedTransaction},
    models::{
        BlockchainInfo, BlockchainInfoResponse, CheckinUser, EventCheckinRequest,
        EventCheckinResponse, EventCreatedResponse, EventIdParam, LoginWalletRequest,
        LoginWalletResponse, UserCheckinsResponse, WalletUser,
    },
    state::AppState,
    storage::{EventDescriptor, NewEvent},
};

pub mod checkins;
pub mod events;
pub mod health;
pub mod login;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/login_wallet", post(login::login_wallet))
        .route("/event_checkin", post(checkins::event_checkin))
        .route("/checkins/{address}", get(checkins::user_checkins))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/{event_id}", get(events::get_event))
        .route("/blockchain/info", get(health::blockchain_info))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        login::login_wallet,
        checkins::event_checkin,
        checkins::user_checkins,
        events::list_events,
        events::create_event,
        events::get_event,
        health::blockchain_info,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginWalletRequest,
            LoginWalletResponse,
            WalletUser,
            EventIdParam,
            EventCheckinRequest,
            EventCheckinResponse,
            CheckinUser,
            UserCheckin,
            UserCheckinsResponse,
            EventDescriptor,
            NewEvent,
            EventCreatedResponse,
            VerifiedTransaction,
            CheckInEventData,
            BlockchainInfo,
            BlockchainInfoResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Signed-nonce wallet login"),
        (name = "Check-ins", description = "On-chain verified event attendance"),
        (name = "Events", description = "Event catalogue"),
        (name = "Blockchain", description = "Node and contract status"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
