// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::{EventCreatedResponse, STATUS_SUCCESS},
    state::AppState,
    storage::{EventDescriptor, NewEvent},
    validation::parse_event_id,
};

#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "Events",
    responses((status = 200, description = "All events, latest start first", body = [EventDescriptor]))
)]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventDescriptor>>, ApiError> {
    Ok(Json(state.db.list_events()?))
}

#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = NewEvent,
    tag = "Events",
    responses(
        (status = 201, body = EventCreatedResponse),
        (status = 400, description = "Invalid event data")
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<EventCreatedResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::bad_request(format!("Invalid event data: {}", rejection.body_text()))
            .with_code("invalid_input")
    })?;

    let event = state.db.create_event(request)?;
    tracing::info!(event_id = event.id, name = %event.name, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(EventCreatedResponse {
            status: STATUS_SUCCESS.to_string(),
            message: "Event created successfully".to_string(),
            event,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/events/{event_id}",
    params(
        ("event_id" = u64, Path, description = "Positive event identifier")
    ),
    tag = "Events",
    responses(
        (status = 200, body = EventDescriptor),
        (status = 400, description = "Invalid event ID"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<EventDescriptor>, ApiError> {
    let id = parse_event_id(&event_id)
        .map_err(|e| ApiError::bad_request(e.to_string()).with_code("invalid_input"))?;

    state
        .db
        .get_event(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Event not found").with_code("event_not_found"))
}
