use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use helpdesk_core::db::query::{TicketFilter, TicketStats};
use helpdesk_core::model::{NewTicket, Priority, Status, Ticket, TicketDetails, TicketPatch};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use super::{AppState, parse_optional, with_store};
use crate::error::ApiError;

/// Query string for `GET /tickets`. `all` or empty means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// Body of `POST /tickets`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

/// Body of `PATCH /tickets/:id`.
///
/// `assigned_to: null` unassigns; omitting it leaves the assignee alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub assigned_to: Option<Option<String>>,
    pub is_deleted: Option<bool>,
    pub performed_by: Option<String>,
}

fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateTicketRequest {
    fn into_patch(self) -> Result<(TicketPatch, Option<String>), ApiError> {
        let patch = TicketPatch {
            status: parse_optional::<Status>(self.status)?,
            priority: parse_optional::<Priority>(self.priority)?,
            assigned_to: self.assigned_to,
            is_deleted: self.is_deleted,
        };
        Ok((patch, self.performed_by))
    }
}

pub(super) async fn list_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListTicketsParams>, QueryRejection>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Query(params) = params?;
    let filter = TicketFilter::from_params(
        params.status.as_deref(),
        params.priority.as_deref(),
        params.category.as_deref(),
    )
    .map_err(|err| ApiError::Store(err.into()))?;

    let tickets = with_store(&state, move |store| store.list_tickets(&filter)).await?;
    Ok(Json(tickets))
}

pub(super) async fn create_ticket(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Json(body) = payload?;
    let new = NewTicket {
        title: body.title.unwrap_or_default(),
        description: body.description.unwrap_or_default(),
        category: body.category,
        priority: parse_optional::<Priority>(body.priority)?,
    };

    let ticket = with_store(&state, move |store| store.create_ticket(new)).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub(super) async fn ticket_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TicketStats>, ApiError> {
    let stats = with_store(&state, |store| store.stats()).await?;
    Ok(Json(stats))
}

pub(super) async fn ticket_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketDetails>, ApiError> {
    let details = with_store(&state, move |store| store.ticket_details(&id)).await?;
    Ok(Json(details))
}

pub(super) async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTicketRequest>, JsonRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Json(body) = payload?;
    let (patch, performed_by) = body.into_patch()?;

    let ticket = with_store(&state, move |store| {
        store.update_ticket(&id, &patch, performed_by.as_deref())
    })
    .await?;
    Ok(Json(ticket))
}
