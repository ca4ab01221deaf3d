use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use helpdesk_core::model::{Comment, NewComment};
use serde::Deserialize;
use std::sync::Arc;

use super::{AppState, with_store};
use crate::error::ApiError;

/// Body of `POST /comments`. All three fields are required.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    pub ticket_id: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
}

impl From<CreateCommentRequest> for NewComment {
    fn from(body: CreateCommentRequest) -> Self {
        Self {
            ticket_id: body.ticket_id.unwrap_or_default(),
            author: body.author.unwrap_or_default(),
            content: body.content.unwrap_or_default(),
        }
    }
}

pub(super) async fn create_comment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Json(body) = payload?;
    let new = NewComment::from(body);

    let comment = with_store(&state, move |store| store.add_comment(new)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
