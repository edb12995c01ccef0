use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{ColumnsResponse, SearchCriteria, SearchRequest, SearchResponse};
use super::repo::load_table;
use super::repo_types::Table;
use super::services::{list_columns, search, SearchQuery};
use crate::{
    auth::{extractors::CurrentSession, session::Session},
    error::DataAccessError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/materials/columns", get(get_columns))
        .route("/materials/search", post(post_search))
}

/// The session's table, loading it on first use.
async fn session_table(
    state: &AppState,
    session: &Session,
) -> Result<Arc<Table>, (StatusCode, String)> {
    if let Some(table) = &session.table {
        return Ok(table.clone());
    }
    let table = load_table(&state.config.materials_path)
        .await
        .map_err(data_access)?;
    info!(
        session_id = %session.id,
        rows = table.nrows(),
        "materials table loaded for session"
    );
    state
        .sessions
        .attach_table(session.id, Arc::new(table))
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "session expired".into()))
}

fn data_access(e: DataAccessError) -> (StatusCode, String) {
    let status = match &e {
        DataAccessError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(error = %e, "materials table unavailable");
    (status, e.to_string())
}

#[instrument(skip(state, session), fields(username = %session.username))]
pub async fn get_columns(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ColumnsResponse>, (StatusCode, String)> {
    let table = session_table(&state, &session).await?;
    Ok(Json(ColumnsResponse {
        manifest: list_columns(&table),
        rows: table.nrows(),
    }))
}

#[instrument(skip(state, session, payload), fields(username = %session.username))]
pub async fn post_search(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let table = session_table(&state, &session).await?;

    let default_max = table
        .column_index(&payload.price_column)
        .and_then(|idx| table.column_max(idx))
        .unwrap_or(0.0);
    let query = SearchQuery {
        term: payload.term,
        text_column: payload.search_column,
        numeric_column: payload.price_column,
        min: payload.min.unwrap_or(0.0),
        max: payload.max.unwrap_or(default_max),
    };
    let criteria = SearchCriteria {
        search_column: query.text_column.clone(),
        price_column: query.numeric_column.clone(),
        term: query.term.clone(),
        min: query.min,
        max: query.max,
    };

    let response = match search(&table, &query) {
        Ok(found) => {
            info!(count = found.nrows(), "search done");
            SearchResponse {
                criteria,
                count: found.nrows(),
                columns: found.columns,
                rows: found.rows,
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "search could not be applied");
            SearchResponse {
                criteria,
                columns: table.columns.clone(),
                rows: Vec::new(),
                count: 0,
                error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}
