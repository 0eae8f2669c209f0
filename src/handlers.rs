use axum::{
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use minijinja::{context, Environment};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{fanout, Error, Fortune, Store, World};

pub const FORTUNES_TEMPLATE: &str = "fortunes.html";
pub const MIN_QUERIES: i64 = 1;
pub const MAX_QUERIES: i64 = 500;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub templates: Arc<Environment<'static>>,
}

/// Template environment for the HTML endpoints. The `.html` name turns on
/// minijinja's HTML auto-escaping for every interpolated value.
pub fn template_environment() -> Result<Environment<'static>, Error> {
    let mut env = Environment::new();
    env.add_template(FORTUNES_TEMPLATE, include_str!("../templates/fortunes.html"))?;
    Ok(env)
}

#[derive(Deserialize, Default)]
struct QueriesParam {
    queries: Option<String>,
}

/// Number of operations asked for by the `queries` parameter of a raw query
/// string, clamped to 1..=500. Missing or unparsable values count as 1.
pub fn query_count(raw_query: Option<&str>) -> usize {
    let params: QueriesParam =
        serde_urlencoded::from_str(raw_query.unwrap_or_default()).unwrap_or_default();
    let requested = params
        .queries
        .and_then(|queries| queries.parse::<i64>().ok())
        .unwrap_or(MIN_QUERIES);
    requested.clamp(MIN_QUERIES, MAX_QUERIES) as usize
}

/// Error response of a handler: plain text `Error: <description>`, where the
/// description is the store's or template engine's own message.
#[derive(Debug)]
pub struct HandlerError {
    status: StatusCode,
    error: Error,
}

impl HandlerError {
    pub fn bad_request(error: Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    pub fn internal(error: Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        error!("{}", self.error);
        let body = match self.error {
            Error::Unknown => String::from("Unknown error"),
            Error::SqlxError(err) => format!("Error: {err}"),
            Error::Template(err) => format!("Error: {err}"),
            error => format!("Error: {error}"),
        };
        (self.status, body).into_response()
    }
}

pub async fn db(State(state): State<AppState>) -> Result<Json<World>, HandlerError> {
    let world = state
        .store
        .random_world()
        .await
        .map_err(HandlerError::bad_request)?;
    Ok(Json(world))
}

pub async fn queries(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<World>>, HandlerError> {
    let count = query_count(query.as_deref());
    debug!("Fetching {count} worlds");
    let worlds = fanout::fetch_worlds(&state.store, count)
        .await
        .map_err(HandlerError::bad_request)?;
    Ok(Json(worlds))
}

pub async fn updates(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<World>>, HandlerError> {
    let count = query_count(query.as_deref());
    debug!("Updating {count} worlds");
    let worlds = fanout::update_worlds(&state.store, count)
        .await
        .map_err(HandlerError::bad_request)?;
    Ok(Json(worlds))
}

/// Stored fortunes plus the request-time one, sorted by message.
pub fn with_additional_fortune(mut fortunes: Vec<Fortune>) -> Vec<Fortune> {
    fortunes.push(Fortune::additional());
    fortunes.sort();
    fortunes
}

pub async fn fortunes(State(state): State<AppState>) -> Result<Response, HandlerError> {
    let fortunes = state
        .store
        .fortunes()
        .await
        .map_err(HandlerError::internal)?;
    let fortunes = with_additional_fortune(fortunes);
    let page = state
        .templates
        .get_template(FORTUNES_TEMPLATE)
        .and_then(|template| template.render(context! { fortunes => fortunes }))
        .map_err(|err| HandlerError::internal(err.into()))?;
    Ok(([(CONTENT_TYPE, "text/html; charset=UTF-8")], page).into_response())
}
