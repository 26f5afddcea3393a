//! REST API definitions.

pub mod booking;
pub mod room;
pub mod session;

use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use common::{pagination, Money};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Name of the [`tracing::Span`] for the REST API handlers.
const SPAN_NAME: &str = "REST request";

/// JSON request body rejected with an [`Error`].
pub type JsonBody<T> = WithRejection<Json<T>, Error>;

/// Path parameters rejected with an [`Error`].
pub type Params<T> = WithRejection<Path<T>, Error>;

/// Query string rejected with an [`Error`].
pub type QueryString<T> = WithRejection<Query<T>, Error>;

/// Builds the [`Router`] of the REST API.
///
/// Every route is accepted with a trailing slash as well.
pub fn router() -> Router {
    [
        ("/rooms", get(room::list).post(room::create)),
        ("/rooms/available", get(room::available)),
        (
            "/rooms/:id",
            get(room::get).put(room::update).delete(room::delete),
        ),
        ("/rooms/:id/availability", get(room::availability)),
        ("/bookings", get(booking::list).post(booking::create)),
        ("/bookings/stats", get(booking::stats)),
        ("/bookings/user/:email", get(booking::by_user)),
        ("/bookings/status/:status", get(booking::by_status)),
        ("/bookings/:id", get(booking::get).put(booking::update)),
        ("/sessions", post(session::create)),
    ]
    .into_iter()
    .fold(Router::new(), |router, (path, handler): (_, MethodRouter)| {
        router
            .route(path, handler.clone())
            .route(&format!("{path}/"), handler)
    })
}

/// Envelope of a successful response.
#[derive(Clone, Debug, Serialize)]
pub struct Envelope<T> {
    /// Always `true`.
    success: bool,

    /// Payload of the response.
    data: T,

    /// Human-readable outcome of the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,

    /// Number of items in the [`Envelope::data`], or in the whole list
    /// when the [`Envelope::data`] is a page of it.
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,

    /// [`PageInfo`] of the [`Envelope::data`] page.
    #[serde(skip_serializing_if = "Option::is_none")]
    page_info: Option<PageInfo>,
}

impl<T> Envelope<T> {
    /// Wraps the provided `data` into a new [`Envelope`].
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            count: None,
            page_info: None,
        }
    }

    /// Attaches the provided `message` to this [`Envelope`].
    #[must_use]
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl<T> Envelope<Vec<T>> {
    /// Wraps the provided page `items` into a new [`Envelope`] along with the
    /// `total` count of the whole list.
    #[must_use]
    pub fn paged(items: Vec<T>, total: usize, page_info: PageInfo) -> Self {
        Self {
            count: Some(total),
            page_info: Some(page_info),
            ..Self::new(items)
        }
    }

    /// Wraps the provided `items` into a new [`Envelope`] along with their
    /// count.
    #[must_use]
    pub fn counted(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::new(items)
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Information about a page of a list.
#[derive(Clone, Debug, Serialize)]
pub struct PageInfo {
    /// Cursor of the first item on the page.
    pub start_cursor: Option<String>,

    /// Cursor of the last item on the page.
    pub end_cursor: Option<String>,

    /// Indicator whether the list has a next page.
    pub has_next_page: bool,

    /// Indicator whether the list has a previous page.
    pub has_previous_page: bool,
}

impl<C: ToString> From<pagination::PageInfo<C>> for PageInfo {
    fn from(info: pagination::PageInfo<C>) -> Self {
        Self {
            start_cursor: info.start_cursor.as_ref().map(ToString::to_string),
            end_cursor: info.end_cursor.as_ref().map(ToString::to_string),
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
        }
    }
}

/// Price accepted and returned as a JSON number.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "common::money::serde::number")] pub Money);

/// Parses the provided request `field` value, reporting a validation
/// [`Error`] on failure.
///
/// # Errors
///
/// If the `parse` function rejects the `value`.
pub fn parse<V, T>(
    field: &'static str,
    value: V,
    parse: impl FnOnce(V) -> Option<T>,
) -> Result<T, Error> {
    parse(value)
        .ok_or_else(|| Error::validation(&format!("invalid `{field}` value")))
}

/// Parses the provided textual request `field` value with its [`FromStr`]
/// implementation.
///
/// # Errors
///
/// If the [`FromStr`] implementation rejects the `value`.
///
/// [`FromStr`]: std::str::FromStr
pub fn parse_str<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, Error> {
    parse(field, value, |v| v.trim().parse().ok())
}
