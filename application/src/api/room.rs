//! REST API of [`Room`]s.

use axum::{extract::Path, Json};
use axum_extra::extract::WithRejection;
use common::{Date, Money};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{reservation, room},
    query, read, Command as _,
};

use crate::{define_error, AsError, Context, Error};

use super::{
    parse, parse_str, Envelope, JsonBody, Params, Price, QueryString,
    SPAN_NAME,
};

/// Hotel room.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// ID of this [`Room`].
    pub id: room::Id,

    /// Human-facing number of this [`Room`].
    pub room_number: String,

    /// Category of this [`Room`].
    pub room_type: String,

    /// Price of a single night in this [`Room`].
    #[serde(with = "common::money::serde::number")]
    pub price_per_night: Money,

    /// Administrative status of this [`Room`].
    pub status: room::Status,

    /// Features of this [`Room`].
    pub special_features: Vec<String>,

    /// Image references of this [`Room`] in their display order.
    pub images: Vec<String>,

    /// When this [`Room`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: room::CreationDateTime,
}

impl From<room::Room> for Room {
    fn from(room: room::Room) -> Self {
        Self {
            id: room.id,
            room_number: room.number.to_string(),
            room_type: room.category.to_string(),
            price_per_night: room.price_per_night,
            status: room.status,
            special_features: room
                .features
                .iter()
                .map(ToString::to_string)
                .collect(),
            images: room.images.iter().map(ToString::to_string).collect(),
            created_at: room.created_at,
        }
    }
}

/// Request creating a new [`Room`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Number of the [`Room`].
    pub room_number: String,

    /// Category of the [`Room`].
    pub room_type: String,

    /// Price of a single night.
    pub price_per_night: Price,

    /// Status of the [`Room`], `Available` by default.
    pub status: Option<String>,

    /// Features of the [`Room`].
    #[serde(default)]
    pub special_features: Vec<String>,

    /// Image references of the [`Room`].
    #[serde(default)]
    pub images: Vec<String>,
}

impl TryFrom<CreateRequest> for command::CreateRoom {
    type Error = Error;

    fn try_from(req: CreateRequest) -> Result<Self, Self::Error> {
        let CreateRequest {
            room_number,
            room_type,
            price_per_night: Price(price_per_night),
            status,
            special_features,
            images,
        } = req;

        Ok(Self {
            number: parse("roomNumber", room_number, room::Number::new)?,
            category: parse("roomType", room_type, room::Category::new)?,
            price_per_night,
            status: status
                .map(|s| parse_str("status", &s))
                .transpose()?
                .unwrap_or(room::Status::Available),
            features: features(special_features)?,
            images: images_of(images)?,
        })
    }
}

/// Request updating a [`Room`] partially.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// New number of the [`Room`].
    pub room_number: Option<String>,

    /// New category of the [`Room`].
    pub room_type: Option<String>,

    /// New price of a single night.
    pub price_per_night: Option<Price>,

    /// New status of the [`Room`].
    pub status: Option<String>,

    /// New features of the [`Room`], replacing the existing ones.
    pub special_features: Option<Vec<String>>,

    /// New image references of the [`Room`], replacing the existing ones.
    pub images: Option<Vec<String>>,
}

impl UpdateRequest {
    /// Converts this [`UpdateRequest`] into a [`command::UpdateRoom`] of the
    /// [`Room`] with the provided ID.
    fn into_command(
        self,
        room_id: room::Id,
    ) -> Result<command::UpdateRoom, Error> {
        let Self {
            room_number,
            room_type,
            price_per_night,
            status,
            special_features,
            images,
        } = self;

        Ok(command::UpdateRoom {
            room_id,
            number: room_number
                .map(|n| parse("roomNumber", n, room::Number::new))
                .transpose()?,
            category: room_type
                .map(|c| parse("roomType", c, room::Category::new))
                .transpose()?,
            price_per_night: price_per_night.map(|Price(p)| p),
            status: status.map(|s| parse_str("status", &s)).transpose()?,
            features: special_features.map(features).transpose()?,
            images: images.map(images_of).transpose()?,
        })
    }
}

/// Parses the provided `specialFeatures` request field.
fn features(features: Vec<String>) -> Result<Vec<room::Feature>, Error> {
    features
        .into_iter()
        .map(|f| parse("specialFeatures", f, room::Feature::new))
        .collect()
}

/// Parses the provided `images` request field.
fn images_of(images: Vec<String>) -> Result<Vec<room::Image>, Error> {
    images
        .into_iter()
        .map(|i| parse("images", i, room::Image::new))
        .collect()
}

/// Query string of the available [`Room`]s search.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableParams {
    /// Part of the category to look for.
    pub room_type: Option<String>,

    /// Minimal price of a night.
    pub min_price: Option<String>,

    /// Maximal price of a night.
    pub max_price: Option<String>,

    /// Status to match exactly.
    pub status: Option<String>,

    /// First night of the window to be free within.
    #[serde(rename = "check_in")]
    pub check_in: Option<Date>,

    /// Departure of the window to be free within.
    #[serde(rename = "check_out")]
    pub check_out: Option<Date>,
}

impl TryFrom<AvailableParams> for query::rooms::Available {
    type Error = Error;

    fn try_from(params: AvailableParams) -> Result<Self, Self::Error> {
        let AvailableParams {
            room_type,
            min_price,
            max_price,
            status,
            check_in,
            check_out,
        } = params;

        let given = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        Ok(Self {
            category: given(room_type)
                .map(|c| parse("roomType", c.trim(), room::Category::new))
                .transpose()?,
            min_price: given(min_price)
                .map(|p| parse_str("minPrice", &p))
                .transpose()?,
            max_price: given(max_price)
                .map(|p| parse_str("maxPrice", &p))
                .transpose()?,
            status: given(status)
                .map(|s| parse_str("status", &s))
                .transpose()?,
            check_in,
            check_out,
        })
    }
}

/// Query string of a [`Room`] availability check.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct AvailabilityParams {
    /// First night of the requested stay.
    pub check_in: Date,

    /// Departure of the requested stay.
    pub check_out: Date,

    /// ID of the booking to ignore.
    pub excluding: Option<reservation::Id>,
}

/// Availability of a [`Room`] for a stay.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// ID of the checked [`Room`].
    pub room_id: room::Id,

    /// First night of the checked stay.
    pub check_in: Date,

    /// Departure of the checked stay.
    pub check_out: Date,

    /// Indicator whether the [`Room`] may be booked for the stay.
    pub available: bool,
}

/// Lists all the [`Room`]s ordered by their numbers.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "listRooms"),
)]
pub async fn list(ctx: Context) -> Result<Envelope<Vec<Room>>, Error> {
    let rooms = ctx
        .service()
        .execute(query::rooms::List::by(read::room::Filter::default()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::counted(rooms.into_iter().map(Into::into).collect()))
}

/// Creates a new [`Room`].
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - request data is malformed;
/// - `CONFLICT` - the room number is occupied by another `Room`.
#[tracing::instrument(
    skip_all,
    fields(
        otel.name = SPAN_NAME,
        rest.name = "createRoom",
        room.number = %req.room_number,
    ),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(req), _): JsonBody<CreateRequest>,
) -> Result<Envelope<Room>, Error> {
    ctx.require_staff().await?;

    let room = ctx
        .service()
        .execute(command::CreateRoom::try_from(req)?)
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(room.into()).with_message("Room created successfully"))
}

/// Searches [`Room`]s available for booking.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - search parameters are malformed.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "availableRooms"),
)]
pub async fn available(
    ctx: Context,
    WithRejection(axum::extract::Query(params), _): QueryString<
        AvailableParams,
    >,
) -> Result<Envelope<Vec<Room>>, Error> {
    let rooms = ctx
        .service()
        .execute(query::rooms::Available::try_from(params)?)
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::counted(rooms.into_iter().map(Into::into).collect()))
}

/// Returns the [`Room`] by its ID.
///
/// # Errors
///
/// Possible error codes:
/// - `NOT_FOUND` - the `Room` doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "getRoom", room.id = %id),
)]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): Params<room::Id>,
) -> Result<Envelope<Room>, Error> {
    ctx.service()
        .execute(query::room::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| RoomError::NotFound.into())
        .map(|r| Envelope::new(r.into()))
}

/// Updates the [`Room`] with the provided fields.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - request data is malformed;
/// - `NOT_FOUND` - the `Room` doesn't exist;
/// - `CONFLICT` - the new room number is occupied by another `Room`.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "updateRoom", room.id = %id),
)]
pub async fn update(
    ctx: Context,
    WithRejection(Path(id), _): Params<room::Id>,
    WithRejection(Json(req), _): JsonBody<UpdateRequest>,
) -> Result<Envelope<Room>, Error> {
    ctx.require_staff().await?;

    let room = ctx
        .service()
        .execute(req.into_command(id)?)
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(room.into()).with_message("Room updated successfully"))
}

/// Deletes the [`Room`].
///
/// # Errors
///
/// Possible error codes:
/// - `NOT_FOUND` - the `Room` doesn't exist;
/// - `CONFLICT` - the `Room` has active bookings.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "deleteRoom", room.id = %id),
)]
pub async fn delete(
    ctx: Context,
    WithRejection(Path(id), _): Params<room::Id>,
) -> Result<Envelope<Room>, Error> {
    ctx.require_staff().await?;

    let room = ctx
        .service()
        .execute(command::DeleteRoom { room_id: id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(room.into()).with_message("Room deleted successfully"))
}

/// Checks whether the [`Room`] may be booked for the provided stay.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - the stay is malformed;
/// - `NOT_FOUND` - the `Room` doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        otel.name = SPAN_NAME,
        rest.name = "roomAvailability",
        room.id = %id,
    ),
)]
pub async fn availability(
    ctx: Context,
    WithRejection(Path(id), _): Params<room::Id>,
    WithRejection(axum::extract::Query(params), _): QueryString<
        AvailabilityParams,
    >,
) -> Result<Envelope<Availability>, Error> {
    let AvailabilityParams {
        check_in,
        check_out,
        excluding,
    } = params;

    let available = ctx
        .service()
        .execute(query::availability::IsFree {
            room_id: id,
            check_in,
            check_out,
            excluding,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(Availability {
        room_id: id,
        check_in,
        check_out,
        available,
    }))
}

impl AsError for command::create_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NumberOccupied(_) => Some(RoomError::NumberOccupied.into()),
        }
    }
}

impl AsError for command::update_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RoomNotExists(_) => Some(RoomError::NotFound.into()),
            Self::NumberOccupied(_) => Some(RoomError::NumberOccupied.into()),
        }
    }
}

impl AsError for command::delete_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RoomNotExists(_) => Some(RoomError::NotFound.into()),
            Self::RoomHasActiveReservations(_) => {
                Some(RoomError::HasActiveReservations.into())
            }
        }
    }
}

impl AsError for query::rooms::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidDateRange { .. } => {
                Some(RoomError::InvalidDateRange.into())
            }
            Self::IncompleteDateRange => {
                Some(RoomError::IncompleteDateRange.into())
            }
        }
    }
}

impl AsError for query::availability::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidDateRange { .. } => {
                Some(RoomError::InvalidDateRange.into())
            }
            Self::RoomNotExists(_) => Some(RoomError::NotFound.into()),
        }
    }
}

define_error! {
    enum RoomError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Room not found"]
        NotFound,

        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "Room number already exists"]
        NumberOccupied,

        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "Room has active bookings"]
        HasActiveReservations,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Check-out date must follow check-in date"]
        InvalidDateRange,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Both check-in and check-out dates must be provided"]
        IncompleteDateRange,
    }
}

#[cfg(test)]
mod spec {
    use http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_util::{
        call, create_booking, create_room, day, service, staff_token,
    };

    #[tokio::test]
    async fn creates_room_in_camel_case() {
        let svc = service();
        let token = staff_token(&svc).await;

        let (status, json) = call(
            &svc,
            Method::POST,
            "/rooms/",
            Some(&token),
            Some(json!({
                "roomNumber": "R101",
                "roomType": "Deluxe",
                "pricePerNight": 100.5,
                "status": "maintenance",
                "specialFeatures": ["Balcony", "Minibar", "Balcony"],
                "images": ["r101.jpg"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Room created successfully");

        let id = json["data"]["id"].as_str().unwrap();
        let (status, json) =
            call(&svc, Method::GET, &format!("/rooms/{id}"), None, None)
                .await;
        assert_eq!(status, StatusCode::OK);
        let room = &json["data"];
        assert_eq!(room["roomNumber"], "R101");
        assert_eq!(room["roomType"], "Deluxe");
        assert_eq!(room["pricePerNight"], 100.5);
        assert_eq!(room["status"], "Maintenance");
        assert_eq!(room["specialFeatures"], json!(["Balcony", "Minibar"]));
        assert_eq!(room["images"], json!(["r101.jpg"]));
        assert!(room["createdAt"].is_string());
    }

    #[tokio::test]
    async fn guards_room_mutations() {
        let svc = service();
        let body = json!({
            "roomNumber": "R101",
            "roomType": "Deluxe",
            "pricePerNight": 100,
        });

        let (status, json) =
            call(&svc, Method::POST, "/rooms", None, Some(body.clone()))
                .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "AUTHORIZATION_REQUIRED");

        let (status, json) =
            call(&svc, Method::POST, "/rooms", Some("garbage"), Some(body))
                .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn rejects_malformed_room() {
        let svc = service();
        let token = staff_token(&svc).await;

        for body in [
            json!({
                "roomNumber": "R101",
                "roomType": "Deluxe",
                "pricePerNight": -1,
            }),
            json!({
                "roomNumber": " ",
                "roomType": "Deluxe",
                "pricePerNight": 100,
            }),
            json!({
                "roomNumber": "R101",
                "roomType": "Deluxe",
                "pricePerNight": 100,
                "status": "Haunted",
            }),
        ] {
            let (status, json) =
                call(&svc, Method::POST, "/rooms", Some(&token), Some(body))
                    .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
            assert_eq!(json["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn reports_occupied_number() {
        let svc = service();
        let token = staff_token(&svc).await;
        drop(create_room(&svc, &token, "R101", 100).await);
        let other = create_room(&svc, &token, "R102", 100).await;

        let (status, json) = call(
            &svc,
            Method::PUT,
            &format!("/rooms/{other}"),
            Some(&token),
            Some(json!({"roomNumber": "R101"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");

        let (status, json) = call(
            &svc,
            Method::PUT,
            &format!("/rooms/{other}"),
            Some(&token),
            Some(json!({"pricePerNight": 80, "status": "Occupied"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["pricePerNight"], 80);
        assert_eq!(json["data"]["status"], "Occupied");
        assert_eq!(json["data"]["roomNumber"], "R102");
    }

    #[tokio::test]
    async fn reports_missing_room() {
        let svc = service();
        let token = staff_token(&svc).await;
        let missing = "/rooms/5f0c8a54-3c3a-4f8e-9d43-4a3a9c1d2e11";

        let (status, json) = call(&svc, Method::GET, missing, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");

        let (status, _) =
            call(&svc, Method::DELETE, missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) =
            call(&svc, Method::GET, "/rooms/not-an-id", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn refuses_deleting_booked_room() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        drop(create_booking(&svc, &room, 1, 3).await);

        let (status, json) = call(
            &svc,
            Method::DELETE,
            &format!("/rooms/{room}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");

        let free = create_room(&svc, &token, "R102", 100).await;
        let (status, json) = call(
            &svc,
            Method::DELETE,
            &format!("/rooms/{free}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Room deleted successfully");

        let (_, json) = call(&svc, Method::GET, "/rooms", None, None).await;
        assert_eq!(json["count"], 1);
    }

    #[tokio::test]
    async fn searches_available_rooms() {
        let svc = service();
        let token = staff_token(&svc).await;
        let r101 = create_room(&svc, &token, "R101", 100).await;
        drop(create_room(&svc, &token, "R102", 200).await);
        drop(create_booking(&svc, &r101, 1, 3).await);

        let uri = format!(
            "/rooms/available?check_in={}&check_out={}",
            day(2),
            day(4),
        );
        let (status, json) = call(&svc, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["roomNumber"], "R102");

        let (_, json) = call(
            &svc,
            Method::GET,
            "/rooms/available?roomType=deluxe&maxPrice=150",
            None,
            None,
        )
        .await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["roomNumber"], "R101");

        let uri = format!("/rooms/available?check_in={}", day(2));
        let (status, json) = call(&svc, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn checks_room_availability() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let booking = create_booking(&svc, &room, 1, 3).await;

        let check = |from, to| {
            format!(
                "/rooms/{room}/availability?check_in={}&check_out={}",
                day(from),
                day(to),
            )
        };

        let (status, json) =
            call(&svc, Method::GET, &check(2, 4), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["available"], false);

        let (_, json) = call(&svc, Method::GET, &check(3, 5), None, None).await;
        assert_eq!(json["data"]["available"], true);

        let uri = format!(
            "{}&excluding={}",
            check(2, 4),
            booking["id"].as_str().unwrap(),
        );
        let (_, json) = call(&svc, Method::GET, &uri, None, None).await;
        assert_eq!(json["data"]["available"], true);

        let (status, json) =
            call(&svc, Method::GET, &check(4, 2), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}
