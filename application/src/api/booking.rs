//! REST API of bookings.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;
use common::{pagination, Date, Money};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        reservation::{self, guest, SpecialRequests},
        room, Reservation,
    },
    query, read, Command as _,
};

use crate::{define_error, AsError, Context, Error};

use super::{
    parse, parse_str, Envelope, JsonBody, Params, QueryString, SPAN_NAME,
};

/// Default number of bookings on a page.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximal number of bookings on a page.
const MAX_PAGE_SIZE: u32 = 100;

/// Booking of a room.
#[derive(Clone, Debug, Serialize)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: reservation::Id,

    /// ID of the booked room.
    pub room_id: room::Id,

    /// Number of the booked room, if it's known.
    pub room_number: Option<String>,

    /// Full name of the guest.
    pub guest_name: String,

    /// Email of the guest.
    pub guest_email: String,

    /// Phone of the guest.
    pub guest_phone: String,

    /// Postal address of the guest.
    pub guest_address: String,

    /// First night of the stay.
    pub check_in_date: Date,

    /// Departure date.
    pub check_out_date: Date,

    /// Number of guests staying.
    pub total_guests: u16,

    /// Total price of the stay.
    #[serde(with = "common::money::serde::number")]
    pub total_amount: Money,

    /// Lifecycle status of this [`Booking`].
    pub status: reservation::Status,

    /// Special requests of the guest.
    pub special_requests: Option<String>,

    /// Payment method of the guest.
    pub payment_method: reservation::PaymentMethod,

    /// When this [`Booking`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: reservation::CreationDateTime,
}

impl Booking {
    /// Creates a new [`Booking`] out of the provided [`Reservation`] and the
    /// number of its room.
    fn new(reservation: Reservation, room_number: Option<String>) -> Self {
        let Reservation {
            id,
            room_id,
            guest,
            stay,
            total_guests,
            payment_method,
            special_requests,
            total_amount,
            status,
            created_at,
        } = reservation;

        Self {
            id,
            room_id,
            room_number,
            guest_name: guest.name.to_string(),
            guest_email: guest.email.to_string(),
            guest_phone: guest.phone.to_string(),
            guest_address: guest.address.to_string(),
            check_in_date: stay.check_in(),
            check_out_date: stay.check_out(),
            total_guests: total_guests.into(),
            total_amount,
            status,
            special_requests: special_requests
                .as_ref()
                .map(ToString::to_string),
            payment_method,
            created_at,
        }
    }

    /// Converts the provided [`Reservation`]s into [`Booking`]s, resolving
    /// the numbers of their rooms.
    async fn resolve(
        ctx: &Context,
        reservations: Vec<Reservation>,
    ) -> Result<Vec<Self>, Error> {
        let mut room_ids =
            reservations.iter().map(|r| r.room_id).collect::<Vec<_>>();
        room_ids.sort_unstable();
        room_ids.dedup();

        let rooms = ctx
            .service()
            .execute(query::rooms::ByIds::by(room_ids))
            .await
            .map_err(AsError::into_error)?;

        Ok(reservations
            .into_iter()
            .map(|r| {
                let number =
                    rooms.get(&r.room_id).map(|rm| rm.number.to_string());
                Self::new(r, number)
            })
            .collect())
    }

    /// Converts the provided [`Reservation`] into a [`Booking`], resolving
    /// the number of its room.
    async fn resolve_one(
        ctx: &Context,
        reservation: Reservation,
    ) -> Result<Self, Error> {
        Self::resolve(ctx, vec![reservation])
            .await?
            .pop()
            .ok_or_else(|| Error::internal(&"`Booking` is lost on resolving"))
    }
}

/// Request creating a new [`Booking`].
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the room to book.
    pub room_id: room::Id,

    /// Full name of the guest.
    pub guest_name: String,

    /// Email of the guest.
    pub guest_email: String,

    /// Phone of the guest.
    pub guest_phone: String,

    /// Postal address of the guest.
    pub guest_address: String,

    /// First night of the stay.
    pub check_in_date: Date,

    /// Departure date.
    pub check_out_date: Date,

    /// Number of guests staying.
    pub total_guests: u16,

    /// Payment method of the guest.
    pub payment_method: String,

    /// Special requests of the guest.
    pub special_requests: Option<String>,
}

impl TryFrom<CreateRequest> for command::CreateReservation {
    type Error = Error;

    fn try_from(req: CreateRequest) -> Result<Self, Self::Error> {
        let CreateRequest {
            room_id,
            guest_name,
            guest_email,
            guest_phone,
            guest_address,
            check_in_date,
            check_out_date,
            total_guests,
            payment_method,
            special_requests,
        } = req;

        Ok(Self {
            room_id,
            guest: reservation::Guest {
                name: parse("guest_name", guest_name, guest::Name::new)?,
                email: parse("guest_email", guest_email, guest::Email::new)?,
                phone: parse("guest_phone", guest_phone, guest::Phone::new)?,
                address: parse(
                    "guest_address",
                    guest_address,
                    guest::Address::new,
                )?,
            },
            check_in: check_in_date,
            check_out: check_out_date,
            total_guests,
            payment_method: parse_str("payment_method", &payment_method)?,
            special_requests: special(special_requests)?,
        })
    }
}

/// Parses the provided `special_requests` request field, treating a blank
/// one as absent.
fn special(
    requests: Option<String>,
) -> Result<Option<SpecialRequests>, Error> {
    requests
        .filter(|r| !r.trim().is_empty())
        .map(|r| parse("special_requests", r, SpecialRequests::new))
        .transpose()
}

/// Request updating a [`Booking`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateRequest {
    /// Status to move the [`Booking`] to.
    pub status: Option<String>,

    /// Status the [`Booking`] is expected to be in before the move.
    pub expected_status: Option<String>,

    /// New special requests of the guest, a blank one clears them.
    pub special_requests: Option<String>,
}

/// Query string of the [`Booking`]s listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    /// Number of [`Booking`]s to return after the `after` cursor.
    pub first: Option<u32>,

    /// Cursor to return [`Booking`]s after.
    pub after: Option<reservation::Id>,

    /// Number of [`Booking`]s to return before the `before` cursor.
    pub last: Option<u32>,

    /// Cursor to return [`Booking`]s before.
    pub before: Option<reservation::Id>,

    /// Status to match exactly.
    pub status: Option<String>,

    /// Guest email to match exactly.
    pub email: Option<String>,

    /// ID of the booked room to match.
    pub room_id: Option<room::Id>,
}

impl TryFrom<ListParams> for read::reservation::list::Selector {
    type Error = Error;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let ListParams {
            first,
            after,
            last,
            before,
            status,
            email,
            room_id,
        } = params;

        if first.or(last).is_some_and(|n| n > MAX_PAGE_SIZE) {
            return Err(BookingError::PageTooLarge.into());
        }
        let arguments = pagination::Arguments::new(
            first,
            after,
            last,
            before,
            DEFAULT_PAGE_SIZE,
        )
        .ok_or(BookingError::InvalidPagination)?;

        Ok(Self {
            arguments,
            filter: read::reservation::list::Filter {
                status: status.map(|s| parse_str("status", &s)).transpose()?,
                email: email
                    .map(|e| parse("email", e, guest::Email::new))
                    .transpose()?,
                room_id,
            },
        })
    }
}

/// Numbers of [`Booking`]s in every status.
#[derive(Clone, Debug, Serialize)]
pub struct Stats {
    /// Number of [`Booking`]s in every status.
    pub counts: BTreeMap<reservation::Status, u64>,

    /// Total number of [`Booking`]s.
    pub total: u64,
}

/// Lists all the [`Booking`]s, newest first.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - pagination or filter parameters are malformed;
/// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
/// - `FORBIDDEN` - the request is not authorized as the staff.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "listBookings"),
)]
pub async fn list(
    ctx: Context,
    WithRejection(Query(params), _): QueryString<ListParams>,
) -> Result<Envelope<Vec<Booking>>, Error> {
    ctx.require_staff().await?;

    let selector = read::reservation::list::Selector::try_from(params)?;
    let filter = selector.filter.clone();

    let page = ctx
        .service()
        .execute(query::reservations::List::by(selector))
        .await
        .map_err(AsError::into_error)?;
    let total = ctx
        .service()
        .execute(query::reservations::TotalCount::by(filter))
        .await
        .map_err(AsError::into_error)?;
    let total = usize::try_from(i64::from(total))
        .map_err(|e| Error::internal(&e))?;

    let page_info = page.page_info().into();
    let bookings = Booking::resolve(
        &ctx,
        page.edges.into_iter().map(|e| e.node).collect(),
    )
    .await?;

    Ok(Envelope::paged(bookings, total, page_info))
}

/// Creates a new [`Booking`].
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - request data is malformed;
/// - `NOT_FOUND` - the room doesn't exist;
/// - `ROOM_UNAVAILABLE` - the room is booked or under maintenance for the
///                        requested dates.
#[tracing::instrument(
    skip_all,
    fields(
        otel.name = SPAN_NAME,
        rest.name = "createBooking",
        room.id = %req.room_id,
    ),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(req), _): JsonBody<CreateRequest>,
) -> Result<Envelope<Booking>, Error> {
    let reservation = ctx
        .service()
        .execute(command::CreateReservation::try_from(req)?)
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(Booking::resolve_one(&ctx, reservation).await?)
        .with_message("Booking created successfully"))
}

/// Returns the [`Booking`] by its ID.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
/// - `NOT_FOUND` - the `Booking` doesn't exist;
/// - `FORBIDDEN` - the `Booking` belongs to another guest.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "getBooking", booking.id = %id),
)]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): Params<reservation::Id>,
) -> Result<Envelope<Booking>, Error> {
    let initiator = ctx.current_initiator().await?;

    let reservation = ctx
        .service()
        .execute(query::reservation::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(BookingError::NotFound)?;
    if !initiator.can_access(&reservation.guest.email) {
        return Err(BookingError::Forbidden.into());
    }

    Ok(Envelope::new(Booking::resolve_one(&ctx, reservation).await?))
}

/// Updates status and/or special requests of the [`Booking`].
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - request data is malformed or empty;
/// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
/// - `NOT_FOUND` - the `Booking` doesn't exist;
/// - `FORBIDDEN` - the update is not permitted to the requester;
/// - `INVALID_TRANSITION` - the status cannot be changed as requested;
/// - `CONFLICT` - the `Booking` is not in the `expected_status` anymore.
#[tracing::instrument(
    skip_all,
    fields(
        otel.name = SPAN_NAME,
        rest.name = "updateBooking",
        booking.id = %id,
    ),
)]
pub async fn update(
    ctx: Context,
    WithRejection(Path(id), _): Params<reservation::Id>,
    WithRejection(Json(req), _): JsonBody<UpdateRequest>,
) -> Result<Envelope<Booking>, Error> {
    let UpdateRequest {
        status,
        expected_status,
        special_requests,
    } = req;

    let status = status
        .map(|s| parse_str::<reservation::Status>("status", &s))
        .transpose()?;
    let expected_status = expected_status
        .map(|s| parse_str("expected_status", &s))
        .transpose()?;
    let special_requests = special_requests
        .map(|r| special(Some(r)))
        .transpose()?;
    if status.is_none() && special_requests.is_none() {
        return Err(BookingError::NothingToUpdate.into());
    }

    let reservation = ctx
        .service()
        .execute(command::UpdateReservation {
            reservation_id: id,
            status,
            expected_status,
            special_requests,
            initiator: ctx.current_initiator().await?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(Booking::resolve_one(&ctx, reservation).await?)
        .with_message("Booking updated successfully"))
}

/// Lists [`Booking`]s of the guest with the provided email, newest first.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - the email is malformed;
/// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
/// - `FORBIDDEN` - the email belongs to another guest.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "userBookings"),
)]
pub async fn by_user(
    ctx: Context,
    WithRejection(Path(email), _): Params<String>,
) -> Result<Envelope<Vec<Booking>>, Error> {
    let email = parse("email", email, guest::Email::new)?;
    _ = ctx.require_access(&email).await?;

    let reservations = ctx
        .service()
        .execute(query::reservations::ByGuestEmail::by(email))
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::counted(Booking::resolve(&ctx, reservations).await?))
}

/// Lists [`Booking`]s in the provided status, newest first.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - the status is unknown;
/// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
/// - `FORBIDDEN` - the request is not authorized as the staff.
#[tracing::instrument(
    skip_all,
    fields(
        otel.name = SPAN_NAME,
        rest.name = "bookingsByStatus",
        booking.status = %status,
    ),
)]
pub async fn by_status(
    ctx: Context,
    WithRejection(Path(status), _): Params<String>,
) -> Result<Envelope<Vec<Booking>>, Error> {
    let status = parse_str::<reservation::Status>("status", &status)?;
    ctx.require_staff().await?;

    let reservations = ctx
        .service()
        .execute(query::reservations::ByStatus::by(status))
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::counted(Booking::resolve(&ctx, reservations).await?))
}

/// Returns numbers of [`Booking`]s in every status.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
/// - `FORBIDDEN` - the request is not authorized as the staff.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "bookingStats"),
)]
pub async fn stats(ctx: Context) -> Result<Envelope<Stats>, Error> {
    ctx.require_staff().await?;

    let counts = ctx
        .service()
        .execute(query::reservations::CountsByStatus::by(()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Envelope::new(Stats {
        total: counts.total(),
        counts: counts.into(),
    }))
}

impl AsError for command::create_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidDateRange { .. } => {
                Some(BookingError::InvalidDateRange.into())
            }
            Self::PastCheckIn(_) => Some(BookingError::PastCheckIn.into()),
            Self::InvalidGuestsCount(_) => {
                Some(BookingError::InvalidGuestsCount.into())
            }
            Self::RoomNotExists(_) => Some(BookingError::RoomNotFound.into()),
            Self::RoomUnavailable(_) => {
                Some(BookingError::RoomUnavailable.into())
            }
            Self::AmountOverflow(_) => {
                Some(BookingError::AmountOverflow.into())
            }
        }
    }
}

impl AsError for command::update_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NothingToUpdate => Some(BookingError::NothingToUpdate.into()),
            Self::ReservationNotExists(_) => {
                Some(BookingError::NotFound.into())
            }
            Self::Forbidden(_) => Some(BookingError::Forbidden.into()),
            Self::Conflict { .. } => Some(BookingError::Conflict.into()),
            Self::InvalidTransition { .. } => {
                Some(BookingError::InvalidTransition.into())
            }
            Self::CheckInTooEarly(_) => {
                Some(BookingError::CheckInTooEarly.into())
            }
            Self::ReservationFinished(_) => {
                Some(BookingError::Finished.into())
            }
        }
    }
}

define_error! {
    enum BookingError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Booking not found"]
        NotFound,

        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Room not found"]
        RoomNotFound,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Booking belongs to another guest or requires staff"]
        Forbidden,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Check-out date must follow check-in date"]
        InvalidDateRange,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Check-in date cannot be in the past"]
        PastCheckIn,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Total guests must be between 1 and 10"]
        InvalidGuestsCount,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Total amount of the stay is too large"]
        AmountOverflow,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "No fields provided for update"]
        NothingToUpdate,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Invalid pagination arguments"]
        InvalidPagination,

        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Page size must not exceed 100"]
        PageTooLarge,

        #[code = "ROOM_UNAVAILABLE"]
        #[status = CONFLICT]
        #[message = "Room is not available for the selected dates"]
        RoomUnavailable,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "Booking status cannot be changed this way"]
        InvalidTransition,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "Guest cannot check in before the check-in date"]
        CheckInTooEarly,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "Booking is finished already"]
        Finished,

        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "Booking status has been changed concurrently"]
        Conflict,
    }
}

#[cfg(test)]
mod spec {
    use http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_util::{
        booking_request, call, create_booking, create_room, day, service,
        staff_token,
    };

    #[tokio::test]
    async fn creates_booking_in_snake_case() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;

        let (status, json) = call(
            &svc,
            Method::POST,
            "/bookings/",
            None,
            Some(booking_request(&room, 1, 4)),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["message"], "Booking created successfully");

        let booking = &json["data"];
        assert_eq!(booking["room_id"], room.as_str());
        assert_eq!(booking["room_number"], "R101");
        assert_eq!(booking["guest_email"], "jane@example.com");
        assert_eq!(booking["check_in_date"], day(1));
        assert_eq!(booking["check_out_date"], day(4));
        assert_eq!(booking["total_guests"], 2);
        assert_eq!(booking["total_amount"], 300);
        assert_eq!(booking["status"], "PENDING");
        assert_eq!(booking["payment_method"], "credit_card");
        assert_eq!(booking["special_requests"], json!(null));
        assert!(booking["created_at"].is_string());
    }

    #[tokio::test]
    async fn rejects_overlapping_booking() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        drop(create_booking(&svc, &room, 1, 4).await);

        let (status, json) = call(
            &svc,
            Method::POST,
            "/bookings",
            None,
            Some(booking_request(&room, 2, 3)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "ROOM_UNAVAILABLE");

        let touching = create_booking(&svc, &room, 4, 6).await;
        assert_eq!(touching["total_amount"], 200);
    }

    /// ID of a room never created in specs.
    const UNKNOWN_ROOM: &str = "5f0c8a54-3c3a-4f8e-9d43-4a3a9c1d2e11";

    #[tokio::test]
    async fn rejects_malformed_booking() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;

        let mut no_guests = booking_request(&room, 1, 2);
        no_guests["total_guests"] = json!(0);
        let past = booking_request(&room, -2, 2);
        let empty_stay = booking_request(&room, 2, 2);
        let mut bad_email = booking_request(&room, 1, 2);
        bad_email["guest_email"] = json!("jane");
        let mut bad_payment = booking_request(&room, 1, 2);
        bad_payment["payment_method"] = json!("barter");

        for body in [no_guests, past, empty_stay, bad_email, bad_payment] {
            let (status, json) =
                call(&svc, Method::POST, "/bookings", None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
            assert_eq!(json["code"], "VALIDATION_ERROR");
        }

        let (status, json) = call(
            &svc,
            Method::POST,
            "/bookings",
            None,
            Some(booking_request(UNKNOWN_ROOM, 1, 2)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Room not found");
    }

    #[tokio::test]
    async fn walks_booking_lifecycle() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let booking = create_booking(&svc, &room, 0, 2).await;
        let uri = format!("/bookings/{}", booking["id"].as_str().unwrap());

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"status": "CHECKED_OUT"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"status": "confirmed", "expected_status": "PENDING"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "CONFIRMED");

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"status": "CANCELLED", "expected_status": "PENDING"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");

        for next in ["CHECKED_IN", "CHECKED_OUT"] {
            let (status, json) = call(
                &svc,
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({"status": next})),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{json}");
            assert_eq!(json["data"]["status"], next);
        }

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"special_requests": "Late checkout"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");

        let (status, json) =
            call(&svc, Method::PUT, &uri, Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn keeps_requests_when_status_change_fails() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let booking = create_booking(&svc, &room, 1, 3).await;
        let uri = format!("/bookings/{}", booking["id"].as_str().unwrap());

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({
                "special_requests": "Late arrival",
                "status": "CHECKED_OUT",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");

        let (status, json) =
            call(&svc, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "PENDING");
        assert_eq!(json["data"]["special_requests"], json!(null));
    }

    #[tokio::test]
    async fn scopes_guest_session_to_own_bookings() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let booking = create_booking(&svc, &room, 1, 2).await;
        let id = booking["id"].as_str().unwrap();
        let uri = format!("/bookings/{id}");

        let (status, json) = call(&svc, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "AUTHORIZATION_REQUIRED");

        let (_, json) = call(
            &svc,
            Method::POST,
            "/sessions",
            None,
            Some(json!({"booking_id": id, "email": "jane@example.com"})),
        )
        .await;
        let guest = json["data"]["token"].as_str().unwrap().to_owned();

        let (status, json) =
            call(&svc, Method::GET, &uri, Some(&guest), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], id);

        let (status, json) = call(
            &svc,
            Method::GET,
            "/bookings/user/jane@example.com",
            Some(&guest),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);

        let (status, json) = call(
            &svc,
            Method::GET,
            "/bookings/user/john@example.com",
            Some(&guest),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "FORBIDDEN");

        let (status, _) =
            call(&svc, Method::GET, "/bookings", Some(&guest), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&guest),
            Some(json!({"status": "CONFIRMED"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "FORBIDDEN");

        let (status, json) = call(
            &svc,
            Method::PUT,
            &uri,
            Some(&guest),
            Some(json!({
                "status": "cancelled",
                "special_requests": "Plans changed",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "CANCELLED");
        assert_eq!(json["data"]["special_requests"], "Plans changed");
    }

    #[tokio::test]
    async fn pages_bookings_newest_first() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let mut ids = Vec::new();
        for from in [1, 3, 5] {
            let booking = create_booking(&svc, &room, from, from + 1).await;
            ids.push(booking["id"].as_str().unwrap().to_owned());
        }

        let (status, json) =
            call(&svc, Method::GET, "/bookings?first=2", Some(&token), None)
                .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["count"], 3);
        let page = json["data"].as_array().unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(json["page_info"]["has_next_page"], true);

        let end = json["page_info"]["end_cursor"].as_str().unwrap();
        let (_, next) = call(
            &svc,
            Method::GET,
            &format!("/bookings?first=2&after={end}"),
            Some(&token),
            None,
        )
        .await;
        let rest = next["data"].as_array().unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(next["page_info"]["has_next_page"], false);

        let mut seen = page
            .iter()
            .chain(rest)
            .map(|b| b["id"].as_str().unwrap().to_owned())
            .collect::<Vec<_>>();
        seen.sort();
        ids.sort();
        assert_eq!(seen, ids);

        let (status, json) = call(
            &svc,
            Method::GET,
            "/bookings?first=101",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn projects_bookings_by_status() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let first = create_booking(&svc, &room, 1, 2).await;
        drop(create_booking(&svc, &room, 2, 3).await);

        let (status, _) = call(
            &svc,
            Method::PUT,
            &format!("/bookings/{}", first["id"].as_str().unwrap()),
            Some(&token),
            Some(json!({"status": "CANCELLED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = call(
            &svc,
            Method::GET,
            "/bookings/status/pending",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["status"], "PENDING");

        let (status, json) =
            call(&svc, Method::GET, "/bookings/stats", Some(&token), None)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 2);
        assert_eq!(json["data"]["counts"]["PENDING"], 1);
        assert_eq!(json["data"]["counts"]["CANCELLED"], 1);
        assert_eq!(json["data"]["counts"]["CHECKED_IN"], 0);

        let (status, json) = call(
            &svc,
            Method::GET,
            "/bookings/status/LOST",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}
