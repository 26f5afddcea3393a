//! REST API of sessions.

use axum::Json;
use axum_extra::extract::WithRejection;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        reservation::{self, guest},
        session::{self, Initiator, Role},
    },
    Command as _,
};

use crate::{define_error, AsError, Context, Error};

use super::{parse, Envelope, JsonBody, SPAN_NAME};

/// Request creating a new session.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateRequest {
    /// Session of the hotel staff.
    Staff {
        /// Login of the staff.
        login: String,

        /// Password of the staff.
        password: SecretString,
    },

    /// Session of a guest, proven by one of their bookings.
    Guest {
        /// ID of a booking of the guest.
        booking_id: reservation::Id,

        /// Email recorded on the booking.
        email: String,
    },
}

impl TryFrom<CreateRequest> for command::CreateSession {
    type Error = Error;

    fn try_from(req: CreateRequest) -> Result<Self, Self::Error> {
        Ok(match req {
            CreateRequest::Staff { login, password } => Self::Staff {
                // Unknown logins are indistinguishable from wrong ones.
                login: session::Login::new(login)
                    .ok_or(SessionError::WrongCredentials)?,
                password,
            },
            CreateRequest::Guest { booking_id, email } => Self::Guest {
                reservation_id: booking_id,
                email: parse("email", email, guest::Email::new)?,
            },
        })
    }
}

/// Issued session.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    /// Bearer token of this [`Session`].
    pub token: String,

    /// [`Role`] this [`Session`] grants.
    pub role: Role,

    /// When this [`Session`] expires.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: session::ExpirationDateTime,
}

impl From<command::create_session::Output> for Session {
    fn from(out: command::create_session::Output) -> Self {
        Self {
            token: out.token.to_string(),
            role: match out.initiator {
                Initiator::Staff => Role::Staff,
                Initiator::Guest(_) => Role::Guest,
            },
            expires_at: out.expires_at,
        }
    }
}

/// Creates a new [`Session`] either by the staff credentials or by a booking
/// reference of a guest.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - request data is malformed;
/// - `AUTHORIZATION_REQUIRED` - the credentials are wrong.
#[tracing::instrument(
    skip_all,
    fields(otel.name = SPAN_NAME, rest.name = "createSession"),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(req), _): JsonBody<CreateRequest>,
) -> Result<Envelope<Session>, Error> {
    ctx.service()
        .execute(command::CreateSession::try_from(req)?)
        .await
        .map(|out| Envelope::new(out.into()))
        .map_err(AsError::into_error)
}

impl AsError for command::create_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::WrongCredentials => {
                Some(SessionError::WrongCredentials.into())
            }
        }
    }
}

define_error! {
    enum SessionError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Wrong credentials"]
        WrongCredentials,
    }
}

#[cfg(test)]
mod spec {
    use http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_util::{
        call, create_booking, create_room, service, staff_token,
    };

    #[tokio::test]
    async fn issues_staff_session() {
        let svc = service();

        let (status, json) = call(
            &svc,
            Method::POST,
            "/sessions",
            None,
            Some(json!({"login": "admin", "password": "admin-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["role"], "STAFF");
        assert!(json["data"]["expires_at"].is_string());

        let token = json["data"]["token"].as_str().unwrap();
        let (status, _) =
            call(&svc, Method::GET, "/bookings/stats", Some(token), None)
                .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_wrong_credentials() {
        let svc = service();
        let token = staff_token(&svc).await;
        let room = create_room(&svc, &token, "R101", 100).await;
        let booking = create_booking(&svc, &room, 1, 2).await;

        for body in [
            json!({"login": "admin", "password": "guess"}),
            json!({"login": "root", "password": "admin-password"}),
            json!({"booking_id": booking["id"], "email": "john@example.com"}),
        ] {
            let (status, json) =
                call(&svc, Method::POST, "/sessions", None, Some(body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{json}");
            assert_eq!(json["code"], "AUTHORIZATION_REQUIRED");
            assert_eq!(json["message"], "Wrong credentials");
        }

        let (status, json) = call(
            &svc,
            Method::POST,
            "/sessions",
            None,
            Some(json!({"email": "jane@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let svc = service();

        let (status, json) =
            call(&svc, Method::GET, "/bookings", Some("nonsense"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "AUTHORIZATION_REQUIRED");
    }
}
