//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretString};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::session::Token;
use crate::{
    domain::{
        reservation::{self, guest},
        session::{self, Initiator, Login, Role},
        Reservation, Session,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Clone, Debug)]
pub enum CreateSession {
    /// Create a new staff [`Session`] by the staff credentials.
    Staff {
        /// [`Login`] of the staff.
        login: Login,

        /// Password of the staff.
        password: SecretString,
    },

    /// Create a new guest [`Session`] by a [`Reservation`] reference.
    Guest {
        /// ID of a [`Reservation`] of the guest.
        reservation_id: reservation::Id,

        /// [`guest::Email`] recorded on the [`Reservation`].
        email: guest::Email,
    },
}

/// Output of [`CreateSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`Initiator`] the [`Session`] is created for.
    pub initiator: Initiator,

    /// [`DateTime`] when the [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<Reservation>, reservation::Id>>,
        Ok = Option<Reservation>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateSession) -> Result<Self::Ok, Self::Err> {
        use CreateSession as Cmd;
        use ExecutionError as E;

        let (subject, role, initiator) = match cmd {
            Cmd::Staff { login, password } => {
                let staff = &self.config().staff;
                let password_matches = constant_time_eq::constant_time_eq(
                    password.expose_secret().as_bytes(),
                    staff.password.expose_secret().as_bytes(),
                );
                if login != staff.login || !password_matches {
                    return Err(tracerr::new!(E::WrongCredentials));
                }
                (login.to_string(), Role::Staff, Initiator::Staff)
            }
            Cmd::Guest {
                reservation_id,
                email,
            } => {
                let reservation = self
                    .database()
                    .execute(Select(By::<Option<Reservation>, _>::new(
                        reservation_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .filter(|r| r.guest.email == email)
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;
                (
                    reservation.guest.email.to_string(),
                    Role::Guest,
                    Initiator::Guest(reservation.guest.email),
                )
            }
        };

        let expires_at =
            (DateTime::now() + self.config().session_ttl).coerce();
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                subject,
                role,
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        log::debug!(role = %role, "session created");

        Ok(Output {
            token,
            initiator,
            expires_at,
        })
    }
}

/// Error of [`CreateSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// Provided credentials don't match.
    #[display("Wrong credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretString;

    use crate::{
        command::{AuthorizeSession, Command as _},
        domain::{
            reservation::{self, guest::Email},
            session::{Initiator, Login},
        },
        test_util::{self, day, reserve, service},
    };

    use super::{CreateSession, ExecutionError};

    #[tokio::test]
    async fn issues_staff_session() {
        let svc = service();

        let out = svc
            .execute(CreateSession::Staff {
                login: Login::new("admin").unwrap(),
                password: SecretString::from("admin-password".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(out.initiator, Initiator::Staff);

        let initiator = svc
            .execute(AuthorizeSession { token: out.token })
            .await
            .unwrap();
        assert_eq!(initiator, Initiator::Staff);
    }

    #[tokio::test]
    async fn rejects_wrong_staff_credentials() {
        let svc = service();

        for (login, password) in [
            ("admin", "wrong"),
            ("admin", "admin-passwore"),
            ("admin", "admin-password "),
            ("manager", "admin-password"),
        ] {
            let err = svc
                .execute(CreateSession::Staff {
                    login: Login::new(login).unwrap(),
                    password: SecretString::from(password.to_owned()),
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
        }
    }

    #[tokio::test]
    async fn issues_guest_session_scoped_to_email() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(2)).await;

        let out = svc
            .execute(CreateSession::Guest {
                reservation_id: created.id,
                email: created.guest.email.clone(),
            })
            .await
            .unwrap();

        let initiator = svc
            .execute(AuthorizeSession { token: out.token })
            .await
            .unwrap();
        assert_eq!(initiator, Initiator::Guest(created.guest.email));
    }

    #[tokio::test]
    async fn rejects_unknown_booking_reference() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(2)).await;

        for (id, email) in [
            (created.id, "john@example.com"),
            (reservation::Id::new(), "jane@example.com"),
        ] {
            let err = svc
                .execute(CreateSession::Guest {
                    reservation_id: id,
                    email: Email::new(email).unwrap(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
        }
    }
}
