//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::{
    command::{self, Command as _},
    domain::{reservation::guest, session, session::Initiator},
};
use tokio::sync::OnceCell;

use crate::{define_error, AsError, Error, Service};

/// Context of a single REST API request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// [`Initiator`] of the request, resolved at most once.
    initiator: OnceCell<Result<Option<Initiator>, Error>>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`Initiator`] of the request, if it's authorized.
    ///
    /// # Errors
    ///
    /// Errors if the provided authorization token is invalid.
    pub async fn initiator(&self) -> Result<Option<Initiator>, Error> {
        self.initiator
            .get_or_init(|| self.do_authentication())
            .await
            .clone()
    }

    /// Returns the [`Initiator`] of the request.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the request is not authorized;
    /// - the provided authorization token is invalid.
    pub async fn current_initiator(&self) -> Result<Initiator, Error> {
        self.initiator()
            .await?
            .ok_or_else(|| AuthError::AuthorizationRequired.into())
    }

    /// Ensures the request is performed by the hotel staff.
    ///
    /// # Errors
    ///
    /// Errors if the request is not authorized as the hotel staff.
    pub async fn require_staff(&self) -> Result<(), Error> {
        if self.current_initiator().await?.is_staff() {
            Ok(())
        } else {
            Err(AuthError::Forbidden.into())
        }
    }

    /// Ensures the request may access data of the guest with the provided
    /// [`guest::Email`].
    ///
    /// # Errors
    ///
    /// Errors if the request is not authorized as the hotel staff or as the
    /// guest with the provided [`guest::Email`].
    pub async fn require_access(
        &self,
        email: &guest::Email,
    ) -> Result<Initiator, Error> {
        let initiator = self.current_initiator().await?;
        if initiator.can_access(email) {
            Ok(initiator)
        } else {
            Err(AuthError::Forbidden.into())
        }
    }

    /// Resolves the [`Initiator`] from the `Authorization` header.
    async fn do_authentication(&self) -> Result<Option<Initiator>, Error> {
        let res = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await;
        match res {
            Ok(TypedHeader(Authorization(bearer))) => {
                #[expect(unsafe_code, reason = "specified in correct header")]
                let token = unsafe {
                    session::Token::new_unchecked(bearer.token().to_owned())
                };
                self.service
                    .execute(command::AuthorizeSession { token })
                    .await
                    .map(Some)
                    .map_err(AsError::into_error)
            }
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e.into_error()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        Ok(Self {
            service,
            parts: parts.clone(),
            initiator: OnceCell::new(),
        })
    }
}

impl AsError for command::authorize_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::JsonWebTokenDecodeError(_) | Self::InvalidSubject(_) => {
                Some(AuthError::InvalidToken.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Session token is invalid or expired"]
        InvalidToken,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Operation is not permitted"]
        Forbidden,
    }
}
