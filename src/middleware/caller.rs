//! Caller identity supplied by the upstream identity service.
//!
//! The service authenticates the request and forwards the result in trusted
//! headers. Nothing here verifies credentials.

use crate::constants::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::orm::users::Role;
use actix_web::dev::Payload;
use actix_web::{error, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

/// Identity of the request's caller. `None` is an anonymous visitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Caller {
    pub identity: Option<Identity>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
    pub role: Role,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn new(id: i32, role: Role) -> Self {
        Self {
            identity: Some(Identity { id, role }),
        }
    }

    /// Reads the identity headers. A missing id means anonymous; a present
    /// id without a role is a homeowner.
    pub fn from_headers(req: &HttpRequest) -> Result<Self, Error> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .map(|value| {
                    value
                        .to_str()
                        .map(|s| s.trim().to_string())
                        .map_err(|_| error::ErrorBadRequest(format!("Malformed {} header", name)))
                })
                .transpose()
        };

        let id = match header(USER_ID_HEADER)? {
            Some(raw) if !raw.is_empty() => raw
                .parse::<i32>()
                .map_err(|_| error::ErrorBadRequest("Malformed user id"))?,
            _ => return Ok(Self::anonymous()),
        };

        let role = match header(USER_ROLE_HEADER)? {
            Some(raw) if !raw.is_empty() => raw.parse::<Role>().map_err(error::ErrorBadRequest)?,
            _ => Role::Homeowner,
        };

        Ok(Self::new(id, role))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.identity, Some(Identity { role: Role::Admin, .. }))
    }

    /// Require the caller to be identified. Returns the identity or ErrorUnauthorized.
    pub fn require_login(&self) -> Result<Identity, Error> {
        self.identity
            .ok_or_else(|| error::ErrorUnauthorized("Not authenticated"))
    }

    /// Require an administrator. ErrorUnauthorized for anonymous callers,
    /// ErrorForbidden for everyone else.
    pub fn require_admin(&self) -> Result<Identity, Error> {
        let identity = self.require_login()?;
        if identity.role != Role::Admin {
            return Err(error::ErrorForbidden("Not authorized"));
        }
        Ok(identity)
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Caller::from_headers(req))
    }
}
