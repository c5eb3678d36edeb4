use std::future::{ready, Ready};

use actix_http::Payload;
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest};
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::middleware::auth::Claims;

#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

impl AuthenticatedUser {
    /// The caller's id as stored on their trips.
    pub fn tourist_id(&self) -> Result<ObjectId, ApiError> {
        ObjectId::parse_str(&self.user_id)
            .map_err(|_| ApiError::Unauthorized("Invalid user id in token".to_string()))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            ready(Ok(AuthenticatedUser {
                user_id: claims.user_id.clone(),
                email: claims.sub.clone(),
            }))
        } else {
            ready(Err(ErrorUnauthorized("User not authenticated")))
        }
    }
}
