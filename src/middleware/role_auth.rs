use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::debug;

use crate::middleware::auth::Claims;
use crate::models::account::UserRole;

/// Lets a request through when the token's role matches, or is admin. Must
/// run after [`AuthMiddleware`](crate::middleware::auth::AuthMiddleware), so
/// wrap it first.
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        RequireRole {
            required_role: role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();

        let Some(claims) = claims else {
            return Box::pin(ready(Err(ErrorUnauthorized("No authorization"))));
        };

        let user_role = claims.role.as_deref().and_then(UserRole::parse);
        match user_role {
            Some(role) if role == self.required_role || role == UserRole::Admin => {
                Box::pin(self.service.call(req))
            }
            _ => {
                debug!(
                    "Access denied for {}: role {:?}, required {}",
                    claims.sub,
                    claims.role,
                    self.required_role.as_str()
                );
                Box::pin(ready(Err(ErrorForbidden("Insufficient permissions"))))
            }
        }
    }
}
