/// Access guard middleware
///
/// Every route states the capability it needs by wrapping itself in
/// `RequireAccess` with an explicit `Access` level. For anything other than
/// `Public`, the bearer token from the Authorization header is verified by
/// the `TokenService` and its claims are inserted into request extensions
/// for the handler.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Claims, TokenService};
use crate::error::{AppError, AuthError};

/// Capability a route requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credentials needed
    Public,
    /// Any valid access token
    Authenticated,
    /// A valid access token issued to a staff user
    Staff,
}

impl Access {
    /// Checks the Authorization header value against this access level
    pub fn authorize(&self, header: Option<&str>, tokens: &TokenService) -> Result<Option<Claims>, AppError> {
        if *self == Access::Public {
            return Ok(None);
        }

        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Auth(AuthError::MissingToken))?;

        let claims = tokens.verify_access(token)?;

        if *self == Access::Staff && !claims.staff {
            return Err(AuthError::Forbidden.into());
        }

        Ok(Some(claims))
    }
}

pub struct RequireAccess {
    tokens: web::Data<TokenService>,
    access: Access,
}

impl RequireAccess {
    pub fn new(tokens: web::Data<TokenService>, access: Access) -> Self {
        Self { tokens, access }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAccess
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAccessService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireAccessService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            access: self.access,
        }))
    }
}

pub struct RequireAccessService<S> {
    service: Rc<S>,
    tokens: web::Data<TokenService>,
    access: Access,
}

impl<S, B> Service<ServiceRequest> for RequireAccessService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match self.access.authorize(header, &self.tokens) {
            Ok(claims) => {
                if let Some(claims) = claims {
                    tracing::debug!(user_id = %claims.sub, access = ?self.access, "Access granted");
                    req.extensions_mut().insert(claims);
                }

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), access = ?self.access, "Access denied: {}", e);
                Box::pin(async move { Err(e.into()) })
            }
        }
    }
}
