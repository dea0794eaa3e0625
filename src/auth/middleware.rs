use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::auth::token::TokenService;
use crate::error::{AppError, AuthError};

/// The verified identity of the caller, attached to the request by `AuthGate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(*user)),
            None => ready(Err(AppError::AuthError(AuthError::Unauthorized).into())),
        }
    }
}

/// Pulls the token out of an `Authorization` header value. Both a bare token
/// and `Bearer <token>` are accepted.
pub fn extract_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Rejects requests without a valid token before they reach any handler.
///
/// On success the caller's id is stored in the request extensions as an
/// `AuthenticatedUser`. Every failure is answered with the same 401 and the
/// reason only goes to the log.
pub struct AuthGate {
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: S,
    tokens: Arc<TokenService>,
}

impl<S> AuthGateService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
        let header = req
            .headers()
            .get("Authorization")
            .ok_or_else(|| {
                warn!("Rejected {}: missing Authorization header", req.path());
                AuthError::Unauthorized
            })?
            .to_str()
            .map_err(|_| {
                warn!("Rejected {}: Authorization header is not ASCII", req.path());
                AuthError::Unauthorized
            })?;

        let token = extract_token(header).ok_or_else(|| {
            warn!("Rejected {}: empty Authorization header", req.path());
            AuthError::Unauthorized
        })?;

        let user_id = self.tokens.verify(token).map_err(|e| {
            warn!("Rejected {}: {}", req.path(), e);
            AuthError::Unauthorized
        })?;

        Ok(AuthenticatedUser(user_id))
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authenticate(&req) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                let response = req.into_response(e.error_response()).map_into_right_body();
                Box::pin(ready(Ok(response)))
            }
        }
    }
}
