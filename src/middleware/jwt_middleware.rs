/// JWT Authentication Middleware
///
/// Validates the bearer token from the Authorization header, resolves the
/// caller's identity and injects it into request extensions, where handlers
/// read it with `web::ReqData<Identity>`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::{authenticate, TokenIssuer};
use crate::error::{AppError, AuthError};

/// JWT middleware for protecting routes
#[derive(Clone)]
pub struct JwtMiddleware {
    issuer: web::Data<TokenIssuer>,
    pool: PgPool,
}

impl JwtMiddleware {
    pub fn new(issuer: web::Data<TokenIssuer>, pool: PgPool) -> Self {
        Self { issuer, pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
            pool: self.pool.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    issuer: web::Data<TokenIssuer>,
    pool: PgPool,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
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
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let issuer = self.issuer.clone();
        let mut pool = self.pool.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let identity = authenticate(authorization.as_deref(), &issuer, &mut pool)
                .await
                .map_err(|e| {
                    if matches!(e, AuthError::InvalidCredentials) {
                        tracing::warn!(path = %req.path(), "Rejected unauthenticated request");
                    }
                    AppError::Auth(e)
                })?;

            tracing::debug!(
                user_id = identity.user_id,
                role = %identity.role,
                "Request authenticated"
            );
            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}
