// src/services/api_server.rs
//! API Server for the SBT registry
//!
//! This module provides the REST API interface for the soulbound job
//! credential workflow. The API is built using Axum and includes endpoints for:
//! - Company registration
//! - Credential requests by subjects
//! - Pending request review and decisions by companies
//! - Issuance counts
//! - Third-party verification
//!
//! Authentication is performed upstream. The authenticated account arrives in
//! the `x-caller-address` header and is trusted as the caller identity.

use crate::contracts::errors::RegistryError;
use crate::contracts::sbt_registry::{Decision, PendingRequests};
use crate::models::credential::CredentialRecord;
use crate::models::identity::{ensure_identity, parse_identity, Identity, IdentityRole};
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::registry_state::ServiceError;
use crate::services::verifier::Verifier;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequestParts, Json, Path, State,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// Header carrying the authenticated caller address
pub const CALLER_HEADER: &str = "x-caller-address";

// API request and response structures

/// Response for company registration
#[derive(Serialize, Deserialize)]
struct RegisterCompanyResponse {
    company: Identity,
}

/// Request payload for asking a company to issue a credential
#[derive(Serialize, Deserialize)]
struct RequestSbtRequest {
    issuer: Identity,
    record: CredentialRecord,
}

/// Response for a submitted credential request
#[derive(Serialize, Deserialize)]
struct RequestSbtResponse {
    issuer: Identity,
    subject: Identity,
}

/// Request payload for accepting or rejecting a pending request
#[derive(Serialize, Deserialize)]
struct RespondRequest {
    subject: Identity,
    accept: bool,
}

/// Response for a decision on a pending request
#[derive(Serialize, Deserialize)]
struct RespondResponse {
    subject: Identity,
    accepted: bool,
}

/// Response containing the caller's issuance count
#[derive(Serialize, Deserialize)]
struct CountIssuedResponse {
    count: u64,
}

/// Response for credential verification
#[derive(Serialize, Deserialize)]
struct VerifyResponse {
    is_valid: bool,
}

/// Structured JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "DUPLICATE_REQUEST")
    pub code: String,
    pub message: String,
}

/// Errors returned by the HTTP layer.
///
/// Registry precondition violations keep their own codes; storage failures
/// are reported as a generic internal error and logged.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No caller identity was supplied (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An identity, path segment or JSON body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Registry(e) => match e {
                RegistryError::ZeroIdentity { .. } => (StatusCode::BAD_REQUEST, "ZERO_IDENTITY"),
                RegistryError::AlreadyRegistered(_) => (StatusCode::CONFLICT, "ALREADY_REGISTERED"),
                RegistryError::IssuerNotRegistered(_) => {
                    (StatusCode::FORBIDDEN, "ISSUER_NOT_REGISTERED")
                }
                RegistryError::DuplicateRequest { .. } => (StatusCode::CONFLICT, "DUPLICATE_REQUEST"),
                RegistryError::AlreadyIssued { .. } => (StatusCode::CONFLICT, "ALREADY_ISSUED"),
                RegistryError::NoPendingRequest { .. } => {
                    (StatusCode::NOT_FOUND, "NO_PENDING_REQUEST")
                }
            },
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Registry(e) => Self::Registry(e),
            ServiceError::Storage(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(detail) => {
                log::error!("internal server error: {}", detail);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// The authenticated caller of a request.
///
/// Extracted from [`CALLER_HEADER`]. Rejects a missing header (401), a
/// malformed address (400) and the zero address (400).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Identity);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", CALLER_HEADER)))?;
        let raw = header
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} is not valid text", CALLER_HEADER)))?;

        let identity = parse_identity(raw).map_err(ApiError::BadRequest)?;
        Ok(Caller(ensure_identity(identity, IdentityRole::Caller)?))
    }
}

/// API server state containing all service dependencies
#[derive(Clone)]
pub struct ApiServer {
    /// Service for the request/decision workflow
    credential_issuer: Arc<CredentialIssuer>,

    /// Service for verifying issued credentials
    verifier: Arc<Verifier>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `credential_issuer` - Service for registration, requests and decisions
    /// * `verifier` - Service for credential verification
    pub fn new(credential_issuer: CredentialIssuer, verifier: Verifier) -> Self {
        ApiServer {
            credential_issuer: Arc::new(credential_issuer),
            verifier: Arc::new(verifier),
        }
    }

    /// Builds the router with all API routes
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(Self::health_handler))
            .route("/companies", post(Self::register_company_handler))
            .route("/requests", post(Self::request_sbt_handler))
            .route("/requests/pending", get(Self::pending_requests_handler))
            .route("/requests/respond", post(Self::respond_handler))
            .route("/issued/count", get(Self::count_issued_handler))
            .route("/verify/:issuer/:subject/:id", get(Self::verify_handler))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and serves until Ctrl-C
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("API server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }

    async fn health_handler() -> &'static str {
        "ok"
    }

    // =====================
    // Company Handlers
    // =====================

    /// Registers the caller as an issuing company
    ///
    /// # Endpoint
    /// POST /companies
    ///
    /// # Responses
    /// - 201 Created
    /// - 409 Conflict: Caller already registered
    async fn register_company_handler(
        State(state): State<Arc<ApiServer>>,
        Caller(caller): Caller,
    ) -> Result<impl IntoResponse, ApiError> {
        state.credential_issuer.register_company(caller).await?;
        Ok((
            StatusCode::CREATED,
            Json(RegisterCompanyResponse { company: caller }),
        ))
    }

    /// Lists the caller's pending requests
    ///
    /// # Endpoint
    /// GET /requests/pending
    ///
    /// # Responses
    /// - 200 OK: `{ subjects: [...], records: [...] }` in submission order
    /// - 403 Forbidden: Caller is not a registered company
    async fn pending_requests_handler(
        State(state): State<Arc<ApiServer>>,
        Caller(caller): Caller,
    ) -> Result<Json<PendingRequests>, ApiError> {
        let pending = state.credential_issuer.pending_requests(caller).await?;
        Ok(Json(pending))
    }

    /// Accepts or rejects a pending request
    ///
    /// # Endpoint
    /// POST /requests/respond
    ///
    /// # Responses
    /// - 200 OK: `{ subject, accepted }`
    /// - 400 Bad Request: Malformed body
    /// - 403 Forbidden: Caller is not a registered company
    /// - 404 Not Found: No pending request from that subject
    async fn respond_handler(
        State(state): State<Arc<ApiServer>>,
        Caller(caller): Caller,
        payload: Result<Json<RespondRequest>, JsonRejection>,
    ) -> Result<Json<RespondResponse>, ApiError> {
        let Json(payload) = payload?;
        let decision = state
            .credential_issuer
            .respond_to_request(caller, payload.subject, payload.accept)
            .await?;
        Ok(Json(RespondResponse {
            subject: payload.subject,
            accepted: decision == Decision::Issued,
        }))
    }

    /// Returns the caller's issuance count
    ///
    /// # Endpoint
    /// GET /issued/count
    async fn count_issued_handler(
        State(state): State<Arc<ApiServer>>,
        Caller(caller): Caller,
    ) -> Json<CountIssuedResponse> {
        let count = state.credential_issuer.count_issued(caller).await;
        Json(CountIssuedResponse { count })
    }

    // =====================
    // Subject Handlers
    // =====================

    /// Requests a credential from a company on behalf of the caller
    ///
    /// # Endpoint
    /// POST /requests
    ///
    /// # Request Body
    /// `{ issuer, record }` with the record in its camelCase wire shape
    ///
    /// # Responses
    /// - 201 Created
    /// - 400 Bad Request: Malformed body, or the issuer is the zero address
    /// - 403 Forbidden: Issuer is not registered
    /// - 409 Conflict: A request is already pending, or a credential was already issued
    async fn request_sbt_handler(
        State(state): State<Arc<ApiServer>>,
        Caller(caller): Caller,
        payload: Result<Json<RequestSbtRequest>, JsonRejection>,
    ) -> Result<impl IntoResponse, ApiError> {
        let Json(payload) = payload?;
        state
            .credential_issuer
            .request_sbt(caller, payload.issuer, payload.record)
            .await?;
        Ok((
            StatusCode::CREATED,
            Json(RequestSbtResponse {
                issuer: payload.issuer,
                subject: caller,
            }),
        ))
    }

    // =====================
    // Verification
    // =====================

    /// Verifies an issued credential
    ///
    /// # Endpoint
    /// GET /verify/:issuer/:subject/:id
    ///
    /// # Responses
    /// - 200 OK: `{ is_valid }`, false when absent or mismatched
    /// - 400 Bad Request: Malformed id, malformed or zero identity
    async fn verify_handler(
        State(state): State<Arc<ApiServer>>,
        path: Result<Path<(String, String, u64)>, PathRejection>,
    ) -> Result<Json<VerifyResponse>, ApiError> {
        let Path((issuer, subject, id)) = path?;
        let issuer = parse_identity(&issuer).map_err(ApiError::BadRequest)?;
        let subject = parse_identity(&subject).map_err(ApiError::BadRequest)?;

        let is_valid = state.verifier.verify_sbt(issuer, subject, id).await?;
        Ok(Json(VerifyResponse { is_valid }))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    log::info!("Shutdown signal received, draining connections");
}
