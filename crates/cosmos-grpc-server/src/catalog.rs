//! HTTP catalog of the mounted gRPC services.
//!
//! Serves JSON descriptions of every registered service and its methods
//! alongside the mount status chosen when the server was built.

use crate::services::{ServiceEntry, ServiceStatus};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use cosmos_proto::{MethodDescriptor, MethodKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared catalog state
#[derive(Debug, Clone)]
pub struct CatalogState {
    /// Every registered service with its status
    pub services: Arc<Vec<ServiceEntry>>,
}

impl CatalogState {
    /// Wrap a service table
    pub fn new(services: Vec<ServiceEntry>) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "ok" while the process is serving
    pub status: String,
    /// Services served by a real implementation
    pub implemented: usize,
    /// Services answering `UNIMPLEMENTED`
    pub unimplemented: usize,
    /// Services not mounted
    pub disabled: usize,
}

/// Summary row for `GET /services`
#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    /// Fully-qualified service name
    pub name: &'static str,
    /// Schema file declaring the service
    pub proto_file: &'static str,
    /// Mount status
    pub status: ServiceStatus,
    /// Number of methods
    pub methods: usize,
}

/// Full description for `GET /services/{name}`
#[derive(Debug, Serialize)]
pub struct ServiceDetail {
    /// Fully-qualified service name
    pub name: &'static str,
    /// Protobuf package
    pub package: &'static str,
    /// Schema file declaring the service
    pub proto_file: &'static str,
    /// Leading comment
    pub comment: &'static str,
    /// Mount status
    pub status: ServiceStatus,
    /// Methods in id order
    pub methods: Vec<MethodDetail>,
}

/// One method of a [`ServiceDetail`]
#[derive(Debug, Serialize)]
pub struct MethodDetail {
    /// Method id within the service
    pub id: usize,
    /// Method name
    pub name: &'static str,
    /// Request path
    pub path: &'static str,
    /// Fully-qualified request type
    pub input_type: &'static str,
    /// Fully-qualified response type
    pub output_type: &'static str,
    /// Streaming shape
    pub kind: MethodKind,
    /// Marked deprecated in the schema
    pub deprecated: bool,
}

impl From<&'static MethodDescriptor> for MethodDetail {
    fn from(method: &'static MethodDescriptor) -> Self {
        Self {
            id: method.id(),
            name: method.name(),
            path: method.path(),
            input_type: method.input_type(),
            output_type: method.output_type(),
            kind: method.kind(),
            deprecated: method.deprecated(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Catalog error type
#[derive(Debug)]
pub enum CatalogError {
    /// No registered service has this name
    UnknownService(String),
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            CatalogError::UnknownService(name) => {
                (StatusCode::NOT_FOUND, format!("Unknown service: {name}"))
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// GET /health
async fn health_check(State(state): State<CatalogState>) -> Json<HealthCheckResponse> {
    let count = |status| {
        state
            .services
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    };

    Json(HealthCheckResponse {
        status: "ok".to_string(),
        implemented: count(ServiceStatus::Implemented),
        unimplemented: count(ServiceStatus::Unimplemented),
        disabled: count(ServiceStatus::Disabled),
    })
}

/// GET /services
async fn list_services(State(state): State<CatalogState>) -> Json<Vec<ServiceSummary>> {
    let services = state
        .services
        .iter()
        .map(|entry| ServiceSummary {
            name: entry.descriptor.full_name(),
            proto_file: entry.descriptor.proto_file(),
            status: entry.status,
            methods: entry.descriptor.methods().len(),
        })
        .collect();

    Json(services)
}

/// GET /services/{name}
async fn describe_service(
    State(state): State<CatalogState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceDetail>, CatalogError> {
    let entry = state
        .services
        .iter()
        .find(|entry| entry.descriptor.full_name() == name)
        .ok_or(CatalogError::UnknownService(name))?;
    let descriptor = entry.descriptor;

    Ok(Json(ServiceDetail {
        name: descriptor.full_name(),
        package: descriptor.package(),
        proto_file: descriptor.proto_file(),
        comment: descriptor.comment(),
        status: entry.status,
        methods: descriptor.methods().iter().map(MethodDetail::from).collect(),
    }))
}

/// Create the axum router for the catalog
pub fn create_router(state: CatalogState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/services", get(list_services))
        .route("/services/:name", get(describe_service))
        .with_state(state)
}
