//! Assembles the set of gRPC services a server exposes.

use crate::reflection::InterfaceReflection;
use crate::ServerError;
use cosmos_proto::cosmos::base::reflection::v1beta1::reflection_service_server::ReflectionServiceServer;
use cosmos_proto::{Registry, ServiceDescriptor, Unimplemented, FILE_DESCRIPTOR_SET};
use serde::Serialize;
use std::collections::BTreeSet;
use std::convert::Infallible;
use tonic::body::BoxBody;
use tonic::codegen::{http, Service};
use tonic::server::NamedService;
use tonic::service::{Routes, RoutesBuilder};
use tonic_reflection::server::Builder as ReflectionBuilder;
use tracing::{debug, info, warn};

/// How a registered service is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// A real implementation was added.
    Implemented,
    /// Served by [`Unimplemented`].
    Unimplemented,
    /// Not mounted at all.
    Disabled,
}

/// One registered service and how it ended up mounted.
#[derive(Debug, Clone, Copy)]
pub struct ServiceEntry {
    /// Descriptor from the global registry
    pub descriptor: &'static ServiceDescriptor,
    /// Mount status
    pub status: ServiceStatus,
}

/// Builder for the services mounted on a server.
pub struct ServiceSet {
    routes: RoutesBuilder,
    implemented: BTreeSet<&'static str>,
    disabled: BTreeSet<String>,
}

impl std::fmt::Debug for ServiceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSet")
            .field("implemented", &self.implemented)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Default for ServiceSet {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl ServiceSet {
    /// Create an empty set; services named in `disabled` are never mounted.
    pub fn new<I, N>(disabled: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            routes: RoutesBuilder::default(),
            implemented: BTreeSet::new(),
            disabled: disabled.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a set that already serves reflection: Cosmos interface
    /// reflection plus `grpc.reflection.v1` and `v1alpha` over every compiled
    /// schema.
    pub fn with_reflection<I, N>(disabled: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut set = Self::new(disabled);
        set.add(ReflectionServiceServer::new(InterfaceReflection::default()));

        let v1 = ReflectionBuilder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        let v1alpha = ReflectionBuilder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1alpha()?;
        set.add(v1).add(v1alpha);

        Ok(set)
    }

    /// Mount a real implementation.
    ///
    /// Disabled services are skipped, and so is a second implementation of a
    /// service that is already mounted.
    pub fn add<S>(&mut self, service: S) -> &mut Self
    where
        S: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        if self.is_disabled(S::NAME) {
            info!(service = S::NAME, "Skipping disabled service");
            return self;
        }
        if self.implemented.contains(S::NAME) {
            warn!(service = S::NAME, "Service already mounted, ignoring duplicate");
            return self;
        }

        debug!(service = S::NAME, "Mounting service");
        self.routes.add_service(service);
        self.implemented.insert(S::NAME);
        self
    }

    /// Whether `name` was added with a real implementation.
    pub fn is_implemented(&self, name: &str) -> bool {
        self.implemented.contains(name)
    }

    /// Whether `name` is excluded from the server.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    /// Fill the gaps with [`Unimplemented`] and produce the routes.
    ///
    /// The returned table lists every registered service in registry order.
    pub fn build(mut self) -> (Routes, Vec<ServiceEntry>) {
        let implemented = &self.implemented;
        let disabled = &self.disabled;
        let defaulted = Unimplemented::mount(&mut self.routes, |name| {
            !implemented.contains(name) && !disabled.contains(name)
        });
        debug!(count = defaulted.len(), "Mounted unimplemented services");

        let entries = Registry::global()
            .services()
            .iter()
            .map(|&descriptor| {
                let name = descriptor.full_name();
                let status = if self.implemented.contains(name) {
                    ServiceStatus::Implemented
                } else if self.disabled.contains(name) {
                    ServiceStatus::Disabled
                } else {
                    ServiceStatus::Unimplemented
                };
                ServiceEntry { descriptor, status }
            })
            .collect();

        (self.routes.routes(), entries)
    }
}
