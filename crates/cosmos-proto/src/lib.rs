//! Cosmos SDK gRPC stubs
//!
//! Protobuf messages and gRPC stubs for the Cosmos SDK module services.
//!
//! The schemas under `proto/` are compiled at build time. Modules mirror the
//! protobuf packages (`cosmos::bank::v1beta1`, `tendermint::abci`, ...), and
//! every service in them gets:
//! - an async client (`<svc>_client`) and a server trait (`<svc>_server`)
//! - a blocking client (`<svc>_blocking`) driven by an owned tokio runtime
//! - a descriptor module (`<svc>_descriptor`) with the method-id table
//! - an implementation on [`Unimplemented`] that rejects every call
//!
//! [`Registry::global`] lists every service for routing, and
//! [`FILE_DESCRIPTOR_SET`] carries the compiled schemas for reflection.

#![warn(missing_docs)]

pub mod blocking;
pub mod descriptor;
pub mod error;
mod ext;
pub mod interfaces;

mod registry {
    include!(concat!(env!("OUT_DIR"), "/registry.rs"));
}

include!(concat!(env!("OUT_DIR"), "/packages.rs"));

/// Encoded `FileDescriptorSet` of every compiled schema, imports included.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/file_descriptor_set.bin"));

pub use descriptor::{MethodDescriptor, MethodKind, Registry, ServiceDescriptor};
pub use error::Error;
pub use interfaces::InterfaceRegistry;
pub use prost;
pub use prost_types;
pub use tonic;

/// Server base answering every RPC with `UNIMPLEMENTED`.
///
/// Implements the server trait of every compiled service. Real services
/// implement the trait themselves; this one fills the gaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unimplemented;

impl Unimplemented {
    /// Add an `Unimplemented` server for each service `include` accepts.
    ///
    /// Returns the names of the services that were mounted.
    pub fn mount<F>(routes: &mut tonic::service::RoutesBuilder, include: F) -> Vec<&'static str>
    where
        F: FnMut(&str) -> bool,
    {
        registry::mount_unimplemented(routes, include)
    }

    /// Run method `id` of the service named `service` on the wire format.
    ///
    /// A known method decodes `payload` first, so a malformed request answers
    /// `INVALID_ARGUMENT`; everything else answers `UNIMPLEMENTED`.
    pub async fn dispatch(
        service: &str,
        id: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>, tonic::Status> {
        registry::dispatch_unimplemented(service, id, payload).await
    }
}
