//! Interface reflection backed by an [`InterfaceRegistry`].

use cosmos_proto::cosmos::base::reflection::v1beta1::{
    reflection_service_server::ReflectionService, ListAllInterfacesRequest,
    ListAllInterfacesResponse, ListImplementationsRequest, ListImplementationsResponse,
};
use cosmos_proto::InterfaceRegistry;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::debug;

/// `cosmos.base.reflection.v1beta1.ReflectionService` over a registry.
#[derive(Debug, Clone)]
pub struct InterfaceReflection {
    registry: Arc<InterfaceRegistry>,
}

impl Default for InterfaceReflection {
    fn default() -> Self {
        Self::new(InterfaceRegistry::global().clone())
    }
}

impl InterfaceReflection {
    /// Serve the interfaces of `registry`.
    pub fn new(registry: InterfaceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

#[tonic::async_trait]
impl ReflectionService for InterfaceReflection {
    async fn list_all_interfaces(
        &self,
        _request: Request<ListAllInterfacesRequest>,
    ) -> Result<Response<ListAllInterfacesResponse>, Status> {
        let interface_names = self.registry.interfaces().map(str::to_string).collect();
        Ok(Response::new(ListAllInterfacesResponse { interface_names }))
    }

    async fn list_implementations(
        &self,
        request: Request<ListImplementationsRequest>,
    ) -> Result<Response<ListImplementationsResponse>, Status> {
        let interface_name = request.into_inner().interface_name;
        if interface_name.is_empty() {
            return Err(Status::invalid_argument("interface name cannot be empty"));
        }

        let implementation_message_names = match self.registry.implementations(&interface_name) {
            Some(implementations) => implementations.to_vec(),
            None => {
                debug!(interface = %interface_name, "Unknown interface");
                Vec::new()
            }
        };

        Ok(Response::new(ListImplementationsResponse {
            implementation_message_names,
        }))
    }
}
