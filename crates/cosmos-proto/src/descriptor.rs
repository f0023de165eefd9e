//! Service and method descriptors.
//!
//! Every compiled service carries a static [`ServiceSpec`]. The richer
//! [`ServiceDescriptor`] is built from it once per process, on first use, and
//! handed out as a `&'static` reference from then on. The [`Registry`] indexes
//! all of them by service name and request path, and exposes the compiled
//! schema set the services were generated from.

use crate::Error;
use prost::Message;
use prost_types::{
    FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto, MethodOptions,
    ServiceDescriptorProto,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tonic::Status;

/// Streaming shape of an RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// One request, one response.
    Unary,
    /// One request, a stream of responses.
    ServerStreaming,
    /// A stream of requests, one response.
    ClientStreaming,
    /// Streams in both directions.
    BidiStreaming,
}

impl MethodKind {
    /// Whether the client sends a stream.
    pub fn client_streaming(self) -> bool {
        matches!(self, MethodKind::ClientStreaming | MethodKind::BidiStreaming)
    }

    /// Whether the server replies with a stream.
    pub fn server_streaming(self) -> bool {
        matches!(self, MethodKind::ServerStreaming | MethodKind::BidiStreaming)
    }
}

/// Static definition of one method, emitted by the build script.
#[derive(Debug)]
pub struct MethodSpec {
    /// Route name as it appears on the wire.
    pub route: &'static str,
    /// Fully-qualified request message name.
    pub input_type: &'static str,
    /// Fully-qualified response message name.
    pub output_type: &'static str,
    /// Streaming shape.
    pub kind: MethodKind,
    /// Marked deprecated in the schema.
    pub deprecated: bool,
    /// Schema comment.
    pub comment: &'static str,
}

/// Static definition of one service, emitted by the build script.
#[derive(Debug)]
pub struct ServiceSpec {
    /// Protobuf package, e.g. `cosmos.bank.v1beta1`.
    pub package: &'static str,
    /// Service name inside the package, e.g. `Query`.
    pub name: &'static str,
    /// Schema file the service is declared in.
    pub proto_file: &'static str,
    /// Schema comment.
    pub comment: &'static str,
    /// Methods in declaration order.
    pub methods: &'static [MethodSpec],
}

/// Describes one RPC method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    id: usize,
    name: &'static str,
    full_method_name: String,
    path: String,
    input_type: &'static str,
    output_type: &'static str,
    kind: MethodKind,
    deprecated: bool,
    comment: &'static str,
}

impl MethodDescriptor {
    fn new(id: usize, service: &str, spec: &'static MethodSpec) -> Self {
        let full_method_name = format!("{service}/{}", spec.route);
        Self {
            id,
            name: spec.route,
            path: format!("/{full_method_name}"),
            full_method_name,
            input_type: spec.input_type,
            output_type: spec.output_type,
            kind: spec.kind,
            deprecated: spec.deprecated,
            comment: spec.comment,
        }
    }

    /// Position of the method in its service.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Route name, e.g. `Balance`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `<package>.<Service>/<Method>`.
    pub fn full_method_name(&self) -> &str {
        &self.full_method_name
    }

    /// HTTP/2 request path: the full method name with a leading `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fully-qualified request message name.
    pub fn input_type(&self) -> &'static str {
        self.input_type
    }

    /// Fully-qualified response message name.
    pub fn output_type(&self) -> &'static str {
        self.output_type
    }

    /// Streaming shape; always [`MethodKind::Unary`] for the compiled services.
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Whether the schema marks the method `deprecated`.
    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    /// Leading schema comment, one line per source line. Empty when absent.
    pub fn comment(&self) -> &'static str {
        self.comment
    }

    fn to_proto(&self) -> MethodDescriptorProto {
        MethodDescriptorProto {
            name: Some(self.name.to_string()),
            input_type: Some(format!(".{}", self.input_type)),
            output_type: Some(format!(".{}", self.output_type)),
            options: self.deprecated.then(|| MethodOptions {
                deprecated: Some(true),
                ..Default::default()
            }),
            client_streaming: Some(self.kind.client_streaming()),
            server_streaming: Some(self.kind.server_streaming()),
            ..Default::default()
        }
    }
}

/// Describes one gRPC service and its methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    full_name: String,
    package: &'static str,
    name: &'static str,
    proto_file: &'static str,
    comment: &'static str,
    methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    /// Build the descriptor for `spec`.
    ///
    /// Generated code caches the result; prefer the per-service
    /// `descriptor()` accessor over calling this directly.
    pub fn new(spec: &'static ServiceSpec) -> Self {
        let full_name = format!("{}.{}", spec.package, spec.name);
        let methods = spec
            .methods
            .iter()
            .enumerate()
            .map(|(id, method)| MethodDescriptor::new(id, &full_name, method))
            .collect();

        Self {
            full_name,
            package: spec.package,
            name: spec.name,
            proto_file: spec.proto_file,
            comment: spec.comment,
            methods,
        }
    }

    /// `<package>.<Service>`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Protobuf package, e.g. `cosmos.bank.v1beta1`.
    pub fn package(&self) -> &'static str {
        self.package
    }

    /// Service name inside the package, e.g. `Query`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Schema file the service was declared in.
    pub fn proto_file(&self) -> &'static str {
        self.proto_file
    }

    /// Leading schema comment of the service.
    pub fn comment(&self) -> &'static str {
        self.comment
    }

    /// Methods in declaration order; the index is the method id.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Look a method up by id.
    pub fn method(&self, id: usize) -> Option<&MethodDescriptor> {
        self.methods.get(id)
    }

    /// Look a method up by route name.
    pub fn method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The service as a protobuf descriptor, rebuilt from the method table.
    pub fn to_proto(&self) -> ServiceDescriptorProto {
        ServiceDescriptorProto {
            name: Some(self.name.to_string()),
            method: self.methods.iter().map(MethodDescriptor::to_proto).collect(),
            ..Default::default()
        }
    }

    /// The compiled schema file declaring this service, with its messages,
    /// imports and source comments.
    pub fn file_descriptor(&self) -> Result<&'static FileDescriptorProto, Error> {
        Registry::global()
            .file(self.proto_file)?
            .ok_or_else(|| Error::FileNotFound(self.proto_file.to_string()))
    }
}

/// Process-wide index of every compiled service.
#[derive(Debug)]
pub struct Registry {
    services: Vec<&'static ServiceDescriptor>,
    by_name: HashMap<&'static str, usize>,
    by_method: HashMap<&'static str, (usize, usize)>,
}

impl Registry {
    /// The registry, built on first use.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(crate::registry::service_descriptors()))
    }

    fn new(services: Vec<&'static ServiceDescriptor>) -> Self {
        let mut by_name = HashMap::with_capacity(services.len());
        let mut by_method = HashMap::new();

        for (index, service) in services.iter().copied().enumerate() {
            by_name.insert(service.full_name(), index);
            for method in service.methods() {
                by_method.insert(method.full_method_name(), (index, method.id()));
            }
        }

        Self {
            services,
            by_name,
            by_method,
        }
    }

    /// All services, in registration order.
    pub fn services(&self) -> &[&'static ServiceDescriptor] {
        &self.services
    }

    /// Look a service up by its fully-qualified name.
    pub fn service(&self, full_name: &str) -> Option<&'static ServiceDescriptor> {
        self.by_name.get(full_name).map(|&i| self.services[i])
    }

    /// Resolve a request path (`/pkg.Service/Method`) or a full method name.
    pub fn resolve(
        &self,
        path: &str,
    ) -> Option<(&'static ServiceDescriptor, &'static MethodDescriptor)> {
        let name = path.strip_prefix('/').unwrap_or(path);
        let &(service, method) = self.by_method.get(name)?;
        let service = self.services[service];
        Some((service, &service.methods()[method]))
    }

    /// Total number of methods across all services.
    pub fn method_count(&self) -> usize {
        self.by_method.len()
    }

    /// Every compiled schema file, imports first.
    ///
    /// Decoded from [`FILE_DESCRIPTOR_SET`](crate::FILE_DESCRIPTOR_SET) on first use.
    pub fn file_descriptor_set(&self) -> Result<&'static FileDescriptorSet, Error> {
        static SET: OnceLock<Result<FileDescriptorSet, prost::DecodeError>> = OnceLock::new();
        SET.get_or_init(|| FileDescriptorSet::decode(crate::FILE_DESCRIPTOR_SET))
            .as_ref()
            .map_err(|e| Error::Descriptor(e.clone()))
    }

    /// Look a compiled schema file up by name, e.g. `cosmos/bank/v1beta1/query.proto`.
    pub fn file(&self, name: &str) -> Result<Option<&'static FileDescriptorProto>, Error> {
        let set = self.file_descriptor_set()?;
        Ok(set.file.iter().find(|file| file.name() == name))
    }
}

/// Status returned by every method a server does not implement.
pub fn unimplemented(method: &MethodDescriptor) -> Status {
    Status::unimplemented(format!(
        "Method {} is unimplemented",
        method.full_method_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmos::bank::v1beta1::query_descriptor::{self, Method};
    use proptest::prelude::*;

    #[test]
    fn test_bank_query_descriptor() {
        let descriptor = query_descriptor::descriptor();
        assert_eq!(descriptor.full_name(), "cosmos.bank.v1beta1.Query");
        assert_eq!(descriptor.proto_file(), "cosmos/bank/v1beta1/query.proto");
        assert_eq!(descriptor.methods().len(), 8);

        let balance = &descriptor.methods()[0];
        assert_eq!(balance.name(), "Balance");
        assert_eq!(balance.full_method_name(), "cosmos.bank.v1beta1.Query/Balance");
        assert_eq!(balance.path(), "/cosmos.bank.v1beta1.Query/Balance");
        assert_eq!(balance.input_type(), "cosmos.bank.v1beta1.QueryBalanceRequest");
        assert_eq!(balance.output_type(), "cosmos.bank.v1beta1.QueryBalanceResponse");
        assert_eq!(balance.kind(), MethodKind::Unary);
    }

    #[test]
    fn test_method_ids_follow_declaration_order() {
        for (id, method) in Method::ALL.iter().enumerate() {
            assert_eq!(method.id(), id);
            assert_eq!(Method::from_id(id), Some(*method));
            assert_eq!(Method::from_path(method.path()), Some(*method));
            assert_eq!(method.descriptor().id(), id);
            assert_eq!(method.descriptor().path(), method.path());
        }
        assert_eq!(Method::from_id(Method::ALL.len()), None);
        assert_eq!(Method::DenomOwners.id(), 7);
    }

    #[test]
    fn test_descriptor_is_built_once() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| query_descriptor::descriptor() as *const ServiceDescriptor as usize))
            .collect();
        let addresses: Vec<usize> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(
            addresses[0],
            query_descriptor::descriptor() as *const ServiceDescriptor as usize
        );
    }

    #[test]
    fn test_registry_resolves_paths() {
        let registry = Registry::global();
        assert_eq!(registry.services().len(), 26);

        let (service, method) = registry
            .resolve("/cosmos.tx.v1beta1.Service/BroadcastTx")
            .unwrap();
        assert_eq!(service.full_name(), "cosmos.tx.v1beta1.Service");
        assert_eq!(method.id(), 2);

        let (_, method) = registry
            .resolve("cosmos.nft.v1beta1.Query/NFTsOfClass")
            .unwrap();
        assert_eq!(method.input_type(), "cosmos.nft.v1beta1.QueryNFTsOfClassRequest");

        assert!(registry.resolve("/cosmos.bank.v1beta1.Query/Missing").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn test_registry_service_lookup_shares_descriptor() {
        let registry = Registry::global();
        let service = registry.service("cosmos.bank.v1beta1.Query").unwrap();
        assert!(std::ptr::eq(service, query_descriptor::descriptor()));
        assert!(registry.service("cosmos.bank.v1beta1.Nope").is_none());
    }

    #[test]
    fn test_method_count_matches_services() {
        let registry = Registry::global();
        let total: usize = registry.services().iter().map(|s| s.methods().len()).sum();
        assert_eq!(registry.method_count(), total);
        assert_eq!(total, 147);
    }

    #[test]
    fn test_every_service_has_methods() {
        for service in Registry::global().services() {
            let first = service.methods().first();
            assert!(first.is_some(), "{} has no methods", service.full_name());
            assert_eq!(first.map(|m| m.id()), Some(0));
        }
    }

    #[test]
    fn test_file_descriptor() {
        let file = query_descriptor::descriptor().file_descriptor().unwrap();
        assert_eq!(file.name(), "cosmos/bank/v1beta1/query.proto");
        assert_eq!(file.package(), "cosmos.bank.v1beta1");
        assert_eq!(file.service.len(), 1);
        assert!(file
            .message_type
            .iter()
            .any(|m| m.name() == "QueryAllBalancesRequest"));
        assert!(file
            .dependency
            .iter()
            .any(|d| d == "cosmos/base/query/v1beta1/pagination.proto"));

        let method = &file.service[0].method[1];
        assert_eq!(method.name(), "AllBalances");
        assert_eq!(method.input_type(), ".cosmos.bank.v1beta1.QueryAllBalancesRequest");
        assert!(!method.client_streaming());
        assert!(!method.server_streaming());
    }

    #[test]
    fn test_to_proto_matches_compiled_service() {
        for service in Registry::global().services() {
            let compiled = service.file_descriptor().unwrap();
            let declared = compiled
                .service
                .iter()
                .find(|s| s.name() == service.name())
                .unwrap();
            let rebuilt = service.to_proto();
            let names = |s: &ServiceDescriptorProto| {
                s.method
                    .iter()
                    .map(|m| (m.name().to_string(), m.input_type().to_string(), m.output_type().to_string()))
                    .collect::<Vec<_>>()
            };
            assert_eq!(names(&rebuilt), names(declared), "{}", service.full_name());
        }
    }

    #[test]
    fn test_deprecated_method_options() {
        let registry = Registry::global();
        let (service, method) = registry
            .resolve("/cosmos.upgrade.v1beta1.Query/UpgradedConsensusState")
            .unwrap();
        assert!(method.deprecated());
        let proto = &service.to_proto().method[method.id()];
        assert_eq!(proto.options.as_ref().and_then(|o| o.deprecated), Some(true));
    }

    #[test]
    fn test_file_descriptor_set_is_self_contained() {
        let set = Registry::global().file_descriptor_set().unwrap();
        let names: Vec<&str> = set.file.iter().map(|f| f.name()).collect();

        // Imports precede the files that use them.
        for (index, file) in set.file.iter().enumerate() {
            for dependency in &file.dependency {
                let position = names.iter().position(|n| n == dependency);
                assert!(
                    matches!(position, Some(p) if p < index),
                    "{} imports {dependency}",
                    file.name()
                );
            }
        }
        assert!(names.contains(&"google/protobuf/any.proto"));

        let auth = Registry::global()
            .file("cosmos/auth/v1beta1/query.proto")
            .unwrap()
            .unwrap();
        assert!(auth.message_type.iter().any(|m| m.name() == "QueryAccountsRequest"));
        assert!(auth.source_code_info.is_some());
        assert!(Registry::global().file("cosmos/missing.proto").unwrap().is_none());
    }

    #[test]
    fn test_schema_comments_reach_descriptors() {
        let (_, method) = Registry::global()
            .resolve("/cosmos.bank.v1beta1.Query/Balance")
            .unwrap();
        assert!(!method.comment().is_empty());
        assert!(!method.comment().starts_with(' '));
    }

    #[test]
    fn test_acronym_service_names() {
        use crate::tendermint::abci::abci_application_descriptor;

        assert_eq!(abci_application_descriptor::SERVICE_NAME, "tendermint.abci.ABCIApplication");
        assert_eq!(
            abci_application_descriptor::Method::Echo.path(),
            "/tendermint.abci.ABCIApplication/Echo"
        );
        assert_eq!(abci_application_descriptor::Method::ALL.len(), 15);
    }

    #[test]
    fn test_unimplemented_status() {
        let status = unimplemented(Method::Balance.descriptor());
        assert_eq!(status.code(), tonic::Code::Unimplemented);
        assert_eq!(
            status.message(),
            "Method cosmos.bank.v1beta1.Query/Balance is unimplemented"
        );
    }

    proptest! {
        #[test]
        fn test_resolve_never_panics(path in ".{0,64}") {
            let _ = Registry::global().resolve(&path);
        }

        #[test]
        fn test_resolve_rejects_unknown_methods(method in "[A-Za-z]{1,24}") {
            let path = format!("/cosmos.bank.v1beta1.Query/{method}");
            let expected = Method::ALL.iter().any(|m| m.path() == path);
            prop_assert_eq!(Registry::global().resolve(&path).is_some(), expected);
        }
    }
}
