//! Service catalog and interface commands.

use crate::cli::{InterfacesArgs, ServicesArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cosmos_client::CosmosClient;
use cosmos_proto::{InterfaceRegistry, Registry};

/// List the compiled services.
pub fn execute_services(args: ServicesArgs, formatter: &Formatter) -> Result<String> {
    formatter.format_services(Registry::global().services(), args.methods)
}

/// Describe one service.
pub fn execute_describe(service: &str, formatter: &Formatter) -> Result<String> {
    let descriptor = Registry::global()
        .service(service)
        .ok_or_else(|| CliError::NotFound(format!("service '{}'", service)))?;
    formatter.format_service(descriptor)
}

/// Resolve a request path to its method.
pub fn execute_resolve(path: &str, formatter: &Formatter) -> Result<String> {
    let (service, method) = Registry::global()
        .resolve(path)
        .ok_or_else(|| CliError::NotFound(format!("method '{}'", path)))?;
    formatter.format_method(service, method)
}

/// List interfaces or implementations, locally or from a node.
pub async fn execute_interfaces(
    args: InterfacesArgs,
    client: Option<&CosmosClient>,
    formatter: &Formatter,
) -> Result<String> {
    match (args.name, client) {
        (None, Some(client)) => {
            let interfaces = client.interfaces().await?;
            formatter.format_names("Interface", &interfaces)
        }
        (Some(name), Some(client)) => {
            let implementations = client.implementations(&name).await?;
            formatter.format_names("Implementation", &implementations)
        }
        (None, None) => {
            let interfaces: Vec<String> = InterfaceRegistry::global()
                .interfaces()
                .map(str::to_string)
                .collect();
            formatter.format_names("Interface", &interfaces)
        }
        (Some(name), None) => {
            let implementations = InterfaceRegistry::global()
                .implementations(&name)
                .ok_or_else(|| CliError::NotFound(format!("interface '{}'", name)))?;
            formatter.format_names("Implementation", implementations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use cosmos_proto::interfaces::{ACCOUNT, FEE_ALLOWANCE};

    fn quiet() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    #[test]
    fn test_services_lists_every_service() {
        let output = execute_services(ServicesArgs { methods: false }, &quiet()).unwrap();
        assert_eq!(output.lines().count(), Registry::global().services().len());
        assert!(output.contains("cosmos.base.tendermint.v1beta1.Service"));
    }

    #[test]
    fn test_services_with_methods() {
        let output = execute_services(ServicesArgs { methods: true }, &quiet()).unwrap();
        assert_eq!(output.lines().count(), Registry::global().method_count());
    }

    #[test]
    fn test_describe_unknown_service() {
        let err = execute_describe("cosmos.nope.v1.Query", &quiet()).unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }

    #[test]
    fn test_resolve_with_and_without_slash() {
        let a = execute_resolve("/cosmos.feegrant.v1beta1.Msg/GrantAllowance", &quiet()).unwrap();
        let b = execute_resolve("cosmos.feegrant.v1beta1.Msg/GrantAllowance", &quiet()).unwrap();
        assert_eq!(a, b);
        assert!(execute_resolve("/cosmos.feegrant.v1beta1.Msg/Nope", &quiet()).is_err());
    }

    #[tokio::test]
    async fn test_local_interfaces() {
        let args = InterfacesArgs {
            name: None,
            remote: false,
        };
        let output = execute_interfaces(args, None, &quiet()).await.unwrap();
        assert!(output.lines().any(|l| l == ACCOUNT));
    }

    #[tokio::test]
    async fn test_local_implementations() {
        let args = InterfacesArgs {
            name: Some(FEE_ALLOWANCE.to_string()),
            remote: false,
        };
        let output = execute_interfaces(args, None, &quiet()).await.unwrap();
        assert!(output.contains("/cosmos.feegrant.v1beta1.BasicAllowance"));
        assert_eq!(output.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_local_unknown_interface() {
        let args = InterfacesArgs {
            name: Some("cosmos.nope.v1.Thing".to_string()),
            remote: false,
        };
        let err = execute_interfaces(args, None, &quiet()).await.unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }
}
