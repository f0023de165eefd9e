//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cosmos-grpc - Inspect and query the Cosmos SDK gRPC services.
#[derive(Debug, Parser)]
#[command(name = "cosmos-grpc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "COSMOS_GRPC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// gRPC endpoint, overriding the profile
    #[arg(short, long, global = true, env = "COSMOS_GRPC_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Log client activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (names only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the compiled services
    Services(ServicesArgs),

    /// Show the methods of one service
    Describe {
        /// Fully-qualified service name (e.g., cosmos.bank.v1beta1.Query)
        service: String,
    },

    /// Resolve a request path to its service and method
    Resolve {
        /// Request path (e.g., /cosmos.bank.v1beta1.Query/Balance)
        path: String,
    },

    /// List interfaces, or the implementations of one
    Interfaces(InterfacesArgs),

    /// Query a node
    Query(QueryArgs),

    /// Manage configuration profiles
    Profile(ProfileArgs),
}

/// Arguments for the services command.
#[derive(Debug, Parser)]
pub struct ServicesArgs {
    /// Also list every method
    #[arg(short, long)]
    pub methods: bool,
}

/// Arguments for the interfaces command.
#[derive(Debug, Parser)]
pub struct InterfacesArgs {
    /// Interface name (e.g., cosmos.auth.v1beta1.AccountI)
    pub name: Option<String>,

    /// Ask the node's reflection service instead of the local registry
    #[arg(short, long)]
    pub remote: bool,
}

/// Arguments for the query command.
#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// What to query
    #[command(subcommand)]
    pub target: QueryTarget,
}

/// Node queries.
#[derive(Debug, Subcommand)]
pub enum QueryTarget {
    /// Balance of one denomination
    Balance {
        /// Account address
        address: String,
        /// Coin denomination
        denom: String,
    },

    /// Every balance of an account
    Balances {
        /// Account address
        address: String,
    },

    /// Account details
    Account {
        /// Account address
        address: String,
    },

    /// Node and application version
    NodeInfo,

    /// Height of the latest block
    LatestBlock,

    /// Whether the node is catching up
    Syncing,

    /// Transaction by hash
    Tx {
        /// Hex-encoded transaction hash
        hash: String,
    },
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    /// Profile action
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// gRPC endpoint URL
        #[arg(short, long)]
        url: String,
        /// Chain ID
        #[arg(long)]
        chain_id: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_command() {
        let cli = Cli::parse_from(["cosmos-grpc", "services", "--methods"]);
        match cli.command {
            Command::Services(args) => assert!(args.methods),
            _ => panic!("Expected Services command"),
        }
    }

    #[test]
    fn test_query_balance_command() {
        let cli = Cli::parse_from([
            "cosmos-grpc",
            "--endpoint",
            "http://node:9090",
            "query",
            "balance",
            "cosmos1xyz",
            "uatom",
        ]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://node:9090"));
        match cli.command {
            Command::Query(QueryArgs {
                target: QueryTarget::Balance { address, denom },
            }) => {
                assert_eq!(address, "cosmos1xyz");
                assert_eq!(denom, "uatom");
            }
            _ => panic!("Expected Query Balance command"),
        }
    }

    #[test]
    fn test_global_format_after_subcommand() {
        let cli = Cli::parse_from(["cosmos-grpc", "interfaces", "--format", "json"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(
            cli.command,
            Command::Interfaces(InterfacesArgs { name: None, remote: false })
        ));
    }

    #[test]
    fn test_profile_set_command() {
        let cli = Cli::parse_from([
            "cosmos-grpc",
            "profile",
            "set",
            "mainnet",
            "--url",
            "https://grpc.example.com:443",
            "--chain-id",
            "cosmoshub-4",
        ]);
        match cli.command {
            Command::Profile(ProfileArgs {
                action: ProfileAction::Set { name, url, chain_id },
            }) => {
                assert_eq!(name, "mainnet");
                assert_eq!(url, "https://grpc.example.com:443");
                assert_eq!(chain_id.as_deref(), Some("cosmoshub-4"));
            }
            _ => panic!("Expected Profile Set command"),
        }
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["cosmos-grpc"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
