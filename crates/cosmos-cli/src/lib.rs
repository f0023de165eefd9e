//! cosmos-grpc CLI library.
//!
//! Configuration, command execution and output formatting for the
//! `cosmos-grpc` command-line tool.

#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;

use cosmos_client::CosmosClient;

/// Apply the global flags to `config` and run the selected command.
///
/// Returns the text the command wants printed. A node connection is only
/// opened for commands that talk to one.
pub async fn execute(cli: Cli, config: &mut Config) -> Result<String> {
    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let endpoint = cli.endpoint;
    let connect = |config: &Config| -> Result<CosmosClient> {
        let endpoint = match &endpoint {
            Some(endpoint) => endpoint.clone(),
            None => config.get_active_profile()?.grpc_url.clone(),
        };
        Ok(CosmosClient::connect_lazy(endpoint)?)
    };

    match cli.command {
        Command::Services(args) => commands::execute_services(args, &formatter),
        Command::Describe { service } => commands::execute_describe(&service, &formatter),
        Command::Resolve { path } => commands::execute_resolve(&path, &formatter),
        Command::Interfaces(args) if args.remote => {
            let client = connect(config)?;
            commands::execute_interfaces(args, Some(&client), &formatter).await
        }
        Command::Interfaces(args) => commands::execute_interfaces(args, None, &formatter).await,
        Command::Query(args) => {
            let client = connect(config)?;
            commands::execute_query(args, &client, &formatter).await
        }
        Command::Profile(args) => commands::execute_profile(args, config, &formatter),
    }
}
