//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use cosmos_client::Account;
use cosmos_proto::cosmos::base::tendermint::v1beta1::GetNodeInfoResponse;
use cosmos_proto::cosmos::base::v1beta1::Coin;
use cosmos_proto::cosmos::tx::v1beta1::GetTxResponse;
use cosmos_proto::{MethodDescriptor, ServiceDescriptor};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a list of services, optionally expanded to their methods.
    pub fn format_services(&self, services: &[&ServiceDescriptor], methods: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let services: Vec<Value> = services
                    .iter()
                    .map(|s| service_json(s, methods))
                    .collect();
                Ok(serde_json::to_string_pretty(&services)?)
            }
            OutputFormat::Quiet if methods => Ok(services
                .iter()
                .flat_map(|s| s.methods().iter().map(|m| m.full_method_name().to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Quiet => Ok(services
                .iter()
                .map(|s| s.full_name())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table if methods => Ok(self.methods_table(services)),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Service", "File", "Methods"]);
                for service in services {
                    builder.push_record([
                        service.full_name().to_string(),
                        service.proto_file().to_string(),
                        service.methods().len().to_string(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format one service with its comment and methods.
    pub fn format_service(&self, service: &ServiceDescriptor) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(format!(
                "{}\n{}\n{}",
                self.colorize(service.full_name(), "cyan"),
                service.comment(),
                self.methods_table(&[service])
            )),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&service_json(service, true))?),
            OutputFormat::Quiet => self.format_services(&[service], true),
        }
    }

    /// Format a resolved method.
    pub fn format_method(
        &self,
        service: &ServiceDescriptor,
        method: &MethodDescriptor,
    ) -> Result<String> {
        self.format_details(&[
            ("method", method.full_method_name().to_string()),
            ("service", service.full_name().to_string()),
            ("id", method.id().to_string()),
            ("path", method.path().to_string()),
            ("request", method.input_type().to_string()),
            ("response", method.output_type().to_string()),
            ("deprecated", method.deprecated().to_string()),
        ])
    }

    /// Format a titled list of names.
    pub fn format_names(&self, title: &str, names: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(names)?),
            OutputFormat::Quiet => Ok(names.join("\n")),
            OutputFormat::Table => {
                if names.is_empty() {
                    return Ok(self.colorize("Nothing found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record([title]);
                for name in names {
                    builder.push_record([name.as_str()]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format coin balances.
    pub fn format_coins(&self, coins: &[Coin]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let coins: Vec<Value> = coins
                    .iter()
                    .map(|c| json!({ "denom": c.denom, "amount": c.amount }))
                    .collect();
                Ok(serde_json::to_string_pretty(&coins)?)
            }
            OutputFormat::Quiet => Ok(coins
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if coins.is_empty() {
                    return Ok(self.colorize("No balances found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Denom", "Amount"]);
                for coin in coins {
                    builder.push_record([coin.denom.as_str(), coin.amount.as_str()]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format a decoded account.
    pub fn format_account(&self, account: &Account) -> Result<String> {
        let base = account.base_account();
        let field = |f: fn(&cosmos_proto::cosmos::auth::v1beta1::BaseAccount) -> String| {
            base.map(f).unwrap_or_default()
        };

        self.format_details(&[
            ("address", field(|b| b.address.clone())),
            ("type", account.kind().to_string()),
            ("account_number", field(|b| b.account_number.to_string())),
            ("sequence", field(|b| b.sequence.to_string())),
            (
                "pub_key",
                field(|b| {
                    b.pub_key
                        .as_ref()
                        .map(|k| k.type_url.clone())
                        .unwrap_or_default()
                }),
            ),
        ])
    }

    /// Format node information.
    pub fn format_node_info(&self, info: &GetNodeInfoResponse) -> Result<String> {
        let node = info.default_node_info.clone().unwrap_or_default();
        let app = info.application_version.clone().unwrap_or_default();

        self.format_details(&[
            ("network", node.network),
            ("moniker", node.moniker),
            ("node_id", node.default_node_id),
            ("node_version", node.version),
            ("app_name", app.app_name),
            ("app_version", app.version),
            ("git_commit", app.git_commit),
            ("cosmos_sdk_version", app.cosmos_sdk_version),
        ])
    }

    /// Format a transaction lookup.
    pub fn format_tx(&self, tx: &GetTxResponse) -> Result<String> {
        let response = tx.tx_response.clone().unwrap_or_default();
        let body = tx.tx.as_ref().and_then(|t| t.body.clone()).unwrap_or_default();
        let messages: Vec<&str> = body.messages.iter().map(|m| m.type_url.as_str()).collect();
        let status = if response.is_ok() {
            self.colorize("ok", "green")
        } else {
            self.colorize(&format!("failed ({}/{})", response.codespace, response.code), "red")
        };

        self.format_details(&[
            ("txhash", response.txhash),
            ("height", response.height.to_string()),
            ("status", status),
            ("gas_wanted", response.gas_wanted.to_string()),
            ("gas_used", response.gas_used.to_string()),
            ("memo", body.memo),
            ("messages", messages.join(", ")),
            ("timestamp", response.timestamp),
        ])
    }

    /// Format field/value pairs.
    pub fn format_details(&self, rows: &[(&str, String)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let object: serde_json::Map<String, Value> = rows
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                    .collect();
                Ok(serde_json::to_string_pretty(&object)?)
            }
            OutputFormat::Quiet => Ok(rows.first().map(|(_, v)| v.clone()).unwrap_or_default()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (field, value) in rows {
                    builder.push_record([*field, value.as_str()]);
                }
                Ok(render(builder))
            }
        }
    }

    fn methods_table(&self, services: &[&ServiceDescriptor]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Service", "Id", "Method", "Request", "Response"]);
        for service in services {
            for method in service.methods() {
                let name = if method.deprecated() {
                    format!("{} (deprecated)", method.name())
                } else {
                    method.name().to_string()
                };
                builder.push_record([
                    service.full_name().to_string(),
                    method.id().to_string(),
                    name,
                    method.input_type().to_string(),
                    method.output_type().to_string(),
                ]);
            }
        }
        render(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn service_json(service: &ServiceDescriptor, methods: bool) -> Value {
    let mut value = json!({
        "name": service.full_name(),
        "package": service.package(),
        "proto_file": service.proto_file(),
        "comment": service.comment(),
    });
    if methods {
        value["methods"] = service
            .methods()
            .iter()
            .map(|m| {
                json!({
                    "id": m.id(),
                    "name": m.name(),
                    "path": m.path(),
                    "input_type": m.input_type(),
                    "output_type": m.output_type(),
                    "deprecated": m.deprecated(),
                })
            })
            .collect();
    }
    value
}
