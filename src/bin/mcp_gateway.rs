//! Command-line front end for the MCP gateway.
//!
//! Usage:
//!
//! ```text
//! mcp-gateway [--access-token TOKEN] <command>
//! ```
//!
//! Every command runs through the authorized gateway against the
//! `PostgreSQL` catalog and access stores named by `DATABASE_URL`. Results
//! are printed to standard out as JSON. Failures are printed to standard
//! error and the process exits non-zero.
//!
//! ```text
//! mcp-gateway init --mode prod
//! mcp-gateway register --name files --command mcp-files --arg /srv/data
//! mcp-gateway --access-token mcpg_... invoke files.read --input '{"path": "a.txt"}'
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mcp_gateway::access::adapters::postgres::{AccessPgPool, PostgresAccessStore};
use mcp_gateway::access::domain::ServerMode;
use mcp_gateway::access::services::CreateClientRequest;
use mcp_gateway::config::{ConfigError, GatewayConfig};
use mcp_gateway::frontdoor::{AuthorizedGateway, FrontdoorError};
use mcp_gateway::registry::adapters::postgres::PostgresMcpCatalog;
use mcp_gateway::registry::adapters::rmcp_client::RmcpSessionConnector;
use mcp_gateway::registry::domain::TransportSpec;
use mcp_gateway::registry::services::{RegisterServerRequest, ToolInvocationRequest};
use mcp_gateway::telemetry::{self, TelemetryError};
use mockable::DefaultClock;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;

type CliGateway =
    AuthorizedGateway<PostgresMcpCatalog, RmcpSessionConnector, PostgresAccessStore, DefaultClock>;

#[derive(Debug, Parser)]
#[command(name = "mcp-gateway", version, about = "Operate the MCP gateway")]
struct Cli {
    /// Bearer token identifying the caller in production mode.
    #[arg(long, global = true, env = "MCP_GATEWAY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize the gateway once.
    Init {
        /// Operating mode.
        #[arg(long, value_enum, default_value_t = ModeArg::Dev)]
        mode: ModeArg,
    },
    /// Register a backend MCP server.
    Register(RegisterArgs),
    /// Deregister a backend server and its tools.
    Deregister {
        /// Server name.
        name: String,
    },
    /// Reconcile a server's catalogued tools with what it offers now.
    Resync {
        /// Server name.
        name: String,
    },
    /// List servers, tools, or clients.
    #[command(subcommand)]
    List(ListCommand),
    /// Show one catalogued tool.
    GetTool {
        /// Qualified `<server>.<tool>` name.
        name: String,
    },
    /// Enable a tool or every tool of a server.
    Enable {
        /// `<server>.<tool>` or `<server>`.
        target: String,
    },
    /// Disable a tool or every tool of a server.
    Disable {
        /// `<server>.<tool>` or `<server>`.
        target: String,
    },
    /// Invoke a tool.
    Invoke {
        /// Qualified `<server>.<tool>` name.
        name: String,
        /// JSON object of tool arguments.
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Create a scoped client.
    #[command(subcommand)]
    Create(CreateCommand),
    /// Delete a scoped client.
    #[command(subcommand)]
    Delete(DeleteCommand),
    /// Show the principal the credential resolves to.
    Whoami,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Dev,
    Prod,
}

impl From<ModeArg> for ServerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Dev => Self::Dev,
            ModeArg::Prod => Self::Prod,
        }
    }
}

#[derive(Debug, Args)]
struct RegisterArgs {
    /// Unique server name.
    #[arg(long)]
    name: String,
    /// Human description.
    #[arg(long, default_value = "")]
    description: String,
    /// Command launching a subprocess backend.
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    command: Option<String>,
    /// Argument passed to the subprocess; repeatable.
    #[arg(long = "arg", requires = "command", allow_hyphen_values = true)]
    args: Vec<String>,
    /// `KEY=VALUE` environment entry for the subprocess; repeatable.
    #[arg(long = "env", requires = "command", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,
    /// Streamable HTTP endpoint of the backend.
    #[arg(long)]
    url: Option<String>,
    /// Bearer token sent to the HTTP backend.
    #[arg(long, requires = "url")]
    bearer_token: Option<String>,
}

impl RegisterArgs {
    fn into_request(self) -> RegisterServerRequest {
        let spec = match (self.command, self.url) {
            (Some(command), _) => TransportSpec {
                args: self.args,
                env: self.env.into_iter().collect::<BTreeMap<_, _>>(),
                ..TransportSpec::subprocess(command)
            },
            (None, Some(url)) => TransportSpec {
                bearer_token: self.bearer_token,
                ..TransportSpec::streamable_http(url)
            },
            (None, None) => TransportSpec::default(),
        };
        RegisterServerRequest::new(self.name, self.description, spec)
    }
}

#[derive(Debug, Subcommand)]
enum ListCommand {
    /// Registered servers.
    Servers,
    /// Catalogued tools.
    Tools {
        /// Only tools of this server.
        #[arg(long)]
        server: Option<String>,
    },
    /// Scoped clients.
    Clients,
}

#[derive(Debug, Subcommand)]
enum CreateCommand {
    /// A scoped client; its token is printed once.
    Client {
        /// Unique client name.
        name: String,
        /// Human description.
        #[arg(long, default_value = "")]
        description: String,
        /// Server the client may use; repeatable.
        #[arg(long = "allow")]
        allow: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DeleteCommand {
    /// A scoped client.
    Client {
        /// Client name.
        name: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to connect to the database: {0}")]
    Pool(#[source] diesel::r2d2::PoolError),
    #[error("runtime init failed: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("--input is not valid JSON: {0}")]
    Input(#[source] serde_json::Error),
    #[error("failed to render output: {0}")]
    Output(#[source] serde_json::Error),
    #[error("{}", .0.public_message())]
    Gateway(#[from] FrontdoorError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            emit(&output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config = GatewayConfig::from_env()?;
    telemetry::init(&config.log_filter, config.log_json)?;

    let pool: AccessPgPool = Pool::builder()
        .max_size(config.database_max_connections)
        .build(ConnectionManager::<PgConnection>::new(
            config.require_database_url()?,
        ))
        .map_err(CliError::Pool)?;
    let gateway: CliGateway = AuthorizedGateway::new(
        Arc::new(PostgresMcpCatalog::new(pool.clone())),
        Arc::new(RmcpSessionConnector::new()),
        Arc::new(PostgresAccessStore::new(pool)),
        Arc::new(DefaultClock),
        config.settings(),
    );

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(dispatch(&gateway, cli.access_token.as_deref(), cli.command))
}

async fn dispatch(
    gateway: &CliGateway,
    credential: Option<&str>,
    command: Command,
) -> Result<String, CliError> {
    match command {
        Command::Init { mode } => render(&gateway.initialize(mode.into()).await?),
        Command::Register(args) => {
            render(&gateway.register_server(credential, args.into_request()).await?)
        }
        Command::Deregister { name } => {
            render(&gateway.deregister_server(credential, &name).await?)
        }
        Command::Resync { name } => {
            render(&gateway.resync_server_tools(credential, &name).await?)
        }
        Command::List(ListCommand::Servers) => render(&gateway.list_servers(credential).await?),
        Command::List(ListCommand::Tools { server }) => {
            render(&gateway.list_tools(credential, server.as_deref()).await?)
        }
        Command::List(ListCommand::Clients) => render(&gateway.list_clients(credential).await?),
        Command::GetTool { name } => render(&gateway.get_tool(credential, &name).await?),
        Command::Enable { target } => render(&gateway.enable_tools(credential, &target).await?),
        Command::Disable { target } => {
            render(&gateway.disable_tools(credential, &target).await?)
        }
        Command::Invoke { name, input } => {
            let request = invocation_request(&name, &input)?;
            render(&gateway.invoke_tool(credential, request).await?)
        }
        Command::Create(CreateCommand::Client {
            name,
            description,
            allow,
        }) => {
            let request = CreateClientRequest {
                name,
                description,
                allow_list: allow,
            };
            render(&gateway.create_client(credential, request).await?)
        }
        Command::Delete(DeleteCommand::Client { name }) => {
            gateway.delete_client(credential, &name).await?;
            render(&serde_json::json!({ "deleted": name }))
        }
        Command::Whoami => render(&gateway.whoami(credential).await?),
    }
}

/// Builds an invocation from the tool name and its `--input` object.
fn invocation_request(name: &str, input: &str) -> Result<ToolInvocationRequest, CliError> {
    let mut body: Value = serde_json::from_str(input).map_err(CliError::Input)?;
    if let Value::Object(arguments) = &mut body {
        arguments.insert("name".to_owned(), Value::String(name.to_owned()));
    }
    ToolInvocationRequest::from_body(body).map_err(|err| CliError::Gateway(err.into()))
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn render(value: &impl Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Output)
}

#[expect(clippy::print_stdout, reason = "command output is the CLI's contract")]
fn emit(output: &str) {
    println!("{output}");
}

#[expect(clippy::print_stderr, reason = "failures are reported on standard error")]
fn report(err: &CliError) {
    match err {
        CliError::Gateway(inner) => eprintln!("error ({}): {err}", inner.kind()),
        _ => eprintln!("error: {err}"),
    }
}
