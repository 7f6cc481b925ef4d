use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result};
use nmip::{ConnectionProperties, NetworkConnections, NmipConfig, OperationResult, TaskHandler};
use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Configure NetworkManager connections through keyfile profiles and nmcli
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory profiles are written to
    #[arg(long, global = true)]
    connections_dir: Option<PathBuf>,

    /// nmcli binary to invoke
    #[arg(long, global = true)]
    nmcli: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a connection profile and load it into NetworkManager
    Define(PropertiesInput),

    /// Define a connection and bring it up
    Configure(PropertiesInput),

    /// Print the profile that define would write, without writing it
    Render(PropertiesInput),

    /// Activate a connection
    Up { connection_id: String },

    /// Deactivate a connection
    Down { connection_id: String },

    /// Delete a connection and its profile
    Delete { connection_id: String },

    /// Dispatch an action the way the agent does
    Exec {
        /// Function name, e.g. define_connection or up_connection
        action: String,

        /// Parameters as JSON
        params: Option<String>,

        /// Read parameters from stdin
        #[arg(short, long, conflicts_with = "params")]
        stdin: bool,
    },
}

#[derive(Args, Debug)]
struct PropertiesInput {
    /// Properties as JSON, e.g. '{"connection": {"id": "main"}}'
    properties: Option<String>,

    /// JSON file containing the properties
    #[arg(short, long, conflicts_with_all = ["properties", "stdin"])]
    file: Option<PathBuf>,

    /// Read properties from stdin
    #[arg(short, long, conflicts_with = "properties")]
    stdin: bool,
}

impl PropertiesInput {
    fn load(&self) -> Result<ConnectionProperties> {
        let raw = if let Some(file) = &self.file {
            std::fs::read_to_string(file).into_diagnostic()?
        } else if self.stdin {
            read_stdin()?
        } else if let Some(json) = &self.properties {
            json.clone()
        } else {
            return Err(miette!("no properties given; pass JSON, --file or --stdin"));
        };
        let value: Value = serde_json::from_str(&raw).into_diagnostic()?;
        Ok(ConnectionProperties::from_value(&value)?)
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).into_diagnostic()?;
    Ok(buf)
}

fn load_config(cli: &Cli) -> Result<NmipConfig> {
    let mut config = match &cli.config {
        Some(path) => NmipConfig::from_file(path)?,
        None => NmipConfig::default(),
    };
    if let Some(dir) = &cli.connections_dir {
        config = config.with_connections_dir(dir);
    }
    if let Some(nmcli) = &cli.nmcli {
        config = config.with_nmcli([nmcli.as_str()]);
    }
    Ok(config)
}

fn print_result(res: &OperationResult) -> Result<ExitCode> {
    println!("{}", serde_json::to_string(res).into_diagnostic()?);
    Ok(match u8::try_from(res.retcode) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    })
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("nmip=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&cli)?;
    debug!(?config, "loaded configuration");

    let euid = unsafe { libc::geteuid() };
    if euid != 0 && config.owner_uid != euid {
        warn!(euid, "not running as root, setting profile ownership will likely fail");
    }

    let connections = NetworkConnections::new(config);
    let res = match &cli.command {
        Commands::Define(input) => connections.define_connection(&input.load()?)?,
        Commands::Configure(input) => connections.configure_connection(&input.load()?)?,
        Commands::Render(input) => {
            let props = input.load()?;
            let (path, text) = connections
                .render_connection(&props)
                .ok_or_else(|| miette!("connection.id is required"))?;
            println!("# {}", path.display());
            print!("{}", text);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Up { connection_id } => connections.up_connection(connection_id)?,
        Commands::Down { connection_id } => connections.down_connection(connection_id)?,
        Commands::Delete { connection_id } => connections.delete_connection(connection_id)?,
        Commands::Exec {
            action,
            params,
            stdin,
        } => {
            let raw = if *stdin {
                read_stdin()?
            } else {
                params.clone().unwrap_or_else(|| "null".to_string())
            };
            let params: Value = serde_json::from_str(&raw).into_diagnostic()?;
            connections.exec(action, &params)?
        }
    };

    print_result(&res)
}
