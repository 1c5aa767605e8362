pub mod connection;
pub mod serve;
pub mod tools;

use anyhow::Result;

use crate::mcp::transport::Transport;
use crate::settings::{Settings, SettingsOverrides};

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Commands {
    /// Serve the Harbor tools over MCP (default: stdio)
    Serve {
        /// Transport to serve on
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,
    },
    /// Check configuration for errors and unused options
    CheckConfig,
    /// List the tools this server exposes
    Tools,
    /// List projects once to verify the Harbor URL and credentials
    TestConnection,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            transport: Transport::Stdio,
        }
    }
}

pub async fn handle_command(cmd: Commands, overrides: &SettingsOverrides) -> Result<()> {
    match cmd {
        Commands::Serve { transport } => {
            let settings = Settings::new(overrides)?;
            serve::run(transport, settings).await
        }
        Commands::CheckConfig => {
            connection::check_config(overrides);
            Ok(())
        }
        Commands::Tools => {
            tools::print_tools();
            Ok(())
        }
        Commands::TestConnection => {
            let settings = Settings::new(overrides)?;
            connection::test_connection(&settings).await
        }
    }
}
