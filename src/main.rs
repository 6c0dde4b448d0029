use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use graph_upload::{logging, naming, ClientConfig, ConflictBehavior, DialoguerPrompt, GraphClient};

#[derive(Parser)]
#[command(name = "graph-upload")]
#[command(about = "Upload files to a SharePoint drive through Microsoft Graph")]
struct Cli {
    /// JSON configuration file; the environment is used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and upload one file
    Upload {
        /// Directory holding the file
        local_dir: PathBuf,

        /// Destination folder below the drive root
        remote_folder: String,

        /// File name inside LOCAL_DIR
        file: String,

        /// What to do if the remote file already exists
        #[arg(long)]
        conflict: Option<ConflictBehavior>,
    },
    /// Run the interactive sign-in and check the resulting token
    Login,
    /// Print the remote-safe, URL-encoded form of TEXT
    Encode {
        text: String,
    },
}

/// Load configuration and install logging for commands that talk to the API
async fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::load_file(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::from_env().context("Failed to read configuration from environment")?,
    };
    logging::init(config.debug);
    debug!(config = ?config, "Configuration loaded");
    Ok(config)
}

async fn signed_in_client(config: ClientConfig) -> Result<GraphClient> {
    let mut client = GraphClient::new(config).context("Failed to create Graph client")?;
    client
        .authenticate_interactive(&DialoguerPrompt)
        .await
        .context("Sign-in failed")?;
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { text } => {
            println!("{}", naming::encode(&text));
        }
        Commands::Login => {
            let config = load_config(cli.config.as_ref()).await?;
            let client = signed_in_client(config).await?;
            let expires_at = client
                .token_state()
                .expires_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Signed in. Access token expires at {}", expires_at);
        }
        Commands::Upload {
            local_dir,
            remote_folder,
            file,
            conflict,
        } => {
            let config = load_config(cli.config.as_ref()).await?;
            let mut client = signed_in_client(config).await?;
            info!(file = %file, remote_folder = %remote_folder, "Starting upload");

            let response = client
                .upload_file(&local_dir, &remote_folder, &file, conflict)
                .await
                .context("Upload failed")?;

            match response {
                Some(_) => println!("{}", client.display_url(&remote_folder, &file)),
                None => println!(
                    "Nothing uploaded: {} not found or server discarded the payload",
                    local_dir.join(&file).display()
                ),
            }
        }
    }

    Ok(())
}
