pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "Subtrack CLI - operator tooling for the role consistency service")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Call /ensure-admin on a running server (with optional fallback endpoint)")]
    EnsureAdmin {
        #[arg(long, default_value = "http://127.0.0.1:3000", help = "Server base URL")]
        url: String,
        #[arg(long, help = "Fallback endpoint path tried when the primary call fails")]
        fallback: Option<String>,
    },

    #[command(about = "Reconcile the admin role directly against the configured stores")]
    Reconcile,

    #[command(about = "Show pending role writes without applying them")]
    Plan,

    #[command(about = "Mint a development access token signed with JWT_SECRET")]
    Token {
        #[arg(long, help = "Account id (token subject)")]
        account: Uuid,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, default_value_t = 1, help = "Validity in hours")]
        hours: i64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::EnsureAdmin { url, fallback } => {
            commands::roles::ensure_admin(&url, fallback, output_format).await
        }
        Commands::Reconcile => commands::roles::reconcile(output_format).await,
        Commands::Plan => commands::roles::plan(output_format).await,
        Commands::Token { account, email, hours } => {
            commands::token::mint(account, email, hours, output_format)
        }
    }
}
