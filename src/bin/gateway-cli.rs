use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Diagnostic CLI for the Security Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the service greeting
    Status,
    /// Gateway health and security service reachability
    Health,
    /// Run the security integration self-test
    TestSecurity,
    /// Upload a file through the security scan
    Upload {
        /// File to upload
        path: PathBuf,
        /// Content type to declare for the file part
        #[arg(short, long)]
        mime: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/", base)).send().await?,
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::TestSecurity => {
            client
                .get(format!("{}/api/test-security", base))
                .send()
                .await?
        }
        Commands::Upload { path, mime } => {
            let bytes = tokio::fs::read(&path).await?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());

            let mut part = Part::bytes(bytes).file_name(filename);
            if let Some(mime) = mime {
                part = part.mime_str(&mime)?;
            }

            client
                .post(format!("{}/api/upload", base))
                .multipart(Form::new().part("file", part))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
