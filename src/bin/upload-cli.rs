use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use url::Url;

#[derive(Parser)]
#[command(name = "upload-cli")]
#[command(about = "Command-line client for the upload relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored files
    List,
    /// Delete one stored file
    Delete { filename: String },
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Send a chat message through the relay
    Send {
        message: String,
        /// Attachment as a JSON value
        #[arg(short, long)]
        attachment: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::List => {
            let res = client.get(endpoint(&cli.url, &["api", "files"])?).send().await?;
            print_response(res).await?;
        }
        Commands::Delete { filename } => {
            let res = client
                .delete(endpoint(&cli.url, &["api", "files", &filename])?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Upload { paths } => {
            let mut form = Form::new();
            for path in paths {
                let bytes = tokio::fs::read(&path).await?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                form = form.part("files", Part::bytes(bytes).file_name(name));
            }
            let res = client
                .post(endpoint(&cli.url, &["api", "upload"])?)
                .multipart(form)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Send {
            message,
            attachment,
        } => {
            let attachment: Value = match attachment {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            };
            let res = client
                .post(endpoint(&cli.url, &["api", "send-message"])?)
                .json(&json!({ "message": message, "attachment": attachment }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// Append path segments to `base`, percent-encoding each one.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be used as a base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
