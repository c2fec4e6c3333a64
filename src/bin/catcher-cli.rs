use clap::{Parser, Subcommand};
use reqwest::header::HOST;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "catcher-cli")]
#[command(about = "Admin CLI for the request catcher", long_about = None)]
struct Cli {
    /// Base URL of the catcher.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Root host the admin surface answers on, sent as the Host header.
    #[arg(long, default_value = "requestcatcher.com")]
    host: String,

    #[arg(long, default_value = "admin")]
    user: String,

    #[arg(short, long, env = "CATCHER_ADMIN_PASSWORD")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catcher status
    Status,
    /// List tenants and their viewer counts
    Tenants,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match cli.command {
        Commands::Status => "/admin/status",
        Commands::Tenants => "/admin/tenants",
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .header(HOST, &cli.host)
        .basic_auth(&cli.user, Some(&cli.password))
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
