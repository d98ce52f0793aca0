use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chain-cli")]
#[command(about = "CLI client for the demo chain node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the full chain snapshot
    Chain {
        /// Node base URL (e.g. http://127.0.0.1:8080)
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
    },
    /// Mine a new block holding the given payload
    Mine {
        /// Node base URL (e.g. http://127.0.0.1:8080)
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
        /// Block payload
        #[arg(long)]
        data: String,
    },
    /// Rewrite a block's payload to demonstrate cascading invalidation
    Tamper {
        /// Node base URL (e.g. http://127.0.0.1:8080)
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
        /// Target block index (genesis is protected)
        #[arg(long)]
        index: usize,
        /// Replacement payload
        #[arg(long)]
        data: String,
    },
}

#[derive(Serialize)]
struct MineRequest<'a> {
    data: &'a str,
}

#[derive(Serialize)]
struct TamperRequest<'a> {
    index: usize,
    data: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Chain { node } => {
            let res = client.get(format!("{node}/chain")).send().await?;
            print_response(res).await?;
        }
        Command::Mine { node, data } => {
            let res = client
                .post(format!("{node}/mine"))
                .json(&MineRequest { data: &data })
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Tamper { node, index, data } => {
            let res = client
                .post(format!("{node}/update_data"))
                .json(&TamperRequest { index, data: &data })
                .send()
                .await?;
            print_response(res).await?;
        }
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}
