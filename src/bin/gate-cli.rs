use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Exercise the load-gate API from the command line", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit local work through admission control
    Work {
        #[arg(long, default_value_t = 50)]
        ms: u64,
        #[arg(long, default_value_t = 0.02)]
        fail_rate: f64,
        #[arg(long)]
        queue_depth: Option<u32>,
        #[arg(long)]
        queue_limit: Option<u32>,
    },
    /// Run the standalone work simulator
    Upstream {
        #[arg(long, default_value_t = 50)]
        ms: u64,
        #[arg(long, default_value_t = 0.0)]
        fail_rate: f64,
    },
    /// Call the upstream simulator through the circuit breaker
    Client {
        #[arg(long, default_value_t = 50)]
        ms: u64,
        #[arg(long, default_value_t = 0.0)]
        fail_rate: f64,
        #[arg(long, default_value_t = 200)]
        timeout_ms: u64,
    },
    /// Check gate liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Work {
            ms,
            fail_rate,
            queue_depth,
            queue_limit,
        } => {
            let mut query: Vec<(&str, String)> = vec![
                ("ms", ms.to_string()),
                ("fail_rate", fail_rate.to_string()),
            ];
            if let Some(depth) = queue_depth {
                query.push(("queue_depth", depth.to_string()));
            }
            if let Some(limit) = queue_limit {
                query.push(("queue_limit", limit.to_string()));
            }
            let res = client
                .post(format!("{}/work", cli.url))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Upstream { ms, fail_rate } => {
            let res = client
                .get(format!("{}/upstream", cli.url))
                .query(&[("ms", ms.to_string()), ("fail_rate", fail_rate.to_string())])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Client {
            ms,
            fail_rate,
            timeout_ms,
        } => {
            let res = client
                .get(format!("{}/client", cli.url))
                .query(&[
                    ("ms", ms.to_string()),
                    ("fail_rate", fail_rate.to_string()),
                    ("timeout_ms", timeout_ms.to_string()),
                ])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/healthz", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
