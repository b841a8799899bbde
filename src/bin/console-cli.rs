use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::{json, Value};

use iot_console::config::{dispatch_table, load_or_default};
use iot_console::navigation::{console, ViewId};

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "Inspect console navigation and gateway dispatch", long_about = None)]
struct Cli {
    /// Gateway configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, global = true, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an in-app path to its view stack and parameters
    Resolve {
        path: String,
        /// Report a redirect instead of following it
        #[arg(long)]
        no_follow: bool,
    },
    /// Show which dispatch rule handles a request path
    Dispatch {
        path: String,
        #[arg(short, long, env = "CONSOLE_PROFILE")]
        profile: Option<String>,
    },
    /// Validate the configuration and list its profiles
    Check,
    /// Send a request through a running gateway
    Probe {
        path: String,
        #[arg(short, long, default_value = "http://127.0.0.1:5173")]
        url: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { path, no_follow } => {
            let config = load_or_default(cli.config.as_deref())?;
            let navigator = console::navigator()?.with_max_redirects(config.navigation.max_redirects);
            let resolved = if no_follow {
                navigator.resolve(&path)
            } else {
                navigator.navigate(&path)?
            };
            let resolved = match &config.navigation.fallback_view {
                Some(view) if !resolved.is_redirect() => resolved.or_fallback(&ViewId::new(view.as_str())),
                _ => resolved,
            };
            print_json(&serde_json::to_value(&resolved)?)?;
        }
        Commands::Dispatch { path, profile } => {
            let config = load_or_default(cli.config.as_deref())?;
            let (profile, table) = dispatch_table(&config, profile.as_deref())?;
            let (path_only, query) = match path.split_once('?') {
                Some((p, q)) => (p, Some(q)),
                None => (path.as_str(), None),
            };
            let route = table.lookup(path_only)?;
            let upstream = route.upstream_uri(query)?;
            print_json(&json!({
                "profile": profile,
                "prefix": route.rule.prefix(),
                "origin": route.rule.target().to_string(),
                "host": route.rule.target().authority(),
                "upstream": upstream.to_string(),
            }))?;
        }
        Commands::Check => {
            let config = load_or_default(cli.config.as_deref())?;
            let profiles: Vec<Value> = config
                .proxy
                .profiles
                .iter()
                .map(|(name, rules)| {
                    json!({
                        "name": name,
                        "active": *name == config.proxy.profile,
                        "rules": rules,
                    })
                })
                .collect();
            print_json(&json!({ "valid": true, "profiles": profiles }))?;
        }
        Commands::Probe { path, url, method } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;
            let client = reqwest::Client::builder().no_proxy().build()?;
            let res = client
                .request(method, format!("{}{}", url.trim_end_matches('/'), path))
                .send()
                .await?;
            let status = res.status();
            let request_id = res
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = res.text().await?;
            print_json(&json!({
                "status": status.as_u16(),
                "request_id": request_id,
                "body": body,
            }))?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
