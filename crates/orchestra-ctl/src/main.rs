//! orchestra-ctl — command-line client for the auditor's snapshot port.

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 2205;

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveMusician {
    identity: String,
    #[serde(default)]
    attribute: Option<String>,
    first_seen_at: String,
}

// ── Query helpers ─────────────────────────────────────────────────────────────

async fn fetch_snapshot(host: &str, port: u16) -> Result<Vec<u8>> {
    let addr = format!("{host}:{port}");
    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to auditord at {addr} — is it running?"))?;

    // One connection = one response; the auditor closes after writing.
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .context("failed to read snapshot response")?;
    Ok(response)
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn cmd_active(host: &str, port: u16) -> Result<()> {
    let raw = fetch_snapshot(host, port).await?;
    let musicians: Vec<ActiveMusician> =
        serde_json::from_slice(&raw).context("failed to parse snapshot response")?;

    println!("═══════════════════════════════════════");
    println!("  Active Musicians ({})", musicians.len());
    println!("═══════════════════════════════════════");

    if musicians.is_empty() {
        println!("  The orchestra is silent.");
        return Ok(());
    }

    for m in &musicians {
        println!("  ┌─ {}", m.identity);
        println!("  │  instrument : {}", m.attribute.as_deref().unwrap_or("(unknown)"));
        println!("  └─ first seen : {}", m.first_seen_at);
    }

    Ok(())
}

async fn cmd_raw(host: &str, port: u16) -> Result<()> {
    let raw = fetch_snapshot(host, port).await?;
    print!("{}", String::from_utf8_lossy(&raw));
    Ok(())
}

fn print_usage() {
    println!("Usage: orchestra-ctl [--host <addr>] [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  active        List currently active musicians (default)");
    println!("  raw           Dump the raw snapshot JSON");
    println!();
    println!("Options:");
    println!("  --host <addr>   Auditor address (default: {})", DEFAULT_HOST);
    println!("  --port <port>   Snapshot port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --host/--port options
    let mut host = DEFAULT_HOST.to_string();
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--host" {
            i += 1;
            host = args.get(i).context("--host requires a value")?.clone();
        } else if args[i] == "--port" {
            i += 1;
            port = args.get(i)
            .context("--port requires a value")?
            .parse()
            .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["active"] | []                => cmd_active(&host, port).await,
        ["raw"]                        => cmd_raw(&host, port).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
