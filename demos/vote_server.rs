//! UDP voting server driver
//!
//! Run with: cargo run --example vote_server [BIND_ADDR] [OPTIONS]
//!
//! Examples:
//!   cargo run --example vote_server                          # binds to 0.0.0.0:9000
//!   cargo run --example vote_server localhost                # binds to 127.0.0.1:9000
//!   cargo run --example vote_server 0.0.0.0:9100 --delay 2 --duration 30
//!   cargo run --example vote_server --options yes,no,abstain --queue 2
//!
//! ## Voting by hand
//!
//! With netcat:
//!   echo -n '{"type":"REGISTER","client_id":"alice"}' | nc -u -w1 localhost 9000
//!   echo -n '{"type":"VOTE","client_id":"alice","vote":"A"}' | nc -u -w1 localhost 9000
//!
//! Set RUST_LOG=udp_vote=debug to see every vote and fan-out.

use std::net::SocketAddr;
use std::time::Duration;

use udp_vote::protocol::constants::{DEFAULT_OPTIONS, DEFAULT_PORT};
use udp_vote::{ServerConfig, VotingServer};

struct Args {
    bind_addr: SocketAddr,
    delay: Duration,
    duration: Duration,
    options: Vec<String>,
    queue_capacity: Option<usize>,
    padding: usize,
}

/// Parse bind address from command line argument.
///
/// Accepts "localhost", "localhost:9001", "127.0.0.1" or "127.0.0.1:9001".
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn parse_secs(flag: &str, value: Option<String>) -> Result<Duration, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| format!("{} expects whole seconds, got '{}'", flag, value))
}

fn parse_count(flag: &str, value: Option<String>) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    value
        .parse::<usize>()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, value))
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut args = Args {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        delay: Duration::from_secs(5),
        duration: Duration::from_secs(60),
        options: DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect(),
        queue_capacity: None,
        padding: 0,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--delay" => args.delay = parse_secs("--delay", iter.next())?,
            "--duration" => args.duration = parse_secs("--duration", iter.next())?,
            "--queue" => args.queue_capacity = Some(parse_count("--queue", iter.next())?),
            "--padding" => args.padding = parse_count("--padding", iter.next())?,
            "--options" => {
                let list = iter.next().ok_or("--options needs a value")?;
                args.options = list
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect();
                if args.options.is_empty() {
                    return Err("--options needs at least one option".into());
                }
            }
            other => args.bind_addr = parse_bind_addr(other)?,
        }
    }

    Ok(Some(args))
}

fn print_usage() {
    eprintln!("Usage: vote_server [BIND_ADDR] [--delay SECS] [--duration SECS]");
    eprintln!("                   [--options A,B,C] [--queue N] [--padding BYTES]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR         Address to bind to (default: 0.0.0.0:9000)");
    eprintln!("  --delay SECS      Wait before opening the vote (default: 5)");
    eprintln!("  --duration SECS   How long the vote stays open (default: 60)");
    eprintln!("  --options LIST    Comma-separated options (default: A,B,C)");
    eprintln!("  --queue N         Broadcast queue capacity (default: 1000)");
    eprintln!("  --padding BYTES   Inflate every broadcast by BYTES (default: 0)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("udp_vote=info".parse()?)
                .add_directive("vote_server=info".parse()?),
        )
        .init();

    let mut config = ServerConfig::with_addr(args.bind_addr)
        .options(args.options)
        .broadcast_padding(args.padding);
    if let Some(capacity) = args.queue_capacity {
        config = config.broadcast_queue_capacity(capacity);
    }

    let server = VotingServer::bind(config).await?;
    println!("Voting server on {}", server.local_addr()?);
    println!("Options: [{}]", server.config().options.join(", "));
    println!(
        "Voting opens in {}s and lasts {}s",
        args.delay.as_secs(),
        args.duration.as_secs()
    );

    let ledger = server.ledger().clone();
    let (delay, duration) = (args.delay, args.duration);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = ledger.start_voting(duration).await {
            tracing::warn!(error = %e, "Could not start voting");
        }
    });

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    println!("Final status: {}", server.ledger().status().await);
    println!("{:#?}", server.stats());

    Ok(())
}
