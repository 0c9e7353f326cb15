// splashsync CLI
//
// Usage: splashsync [--simulate] [--poll-ms N] user@host

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use splashsync_core::device::PNG_SIGNATURE;
use splashsync_core::memory::{MemoryConnector, MemoryHost};
use splashsync_core::{ConnectConfig, DeviceImage, RemoteSession, SessionOptions, TransferQueue};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod handler;

#[derive(Debug, Parser)]
#[command(name = "splashsync", version, about = "Pull and push device splash images over SFTP")]
struct Args {
    /// Device to connect to, as user@host
    #[arg(env = "SPLASHSYNC_TARGET")]
    target: String,

    /// SSH password (prompted when omitted)
    #[arg(long, env = "SPLASHSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Health monitor poll interval in milliseconds
    #[arg(long, env = "SPLASHSYNC_POLL_MS", default_value_t = 1000)]
    poll_ms: u64,

    /// Use an in-memory device instead of a real SSH connection
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug splashsync root@10.11.99.1
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let args = Args::parse();

    // user@host 파싱
    let Some((username, host)) = args.target.split_once('@') else {
        bail!("Format: splashsync user@host");
    };

    let password = match args.password {
        Some(pw) => pw,
        None => read_password(username, host)?,
    };

    let config = ConnectConfig::new(host, username, password);
    let options = SessionOptions::default()
        .with_poll_interval(Duration::from_millis(args.poll_ms.max(1)));

    let on_lost = || {
        println!();
        println!("[!] Connection to the device was lost. Type 'connect' to reconnect.");
    };

    let queue = if args.simulate {
        let session = RemoteSession::new(MemoryConnector::new(simulated_device()), on_lost)
            .with_options(options);
        TransferQueue::spawn(session)
    } else {
        TransferQueue::spawn(RemoteSession::ssh(on_lost).with_options(options))
    };

    handler::run(queue, config).await
}

fn read_password(username: &str, host: &str) -> anyhow::Result<String> {
    eprint!("{}@{}'s password: ", username, host);
    std::io::stderr().flush()?;
    let mut password = String::new();
    std::io::stdin()
        .read_line(&mut password)
        .context("cannot read password")?;
    Ok(password.trim().to_string())
}

/// 장치 이미지마다 PNG 시그니처 + 이름으로 채운 가짜 장치
fn simulated_device() -> MemoryHost {
    let host = MemoryHost::new();
    for img in DeviceImage::ALL {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(img.file_name().as_bytes());
        host.put_file(img.path(), data);
    }
    host
}
