// splashsync CLI Handler
//
// core 호출 + interactive shell
// 모든 원격 작업은 TransferQueue 를 거치므로 전송이 겹치지 않음

use std::io::{self, Write};

use anyhow::Context;
use splashsync_core::device::{is_png, IMAGE_DIR};
use splashsync_core::utils::fmt_size;
use splashsync_core::{ConnectConfig, DeviceImage, TransferQueue};

use crate::commands::{Command, Target};

pub async fn run(queue: TransferQueue, config: ConnectConfig) -> anyhow::Result<()> {
    println!("Connecting to {}...", config.addr());
    if queue.connect(config.clone()).await {
        println!("Connected. Type 'help' for commands.");
    } else {
        println!("Connection failed. Type 'connect' to retry.");
    }

    let remote_dir = IMAGE_DIR.to_string();

    loop {
        print!("splash> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            println!();
            break;
        }

        match Command::parse(&input) {
            // ── 연결 ─────────────────────────────────────────────
            Command::Connect => {
                println!("Connecting to {}...", config.addr());
                if queue.connect(config.clone()).await {
                    println!("Connected.");
                } else {
                    println!("Connection failed.");
                }
            }
            Command::Disconnect => {
                queue.disconnect().await;
                println!("Disconnected.");
            }
            Command::Status => {
                if queue.is_connected().await {
                    println!("Connected to {}", config.addr());
                } else {
                    println!("Not connected");
                }
            }

            // ── 전송 ─────────────────────────────────────────────
            Command::Images => {
                if !queue.is_connected().await {
                    println!("Not connected");
                    continue;
                }
                for img in DeviceImage::ALL {
                    let size = queue.download(img.path()).await
                        .map(|d| fmt_size(d.len() as u64))
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:>10}  {}", size, img.path());
                }
            }
            Command::Pull { remote, local } => {
                let remote_path = remote.resolve(&remote_dir);
                match queue.download(remote_path.as_str()).await {
                    Some(data) => match save_local(&local, &data).await {
                        Ok(()) => println!("Downloaded: {} → {} ({})", remote_path, local, fmt_size(data.len() as u64)),
                        Err(e) => println!("Error: {:#}", e),
                    },
                    None => println!("Download failed: {}", remote_path),
                }
            }
            Command::Push { local, remote } => {
                let remote_path = remote.resolve(&remote_dir);
                let data = match load_local(&local).await
                    .and_then(|data| check_image(&remote, &local, data))
                {
                    Ok(data) => data,
                    Err(e) => {
                        println!("Error: {:#}", e);
                        continue;
                    }
                };
                let size = data.len() as u64;
                if queue.upload(data, remote_path.as_str()).await {
                    println!("Uploaded: {} → {} ({})", local, remote_path, fmt_size(size));
                } else {
                    println!("Upload failed, remote file left unchanged: {}", remote_path);
                }
            }

            // ── 기타 ─────────────────────────────────────────────
            Command::Help => print_help(),
            Command::Quit => {
                println!("Goodbye.");
                break;
            }
            Command::Unknown(msg) => {
                if !msg.is_empty() { println!("{}", msg); }
            }
        }
    }

    queue.shutdown().await;
    Ok(())
}

async fn save_local(path: &str, data: &[u8]) -> anyhow::Result<()> {
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("cannot write {}", path))
}

async fn load_local(path: &str) -> anyhow::Result<Vec<u8>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path))?;
    anyhow::ensure!(!data.is_empty(), "{} is empty", path);
    Ok(data)
}

/// 장치 이미지 자리에는 PNG 만 올림 (그 외 경로는 그대로 통과)
fn check_image(remote: &Target, local: &str, data: Vec<u8>) -> anyhow::Result<Vec<u8>> {
    if let Target::Image(img) = remote {
        anyhow::ensure!(is_png(&data), "{} is not a PNG image, refusing to replace {}", local, img);
    }
    Ok(data)
}

fn print_help() {
    println!("Connection:");
    println!("  connect                      Connect with the given credentials");
    println!("  disconnect                   Close the connection");
    println!("  status                       Show connection state");
    println!();
    println!("Images ({}):", IMAGE_DIR);
    println!("  images                       List device images and sizes");
    println!("  pull <image|remote> [local]  Download to a local file");
    println!("  push <local> [image|remote]  Replace a remote file (verified, rolled back on failure)");
    println!();
    println!("  help                         Show this help");
    println!("  quit                         Exit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use splashsync_core::device::PNG_SIGNATURE;

    #[test]
    fn device_images_only_accept_png() {
        let text = b"meeting notes".to_vec();
        let err = check_image(&Target::Image(DeviceImage::Suspended), "notes.txt", text).unwrap_err();
        assert_eq!(err.to_string(), "notes.txt is not a PNG image, refusing to replace suspended.png");

        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"pixels");
        let data = check_image(&Target::Image(DeviceImage::Suspended), "art.png", png.clone()).unwrap();
        assert_eq!(data, png);
    }

    #[test]
    fn other_paths_accept_any_bytes() {
        let target = Target::Path("/home/root/notes.txt".to_string());
        assert!(check_image(&target, "notes.txt", b"meeting notes".to_vec()).is_ok());
    }
}
