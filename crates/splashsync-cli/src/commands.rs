// splashsync CLI Commands
//
// 순수 파싱만 담당 (IO 없음, 테스트 용이)

use splashsync_core::utils::{file_name, resolve_path};
use splashsync_core::DeviceImage;

/// 원격 대상: 장치 이미지 이름 또는 임의 경로
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Image(DeviceImage),
    Path(String),
}

impl Target {
    /// "suspended" / "suspended.png" → 장치 이미지, 그 외 → 경로
    pub fn parse(arg: &str) -> Self {
        if !arg.contains('/') {
            if let Some(img) = DeviceImage::from_file_name(arg) {
                return Target::Image(img);
            }
        }
        Target::Path(arg.to_string())
    }

    /// 상대경로는 remote_dir 기준으로 절대경로화
    pub fn resolve(&self, remote_dir: &str) -> String {
        match self {
            Target::Image(img) => img.path().to_string(),
            Target::Path(p)    => resolve_path(remote_dir, p),
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            Target::Image(img) => img.file_name().to_string(),
            Target::Path(p)    => file_name(p).to_string(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Connect,
    Disconnect,
    Status,
    Images,
    Pull { remote: Target, local: String },
    Push { local: String, remote: Target },
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            return Command::Unknown(String::new());
        }

        match parts[0] {
            "connect"    => Command::Connect,
            "disconnect" => Command::Disconnect,
            "status"     => Command::Status,
            "images"     => Command::Images,
            "pull" | "get" => {
                if parts.len() < 2 {
                    return Command::Unknown("Usage: pull <image|remote> [local]".to_string());
                }
                let remote = Target::parse(parts[1]);
                let local = parts.get(2)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| remote.file_name());
                Command::Pull { remote, local }
            }
            "push" | "put" => {
                if parts.len() < 2 {
                    return Command::Unknown("Usage: push <local> [image|remote]".to_string());
                }
                let local = parts[1].to_string();
                let remote = parts.get(2)
                    .map(|s| Target::parse(s))
                    .unwrap_or_else(|| Target::parse(file_name(&local)));
                Command::Push { local, remote }
            }
            "help" | "?"    => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(format!("Unknown command: {}", other)),
        }
    }
}
