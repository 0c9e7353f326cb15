// splashsync Connection Config
//
// ConnectConfig  : 접속 대상 + 인증 정보 (비밀번호 인증만 사용)
// SessionOptions : 타임아웃, 모니터 폴링 주기, 백업 접미사

use std::fmt;
use std::time::Duration;

/// SSH 기본 포트
pub const DEFAULT_PORT: u16 = 22;

/// 업로드 중 기존 파일을 잠시 옮겨두는 접미사 (예약됨)
pub const BACKUP_SUFFIX: &str = ".old";

#[derive(Clone)]
pub struct ConnectConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ConnectConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// 비밀번호는 로그에 찍히지 않도록 직접 구현
impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// TCP 연결 + 인증 + SFTP 협상까지 허용하는 최대 시간
    pub connect_timeout: Duration,
    /// 헬스 모니터가 transport 생존 여부를 확인하는 주기
    pub poll_interval: Duration,
    pub backup_suffix: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(2000),
            poll_interval: Duration::from_secs(1),
            backup_suffix: BACKUP_SUFFIX.to_string(),
        }
    }
}

impl SessionOptions {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
