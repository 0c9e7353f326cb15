// splashsync SSH Connector (russh 기반)
//
// russh로 SSH 연결/인증을 처리하고
// russh-sftp로 SFTP 세션을 수립해서 SshTransport로 넘겨줍니다.
//
// - 호스트키 검증 없음: 대상 장치는 고정된 호스트키 인프라가 없음
// - 비밀번호 인증만 시도
// - 전체 소요 시간 제한은 RemoteSession이 SessionOptions::connect_timeout으로 감쌈

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh_sftp::client::SftpSession as RusshSftpSession;

use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::sftp::SshTransport;
use crate::transport::Connector;

// keepalive가 없으면 조용히 끊긴 연결을 russh가 알아채지 못함
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);
const KEEPALIVE_MAX: usize = 3;

// russh 클라이언트 핸들러 (서버 이벤트 처리)
pub struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SshConnector;

impl SshConnector {
    pub fn new() -> Self {
        Self
    }

    fn client_config() -> client::Config {
        client::Config {
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            keepalive_max: KEEPALIVE_MAX,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Transport = SshTransport;

    async fn connect(&self, config: &ConnectConfig) -> Result<SshTransport> {
        // ---- TCP 연결 ----
        let addr = config.addr();
        tracing::info!("[session] connecting to {}", addr);

        let mut ssh = client::connect(Arc::new(Self::client_config()), addr.as_str(), ClientHandler)
            .await
            .map_err(|e| Error::Protocol(e.to_string()))?;

        // ---- 인증 ----
        let authed = ssh
            .authenticate_password(&config.username, &config.password)
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;

        if !authed {
            let _ = ssh
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await;
            return Err(Error::Auth("Authentication failed".to_string()));
        }
        tracing::debug!("[session] authenticated as {}", config.username);

        // ---- 채널 + SFTP ----
        let channel = match ssh.channel_open_session().await {
            Ok(channel) => channel,
            Err(e) => {
                let _ = ssh.disconnect(russh::Disconnect::ByApplication, "", "en").await;
                return Err(Error::Protocol(e.to_string()));
            }
        };
        let channel_id = channel.id();

        if let Err(e) = channel.request_subsystem(true, "sftp").await {
            let _ = ssh.disconnect(russh::Disconnect::ByApplication, "", "en").await;
            return Err(Error::Protocol(e.to_string()));
        }

        let sftp = match RusshSftpSession::new(channel.into_stream()).await {
            Ok(sftp) => sftp,
            Err(e) => {
                let _ = ssh.disconnect(russh::Disconnect::ByApplication, "", "en").await;
                return Err(Error::Sftp(e.to_string()));
            }
        };

        tracing::info!("[session] SFTP ready on {}", addr);
        Ok(SshTransport::new(ssh, channel_id, sftp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_enables_keepalive() {
        let config = SshConnector::client_config();
        assert_eq!(config.keepalive_interval, Some(KEEPALIVE_INTERVAL));
        assert_eq!(config.keepalive_max, KEEPALIVE_MAX);
    }

    #[tokio::test]
    async fn refused_port_is_a_protocol_error() {
        // 바인딩 후 바로 닫아서 아무도 듣지 않는 포트 확보
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = ConnectConfig::new("127.0.0.1", "root", "pw");
        config.port = port;

        match SshConnector::new().connect(&config).await {
            Err(Error::Protocol(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }
}
