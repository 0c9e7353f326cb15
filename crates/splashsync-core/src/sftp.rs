// splashsync SFTP Transport (russh-sftp 기반)
//
// SshTransport : 한 연결이 소유하는 세 핸들을 함께 보관
//   ssh     - 네트워크 세션 (russh client::Handle)
//   channel - sftp 서브시스템이 올라간 세션 채널
//   sftp    - 파일 전송 채널 (russh-sftp)
// 세 핸들은 같이 열리고 같이 닫힘 (sftp → channel → session 순서)

use async_trait::async_trait;
use russh::client;
use russh::ChannelId;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::session::ClientHandler;
use crate::transport::Transport;

pub struct SshTransport {
    ssh: client::Handle<ClientHandler>,
    channel: ChannelId,
    sftp: SftpSession,
}

impl SshTransport {
    pub(crate) fn new(ssh: client::Handle<ClientHandler>, channel: ChannelId, sftp: SftpSession) -> Self {
        Self { ssh, channel, sftp }
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.sftp.read(path)
            .await
            .map_err(|e| Error::Sftp(e.to_string()))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut remote_file = self.sftp
            .open_with_flags(path, OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE)
            .await
            .map_err(|e| Error::Sftp(e.to_string()))?;

        remote_file.write_all(data).await?;
        // shutdown에서 핸들이 닫히고 서버 쪽 쓰기가 확정됨
        remote_file.shutdown().await?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.sftp.rename(from, to)
            .await
            .map_err(|e| Error::Sftp(e.to_string()))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.sftp.remove_file(path)
            .await
            .map_err(|e| Error::Sftp(e.to_string()))
    }

    fn is_closed(&self) -> bool {
        self.ssh.is_closed()
    }

    async fn close(&self) {
        if self.ssh.is_closed() {
            return;
        }
        // sftp 채널을 닫으면 그 아래 세션 채널 스트림도 함께 정리됨
        if let Err(e) = self.sftp.close().await {
            tracing::debug!("[sftp] close: {}", e);
        }
        tracing::debug!("[sftp] channel {:?} released", self.channel);
        if let Err(e) = self.ssh
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!("[sftp] disconnect: {}", e);
        }
    }
}
