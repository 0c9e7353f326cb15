// splashsync Transport Seam
//
// 원격 파일 전송에 필요한 최소 primitive만 노출
//   read / write / rename / remove : SFTP 파일 조작
//   is_closed                      : 헬스 모니터가 폴링하는 생존 여부
//   close                          : sftp → channel → session 순서로 정리
//
// 실제 구현: sftp::SshTransport (russh + russh-sftp)
// 테스트/시뮬레이션: memory::MemoryTransport

use async_trait::async_trait;

use crate::config::ConnectConfig;
use crate::error::Result;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// 원격 파일 전체를 메모리로 읽음
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// 원격 파일을 생성(또는 덮어쓰기)하고 data 전체를 씀
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;

    /// I/O 없이 연결 종료 여부만 확인
    fn is_closed(&self) -> bool;

    /// 이미 닫힌 핸들은 무시
    async fn close(&self);
}

/// 인증된 Transport 하나를 여는 역할
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    async fn connect(&self, config: &ConnectConfig) -> Result<Self::Transport>;
}
