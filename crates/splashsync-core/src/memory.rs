// splashsync In-Memory Host
//
// 네트워크 없이 원격 장치를 흉내내는 Transport 구현
// - 테스트: 롤백/검증/모니터 시나리오를 결정적으로 재현
// - CLI --simulate: 실제 장치 없이 명령 흐름 확인
//
// MemoryHost      : 파일 테이블 + 주입된 장애 + 열린 연결 목록 (clone은 같은 호스트를 공유)
// MemoryConnector : MemoryHost에 접속하는 Connector (비밀번호/지연/거부 설정 가능)
// MemoryTransport : 연결 하나. 닫힌 뒤에는 모든 조작이 Error::Closed
//
// rename은 SFTP v3 서버처럼 대상이 이미 있으면 실패함

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::transport::{Connector, Transport};

/// 다음 한 번의 해당 조작에만 적용되는 장애
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// 쓰기가 아무것도 남기지 않고 실패
    Write,
    /// 앞부분 절반만 쓰고 실패
    PartialWrite,
    /// 성공을 보고하지만 앞의 n 바이트만 저장됨
    Truncate(usize),
    /// 성공을 보고하지만 마지막 바이트가 뒤집혀 저장됨
    Corrupt,
    Read,
    Remove,
    /// 원본 경로가 from 인 다음 rename 실패
    Rename { from: String },
}

#[derive(Default)]
struct HostInner {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    faults: Mutex<Vec<Fault>>,
    links: Mutex<Vec<Arc<AtomicBool>>>,
    ops: AtomicUsize,
    connects: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Arc<HostInner>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.put_file(path, data);
        self
    }

    pub fn put_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.inner.files.lock().insert(path.to_string(), data.into());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.files.lock().get(path).cloned()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.inner.files.lock().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.inner.files.lock().keys().cloned().collect()
    }

    pub fn inject(&self, fault: Fault) {
        self.inner.faults.lock().push(fault);
    }

    /// 아직 소비되지 않은 장애 수
    pub fn pending_faults(&self) -> usize {
        self.inner.faults.lock().len()
    }

    /// 연결을 통해 수행된 파일 조작 수 (닫힌 연결에서의 시도 포함)
    pub fn op_count(&self) -> usize {
        self.inner.ops.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// 장치 쪽에서 연결을 끊은 것처럼 열린 연결을 모두 닫음
    pub fn sever(&self) {
        for link in self.inner.links.lock().drain(..) {
            link.store(true, Ordering::SeqCst);
        }
    }

    pub fn open_links(&self) -> usize {
        self.inner.links
            .lock()
            .iter()
            .filter(|l| !l.load(Ordering::SeqCst))
            .count()
    }

    fn take_fault(&self, matches: impl Fn(&Fault) -> bool) -> Option<Fault> {
        let mut faults = self.inner.faults.lock();
        let idx = faults.iter().position(matches)?;
        Some(faults.remove(idx))
    }

    fn open_link(&self) -> Arc<AtomicBool> {
        let closed = Arc::new(AtomicBool::new(false));
        let mut links = self.inner.links.lock();
        links.retain(|l| !l.load(Ordering::SeqCst));
        links.push(closed.clone());
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        closed
    }
}

pub struct MemoryConnector {
    host: MemoryHost,
    password: Option<String>,
    delay: Option<Duration>,
    unreachable: AtomicBool,
}

impl MemoryConnector {
    /// 어떤 자격 증명이든 받아주는 connector
    pub fn new(host: MemoryHost) -> Self {
        Self { host, password: None, delay: None, unreachable: AtomicBool::new(false) }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// 접속 전에 대기 (connect timeout 재현용)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn host(&self) -> &MemoryHost {
        &self.host
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Transport = MemoryTransport;

    async fn connect(&self, config: &ConnectConfig) -> Result<MemoryTransport> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Protocol(format!("{}: connection refused", config.addr())));
        }
        if let Some(expected) = &self.password {
            if expected != &config.password {
                return Err(Error::Auth("Authentication failed".to_string()));
            }
        }
        let closed = self.host.open_link();
        Ok(MemoryTransport { host: self.host.clone(), closed })
    }
}

pub struct MemoryTransport {
    host: MemoryHost,
    closed: Arc<AtomicBool>,
}

impl MemoryTransport {
    fn begin(&self) -> Result<()> {
        self.host.inner.ops.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

fn no_such_file(path: &str) -> Error {
    Error::Sftp(format!("No such file: {}", path))
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.begin()?;
        if self.host.take_fault(|f| *f == Fault::Read).is_some() {
            return Err(Error::Sftp(format!("read failed: {}", path)));
        }
        self.host.file(path).ok_or_else(|| no_such_file(path))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.begin()?;
        let fault = self.host.take_fault(|f| {
            matches!(f, Fault::Write | Fault::PartialWrite | Fault::Truncate(_) | Fault::Corrupt)
        });

        let mut files = self.host.inner.files.lock();
        match fault {
            Some(Fault::Write) => Err(Error::Sftp(format!("write failed: {}", path))),
            Some(Fault::PartialWrite) => {
                files.insert(path.to_string(), data[..data.len() / 2].to_vec());
                Err(Error::Sftp(format!("connection reset while writing {}", path)))
            }
            Some(Fault::Truncate(n)) => {
                files.insert(path.to_string(), data[..n.min(data.len())].to_vec());
                Ok(())
            }
            Some(Fault::Corrupt) => {
                let mut stored = data.to_vec();
                if let Some(last) = stored.last_mut() {
                    *last ^= 0xFF;
                }
                files.insert(path.to_string(), stored);
                Ok(())
            }
            _ => {
                files.insert(path.to_string(), data.to_vec());
                Ok(())
            }
        }
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.begin()?;
        if self.host
            .take_fault(|f| matches!(f, Fault::Rename { from: p } if p == from))
            .is_some()
        {
            return Err(Error::Sftp(format!("rename failed: {} -> {}", from, to)));
        }

        let mut files = self.host.inner.files.lock();
        if files.contains_key(to) {
            return Err(Error::Sftp(format!("File exists: {}", to)));
        }
        let data = files.remove(from).ok_or_else(|| no_such_file(from))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.begin()?;
        if self.host.take_fault(|f| *f == Fault::Remove).is_some() {
            return Err(Error::Sftp(format!("remove failed: {}", path)));
        }
        self.host.inner.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| no_such_file(path))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectConfig {
        ConnectConfig::new("sim", "root", "pw")
    }

    #[tokio::test]
    async fn rename_refuses_to_overwrite() {
        let host = MemoryHost::new().with_file("/a", b"a".to_vec()).with_file("/b", b"b".to_vec());
        let t = MemoryConnector::new(host.clone()).connect(&config()).await.unwrap();

        assert!(t.rename("/a", "/b").await.is_err());
        assert!(t.rename("/missing", "/c").await.is_err());
        t.rename("/a", "/c").await.unwrap();
        assert_eq!(host.file("/c").unwrap(), b"a");
        assert!(!host.exists("/a"));
    }

    #[tokio::test]
    async fn faults_fire_once() {
        let host = MemoryHost::new();
        let t = MemoryConnector::new(host.clone()).connect(&config()).await.unwrap();

        host.inject(Fault::Truncate(2));
        t.write("/f", b"hello").await.unwrap();
        assert_eq!(host.file("/f").unwrap(), b"he");

        t.write("/f", b"hello").await.unwrap();
        assert_eq!(host.file("/f").unwrap(), b"hello");
        assert_eq!(host.pending_faults(), 0);
    }

    #[tokio::test]
    async fn sever_closes_every_open_link() {
        let host = MemoryHost::new().with_file("/f", b"x".to_vec());
        let connector = MemoryConnector::new(host.clone());
        let t1 = connector.connect(&config()).await.unwrap();
        let t2 = connector.connect(&config()).await.unwrap();
        assert_eq!(host.open_links(), 2);

        host.sever();
        assert!(t1.is_closed() && t2.is_closed());
        assert!(matches!(t1.read("/f").await, Err(Error::Closed)));
        assert_eq!(host.open_links(), 0);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let connector = MemoryConnector::new(MemoryHost::new()).with_password("secret");
        assert!(matches!(connector.connect(&config()).await, Err(Error::Auth(_))));
        assert_eq!(connector.host().connect_count(), 0);
    }
}
