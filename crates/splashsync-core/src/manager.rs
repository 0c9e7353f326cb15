// splashsync Session Manager
//
// RemoteSession : 원격 장치와의 논리적 연결 하나
//   connect / disconnect / is_connected
//   download / upload (트랜잭션 교체)
//
// 외부(UI)에는 bool / Option 과 연결 끊김 콜백 하나만 노출
// 실패 이유가 필요한 호출자는 try_* 를 사용
//
// 동시성 규칙
// - Link(transport + 종료 원인 플래그 + 모니터)는 connect() 주기마다 새로 만든다
// - disconnect() 는 핸들을 닫기 전에 원인 플래그를 Caller 로 세팅
// - 모니터는 자기가 지켜본 transport 가 아직 슬롯에 있을 때만 슬롯을 비움
// - 슬롯 잠금은 짧게만 잡고, I/O 중에는 잡지 않음
// - upload/download 끼리의 직렬화는 하지 않음 (필요하면 queue::TransferQueue)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::config::{ConnectConfig, SessionOptions};
use crate::device::DeviceImage;
use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::session::SshConnector;
use crate::state::{Cause, DisconnectionListener, LossNotifier, TeardownCause};
use crate::transfer;
use crate::transport::{Connector, Transport};

pub(crate) struct Link<T> {
    transport: Arc<T>,
    cause: Arc<TeardownCause>,
    monitor: Option<JoinHandle<()>>,
}

pub(crate) struct Shared<T> {
    link: Mutex<Option<Link<T>>>,
    connected: AtomicBool,
}

impl<T: Transport> Shared<T> {
    fn new() -> Self {
        Self { link: Mutex::new(None), connected: AtomicBool::new(false) }
    }

    /// 모니터 전용: 닫힘을 감지한 뒤 원인을 판정
    ///
    /// 판정과 슬롯 정리는 같은 잠금 안에서 일어나므로 disconnect() 와 엇갈리지 않음
    pub(crate) fn settle_closed(&self, transport: &Arc<T>, cause: &TeardownCause) -> Cause {
        let mut slot = self.link.lock();
        let observed = cause.take();
        if observed == Cause::Unknown {
            let current = slot
                .as_ref()
                .is_some_and(|link| Arc::ptr_eq(&link.transport, transport));
            if current {
                *slot = None;
                self.connected.store(false, Ordering::Release);
            }
        }
        observed
    }

    fn take_link(&self) -> Option<Link<T>> {
        let mut slot = self.link.lock();
        let link = slot.take()?;
        link.cause.mark_caller();
        self.connected.store(false, Ordering::Release);
        Some(link)
    }
}

pub struct RemoteSession<C: Connector> {
    connector: C,
    options: SessionOptions,
    listener: Arc<dyn DisconnectionListener>,
    remote: Mutex<Option<ConnectConfig>>,
    shared: Arc<Shared<C::Transport>>,
}

impl RemoteSession<SshConnector> {
    /// 실제 SSH/SFTP 연결을 쓰는 세션
    pub fn ssh(listener: impl DisconnectionListener + 'static) -> Self {
        Self::new(SshConnector::new(), listener)
    }
}

impl<C: Connector> RemoteSession<C> {
    pub fn new(connector: C, listener: impl DisconnectionListener + 'static) -> Self {
        Self {
            connector,
            options: SessionOptions::default(),
            listener: Arc::new(listener),
            remote: Mutex::new(None),
            shared: Arc::new(Shared::new()),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// 마지막으로 연결에 성공한 대상 (host:port)
    pub fn remote_addr(&self) -> Option<String> {
        self.remote.lock().as_ref().map(ConnectConfig::addr)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    // ── 연결 라이프사이클 ─────────────────────────────────────────────────────

    pub async fn try_connect(&self, config: &ConnectConfig) -> Result<()> {
        // 이전 연결이 살아 있으면 호출자 종료로 처리하고 새로 연결
        let stale = self.shared.link.lock().is_some();
        if stale {
            self.disconnect().await;
        }

        let timeout = self.options.connect_timeout;
        let transport = tokio::time::timeout(timeout, self.connector.connect(config))
            .await
            .map_err(|_| Error::Timeout(timeout.as_millis() as u64))??;
        let transport = Arc::new(transport);
        let cause = Arc::new(TeardownCause::new());

        // 슬롯 설치 → connected → 모니터 시작까지 한 잠금 안에서 처리
        // 모니터의 첫 판정은 이 잠금이 풀린 뒤에만 가능
        {
            let mut slot = self.shared.link.lock();
            let monitor = Monitor::new(
                transport.clone(),
                cause.clone(),
                self.shared.clone(),
                LossNotifier::new(self.listener.clone()),
                self.options.poll_interval,
            );
            *slot = Some(Link { transport, cause, monitor: Some(monitor.spawn()) });
            self.shared.connected.store(true, Ordering::Release);
        }

        *self.remote.lock() = Some(config.clone());
        tracing::info!("[manager] connected to {}", config.addr());
        Ok(())
    }

    pub async fn connect(&self, config: &ConnectConfig) -> bool {
        match self.try_connect(config).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[manager] connect to {} failed: {}", config.addr(), e);
                false
            }
        }
    }

    /// 호출자 주도 종료. 연결이 없어도 성공
    pub async fn disconnect(&self) -> bool {
        if let Some(link) = self.shared.take_link() {
            link.transport.close().await;
            tracing::info!("[manager] disconnected");
        }
        true
    }

    // ── 전송 ──────────────────────────────────────────────────────────────────

    fn current(&self) -> Result<Arc<C::Transport>> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.shared.link
            .lock()
            .as_ref()
            .map(|link| link.transport.clone())
            .ok_or(Error::NotConnected)
    }

    pub async fn try_download(&self, path: &str) -> Result<Vec<u8>> {
        let transport = self.current()?;
        transfer::download(transport.as_ref(), path).await
    }

    pub async fn download(&self, path: &str) -> Option<Vec<u8>> {
        match self.try_download(path).await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("[manager] download {} failed: {}", path, e);
                None
            }
        }
    }

    pub async fn try_upload(&self, payload: &[u8], path: &str) -> Result<()> {
        let transport = self.current()?;
        transfer::replace(transport.as_ref(), path, payload, &self.options.backup_suffix).await
    }

    pub async fn upload(&self, payload: &[u8], path: &str) -> bool {
        match self.try_upload(payload, path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[manager] upload {} failed: {}", path, e);
                false
            }
        }
    }

    pub async fn download_image(&self, image: DeviceImage) -> Option<Vec<u8>> {
        self.download(image.path()).await
    }

    pub async fn upload_image(&self, payload: &[u8], image: DeviceImage) -> bool {
        self.upload(payload, image.path()).await
    }
}

impl<C: Connector> Drop for RemoteSession<C> {
    fn drop(&mut self) {
        if let Some(mut link) = self.shared.take_link() {
            if let Some(monitor) = link.monitor.take() {
                monitor.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryConnector, MemoryHost};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn session(host: &MemoryHost) -> (RemoteSession<MemoryConnector>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let session = RemoteSession::new(MemoryConnector::new(host.clone()), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .with_options(SessionOptions::default().with_poll_interval(Duration::from_millis(10)));
        (session, hits)
    }

    fn config() -> ConnectConfig {
        ConnectConfig::new("sim", "root", "pw")
    }

    #[tokio::test]
    async fn reconnect_retires_previous_link_quietly() {
        let host = MemoryHost::new();
        let (session, hits) = session(&host);

        assert!(session.connect(&config()).await);
        assert!(session.connect(&config()).await);
        assert_eq!(host.connect_count(), 2);
        assert_eq!(host.open_links(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.is_connected());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn records_remote_address_on_success() {
        let host = MemoryHost::new();
        let (session, _) = session(&host);
        assert_eq!(session.remote_addr(), None);

        assert!(session.connect(&config()).await);
        assert_eq!(session.remote_addr().as_deref(), Some("sim:22"));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_aborts_its_monitor() {
        let host = MemoryHost::new();
        let (session, hits) = session(&host);
        assert!(session.connect(&config()).await);

        let watched = session.shared.link
            .lock()
            .as_ref()
            .map(|link| Arc::downgrade(&link.transport))
            .unwrap();
        assert!(watched.upgrade().is_some());

        // 연결은 살아 있는 채로 drop: 모니터가 멈추지 않으면 transport 를 계속 붙잡음
        drop(session);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(watched.upgrade().is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
