// splashsync Transfer Queue
//
// RemoteSession 하나를 전용 워커 태스크가 소유하고
// 들어온 작업을 제출 순서대로 하나씩 처리 (전송이 겹치지 않음)
// 응답은 작업마다 oneshot 으로 돌려줌
//
// 큐가 닫히면(모든 핸들 drop 또는 shutdown) 워커는 disconnect() 후 종료

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::ConnectConfig;
use crate::manager::RemoteSession;
use crate::transport::Connector;

const QUEUE_DEPTH: usize = 32;

enum Job {
    Connect(ConnectConfig, oneshot::Sender<bool>),
    Disconnect(oneshot::Sender<bool>),
    IsConnected(oneshot::Sender<bool>),
    Download(String, oneshot::Sender<Option<Vec<u8>>>),
    Upload(Vec<u8>, String, oneshot::Sender<bool>),
    Shutdown(oneshot::Sender<()>),
}

pub struct TransferQueue {
    tx: mpsc::Sender<Job>,
    worker: JoinHandle<()>,
}

impl TransferQueue {
    pub fn spawn<C: Connector>(session: RemoteSession<C>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = tokio::spawn(run(session, rx));
        Self { tx, worker }
    }

    async fn submit<R>(&self, job: impl FnOnce(oneshot::Sender<R>) -> Job) -> Option<R> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(job(reply)).await.is_err() {
            tracing::warn!("[queue] worker is gone");
            return None;
        }
        rx.await.ok()
    }

    pub async fn connect(&self, config: ConnectConfig) -> bool {
        self.submit(|r| Job::Connect(config, r)).await.unwrap_or(false)
    }

    pub async fn disconnect(&self) -> bool {
        self.submit(Job::Disconnect).await.unwrap_or(true)
    }

    pub async fn is_connected(&self) -> bool {
        self.submit(Job::IsConnected).await.unwrap_or(false)
    }

    pub async fn download(&self, path: impl Into<String>) -> Option<Vec<u8>> {
        let path = path.into();
        self.submit(|r| Job::Download(path, r)).await.flatten()
    }

    pub async fn upload(&self, payload: Vec<u8>, path: impl Into<String>) -> bool {
        let path = path.into();
        self.submit(|r| Job::Upload(payload, path, r)).await.unwrap_or(false)
    }

    /// 연결을 정리하고 워커가 끝날 때까지 대기
    pub async fn shutdown(self) {
        let _ = self.submit(Job::Shutdown).await;
        if let Err(e) = self.worker.await {
            tracing::warn!("[queue] worker ended abnormally: {}", e);
        }
    }
}

async fn run<C: Connector>(session: RemoteSession<C>, mut rx: mpsc::Receiver<Job>) {
    tracing::debug!("[queue] worker started");

    while let Some(job) = rx.recv().await {
        // 호출자가 응답을 기다리지 않고 떠났으면 send 실패는 무시
        match job {
            Job::Connect(config, reply) => {
                let _ = reply.send(session.connect(&config).await);
            }
            Job::Disconnect(reply) => {
                let _ = reply.send(session.disconnect().await);
            }
            Job::IsConnected(reply) => {
                let _ = reply.send(session.is_connected());
            }
            Job::Download(path, reply) => {
                let _ = reply.send(session.download(&path).await);
            }
            Job::Upload(payload, path, reply) => {
                let _ = reply.send(session.upload(&payload, &path).await);
            }
            Job::Shutdown(reply) => {
                session.disconnect().await;
                let _ = reply.send(());
                tracing::debug!("[queue] worker stopped");
                return;
            }
        }
    }

    session.disconnect().await;
    tracing::debug!("[queue] worker stopped (all handles dropped)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryConnector, MemoryHost};

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let host = MemoryHost::new().with_file("/img.png", b"old".to_vec());
        let queue = TransferQueue::spawn(RemoteSession::new(MemoryConnector::new(host.clone()), || {}));

        assert!(!queue.is_connected().await);
        assert!(queue.connect(ConnectConfig::new("sim", "root", "pw")).await);
        assert!(queue.is_connected().await);

        assert!(queue.upload(b"new".to_vec(), "/img.png").await);
        assert_eq!(queue.download("/img.png").await.unwrap(), b"new");

        queue.shutdown().await;
        assert_eq!(host.open_links(), 0);
    }

    #[tokio::test]
    async fn dropping_the_queue_disconnects() {
        let host = MemoryHost::new();
        let queue = TransferQueue::spawn(RemoteSession::new(MemoryConnector::new(host.clone()), || {}));
        assert!(queue.connect(ConnectConfig::new("sim", "root", "pw")).await);
        assert_eq!(host.open_links(), 1);

        drop(queue);
        for _ in 0..50 {
            if host.open_links() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(host.open_links(), 0);
    }
}
