// splashsync Health Monitor
//
// connect() 직후 시작되어 transport 가 닫힐 때까지 주기적으로 생존 여부를 폴링
// transport 가 생존 질의만 제공하므로 이벤트 대신 폴링 사용
//
// 상태 흐름: Watching → Stopped (재시작 없음, 새 connect() 마다 새 모니터)
//
// 닫힘 감지 후:
//   원인 Caller  → 플래그만 기본값으로 되돌리고 조용히 종료
//   원인 Unknown → 세션 핸들 정리, connected = false, 소유자에게 한 번 알림

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::manager::Shared;
use crate::state::{Cause, LossNotifier, MonitorState, TeardownCause};
use crate::transport::Transport;

pub(crate) struct Monitor<T: Transport> {
    transport: Arc<T>,
    cause: Arc<TeardownCause>,
    shared: Arc<Shared<T>>,
    notifier: LossNotifier,
    interval: Duration,
    state: MonitorState,
}

impl<T: Transport> Monitor<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        cause: Arc<TeardownCause>,
        shared: Arc<Shared<T>>,
        notifier: LossNotifier,
        interval: Duration,
    ) -> Self {
        Self { transport, cause, shared, notifier, interval, state: MonitorState::Watching }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::debug!("[monitor] watching (every {:?})", self.interval);

        while !self.transport.is_closed() {
            tokio::time::sleep(self.interval).await;
        }

        let cause = self.shared.settle_closed(&self.transport, &self.cause);
        self.stop();

        match cause {
            Cause::Caller => {
                tracing::debug!("[monitor] closed by caller");
            }
            Cause::Unknown => {
                tracing::warn!("[monitor] connection lost");
                self.notifier.notify();
            }
        }
    }

    fn stop(&mut self) {
        debug_assert!(self.state.can_transition_to(&MonitorState::Stopped));
        self.state = MonitorState::Stopped;
    }
}
