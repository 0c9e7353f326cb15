// splashsync Teardown State + Disconnection Observer
//
// TeardownCause : 마지막 종료를 누가 일으켰는지 기록하는 원자적 플래그
//                 disconnect()가 핸들을 닫기 전에 Caller로 세팅
//                 모니터는 종료를 감지한 뒤 take()로 읽고 기본값(Unknown)으로 되돌림
// MonitorState  : Watching → Stopped (종단)
// LossNotifier  : 연결 주기마다 한 번만 쏠 수 있는 알림 (notify가 self를 소비)

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cause {
    /// 아무도 disconnect()를 부르지 않음
    Unknown = 0,
    /// 호출자가 disconnect()로 직접 종료
    Caller = 1,
}

impl Cause {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Cause::Caller,
            _ => Cause::Unknown,
        }
    }
}

/// 연결 주기 하나에 묶인 종료 원인 플래그
///
/// Release/Acquire 쌍으로 disconnect()의 세팅이 모니터 쪽 읽기보다 먼저 보이도록 보장
#[derive(Default)]
pub struct TeardownCause(AtomicU8);

impl TeardownCause {
    pub fn new() -> Self {
        Self(AtomicU8::new(Cause::Unknown as u8))
    }

    pub fn mark_caller(&self) {
        self.0.store(Cause::Caller as u8, Ordering::Release);
    }

    pub fn get(&self) -> Cause {
        Cause::from_u8(self.0.load(Ordering::Acquire))
    }

    /// 현재 값을 읽고 기본값으로 되돌림
    pub fn take(&self) -> Cause {
        Cause::from_u8(self.0.swap(Cause::Unknown as u8, Ordering::AcqRel))
    }
}

impl fmt::Debug for TeardownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TeardownCause").field(&self.get()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Watching,
    Stopped,
}

impl MonitorState {
    pub fn can_transition_to(&self, next: &MonitorState) -> bool {
        matches!((self, next), (MonitorState::Watching, MonitorState::Stopped))
    }
}

/// 의도치 않은 연결 끊김 알림 trait
///
/// CLI: 안내 문구 출력
/// GUI: 화면을 미연결 상태로 되돌리기
/// 호출자가 disconnect()로 끊은 경우에는 절대 호출되지 않음
pub trait DisconnectionListener: Send + Sync {
    fn on_unsolicited_disconnect(&self);
}

impl<F> DisconnectionListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_unsolicited_disconnect(&self) {
        self()
    }
}

/// 한 번만 발사되는 알림
///
/// 모니터 하나가 notifier 하나를 소유하고, notify()가 self를 소비하므로
/// 같은 연결 주기에서 두 번 알릴 방법이 없음
pub struct LossNotifier {
    listener: Arc<dyn DisconnectionListener>,
}

impl LossNotifier {
    pub fn new(listener: Arc<dyn DisconnectionListener>) -> Self {
        Self { listener }
    }

    pub fn notify(self) {
        self.listener.on_unsolicited_disconnect();
    }
}
