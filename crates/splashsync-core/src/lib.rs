// splashsync Core Library (russh 기반)
//
// 원격 장치와의 SFTP 세션 하나를 관리
// - manager  : RemoteSession (connect / disconnect / download / upload)
// - transfer : rename → write → verify → commit/rollback 교체 프로토콜
// - monitor  : 의도치 않은 연결 끊김 감지
// - queue    : 작업 직렬화 워커

pub mod config;
pub mod device;
pub mod error;
pub mod manager;
pub mod memory;
mod monitor;
pub mod queue;
pub mod session;
pub mod sftp;
pub mod state;
pub mod transfer;
pub mod transport;
pub mod utils;

pub use config::{ConnectConfig, SessionOptions};
pub use device::DeviceImage;
pub use error::{Error, Result};
pub use manager::RemoteSession;
pub use queue::TransferQueue;
pub use state::DisconnectionListener;
pub use transport::{Connector, Transport};
