// splashsync Error Types
//
// 코어 내부에서만 쓰는 에러 타입
// RemoteSession 경계에서 bool / Option 으로 변환되고, UI 쪽으로는 넘어가지 않음
// russh / russh-sftp 에러는 session.rs, sftp.rs 에서 문자열로 바꿔서 담는다

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Refusing to upload an empty payload")]
    EmptyPayload,

    #[error("Path uses the reserved backup suffix: {0}")]
    ReservedPath(String),

    #[error("Connect timed out after {0} ms")]
    Timeout(u64),

    #[error("Auth failed: {0}")]
    Auth(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("SFTP error: {0}")]
    Sftp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport closed")]
    Closed,

    #[error("Verification failed: wrote {expected} bytes, read back {actual} bytes")]
    VerifyFailed { expected: usize, actual: usize },

    #[error("Verification failed: read-back content differs at byte {offset}")]
    ContentMismatch { offset: usize },

    #[error("Rollback failed for {path} (backup left at {backup}): {source}")]
    RollbackFailed {
        path: String,
        backup: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
