// splashsync Transactional Transfer
//
// 원격 장치에는 원자적 교체(atomic replace) 기능이 없으므로
// rename 기반 2단계 교체 + 전체 재다운로드 검증으로 안전성을 만든다.
//
//   1. path → path.old           (실패 시 즉시 종료, 아무것도 바뀌지 않음)
//   2. payload 를 path 에 쓰기
//   3. path 를 전부 다시 읽기
//   4. 길이 + 바이트 단위 비교
//   5. 성공: path.old 삭제
//   6. 2~5 중 하나라도 실패: path 삭제 → path.old 를 path 로 되돌림
//
// 되돌리기 rename 이 실패하면 한 번 더 시도하고, 그래도 실패하면
// Error::RollbackFailed 로 올려보냄 (원격에 path / path.old 가 남을 수 있음)

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::utils::{backup_path, is_reserved};

/// 원격 파일 전체를 한 번에 받음 (재시도 없음)
pub async fn download<T>(transport: &T, path: &str) -> Result<Vec<u8>>
where
    T: Transport + ?Sized,
{
    let data = transport.read(path).await?;
    tracing::debug!("[transfer] downloaded {} ({} bytes)", path, data.len());
    Ok(data)
}

/// path 의 내용을 payload 로 안전하게 교체
///
/// Ok 이면 path 는 payload 와 바이트 단위로 같고 백업은 남지 않음.
/// Err 이면 (RollbackFailed 를 제외하고) path 는 호출 전 상태 그대로.
pub async fn replace<T>(transport: &T, path: &str, payload: &[u8], suffix: &str) -> Result<()>
where
    T: Transport + ?Sized,
{
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }
    if is_reserved(path, suffix) {
        return Err(Error::ReservedPath(path.to_string()));
    }

    let backup = backup_path(path, suffix);

    // ---- 1. 기존 파일을 백업 위치로 ----
    transport.rename(path, &backup).await?;

    // ---- 2~5. 쓰기 / 재읽기 / 검증 / 백업 삭제 ----
    match commit(transport, path, &backup, payload).await {
        Ok(()) => {
            tracing::info!("[transfer] replaced {} ({} bytes)", path, payload.len());
            Ok(())
        }
        Err(e) => {
            tracing::warn!("[transfer] {} failed, rolling back: {}", path, e);
            rollback(transport, path, &backup).await?;
            Err(e)
        }
    }
}

async fn commit<T>(transport: &T, path: &str, backup: &str, payload: &[u8]) -> Result<()>
where
    T: Transport + ?Sized,
{
    transport.write(path, payload).await?;
    let written = transport.read(path).await?;
    verify(payload, &written)?;
    transport.remove(backup).await?;
    Ok(())
}

/// 쓴 내용과 다시 읽은 내용이 길이까지 완전히 같은지
pub fn verify(expected: &[u8], actual: &[u8]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(Error::VerifyFailed { expected: expected.len(), actual: actual.len() });
    }
    if let Some(offset) = expected.iter().zip(actual).position(|(a, b)| a != b) {
        return Err(Error::ContentMismatch { offset });
    }
    Ok(())
}

async fn rollback<T>(transport: &T, path: &str, backup: &str) -> Result<()>
where
    T: Transport + ?Sized,
{
    // 쓰기 단계에서 실패했다면 새 파일이 없을 수 있으므로 실패해도 계속 진행
    if let Err(e) = transport.remove(path).await {
        tracing::debug!("[transfer] remove {} during rollback: {}", path, e);
    }

    if let Err(first) = transport.rename(backup, path).await {
        tracing::warn!("[transfer] restore {} -> {} failed, retrying: {}", backup, path, first);
        if let Err(second) = transport.rename(backup, path).await {
            tracing::error!(
                "[transfer] rollback failed, remote left inconsistent (new: {}, backup: {}): {}",
                path, backup, second
            );
            return Err(Error::RollbackFailed {
                path: path.to_string(),
                backup: backup.to_string(),
                source: Box::new(second),
            });
        }
    }
    tracing::info!("[transfer] restored {} from {}", path, backup);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectConfig;
    use crate::memory::{Fault, MemoryConnector, MemoryHost, MemoryTransport};
    use crate::transport::Connector;

    const DEST: &str = "/usr/share/remarkable/suspended.png";
    const BACKUP: &str = "/usr/share/remarkable/suspended.png.old";
    const ORIGINAL: &[u8] = b"\x89PNG original";

    async fn setup() -> (MemoryHost, MemoryTransport) {
        let host = MemoryHost::new().with_file(DEST, ORIGINAL.to_vec());
        let transport = MemoryConnector::new(host.clone())
            .connect(&ConnectConfig::new("sim", "root", "pw"))
            .await
            .unwrap();
        (host, transport)
    }

    fn assert_untouched(host: &MemoryHost) {
        assert_eq!(host.file(DEST).unwrap(), ORIGINAL);
        assert!(!host.exists(BACKUP));
    }

    #[tokio::test]
    async fn replace_commits_and_drops_backup() {
        let (host, t) = setup().await;
        replace(&t, DEST, b"\x89PNG new image", ".old").await.unwrap();
        assert_eq!(host.file(DEST).unwrap(), b"\x89PNG new image");
        assert!(!host.exists(BACKUP));
    }

    #[tokio::test]
    async fn missing_destination_fails_without_side_effects() {
        let (host, t) = setup().await;
        let before = host.paths();
        assert!(replace(&t, "/nope.png", b"data", ".old").await.is_err());
        assert_eq!(host.paths(), before);
    }

    #[tokio::test]
    async fn write_error_rolls_back() {
        let (host, t) = setup().await;
        host.inject(Fault::Write);
        assert!(matches!(replace(&t, DEST, b"new", ".old").await, Err(Error::Sftp(_))));
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn interrupted_write_rolls_back() {
        let (host, t) = setup().await;
        host.inject(Fault::PartialWrite);
        assert!(replace(&t, DEST, b"new image bytes", ".old").await.is_err());
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn silent_truncation_is_caught_by_verification() {
        let (host, t) = setup().await;
        host.inject(Fault::Truncate(3));
        let err = replace(&t, DEST, b"new image bytes", ".old").await.unwrap_err();
        assert!(matches!(err, Error::VerifyFailed { expected: 15, actual: 3 }));
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn flipped_byte_is_caught_by_verification() {
        let (host, t) = setup().await;
        host.inject(Fault::Corrupt);
        let err = replace(&t, DEST, b"new image bytes", ".old").await.unwrap_err();
        assert!(matches!(err, Error::ContentMismatch { offset: 14 }));
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn read_back_error_rolls_back() {
        let (host, t) = setup().await;
        host.inject(Fault::Read);
        assert!(replace(&t, DEST, b"new", ".old").await.is_err());
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn backup_removal_error_rolls_back() {
        let (host, t) = setup().await;
        host.inject(Fault::Remove);
        assert!(replace(&t, DEST, b"new", ".old").await.is_err());
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn restore_is_retried_once() {
        let (host, t) = setup().await;
        host.inject(Fault::Write);
        host.inject(Fault::Rename { from: BACKUP.to_string() });
        assert!(matches!(replace(&t, DEST, b"new", ".old").await, Err(Error::Sftp(_))));
        assert_untouched(&host);
    }

    #[tokio::test]
    async fn failed_restore_surfaces_as_rollback_failure() {
        let (host, t) = setup().await;
        host.inject(Fault::Corrupt);
        host.inject(Fault::Rename { from: BACKUP.to_string() });
        host.inject(Fault::Rename { from: BACKUP.to_string() });

        let err = replace(&t, DEST, b"new", ".old").await.unwrap_err();
        match err {
            Error::RollbackFailed { path, backup, .. } => {
                assert_eq!(path, DEST);
                assert_eq!(backup, BACKUP);
            }
            other => panic!("unexpected error: {other}"),
        }
        // 원본은 백업 위치에 살아 있음
        assert_eq!(host.file(BACKUP).unwrap(), ORIGINAL);
        assert!(!host.exists(DEST));
    }

    #[tokio::test]
    async fn guards_run_before_any_transport_call() {
        let (host, t) = setup().await;
        let ops = host.op_count();
        assert!(matches!(replace(&t, DEST, b"", ".old").await, Err(Error::EmptyPayload)));
        assert!(matches!(replace(&t, BACKUP, b"x", ".old").await, Err(Error::ReservedPath(_))));
        assert_eq!(host.op_count(), ops);
    }

    #[test]
    fn verify_checks_length_and_content() {
        assert!(verify(b"abc", b"abc").is_ok());
        assert!(verify(b"abc", b"ab").is_err());
        assert!(matches!(verify(b"abc", b"abd"), Err(Error::ContentMismatch { offset: 2 })));
    }

    #[test]
    fn content_mismatch_names_the_offset() {
        let err = verify(b"same length", b"same lEngth").unwrap_err();
        assert!(matches!(err, Error::ContentMismatch { offset: 6 }));
        assert_eq!(err.to_string(), "Verification failed: read-back content differs at byte 6");
    }
}
