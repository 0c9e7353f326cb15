// splashsync Utils
//
// 공통 유틸 함수 모음
// - backup_path   : 업로드 백업 경로 (<path>.old)
// - is_reserved   : 예약된 백업 접미사로 끝나는 경로인지
// - fmt_size      : 바이트 → 사람이 읽기 좋은 단위 (1.2MB 등)
// - resolve_path  : 리모트 상대경로 → 절대경로
// - file_name     : 경로에서 파일명만 추출

/// 업로드 중 기존 파일이 잠시 머무는 경로
pub fn backup_path(path: &str, suffix: &str) -> String {
    format!("{}{}", path, suffix)
}

pub fn is_reserved(path: &str, suffix: &str) -> bool {
    !suffix.is_empty() && path.ends_with(suffix)
}

/// 바이트 → 사람이 읽기 좋은 단위 문자열
pub fn fmt_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB      { format!("{:.1}GB", bytes as f64 / GB as f64) }
    else if bytes >= MB { format!("{:.1}MB", bytes as f64 / MB as f64) }
    else if bytes >= KB { format!("{:.1}KB", bytes as f64 / KB as f64) }
    else                { format!("{}B",     bytes) }
}

/// 리모트 상대경로 → 절대경로 변환
///
/// - 절대경로 입력 → 그대로 반환
/// - ".." → 부모 디렉토리
/// - "."  → 현재 디렉토리
/// - 나머지 → current/path 조합
pub fn resolve_path(current: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else if path == "." {
        current.to_string()
    } else if path == ".." {
        match current.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => parent.to_string(),
            _ => "/".to_string(),
        }
    } else if current == "/" {
        format!("/{}", path)
    } else {
        format!("{}/{}", current.trim_end_matches('/'), path)
    }
}

/// 경로에서 파일명만 추출 ("/usr/share/remarkable/suspended.png" → "suspended.png")
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
}
