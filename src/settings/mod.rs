//! 설정 모듈
//!
//! - 프로세스 시작 시 한 번만 결정되는 환경 설정 (`Settings`)
//! - 실행 1회분의 불변 스냅샷 (`RunConfig`)
//!
//! 번들 브라우저 경로: `LINKSCOUT_BROWSERS_PATH` 또는 `<실행파일 폴더>/chrome-bin`

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::ValueEnum;
use serde::Serialize;
use walkdir::WalkDir;

// ============================================================================
// Defaults
// ============================================================================

/// 작업용 엑셀 파일 이름 (실행 파일 옆에 생성)
pub const DEFAULT_WORKBOOK_NAME: &str = "icpe_details.xlsx";

/// 기본 시트 이름
pub const DEFAULT_SHEET_NAME: &str = "Feuille1";

/// 기본 직무명 (B1 헤더)
pub const DEFAULT_JOB_TITLE: &str = "Responsable HSE";

/// 번들 브라우저 폴더 환경변수
pub const BROWSERS_PATH_ENV: &str = "LINKSCOUT_BROWSERS_PATH";

/// 실행 파일 옆 번들 브라우저 폴더 이름
const BUNDLED_BROWSERS_DIR: &str = "chrome-bin";

/// 번들 폴더에서 찾을 브라우저 실행 파일 이름
const BROWSER_BINARY_NAMES: &[&str] = &[
    "chrome",
    "chrome.exe",
    "chromium",
    "chromium-browser",
    "headless_shell",
    "Google Chrome for Testing",
    "Chromium",
];

// ============================================================================
// Startup Settings
// ============================================================================

/// 프로세스 단위 설정 (시작 시 1회 결정, 이후 불변)
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// 실행 파일이 있는 폴더
    pub app_dir: PathBuf,
    /// 번들 브라우저 폴더
    pub browsers_dir: Option<PathBuf>,
    /// 번들 폴더에서 찾은 브라우저 실행 파일
    pub browser_binary: Option<PathBuf>,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

impl Settings {
    /// 환경에서 설정 결정
    pub fn resolve() -> Self {
        let app_dir = app_dir();
        let env_dir = std::env::var_os(BROWSERS_PATH_ENV).map(PathBuf::from);
        let browsers_dir = resolve_browsers_dir(&app_dir, env_dir);
        let browser_binary = browsers_dir.as_deref().and_then(find_browser_binary);

        Self {
            app_dir,
            browsers_dir,
            browser_binary,
        }
    }

    /// 기본 작업 파일 경로
    pub fn default_workbook_path(&self) -> PathBuf {
        self.app_dir.join(DEFAULT_WORKBOOK_NAME)
    }
}

/// 설정 초기화 (최초 1회만 유효)
pub fn init() -> &'static Settings {
    SETTINGS.get_or_init(|| {
        let settings = Settings::resolve();
        tracing::debug!("Settings resolved: {:?}", settings);
        settings
    })
}

/// 현재 설정 (초기화 전이면 즉시 초기화)
pub fn get() -> &'static Settings {
    init()
}

fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 번들 브라우저 폴더 결정 (환경변수 > 실행 파일 옆 폴더)
fn resolve_browsers_dir(app_dir: &Path, env_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = env_dir.filter(|d| d.is_dir()) {
        return Some(dir);
    }

    let bundled = app_dir.join(BUNDLED_BROWSERS_DIR);
    bundled.is_dir().then_some(bundled)
}

/// 폴더 안에서 브라우저 실행 파일 탐색 (깊이 4까지)
pub fn find_browser_binary(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .max_depth(4)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| BROWSER_BINARY_NAMES.contains(&name))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
}

// ============================================================================
// Run Configuration
// ============================================================================

/// 페이지 엔진 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Chrome/Chromium 자동화
    #[default]
    Chrome,
    /// 단순 HTTP 요청 (클릭/입력 불가)
    Http,
}

/// 실행 설정 스냅샷 (실행 중 변경 불가)
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// 엑셀 파일 경로
    pub workbook_path: PathBuf,
    /// 대상 시트 이름
    pub sheet_name: String,
    /// 검색할 직무명 (B1 헤더에도 기록)
    pub job_title: String,
    /// 브라우저 창 숨김
    pub headless: bool,
    /// 빠른 모드 (행 간 대기 및 slow-motion 생략)
    pub fast: bool,
    /// 테스트 모드 (처음 10행만)
    pub test_mode: bool,
    /// 페이지 엔진
    pub engine: Engine,
}

impl RunConfig {
    /// 기본값으로 설정 생성
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            job_title: DEFAULT_JOB_TITLE.to_string(),
            headless: false,
            fast: false,
            test_mode: false,
            engine: Engine::default(),
        }
    }

    /// 시트 이름 지정 (빈 값이면 기본값)
    pub fn with_sheet(mut self, sheet_name: &str) -> Self {
        self.sheet_name = non_blank_or(sheet_name, DEFAULT_SHEET_NAME);
        self
    }

    /// 직무명 지정 (빈 값이면 기본값)
    pub fn with_job_title(mut self, job_title: &str) -> Self {
        self.job_title = non_blank_or(job_title, DEFAULT_JOB_TITLE);
        self
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_config_blank_values_fall_back() {
        let config = RunConfig::new("book.xlsx")
            .with_sheet("   ")
            .with_job_title("");
        assert_eq!(config.sheet_name, DEFAULT_SHEET_NAME);
        assert_eq!(config.job_title, DEFAULT_JOB_TITLE);

        let config = RunConfig::new("book.xlsx").with_job_title("  Directeur QSE ");
        assert_eq!(config.job_title, "Directeur QSE");
    }

    #[test]
    fn test_browsers_dir_prefers_env() {
        let app = TempDir::new().unwrap();
        let custom = TempDir::new().unwrap();
        std::fs::create_dir(app.path().join(BUNDLED_BROWSERS_DIR)).unwrap();

        let dir = resolve_browsers_dir(app.path(), Some(custom.path().to_path_buf()));
        assert_eq!(dir.as_deref(), Some(custom.path()));

        // 존재하지 않는 환경변수 경로는 무시
        let dir = resolve_browsers_dir(app.path(), Some(PathBuf::from("/nonexistent/dir")));
        assert_eq!(dir, Some(app.path().join(BUNDLED_BROWSERS_DIR)));
    }

    #[test]
    fn test_browsers_dir_absent() {
        let app = TempDir::new().unwrap();
        assert!(resolve_browsers_dir(app.path(), None).is_none());
    }

    #[test]
    fn test_find_browser_binary_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("chromium-1097").join("chrome-linux");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("README"), "x").unwrap();
        std::fs::write(nested.join("chrome"), "x").unwrap();

        let found = find_browser_binary(dir.path());
        assert_eq!(found, Some(nested.join("chrome")));
    }
}
