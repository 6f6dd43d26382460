//! 브라우저 모듈 - 페이지 조작 인터페이스
//!
//! 배치 실행기는 `Page` 트레이트만 사용합니다.
//! - `ChromePage`: headless_chrome 기반 (feature `browser`)
//! - `HttpPage`: reqwest 기반 단순 HTTP (클릭/입력 불가)
//!
//! 요소 조회/텍스트 추출은 `content()`로 받은 HTML 스냅샷 위에서 수행합니다.

#[cfg(feature = "browser")]
mod chrome;
mod consent;
mod http;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::settings::{Engine, RunConfig, Settings};

#[cfg(feature = "browser")]
pub use chrome::ChromePage;
pub use consent::{dismiss_consent, CONSENT_BUTTON_LABELS, CONSENT_CSS_SELECTORS};
pub use http::HttpPage;

// ============================================================================
// Constants
// ============================================================================

/// 데스크톱 Chrome User-Agent
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 뷰포트 크기 (가로, 세로)
pub const VIEWPORT: (u32, u32) = (1400, 900);

/// 자동화 흔적을 줄이는 실행 플래그
pub const STEALTH_FLAGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-features=IsolateOrigins,site-per-process",
];

/// 페이지 이동 제한 시간
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// 화면 표시 + 일반 모드에서의 동작 간 지연
const SLOW_MO: Duration = Duration::from_millis(250);

// ============================================================================
// Errors
// ============================================================================

/// 페이지 조작 에러
#[derive(Debug, Error)]
pub enum PageError {
    #[error("페이지 이동 실패 ({url}): {message}")]
    Navigation { url: String, message: String },

    #[error("대기 시간 초과: {0}")]
    Timeout(String),

    #[error("요소를 찾을 수 없음: {0}")]
    NotFound(String),

    #[error("지원하지 않는 동작: {0}")]
    Unsupported(&'static str),

    #[error("브라우저 오류: {0}")]
    Browser(String),

    #[error("HTTP 오류: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Locator / Page
// ============================================================================

/// 클릭 대상 지정 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    /// CSS 셀렉터
    Css(&'a str),
    /// 표시 텍스트에 라벨이 포함된 버튼
    Button(&'a str),
}

impl Locator<'_> {
    /// 버튼 라벨용 XPath (라벨에 큰따옴표가 없다고 가정)
    pub fn button_xpath(label: &str) -> String {
        format!("//button[contains(normalize-space(.), \"{}\")]", label)
    }
}

impl std::fmt::Display for Locator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css={}", selector),
            Locator::Button(label) => write!(f, "button={}", label),
        }
    }
}

/// 검색 결과 페이지 조작 인터페이스
///
/// 모든 대기는 제한 시간이 있으며, 초과 시 `PageError::Timeout`을 반환합니다.
pub trait Page {
    /// URL로 이동 (DOMContentLoaded 수준까지)
    fn goto(&mut self, url: &str) -> Result<(), PageError>;

    /// 셀렉터(콤마 리스트 가능)가 나타날 때까지 대기
    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// 현재 문서 HTML
    fn content(&mut self) -> Result<String, PageError>;

    /// 요소가 존재하고 보이는지
    fn is_visible(&mut self, locator: Locator<'_>) -> Result<bool, PageError>;

    /// 요소 클릭
    fn click(&mut self, locator: Locator<'_>, timeout: Duration) -> Result<(), PageError>;

    /// 입력 필드를 채우고 Enter
    fn fill_and_submit(&mut self, selector: &str, text: &str) -> Result<(), PageError>;

    /// 페이지/세션 종료
    fn close(&mut self) -> Result<(), PageError>;
}

// ============================================================================
// Browser Options
// ============================================================================

/// 브라우저 실행 옵션
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// 동작 사이 인위적 지연 (0이면 없음)
    pub slow_mo: Duration,
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub args: Vec<String>,
    pub navigation_timeout: Duration,
    /// 번들 브라우저 실행 파일 (없으면 시스템 Chrome 자동 탐색)
    pub binary: Option<PathBuf>,
}

impl BrowserOptions {
    /// 실행 설정에서 옵션 도출
    pub fn for_run(config: &RunConfig, settings: &Settings) -> Self {
        let slow_mo = if config.fast || config.headless {
            Duration::ZERO
        } else {
            SLOW_MO
        };

        Self {
            headless: config.headless,
            slow_mo,
            viewport: VIEWPORT,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            args: STEALTH_FLAGS.iter().map(|s| s.to_string()).collect(),
            navigation_timeout: NAVIGATION_TIMEOUT,
            binary: settings.browser_binary.clone(),
        }
    }
}

/// 엔진에 맞는 페이지 실행
pub fn launch(engine: Engine, options: &BrowserOptions) -> Result<Box<dyn Page>, PageError> {
    match engine {
        #[cfg(feature = "browser")]
        Engine::Chrome => Ok(Box::new(ChromePage::launch(options)?)),
        #[cfg(not(feature = "browser"))]
        Engine::Chrome => Err(PageError::Unsupported(
            "chrome engine (built without `browser` feature)",
        )),
        Engine::Http => Ok(Box::new(HttpPage::new(options)?)),
    }
}

impl<P: Page + ?Sized> Page for Box<P> {
    fn goto(&mut self, url: &str) -> Result<(), PageError> {
        (**self).goto(url)
    }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        (**self).wait_for_selector(selector, timeout)
    }

    fn content(&mut self) -> Result<String, PageError> {
        (**self).content()
    }

    fn is_visible(&mut self, locator: Locator<'_>) -> Result<bool, PageError> {
        (**self).is_visible(locator)
    }

    fn click(&mut self, locator: Locator<'_>, timeout: Duration) -> Result<(), PageError> {
        (**self).click(locator, timeout)
    }

    fn fill_and_submit(&mut self, selector: &str, text: &str) -> Result<(), PageError> {
        (**self).fill_and_submit(selector, text)
    }

    fn close(&mut self) -> Result<(), PageError> {
        (**self).close()
    }
}
