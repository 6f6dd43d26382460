//! 쿠키 동의 창 닫기 (best-effort)

use std::time::Duration;

use super::{Locator, Page};

/// 동의 버튼 라벨 (먼저 시도)
pub const CONSENT_BUTTON_LABELS: &[&str] = &["Accept", "I agree", "J'accepte", "Agree", "OK"];

/// 동의 버튼 CSS 후보
pub const CONSENT_CSS_SELECTORS: &[&str] = &[
    "button#consent-accept",
    "button#accept-choices",
    r#"button[aria-label*="Agree"]"#,
    r#"button[aria-label*="accept"]"#,
];

/// 라벨 후보 이후 텍스트 버튼 재시도
const CONSENT_TEXT_FALLBACK: &[&str] = &["Accept", "I agree"];

const CLICK_TIMEOUT: Duration = Duration::from_millis(1500);

/// 보이는 첫 번째 동의 버튼 클릭
///
/// 클릭한 후보를 반환합니다. 모든 실패는 무시되며 `None`이 됩니다.
pub fn dismiss_consent<P: Page + ?Sized>(page: &mut P) -> Option<String> {
    let candidates = CONSENT_BUTTON_LABELS
        .iter()
        .map(|label| Locator::Button(*label))
        .chain(CONSENT_CSS_SELECTORS.iter().map(|css| Locator::Css(*css)))
        .chain(CONSENT_TEXT_FALLBACK.iter().map(|label| Locator::Button(*label)));

    for locator in candidates {
        match page.is_visible(locator) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tracing::debug!("Consent probe failed ({}): {}", locator, e);
                continue;
            }
        }

        match page.click(locator, CLICK_TIMEOUT) {
            Ok(()) => return Some(locator.to_string()),
            Err(e) => tracing::debug!("Consent click failed ({}): {}", locator, e),
        }
    }

    None
}
