//! Chrome/Chromium 페이지 (headless_chrome)
//!
//! 실행 1회당 브라우저 하나, 탭 하나를 유지합니다.
//! 쿠키와 세션이 행 사이에 유지되어 동의 창과 봇 탐지가 줄어듭니다.

use std::ffi::OsString;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, Element, LaunchOptions, Tab};

use super::{BrowserOptions, Locator, Page, PageError};

/// 브라우저 유휴 종료 시간 (행 사이 대기보다 충분히 길게)
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(120);

const ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";

/// headless_chrome 기반 페이지
pub struct ChromePage {
    tab: Arc<Tab>,
    slow_mo: Duration,
    // 필드는 선언 순서대로 drop되므로 브라우저는 탭 다음
    _browser: Browser,
}

impl ChromePage {
    /// 브라우저 실행 후 새 탭 준비
    pub fn launch(options: &BrowserOptions) -> Result<Self, PageError> {
        let args: Vec<OsString> = options.args.iter().map(OsString::from).collect();

        let launch_options = LaunchOptions {
            headless: options.headless,
            window_size: Some(options.viewport),
            args: args.iter().map(OsString::as_os_str).collect(),
            path: options.binary.clone(),
            idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
            ..Default::default()
        };

        tracing::info!(
            "Launching Chrome (headless: {}, binary: {:?})",
            options.headless,
            options.binary
        );

        let browser = Browser::new(launch_options).map_err(browser_error)?;
        let tab = browser.new_tab().map_err(browser_error)?;

        tab.set_default_timeout(options.navigation_timeout);
        tab.set_user_agent(&options.user_agent, Some(ACCEPT_LANGUAGE), None)
            .map_err(browser_error)?;

        Ok(Self {
            _browser: browser,
            tab,
            slow_mo: options.slow_mo,
        })
    }

    fn pause(&self) {
        if !self.slow_mo.is_zero() {
            std::thread::sleep(self.slow_mo);
        }
    }

    fn find(&self, locator: Locator<'_>) -> anyhow::Result<Element<'_>> {
        match locator {
            Locator::Css(selector) => self.tab.find_element(selector),
            Locator::Button(label) => self.tab.find_element_by_xpath(&Locator::button_xpath(label)),
        }
    }

    fn wait_for(&self, locator: Locator<'_>, timeout: Duration) -> anyhow::Result<Element<'_>> {
        match locator {
            Locator::Css(selector) => self.tab.wait_for_element_with_custom_timeout(selector, timeout),
            Locator::Button(label) => self
                .tab
                .wait_for_xpath_with_custom_timeout(&Locator::button_xpath(label), timeout),
        }
    }
}

impl Page for ChromePage {
    fn goto(&mut self, url: &str) -> Result<(), PageError> {
        let navigation_error = |e: anyhow::Error| PageError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        self.tab.navigate_to(url).map_err(navigation_error)?;
        self.tab.wait_until_navigated().map_err(navigation_error)?;
        self.pause();
        Ok(())
    }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| PageError::Timeout(format!("{} ({})", selector, e)))
    }

    fn content(&mut self) -> Result<String, PageError> {
        self.tab.get_content().map_err(browser_error)
    }

    fn is_visible(&mut self, locator: Locator<'_>) -> Result<bool, PageError> {
        // 박스 모델이 없으면 렌더링되지 않은 요소
        Ok(self
            .find(locator)
            .map(|element| element.get_box_model().is_ok())
            .unwrap_or(false))
    }

    fn click(&mut self, locator: Locator<'_>, timeout: Duration) -> Result<(), PageError> {
        {
            let element = self
                .wait_for(locator, timeout)
                .map_err(|e| PageError::Timeout(format!("{} ({})", locator, e)))?;
            element.click().map_err(browser_error)?;
        }
        self.pause();
        Ok(())
    }

    fn fill_and_submit(&mut self, selector: &str, text: &str) -> Result<(), PageError> {
        {
            let element = self
                .tab
                .find_element(selector)
                .map_err(|e| PageError::NotFound(format!("{} ({})", selector, e)))?;

            element
                .call_js_fn("function() { this.value = ''; }", vec![], false)
                .map_err(browser_error)?;
            element.click().map_err(browser_error)?;
            element.type_into(text).map_err(browser_error)?;
        }
        self.tab.press_key("Enter").map_err(browser_error)?;
        self.pause();
        Ok(())
    }

    fn close(&mut self) -> Result<(), PageError> {
        self.tab.close(true).map(|_| ()).map_err(browser_error)
    }
}

fn browser_error(e: impl Display) -> PageError {
    PageError::Browser(e.to_string())
}
