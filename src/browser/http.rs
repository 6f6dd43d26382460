//! HTTP 페이지 - 브라우저 없이 결과 페이지 HTML만 가져옴
//!
//! 자바스크립트 실행, 클릭, 입력은 지원하지 않습니다.

use std::time::Duration;

use scraper::{Html, Selector};

use super::{BrowserOptions, Locator, Page, PageError};

/// reqwest 블로킹 클라이언트 기반 페이지
pub struct HttpPage {
    client: reqwest::blocking::Client,
    html: Option<String>,
}

impl HttpPage {
    /// 쿠키 저장소를 가진 클라이언트 생성
    pub fn new(options: &BrowserOptions) -> Result<Self, PageError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(options.user_agent.as_str())
            .cookie_store(true)
            .timeout(options.navigation_timeout)
            .build()?;

        Ok(Self { client, html: None })
    }

    fn document(&self) -> Option<Html> {
        self.html.as_deref().map(Html::parse_document)
    }
}

impl Page for HttpPage {
    fn goto(&mut self, url: &str) -> Result<(), PageError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PageError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        self.html = Some(response.text()?);
        Ok(())
    }

    /// 정적 문서이므로 대기 없이 현재 문서에서 즉시 확인
    fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<(), PageError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| PageError::NotFound(format!("{} ({:?})", selector, e)))?;

        let found = self
            .document()
            .map(|doc| doc.select(&parsed).next().is_some())
            .unwrap_or(false);

        if found {
            Ok(())
        } else {
            Err(PageError::Timeout(selector.to_string()))
        }
    }

    fn content(&mut self) -> Result<String, PageError> {
        Ok(self.html.clone().unwrap_or_default())
    }

    fn is_visible(&mut self, _locator: Locator<'_>) -> Result<bool, PageError> {
        Ok(false)
    }

    fn click(&mut self, _locator: Locator<'_>, _timeout: Duration) -> Result<(), PageError> {
        Err(PageError::Unsupported("click (http engine)"))
    }

    fn fill_and_submit(&mut self, _selector: &str, _text: &str) -> Result<(), PageError> {
        Err(PageError::Unsupported("fill (http engine)"))
    }

    fn close(&mut self) -> Result<(), PageError> {
        self.html = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{RunConfig, Settings};

    fn page_with(html: &str) -> HttpPage {
        let settings = Settings {
            app_dir: ".".into(),
            browsers_dir: None,
            browser_binary: None,
        };
        let options = BrowserOptions::for_run(&RunConfig::new("book.xlsx"), &settings);
        let mut page = HttpPage::new(&options).expect("client build failed");
        page.html = Some(html.to_string());
        page
    }

    #[test]
    fn test_wait_for_selector_checks_current_document() {
        let mut page = page_with(r#"<div class="w-gl__result"><a href="x">x</a></div>"#);
        assert!(page
            .wait_for_selector("article, div.w-gl__result", Duration::from_secs(1))
            .is_ok());
        assert!(matches!(
            page.wait_for_selector("li.result", Duration::from_secs(1)),
            Err(PageError::Timeout(_))
        ));
    }

    #[test]
    fn test_interactions_unsupported() {
        let mut page = page_with("<button>Accept</button>");
        assert!(!page.is_visible(Locator::Button("Accept")).unwrap());
        assert!(matches!(
            page.click(Locator::Button("Accept"), Duration::from_millis(10)),
            Err(PageError::Unsupported(_))
        ));
        assert!(page.fill_and_submit("input", "q").is_err());
    }

    #[test]
    fn test_close_clears_document() {
        let mut page = page_with("<p>hi</p>");
        page.close().unwrap();
        assert_eq!(page.content().unwrap(), "");
    }
}
