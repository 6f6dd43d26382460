//! 회사 한 곳에 대한 검색 흐름
//!
//! 검색 페이지 이동 → 동의 창 닫기 → 결과 대기(실패 시 검색창 재입력)
//! → HTML 추출 → 매칭

use std::time::Duration;

use super::extractor::ResultExtractor;
use super::matcher::find_profile;
use super::query::SearchQuery;
use crate::browser::{dismiss_consent, Page, PageError};
use crate::runner::{Pacer, RunReporter};

/// 검색창 셀렉터 (결과가 바로 뜨지 않을 때)
pub const SEARCH_INPUT_SELECTOR: &str = r#"input[name="query"], input[name="q"]"#;

/// 첫 결과 대기
const FIRST_RESULTS_WAIT: Duration = Duration::from_secs(4);

/// 검색창 재입력 후 결과 대기
const RESULTS_WAIT: Duration = Duration::from_secs(10);

/// 프로필 검색기
pub struct ProfileSearcher<'a> {
    extractor: ResultExtractor,
    job_title: &'a str,
    pacer: &'a Pacer,
    reporter: &'a RunReporter,
}

impl<'a> ProfileSearcher<'a> {
    pub fn new(job_title: &'a str, pacer: &'a Pacer, reporter: &'a RunReporter) -> Self {
        Self {
            extractor: ResultExtractor::default(),
            job_title,
            pacer,
            reporter,
        }
    }

    /// 회사의 프로필 URL 검색
    ///
    /// 결과가 없거나 일치가 없으면 `Ok(None)`. 페이지 이동 실패 등은 `Err`.
    pub fn search<P: Page + ?Sized>(
        &self,
        page: &mut P,
        company_name: &str,
    ) -> Result<Option<String>, PageError> {
        let query = SearchQuery::new(self.job_title, company_name);
        self.reporter.log(format!("검색: {}", query));

        self.open_results(page, &query)?;

        let any_block = self.extractor.catalog().any_block();
        if let Err(e) = page.wait_for_selector(&any_block, RESULTS_WAIT) {
            tracing::debug!("No result blocks for {:?}: {}", company_name, e);
            self.reporter.log("결과 없음 (시간 초과)");
            return Ok(None);
        }

        let html = page.content()?;
        let results = self.extractor.extract(&html);
        self.reporter.log(format!("결과 {}개", results.total_blocks));

        match find_profile(&results.candidates, company_name) {
            Some(url) => {
                self.reporter.log(format!("프로필 발견: {}", url));
                Ok(Some(url))
            }
            None => {
                self.reporter.log("일치하는 프로필 없음");
                Ok(None)
            }
        }
    }

    /// 결과 페이지 열기. 결과가 바로 보이지 않으면 검색창에 다시 입력
    fn open_results<P: Page + ?Sized>(
        &self,
        page: &mut P,
        query: &SearchQuery,
    ) -> Result<(), PageError> {
        page.goto(&query.url())?;

        if let Some(clicked) = dismiss_consent(page) {
            self.reporter.log(format!("[cookies] {}", clicked));
            self.pacer.short_pause();
        }

        let any_block = self.extractor.catalog().any_block();
        if page.wait_for_selector(&any_block, FIRST_RESULTS_WAIT).is_ok() {
            return Ok(());
        }

        if let Err(e) = page.fill_and_submit(SEARCH_INPUT_SELECTOR, query.as_str()) {
            tracing::debug!("Search box fallback failed: {}", e);
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
