//! linkscout - 회사 목록으로 LinkedIn 프로필 URL 찾기
//!
//! 검색 엔진 결과 페이지에서 프로필 링크를 골라 엑셀 시트에 기록합니다.
//! 셀렉터 우선순위 목록으로 결과 블록을 추출하고, 회사명이 언급된
//! 첫 번째 프로필을 채택합니다.

pub mod browser;
pub mod cli;
pub mod runner;
pub mod search;
pub mod settings;
pub mod table;

#[cfg(test)]
mod testing;

// Re-exports
pub use browser::{launch, BrowserOptions, Locator, Page, PageError};
pub use runner::{
    run_scraper, BatchRunner, Pacer, RowUpdate, RunChannels, RunError, RunReporter, RunStatus,
    RunSummary, RunnerError,
};
pub use search::{find_profile, ProfileSearcher, ResultExtractor, SearchCandidate, SearchQuery};
pub use settings::{Engine, RunConfig, Settings};
pub use table::{Column, CompanyRow, CompanyTable, TableError, XlsxTable};
