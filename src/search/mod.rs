//! 검색 모듈 - 쿼리 생성, 결과 추출, 프로필 매칭
//!
//! 셀렉터 우선순위 목록을 따라 결과 블록을 찾고,
//! 검색 엔진이 준 순서대로 첫 번째 일치 프로필을 채택합니다.

mod extractor;
mod matcher;
mod profile;
mod query;
mod selectors;

pub use extractor::{ExtractedResults, ResultExtractor, SearchCandidate, MAX_RESULTS};
pub use matcher::{find_profile, strip_query, PROFILE_MARKER};
pub use profile::{ProfileSearcher, SEARCH_INPUT_SELECTOR};
pub use query::{SearchQuery, SEARCH_ENDPOINT, SITE_FILTER};
pub use selectors::{first_match, SelectorCatalog, STARTPAGE_CATALOG};
