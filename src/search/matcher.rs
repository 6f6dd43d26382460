//! 매칭 - 후보 중 회사에 해당하는 프로필 선택
//!
//! 순위 점수 없이 검색 엔진이 준 순서대로 첫 번째 일치를 채택합니다.

use super::extractor::{SearchCandidate, MAX_RESULTS};

/// 개인 프로필 URL 표식
pub const PROFILE_MARKER: &str = "linkedin.com/in/";

/// 앞에서부터 최대 8개 후보 중 첫 번째 일치 프로필 URL
///
/// 조건: URL에 `PROFILE_MARKER` 포함, 회사명(소문자)이 스니펫 또는 링크 텍스트에 포함.
/// 반환 URL은 `?` 이후를 제거합니다.
pub fn find_profile(candidates: &[SearchCandidate], company_name: &str) -> Option<String> {
    let company = company_name.to_lowercase();

    candidates
        .iter()
        .take(MAX_RESULTS)
        .find_map(|candidate| {
            let url = candidate.url.as_deref()?;
            if !url.contains(PROFILE_MARKER) {
                return None;
            }

            let mentions_company = candidate.snippet_text.to_lowercase().contains(&company)
                || candidate.title_text.to_lowercase().contains(&company);

            mentions_company.then(|| strip_query(url).to_string())
        })
}

/// 쿼리 문자열 제거 (첫 `?` 이후)
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
