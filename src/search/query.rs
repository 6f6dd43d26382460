//! 검색 쿼리 빌더

use url::form_urlencoded;

/// 검색 엔드포인트 (쿼리는 URL 인코딩 후 뒤에 붙음)
pub const SEARCH_ENDPOINT: &str = "https://www.startpage.com/do/search?q=";

/// 프로필 경로 제한
pub const SITE_FILTER: &str = "site:linkedin.com/in";

/// `"<직무>" site:linkedin.com/in "<회사>"` 형태의 검색 쿼리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
}

impl SearchQuery {
    /// 직무명과 회사명으로 쿼리 생성 (입력은 그대로 사용)
    pub fn new(job_title: &str, company_name: &str) -> Self {
        Self {
            text: format!("\"{}\" {} \"{}\"", job_title, SITE_FILTER, company_name),
        }
    }

    /// 쿼리 원문
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// 인코딩된 쿼리 문자열 (공백은 `+`)
    pub fn encoded(&self) -> String {
        form_urlencoded::byte_serialize(self.text.as_bytes()).collect()
    }

    /// 검색 결과 페이지 URL
    pub fn url(&self) -> String {
        format!("{}{}", SEARCH_ENDPOINT, self.encoded())
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_text() {
        let query = SearchQuery::new("Responsable HSE", "Acme SA");
        assert_eq!(
            query.as_str(),
            r#""Responsable HSE" site:linkedin.com/in "Acme SA""#
        );
    }

    #[test]
    fn test_query_url_encoding() {
        let query = SearchQuery::new("Responsable HSE", "Acme SA");
        assert_eq!(
            query.url(),
            "https://www.startpage.com/do/search?q=%22Responsable+HSE%22+site%3Alinkedin.com%2Fin+%22Acme+SA%22"
        );
    }

    #[test]
    fn test_query_non_ascii() {
        let query = SearchQuery::new("Ingénieur", "Société Générale & Co");
        let encoded = query.encoded();
        assert!(encoded.contains("Ing%C3%A9nieur"));
        assert!(encoded.contains("%26"));
        assert!(!encoded.contains(' '));
    }
}
