//! 셀렉터 카탈로그 - 결과 블록/링크/스니펫 후보 셀렉터
//!
//! 검색 엔진 마크업이 바뀌어도 동작하도록 우선순위 순서대로 시도합니다.
//! 한 셀렉터가 실패하는 것은 정상 흐름이며 다음 후보로 넘어갑니다.

use scraper::Selector;

/// 우선순위 셀렉터 목록 묶음
#[derive(Debug, Clone, Copy)]
pub struct SelectorCatalog {
    /// 결과 블록 셀렉터
    pub blocks: &'static [&'static str],
    /// 블록 내부 링크 셀렉터
    pub links: &'static [&'static str],
    /// 블록 내부 스니펫 셀렉터
    pub snippets: &'static [&'static str],
}

/// Startpage 결과 페이지용 카탈로그
pub const STARTPAGE_CATALOG: SelectorCatalog = SelectorCatalog {
    blocks: &[
        "div.w-gl__result",
        r#"article[data-testid="result"]"#,
        r#"li[class*="result"]"#,
        r#"div[class*="result"]"#,
    ],
    links: &[
        r#"a[data-testid="result-title-a"]"#,
        "a.w-gl__result-title",
        "h3 a",
        "a",
    ],
    snippets: &[
        ".w-gl__description",
        r#"p[class*="snippet"]"#,
        r#"div[class*="snippet"] p"#,
        "p",
    ],
};

impl SelectorCatalog {
    /// 블록 셀렉터 전체를 하나의 셀렉터 리스트로 (대기용)
    pub fn any_block(&self) -> String {
        self.blocks.join(",")
    }
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        STARTPAGE_CATALOG
    }
}

/// 셀렉터를 순서대로 시도하여 첫 번째 `Some`을 반환
///
/// 파싱 실패한 셀렉터는 "일치 없음"으로 취급합니다.
pub fn first_match<T>(
    selectors: &[&str],
    mut probe: impl FnMut(&Selector) -> Option<T>,
) -> Option<T> {
    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::debug!("Invalid selector {:?}: {:?}", raw, e);
                continue;
            }
        };

        if let Some(found) = probe(&selector) {
            return Some(found);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_catalog_selectors_parse() {
        let catalog = STARTPAGE_CATALOG;
        for raw in catalog
            .blocks
            .iter()
            .chain(catalog.links)
            .chain(catalog.snippets)
        {
            assert!(Selector::parse(raw).is_ok(), "selector failed: {}", raw);
        }
        assert!(Selector::parse(&catalog.any_block()).is_ok());
    }

    #[test]
    fn test_first_match_skips_invalid_selector() {
        let html = Html::parse_fragment("<p class='x'>hello</p>");
        let found = first_match(&["p[[", "span", "p.x"], |selector| {
            html.select(selector)
                .next()
                .map(|el| el.text().collect::<String>())
        });
        assert_eq!(found, Some("hello".to_string()));
    }

    #[test]
    fn test_first_match_none() {
        let html = Html::parse_fragment("<div></div>");
        let found = first_match(&["span", "p"], |selector| html.select(selector).next());
        assert!(found.is_none());
    }
}
