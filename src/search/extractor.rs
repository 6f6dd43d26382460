//! 결과 추출기 - 검색 결과 페이지에서 후보 추출
//!
//! 블록 → 링크(href, 텍스트) → 스니펫 순으로 셀렉터 카탈로그를 따라 내려갑니다.
//! 어떤 단계에서 일치가 없어도 에러가 아니라 빈 값으로 처리합니다.

use scraper::{ElementRef, Html};
use serde::Serialize;

use super::selectors::{first_match, SelectorCatalog};

/// 블록당 처리하는 최대 결과 수
pub const MAX_RESULTS: usize = 8;

// ============================================================================
// Types
// ============================================================================

/// 검색 결과 후보 (저장되지 않음)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchCandidate {
    /// 링크 대상 (href)
    pub url: Option<String>,
    /// 링크 텍스트
    pub title_text: String,
    /// 스니펫 텍스트
    pub snippet_text: String,
}

/// 페이지 단위 추출 결과
#[derive(Debug, Clone, Default)]
pub struct ExtractedResults {
    /// 페이지에서 찾은 전체 블록 수
    pub total_blocks: usize,
    /// 앞에서부터 최대 `MAX_RESULTS`개 후보 (문서 순서)
    pub candidates: Vec<SearchCandidate>,
}

// ============================================================================
// ResultExtractor
// ============================================================================

/// 결과 추출기
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    catalog: SelectorCatalog,
    max_results: usize,
}

impl ResultExtractor {
    /// 카탈로그로 추출기 생성
    pub fn new(catalog: SelectorCatalog) -> Self {
        Self {
            catalog,
            max_results: MAX_RESULTS,
        }
    }

    /// 사용하는 카탈로그
    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    /// HTML 문서에서 후보 추출
    pub fn extract(&self, html: &str) -> ExtractedResults {
        let document = Html::parse_document(html);
        let blocks = self.result_blocks(&document);

        let candidates = blocks
            .iter()
            .take(self.max_results)
            .map(|block| self.candidate(*block))
            .collect();

        ExtractedResults {
            total_blocks: blocks.len(),
            candidates,
        }
    }

    /// 결과 블록 목록 (처음으로 비어있지 않은 셀렉터의 결과)
    pub fn result_blocks<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        first_match(self.catalog.blocks, |selector| {
            let blocks: Vec<_> = document.select(selector).collect();
            (!blocks.is_empty()).then_some(blocks)
        })
        .unwrap_or_default()
    }

    /// 블록 하나에서 링크와 스니펫 추출
    pub fn candidate(&self, block: ElementRef<'_>) -> SearchCandidate {
        let (url, title_text) = first_match(self.catalog.links, |selector| {
            block.select(selector).next().map(|link| {
                let href = link.value().attr("href").map(str::to_string);
                (href, inner_text(&link))
            })
        })
        .unwrap_or_default();

        let snippet_text = first_match(self.catalog.snippets, |selector| {
            block.select(selector).next().map(|snippet| inner_text(&snippet))
        })
        .unwrap_or_default();

        SearchCandidate {
            url,
            title_text,
            snippet_text,
        }
    }
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self::new(SelectorCatalog::default())
    }
}

/// 렌더링되지 않는 요소
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// 앞뒤로 줄바꿈이 생기는 요소
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// 요소의 표시 텍스트 (연속 공백 정리)
///
/// 브라우저의 `innerText`처럼 스크립트/스타일과 숨김 요소는 빼고,
/// 블록 요소 사이에는 공백을 넣습니다.
fn inner_text(element: &ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_visible_text(*element, &mut text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !is_rendered(&child) {
                continue;
            }

            let block = BLOCK_TAGS.contains(&child.value().name());
            if block {
                out.push(' ');
            }
            collect_visible_text(child, out);
            if block {
                out.push(' ');
            }
        }
    }
}

fn is_rendered(element: &ElementRef<'_>) -> bool {
    let value = element.value();

    !NON_RENDERED_TAGS.contains(&value.name())
        && value.attr("hidden").is_none()
        && value.attr("aria-hidden") != Some("true")
}

// ============================================================================
// Tests
// ============================================================================
