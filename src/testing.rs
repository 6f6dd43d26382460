//! 테스트용 메모리 테이블과 스크립트 페이지

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use scraper::{Html, Selector};

use crate::browser::{Locator, Page, PageError};
use crate::table::{Column, CompanyTable, TableError, HEADER_ROW};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// MemoryTable
// ============================================================================

#[derive(Default)]
struct TableData {
    rows: Vec<[String; 2]>,
    /// 저장 시점의 시계 값
    saves: Vec<usize>,
    fail_saves: bool,
}

/// 메모리 테이블 (복제본끼리 내용 공유)
#[derive(Clone, Default)]
pub struct MemoryTable {
    data: Arc<Mutex<TableData>>,
    clock: Option<Arc<AtomicUsize>>,
}

impl MemoryTable {
    /// 첫 튜플은 헤더 행
    pub fn from_rows(rows: &[(&str, &str)]) -> Self {
        let rows = rows
            .iter()
            .map(|(a, b)| [a.to_string(), b.to_string()])
            .collect();

        Self {
            data: Arc::new(Mutex::new(TableData {
                rows,
                ..Default::default()
            })),
            clock: None,
        }
    }

    /// 저장 시점 기록에 쓸 공유 시계
    pub fn with_clock(mut self, clock: Arc<AtomicUsize>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 모든 저장을 실패시킴
    pub fn with_failing_saves(self) -> Self {
        lock(&self.data).fail_saves = true;
        self
    }

    /// 저장마다 기록된 시계 값
    pub fn saves(&self) -> Vec<usize> {
        lock(&self.data).saves.clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.data).saves.len()
    }
}

impl CompanyTable for MemoryTable {
    fn cell(&self, row: u32, column: Column) -> String {
        let data = lock(&self.data);
        row.checked_sub(HEADER_ROW)
            .and_then(|i| data.rows.get(i as usize))
            .map(|cells| cells[column.index() as usize - 1].clone())
            .unwrap_or_default()
    }

    fn set_cell(&mut self, row: u32, column: Column, value: &str) {
        let Some(index) = row.checked_sub(HEADER_ROW).map(|i| i as usize) else {
            return;
        };

        let mut data = lock(&self.data);
        if data.rows.len() <= index {
            data.rows.resize_with(index + 1, Default::default);
        }
        data.rows[index][column.index() as usize - 1] = value.to_string();
    }

    fn last_row(&self) -> u32 {
        (lock(&self.data).rows.len() as u32).max(HEADER_ROW)
    }

    fn save(&mut self) -> Result<(), TableError> {
        let tick = self
            .clock
            .as_ref()
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0);

        let mut data = lock(&self.data);
        if data.fail_saves {
            return Err(TableError::Write {
                path: "memory".into(),
                message: "disk full".to_string(),
            });
        }
        data.saves.push(tick);
        Ok(())
    }
}

// ============================================================================
// ScriptedPage
// ============================================================================

/// 페이지 동작 기록 (페이지가 다른 스레드로 옮겨져도 확인 가능)
#[derive(Clone, Default)]
pub struct PageLog(Arc<Mutex<PageLogData>>);

#[derive(Default)]
struct PageLogData {
    visited: Vec<String>,
    clicks: Vec<String>,
    /// `selector|text`
    fills: Vec<String>,
    closed: bool,
}

impl PageLog {
    pub fn visited(&self) -> Vec<String> {
        lock(&self.0).visited.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        lock(&self.0).clicks.clone()
    }

    pub fn fills(&self) -> Vec<String> {
        lock(&self.0).fills.clone()
    }

    pub fn closed(&self) -> bool {
        lock(&self.0).closed
    }
}

/// 이동할 때마다 준비된 HTML을 차례로 보여주는 페이지
///
/// 준비된 HTML이 다 떨어지면 마지막 것을 반복하고, 아예 없으면 빈 문서입니다.
pub struct ScriptedPage {
    pages: Vec<String>,
    html: String,
    log: PageLog,
    visible: Vec<String>,
    failing_clicks: Vec<String>,
    failing_goto: bool,
    panic_at: Option<usize>,
    stop_after: Option<(usize, Arc<AtomicBool>)>,
    clock: Option<Arc<AtomicUsize>>,
}

impl ScriptedPage {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            html: String::new(),
            log: PageLog::default(),
            visible: Vec::new(),
            failing_clicks: Vec::new(),
            failing_goto: false,
            panic_at: None,
            stop_after: None,
            clock: None,
        }
    }

    /// 보이는 요소 (`Locator` 표시 문자열)
    pub fn with_visible(mut self, locators: &[&str]) -> Self {
        self.visible = locators.iter().map(|s| s.to_string()).collect();
        self
    }

    /// 클릭이 실패하는 요소
    pub fn with_failing_clicks(mut self, locators: &[&str]) -> Self {
        self.failing_clicks = locators.iter().map(|s| s.to_string()).collect();
        self
    }

    /// 모든 이동 실패 (방문 기록은 남음)
    pub fn with_failing_goto(mut self) -> Self {
        self.failing_goto = true;
        self
    }

    /// n번째 이동에서 패닉
    pub fn panic_at(mut self, navigation: usize) -> Self {
        self.panic_at = Some(navigation);
        self
    }

    /// n번째 이동 직후 중지 플래그 설정
    pub fn stop_after(mut self, navigation: usize, flag: Arc<AtomicBool>) -> Self {
        self.stop_after = Some((navigation, flag));
        self
    }

    /// 이동마다 1씩 증가하는 공유 시계
    pub fn with_clock(mut self, clock: Arc<AtomicUsize>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn log(&self) -> PageLog {
        self.log.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.log.visited()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.log.clicks()
    }

    pub fn fills(&self) -> Vec<String> {
        self.log.fills()
    }
}

impl Page for ScriptedPage {
    fn goto(&mut self, url: &str) -> Result<(), PageError> {
        let navigation = {
            let mut log = lock(&self.log.0);
            log.visited.push(url.to_string());
            log.visited.len()
        };

        if let Some(clock) = &self.clock {
            clock.fetch_add(1, Ordering::SeqCst);
        }
        if let Some((after, flag)) = &self.stop_after {
            if navigation == *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
        if self.panic_at == Some(navigation) {
            panic!("scripted panic at navigation {}", navigation);
        }
        if self.failing_goto {
            return Err(PageError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        self.html = self
            .pages
            .get(navigation - 1)
            .or_else(|| self.pages.last())
            .cloned()
            .unwrap_or_default();
        Ok(())
    }

    fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<(), PageError> {
        let parsed =
            Selector::parse(selector).map_err(|e| PageError::Browser(format!("{:?}", e)))?;

        if Html::parse_document(&self.html).select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(PageError::Timeout(selector.to_string()))
        }
    }

    fn content(&mut self) -> Result<String, PageError> {
        Ok(self.html.clone())
    }

    fn is_visible(&mut self, locator: Locator<'_>) -> Result<bool, PageError> {
        Ok(self.visible.contains(&locator.to_string()))
    }

    fn click(&mut self, locator: Locator<'_>, _timeout: Duration) -> Result<(), PageError> {
        let key = locator.to_string();
        if self.failing_clicks.contains(&key) {
            return Err(PageError::Browser(format!("click intercepted: {}", key)));
        }
        lock(&self.log.0).clicks.push(key);
        Ok(())
    }

    /// 입력은 기록만 하고, 입력창이 없는 페이지처럼 실패
    fn fill_and_submit(&mut self, selector: &str, text: &str) -> Result<(), PageError> {
        lock(&self.log.0)
            .fills
            .push(format!("{}|{}", selector, text));
        Err(PageError::Unsupported("scripted page has no inputs"))
    }

    fn close(&mut self) -> Result<(), PageError> {
        lock(&self.log.0).closed = true;
        Ok(())
    }
}
