//! 배치 실행기 - 회사 목록을 순회하며 프로필 URL 기록
//!
//! ## 흐름
//! 1. 테이블 열기 + 헤더 정규화
//! 2. 페이지(브라우저) 실행
//! 3. 행마다: 중지 확인 → 검색 → URL 기록 → 5개마다 중간 저장 → 대기
//! 4. 최종 저장 → 테이블 닫기 → 페이지 닫기 → 요약
//!
//! 작업은 별도 스레드에서 돌고, 화면은 `RunChannels`만 폴링합니다.
//! 중지는 `AtomicBool` 플래그로 요청하며 행 경계에서만 반영됩니다.

pub mod events;
mod pacing;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::browser::{Page, PageError};
use crate::search::ProfileSearcher;
use crate::settings::RunConfig;
use crate::table::{Column, CompanyTable, TableError, FIRST_DATA_ROW};

pub use events::{channel, strip_non_bmp, RowUpdate, RunChannels, RunReporter};
pub use pacing::Pacer;

/// 중간 저장 주기 (처리한 회사 수 기준)
pub const CHECKPOINT_EVERY: usize = 5;

/// 테스트 모드에서 처리하는 최대 데이터 행 수
pub const TEST_MODE_ROWS: u32 = 10;

const BANNER_WIDTH: usize = 60;

// ============================================================================
// Types
// ============================================================================

/// 실행기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    /// 중지 요청됨 (현재 행이 끝나길 기다리는 중)
    Stopping,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunStatus::Idle => "대기",
            RunStatus::Running => "실행 중",
            RunStatus::Stopping => "중지 중",
            RunStatus::Completed => "완료",
            RunStatus::Failed => "실패",
        };
        f.write_str(label)
    }
}

/// 실행 중 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// 회사명이 있는 행 중 처리한 수
    pub companies_processed: usize,
    /// URL을 기록한 수
    pub urls_found: usize,
}

/// 실행 요약
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub companies_processed: usize,
    pub urls_found: usize,
    /// 중지 요청으로 끝났는지
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// 소요 시간 (초)
    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// 실행 에러 (이 경우에만 상태가 Failed)
#[derive(Debug, Error)]
pub enum RunError {
    #[error("엑셀 파일을 열 수 없습니다: {0}")]
    TableOpen(#[from] TableError),
}

/// 실행기 제어 에러
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("이미 실행 중입니다")]
    AlreadyRunning,

    #[error("작업 스레드 생성 실패: {0}")]
    Spawn(#[from] std::io::Error),
}

/// 처리할 마지막 행 번호 (테스트 모드는 최대 10개 데이터 행)
pub fn last_row_to_process(last_row: u32, test_mode: bool) -> u32 {
    if test_mode {
        last_row.min(FIRST_DATA_ROW + TEST_MODE_ROWS - 1)
    } else {
        last_row
    }
}

// ============================================================================
// run_scraper
// ============================================================================

/// 배치 실행 (호출 스레드에서 동기 실행)
///
/// 테이블을 열지 못하면 `Err`. 그 외 모든 실패(브라우저 실행 실패, 행 단위 검색 실패,
/// 예기치 않은 패닉)는 로그로 남기고, 최종 저장 후 요약을 반환합니다.
pub fn run_scraper<T, P, O, L>(
    config: &RunConfig,
    open_table: O,
    launch_page: L,
    stop: &AtomicBool,
    reporter: &RunReporter,
) -> Result<RunSummary, RunError>
where
    T: CompanyTable,
    P: Page,
    O: FnOnce(&RunConfig) -> Result<T, TableError>,
    L: FnOnce(&RunConfig) -> Result<P, PageError>,
{
    let pacer = Pacer::for_run(config);
    run_paced(config, &pacer, open_table, launch_page, stop, reporter)
}

/// `run_scraper`와 같지만 대기 정책을 직접 지정
pub fn run_paced<T, P, O, L>(
    config: &RunConfig,
    pacer: &Pacer,
    open_table: O,
    launch_page: L,
    stop: &AtomicBool,
    reporter: &RunReporter,
) -> Result<RunSummary, RunError>
where
    T: CompanyTable,
    P: Page,
    O: FnOnce(&RunConfig) -> Result<T, TableError>,
    L: FnOnce(&RunConfig) -> Result<P, PageError>,
{
    let started_at = Utc::now();
    log_banner(config, reporter);

    let mut table = match open_table(config) {
        Ok(table) => table,
        Err(e) => {
            reporter.log(format!("엑셀 열기 오류: {}", e));
            tracing::error!("Failed to open workbook: {}", e);
            return Err(RunError::TableOpen(e));
        }
    };

    table.normalize_headers(&config.job_title);
    let max_row = last_row_to_process(table.last_row(), config.test_mode);
    reporter.log(format!(
        "처리 대상: 데이터 행 {}개",
        max_row.saturating_sub(FIRST_DATA_ROW - 1)
    ));

    let mut state = RunState::default();
    let mut cancelled = false;

    match launch_page(config) {
        Ok(mut page) => {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut batch = Batch {
                    config,
                    table: &mut table,
                    page: &mut page,
                    pacer,
                    stop,
                    reporter,
                    state: &mut state,
                };
                batch.run(max_row)
            }));

            match outcome {
                Ok(stopped) => cancelled = stopped,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!("Run aborted: {}", message);
                    reporter.log(format!("예기치 않은 오류: {}", message));
                }
            }

            save_final(&mut table, reporter);
            drop(table);

            if let Err(e) = page.close() {
                tracing::warn!("Failed to close page: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("Failed to launch page: {}", e);
            reporter.log(format!("브라우저 실행 실패: {}", e));
            save_final(&mut table, reporter);
        }
    }

    let summary = RunSummary {
        companies_processed: state.companies_processed,
        urls_found: state.urls_found,
        cancelled,
        started_at,
        finished_at: Utc::now(),
    };
    log_summary(&summary, reporter);

    Ok(summary)
}

/// 행 루프에 필요한 것들
struct Batch<'a, T: CompanyTable, P: Page> {
    config: &'a RunConfig,
    table: &'a mut T,
    page: &'a mut P,
    pacer: &'a Pacer,
    stop: &'a AtomicBool,
    reporter: &'a RunReporter,
    state: &'a mut RunState,
}

impl<T: CompanyTable, P: Page> Batch<'_, T, P> {
    /// 중지 요청으로 끝났으면 `true`
    fn run(&mut self, max_row: u32) -> bool {
        let (config, pacer, reporter) = (self.config, self.pacer, self.reporter);
        let searcher = ProfileSearcher::new(&config.job_title, pacer, reporter);

        for row in FIRST_DATA_ROW..=max_row {
            if self.stop.load(Ordering::SeqCst) {
                self.reporter.log("중지 요청됨. 저장 중...");
                return true;
            }

            let company = self.table.company_name(row);
            if company.is_empty() {
                continue;
            }

            self.state.companies_processed += 1;
            self.reporter.log(format!(
                "\n[{}] 회사: {} (행 {})",
                self.state.companies_processed, company, row
            ));
            self.reporter.log("-".repeat(40));

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                searcher.search(&mut *self.page, &company)
            }));
            let found = match outcome {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => {
                    tracing::warn!("Search failed for row {}: {}", row, e);
                    self.reporter.log(format!("검색 오류: {}", e));
                    None
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!("Row {} aborted: {}", row, message);
                    self.reporter.log(format!("예기치 않은 오류: {}", message));
                    None
                }
            };

            if let Some(url) = found {
                self.table.set_result_url(row, &url);
                self.state.urls_found += 1;
                self.reporter.row_update(row, &url);
                self.reporter
                    .log(format!("{}{} 에 URL 기록", Column::Result.letter(), row));
            }

            if self.state.companies_processed % CHECKPOINT_EVERY == 0 {
                match self.table.save() {
                    Ok(()) => self.reporter.log(format!(
                        "중간 저장 완료 ({}개 처리)",
                        self.state.companies_processed
                    )),
                    Err(e) => self.reporter.log(format!("중간 저장 실패: {}", e)),
                }
            }

            if row < max_row {
                self.pacer.wait_between_rows();
            }
        }

        false
    }
}

fn save_final<T: CompanyTable>(table: &mut T, reporter: &RunReporter) {
    match table.save() {
        Ok(()) => tracing::info!("Workbook saved"),
        Err(e) => {
            tracing::error!("Final save failed: {}", e);
            reporter.log(format!("최종 저장 실패: {}", e));
        }
    }
}

fn log_banner(config: &RunConfig, reporter: &RunReporter) {
    let rule = "=".repeat(BANNER_WIDTH);
    reporter.log(&rule);
    reporter.log("LinkedIn 프로필 검색 시작");
    reporter.log(&rule);
    reporter.log(format!("파일: {}", config.workbook_path.display()));
    reporter.log(format!("직무: {}", config.job_title));
    reporter.log(format!(
        "모드: {} / 브라우저: {} / 엔진: {:?}{}",
        if config.test_mode { "테스트 (10개)" } else { "전체" },
        if config.headless { "숨김" } else { "표시" },
        config.engine,
        if config.fast { " / 빠른 모드" } else { "" },
    ));
}

fn log_summary(summary: &RunSummary, reporter: &RunReporter) {
    let rule = "=".repeat(BANNER_WIDTH);
    reporter.log(format!("\n{}", rule));
    reporter.log(if summary.cancelled {
        "요약 (중지됨)"
    } else {
        "요약"
    });
    reporter.log(&rule);
    reporter.log(format!("처리한 회사: {}", summary.companies_processed));
    reporter.log(format!("찾은 URL: {}", summary.urls_found));
    reporter.log(format!("소요 시간: {:.1}초", summary.elapsed_secs()));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "알 수 없는 패닉".to_string()
    }
}

// ============================================================================
// BatchRunner
// ============================================================================

/// 작업 스레드를 소유하는 실행기
///
/// 상태: Idle → Running → (Stopping) → Completed | Failed → Running ...
/// 실행 중에는 새 실행을 거부합니다.
pub struct BatchRunner {
    status: Arc<Mutex<RunStatus>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<RunSummary, RunError>>>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(RunStatus::Idle)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// 현재 상태
    pub fn status(&self) -> RunStatus {
        read_status(&self.status)
    }

    /// 작업 스레드가 살아 있는지
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// 새 실행 시작. 로그/행 갱신 수신기를 반환
    pub fn start<T, P, O, L>(
        &mut self,
        config: RunConfig,
        open_table: O,
        launch_page: L,
    ) -> Result<RunChannels, RunnerError>
    where
        T: CompanyTable,
        P: Page,
        O: FnOnce(&RunConfig) -> Result<T, TableError> + Send + 'static,
        L: FnOnce(&RunConfig) -> Result<P, PageError> + Send + 'static,
    {
        if self.is_running() {
            return Err(RunnerError::AlreadyRunning);
        }

        // 이전 실행 정리
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("Previous run failed: {}", e),
                Err(payload) => tracing::warn!(
                    "Previous runner thread panicked: {}",
                    panic_message(payload.as_ref())
                ),
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        self.stop = Arc::clone(&stop);

        let (reporter, channels) = events::channel();
        write_status(&self.status, RunStatus::Running);

        let status = Arc::clone(&self.status);
        let spawned = std::thread::Builder::new()
            .name("linkscout-runner".to_string())
            .spawn(move || {
                let result = run_scraper(&config, open_table, launch_page, &stop, &reporter);
                let final_status = match &result {
                    Ok(_) => RunStatus::Completed,
                    Err(_) => RunStatus::Failed,
                };
                write_status(&status, final_status);
                result
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(channels)
            }
            Err(e) => {
                write_status(&self.status, RunStatus::Idle);
                Err(RunnerError::Spawn(e))
            }
        }
    }

    /// 중지 요청. 실행 중이었으면 `true`
    ///
    /// 현재 행이 끝난 뒤 반영되며, 이미 기록한 결과는 최종 저장됩니다.
    pub fn request_stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.stop.store(true, Ordering::SeqCst);

        let mut status = match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *status == RunStatus::Running {
            *status = RunStatus::Stopping;
        }
        true
    }

    /// 작업 스레드 종료 대기. 실행한 적이 없으면 `None`
    pub fn wait(&mut self) -> Option<Result<RunSummary, RunError>> {
        let handle = self.worker.take()?;

        match handle.join() {
            Ok(result) => Some(result),
            Err(payload) => {
                tracing::error!("Runner thread panicked: {}", panic_message(payload.as_ref()));
                write_status(&self.status, RunStatus::Failed);
                None
            }
        }
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn read_status(status: &Mutex<RunStatus>) -> RunStatus {
    match status.lock() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_status(status: &Mutex<RunStatus>, value: RunStatus) {
    match status.lock() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}

// ============================================================================
// Tests
// ============================================================================
