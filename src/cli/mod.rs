//! CLI 모듈
//!
//! linkscout CLI 명령어 정의 및 구현
//!
//! 작업 파일(엑셀)을 편집하는 얇은 명령어들과, 배치 실행기를 돌리는 `run`으로 구성됩니다.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::browser::{self, BrowserOptions};
use crate::runner::{BatchRunner, RowUpdate};
use crate::settings::{self, Engine, RunConfig, DEFAULT_JOB_TITLE, DEFAULT_SHEET_NAME};
use crate::table::{default_export_path, export_copy, export_csv, CompanyTable, XlsxTable};

/// 실행 중 채널 폴링 주기
const POLL_INTERVAL: Duration = Duration::from_millis(120);

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "linkscout")]
#[command(version, about = "회사 목록으로 LinkedIn 프로필 URL 찾기", long_about = None)]
pub struct Cli {
    /// 작업 엑셀 파일 (기본: 실행 파일 옆 icpe_details.xlsx)
    #[arg(short, long, global = true)]
    pub workbook: Option<PathBuf>,

    /// 시트 이름
    #[arg(short, long, global = true, default_value = DEFAULT_SHEET_NAME)]
    pub sheet: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 회사 목록을 순회하며 프로필 URL 검색
    Run {
        /// 검색할 직무명 (B1 헤더에도 기록)
        #[arg(short, long, default_value = DEFAULT_JOB_TITLE)]
        job_title: String,

        /// 브라우저 창 숨김
        #[arg(long)]
        headless: bool,

        /// 빠른 모드 (행 간 대기 생략)
        #[arg(long)]
        fast: bool,

        /// 테스트 모드 (처음 10행만)
        #[arg(long)]
        test_mode: bool,

        /// 페이지 엔진
        #[arg(long, value_enum, default_value_t = Engine::Chrome)]
        engine: Engine,
    },

    /// 회사 목록 보기
    List {
        /// JSON 출력
        #[arg(long)]
        json: bool,
    },

    /// 회사 추가 (인자가 없으면 표준 입력에서 한 줄에 하나씩)
    Add {
        /// 추가할 회사명
        companies: Vec<String>,
    },

    /// 행 삭제 (아래 행이 한 칸씩 올라옴)
    Delete {
        /// 삭제할 시트 행 번호 (2부터)
        #[arg(short, long)]
        row: u32,
    },

    /// 작업 파일 내보내기
    Export {
        /// 저장 경로 (기본: 홈 폴더/<직무명>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV로 내보내기
        #[arg(long)]
        csv: bool,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let workbook = cli
        .workbook
        .unwrap_or_else(|| settings::get().default_workbook_path());
    let sheet = cli.sheet;

    match cli.command {
        Commands::Run {
            job_title,
            headless,
            fast,
            test_mode,
            engine,
        } => {
            let mut config = RunConfig::new(workbook)
                .with_sheet(&sheet)
                .with_job_title(&job_title);
            config.headless = headless;
            config.fast = fast;
            config.test_mode = test_mode;
            config.engine = engine;

            cmd_run(config).await
        }
        Commands::List { json } => cmd_list(&workbook, &sheet, json).await,
        Commands::Add { companies } => cmd_add(&workbook, &sheet, companies).await,
        Commands::Delete { row } => cmd_delete(&workbook, &sheet, row).await,
        Commands::Export { output, csv } => cmd_export(&workbook, &sheet, output, csv).await,
        Commands::Status => cmd_status(&workbook, &sheet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 실행 명령어 (run)
///
/// 작업 스레드에서 배치를 돌리고, 이 태스크는 120ms마다 로그/행 갱신을 비웁니다.
/// Ctrl-C는 중지 요청으로 한 번만 전달됩니다.
async fn cmd_run(config: RunConfig) -> Result<()> {
    println!("[*] 작업 파일: {}", config.workbook_path.display());

    let options = BrowserOptions::for_run(&config, settings::get());

    let mut runner = BatchRunner::new();
    let mut channels = runner
        .start(
            config,
            |config| XlsxTable::open_or_create(&config.workbook_path, &config.sheet_name),
            move |config| browser::launch(config.engine, &options),
        )
        .context("실행 시작 실패")?;

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stop_requested = false;
    let mut updates: Vec<RowUpdate> = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = &mut ctrl_c, if !stop_requested => {
                stop_requested = true;
                match signal {
                    Ok(()) if runner.request_stop() => {
                        println!("\n[!] 중지 요청됨. 현재 행 처리 후 저장합니다...");
                    }
                    Ok(()) => {}
                    Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
        }

        let finished = !runner.is_running();

        for line in channels.drain_logs() {
            print!("{}", line);
        }
        updates.extend(channels.drain_updates());

        if finished {
            break;
        }
    }

    let summary = match runner.wait() {
        Some(result) => result.context("실행 실패")?,
        None => bail!("작업 스레드가 비정상 종료되었습니다 (상태: {})", runner.status()),
    };

    println!();
    if summary.cancelled {
        println!("[!] 중지됨: 처리 {}건, URL {}건", summary.companies_processed, summary.urls_found);
    } else {
        println!("[OK] 완료: 처리 {}건, URL {}건", summary.companies_processed, summary.urls_found);
    }

    for update in &updates {
        println!("     행 {:<4} {}", update.row, update.url);
    }

    Ok(())
}

/// 목록 명령어 (list)
async fn cmd_list(workbook: &Path, sheet: &str, json: bool) -> Result<()> {
    if !workbook.is_file() {
        println!("[!] 작업 파일이 없습니다: {}", workbook.display());
        return Ok(());
    }

    let table = XlsxTable::open(workbook, sheet).context("작업 파일 열기 실패")?;
    let rows = table.rows();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows).context("JSON 변환 실패")?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("[!] 등록된 회사가 없습니다.");
        return Ok(());
    }

    println!(
        "[OK] 회사 목록 ({} 건) - {}\n",
        rows.len(),
        header_or_default(&table)
    );

    for row in rows {
        println!("  #{:<4} {}", row.row, truncate_text(&row.company_name, 40));
        if let Some(ref url) = row.result_url {
            println!("        URL: {}", url);
        }
    }

    Ok(())
}

/// 추가 명령어 (add)
///
/// 인자가 없으면 표준 입력의 줄들을 회사명으로 추가합니다 (빈 줄 제외).
async fn cmd_add(workbook: &Path, sheet: &str, companies: Vec<String>) -> Result<()> {
    let names = if companies.is_empty() {
        println!("[*] 표준 입력에서 회사명을 읽습니다 (한 줄에 하나, 종료: Ctrl-D)");
        read_company_lines(std::io::stdin().lock()).context("표준 입력 읽기 실패")?
    } else {
        companies
    };

    let mut table = open_for_edit(workbook, sheet)?;
    let added = table.append_companies(&names);
    table.save().context("작업 파일 저장 실패")?;

    if added == 0 {
        println!("[!] 추가할 회사명이 없습니다.");
    } else {
        println!("[OK] {} 개 회사 추가됨", added);
    }

    Ok(())
}

/// 삭제 명령어 (delete)
async fn cmd_delete(workbook: &Path, sheet: &str, row: u32) -> Result<()> {
    let mut table = open_for_edit(workbook, sheet)?;

    let removed = table.remove_row(row).context("행 삭제 실패")?;
    table.save().context("작업 파일 저장 실패")?;

    println!("[OK] 행 {} 삭제됨: {}", removed.row, removed.company_name);
    if let Some(url) = removed.result_url {
        println!("     URL: {}", url);
    }

    Ok(())
}

/// 내보내기 명령어 (export)
async fn cmd_export(
    workbook: &Path,
    sheet: &str,
    output: Option<PathBuf>,
    csv: bool,
) -> Result<()> {
    let mut table = open_for_edit(workbook, sheet)?;
    table.save().context("작업 파일 저장 실패")?;

    let job_title = header_or_default(&table);
    let destination = output.unwrap_or_else(|| default_export_path(&job_title));

    if csv {
        let destination = destination.with_extension("csv");
        let count = export_csv(&table, &destination).context("CSV 내보내기 실패")?;
        println!("[OK] CSV 내보내기 완료 ({} 행): {}", count, destination.display());
    } else {
        let written = export_copy(workbook, &destination).context("내보내기 실패")?;
        println!("[OK] 내보내기 완료: {}", written.display());
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(workbook: &Path, sheet: &str) -> Result<()> {
    println!("linkscout v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let settings = settings::get();
    println!("[*] 실행 폴더: {}", settings.app_dir.display());

    match (&settings.browsers_dir, &settings.browser_binary) {
        (_, Some(binary)) => println!("[OK] 번들 브라우저: {}", binary.display()),
        (Some(dir), None) => println!("[!] 번들 폴더에 브라우저 없음: {}", dir.display()),
        (None, None) => println!("[*] 번들 브라우저: 없음 (시스템 Chrome 사용)"),
    }

    if !workbook.is_file() {
        println!("[!] 작업 파일 없음: {}", workbook.display());
        return Ok(());
    }

    println!("[OK] 작업 파일: {}", workbook.display());

    match XlsxTable::open(workbook, sheet) {
        Ok(table) => {
            let rows = table.rows();
            let with_url = rows.iter().filter(|r| r.result_url.is_some()).count();
            println!("     시트: {}", table.sheet_name());
            println!("     직무명: {}", header_or_default(&table));
            println!("     회사: {} 건 / URL: {} 건", rows.len(), with_url);
        }
        Err(e) => {
            println!("[!] 작업 파일 열기 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 편집용으로 열기: 없으면 생성, 시트 이름 맞추기, 헤더 정규화
fn open_for_edit(workbook: &Path, sheet: &str) -> Result<XlsxTable> {
    let mut table = XlsxTable::open_or_create(workbook, sheet).context("작업 파일 열기 실패")?;

    if table.sheet_name() != sheet {
        tracing::info!("Renaming sheet {:?} to {:?}", table.sheet_name(), sheet);
        table.rename_sheet(sheet);
    }

    let job_title = header_or_default(&table);
    table.normalize_headers(&job_title);
    Ok(table)
}

/// B1 헤더 (비어 있으면 기본 직무명)
fn header_or_default<T: CompanyTable + ?Sized>(table: &T) -> String {
    let header = table.job_title_header();
    if header.is_empty() {
        DEFAULT_JOB_TITLE.to_string()
    } else {
        header
    }
}

/// 줄 단위 회사명 읽기 (공백 제거, 빈 줄 제외)
fn read_company_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, COMPANY_HEADER};
    use tempfile::TempDir;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Acme", 10), "Acme");
        assert_eq!(truncate_text("Société Générale", 7), "Société...");
        assert_eq!(truncate_text("Acme\nSA", 20), "Acme SA");
    }

    #[test]
    fn test_read_company_lines() {
        let input = "  Acme SA \n\n\r\nGlobex\r\n   \nInitech";
        let names = read_company_lines(input.as_bytes()).unwrap();
        assert_eq!(names, vec!["Acme SA", "Globex", "Initech"]);
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "linkscout",
            "--workbook",
            "book.xlsx",
            "run",
            "--headless",
            "--test-mode",
            "--engine",
            "http",
            "-j",
            "Directeur QSE",
        ])
        .unwrap();

        assert_eq!(cli.workbook, Some(PathBuf::from("book.xlsx")));
        assert_eq!(cli.sheet, DEFAULT_SHEET_NAME);
        match cli.command {
            Commands::Run {
                job_title,
                headless,
                fast,
                test_mode,
                engine,
            } => {
                assert_eq!(job_title, "Directeur QSE");
                assert!(headless);
                assert!(!fast);
                assert!(test_mode);
                assert_eq!(engine, Engine::Http);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_global_sheet_after_subcommand() {
        let cli = Cli::try_parse_from(["linkscout", "list", "--json", "--sheet", "Data"]).unwrap();
        assert_eq!(cli.sheet, "Data");
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn test_open_for_edit_creates_and_renames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("icpe_details.xlsx");
        XlsxTable::ensure_exists(&path, "Data").unwrap();

        let mut table = open_for_edit(&path, "Feuille1").unwrap();
        assert_eq!(table.sheet_name(), "Feuille1");
        assert_eq!(table.cell(1, Column::Company), COMPANY_HEADER);
        assert_eq!(table.job_title_header(), DEFAULT_JOB_TITLE);
        table.save().unwrap();

        let table = XlsxTable::open(&path, "Feuille1").unwrap();
        assert_eq!(table.sheet_name(), "Feuille1");
    }

    #[tokio::test]
    async fn test_add_and_delete_commands() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");

        cmd_add(&path, "Feuille1", vec!["Acme SA".into(), " ".into(), "Globex".into()])
            .await
            .unwrap();
        cmd_delete(&path, "Feuille1", 2).await.unwrap();

        let table = XlsxTable::open(&path, "Feuille1").unwrap();
        let rows = table.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company_name, "Globex");
        assert!(cmd_delete(&path, "Feuille1", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_export_csv_command() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        cmd_add(&path, "Feuille1", vec!["Acme SA".into()]).await.unwrap();

        let output = dir.path().join("out.xlsx");
        cmd_export(&path, "Feuille1", Some(output), true).await.unwrap();

        let text = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(text, "entreprise,Responsable HSE\nAcme SA,\n");
    }
}
