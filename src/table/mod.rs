//! 회사 테이블 모듈 - 입력(회사명)이자 출력(URL)인 스프레드시트
//!
//! - 1행: 헤더 (A1 = `entreprise`, B1 = 직무명)
//! - 2행부터: A = 회사명, B = 찾은 URL
//!
//! 배치 실행기는 `CompanyTable` 트레이트만 사용합니다.

mod export;
mod xlsx;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub use export::{default_export_path, export_copy, export_csv, sanitize_filename};
pub use xlsx::XlsxTable;

/// A1 고정 헤더
pub const COMPANY_HEADER: &str = "entreprise";

/// 헤더 행 번호
pub const HEADER_ROW: u32 = 1;

/// 첫 데이터 행 번호
pub const FIRST_DATA_ROW: u32 = 2;

// ============================================================================
// Types
// ============================================================================

/// 테이블 열
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// A열: 회사명
    Company,
    /// B열: 결과 URL
    Result,
}

impl Column {
    /// 1부터 시작하는 열 번호
    pub fn index(self) -> u32 {
        match self {
            Column::Company => 1,
            Column::Result => 2,
        }
    }

    /// 열 문자 (A, B)
    pub fn letter(self) -> char {
        match self {
            Column::Company => 'A',
            Column::Result => 'B',
        }
    }
}

/// 회사 행 (행 번호가 식별자)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRow {
    /// 시트 행 번호 (헤더 제외, 2부터)
    pub row: u32,
    pub company_name: String,
    pub result_url: Option<String>,
}

/// 테이블 에러
#[derive(Debug, Error)]
pub enum TableError {
    #[error("엑셀 파일 읽기 실패 ({path}): {message}")]
    Read { path: PathBuf, message: String },

    #[error("엑셀 파일 저장 실패 ({path}): {message}")]
    Write { path: PathBuf, message: String },

    #[error("엑셀 파일 생성 실패 ({path}): {message}")]
    Create { path: PathBuf, message: String },

    #[error("내보내기 실패 ({path}): {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 작성 실패: {0}")]
    Csv(#[from] csv::Error),

    #[error("존재하지 않는 데이터 행: {0}")]
    RowOutOfRange(u32),
}

// ============================================================================
// CompanyTable
// ============================================================================

/// 회사 목록 테이블
///
/// 구현체는 셀 읽기/쓰기와 저장만 제공하고, 나머지는 기본 구현을 사용합니다.
pub trait CompanyTable {
    /// 셀 값 (없으면 빈 문자열)
    fn cell(&self, row: u32, column: Column) -> String;

    /// 셀 값 쓰기
    fn set_cell(&mut self, row: u32, column: Column, value: &str);

    /// 데이터가 있는 마지막 행 번호 (헤더만 있으면 1)
    fn last_row(&self) -> u32;

    /// 저장 (닫지 않음)
    fn save(&mut self) -> Result<(), TableError>;

    /// 회사명 (앞뒤 공백 제거)
    fn company_name(&self, row: u32) -> String {
        self.cell(row, Column::Company).trim().to_string()
    }

    /// 결과 URL
    fn result_url(&self, row: u32) -> Option<String> {
        let url = self.cell(row, Column::Result);
        let url = url.trim();
        (!url.is_empty()).then(|| url.to_string())
    }

    /// 결과 URL 기록
    fn set_result_url(&mut self, row: u32, url: &str) {
        self.set_cell(row, Column::Result, url);
    }

    /// 결과 열 헤더 (직무명)
    fn job_title_header(&self) -> String {
        self.cell(HEADER_ROW, Column::Result).trim().to_string()
    }

    /// 헤더 정규화: A1은 고정 문자열, B1은 직무명으로 항상 덮어씀
    fn normalize_headers(&mut self, job_title: &str) {
        let company_header = self.cell(HEADER_ROW, Column::Company);
        if company_header.trim().to_lowercase() != COMPANY_HEADER {
            self.set_cell(HEADER_ROW, Column::Company, COMPANY_HEADER);
        }
        self.set_cell(HEADER_ROW, Column::Result, job_title);
    }

    /// 회사명 또는 URL이 있는 데이터 행 목록
    fn rows(&self) -> Vec<CompanyRow> {
        (FIRST_DATA_ROW..=self.last_row())
            .map(|row| CompanyRow {
                row,
                company_name: self.company_name(row),
                result_url: self.result_url(row),
            })
            .filter(|r| !r.company_name.is_empty() || r.result_url.is_some())
            .collect()
    }

    /// 값이 있는 마지막 데이터 행 (없으면 헤더 행)
    fn last_filled_row(&self) -> u32 {
        (FIRST_DATA_ROW..=self.last_row())
            .rev()
            .find(|&row| {
                !self.cell(row, Column::Company).trim().is_empty()
                    || !self.cell(row, Column::Result).trim().is_empty()
            })
            .unwrap_or(HEADER_ROW)
    }

    /// 회사명 추가 (빈 줄 제외, 공백 제거). 추가된 개수 반환
    fn append_companies(&mut self, names: &[String]) -> usize {
        let mut row = self.last_filled_row();
        let mut added = 0;

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            row += 1;
            self.set_cell(row, Column::Company, name);
            self.set_cell(row, Column::Result, "");
            added += 1;
        }

        added
    }

    /// 데이터 행 삭제 (아래 행을 한 칸씩 올림)
    fn remove_row(&mut self, row: u32) -> Result<CompanyRow, TableError> {
        let last = self.last_row();
        if row < FIRST_DATA_ROW || row > last {
            return Err(TableError::RowOutOfRange(row));
        }

        let removed = CompanyRow {
            row,
            company_name: self.company_name(row),
            result_url: self.result_url(row),
        };

        for current in row..last {
            for column in [Column::Company, Column::Result] {
                let below = self.cell(current + 1, column);
                self.set_cell(current, column, &below);
            }
        }
        self.set_cell(last, Column::Company, "");
        self.set_cell(last, Column::Result, "");

        Ok(removed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTable;

    #[test]
    fn test_normalize_headers() {
        let mut table = MemoryTable::from_rows(&[("Company", "old title")]);
        table.normalize_headers("Responsable HSE");
        assert_eq!(table.cell(1, Column::Company), COMPANY_HEADER);
        assert_eq!(table.cell(1, Column::Result), "Responsable HSE");

        // 대소문자/공백만 다른 헤더는 그대로 둠
        let mut table = MemoryTable::from_rows(&[(" Entreprise ", "")]);
        table.normalize_headers("QSE");
        assert_eq!(table.cell(1, Column::Company), " Entreprise ");
        assert_eq!(table.job_title_header(), "QSE");
    }

    #[test]
    fn test_rows_skip_blank() {
        let table = MemoryTable::from_rows(&[
            ("entreprise", "HSE"),
            ("Acme SA", ""),
            ("  ", ""),
            ("Globex", "https://www.linkedin.com/in/x"),
        ]);
        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[1].row, 4);
        assert_eq!(
            rows[1].result_url.as_deref(),
            Some("https://www.linkedin.com/in/x")
        );
    }

    #[test]
    fn test_append_after_last_filled_row() {
        let mut table = MemoryTable::from_rows(&[("entreprise", ""), ("Acme", ""), ("", "")]);
        let added = table.append_companies(&[
            " Globex ".to_string(),
            "".to_string(),
            "Initech".to_string(),
        ]);
        assert_eq!(added, 2);
        assert_eq!(table.company_name(3), "Globex");
        assert_eq!(table.company_name(4), "Initech");
    }

    #[test]
    fn test_remove_row_shifts_up() {
        let mut table = MemoryTable::from_rows(&[
            ("entreprise", ""),
            ("Acme", "https://www.linkedin.com/in/a"),
            ("Globex", ""),
            ("Initech", "https://www.linkedin.com/in/i"),
        ]);

        let removed = table.remove_row(2).unwrap();
        assert_eq!(removed.company_name, "Acme");
        assert_eq!(table.company_name(2), "Globex");
        assert_eq!(table.company_name(3), "Initech");
        assert_eq!(table.result_url(3).as_deref(), Some("https://www.linkedin.com/in/i"));
        assert_eq!(table.company_name(4), "");
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn test_remove_header_rejected() {
        let mut table = MemoryTable::from_rows(&[("entreprise", ""), ("Acme", "")]);
        assert!(matches!(table.remove_row(1), Err(TableError::RowOutOfRange(1))));
        assert!(matches!(table.remove_row(9), Err(TableError::RowOutOfRange(9))));
    }
}
