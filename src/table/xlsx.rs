//! xlsx 테이블 (umya-spreadsheet)

use std::path::{Path, PathBuf};

use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::{Column, CompanyTable, TableError, COMPANY_HEADER, HEADER_ROW};

/// 엑셀 파일 한 시트를 테이블로 사용
pub struct XlsxTable {
    path: PathBuf,
    book: Spreadsheet,
    sheet_index: usize,
}

impl XlsxTable {
    /// 파일이 없으면 헤더(A1)만 있는 최소 파일 생성. 생성했으면 `true`
    pub fn ensure_exists(path: &Path, sheet_name: &str) -> Result<bool, TableError> {
        if path.is_file() {
            return Ok(false);
        }

        let create_error = |message: String| TableError::Create {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| create_error(e.to_string()))?;
        }

        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| create_error("기본 시트 없음".to_string()))?;
        sheet.set_name(sheet_name);
        sheet
            .get_cell_mut((Column::Company.index(), HEADER_ROW))
            .set_value(COMPANY_HEADER);

        umya_spreadsheet::writer::xlsx::write(&book, path)
            .map_err(|e| create_error(e.to_string()))?;

        tracing::info!("Created workbook {:?} (sheet {})", path, sheet_name);
        Ok(true)
    }

    /// 파일 열기. 시트 이름이 없으면 첫 시트 사용
    pub fn open(path: &Path, sheet_name: &str) -> Result<Self, TableError> {
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| TableError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let sheet_index = book
            .get_sheet_collection()
            .iter()
            .position(|sheet| sheet.get_name() == sheet_name);

        let sheet_index = match sheet_index {
            Some(index) => index,
            None if book.get_sheet_collection().is_empty() => {
                return Err(TableError::Read {
                    path: path.to_path_buf(),
                    message: "시트가 없습니다".to_string(),
                });
            }
            None => {
                tracing::warn!("Sheet {:?} not found in {:?}, using first sheet", sheet_name, path);
                0
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            book,
            sheet_index,
        })
    }

    /// 없으면 생성 후 열기
    pub fn open_or_create(path: &Path, sheet_name: &str) -> Result<Self, TableError> {
        Self::ensure_exists(path, sheet_name)?;
        Self::open(path, sheet_name)
    }

    /// 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 시트 이름
    pub fn sheet_name(&self) -> String {
        self.sheet()
            .map(|sheet| sheet.get_name().to_string())
            .unwrap_or_default()
    }

    /// 현재 시트 이름 변경 (요청한 시트가 없을 때 편집 명령에서 사용)
    pub fn rename_sheet(&mut self, name: &str) {
        if let Some(sheet) = self.sheet_mut() {
            sheet.set_name(name);
        }
    }

    fn sheet(&self) -> Option<&Worksheet> {
        self.book.get_sheet(&self.sheet_index)
    }

    fn sheet_mut(&mut self) -> Option<&mut Worksheet> {
        self.book.get_sheet_mut(&self.sheet_index)
    }
}

impl CompanyTable for XlsxTable {
    fn cell(&self, row: u32, column: Column) -> String {
        self.sheet()
            .map(|sheet| sheet.get_value((column.index(), row)))
            .unwrap_or_default()
    }

    fn set_cell(&mut self, row: u32, column: Column, value: &str) {
        if let Some(sheet) = self.sheet_mut() {
            sheet.get_cell_mut((column.index(), row)).set_value(value);
        }
    }

    fn last_row(&self) -> u32 {
        self.sheet()
            .map(|sheet| sheet.get_highest_row())
            .unwrap_or(HEADER_ROW)
            .max(HEADER_ROW)
    }

    fn save(&mut self) -> Result<(), TableError> {
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|e| {
            TableError::Write {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
