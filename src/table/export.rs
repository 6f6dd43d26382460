//! 내보내기 - 작업 파일 사본 (xlsx) 또는 CSV

use std::path::{Path, PathBuf};

use regex::Regex;

use super::{CompanyTable, TableError, COMPANY_HEADER};

const MAX_FILENAME_CHARS: usize = 120;

/// 파일 이름에 쓸 수 없는 문자를 `_`로 치환 (최대 120자)
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();

    let cleaned = if let Ok(re) = Regex::new(r#"[\\/:*?"<>|]+"#) {
        re.replace_all(name, "_").into_owned()
    } else {
        name.replace(|c: char| r#"\/:*?"<>|"#.contains(c), "_")
    };

    cleaned.chars().take(MAX_FILENAME_CHARS).collect()
}

/// 기본 내보내기 경로: 홈 폴더/<직무명>.xlsx
pub fn default_export_path(job_title: &str) -> PathBuf {
    let dir = dirs::home_dir()
        .filter(|d| d.is_dir())
        .unwrap_or_else(|| crate::settings::get().app_dir.clone());
    dir.join(format!("{}.xlsx", sanitize_filename(job_title)))
}

/// 확장자를 `.xlsx`로 강제
fn with_xlsx_extension(path: &Path) -> PathBuf {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);

    if is_xlsx {
        path.to_path_buf()
    } else {
        path.with_extension("xlsx")
    }
}

/// 작업 파일 사본 생성. 실제 저장 경로 반환
pub fn export_copy(source: &Path, destination: &Path) -> Result<PathBuf, TableError> {
    let destination = with_xlsx_extension(destination);

    std::fs::copy(source, &destination).map_err(|e| TableError::Export {
        path: destination.clone(),
        source: e,
    })?;

    tracing::info!("Exported {:?} -> {:?}", source, destination);
    Ok(destination)
}

/// CSV로 내보내기 (헤더 행 + 데이터 행). 기록한 데이터 행 수 반환
pub fn export_csv<T: CompanyTable + ?Sized>(
    table: &T,
    destination: &Path,
) -> Result<usize, TableError> {
    let mut writer = csv::Writer::from_path(destination)?;

    writer.write_record([COMPANY_HEADER, table.job_title_header().as_str()])?;

    let rows = table.rows();
    for row in &rows {
        writer.write_record([
            row.company_name.as_str(),
            row.result_url.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush().map_err(|e| TableError::Export {
        path: destination.to_path_buf(),
        source: e,
    })?;

    Ok(rows.len())
}
