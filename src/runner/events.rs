//! 실행기 → 화면 단방향 메시지 채널
//!
//! 로그 줄과 행 갱신 두 개의 무제한 큐를 사용합니다.
//! 수신 측은 주기적으로 `try_recv`로 비우며 절대 블로킹하지 않습니다.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::table::FIRST_DATA_ROW;

/// 행 갱신 이벤트 (URL을 찾은 행)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowUpdate {
    /// 시트 행 번호 (2부터)
    pub row: u32,
    pub url: String,
}

impl RowUpdate {
    /// 헤더를 제외한 0부터 시작하는 표 인덱스
    pub fn grid_index(&self) -> Option<usize> {
        self.row.checked_sub(FIRST_DATA_ROW).map(|i| i as usize)
    }
}

/// 작업 스레드 쪽 송신기
#[derive(Debug, Clone)]
pub struct RunReporter {
    logs: UnboundedSender<String>,
    updates: UnboundedSender<RowUpdate>,
}

/// 화면 쪽 수신기
#[derive(Debug)]
pub struct RunChannels {
    pub logs: UnboundedReceiver<String>,
    pub updates: UnboundedReceiver<RowUpdate>,
}

/// 채널 쌍 생성
pub fn channel() -> (RunReporter, RunChannels) {
    let (log_tx, log_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    (
        RunReporter {
            logs: log_tx,
            updates: update_tx,
        },
        RunChannels {
            logs: log_rx,
            updates: update_rx,
        },
    )
}

impl RunReporter {
    /// 로그 한 줄 전송 (BMP 밖 문자는 `?`, 줄바꿈 보장)
    ///
    /// 수신 측이 사라졌으면 조용히 버립니다.
    pub fn log(&self, message: impl AsRef<str>) {
        let mut line = strip_non_bmp(message.as_ref());
        if !line.ends_with('\n') {
            line.push('\n');
        }

        tracing::debug!(target: "linkscout::run", "{}", line.trim_end());
        let _ = self.logs.send(line);
    }

    /// 행 갱신 전송
    pub fn row_update(&self, row: u32, url: &str) {
        let _ = self.updates.send(RowUpdate {
            row,
            url: url.to_string(),
        });
    }
}

impl RunChannels {
    /// 대기 중인 로그 전부 꺼내기 (블로킹 없음)
    pub fn drain_logs(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.logs.try_recv().ok()).collect()
    }

    /// 대기 중인 행 갱신 전부 꺼내기 (블로킹 없음)
    pub fn drain_updates(&mut self) -> Vec<RowUpdate> {
        std::iter::from_fn(|| self.updates.try_recv().ok()).collect()
    }
}

/// U+FFFF를 넘는 문자(이모지 등)를 `?`로 치환
pub fn strip_non_bmp(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) > 0xFFFF { '?' } else { c })
        .collect()
}
