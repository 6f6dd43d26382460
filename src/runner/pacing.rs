//! 사람처럼 보이도록 하는 대기 시간

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;

use crate::settings::RunConfig;

/// 행 사이 기본 대기 (창 숨김)
const HEADLESS_ROW_BASE: Duration = Duration::from_millis(1200);
/// 행 사이 기본 대기 (창 표시)
const VISIBLE_ROW_BASE: Duration = Duration::from_millis(700);
/// 행 사이 추가 무작위 대기 (초)
const ROW_JITTER_SECS: Range<f64> = 0.2..0.9;
/// 동의 버튼 클릭 후 짧은 대기 (초)
const SHORT_PAUSE_SECS: Range<f64> = 0.3..0.8;

/// 대기 정책
#[derive(Debug)]
pub struct Pacer {
    /// 행 사이 기본 대기 (`None`이면 빠른 모드)
    row_base: Option<Duration>,
    /// 기본 대기에 무작위 시간을 더할지
    jitter: bool,
    short_pauses: bool,
    /// 지금까지 행 사이에서 기다린 횟수
    row_waits: AtomicUsize,
}

impl Pacer {
    /// 실행 설정에 맞는 정책
    pub fn for_run(config: &RunConfig) -> Self {
        let row_base = if config.fast {
            None
        } else if config.headless {
            Some(HEADLESS_ROW_BASE)
        } else {
            Some(VISIBLE_ROW_BASE)
        };

        Self {
            row_base,
            jitter: true,
            short_pauses: true,
            row_waits: AtomicUsize::new(0),
        }
    }

    /// 모든 대기 생략
    pub fn instant() -> Self {
        Self {
            row_base: None,
            jitter: false,
            short_pauses: false,
            row_waits: AtomicUsize::new(0),
        }
    }

    /// 행 사이마다 정확히 `delay`만큼 대기 (무작위 없음, 짧은 대기 없음)
    pub fn fixed(delay: Duration) -> Self {
        Self {
            row_base: Some(delay),
            jitter: false,
            short_pauses: false,
            row_waits: AtomicUsize::new(0),
        }
    }

    /// 다음 행까지의 대기 시간 (빠른 모드면 `None`)
    pub fn row_delay(&self) -> Option<Duration> {
        self.row_base.map(|base| {
            if self.jitter {
                base + random_secs(ROW_JITTER_SECS)
            } else {
                base
            }
        })
    }

    /// 행 사이 대기
    pub fn wait_between_rows(&self) {
        if let Some(delay) = self.row_delay() {
            self.row_waits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Pacing {:?}", delay);
            std::thread::sleep(delay);
        }
    }

    /// 행 사이에서 실제로 기다린 횟수
    pub fn row_waits(&self) -> usize {
        self.row_waits.load(Ordering::Relaxed)
    }

    /// 클릭 직후 짧은 대기
    pub fn short_pause(&self) {
        if self.short_pauses {
            std::thread::sleep(random_secs(SHORT_PAUSE_SECS));
        }
    }
}

fn random_secs(range: Range<f64>) -> Duration {
    Duration::from_secs_f64(rand::thread_rng().gen_range(range))
}
