//! 統計情報管理モジュール
//!
//! 送出クリック数・CPS（clicks per second）・送出失敗数を収集し、
//! 一定間隔でログに出力します。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// クリック統計コレクター
#[derive(Debug)]
pub struct ClickStats {
    /// CPS計測用のクリックタイムスタンプ（最大1秒分保持）
    click_times: VecDeque<Instant>,
    /// 累計クリック数
    total_clicks: u64,
    /// 累計送出失敗数（EmissionTransient）
    dropped_emissions: u64,
    /// 最後の統計出力時刻
    last_report: Instant,
    /// 統計出力間隔
    report_interval: Duration,
}

impl ClickStats {
    /// CPS計算の時間窓（秒）
    const CPS_WINDOW_SECS: u64 = 1;

    pub fn new(report_interval: Duration) -> Self {
        Self {
            click_times: VecDeque::new(),
            total_clicks: 0,
            dropped_emissions: 0,
            last_report: Instant::now(),
            report_interval,
        }
    }

    /// クリック送出を記録（CPS計測用）
    pub fn record_click(&mut self) {
        let now = Instant::now();
        self.total_clicks += 1;
        self.click_times.push_back(now);

        // 時間窓より古いタイムスタンプを削除
        let window = Duration::from_secs(Self::CPS_WINDOW_SECS);
        while let Some(&front) = self.click_times.front() {
            if now.duration_since(front) > window {
                self.click_times.pop_front();
            } else {
                break;
            }
        }
    }

    /// 送出失敗を記録
    pub fn record_dropped(&mut self) {
        self.dropped_emissions += 1;
    }

    /// 直近1秒のクリック数
    pub fn cps(&self) -> usize {
        self.click_times.len()
    }

    pub fn total_clicks(&self) -> u64 {
        self.total_clicks
    }

    pub fn dropped_emissions(&self) -> u64 {
        self.dropped_emissions
    }

    /// 統計出力のタイミングか
    pub fn should_report(&self) -> bool {
        self.last_report.elapsed() >= self.report_interval
    }

    /// 統計をログ出力し、出力時刻をリセット
    pub fn report(&mut self) {
        tracing::info!(
            cps = self.cps(),
            total_clicks = self.total_clicks,
            dropped_emissions = self.dropped_emissions,
            "Click stats"
        );
        self.last_report = Instant::now();
    }
}
