//! 時刻ユーティリティ（Application層）
//!
//! クリック間隔の計時には単調クロックを使用する。壁時計（gettimeofday等）は
//! NTP調整で逆行し、クリック周期を破壊するため使わない。

use std::time::Instant;

/// プロセスローカルな単調ミリ秒クロック
///
/// エポックは生成時点。`now_ms()`は決して逆行しない。
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// エポックからの経過ミリ秒
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
