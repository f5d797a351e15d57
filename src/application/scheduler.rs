//! クリックスケジューラ（コア状態機械）
//!
//! 毎tick、共有フラグから状態を再導出し、クリック送出を決定します。
//!
//! # 状態
//! - `Idle`: 無効またはマウス非押下。待機のみ
//! - `ArmedFirstRelease`: 有効+押下+初回release保留。即座にreleaseを送出
//!   （OS側にまだ実クリックが登録されている間に合成pressを重ねて
//!   二重クリックになるのを防ぐ）
//! - `Clicking`: 抽選した間隔が経過するたびにpress→hold→releaseを送出
//!
//! 再押下時はマウスリーダーが保留フラグを再セットするため、必ず
//! `ArmedFirstRelease`を経由して戻る。

use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::application::runtime_state::RuntimeState;
use crate::application::threads::{send_latest_only, StatusEvent};
use crate::application::timing::MonotonicClock;
use crate::domain::{ClickEmitterPort, ClickerConfig, MillisRange, SchedulerPhase};

/// 1tick分の決定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// 条件未成立。1tick待つ
    Wait,
    /// 初回releaseを送出し、整定時間だけ待ってClickingへ
    FirstRelease { settle: Duration },
    /// pressを送出し、hold経過後にreleaseを送出する
    Click { hold: Duration },
}

/// クリック計画器
///
/// ClickTiming（最終クリック時刻・抽選レンジ）を排他的に所有する。
/// 決定ロジックを送出ループから分離してあるため、実デバイスなしで
/// 状態機械の性質を検証できる。
pub struct ClickPlanner {
    clock: MonotonicClock,
    hold_range: MillisRange,
    delay_range: MillisRange,
    first_release_settle: Duration,
    damping: bool,
    /// 最後にpressを送出した時刻（ミリ秒、単調クロック基準）
    last_click_at_ms: u64,
    rng: StdRng,
}

impl ClickPlanner {
    pub fn new(config: &ClickerConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// 乱数シードを固定して作成（タイミング検証テスト用）
    pub fn with_seed(config: &ClickerConfig, seed: u64) -> Self {
        Self {
            clock: MonotonicClock::new(),
            hold_range: config.hold_range(),
            delay_range: config.delay_range(),
            first_release_settle: config.first_release_settle(),
            damping: config.first_release_damping,
            last_click_at_ms: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 観測フラグから現在の状態を導出する
    pub fn phase(&self, enabled: bool, mouse_held: bool, pending_first_release: bool) -> SchedulerPhase {
        if !enabled || !mouse_held {
            SchedulerPhase::Idle
        } else if self.damping && pending_first_release {
            SchedulerPhase::ArmedFirstRelease
        } else {
            SchedulerPhase::Clicking
        }
    }

    /// 1tick分の決定を行う
    ///
    /// `Idle`と`ArmedFirstRelease`では決してpressを決定しない。
    /// `Clicking`でのクリック間隔は決定のたびに新しく抽選する。
    pub fn decide(
        &mut self,
        enabled: bool,
        mouse_held: bool,
        pending_first_release: bool,
    ) -> ClickAction {
        match self.phase(enabled, mouse_held, pending_first_release) {
            SchedulerPhase::Idle => ClickAction::Wait,
            SchedulerPhase::ArmedFirstRelease => ClickAction::FirstRelease {
                settle: self.first_release_settle,
            },
            SchedulerPhase::Clicking => {
                let now = self.clock.now_ms();
                let delay = self.delay_range.sample(&mut self.rng);

                if now.saturating_sub(self.last_click_at_ms) >= delay {
                    self.last_click_at_ms = now;
                    let hold = self.hold_range.sample(&mut self.rng);
                    ClickAction::Click {
                        hold: Duration::from_millis(hold),
                    }
                } else {
                    ClickAction::Wait
                }
            }
        }
    }

    /// 初回releaseの整定完了を記録する
    ///
    /// ここを間隔計時の起点にすることで、初回pressは
    /// 「release + 整定時間 + クリック間隔」より前に出ない。
    pub fn note_first_release_done(&mut self) {
        self.last_click_at_ms = self.clock.now_ms();
    }
}

/// クリック送出スレッドのメインループ
///
/// running=falseを観測するまで毎tick決定・送出を繰り返す。
/// 送出失敗は一時的エラーとして記録し、状態は変更せず次のtickへ進む。
/// 強制終了時にhold途中のpressが残る可能性は許容する
/// （仮想デバイス破棄が暗黙にreleaseする）。
pub fn clicker_thread<E: ClickEmitterPort>(
    mut emitter: E,
    mut planner: ClickPlanner,
    runtime_state: RuntimeState,
    tick_interval: Duration,
    status_tx: Sender<StatusEvent>,
) {
    tracing::info!("Clicker thread started");

    while runtime_state.is_running() {
        let action = planner.decide(
            runtime_state.is_enabled(),
            runtime_state.is_mouse_held(),
            runtime_state.is_first_release_pending(),
        );

        match action {
            ClickAction::Wait => {
                thread::sleep(tick_interval);
            }
            ClickAction::FirstRelease { settle } => {
                // 実クリックの引っかかりを解消してから連射に入る
                if let Err(e) = emitter.emit_button(false) {
                    tracing::warn!("First release emission failed: {:?}", e);
                    send_latest_only(&status_tx, StatusEvent::EmissionDropped);
                }
                runtime_state.clear_first_release();
                thread::sleep(settle);
                planner.note_first_release_done();
            }
            ClickAction::Click { hold } => {
                match emitter.emit_button(true) {
                    Ok(()) => {
                        thread::sleep(hold);
                        if let Err(e) = emitter.emit_button(false) {
                            tracing::warn!("Release emission failed: {:?}", e);
                            send_latest_only(&status_tx, StatusEvent::EmissionDropped);
                        }
                        send_latest_only(&status_tx, StatusEvent::Clicked);
                    }
                    Err(e) => {
                        // 1回の失敗でスケジューラを止めない
                        tracing::warn!("Press emission failed: {:?}", e);
                        send_latest_only(&status_tx, StatusEvent::EmissionDropped);
                        thread::sleep(tick_interval);
                    }
                }
            }
        }
    }

    tracing::info!("Clicker thread stopped");
}
