//! コーディネータ（ライフサイクル制御）
//!
//! リーダー2本とクリッカーの計3スレッドを起動し、メインスレッドで
//! ステータスループを回します。停止は単一のrunningフラグを全ループが
//! 協調的にポーリングする方式で、強制割り込みは行いません。
//! 仮想デバイスの破棄は全スレッドのjoin後に行われます（破棄済み
//! デバイスへの送出を防ぐため）。

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};

use crate::application::runtime_state::RuntimeState;
use crate::application::scheduler::{clicker_thread, ClickPlanner};
use crate::application::stats::ClickStats;
use crate::application::threads::{keyboard_thread, mouse_thread, StatusEvent};
use crate::domain::{AppConfig, ClickEmitterPort, ClickerResult, EventSourcePort};
use crate::infrastructure::console;

/// ステータス通知チャネルの容量
///
/// 満杯時は送信側が破棄する（ホットループを決してブロックしない）
const STATUS_CHANNEL_CAPACITY: usize = 32;

/// クリッカー実行コンテキスト
///
/// 所有権でティアダウン順序を表現する: エミッタはクリッカースレッドに
/// move され、スレッド終了時（= join完了前）にDropで破棄される。
/// マウスソースがNoneの場合はマウスリーダーを起動しない
/// （トグルは機能するが、スケジューラはmouse_held=trueを観測しない）。
pub struct ClickerRunner<K, M, E>
where
    K: EventSourcePort + 'static,
    M: EventSourcePort + 'static,
    E: ClickEmitterPort + 'static,
{
    keyboard: K,
    mouse: Option<M>,
    emitter: E,
    config: AppConfig,
    runtime_state: RuntimeState,
}

impl<K, M, E> ClickerRunner<K, M, E>
where
    K: EventSourcePort + 'static,
    M: EventSourcePort + 'static,
    E: ClickEmitterPort + 'static,
{
    pub fn new(keyboard: K, mouse: Option<M>, emitter: E, config: AppConfig) -> Self {
        Self {
            keyboard,
            mouse,
            emitter,
            config,
            runtime_state: RuntimeState::new(),
        }
    }

    /// 共有状態のハンドルを取得（テスト・外部からの停止要求用）
    pub fn runtime_state(&self) -> RuntimeState {
        self.runtime_state.clone()
    }

    /// 全スレッドを起動し、running=falseになるまでブロックする
    pub fn run(self) -> ClickerResult<()> {
        let tick = self.config.clicker.tick_interval();
        let (status_tx, status_rx) = bounded::<StatusEvent>(STATUS_CHANNEL_CAPACITY);

        tracing::info!("Starting clicker with 3-thread architecture...");
        tracing::info!("Threads: Keyboard reader / Mouse reader / Clicker");

        // Keyboard reader thread
        let keyboard_handle = {
            let state = self.runtime_state.clone();
            let tx = status_tx.clone();
            let source = self.keyboard;
            let toggle_key = self.config.input.toggle_key;
            let exit_key = self.config.input.exit_key;
            thread::spawn(move || {
                keyboard_thread(source, state, toggle_key, exit_key, tick, tx);
            })
        };

        // Mouse reader thread（デバイスが見つかった場合のみ）
        let mouse_handle = self.mouse.map(|source| {
            let state = self.runtime_state.clone();
            thread::spawn(move || {
                mouse_thread(source, state, tick);
            })
        });

        // Clicker thread（エミッタの所有権ごとmove。スレッド終了時にDropされる）
        let clicker_handle = {
            let state = self.runtime_state.clone();
            let tx = status_tx.clone();
            let planner = ClickPlanner::new(&self.config.clicker);
            let emitter = self.emitter;
            thread::spawn(move || {
                clicker_thread(emitter, planner, state, tick, tx);
            })
        };

        drop(status_tx);

        // ステータスループ（メインスレッド）
        Self::status_loop(
            status_rx,
            &self.runtime_state,
            ClickStats::new(self.config.stats.report_interval()),
            self.config.input.toggle_key,
            self.config.input.exit_key,
        );

        // 全スレッドのjoinを待ってから戻る。クリッカースレッドの終了とともに
        // エミッタ（= 仮想デバイス）が一度だけ破棄される
        let _ = keyboard_handle.join();
        if let Some(handle) = mouse_handle {
            let _ = handle.join();
        }
        let _ = clicker_handle.join();

        tracing::info!("All threads joined, device released");
        Ok(())
    }

    /// ステータスループ（統計管理とコンソール表示）
    ///
    /// コンソール描画はここでのみ行い、コアループを遅延させない。
    fn status_loop(
        status_rx: Receiver<StatusEvent>,
        runtime_state: &RuntimeState,
        mut stats: ClickStats,
        toggle_key: u16,
        exit_key: u16,
    ) {
        let poll_interval = Duration::from_millis(10);

        console::render_banner(false, toggle_key, exit_key);

        while runtime_state.is_running() {
            match status_rx.recv_timeout(poll_interval) {
                Ok(StatusEvent::Toggled(enabled)) => {
                    console::render_banner(enabled, toggle_key, exit_key);
                }
                Ok(StatusEvent::Clicked) => {
                    stats.record_click();
                }
                Ok(StatusEvent::EmissionDropped) => {
                    stats.record_dropped();
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    // タイムアウト - runningの確認を続行
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    // 全送信側が終了した
                    break;
                }
            }

            if stats.should_report() {
                stats.report();
            }
        }
    }
}
