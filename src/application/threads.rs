//! リーダースレッド実装
//!
//! キーボードリーダーとマウスリーダーのループ、およびステータスループへの
//! 通知チャネルを定義します。どちらのリーダーもブロックせず、イベントなしは
//! エラーではなくtick分yieldします。

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};

use crate::application::runtime_state::RuntimeState;
use crate::domain::{EventSourcePort, SourceKind};

/// BTN_LEFTのevdevキーコード
pub const BTN_LEFT_CODE: u16 = 0x110;

/// ステータスループへの通知イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// 連射の有効/無効が切り替わった（新しい状態）
    Toggled(bool),
    /// 合成クリックを1回送出した
    Clicked,
    /// 送出が1回失敗した（一時的エラー）
    EmissionDropped,
}

/// キーボードリーダースレッドのメインループ
///
/// トグルキーの押下エッジ（value 0→1のみ。repeat=2は無視）で
/// enabledを反転し、終了キーの押下でrunningを落とす。
pub fn keyboard_thread<S: EventSourcePort>(
    mut source: S,
    runtime_state: RuntimeState,
    toggle_key: u16,
    exit_key: u16,
    tick_interval: Duration,
    status_tx: Sender<StatusEvent>,
) {
    tracing::info!(toggle_key, exit_key, "Keyboard reader thread started");

    while runtime_state.is_running() {
        match source.poll_event() {
            Ok(Some(ev)) => {
                debug_assert_eq!(ev.source, SourceKind::Keyboard);

                if ev.code == toggle_key && ev.is_press() {
                    let new_state = runtime_state.toggle_enabled();
                    tracing::info!("Clicker {}", if new_state { "ENABLED" } else { "DISABLED" });
                    send_latest_only(&status_tx, StatusEvent::Toggled(new_state));
                } else if ev.code == exit_key && ev.is_press() {
                    tracing::info!("Exit key pressed, shutting down");
                    runtime_state.request_stop();
                }
                // 他のキーは無視。イベントが続く限り連続で読み切る
            }
            Ok(None) => {
                thread::sleep(tick_interval);
            }
            Err(e) => {
                // リーダー内で完結させ、他スレッドへ波及させない
                tracing::warn!("Keyboard read error: {:?}", e);
                thread::sleep(tick_interval);
            }
        }
    }

    tracing::info!("Keyboard reader thread stopped");
}

/// マウスリーダースレッドのメインループ
///
/// BTN_LEFTの値遷移をmouse_heldの正とする（value!=0 → held、value==0 → 非held）。
/// held遷移時にpending_first_releaseをセットする。再押下のたびにセットされる
/// ため、スケジューラは必ずArmedFirstReleaseを経由して連射に戻る。
pub fn mouse_thread<S: EventSourcePort>(
    mut source: S,
    runtime_state: RuntimeState,
    tick_interval: Duration,
) {
    tracing::info!("Mouse reader thread started");

    while runtime_state.is_running() {
        match source.poll_event() {
            Ok(Some(ev)) => {
                debug_assert_eq!(ev.source, SourceKind::Mouse);

                if ev.code == BTN_LEFT_CODE {
                    if ev.value != 0 {
                        runtime_state.arm_first_release();
                        runtime_state.set_mouse_held(true);
                    } else {
                        runtime_state.set_mouse_held(false);
                    }
                }
            }
            Ok(None) => {
                thread::sleep(tick_interval);
            }
            Err(e) => {
                tracing::warn!("Mouse read error: {:?}", e);
                thread::sleep(tick_interval);
            }
        }
    }

    tracing::info!("Mouse reader thread stopped");
}

/// 最新のみ上書きポリシーで送信
///
/// boundedキューが満杯でも送信側は決してブロックしない。
/// ステータス表示は落ちても害がないため単に無視する。
pub fn send_latest_only<T>(tx: &Sender<T>, value: T) {
    match tx.try_send(value) {
        Ok(_) => {}
        Err(TrySendError::Full(_)) => {
            // キューが満杯 - ステータスイベントは破棄してよい
        }
        Err(TrySendError::Disconnected(_)) => {
            // Channel closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClickerResult, InputEvent};
    use crossbeam_channel::bounded;
    use std::collections::VecDeque;

    /// 手書きのスクリプト済みイベントソース
    struct ScriptedSource {
        events: VecDeque<InputEvent>,
        /// 空になったらrunningを落とす（テストのループ終了用）
        state: RuntimeState,
    }

    impl EventSourcePort for ScriptedSource {
        fn poll_event(&mut self) -> ClickerResult<Option<InputEvent>> {
            match self.events.pop_front() {
                Some(ev) => Ok(Some(ev)),
                None => {
                    self.state.request_stop();
                    Ok(None)
                }
            }
        }
    }

    fn kb_event(code: u16, value: i32) -> InputEvent {
        InputEvent::new(SourceKind::Keyboard, code, value)
    }

    fn mouse_event(code: u16, value: i32) -> InputEvent {
        InputEvent::new(SourceKind::Mouse, code, value)
    }

    const TOGGLE: u16 = 41;
    const EXIT: u16 = 1;
    const TICK: Duration = Duration::from_millis(1);

    fn run_keyboard(events: Vec<InputEvent>) -> (RuntimeState, Vec<StatusEvent>) {
        let state = RuntimeState::new();
        let source = ScriptedSource {
            events: events.into(),
            state: state.clone(),
        };
        let (tx, rx) = bounded(32);

        keyboard_thread(source, state.clone(), TOGGLE, EXIT, TICK, tx);

        (state, rx.try_iter().collect())
    }

    #[test]
    fn test_toggle_is_edge_triggered() {
        // 押しっぱなし（press + repeats + release）では1回しか反転しない
        let (state, events) = run_keyboard(vec![
            kb_event(TOGGLE, 1),
            kb_event(TOGGLE, 2),
            kb_event(TOGGLE, 2),
            kb_event(TOGGLE, 0),
        ]);

        assert!(state.is_enabled());
        assert_eq!(events, vec![StatusEvent::Toggled(true)]);
    }

    #[test]
    fn test_toggle_twice() {
        let (state, events) = run_keyboard(vec![
            kb_event(TOGGLE, 1),
            kb_event(TOGGLE, 0),
            kb_event(TOGGLE, 1),
            kb_event(TOGGLE, 0),
        ]);

        assert!(!state.is_enabled());
        assert_eq!(
            events,
            vec![StatusEvent::Toggled(true), StatusEvent::Toggled(false)]
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        let (state, events) = run_keyboard(vec![
            kb_event(30, 1), // KEY_A
            kb_event(30, 0),
            kb_event(57, 1), // KEY_SPACE
        ]);

        assert!(!state.is_enabled());
        assert!(events.is_empty());
    }

    #[test]
    fn test_exit_key_stops() {
        let (state, _) = run_keyboard(vec![kb_event(EXIT, 1)]);
        assert!(!state.is_running());
    }

    fn run_mouse(events: Vec<InputEvent>) -> RuntimeState {
        let state = RuntimeState::new();
        let source = ScriptedSource {
            events: events.into(),
            state: state.clone(),
        };

        mouse_thread(source, state.clone(), TICK);
        state
    }

    #[test]
    fn test_mouse_held_tracking() {
        let state = run_mouse(vec![mouse_event(BTN_LEFT_CODE, 1)]);
        assert!(state.is_mouse_held());
        assert!(state.is_first_release_pending());

        let state = run_mouse(vec![
            mouse_event(BTN_LEFT_CODE, 1),
            mouse_event(BTN_LEFT_CODE, 0),
        ]);
        assert!(!state.is_mouse_held());
    }

    #[test]
    fn test_mouse_repress_rearms_first_release() {
        // 押下 → スケジューラが保留を消費 → 解放 → 再押下、の一連で
        // 保留フラグが再セットされること（連射の暴走防止）
        let state = run_mouse(vec![mouse_event(BTN_LEFT_CODE, 1)]);
        assert!(state.is_first_release_pending());

        state.clear_first_release();

        let resumed = RuntimeState::new();
        let source = ScriptedSource {
            events: vec![
                mouse_event(BTN_LEFT_CODE, 0),
                mouse_event(BTN_LEFT_CODE, 1),
            ]
            .into(),
            state: resumed.clone(),
        };
        mouse_thread(source, resumed.clone(), TICK);

        assert!(resumed.is_mouse_held());
        assert!(resumed.is_first_release_pending());
    }

    #[test]
    fn test_mouse_other_buttons_ignored() {
        let state = run_mouse(vec![mouse_event(0x111, 1)]); // BTN_RIGHT
        assert!(!state.is_mouse_held());
        assert!(!state.is_first_release_pending());
    }

    #[test]
    fn test_send_latest_only_never_blocks() {
        let (tx, rx) = bounded::<i32>(1);

        send_latest_only(&tx, 1);
        // 満杯でもブロックせず、古い値が残る
        send_latest_only(&tx, 2);

        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(rx.try_recv().is_err());
    }
}
