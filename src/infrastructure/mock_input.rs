//! モック入力アダプタ
//!
//! テスト・開発用のイベントソース/エミッタモック実装。
//! 実デバイスなしで状態機械とスレッド協調を検証するために使う。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::domain::{ClickEmitterPort, ClickerError, ClickerResult, EventSourcePort, InputEvent};

/// スクリプト済みイベントソース
///
/// 各イベントに遅延時刻を持ち、到達前はイベントなし（Ok(None)）を返す。
pub struct MockEventSource {
    /// (発火時刻, イベント) のキュー。時刻昇順であること
    script: VecDeque<(Instant, InputEvent)>,
}

impl MockEventSource {
    pub fn new(script: Vec<(Instant, InputEvent)>) -> Self {
        Self {
            script: script.into(),
        }
    }

}

impl EventSourcePort for MockEventSource {
    fn poll_event(&mut self) -> ClickerResult<Option<InputEvent>> {
        match self.script.front() {
            Some(&(at, ev)) if Instant::now() >= at => {
                self.script.pop_front();
                Ok(Some(ev))
            }
            _ => Ok(None),
        }
    }
}

/// 記録専用エミッタ
///
/// 送出された(時刻, press/release)を共有バッファへ記録する。
/// Dropで破棄カウンタを加算するため、デバイス破棄が1回だけ
/// 起こることを検証できる。`fail_next`で一時的な書き込み失敗を
/// 注入できる（失敗分は記録されない）。
pub struct MockEmitter {
    emissions: Arc<Mutex<Vec<(Instant, bool)>>>,
    destroy_count: Arc<AtomicUsize>,
    fail_budget: Arc<AtomicUsize>,
}

impl MockEmitter {
    pub fn new() -> (Self, EmitterProbe) {
        let emissions = Arc::new(Mutex::new(Vec::new()));
        let destroy_count = Arc::new(AtomicUsize::new(0));
        let fail_budget = Arc::new(AtomicUsize::new(0));

        let probe = EmitterProbe {
            emissions: emissions.clone(),
            destroy_count: destroy_count.clone(),
            fail_budget: fail_budget.clone(),
        };

        (
            Self {
                emissions,
                destroy_count,
                fail_budget,
            },
            probe,
        )
    }
}

impl ClickEmitterPort for MockEmitter {
    fn emit_button(&mut self, pressed: bool) -> ClickerResult<()> {
        if self.fail_budget.load(Ordering::SeqCst) > 0 {
            self.fail_budget.fetch_sub(1, Ordering::SeqCst);
            return Err(ClickerError::Emission("injected write failure".to_string()));
        }

        self.emissions
            .lock()
            .expect("emission log poisoned")
            .push((Instant::now(), pressed));
        Ok(())
    }
}

impl Drop for MockEmitter {
    fn drop(&mut self) {
        self.destroy_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// エミッタの観測ハンドル
///
/// エミッタ本体がクリッカースレッドへmoveされた後も記録を読める。
#[derive(Clone)]
pub struct EmitterProbe {
    emissions: Arc<Mutex<Vec<(Instant, bool)>>>,
    destroy_count: Arc<AtomicUsize>,
    fail_budget: Arc<AtomicUsize>,
}

impl EmitterProbe {
    pub fn emissions(&self) -> Vec<(Instant, bool)> {
        self.emissions.lock().expect("emission log poisoned").clone()
    }

    pub fn destroy_count(&self) -> usize {
        self.destroy_count.load(Ordering::SeqCst)
    }

    /// 次のn回の送出を失敗させる
    pub fn fail_next(&self, n: usize) {
        self.fail_budget.store(n, Ordering::SeqCst);
    }
}
