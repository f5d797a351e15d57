//! ランタイム状態管理（Application層）
//!
//! トグルキーによる有効/無効・マウス押下状態・終了フラグを管理します。
//! `Arc<AtomicBool>`を使用したロックフリー設計により、
//! 読み取り側スレッド（リーダー/スケジューラ）は数CPUサイクルで状態を確認できます。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// ランタイム状態（スレッド間で共有、ロックフリー）
///
/// 各フィールドは「書き込み側が常に1スレッド」の規約で運用する:
/// - `enabled`: キーボードリーダーのみ
/// - `mouse_held`: マウスリーダーのみ
/// - `pending_first_release`: マウスリーダー（セット）とスケジューラ（クリア）
/// - `running`: コーディネータ（通常終了）および致命条件を検知した任意のスレッド
///
/// # メモリオーダー
/// Relaxed - 厳密な順序保証は不要（1tick以内の古い値は無害）
#[derive(Clone)]
pub struct RuntimeState {
    /// 連射の有効/無効（トグルキーで切り替え）
    enabled: Arc<AtomicBool>,
    /// 物理マウス左ボタンの押下状態
    mouse_held: Arc<AtomicBool>,
    /// 実押下直後の初回release送出待ちフラグ
    pending_first_release: Arc<AtomicBool>,
    /// プロセス全体の動作継続フラグ
    running: Arc<AtomicBool>,
}

impl RuntimeState {
    /// 新しいRuntimeStateを作成（連射は無効、プロセスは稼働状態で開始）
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(false)),
            mouse_held: Arc::new(AtomicBool::new(false)),
            pending_first_release: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    // ===== 高速読み取り =====

    /// 連射が有効かどうか（ロックフリー）
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// マウス左ボタンが押下中かどうか（ロックフリー）
    #[inline]
    pub fn is_mouse_held(&self) -> bool {
        self.mouse_held.load(Ordering::Relaxed)
    }

    /// 初回release送出が保留中かどうか
    #[inline]
    pub fn is_first_release_pending(&self) -> bool {
        self.pending_first_release.load(Ordering::Relaxed)
    }

    /// プロセスが稼働中かどうか（全ループが毎tickポーリングする）
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    // ===== 書き込み（フィールドごとに単一スレッド） =====

    /// 有効/無効をトグル（新しい状態を返す）- キーボードリーダー用
    pub fn toggle_enabled(&self) -> bool {
        let new_value = !self.enabled.load(Ordering::Relaxed);
        self.enabled.store(new_value, Ordering::Relaxed);
        new_value
    }

    /// マウス押下状態を設定 - マウスリーダー用
    pub fn set_mouse_held(&self, held: bool) {
        self.mouse_held.store(held, Ordering::Relaxed);
    }

    /// 初回release保留をセット - マウスリーダー用（押下遷移時）
    pub fn arm_first_release(&self) {
        self.pending_first_release.store(true, Ordering::Relaxed);
    }

    /// 初回release保留をクリア - スケジューラ用
    pub fn clear_first_release(&self) {
        self.pending_first_release.store(false, Ordering::Relaxed);
    }

    /// 停止を要求する（協調的キャンセル。強制割り込みはしない）
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}
