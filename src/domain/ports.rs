/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。
use crate::domain::{ClickerResult, InputEvent};

/// イベントソースポート: 非ブロッキング入力イベント読み取りを抽象化
///
/// 「非ブロッキングソースから離散的な状態変化イベントの遅延・無限・
/// 再起動不可シーケンスを生成する」能力を表す。キーボードリーダーと
/// マウスリーダーが同一traitの別インスタンスとして動く。
pub trait EventSourcePort: Send {
    /// 次のイベントを1件取り出す（非ブロッキング）
    ///
    /// # Returns
    /// - `Ok(Some(InputEvent))`: イベントあり
    /// - `Ok(None)`: イベントなし（エラーではない。呼び出し側はtick分yieldする）
    /// - `Err(ClickerError)`: 読み取りエラー（当該リーダー内で処理し、他スレッドへ波及させない）
    fn poll_event(&mut self) -> ClickerResult<Option<InputEvent>>;
}

/// クリックエミッタポート: 仮想デバイスへのボタン送出を抽象化
///
/// 1回の論理press/releaseは「ボタンイベント + 同期イベント」の
/// 順序対として送出される（入力スタック側の要件）。
pub trait ClickEmitterPort: Send {
    /// 左ボタンの状態変化を送出する
    ///
    /// # Arguments
    /// - `pressed`: true = press, false = release
    ///
    /// # Returns
    /// - `Ok(())`: 送出成功
    /// - `Err(ClickerError::Emission)`: 書き込み失敗（呼び出し側はログのみで継続）
    fn emit_button(&mut self, pressed: bool) -> ClickerResult<()>;
}
