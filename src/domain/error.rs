/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 致命度をエラー型で表現（Startup = 起動中断 / Emission = 記録して継続 /
///   Discovery = 該当リーダーのみ無効化）
use thiserror::Error;

/// Domain層の統一エラー型
#[derive(Error, Debug)]
pub enum ClickerError {
    /// 起動時の致命的エラー
    ///
    /// 権限不足・仮想デバイス作成失敗・キーボードデバイス未検出など。
    /// スレッドを1本も起動する前にプロセス全体を中断する。
    #[error("Startup failed: {0}")]
    Startup(String),

    /// イベント送出の一時的エラー
    ///
    /// press/release/sync 1回分の書き込み失敗。ログに記録して
    /// 次のtickで継続する。RuntimeStateは変更しない。
    #[error("Emission failed: {0}")]
    Emission(String),

    /// デバイス探索エラー
    ///
    /// マウスデバイスが見つからない場合など。該当リーダーだけを
    /// プロセス存続期間にわたり無効化し、他スレッドは継続する。
    #[error("Device discovery failed: {0}")]
    Discovery(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// デバイス読み取りエラー
    #[error("Device read error: {0}")]
    DeviceRead(String),
}

/// Domain層の統一Result型
pub type ClickerResult<T> = Result<T, ClickerError>;
