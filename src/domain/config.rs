//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{ClickerError, ClickerResult, MillisRange};

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// 入力デバイス設定
    pub input: InputConfig,
    /// クリック生成設定
    pub clicker: ClickerConfig,
    /// 統計設定
    pub stats: StatsConfig,
}

/// 入力デバイス設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InputConfig {
    /// キーボードデバイスパス（例: "/dev/input/event3"）
    ///
    /// 省略時はトグルキー能力を持つデバイスを自動探索する
    #[serde(default)]
    pub keyboard_device: Option<String>,

    /// マウスデバイスパス
    ///
    /// 省略時はBTN_LEFT能力を持つデバイスを自動探索する。
    /// 探索失敗時はマウスリーダーのみ無効化され、起動は継続する
    #[serde(default)]
    pub mouse_device: Option<String>,

    /// 連射有効/無効を切り替えるキーのevdevコード
    ///
    /// デフォルト: 41 (KEY_GRAVE)
    pub toggle_key: u16,

    /// プログラムを終了するキーのevdevコード
    ///
    /// デフォルト: 1 (KEY_ESC)
    pub exit_key: u16,
}

impl InputConfig {
    /// デフォルトのトグルキー（KEY_GRAVE）
    pub const DEFAULT_TOGGLE_KEY: u16 = 41;
    /// デフォルトの終了キー（KEY_ESC）
    pub const DEFAULT_EXIT_KEY: u16 = 1;
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard_device: None,
            mouse_device: None,
            toggle_key: Self::DEFAULT_TOGGLE_KEY,
            exit_key: Self::DEFAULT_EXIT_KEY,
        }
    }
}

/// クリック生成設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClickerConfig {
    /// ホールド時間の最小値（ミリ秒）
    pub hold_min_ms: u64,

    /// ホールド時間の最大値（ミリ秒）
    pub hold_max_ms: u64,

    /// クリック間隔の最小値（ミリ秒）
    pub delay_min_ms: u64,

    /// クリック間隔の最大値（ミリ秒）
    pub delay_max_ms: u64,

    /// ポーリングtick間隔（ミリ秒）
    ///
    /// 全ループのyield粒度。観測される共有状態の最大遅延を決める。
    /// デフォルト: 2ms
    pub tick_interval_ms: u64,

    /// 実クリック直後の初回release送出から連射開始までの整定時間（ミリ秒）
    ///
    /// デフォルト: 30ms
    pub first_release_settle_ms: u64,

    /// 初回クリック抑制（ArmedFirstRelease経由）を有効にするか
    ///
    /// falseにすると実押下直後から即座に連射する簡易動作になる
    #[serde(default = "default_first_release_damping")]
    pub first_release_damping: bool,

    /// 仮想デバイス作成後の整定待ち（ミリ秒）
    ///
    /// カーネルがデバイスノードを認識するまでの待機。500ms未満は
    /// 起動時エラーになる（早すぎる送出はイベントを黙って落とす）
    pub device_settle_ms: u64,

    /// uinputに登録する仮想デバイス名
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

fn default_first_release_damping() -> bool {
    true
}

fn default_device_name() -> String {
    ClickerConfig::DEFAULT_DEVICE_NAME.to_string()
}

impl ClickerConfig {
    /// デフォルトのホールド時間レンジ（ミリ秒）
    pub const DEFAULT_HOLD_MIN_MS: u64 = 30;
    pub const DEFAULT_HOLD_MAX_MS: u64 = 50;
    /// デフォルトのクリック間隔レンジ（ミリ秒）
    pub const DEFAULT_DELAY_MIN_MS: u64 = 70;
    pub const DEFAULT_DELAY_MAX_MS: u64 = 100;
    /// デフォルトのtick間隔（ミリ秒）
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 2;
    /// デフォルトの初回release整定時間（ミリ秒）
    pub const DEFAULT_FIRST_RELEASE_SETTLE_MS: u64 = 30;
    /// デフォルトのデバイス整定待ち（ミリ秒）
    pub const DEFAULT_DEVICE_SETTLE_MS: u64 = 1000;
    /// デバイス整定待ちの下限（ミリ秒）
    pub const MIN_DEVICE_SETTLE_MS: u64 = 500;
    /// デフォルトの仮想デバイス名
    pub const DEFAULT_DEVICE_NAME: &'static str = "Kitsutsuki Virtual Mouse";

    pub fn hold_range(&self) -> MillisRange {
        MillisRange::new(self.hold_min_ms, self.hold_max_ms)
    }

    pub fn delay_range(&self) -> MillisRange {
        MillisRange::new(self.delay_min_ms, self.delay_max_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn first_release_settle(&self) -> Duration {
        Duration::from_millis(self.first_release_settle_ms)
    }

    pub fn device_settle(&self) -> Duration {
        Duration::from_millis(self.device_settle_ms)
    }
}

impl Default for ClickerConfig {
    fn default() -> Self {
        Self {
            hold_min_ms: Self::DEFAULT_HOLD_MIN_MS,
            hold_max_ms: Self::DEFAULT_HOLD_MAX_MS,
            delay_min_ms: Self::DEFAULT_DELAY_MIN_MS,
            delay_max_ms: Self::DEFAULT_DELAY_MAX_MS,
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
            first_release_settle_ms: Self::DEFAULT_FIRST_RELEASE_SETTLE_MS,
            first_release_damping: true,
            device_settle_ms: Self::DEFAULT_DEVICE_SETTLE_MS,
            device_name: Self::DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

/// 統計設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatsConfig {
    /// 統計情報の出力間隔（秒）
    pub report_interval_sec: u64,
}

impl StatsConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_sec)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_interval_sec: 10,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> ClickerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClickerError::Configuration(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ClickerError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> ClickerResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| ClickerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ClickerError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> ClickerResult<()> {
        // tick間隔の検証（0はビジースピン、大きすぎると精度が出ない）
        if self.clicker.tick_interval_ms == 0 || self.clicker.tick_interval_ms > 50 {
            return Err(ClickerError::Configuration(
                "tick_interval_ms must be in 1..=50".to_string(),
            ));
        }

        // レンジの検証（min <= max）
        if self.clicker.hold_min_ms > self.clicker.hold_max_ms {
            return Err(ClickerError::Configuration(
                "hold_min_ms must be <= hold_max_ms".to_string(),
            ));
        }
        if self.clicker.delay_min_ms > self.clicker.delay_max_ms {
            return Err(ClickerError::Configuration(
                "delay_min_ms must be <= delay_max_ms".to_string(),
            ));
        }

        // デバイス整定待ちの検証（短すぎると初回イベントが失われる）
        if self.clicker.device_settle_ms < ClickerConfig::MIN_DEVICE_SETTLE_MS {
            return Err(ClickerError::Configuration(format!(
                "device_settle_ms must be >= {}",
                ClickerConfig::MIN_DEVICE_SETTLE_MS
            )));
        }

        // トグルキーと終了キーの衝突検証
        if self.input.toggle_key == self.input.exit_key {
            return Err(ClickerError::Configuration(
                "toggle_key and exit_key must differ".to_string(),
            ));
        }

        if self.clicker.device_name.is_empty() {
            return Err(ClickerError::Configuration(
                "device_name must not be empty".to_string(),
            ));
        }

        if self.stats.report_interval_sec == 0 {
            return Err(ClickerError::Configuration(
                "report_interval_sec must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
