use std::path::{Path, PathBuf};

use anyhow::Context;

use Kitsutsuki::application::ClickerRunner;
use Kitsutsuki::domain::config::AppConfig;
use Kitsutsuki::domain::SourceKind;
use Kitsutsuki::infrastructure::evdev_reader::{
    find_keyboard_device, find_mouse_device, EvdevSourceAdapter,
};
use Kitsutsuki::infrastructure::privileges::require_root;
use Kitsutsuki::infrastructure::uinput_emitter::UinputClickEmitter;
use Kitsutsuki::logging::init_logging;

const CONFIG_PATH: &str = "config.toml";

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("Kitsutsuki starting...");

    match run() {
        Ok(_) => {
            tracing::info!("Kitsutsuki terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            eprintln!("Fatal error: {}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルトを書き出して使用）
    let config = if Path::new(CONFIG_PATH).exists() {
        let config = AppConfig::from_file(CONFIG_PATH)
            .with_context(|| format!("Failed to load {}", CONFIG_PATH))?;
        tracing::info!("Loaded configuration from {}", CONFIG_PATH);
        config
    } else {
        tracing::warn!("{} not found, writing defaults", CONFIG_PATH);
        if let Err(e) = AppConfig::write_default(CONFIG_PATH) {
            tracing::warn!("Failed to write default config: {:?}", e);
        }
        AppConfig::default()
    };

    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Clicker: hold={}..{}ms, delay={}..{}ms, tick={}ms",
        config.clicker.hold_min_ms,
        config.clicker.hold_max_ms,
        config.clicker.delay_min_ms,
        config.clicker.delay_max_ms,
        config.clicker.tick_interval_ms
    );

    // 権限不足はスレッド起動前の致命的エラー
    require_root()?;

    // キーボードは必須
    let keyboard_path = find_keyboard_device(&config.input.keyboard_device, config.input.toggle_key)?;
    let keyboard = EvdevSourceAdapter::open(&keyboard_path, SourceKind::Keyboard)?;

    // マウスは任意（見つからなければトグルのみで起動する）
    let mouse = match find_mouse_device(&config.input.mouse_device, &config.clicker.device_name) {
        Ok(path) => Some(EvdevSourceAdapter::open(&path, SourceKind::Mouse)?),
        Err(e) => {
            tracing::warn!("Mouse discovery failed: {:?}, clicking will stay idle", e);
            None
        }
    };

    // 仮想デバイスの作成（整定待ちを含む）
    tracing::info!("Creating virtual mouse...");
    let emitter = UinputClickEmitter::create(&config.clicker)?;

    // クリッカーの起動（ブロッキング）
    let runner = ClickerRunner::new(keyboard, mouse, emitter, config);
    runner.run()?;

    Ok(())
}
