//! uinput仮想マウスアダプタ
//!
//! BTN_LEFTのみを能力に持つ仮想デバイスを作成し、press/releaseを
//! 送出します。各送出にはSYNイベントを必ず付ける（付けないとカーネルが
//! イベントをバッファに溜めたまま配送しない）。

use std::thread;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};

use crate::domain::{ClickEmitterPort, ClickerConfig, ClickerError, ClickerResult};

/// uinput経由のクリックエミッタ
///
/// クリッカースレッドが排他的に所有し、Dropで仮想デバイスが破棄される
/// （カーネルが押下中のボタンを暗黙にreleaseする）。
pub struct UinputClickEmitter {
    /// Noneは破棄済みを表す
    device: Option<VirtualDevice>,
}

impl UinputClickEmitter {
    /// 仮想デバイスを作成し、カーネル側の整定を待ってから返す
    ///
    /// 整定待ちを飛ばすと作成直後の送出が黙って捨てられる。
    pub fn create(config: &ClickerConfig) -> ClickerResult<Self> {
        let mut keys: AttributeSet<Key> = AttributeSet::new();
        keys.insert(Key::BTN_LEFT);

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| ClickerError::Startup(format!("Failed to create uinput builder: {}", e)))?
            .name(config.device_name.as_str())
            .with_keys(&keys)
            .map_err(|e| ClickerError::Startup(format!("Failed to set key capabilities: {}", e)))?
            .build()
            .map_err(|e| ClickerError::Startup(format!("Failed to build uinput device: {}", e)))?;

        tracing::info!(
            name = %config.device_name,
            settle_ms = config.device_settle_ms,
            "Virtual mouse created, waiting for kernel to settle"
        );
        thread::sleep(config.device_settle());

        Ok(Self {
            device: Some(device),
        })
    }

    /// 仮想デバイスを明示的に破棄する
    ///
    /// 冪等 - 破棄済みのハンドルに対してはno-op。
    pub fn shutdown(&mut self) {
        if self.device.take().is_some() {
            tracing::info!("Virtual mouse destroyed");
        }
    }
}

impl ClickEmitterPort for UinputClickEmitter {
    fn emit_button(&mut self, pressed: bool) -> ClickerResult<()> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| ClickerError::Emission("device already destroyed".to_string()))?;

        let value = if pressed { 1 } else { 0 };
        let key = InputEvent::new(EventType::KEY, Key::BTN_LEFT.0, value);
        let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);

        device
            .emit(&[key, sync])
            .map_err(|e| ClickerError::Emission(format!("uinput emit failed: {}", e)))
    }
}

impl Drop for UinputClickEmitter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
