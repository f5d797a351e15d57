//! evdevイベントソースアダプタ
//!
//! 物理デバイスのノンブロッキング読み取りと、能力ベースの自動探索。
//! `fetch_events`は1回のreadで複数イベントを返すため、内部バッファに
//! 溜めて`poll_event`呼び出しごとに1件ずつ払い出す。

use std::collections::VecDeque;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use evdev::{Device, InputEventKind, Key};

use crate::domain::{ClickerError, ClickerResult, EventSourcePort, InputEvent, SourceKind};

/// 物理evdevデバイスのイベントソース
pub struct EvdevSourceAdapter {
    device: Device,
    source: SourceKind,
    /// fetch_eventsで読んだがまだ払い出していないKEYイベント
    buffer: VecDeque<InputEvent>,
}

impl EvdevSourceAdapter {
    /// デバイスを開いてノンブロッキングに設定する
    pub fn open<P: AsRef<Path>>(path: P, source: SourceKind) -> ClickerResult<Self> {
        let path = path.as_ref();
        let device = Device::open(path).map_err(|e| {
            ClickerError::Startup(format!("Failed to open {}: {}", path.display(), e))
        })?;

        set_nonblocking(&device)?;

        tracing::info!(
            path = %path.display(),
            name = device.name().unwrap_or("?"),
            source = ?source,
            "Opened input device"
        );

        Ok(Self {
            device,
            source,
            buffer: VecDeque::new(),
        })
    }
}

impl EventSourcePort for EvdevSourceAdapter {
    fn poll_event(&mut self) -> ClickerResult<Option<InputEvent>> {
        if let Some(ev) = self.buffer.pop_front() {
            return Ok(Some(ev));
        }

        match self.device.fetch_events() {
            Ok(events) => {
                for ev in events {
                    // KEYのみ関心がある。SYNやMSC、相対移動は捨てる
                    if let InputEventKind::Key(key) = ev.kind() {
                        self.buffer
                            .push_back(InputEvent::new(self.source, key.code(), ev.value()));
                    }
                }
                Ok(self.buffer.pop_front())
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(ClickerError::DeviceRead(format!(
                "Failed to read events: {}",
                e
            ))),
        }
    }
}

/// トグルキー能力を持つキーボードデバイスを探索する
///
/// 設定でパスが指定されていればそれを優先し、探索は行わない。
pub fn find_keyboard_device(
    explicit_path: &Option<String>,
    toggle_key: u16,
) -> ClickerResult<PathBuf> {
    if let Some(p) = explicit_path {
        return Ok(PathBuf::from(p));
    }

    let needle = Key::new(toggle_key);

    for (path, dev) in evdev::enumerate() {
        let has_toggle = dev
            .supported_keys()
            .map(|keys| keys.contains(needle))
            .unwrap_or(false);

        // マウスと複合デバイスを除外する（BTN_LEFTを持つものはマウス寄り）
        let has_btn_left = dev
            .supported_keys()
            .map(|keys| keys.contains(Key::BTN_LEFT))
            .unwrap_or(false);

        if has_toggle && !has_btn_left {
            tracing::info!(
                path = %path.display(),
                name = dev.name().unwrap_or("?"),
                "Found keyboard device"
            );
            return Ok(path);
        }
    }

    Err(ClickerError::Discovery(format!(
        "No keyboard device with key code {} found",
        toggle_key
    )))
}

/// BTN_LEFTと相対軸を持つマウスデバイスを探索する
///
/// 自作の仮想デバイスを拾わないよう、名前が一致するものは除外する。
pub fn find_mouse_device(
    explicit_path: &Option<String>,
    virtual_device_name: &str,
) -> ClickerResult<PathBuf> {
    if let Some(p) = explicit_path {
        return Ok(PathBuf::from(p));
    }

    for (path, dev) in evdev::enumerate() {
        if dev.name().unwrap_or_default() == virtual_device_name {
            continue;
        }

        let has_btn_left = dev
            .supported_keys()
            .map(|keys| keys.contains(Key::BTN_LEFT))
            .unwrap_or(false);

        let has_rel = dev
            .supported_relative_axes()
            .map(|axes| axes.iter().next().is_some())
            .unwrap_or(false);

        if has_btn_left && has_rel {
            tracing::info!(
                path = %path.display(),
                name = dev.name().unwrap_or("?"),
                "Found mouse device"
            );
            return Ok(path);
        }
    }

    Err(ClickerError::Discovery(
        "No mouse device with BTN_LEFT found".to_string(),
    ))
}

fn set_nonblocking(device: &Device) -> ClickerResult<()> {
    let fd = device.as_raw_fd();

    // 既存フラグを保持したままO_NONBLOCKだけ立てる
    let current = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if current < 0 {
        return Err(ClickerError::Startup(format!(
            "fcntl(F_GETFL) failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(ClickerError::Startup(format!(
            "fcntl(F_SETFL, O_NONBLOCK) failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    Ok(())
}
