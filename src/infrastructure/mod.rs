//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、外部ライブラリ（evdev/uinput）と接続する。

pub mod console;
pub mod evdev_reader;
pub mod mock_input;
pub mod privileges;
pub mod uinput_emitter;

pub use evdev_reader::EvdevSourceAdapter;
pub use uinput_emitter::UinputClickEmitter;
