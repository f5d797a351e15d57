//! 実行権限チェック
//!
//! /dev/uinput と /dev/input/event* を開くにはroot権限が必要。
//! 不足はスレッドを1本も起動する前の致命的エラーとして扱う。

use crate::domain::{ClickerError, ClickerResult};

/// root権限で実行されていることを確認する
///
/// 非rootなら`ClickerError::Startup`を返す。
pub fn require_root() -> ClickerResult<()> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(ClickerError::Startup(
            "must run as root (uinput and raw input devices require it)".to_string(),
        ));
    }
    Ok(())
}
