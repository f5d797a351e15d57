//! コンソールステータス表示
//!
//! 現在の連射状態とキー割り当てを標準出力へ描画する。
//! 描画はステータスループからのみ呼ばれ、コアループの遅延要因にならない。

use std::io::Write;

/// よく使うキーコードの表示名
///
/// 未知のコードは数値のまま表示する。
fn key_label(code: u16) -> String {
    match code {
        1 => "ESC".to_string(),
        41 => "` (grave)".to_string(),
        other => format!("keycode {}", other),
    }
}

/// ステータスバナーを描画する
///
/// 画面はクリアせず、トグルのたびに追記する（ログ出力と共存するため）。
pub fn render_banner(enabled: bool, toggle_key: u16, exit_key: u16) {
    let state = if enabled { "ON " } else { "OFF" };

    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "+--------------------------------------+");
    let _ = writeln!(stdout, "|  Autoclicker  [{}]                  |", state);
    let _ = writeln!(stdout, "|  Toggle: {:<27} |", key_label(toggle_key));
    let _ = writeln!(stdout, "|  Exit:   {:<27} |", key_label(exit_key));
    let _ = writeln!(stdout, "+--------------------------------------+");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_label_known() {
        assert_eq!(key_label(41), "` (grave)");
        assert_eq!(key_label(1), "ESC");
    }

    #[test]
    fn test_key_label_unknown() {
        assert_eq!(key_label(30), "keycode 30");
    }
}
