/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// リーダー・スケジューラ・エミッタ間で共有される不変の型。
use rand::Rng;

/// 入力イベントの発生源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// キーボードデバイス（トグルキー・終了キー）
    Keyboard,
    /// マウスデバイス（左ボタン状態）
    Mouse,
}

/// キー/ボタンの状態変化イベント
///
/// リーダーが生成し、ハンドラが即座に消費する一時的な値。保存されない。
/// valueはevdev準拠: 0=release, 1=press, 2=repeat。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub source: SourceKind,
    /// evdevキーコード（KEY_GRAVE, BTN_LEFT等）
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub fn new(source: SourceKind, code: u16, value: i32) -> Self {
        Self {
            source,
            code,
            value,
        }
    }

    /// 押下遷移（0→1）か。repeat(2)はエッジではない
    #[inline]
    pub fn is_press(&self) -> bool {
        self.value == 1
    }

    /// 解放遷移か
    #[inline]
    pub fn is_release(&self) -> bool {
        self.value == 0
    }
}

/// ミリ秒単位の閉区間 [min, max]
///
/// ホールド時間・クリック間隔の抽選レンジに使用する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MillisRange {
    pub min: u64,
    pub max: u64,
}

impl MillisRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// レンジ内の一様乱数を抽選する
    ///
    /// max <= min の場合はminを返す（縮退レンジガード。
    /// ゼロ除算や不正レンジを発生させない）。
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// クリックスケジューラの状態
///
/// 毎tick、観測したフラグから再導出される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// 無効またはマウス非押下。何もしない
    Idle,
    /// 有効+押下+初回解放待ち。まずreleaseを送出する
    ArmedFirstRelease,
    /// 連射中。間隔条件を満たせばpress/releaseを送出する
    Clicking,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_input_event_edges() {
        let press = InputEvent::new(SourceKind::Keyboard, 41, 1);
        let release = InputEvent::new(SourceKind::Keyboard, 41, 0);
        let repeat = InputEvent::new(SourceKind::Keyboard, 41, 2);

        assert!(press.is_press());
        assert!(!press.is_release());
        assert!(release.is_release());
        // repeatはエッジとして扱わない
        assert!(!repeat.is_press());
        assert!(!repeat.is_release());
    }

    #[test]
    fn test_millis_range_within_bounds() {
        let range = MillisRange::new(70, 100);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let v = range.sample(&mut rng);
            assert!((70..=100).contains(&v));
        }
    }

    #[test]
    fn test_millis_range_degenerate() {
        let mut rng = StdRng::seed_from_u64(42);

        // max == min
        assert_eq!(MillisRange::new(30, 30).sample(&mut rng), 30);
        // max < min でもminを返す（パニックしない）
        assert_eq!(MillisRange::new(50, 10).sample(&mut rng), 50);
        assert_eq!(MillisRange::new(0, 0).sample(&mut rng), 0);
    }
}
