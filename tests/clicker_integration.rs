//! クリッカー統合テスト
//!
//! モックアダプタで実デバイスなしのエンドツーエンド検証を行う。
//! 各スレッドループと状態機械の協調、ティアダウン順序を確認する。

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;

use Kitsutsuki::application::scheduler::{clicker_thread, ClickPlanner};
use Kitsutsuki::application::threads::BTN_LEFT_CODE;
use Kitsutsuki::application::{ClickerRunner, RuntimeState, StatusEvent};
use Kitsutsuki::domain::config::AppConfig;
use Kitsutsuki::domain::{InputEvent, SourceKind};
use Kitsutsuki::infrastructure::mock_input::{EmitterProbe, MockEmitter, MockEventSource};

const TOGGLE_KEY: u16 = 41;
const EXIT_KEY: u16 = 1;

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.clicker.hold_min_ms = 1;
    config.clicker.hold_max_ms = 2;
    config.clicker.delay_min_ms = 20;
    config.clicker.delay_max_ms = 30;
    config.clicker.first_release_settle_ms = 10;
    config
}

/// クリッカースレッドを起動し、指定時間後に停止して送出記録を返す
fn run_clicker_for(
    config: &AppConfig,
    state: RuntimeState,
    duration: Duration,
) -> (EmitterProbe, thread::JoinHandle<()>) {
    let (emitter, probe) = MockEmitter::new();
    let planner = ClickPlanner::with_seed(&config.clicker, 7);
    let tick = config.clicker.tick_interval();
    let (tx, _rx) = bounded(32);

    let thread_state = state.clone();
    let handle = thread::spawn(move || {
        clicker_thread(emitter, planner, thread_state, tick, tx);
    });

    thread::sleep(duration);
    state.request_stop();

    (probe, handle)
}

#[test]
fn test_no_clicks_while_disabled() {
    let state = RuntimeState::new();
    state.set_mouse_held(true);
    state.arm_first_release();
    // enabledはfalseのまま

    let (probe, handle) = run_clicker_for(&fast_config(), state, Duration::from_millis(100));
    handle.join().unwrap();

    assert!(probe.emissions().is_empty(), "no emission while disabled");
}

#[test]
fn test_no_clicks_while_mouse_not_held() {
    let state = RuntimeState::new();
    state.toggle_enabled();
    // mouse_heldはfalseのまま

    let (probe, handle) = run_clicker_for(&fast_config(), state, Duration::from_millis(100));
    handle.join().unwrap();

    assert!(probe.emissions().is_empty(), "no emission while not held");
}

#[test]
fn test_first_emission_is_release_then_spaced_press() {
    let config = fast_config();
    let state = RuntimeState::new();
    state.toggle_enabled();
    state.set_mouse_held(true);
    state.arm_first_release();

    let (probe, handle) = run_clicker_for(&config, state, Duration::from_millis(300));
    handle.join().unwrap();

    let emissions = probe.emissions();
    assert!(emissions.len() >= 3, "expected release + at least one click");

    // 最初の送出は必ずrelease（実クリックの引っかかり解消）
    let (release_at, first_is_press) = emissions[0];
    assert!(!first_is_press);

    // 最初のpressは release + 整定(10ms) + 間隔最小(20ms) より前に出ない
    let (first_press_at, is_press) = emissions[1];
    assert!(is_press);
    let gap = first_press_at.duration_since(release_at);
    assert!(
        gap >= Duration::from_millis(28),
        "first press too early: {:?}",
        gap
    );

    // 以降はpress/releaseの交互列で、ホールド時間は設定レンジ内
    for pair in emissions[1..].chunks(2) {
        if let [(press_at, press), (release_at, release)] = pair {
            assert!(*press);
            assert!(!*release);

            let hold = release_at.duration_since(*press_at);
            // 設定レンジ 1..=2ms + sleep精度の余裕
            assert!(
                hold >= Duration::from_millis(1) && hold <= Duration::from_millis(20),
                "hold out of range: {:?}",
                hold
            );
        }
    }
}

#[test]
fn test_resume_after_toggle_off_and_on() {
    let config = fast_config();
    let state = RuntimeState::new();
    state.toggle_enabled();
    state.set_mouse_held(true);
    state.arm_first_release();

    let (emitter, probe) = MockEmitter::new();
    let planner = ClickPlanner::with_seed(&config.clicker, 7);
    let tick = config.clicker.tick_interval();
    let (tx, _rx) = bounded(32);

    let thread_state = state.clone();
    let handle = thread::spawn(move || {
        clicker_thread(emitter, planner, thread_state, tick, tx);
    });

    thread::sleep(Duration::from_millis(150));
    state.toggle_enabled(); // off
    thread::sleep(Duration::from_millis(50));
    let paused_count = probe.emissions().len();
    thread::sleep(Duration::from_millis(50));

    // 無効中は送出が増えない
    assert_eq!(probe.emissions().len(), paused_count);

    state.toggle_enabled(); // on
    thread::sleep(Duration::from_millis(100));
    state.request_stop();
    handle.join().unwrap();

    assert!(probe.emissions().len() > paused_count, "clicking resumed");
}

#[test]
fn test_emission_failure_does_not_stop_clicking() {
    let config = fast_config();
    let state = RuntimeState::new();
    state.toggle_enabled();
    state.set_mouse_held(true);
    // 保留なし - 直接Clickingに入る

    let (emitter, probe) = MockEmitter::new();
    probe.fail_next(3);

    let planner = ClickPlanner::with_seed(&config.clicker, 7);
    let tick = config.clicker.tick_interval();
    let (tx, rx) = bounded(32);

    let thread_state = state.clone();
    let handle = thread::spawn(move || {
        clicker_thread(emitter, planner, thread_state, tick, tx);
    });

    thread::sleep(Duration::from_millis(300));
    state.request_stop();
    handle.join().unwrap();

    // 失敗は記録され、ループは継続して後続のクリックを送出する
    let dropped = rx
        .try_iter()
        .filter(|ev| matches!(ev, StatusEvent::EmissionDropped))
        .count();
    assert!(dropped >= 1, "expected dropped emissions to be reported");
    assert!(
        probe.emissions().iter().any(|&(_, press)| press),
        "clicking resumed after failures"
    );

    // 一時的な送出失敗は共有状態を変更しない
    assert!(state.is_enabled());
    assert!(state.is_mouse_held());
    assert!(!state.is_first_release_pending());
}

#[test]
fn test_stop_is_prompt_while_idle() {
    let state = RuntimeState::new();
    let (probe, handle) = run_clicker_for(&fast_config(), state, Duration::from_millis(20));

    let stop_requested = Instant::now();
    handle.join().unwrap();
    let elapsed = stop_requested.elapsed();

    // Idleではtick(2ms)粒度で停止要求を観測する
    assert!(elapsed < Duration::from_millis(50), "slow stop: {:?}", elapsed);
    assert!(probe.emissions().is_empty());
}

#[test]
fn test_runner_end_to_end_destroys_device_once() {
    let config = fast_config();
    let start = Instant::now();

    // キーボード: 起動直後にトグルON、350ms後に終了キー
    let keyboard = MockEventSource::new(vec![
        (
            start + Duration::from_millis(20),
            InputEvent::new(SourceKind::Keyboard, TOGGLE_KEY, 1),
        ),
        (
            start + Duration::from_millis(30),
            InputEvent::new(SourceKind::Keyboard, TOGGLE_KEY, 0),
        ),
        (
            start + Duration::from_millis(350),
            InputEvent::new(SourceKind::Keyboard, EXIT_KEY, 1),
        ),
    ]);

    // マウス: 50ms時点でBTN_LEFTを押しっぱなしにする
    let mouse = MockEventSource::new(vec![(
        start + Duration::from_millis(50),
        InputEvent::new(SourceKind::Mouse, BTN_LEFT_CODE, 1),
    )]);

    let (emitter, probe) = MockEmitter::new();

    let runner = ClickerRunner::new(keyboard, Some(mouse), emitter, config);
    runner.run().unwrap();

    // 終了キーでブロッキング呼び出しから戻る
    assert!(start.elapsed() < Duration::from_secs(2));

    // 有効+押下の間にクリックが送出されている
    let emissions = probe.emissions();
    assert!(!emissions.is_empty(), "expected emissions during clicking");
    assert!(!emissions[0].1, "first emission is the damping release");
    assert!(emissions.iter().any(|&(_, press)| press), "expected presses");

    // 仮想デバイスの破棄は1回だけ
    assert_eq!(probe.destroy_count(), 1);
}

#[test]
fn test_runner_without_mouse_stays_idle() {
    let config = fast_config();
    let start = Instant::now();

    let keyboard = MockEventSource::new(vec![
        (
            start + Duration::from_millis(10),
            InputEvent::new(SourceKind::Keyboard, TOGGLE_KEY, 1),
        ),
        (
            start + Duration::from_millis(150),
            InputEvent::new(SourceKind::Keyboard, EXIT_KEY, 1),
        ),
    ]);

    let (emitter, probe) = MockEmitter::new();

    let runner = ClickerRunner::new(keyboard, None::<MockEventSource>, emitter, config);
    runner.run().unwrap();

    // マウスリーダーなしではmouse_heldが立たず、クリックは出ない
    assert!(probe.emissions().is_empty());
    assert_eq!(probe.destroy_count(), 1);
}
