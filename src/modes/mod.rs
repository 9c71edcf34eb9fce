//! 運転モード群とモードディスパッチャ
//!
//! モードは閉じた集合なので、トレイトオブジェクトではなく
//! enumのmatchディスパッチで切り替える。どのモードも
//! `begin`/`step`/`stop`の同じライフサイクルに従い、`stop`は
//! どのtickで呼んでも安全側（ブレーキまたはIdle）に着地する
//! 冪等なキャンセル手段として機能する。

mod manual;
mod momentum;
mod tap;

pub use manual::ManualMode;
pub use momentum::MomentumMode;
pub use tap::{TapConfig, TapCycle, TapMode};

use crate::drive::DriveControl;
use crate::logging::UsageLog;

/// モードの運転状態（表示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    Idle,
    Running,
}

/// 運転モードの閉じた集合
pub enum DriveMode {
    Manual(ManualMode),
    Momentum(MomentumMode),
    Tap(TapMode),
}

impl DriveMode {
    pub fn name(&self) -> &'static str {
        match self {
            DriveMode::Manual(m) => m.name(),
            DriveMode::Momentum(m) => m.name(),
            DriveMode::Tap(m) => m.name(),
        }
    }

    pub fn run_state(&self) -> RunState {
        match self {
            DriveMode::Manual(m) => m.run_state(),
            DriveMode::Momentum(m) => m.run_state(),
            DriveMode::Tap(m) => m.run_state(),
        }
    }

    pub fn begin(&mut self, now_ms: u32) {
        match self {
            DriveMode::Manual(m) => m.begin(),
            DriveMode::Momentum(m) => m.begin(now_ms),
            DriveMode::Tap(m) => m.begin(),
        }
    }

    pub fn step<D: DriveControl, L: UsageLog>(
        &mut self,
        drive: &mut D,
        log: &mut L,
        knob: f32,
        now_ms: u32,
    ) {
        match self {
            DriveMode::Manual(m) => m.step(drive, log, knob, now_ms),
            DriveMode::Momentum(m) => m.step(drive, knob, now_ms),
            DriveMode::Tap(m) => m.step(drive, log, knob, now_ms),
        }
    }

    pub fn stop<D: DriveControl>(&mut self, drive: &mut D) {
        match self {
            DriveMode::Manual(m) => m.stop(drive),
            DriveMode::Momentum(m) => m.stop(drive),
            DriveMode::Tap(m) => m.stop(drive),
        }
    }

    /// タップシーケンスの進捗率（非該当モードは常に-1）
    pub fn sequence_progress(&self, now_ms: u32) -> f32 {
        match self {
            DriveMode::Tap(m) => m.sequence_progress(now_ms),
            _ => -1.0,
        }
    }
}

/// 固定本数のモード配列を順送り／逆送りで切り替えるディスパッチャ
pub struct ModeDispatcher<const N: usize> {
    modes: [DriveMode; N],
    current: usize,
}

impl<const N: usize> ModeDispatcher<N> {
    pub fn new(modes: [DriveMode; N]) -> Self {
        Self { modes, current: 0 }
    }

    /// 初期モードのライフサイクルを開始する（制御ループ開始時に一度呼ぶ）
    pub fn begin(&mut self, now_ms: u32) {
        self.modes[self.current].begin(now_ms);
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.modes[self.current].name()
    }

    pub fn run_state(&self) -> RunState {
        self.modes[self.current].run_state()
    }

    pub fn sequence_progress(&self, now_ms: u32) -> f32 {
        self.modes[self.current].sequence_progress(now_ms)
    }

    /// 次のモードへ切り替える（旧モードをstopしてから新モードをbegin）
    pub fn next<D: DriveControl>(&mut self, drive: &mut D, now_ms: u32) {
        self.modes[self.current].stop(drive);
        self.current = (self.current + 1) % N;
        self.modes[self.current].begin(now_ms);
        info!("mode -> {}", self.current_name());
    }

    /// 前のモードへ切り替える
    pub fn prev<D: DriveControl>(&mut self, drive: &mut D, now_ms: u32) {
        self.modes[self.current].stop(drive);
        self.current = (self.current + N - 1) % N;
        self.modes[self.current].begin(now_ms);
        info!("mode -> {}", self.current_name());
    }

    /// 現在モードを1tick進める（ノブ値は[0,1]にクランプ）
    pub fn step<D: DriveControl, L: UsageLog>(
        &mut self,
        drive: &mut D,
        log: &mut L,
        knob: f32,
        now_ms: u32,
    ) {
        let knob = knob.clamp(0.0, 1.0);
        self.modes[self.current].step(drive, log, knob, now_ms);
    }

    /// 現在モードを停止する
    pub fn stop<D: DriveControl>(&mut self, drive: &mut D) {
        self.modes[self.current].stop(drive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{BridgePins, PinPattern, SoftPwmDrive};
    use crate::logging::NullUsageLog;

    struct DummyPins;
    impl BridgePins for DummyPins {
        fn apply(&mut self, _pattern: PinPattern) {}
    }

    static TAP_TEST: TapConfig = TapConfig {
        name: "Tap Test",
        material: "steel",
        thickness_mm: 2.0,
        cycles: &[TapCycle {
            forward_power: 0.7,
            forward_ms: 300,
            backward_power: -0.6,
            backward_ms: 250,
        }],
    };

    fn make_dispatcher() -> ModeDispatcher<3> {
        ModeDispatcher::new([
            DriveMode::Manual(ManualMode::new("Manual CW", 1)),
            DriveMode::Momentum(MomentumMode::new("Momentum CW", 1)),
            DriveMode::Tap(TapMode::new(&TAP_TEST)),
        ])
    }

    fn make_drive() -> SoftPwmDrive<DummyPins> {
        let mut d = SoftPwmDrive::new(DummyPins);
        d.begin();
        d
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let mut disp = make_dispatcher();
        let mut drive = make_drive();
        assert_eq!(disp.current_index(), 0);
        assert_eq!(disp.current_name(), "Manual CW");

        disp.next(&mut drive, 0);
        assert_eq!(disp.current_index(), 1);
        disp.next(&mut drive, 0);
        disp.next(&mut drive, 0);
        assert_eq!(disp.current_index(), 0);

        disp.prev(&mut drive, 0);
        assert_eq!(disp.current_index(), 2);
        assert_eq!(disp.current_name(), "Tap Test");
    }

    #[test]
    fn switch_stops_previous_mode_first() {
        let mut disp = make_dispatcher();
        let mut drive = make_drive();
        let mut log = NullUsageLog;

        // マニュアルモードで出力中に切り替える
        disp.step(&mut drive, &mut log, 0.8, 0);
        assert_eq!(drive.speed(), 0.8);

        disp.next(&mut drive, 10);
        assert_eq!(drive.speed(), 0.0);
        assert_eq!(disp.run_state(), RunState::Idle);
    }

    #[test]
    fn knob_is_clamped_to_unit_range() {
        let mut disp = make_dispatcher();
        let mut drive = make_drive();
        let mut log = NullUsageLog;

        disp.step(&mut drive, &mut log, 2.5, 0);
        assert_eq!(drive.speed(), 1.0);

        disp.step(&mut drive, &mut log, -0.5, 10);
        assert_eq!(drive.speed(), 0.0);
    }

    #[test]
    fn non_tap_modes_report_no_progress() {
        let disp = make_dispatcher();
        assert_eq!(disp.sequence_progress(0), -1.0);
    }

    #[test]
    fn begin_stamps_initial_mode_clock() {
        // 先頭がMomentumの構成で、起動時刻がbeginで刻印されることを確認する。
        // 刻印されない場合、最初のstepで経過時間が起動までの全時間になり
        // ランプが一気に飛ぶ。
        let mut disp = ModeDispatcher::new([DriveMode::Momentum(MomentumMode::new(
            "Momentum CW",
            1,
        ))]);
        let mut drive = make_drive();
        let mut log = NullUsageLog;

        disp.begin(10_000);
        disp.step(&mut drive, &mut log, 1.0, 10_020);
        assert!(
            drive.speed() < 0.1,
            "ramp jumped: speed = {}",
            drive.speed()
        );
    }

    #[test]
    fn tap_switch_mid_sequence_brakes() {
        let mut disp = make_dispatcher();
        let mut drive = make_drive();
        let mut log = NullUsageLog;

        disp.prev(&mut drive, 0); // Tapへ
        disp.step(&mut drive, &mut log, 1.0, 10);
        assert_eq!(disp.run_state(), RunState::Running);

        disp.next(&mut drive, 100);
        assert!(drive.is_hard_stopped());
    }
}
