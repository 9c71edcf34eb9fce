//! タッピングシーケンスモード
//!
//! 正転→逆転の2ステップを1サイクルとし、構成テーブル通りの
//! 時間割でサイクルを繰り返す。時間は整数ミリ秒で積算し、
//! 浮動小数点は進捗率の報告時にのみ使う（長時間シーケンスでの
//! ドリフト防止）。
//!
//! 自然完了後はノブが一度離されるまで再トリガしない
//! （握りっぱなしによる意図しない再始動の防止）。途中でノブが
//! 離された場合は完了扱いにせず、ブレーキして全カウンタを
//! リセットする。

use crate::drive::DriveControl;
use crate::logging::UsageLog;
use crate::modes::RunState;

/// 1サイクル分のステップ定義（パワーは[-1,1]単位）
#[derive(Clone, Copy)]
pub struct TapCycle {
    pub forward_power: f32,
    pub forward_ms: u32,
    pub backward_power: f32,
    pub backward_ms: u32,
}

/// タッピング構成（材質・板厚ごとにプリセットを用意する）
pub struct TapConfig {
    pub name: &'static str,
    pub material: &'static str,
    pub thickness_mm: f32,
    pub cycles: &'static [TapCycle],
}

impl TapConfig {
    /// 全サイクルの合計時間 [ms]
    pub fn total_duration_ms(&self) -> u32 {
        self.cycles
            .iter()
            .map(|c| c.forward_ms + c.backward_ms)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceState {
    Idle,
    Active,
    WaitingForRelease,
}

pub struct TapMode {
    config: &'static TapConfig,
    total_ms: u32,
    state: SequenceState,
    cycle_index: usize,
    /// 0=正転ステップ、1=逆転ステップ
    step_index: usize,
    /// 完了済みステップの合計時間 [ms]
    completed_ms: u32,
    step_start_ms: u32,
}

impl TapMode {
    pub fn new(config: &'static TapConfig) -> Self {
        Self {
            config,
            total_ms: config.total_duration_ms(),
            state: SequenceState::Idle,
            cycle_index: 0,
            step_index: 0,
            completed_ms: 0,
            step_start_ms: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn run_state(&self) -> RunState {
        if self.state == SequenceState::Active {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    fn step_power_and_duration(&self) -> (f32, u32) {
        let cycle = &self.config.cycles[self.cycle_index];
        if self.step_index == 0 {
            (cycle.forward_power, cycle.forward_ms)
        } else {
            (cycle.backward_power, cycle.backward_ms)
        }
    }

    fn reset_counters(&mut self) {
        self.cycle_index = 0;
        self.step_index = 0;
        self.completed_ms = 0;
        self.step_start_ms = 0;
    }

    pub fn begin(&mut self) {
        self.state = SequenceState::Idle;
        self.reset_counters();
    }

    pub fn step<D: DriveControl, L: UsageLog>(
        &mut self,
        drive: &mut D,
        log: &mut L,
        knob: f32,
        now_ms: u32,
    ) {
        let pressed = knob > 0.0;

        match self.state {
            SequenceState::Idle => {
                if pressed && self.total_ms > 0 {
                    self.reset_counters();
                    self.step_start_ms = now_ms;
                    self.state = SequenceState::Active;
                    log.record_tap_start();
                    let (power, _) = self.step_power_and_duration();
                    drive.set_power_unit(power);
                    info!("tap sequence start: {}", self.config.name);
                }
            }
            SequenceState::Active => {
                if !pressed {
                    // 途中リリースはキャンセル：完了扱いにしない
                    drive.electric_brake();
                    self.reset_counters();
                    self.state = SequenceState::Idle;
                    info!("tap sequence cancelled");
                    return;
                }

                let (_, duration) = self.step_power_and_duration();
                if now_ms.wrapping_sub(self.step_start_ms) >= duration {
                    self.completed_ms += duration;
                    self.step_index += 1;
                    if self.step_index > 1 {
                        self.step_index = 0;
                        self.cycle_index += 1;
                    }
                    if self.cycle_index >= self.config.cycles.len() {
                        // 自然完了：リリースされるまで再トリガ禁止
                        drive.electric_brake();
                        self.state = SequenceState::WaitingForRelease;
                        log.record_tap_end();
                        info!("tap sequence complete: {}", self.config.name);
                    } else {
                        self.step_start_ms = now_ms;
                        let (power, _) = self.step_power_and_duration();
                        drive.set_power_unit(power);
                    }
                }
            }
            SequenceState::WaitingForRelease => {
                if !pressed {
                    self.reset_counters();
                    self.state = SequenceState::Idle;
                }
            }
        }
    }

    /// シーケンス進捗率 [0,1]（非アクティブ時は-1）
    pub fn sequence_progress(&self, now_ms: u32) -> f32 {
        if self.state != SequenceState::Active || self.total_ms == 0 {
            return -1.0;
        }
        let (_, duration) = self.step_power_and_duration();
        let elapsed = now_ms.wrapping_sub(self.step_start_ms).min(duration);
        let progress = (self.completed_ms + elapsed) as f32 / self.total_ms as f32;
        if progress > 1.0 {
            1.0
        } else {
            progress
        }
    }

    pub fn stop<D: DriveControl>(&mut self, drive: &mut D) {
        if self.state == SequenceState::Active {
            drive.electric_brake();
        } else {
            drive.set_power_unit(0.0);
        }
        self.reset_counters();
        self.state = SequenceState::Idle;
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

    static SINGLE_CYCLE: TapConfig = TapConfig {
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

    static TWO_CYCLES: TapConfig = TapConfig {
        name: "Tap Test 2",
        material: "aluminum",
        thickness_mm: 1.5,
        cycles: &[
            TapCycle {
                forward_power: 0.8,
                forward_ms: 200,
                backward_power: -0.5,
                backward_ms: 100,
            },
            TapCycle {
                forward_power: 0.8,
                forward_ms: 400,
                backward_power: -0.5,
                backward_ms: 300,
            },
        ],
    };

    static EMPTY: TapConfig = TapConfig {
        name: "Tap Empty",
        material: "-",
        thickness_mm: 0.0,
        cycles: &[],
    };

    struct TapLog {
        starts: u32,
        ends: u32,
    }
    impl UsageLog for TapLog {
        fn add_run_seconds(&mut self, _d: crate::logging::Direction, _s: u32) {}
        fn record_tap_start(&mut self) {
            self.starts += 1;
        }
        fn record_tap_end(&mut self) {
            self.ends += 1;
        }
    }

    fn make_drive() -> SoftPwmDrive<DummyPins> {
        let mut d = SoftPwmDrive::new(DummyPins);
        d.begin();
        d
    }

    #[test]
    fn trigger_applies_first_forward_power() {
        let mut mode = TapMode::new(&SINGLE_CYCLE);
        let mut drive = make_drive();
        let mut log = NullUsageLog;
        mode.begin();

        mode.step(&mut drive, &mut log, 1.0, 0);
        assert_eq!(mode.run_state(), RunState::Running);
        assert!((drive.speed() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn advances_through_steps_on_schedule() {
        let mut mode = TapMode::new(&TWO_CYCLES);
        let mut drive = make_drive();
        let mut log = NullUsageLog;
        mode.begin();

        mode.step(&mut drive, &mut log, 1.0, 0);
        assert!((drive.speed() - 0.8).abs() < 1e-6);

        // 200ms経過：サイクル0逆転ステップへ
        mode.step(&mut drive, &mut log, 1.0, 200);
        assert!((drive.speed() + 0.5).abs() < 1e-6);

        // さらに100ms：サイクル1正転へ
        mode.step(&mut drive, &mut log, 1.0, 300);
        assert!((drive.speed() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn progress_monotone_and_reaches_one() {
        let mut mode = TapMode::new(&SINGLE_CYCLE);
        let mut drive = make_drive();
        let mut log = NullUsageLog;
        mode.begin();

        mode.step(&mut drive, &mut log, 1.0, 0);
        let mut last = mode.sequence_progress(0);
        assert!(last >= 0.0);

        let mut now = 0u32;
        while now < 550 {
            now += 10;
            let p = mode.sequence_progress(now);
            if p < 0.0 {
                break; // 完了処理後は-1
            }
            assert!(p >= last, "progress regressed: {} -> {}", last, p);
            last = p;
            mode.step(&mut drive, &mut log, 1.0, now);
        }

        // 最終ステップ満了の瞬間、完了処理前の進捗はちょうど1.0
        let mut probe = TapMode::new(&SINGLE_CYCLE);
        probe.begin();
        probe.step(&mut drive, &mut log, 1.0, 0);
        probe.step(&mut drive, &mut log, 1.0, 300);
        assert_eq!(probe.sequence_progress(550), 1.0);
    }

    #[test]
    fn release_mid_sequence_cancels_to_idle() {
        let mut mode = TapMode::new(&SINGLE_CYCLE);
        let mut drive = make_drive();
        let mut log = TapLog { starts: 0, ends: 0 };
        mode.begin();

        mode.step(&mut drive, &mut log, 1.0, 0);
        mode.step(&mut drive, &mut log, 1.0, 150);

        // 途中リリース：ブレーキ＋Idleへのハードリセット
        mode.step(&mut drive, &mut log, 0.0, 200);
        assert!(drive.is_hard_stopped());
        assert_eq!(mode.run_state(), RunState::Idle);
        assert_eq!(mode.sequence_progress(200), -1.0);
        assert_eq!(log.ends, 0);

        // 再押下で即、サイクル0から再始動する
        mode.step(&mut drive, &mut log, 1.0, 300);
        assert_eq!(mode.run_state(), RunState::Running);
        assert!((mode.sequence_progress(300) - 0.0).abs() < 1e-6);
        assert_eq!(log.starts, 2);
    }

    #[test]
    fn held_knob_does_not_retrigger_after_completion() {
        let mut mode = TapMode::new(&SINGLE_CYCLE);
        let mut drive = make_drive();
        let mut log = TapLog { starts: 0, ends: 0 };
        mode.begin();

        // 550msの全シーケンスを握りっぱなしで消化
        let mut now = 0u32;
        while now <= 700 {
            mode.step(&mut drive, &mut log, 1.0, now);
            now += 10;
        }
        assert_eq!(log.starts, 1);
        assert_eq!(log.ends, 1);
        assert!(drive.is_hard_stopped());
        assert_eq!(mode.sequence_progress(700), -1.0);

        // 握ったままでは何度tickしても再始動しない
        for t in [710, 800, 1500] {
            mode.step(&mut drive, &mut log, 1.0, t);
        }
        assert_eq!(log.starts, 1);
        assert_eq!(mode.sequence_progress(1500), -1.0);

        // リリース→再押下で初めて再トリガ
        mode.step(&mut drive, &mut log, 0.0, 1600);
        mode.step(&mut drive, &mut log, 1.0, 1700);
        assert_eq!(log.starts, 2);
        assert_eq!(mode.run_state(), RunState::Running);
    }

    #[test]
    fn empty_config_never_activates() {
        let mut mode = TapMode::new(&EMPTY);
        let mut drive = make_drive();
        let mut log = TapLog { starts: 0, ends: 0 };
        mode.begin();

        mode.step(&mut drive, &mut log, 1.0, 0);
        assert_eq!(mode.run_state(), RunState::Idle);
        assert_eq!(mode.sequence_progress(0), -1.0);
        assert_eq!(log.starts, 0);
    }

    #[test]
    fn stop_brakes_active_sequence_and_resets() {
        let mut mode = TapMode::new(&SINGLE_CYCLE);
        let mut drive = make_drive();
        let mut log = NullUsageLog;
        mode.begin();

        mode.step(&mut drive, &mut log, 1.0, 0);
        mode.stop(&mut drive);
        assert!(drive.is_hard_stopped());
        assert_eq!(mode.run_state(), RunState::Idle);
        assert_eq!(mode.sequence_progress(100), -1.0);
    }
}
