//! ハードウェアタイマ割り込み方式のドライブステージ
//!
//! 周期タイマのコンペア割り込みごとに`on_timer_tick()`を呼び出し、
//! ON位相/OFF位相をトグルする。戻り値は次の割り込みまでのtick数で、
//! 呼び出し側（割り込みハンドラ）がタイマのリロード値として書き込む。
//!
//! ON/OFFのtick数は毎回、最後にコミットされたパワー指令から再計算する。
//! ハンドラ内で指令を読み直すことはないため、途中変更による不整合は
//! 発生しない。0%・100%・ブレーキの定常パターンではトグルを短絡し、
//! 次回デッドラインを最大間隔に退避して不要な割り込みを避ける。

use super::{directional_pattern, step_pattern, BridgePins, DriveControl, PinPattern, PowerCell};
use crate::params::{PWM_PARK_TICKS, PWM_PERIOD_TICKS};

/// 割り込み駆動方式のドライブステージ
pub struct TimerPwmDrive<P: BridgePins> {
    pins: P,
    command: PowerCell,
    period_ticks: u32,
    /// 現在ON位相か（trueなら次回はOFF位相に入る）
    high_phase: bool,
    applied: PinPattern,
}

impl<P: BridgePins> TimerPwmDrive<P> {
    pub fn new(pins: P) -> Self {
        Self {
            pins,
            command: PowerCell::new(),
            period_ticks: PWM_PERIOD_TICKS,
            high_phase: false,
            applied: PinPattern::Idle,
        }
    }

    /// 現在適用中の出力パターン
    pub fn applied_pattern(&self) -> PinPattern {
        self.applied
    }

    /// タイマ割り込みハンドラから呼び出す
    ///
    /// 出力パターンを更新し、次の割り込みまでのtick数を返す。
    /// ハンドラはブロックやアロケーションを行わず、モードロジックにも
    /// 一切立ち入らない。
    pub fn on_timer_tick(&mut self) -> u32 {
        if self.command.braking() {
            self.high_phase = false;
            self.apply(PinPattern::Brake);
            return PWM_PARK_TICKS;
        }

        let power = self.command.power();
        let Some(direction) = directional_pattern(power) else {
            self.high_phase = false;
            self.apply(PinPattern::Idle);
            return PWM_PARK_TICKS;
        };

        let on_ticks = (libm::fabsf(power) / 100.0 * self.period_ticks as f32) as u32;
        if on_ticks >= self.period_ticks {
            // 100%：トグル不要、定常方向パターンのままデッドラインを退避
            self.high_phase = true;
            self.apply(direction);
            return PWM_PARK_TICKS;
        }

        if self.high_phase {
            // ON位相を終えてOFF位相（コースト）へ
            self.high_phase = false;
            self.apply(PinPattern::Idle);
            self.period_ticks - on_ticks
        } else {
            self.high_phase = true;
            self.apply(direction);
            on_ticks.max(1)
        }
    }

    fn apply(&mut self, want: PinPattern) {
        let next = step_pattern(self.applied, want);
        if next != self.applied {
            self.pins.apply(next);
            self.applied = next;
        }
    }

    fn force(&mut self, pattern: PinPattern) {
        self.pins.apply(pattern);
        self.applied = pattern;
        self.high_phase = false;
    }
}

impl<P: BridgePins> DriveControl for TimerPwmDrive<P> {
    fn begin(&mut self) {
        self.command.zero();
        self.command.clear_brake();
        self.force(PinPattern::Idle);
    }

    fn set_power(&mut self, percent: f32) {
        self.command.set(percent);
    }

    fn idle(&mut self) {
        self.command.zero();
        self.command.clear_brake();
        self.force(PinPattern::Idle);
    }

    fn electric_brake(&mut self) {
        self.command.set_brake();
        self.force(PinPattern::Brake);
    }

    fn speed(&self) -> f32 {
        self.command.power() / 100.0
    }

    fn is_hard_stopped(&self) -> bool {
        self.command.braking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingPins {
        history: Vec<PinPattern>,
    }

    impl BridgePins for RecordingPins {
        fn apply(&mut self, pattern: PinPattern) {
            self.history.push(pattern);
        }
    }

    fn make_drive() -> TimerPwmDrive<RecordingPins> {
        let mut drive = TimerPwmDrive::new(RecordingPins {
            history: Vec::new(),
        });
        drive.begin();
        drive
    }

    #[test]
    fn zero_power_parks_deadline() {
        let mut drive = make_drive();
        assert_eq!(drive.on_timer_tick(), PWM_PARK_TICKS);
        assert_eq!(drive.applied_pattern(), PinPattern::Idle);
    }

    #[test]
    fn full_power_holds_constant_pattern() {
        let mut drive = make_drive();
        drive.set_power(100.0);
        assert_eq!(drive.on_timer_tick(), PWM_PARK_TICKS);
        assert_eq!(drive.applied_pattern(), PinPattern::Forward);
        // 以降のtickでもトグルしない
        assert_eq!(drive.on_timer_tick(), PWM_PARK_TICKS);
        assert_eq!(drive.applied_pattern(), PinPattern::Forward);
    }

    #[test]
    fn partial_power_alternates_on_off_ticks() {
        let mut drive = make_drive();
        drive.set_power(30.0);
        // ON位相：方向パターン、300tick
        assert_eq!(drive.on_timer_tick(), 300);
        assert_eq!(drive.applied_pattern(), PinPattern::Forward);
        // OFF位相：Idle、700tick
        assert_eq!(drive.on_timer_tick(), 700);
        assert_eq!(drive.applied_pattern(), PinPattern::Idle);
        // 再びON位相
        assert_eq!(drive.on_timer_tick(), 300);
        assert_eq!(drive.applied_pattern(), PinPattern::Forward);
    }

    #[test]
    fn power_change_reflected_next_tick() {
        let mut drive = make_drive();
        drive.set_power(30.0);
        drive.on_timer_tick();
        // OFF位相中に指令変更：次のON位相から新しいtick数と方向
        drive.set_power(-60.0);
        drive.on_timer_tick(); // OFF位相（Idle）の消化
        assert_eq!(drive.applied_pattern(), PinPattern::Idle);
        assert_eq!(drive.on_timer_tick(), 600);
        assert_eq!(drive.applied_pattern(), PinPattern::Reverse);
    }

    #[test]
    fn brake_overrides_pwm_until_new_command() {
        let mut drive = make_drive();
        drive.set_power(80.0);
        drive.on_timer_tick();
        assert_eq!(drive.applied_pattern(), PinPattern::Forward);

        drive.electric_brake();
        assert_eq!(drive.applied_pattern(), PinPattern::Brake);
        for _ in 0..4 {
            assert_eq!(drive.on_timer_tick(), PWM_PARK_TICKS);
            assert_eq!(drive.applied_pattern(), PinPattern::Brake);
        }

        drive.set_power(80.0);
        drive.on_timer_tick();
        assert_eq!(drive.applied_pattern(), PinPattern::Forward);
    }

    #[test]
    fn no_adjacent_direction_reversal() {
        let mut drive = make_drive();
        drive.set_power(100.0);
        drive.on_timer_tick();
        drive.set_power(-100.0);
        for _ in 0..6 {
            drive.on_timer_tick();
        }
        for pair in drive.pins.history.windows(2) {
            let adjacent_reversal = (pair[0] == PinPattern::Forward
                && pair[1] == PinPattern::Reverse)
                || (pair[0] == PinPattern::Reverse && pair[1] == PinPattern::Forward);
            assert!(!adjacent_reversal);
        }
    }
}
