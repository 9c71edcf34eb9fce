//! ソフトウェアPWM方式のドライブステージ
//!
//! 協調的メインループから毎イテレーション`service()`を呼び出すことで
//! PWMを生成する。周期境界とON時間の比較はすべて呼び出し側から渡される
//! `now_us`に基づくため、ジッタはループのtick粒度に制限される。

use super::{directional_pattern, step_pattern, BridgePins, DriveControl, PinPattern, PowerCell};
use crate::params::DEFAULT_PWM_PERIOD_US;

/// ポーリング方式のドライブステージ
pub struct SoftPwmDrive<P: BridgePins> {
    pins: P,
    command: PowerCell,
    period_us: u32,
    cycle_start_us: u32,
    applied: PinPattern,
}

impl<P: BridgePins> SoftPwmDrive<P> {
    pub fn new(pins: P) -> Self {
        Self {
            pins,
            command: PowerCell::new(),
            period_us: DEFAULT_PWM_PERIOD_US,
            cycle_start_us: 0,
            applied: PinPattern::Idle,
        }
    }

    /// PWM周期を変更する [µs]
    pub fn set_period_us(&mut self, period_us: u32) {
        self.period_us = period_us.max(1);
    }

    /// 現在適用中の出力パターン
    pub fn applied_pattern(&self) -> PinPattern {
        self.applied
    }

    /// 毎制御ループで呼び出すPWMサービス
    ///
    /// 現在周期内の経過時間とON時間を比較し、方向パターンまたは
    /// Idle（OFF位相のコースト）を適用する。
    pub fn service(&mut self, now_us: u32) {
        if self.command.braking() {
            self.apply(PinPattern::Brake);
            return;
        }

        let power = self.command.power();
        let Some(direction) = directional_pattern(power) else {
            // デッドバンド内はPWMせずIdleを保持
            self.apply(PinPattern::Idle);
            return;
        };

        // 周期境界チェック
        if now_us.wrapping_sub(self.cycle_start_us) >= self.period_us {
            self.cycle_start_us = now_us;
        }

        let on_time_us = (libm::fabsf(power) / 100.0 * self.period_us as f32) as u32;
        if now_us.wrapping_sub(self.cycle_start_us) < on_time_us {
            self.apply(direction);
        } else {
            self.apply(PinPattern::Idle);
        }
    }

    fn apply(&mut self, want: PinPattern) {
        let next = step_pattern(self.applied, want);
        if next != self.applied {
            self.pins.apply(next);
            self.applied = next;
        }
    }

    /// 初回適用を強制する（begin/idle/brake用、差分判定なし）
    fn force(&mut self, pattern: PinPattern) {
        self.pins.apply(pattern);
        self.applied = pattern;
    }
}

impl<P: BridgePins> DriveControl for SoftPwmDrive<P> {
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
