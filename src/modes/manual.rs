//! マニュアル（ジョグ）モード
//!
//! ノブ値をそのままパワー指令に変換する。回転方向は構築時に固定
//! （CW/CCWで1インスタンスずつ）。運転時間は分単位アキュムレータ経由で
//! 使用実績ロガーへ報告する。

use crate::drive::DriveControl;
use crate::logging::{Direction, RunMinutes, UsageLog};
use crate::modes::RunState;
use crate::params::MANUAL_KNOB_THRESHOLD;

pub struct ManualMode {
    name: &'static str,
    direction: i8,
    state: RunState,
    minutes: RunMinutes,
}

impl ManualMode {
    /// `direction`は+1（CW）または-1（CCW）
    pub const fn new(name: &'static str, direction: i8) -> Self {
        Self {
            name,
            direction,
            state: RunState::Idle,
            minutes: RunMinutes::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    fn log_direction(&self) -> Direction {
        if self.direction >= 0 {
            Direction::Cw
        } else {
            Direction::Ccw
        }
    }

    pub fn begin(&mut self) {
        self.state = RunState::Idle;
        self.minutes.halt();
    }

    pub fn step<D: DriveControl, L: UsageLog>(
        &mut self,
        drive: &mut D,
        log: &mut L,
        knob: f32,
        now_ms: u32,
    ) {
        if knob > MANUAL_KNOB_THRESHOLD {
            drive.set_power_unit(knob * self.direction as f32);
            self.state = RunState::Running;
            self.minutes.tick(now_ms, self.log_direction(), log);
        } else {
            drive.set_power_unit(0.0);
            self.state = RunState::Idle;
            self.minutes.halt();
        }
    }

    pub fn stop<D: DriveControl>(&mut self, drive: &mut D) {
        drive.set_power_unit(0.0);
        self.state = RunState::Idle;
        self.minutes.halt();
    }
}
