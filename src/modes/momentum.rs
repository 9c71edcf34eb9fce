//! 慣性（モメンタム）ジョグモード
//!
//! 目標速度（ノブ×方向）へ向かって実速度を非対称レートでランプさせる。
//! 回転方向へ向かう変化は速く、離れる変化は遅い（モーター＋工具の
//! 慣性非対称のモデル化）。dtを安定させるため更新は最小tick間隔で
//! スロットリングする。

use crate::drive::DriveControl;
use crate::modes::RunState;
use crate::params::{
    MOMENTUM_RATE_FAST, MOMENTUM_RATE_SLOW, MOMENTUM_SPEED_EPSILON, MOMENTUM_TICK_MS,
};

pub struct MomentumMode {
    name: &'static str,
    direction: i8,
    current_speed: f32,
    target_speed: f32,
    last_update_ms: u32,
    state: RunState,
}

impl MomentumMode {
    /// `direction`は+1（CW）または-1（CCW）
    pub const fn new(name: &'static str, direction: i8) -> Self {
        Self {
            name,
            direction,
            current_speed: 0.0,
            target_speed: 0.0,
            last_update_ms: 0,
            state: RunState::Idle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// 現在のランプ済み速度 [-1, 1]
    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn begin(&mut self, now_ms: u32) {
        self.current_speed = 0.0;
        self.target_speed = 0.0;
        self.last_update_ms = now_ms;
        self.state = RunState::Idle;
    }

    pub fn step<D: DriveControl>(&mut self, drive: &mut D, knob: f32, now_ms: u32) {
        self.target_speed = knob * self.direction as f32;

        let elapsed = now_ms.wrapping_sub(self.last_update_ms);
        if elapsed <= MOMENTUM_TICK_MS {
            return;
        }
        let dt = elapsed as f32 / 1000.0;
        self.last_update_ms = now_ms;

        // CWインスタンスは正方向への変化が速く、CCWインスタンスはその鏡像
        let (rate_up, rate_down) = if self.direction == -1 {
            (MOMENTUM_RATE_SLOW, MOMENTUM_RATE_FAST)
        } else {
            (MOMENTUM_RATE_FAST, MOMENTUM_RATE_SLOW)
        };

        if self.target_speed > self.current_speed {
            self.current_speed += rate_up * dt;
            if self.current_speed > self.target_speed {
                self.current_speed = self.target_speed;
            }
        } else if self.target_speed < self.current_speed {
            self.current_speed -= rate_down * dt;
            if self.current_speed < self.target_speed {
                self.current_speed = self.target_speed;
            }
        }

        drive.set_power_unit(self.current_speed);

        if libm::fabsf(self.current_speed) > MOMENTUM_SPEED_EPSILON {
            self.state = RunState::Running;
        } else {
            self.state = RunState::Idle;
        }
    }

    pub fn stop<D: DriveControl>(&mut self, drive: &mut D) {
        self.target_speed = 0.0;
        self.state = RunState::Idle;
        drive.set_power_unit(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{BridgePins, PinPattern, SoftPwmDrive};

    struct DummyPins;
    impl BridgePins for DummyPins {
        fn apply(&mut self, _pattern: PinPattern) {}
    }

    fn make_drive() -> SoftPwmDrive<DummyPins> {
        let mut d = SoftPwmDrive::new(DummyPins);
        d.begin();
        d
    }

    /// knobを一定に保ってt_endまで20msごとにstepする
    fn run_until(mode: &mut MomentumMode, drive: &mut SoftPwmDrive<DummyPins>, knob: f32, from_ms: u32, to_ms: u32) {
        let mut now = from_ms;
        while now <= to_ms {
            mode.step(drive, knob, now);
            now += 20;
        }
    }

    #[test]
    fn ramps_toward_target_not_instantly() {
        let mut mode = MomentumMode::new("Momentum CW", 1);
        let mut drive = make_drive();
        mode.begin(0);

        run_until(&mut mode, &mut drive, 1.0, 0, 100);
        let early = mode.current_speed();
        assert!(early > 0.0 && early < 1.0, "speed = {}", early);

        // レート2.0/sなら500msあれば1.0に到達
        run_until(&mut mode, &mut drive, 1.0, 120, 700);
        assert_eq!(mode.current_speed(), 1.0);
        assert_eq!(mode.run_state(), RunState::Running);
    }

    #[test]
    fn acceleration_faster_than_deceleration() {
        let mut mode = MomentumMode::new("Momentum CW", 1);
        let mut drive = make_drive();

        // 加速：0 → 1.0までの所要時間を測る
        mode.begin(0);
        let mut now = 0u32;
        while mode.current_speed() < 1.0 {
            now += 20;
            mode.step(&mut drive, 1.0, now);
            assert!(now < 10_000);
        }
        let accel_ms = now;

        // 減速：1.0 → ほぼ0までの所要時間
        let decel_start = now;
        while mode.current_speed() > MOMENTUM_SPEED_EPSILON {
            now += 20;
            mode.step(&mut drive, 0.0, now);
            assert!(now < 60_000);
        }
        let decel_ms = now - decel_start;

        assert!(
            decel_ms > accel_ms * 3,
            "accel {}ms decel {}ms",
            accel_ms,
            decel_ms
        );
    }

    #[test]
    fn ccw_instance_mirrors_rates() {
        let mut cw = MomentumMode::new("Momentum CW", 1);
        let mut ccw = MomentumMode::new("Momentum CCW", -1);
        let mut drive = make_drive();

        cw.begin(0);
        ccw.begin(0);
        run_until(&mut cw, &mut drive, 1.0, 0, 500);
        run_until(&mut ccw, &mut drive, 1.0, 0, 500);

        // CCWは回転方向（負側）への変化が速い：同じ時間でより深く到達
        assert_eq!(cw.current_speed(), 1.0);
        assert_eq!(ccw.current_speed(), -1.0);

        // 戻り（0へ）の比較：CWは遅く、CCWも遅い（対称性の確認）
        run_until(&mut cw, &mut drive, 0.0, 520, 1000);
        run_until(&mut ccw, &mut drive, 0.0, 520, 1000);
        assert!(cw.current_speed() > 0.5);
        assert!(ccw.current_speed() < -0.5);
    }

    #[test]
    fn run_state_tracks_speed_magnitude() {
        let mut mode = MomentumMode::new("Momentum CW", 1);
        let mut drive = make_drive();
        mode.begin(0);
        assert_eq!(mode.run_state(), RunState::Idle);

        run_until(&mut mode, &mut drive, 1.0, 0, 200);
        assert_eq!(mode.run_state(), RunState::Running);
    }
}
