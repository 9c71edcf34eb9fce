//! Hブリッジのゲート出力と共有ドライブステージ
//!
//! ハイサイドはPch FET（アクティブLow）、ローサイドはNch FET
//! （アクティブHigh）。Idleは全FETオフのコースト、Brakeは
//! ハイサイド両Pchをオンにしてモーターを短絡する。Brake適用時は
//! 必ず一度Idleを経由し、Nchが残った状態でPchを開かない。
//!
//! ドライブステージはハードウェア1系統につき1インスタンス。
//! コンソールタスクと（timer-pwm時は）TIM7割り込みからも触るため、
//! `critical_section::Mutex`で包んだstaticに置き、`with_drive`経由で
//! 短いクリティカルセクション内だけアクセスする。

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_stm32::gpio::Output;

use drillctl::drive::{BridgePins, PinPattern};

#[cfg(not(feature = "timer-pwm"))]
use drillctl::drive::SoftPwmDrive;
#[cfg(feature = "timer-pwm")]
use drillctl::drive::TimerPwmDrive;

/// 4本のゲート出力
pub struct GatePins {
    high_a: Output<'static>,
    high_b: Output<'static>,
    low_a: Output<'static>,
    low_b: Output<'static>,
}

impl GatePins {
    pub fn new(
        high_a: Output<'static>,
        high_b: Output<'static>,
        low_a: Output<'static>,
        low_b: Output<'static>,
    ) -> Self {
        Self {
            high_a,
            high_b,
            low_a,
            low_b,
        }
    }

    /// 全FETオフ（コースト）
    fn set_idle(&mut self) {
        self.high_a.set_high();
        self.high_b.set_high();
        self.low_a.set_low();
        self.low_b.set_low();
    }
}

impl BridgePins for GatePins {
    fn apply(&mut self, pattern: PinPattern) {
        match pattern {
            PinPattern::Idle => self.set_idle(),
            PinPattern::Forward => {
                self.high_b.set_high();
                self.high_a.set_low();
                self.low_b.set_low();
                self.low_a.set_high();
            }
            PinPattern::Reverse => {
                self.high_a.set_high();
                self.high_b.set_low();
                self.low_a.set_low();
                self.low_b.set_high();
            }
            PinPattern::Brake => {
                // Nchを確実に切ってからPch両オンで短絡する
                self.set_idle();
                self.high_a.set_low();
                self.high_b.set_low();
                self.low_a.set_low();
                self.low_b.set_low();
            }
        }
    }
}

#[cfg(not(feature = "timer-pwm"))]
pub type Drive = SoftPwmDrive<GatePins>;
#[cfg(feature = "timer-pwm")]
pub type Drive = TimerPwmDrive<GatePins>;

static DRIVE: Mutex<RefCell<Option<Drive>>> = Mutex::new(RefCell::new(None));

/// ドライブステージをstaticに登録する（起動時に1回だけ呼ぶ）
pub fn install(drive: Drive) {
    critical_section::with(|cs| {
        DRIVE.borrow_ref_mut(cs).replace(drive);
    });
}

/// 登録済みドライブステージへのクリティカルセクション内アクセス
///
/// クロージャ内でブロックしないこと。未登録時は`None`を返す。
pub fn with_drive<R>(f: impl FnOnce(&mut Drive) -> R) -> Option<R> {
    critical_section::with(|cs| DRIVE.borrow_ref_mut(cs).as_mut().map(f))
}
