//! デバッグコンソールのコマンドパーサ
//!
//! 1文字コマンドでドライブステージを直接操作する。モード状態には
//! 一切触れない：モードは次のtickで自分の指令を再発行するだけなので、
//! コンソールからの上書きでモード内部が壊れることはない。
//!
//! コマンド一覧:
//! - `a` / `d` : パワーを±10%ステップ（クランプあり）
//! - `0`〜`9` : 絶対パワーを数字×10%に設定（現在の符号を引き継ぐ）
//! - `r`      : 回転方向（符号）を反転
//! - `s`      : 電気ブレーキ
//! - `l`      : 使用実績カウンタのダンプ要求
//! - その他   : Idleに戻す

use crate::drive::DriveControl;
use crate::params::CONSOLE_POWER_STEP;

/// パーサが呼び出し側へ委譲するアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    /// 追加アクションなし（ドライブ操作は適用済み）
    None,
    /// 使用実績カウンタをダンプする
    DumpCounters,
}

/// コンソールの上書きパワー状態
pub struct Console {
    power: f32,
    /// 数字コマンドが引き継ぐ符号（+1.0 / -1.0）
    sign: f32,
}

impl Console {
    pub const fn new() -> Self {
        Self {
            power: 0.0,
            sign: 1.0,
        }
    }

    /// 現在の上書きパワー [%]
    pub fn power(&self) -> f32 {
        self.power
    }

    /// 受信した1バイトを処理し、ドライブへ即時反映する
    pub fn handle<D: DriveControl>(&mut self, byte: u8, drive: &mut D) -> ConsoleAction {
        match byte {
            b'a' => {
                self.set_and_apply(self.power + CONSOLE_POWER_STEP, drive);
                info!("console: power {}", self.power);
            }
            b'd' => {
                self.set_and_apply(self.power - CONSOLE_POWER_STEP, drive);
                info!("console: power {}", self.power);
            }
            b'0'..=b'9' => {
                let magnitude = (byte - b'0') as f32 * 10.0;
                self.set_and_apply(magnitude * self.sign, drive);
                info!("console: power {}", self.power);
            }
            b'r' => {
                self.sign = -self.sign;
                self.set_and_apply(self.power * -1.0, drive);
                info!("console: reverse, power {}", self.power);
            }
            b's' => {
                self.power = 0.0;
                drive.electric_brake();
                info!("console: brake");
            }
            b'l' => {
                return ConsoleAction::DumpCounters;
            }
            _ => {
                self.power = 0.0;
                drive.idle();
                info!("console: idle");
            }
        }
        ConsoleAction::None
    }

    fn set_and_apply<D: DriveControl>(&mut self, power: f32, drive: &mut D) {
        self.power = power.clamp(-100.0, 100.0);
        if self.power != 0.0 {
            self.sign = if self.power > 0.0 { 1.0 } else { -1.0 };
        }
        drive.set_power(self.power);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
