//! ドライブステージ抽象化
//!
//! 符号付きパワー指令（-100%～+100%）をHブリッジの排他的な
//! 出力パターンへ変換します。PWM生成戦略は2種類あり、同一の
//! [`DriveControl`]契約の下で差し替え可能です：
//!
//! - [`SoftPwmDrive`]: 協調ループから`service()`を呼ぶポーリング方式
//! - [`TimerPwmDrive`]: ハードウェアタイマ割り込みで位相をトグルする方式

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub mod soft_pwm;
pub mod timer_pwm;

pub use soft_pwm::SoftPwmDrive;
pub use timer_pwm::TimerPwmDrive;

use crate::params::POWER_DEADBAND_PERCENT;

/// Hブリッジ出力パターン
///
/// 常にいずれか1つだけが適用される。同一レッグの上下が同時に
/// 有効になる組み合わせは存在しない（短絡防止）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinPattern {
    /// 全スイッチOFF（コースト）
    Idle,
    /// Aレッグ上段 + Bレッグ下段ON（CW回転）
    Forward,
    /// Bレッグ上段 + Aレッグ下段ON（CCW回転）
    Reverse,
    /// 電磁ブレーキ（上段同士でモーターを短絡、下段は常にOFF）
    Brake,
}

/// 物理出力ラインへの唯一のシーム
///
/// 実装側はパターンごとのゲート駆動シーケンス（break-before-make等）に責任を持つ。
pub trait BridgePins {
    /// 指定パターンを出力ラインへ適用する
    fn apply(&mut self, pattern: PinPattern);
}

/// ドライブステージの共通契約
///
/// モード状態機械とデバッグコンソールはこのトレイト経由でのみ
/// 出力を操作する（ピンの排他所有を守るため）。
pub trait DriveControl {
    /// 出力ラインを駆動可能に構成し、Idleパターンを強制する
    fn begin(&mut self);

    /// パワー指令を設定する [-100, +100]（範囲外は黙ってクランプ）
    ///
    /// 出力パターンは即時には変わらず、次のPWM tick/割り込みで反映される。
    /// ブレーキフラグは解除される。
    fn set_power(&mut self, percent: f32);

    /// パワー指令を[-1, +1]スケールで設定する
    fn set_power_unit(&mut self, unit: f32) {
        self.set_power(unit.clamp(-1.0, 1.0) * 100.0);
    }

    /// パワー指令を0にし、Idleパターンを即時適用する
    fn idle(&mut self);

    /// パワー指令を0にし、ブレーキパターンを即時適用してラッチする
    ///
    /// `set_power()`または`idle()`が呼ばれるまでブレーキが維持される。
    fn electric_brake(&mut self);

    /// 現在のパワー指令を[-1, +1]スケールで返す（表示用）
    fn speed(&self) -> f32;

    /// ブレーキラッチ中かどうか
    fn is_hard_stopped(&self) -> bool;
}

/// フォアグラウンドとPWM生成コンテキスト間で共有されるパワー指令セル
///
/// f32のビット表現をAtomicU32に格納する。割り込みハンドラは
/// 最後にコミットされた値だけを読み、途中値（tearing）を観測しない。
pub struct PowerCell {
    power_bits: AtomicU32,
    brake: AtomicBool,
}

impl PowerCell {
    pub const fn new() -> Self {
        Self {
            power_bits: AtomicU32::new(0),
            brake: AtomicBool::new(false),
        }
    }

    /// パワー指令をコミットする（[-100, 100]にクランプ、ブレーキ解除）
    pub fn set(&self, percent: f32) {
        let clamped = percent.clamp(-100.0, 100.0);
        self.power_bits.store(clamped.to_bits(), Ordering::Release);
        self.brake.store(false, Ordering::Release);
    }

    /// パワー指令を0にする（ブレーキフラグは変更しない）
    pub fn zero(&self) {
        self.power_bits.store(0f32.to_bits(), Ordering::Release);
    }

    /// パワー指令を0にしてブレーキフラグをラッチする
    pub fn set_brake(&self) {
        self.power_bits.store(0f32.to_bits(), Ordering::Release);
        self.brake.store(true, Ordering::Release);
    }

    /// ブレーキフラグを解除する
    pub fn clear_brake(&self) {
        self.brake.store(false, Ordering::Release);
    }

    /// 最後にコミットされたパワー指令 [%]
    pub fn power(&self) -> f32 {
        f32::from_bits(self.power_bits.load(Ordering::Acquire))
    }

    /// ブレーキラッチ中か
    pub fn braking(&self) -> bool {
        self.brake.load(Ordering::Acquire)
    }
}

impl Default for PowerCell {
    fn default() -> Self {
        Self::new()
    }
}

/// パワー指令の符号から方向パターンを決定する
///
/// デッドバンド未満の大きさは回転要求なしとみなす。ちょうど0は
/// 必ずIdleに解決される（Forward/Reverseには決してならない）。
#[inline]
pub(crate) fn directional_pattern(power: f32) -> Option<PinPattern> {
    if libm::fabsf(power) < POWER_DEADBAND_PERCENT {
        None
    } else if power > 0.0 {
        Some(PinPattern::Forward)
    } else {
        Some(PinPattern::Reverse)
    }
}

/// 今回の適用ステップで実際に出すパターンを決める
///
/// Forward↔Reverseの直接遷移は必ず1適用ステップ以上Idleを経由させる。
#[inline]
pub(crate) fn step_pattern(applied: PinPattern, want: PinPattern) -> PinPattern {
    match (applied, want) {
        (PinPattern::Forward, PinPattern::Reverse) | (PinPattern::Reverse, PinPattern::Forward) => {
            PinPattern::Idle
        }
        _ => want,
    }
}
