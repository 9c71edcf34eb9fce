//! 携帯型タッピングツール用モーター制御コア
//!
//! 単一のパワー指令（±100%）を安全なHブリッジ出力パターンに変換する
//! ドライブステージと、ドリルモード（手動・慣性・タッピングシーケンス）の
//! 状態機械を提供します。
//!
//! ハードウェア依存を持たないため、`std`フィーチャー有効時はホスト上で
//! テスト可能です。時刻はすべて引数（`now_ms` / `now_us`）として渡されます。
#![cfg_attr(not(feature = "std"), no_std)]

mod fmt;

pub mod console;
pub mod drive;
pub mod logging;
pub mod modes;
pub mod params;

pub use console::{Console, ConsoleAction};
pub use drive::{BridgePins, DriveControl, PinPattern, SoftPwmDrive, TimerPwmDrive};
pub use logging::{Direction, NullUsageLog, RunMinutes, UsageLog};
pub use modes::{
    DriveMode, ManualMode, ModeDispatcher, MomentumMode, RunState, TapConfig, TapCycle, TapMode,
};
