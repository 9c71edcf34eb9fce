//! グローバル共有状態管理
//!
//! タスク間で共有される状態をMutexで保護して管理します。

use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;

use crate::battery::BatteryState;
use crate::usage::UsageCounters;

/// 表示系へ渡すステータスフレーム
#[derive(Copy, Clone)]
pub struct StatusFrame {
    /// 現在モード名
    pub mode_name: &'static str,
    /// 現在モード番号
    pub mode_index: u8,
    /// モーター速度 [-1,1]
    pub motor_speed: f32,
    /// タップシーケンス進捗 [0,1]（非アクティブ時-1）
    pub sequence_progress: f32,
    /// バッテリー残量 [0-100]
    pub battery_percent: u8,
}

impl StatusFrame {
    pub const fn new() -> Self {
        Self {
            mode_name: "",
            mode_index: 0,
            motor_speed: 0.0,
            sequence_progress: -1.0,
            battery_percent: 0,
        }
    }
}

/// モード切替ボタンのエッジイベント
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum ButtonEvent {
    Next,
    Prev,
}

/// 最新ステータス（表示タスクが消費）
pub static STATUS: Mutex<ThreadModeRawMutex, StatusFrame> = Mutex::new(StatusFrame::new());

/// バッテリー監視の最新状態
pub static BATTERY: Mutex<ThreadModeRawMutex, BatteryState> = Mutex::new(BatteryState::new());

/// 使用実績カウンタ（モードから加算、コミットタスクが書き戻し）
pub static USAGE: Mutex<ThreadModeRawMutex, UsageCounters> = Mutex::new(UsageCounters::new());

/// ボタンエッジイベントのキュー
pub static BUTTON_EVENTS: Channel<ThreadModeRawMutex, ButtonEvent, 8> = Channel::new();
