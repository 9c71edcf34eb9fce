//! ステータス配信タスク
//!
//! 40ms周期でステータスフレームを組み立てて消費する
//! （表示デバイス接続時はここがフィードになる）。2秒ごとに
//! デバッグ用の要約を1行ログに出します。

use embassy_time::{Duration, Instant, Ticker};

use crate::state::{BATTERY, STATUS};
use crate::config::{DEBUG_LOG_INTERVAL_MS, STATUS_INTERVAL_MS};

/// ステータス配信タスク
#[embassy_executor::task]
pub async fn status_task() {
    info!("Status task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATUS_INTERVAL_MS));
    let mut last_log_ms = 0u64;

    loop {
        ticker.next().await;

        // バッテリー残量をフレームへ取り込む
        let battery = *BATTERY.lock().await;
        let frame = {
            let mut status = STATUS.lock().await;
            status.battery_percent = battery.percent;
            *status
        };

        let now_ms = Instant::now().as_millis();
        if now_ms - last_log_ms >= DEBUG_LOG_INTERVAL_MS {
            last_log_ms = now_ms;
            debug!(
                "Mode: {} [{}] Speed: {} Progress: {} Battery: {}%",
                frame.mode_name,
                frame.mode_index,
                frame.motor_speed,
                frame.sequence_progress,
                frame.battery_percent
            );
        }
    }
}
