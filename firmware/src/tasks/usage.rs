//! 使用実績コミットタスク
//!
//! カウンタ更新のたびにフラッシュページを消去すると寿命が持たないため、
//! dirtyなレコードを周期的にまとめて書き戻します。

use embassy_stm32::crc::Crc;
use embassy_stm32::flash::Flash;
use embassy_time::{Duration, Ticker};

use crate::config::flash::COMMIT_INTERVAL_MS;
use crate::eeprom;
use crate::state::USAGE;

/// 使用実績の周期コミットタスク
#[embassy_executor::task]
pub async fn usage_commit_task(mut flash: Flash<'static>, mut crc: Crc<'static>) {
    info!("Usage commit task started");

    let mut ticker = Ticker::every(Duration::from_millis(COMMIT_INTERVAL_MS));

    loop {
        ticker.next().await;

        let pending = USAGE.lock().await.take_dirty();
        if let Some(mut record) = pending {
            if let Err(e) = eeprom::write_record(&mut flash, &mut crc, &mut record) {
                error!("Usage commit failed: {:?}", e);
            }
        }
    }
}
