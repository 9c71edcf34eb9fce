//! バッテリー監視タスク
//!
//! 分圧入力をADC2で読み、フィルタ済み電圧と残量パーセントを
//! ステータス用に公開します。

use embassy_stm32::adc::{Adc, AnyAdcChannel};
use embassy_stm32::peripherals;
use embassy_time::{Duration, Ticker};

use crate::battery::BatteryMonitor;
use crate::config::battery::POLL_INTERVAL_MS;
use crate::state::BATTERY;

/// バッテリー監視タスク
#[embassy_executor::task]
pub async fn battery_task(
    mut adc: Adc<'static, peripherals::ADC2>,
    mut battery_pin: AnyAdcChannel<peripherals::ADC2>,
) {
    info!("Battery monitor task started");

    let mut monitor = BatteryMonitor::new();

    // 初回読み取りでフィルタを初期化（起動時の残量0%誤検出を防ぐ）
    let initial_adc = adc.blocking_read(&mut battery_pin);
    monitor.initialize_with_adc(initial_adc);
    let state = monitor.state();
    info!(
        "Initial battery: {}V ({}%), ADC raw: {}",
        state.voltage, state.percent, initial_adc
    );

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    loop {
        ticker.next().await;

        let adc_raw = adc.blocking_read(&mut battery_pin);
        let state = monitor.update(adc_raw);

        *BATTERY.lock().await = state;
    }
}
