//! ドライブ制御タスク
//!
//! 1msの協調ループでモード状態機械とソフトPWMを回します。
//! ウォッチドッグは毎イテレーションで必ず餌をやる（モードロジックが
//! 1tick以内に終わらなくなったら外部リセットで再起動させる設計）。

use embassy_stm32::adc::{Adc, AnyAdcChannel};
use embassy_stm32::peripherals;
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_time::{Duration, Instant, Ticker};

use drillctl::drive::DriveControl;
use drillctl::modes::ModeDispatcher;

use crate::config::{CONTROL_TICK_MS, KNOB_READ_INTERVAL_MS, STATUS_INTERVAL_MS};
use crate::knob::knob_fraction;
use crate::motor;
use crate::state::{ButtonEvent, BUTTON_EVENTS, STATUS, USAGE};

/// ドライブ制御タスク（1ms制御ループ）
#[embassy_executor::task]
pub async fn drive_control_task(
    mut dispatcher: ModeDispatcher<10>,
    mut adc: Adc<'static, peripherals::ADC1>,
    mut knob_pin: AnyAdcChannel<peripherals::ADC1>,
    mut wdg: IndependentWatchdog<'static, peripherals::IWDG>,
) {
    info!("Drive control task started, mode: {}", dispatcher.current_name());

    // 初期モードも切替時と同じライフサイクルで開始する
    dispatcher.begin(Instant::now().as_millis() as u32);

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_TICK_MS));

    let mut knob = 0.0f32;
    let mut last_knob_read_ms = 0u32;
    let mut last_status_ms = 0u32;

    loop {
        ticker.next().await;
        wdg.pet();

        let now = Instant::now();
        let now_ms = now.as_millis() as u32;

        // ノブは10ms間隔で読む（ADCとマッピングのチャタリング抑制）
        if now_ms.wrapping_sub(last_knob_read_ms) >= KNOB_READ_INTERVAL_MS {
            last_knob_read_ms = now_ms;
            let raw = adc.blocking_read(&mut knob_pin);
            knob = knob_fraction(raw);
        }

        // ボタンイベントを処理（stop → 切替 → begin の順はディスパッチャ側）
        while let Ok(event) = BUTTON_EVENTS.try_receive() {
            let _ = motor::with_drive(|drive| match event {
                ButtonEvent::Next => dispatcher.next(drive, now_ms),
                ButtonEvent::Prev => dispatcher.prev(drive, now_ms),
            });
        }

        // モードを1tick進め、ソフトPWMをサービスする
        {
            let mut usage = USAGE.lock().await;
            let _ = motor::with_drive(|drive| {
                dispatcher.step(drive, &mut *usage, knob, now_ms);
                #[cfg(not(feature = "timer-pwm"))]
                drive.service(now.as_micros() as u32);
            });
        }

        // ステータスフレームを40ms周期で公開
        if now_ms.wrapping_sub(last_status_ms) >= STATUS_INTERVAL_MS as u32 {
            last_status_ms = now_ms;
            let speed = motor::with_drive(|drive| drive.speed()).unwrap_or(0.0);

            let mut status = STATUS.lock().await;
            status.mode_name = dispatcher.current_name();
            status.mode_index = dispatcher.current_index() as u8;
            status.motor_speed = speed;
            status.sequence_progress = dispatcher.sequence_progress(now_ms);
        }
    }
}
