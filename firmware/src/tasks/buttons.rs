//! モード切替ボタンタスク
//!
//! next/prevボタン（アクティブLow、内部プルアップ）を20msで
//! ポーリングし、押下エッジをイベントとして制御タスクへ送ります。

use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Ticker};

use crate::config::BUTTON_POLL_MS;
use crate::state::{ButtonEvent, BUTTON_EVENTS};

/// ボタンポーリングタスク
#[embassy_executor::task]
pub async fn buttons_task(next: Input<'static>, prev: Input<'static>) {
    info!("Buttons task started");

    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_POLL_MS));

    let mut last_next = false;
    let mut last_prev = false;

    loop {
        ticker.next().await;

        let next_pressed = next.is_low();
        let prev_pressed = prev.is_low();

        if next_pressed && !last_next {
            // キューが詰まっていたら捨てる（次のエッジで拾えばよい）
            let _ = BUTTON_EVENTS.try_send(ButtonEvent::Next);
        }
        if prev_pressed && !last_prev {
            let _ = BUTTON_EVENTS.try_send(ButtonEvent::Prev);
        }

        last_next = next_pressed;
        last_prev = prev_pressed;
    }
}
