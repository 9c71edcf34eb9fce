//! デバッグコンソールタスク
//!
//! UARTから1バイトずつ受信してコマンドパーサへ渡します。
//! コマンドはモードを迂回してドライブステージを直接操作するが、
//! 同じ`DriveControl`エントリポイントを通るため排他パターンの
//! 不変条件は保たれる。

use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartRx;

use drillctl::console::{Console, ConsoleAction};

use crate::motor;
use crate::state::USAGE;

/// コンソール受信タスク
#[embassy_executor::task]
pub async fn console_task(mut rx: UartRx<'static, Async>) {
    info!("Console task started (a/d: step, 0-9: set, r: reverse, s: brake, l: dump)");

    let mut console = Console::new();
    let mut buf = [0u8; 1];

    loop {
        match rx.read(&mut buf).await {
            Ok(()) => {
                let action = motor::with_drive(|drive| console.handle(buf[0], drive));
                if let Some(ConsoleAction::DumpCounters) = action {
                    USAGE.lock().await.dump();
                }
            }
            Err(e) => {
                warn!("Console read error: {:?}", e);
            }
        }
    }
}
