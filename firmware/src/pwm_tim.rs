//! TIM7ベースの割り込み駆動PWM
//!
//! ベーシックタイマTIM7のUPDATE割り込みごとにドライブステージの
//! `on_timer_tick()`を呼び、戻り値（次の割り込みまでのtick数）を
//! ARRにリロードする。1tick = 1µs（170MHz / PSC 170）。
//!
//! ハンドラは最後にコミットされたパワー指令を読んで出力ピンを
//! 切り替えるだけで、モードロジックには一切立ち入らない。指令の
//! 書き込み側（メインループ/コンソール）とはクリティカルセクションで
//! 排他する。

use embassy_stm32::pac;

use crate::motor;

/// TIM7の初期化
///
/// # Safety
/// PACを使用した直接的なレジスタ操作を含むため、unsafe
pub unsafe fn init_pwm_timer() {
    let rcc = pac::RCC;
    let tim7 = pac::TIM7;

    // 1. クロック有効化
    rcc.apb1enr1().modify(|w| w.set_tim7en(true));

    // 2. タイマーを停止して1µs tickに設定（170MHz / 170）
    tim7.cr1().modify(|w| w.set_cen(false));
    tim7.psc().write_value(169);
    tim7.arr().write_value(pac::timer::regs::ArrCore(1000));

    // 3. UPDATE割り込みを有効化
    tim7.dier().modify(|w| w.set_uie(true));

    // 4. 割り込み有効化（NVIC）
    // ドライブ出力はEmbassyタスクより高優先度で回す
    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM7);
        let mut cp = cortex_m::Peripherals::steal();
        cp.NVIC.set_priority(pac::Interrupt::TIM7, 0x20);
    }

    // 5. カウンタをリセットしてタイマー開始
    tim7.cnt().write_value(pac::timer::regs::CntCore(0));
    tim7.sr().write(|w| w.0 = 0);
    tim7.egr().write(|w| w.set_ug(true));

    tim7.cr1().modify(|w| {
        w.set_cen(true);
        w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY);
    });
}

/// TIM7割り込みハンドラー
///
/// # Safety
/// 割り込みコンテキストで実行されるため、処理は最小限にする
#[inline(always)]
pub unsafe fn tim7_irq_handler() {
    let tim7 = pac::TIM7;

    let sr = tim7.sr().read();
    if sr.uif() {
        tim7.sr().modify(|w| w.set_uif(false));

        // 出力パターンを更新し、次のデッドラインをARRにリロード
        if let Some(next_ticks) = motor::with_drive(|drive| drive.on_timer_tick()) {
            let arr = next_ticks.min(u16::MAX as u32) as u16;
            tim7.arr()
                .write_value(pac::timer::regs::ArrCore(arr));
        }
    }
}

/// TIM7割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM7() {
    tim7_irq_handler();
}
