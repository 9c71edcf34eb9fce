#![no_std]
#![no_main]

mod fmt;

mod battery;
mod config;
mod eeprom;
mod hardware;
mod knob;
mod motor;
#[cfg(feature = "timer-pwm")]
mod pwm_tim;
mod state;
mod tasks;
mod usage;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::{
    adc::{Adc, AdcChannel, SampleTime},
    crc::{Config as CrcConfig, Crc},
    flash::Flash,
    gpio::{Input, Level, Output, Pull, Speed},
    usart::{self, Uart},
    wdg::IndependentWatchdog,
};
use embassy_time::{Duration, Timer};

use drillctl::drive::DriveControl;
use drillctl::modes::{DriveMode, ManualMode, ModeDispatcher, MomentumMode, TapMode};

use hardware::Irqs;
use motor::GatePins;
use tasks::{
    battery_task, buttons_task, console_task, drive_control_task, status_task, usage_commit_task,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // ハードウェア初期化
    let config = hardware::create_clock_config();
    let p = embassy_stm32::init(config);

    info!("═══════════════════════════════════════════════");
    info!("");
    info!("    DRILLCTL • Tapping Tool Motor Controller");
    info!("    STM32G431VB @ 170MHz");
    info!("");
    info!("═══════════════════════════════════════════════");

    // フラッシュとCRC初期化（使用実績ロード用）
    let mut flash = Flash::new_blocking(p.FLASH);

    // CRC初期化（STM32デフォルト設定: CRC-32、poly=0x04C11DB7）
    let crc_config = CrcConfig::new(
        embassy_stm32::crc::InputReverseConfig::None,
        false, // reverse_out
        embassy_stm32::crc::PolySize::Width32,
        0xFFFFFFFF, // crc_init_value
        0x04C11DB7, // crc_poly (CRC-32)
    )
    .unwrap();
    let mut crc = Crc::new(p.CRC, crc_config);

    // 使用実績をフラッシュから読み込み（失敗時はゼロ初期化）
    info!("Loading usage counters from flash...");
    let record = eeprom::load_or_initialize(&mut flash, &mut crc);
    state::USAGE.lock().await.load(record);

    // ゲート出力初期化（Idle状態: Pch両オフ=High、Nch両オフ=Low）
    let gate_pins = GatePins::new(
        Output::new(p.PA8, Level::High, Speed::VeryHigh),
        Output::new(p.PB0, Level::High, Speed::VeryHigh),
        Output::new(p.PA9, Level::Low, Speed::VeryHigh),
        Output::new(p.PB1, Level::Low, Speed::VeryHigh),
    );

    #[cfg(not(feature = "timer-pwm"))]
    {
        let mut drive = drillctl::SoftPwmDrive::new(gate_pins);
        drive.set_period_us(config::SOFT_PWM_PERIOD_US);
        drive.begin();
        motor::install(drive);
        info!("Drive stage ready (soft PWM, {}us period)", config::SOFT_PWM_PERIOD_US);
    }

    #[cfg(feature = "timer-pwm")]
    {
        let mut drive = drillctl::TimerPwmDrive::new(gate_pins);
        drive.begin();
        motor::install(drive);
        // TIM7割り込み開始はドライブ登録後
        unsafe {
            pwm_tim::init_pwm_timer();
        }
        info!("Drive stage ready (TIM7 interrupt PWM)");
    }

    // モードディスパッチャ構築（Manual x2 → Tap x6 → Momentum x2）
    let dispatcher = ModeDispatcher::new([
        DriveMode::Manual(ManualMode::new("Manual CW", 1)),
        DriveMode::Manual(ManualMode::new("Manual CCW", -1)),
        DriveMode::Tap(TapMode::new(&config::TAP_CONFIGS[0])),
        DriveMode::Tap(TapMode::new(&config::TAP_CONFIGS[1])),
        DriveMode::Tap(TapMode::new(&config::TAP_CONFIGS[2])),
        DriveMode::Tap(TapMode::new(&config::TAP_CONFIGS[3])),
        DriveMode::Tap(TapMode::new(&config::TAP_CONFIGS[4])),
        DriveMode::Tap(TapMode::new(&config::TAP_CONFIGS[5])),
        DriveMode::Momentum(MomentumMode::new("Momentum CW", 1)),
        DriveMode::Momentum(MomentumMode::new("Momentum CCW", -1)),
    ]);

    // ADC初期化
    let mut adc1 = Adc::new(p.ADC1);
    adc1.set_sample_time(SampleTime::CYCLES640_5);
    let mut adc2 = Adc::new(p.ADC2);
    adc2.set_sample_time(SampleTime::CYCLES640_5);

    let knob_pin = p.PA0.degrade_adc();
    let battery_pin = p.PC1.degrade_adc();

    // ボタン初期化（アクティブLow、内部プルアップ）
    let button_next = Input::new(p.PC4, Pull::Up);
    let button_prev = Input::new(p.PC5, Pull::Up);

    // コンソールUART初期化（USART2、115200bps）
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = 115_200;
    let uart = Uart::new(
        p.USART2,
        p.PA3,
        p.PA2,
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        uart_config,
    )
    .unwrap();
    let (_tx, uart_rx) = uart.split();

    // ウォッチドッグ開始（制御タスクが毎イテレーション餌をやる）
    let mut wdg = IndependentWatchdog::new(p.IWDG, config::WATCHDOG_TIMEOUT_US);
    wdg.unleash();

    // タスク起動
    spawner
        .spawn(drive_control_task(dispatcher, adc1, knob_pin, wdg))
        .unwrap();
    spawner.spawn(buttons_task(button_next, button_prev)).unwrap();
    spawner.spawn(console_task(uart_rx)).unwrap();
    spawner.spawn(battery_task(adc2, battery_pin)).unwrap();
    spawner.spawn(status_task()).unwrap();
    spawner.spawn(usage_commit_task(flash, crc)).unwrap();

    info!("Ready. Modes: 10");

    // メインループ（将来の拡張用）
    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
