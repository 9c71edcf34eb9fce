//! ボード設定パラメータ
//!
//! ピン割り当て、タイミング、タッピングプリセットなど、
//! ファームウェア側で決まる定数を集約します。
//!
//! ## ピン割り当て
//! - PA8 / PA9: ブリッジA側ゲート（P-FET / N-FET）
//! - PB0 / PB1: ブリッジB側ゲート（P-FET / N-FET）
//! - PA0: 速度ノブ（ADC1_IN1）
//! - PC1: バッテリー電圧（ADC2_IN7、分圧入力）
//! - PC4 / PC5: モード切替ボタン（next / prev、アクティブLow）
//! - PA2 / PA3: デバッグコンソール（USART2 TX / RX）

use drillctl::modes::{TapConfig, TapCycle};

/// 制御ループ周期 [ms]
pub const CONTROL_TICK_MS: u64 = 1;

/// ノブADC読み取りの最小間隔 [ms]
pub const KNOB_READ_INTERVAL_MS: u32 = 10;

/// ソフトウェアPWM周期 [µs]
/// 制御ループが1msなので、デューティ分解能を確保するため20msにする
pub const SOFT_PWM_PERIOD_US: u32 = 20_000;

/// ボタンポーリング周期 [ms]
pub const BUTTON_POLL_MS: u64 = 20;

/// ステータス更新周期 [ms]
pub const STATUS_INTERVAL_MS: u64 = 40;

/// デバッグログ周期 [ms]
pub const DEBUG_LOG_INTERVAL_MS: u64 = 2_000;

/// ウォッチドッグタイムアウト [µs]
pub const WATCHDOG_TIMEOUT_US: u32 = 250_000;

/// バッテリー監視設定
pub mod battery {
    /// 監視周期 [ms]
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// 満充電とみなす電圧 [V]（5セルLi-ion想定）
    pub const VOLTAGE_MAX: f32 = 19.5;

    /// 空とみなす電圧 [V]
    pub const VOLTAGE_MIN: f32 = 14.0;

    /// 分圧抵抗の上側 [Ω]
    pub const R_UPPER: f32 = 33_300.0;

    /// 分圧抵抗の下側 [Ω]
    pub const R_LOWER: f32 = 3_300.0;

    /// ADC基準電圧 [V]
    pub const VREF: f32 = 3.3;

    /// ADC分解能（12ビット）
    pub const ADC_MAX: u16 = 4096;

    /// ローパスフィルタ係数
    pub const FILTER_ALPHA: f32 = 0.1;
}

/// ノブADC設定
pub mod knob {
    /// ポテンショメータの実効フルスケール電圧 [V]
    /// （5Vポットを分圧してADCに入れている）
    pub const FULL_SCALE_V: f32 = 5.0;

    /// ADC分解能（12ビット）
    pub const ADC_MAX: u16 = 4096;

    /// 段階マッピングの電圧しきい値 [V]
    /// levels[0]以下は0、4.5V以上は1.0
    pub const LEVELS: [f32; 8] = [1.50, 1.60, 1.80, 2.10, 2.70, 3.60, 4.50, 5.00];

    /// 段間の遷移点を手前にずらす係数
    pub const TRANSITION_FACTOR: f32 = 0.2;

    /// 非線形リマップの指数（低速側の分解能を上げる）
    pub const REMAP_EXPONENT: f32 = 1.5;
}

/// フラッシュ使用実績レコードの保存先
pub mod flash {
    /// STM32G431VBのフラッシュページサイズ（2KB）
    pub const PAGE_SIZE: usize = 2048;

    /// 最終ページ番号（ページ63、0ベース）
    pub const LAST_PAGE_NUMBER: u8 = 63;

    /// 最終ページの開始アドレス（128KB - 2KB = 0x0801F800）
    pub const LAST_PAGE_START: u32 = 0x0801F800;

    /// 使用実績のフラッシュ書き戻し周期 [ms]
    pub const COMMIT_INTERVAL_MS: u64 = 60_000;
}

/// タッピングプリセット
///
/// 材質と板厚ごとの正転/逆転サイクル表。パワーは[-1,1]単位、時間はms。
/// 方向反転を100%出力のまま行わないよう、中間に弱い方向転換
/// ステップを入れているプリセットがある。
pub static TAP_CONFIGS: [TapConfig; 6] = [
    // アクリル2mm
    TapConfig {
        name: "Tap Ac2",
        material: "Ac",
        thickness_mm: 2.0,
        cycles: &[
            TapCycle {
                forward_power: 0.2,
                forward_ms: 1200,
                backward_power: 1.0,
                backward_ms: 1000,
            },
            // 方向転換ステップ（全力のまま反転させない）
            TapCycle {
                forward_power: 0.1,
                forward_ms: 100,
                backward_power: -0.1,
                backward_ms: 200,
            },
            TapCycle {
                forward_power: -1.0,
                forward_ms: 2000,
                backward_power: -0.2,
                backward_ms: 30,
            },
        ],
    },
    // アクリル4mm（徐々に強く）
    TapConfig {
        name: "Tap Ac4",
        material: "Ac",
        thickness_mm: 4.0,
        cycles: &[
            TapCycle {
                forward_power: 0.3,
                forward_ms: 500,
                backward_power: -0.2,
                backward_ms: 400,
            },
            TapCycle {
                forward_power: 0.4,
                forward_ms: 450,
                backward_power: -0.3,
                backward_ms: 350,
            },
            TapCycle {
                forward_power: 0.5,
                forward_ms: 400,
                backward_power: -0.4,
                backward_ms: 300,
            },
            TapCycle {
                forward_power: 0.3,
                forward_ms: 300,
                backward_power: -0.9,
                backward_ms: 150,
            },
        ],
    },
    // PLA 2mm（1サイクル）
    TapConfig {
        name: "Tap PL2",
        material: "PL",
        thickness_mm: 2.0,
        cycles: &[TapCycle {
            forward_power: 0.7,
            forward_ms: 300,
            backward_power: -0.6,
            backward_ms: 250,
        }],
    },
    // PLA 4mm
    TapConfig {
        name: "Tap PL4",
        material: "PL",
        thickness_mm: 4.0,
        cycles: &[
            TapCycle {
                forward_power: 0.5,
                forward_ms: 400,
                backward_power: -0.4,
                backward_ms: 350,
            },
            TapCycle {
                forward_power: 0.6,
                forward_ms: 350,
                backward_power: -0.5,
                backward_ms: 300,
            },
            TapCycle {
                forward_power: 0.4,
                forward_ms: 200,
                backward_power: -0.8,
                backward_ms: 150,
            },
        ],
    },
    // PLA 6mm
    TapConfig {
        name: "Tap PL6",
        material: "PL",
        thickness_mm: 6.0,
        cycles: &[
            TapCycle {
                forward_power: 0.3,
                forward_ms: 600,
                backward_power: -0.2,
                backward_ms: 500,
            },
            TapCycle {
                forward_power: 0.4,
                forward_ms: 400,
                backward_power: -0.9,
                backward_ms: 200,
            },
        ],
    },
    // アルミ1.5mm（最後は切粉を折るため速い後退）
    TapConfig {
        name: "Tap Al1.5",
        material: "Al",
        thickness_mm: 1.5,
        cycles: &[
            TapCycle {
                forward_power: 0.8,
                forward_ms: 300,
                backward_power: -0.7,
                backward_ms: 250,
            },
            TapCycle {
                forward_power: 0.6,
                forward_ms: 400,
                backward_power: -0.4,
                backward_ms: 350,
            },
            TapCycle {
                forward_power: 0.4,
                forward_ms: 500,
                backward_power: -0.9,
                backward_ms: 200,
            },
        ],
    },
];
