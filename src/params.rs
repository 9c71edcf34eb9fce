//! モーター制御コアの設定パラメータ

/// パワー指令のデッドバンド [%]
///
/// この値未満の指令は「回転要求なし」として扱い、極端に短いPWMパルスで
/// 出力をチャタリングさせないようにする。
pub const POWER_DEADBAND_PERCENT: f32 = 5.0;

/// ソフトウェアPWMの周期 [µs]（デフォルト値）
pub const DEFAULT_PWM_PERIOD_US: u32 = 1000;

/// タイマPWMの1周期分のtick数（tick = タイマ分解能、ファームウェア側で1µsに設定）
pub const PWM_PERIOD_TICKS: u32 = 1000;

/// タイマPWM停止時（0% / 100% / ブレーキ）の次回割り込みまでの待機tick数
///
/// 定常パターン適用中は位相トグルが不要なため、割り込み頻度を最小化する。
pub const PWM_PARK_TICKS: u32 = 10_000;

/// マニュアルモードのノブしきい値（これ以下は停止扱い）
pub const MANUAL_KNOB_THRESHOLD: f32 = 0.01;

/// 慣性モードの更新最小間隔 [ms]（dtを安定させるためのスロットリング）
pub const MOMENTUM_TICK_MS: u32 = 10;

/// 慣性モードの加速レート [フルスケール/s]（回転方向へ向かう変化）
pub const MOMENTUM_RATE_FAST: f32 = 2.0;

/// 慣性モードの減速レート [フルスケール/s]（回転方向から離れる変化）
///
/// モーター＋工具の慣性非対称をモデル化するため、方向によりレートを入れ替える。
pub const MOMENTUM_RATE_SLOW: f32 = 0.3;

/// 慣性モードの回転判定しきい値（|speed|がこれを超えたらRunning）
pub const MOMENTUM_SPEED_EPSILON: f32 = 0.01;

/// デバッグコンソールのパワー増減ステップ [%]
pub const CONSOLE_POWER_STEP: f32 = 10.0;
