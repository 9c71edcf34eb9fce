//! 使用実績ロギングの契約
//!
//! 永続カウンタ（EEPROM相当）の実体は外部コラボレータが持つ。
//! コアは[`UsageLog`]トレイト経由で増分を通知するだけで、
//! レコードの中身やレイアウトには関知しない。

/// 回転方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Cw,
    Ccw,
}

/// 使用実績ロガーの契約
pub trait UsageLog {
    /// マニュアル運転時間を加算する（分単位でのみ呼ばれる）
    fn add_run_seconds(&mut self, direction: Direction, seconds: u32);

    /// タッピングシーケンス開始を記録する
    fn record_tap_start(&mut self);

    /// タッピングシーケンス正常完了を記録する
    fn record_tap_end(&mut self);
}

/// テスト・初期化用の何もしないロガー
pub struct NullUsageLog;

impl UsageLog for NullUsageLog {
    fn add_run_seconds(&mut self, _direction: Direction, _seconds: u32) {}
    fn record_tap_start(&mut self) {}
    fn record_tap_end(&mut self) {}
}

/// 運転時間の分単位アキュムレータ
///
/// 経過ミリ秒を積算し、丸1分たまるごとに60秒単位でロガーへフラッシュする。
/// 1分未満の端数は内部に保持され、後続の運転で分を完成させたときに
/// 初めて報告される（停止時にも端数は破棄しない）。
pub struct RunMinutes {
    accumulated_ms: u32,
    last_tick_ms: Option<u32>,
}

impl RunMinutes {
    const MINUTE_MS: u32 = 60_000;

    pub const fn new() -> Self {
        Self {
            accumulated_ms: 0,
            last_tick_ms: None,
        }
    }

    /// 運転中の毎tickで呼ぶ
    pub fn tick<L: UsageLog>(&mut self, now_ms: u32, direction: Direction, log: &mut L) {
        if let Some(last) = self.last_tick_ms {
            self.accumulated_ms = self
                .accumulated_ms
                .wrapping_add(now_ms.wrapping_sub(last));
        }
        self.last_tick_ms = Some(now_ms);

        while self.accumulated_ms >= Self::MINUTE_MS {
            self.accumulated_ms -= Self::MINUTE_MS;
            log.add_run_seconds(direction, 60);
        }
    }

    /// 運転停止時に呼ぶ（端数は保持したまま計時だけ止める）
    pub fn halt(&mut self) {
        self.last_tick_ms = None;
    }

    /// 未報告の端数 [ms]
    pub fn pending_ms(&self) -> u32 {
        self.accumulated_ms
    }
}

impl Default for RunMinutes {
    fn default() -> Self {
        Self::new()
    }
}
