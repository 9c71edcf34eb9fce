//! バッテリー電圧監視
//!
//! 分圧されたバッテリー電圧をADCで読み、ローパスフィルタを通して
//! 残量パーセントに変換する。放電カーブの14.0〜19.5Vを0〜100%に
//! 線形マップする。

use crate::config::battery;

/// バッテリー監視の状態
#[derive(Copy, Clone)]
pub struct BatteryState {
    /// フィルタ済み電圧 [V]
    pub voltage: f32,
    /// 残量 [0-100]
    pub percent: u8,
}

impl BatteryState {
    pub const fn new() -> Self {
        Self {
            voltage: 0.0,
            percent: 0,
        }
    }
}

/// バッテリー電圧モニタ
pub struct BatteryMonitor {
    state: BatteryState,
}

impl BatteryMonitor {
    pub fn new() -> Self {
        Self {
            state: BatteryState::new(),
        }
    }

    /// ADC生値から実電圧を計算
    fn adc_to_voltage(adc_raw: u16) -> f32 {
        let v_adc = (adc_raw as f32 / battery::ADC_MAX as f32) * battery::VREF;
        let divider_ratio = (battery::R_UPPER + battery::R_LOWER) / battery::R_LOWER;
        v_adc * divider_ratio
    }

    fn percent_of(voltage: f32) -> u8 {
        let span = battery::VOLTAGE_MAX - battery::VOLTAGE_MIN;
        let level = (voltage - battery::VOLTAGE_MIN) / span * 100.0;
        level.clamp(0.0, 100.0) as u8
    }

    /// フィルタを実電圧で初期化（起動直後の空誤検出を防ぐ）
    pub fn initialize_with_adc(&mut self, adc_raw: u16) {
        let voltage = Self::adc_to_voltage(adc_raw);
        self.state.voltage = voltage;
        self.state.percent = Self::percent_of(voltage);
    }

    /// 電圧を更新して最新状態を返す
    pub fn update(&mut self, adc_raw: u16) -> BatteryState {
        let raw = Self::adc_to_voltage(adc_raw);
        self.state.voltage =
            battery::FILTER_ALPHA * raw + (1.0 - battery::FILTER_ALPHA) * self.state.voltage;
        self.state.percent = Self::percent_of(self.state.voltage);
        self.state
    }

    pub fn state(&self) -> BatteryState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_clamps_to_window() {
        assert_eq!(BatteryMonitor::percent_of(13.0), 0);
        assert_eq!(BatteryMonitor::percent_of(20.0), 100);
        let mid = BatteryMonitor::percent_of(16.75);
        assert!((49..=51).contains(&mid));
    }
}
