//! 速度ノブのADC値→割合変換
//!
//! ノブは連続値ではなく段階的に読む。ポットの機械的な揺れで出力が
//! ふらつかないよう、段の遷移点を各段の2割手前に置いてヒステリシス
//! ぎみにしてある。さらにx^1.5で低速側の分解能を上げる。

use crate::config::knob;

/// ADC生値をノブ割合[0,1]に変換する
pub fn knob_fraction(adc_raw: u16) -> f32 {
    let volts = adc_raw as f32 * knob::FULL_SCALE_V / (knob::ADC_MAX - 1) as f32;

    if volts <= knob::LEVELS[0] {
        return 0.0;
    }
    if volts >= knob::LEVELS[6] {
        return 1.0;
    }

    let mut fraction = 0.0;
    for i in 1..7 {
        let transition =
            knob::LEVELS[i] - (knob::LEVELS[i] - knob::LEVELS[i - 1]) * knob::TRANSITION_FACTOR;
        if volts < transition {
            fraction = i as f32 / 6.0;
            break;
        }
    }

    libm::powf(fraction, knob::REMAP_EXPONENT)
}
