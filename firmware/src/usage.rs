//! 使用実績カウンタ
//!
//! コアの`UsageLog`契約をフラッシュ保存レコードに橋渡しする。
//! カウンタ更新のたびにページ消去すると寿命が持たないので、
//! インメモリで加算してdirtyフラグを立て、書き戻しはタスク側で
//! 周期的に行う。

use drillctl::logging::{Direction, UsageLog};

use crate::eeprom::UsageRecord;

pub struct UsageCounters {
    record: UsageRecord,
    dirty: bool,
}

impl UsageCounters {
    pub const fn new() -> Self {
        Self {
            record: UsageRecord::default(),
            dirty: false,
        }
    }

    /// フラッシュから読み込んだレコードを反映する
    pub fn load(&mut self, record: UsageRecord) {
        self.record = record;
        self.dirty = false;
    }

    /// 未保存の変更があれば渡し、dirtyをクリアする
    pub fn take_dirty(&mut self) -> Option<UsageRecord> {
        if self.dirty {
            self.dirty = false;
            Some(self.record)
        } else {
            None
        }
    }

    /// カウンタ内容をログに出す（コンソールの`l`コマンド）
    pub fn dump(&self) {
        info!("--- Usage counters ---");
        info!("Tap starts:  {}", self.record.tap_starts);
        info!("Tap ends:    {}", self.record.tap_ends);
        info!("Manual CW:   {}s", self.record.manual_cw_secs);
        info!("Manual CCW:  {}s", self.record.manual_ccw_secs);
    }
}

impl UsageLog for UsageCounters {
    fn add_run_seconds(&mut self, direction: Direction, seconds: u32) {
        match direction {
            Direction::Cw => self.record.manual_cw_secs += seconds,
            Direction::Ccw => self.record.manual_ccw_secs += seconds,
        }
        self.dirty = true;
    }

    fn record_tap_start(&mut self) {
        self.record.tap_starts += 1;
        self.dirty = true;
    }

    fn record_tap_end(&mut self) {
        self.record.tap_ends += 1;
        self.dirty = true;
    }
}
