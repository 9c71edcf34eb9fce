//! フラッシュメモリベースの使用実績永続化
//!
//! STM32G431VBの最終フラッシュページ（ページ63）に使用実績カウンタを
//! 保存します。CRC32はCRCペリフェラルで計算します。

use embassy_stm32::{crc::Crc, flash::Flash};

use crate::config::flash::{LAST_PAGE_NUMBER, LAST_PAGE_START, PAGE_SIZE};

/// 使用実績レコードのマジックナンバー
pub const RECORD_MAGIC: u32 = 0xDEADBEEF;

/// 現在のレコードバージョン
pub const RECORD_VERSION: u16 = 1;

/// EEPROM操作のエラー型
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// フラッシュ書き込みエラー
    FlashWriteError,

    /// フラッシュ消去エラー
    FlashEraseError,

    /// CRC検証エラー
    CrcMismatch,

    /// マジックナンバー/バージョン不一致
    InvalidHeader,

    /// データサイズエラー
    InvalidSize,
}

/// 永続化される使用実績レコード
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct UsageRecord {
    /// マジックナンバー（データ識別用）
    pub magic: u32,

    /// レコードバージョン番号
    pub version: u16,

    /// パディング（アライメント調整）
    _padding: u16,

    /// タッピングシーケンス開始回数
    pub tap_starts: u32,

    /// タッピングシーケンス正常完了回数
    pub tap_ends: u32,

    /// マニュアルCW累計運転秒数
    pub manual_cw_secs: u32,

    /// マニュアルCCW累計運転秒数
    pub manual_ccw_secs: u32,

    /// CRC32チェックサム（最後に配置）
    pub crc32: u32,
}

impl UsageRecord {
    /// ゼロカウンタの初期レコードを生成
    pub const fn default() -> Self {
        Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            _padding: 0,
            tap_starts: 0,
            tap_ends: 0,
            manual_cw_secs: 0,
            manual_ccw_secs: 0,
            crc32: 0,
        }
    }

    /// CRC計算対象のバイト列（crc32フィールドを除く）
    fn as_bytes_for_crc(&self) -> &[u8] {
        let ptr = self as *const Self as *const u8;
        let total_size = core::mem::size_of::<Self>();
        let crc_size = core::mem::size_of::<u32>();
        unsafe { core::slice::from_raw_parts(ptr, total_size - crc_size) }
    }

    /// バイト配列として参照を取得（フラッシュ書き込み用）
    fn as_bytes(&self) -> &[u8] {
        let ptr = self as *const Self as *const u8;
        let size = core::mem::size_of::<Self>();
        unsafe { core::slice::from_raw_parts(ptr, size) }
    }

    /// バイト配列から構造体を復元
    ///
    /// # Safety
    /// バイト配列が正しい構造体レイアウトであることを確認する必要がある
    unsafe fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < core::mem::size_of::<Self>() {
            return None;
        }
        let ptr = bytes.as_ptr() as *const Self;
        Some(*ptr)
    }

    /// マジックナンバーとバージョンを検証
    pub fn validate_header(&self) -> bool {
        self.magic == RECORD_MAGIC && self.version == RECORD_VERSION
    }

    /// CRC32チェックサムを計算
    pub fn calculate_crc(&self, crc: &mut Crc) -> u32 {
        let data = self.as_bytes_for_crc();

        // 4バイト境界に合わせてワード列を準備
        let mut words = [0u32; 8];
        let word_count = data.len().div_ceil(4);

        for (i, word) in words.iter_mut().enumerate().take(word_count) {
            let offset = i * 4;
            let mut bytes = [0u8; 4];
            for (j, b) in bytes.iter_mut().enumerate() {
                if offset + j < data.len() {
                    *b = data[offset + j];
                }
            }
            *word = u32::from_le_bytes(bytes);
        }

        crc.reset();
        crc.feed_words(&words[..word_count])
    }

    /// CRC32チェックサムを検証
    pub fn verify_crc(&self, crc: &mut Crc) -> bool {
        self.calculate_crc(crc) == self.crc32
    }
}

/// フラッシュメモリから使用実績を読み込む
pub fn read_record(crc: &mut Crc) -> Result<UsageRecord, EepromError> {
    let mut buffer = [0u8; core::mem::size_of::<UsageRecord>()];

    let src_addr = LAST_PAGE_START as usize;
    for (i, byte) in buffer.iter_mut().enumerate() {
        let addr = (src_addr + i) as *const u8;
        *byte = unsafe { core::ptr::read_volatile(addr) };
    }

    let record =
        unsafe { UsageRecord::from_bytes(&buffer) }.ok_or(EepromError::InvalidSize)?;

    if !record.validate_header() {
        error!(
            "Usage record header invalid: magic=0x{:08X}, version={}",
            record.magic, record.version
        );
        return Err(EepromError::InvalidHeader);
    }

    if !record.verify_crc(crc) {
        error!("Usage record CRC mismatch: stored=0x{:08X}", record.crc32);
        return Err(EepromError::CrcMismatch);
    }

    Ok(record)
}

/// フラッシュメモリに使用実績を書き込む
pub fn write_record(
    flash: &mut Flash<'_>,
    crc: &mut Crc,
    record: &mut UsageRecord,
) -> Result<(), EepromError> {
    record.crc32 = record.calculate_crc(crc);

    debug!("Erasing flash page {}", LAST_PAGE_NUMBER);
    flash
        .blocking_erase(LAST_PAGE_START, LAST_PAGE_START + PAGE_SIZE as u32)
        .map_err(|_| EepromError::FlashEraseError)?;

    flash
        .blocking_write(LAST_PAGE_START, record.as_bytes())
        .map_err(|_| EepromError::FlashWriteError)?;

    debug!("Usage record saved, crc=0x{:08X}", record.crc32);
    Ok(())
}

/// 使用実績を読み込み、失敗時はゼロカウンタで初期化
pub fn load_or_initialize(flash: &mut Flash<'_>, crc: &mut Crc) -> UsageRecord {
    match read_record(crc) {
        Ok(record) => {
            info!("Usage record loaded from flash");
            record
        }
        Err(e) => {
            warn!("No valid usage record ({:?}), initializing", e);
            let mut record = UsageRecord::default();
            if write_record(flash, crc, &mut record).is_err() {
                error!("Failed to initialize usage record, counters are volatile");
            }
            record
        }
    }
}

// コンパイル時サイズチェック（1フラッシュページ以内であることを確認）
const _: () = {
    assert!(core::mem::size_of::<UsageRecord>() <= PAGE_SIZE);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_addresses() {
        // 128KB = 0x20000
        // 最終ページ = 0x08000000 + 0x20000 - 0x800 = 0x0801F800
        assert_eq!(LAST_PAGE_START, 0x0801F800);
    }

    #[test]
    fn test_record_layout() {
        let record = UsageRecord::default();
        assert!(record.validate_header());
        // 8バイト境界: magic+version+pad(8) + カウンタ4本(16) + crc(4)
        assert_eq!(core::mem::size_of::<UsageRecord>(), 28);
    }
}
