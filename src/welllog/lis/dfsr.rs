//! Data Format Specification Record (type 64): the schema of the frames in
//! the type 0/1 records that follow it.
//!
//! ```text
//! entry blocks      type u8 | size u8 | rep code u8 | value ...   (until type 0)
//! datum spec blocks 40 bytes each, one per channel
//!     mnemonic 4 | service id 6 | service order 8 | units 4 | API codes u32
//!     file number i16 | size i16 | pad 3 | samples u8 | rep code u8 | pad 5
//! ```

use byteorder::{BigEndian, ByteOrder};
use log::warn;
use std::fmt;

use super::logi_rec::LR_TYPE_DATA_FORMAT;
use crate::welllog::codec::lis::{self as rc, RC_66, RC_68, RC_TYPE_TEXT};
use crate::welllog::cursor::LogicalData;
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::Value;
use crate::welllog::utils::trimmed_text;

pub const EB_TYPE_TERMINATOR: u8 = 0;
pub const EB_TYPE_DATA_TYPE: u8 = 1;
pub const EB_TYPE_DSB_TYPE: u8 = 2;
pub const EB_TYPE_FRAME_SIZE: u8 = 3;
pub const EB_TYPE_UP_DOWN_FLAG: u8 = 4;
pub const EB_TYPE_OPTICAL_DEPTH_UNITS: u8 = 5;
pub const EB_TYPE_REF_POINT: u8 = 6;
pub const EB_TYPE_REF_POINT_UNITS: u8 = 7;
pub const EB_TYPE_FRAME_SPACE: u8 = 8;
pub const EB_TYPE_FRAME_SPACE_UNITS: u8 = 9;
pub const EB_TYPE_UNDEFINED_10: u8 = 10;
pub const EB_TYPE_MAX_FRAMES_PER_REC: u8 = 11;
pub const EB_TYPE_ABSENT_VALUE: u8 = 12;
pub const EB_TYPE_RECORD_MODE: u8 = 13;
pub const EB_TYPE_DEPTH_UNITS: u8 = 14;
pub const EB_TYPE_DEPTH_REP_CODE: u8 = 15;
pub const EB_TYPE_DSB_SUB_TYPE: u8 = 16;
pub const EB_SET_SIZE: usize = 17;

pub const DSB_LENGTH: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct EntryBlock {
    pub eb_type: u8,
    pub size: u8,
    pub rep_code: u8,
    pub value: Option<Value>,
}

impl EntryBlock {
    /// A block holding `value`, sized from the value and code.
    pub fn new(eb_type: u8, rep_code: u8, value: Option<Value>) -> Result<Self> {
        let size = match &value {
            None => 0,
            Some(Value::Text(t)) => u8::try_from(t.len()).map_err(|_| WellLogError::ValueOutOfRange {
                code: rep_code,
                value: format!("{} bytes of text", t.len()),
            })?,
            Some(_) => rc::lis_size(rep_code)? as u8,
        };
        Ok(Self {
            eb_type,
            size,
            rep_code,
            value,
        })
    }

    fn read(ld: &mut LogicalData) -> Result<Self> {
        let preamble = ld.chunk(3)?;
        let (eb_type, size, rep_code) = (preamble[0], preamble[1], preamble[2]);
        let value = match size {
            0 => None,
            n => Some(rc::decode(rep_code, ld.chunk(n as usize)?)?),
        };
        Ok(Self {
            eb_type,
            size,
            rep_code,
            value,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![self.eb_type, self.size, self.rep_code];
        if let Some(value) = &self.value {
            out.extend(rc::encode(value, self.rep_code)?);
        }
        Ok(out)
    }
}

impl fmt::Display for EntryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryBlock: type={} size={} rc={} value=", self.eb_type, self.size, self.rep_code)?;
        match &self.value {
            Some(v) => write!(f, "{}", v),
            None => f.write_str("None"),
        }
    }
}

/// One entry block per type, defaults for those not present in the record.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryBlockSet {
    blocks: Vec<EntryBlock>,
}

fn eb(eb_type: u8, size: u8, rep_code: u8, value: Option<Value>) -> EntryBlock {
    EntryBlock {
        eb_type,
        size,
        rep_code,
        value,
    }
}

impl Default for EntryBlockSet {
    fn default() -> Self {
        let text = |t: &[u8]| Some(Value::Text(t.to_vec()));
        let int = |i: i64| Some(Value::Int(i));
        let mut set = Self {
            blocks: vec![
                eb(EB_TYPE_TERMINATOR, 0, RC_66, None),
                eb(EB_TYPE_DATA_TYPE, 1, RC_66, int(0)),
                eb(EB_TYPE_DSB_TYPE, 1, RC_66, int(0)),
                eb(EB_TYPE_FRAME_SIZE, 1, RC_66, int(0)),
                eb(EB_TYPE_UP_DOWN_FLAG, 1, RC_66, int(1)),
                eb(EB_TYPE_OPTICAL_DEPTH_UNITS, 1, RC_66, int(1)),
                eb(EB_TYPE_REF_POINT, 0, RC_66, None),
                eb(EB_TYPE_REF_POINT_UNITS, 4, RC_TYPE_TEXT, text(b".1IN")),
                eb(EB_TYPE_FRAME_SPACE, 0, RC_66, None),
                eb(EB_TYPE_FRAME_SPACE_UNITS, 0, RC_TYPE_TEXT, None),
                eb(EB_TYPE_UNDEFINED_10, 0, RC_66, None),
                eb(EB_TYPE_MAX_FRAMES_PER_REC, 0, RC_66, None),
                eb(EB_TYPE_ABSENT_VALUE, 4, RC_68, Some(Value::Float(-999.25))),
                eb(EB_TYPE_RECORD_MODE, 1, RC_66, int(0)),
                eb(EB_TYPE_DEPTH_UNITS, 4, RC_TYPE_TEXT, text(b".1IN")),
                // No default is given for this; 0 is not a valid code.
                eb(EB_TYPE_DEPTH_REP_CODE, 1, RC_66, int(0)),
                eb(EB_TYPE_DSB_SUB_TYPE, 1, RC_66, int(0)),
            ],
        };
        set.set_size_even();
        set
    }
}

impl EntryBlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read entry blocks up to and including the terminator.
    ///
    /// Blocks of an unknown type, or the undefined type 10, are logged and
    /// ignored.
    pub fn read(ld: &mut LogicalData) -> Result<Self> {
        let mut set = Self::default();
        while ld.has_remaining() {
            let block = EntryBlock::read(ld)?;
            let eb_type = block.eb_type;
            if let Err(e) = set.set(block) {
                warn!("DFSR entry block at index {}: {}", ld.index(), e);
            }
            if eb_type == EB_TYPE_TERMINATOR {
                break;
            }
        }
        set.set_size_even();
        Ok(set)
    }

    /// Replace the block of the same type.
    ///
    /// # Errors
    /// `InvalidFormat` for a type outside 0..=16 or type 10.
    pub fn set(&mut self, block: EntryBlock) -> Result<()> {
        if block.eb_type as usize >= EB_SET_SIZE || block.eb_type == EB_TYPE_UNDEFINED_10 {
            return Err(WellLogError::InvalidFormat(format!(
                "entry block type {} can not be set",
                block.eb_type
            )));
        }
        let index = block.eb_type as usize;
        self.blocks[index] = block;
        self.set_size_even();
        Ok(())
    }

    pub fn get(&self, eb_type: u8) -> Option<&EntryBlock> {
        self.blocks.get(eb_type as usize)
    }

    fn value(&self, eb_type: u8) -> Option<&Value> {
        self.blocks[eb_type as usize].value.as_ref()
    }

    fn int(&self, eb_type: u8) -> i64 {
        self.value(eb_type).and_then(Value::as_i64).unwrap_or(0)
    }

    fn text(&self, eb_type: u8) -> Option<&[u8]> {
        self.value(eb_type).and_then(Value::as_text)
    }

    /// Total bytes of the block values, type 10 excluded.
    pub fn lis_size(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.eb_type != EB_TYPE_UNDEFINED_10)
            .map(|b| b.size as usize)
            .sum()
    }

    /// Size the terminator so the total is even.
    fn set_size_even(&mut self) {
        self.blocks[0] = eb(EB_TYPE_TERMINATOR, 0, RC_66, None);
        if self.lis_size() % 2 == 1 {
            self.blocks[0] = eb(EB_TYPE_TERMINATOR, 1, RC_66, Some(Value::Int(1)));
        }
    }

    /// The type of the data records described, 0 or 1.
    pub fn data_type(&self) -> u8 {
        self.int(EB_TYPE_DATA_TYPE) as u8
    }

    pub fn dsb_type(&self) -> i64 {
        self.int(EB_TYPE_DSB_TYPE)
    }

    pub fn up_down(&self) -> u8 {
        self.int(EB_TYPE_UP_DOWN_FLAG) as u8
    }

    /// X decreasing.
    pub fn log_up(&self) -> bool {
        self.up_down() == 1
    }

    /// X increasing.
    pub fn log_down(&self) -> bool {
        self.up_down() == 255
    }

    /// True unless an up log; time logs increase.
    pub fn x_increasing(&self) -> bool {
        !self.log_up()
    }

    /// Units that entry block 5 selects: feet, metres, time or nothing.
    pub fn optical_log_scale(&self) -> &'static [u8] {
        match self.int(EB_TYPE_OPTICAL_DEPTH_UNITS) {
            1 => super::units::OPTICAL_FEET,
            255 => super::units::OPTICAL_METRES,
            0 => super::units::OPTICAL_TIME,
            _ => b"    ",
        }
    }

    pub fn frame_spacing(&self) -> Option<f64> {
        self.value(EB_TYPE_FRAME_SPACE).and_then(Value::as_f64)
    }

    pub fn frame_spacing_units(&self) -> Option<&[u8]> {
        self.text(EB_TYPE_FRAME_SPACE_UNITS)
    }

    pub fn max_frames_per_record(&self) -> Option<i64> {
        self.value(EB_TYPE_MAX_FRAMES_PER_REC).and_then(Value::as_i64)
    }

    pub fn absent_value(&self) -> f64 {
        self.value(EB_TYPE_ABSENT_VALUE).and_then(Value::as_f64).unwrap_or(-999.25)
    }

    /// 1 for an indirect X axis carried once per record.
    pub fn recording_mode(&self) -> i64 {
        self.int(EB_TYPE_RECORD_MODE)
    }

    pub fn is_indirect_x(&self) -> bool {
        self.recording_mode() == 1
    }

    pub fn depth_units(&self) -> &[u8] {
        self.text(EB_TYPE_DEPTH_UNITS).unwrap_or(b".1IN")
    }

    pub fn depth_rep_code(&self) -> u8 {
        self.int(EB_TYPE_DEPTH_REP_CODE) as u8
    }

    pub fn dsb_sub_type(&self) -> i64 {
        self.int(EB_TYPE_DSB_SUB_TYPE)
    }

    /// All blocks but type 10, terminator last.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for block in &self.blocks[1..] {
            if block.eb_type != EB_TYPE_UNDEFINED_10 {
                out.extend(block.to_bytes()?);
            }
        }
        out.extend(self.blocks[0].to_bytes()?);
        Ok(out)
    }
}

/// API codes packed into one integer, e.g. 45310011 is (45, 310, 1, 1).
pub fn unpack_api_codes(packed: u32) -> (u32, u32, u32, u32) {
    (
        packed / 1_000_000,
        (packed % 1_000_000) / 1000,
        (packed % 1000) / 10,
        packed % 10,
    )
}

pub fn pack_api_codes(codes: (u32, u32, u32, u32)) -> u32 {
    codes.0 * 1_000_000 + codes.1 * 1000 + codes.2 * 10 + codes.3
}

/// A Datum Specification Block, one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DatumSpecBlock {
    pub mnem: Vec<u8>,
    pub service_id: Vec<u8>,
    pub service_order: Vec<u8>,
    pub units: Vec<u8>,
    pub api_log_type: u32,
    pub api_curve_type: u32,
    pub api_curve_class: u32,
    pub api_modifier: u32,
    pub file_number: i16,
    /// Bytes of this channel in one frame.
    pub size: i16,
    pub rep_code: u8,
    samples: u8,
    bursts: usize,
    sub_channels: usize,
}

impl DatumSpecBlock {
    /// A single sub-channel block (or a dipmeter block) with `samples`
    /// samples of `bursts` values.
    ///
    /// # Errors
    /// `UnsupportedRepCode` for an unknown code, `Geometry` if the size does
    /// not fit the record format.
    pub fn new(mnem: &[u8], units: &[u8], rep_code: u8, samples: u8, bursts: usize) -> Result<Self> {
        let size = if rc::is_dipmeter(rep_code) {
            rc::lis_size(rep_code)?
        } else {
            rc::lis_size(rep_code)? * samples as usize * bursts
        };
        let size = i16::try_from(size).map_err(|_| WellLogError::Geometry(format!("channel size {} too large", size)))?;
        let mut dsb = Self {
            mnem: padded(mnem, 4),
            service_id: padded(b"", 6),
            service_order: padded(b"", 8),
            units: padded(units, 4),
            api_log_type: 0,
            api_curve_type: 0,
            api_curve_class: 0,
            api_modifier: 0,
            file_number: 1,
            size,
            rep_code,
            samples,
            bursts: 0,
            sub_channels: 0,
        };
        dsb.set_bursts_sub_channels()?;
        Ok(dsb)
    }

    /// Read one 40 byte block.
    ///
    /// # Errors
    /// `FrameSizeMismatch` if the size is not a whole number of bursts.
    pub fn read(ld: &mut LogicalData) -> Result<Self> {
        let b = ld.chunk(DSB_LENGTH)?;
        let (log_type, curve_type, curve_class, modifier) = unpack_api_codes(BigEndian::read_u32(&b[22..26]));
        let mut dsb = Self {
            mnem: b[0..4].to_vec(),
            service_id: b[4..10].to_vec(),
            service_order: b[10..18].to_vec(),
            units: b[18..22].to_vec(),
            api_log_type: log_type,
            api_curve_type: curve_type,
            api_curve_class: curve_class,
            api_modifier: modifier,
            file_number: BigEndian::read_i16(&b[26..28]),
            size: BigEndian::read_i16(&b[28..30]),
            samples: b[33],
            rep_code: b[34],
            bursts: 0,
            sub_channels: 0,
        };
        dsb.set_bursts_sub_channels()?;
        Ok(dsb)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DSB_LENGTH);
        out.extend(padded(&self.mnem, 4));
        out.extend(padded(&self.service_id, 6));
        out.extend(padded(&self.service_order, 8));
        out.extend(padded(&self.units, 4));
        let mut word = [0u8; 4];
        BigEndian::write_u32(
            &mut word,
            pack_api_codes((self.api_log_type, self.api_curve_type, self.api_curve_class, self.api_modifier)),
        );
        out.extend(word);
        let mut half = [0u8; 2];
        BigEndian::write_i16(&mut half, self.file_number);
        out.extend(half);
        BigEndian::write_i16(&mut half, self.size);
        out.extend(half);
        out.extend([0u8; 3]);
        out.push(self.samples);
        out.push(self.rep_code);
        out.extend([0u8; 5]);
        out
    }

    fn set_bursts_sub_channels(&mut self) -> Result<()> {
        match self.rep_code {
            rc::DIPMETER_EDIT_TAPE_REP_CODE => {
                self.sub_channels = rc::DIPMETER_NUM_FAST_CHANNELS;
                self.bursts = 1;
            }
            rc::DIPMETER_CSU_FIELD_TAPE_REP_CODE => {
                self.sub_channels = rc::DIPMETER_NUM_FAST_CHANNELS + rc::DIPMETER_NUM_SLOW_CHANNELS;
                self.bursts = 1;
            }
            _ if self.size > 0 => {
                let per_burst = rc::lis_size(self.rep_code)? * self.samples as usize;
                if per_burst == 0 {
                    return Err(WellLogError::Geometry(format!(
                        "channel {} has no fixed burst size from rep code={} samples={}",
                        trimmed_text(&self.mnem),
                        self.rep_code,
                        self.samples
                    )));
                }
                let size = self.size as usize;
                if size % per_burst != 0 {
                    return Err(WellLogError::FrameSizeMismatch {
                        declared: size,
                        computed: size - size % per_burst,
                    });
                }
                self.sub_channels = 1;
                self.bursts = self.size as usize / per_burst;
            }
            _ => {
                warn!("Datum spec block {} has zero length", trimmed_text(&self.mnem));
                self.sub_channels = 0;
                self.bursts = 0;
            }
        }
        Ok(())
    }

    /// A block whose channel has no data in the frame.
    pub fn is_null(&self) -> bool {
        self.size <= 0
    }

    /// Bytes in one frame.
    pub fn byte_size(&self) -> usize {
        self.size.max(0) as usize
    }

    pub fn sub_channels(&self) -> usize {
        self.sub_channels
    }

    /// Samples in a sub-channel.
    ///
    /// # Errors
    /// `IndexOutOfRange` for a sub-channel that does not exist.
    pub fn samples(&self, sub_channel: usize) -> Result<usize> {
        if sub_channel >= self.sub_channels {
            return Err(WellLogError::index("sub-channel", sub_channel as i64, self.sub_channels));
        }
        Ok(match self.rep_code {
            rc::DIPMETER_EDIT_TAPE_REP_CODE => rc::DIPMETER_FAST_CHANNEL_SUPER_SAMPLES,
            rc::DIPMETER_CSU_FIELD_TAPE_REP_CODE if sub_channel < rc::DIPMETER_NUM_FAST_CHANNELS => {
                rc::DIPMETER_FAST_CHANNEL_SUPER_SAMPLES
            }
            rc::DIPMETER_CSU_FIELD_TAPE_REP_CODE => 1,
            _ => self.samples as usize,
        })
    }

    /// Bursts per sample, the same for every sub-channel.
    pub fn bursts(&self) -> usize {
        self.bursts
    }

    /// Values of this channel in one frame.
    pub fn values(&self) -> usize {
        match self.rep_code {
            rc::DIPMETER_EDIT_TAPE_REP_CODE => rc::DIPMETER_LIS_SIZE_130,
            rc::DIPMETER_CSU_FIELD_TAPE_REP_CODE => rc::DIPMETER_LIS_SIZE_234,
            _ => self.samples as usize * self.bursts,
        }
    }

    /// The mnemonic of a sub-channel: the channel's own for a single
    /// sub-channel, the fixed dipmeter names otherwise.
    pub fn sub_channel_mnem(&self, sub_channel: usize) -> Option<&[u8]> {
        if self.sub_channels == 1 {
            return Some(&self.mnem);
        }
        if rc::is_dipmeter(self.rep_code) {
            return rc::DIPMETER_SUB_CHANNEL_NAMES.get(sub_channel).map(|n| &n[..]);
        }
        None
    }
}

impl fmt::Display for DatumSpecBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DSB: {} units={} rc={} size={} samples={} bursts={} sub-channels={}",
            trimmed_text(&self.mnem),
            trimmed_text(&self.units),
            self.rep_code,
            self.size,
            self.samples,
            self.bursts,
            self.sub_channels
        )
    }
}

fn padded(bytes: &[u8], width: usize) -> Vec<u8> {
    let mut out = bytes.iter().copied().take(width).collect::<Vec<_>>();
    out.resize(width, b' ');
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dfsr {
    pub ebs: EntryBlockSet,
    pub dsbs: Vec<DatumSpecBlock>,
}

impl Dfsr {
    pub fn new(ebs: EntryBlockSet, dsbs: Vec<DatumSpecBlock>) -> Self {
        Self { ebs, dsbs }
    }

    /// Decode the logical data following the two byte header.
    ///
    /// # Errors
    /// `InvalidFormat` for a datum spec block type other than 0,
    /// `FrameSizeMismatch` or `Geometry` for an inconsistent block. Null
    /// blocks are logged and dropped.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut ld = LogicalData::new(body.to_vec());
        let ebs = EntryBlockSet::read(&mut ld)?;
        if ebs.dsb_type() != 0 {
            return Err(WellLogError::InvalidFormat(format!(
                "can not read datum spec blocks of type {}",
                ebs.dsb_type()
            )));
        }
        let mut dsbs = Vec::new();
        while ld.has_remaining() {
            let dsb = DatumSpecBlock::read(&mut ld)?;
            if dsb.is_null() {
                warn!("Ignoring null datum spec block {}", trimmed_text(&dsb.mnem));
            } else {
                dsbs.push(dsb);
            }
        }
        Ok(Self { ebs, dsbs })
    }

    /// Bytes in one frame.
    pub fn frame_size(&self) -> usize {
        self.dsbs.iter().map(DatumSpecBlock::byte_size).sum()
    }

    /// The whole Logical Record, header included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![LR_TYPE_DATA_FORMAT, 0];
        out.extend(self.ebs.to_bytes()?);
        for dsb in &self.dsbs {
            out.extend(dsb.to_bytes());
        }
        Ok(out)
    }
}

impl fmt::Display for Dfsr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DFSR: {} channels, frame size {}", self.dsbs.len(), self.frame_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(mnem: &[u8], rep_code: u8, samples: u8, bursts: usize) -> DatumSpecBlock {
        DatumSpecBlock::new(mnem, b"FEET", rep_code, samples, bursts).unwrap()
    }

    #[test]
    fn entry_block_defaults() {
        let ebs = EntryBlockSet::new();
        assert_eq!(ebs.data_type(), 0);
        assert!(ebs.log_up());
        assert!(!ebs.x_increasing());
        assert_eq!(ebs.absent_value(), -999.25);
        assert_eq!(ebs.frame_spacing(), None);
        assert_eq!(ebs.depth_units(), b".1IN");
        assert!(!ebs.is_indirect_x());
        assert_eq!(ebs.optical_log_scale(), b"FEET");
        assert_eq!(ebs.lis_size() % 2, 0);
    }

    #[test]
    fn entry_block_set_parse() {
        let mut ebs = EntryBlockSet::new();
        ebs.set(EntryBlock::new(EB_TYPE_UP_DOWN_FLAG, RC_66, Some(Value::Int(255))).unwrap()).unwrap();
        ebs.set(EntryBlock::new(EB_TYPE_FRAME_SPACE, RC_66, Some(Value::Int(60))).unwrap()).unwrap();
        ebs.set(EntryBlock::new(EB_TYPE_FRAME_SPACE_UNITS, RC_TYPE_TEXT, Some(Value::Text(b".1IN".to_vec()))).unwrap())
            .unwrap();
        assert!(ebs.set(EntryBlock::new(EB_TYPE_UNDEFINED_10, RC_66, None).unwrap()).is_err());
        assert!(ebs.set(EntryBlock::new(17, RC_66, None).unwrap()).is_err());

        let mut ld = LogicalData::new(ebs.to_bytes().unwrap());
        let read = EntryBlockSet::read(&mut ld).unwrap();
        assert!(!ld.has_remaining());
        assert!(read.log_down());
        assert_eq!(read.frame_spacing(), Some(60.0));
        assert_eq!(read.frame_spacing_units(), Some(&b".1IN"[..]));
        assert_eq!(read, ebs);
    }

    #[test]
    fn unknown_entry_blocks_are_skipped() {
        let bytes = vec![10, 1, 66, 7, 20, 1, 66, 7, 1, 1, 66, 1, 0, 0, 66];
        let ebs = EntryBlockSet::read(&mut LogicalData::new(bytes)).unwrap();
        assert_eq!(ebs.data_type(), 1);
    }

    #[test]
    fn api_codes() {
        assert_eq!(unpack_api_codes(45_310_011), (45, 310, 1, 1));
        assert_eq!(pack_api_codes((45, 310, 1, 1)), 45_310_011);
    }

    #[test]
    fn datum_spec_block_layout() {
        let dsb = channel(b"GR  ", rc::RC_68, 1, 8);
        assert_eq!(dsb.size, 32);
        assert_eq!(dsb.bursts(), 8);
        assert_eq!(dsb.values(), 8);
        assert_eq!(dsb.sub_channel_mnem(0), Some(&b"GR  "[..]));
        let bytes = dsb.to_bytes();
        assert_eq!(bytes.len(), DSB_LENGTH);
        assert_eq!(&bytes[28..30], &[0, 32]);
        assert_eq!(&bytes[33..35], &[1, 68]);
        let read = DatumSpecBlock::read(&mut LogicalData::new(bytes)).unwrap();
        assert_eq!(read, dsb);
    }

    #[test]
    fn dipmeter_sub_channels() {
        let dsb = channel(b"DIP ", rc::DIPMETER_CSU_FIELD_TAPE_REP_CODE, 1, 1);
        assert_eq!(dsb.size, 90);
        assert_eq!(dsb.sub_channels(), 15);
        for sc in 0..5 {
            assert_eq!(dsb.samples(sc).unwrap(), 16);
        }
        for sc in 5..15 {
            assert_eq!(dsb.samples(sc).unwrap(), 1);
        }
        assert!(dsb.samples(15).is_err());
        assert_eq!(dsb.bursts(), 1);
        assert_eq!(dsb.values(), 90);
        assert_eq!(dsb.sub_channel_mnem(5), Some(&b"STAT"[..]));
        assert_eq!(dsb.sub_channel_mnem(14), Some(&b"RAC2"[..]));
    }

    #[test]
    fn fractional_bursts() {
        let mut bytes = channel(b"GR  ", rc::RC_68, 1, 1).to_bytes();
        bytes[29] = 6;
        assert!(matches!(
            DatumSpecBlock::read(&mut LogicalData::new(bytes)),
            Err(WellLogError::FrameSizeMismatch { declared: 6, computed: 4 })
        ));
    }

    #[test]
    fn dfsr_drops_null_blocks() {
        let mut null = channel(b"NULL", rc::RC_68, 1, 1);
        null.size = 0;
        let dfsr = Dfsr::new(
            EntryBlockSet::new(),
            vec![channel(b"DEPT", rc::RC_68, 1, 1), null, channel(b"GR  ", rc::RC_79, 1, 1)],
        );
        let bytes = dfsr.to_bytes().unwrap();
        assert_eq!(&bytes[..2], &[64, 0]);
        let read = Dfsr::parse(&bytes[2..]).unwrap();
        assert_eq!(read.dsbs.len(), 2);
        assert_eq!(read.frame_size(), 6);
        assert_eq!(read.dsbs[1].mnem, b"GR  ");
    }

    #[test]
    fn dfsr_rejects_dsb_type() {
        let mut ebs = EntryBlockSet::new();
        ebs.set(EntryBlock::new(EB_TYPE_DSB_TYPE, RC_66, Some(Value::Int(1))).unwrap()).unwrap();
        let bytes = Dfsr::new(ebs, Vec::new()).to_bytes().unwrap();
        assert!(matches!(Dfsr::parse(&bytes[2..]), Err(WellLogError::InvalidFormat(_))));
    }
}
