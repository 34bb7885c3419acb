//! LIS table records (job identification, well site data, tool string info).
//!
//! A table is a sequence of Component Blocks, each a 12 byte preamble then a
//! value:
//!
//! ```text
//! type u8 | rep code u8 | size u8 | category u8 | mnemonic 4 | units 4 | value
//! ```
//!
//! - type 73 names the table and may only come first,
//! - type 0 starts a row, its value is the row name,
//! - type 69 adds a cell to the current row.
//!
//! A table that starts with a type 0 block has no name and is a list of single
//! parameters, one block per row.

use log::warn;
use std::collections::HashMap;
use std::fmt;

use crate::welllog::codec::lis::{self as rc, RC_TYPE_TEXT};
use crate::welllog::cursor::LogicalData;
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::Value;
use crate::welllog::utils::trimmed_text;

pub const COMPONENT_BLOCK_TABLE: u8 = 73;
pub const COMPONENT_BLOCK_DATUM_BLOCK_START: u8 = 0;
pub const COMPONENT_BLOCK_DATUM_BLOCK_ENTRY: u8 = 69;
pub const COMPONENT_BLOCK_PREAMBLE_LENGTH: usize = 12;

/// What to do with a row whose name repeats an earlier row's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateRowPolicy {
    /// The later row replaces the earlier one, in the earlier one's place.
    #[default]
    KeepLast,
    /// The later row is discarded.
    KeepFirst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBlock {
    pub cb_type: u8,
    pub rep_code: u8,
    pub size: u8,
    pub category: u8,
    pub mnem: Vec<u8>,
    pub units: Vec<u8>,
    pub value: Value,
}

impl ComponentBlock {
    /// Read one block from `ld`.
    ///
    /// # Errors
    /// `Eof` if the block is incomplete, rep code errors if the value can not
    /// be decoded.
    pub fn read(ld: &mut LogicalData) -> Result<Self> {
        let preamble = ld.chunk(COMPONENT_BLOCK_PREAMBLE_LENGTH)?;
        let (cb_type, rep_code, size, category) = (preamble[0], preamble[1], preamble[2], preamble[3]);
        let mnem = preamble[4..8].to_vec();
        let units = preamble[8..12].to_vec();
        let value_size = if rep_code == RC_TYPE_TEXT {
            size as usize
        } else {
            rc::lis_size(rep_code)?
        };
        let value = rc::decode(rep_code, ld.chunk(value_size)?)?;
        Ok(Self {
            cb_type,
            rep_code,
            size,
            category,
            mnem,
            units,
            value,
        })
    }

    /// A block for `value`, choosing the representation code: text is 65,
    /// floats 68 and integers the smallest of 66, 79 and 73 that holds them.
    ///
    /// # Errors
    /// `ValueOutOfRange` for values no code can hold.
    pub fn new(cb_type: u8, mnem: &[u8], units: &[u8], value: Value) -> Result<Self> {
        let rep_code = match &value {
            Value::Text(t) if t.len() <= u8::MAX as usize => RC_TYPE_TEXT,
            Value::Float(_) => rc::RC_68,
            Value::Int(i) if (0..=255).contains(i) => rc::RC_66,
            Value::Int(i) if i16::try_from(*i).is_ok() => rc::RC_79,
            Value::Int(i) if i32::try_from(*i).is_ok() => rc::RC_73,
            other => {
                return Err(WellLogError::ValueOutOfRange {
                    code: 0,
                    value: other.to_string(),
                })
            }
        };
        let size = match &value {
            Value::Text(t) => t.len() as u8,
            _ => rc::lis_size(rep_code)? as u8,
        };
        Ok(Self {
            cb_type,
            rep_code,
            size,
            category: 0,
            mnem: fixed4(mnem),
            units: fixed4(units),
            value,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![self.cb_type, self.rep_code, self.size, self.category];
        out.extend(fixed4(&self.mnem));
        out.extend(fixed4(&self.units));
        out.extend(rc::encode(&self.value, self.rep_code)?);
        Ok(out)
    }

    /// True if the value is `ALLO`.
    pub fn status(&self) -> bool {
        self.value.as_text() == Some(b"ALLO")
    }
}

impl fmt::Display for ComponentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CB: type={} rc={} size={} mnem={} {}",
            self.cb_type,
            self.rep_code,
            self.size,
            trimmed_text(&self.mnem),
            self.value
        )
    }
}

fn fixed4(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.iter().copied().take(4).collect::<Vec<_>>();
    out.resize(4, b' ');
    out
}

/// Mnemonics compare without trailing spaces and NULs.
fn mnem_key(bytes: &[u8]) -> Vec<u8> {
    let end = bytes
        .iter()
        .rposition(|b| *b != b' ' && *b != 0)
        .map_or(0, |p| p + 1);
    bytes[..end].to_vec()
}

/// A row: a type 0 block followed by type 69 blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    blocks: Vec<ComponentBlock>,
}

impl TableRow {
    pub fn new(start: ComponentBlock) -> Result<Self> {
        if start.cb_type != COMPONENT_BLOCK_DATUM_BLOCK_START {
            return Err(WellLogError::TableInit(format!(
                "component block type {} does not start a row",
                start.cb_type
            )));
        }
        Ok(Self { blocks: vec![start] })
    }

    fn add(&mut self, cb: ComponentBlock) {
        self.blocks.push(cb);
    }

    /// The row name, the value of its first block.
    pub fn value(&self) -> &Value {
        &self.blocks[0].value
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn cells(&self) -> &[ComponentBlock] {
        &self.blocks
    }

    /// The first cell whose mnemonic is `label`.
    pub fn get(&self, label: &[u8]) -> Option<&ComponentBlock> {
        let key = mnem_key(label);
        self.blocks.iter().find(|b| mnem_key(&b.mnem) == key)
    }

    pub fn contains(&self, label: &[u8]) -> bool {
        self.get(label).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub lr_type: u8,
    /// The type 73 block naming the table, absent for single parameter tables.
    pub table_cb: Option<ComponentBlock>,
    rows: Vec<TableRow>,
    row_index: HashMap<String, usize>,
    mnem_row_index: HashMap<Vec<u8>, usize>,
    /// Column mnemonics in first seen order with their counts.
    columns: Vec<(Vec<u8>, usize)>,
}

impl Table {
    /// Decode a table from the logical data following the two byte header.
    ///
    /// # Errors
    /// `TableInit` for a structurally invalid table. A block that fails to
    /// decode ends the table with a warning.
    pub fn parse(lr_type: u8, body: &[u8], policy: DuplicateRowPolicy) -> Result<Self> {
        let mut ld = LogicalData::new(body.to_vec());
        let mut table = Self {
            lr_type,
            table_cb: None,
            rows: Vec::new(),
            row_index: HashMap::new(),
            mnem_row_index: HashMap::new(),
            columns: Vec::new(),
        };
        let first = ComponentBlock::read(&mut ld).map_err(|e| match e {
            e @ WellLogError::Io(_) => e,
            e => WellLogError::TableInit(format!("can not read initial component block: {}", e)),
        })?;
        match first.cb_type {
            COMPONENT_BLOCK_TABLE => table.table_cb = Some(first),
            COMPONENT_BLOCK_DATUM_BLOCK_START => table.start_row(first)?,
            other => {
                return Err(WellLogError::TableInit(format!(
                    "no initial table component block, found type {}",
                    other
                )))
            }
        }
        while ld.has_remaining() {
            let cb = match ComponentBlock::read(&mut ld) {
                Ok(cb) => cb,
                Err(e) => {
                    warn!(
                        "Table type {}: can not read component block at index {}: {}",
                        lr_type,
                        ld.index(),
                        e
                    );
                    break;
                }
            };
            match cb.cb_type {
                COMPONENT_BLOCK_DATUM_BLOCK_START => {
                    table.index_last_row(policy);
                    table.start_row(cb)?;
                }
                COMPONENT_BLOCK_DATUM_BLOCK_ENTRY => table.add_entry(cb)?,
                other => {
                    return Err(WellLogError::TableInit(format!("unknown component block type {}", other)));
                }
            }
        }
        table.index_last_row(policy);
        Ok(table)
    }

    fn count_column(&mut self, mnem: &[u8]) {
        match self.columns.iter_mut().find(|(m, _)| m == mnem) {
            Some((_, count)) => *count += 1,
            None => self.columns.push((mnem.to_vec(), 1)),
        }
    }

    fn start_row(&mut self, cb: ComponentBlock) -> Result<()> {
        let mnem = cb.mnem.clone();
        self.rows.push(TableRow::new(cb)?);
        self.count_column(&mnem);
        Ok(())
    }

    fn add_entry(&mut self, cb: ComponentBlock) -> Result<()> {
        if self.is_single_param() {
            return Err(WellLogError::TableInit(
                "entry component block not allowed in a single parameter table".into(),
            ));
        }
        let mnem = cb.mnem.clone();
        self.rows
            .last_mut()
            .ok_or_else(|| WellLogError::TableInit("entry component block with no row start".into()))?
            .add(cb);
        self.count_column(&mnem);
        Ok(())
    }

    /// Index the row just completed, resolving a repeated row name.
    fn index_last_row(&mut self, policy: DuplicateRowPolicy) {
        let Some(last) = self.rows.last() else {
            return;
        };
        let key = last.value().to_string();
        let position = self.rows.len() - 1;
        match (self.row_index.get(&key).copied(), policy) {
            (Some(_), DuplicateRowPolicy::KeepFirst) => {
                self.rows.pop();
                warn!("Discarding duplicate row {} in table {}", key, self.name_string());
            }
            (Some(earlier), DuplicateRowPolicy::KeepLast) => {
                if let Some(row) = self.rows.pop() {
                    warn!("Replacing duplicate row {} in table {}", key, self.name_string());
                    self.rows[earlier] = row;
                    self.index_mnem(earlier);
                }
            }
            (None, _) => {
                self.row_index.insert(key, position);
                self.index_mnem(position);
            }
        }
    }

    fn index_mnem(&mut self, position: usize) {
        if let Some(Value::Text(m)) = self.rows[position].get(b"MNEM").map(|cb| &cb.value) {
            self.mnem_row_index.insert(mnem_key(m), position);
        }
    }

    /// True if this table is a list of single parameters.
    pub fn is_single_param(&self) -> bool {
        self.table_cb.is_none()
    }

    /// The table name, e.g. `CONS`, if it has one.
    pub fn name(&self) -> Option<&Value> {
        self.table_cb.as_ref().map(|cb| &cb.value)
    }

    fn name_string(&self) -> String {
        self.name().map_or_else(|| "<single parameter>".to_string(), |v| v.to_string())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// The row whose name renders as `label`.
    pub fn row(&self, label: &str) -> Option<&TableRow> {
        self.row_index.get(label).map(|i| &self.rows[*i])
    }

    /// The row whose `MNEM` cell is `mnem`, ignoring trailing padding.
    pub fn row_by_mnem(&self, mnem: &[u8]) -> Option<&TableRow> {
        self.mnem_row_index.get(&mnem_key(mnem)).map(|i| &self.rows[*i])
    }

    /// Column mnemonics in first seen order. Not every row has them all.
    pub fn column_labels(&self) -> impl Iterator<Item = &[u8]> {
        self.columns.iter().map(|(m, _)| m.as_slice())
    }

    pub fn column_counts(&self) -> &[(Vec<u8>, usize)] {
        &self.columns
    }

    /// Cells of a row in column order, `None` where the row lacks a column.
    pub fn row_values_in_column_order<'a>(
        &'a self,
        row: &'a TableRow,
    ) -> impl Iterator<Item = Option<&'a ComponentBlock>> + 'a {
        self.columns.iter().map(move |(m, _)| row.get(m))
    }

    /// A header of column mnemonics then one line per row.
    pub fn table_as_strings(&self, sort: bool) -> Vec<Vec<String>> {
        let mut lines: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                self.row_values_in_column_order(row)
                    .map(|cell| cell.map_or_else(String::new, |c| c.value.to_string()))
                    .collect()
            })
            .collect();
        if sort {
            lines.sort();
        }
        let mut out = vec![self.columns.iter().map(|(m, _)| trimmed_text(m)).collect()];
        out.extend(lines);
        out
    }

    /// Mnemonic/value pairs of a single parameter table.
    ///
    /// # Errors
    /// `InvalidFormat` if this is not a single parameter table.
    pub fn key_values(&self, sort: bool) -> Result<Vec<Vec<String>>> {
        if !self.is_single_param() {
            return Err(WellLogError::InvalidFormat(format!(
                "table {} is not a single parameter table",
                self.name_string()
            )));
        }
        let mut pairs: Vec<(String, String)> = self
            .rows
            .iter()
            .map(|row| (trimmed_text(&row.cells()[0].mnem), row.value().to_string()))
            .collect();
        if sort {
            pairs.sort();
        }
        let mut rows = vec![vec!["KEY".to_string(), "VALUE".to_string()]];
        rows.extend(pairs.into_iter().map(|(k, v)| vec![k, v]));
        Ok(rows)
    }

    /// The whole Logical Record, header included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![self.lr_type, 0];
        if let Some(cb) = &self.table_cb {
            out.extend(cb.to_bytes()?);
        }
        for row in &self.rows {
            for cell in self.row_values_in_column_order(row).flatten() {
                out.extend(cell.to_bytes()?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cb(cb_type: u8, mnem: &[u8], value: Value) -> Vec<u8> {
        ComponentBlock::new(cb_type, mnem, b"", value).unwrap().to_bytes().unwrap()
    }

    fn text(v: &[u8]) -> Value {
        Value::Text(v.to_vec())
    }

    fn cons_table(rows: &[(&[u8], &[u8], f64)]) -> Vec<u8> {
        let mut body = cb(COMPONENT_BLOCK_TABLE, b"TYPE", text(b"CONS"));
        for (mnem, stat, puni) in rows {
            body.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_START, b"MNEM", text(mnem)));
            body.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, b"STAT", text(stat)));
            body.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, b"PUNI", Value::Float(*puni)));
        }
        body
    }

    #[test]
    fn component_block_bytes() {
        let bytes = cb(COMPONENT_BLOCK_DATUM_BLOCK_START, b"MNEM", text(b"BHT"));
        assert_eq!(&bytes[..4], &[0, 65, 3, 0]);
        assert_eq!(&bytes[4..12], b"MNEM    ");
        assert_eq!(&bytes[12..], b"BHT");
        let block = ComponentBlock::read(&mut LogicalData::new(bytes)).unwrap();
        assert_eq!(block.value, text(b"BHT"));
        assert_eq!(ComponentBlock::new(69, b"X", b"", Value::Int(300)).unwrap().rep_code, rc::RC_79);
        assert_eq!(ComponentBlock::new(69, b"X", b"", Value::Int(70000)).unwrap().rep_code, rc::RC_73);
    }

    #[test]
    fn rows_and_columns() {
        let body = cons_table(&[(b"BHT ", b"ALLO", 150.0), (b"BS  ", b"DISA", 12.25)]);
        let table = Table::parse(34, &body, DuplicateRowPolicy::default()).unwrap();
        assert_eq!(table.name(), Some(&text(b"CONS")));
        assert!(!table.is_single_param());
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_labels().collect::<Vec<_>>(), vec![&b"MNEM"[..], b"STAT", b"PUNI"]);
        let row = table.row_by_mnem(b"BS").unwrap();
        assert_eq!(row.get(b"PUNI").unwrap().value, Value::Float(12.25));
        assert!(table.row("BHT ").unwrap().get(b"STAT").unwrap().status());
        let strings = table.table_as_strings(false);
        assert_eq!(strings[0], vec!["MNEM", "STAT", "PUNI"]);
        assert_eq!(strings[2], vec!["BS  ", "DISA", "12.25"]);
        assert!(table.key_values(false).is_err());
        let lr = table.to_bytes().unwrap();
        assert_eq!(&lr[..2], &[34, 0]);
        assert_eq!(&lr[2..], &body[..]);
    }

    #[test]
    fn duplicate_rows_follow_policy() {
        let body = cons_table(&[(b"BHT ", b"ALLO", 150.0), (b"BS  ", b"DISA", 12.25), (b"BHT ", b"DISA", 160.0)]);
        let last = Table::parse(34, &body, DuplicateRowPolicy::KeepLast).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last.rows()[0].get(b"PUNI").unwrap().value, Value::Float(160.0));
        assert_eq!(last.row_by_mnem(b"BHT").unwrap().get(b"STAT").unwrap().value, text(b"DISA"));
        let first = Table::parse(34, &body, DuplicateRowPolicy::KeepFirst).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.rows()[0].get(b"PUNI").unwrap().value, Value::Float(150.0));
    }

    #[test]
    fn single_parameter_table() {
        let mut body = cb(COMPONENT_BLOCK_DATUM_BLOCK_START, b"WN  ", text(b"WELL-1"));
        body.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_START, b"FN  ", text(b"FIELD")));
        let table = Table::parse(34, &body, DuplicateRowPolicy::default()).unwrap();
        assert!(table.is_single_param());
        assert_eq!(
            table.key_values(true).unwrap(),
            vec![vec!["KEY", "VALUE"], vec!["FN", "FIELD"], vec!["WN", "WELL-1"]]
        );

        body.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, b"STAT", text(b"ALLO")));
        assert!(matches!(
            Table::parse(34, &body, DuplicateRowPolicy::default()),
            Err(WellLogError::TableInit(_))
        ));
    }

    #[test]
    fn structural_errors() {
        let body = cb(COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, b"STAT", text(b"ALLO"));
        assert!(matches!(
            Table::parse(34, &body, DuplicateRowPolicy::default()),
            Err(WellLogError::TableInit(_))
        ));
        let mut body = cb(COMPONENT_BLOCK_TABLE, b"TYPE", text(b"CONS"));
        body.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, b"STAT", text(b"ALLO")));
        assert!(matches!(
            Table::parse(34, &body, DuplicateRowPolicy::default()),
            Err(WellLogError::TableInit(_))
        ));
        // A truncated trailing block ends the table.
        let mut body = cons_table(&[(b"BHT ", b"ALLO", 150.0)]);
        body.extend([0, 65, 10, 0]);
        assert_eq!(Table::parse(34, &body, DuplicateRowPolicy::default()).unwrap().len(), 1);
    }
}
