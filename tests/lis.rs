use std::io::Write;

use tempfile::NamedTempFile;
use welllog_reader::lis::logi_rec::{FileHeadTail, ReelTapeHeadTail};
use welllog_reader::lis::table::{
    ComponentBlock, COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, COMPONENT_BLOCK_DATUM_BLOCK_START, COMPONENT_BLOCK_TABLE,
};
use welllog_reader::lis::{
    DatumSpecBlock, Dfsr, EntryBlockSet, FileIndex, IndexEntry, PhysicalRecordTail, PhysicalRecordWriter, ReadOptions,
};
use welllog_reader::welllog::codec::lis as rc;
use welllog_reader::{Dialect, Slice, Value, WellLogError};

const RECORDS: usize = 4;
const FRAMES_PER_RECORD: usize = 5;

fn dept(frame: usize) -> f64 {
    1000.0 + 0.5 * frame as f64
}

fn reel_tape(lr_type: u8, name: &[u8]) -> Vec<u8> {
    ReelTapeHeadTail {
        lr_type,
        service_name: b"WLOG".to_vec(),
        date: b"19/10/18".to_vec(),
        origin: b"ORIG".to_vec(),
        name: name.to_vec(),
        continuation_number: b"01".to_vec(),
        continuation_name: Vec::new(),
        comments: b"Synthetic".to_vec(),
    }
    .to_bytes()
}

fn file_head_tail(lr_type: u8) -> Vec<u8> {
    FileHeadTail {
        lr_type,
        file_name: b"WLOG  .001".to_vec(),
        service_sub_level: Vec::new(),
        version: b"1.0".to_vec(),
        date: b"19/10/18".to_vec(),
        max_pr_length: b" 1024".to_vec(),
        file_type: b"LO".to_vec(),
        continuation_name: Vec::new(),
    }
    .to_bytes()
}

fn cb(cb_type: u8, mnem: &[u8], value: Value) -> Vec<u8> {
    ComponentBlock::new(cb_type, mnem, b"", value).unwrap().to_bytes().unwrap()
}

fn well_data() -> Vec<u8> {
    let mut lr = vec![34, 0];
    lr.extend(cb(COMPONENT_BLOCK_TABLE, b"TYPE", Value::Text(b"CONS".to_vec())));
    for (mnem, value) in [(b"BHT ", 150.0), (b"BS  ", 12.25)] {
        lr.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_START, b"MNEM", Value::Text(mnem.to_vec())));
        lr.extend(cb(COMPONENT_BLOCK_DATUM_BLOCK_ENTRY, b"PUNI", Value::Float(value)));
    }
    lr
}

/// Direct X axis: DEPT, GR and CALI.
fn dfsr() -> Dfsr {
    Dfsr::new(
        EntryBlockSet::new(),
        vec![
            DatumSpecBlock::new(b"DEPT", b"FEET", rc::RC_68, 1, 1).unwrap(),
            DatumSpecBlock::new(b"GR  ", b"GAPI", rc::RC_68, 1, 1).unwrap(),
            DatumSpecBlock::new(b"CALI", b"IN  ", rc::RC_79, 1, 1).unwrap(),
        ],
    )
}

fn data_record(record: usize) -> Vec<u8> {
    let mut lr = vec![0, 0];
    for frame in record * FRAMES_PER_RECORD..(record + 1) * FRAMES_PER_RECORD {
        lr.extend(rc::encode_f64(dept(frame), rc::RC_68).unwrap());
        lr.extend(rc::encode_f64(2.0 * frame as f64, rc::RC_68).unwrap());
        lr.extend(rc::encode_f64(frame as f64, rc::RC_79).unwrap());
    }
    lr
}

fn lis_bytes(has_tif: bool) -> Vec<u8> {
    let mut records = vec![
        reel_tape(132, b"REEL"),
        reel_tape(130, b"TAPE"),
        file_head_tail(128),
        well_data(),
        dfsr().to_bytes().unwrap(),
    ];
    records.extend((0..RECORDS).map(data_record));
    records.extend([file_head_tail(129), reel_tape(131, b"TAPE"), reel_tape(133, b"REEL")]);
    let tail = PhysicalRecordTail::new(true, Some(1), false);
    let mut writer = PhysicalRecordWriter::new(Vec::new(), has_tif, 64, tail).unwrap();
    for lr in &records {
        writer.write_logical_record(lr).unwrap();
    }
    writer.close().unwrap()
}

fn lis_file(has_tif: bool) -> NamedTempFile {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&lis_bytes(has_tif)).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_dialect_detection() {
    for has_tif in [false, true] {
        let file = lis_file(has_tif);
        assert_eq!(Dialect::of_path(file.path()).unwrap(), Some(Dialect::Lis));
    }
}

#[test]
fn test_index_structure() {
    for has_tif in [false, true] {
        let file = lis_file(has_tif);
        let index = FileIndex::open(file.path(), ReadOptions::default()).unwrap();
        let types: Vec<u8> = index.entries().iter().map(|e| e.position().lr_type).collect();
        assert_eq!(types, vec![132, 130, 128, 34, 64, 129, 131, 133]);
        assert_eq!(index.num_data_records(), RECORDS);
        assert!(matches!(index.entries()[0], IndexEntry::ReelTapeHeadTail(_, _)));
        assert!(matches!(index.entries()[2], IndexEntry::FileHeadTail(_, _)));

        let table = index.tables().next().unwrap();
        assert_eq!(table.name(), Some(&Value::Text(b"CONS".to_vec())));
        let bht = table.row_by_mnem(b"BHT").unwrap();
        assert_eq!(bht.get(b"PUNI").unwrap().value, Value::Float(150.0));
        assert!(table.row_by_mnem(b"BS").is_some());
    }
}

#[test]
fn test_log_pass_x_axis() {
    let file = lis_file(false);
    let index = FileIndex::open(file.path(), ReadOptions::default()).unwrap();
    let pass = index.log_pass(0).unwrap();
    assert!(index.log_pass(1).is_err());
    assert!(!pass.is_indirect_x());
    assert_eq!(pass.total_frames(), RECORDS * FRAMES_PER_RECORD);
    assert_eq!(pass.rle().num_records(), RECORDS);
    assert_eq!(pass.x_axis_units(), b"FEET");
    assert_eq!(pass.x_axis_first_val(), Some(1000.0));
    assert_eq!(pass.x_axis_spacing().unwrap(), Some(0.5));
    assert_eq!(pass.x_axis_last_val().unwrap(), Some(dept(19)));
    assert_eq!(pass.frame_from_x(1004.2).unwrap(), 8);
    assert_eq!(pass.frame_from_x_in_units(120_000.0, b".1IN").unwrap(), 0);
    assert!(pass.frame_from_x(999.0).is_err());
    assert_eq!(pass.ch_sc(b"CALI").unwrap(), (2, 0));
}

#[test]
fn test_read_frame_sets() {
    let file = lis_file(true);
    let mut index = FileIndex::open(file.path(), ReadOptions::default()).unwrap();

    let pass = index.set_frame_set(0, None, None).unwrap();
    let fs = pass.frame_set().unwrap();
    assert_eq!(fs.num_frames(), 20);
    assert_eq!(fs.x_axis_values().unwrap(), (0..20).map(dept).collect::<Vec<_>>());
    assert_eq!(fs.ch_sc_values(1, 0).unwrap(), (0..20).map(|f| 2.0 * f as f64).collect::<Vec<_>>());
    let cali = fs.summary(2, 0).unwrap().unwrap();
    assert_eq!(cali.count, 20);
    assert_eq!(cali.max, 19.0);

    let selection = Slice::new(Some(3), Some(18), Some(4)).unwrap();
    let pass = index.set_frame_set(0, Some(selection.into()), Some(&[1][..])).unwrap();
    let fs = pass.frame_set().unwrap();
    assert_eq!(fs.frame_numbers(), &[3, 7, 11, 15]);
    assert_eq!(fs.ext_channel_indices(), &[0, 1]);
    assert_eq!(fs.ch_sc_values(1, 0).unwrap(), vec![6.0, 14.0, 22.0, 30.0]);
    assert_eq!(fs.x_axis_values().unwrap(), vec![dept(3), dept(7), dept(11), dept(15)]);
    assert!(fs.ch_sc_values(2, 0).is_err());

    let selection = Slice::new(None, None, Some(-7)).unwrap();
    let pass = index.set_frame_set(0, Some(selection.into()), None).unwrap();
    assert_eq!(pass.frame_set().unwrap().frame_numbers(), &[19, 12, 5]);
    assert_eq!(pass.ch_sc_points(b"GR").unwrap(), vec![(dept(19), 38.0), (dept(12), 24.0), (dept(5), 10.0)]);
}

#[test]
fn test_truncated_file() {
    let mut bytes = lis_bytes(false);
    bytes.truncate(bytes.len() - 20);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    assert!(matches!(
        FileIndex::open(file.path(), ReadOptions::default()),
        Err(WellLogError::Truncated { .. })
    ));
}
