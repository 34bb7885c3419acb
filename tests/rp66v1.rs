use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use welllog_reader::rp66v1::{IndexOptions, LogicalIndex, LogicalRecordIndex};
use welllog_reader::{Dialect, FrameSlice, NoProgress, ObName, Sample, Slice, WellLogError};

const CHANNELS: [&str; 5] = ["DEPT", "TENS", "ETIM", "DHTN", "GR"];

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn basic_index() -> LogicalIndex {
    let _ = env_logger::builder().is_test(true).try_init();
    LogicalIndex::open(fixture_path("basic.dlis"), IndexOptions::default(), &mut NoProgress)
        .expect("basic.dlis indexes")
}

fn frame_50() -> ObName {
    ObName::new(2, 0, b"50".to_vec())
}

fn channel(ident: &str) -> ObName {
    ObName::new(2, 0, ident.as_bytes().to_vec())
}

#[test]
fn test_dialect_detection() {
    assert_eq!(
        Dialect::of_path(fixture_path("basic.dlis")).unwrap(),
        Some(Dialect::Rp66v1)
    );
}

#[test]
fn test_record_index_counts() {
    let index = LogicalRecordIndex::open(fixture_path("basic.dlis"), IndexOptions::default(), &mut NoProgress).unwrap();
    assert_eq!(index.file_len(), 44916);
    assert_eq!(index.len(), 660);
    let eflrs = index.iter().filter(|e| e.description.is_eflr()).count();
    assert_eq!(eflrs, 10);
    assert_eq!(index.len() - eflrs, 650);
    assert_eq!(index.sul().maximum_record_length, 8192);
    index.validate().unwrap();
}

/// The Storage Unit Label, one Visible Record and the FILE-HEADER and ORIGIN
/// records of basic.dlis.
fn minimal_file() -> Vec<u8> {
    let mut bytes = std::fs::read(fixture_path("basic.dlis")).unwrap();
    bytes.truncate(716);
    bytes[80..82].copy_from_slice(&(716u16 - 80).to_be_bytes());
    bytes
}

#[test]
fn test_minimal_file_positions() {
    let index =
        LogicalRecordIndex::from_reader(Cursor::new(minimal_file()), "minimal.dlis", IndexOptions::default(), &mut NoProgress)
            .unwrap();
    assert_eq!(index.len(), 2);
    let expected = [(80, 84, 0x80, 0, 120), (80, 208, 0x81, 1, 504)];
    for (i, &(vr_position, lrsh_position, attributes, lr_type, ld_length)) in expected.iter().enumerate() {
        let entry = index.get(i).unwrap();
        assert_eq!(entry.position.vr_position, vr_position);
        assert_eq!(entry.position.lrsh_position, lrsh_position);
        assert_eq!(entry.description.attributes.0, attributes);
        assert_eq!(entry.description.lr_type, lr_type);
        assert_eq!(entry.description.ld_length, ld_length);
    }
    let header = index.get_file_logical_data(0, 0, Some(8)).unwrap();
    assert_eq!(header.data.bytes(), b"\xf0\x0bFILE-H");
    assert_eq!(header.data.index(), 0);
    let origin = index.get_file_logical_data(1, 0, Some(8)).unwrap();
    assert_eq!(origin.data.bytes(), b"\xf0\x06ORIGIN");
}

#[test]
fn test_logical_data_reads_are_repeatable() {
    let index = LogicalRecordIndex::open(fixture_path("basic.dlis"), IndexOptions::default(), &mut NoProgress).unwrap();
    for i in [0, 5, 9, 10, 659] {
        let first = index.get_file_logical_data(i, 0, None).unwrap();
        let second = index.get_file_logical_data(i, 0, None).unwrap();
        assert!(first.is_sealed());
        assert_eq!(first.data.bytes(), second.data.bytes());
    }
}

#[test]
fn test_snapshot_reattaches() {
    let path = fixture_path("basic.dlis");
    let index = LogicalRecordIndex::open(&path, IndexOptions::default(), &mut NoProgress).unwrap();
    let bytes = index.snapshot().unwrap();
    let restored = LogicalRecordIndex::from_snapshot(&path, &bytes).unwrap();
    assert_eq!(restored.len(), index.len());
    assert_eq!(restored.get(42), index.get(42));
    let a = index.get_file_logical_data(3, 0, None).unwrap();
    let b = restored.get_file_logical_data(3, 0, None).unwrap();
    assert_eq!(a.data.bytes(), b.data.bytes());
    assert_eq!(a.is_sealed(), b.is_sealed());
}

#[test]
fn test_snapshot_refuses_other_file() {
    let index = LogicalRecordIndex::open(fixture_path("basic.dlis"), IndexOptions::default(), &mut NoProgress).unwrap();
    let bytes = index.snapshot().unwrap();
    let mut other = tempfile::NamedTempFile::new().unwrap();
    other.write_all(&std::fs::read(fixture_path("basic.dlis")).unwrap()[..1024]).unwrap();
    other.flush().unwrap();
    assert!(LogicalRecordIndex::from_snapshot(other.path(), &bytes).is_err());
}

#[test]
fn test_closed_index() {
    let index = LogicalRecordIndex::open(fixture_path("basic.dlis"), IndexOptions::default(), &mut NoProgress).unwrap();
    index.close().unwrap();
    assert!(index.is_closed());
    assert!(matches!(
        index.get_file_logical_data(0, 0, None),
        Err(WellLogError::ClosedIndex)
    ));
}

#[test]
fn test_bad_storage_unit_label() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut bytes = std::fs::read(fixture_path("basic.dlis")).unwrap();
    bytes[4..9].copy_from_slice(b"V2.00");
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    assert!(matches!(
        LogicalRecordIndex::open(file.path(), IndexOptions::default(), &mut NoProgress),
        Err(WellLogError::InvalidFormat(_))
    ));
}

#[test]
fn test_logical_file_and_x_axis() {
    let index = basic_index();
    assert_eq!(index.len(), 1);
    let lf = index.get(0).unwrap();
    assert!(lf.has_log_pass());
    assert_eq!(lf.log_pass().unwrap().len(), 1);
    let keys: Vec<&ObName> = lf.iflr_position_map().keys().collect();
    assert_eq!(keys, vec![&frame_50()]);

    let x_axis = lf.x_axis(&frame_50()).unwrap();
    assert_eq!(x_axis.len(), 649);
    assert_eq!(x_axis.get(0).unwrap().x_axis, 2889.4);
    assert_eq!(x_axis.get(1).unwrap().x_axis, 2889.5);
    let summary = x_axis.summary().unwrap();
    assert_eq!(summary.min, 2889.4);
    assert_eq!(summary.max, 2954.199999999941);
    assert_eq!(summary.count, 649);
    let spacing = summary.spacing.as_ref().unwrap();
    assert_eq!(spacing.median, 0.09999999999990905);
    assert_eq!(spacing.std, 0.0);
    assert_eq!(spacing.counts.norm, 648);
    assert_eq!(spacing.counts.dupe, 0);
    assert_eq!(spacing.counts.skip, 0);
    assert_eq!(spacing.counts.back, 0);
}

#[test]
fn test_populate_whole_frame_array() {
    let mut index = basic_index();
    let count = index
        .populate_frame_array(0, &frame_50(), &FrameSlice::default(), None)
        .unwrap();
    assert_eq!(count, 649);
    let array = index.frame_array(0, &frame_50()).unwrap();
    let names: Vec<String> = array
        .channels()
        .iter()
        .map(|c| String::from_utf8_lossy(&c.ident.ident).into_owned())
        .collect();
    assert_eq!(names, CHANNELS);
    assert_eq!(array.sizeof_frame(), Some(28));
    assert_eq!(array.shape(), vec![vec![649, 1]; 5]);

    let dept = array.x_axis().unwrap();
    assert_eq!(dept.get(0, 0).unwrap(), 2889.4);
    assert_eq!(dept.get(648, 0).unwrap(), 2954.199999999941);

    let gr = array.by_ident(&channel("GR")).unwrap().summary().unwrap();
    assert_eq!(gr.len, 649);
    assert_eq!(gr.count, 276);
    assert_eq!(gr.max, 166.50909423828125);
    assert_eq!(gr.min, 43.20060729980469);
}

#[test]
fn test_populate_some_channels() {
    let mut index = basic_index();
    let channels: HashSet<ObName> = [channel("TENS"), channel("GR")].into_iter().collect();
    let count = index
        .populate_frame_array(0, &frame_50(), &FrameSlice::default(), Some(&channels))
        .unwrap();
    assert_eq!(count, 649);
    let array = index.frame_array(0, &frame_50()).unwrap();
    assert_eq!(
        array.shape(),
        vec![vec![649, 1], vec![649, 1], vec![0, 1], vec![0, 1], vec![649, 1]]
    );
    let tens = array.by_ident(&channel("TENS")).unwrap().summary().unwrap();
    assert_eq!(tens.count, 282);
    assert_eq!(tens.max, 5988.41015625);
}

#[test]
fn test_populate_slice_and_sample() {
    let mut index = basic_index();
    let slice = Slice::new(Some(8), Some(64), Some(2)).unwrap();
    let count = index
        .populate_frame_array(0, &frame_50(), &slice.into(), None)
        .unwrap();
    assert_eq!(count, 28);
    let dept = index.frame_array(0, &frame_50()).unwrap().x_axis().unwrap();
    assert_eq!(dept.len(), 28);
    assert!((dept.get(0, 0).unwrap() - 2890.2).abs() < 1e-9);
    assert!((dept.get(1, 0).unwrap() - 2890.4).abs() < 1e-9);

    let sample = Sample::new(64).unwrap();
    let count = index
        .populate_frame_array(0, &frame_50(), &sample.into(), None)
        .unwrap();
    assert_eq!(count, 64);
}

#[test]
fn test_populate_empty_selection_clears_arrays() {
    let mut index = basic_index();
    let count = index
        .populate_frame_array(0, &frame_50(), &FrameSlice::default(), None)
        .unwrap();
    assert_eq!(count, 649);
    let past_the_end = Slice::new(Some(700), Some(800), None).unwrap();
    let count = index
        .populate_frame_array(0, &frame_50(), &past_the_end.into(), None)
        .unwrap();
    assert_eq!(count, 0);
    let array = index.frame_array(0, &frame_50()).unwrap();
    assert_eq!(array.shape(), vec![vec![0, 1]; 5]);
    assert!(array.x_axis().unwrap().summary().is_none());
}
