//! Frame arrays from the CHANNEL and FRAME EFLRs, and reading IFLR frame
//! data into them.

use log::warn;
use std::collections::HashSet;

use super::eflr::{ExplicitlyFormattedLogicalRecord, Object};
use super::types::{EFLR_CHANNEL, EFLR_FRAME};
use crate::welllog::codec::rp66v1 as rc;
use crate::welllog::cursor::LogicalData;
use crate::welllog::frame::summary::mean;
use crate::welllog::frame::{FrameArray, FrameArraySet, FrameChannel};
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::{ObName, Value};

fn first_text(obj: &Object, label: &[u8]) -> Vec<u8> {
    match obj.value(label) {
        Some([Value::Text(t), ..]) => t.clone(),
        _ => Vec::new(),
    }
}

/// A channel from one object of a CHANNEL EFLR.
///
/// # Errors
/// `Ctor` if the representation code is missing, `UnsupportedRepCode` if it
/// is not a known code, `Geometry` for bad dimensions.
pub fn frame_channel_from_object(obj: &Object) -> Result<FrameChannel> {
    let rep_code = obj
        .value(b"REPRESENTATION-CODE")
        .and_then(|v| v.first())
        .and_then(Value::as_i64)
        .ok_or_else(|| WellLogError::Ctor(format!("channel {} has no REPRESENTATION-CODE", obj.name)))?;
    let rep_code = u8::try_from(rep_code).map_err(|_| WellLogError::UnsupportedRepCode(u8::MAX))?;
    let value_size = rc::size_of(rep_code)?;
    let dimensions = match obj.value(b"DIMENSION") {
        Some(values) if !values.is_empty() => values
            .iter()
            .map(|v| {
                v.as_i64()
                    .and_then(|d| usize::try_from(d).ok())
                    .ok_or_else(|| WellLogError::Geometry(format!("channel {} has dimension {}", obj.name, v)))
            })
            .collect::<Result<Vec<_>>>()?,
        _ => vec![1],
    };
    FrameChannel::new(
        obj.name.clone(),
        first_text(obj, b"LONG-NAME"),
        first_text(obj, b"UNITS"),
        rep_code,
        dimensions,
        value_size,
        rc::absent_value(rep_code),
    )
}

/// A frame array from one object of a FRAME EFLR, its channels looked up in
/// the CHANNEL EFLR.
pub fn frame_array_from_object(frame: &Object, channels: &ExplicitlyFormattedLogicalRecord) -> Result<FrameArray> {
    let description = match frame.get(b"DESCRIPTION") {
        Some(attr) if attr.count == 1 => first_text(frame, b"DESCRIPTION"),
        _ => Vec::new(),
    };
    let mut array = FrameArray::new(frame.name.clone(), description);
    for value in frame.value(b"CHANNELS").unwrap_or(&[]) {
        let name = value
            .as_obname()
            .ok_or_else(|| WellLogError::Ctor(format!("frame {} has a non OBNAME channel {}", frame.name, value)))?;
        let obj = channels
            .by_name(name)
            .ok_or_else(|| WellLogError::Ctor(format!("channel {} not in the CHANNEL EFLR", name)))?;
        array.append(frame_channel_from_object(obj)?)?;
    }
    Ok(array)
}

/// All frame arrays described by a FRAME and a CHANNEL EFLR.
///
/// # Errors
/// `Ctor` if the records are not of the expected set and record types.
pub fn log_pass_from_eflrs(
    frame: &ExplicitlyFormattedLogicalRecord,
    channels: &ExplicitlyFormattedLogicalRecord,
) -> Result<FrameArraySet> {
    if frame.set.type_name != b"FRAME" || frame.lr_type != EFLR_FRAME {
        return Err(WellLogError::Ctor(format!(
            "expected a FRAME set in record type {} not {} in type {}",
            EFLR_FRAME, frame.set, frame.lr_type
        )));
    }
    if channels.set.type_name != b"CHANNEL" || channels.lr_type != EFLR_CHANNEL {
        return Err(WellLogError::Ctor(format!(
            "expected a CHANNEL set in record type {} not {} in type {}",
            EFLR_CHANNEL, channels.set, channels.lr_type
        )));
    }
    let mut log_pass = FrameArraySet::new();
    for obj in frame.objects() {
        log_pass.append(frame_array_from_object(obj, channels)?)?;
    }
    Ok(log_pass)
}

fn read_channel(channel: &mut FrameChannel, ld: &mut LogicalData, frame: usize) -> Result<()> {
    for i in 0..channel.count {
        let value = rc::read_f64(channel.rep_code, ld)?;
        channel.set(frame, i, value)?;
    }
    Ok(())
}

fn skip_channel(channel: &FrameChannel, ld: &mut LogicalData) -> Result<()> {
    match channel.sizeof_frame {
        Some(size) => ld.seek(size),
        None => (0..channel.count).try_for_each(|_| rc::skip(channel.rep_code, ld)),
    }
}

fn warn_remaining(ld: &LogicalData, frame: usize) {
    if ld.has_remaining() {
        warn!(
            "Not all logical data consumed, frame {} remaining {} bytes: {}",
            frame,
            ld.remain(),
            hex::encode(ld.view_remaining(16))
        );
    }
}

/// Read one frame from IFLR free data into `frame` of every channel.
pub fn read_frame(array: &mut FrameArray, ld: &mut LogicalData, frame: usize) -> Result<()> {
    for channel in array.channels_mut() {
        read_channel(channel, ld, frame)?;
    }
    warn_remaining(ld, frame);
    Ok(())
}

/// Like [`read_frame`] for the X axis and the named channels only.
pub fn read_frame_partial(
    array: &mut FrameArray,
    ld: &mut LogicalData,
    frame: usize,
    channels: &HashSet<ObName>,
) -> Result<()> {
    for (c, channel) in array.channels_mut().iter_mut().enumerate() {
        if c == 0 || channels.contains(&channel.ident) {
            read_channel(channel, ld, frame)?;
        } else {
            skip_channel(channel, ld)?;
        }
    }
    warn_remaining(ld, frame);
    Ok(())
}

/// The X axis value of the frame at the start of `ld`: the mean of the first
/// channel's values.
pub fn read_x_axis(array: &FrameArray, ld: &mut LogicalData) -> Result<f64> {
    let x = array.x_axis()?;
    let values = (0..x.count)
        .map(|_| rc::read_f64(x.rep_code, ld))
        .collect::<Result<Vec<_>>>()?;
    Ok(mean(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welllog::codec::rp66v1::encode;

    fn channel(name: &str, rep_code: u8, dims: Vec<usize>) -> FrameChannel {
        FrameChannel::new(
            ObName::new(2, 0, name),
            vec![],
            vec![],
            rep_code,
            dims,
            rc::size_of(rep_code).unwrap(),
            rc::absent_value(rep_code),
        )
        .unwrap()
    }

    fn frame_bytes() -> Vec<u8> {
        let mut bytes = encode(&Value::Float(1000.5), rc::FDOUBL).unwrap();
        bytes.extend(encode(&Value::Float(1.0), rc::FSINGL).unwrap());
        bytes.extend(encode(&Value::Float(2.0), rc::FSINGL).unwrap());
        bytes.extend(encode(&Value::Int(-7), rc::SNORM).unwrap());
        bytes
    }

    fn array() -> FrameArray {
        let mut array = FrameArray::new(ObName::new(2, 0, "50"), vec![]);
        array.append(channel("DEPT", rc::FDOUBL, vec![1])).unwrap();
        array.append(channel("WAVE", rc::FSINGL, vec![2])).unwrap();
        array.append(channel("FLAG", rc::SNORM, vec![1])).unwrap();
        array
    }

    #[test]
    fn read_whole_and_partial_frames() {
        let mut array = array();
        assert_eq!(array.sizeof_frame(), Some(18));
        array.init_arrays(2);
        read_frame(&mut array, &mut LogicalData::new(frame_bytes()), 1).unwrap();
        assert_eq!(array.get(1).unwrap().frame(1).unwrap(), &[1.0, 2.0]);
        assert_eq!(array.get(2).unwrap().get(1, 0).unwrap(), -7.0);
        assert_eq!(array.get(2).unwrap().absent, Some(-999.0));

        let mut partial = self::array();
        let wanted: HashSet<ObName> = [ObName::new(2, 0, "FLAG")].into_iter().collect();
        partial.init_arrays_partial(1, &wanted);
        read_frame_partial(&mut partial, &mut LogicalData::new(frame_bytes()), 0, &wanted).unwrap();
        assert_eq!(partial.get(0).unwrap().get(0, 0).unwrap(), 1000.5);
        assert!(partial.get(1).unwrap().is_empty());
        assert_eq!(partial.get(2).unwrap().get(0, 0).unwrap(), -7.0);
    }

    #[test]
    fn x_axis_is_mean_of_first_channel() {
        let mut array = FrameArray::new(ObName::new(2, 0, "1"), vec![]);
        array.append(channel("TIME", rc::FSINGL, vec![2])).unwrap();
        let mut ld = LogicalData::new(frame_bytes()[8..16].to_vec());
        assert_eq!(read_x_axis(&array, &mut ld).unwrap(), 1.5);
    }
}
