//! Per-channel CSV codec
//!
//! One comma-separated file per channel, header first, one row per record,
//! rows joined by `\n` with no trailing newline. Floats use the shortest
//! representation that reads back to the same value, with exponents written
//! as a signed two-digit minimum (`1e-07`, `1e+16`).

use super::types::ExportError;
use crate::recorder::channel::Channel;
use crate::recorder::samples::{CompositeRecord, MotionSample, OrientationSample, PositionSample, Vector3};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::io;

pub const POSITION_HEADER: &str = "Time,Latitude,Longitude";

/// Angular velocity is written under the legacy gravity column names
pub const ORIENTATION_HEADER: &str = "Time,GravityX,GravityY,GyavityZ";

pub const MOTION_HEADER: &str = "Time,AccelerationX,AccelerationY,AccelerationZ";

pub fn header(channel: Channel) -> &'static str {
    match channel {
        Channel::Position => POSITION_HEADER,
        Channel::Orientation => ORIENTATION_HEADER,
        Channel::Motion => MOTION_HEADER,
    }
}

fn columns(channel: Channel) -> Vec<&'static str> {
    header(channel).split(',').collect()
}

/// Format a value the way exported files spell numbers
pub fn format_float(value: f64) -> String {
    let text = format!("{:?}", value);
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}

fn fields(channel: Channel, record: &CompositeRecord) -> Vec<f64> {
    match channel {
        Channel::Position => {
            let p = &record.position;
            vec![p.timestamp, p.latitude, p.longitude]
        }
        Channel::Orientation => {
            let o = &record.orientation;
            let v = o.angular_velocity;
            vec![o.timestamp, v.x, v.y, v.z]
        }
        Channel::Motion => {
            let m = &record.motion;
            let v = m.linear_acceleration;
            vec![m.timestamp, v.x, v.y, v.z]
        }
    }
}

/// One record's row for `channel`
pub fn row(channel: Channel, record: &CompositeRecord) -> String {
    fields(channel, record)
        .into_iter()
        .map(format_float)
        .collect::<Vec<_>>()
        .join(",")
}

/// Full file content for `channel`
pub fn render(channel: Channel, records: &[CompositeRecord]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns(channel))?;
    for record in records {
        writer.write_record(fields(channel, record).into_iter().map(format_float))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut content =
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if content.ends_with('\n') {
        content.pop();
    }
    Ok(content)
}

/// Parse a channel file into rows of floats, checking the header and width
pub fn parse_rows(channel: Channel, content: &str) -> Result<Vec<Vec<f64>>, ExportError> {
    let parse_err = |line: usize, message: String| ExportError::Parse {
        channel,
        line,
        message,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let expected = columns(channel);
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(parse_err(1, "missing header".to_string()));
    }
    if headers.iter().ne(expected.iter().copied()) {
        return Err(parse_err(1, format!("unexpected header {:?}", headers)));
    }

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        if record.len() != expected.len() {
            return Err(parse_err(
                line,
                format!("expected {} columns, got {}", expected.len(), record.len()),
            ));
        }
        let values = record
            .iter()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| parse_err(line, format!("{:?}: {}", field, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }
    Ok(rows)
}

pub fn parse_position(content: &str) -> Result<Vec<PositionSample>, ExportError> {
    Ok(parse_rows(Channel::Position, content)?
        .into_iter()
        .map(|r| PositionSample::new(r[0], r[1], r[2]))
        .collect())
}

pub fn parse_orientation(content: &str) -> Result<Vec<OrientationSample>, ExportError> {
    Ok(parse_rows(Channel::Orientation, content)?
        .into_iter()
        .map(|r| OrientationSample::new(r[0], Vector3::new(r[1], r[2], r[3])))
        .collect())
}

pub fn parse_motion(content: &str) -> Result<Vec<MotionSample>, ExportError> {
    Ok(parse_rows(Channel::Motion, content)?
        .into_iter()
        .map(|r| MotionSample::new(r[0], Vector3::new(r[1], r[2], r[3])))
        .collect())
}
