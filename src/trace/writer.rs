use std::fs::File;
use std::io::Write;
use std::path::Path;

use bevy::log::info;

use crate::error::{SphError, SphResult};
use crate::math::{Real, Vector};

/// Appends one record per frame to a position trace.
pub struct FrameWriter<W: Write> {
    writer: csv::Writer<W>,
    frames: u64,
}

impl FrameWriter<File> {
    /// Create (or truncate) the trace file at `path`.
    pub fn create(path: impl AsRef<Path>, delimiter: u8) -> SphResult<Self> {
        let path = path.as_ref();
        check_delimiter(delimiter)?;
        let file = File::create(path)?;
        info!("Writing position trace to {}", path.display());
        Self::from_writer(file, delimiter)
    }
}

impl<W: Write> FrameWriter<W> {
    pub fn from_writer(inner: W, delimiter: u8) -> SphResult<Self> {
        check_delimiter(delimiter)?;
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(inner);
        Ok(Self { writer, frames: 0 })
    }

    /// Write every position as an `x y` field and flush the record.
    ///
    /// Empty frames produce no record.
    pub fn write_frame(&mut self, positions: &[Vector]) -> SphResult<()> {
        if positions.is_empty() {
            return Ok(());
        }
        self.writer
            .write_record(positions.iter().map(|p| format_point(*p)))?;
        self.writer.flush()?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Flush and hand back the underlying sink.
    pub fn into_inner(self) -> SphResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| SphError::Io(std::io::Error::new(e.error().kind(), e.to_string())))
    }
}

#[inline]
pub fn format_point(point: Vector) -> String {
    format!("{:.10} {:.10}", point.x, point.y)
}

// The delimiter must not collide with anything a formatted number contains.
fn check_delimiter(delimiter: u8) -> SphResult<()> {
    let collides = delimiter.is_ascii_digit()
        || delimiter.is_ascii_whitespace()
        || matches!(delimiter, b'.' | b'-' | b'+' | b'e' | b'E' | b'"');
    if collides {
        Err(SphError::InvalidParameter {
            name: "delimiter",
            value: delimiter as Real,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_single_delimited_lines() {
        let mut writer = FrameWriter::from_writer(Vec::new(), b';').unwrap();
        writer
            .write_frame(&[Vector::new(1.0, 2.5), Vector::new(-3.25, 0.0)])
            .unwrap();
        writer.write_frame(&[Vector::new(0.125, 4.0)]).unwrap();
        assert_eq!(writer.frames_written(), 2);

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "1.0000000000 2.5000000000;-3.2500000000 0.0000000000\n\
             0.1250000000 4.0000000000\n"
        );
    }

    #[test]
    fn empty_frames_are_skipped() {
        let mut writer = FrameWriter::from_writer(Vec::new(), b',').unwrap();
        writer.write_frame(&[]).unwrap();
        assert_eq!(writer.frames_written(), 0);
        assert!(writer.into_inner().unwrap().is_empty());
    }

    #[test]
    fn numeric_delimiters_are_rejected() {
        assert!(FrameWriter::from_writer(Vec::new(), b'.').is_err());
        assert!(FrameWriter::from_writer(Vec::new(), b' ').is_err());
        assert!(FrameWriter::from_writer(Vec::new(), b'7').is_err());
        assert!(FrameWriter::from_writer(Vec::new(), b'|').is_ok());
    }
}
