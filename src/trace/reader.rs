use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{SphError, SphResult};
use crate::math::{Real, Vector};

/// Streams frames back out of a position trace, one record at a time.
pub struct FrameReader<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    frames: u64,
}

impl FrameReader<File> {
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> SphResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, delimiter))
    }
}

impl<R: Read> FrameReader<R> {
    pub fn from_reader(inner: R, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(inner);
        Self {
            reader,
            record: csv::StringRecord::new(),
            frames: 0,
        }
    }

    /// Read the next frame, or `None` at end of input.
    pub fn next_frame(&mut self) -> SphResult<Option<Vec<Vector>>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        let record = self.frames;
        self.frames += 1;

        let last = self.record.len().saturating_sub(1);
        let mut points = Vec::with_capacity(self.record.len());
        for (field, text) in self.record.iter().enumerate() {
            // Tolerate a trailing delimiter.
            if field == last && text.trim().is_empty() && field > 0 {
                continue;
            }
            let point = parse_point(text).map_err(|reason| SphError::MalformedRecord {
                record,
                field,
                reason,
            })?;
            points.push(point);
        }
        Ok(Some(points))
    }

    pub fn frames_read(&self) -> u64 {
        self.frames
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = SphResult<Vec<Vector>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// Parse one `"x y"` field.
pub fn parse_point(field: &str) -> Result<Vector, String> {
    let mut parts = field.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected two coordinates, got {:?}", field));
    };
    let x: Real = x
        .parse()
        .map_err(|e| format!("bad x coordinate {:?}: {}", x, e))?;
    let y: Real = y
        .parse()
        .map_err(|e| format!("bad y coordinate {:?}: {}", y, e))?;
    Ok(Vector::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frames_lazily() {
        let input = "1.5 2.0;3.0 -4.0\n0.0 0.0\n";
        let mut reader = FrameReader::from_reader(input.as_bytes(), b';');

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first, vec![Vector::new(1.5, 2.0), Vector::new(3.0, -4.0)]);
        assert_eq!(reader.frames_read(), 1);

        let second = reader.next().unwrap().unwrap();
        assert_eq!(second, vec![Vector::ZERO]);
        assert!(reader.next().is_none());
    }

    #[test]
    fn trailing_delimiter_is_ignored() {
        let mut reader = FrameReader::from_reader("1 2;3 4;\n".as_bytes(), b';');
        assert_eq!(reader.next().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn malformed_field_reports_position() {
        let mut reader = FrameReader::from_reader("1 2;3 4\n1 2;oops\n".as_bytes(), b';');
        assert!(reader.next().unwrap().is_ok());
        match reader.next() {
            Some(Err(SphError::MalformedRecord { record, field, .. })) => {
                assert_eq!(record, 1);
                assert_eq!(field, 1);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn parse_point_rejects_wrong_arity() {
        assert!(parse_point("1.0").is_err());
        assert!(parse_point("1.0 2.0 3.0").is_err());
        assert_eq!(parse_point(" 1e-3  7 ").unwrap(), Vector::new(0.001, 7.0));
    }
}
