//! FileMedia trait - abstract byte source for lzip reading.

use crate::error::Result;
use std::io::{Read, Seek, SeekFrom};

/// Interval for reading a byte range. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadInterval {
    pub start: u64,
    pub end: u64,
}

/// Abstract seekable byte source.
///
/// The member index builder walks a file backwards and only ever asks for
/// byte ranges, so anything that knows its length and can serve ranges
/// works: local files, memory buffers, or remote blobs behind range
/// requests.
pub trait FileMedia {
    fn length(&self) -> u64;
    fn name(&self) -> &str;
    fn read_range(&self, interval: ReadInterval) -> Result<Vec<u8>>;
}

/// Local file implementation.
#[derive(Debug, Clone)]
pub struct LocalFileMedia {
    path: String,
    name: String,
    length: u64,
}

impl LocalFileMedia {
    pub fn new(path: &str) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            path: path.to_string(),
            name,
            length: metadata.len(),
        })
    }
}

impl FileMedia for LocalFileMedia {
    fn length(&self) -> u64 {
        self.length
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_range(&self, interval: ReadInterval) -> Result<Vec<u8>> {
        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(interval.start))?;
        let len = (interval.end - interval.start + 1) as usize;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

/// In-memory implementation, mostly for tests and fuzzing.
#[derive(Debug, Clone)]
pub struct MemoryMedia {
    name: String,
    data: Vec<u8>,
}

impl MemoryMedia {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            name: "(memory)".to_string(),
            data,
        }
    }
}

impl FileMedia for MemoryMedia {
    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_range(&self, interval: ReadInterval) -> Result<Vec<u8>> {
        let end = interval.end + 1;
        if interval.start >= end || end > self.data.len() as u64 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "read range out of bounds",
            )
            .into());
        }
        Ok(self.data[interval.start as usize..end as usize].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_media_ranges() {
        let media = MemoryMedia::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(media.length(), 5);
        assert_eq!(
            media.read_range(ReadInterval { start: 1, end: 3 }).unwrap(),
            vec![2, 3, 4]
        );
        assert!(media.read_range(ReadInterval { start: 3, end: 5 }).is_err());
    }
}
