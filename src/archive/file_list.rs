use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::BufRead;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

/// Lazily reads NUL-terminated paths from a stream, one record at a time.
///
/// Surrounding ASCII whitespace is trimmed and empty records are skipped.
/// Paths are raw bytes, so names that are not valid UTF-8 pass through.
pub struct NullDelimitedPaths<R: BufRead> {
    /// Source of `\0` separated records
    reader: R,
    /// Reused record buffer
    buf: Vec<u8>,
}

impl<R: BufRead> NullDelimitedPaths<R> {
    /// Read records from `reader`
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for NullDelimitedPaths<R> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\0', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let record = self.buf.strip_suffix(b"\0").unwrap_or(&self.buf);
                    let record = record.trim_ascii();
                    if record.is_empty() {
                        continue;
                    }
                    return Some(Ok(PathBuf::from(OsString::from_vec(record.to_vec()))));
                }
                Err(e) => return Some(Err(e).context("Failed to read file list")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &[u8]) -> Vec<PathBuf> {
        NullDelimitedPaths::new(Cursor::new(input.to_vec()))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_records() {
        assert_eq!(
            collect(b"/etc/hosts\0/srv/data\0"),
            vec![PathBuf::from("/etc/hosts"), PathBuf::from("/srv/data")]
        );
    }

    #[test]
    fn test_unterminated_last_record() {
        assert_eq!(
            collect(b"/a\0/b"),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_whitespace_and_empty_records() {
        assert_eq!(
            collect(b"\n/a\n\0\0  \0/with space\0"),
            vec![PathBuf::from("/a"), PathBuf::from("/with space")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(collect(b"").is_empty());
    }

    #[test]
    fn test_non_utf8_passthrough() {
        let paths = collect(b"/odd\xffname\0");
        assert_eq!(paths[0].as_os_str().as_encoded_bytes(), b"/odd\xffname");
    }
}
