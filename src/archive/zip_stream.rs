//! Forward-only ZIP reading.
//!
//! The central directory at the end of the archive is never consulted;
//! entries are read from their local headers in order. Streaming writers
//! (general purpose flag bit 3) leave the sizes and checksum out of the
//! local header and put them in a data descriptor after the data. Such
//! deflated entries are inflated until the deflate stream ends, stored
//! ones are read up to the first descriptor whose sizes agree with the
//! bytes seen so far.

use crate::archive::error::ArchiveError;
use flate2::bufread::DeflateDecoder;
use flate2::Crc;
use std::io::{self, BufRead, Read, Take};

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const ZIP64_END_SIGNATURE: u32 = 0x0606_4b50;
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

const LOCAL_HEADER_LEN: usize = 30;
const FLAG_ENCRYPTED: u16 = 0x0001;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;
const ZIP64_EXTRA_FIELD: u16 = 0x0001;
const ZIP64_SIZE_MARKER: u64 = 0xFFFF_FFFF;

const READ_SIZE: usize = 64 * 1024;

fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut le = [0u8; 8];
    le.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(le)
}

/// Descriptor length including its optional signature.
fn descriptor_len(zip64: bool) -> usize {
    if zip64 {
        24
    } else {
        16
    }
}

fn truncated(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("archive ended inside {what}"),
    )
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Local header of one entry.
#[derive(Debug, Clone)]
pub(crate) struct EntryHeader {
    name: String,
    flags: u16,
    method: u16,
    crc: u32,
    compressed_size: u64,
    size: u64,
    zip64: bool,
}

impl EntryHeader {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    fn has_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    fn apply_zip64_extra(&mut self, extra: &[u8]) {
        let mut rest = extra;
        while rest.len() >= 4 {
            let id = le_u16(rest);
            let len = usize::from(le_u16(&rest[2..]));
            if rest.len() < 4 + len {
                break;
            }
            let (field, next) = rest[4..].split_at(len);
            if id == ZIP64_EXTRA_FIELD {
                self.zip64 = true;
                let mut values = field.chunks_exact(8).map(le_u64);
                if self.size == ZIP64_SIZE_MARKER {
                    self.size = values.next().unwrap_or(self.size);
                }
                if self.compressed_size == ZIP64_SIZE_MARKER {
                    self.compressed_size = values.next().unwrap_or(self.compressed_size);
                }
            }
            rest = next;
        }
    }
}

/// Buffered reader over the raw archive bytes.
pub(crate) struct ZipStream<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
}

impl<R: Read> ZipStream<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(READ_SIZE),
            pos: 0,
        }
    }

    fn available(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Buffers at least `n` bytes. `false` if the input ends first.
    fn fill_to(&mut self, n: usize) -> io::Result<bool> {
        if self.available().len() >= n {
            return Ok(true);
        }
        self.buf.drain(..self.pos);
        self.pos = 0;
        while self.buf.len() < n {
            let len = self.buf.len();
            self.buf.resize(len + READ_SIZE.max(n - len), 0);
            let read = loop {
                match self.inner.read(&mut self.buf[len..]) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    other => break other,
                }
            };
            match read {
                Ok(read) => {
                    self.buf.truncate(len + read);
                    if read == 0 {
                        return Ok(false);
                    }
                }
                Err(e) => {
                    self.buf.truncate(len);
                    return Err(e);
                }
            }
        }
        Ok(true)
    }

    fn take_bytes(&mut self, n: usize, what: &str) -> Result<Vec<u8>, ArchiveError> {
        if !self.fill_to(n).map_err(ArchiveError::Read)? {
            return Err(ArchiveError::Decode(format!("truncated {what}")));
        }
        let bytes = self.available()[..n].to_vec();
        self.pos += n;
        Ok(bytes)
    }

    /// Reads the next local header. `None` once the central directory is reached.
    pub(crate) fn next_header(&mut self) -> Result<Option<EntryHeader>, ArchiveError> {
        if !self.fill_to(4).map_err(ArchiveError::Read)? {
            return Err(ArchiveError::Decode(
                "archive ended before its central directory".to_string(),
            ));
        }
        match le_u32(self.available()) {
            LOCAL_HEADER_SIGNATURE => {}
            CENTRAL_HEADER_SIGNATURE | ZIP64_END_SIGNATURE | END_OF_CENTRAL_DIRECTORY_SIGNATURE => {
                return Ok(None)
            }
            other => {
                return Err(ArchiveError::Decode(format!(
                    "unexpected record signature {other:#010x}"
                )))
            }
        }

        let fixed = self.take_bytes(LOCAL_HEADER_LEN, "local file header")?;
        let name = self.take_bytes(usize::from(le_u16(&fixed[26..])), "file name")?;
        let extra = self.take_bytes(usize::from(le_u16(&fixed[28..])), "extra field")?;

        let mut header = EntryHeader {
            name: String::from_utf8_lossy(&name).into_owned(),
            flags: le_u16(&fixed[6..]),
            method: le_u16(&fixed[8..]),
            crc: le_u32(&fixed[14..]),
            compressed_size: u64::from(le_u32(&fixed[18..])),
            size: u64::from(le_u32(&fixed[22..])),
            zip64: false,
        };
        header.apply_zip64_extra(&extra);
        Ok(Some(header))
    }

    /// Opens the data of the entry whose header was read last.
    pub(crate) fn body(
        &mut self,
        header: &EntryHeader,
    ) -> Result<EntryBody<'_, R>, ArchiveError> {
        let unsupported = |reason: String| ArchiveError::Unsupported {
            entry: header.name.clone(),
            reason,
        };
        if header.flags & FLAG_ENCRYPTED != 0 {
            return Err(unsupported("encrypted entry".to_string()));
        }

        let limit = if header.has_descriptor() {
            u64::MAX
        } else {
            header.compressed_size
        };
        let source = match (header.method, header.has_descriptor()) {
            (METHOD_STORED, false) => Source::Stored(Read::take(self, limit)),
            (METHOD_STORED, true) => Source::StoredUntilDescriptor(self),
            (METHOD_DEFLATED, _) => {
                Source::Deflated(DeflateDecoder::new(Read::take(self, limit)))
            }
            (method, _) => return Err(unsupported(format!("compression method {method}"))),
        };

        Ok(EntryBody {
            source,
            has_descriptor: header.has_descriptor(),
            zip64: header.zip64,
            expected_crc: header.crc,
            expected_size: header.size,
            crc: Crc::new(),
            size: 0,
            finished: false,
        })
    }
}

impl<R: Read> Read for ZipStream<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for ZipStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.fill_to(1)?;
        Ok(self.available())
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.buf.len());
    }
}

enum Source<'a, R> {
    Stored(Take<&'a mut ZipStream<R>>),
    StoredUntilDescriptor(&'a mut ZipStream<R>),
    Deflated(DeflateDecoder<Take<&'a mut ZipStream<R>>>),
}

impl<R: Read> Source<'_, R> {
    fn stream(&mut self) -> &mut ZipStream<R> {
        match self {
            Source::Stored(take) => take.get_mut(),
            Source::StoredUntilDescriptor(stream) => stream,
            Source::Deflated(decoder) => decoder.get_mut().get_mut(),
        }
    }
}

/// Uncompressed data of one entry.
///
/// Reaching the end verifies size and checksum and consumes the data
/// descriptor, if any; a mismatch is returned as an `InvalidData` error
/// in place of the end of data.
pub(crate) struct EntryBody<'a, R> {
    source: Source<'a, R>,
    has_descriptor: bool,
    zip64: bool,
    expected_crc: u32,
    expected_size: u64,
    crc: Crc,
    size: u64,
    finished: bool,
}

impl<R: Read> EntryBody<'_, R> {
    fn finish(&mut self) -> io::Result<()> {
        let (crc, size) = if self.has_descriptor {
            self.read_descriptor()?
        } else {
            match &mut self.source {
                Source::Stored(take) if take.limit() > 0 => return Err(truncated("an entry")),
                // anything the deflate stream did not use
                Source::Deflated(decoder) => {
                    io::copy(decoder.get_mut(), &mut io::sink())?;
                }
                _ => {}
            }
            (self.expected_crc, self.expected_size)
        };

        if size != self.size {
            return Err(invalid_data(format!(
                "expected {size} bytes, got {}",
                self.size
            )));
        }
        if crc != self.crc.sum() {
            return Err(invalid_data("checksum mismatch".to_string()));
        }
        Ok(())
    }

    fn read_descriptor(&mut self) -> io::Result<(u32, u64)> {
        let zip64 = self.zip64;
        let stream = self.source.stream();
        if !stream.fill_to(4)? {
            return Err(truncated("a data descriptor"));
        }
        if le_u32(stream.available()) == DATA_DESCRIPTOR_SIGNATURE {
            stream.consume(4);
        }
        let len = descriptor_len(zip64) - 4;
        if !stream.fill_to(len)? {
            return Err(truncated("a data descriptor"));
        }
        let descriptor = stream.available();
        let crc = le_u32(descriptor);
        let size = if zip64 {
            le_u64(&descriptor[12..])
        } else {
            u64::from(le_u32(&descriptor[8..]))
        };
        stream.consume(len);
        Ok((crc, size))
    }
}

impl<R: Read> Read for EntryBody<'_, R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.finished || out.is_empty() {
            return Ok(0);
        }
        let (seen, zip64) = (self.size, self.zip64);
        let n = match &mut self.source {
            Source::Stored(take) => take.read(out)?,
            Source::StoredUntilDescriptor(stream) => {
                read_until_descriptor(stream, out, seen, zip64)?
            }
            Source::Deflated(decoder) => decoder.read(out)?,
        };
        if n == 0 {
            self.finish()?;
            self.finished = true;
            return Ok(0);
        }
        self.crc.update(&out[..n]);
        self.size += n as u64;
        Ok(n)
    }
}

/// Copies stored data up to the first signed data descriptor whose sizes
/// equal the number of bytes before it. Returns 0 at the descriptor.
fn read_until_descriptor<R: Read>(
    stream: &mut ZipStream<R>,
    out: &mut [u8],
    seen: u64,
    zip64: bool,
) -> io::Result<usize> {
    let len = descriptor_len(zip64);
    if !stream.fill_to(len)? {
        return Err(truncated("a stored entry"));
    }
    let available = stream.available();
    let scan = (available.len() - len + 1).min(out.len());
    let end = (0..scan)
        .find(|&i| is_descriptor(&available[i..], seen + i as u64, zip64))
        .unwrap_or(scan);
    out[..end].copy_from_slice(&available[..end]);
    stream.consume(end);
    Ok(end)
}

fn is_descriptor(window: &[u8], size: u64, zip64: bool) -> bool {
    if le_u32(window) != DATA_DESCRIPTOR_SIGNATURE {
        return false;
    }
    let (compressed, uncompressed) = if zip64 {
        (le_u64(&window[8..]), le_u64(&window[16..]))
    } else {
        (
            u64::from(le_u32(&window[8..])),
            u64::from(le_u32(&window[12..])),
        )
    };
    compressed == size && uncompressed == size
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    /// Lays out entries the way a writer on a non-seekable sink does: flag
    /// bit 3, zeroed sizes in the local header, a signed data descriptor
    /// after the data, then a (minimal) end of central directory record.
    pub(crate) fn streamed_zip(entries: &[(&str, &[u8])], deflate: bool) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, data) in entries {
            let payload = if deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).unwrap();
                encoder.finish().unwrap()
            } else {
                data.to_vec()
            };
            let mut crc = Crc::new();
            crc.update(data);
            let method = if deflate { METHOD_DEFLATED } else { METHOD_STORED };

            out.extend(LOCAL_HEADER_SIGNATURE.to_le_bytes());
            out.extend(20u16.to_le_bytes());
            out.extend(FLAG_DATA_DESCRIPTOR.to_le_bytes());
            out.extend(method.to_le_bytes());
            out.extend([0u8; 4]); // time, date
            out.extend([0u8; 12]); // crc, sizes
            out.extend((name.len() as u16).to_le_bytes());
            out.extend(0u16.to_le_bytes());
            out.extend(name.as_bytes());
            out.extend(&payload);
            out.extend(DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
            out.extend(crc.sum().to_le_bytes());
            out.extend((payload.len() as u32).to_le_bytes());
            out.extend((data.len() as u32).to_le_bytes());
        }
        out.extend(END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        out.extend([0u8; 18]);
        out
    }

    fn read_all(bytes: Vec<u8>) -> Result<Vec<(String, Vec<u8>)>, String> {
        let mut stream = ZipStream::new(Cursor::new(bytes));
        let mut entries = Vec::new();
        while let Some(header) = stream.next_header().map_err(|e| e.to_string())? {
            let mut body = stream.body(&header).map_err(|e| e.to_string())?;
            let mut data = Vec::new();
            body.read_to_end(&mut data).map_err(|e| e.to_string())?;
            entries.push((header.name().to_string(), data));
        }
        Ok(entries)
    }

    #[test]
    fn reads_deflated_entries_with_data_descriptors() {
        let big = b"<location>Taipei</location>".repeat(2_000);
        let zip = streamed_zip(&[("63_Weekday_EN.xml", &big), ("64_72hr_ZH.xml", b"<r/>")], true);

        let entries = read_all(zip).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("63_Weekday_EN.xml".to_string(), big));
        assert_eq!(entries[1].1, b"<r/>");
    }

    #[test]
    fn reads_stored_entries_with_data_descriptors() {
        // the descriptor signature inside the data must not end the entry early
        let mut tricky = b"head".to_vec();
        tricky.extend(DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
        tricky.extend([0u8; 12]);
        tricky.extend(b"tail");
        let zip = streamed_zip(&[("a.xml", &tricky), ("empty.xml", b""), ("b.xml", b"<b/>")], false);

        let entries = read_all(zip).unwrap();

        assert_eq!(entries[0].1, tricky);
        assert_eq!(entries[1], ("empty.xml".to_string(), Vec::new()));
        assert_eq!(entries[2].1, b"<b/>");
    }

    #[test]
    fn reads_archives_with_sizes_in_the_local_header() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("stored.xml", stored).unwrap();
        writer.write_all(b"<s/>").unwrap();
        writer
            .start_file("deflated.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(&b"x".repeat(10_000)).unwrap();
        let zip = writer.finish().unwrap().into_inner();

        let entries = read_all(zip).unwrap();

        assert_eq!(entries[0], ("stored.xml".to_string(), b"<s/>".to_vec()));
        assert_eq!(entries[1].1, b"x".repeat(10_000));
    }

    #[test]
    fn corrupted_checksum_is_an_error() {
        let mut zip = streamed_zip(&[("a.xml", b"<a/>")], false);
        let data_at = LOCAL_HEADER_LEN + "a.xml".len();
        zip[data_at + 1] = b'b';

        let err = read_all(zip).unwrap_err();

        assert!(err.contains("checksum"), "{err}");
    }

    #[test]
    fn truncated_descriptor_entry_is_an_error() {
        let mut zip = streamed_zip(&[("a.xml", &b"y".repeat(5_000))], true);
        zip.truncate(zip.len() - 30);

        assert!(read_all(zip).is_err());
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let mut zip = END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes().to_vec();
        zip.extend([0u8; 18]);
        assert!(read_all(zip).unwrap().is_empty());
    }

    #[test]
    fn unknown_compression_is_unsupported() {
        let mut zip = streamed_zip(&[("a.xml", b"<a/>")], false);
        zip[8] = 12; // bzip2
        let err = read_all(zip).unwrap_err();
        assert!(err.contains("compression method 12"), "{err}");
    }
}
