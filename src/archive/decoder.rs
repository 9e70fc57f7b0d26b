//! Streaming ZIP decoding.
//!
//! The archive arrives over the network, so it cannot be seeked to its
//! central directory. Entries are instead read one after another from
//! their local headers on a blocking thread (see [`super::zip_stream`]),
//! and handed to the async side through channels: one channel of
//! [`ArchiveEntry`] headers, and one bounded channel of byte chunks per
//! entry.

use crate::archive::entry::{ArchiveEntry, Chunk};
use crate::archive::error::ArchiveError;
use crate::archive::zip_stream::ZipStream;
use std::io::{self, Read};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio_util::io::SyncIoBridge;

const CHUNK_SIZE: usize = 16 * 1024;
const CHUNKS_IN_FLIGHT: usize = 8;

/// Starts decoding `reader`. Entries are produced in archive order; the
/// handle resolves to the number of entries once the end of the archive
/// has been reached, or to the first decode error.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn spawn_decoder<R>(
    reader: R,
) -> (mpsc::Receiver<ArchiveEntry>, JoinHandle<Result<usize, ArchiveError>>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (entry_tx, entry_rx) = mpsc::channel(1);
    let bridge = SyncIoBridge::new(reader);
    let handle = task::spawn_blocking(move || decode_entries(bridge, entry_tx));
    (entry_rx, handle)
}

fn decode_entries<R: Read>(
    reader: R,
    entries: mpsc::Sender<ArchiveEntry>,
) -> Result<usize, ArchiveError> {
    let mut stream = ZipStream::new(reader);
    let mut count = 0;
    while let Some(header) = stream.next_header()? {
        count += 1;
        let mut body = stream.body(&header)?;
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNKS_IN_FLIGHT);
        let entry = ArchiveEntry::new(header.name().to_string(), header.is_dir(), chunk_rx);
        if entries.blocking_send(entry).is_err() {
            // nobody is listening any more
            return Ok(count);
        }
        pump(&mut body, chunk_tx).map_err(|source| ArchiveError::EntryData {
            entry: header.name().to_string(),
            source,
        })?;
    }
    Ok(count)
}

/// Copies one entry into its chunk channel. If the consumer goes away the
/// rest of the entry is still read, so the decoder can reach the next one.
fn pump(file: &mut impl Read, chunks: mpsc::Sender<Chunk>) -> io::Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut consumer = Some(chunks);
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                if let Some(tx) = consumer.take() {
                    let _ = tx.blocking_send(Err(io::Error::new(e.kind(), e.to_string())));
                }
                return Err(e);
            }
        };
        if let Some(tx) = &consumer {
            if tx.blocking_send(Ok(buf[..n].to_vec())).is_err() {
                consumer = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    async fn collect(bytes: Vec<u8>) -> (Vec<(String, Vec<u8>)>, Result<usize, ArchiveError>) {
        let (mut rx, handle) = spawn_decoder(Cursor::new(bytes));
        let mut out = Vec::new();
        while let Some(mut entry) = rx.recv().await {
            let mut data = Vec::new();
            while let Ok(Some(chunk)) = entry.next_chunk().await {
                data.extend(chunk);
            }
            out.push((entry.path().to_string(), data));
        }
        (out, handle.await.unwrap())
    }

    #[tokio::test]
    async fn yields_entries_in_archive_order() {
        let big = vec![b'x'; CHUNK_SIZE * 3 + 17];
        let zip = build_zip(&[("a.xml", b"<a/>"), ("big.bin", &big), ("c.txt", b"")]);

        let (entries, result) = collect(zip).await;

        assert_eq!(result.unwrap(), 3);
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a.xml", "big.bin", "c.txt"]);
        assert_eq!(entries[0].1, b"<a/>");
        assert_eq!(entries[1].1, big);
        assert!(entries[2].1.is_empty());
    }

    #[tokio::test]
    async fn dropped_entries_do_not_stall_the_decoder() {
        let big = vec![b'y'; CHUNK_SIZE * 20];
        let zip = build_zip(&[("skip.bin", &big), ("keep.xml", b"<k/>")]);

        let (mut rx, handle) = spawn_decoder(Cursor::new(zip));
        let first = rx.recv().await.unwrap();
        drop(first);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.path(), "keep.xml");
        assert_eq!(second.drain().await.unwrap(), 4);
        assert!(rx.recv().await.is_none());
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn streamed_archives_are_decoded() {
        let zip = crate::archive::zip_stream::tests::streamed_zip(
            &[("63_Weekday_EN.xml", b"<a/>"), ("64_72hr_ZH.xml", b"<b/>")],
            true,
        );
        let (entries, result) = collect(zip).await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(entries[0], ("63_Weekday_EN.xml".to_string(), b"<a/>".to_vec()));
        assert_eq!(entries[1], ("64_72hr_ZH.xml".to_string(), b"<b/>".to_vec()));
    }

    #[tokio::test]
    async fn garbage_is_a_decode_error() {
        let (entries, result) = collect(b"{\"not\":\"a zip\"}".to_vec()).await;
        assert!(entries.is_empty());
        assert!(matches!(result, Err(ArchiveError::Decode(_))));
    }

    #[tokio::test]
    async fn truncated_entry_is_reported() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("small.xml", stored).unwrap();
        writer.write_all(b"<s/>").unwrap();
        writer.start_file("large.bin", stored).unwrap();
        writer.write_all(&vec![b'z'; 100_000]).unwrap();
        let mut zip = writer.finish().unwrap().into_inner();
        zip.truncate(zip.len() / 2);

        let (entries, result) = collect(zip).await;

        assert_eq!(entries[0], ("small.xml".to_string(), b"<s/>".to_vec()));
        assert!(matches!(
            result,
            Err(ArchiveError::EntryData { ref entry, .. }) if entry == "large.bin"
        ));
    }
}
