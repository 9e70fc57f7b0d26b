use std::io;
use tokio::sync::mpsc;

pub(crate) type Chunk = io::Result<Vec<u8>>;

/// One member of the archive: its path and a stream of its bytes.
///
/// The bytes arrive from the decoder while it reads the archive, so every
/// entry has to be consumed, either by a writer or by [`ArchiveEntry::drain`].
/// Dropping an entry early is also fine: the decoder then discards the rest
/// of its bytes itself.
#[derive(Debug)]
pub struct ArchiveEntry {
    path: String,
    is_dir: bool,
    chunks: mpsc::Receiver<Chunk>,
}

impl ArchiveEntry {
    pub(crate) fn new(path: String, is_dir: bool, chunks: mpsc::Receiver<Chunk>) -> Self {
        Self {
            path,
            is_dir,
            chunks,
        }
    }

    /// An entry backed by an in-memory buffer.
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // capacity 1 and a fresh channel: cannot fail
        let _ = tx.try_send(Ok(bytes));
        Self::new(path.into(), false, rx)
    }

    /// Path of the entry inside the archive.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last `/`-separated segment of the path.
    pub fn file_name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir || self.path.ends_with('/')
    }

    /// `Ok(None)` once every byte has been delivered.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.chunks.recv().await.transpose()
    }

    /// Discards the remaining bytes, returning how many there were.
    pub async fn drain(mut self) -> io::Result<u64> {
        let mut total = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            total += chunk.len() as u64;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(ArchiveEntry::from_bytes("63_Weekday_EN.xml", vec![]).file_name(), "63_Weekday_EN.xml");
        assert_eq!(ArchiveEntry::from_bytes("data/64_72hr_ZH.xml", vec![]).file_name(), "64_72hr_ZH.xml");
        let dir = ArchiveEntry::from_bytes("data/", vec![]);
        assert_eq!(dir.file_name(), "data");
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn drain_consumes_all_bytes() {
        let entry = ArchiveEntry::from_bytes("a.xml", b"hello".to_vec());
        assert_eq!(entry.drain().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn chunk_errors_surface() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(Ok(b"ab".to_vec())).await.unwrap();
        tx.send(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "cut")))
            .await
            .unwrap();
        drop(tx);
        let mut entry = ArchiveEntry::new("a.xml".into(), false, rx);
        assert_eq!(entry.next_chunk().await.unwrap(), Some(b"ab".to_vec()));
        assert!(entry.next_chunk().await.is_err());
    }
}
