//! Per-value posting lists
//!
//! Each list is a serialized roaring bitmap of doc numbers. Lists are
//! appended to one shared buffer and addressed by [`PostingListMeta`].

use std::io;

use roaring::RoaringBitmap;

use super::types::{DocNo, PostingListMeta};

/// Appends posting lists to a shared buffer
#[derive(Debug, Default)]
pub struct PostingsWriter {
    data: Vec<u8>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one posting list and return where it landed
    pub fn write_list(&mut self, docnos: &[DocNo]) -> io::Result<PostingListMeta> {
        let bitmap: RoaringBitmap = docnos.iter().map(|d| d.as_u32()).collect();
        if bitmap.len() != docnos.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Posting list holds duplicate docnos",
            ));
        }

        let offset = self.data.len() as u64;
        bitmap.serialize_into(&mut self.data)?;

        Ok(PostingListMeta {
            offset,
            length: self.data.len() as u64 - offset,
            doc_frequency: docnos.len() as u32,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Reads posting lists out of a shared buffer
#[derive(Clone, Debug, Default)]
pub struct PostingsReader {
    data: Vec<u8>,
}

impl PostingsReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Open a fresh iterator over one posting list.
    ///
    /// Iterators carry a cursor; each query takes its own.
    pub fn get_postings(&self, meta: &PostingListMeta) -> io::Result<PostingIterator> {
        let bytes = usize::try_from(meta.offset)
            .ok()
            .zip(usize::try_from(meta.offset + meta.length).ok())
            .and_then(|(start, end)| self.data.get(start..end))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "Posting list extends beyond data")
            })?;

        let docs = RoaringBitmap::deserialize_from(bytes)?;
        if docs.len() != u64::from(meta.doc_frequency) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Posting list holds {} docs, dictionary says {}",
                    docs.len(),
                    meta.doc_frequency
                ),
            ));
        }
        Ok(PostingIterator::new(docs))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Cursor over the docnos of one posting list, ascending
#[derive(Clone, Debug)]
pub struct PostingIterator {
    docs: RoaringBitmap,
    /// Rank of the next docno to return
    cursor: u64,
}

impl PostingIterator {
    pub fn new(docs: RoaringBitmap) -> Self {
        Self { docs, cursor: 0 }
    }

    /// Docnos not yet returned
    pub fn remaining(&self) -> u64 {
        self.docs.len().saturating_sub(self.cursor)
    }

    /// Advance to the first docno >= target
    pub fn skip_to(&mut self, target: DocNo) -> Option<DocNo> {
        let below = match target.as_u32().checked_sub(1) {
            Some(prev) => self.docs.rank(prev),
            None => 0,
        };
        self.cursor = self.cursor.max(below);
        self.next()
    }

    /// The whole list, regardless of the cursor
    pub fn into_bitmap(self) -> RoaringBitmap {
        self.docs
    }
}

impl Iterator for PostingIterator {
    type Item = DocNo;

    fn next(&mut self) -> Option<Self::Item> {
        let rank = u32::try_from(self.cursor).ok()?;
        let docno = self.docs.select(rank)?;
        self.cursor += 1;
        Some(DocNo(docno))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}
