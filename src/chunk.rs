//! L3: the chunk walker.
//!
//! Iterates the chunk region under strict bounds discipline and materializes each
//! chunk as a typed, named slice of the file buffer. Chunks are never persisted;
//! they are produced transiently by [`walk`] and consumed immediately by L4.

use crate::buffer::Buffer;
use crate::error::{ill_formed, Result};
use crate::format::Layout;

/// The set of chunk tags this inspector recognizes. Tag lookup is
/// case-insensitive on the four-character name; anything else decodes as
/// `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Aray,
    Aini,
    Aimp,
    Astr,
    Mstr,
    Atag,
    Load,
    Func,
    Fnam,
    Mini,
    Mimp,
    Mexp,
    Sptr,
    Sflg,
    Svct,
    Snam,
    Strl,
    Stre,
    Sary,
    Fary,
    Alib,
    Unknown,
}

impl Tag {
    pub fn from_name(name: &str) -> Tag {
        match name.to_ascii_uppercase().as_str() {
            "ARAY" => Tag::Aray,
            "AINI" => Tag::Aini,
            "AIMP" => Tag::Aimp,
            "ASTR" => Tag::Astr,
            "MSTR" => Tag::Mstr,
            "ATAG" => Tag::Atag,
            "LOAD" => Tag::Load,
            "FUNC" => Tag::Func,
            "FNAM" => Tag::Fnam,
            "MINI" => Tag::Mini,
            "MIMP" => Tag::Mimp,
            "MEXP" => Tag::Mexp,
            "SPTR" => Tag::Sptr,
            "SFLG" => Tag::Sflg,
            "SVCT" => Tag::Svct,
            "SNAM" => Tag::Snam,
            "STRL" => Tag::Strl,
            "STRE" => Tag::Stre,
            "SARY" => Tag::Sary,
            "FARY" => Tag::Fary,
            "ALIB" => Tag::Alib,
            _ => Tag::Unknown,
        }
    }
}

/// A typed slice of the file buffer naming one chunk in the chunk region.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub name: [u8; 4],
    pub data_offset: usize,
    pub size: usize,
    pub tag: Tag,
    bytes: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub fn name_str(&self) -> String {
        self.name.iter().map(|&b| b as char).collect()
    }

    /// The chunk's body, clamped to the file -- *not* necessarily to the chunk
    /// region's `end` cursor, per the spec's tolerant-length rule.
    pub fn data(&self) -> &'a [u8] {
        self.bytes
    }

    /// A chunk-scoped view for L4 decoders: bounds checks clamp to
    /// `[data_offset, data_offset + size)` even when that range extends past the
    /// file or past the chunk region's `end`.
    pub fn view(&self) -> ChunkView<'a> {
        ChunkView {
            base: self.data_offset,
            bytes: self.bytes,
        }
    }
}

/// A bounds-checked cursor over one chunk's body, used by every L4 decoder.
#[derive(Debug, Clone, Copy)]
pub struct ChunkView<'a> {
    base: usize,
    bytes: &'a [u8],
}

impl<'a> ChunkView<'a> {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute file offset corresponding to chunk-local offset `local`.
    pub fn absolute(&self, local: usize) -> usize {
        self.base + local
    }

    fn require(&self, local: usize, want: usize) -> Result<()> {
        let available = self.bytes.len() as i64 - local as i64;
        if available >= want as i64 {
            Ok(())
        } else {
            ill_formed(format!(
                "short read: requested {want} bytes at chunk-local offset {local:#x}, chunk has {} bytes",
                self.bytes.len()
            ))
        }
    }

    pub fn slice(&self, local: usize, len: usize) -> Result<&'a [u8]> {
        self.require(local, len)?;
        Ok(&self.bytes[local..local + len])
    }

    pub fn read_u8(&self, local: usize) -> Result<u8> {
        Ok(self.slice(local, 1)?[0])
    }

    pub fn read_i16(&self, local: usize) -> Result<i16> {
        use scroll::Pread;
        let s = self.slice(local, 2)?;
        Ok(s.pread_with(0, scroll::LE)?)
    }

    pub fn read_u16(&self, local: usize) -> Result<u16> {
        use scroll::Pread;
        let s = self.slice(local, 2)?;
        Ok(s.pread_with(0, scroll::LE)?)
    }

    pub fn read_i32(&self, local: usize) -> Result<i32> {
        use scroll::Pread;
        let s = self.slice(local, 4)?;
        Ok(s.pread_with(0, scroll::LE)?)
    }

    pub fn read_u32(&self, local: usize) -> Result<u32> {
        use scroll::Pread;
        let s = self.slice(local, 4)?;
        Ok(s.pread_with(0, scroll::LE)?)
    }

    /// A NUL-terminated string read from chunk-local offset `local`; the NUL must
    /// appear before the chunk ends or this fails with `IllFormed`.
    pub fn read_cstr(&self, local: usize) -> Result<&'a str> {
        let rest = self
            .bytes
            .get(local..)
            .ok_or_else(|| crate::error::Error::IllFormed(format!("chunk-local offset {local:#x} out of range")))?;
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| crate::error::Error::IllFormed("unterminated string".into()))?;
        Ok(std::str::from_utf8(&rest[..nul])
            .map_err(|e| crate::error::Error::IllFormed(format!("string is not valid UTF-8: {e}")))?)
    }
}

/// Walks the chunk region `[chunk_offset, end)`, invoking `visit` for each chunk
/// materialized in ascending order. Restartable: both `find_chunk` and
/// `view_chunk` drive separate calls to this function.
pub fn walk<'a>(buffer: &Buffer<'a>, layout: &Layout, mut visit: impl FnMut(Chunk<'a>) -> Result<()>) -> Result<()> {
    let Some(start) = layout.chunk_offset else {
        return Ok(());
    };
    let end = layout.chunk_region_end(buffer);
    let mut cursor = start;

    loop {
        let remaining = end as i64 - cursor as i64;
        if remaining < 8 {
            break;
        }
        buffer.require_bytes(cursor, 8)?;
        let name_bytes = buffer.slice(cursor, 4)?;
        let name = [name_bytes[0], name_bytes[1], name_bytes[2], name_bytes[3]];
        let size = buffer.read_i32(cursor + 4)?;
        if size < 0 {
            return ill_formed(format!("chunk '{}' declares negative size {size}", String::from_utf8_lossy(&name)));
        }
        let size = size as usize;
        let data_offset = cursor + 8;
        // The chunk's body must lie entirely within the file, even though it may
        // extend past `end` -- the walker still advances past it.
        buffer.require_bytes(data_offset, size)?;
        let bytes = buffer.slice(data_offset, size)?;
        let tag = Tag::from_name(&name.iter().map(|&b| b as char).collect::<String>());

        visit(Chunk {
            name,
            data_offset,
            size,
            tag,
            bytes,
        })?;

        cursor = data_offset + size;
    }
    Ok(())
}

/// Returns the first chunk whose name matches `name` (case-insensitive), if any.
pub fn find_chunk<'a>(buffer: &Buffer<'a>, layout: &Layout, name: &str) -> Result<Option<Chunk<'a>>> {
    let mut found = None;
    walk(buffer, layout, |chunk| {
        if found.is_none() && chunk.name_str().eq_ignore_ascii_case(name) {
            found = Some(chunk);
        }
        Ok(())
    })?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn sample() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"ARAY");
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(b"FOOO");
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[9, 9]);
        bytes
    }

    fn layout() -> Layout {
        Layout {
            format: Format::BigE,
            indirect: false,
            small_code: false,
            directory_offset: None,
            string_offset: None,
            chunk_offset: Some(0),
            real_header_offset: None,
        }
    }

    #[test]
    fn walk_visits_every_chunk_in_order() {
        let bytes = sample();
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = layout();
        let mut seen = Vec::new();
        walk(&buffer, &layout, |c| {
            seen.push((c.name_str(), c.tag, c.size));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![("ARAY".to_string(), Tag::Aray, 0), ("FOOO".to_string(), Tag::Unknown, 2)]);
    }

    #[test]
    fn find_chunk_is_case_insensitive() {
        let bytes = sample();
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = layout();
        let found = find_chunk(&buffer, &layout, "aray").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().tag, Tag::Aray);
    }

    #[test]
    fn view_clamps_to_the_chunk_body() {
        let bytes = sample();
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = layout();
        let foo = find_chunk(&buffer, &layout, "FOOO").unwrap().unwrap();
        let view = foo.view();
        assert_eq!(view.len(), 2);
        assert!(view.slice(0, 3).is_err());
        assert_eq!(view.slice(0, 2).unwrap(), &[9, 9]);
    }

    #[test]
    fn empty_chunk_region_yields_no_chunks() {
        let bytes = Vec::new();
        let buffer = Buffer::new(&bytes).unwrap();
        let mut layout = layout();
        layout.chunk_offset = Some(0);
        let mut count = 0;
        walk(&buffer, &layout, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 0);
    }
}
