//! L5: code-extent inference.
//!
//! No chunk or directory records an explicit code length. The end of a
//! script's or function's bytecode is reconstructed as the nearest later
//! offset among every offset-shaped field in the file (§4.5).

use crate::buffer::Buffer;
use crate::chunk::{walk, Tag};
use crate::directory::read_script_directory;
use crate::error::Result;
use crate::format::Layout;
use crate::scripttab;

/// Every candidate "later offset" collected once per file, consulted by
/// [`ExtentContext::code_size`] for each code span.
pub struct ExtentContext {
    candidates: Vec<i64>,
}

impl ExtentContext {
    pub fn build(buffer: &Buffer, layout: &Layout) -> Result<Self> {
        let mut candidates = Vec::new();

        if layout.format.has_chunks() {
            walk(buffer, layout, |chunk| {
                match chunk.tag {
                    Tag::Sptr => {
                        let view = chunk.view();
                        let step = scripttab::sizeof(layout.indirect);
                        let mut local = 0;
                        while local + step <= view.len() {
                            let entry = scripttab::read_one(&view, local, layout.indirect)?;
                            candidates.push(entry.offset);
                            local += step;
                        }
                    }
                    Tag::Func => {
                        let view = chunk.view();
                        let mut local = 0;
                        while local + 8 <= view.len() {
                            candidates.push(view.read_i32(local + 4)? as i64);
                            local += 8;
                        }
                    }
                    _ => {}
                }
                Ok(())
            })?;
            if let Some(chunk_offset) = layout.chunk_offset {
                candidates.push(chunk_offset as i64);
            }
        }

        if let Some(directory_offset) = layout.directory_offset {
            for entry in read_script_directory(buffer, directory_offset)? {
                candidates.push(entry.offset);
            }
            if let Some(string_offset) = layout.string_offset {
                let count = buffer.read_i32(string_offset)?.max(0);
                for i in 0..count {
                    let slot = string_offset + 4 + i as usize * 4;
                    candidates.push(buffer.read_i32(slot)? as i64);
                }
            }
            candidates.push(directory_offset as i64);
        }

        Ok(Self { candidates })
    }

    /// Returns a conservative upper bound on the code size starting at `offset`:
    /// never shorter than the real code, though it may run past the real end.
    pub fn code_size(&self, buffer: &Buffer, offset: i64) -> usize {
        let mut end = buffer.len() as i64;
        for &candidate in &self.candidates {
            if candidate > offset && candidate < end {
                end = candidate;
            }
        }
        (end - offset).max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn put_i32(bytes: &mut [u8], offset: usize, value: i32) {
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn picks_the_nearest_later_offset_across_the_script_and_string_directories() {
        let mut bytes = vec![0u8; 300];
        // Script directory at offset 0: total_scripts=2, entries (number, offset, num_param).
        put_i32(&mut bytes, 0, 2);
        put_i32(&mut bytes, 4, 1);
        put_i32(&mut bytes, 8, 50);
        put_i32(&mut bytes, 12, 0);
        put_i32(&mut bytes, 16, 2);
        put_i32(&mut bytes, 20, 100);
        put_i32(&mut bytes, 24, 0);
        // String directory at offset 28: count=1, one offset pointing at 200.
        put_i32(&mut bytes, 28, 1);
        put_i32(&mut bytes, 32, 200);

        let buffer = Buffer::new(&bytes).unwrap();
        let layout = Layout {
            format: Format::Zero,
            indirect: false,
            small_code: false,
            directory_offset: Some(0),
            string_offset: Some(28),
            chunk_offset: None,
            real_header_offset: None,
        };

        let extent = ExtentContext::build(&buffer, &layout).unwrap();
        assert_eq!(extent.code_size(&buffer, 40), 10); // nearest later offset is 50
        assert_eq!(extent.code_size(&buffer, 60), 40); // nearest later offset is 100
        assert_eq!(extent.code_size(&buffer, 250), 50); // nothing later than 250 but EOF at 300
    }
}
