//! ACS0-era script and string directories, present whenever `format = Zero` or
//! `indirect = true` (§3, §4.2).

use crate::buffer::Buffer;
use crate::error::Result;
use crate::format::SIZEOF_ACS0_ENTRY;

#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    pub number: i32,
    pub offset: i64,
    pub num_param: i32,
}

/// Reads the script directory at `directory_offset`: a `total_scripts: i32`
/// count followed by that many 12-byte `(number, offset, num_param)` tuples.
pub fn read_script_directory(buffer: &Buffer, directory_offset: usize) -> Result<Vec<DirEntry>> {
    let total_scripts = buffer.read_i32(directory_offset)?.max(0);
    let mut entries = Vec::with_capacity(total_scripts as usize);
    for i in 0..total_scripts {
        let base = directory_offset + 4 + i as usize * SIZEOF_ACS0_ENTRY;
        let number = buffer.read_i32(base)?;
        let offset = buffer.read_i32(base + 4)? as i64;
        let num_param = buffer.read_i32(base + 8)?;
        entries.push(DirEntry {
            number,
            offset,
            num_param,
        });
    }
    Ok(entries)
}

/// Reads the string directory at `string_offset`: a `count: i32` followed by
/// that many 4-byte offsets, each pointing at a NUL-terminated string.
pub fn read_string_directory<'a>(buffer: &Buffer<'a>, string_offset: usize) -> Result<Vec<&'a str>> {
    let count = buffer.read_i32(string_offset)?.max(0);
    let mut strings = Vec::with_capacity(count as usize);
    for i in 0..count {
        let slot = string_offset + 4 + i as usize * 4;
        let offset = buffer.read_i32(slot)? as i64;
        let offset = buffer.require_offset(offset)?;
        strings.push(buffer.read_cstr(offset)?);
    }
    Ok(strings)
}
