//! The ACSE script-table entry (§3 of the spec): two physical layouts chosen by
//! `indirect`, projected onto one common shape so callers never branch on it.

use crate::chunk::ChunkView;
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct ScriptTableEntry {
    pub number: i32,
    pub script_type: i32,
    pub num_param: i32,
    pub offset: i64,
}

/// Compact layout used by indirect files: `(number: i16, type: u8, num_param: u8,
/// offset: i32)`.
const SIZEOF_INDIRECT: usize = 8;
/// Direct layout: `(number: i16, type: i16, offset: i32, num_param: i32)`.
const SIZEOF_DIRECT: usize = 12;

pub fn sizeof(indirect: bool) -> usize {
    if indirect {
        SIZEOF_INDIRECT
    } else {
        SIZEOF_DIRECT
    }
}

/// Reads one entry at chunk-local offset `local`. The layout is keyed on
/// `indirect`, not on the format's name, per the spec's "double-duplicated
/// layouts" design note.
pub fn read_one(view: &ChunkView, local: usize, indirect: bool) -> Result<ScriptTableEntry> {
    if indirect {
        let number = view.read_i16(local)? as i32;
        let script_type = view.read_u8(local + 2)? as i32;
        let num_param = view.read_u8(local + 3)? as i32;
        let offset = view.read_i32(local + 4)? as i64;
        Ok(ScriptTableEntry {
            number,
            script_type,
            num_param,
            offset,
        })
    } else {
        let number = view.read_i16(local)? as i32;
        let script_type = view.read_i16(local + 2)? as i32;
        let offset = view.read_i32(local + 4)? as i64;
        let num_param = view.read_i32(local + 8)?;
        Ok(ScriptTableEntry {
            number,
            script_type,
            num_param,
            offset,
        })
    }
}
