//! L4: one decoder per recognized chunk tag (§4.4).
//!
//! Every decoder reads its chunk body through the chunk-scoped bounds
//! discipline in [`crate::chunk::ChunkView`]. Script and function bodies
//! additionally drive the L5/L6 extent-inference and disassembly passes.

use std::io::Write;

use crate::buffer::Buffer;
use crate::chunk::{Chunk, ChunkView, Tag};
use crate::diagnostics::Diagnostics;
use crate::disasm;
use crate::error::{Diagnostic, Result};
use crate::extent::ExtentContext;
use crate::format::Layout;
use crate::scripttab;

/// Writes one chunk's header line and full body, dispatching on its tag.
pub fn dump_chunk(
    out: &mut dyn Write,
    buffer: &Buffer,
    layout: &Layout,
    extent: &ExtentContext,
    diagnostics: &mut Diagnostics,
    chunk: &Chunk,
) -> Result<()> {
    writeln!(out, "-- {} (offset={:#x} size={})", chunk.name_str(), chunk.data_offset, chunk.size)?;
    let view = chunk.view();

    match chunk.tag {
        Tag::Aray => dump_aray(out, &view),
        Tag::Aini => dump_aini(out, &view),
        Tag::Aimp => dump_aimp(out, &view),
        Tag::Astr | Tag::Mstr => dump_tagged_strings(out, &view),
        Tag::Atag => dump_atag(out, &view, diagnostics),
        Tag::Load => dump_load(out, &view),
        Tag::Func => dump_func(out, buffer, layout, extent, diagnostics, &view),
        Tag::Fnam => dump_offset_strings(out, &view, "name"),
        Tag::Mini => dump_mini(out, &view),
        Tag::Mimp => dump_mimp(out, &view),
        Tag::Mexp => dump_offset_strings(out, &view, "export"),
        Tag::Sptr => dump_sptr(out, buffer, layout, extent, diagnostics, &view),
        Tag::Sflg => dump_sflg(out, &view),
        Tag::Svct => dump_svct(out, &view),
        Tag::Snam => dump_snam(out, &view),
        Tag::Strl => dump_strl(out, &view, false),
        Tag::Stre => dump_strl(out, &view, true),
        Tag::Sary | Tag::Fary => dump_owned_array(out, &view),
        Tag::Alib => Ok(()),
        Tag::Unknown => {
            diagnostics.push(Diagnostic::UnsupportedChunk {
                name: chunk.name_str(),
            });
            writeln!(out, "   <unsupported chunk>")?;
            Ok(())
        }
    }
}

fn dump_aray(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    let mut local = 0;
    while local + 8 <= view.len() {
        let number = view.read_i32(local)?;
        let size = view.read_i32(local + 4)?;
        writeln!(out, "   array {number}: size={size}")?;
        local += 8;
    }
    Ok(())
}

fn dump_aini(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    if view.len() < 4 {
        return Ok(());
    }
    let index = view.read_i32(0)?;
    write!(out, "   init array {index}:")?;
    let mut local = 4;
    while local + 4 <= view.len() {
        write!(out, " {}", view.read_i32(local)?)?;
        local += 4;
    }
    writeln!(out)?;
    Ok(())
}

fn dump_aimp(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    if view.len() < 4 {
        return Ok(());
    }
    let count = view.read_i32(0)?.max(0);
    let mut local = 4;
    for _ in 0..count {
        let index = view.read_i32(local)?;
        let size = view.read_u32(local + 4)?;
        let name = view.read_cstr(local + 8)?;
        writeln!(out, "   import array {index}: size={size} name={name}")?;
        local += 8 + name.len() + 1;
    }
    Ok(())
}

fn dump_tagged_strings(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    let mut local = 0;
    while local + 4 <= view.len() {
        writeln!(out, "   string-object {}", view.read_u32(local)?)?;
        local += 4;
    }
    Ok(())
}

fn dump_atag(out: &mut dyn Write, view: &ChunkView, diagnostics: &mut Diagnostics) -> Result<()> {
    if view.is_empty() {
        return Ok(());
    }
    let version = view.read_u8(0)?;
    if version != 0 {
        diagnostics.push(Diagnostic::UnsupportedChunkVersion { version });
        writeln!(out, "   <unsupported ATAG version {version}>")?;
        return Ok(());
    }
    let array_index = view.read_i32(1)?;
    write!(out, "   tags for array {array_index}:")?;
    let mut local = 5;
    while local < view.len() {
        let tag = view.read_u8(local)?;
        let name = match tag {
            0 => "integer",
            1 => "string",
            2 => "function",
            _ => "unknown",
        };
        write!(out, " {name}")?;
        local += 1;
    }
    writeln!(out)?;
    Ok(())
}

fn dump_load(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    let mut local = 0;
    while local < view.len() {
        let name = view.read_cstr(local)?;
        if !name.is_empty() {
            writeln!(out, "   imported-module={name}")?;
        }
        local += name.len() + 1;
    }
    Ok(())
}

fn dump_func(
    out: &mut dyn Write,
    buffer: &Buffer,
    layout: &Layout,
    extent: &ExtentContext,
    diagnostics: &mut Diagnostics,
    view: &ChunkView,
) -> Result<()> {
    let mut local = 0;
    let mut number = 0i32;
    while local + 8 <= view.len() {
        let num_param = view.read_u8(local)?;
        let size = view.read_u8(local + 1)?;
        let has_return = view.read_u8(local + 2)?;
        let offset = view.read_i32(local + 4)? as i64;
        writeln!(
            out,
            "   function {number}: num_param={num_param} size={size} has_return={has_return} offset={offset:#x}"
        )?;
        if offset != 0 {
            disassemble_entry(out, buffer, layout, extent, diagnostics, "function", offset)?;
        }
        local += 8;
        number += 1;
    }
    Ok(())
}

fn dump_offset_strings(out: &mut dyn Write, view: &ChunkView, label: &str) -> Result<()> {
    if view.len() < 4 {
        return Ok(());
    }
    let count = view.read_i32(0)?.max(0);
    let mut local = 4;
    for i in 0..count {
        let offset_in_chunk = view.read_i32(local)? as usize;
        let text = view.read_cstr(offset_in_chunk)?;
        writeln!(out, "   {label} {i}: {text}")?;
        local += 4;
    }
    Ok(())
}

fn dump_mini(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    if view.len() < 4 {
        return Ok(());
    }
    let first_var = view.read_i32(0)?;
    let mut local = 4;
    let mut var = first_var;
    while local + 4 <= view.len() {
        writeln!(out, "   map-var {var} = {}", view.read_i32(local)?)?;
        local += 4;
        var += 1;
    }
    Ok(())
}

fn dump_mimp(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    let mut local = 0;
    while local + 4 < view.len() {
        let index = view.read_i32(local)?;
        let name = view.read_cstr(local + 4)?;
        writeln!(out, "   import map-var {index}: {name}")?;
        local += 4 + name.len() + 1;
    }
    Ok(())
}

fn dump_sptr(
    out: &mut dyn Write,
    buffer: &Buffer,
    layout: &Layout,
    extent: &ExtentContext,
    diagnostics: &mut Diagnostics,
    view: &ChunkView,
) -> Result<()> {
    let step = scripttab::sizeof(layout.indirect);
    let mut local = 0;
    while local + step <= view.len() {
        let entry = scripttab::read_one(view, local, layout.indirect)?;
        writeln!(
            out,
            "   script {} (type={} num_param={} offset={:#x})",
            entry.number, entry.script_type, entry.num_param, entry.offset
        )?;
        disassemble_entry(out, buffer, layout, extent, diagnostics, "script", entry.offset)?;
        local += step;
    }
    Ok(())
}

fn dump_sflg(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    let mut local = 0;
    while local + 4 <= view.len() {
        let number = view.read_i16(local)?;
        let flags = view.read_u16(local + 2)?;
        let mut names = Vec::new();
        if flags & 0x1 != 0 {
            names.push("net");
        }
        if flags & 0x2 != 0 {
            names.push("clientside");
        }
        let unknown = flags & !0x3;
        write!(out, "   script {number} flags: {}", names.join(","))?;
        if unknown != 0 {
            write!(out, " unknown={unknown:#x}")?;
        }
        writeln!(out)?;
        local += 4;
    }
    Ok(())
}

fn dump_svct(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    let mut local = 0;
    while local + 4 <= view.len() {
        let number = view.read_i16(local)?;
        let new_size = view.read_i16(local + 2)?;
        writeln!(out, "   script {number} local-var-count={new_size}")?;
        local += 4;
    }
    Ok(())
}

fn dump_snam(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    if view.len() < 4 {
        return Ok(());
    }
    let count = view.read_i32(0)?.max(0);
    let mut local = 4;
    for i in 0..count {
        let offset_in_chunk = view.read_i32(local)? as usize;
        let text = view.read_cstr(offset_in_chunk)?;
        let number = -(i + 1);
        writeln!(out, "   named script {number}: {text}")?;
        local += 4;
    }
    Ok(())
}

fn dump_strl(out: &mut dyn Write, view: &ChunkView, obfuscated: bool) -> Result<()> {
    if view.len() < 12 {
        return Ok(());
    }
    let count = view.read_i32(4)?.max(0);
    let mut local = 12;
    for i in 0..count {
        let offset_in_chunk = view.read_i32(local)? as usize;
        let text = if obfuscated {
            read_obfuscated_cstr(view, offset_in_chunk)?
        } else {
            view.read_cstr(offset_in_chunk)?.to_string()
        };
        writeln!(out, "   string {i}: {text}")?;
        local += 4;
    }
    Ok(())
}

/// Decodes an `STRE`-obfuscated string at chunk-local offset `s`: byte *k* is
/// recovered as `decoded = byte ^ (s * 157135 + floor(k/2)) mod 256` (§4.4).
fn read_obfuscated_cstr(view: &ChunkView, s: usize) -> Result<String> {
    let mut out = String::new();
    let mut k: u32 = 0;
    loop {
        let byte = view.read_u8(s + k as usize)?;
        let key = (s as u32).wrapping_mul(157135).wrapping_add(k / 2) as u8;
        let decoded = byte ^ key;
        if decoded == 0 {
            break;
        }
        out.push(decoded as char);
        k += 1;
    }
    Ok(out)
}

fn dump_owned_array(out: &mut dyn Write, view: &ChunkView) -> Result<()> {
    if view.len() < 2 {
        return Ok(());
    }
    let owner = view.read_i16(0)?;
    write!(out, "   owner {owner}:")?;
    let mut local = 2;
    while local + 4 <= view.len() {
        write!(out, " {}", view.read_i32(local)?)?;
        local += 4;
    }
    writeln!(out)?;
    Ok(())
}

/// Resolves and disassembles a script or function body at file offset
/// `offset`, reporting -- and skipping the body of -- any entry that points
/// outside the file rather than aborting the whole dump.
fn disassemble_entry(
    out: &mut dyn Write,
    buffer: &Buffer,
    layout: &Layout,
    extent: &ExtentContext,
    diagnostics: &mut Diagnostics,
    kind: &'static str,
    offset: i64,
) -> Result<()> {
    if !buffer.offset_in_file(offset) {
        diagnostics.push(Diagnostic::OutOfBoundsEntry { kind, offset });
        return Ok(());
    }
    let offset = offset as usize;
    let len = extent.code_size(buffer, offset as i64);
    disasm::disassemble(out, buffer, layout, offset, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn encode(s: usize, plain: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for (k, byte) in plain.bytes().enumerate() {
            let key = (s as u32).wrapping_mul(157135).wrapping_add((k as u32) / 2) as u8;
            out.push(byte ^ key);
        }
        let nul_key = (s as u32).wrapping_mul(157135).wrapping_add((plain.len() as u32) / 2) as u8;
        out.push(0 ^ nul_key);
        out
    }

    fn chunk_layout() -> Layout {
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

    fn one_chunk_bytes(name: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(&(body.len() as i32).to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn stre_obfuscation_round_trips() {
        let body = encode(0, "hello"); // chunk-local offset 0, matching the read below.
        let bytes = one_chunk_bytes(b"STRE", &body);
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = chunk_layout();
        let found = crate::chunk::find_chunk(&buffer, &layout, "STRE").unwrap().unwrap();
        let view = found.view();
        let decoded = read_obfuscated_cstr(&view, 0).unwrap();
        assert_eq!(decoded, "hello");
    }

    #[test]
    fn unsupported_atag_version_is_diagnosed() {
        let body = [7u8, 0, 0, 0, 0];
        let bytes = one_chunk_bytes(b"ATAG", &body);
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = chunk_layout();
        let found = crate::chunk::find_chunk(&buffer, &layout, "ATAG").unwrap().unwrap();
        let view = found.view();
        let mut out = Vec::new();
        let mut diagnostics = Diagnostics::new();
        dump_atag(&mut out, &view, &mut diagnostics).unwrap();
        assert!(!diagnostics.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("unsupported ATAG version 7"));
    }

    #[test]
    fn load_entries_are_reported_as_imported_module_lines() {
        let mut body = Vec::new();
        body.extend_from_slice(b"ZCOMMON\0");
        let bytes = one_chunk_bytes(b"LOAD", &body);
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = chunk_layout();
        let found = crate::chunk::find_chunk(&buffer, &layout, "LOAD").unwrap().unwrap();
        let view = found.view();
        let mut out = Vec::new();
        dump_load(&mut out, &view).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "   imported-module=ZCOMMON\n");
    }
}
