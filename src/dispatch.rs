//! L7: the dispatcher. Routes one of three user-facing operations -- show the
//! whole object, list chunks, or view a single named chunk -- to the L2-L6
//! machinery underneath (§4.7).

use std::io::Write;

use crate::buffer::Buffer;
use crate::chunk::{self, Tag};
use crate::decode;
use crate::diagnostics::Diagnostics;
use crate::directory;
use crate::disasm;
use crate::error::{Diagnostic, Error, Result};
use crate::extent::ExtentContext;
use crate::format::Layout;

fn write_header(out: &mut dyn Write, layout: &Layout) -> Result<()> {
    let suffix = if layout.indirect { " (indirect)" } else { "" };
    writeln!(out, "format: {}{}", layout.format.name(layout.indirect), suffix)?;
    Ok(())
}

fn dump_script_directory(
    out: &mut dyn Write,
    buffer: &Buffer,
    layout: &Layout,
    extent: &ExtentContext,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let Some(directory_offset) = layout.directory_offset else {
        return Ok(());
    };
    writeln!(out, "== script directory (offset={directory_offset:#x})")?;
    let entries = directory::read_script_directory(buffer, directory_offset)?;
    writeln!(out, "total-scripts={}", entries.len())?;
    for entry in &entries {
        writeln!(
            out,
            "   script {} (num_param={} offset={:#x})",
            entry.number, entry.num_param, entry.offset
        )?;
        if !buffer.offset_in_file(entry.offset) {
            diagnostics.push(Diagnostic::OutOfBoundsEntry {
                kind: "script",
                offset: entry.offset,
            });
            continue;
        }
        let offset = entry.offset as usize;
        let len = extent.code_size(buffer, entry.offset);
        disasm::disassemble(out, buffer, layout, offset, len)?;
    }

    if let Some(string_offset) = layout.string_offset {
        writeln!(out, "== string directory (offset={string_offset:#x})")?;
        let strings = directory::read_string_directory(buffer, string_offset)?;
        writeln!(out, "total-strings={}", strings.len())?;
        for (i, s) in strings.iter().enumerate() {
            writeln!(out, "   string {i}: {s}")?;
        }
    }
    Ok(())
}

/// Show-object (the default operation): every chunk with contents if the
/// format has chunks, then the script and string directories if present.
pub fn show_object(out: &mut dyn Write, buffer: &Buffer, layout: &Layout, diagnostics: &mut Diagnostics) -> Result<()> {
    write_header(out, layout)?;
    let extent = ExtentContext::build(buffer, layout)?;

    if layout.format.has_chunks() {
        chunk::walk(buffer, layout, |c| decode::dump_chunk(out, buffer, layout, &extent, diagnostics, &c))?;
    }
    if layout.has_script_directory() {
        dump_script_directory(out, buffer, layout, &extent, diagnostics)?;
    }
    Ok(())
}

/// List-chunks: one header line per chunk, no bodies. ACSE/ACSe only.
pub fn list_chunks(out: &mut dyn Write, buffer: &Buffer, layout: &Layout) -> Result<()> {
    if !layout.format.has_chunks() {
        return Err(Error::UnsupportedOperation("listing chunks requires an ACSE/ACSe object file"));
    }
    write_header(out, layout)?;
    chunk::walk(buffer, layout, |c| {
        writeln!(out, "{} (offset={:#x} size={})", c.name_str(), c.data_offset, c.size)?;
        Ok(())
    })
}

/// View-chunk: dumps every chunk whose name matches `name`, case-insensitive.
/// ACSE/ACSe only; reports "not found" if nothing matched.
pub fn view_chunk(out: &mut dyn Write, buffer: &Buffer, layout: &Layout, diagnostics: &mut Diagnostics, name: &str) -> Result<()> {
    if !layout.format.has_chunks() {
        return Err(Error::UnsupportedOperation("viewing a chunk requires an ACSE/ACSe object file"));
    }
    write_header(out, layout)?;
    let extent = ExtentContext::build(buffer, layout)?;
    let wanted = Tag::from_name(name);
    let matches_name = |c: &chunk::Chunk| {
        if wanted != Tag::Unknown {
            c.tag == wanted
        } else {
            c.name_str().eq_ignore_ascii_case(name)
        }
    };

    let mut found = false;
    chunk::walk(buffer, layout, |c| {
        if matches_name(&c) {
            found = true;
            decode::dump_chunk(out, buffer, layout, &extent, diagnostics, &c)?;
        }
        Ok(())
    })?;
    if !found {
        writeln!(out, "chunk '{name}' not found")?;
    }
    Ok(())
}
