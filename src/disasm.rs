//! L6: the bytecode disassembler.
//!
//! Decodes a variable-width instruction stream across two encodings (wide and
//! `small_code` compact) into textual instructions (§4.6). Argument decoding is
//! a single `match` on [`ArgKind`] rather than a per-opcode chain, per the
//! "polymorphic bytecode encoding" design note.

use std::io::Write;

use crate::buffer::Buffer;
use crate::error::{ill_formed, Result};
use crate::format::Layout;
use crate::opcode::{self, ArgKind};

/// Disassembles `len` bytes starting at `base`, writing one line per
/// instruction (plus `CASEGOTOSORTED` sub-lines) to `out`. Stops without error
/// on an unrecognized opcode id -- no attempt to resynchronize the stream.
pub fn disassemble(out: &mut dyn Write, buffer: &Buffer, layout: &Layout, base: usize, len: usize) -> Result<()> {
    let end = base + len;
    let mut cursor = base;

    while cursor < end {
        let pc = cursor - base;
        let (opcode_id, opcode_width) = read_opcode(buffer, layout, cursor)?;
        let body = cursor + opcode_width;

        let Some(info) = opcode::lookup(opcode_id) else {
            writeln!(out, "{pc:08}> <invalid opcode {opcode_id}>")?;
            break;
        };

        let (args_text, arg_bytes, extra_lines) = decode_args(buffer, layout, body, base, info.args)?;
        cursor = body + arg_bytes;

        if args_text.is_empty() {
            writeln!(out, "{pc:08}> {}", info.mnemonic)?;
        } else {
            writeln!(out, "{pc:08}> {} {}", info.mnemonic, args_text)?;
        }
        for line in extra_lines {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn read_opcode(buffer: &Buffer, layout: &Layout, pos: usize) -> Result<(u32, usize)> {
    if layout.small_code {
        let b = buffer.read_u8(pos)?;
        if b < 240 {
            Ok((b as u32, 1))
        } else {
            let next = buffer.read_u8(pos + 1)?;
            Ok((b as u32 + next as u32, 2))
        }
    } else {
        Ok((buffer.read_u32(pos)?, 4))
    }
}

/// One scaled integer immediate: a byte in `small_code` mode, else 4 bytes.
fn read_scaled(buffer: &Buffer, layout: &Layout, pos: usize) -> Result<(i64, usize)> {
    if layout.small_code {
        Ok((buffer.read_u8(pos)? as i64, 1))
    } else {
        Ok((buffer.read_i32(pos)? as i64, 4))
    }
}

/// Decodes one instruction's arguments starting at `pos`, given the instruction
/// stream's `base` (needed for `CASEGOTOSORTED`'s base-relative alignment).
/// Returns the rendered argument text, the number of bytes consumed, and any
/// extra output lines (only non-empty for `CASEGOTOSORTED`).
fn decode_args(buffer: &Buffer, layout: &Layout, pos: usize, base: usize, kind: ArgKind) -> Result<(String, usize, Vec<String>)> {
    use ArgKind::*;
    match kind {
        None => Ok((String::new(), 0, Vec::new())),

        Fixed(n) => {
            let mut parts = Vec::with_capacity(n as usize);
            let mut off = pos;
            for _ in 0..n {
                parts.push(buffer.read_i32(off)?.to_string());
                off += 4;
            }
            Ok((parts.join(" "), off - pos, Vec::new()))
        }

        ScaledInt => {
            let (value, width) = read_scaled(buffer, layout, pos)?;
            Ok((value.to_string(), width, Vec::new()))
        }

        LspecDirect(n) => {
            let (id, id_width) = read_scaled(buffer, layout, pos)?;
            let mut parts = vec![id.to_string()];
            let mut off = pos + id_width;
            for _ in 0..n {
                parts.push(buffer.read_i32(off)?.to_string());
                off += 4;
            }
            Ok((parts.join(" "), off - pos, Vec::new()))
        }

        LspecDirectB(n) => {
            let mut parts = Vec::with_capacity(1 + n as usize);
            let mut off = pos;
            for _ in 0..1 + n {
                parts.push(buffer.read_u8(off)?.to_string());
                off += 1;
            }
            Ok((parts.join(" "), off - pos, Vec::new()))
        }

        OneByte => {
            let v = buffer.read_u8(pos)?;
            Ok((v.to_string(), 1, Vec::new()))
        }

        ByteRun(n) => {
            let mut parts = Vec::with_capacity(n as usize);
            let mut off = pos;
            for _ in 0..n {
                parts.push(buffer.read_u8(off)?.to_string());
                off += 1;
            }
            Ok((parts.join(" "), n as usize, Vec::new()))
        }

        PushBytes => {
            let count = buffer.read_u8(pos)?;
            let mut parts = Vec::with_capacity(count as usize);
            let mut off = pos + 1;
            for _ in 0..count {
                parts.push(buffer.read_u8(off)?.to_string());
                off += 1;
            }
            Ok((parts.join(" "), 1 + count as usize, Vec::new()))
        }

        CaseGotoSorted => {
            let rel = pos - base;
            let pad = (4 - rel % 4) % 4;
            let mut off = pos + pad;
            let count = buffer.read_i32(off)?;
            if count < 0 {
                return ill_formed("CASEGOTOSORTED declares a negative case count");
            }
            off += 4;
            let mut lines = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let case_pc = off - base;
                let value = buffer.read_i32(off)?;
                let target = buffer.read_i32(off + 4)?;
                lines.push(format!("{case_pc:08}>   case {value}: {target}"));
                off += 8;
            }
            Ok((String::new(), off - pos, lines))
        }

        CallFunc => {
            if layout.small_code {
                let num_args = buffer.read_u8(pos)?;
                let index = buffer.read_i16(pos + 1)?;
                Ok((format!("{num_args} {index}"), 3, Vec::new()))
            } else {
                let num_args = buffer.read_i32(pos)?;
                let index = buffer.read_i32(pos + 4)?;
                Ok((format!("{num_args} {index}"), 8, Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn wide_layout() -> Layout {
        Layout {
            format: Format::BigE,
            indirect: false,
            small_code: false,
            directory_offset: None,
            string_offset: None,
            chunk_offset: None,
            real_header_offset: None,
        }
    }

    fn small_layout() -> Layout {
        Layout {
            small_code: true,
            format: Format::LittleE,
            ..wide_layout()
        }
    }

    #[test]
    fn wide_nop_then_terminate() {
        // opcode 0 (nop), opcode 1 (terminate), each 4 bytes wide.
        let bytes = [0u8, 0, 0, 0, 1, 0, 0, 0];
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = wide_layout();
        let mut out = Vec::new();
        disassemble(&mut out, &buffer, &layout, 0, bytes.len()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "00000000> nop\n00000004> terminate\n");
    }

    #[test]
    fn small_code_opcode_byte_240_reads_a_second_byte() {
        // 239 is a one-byte opcode id (unnamed slot); 240 triggers the
        // two-byte fetch, landing on 240 + 0 = opcode 240.
        let bytes = [239u8, 240, 0];
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = small_layout();
        assert_eq!(read_opcode(&buffer, &layout, 0).unwrap(), (239, 1));
        assert_eq!(read_opcode(&buffer, &layout, 1).unwrap(), (240, 2));
    }

    #[test]
    fn casegotosorted_pads_to_segment_relative_alignment() {
        use ArgKind::CaseGotoSorted;
        // 3 bytes of padding before the count/cases region, which must land on
        // the next 4-byte boundary relative to the segment base.
        let mut bytes = vec![0xAAu8, 0, 0, 0];
        bytes.extend_from_slice(&1i32.to_le_bytes()); // count = 1, at offset 4
        bytes.extend_from_slice(&10i32.to_le_bytes()); // value, at offset 8
        bytes.extend_from_slice(&20i32.to_le_bytes()); // target, at offset 12
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = wide_layout();
        // pos=1 is 1 byte into the segment (base=0); needs 3 bytes of padding
        // to reach the next 4-byte boundary at byte 4.
        let (text, consumed, lines) = decode_args(&buffer, &layout, 1, 0, CaseGotoSorted).unwrap();
        assert!(text.is_empty());
        assert_eq!(consumed, 3 + 4 + 8);
        assert_eq!(lines, vec!["00000008>   case 10: 20".to_string()]);
    }

    #[test]
    fn invalid_opcode_ends_the_segment_without_erroring() {
        let bytes = (opcode::OPCODE_COUNT as u32).to_le_bytes();
        let buffer = Buffer::new(&bytes).unwrap();
        let layout = wide_layout();
        let mut out = Vec::new();
        disassemble(&mut out, &buffer, &layout, 0, bytes.len()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("invalid opcode"));
    }
}
