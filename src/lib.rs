//! An object-file inspector and bytecode disassembler for Action Code Script
//! (ACS) object files: the bytecode format produced by compilers in the Doom
//! engine ecosystem.
//!
//! The crate is a strictly layered, read-only pipeline over an in-memory byte
//! buffer (see each module's docs for its layer): format discrimination
//! ([`format`]), chunk enumeration ([`chunk`], [`decode`]), code-extent
//! inference ([`extent`]), and bytecode disassembly ([`disasm`]). [`dispatch`]
//! wires these together behind the three operations the CLI exposes.

pub mod buffer;
pub mod chunk;
pub mod decode;
pub mod diagnostics;
pub mod directory;
pub mod disasm;
pub mod dispatch;
pub mod error;
pub mod extent;
pub mod format;
pub mod opcode;
pub mod scripttab;

use std::io::Write;

use buffer::Buffer;
use diagnostics::Diagnostics;
use error::Result;
use format::Layout;

/// A resolved object file, ready for any of the three dispatcher operations.
/// Borrows the underlying bytes; never copies them.
pub struct ObjectFile<'a> {
    buffer: Buffer<'a>,
    layout: Layout,
}

impl<'a> ObjectFile<'a> {
    /// Runs the format resolver (L2) over `bytes`, yielding a handle good for
    /// any number of dump operations.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let buffer = Buffer::new(bytes)?;
        let layout = format::resolve(&buffer)?;
        Ok(Self { buffer, layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Full dump: every chunk with contents, then the script and string
    /// directories if present. Diagnostics raised along the way are collected
    /// into `diagnostics` rather than aborting the dump.
    pub fn show_object(&self, out: &mut dyn Write, diagnostics: &mut Diagnostics) -> Result<()> {
        dispatch::show_object(out, &self.buffer, &self.layout, diagnostics)
    }

    /// One header line per chunk. Fails with [`error::Error::UnsupportedOperation`]
    /// on an ACS0 file, which has no chunk region.
    pub fn list_chunks(&self, out: &mut dyn Write) -> Result<()> {
        dispatch::list_chunks(out, &self.buffer, &self.layout)
    }

    /// Dumps every chunk whose name matches `name`, case-insensitive. Fails with
    /// [`error::Error::UnsupportedOperation`] on an ACS0 file.
    pub fn view_chunk(&self, out: &mut dyn Write, diagnostics: &mut Diagnostics, name: &str) -> Result<()> {
        dispatch::view_chunk(out, &self.buffer, &self.layout, diagnostics, name)
    }
}
