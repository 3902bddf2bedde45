//! End-to-end scenarios against the public `ObjectFile` API (§8.3-§8.4): boundary
//! cases the format resolver and dispatcher must handle without panicking, plus
//! a full round trip through a file written to disk.

use std::io::Write as _;

use acsdump::diagnostics::Diagnostics;
use acsdump::error::Error;
use acsdump::ObjectFile;

#[test]
fn zero_byte_file_fails_ill_formed_not_a_panic() {
    let bytes: &[u8] = &[];
    let err = ObjectFile::open(bytes).unwrap_err();
    assert!(matches!(err, Error::IllFormed(_)));
}

#[test]
fn eight_byte_file_pointing_past_eof_fails_ill_formed() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ACSE");
    bytes.extend_from_slice(&8i32.to_le_bytes()); // offset == N, out of range
    let err = ObjectFile::open(&bytes).unwrap_err();
    assert!(matches!(err, Error::IllFormed(_)));
}

#[test]
fn empty_acse_chunk_region_produces_only_the_header_line() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ACSE");
    bytes.extend_from_slice(&8i32.to_le_bytes());
    // One trailing byte so chunk_offset (8) is in-file but fewer than 8 bytes
    // remain -- the walker must stop immediately.
    bytes.push(0);

    let object = ObjectFile::open(&bytes).unwrap();
    let mut out = Vec::new();
    let mut diagnostics = Diagnostics::new();
    object.show_object(&mut out, &mut diagnostics).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "format: ACSE\n");
    assert!(diagnostics.is_empty());
}

#[test]
fn acs0_rejects_list_and_view_chunk_operations() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ACS\0");
    bytes.extend_from_slice(&8i32.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes()); // total_scripts = 0
    bytes.push(0); // pad so string_offset (12) is in-file

    let object = ObjectFile::open(&bytes).unwrap();
    let mut out = Vec::new();
    assert!(matches!(object.list_chunks(&mut out), Err(Error::UnsupportedOperation(_))));
    let mut diagnostics = Diagnostics::new();
    assert!(matches!(
        object.view_chunk(&mut out, &mut diagnostics, "SPTR"),
        Err(Error::UnsupportedOperation(_))
    ));
}

#[test]
fn round_trips_through_a_file_on_disk() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ACSE");
    bytes.extend_from_slice(&8i32.to_le_bytes());
    bytes.extend_from_slice(b"ARAY");
    bytes.extend_from_slice(&0i32.to_le_bytes());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();

    let read_back = std::fs::read(file.path()).unwrap();
    let object = ObjectFile::open(&read_back).unwrap();
    let mut out = Vec::new();
    let mut diagnostics = Diagnostics::new();
    object.show_object(&mut out, &mut diagnostics).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("format: ACSE\n"));
    assert!(text.contains("-- ARAY (offset=0x10 size=0)"));
}

#[test]
fn view_chunk_reports_not_found() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ACSE");
    bytes.extend_from_slice(&8i32.to_le_bytes());
    bytes.extend_from_slice(b"ARAY");
    bytes.extend_from_slice(&0i32.to_le_bytes());

    let object = ObjectFile::open(&bytes).unwrap();
    let mut out = Vec::new();
    let mut diagnostics = Diagnostics::new();
    object.view_chunk(&mut out, &mut diagnostics, "SPTR").unwrap();
    assert!(String::from_utf8(out).unwrap().contains("chunk 'SPTR' not found"));
}
