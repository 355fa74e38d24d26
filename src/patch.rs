//! The streaming transform: pulls the input one byte at a time, substitutes
//! rule bytes, appends the new section data, and accounts for everything in
//! the report.

use std::io::{self, prelude::*};

use crate::check::{self, Checksum, Validator};
use crate::payload;
use crate::rules;

/// Length of an unpatched LBA2.EXE.
pub const EXPECTED_LEN: u32 = 0x96800;

/// Raw size of the appended `.text2` data, matching its section header.
pub const BLOB_LEN: u32 = 0x200;

/// Length of every output this tool produces.
pub const OUTPUT_LEN: u32 = EXPECTED_LEN + BLOB_LEN;

/// Adds a prefix to the message of an `io::Error`.
fn annotate_io_error(err: io::Error, msg: &str) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {}", msg, err))
}

/// The option set handed in by the command-line layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Force this CD-ROM drive letter (uppercase ASCII) instead of the
    /// game's automatic detection; `None` writes the detection code back.
    pub drive: Option<u8>,
}

/// What the transform observed and produced. Advisory only: the output is
/// complete and full-length no matter what these say.
#[derive(Debug)]
pub struct Report {
    /// 0..=4 signature bytes matched; see [`check::Validator`].
    pub check_pe: u32,
    /// PE header offset assembled from the DOS header.
    pub e_lfanew: u32,
    /// Wrapping sum of the output bytes, drive toggle factored out.
    pub checksum: u32,
    /// Bytes written, always [`OUTPUT_LEN`].
    pub final_len: u32,
    /// The input ran out before [`EXPECTED_LEN`] and was zero-padded.
    pub short_input: bool,
}

impl Report {
    /// Whether the input had the MZ signature of a Windows executable.
    pub fn looks_like_exe(&self) -> bool {
        self.check_pe >= 2
    }

    /// Whether the input had every signature byte where LBA2.EXE has them.
    pub fn looks_like_target(&self) -> bool {
        self.check_pe == 4 && self.e_lfanew == check::PE_HEADER_OFFSET
    }

    /// Classifies the input from the output checksum.
    pub fn provenance(&self) -> check::Provenance {
        check::classify(self.check_pe, self.checksum)
    }
}

/// Applies the patch: copies `input` to `output` with the rule table applied,
/// then appends the `.text2` raw data.
///
/// Always writes exactly [`OUTPUT_LEN`] bytes provided the sink accepts them.
/// Malformed input never fails the transform; anomalies are downgraded to
/// advisory fields in the returned [`Report`]. Only I/O errors propagate.
///
/// Input consumption stops at [`EXPECTED_LEN`], so re-running the patcher
/// over its own output reproduces the same image (modulo the drive toggle);
/// the practical use is changing the drive letter of an already patched
/// executable. Inputs shorter than [`EXPECTED_LEN`] are zero-padded so the
/// appended section still lands at the raw data offset its header states.
pub fn apply<R, W>(input: &mut R, output: &mut W, options: &Options) -> io::Result<Report>
where
    R: Read,
    W: Write + ?Sized,
{
    debug!("{:?}", options);

    let mut validator = Validator::new();
    let mut checksum = Checksum::new();
    let mut offset: u32 = 0;

    let mut bytes = input.bytes();
    while offset < EXPECTED_LEN {
        let byte = match bytes.next() {
            Some(byte) => byte.map_err(|err| annotate_io_error(err, "reading input image"))?,
            None => break,
        };
        // The validator sees the original byte; everything downstream sees
        // the patched one.
        validator.observe(offset, byte);
        let byte = rules::resolve(offset, byte, options.drive);
        checksum.add(offset, byte);
        output
            .write_all(&[byte])
            .map_err(|err| annotate_io_error(err, "writing patched image"))?;
        offset += 1;
    }

    let short_input = offset < EXPECTED_LEN;
    if short_input {
        debug!("input ended at offset 0x{:X}, padding to 0x{:X}", offset, EXPECTED_LEN);
    }
    while offset < EXPECTED_LEN {
        // Padded zeros never went through the rule pass, so they count as
        // plain zeros; the drive-site override applies only to rule output.
        checksum.fold(0);
        output
            .write_all(&[0])
            .map_err(|err| annotate_io_error(err, "writing padding"))?;
        offset += 1;
    }

    // Append the .text2 raw data, zero-padded out to its stated raw size.
    for index in 0..BLOB_LEN {
        let byte = *payload::TEXT2_CODE.get(index as usize).unwrap_or(&0);
        checksum.fold(byte);
        output
            .write_all(&[byte])
            .map_err(|err| annotate_io_error(err, "writing appended section"))?;
    }

    let report = Report {
        check_pe: validator.check_pe(),
        e_lfanew: validator.e_lfanew(),
        checksum: checksum.value(),
        final_len: offset + BLOB_LEN,
        short_input,
    };
    debug!("{:?}", report);
    Ok(report)
}
