//! The patch rule table: which byte positions of the image are rewritten,
//! and with what.
//!
//! Rules are keyed by position, never by the byte value found there. Each
//! rule covers a contiguous range in one of two coordinate spaces: raw file
//! offsets for the header edits, or loaded code addresses for the patches
//! inside `.text` (so the table reads directly against a disassembly
//! listing). The two spaces are related by a fixed affine shift; see
//! [`code_address`].

use crate::payload;

/// File offset of the start of the `.text` section.
pub const TEXT_FILE_OFFSET: u32 = 0x3C00;

/// Address `.text` loads to: image base 0x400000 plus its RVA 0x4000.
pub const TEXT_VIRT_ADDR: u32 = 0x0040_4000;

/// File offset of the two-byte CD-ROM drive override site.
pub const DRIVE_PATCH_OFFSET: u32 = 0x578F1;

/// The bytes originally at the drive override site (`xor al, al`), written
/// back when no drive letter is requested so that re-running the patcher can
/// undo an earlier override.
pub const DRIVE_RESTORE: [u8; 2] = [0x30, 0xC0];

/// `mov al, imm8`; the immediate is the drive letter.
const DRIVE_MOV_AL: u8 = 0xB0;

/// Converts a file offset to the address the loader maps that byte to.
/// Only meaningful for offsets inside `.text`, which is the only place the
/// code-space rules point.
pub fn code_address(offset: u32) -> u32 {
    offset.wrapping_add(TEXT_VIRT_ADDR).wrapping_sub(TEXT_FILE_OFFSET)
}

/// Inverse of [`code_address`].
pub fn file_offset(address: u32) -> u32 {
    address.wrapping_add(TEXT_FILE_OFFSET).wrapping_sub(TEXT_VIRT_ADDR)
}

/// The coordinate space a rule's range is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Raw offset within the stored image.
    File,
    /// Loaded address, directly comparable with a disassembly.
    Code,
}

/// Where a rule's replacement bytes come from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Fixed bytes, substituted index-for-index across the range.
    Literal(&'static [u8]),
    /// The two-byte drive override: `mov al, <letter>` when a drive is
    /// requested, [`DRIVE_RESTORE`] when not.
    Drive,
}

impl Source {
    fn len(&self) -> u32 {
        match self {
            Source::Literal(bytes) => bytes.len() as u32,
            Source::Drive => 2,
        }
    }

    fn emit(&self, index: u32, drive: Option<u8>) -> u8 {
        match (self, index) {
            (Source::Literal(bytes), _) => bytes[index as usize],
            (Source::Drive, 0) => match drive {
                Some(_) => DRIVE_MOV_AL,
                None => DRIVE_RESTORE[0],
            },
            (Source::Drive, _) => match drive {
                Some(letter) => letter,
                None => DRIVE_RESTORE[1],
            },
        }
    }
}

/// One position-keyed override: `source.len()` bytes starting at `start` in
/// `space`.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub space: Space,
    pub start: u32,
    pub source: Source,
}

impl Rule {
    /// The rule's range expressed as file offsets.
    pub fn file_range(&self) -> (u32, u32) {
        let start = match self.space {
            Space::File => self.start,
            Space::Code => file_offset(self.start),
        };
        (start, start + self.source.len())
    }
}

/// Every edit the patcher makes to the main image, in priority order
/// (the ranges don't overlap, so order only matters on paper).
///
/// The header edits account for the two appended sections: `.text2` adds
/// 0x200 to the size of code, `.bss2` adds 0x4C000 to the size of
/// uninitialized data, and the image grows by 0x4C000 + 0x1000 (`.text2`'s
/// raw block rounds up to a page).
pub const RULES: &[Rule] = &[
    // NumberOfSections, 7 -> 9.
    Rule { space: Space::File, start: 0x390E, source: Source::Literal(&[9]) },
    // SizeOfCode, 0x6F600 -> 0x6F800.
    Rule { space: Space::File, start: 0x3924, source: Source::Literal(&[0x00, 0xF8, 0x06]) },
    // SizeOfUninitializedData, 0x48C00 -> 0x94C00.
    Rule { space: Space::File, start: 0x392C, source: Source::Literal(&[0x00, 0x4C, 0x09]) },
    // SizeOfImage, 0xE3000 -> 0x130000.
    Rule { space: Space::File, start: 0x3958, source: Source::Literal(&[0x00, 0x00, 0x13]) },
    // The two new section headers, written into slack after the original
    // seven entries.
    Rule { space: Space::File, start: 0x3B18, source: Source::Literal(&payload::SECTION_TABLE) },
    // Optional CD-ROM drive override (the automatic detection it replaces
    // does not always work).
    Rule { space: Space::File, start: DRIVE_PATCH_OFFSET, source: Source::Drive },
    // Redirect the DirectDrawSurface::Lock call site into .text2.
    Rule { space: Space::Code, start: 0x0045_BB20, source: Source::Literal(&payload::LOCK_PATCH) },
    // Redirect the DirectDrawSurface::Unlock call site into .text2.
    Rule { space: Space::Code, start: 0x0045_BB63, source: Source::Literal(&payload::UNLOCK_PATCH) },
];

/// Returns the byte to emit at `offset`: the replacement from the first rule
/// whose range covers the position, or `byte` unchanged when none does.
pub fn resolve(offset: u32, byte: u8, drive: Option<u8>) -> u8 {
    let address = code_address(offset);
    for rule in RULES {
        let pos = match rule.space {
            Space::File => offset,
            Space::Code => address,
        };
        if pos >= rule.start && pos - rule.start < rule.source.len() {
            return rule.source.emit(pos - rule.start, drive);
        }
    }
    byte
}
