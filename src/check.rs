//! Input validation and output verification.
//!
//! Neither check ever stops the transform; both only inform the report the
//! caller gets back. The tool is meant to stay usable against slightly
//! mutated inputs, so correctness signaling is purely advisory.

use crate::rules;

/// Where the PE header ("PE\0\0" signature onward) lives in LBA2.EXE.
pub const PE_HEADER_OFFSET: u32 = 0x3908;

/// Checksum of the patched output when the input was a pristine LBA2.EXE.
pub const CHECKSUM_PRISTINE: u32 = 0x0366_FC25;

/// Checksum of the patched output when the input already carried FunnyFrog's
/// patch, which this patcher overwrites.
pub const CHECKSUM_PRIOR_PATCH: u32 = 0x0367_0396;

/// Accumulates evidence that the input is the executable we expect, from
/// single bytes observed at fixed offsets as the stream goes by.
#[derive(Debug)]
pub struct Validator {
    check_pe: u32,
    e_lfanew: u32,
}

impl Validator {
    pub fn new() -> Self {
        Validator { check_pe: 0, e_lfanew: 0 }
    }

    /// Feeds one input byte. Call with the original byte, before any rule
    /// has touched it.
    pub fn observe(&mut self, offset: u32, byte: u8) {
        // Ideally we'd locate the PE signature through e_lfanew, but a fixed
        // offset suffices for the one image this tool is for.
        match (offset, byte) {
            (0, b'M') | (1, b'Z') => self.check_pe += 1,
            (PE_HEADER_OFFSET, b'P') => self.check_pe += 1,
            (o, b'E') if o == PE_HEADER_OFFSET + 1 => self.check_pe += 1,
            _ => {}
        }
        // e_lfanew assembles little-endian from the four bytes at 0x3C.
        if (0x3C..=0x3F).contains(&offset) {
            self.e_lfanew = (self.e_lfanew >> 8) | ((byte as u32) << 24);
        }
    }

    /// How many of the four signature bytes matched (MZ at 0, PE at
    /// [`PE_HEADER_OFFSET`]).
    pub fn check_pe(&self) -> u32 {
        self.check_pe
    }

    pub fn e_lfanew(&self) -> u32 {
        self.e_lfanew
    }
}

/// Running 32-bit wrapping sum over every byte emitted to the output.
///
/// Not a digest; just enough to recognize the two known-good inputs.
#[derive(Debug)]
pub struct Checksum(u32);

impl Checksum {
    pub fn new() -> Self {
        Checksum(0)
    }

    /// Folds in one emitted byte as-is.
    pub fn fold(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte as u32);
    }

    /// Folds in the byte emitted at `offset` by the rule pass. The two
    /// drive-override positions always contribute their restored values, so
    /// the sum comes out the same whichever way the toggle went. Bytes the
    /// rule pass never produced (padding, the appended section) go through
    /// [`Checksum::fold`] instead.
    pub fn add(&mut self, offset: u32, byte: u8) {
        let byte = if offset == rules::DRIVE_PATCH_OFFSET {
            rules::DRIVE_RESTORE[0]
        } else if offset == rules::DRIVE_PATCH_OFFSET + 1 {
            rules::DRIVE_RESTORE[1]
        } else {
            byte
        };
        self.fold(byte);
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// What the output checksum says the input was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// An unmodified LBA2.EXE.
    Pristine,
    /// LBA2.EXE with FunnyFrog's patch already applied.
    PriorPatch,
    /// Neither known-good value matched; the patch is unlikely to work.
    Unknown,
}

/// Classifies the finished transform from the validator count and the output
/// checksum.
pub fn classify(check_pe: u32, checksum: u32) -> Provenance {
    if check_pe != 4 {
        Provenance::Unknown
    } else if checksum == CHECKSUM_PRISTINE {
        Provenance::Pristine
    } else if checksum == CHECKSUM_PRIOR_PATCH {
        Provenance::PriorPatch
    } else {
        Provenance::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_recognizes_the_target() {
        let mut v = Validator::new();
        v.observe(0, b'M');
        v.observe(1, b'Z');
        v.observe(0x3C, 0x08);
        v.observe(0x3D, 0x39);
        v.observe(0x3E, 0x00);
        v.observe(0x3F, 0x00);
        v.observe(0x3908, b'P');
        v.observe(0x3909, b'E');
        assert_eq!(v.check_pe(), 4);
        assert_eq!(v.e_lfanew(), 0x3908);
    }

    #[test]
    fn test_validator_counts_matches_independently() {
        let mut v = Validator::new();
        v.observe(0, b'M');
        v.observe(1, b'X'); // not 'Z'
        v.observe(0x3908, b'P');
        v.observe(0x3909, b'E');
        assert_eq!(v.check_pe(), 3);
    }

    #[test]
    fn test_validator_ignores_signature_bytes_elsewhere() {
        let mut v = Validator::new();
        v.observe(2, b'M');
        v.observe(100, b'Z');
        v.observe(0x390A, b'P');
        assert_eq!(v.check_pe(), 0);
    }

    #[test]
    fn test_checksum_is_toggle_insensitive() {
        let mut applied = Checksum::new();
        applied.add(rules::DRIVE_PATCH_OFFSET, 0xB0);
        applied.add(rules::DRIVE_PATCH_OFFSET + 1, b'Q');
        let mut restored = Checksum::new();
        restored.add(rules::DRIVE_PATCH_OFFSET, 0x30);
        restored.add(rules::DRIVE_PATCH_OFFSET + 1, 0xC0);
        assert_eq!(applied.value(), restored.value());
        assert_eq!(applied.value(), 0x30 + 0xC0);
    }

    #[test]
    fn test_fold_is_position_blind() {
        // Only add() neutralizes the drive site; fold() takes bytes as-is.
        let mut sum = Checksum::new();
        sum.fold(0);
        sum.fold(0);
        assert_eq!(sum.value(), 0);
        sum.fold(0xB0);
        assert_eq!(sum.value(), 0xB0);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(4, CHECKSUM_PRISTINE), Provenance::Pristine);
        assert_eq!(classify(4, CHECKSUM_PRIOR_PATCH), Provenance::PriorPatch);
        assert_eq!(classify(4, 0xDEADBEEF), Provenance::Unknown);
        // A matching checksum is not believed without the signatures.
        assert_eq!(classify(3, CHECKSUM_PRISTINE), Provenance::Unknown);
    }
}
