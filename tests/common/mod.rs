use std::io;

use lba2fix::patch;

/// A synthetic stand-in for LBA2.EXE: the right length, the signature bytes
/// and e_lfanew where the validator looks for them, deterministic junk
/// everywhere else. The checksum of its patched output matches neither
/// known-good literal, which the tests rely on.
pub fn pristine_image() -> Vec<u8> {
    let mut image: Vec<u8> = (0..patch::EXPECTED_LEN).map(|i| (i % 251) as u8).collect();
    image[0] = b'M';
    image[1] = b'Z';
    image[0x3C..0x40].copy_from_slice(&0x3908u32.to_le_bytes());
    image[0x3908] = b'P';
    image[0x3909] = b'E';
    image
}

/// Runs the transform over an in-memory image.
pub fn apply_to(image: &[u8], options: &patch::Options) -> (Vec<u8>, patch::Report) {
    let mut output = Vec::new();
    let report = patch::apply(&mut io::Cursor::new(image), &mut output, options).unwrap();
    (output, report)
}
