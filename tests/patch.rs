//! Tests of the transform through the library API, over synthetic images.

use lba2fix::check::Provenance;
use lba2fix::patch::{self, Options};
use lba2fix::payload;
use lba2fix::rules;

pub mod common;

use common::{apply_to, pristine_image};

const EXPECTED_LEN: usize = patch::EXPECTED_LEN as usize;
const OUTPUT_LEN: usize = patch::OUTPUT_LEN as usize;

// File offsets of the code patches: load addresses 0x45BB20 and 0x45BB63
// shifted back into the stored image.
const LOCK_SITE: usize = 0x5B720;
const UNLOCK_SITE: usize = 0x5B763;

#[test]
fn test_output_length_invariant() {
    // Expected length, truncated, empty, and already-patched inputs all
    // produce exactly OUTPUT_LEN bytes.
    for &len in &[EXPECTED_LEN, EXPECTED_LEN - 16, 0, OUTPUT_LEN] {
        let image = vec![0u8; len];
        let (output, report) = apply_to(&image, &Options::default());
        assert_eq!(output.len(), OUTPUT_LEN, "input length {}", len);
        assert_eq!(report.final_len, patch::OUTPUT_LEN);
        assert_eq!(report.short_input, len < EXPECTED_LEN);
    }
}

#[test]
fn test_short_input_padded_with_zeros() {
    let mut image = pristine_image();
    image.truncate(EXPECTED_LEN - 16);
    let (output, report) = apply_to(&image, &Options::default());
    assert!(report.short_input);
    assert_eq!(&output[EXPECTED_LEN - 16..EXPECTED_LEN], &[0u8; 16]);
    // The appended section still lands at its stated raw data offset.
    assert_eq!(&output[EXPECTED_LEN..EXPECTED_LEN + payload::TEXT2_CODE.len()],
        &payload::TEXT2_CODE[..]);
}

#[test]
fn test_header_fields_updated() {
    let (output, _) = apply_to(&pristine_image(), &Options::default());
    // NumberOfSections.
    assert_eq!(output[0x390E], 9);
    // SizeOfCode = 0x6F800.
    assert_eq!(&output[0x3924..0x3927], &[0x00, 0xF8, 0x06]);
    // SizeOfUninitializedData = 0x94C00.
    assert_eq!(&output[0x392C..0x392F], &[0x00, 0x4C, 0x09]);
    // SizeOfImage = 0x130000.
    assert_eq!(&output[0x3958..0x395B], &[0x00, 0x00, 0x13]);
}

#[test]
fn test_section_table_injected_verbatim() {
    // Whatever the input holds in the section-table slack, the output holds
    // the two new descriptors.
    for fill in &[0x00u8, 0xFF] {
        let mut image = pristine_image();
        for byte in &mut image[0x3B18..0x3B68] {
            *byte = *fill;
        }
        let (output, _) = apply_to(&image, &Options::default());
        assert_eq!(&output[0x3B18..0x3B68], &payload::SECTION_TABLE[..]);
    }
}

#[test]
fn test_code_sites_redirected() {
    let (output, _) = apply_to(&pristine_image(), &Options::default());
    assert_eq!(&output[LOCK_SITE..LOCK_SITE + 11], &payload::LOCK_PATCH[..]);
    assert_eq!(&output[UNLOCK_SITE..UNLOCK_SITE + 6], &payload::UNLOCK_PATCH[..]);
    // The relocatable data offset at 0x45BB2B is preserved, not patched.
    assert_eq!(output[LOCK_SITE + 11], pristine_image()[LOCK_SITE + 11]);
}

#[test]
fn test_blob_appended_and_padded() {
    let (output, _) = apply_to(&pristine_image(), &Options::default());
    let blob = &output[EXPECTED_LEN..];
    assert_eq!(&blob[..payload::TEXT2_CODE.len()], &payload::TEXT2_CODE[..]);
    assert!(blob[payload::TEXT2_CODE.len()..].iter().all(|&byte| byte == 0));
}

#[test]
fn test_drive_toggle() {
    let drive_site = rules::DRIVE_PATCH_OFFSET as usize;

    let (output, _) = apply_to(&pristine_image(), &Options { drive: Some(b'E') });
    assert_eq!(output[drive_site], 0xB0);
    assert_eq!(output[drive_site + 1], b'E');

    let (output, _) = apply_to(&pristine_image(), &Options { drive: None });
    assert_eq!(&output[drive_site..drive_site + 2], &rules::DRIVE_RESTORE[..]);
}

#[test]
fn test_drive_toggle_reversal_is_a_no_op() {
    // Patch with a drive letter, then patch that output without one: the
    // result is the same as never having used -d at all.
    let (with_drive, _) = apply_to(&pristine_image(), &Options { drive: Some(b'Q') });
    let (reverted, _) = apply_to(&with_drive, &Options { drive: None });
    let (plain, _) = apply_to(&pristine_image(), &Options { drive: None });
    assert_eq!(reverted, plain);
}

#[test]
fn test_checksum_is_independent_of_drive() {
    let (_, without) = apply_to(&pristine_image(), &Options { drive: None });
    for &letter in &[b'A', b'E', b'Z'] {
        let (_, with) = apply_to(&pristine_image(), &Options { drive: Some(letter) });
        assert_eq!(with.checksum, without.checksum);
    }
}

#[test]
fn test_truncated_input_checksum_is_plain_sum_of_output() {
    // Input ends long before the drive-override site. The padded zeros
    // written there never went through the rule pass, so they must count as
    // zeros, not as the restored drive bytes.
    let mut image = pristine_image();
    image.truncate(0x1000);
    let (output, report) = apply_to(&image, &Options::default());
    let sum = output.iter().fold(0u32, |sum, &byte| sum.wrapping_add(byte as u32));
    assert_eq!(report.checksum, sum);
}

#[test]
fn test_reapplication_is_idempotent() {
    let (first, _) = apply_to(&pristine_image(), &Options::default());
    assert_eq!(first.len(), OUTPUT_LEN);
    // The second run consumes only the first EXPECTED_LEN bytes and appends
    // a fresh (identical) blob.
    let (second, report) = apply_to(&first, &Options::default());
    assert_eq!(second, first);
    assert!(!report.short_input);
}

#[test]
fn test_validator_on_target_like_input() {
    let (_, report) = apply_to(&pristine_image(), &Options::default());
    assert_eq!(report.check_pe, 4);
    assert_eq!(report.e_lfanew, 0x3908);
    assert!(report.looks_like_exe());
    assert!(report.looks_like_target());
}

#[test]
fn test_validator_on_garbage_input() {
    let (_, report) = apply_to(&vec![0u8; EXPECTED_LEN], &Options::default());
    assert_eq!(report.check_pe, 0);
    assert_eq!(report.e_lfanew, 0);
    assert!(!report.looks_like_exe());
    assert!(!report.looks_like_target());
}

#[test]
fn test_synthetic_input_classified_unknown() {
    let (_, report) = apply_to(&pristine_image(), &Options::default());
    assert_eq!(report.provenance(), Provenance::Unknown);
}

// For an all-zero input every output byte comes from a rule, the padding, or
// the blob, so the checksum is computable straight from the constants.
#[test]
fn test_checksum_cross_check_on_zero_input() {
    let (_, report) = apply_to(&vec![0u8; EXPECTED_LEN], &Options { drive: Some(b'E') });

    let mut expected: u32 = 0;
    for rule in rules::RULES {
        if let rules::Source::Literal(bytes) = rule.source {
            expected += bytes.iter().map(|&byte| byte as u32).sum::<u32>();
        }
    }
    // The drive site always counts as its restored bytes.
    expected += rules::DRIVE_RESTORE[0] as u32 + rules::DRIVE_RESTORE[1] as u32;
    expected += payload::TEXT2_CODE.iter().map(|&byte| byte as u32).sum::<u32>();

    assert_eq!(report.checksum, expected);
}
