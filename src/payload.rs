//! Binary payloads: the two appended section headers, the replacement code
//! that fills the new `.text2` section, and the short patch sequences that
//! redirect the game's code into it.
//!
//! Everything here is opaque configuration data to the rest of the crate.
//! The patcher copies these bytes into position; it never interprets or
//! executes them.

/// Two IMAGE_SECTION_HEADER records (40 bytes each), written into the unused
/// slack at the end of the existing section table.
///
/// `.bss2` reserves uninitialized storage for the pitch-correction shim: four
/// dwords of globals plus a 640×480 staging buffer, 0x4B010 bytes rounded up
/// to 0x4C000. `.text2` holds the shim code itself, one minimum-size 0x200
/// raw block which the loader rounds up to a 0x1000 page.
///
/// `.bss2` follows the last original section at RVA 0xE3000 and therefore
/// loads to 0x4E3000; adding its 0x4C000 reservation puts `.text2` at RVA
/// 0x12F000, loaded address 0x52F000.
pub const SECTION_TABLE: [u8; 80] = [
    b'.', b'b', b's', b's', b'2', 0, 0, 0, // Name
    0x00, 0x00, 0x00, 0x00,                // VirtualSize
    0x00, 0x30, 0x0e, 0x00,                // VirtualAddress (RVA 0xE3000)
    0x00, 0xC0, 0x04, 0x00,                // SizeOfRawData (0x4C000 reserved)
    0x00, 0x00, 0x00, 0x00,                // PointerToRawData (no file data)
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x80, 0x00, 0x00, 0xc0,                // Characteristics (uninitialized, rw)

    b'.', b't', b'e', b'x', b't', b'2', 0, 0, // Name
    0x00, 0x00, 0x00, 0x00,                   // VirtualSize
    0x00, 0xF0, 0x12, 0x00,                   // VirtualAddress (RVA 0x12F000)
    0x00, 0x02, 0x00, 0x00,                   // SizeOfRawData (0x200)
    0x00, 0x68, 0x09, 0x00,                   // PointerToRawData (0x96800)
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x20, 0x00, 0x00, 0x60,                   // Characteristics (code, rx)
];

/// The address `.text2` loads to: image base 0x400000 plus its RVA 0x12F000
/// from the section header above.
pub const TEXT2_VIRT_ADDR: u32 = 0x0052_F000;

/// Replacement for the two DirectDrawSurface call sites, assembled for the
/// `.text2` load address.
///
/// The first routine (entered at 0x52F000 from the patched `Lock` call site)
/// checks that the surface being locked is the 640×480 primary; if so it
/// substitutes the `.bss2` staging buffer for the `lpSurface` pointer the
/// game sees, stashing the real pointer and pitch in the `.bss2` globals. The
/// second routine (entered at 0x52F06D from the patched `Unlock` jump site)
/// copies the staged frame into the real surface one row at a time, advancing
/// the destination by the surface's own `lPitch`, then performs the original
/// `call dword ptr [edx+0x80]` and jumps back.
///
/// Position-independent where it has to be: the copy routine locates the
/// `.bss2` globals via a `call $+0`/`pop` pair, so the code survives the
/// loader relocating the image.
pub const TEXT2_CODE: [u8; 200] = [
    0x8B, 0x14, 0x24, 0x8B, 0x0A, 0x81, 0xC1, 0x00, 0xC3, 0x06, 0x00, 0x8B, 0x5D, 0x88, 0x81, 0xE3,
    0x0E, 0x00, 0x00, 0x00, 0x81, 0xFB, 0x0E, 0x00, 0x00, 0x00, 0x75, 0x35, 0x8B, 0x5D, 0x8C, 0x81,
    0xFB, 0xE0, 0x01, 0x00, 0x00, 0x75, 0x2A, 0x89, 0x19, 0x8B, 0x5D, 0x90, 0x81, 0xFB, 0x80, 0x02,
    0x00, 0x00, 0x75, 0x1D, 0x89, 0x59, 0x04, 0x8B, 0x5D, 0x94, 0x89, 0x59, 0x08, 0x8B, 0x5D, 0xA8,
    0x89, 0x59, 0x0C, 0x81, 0xC1, 0x10, 0x00, 0x00, 0x00, 0x89, 0x4D, 0xA8, 0xE9, 0x10, 0x00, 0x00,
    0x00, 0xBB, 0x00, 0x00, 0x00, 0x00, 0x89, 0x19, 0x89, 0x59, 0x04, 0x89, 0x59, 0x08, 0x89, 0x59,
    0x0C, 0x8B, 0x0A, 0x8B, 0x45, 0xA8, 0x89, 0x01, 0x83, 0x04, 0x24, 0x0A, 0xC3, 0x9C, 0x53, 0x51,
    0x52, 0x56, 0x57, 0xE8, 0x00, 0x00, 0x00, 0x00, 0x5A, 0x81, 0xC2, 0x88, 0x3F, 0xFB, 0xFF, 0x81,
    0x3A, 0xE0, 0x01, 0x00, 0x00, 0x75, 0x30, 0x81, 0x7A, 0x04, 0x80, 0x02, 0x00, 0x00, 0x75, 0x27,
    0xFC, 0x89, 0xD6, 0x81, 0xC6, 0x10, 0x00, 0x00, 0x00, 0x8B, 0x7A, 0x0C, 0x81, 0xFF, 0x00, 0x00,
    0x00, 0x00, 0x74, 0x13, 0x8B, 0x1A, 0x8B, 0x4A, 0x04, 0xC1, 0xE9, 0x02, 0xF3, 0xA5, 0x03, 0x7A,
    0x08, 0x2B, 0x7A, 0x04, 0x4B, 0x75, 0xEF, 0x5F, 0x5E, 0x5A, 0x59, 0x5B, 0x9D, 0xFF, 0x92, 0x80,
    0x00, 0x00, 0x00, 0xE9, 0xA1, 0xCA, 0xF2, 0xFF,
];

/// Overwrites the function that calls DirectDrawSurface::Lock, at load
/// addresses 0x45BB20..0x45BB2B.
///
/// ```nasm,ignore
/// inc dword [0x4D11C8]    ; same relocatable data offset as the original code
/// call 0x52F000           ; rel32 = 0x52F000 - 0x45BB26 - 5 = 0xD34D5
/// ```
///
/// The call does not return to the following instruction; the shim adjusts
/// the return address to skip forward to 0x45BB35, which keeps the
/// relocatable data offset at 0x45BB2B live. The rel32 must be recomputed if
/// `.text2` ever moves.
pub const LOCK_PATCH: [u8; 11] = [
    0xFF, 0x05, 0xC8, 0x11, 0x4D, 0x00, // incl 0x4D11C8
    0xE8, 0xD5, 0x34, 0x0D, 0x00,       // call 0x52F000
];

/// Overwrites the function that calls DirectDrawSurface::Unlock, at load
/// addresses 0x45BB63..0x45BB69.
///
/// ```nasm,ignore
/// jmp 0x52F06D            ; rel32 = 0x52F06D - 0x45BB63 - 5 = 0xD3505
/// nop
/// ```
///
/// Replaces the 6-byte `call dword ptr [edx+0x80]`, which the shim performs
/// itself before jumping back. The jump is one byte shorter than the original
/// instruction, hence the nop to keep any disassembly in sync.
pub const UNLOCK_PATCH: [u8; 6] = [
    0xE9, 0x05, 0x35, 0x0D, 0x00, // jmp 0x52F06D
    0x90,                         // nop
];
