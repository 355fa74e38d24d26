//! Patches LBA2.EXE so its graphics display correctly on Windows Vista and
//! later, where the DirectDraw surface pitch no longer matches the game's
//! assumed 640-pixel width.
//!
//! Rather than forcing the pitch through a game global (the approach of
//! FunnyFrog's earlier patch, which has side effects on sound volume, car
//! steering, and mob paths), the patched code copies display data through a
//! staging buffer on Unlock, applying the pitch correction there, so the
//! game keeps its original 640 pitch throughout. The machinery for that is
//! two new PE sections: `.bss2` for the buffer and `.text2` for the shim
//! code, plus a handful of byte edits to the headers and the two
//! DirectDrawSurface call sites.
//!
//! The transform itself is a single forward pass: [`patch::apply`] reads the
//! image one byte at a time, substitutes bytes per the rule table in
//! [`rules`], appends the `.text2` data from [`payload`], and reports what it
//! saw via [`check`]. It is deliberately best-effort: validation never stops
//! the transform, and the output always comes out at its full fixed length.
//!
//! Valid only for the one known LBA2.EXE layout (0x96800 bytes); this is not
//! a general PE rewriter.

#[macro_use]
mod debug;
pub use crate::debug::DEBUG;

pub mod check;
pub mod patch;
pub mod payload;
pub mod rules;
