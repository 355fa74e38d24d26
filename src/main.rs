//! lba2fix patches LBA2.EXE to fix the display pitch on Windows Vista and
//! later.
//!
//! ```sh
//! lba2fix LBA2.EXE LBA2NEW.EXE
//! ```
//!
//! # Options
//!
//! `-d LETTER` hardwires the CD-ROM drive letter instead of the game's
//! automatic detection (which does not always work); running again without
//! `-d` restores the detection code. `-v` turns on diagnostics.
//!
//! # Exit status
//!
//! Exit status is 0 for any completed transform, warnings included; the
//! patch is applied best-effort even to inputs that don't look right.
//! Nonzero only for argument or file errors.

use std::env;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::Ordering;

use lba2fix::check::Provenance;
use lba2fix::patch;

/// An `io::Error` annotated with the `Path` it concerns, if any.
#[derive(Debug)]
struct PathError {
    path: Option<PathBuf>,
    err: io::Error,
}

impl PathError {
    fn new<P: AsRef<Path>>(path: P, err: io::Error) -> Self {
        let path = path.as_ref().to_owned();
        Self { path: Some(path), err }
    }
}

impl std::error::Error for PathError {}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathError { path: None, err } => err.fmt(f),
            PathError { path: Some(path), err } => write!(f, "{}: {}", path.display(), err),
        }
    }
}

/// Reads the image from `input_path`, writes the patched image to
/// `output_path`, and returns the transform's report.
fn process<P, Q>(
    input_path: P,
    output_path: Q,
    options: &patch::Options,
) -> Result<patch::Report, PathError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = File::open(&input_path)
        .map_err(|err| PathError::new(&input_path, err))?;
    let mut input = io::BufReader::new(input);

    // Failing to create the output is most often a permissions problem on
    // the folder; say so rather than leaving just the OS error.
    let output = File::create(&output_path).map_err(|err| {
        let err = io::Error::new(
            err.kind(),
            format!("{} (check you have write permission on the folder)", err),
        );
        PathError::new(&output_path, err)
    })?;
    let mut output = io::BufWriter::new(output);

    // An I/O error mid-transform could belong to either file; leave it
    // unannotated rather than guess.
    let report = patch::apply(&mut input, &mut output, options)
        .map_err(|err| PathError { path: None, err })?;

    output.flush().map_err(|err| PathError::new(&output_path, err))?;
    Ok(report)
}

/// Prints a usage message to `w`.
fn print_usage<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    write!(w, "\
Usage: {} [OPTION]... INPUT.EXE OUTPUT.EXE
Patch LBA2.EXE to fix the display pitch on Windows Vista and later.
eg:    lba2fix LBA2.EXE LBA2NEW.EXE

  -d LETTER     force the CD-ROM drive letter (A-Z) instead of automatic
                detection; omit to restore the detection code
  -v            show diagnostics (repeat for debug output)
  -h, --help    show this help
",
        env::args().next().unwrap()
    )
}

#[derive(Debug)]
struct Args {
    verbosity: u32,
    drive: Option<u8>,
    input_path: PathBuf,
    output_path: PathBuf,
}

/// A drive letter is a single ASCII letter; lowercase folds to uppercase.
fn parse_drive(value: &std::ffi::OsStr) -> Option<u8> {
    let value = value.to_str()?.as_bytes();
    match value {
        [letter] if letter.is_ascii_alphabetic() => Some(letter.to_ascii_uppercase()),
        _ => None,
    }
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut verbosity = 0;
    let mut drive = None;
    let mut free: Vec<PathBuf> = Vec::new();
    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('v') => verbosity += 1,
            Short('d') => {
                let value = parser.value()?;
                drive = Some(parse_drive(&value).ok_or_else(|| {
                    lexopt::Error::Custom("switch -d has an invalid (or missing) drive letter".into())
                })?);
            }
            Short('h') | Long("help") => {
                print_usage(&mut io::stdout()).unwrap();
                process::exit(0);
            }
            Value(value) => free.push(PathBuf::from(value)),
            _ => return Err(arg.unexpected()),
        }
    }

    if free.len() < 2 {
        return Err(lexopt::Error::Custom("must supply both input and output files".into()));
    }
    if free.len() > 2 {
        return Err(lexopt::Error::Custom(
            "must supply no more than two files (input and output)".into(),
        ));
    }
    let output_path = free.pop().unwrap();
    let input_path = free.pop().unwrap();
    Ok(Args { verbosity, drive, input_path, output_path })
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {}", err);
            print_usage(&mut io::stderr()).unwrap();
            process::exit(1);
        }
    };

    // Reading and writing the same file produces an all-zeros output, so
    // refuse the obvious case. This won't catch different paths aliasing one
    // file.
    if args.input_path == args.output_path {
        eprintln!("error: input and output file cannot be the same");
        print_usage(&mut io::stderr()).unwrap();
        process::exit(1);
    }

    lba2fix::DEBUG.store(args.verbosity >= 2, Ordering::Relaxed);
    let verbose = args.verbosity > 0;
    let options = patch::Options { drive: args.drive };

    let report = match process(&args.input_path, &args.output_path, &options) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };

    if verbose {
        eprintln!("info: checkPE = {} e_lfanew = 0x{:08X}", report.check_pe, report.e_lfanew);
        if !report.looks_like_exe() {
            eprintln!("warning: input file does not look like a valid Windows executable");
        } else if !report.looks_like_target() {
            eprintln!("warning: input file does not look like LBA2");
        }
        if report.short_input {
            eprintln!("warning: input file was unexpectedly short");
        }
        eprintln!("info: checksum = {} (0x{:08X})", report.checksum, report.checksum);
    }

    // The drive letter is deliberately outside the checksum, so this
    // verdict is the same with or without -d.
    match report.provenance() {
        Provenance::Pristine if verbose => {
            eprintln!("info: patch applied successfully to original LBA2.EXE");
        }
        Provenance::PriorPatch if verbose => {
            eprintln!("info: patch applied successfully to FunnyFrog's patch of LBA2.EXE");
        }
        Provenance::Pristine | Provenance::PriorPatch => {
            eprintln!("info: patch applied successfully");
        }
        Provenance::Unknown => {
            eprintln!("warning: unexpected input file content, patch is unlikely to work");
        }
    }
}
