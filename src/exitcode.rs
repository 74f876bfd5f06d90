//! Process exit codes, numbered as in BSD `sysexits.h`

pub const OK: i32 = 0;

/// Bad command line flags or parameter values
pub const USAGE: i32 = 64;

/// Malformed graph or tree input
pub const DATAERR: i32 = 65;

/// Input file missing or unreadable
pub const NOINPUT: i32 = 66;

pub const SOFTWARE: i32 = 70;

pub const IOERR: i32 = 74;

/// Invalid settings file or environment
pub const CONFIG: i32 = 78;
