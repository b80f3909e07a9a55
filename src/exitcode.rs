//! Exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error, including missing feature names
pub const USAGE: i32 = 64;

/// Malformed tree dump or tree that fails validation
pub const DATAERR: i32 = 65;

/// Tree dump or feature list does not exist
pub const NOINPUT: i32 = 66;

/// Can't create output file
pub const CANTCREAT: i32 = 73;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
