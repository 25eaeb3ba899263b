//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, bad `--set`, bad delimiter)   |
//! | 3    | I/O error (missing file, unwritable output)          |
//! | 4    | Input could not be parsed as a table                 |
//! | 5    | One or more edits were rejected                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed options.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or written.
pub const EXIT_IO: u8 = 3;

/// File was read but is not a usable table (bad CSV, bad workbook, no
/// data, unknown sheet, unsupported extension).
pub const EXIT_PARSE: u8 = 4;

/// At least one edit addressed a missing column or row. The remaining
/// edits were still applied.
pub const EXIT_EDIT_REJECTED: u8 = 5;
