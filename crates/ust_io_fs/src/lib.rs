//! `ust_io_fs`:
//! Flag-driven copy, move, remove, grep and compare over the local filesystem.
//!
//! Modules:
//! - `conf`     : flag names and engine constants
//! - `spec`     : modes, path specifiers, signatures, options, errors
//! - `path`     : platform path normalization, path-likelihood
//! - `dispatch` : source resolution (literal, glob, collections)
//! - `copy`     : copy engine
//! - `remove`   : remove engine
//! - `moves`    : move engine
//! - `compare`  : file/directory comparison with a bounded cache
//! - `grep`     : regex search over a file or text
//! - `report`   : run-time report model
//! - `util`     : shared helper functions

pub mod compare;
pub mod conf;
pub mod copy;
pub mod dispatch;
pub mod grep;
pub mod moves;
pub mod path;
pub mod remove;
pub mod report;
pub mod spec;
mod util;

pub use compare::{CompareEngine, compare_directories, compare_files, signature};
pub use copy::{copy, copy_with_options};
pub use dispatch::dispatch;
pub use grep::{IntoPattern, grep};
pub use moves::{move_to, move_with_cache};
pub use remove::{remove, remove_with_dest};
pub use report::{ReportFs, ReportFsBuilder};
pub use spec::{
    CompareMode, EnumConflictPolicy, EnumFileKind, FileSignature, FsError, Mode, PathSpec,
    RemoveMode, Result, SpecCompareOptions, SpecCopyOptions, TransferMode,
};
