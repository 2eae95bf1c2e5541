//! Mode flags, path specifiers, signatures, options and top-level errors.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use filetime::FileTime;
use thiserror::Error;

use crate::conf::{
    C_MODE_NAME_NOSET, C_MODE_NAME_REPLACE, N_BUFFER_SIZE_COMPARE, N_COMPARE_CACHE_ENTRIES_MAX,
    TUP_GLOB_WILDCARDS, TUP_MODE_FLAG_NAMES,
};

/// Crate-wide result alias.
pub type Result<T, E = FsError> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////
// #region ModeFlags

/// Behavior flags shared by every operation.
///
/// The three families occupy disjoint bit ranges: transfer (`1..=16`),
/// remove (`32..=128`) and compare (`256..=4096`). Bits outside every family
/// are kept so that they can be reported as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mode {
    bits: u32,
}

impl Mode {
    /// `-f`: replace an existing destination.
    pub const FORCE: Self = Self::from_bits(1);
    /// `-i`: keep an existing destination untouched.
    pub const IGNORE: Self = Self::from_bits(1 << 1);
    /// `-r`: merge directories entry by entry, recursive globs.
    pub const RECURSIVE: Self = Self::from_bits(1 << 2);
    /// `-u`: replace only when the source is strictly newer.
    pub const UPDATE: Self = Self::from_bits(1 << 3);
    /// `-t`: the source must be an explicit collection of paths.
    pub const TARGET_DIRECTORY: Self = Self::from_bits(1 << 4);
    /// Remove directories.
    pub const RM_DIR: Self = Self::from_bits(1 << 5);
    /// Remove files.
    pub const RM_FILE: Self = Self::from_bits(1 << 6);
    /// `-d`: remove empty directories only.
    pub const RM_EMPTY: Self = Self::from_bits(1 << 7);
    /// Decide equality from signatures alone.
    pub const SHALLOW: Self = Self::from_bits(1 << 8);
    /// Compare raw bytes.
    pub const BINARY: Self = Self::from_bits(1 << 9);
    /// Compare line by line.
    pub const TEXT: Self = Self::from_bits(1 << 10);
    /// Skip line pairs that are both blank.
    pub const IGNORE_BLANK_LINES: Self = Self::from_bits(1 << 11);
    /// Compare lines case-insensitively.
    pub const IGNORE_CASE: Self = Self::from_bits(1 << 12);

    const KNOWN_MASK: u32 = (1 << 13) - 1;

    /// Flag set from raw `bits`, unknown bits included.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    pub const fn bits(self) -> u32 {
        self.bits
    }

    /// Every flag known to this crate.
    pub const fn all() -> Self {
        Self::from_bits(Self::KNOWN_MASK)
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// All flags of `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// At least one flag of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.bits & other.bits != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.bits | other.bits)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self::from_bits(self.bits & other.bits)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self::from_bits(self.bits & !other.bits)
    }
}

impl BitOr for Mode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Mode {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitAnd for Mode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl From<u32> for Mode {
    fn from(bits: u32) -> Self {
        Self::from_bits(bits)
    }
}

impl Mode {
    /// No flag set.
    pub const NOSET: Self = Self::from_bits(0);
    /// Alias of [`Mode::FORCE`].
    pub const REPLACE: Self = Self::FORCE;

    /// Flags accepted by copy and move.
    pub const FAMILY_TRANSFER: Self = Self::FORCE
        .union(Self::IGNORE)
        .union(Self::RECURSIVE)
        .union(Self::UPDATE)
        .union(Self::TARGET_DIRECTORY);
    /// Flags accepted by remove. `RECURSIVE` only affects glob expansion.
    pub const FAMILY_REMOVE: Self = Self::RM_DIR
        .union(Self::RM_FILE)
        .union(Self::RM_EMPTY)
        .union(Self::RECURSIVE);
    /// Flags accepted by compare.
    pub const FAMILY_COMPARE: Self = Self::SHALLOW
        .union(Self::BINARY)
        .union(Self::TEXT)
        .union(Self::IGNORE_BLANK_LINES)
        .union(Self::IGNORE_CASE);

    /// Every bit (known or not) outside `family`, usable as a dispatcher mask.
    pub const fn outside(family: Self) -> Self {
        Self::from_bits(!family.bits())
    }

    /// Render as `F_FORCE|F_RECURSIVE`, or `F_NOSET` for an empty mode.
    pub fn describe(self) -> String {
        if self.bits() == 0 {
            return C_MODE_NAME_NOSET.to_string();
        }
        let mut l_names: Vec<String> = TUP_MODE_FLAG_NAMES
            .iter()
            .filter(|(n_bit, _)| self.bits() & n_bit != 0)
            .map(|(_, c_name)| (*c_name).to_string())
            .collect();
        let n_bits_unknown = self.bits() & !Self::all().bits();
        if n_bits_unknown != 0 {
            l_names.push(format!("{n_bits_unknown:#x}"));
        }
        l_names.join("|")
    }

    /// Fail with [`FsError::UnsupportedMode`] when any bit lies outside `legal`.
    pub fn ensure_within(self, legal: Self) -> Result<()> {
        let mode_illegal = self.difference(legal);
        if mode_illegal.bits() == 0 {
            return Ok(());
        }
        Err(FsError::unsupported_mode(mode_illegal))
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::NOSET
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl FromStr for Mode {
    type Err = FsError;

    /// Parse a `|`-separated list of flag names or integers.
    fn from_str(value: &str) -> Result<Self> {
        let mut mode = Self::NOSET;
        for c_part in value.split('|').map(str::trim).filter(|s| !s.is_empty()) {
            if c_part == C_MODE_NAME_NOSET {
                continue;
            }
            if c_part == C_MODE_NAME_REPLACE {
                mode |= Self::REPLACE;
                continue;
            }
            if let Ok(n_bits) = c_part.parse::<u32>() {
                mode |= Self::from_bits(n_bits);
                continue;
            }
            let Some((n_bit, _)) = TUP_MODE_FLAG_NAMES
                .iter()
                .find(|(_, c_name)| *c_name == c_part)
            else {
                return Err(FsError::ParameterError(format!(
                    "Unknown mode flag: `{c_part}`"
                )));
            };
            mode |= Self::from_bits(*n_bit);
        }
        Ok(mode)
    }
}

/// Resolution policy when a destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumConflictPolicy {
    /// Delete the destination, then copy.
    Replace,
    /// Copy only when the source is strictly newer.
    Update,
    /// Leave the destination untouched.
    Ignore,
}

/// Copy/move flags, validated against [`Mode::FAMILY_TRANSFER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferMode(Mode);

impl TryFrom<Mode> for TransferMode {
    type Error = FsError;

    fn try_from(mode: Mode) -> Result<Self> {
        mode.ensure_within(Mode::FAMILY_TRANSFER)?;
        Ok(Self(mode))
    }
}

impl TransferMode {
    /// Underlying flag set.
    pub fn mode(self) -> Mode {
        self.0
    }

    /// Conflict policy; `FORCE` wins over `UPDATE`, which wins over `IGNORE`.
    /// With none of them set an existing destination is overwritten.
    pub fn rule_conflict(self) -> EnumConflictPolicy {
        if self.0.contains(Mode::FORCE) {
            EnumConflictPolicy::Replace
        } else if self.0.contains(Mode::UPDATE) {
            EnumConflictPolicy::Update
        } else if self.0.contains(Mode::IGNORE) {
            EnumConflictPolicy::Ignore
        } else {
            EnumConflictPolicy::Replace
        }
    }

    /// Whether `FORCE` is set.
    pub fn if_force(self) -> bool {
        self.0.contains(Mode::FORCE)
    }

    /// Whether `RECURSIVE` is set.
    pub fn if_recursive(self) -> bool {
        self.0.contains(Mode::RECURSIVE)
    }

    /// Whether `TARGET_DIRECTORY` is set.
    pub fn if_target_directory(self) -> bool {
        self.0.contains(Mode::TARGET_DIRECTORY)
    }
}

/// Remove flags, validated against [`Mode::FAMILY_REMOVE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveMode(Mode);

impl TryFrom<Mode> for RemoveMode {
    type Error = FsError;

    fn try_from(mode: Mode) -> Result<Self> {
        mode.ensure_within(Mode::FAMILY_REMOVE)?;
        Ok(Self(mode))
    }
}

impl RemoveMode {
    /// Underlying flag set.
    pub fn mode(self) -> Mode {
        self.0
    }

    /// `RM_EMPTY` overrides every other selection flag.
    pub fn if_empty_only(self) -> bool {
        self.0.contains(Mode::RM_EMPTY)
    }

    fn if_selection_unset(self) -> bool {
        !self.0.intersects(Mode::RM_DIR | Mode::RM_FILE)
    }

    /// Whether directories are removed recursively.
    pub fn if_remove_dirs(self) -> bool {
        !self.if_empty_only() && (self.0.contains(Mode::RM_DIR) || self.if_selection_unset())
    }

    /// Whether regular files are removed.
    pub fn if_remove_files(self) -> bool {
        !self.if_empty_only() && (self.0.contains(Mode::RM_FILE) || self.if_selection_unset())
    }
}

/// Compare flags, validated against [`Mode::FAMILY_COMPARE`] and the
/// `SHALLOW+TEXT` / `BINARY+TEXT` exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareMode(Mode);

impl TryFrom<Mode> for CompareMode {
    type Error = FsError;

    fn try_from(mode: Mode) -> Result<Self> {
        mode.ensure_within(Mode::FAMILY_COMPARE)?;
        for mode_pair in [Mode::SHALLOW | Mode::TEXT, Mode::BINARY | Mode::TEXT] {
            if mode.contains(mode_pair) {
                return Err(FsError::unsupported_mode(mode_pair));
            }
        }
        Ok(Self(mode))
    }
}

impl CompareMode {
    /// Underlying flag set.
    pub fn mode(self) -> Mode {
        self.0
    }

    /// Whether `SHALLOW` is set.
    pub fn if_shallow(self) -> bool {
        self.0.contains(Mode::SHALLOW)
    }

    /// Whether `BINARY` is set.
    pub fn if_binary(self) -> bool {
        self.0.contains(Mode::BINARY)
    }

    /// Whether `TEXT` is set.
    pub fn if_text(self) -> bool {
        self.0.contains(Mode::TEXT)
    }

    /// Whether `IGNORE_BLANK_LINES` is set.
    pub fn if_ignore_blank_lines(self) -> bool {
        self.0.contains(Mode::IGNORE_BLANK_LINES)
    }

    /// Whether `IGNORE_CASE` is set.
    pub fn if_ignore_case(self) -> bool {
        self.0.contains(Mode::IGNORE_CASE)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathSpecAndSignature

/// Source specifier accepted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    /// One path, taken as is.
    Literal(PathBuf),
    /// Shell-like pattern (`*`, `?`, `**` when recursive).
    Glob(String),
    /// Ordered collection, visited in order.
    Many(Vec<PathBuf>),
    /// Unordered collection, visited in iteration order.
    Set(HashSet<PathBuf>),
}

impl PathSpec {
    /// `Glob` when `value` contains a wildcard, `Literal` otherwise.
    pub fn parse(value: &str) -> Self {
        if value.contains(TUP_GLOB_WILDCARDS) {
            Self::Glob(value.to_string())
        } else {
            Self::Literal(PathBuf::from(value))
        }
    }

    /// Whether this is an explicit collection (`Many` or `Set`).
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Many(_) | Self::Set(_))
    }
}

impl From<&str> for PathSpec {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for PathSpec {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&Path> for PathSpec {
    fn from(value: &Path) -> Self {
        Self::Literal(value.to_path_buf())
    }
}

impl From<PathBuf> for PathSpec {
    fn from(value: PathBuf) -> Self {
        Self::Literal(value)
    }
}

impl<T: Into<PathBuf>> From<Vec<T>> for PathSpec {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PathBuf>> From<HashSet<T>> for PathSpec {
    fn from(values: HashSet<T>) -> Self {
        Self::Set(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PathBuf>> From<BTreeSet<T>> for PathSpec {
    fn from(values: BTreeSet<T>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Node type part of a [`FileSignature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumFileKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link (only reported by `symlink_metadata`).
    Symlink,
    /// Device, fifo, socket, ...
    Other,
}

impl EnumFileKind {
    /// Classify a [`fs::FileType`].
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_file() {
            Self::File
        } else if file_type.is_dir() {
            Self::Dir
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}

/// Comparable state of a file at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileSignature {
    /// Node type.
    pub kind: EnumFileKind,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: FileTime,
}

impl FileSignature {
    /// Build from already fetched metadata.
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            kind: EnumFileKind::from_file_type(meta.file_type()),
            size: meta.len(),
            mtime: FileTime::from_last_modification_time(meta),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OptionsAndErrors

/// Copy engine options.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Retry a failed native copy once with the platform copy command.
    pub if_fallback_command: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            if_fallback_command: true,
        }
    }
}

/// Compare engine options.
#[derive(Debug, Clone)]
pub struct SpecCompareOptions {
    /// Cache bound; reaching it clears the whole cache.
    pub n_cache_entries_max: usize,
    /// Chunk size for binary comparison.
    pub n_buffer_size: usize,
}

impl Default for SpecCompareOptions {
    fn default() -> Self {
        Self {
            n_cache_entries_max: N_COMPARE_CACHE_ENTRIES_MAX,
            n_buffer_size: N_BUFFER_SIZE_COMPARE,
        }
    }
}

/// Errors raised by every operation.
#[derive(Debug, Error)]
pub enum FsError {
    /// Malformed path or argument value.
    #[error("{0}")]
    ParameterError(String),
    /// Flag outside the operation's family, or an illegal combination.
    #[error("Unsupported mode: '{flags}:{mode}'")]
    UnsupportedMode {
        /// Offending bits.
        mode: u32,
        /// Offending bits rendered by name.
        flags: String,
    },
    /// Remove refused (protected root, type/flag mismatch, missing path).
    #[error("{0}")]
    FileRemoveError(String),
    /// Move refused (destination exists, different file type).
    #[error("{0}")]
    FileMoveError(String),
    /// Source not readable or destination not writable.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// Wrong node type for the request, or a misused flag.
    #[error("{0}")]
    InvalidArgument(String),
    /// Native copy and the external-command fallback both failed.
    #[error("Can't copy '{}' to '{}': {message}", path_src.display(), path_dst.display())]
    OsError {
        /// Copy source.
        path_src: PathBuf,
        /// Copy destination.
        path_dst: PathBuf,
        /// Failure text.
        message: String,
    },
    /// Underlying filesystem call failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path the call operated on.
        path: PathBuf,
        /// Original error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Attach `path` to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`FsError::UnsupportedMode`] naming the offending flags.
    pub fn unsupported_mode(mode: Mode) -> Self {
        Self::UnsupportedMode {
            mode: mode.bits(),
            flags: mode.describe(),
        }
    }

    /// Argument-level failure (`ParameterError` and its refinements).
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::ParameterError(_) | Self::UnsupportedMode { .. } | Self::InvalidArgument(_)
        )
    }

    /// Operation-specific refusal of remove or move.
    pub fn is_file_handling_error(&self) -> bool {
        matches!(self, Self::FileRemoveError(_) | Self::FileMoveError(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
