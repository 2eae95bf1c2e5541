//! Flag vocabulary and engine constants.

/// Chunk size used by binary comparison (one page).
pub const N_BUFFER_SIZE_COMPARE: usize = 4 * 1024;
/// Compare-result cache bound; the cache is cleared entirely once reached.
pub const N_COMPARE_CACHE_ENTRIES_MAX: usize = 100;
/// Windows `MAX_PATH`; longer paths are rewritten to extended-length form.
pub const N_LEN_WINDOWS_PATH_MAX: usize = 260;

/// Characters that turn a source string into a glob pattern.
pub const TUP_GLOB_WILDCARDS: [char; 2] = ['*', '?'];

/// Canonical flag names, in bit order.
///
/// `F_REPLACE` is accepted when parsing but never rendered: it shares the
/// value of `F_FORCE`.
pub const TUP_MODE_FLAG_NAMES: [(u32, &str); 13] = [
    (1, "F_FORCE"),
    (2, "F_IGNORE"),
    (4, "F_RECURSIVE"),
    (8, "F_UPDATE"),
    (16, "F_TARGET_DIRECTORY"),
    (32, "F_RM_DIR"),
    (64, "F_RM_FILE"),
    (128, "F_RM_EMPTY"),
    (256, "C_SHALLOW"),
    (512, "C_BINARY"),
    (1024, "C_TEXT"),
    (2048, "C_IGNORE_BLANK_LINES"),
    (4096, "C_IGNORE_CASE"),
];

/// Name rendered for an empty mode.
pub const C_MODE_NAME_NOSET: &str = "F_NOSET";
/// Alias of `F_FORCE` accepted by the mode parser.
pub const C_MODE_NAME_REPLACE: &str = "F_REPLACE";
