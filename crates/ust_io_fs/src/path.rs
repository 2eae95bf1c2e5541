//! Platform path normalization and the path-likelihood predicate.
//!
//! Both converters are pure string functions so either flavor can be used
//! (and tested) on any host; [`normalize`] picks the one matching the
//! current platform.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::conf::N_LEN_WINDOWS_PATH_MAX;
use crate::spec::{FsError, Result};

static RE_PATH_LIKE_WINDOWS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(^(?:[a-zA-Z]:\\)|(?:\\\\\?\\UNC)|(?:\\\\[\w.?]+\\[\w.$?]+))",
        r"(?:[\w\-]+\\)*[\w\-]+([\w\-.])+$",
    ))
    .expect("static regex")
});
static RE_PATH_LIKE_UNIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/)?([a-zA-Z0-9_.-]+(/)?)+$").expect("static regex"));
static RE_DRIVE_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+:[/\\]+$").expect("static regex"));

const C_PREFIX_EXTENDED: &str = r"\\?\";
const C_PREFIX_EXTENDED_UNC: &str = r"\\?\UNC\";
const C_PREFIX_UNC: &str = r"\\";

/// Path syntax family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPathFlavor {
    /// Backslash separators, drive letters, UNC shares.
    Windows,
    /// Forward slash separators.
    Unix,
}

impl EnumPathFlavor {
    /// Flavor of the host platform.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

fn ensure_has_separator(path: &str) -> Result<()> {
    if !path.contains(['/', '\\']) {
        return Err(FsError::ParameterError(format!(
            "Path '{path}' is not a valid path."
        )));
    }
    Ok(())
}

/// Normalize `path` for the current platform.
///
/// # Errors
/// [`FsError::ParameterError`] when `path` contains no separator at all.
pub fn normalize(path: &str) -> Result<String> {
    normalize_for(path, EnumPathFlavor::current())
}

/// Normalize `path` for an explicit flavor.
pub fn normalize_for(path: &str, flavor: EnumPathFlavor) -> Result<String> {
    match flavor {
        EnumPathFlavor::Windows => to_windows_path(path),
        EnumPathFlavor::Unix => to_unix_path(path),
    }
}

/// [`normalize`] for [`Path`] inputs.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let c_path = path.to_str().ok_or_else(|| {
        FsError::ParameterError(format!(
            "Path '{}' is not valid unicode.",
            path.display()
        ))
    })?;
    Ok(PathBuf::from(normalize(c_path)?))
}

/// Unix form: backslashes become `/`, `.` and `..` collapse lexically.
///
/// A trailing separator is kept so callers can tell that the path denotes a
/// directory.
pub fn to_unix_path(path: &str) -> Result<String> {
    ensure_has_separator(path)?;
    let c_path = path.replace('\\', "/");
    let b_absolute = c_path.starts_with('/');
    let b_trailing = c_path.ends_with('/');

    let mut l_parts: Vec<&str> = Vec::new();
    for c_part in c_path.split('/') {
        match c_part {
            "" | "." => {}
            ".." => {
                if matches!(l_parts.last(), Some(&last) if last != "..") {
                    l_parts.pop();
                } else if !b_absolute {
                    l_parts.push("..");
                }
            }
            _ => l_parts.push(c_part),
        }
    }

    let c_body = l_parts.join("/");
    let mut c_result = match (b_absolute, c_body.is_empty()) {
        (true, _) => format!("/{c_body}"),
        (false, true) => ".".to_string(),
        (false, false) => c_body,
    };
    if b_trailing && !c_result.ends_with('/') && c_result != "." {
        c_result.push('/');
    }
    Ok(c_result)
}

/// Windows form: `/` becomes `\`, repeated separators collapse, `X:` gains
/// its root separator, a leading UNC `\\` survives and over-long results are
/// rewritten by [`to_extended_length_path`].
pub fn to_windows_path(path: &str) -> Result<String> {
    ensure_has_separator(path)?;
    if path.starts_with(C_PREFIX_EXTENDED) {
        return Ok(path.to_string());
    }
    let c_path = path.replace('/', "\\");
    let b_unc = c_path.starts_with(C_PREFIX_UNC);
    let b_trailing = c_path.ends_with('\\');

    let l_parts: Vec<&str> = c_path.split('\\').filter(|s| !s.is_empty()).collect();
    let mut c_result = String::with_capacity(c_path.len() + 1);
    if b_unc {
        c_result.push_str(C_PREFIX_UNC);
    } else if c_path.starts_with('\\') {
        c_result.push('\\');
    }
    c_result.push_str(&l_parts.join("\\"));
    let b_drive_only = l_parts.len() == 1 && l_parts[0].ends_with(':') && !b_unc;
    if (b_trailing || b_drive_only) && !c_result.ends_with('\\') {
        c_result.push('\\');
    }

    if c_result.chars().count() > N_LEN_WINDOWS_PATH_MAX {
        return Ok(to_extended_length_path(&c_result, N_LEN_WINDOWS_PATH_MAX));
    }
    Ok(c_result)
}

/// Rewrite `path` into extended-length form when it is longer than
/// `n_len_max` characters: `\\server\share` becomes `\\?\UNC\server\share`,
/// anything else gains a `\\?\` prefix. Already-extended paths are returned
/// unchanged.
pub fn to_extended_length_path(path: &str, n_len_max: usize) -> String {
    if path.starts_with(C_PREFIX_EXTENDED) {
        return path.to_string();
    }
    if path.chars().count() <= n_len_max {
        return path.to_string();
    }
    if let Some(c_rest) = path.strip_prefix(C_PREFIX_UNC) {
        return format!("{C_PREFIX_EXTENDED_UNC}{c_rest}");
    }
    format!("{C_PREFIX_EXTENDED}{path}")
}

/// Heuristic: does `anchor` denote a filesystem path rather than free text?
///
/// Existing paths always qualify; otherwise the platform path syntax decides.
pub fn is_path_like(anchor: &str) -> bool {
    is_path_like_for(anchor, EnumPathFlavor::current())
}

/// [`is_path_like`] with an explicit syntax flavor.
pub fn is_path_like_for(anchor: &str, flavor: EnumPathFlavor) -> bool {
    if anchor.is_empty() {
        return false;
    }
    if Path::new(anchor).exists() {
        return true;
    }
    match flavor {
        EnumPathFlavor::Windows => RE_PATH_LIKE_WINDOWS.is_match(anchor),
        EnumPathFlavor::Unix => RE_PATH_LIKE_UNIX.is_match(anchor),
    }
}

/// Whether `path` names a filesystem root: the Unix `/` or a Windows drive
/// root such as `C:\` or `C:/`. Both forms are recognized on every host.
pub fn is_filesystem_root(path: &str) -> bool {
    let c_path = path.trim();
    c_path == "/" || RE_DRIVE_ROOT.is_match(c_path)
}

#[cfg(test)]
mod tests {
    use super::{
        EnumPathFlavor, is_filesystem_root, is_path_like_for, to_extended_length_path,
        to_unix_path, to_windows_path,
    };
    use crate::spec::FsError;

    #[test]
    fn unix_path_collapses_dots_and_backslashes() {
        assert_eq!(to_unix_path("/tmp/./a/../b").expect("ok"), "/tmp/b");
        assert_eq!(to_unix_path(r"tmp\sub\file.txt").expect("ok"), "tmp/sub/file.txt");
        assert_eq!(to_unix_path("/../..//x").expect("ok"), "/x");
        assert_eq!(to_unix_path("../a/./b/").expect("ok"), "../a/b/");
        assert_eq!(to_unix_path("//").expect("ok"), "/");
        assert_eq!(to_unix_path("a/..").expect("ok"), ".");
    }

    #[test]
    fn unix_path_keeps_trailing_separator() {
        assert_eq!(to_unix_path("/tmp/dir/").expect("ok"), "/tmp/dir/");
    }

    #[test]
    fn paths_without_separator_are_rejected() {
        assert!(matches!(
            to_unix_path("file.txt"),
            Err(FsError::ParameterError(_))
        ));
        assert!(matches!(
            to_windows_path("file.txt"),
            Err(FsError::ParameterError(_))
        ));
    }

    #[test]
    fn windows_path_converts_separators() {
        assert_eq!(to_windows_path("C:/Users//me/a.txt").expect("ok"), r"C:\Users\me\a.txt");
        assert_eq!(to_windows_path("C:/").expect("ok"), r"C:\");
        assert_eq!(to_windows_path(r"\\server\share/dir").expect("ok"), r"\\server\share\dir");
        assert_eq!(to_windows_path("C:/dir/").expect("ok"), r"C:\dir\");
    }

    #[test]
    fn windows_long_paths_become_extended_length() {
        let c_long = format!("C:/{}", "a".repeat(300));
        let c_result = to_windows_path(&c_long).expect("ok");
        assert!(c_result.starts_with(r"\\?\C:\"));

        let c_long_unc = format!(r"\\server\share\{}", "b".repeat(300));
        let c_result = to_windows_path(&c_long_unc).expect("ok");
        assert!(c_result.starts_with(r"\\?\UNC\server\share\"));
    }

    #[test]
    fn extended_length_only_past_limit() {
        assert_eq!(to_extended_length_path(r"C:\a", 260), r"C:\a");
        assert_eq!(to_extended_length_path(r"C:\abc", 3), r"\\?\C:\abc");
        assert_eq!(to_extended_length_path(r"\\?\C:\abc", 3), r"\\?\C:\abc");
        assert_eq!(to_extended_length_path(r"\\srv\s\abc", 3), r"\\?\UNC\srv\s\abc");
    }

    #[test]
    fn path_like_by_syntax() {
        assert!(is_path_like_for("/not/existing/file.txt", EnumPathFlavor::Unix));
        assert!(!is_path_like_for("Hello World", EnumPathFlavor::Unix));
        assert!(!is_path_like_for("", EnumPathFlavor::Unix));
        assert!(is_path_like_for(r"C:\Users\me\file.txt", EnumPathFlavor::Windows));
        assert!(is_path_like_for(r"\\server\share\file.txt", EnumPathFlavor::Windows));
        assert!(!is_path_like_for("To be or not", EnumPathFlavor::Windows));
    }

    #[test]
    fn filesystem_roots_are_recognized() {
        assert!(is_filesystem_root("/"));
        assert!(is_filesystem_root(" / "));
        assert!(is_filesystem_root(r"C:\"));
        assert!(is_filesystem_root("c:/"));
        assert!(is_filesystem_root(r"D:\\"));
        assert!(!is_filesystem_root(r"C:\Windows"));
        assert!(!is_filesystem_root("/tmp"));
    }
}
