//! Line-oriented regex search over a file or a literal text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use crate::conf::N_LEN_WINDOWS_PATH_MAX;
use crate::path::is_path_like;
use crate::spec::{FsError, Result};

/// Anything that can become a compiled [`Regex`].
pub trait IntoPattern {
    fn into_pattern(self) -> Result<Regex>;
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<Regex> {
        Regex::new(self)
            .map_err(|e| FsError::ParameterError(format!("Invalid regex `{self}`: {e}")))
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<Regex> {
        self.as_str().into_pattern()
    }
}

impl IntoPattern for &String {
    fn into_pattern(self) -> Result<Regex> {
        self.as_str().into_pattern()
    }
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<Regex> {
        Ok(self)
    }
}

impl IntoPattern for &Regex {
    fn into_pattern(self) -> Result<Regex> {
        Ok(self.clone())
    }
}

/// Search `anchor` for `pattern`, line by line.
///
/// `anchor` is read as a file path when it looks like one (only its first
/// 260 characters are considered for that), and as text otherwise.
///
/// Per line, `index` selects what is collected:
/// - `0`: the first match;
/// - `n > 0`: capture group `n` of the first match;
/// - `n < 0`: every non-overlapping match, or capture group 1 of each when
///   the pattern has groups.
///
/// # Errors
/// - [`FsError::ParameterError`] for an invalid pattern or a group index the
///   pattern does not have.
/// - [`FsError::InvalidArgument`] when `anchor` looks like a path but is not
///   a regular file.
pub fn grep(anchor: &str, pattern: impl IntoPattern, index: isize) -> Result<Vec<String>> {
    let regex = pattern.into_pattern()?;
    if let Ok(n_group) = usize::try_from(index) {
        if n_group >= regex.captures_len() {
            return Err(FsError::ParameterError(format!(
                "No group {index} in pattern `{}`",
                regex.as_str()
            )));
        }
    }

    let c_anchor_path: String = anchor.chars().take(N_LEN_WINDOWS_PATH_MAX).collect();
    if !is_path_like(&c_anchor_path) {
        let mut l_found = Vec::new();
        for c_line in anchor.lines() {
            collect_line(c_line, &regex, index, &mut l_found);
        }
        return Ok(l_found);
    }

    let path_file = Path::new(&c_anchor_path);
    if !path_file.is_file() {
        return Err(FsError::InvalidArgument(format!(
            "The path '{c_anchor_path}' is not a file or it is not found."
        )));
    }
    let fp = File::open(path_file).map_err(|e| FsError::io(path_file, e))?;
    let mut reader = BufReader::new(fp);
    let mut raw_line = Vec::new();
    let mut l_found = Vec::new();
    loop {
        raw_line.clear();
        let n_read = reader
            .read_until(b'\n', &mut raw_line)
            .map_err(|e| FsError::io(path_file, e))?;
        if n_read == 0 {
            break;
        }
        let c_line = String::from_utf8_lossy(&raw_line);
        collect_line(c_line.trim_end_matches(['\n', '\r']), &regex, index, &mut l_found);
    }
    Ok(l_found)
}

fn collect_line(c_line: &str, regex: &Regex, index: isize, l_found: &mut Vec<String>) {
    let Ok(n_group) = usize::try_from(index) else {
        let n_group = usize::from(regex.captures_len() > 1);
        for caps in regex.captures_iter(c_line) {
            if let Some(m) = caps.get(n_group) {
                l_found.push(m.as_str().to_string());
            }
        }
        return;
    };
    if let Some(m) = regex.captures(c_line).and_then(|caps| caps.get(n_group)) {
        l_found.push(m.as_str().to_string());
    }
}
