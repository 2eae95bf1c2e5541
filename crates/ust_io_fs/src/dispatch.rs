//! Source resolution and per-item invocation shared by copy, move and remove.

use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

use crate::report::{ReportFs, ReportFsBuilder};
use crate::spec::{FsError, Mode, PathSpec, Result};

const TUP_GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// Resolve `spec_path` and run `op(path_src, path_dst, mode, builder)` for
/// every resolved source, in resolution order.
///
/// # Errors
/// - [`FsError::UnsupportedMode`] when `mode` intersects `mode_unsupported`.
/// - [`FsError::InvalidArgument`] when `TARGET_DIRECTORY` is set but the
///   specifier is not a collection.
/// - [`FsError::ParameterError`] for an invalid glob pattern.
/// - The first error returned by `op`; earlier items are not rolled back.
pub fn dispatch<F>(
    spec_path: &PathSpec,
    path_dst: &Path,
    mode: Mode,
    mode_unsupported: Mode,
    mut op: F,
) -> Result<ReportFs>
where
    F: FnMut(&Path, &Path, Mode, &mut ReportFsBuilder) -> Result<()>,
{
    let mode_illegal = mode & mode_unsupported;
    if !mode_illegal.is_empty() {
        return Err(FsError::unsupported_mode(mode_illegal));
    }
    if mode.contains(Mode::TARGET_DIRECTORY) && !spec_path.is_collection() {
        return Err(FsError::InvalidArgument(
            "F_TARGET_DIRECTORY requires a collection of sources.".to_string(),
        ));
    }

    let l_paths_src = resolve(spec_path, mode.contains(Mode::RECURSIVE))?;
    debug!("dispatch: {} source(s), mode={mode}", l_paths_src.len());

    let mut builder_fs_report = ReportFsBuilder::default();
    builder_fs_report.add_counts(&["cnt_resolved"], l_paths_src.len() as u64);
    for path_src in &l_paths_src {
        op(path_src, path_dst, mode, &mut builder_fs_report)?;
    }
    Ok(builder_fs_report.build())
}

/// Concrete paths denoted by `spec_path`.
///
/// `**` spans directories only when `if_recursive` is set; otherwise it
/// behaves like `*`.
pub fn resolve(spec_path: &PathSpec, if_recursive: bool) -> Result<Vec<PathBuf>> {
    match spec_path {
        PathSpec::Literal(path) => Ok(vec![path.clone()]),
        PathSpec::Glob(pattern) => expand_glob(pattern, if_recursive),
        PathSpec::Many(l_paths) => Ok(l_paths.clone()),
        PathSpec::Set(set_paths) => Ok(set_paths.iter().cloned().collect()),
    }
}

fn is_glob_component(c_part: &str) -> bool {
    c_part.contains(TUP_GLOB_META)
}

/// Expand a shell pattern into the sorted list of existing matches.
///
/// The pattern is split into a literal base directory and a wildcard
/// remainder; the base is walked no deeper than the remainder requires.
/// Entries whose name starts with `.` only match a component that starts
/// with `.` as well.
pub fn expand_glob(pattern: &str, if_recursive: bool) -> Result<Vec<PathBuf>> {
    let mut c_pattern = pattern.to_string();
    if !if_recursive {
        while c_pattern.contains("**") {
            c_pattern = c_pattern.replace("**", "*");
        }
    }

    let mut path_base = PathBuf::new();
    let mut l_parts_rest: Vec<String> = Vec::new();
    for component in Path::new(&c_pattern).components() {
        let c_part = component.as_os_str().to_string_lossy();
        if !l_parts_rest.is_empty() || is_glob_component(&c_part) {
            l_parts_rest.push(c_part.into_owned());
            continue;
        }
        match component {
            Component::CurDir if path_base.as_os_str().is_empty() => {}
            _ => path_base.push(component.as_os_str()),
        }
    }

    if l_parts_rest.is_empty() {
        let path_literal = PathBuf::from(&c_pattern);
        return Ok(if path_literal.symlink_metadata().is_ok() {
            vec![path_literal]
        } else {
            Vec::new()
        });
    }

    let c_rest = l_parts_rest.join("/");
    let matcher = GlobBuilder::new(&c_rest)
        .literal_separator(true)
        .build()
        .map_err(|e| FsError::ParameterError(format!("Invalid glob pattern `{pattern}`: {e}")))?
        .compile_matcher();
    let n_depth_max = if l_parts_rest.iter().any(|c_part| c_part.contains("**")) {
        usize::MAX
    } else {
        l_parts_rest.len()
    };
    let b_match_hidden = l_parts_rest.iter().any(|c_part| c_part.starts_with('.'));

    let path_root = if path_base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        path_base.clone()
    };
    let iter_entries = WalkDir::new(&path_root)
        .min_depth(1)
        .max_depth(n_depth_max)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || b_match_hidden
                || !entry.file_name().to_string_lossy().starts_with('.')
        });

    let mut l_matches = Vec::new();
    // Unreadable directories are skipped, the way shell globbing does.
    for entry in iter_entries.filter_map(|entry| entry.ok()) {
        let Ok(path_rel) = entry.path().strip_prefix(&path_root) else {
            continue;
        };
        if matcher.is_match(path_rel) {
            l_matches.push(path_base.join(path_rel));
        }
    }
    l_matches.sort();
    Ok(l_matches)
}
