/**
 * Export file naming
 *
 * Format: <dir1>_<dir2>_..._<original file name>
 * Collisions: <stem>_1<.ext>, <stem>_2<.ext>, ... until a free name is found
 */

use std::path::{Component, Path, PathBuf};

/// Flatten a path relative to the input root into a single file name.
///
/// `2020/Trip/IMG_5.jpg` becomes `2020_Trip_IMG_5.jpg`; a file directly under
/// the root keeps its own name.
pub fn flattened_name(relative_path: &Path) -> Option<String> {
    let file_name = relative_path.file_name()?.to_string_lossy().into_owned();

    let folders: Vec<String> = relative_path
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if folders.is_empty() {
        Some(file_name)
    } else {
        Some(format!("{}_{}", folders.join("_"), file_name))
    }
}

/// `name` with `_<counter>` inserted before the extension.
pub fn with_counter(name: &str, counter: u32) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, counter, ext.to_string_lossy()),
        None => format!("{}_{}", stem, counter),
    }
}

/// First of `name`, `name_1`, `name_2`, ... for which `is_taken` is false.
pub fn unique_name<F>(name: &str, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !is_taken(name) {
        return name.to_string();
    }

    let mut counter = 1;
    loop {
        let candidate = with_counter(name, counter);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Free destination for `name` inside `export_dir`, checked against the file system.
pub fn unique_destination(export_dir: &Path, name: &str) -> PathBuf {
    let chosen = unique_name(name, |candidate| export_dir.join(candidate).exists());
    export_dir.join(chosen)
}
