//! Finds the files to compile

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Files with this extension are picked up when walking directories
pub const SOURCE_EXTENSION: &str = "llmcl";

/// Expands the given paths into the files to compile.
///
/// Files are kept as given, whatever their extension. Directories are walked for
/// `*.llmcl` files, which are returned sorted. A path is only returned once.
pub fn collect_sources<P: AsRef<Path>>(roots: &[P]) -> io::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut sources = vec![];
    for root in roots {
        let root = root.as_ref();
        let found = if root.is_file() {
            vec![root.to_path_buf()]
        } else if root.is_dir() {
            walk(root)?.into_iter().collect()
        } else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{root:?} does not exist"),
            ));
        };
        sources.extend(found.into_iter().filter(|path| seen.insert(path.clone())));
    }
    Ok(sources)
}

fn walk(root: &Path) -> io::Result<BTreeSet<PathBuf>> {
    let mut stack = vec![root.to_path_buf()];
    let mut visited = HashSet::new();
    let mut files = BTreeSet::new();

    while let Some(path) = stack.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }
        if path.is_file() {
            if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
                trace!("found source {path:?}");
                files.insert(path);
            }
        } else if path.is_dir() {
            for entry in std::fs::read_dir(&path)? {
                stack.push(entry?.path());
            }
        }
    }

    Ok(files)
}
