use std::path::{Path, PathBuf};

use crate::pipeline::PAYLOAD_DIR_NAME;

/// Archives nest the payload arbitrarily deep (often under a wrapper
/// directory named after the repository), so the search cannot assume a
/// fixed depth. This cap only bounds pathological input.
const MAX_SEARCH_DEPTH: usize = 32;

/// Find the first directory literally named `Build` under `root`.
///
/// Each visited directory is checked for a direct `Build` child before any
/// descent, then its subdirectories are searched depth-first in listing
/// order. Only the first match is returned; the search is documented as
/// non-exhaustive, not validated-unique.
///
/// Uses an explicit work stack with a depth cap instead of recursion, so
/// adversarial nesting cannot overflow the stack.
pub fn find_payload_dir(root: &Path) -> Option<PathBuf> {
  let mut stack: Vec<(PathBuf, usize)> = vec![(root.to_path_buf(), 0)];

  while let Some((dir, depth)) = stack.pop() {
    let direct = dir.join(PAYLOAD_DIR_NAME);
    if direct.is_dir() {
      return Some(direct);
    }

    if depth >= MAX_SEARCH_DEPTH {
      continue;
    }

    let Ok(entries) = std::fs::read_dir(&dir) else {
      continue;
    };
    let mut children: Vec<PathBuf> = entries
      .flatten()
      .map(|e| e.path())
      .filter(|p| p.is_dir())
      .collect();
    children.sort();

    // Reverse push so the first child is searched first (depth-first).
    for child in children.into_iter().rev() {
      stack.push((child, depth + 1));
    }
  }

  None
}
