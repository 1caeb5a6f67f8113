//! Source file discovery.
//!
//! Resolves the glob patterns used by the copy task and the watch bindings.
//! Patterns may contain `{a,b,c}` alternatives, which the `glob` crate does
//! not understand, so they are expanded into plain patterns first.

use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// Unbalanced `{` or `}` in a pattern
    UnbalancedBraces(String),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::UnbalancedBraces(pattern) => {
                write!(f, "Unbalanced braces in pattern '{}'", pattern)
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Expand `{a,b}` alternatives into every plain pattern they denote.
///
/// Nested groups are expanded recursively. The order of the result follows
/// the order of the alternatives.
pub fn expand_braces(pattern: &str) -> Result<Vec<String>, DiscoveryError> {
    let Some(open) = pattern.find('{') else {
        if pattern.contains('}') {
            return Err(DiscoveryError::UnbalancedBraces(pattern.to_string()));
        }
        return Ok(vec![pattern.to_string()]);
    };

    // Find the matching close brace and the top-level commas inside it
    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (i, ch) in pattern[open..].char_indices() {
        let i = open + i;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(i),
            _ => {}
        }
    }
    let close = close.ok_or_else(|| DiscoveryError::UnbalancedBraces(pattern.to_string()))?;

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    let mut expanded = Vec::new();
    for pair in bounds.windows(2) {
        let alternative = &pattern[pair[0] + 1..pair[1]];
        let candidate = format!("{}{}{}", prefix, alternative, suffix);
        expanded.extend(expand_braces(&candidate)?);
    }
    Ok(expanded)
}

/// Compile a pattern (with brace alternatives) into glob matchers.
pub fn compile_patterns(pattern: &str) -> Result<Vec<Pattern>, DiscoveryError> {
    expand_braces(pattern)?
        .into_iter()
        .map(|p| Pattern::new(&p).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e)))
        .collect()
}

/// Discover files matching a pattern, resolved from `base_dir`.
///
/// Directories are skipped. The result is sorted and free of duplicates, so
/// overlapping alternatives such as `*.{svg,sv?}` list each file once.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = BTreeSet::new();

    for plain in expand_braces(pattern)? {
        let full_pattern = base_dir.join(&plain);
        let pattern_str = full_pattern.to_string_lossy();
        let paths = glob(&pattern_str)
            .map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

        for entry in paths {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        files.insert(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("error reading path: {}", e);
                }
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Discover files for several patterns at once.
pub fn discover_all(base_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut all = BTreeSet::new();
    for pattern in patterns {
        all.extend(discover_files(base_dir, pattern)?);
    }
    Ok(all.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_expand_braces_plain() {
        assert_eq!(expand_braces("src/*.php").unwrap(), vec!["src/*.php"]);
    }

    #[test]
    fn test_expand_braces_single_group() {
        assert_eq!(
            expand_braces("src/*.{php,png,css}").unwrap(),
            vec!["src/*.php", "src/*.png", "src/*.css"]
        );
    }

    #[test]
    fn test_expand_braces_multiple_groups() {
        assert_eq!(
            expand_braces("{a,b}/*.{x,y}").unwrap(),
            vec!["a/*.x", "a/*.y", "b/*.x", "b/*.y"]
        );
    }

    #[test]
    fn test_expand_braces_nested() {
        assert_eq!(expand_braces("*.{png,{jp,jpe}g}").unwrap(), vec!["*.png", "*.jpg", "*.jpeg"]);
    }

    #[test]
    fn test_expand_braces_unbalanced() {
        assert!(matches!(expand_braces("*.{png"), Err(DiscoveryError::UnbalancedBraces(_))));
        assert!(matches!(expand_braces("*.png}"), Err(DiscoveryError::UnbalancedBraces(_))));
    }

    #[test]
    fn test_compile_patterns_matches() {
        let patterns = compile_patterns("src/fonts/*.{woff,woff2}").unwrap();
        assert_eq!(patterns.len(), 2);
        assert!(patterns.iter().any(|p| p.matches("src/fonts/a.woff2")));
        assert!(!patterns.iter().any(|p| p.matches("src/fonts/a.ttf")));
    }

    #[test]
    fn test_compile_patterns_invalid() {
        assert!(matches!(compile_patterns("src/[*.css"), Err(DiscoveryError::InvalidPattern(..))));
    }

    #[test]
    fn test_discover_files_top_level_only() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/functions.php");
        touch(temp.path(), "src/screenshot.png");
        touch(temp.path(), "src/readme.txt");
        touch(temp.path(), "src/modules/nav.php");

        let files = discover_files(temp.path(), "src/*.{php,png,css}").unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["functions.php", "screenshot.png"]);
    }

    #[test]
    fn test_discover_files_recursive_skips_dirs() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/img/logo.svg");
        touch(temp.path(), "src/img/icons/menu.svg");
        fs::create_dir_all(temp.path().join("src/img/empty.svg")).unwrap();

        let files = discover_files(temp.path(), "src/img/**/*.{svg,png}").unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_discover_all_dedups() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/a.css");
        let patterns = vec!["src/*.css".to_string(), "src/a.*".to_string()];
        assert_eq!(discover_all(temp.path(), &patterns).unwrap().len(), 1);
    }
}
