use std::{
    fmt,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::{Error, Result};

static FITNESS_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^fitness\d+").expect("valid regex"));
static RUN_LOG_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^out-\d+\.log").expect("valid regex"));
static TREE_TAGS_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^treeTags.+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Per-run population fitness over evaluations.
    Fitness,
    /// Optimizer stdout log with end-of-run `overall=` markers.
    RunLog,
    /// Per-generation tree tag density statistics.
    TreeTags,
}

impl FileKind {
    pub fn classify(file_name: &str) -> Option<Self> {
        if FITNESS_FILE.is_match(file_name) {
            Some(FileKind::Fitness)
        } else if RUN_LOG_FILE.is_match(file_name) {
            Some(FileKind::RunLog)
        } else if TREE_TAGS_FILE.is_match(file_name) && !file_name.ends_with(".png") {
            Some(FileKind::TreeTags)
        } else {
            None
        }
    }

    fn noun(self) -> &'static str {
        match self {
            FileKind::Fitness => "fitness files",
            FileKind::RunLog => "run logs",
            FileKind::TreeTags => "tree tag files",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// A labelled directory of runs for one algorithm or experiment setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub label: String,
    pub dir: PathBuf,
}

impl Condition {
    pub fn new(label: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            dir: dir.into(),
        }
    }

    /// Every file of `kind` below the condition directory, sorted by path.
    ///
    /// A condition without a single matching file can't be summarized, so that
    /// is reported as an error instead of an empty list.
    pub fn files(&self, kind: FileKind) -> Result<Vec<PathBuf>> {
        let files = scan(&self.dir, kind)?;
        if files.is_empty() {
            return Err(Error::InsufficientSamples {
                label: self.label.clone(),
                what: kind.noun(),
                found: 0,
                needed: 1,
            });
        }
        tracing::debug!(label = %self.label, count = files.len(), "found {kind}");
        Ok(files)
    }
}

pub fn scan(dir: &Path, kind: FileKind) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|source| Error::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else { continue };
        if FileKind::classify(name) == Some(kind) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh scratch directory for file system tests.
    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("postrun_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn classifies_file_names() {
        assert_eq!(FileKind::classify("fitness0"), Some(FileKind::Fitness));
        assert_eq!(FileKind::classify("fitness12.dat"), Some(FileKind::Fitness));
        assert_eq!(FileKind::classify("out-3.log"), Some(FileKind::RunLog));
        assert_eq!(FileKind::classify("treeTags_7"), Some(FileKind::TreeTags));
        assert_eq!(FileKind::classify("treeTags_7.png"), None);
        assert_eq!(FileKind::classify("treeTags"), None);
        assert_eq!(FileKind::classify("fitness"), None);
        assert_eq!(FileKind::classify("myfitness1"), None);
        assert_eq!(FileKind::classify("out-x.log"), None);
    }

    #[test]
    fn scan_walks_subdirectories_in_order() {
        let dir = scratch_dir("scan");
        std::fs::create_dir_all(dir.join("b")).unwrap();
        std::fs::write(dir.join("b/fitness2"), "").unwrap();
        std::fs::write(dir.join("fitness1"), "").unwrap();
        std::fs::write(dir.join("out-1.log"), "").unwrap();

        let files = scan(&dir, FileKind::Fitness).unwrap();
        assert_eq!(files, vec![dir.join("b/fitness2"), dir.join("fitness1")]);

        let condition = Condition::new("empty", &dir);
        let err = condition.files(FileKind::TreeTags).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { found: 0, .. }));
        let _ = std::fs::remove_dir_all(dir);
    }
}
