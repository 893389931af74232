//! Persistent source-to-artifact mapping.
//!
//! Records, for every source unit, the names of the artifacts it produced in
//! the last successful compilation. Persisted as `source-classes-mapping.txt`
//! in the task's scratch directory, one line per source:
//!
//! ```text
//! src/com/example/Widget.java -> com.example.Widget,com.example.Widget$Part
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use crate::error::StateError;
use crate::source::SourceUnit;

/// Name of the mapping file within the scratch directory.
pub const MAPPING_FILE: &str = "source-classes-mapping.txt";

const SEPARATOR: &str = " -> ";

/// Multimap from source unit to the set of artifact names it produced.
///
/// Keys are unique and values form a set, so recording the same association
/// twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNameMapping {
    entries: BTreeMap<SourceUnit, BTreeSet<String>>,
}

impl ClassNameMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the artifact names attributed to `source`, if it is known.
    pub fn get(&self, source: &SourceUnit) -> Option<&BTreeSet<String>> {
        self.entries.get(source)
    }

    /// Returns `true` if `source` has an entry.
    pub fn contains(&self, source: &SourceUnit) -> bool {
        self.entries.contains_key(source)
    }

    /// Adds one association, creating the entry if needed.
    pub fn record(&mut self, source: SourceUnit, artifact: impl Into<String>) {
        self.entries.entry(source).or_default().insert(artifact.into());
    }

    /// Replaces the entry for `source` wholesale.
    pub fn replace(&mut self, source: SourceUnit, artifacts: BTreeSet<String>) {
        self.entries.insert(source, artifacts);
    }

    /// Removes the entry for `source`, returning its artifacts.
    pub fn remove(&mut self, source: &SourceUnit) -> Option<BTreeSet<String>> {
        self.entries.remove(source)
    }

    /// Number of known source units.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no source unit is known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceUnit, &BTreeSet<String>)> {
        self.entries.iter()
    }

    /// Merges the associations produced by an incremental compilation.
    ///
    /// Entries of `removed` sources are dropped. Entries of `recompiled`
    /// sources are superseded by their entry in `produced`, or by an empty set
    /// when the compiler reported nothing for them, so the source stays known.
    /// Any other entry of `produced` is inserted as-is.
    pub fn merge<'a>(
        &mut self,
        produced: &ClassNameMapping,
        recompiled: impl IntoIterator<Item = &'a SourceUnit>,
        removed: impl IntoIterator<Item = &'a SourceUnit>,
    ) {
        for source in removed {
            self.entries.remove(source);
        }
        for source in recompiled {
            self.entries.insert(source.clone(), BTreeSet::new());
        }
        for (source, artifacts) in &produced.entries {
            self.entries.insert(source.clone(), artifacts.clone());
        }
    }

    /// Parses the mapping file format.
    ///
    /// Blank lines are ignored. Any other line without a ` -> ` separator or
    /// with an empty source makes the whole file unreadable.
    pub fn parse(path: &Path, content: &str) -> Result<Self, StateError> {
        let mut mapping = Self::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parse_error = |reason: &str| StateError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                reason: reason.to_string(),
            };
            let (source, artifacts) = line
                .rsplit_once(SEPARATOR)
                .or_else(|| line.strip_suffix(SEPARATOR.trim_end()).map(|s| (s, "")))
                .ok_or_else(|| parse_error("missing ' -> ' separator"))?;
            if source.trim().is_empty() {
                return Err(parse_error("empty source path"));
            }
            let entry = mapping.entries.entry(SourceUnit::new(source)).or_default();
            entry.extend(
                artifacts
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(mapping)
    }

    /// Renders the mapping file format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (source, artifacts) in &self.entries {
            let names: Vec<&str> = artifacts.iter().map(String::as_str).collect();
            out.push_str(&source.to_string());
            out.push_str(SEPARATOR);
            out.push_str(&names.join(","));
            out.push('\n');
        }
        out
    }

    /// Reads a mapping file.
    ///
    /// Returns `Ok(None)` if the file does not exist, so callers can tell a
    /// first build apart from a corrupt file.
    pub fn read(path: &Path) -> Result<Option<Self>, StateError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StateError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        Self::parse(path, &content).map(Some)
    }

    /// Writes the mapping to `path` atomically.
    ///
    /// The content is written to a temporary file in `staging_dir`, which must
    /// be on the same filesystem as `path`, and then renamed over `path`. A
    /// crash never leaves a torn mapping file behind.
    pub fn write_atomically(&self, path: &Path, staging_dir: &Path) -> Result<(), StateError> {
        let io_error = |path: &Path, source: std::io::Error| StateError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let mut staged =
            tempfile::NamedTempFile::new_in(staging_dir).map_err(|e| io_error(staging_dir, e))?;
        staged
            .write_all(self.render().as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| io_error(staged.path(), e))?;
        staged.persist(path).map_err(|e| io_error(path, e.error))?;
        Ok(())
    }
}

impl FromIterator<(SourceUnit, String)> for ClassNameMapping {
    fn from_iter<I: IntoIterator<Item = (SourceUnit, String)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (source, artifact) in iter {
            mapping.record(source, artifact);
        }
        mapping
    }
}
