//! Description of the code-loading hierarchy a unit of work runs in.
//!
//! The structure is carried through every spec conversion unchanged. Only
//! the receiving side of an isolation boundary interprets it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One level of a code-loading hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoaderSpec {
    /// Exposes only the listed packages and resources of its parent.
    Filtering {
        /// Package prefixes visible through this level.
        allowed_packages: Vec<String>,
        /// Resource prefixes visible through this level.
        allowed_resources: Vec<String>,
    },
    /// Loads code from an explicit classpath.
    Classpath {
        /// Human-readable name for diagnostics.
        name: String,
        /// Entries searched in order.
        entries: Vec<PathBuf>,
    },
}

/// A code-loading level and its optional parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLoaderStructure {
    spec: LoaderSpec,
    parent: Option<Box<ClassLoaderStructure>>,
}

impl ClassLoaderStructure {
    /// Creates a root level.
    pub fn new(spec: LoaderSpec) -> Self {
        Self { spec, parent: None }
    }

    /// Returns a new level with `spec` on top of `self`.
    pub fn with_child(self, spec: LoaderSpec) -> Self {
        Self {
            spec,
            parent: Some(Box::new(self)),
        }
    }

    /// Returns this level's description.
    pub fn spec(&self) -> &LoaderSpec {
        &self.spec
    }

    /// Returns the parent level, if any.
    pub fn parent(&self) -> Option<&ClassLoaderStructure> {
        self.parent.as_deref()
    }

    /// Iterates from this level up to the root.
    pub fn levels(&self) -> impl Iterator<Item = &LoaderSpec> {
        std::iter::successors(Some(self), |s| s.parent()).map(|s| &s.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure() -> ClassLoaderStructure {
        ClassLoaderStructure::new(LoaderSpec::Filtering {
            allowed_packages: vec!["org.anvil.api".to_string()],
            allowed_resources: Vec::new(),
        })
        .with_child(LoaderSpec::Classpath {
            name: "worker".to_string(),
            entries: vec![PathBuf::from("lib/worker.jar")],
        })
    }

    #[test]
    fn levels_walk_to_root() {
        let s = structure();
        let levels: Vec<_> = s.levels().collect();
        assert_eq!(levels.len(), 2);
        assert!(matches!(levels[0], LoaderSpec::Classpath { .. }));
        assert!(matches!(levels[1], LoaderSpec::Filtering { .. }));
        assert!(s.parent().unwrap().parent().is_none());
    }

    #[test]
    fn survives_bincode() {
        let s = structure();
        let bytes = bincode::serde::encode_to_vec(&s, bincode::config::standard()).unwrap();
        let (back, _): (ClassLoaderStructure, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back, s);
    }
}
