//! Computation of the invalidation set for an incremental compilation.

use std::collections::BTreeSet;

use crate::converter::SourceFileClassNameConverter;
use crate::source::{ArtifactLayout, ChangeEvent, ChangeKind, OutputArtifact, SourceUnit};

/// What an incremental compilation must redo.
///
/// Every artifact previously produced by a unit in `sources_to_recompile` or
/// `removed_sources` is in `artifacts_to_delete`. When `full_rebuild_cause`
/// is set the other fields are incomplete and must not be acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecompilationSpec {
    /// Added or modified sources to hand to the compiler.
    pub sources_to_recompile: BTreeSet<SourceUnit>,
    /// Stale artifacts to delete before compiling.
    pub artifacts_to_delete: BTreeSet<OutputArtifact>,
    /// Sources that no longer exist; their mapping entries are dropped.
    pub removed_sources: BTreeSet<SourceUnit>,
    /// Why an incremental compilation is not possible, if it isn't.
    pub full_rebuild_cause: Option<String>,
}

impl RecompilationSpec {
    /// Returns `true` if the engine must fall back to a full compilation.
    pub fn is_full_rebuild(&self) -> bool {
        self.full_rebuild_cause.is_some()
    }

    /// Returns `true` if there is nothing to delete and nothing to compile.
    pub fn is_empty(&self) -> bool {
        self.sources_to_recompile.is_empty() && self.artifacts_to_delete.is_empty()
    }

    fn full_rebuild(cause: String) -> Self {
        Self {
            full_rebuild_cause: Some(cause),
            ..Self::default()
        }
    }
}

/// Turns change events into a [`RecompilationSpec`].
#[derive(Debug, Clone, Copy)]
pub struct RecompilationSpecProvider<'a> {
    layout: &'a ArtifactLayout,
}

impl<'a> RecompilationSpecProvider<'a> {
    /// Creates a provider placing artifacts according to `layout`.
    pub fn new(layout: &'a ArtifactLayout) -> Self {
        Self { layout }
    }

    /// Computes the invalidation set in a single pass over `changes`.
    ///
    /// A removed source invalidates all of its artifacts. An added or modified
    /// source invalidates its prior artifacts and is recompiled. When the
    /// converter has no knowledge of a modified or removed source, its stale
    /// outputs cannot be identified and a full rebuild is requested instead.
    /// For repeated events on the same source the last one wins.
    pub fn provide<C>(
        &self,
        changes: impl IntoIterator<Item = ChangeEvent>,
        converter: &C,
    ) -> RecompilationSpec
    where
        C: SourceFileClassNameConverter + ?Sized,
    {
        let mut spec = RecompilationSpec::default();
        for ChangeEvent { source, kind } in changes {
            let prior = converter.artifact_names(&source);
            let prior = match (kind, prior) {
                (_, Some(names)) => names,
                (ChangeKind::Added, None) => BTreeSet::new(),
                (ChangeKind::Modified | ChangeKind::Removed, None) => {
                    return RecompilationSpec::full_rebuild(format!(
                        "no artifact history for {source}"
                    ));
                }
            };
            spec.artifacts_to_delete
                .extend(prior.iter().map(|name| self.layout.artifact(name)));
            match kind {
                ChangeKind::Added | ChangeKind::Modified => {
                    spec.removed_sources.remove(&source);
                    spec.sources_to_recompile.insert(source);
                }
                ChangeKind::Removed => {
                    spec.sources_to_recompile.remove(&source);
                    spec.removed_sources.insert(source);
                }
            }
        }
        tracing::debug!(
            recompile = spec.sources_to_recompile.len(),
            delete = spec.artifacts_to_delete.len(),
            removed = spec.removed_sources.len(),
            "computed invalidation set"
        );
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{FileNameDerivingConverter, MappingConverter};
    use crate::mapping::ClassNameMapping;
    use std::cell::Cell;
    use std::path::PathBuf;

    fn layout() -> ArtifactLayout {
        ArtifactLayout::new("out", "class")
    }

    fn history() -> ClassNameMapping {
        let mut m = ClassNameMapping::new();
        m.record(SourceUnit::new("A.src"), "A");
        m.record(SourceUnit::new("B.src"), "B");
        m
    }

    fn locations(spec: &RecompilationSpec) -> Vec<PathBuf> {
        spec.artifacts_to_delete
            .iter()
            .map(|a| a.location.clone())
            .collect()
    }

    #[test]
    fn modified_source_invalidates_only_its_artifacts() {
        let layout = layout();
        let m = history();
        let spec = RecompilationSpecProvider::new(&layout)
            .provide([ChangeEvent::modified("A.src")], &MappingConverter::new(&m));

        assert!(!spec.is_full_rebuild());
        assert_eq!(
            spec.sources_to_recompile,
            BTreeSet::from([SourceUnit::new("A.src")])
        );
        assert_eq!(locations(&spec), vec![PathBuf::from("out/A.class")]);
        assert!(spec.removed_sources.is_empty());
    }

    #[test]
    fn removed_source_is_deleted_not_recompiled() {
        let layout = layout();
        let m = history();
        let spec = RecompilationSpecProvider::new(&layout)
            .provide([ChangeEvent::removed("B.src")], &MappingConverter::new(&m));

        assert!(spec.sources_to_recompile.is_empty());
        assert_eq!(locations(&spec), vec![PathBuf::from("out/B.class")]);
        assert_eq!(spec.removed_sources, BTreeSet::from([SourceUnit::new("B.src")]));
    }

    #[test]
    fn added_source_without_history_deletes_nothing() {
        let layout = layout();
        let m = history();
        let spec = RecompilationSpecProvider::new(&layout)
            .provide([ChangeEvent::added("C.src")], &MappingConverter::new(&m));

        assert!(!spec.is_full_rebuild());
        assert!(spec.artifacts_to_delete.is_empty());
        assert_eq!(
            spec.sources_to_recompile,
            BTreeSet::from([SourceUnit::new("C.src")])
        );
    }

    #[test]
    fn unknown_modified_source_requests_full_rebuild() {
        let layout = layout();
        let m = history();
        let spec = RecompilationSpecProvider::new(&layout)
            .provide([ChangeEvent::modified("Z.src")], &MappingConverter::new(&m));

        assert!(spec.is_full_rebuild());
        assert!(spec.full_rebuild_cause.unwrap().contains("Z.src"));
    }

    #[test]
    fn last_event_for_a_source_wins() {
        let layout = layout();
        let m = history();
        let spec = RecompilationSpecProvider::new(&layout).provide(
            [ChangeEvent::removed("A.src"), ChangeEvent::added("A.src")],
            &MappingConverter::new(&m),
        );
        assert!(spec.removed_sources.is_empty());
        assert!(spec.sources_to_recompile.contains(&SourceUnit::new("A.src")));
        assert_eq!(locations(&spec), vec![PathBuf::from("out/A.class")]);
    }

    #[test]
    fn convention_converter_never_requests_full_rebuild() {
        let layout = layout();
        let converter = FileNameDerivingConverter::new(["src"]);
        let spec = RecompilationSpecProvider::new(&layout)
            .provide([ChangeEvent::modified("src/p/Q.java")], &converter);
        assert!(!spec.is_full_rebuild());
        assert_eq!(locations(&spec), vec![PathBuf::from("out/p/Q.class")]);
    }

    #[test]
    fn events_are_consumed_in_a_single_pass() {
        let layout = layout();
        let m = history();
        let pulled = Cell::new(0);
        let events = [ChangeEvent::modified("A.src"), ChangeEvent::removed("B.src")]
            .into_iter()
            .inspect(|_| pulled.set(pulled.get() + 1));

        let spec = RecompilationSpecProvider::new(&layout)
            .provide(events, &MappingConverter::new(&m));

        assert_eq!(pulled.get(), 2);
        assert_eq!(spec.artifacts_to_delete.len(), 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn kind_strategy() -> impl Strategy<Value = ChangeKind> {
            prop_oneof![
                Just(ChangeKind::Added),
                Just(ChangeKind::Modified),
                Just(ChangeKind::Removed),
            ]
        }

        proptest! {
            #[test]
            fn invalidation_is_complete_and_minimal(
                changed in prop::collection::btree_map(0usize..8, kind_strategy(), 0..8),
            ) {
                let layout = layout();
                let mut m = ClassNameMapping::new();
                for i in 0..8 {
                    m.record(SourceUnit::new(format!("S{i}.src")), format!("S{i}"));
                    m.record(SourceUnit::new(format!("S{i}.src")), format!("S{i}$Inner"));
                }
                let events: Vec<ChangeEvent> = changed
                    .iter()
                    .map(|(i, kind)| ChangeEvent {
                        source: SourceUnit::new(format!("S{i}.src")),
                        kind: *kind,
                    })
                    .collect();

                let spec = RecompilationSpecProvider::new(&layout)
                    .provide(events, &MappingConverter::new(&m));

                for i in 0..8 {
                    let owned = [format!("S{i}"), format!("S{i}$Inner")];
                    let deleted = owned.iter().all(|name| {
                        spec.artifacts_to_delete.contains(&layout.artifact(name))
                    });
                    let untouched = owned.iter().all(|name| {
                        !spec.artifacts_to_delete.contains(&layout.artifact(name))
                    });
                    if changed.contains_key(&i) {
                        prop_assert!(deleted);
                    } else {
                        prop_assert!(untouched);
                    }
                }
                for source in &spec.sources_to_recompile {
                    for name in m.get(source).unwrap() {
                        prop_assert!(spec.artifacts_to_delete.contains(&layout.artifact(name)));
                    }
                }
            }
        }
    }
}
