//! Tests for multi-file scheduling, deferral and failure handling.

use anyhow::Result;
use microlector::io::MapResolver;
use microlector::testing::*;
use microlector::{
    Document, DocumentStore, ErrorKind, FieldSpec, FileSpec, FormatDefinition, IngestConfig,
    MemoryStore, ParentLink, Scheduler, SchedulerState, Step, Value,
};

fn household_paths(dir: &TempDirPath) -> Result<MapResolver> {
    let mut paths = MapResolver::new();
    paths.insert("hogares", write_data_file(dir, "hogares.txt", &household_lines())?);
    paths.insert("personas", write_data_file(dir, "personas.txt", &person_lines())?);
    Ok(paths)
}

fn child_first() -> FormatDefinition {
    let mut files = household_definition().into_files();
    files.reverse();
    FormatDefinition::new(files)
}

#[test]
fn test_loads_parent_then_nests_children() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();

    let report = Scheduler::new(&store, &paths).run(household_definition())?;

    assert_eq!(report.total_records(), 6);
    assert!(report.deferrals.is_empty());
    assert_eq!(store.list_collection_names()?, vec!["hogares"]);
    assert_eq!(store.count("hogares"), 3);

    let first = store.find("hogares", "1").unwrap();
    let mut person = Document::new();
    person.insert("ingresos", Value::Double(1234.56));
    assert_eq!(
        first.get("personas"),
        Some(&Value::Array(vec![Value::Document(person)]))
    );

    let second = store.find("hogares", "2").unwrap();
    assert_eq!(
        second.get("personas"),
        Some(&Value::Array(vec![Value::Document(Document::new())]))
    );
    Ok(())
}

#[test]
fn test_child_before_parent_is_deferred_once() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();

    let report = Scheduler::new(&store, &paths).run(child_first())?;

    assert_eq!(report.deferrals, vec!["personas"]);
    assert_eq!(report.position("hogares"), Some(0));
    assert_eq!(report.position("personas"), Some(1));
    assert_eq!(store.count("hogares"), 3);
    Ok(())
}

#[test]
fn test_step_by_step() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();
    let scheduler = Scheduler::new(&store, &paths);
    let mut state = SchedulerState::new(child_first());

    assert_eq!(
        scheduler.step(&mut state)?,
        Step::Deferred {
            file: "personas".into(),
            parent: "hogares".into()
        }
    );
    assert!(state.was_deferred("personas"));
    assert_eq!(
        state.pending().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        vec!["hogares", "personas"]
    );

    match scheduler.step(&mut state)? {
        Step::Completed(report) => assert_eq!((report.file.as_str(), report.records), ("hogares", 3)),
        other => panic!("expected hogares to load, got {other:?}"),
    }
    assert!(matches!(scheduler.step(&mut state)?, Step::Completed(_)));
    assert_eq!(scheduler.step(&mut state)?, Step::Finished);
    assert!(state.is_empty());
    Ok(())
}

#[test]
fn test_lone_child_is_incomplete() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();
    let only_child = FormatDefinition::new(vec![household_definition().file("personas").cloned().unwrap()]);

    let err = Scheduler::new(&store, &paths).run(only_child).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompleteDefinition);
    assert!(store.snapshot().is_empty());
    Ok(())
}

fn linked(id: &str, parent: &str) -> FileSpec {
    FileSpec {
        id: id.into(),
        record_length: 4,
        fields: vec![FieldSpec::new("numero", "integer", 4)],
        key: None,
        parent: Some(ParentLink {
            file_id: parent.into(),
            key: vec!["numero".into()],
        }),
    }
}

#[test]
fn test_circular_parents_are_incomplete() -> Result<()> {
    let store = MemoryStore::new();
    let paths = MapResolver::new();
    let cycle = FormatDefinition::new(vec![linked("a", "b"), linked("b", "a")]);

    let mut state = SchedulerState::new(cycle.clone());
    let scheduler = Scheduler::new(&store, &paths);
    assert!(matches!(scheduler.step(&mut state)?, Step::Deferred { .. }));
    assert!(matches!(scheduler.step(&mut state)?, Step::Deferred { .. }));

    let err = scheduler.run(cycle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompleteDefinition);
    assert!(store.snapshot().is_empty());
    Ok(())
}

#[test]
fn test_child_of_parent_loaded_in_earlier_run() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();
    let mut files = household_definition().into_files();

    let scheduler = Scheduler::new(&store, &paths);
    scheduler.run(FormatDefinition::new(vec![files.remove(0)]))?;
    let report = scheduler.run(FormatDefinition::new(files))?;

    assert!(report.deferrals.is_empty());
    assert!(store.find("hogares", "3").unwrap().contains("personas"));
    Ok(())
}

#[test]
fn test_length_mismatch_keeps_earlier_records() -> Result<()> {
    let dir = TempDirPath::new()?;
    let mut paths = MapResolver::new();
    paths.insert(
        "hogares",
        write_data_file(&dir, "hogares.txt", &["0001011", "0002022", "000302", "0004011"])?,
    );
    let store = MemoryStore::new();
    let roots = FormatDefinition::new(vec![household_definition().file("hogares").cloned().unwrap()]);

    let err = Scheduler::new(&store, &paths).run(roots).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LineLengthMismatch);
    assert_eq!(store.count("hogares"), 2);
    Ok(())
}

#[test]
fn test_rerun_duplicates_root_records() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();
    let roots = FormatDefinition::new(vec![household_definition().file("hogares").cloned().unwrap()]);

    let scheduler = Scheduler::new(&store, &paths);
    scheduler.run(roots.clone())?;
    scheduler.run(roots)?;
    assert_eq!(store.count("hogares"), 6);
    Ok(())
}

#[test]
fn test_store_failure_aborts_before_next_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = FailingStore::new(4);

    let err = Scheduler::new(&store, &paths)
        .run(household_definition())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreWrite);
    assert_eq!(store.attempts(), 5);
    assert_eq!(store.inner().count("hogares"), 3);
    assert!(store.inner().find("hogares", "1").unwrap().contains("personas"));
    assert!(!store.inner().find("hogares", "2").unwrap().contains("personas"));
    Ok(())
}

#[test]
fn test_missing_data_file_is_a_stream_error() -> Result<()> {
    let store = MemoryStore::new();
    let err = Scheduler::new(&store, &MapResolver::new())
        .run(household_definition())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Stream);
    Ok(())
}

#[test]
fn test_strict_mode_rejects_bad_definition() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let mut files = household_definition().into_files();
    files[0].record_length = 8;
    let store = MemoryStore::new();

    let err = Scheduler::new(&store, &paths)
        .with_config(IngestConfig::default().strict(true))
        .run(FormatDefinition::new(files))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDefinition);
    assert!(store.snapshot().is_empty());
    Ok(())
}

#[test]
fn test_small_chunks_load_the_same_records() -> Result<()> {
    let dir = TempDirPath::new()?;
    let paths = household_paths(&dir)?;
    let store = MemoryStore::new();

    let report = Scheduler::new(&store, &paths)
        .with_config(IngestConfig::default().with_chunk_size(3))
        .run(household_definition())?;
    assert_eq!(report.total_records(), 6);
    Ok(())
}
