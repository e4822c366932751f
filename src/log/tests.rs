// Tests for log ingestion, lookup and snapshot decoding

use super::*;
use crate::function_entry::{CurrentState, DeoptUpdate, FunctionTimelineEvent, FunctionUpdate};
use crate::position::{Address, Location};
use crate::v8::{CodeKind, DeoptimizeKind, FunctionState, IcState, IcType, SymbolKind};

fn update(ts: u64, state: FunctionState) -> FunctionUpdate {
    FunctionUpdate {
        timestamp: Timestamp(ts),
        state,
        code_kind: CodeKind::InterpretedFunction,
        size: 32,
        start_address: Address(0x100 * ts),
        func_start_address: Address(0x4000),
    }
}

fn ic_update(ts: u64, new_state: IcState, function: Option<FunctionId>) -> IcUpdate {
    IcUpdate {
        timestamp: Timestamp(ts),
        ic_type: IcType::StoreIC,
        key: "b".into(),
        old_state: IcState::Monomorphic,
        new_state,
        function,
    }
}

#[test]
fn test_builder_reuses_entries_by_position() {
    let mut builder = LogBuilder::new();
    let pos = FilePosition::new("/app.js", 1, 1);
    let first = builder.function("foo", SymbolKind::Function, pos.clone(), None);
    let second = builder.function("ignored", SymbolKind::Class, pos.clone(), None);
    assert_eq!(first, second);

    let log = builder.finish();
    assert_eq!(log.functions().len(), 1);
    assert_eq!(
        log.find_function_entry_by_file_position(&pos).unwrap().function_name(),
        "foo"
    );
}

#[test]
fn test_builder_rejects_out_of_order_update() {
    let mut builder = LogBuilder::new();
    let id = builder.function("foo", SymbolKind::Function, FilePosition::new("/a.js", 0, 0), None);
    builder
        .record_created(id, "Function", update(10, FunctionState::Compiled))
        .unwrap();
    let err = builder
        .record_updated(id, "Function", update(5, FunctionState::Optimized))
        .unwrap_err();
    assert!(matches!(
        err,
        LogError::OutOfOrder {
            previous: Timestamp(10),
            timestamp: Timestamp(5),
            ..
        }
    ));

    // The rejected record left the entry untouched
    let log = builder.finish();
    assert_eq!(log.function(id).unwrap().updates().len(), 1);
}

#[test]
fn test_builder_accepts_equal_timestamps() {
    let mut builder = LogBuilder::new();
    let id = builder.function("foo", SymbolKind::Function, FilePosition::new("/a.js", 0, 0), None);
    builder
        .record_created(id, "Function", update(3, FunctionState::Compiled))
        .unwrap();
    builder
        .record_deopt(
            id,
            DeoptUpdate {
                timestamp: Timestamp(3),
                bailout_type: DeoptimizeKind::Soft,
                reason: "insufficient type feedback".into(),
                location: None,
            },
        )
        .unwrap();
    let log = builder.finish();
    assert_eq!(log.function(id).unwrap().timeline().len(), 2);
}

#[test]
fn test_builder_rejects_foreign_function_handle() {
    let mut other = LogBuilder::new();
    other.function("a", SymbolKind::Function, FilePosition::new("/a.js", 0, 0), None);
    let foreign = other.function("b", SymbolKind::Function, FilePosition::new("/a.js", 5, 0), None);

    let mut builder = LogBuilder::new();
    let err = builder
        .record_ic(FilePosition::new("/a.js", 2, 2), None, ic_update(1, IcState::Megamorphic, Some(foreign)))
        .unwrap_err();
    assert!(matches!(err, LogError::UnknownFunction(id) if id == foreign));

    // Nothing was created for the rejected transition
    let log = builder.finish();
    assert!(log.is_empty());
}

#[test]
fn test_ic_update_appends_function_timeline_event() {
    let mut builder = LogBuilder::new();
    let func = builder.function("run", SymbolKind::Function, FilePosition::new("/a.js", 0, 0), None);
    builder
        .record_created(func, "Function", update(1, FunctionState::Optimizable))
        .unwrap();
    let site = FilePosition::new("/a.js", 4, 8);
    let ic = builder
        .record_ic(site.clone(), None, ic_update(2, IcState::Polymorphic, Some(func)))
        .unwrap();
    let log = builder.finish();

    let entry = log.function(func).unwrap();
    let FunctionTimelineEvent::Ic { timestamp, update } = entry.timeline()[1] else {
        panic!("expected IC event, got {:?}", entry.timeline()[1]);
    };
    assert_eq!(timestamp, Timestamp(2));
    assert_eq!(update.ic, ic);
    let (ic_entry, ic_update) = log.ic_update(update).unwrap();
    assert_eq!(ic_entry.file_position(), &site);
    assert_eq!(ic_update.new_state, IcState::Polymorphic);
}

#[test]
fn test_ic_update_rejected_when_older_than_function_timeline() {
    let mut builder = LogBuilder::new();
    let func = builder.function("run", SymbolKind::Function, FilePosition::new("/a.js", 0, 0), None);
    builder
        .record_created(func, "Function", update(9, FunctionState::Compiled))
        .unwrap();
    let err = builder
        .record_ic(FilePosition::new("/a.js", 1, 0), None, ic_update(4, IcState::Monomorphic, Some(func)))
        .unwrap_err();
    assert!(matches!(err, LogError::OutOfOrder { .. }));
}

#[test]
fn test_lookup_miss_is_none() {
    let log = LogBuilder::new().finish();
    assert!(log
        .find_function_entry_by_file_position(&FilePosition::new("/nowhere.js", 0, 0))
        .is_none());
    assert!(log.find_function_entry_by_uri("file:///nowhere.js").is_none());
}

#[test]
fn test_functions_in_file() {
    let mut builder = LogBuilder::new();
    builder.function("a", SymbolKind::Function, FilePosition::new("/one.js", 0, 0), None);
    builder.function("b", SymbolKind::Function, FilePosition::new("/two.js", 0, 0), None);
    builder.function("c", SymbolKind::Function, FilePosition::new("/one.js", 8, 0), None);
    let log = builder.finish();
    let names: Vec<_> = log
        .functions_in_file("/one.js")
        .map(|f| f.function_name())
        .collect();
    assert_eq!(names, ["a", "c"]);
}

#[test]
fn test_owns_function_rejects_clones() {
    let mut builder = LogBuilder::new();
    let id = builder.function("a", SymbolKind::Function, FilePosition::new("/one.js", 0, 0), None);
    let log = builder.finish();
    let owned = log.function(id).unwrap();
    let copy = owned.clone();
    assert!(log.owns_function(owned));
    assert!(!log.owns_function(&copy));
}

const SNAPSHOT: &str = r#"{
  "functions": [
    {
      "name": "foo",
      "file_position": { "file": "/app.js", "line": 0, "column": 0 },
      "reference_location": {
        "file": "/src/app.ts",
        "range": { "start": { "line": 2, "column": 0 }, "end": { "line": 9, "column": 1 } }
      },
      "events": [
        { "event": "created", "timestamp": 1, "state": "compiled", "code_kind": "INTERPRETED_FUNCTION" },
        { "event": "updated", "timestamp": 2, "state": "optimized", "code_kind": "TURBOFAN" },
        { "event": "deopt", "timestamp": 3, "bailout_type": "eager", "reason": "wrong map" },
        { "event": "updated", "timestamp": 4, "state": "optimized", "code_kind": "TURBOFAN" }
      ]
    },
    {
      "name": "bar",
      "symbol_kind": "method",
      "file_position": { "file": "/app.js", "line": 20, "column": 2 },
      "events": [
        { "event": "created", "timestamp": 1, "state": "compiled", "code_kind": "INTERPRETED_FUNCTION" },
        { "event": "sfi-moved", "timestamp": 7, "from_address": 16, "to_address": 32 }
      ]
    }
  ],
  "ics": [
    {
      "file_position": { "file": "/app.js", "line": 5, "column": 10 },
      "updates": [
        { "timestamp": 2, "ic_type": "LoadIC", "key": "y", "old_state": "uninitialized", "new_state": "premonomorphic", "function": { "file": "/app.js", "line": 0, "column": 0 } },
        { "timestamp": 3, "ic_type": "LoadIC", "key": "y", "old_state": "premonomorphic", "new_state": "megamorphic", "function": { "file": "/app.js", "line": 0, "column": 0 } }
      ]
    },
    {
      "file_position": { "file": "/app.js", "line": 30, "column": 0 },
      "updates": []
    }
  ]
}"#;

#[test]
fn test_snapshot_ingestion() {
    let log = Log::from_json_str(SNAPSHOT).unwrap();
    assert_eq!(log.functions().len(), 2);
    assert_eq!(log.ics().len(), 2);

    let foo = log
        .find_function_entry_by_file_position(&FilePosition::new("/app.js", 0, 0))
        .unwrap();
    assert_eq!(foo.label(), "foo (3)");
    assert_eq!(foo.current_state(), CurrentState::Conflict);

    // IC events are interleaved by timestamp with the function's own events
    let kinds: Vec<_> = foo.timeline().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, ["created", "updated", "ic", "deopt", "ic", "updated"]);

    let bar = log
        .find_function_entry_by_file_position(&FilePosition::new("/app.js", 20, 2))
        .unwrap();
    assert_eq!(bar.symbol_kind(), SymbolKind::Method);
    assert_eq!(bar.current_state(), CurrentState::State(FunctionState::Compiled));

    let ic = log
        .find_ic_entry_by_file_position(&FilePosition::new("/app.js", 5, 10))
        .unwrap();
    assert_eq!(ic.worst_state(), Some(IcState::Megamorphic));
    assert_eq!(ic.hit_count(), 2);
    let reference = log.function_reference_for_ic(ic).unwrap();
    assert_eq!(reference.function, foo.id());
    assert_eq!(
        reference.location,
        Location {
            file: "/src/app.ts".into(),
            range: crate::position::Range {
                start: crate::position::Position { line: 2, column: 0 },
                end: crate::position::Position { line: 9, column: 1 },
            },
        }
    );

    let empty = log
        .find_ic_entry_by_file_position(&FilePosition::new("/app.js", 30, 0))
        .unwrap();
    assert!(empty.worst_update().is_none());
    assert!(log.function_reference_for_ic(empty).is_none());
}

#[test]
fn test_snapshot_rejects_unknown_event_kind() {
    let json = r#"{
      "functions": [{
        "name": "foo",
        "file_position": { "file": "/a.js", "line": 0, "column": 0 },
        "events": [{ "event": "teleported", "timestamp": 1 }]
      }]
    }"#;
    let err = Log::from_json_str(json).unwrap_err();
    assert!(matches!(err, LogError::Snapshot(_)));
}

#[test]
fn test_snapshot_rejects_unresolved_function() {
    let json = r#"{
      "ics": [{
        "file_position": { "file": "/a.js", "line": 1, "column": 1 },
        "updates": [{
          "timestamp": 1, "ic_type": "StoreIC", "old_state": "monomorphic", "new_state": "polymorphic",
          "function": { "file": "/gone.js", "line": 0, "column": 0 }
        }]
      }]
    }"#;
    let err = Log::from_json_str(json).unwrap_err();
    assert!(matches!(err, LogError::UnresolvedFunction { .. }));
    assert!(err.to_string().contains("/gone.js:1:1"));
}

#[test]
fn test_snapshot_rejects_unsorted_records() {
    let json = r#"{
      "functions": [{
        "name": "foo",
        "file_position": { "file": "/a.js", "line": 0, "column": 0 },
        "events": [
          { "event": "deleted", "timestamp": 9, "start_address": 1 },
          { "event": "moved", "timestamp": 2, "from_address": 1, "to_address": 2 }
        ]
      }]
    }"#;
    let err = Log::from_json_str(json).unwrap_err();
    assert!(matches!(err, LogError::OutOfOrder { .. }));
}

#[test]
fn test_snapshot_rejects_duplicate_positions() {
    let json = r#"{
      "functions": [
        { "name": "a", "file_position": { "file": "/a.js", "line": 0, "column": 0 } },
        { "name": "b", "file_position": { "file": "/a.js", "line": 0, "column": 0 } }
      ]
    }"#;
    let err = Log::from_json_str(json).unwrap_err();
    assert!(matches!(err, LogError::DuplicateEntry { kind: "function", .. }));
}

#[test]
fn test_snapshot_round_trips_through_serde() {
    let snapshot: LogSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    let log = Log::from_json_str(&json).unwrap();
    assert_eq!(log.functions().len(), 2);
    assert_eq!(log.ics().len(), 2);
}

#[test]
fn test_load_snapshot_reports_path() {
    let err = load_snapshot("/definitely/not/here.json").unwrap_err();
    assert!(format!("{:#}", err).contains("/definitely/not/here.json"));
}
