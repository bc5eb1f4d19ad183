//! Integration tests for the pipeline runner.
//!
//! Every component here appends to a shared event log so tests can assert
//! the exact interleaving of hooks, reads, writes and closes.

use rowflow_core::{
    init_logging, run, ClassRef, Component, ComponentDefinition, Context, Control, Destination,
    Hook, PipelineRunner, Row, RowStream, RunContext, RunnerError, RunnerOptions, Source,
    Transform,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Events = Arc<Mutex<Vec<String>>>;

fn record(events: &Events, entry: impl Into<String>) {
    events.lock().unwrap().push(entry.into());
}

fn snapshot(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

// =============================================================================
// Test components
// =============================================================================

/// Yields its rows, logging each pull.
struct ListSource {
    name: String,
    rows: Vec<Value>,
    events: Events,
}

impl Source for ListSource {
    fn rows(&mut self) -> RowStream<'_> {
        let events = self.events.clone();
        let name = self.name.clone();
        Box::new(self.rows.iter().map(move |row| {
            record(&events, format!("{} read {}", name, row));
            Ok::<_, anyhow::Error>(row.clone())
        }))
    }
}

/// Logs every write and the close under its name.
struct LogDestination {
    name: String,
    events: Events,
}

impl Destination for LogDestination {
    fn write(&mut self, row: &Row) -> anyhow::Result<()> {
        record(&self.events, format!("{} write {}", self.name, row));
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        record(&self.events, format!("{} close", self.name));
        Ok(())
    }
}

struct AddOne;

impl Transform for AddOne {
    fn process(&mut self, row: Row) -> anyhow::Result<Option<Row>> {
        Ok(row.as_i64().map(|n| json!(n + 1)))
    }
}

struct LogHook {
    label: String,
    events: Events,
}

impl Hook for LogHook {
    fn call(&mut self) -> anyhow::Result<()> {
        record(&self.events, self.label.clone());
        Ok(())
    }
}

/// Source class taking a name and an array of rows.
fn list_source(events: &Events, name: &str, rows: Vec<Value>) -> ComponentDefinition {
    let events = events.clone();
    let class = ClassRef::new("ListSource", move |args: &[Value]| {
        let name = args[0].as_str().unwrap_or("?").to_string();
        let rows = args[1].as_array().cloned().unwrap_or_default();
        Ok(Component::source(ListSource {
            name,
            rows,
            events: events.clone(),
        }))
    })
    .with_arity(2);
    ComponentDefinition::class(class, vec![json!(name), Value::Array(rows)])
}

fn log_destination(events: &Events, name: &str) -> ComponentDefinition {
    let events = events.clone();
    let class = ClassRef::new("LogDestination", move |args: &[Value]| {
        Ok(Component::destination(LogDestination {
            name: args[0].as_str().unwrap_or("?").to_string(),
            events: events.clone(),
        }))
    })
    .with_arity(1);
    ComponentDefinition::class(class, vec![json!(name)])
}

fn log_hook_class(events: &Events, label: &str) -> ComponentDefinition {
    let events = events.clone();
    let class = ClassRef::new("LogHook", move |args: &[Value]| {
        Ok(Component::hook(LogHook {
            label: args[0].as_str().unwrap_or("?").to_string(),
            events: events.clone(),
        }))
    })
    .with_arity(1);
    ComponentDefinition::class(class, vec![json!(label)])
}

fn log_hook_block(events: &Events, label: &'static str) -> ComponentDefinition {
    let events = events.clone();
    ComponentDefinition::hook_block(move || {
        record(&events, label);
        Ok(())
    })
}

fn add_one_class() -> ComponentDefinition {
    let class = ClassRef::new("AddOne", |_args: &[Value]| Ok(Component::transform(AddOne)));
    ComponentDefinition::class(class, vec![])
}

fn writes_of(events: &[String], destination: &str) -> Vec<String> {
    let prefix = format!("{} write ", destination);
    events
        .iter()
        .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

// =============================================================================
// Streaming
// =============================================================================

#[test]
fn test_fan_out_preserves_row_order() {
    init_logging();
    let events = Events::default();
    let control = Control::new()
        .source(list_source(&events, "s", vec![json!(1), json!(2)]))
        .transform(ComponentDefinition::row_block(|row| Ok(Some(row))))
        .destination(log_destination(&events, "d1"))
        .destination(log_destination(&events, "d2"));

    let report = run(&control).unwrap();
    let events = snapshot(&events);

    assert_eq!(writes_of(&events, "d1"), vec!["1", "2"]);
    assert_eq!(writes_of(&events, "d2"), vec!["1", "2"]);
    assert_eq!(
        events,
        vec![
            "s read 1",
            "d1 write 1",
            "d2 write 1",
            "s read 2",
            "d1 write 2",
            "d2 write 2",
            "d1 close",
            "d2 close",
        ]
    );
    assert_eq!(report.destinations.len(), 2);
    assert!(report.destinations.iter().all(|d| d.rows_written == 2 && d.closed));
}

#[test]
fn test_sources_drain_in_order() {
    let events = Events::default();
    let control = Control::new()
        .source(list_source(&events, "s1", vec![json!("a"), json!("b")]))
        .source(list_source(&events, "s2", vec![json!("c")]))
        .destination(log_destination(&events, "d"));

    let report = run(&control).unwrap();
    let events = snapshot(&events);

    assert_eq!(writes_of(&events, "d"), vec!["\"a\"", "\"b\"", "\"c\""]);
    let first_s2_read = events.iter().position(|e| e.starts_with("s2 read")).unwrap();
    let last_b_write = events.iter().position(|e| e == "d write \"b\"").unwrap();
    assert!(last_b_write < first_s2_read);

    let per_source: Vec<_> = report.sources.iter().map(|s| s.rows_read).collect();
    assert_eq!(per_source, vec![2, 1]);
}

#[test]
fn test_absent_row_short_circuits_the_chain() {
    let events = Events::default();
    let later_calls = Arc::new(Mutex::new(0));
    let counter = later_calls.clone();

    let control = Control::new()
        .source(list_source(&events, "s", vec![json!(5)]))
        .transform(ComponentDefinition::row_block(|row| {
            Ok(row.as_i64().map(|n| json!(n + 1)))
        }))
        .transform(ComponentDefinition::row_block(|_row| Ok(None)))
        .transform(ComponentDefinition::row_block(move |row| {
            *counter.lock().unwrap() += 1;
            Ok(Some(row))
        }))
        .destination(log_destination(&events, "d"));

    let report = run(&control).unwrap();
    let events = snapshot(&events);

    assert!(writes_of(&events, "d").is_empty());
    assert_eq!(*later_calls.lock().unwrap(), 0);
    assert_eq!(events.last().map(String::as_str), Some("d close"));
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(report.rows_delivered(), 0);
}

#[test]
fn test_dropping_one_source_still_delivers_the_next() {
    let events = Events::default();
    let control = Control::new()
        .source(list_source(&events, "s1", vec![json!("x"), json!("y")]))
        .source(list_source(&events, "s2", vec![json!(1)]))
        .transform(ComponentDefinition::row_block(|row| {
            Ok(if row.is_string() { None } else { Some(row) })
        }))
        .destination(log_destination(&events, "d"));

    run(&control).unwrap();
    let events = snapshot(&events);

    assert_eq!(writes_of(&events, "d"), vec!["1"]);
    assert_eq!(events.iter().filter(|e| *e == "d close").count(), 1);
}

#[test]
fn test_block_and_class_transforms_agree() {
    let input: Vec<Value> = (0..5).map(|n| json!(n)).collect();

    let class_events = Events::default();
    let class_control = Control::new()
        .source(list_source(&class_events, "s", input.clone()))
        .transform(add_one_class())
        .destination(log_destination(&class_events, "d"));

    let block_events = Events::default();
    let block_control = Control::new()
        .source(list_source(&block_events, "s", input))
        .transform(ComponentDefinition::row_block(|row| {
            Ok(row.as_i64().map(|n| json!(n + 1)))
        }))
        .destination(log_destination(&block_events, "d"));

    run(&class_control).unwrap();
    run(&block_control).unwrap();

    let from_class = writes_of(&snapshot(&class_events), "d");
    let from_block = writes_of(&snapshot(&block_events), "d");
    assert_eq!(from_class, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(from_class, from_block);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_zero_sources_still_closes_and_runs_hooks() {
    let events = Events::default();
    let control = Control::new()
        .pre_process(log_hook_block(&events, "pre"))
        .destination(log_destination(&events, "d1"))
        .destination(log_destination(&events, "d2"))
        .post_process(log_hook_block(&events, "post"));

    let report = run(&control).unwrap();

    assert_eq!(snapshot(&events), vec!["pre", "d1 close", "d2 close", "post"]);
    assert_eq!(report.rows_read(), 0);
    assert_eq!(report.pre_processes, 1);
    assert_eq!(report.post_processes, 1);
}

#[test]
fn test_hooks_bracket_the_stream() {
    let events = Events::default();
    let control = Control::new()
        .pre_process(log_hook_block(&events, "pre block"))
        .pre_process(log_hook_class(&events, "pre class"))
        .source(list_source(&events, "s", vec![json!(1)]))
        .destination(log_destination(&events, "d"))
        .post_process(log_hook_class(&events, "post class"))
        .post_process(log_hook_block(&events, "post block"));

    run(&control).unwrap();

    assert_eq!(
        snapshot(&events),
        vec![
            "pre block",
            "pre class",
            "s read 1",
            "d write 1",
            "d close",
            "post class",
            "post block",
        ]
    );
}

#[test]
fn test_post_processes_are_instantiated_after_close() {
    let events = Events::default();
    let hook_events = events.clone();
    let class = ClassRef::new("LateHook", move |_args: &[Value]| {
        record(&hook_events, "post instantiated");
        Ok(Component::hook(LogHook {
            label: "post called".to_string(),
            events: hook_events.clone(),
        }))
    });

    let control = Control::new()
        .destination(log_destination(&events, "d"))
        .post_process(ComponentDefinition::class(class, vec![]));

    run(&control).unwrap();

    assert_eq!(
        snapshot(&events),
        vec!["d close", "post instantiated", "post called"]
    );
}

#[test]
fn test_failing_pre_process_aborts_before_sources() {
    let events = Events::default();
    let control = Control::new()
        .pre_process(ComponentDefinition::hook_block(|| anyhow::bail!("lock is held")))
        .source(list_source(&events, "s", vec![json!(1)]))
        .destination(log_destination(&events, "d"))
        .post_process(log_hook_block(&events, "post"));

    let err = run(&control).unwrap_err();

    assert_eq!(err.to_string(), "lock is held");
    assert!(snapshot(&events).is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_constructor_error_is_wrapped() {
    let events = Events::default();
    let failing = ClassRef::new("BrokenSource", |_args: &[Value]| {
        anyhow::bail!("database unreachable")
    });
    let control = Control::new()
        .pre_process(log_hook_block(&events, "pre"))
        .source(ComponentDefinition::class(failing, vec![]))
        .destination(log_destination(&events, "d"));

    let err = run(&control).unwrap_err();

    match &err {
        RunnerError::ComponentInstantiation { context, class, message } => {
            assert_eq!(*context, Context::Source);
            assert_eq!(class, "BrokenSource");
            assert_eq!(message, "database unreachable");
        }
        other => panic!("expected instantiation error, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "INSTANTIATE/source BrokenSource instantiation failed (database unreachable)"
    );
    // Pre-processes already ran, nothing was closed.
    assert_eq!(snapshot(&events), vec!["pre"]);
}

#[test]
fn test_wrong_arity_is_an_instantiation_error() {
    let events = Events::default();
    let mut definition = log_destination(&events, "d");
    definition.args.push(json!("extra"));
    let control = Control::new().destination(definition);

    let err = run(&control).unwrap_err();
    assert!(matches!(err, RunnerError::ComponentInstantiation { .. }));
    assert!(err.to_string().contains("given 2, expected 1"));
}

#[test]
fn test_panicking_constructor_is_an_instantiation_error() {
    let events = Events::default();
    let unchecked = ClassRef::new("UncheckedDestination", |args: &[Value]| {
        let name = args[0].as_str().unwrap_or("?").to_string();
        Ok(Component::destination(LogDestination { name, events: Events::default() }))
    });
    let control = Control::new()
        .pre_process(log_hook_block(&events, "pre"))
        .destination(ComponentDefinition::class(unchecked, vec![]))
        .post_process(log_hook_block(&events, "post"));

    let err = run(&control).unwrap_err();

    match &err {
        RunnerError::ComponentInstantiation { context, class, message } => {
            assert_eq!(*context, Context::Destination);
            assert_eq!(class, "UncheckedDestination");
            assert!(message.contains("index out of bounds"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("INSTANTIATE/destination UncheckedDestination"));
    assert_eq!(snapshot(&events), vec!["pre"]);
}

#[test]
fn test_block_source_is_a_policy_violation() {
    let control = Control::new().source(ComponentDefinition::row_block(|row| Ok(Some(row))));

    let err = run(&control).unwrap_err();
    assert!(matches!(err, RunnerError::PolicyViolation { context: Context::Source, .. }));
    assert!(err.to_string().contains("source"));
}

#[test]
fn test_destination_write_error_propagates() {
    struct Rejecting;

    impl Destination for Rejecting {
        fn write(&mut self, _row: &Row) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    let events = Events::default();
    let rejecting = ClassRef::new("Rejecting", |_args: &[Value]| {
        Ok(Component::destination(Rejecting))
    });
    let control = Control::new()
        .source(list_source(&events, "s", vec![json!(1), json!(2)]))
        .destination(log_destination(&events, "d1"))
        .destination(ComponentDefinition::class(rejecting, vec![]))
        .post_process(log_hook_block(&events, "post"));

    let err = run(&control).unwrap_err();

    assert!(matches!(err, RunnerError::Component(_)));
    assert_eq!(err.to_string(), "disk full");
    // The first destination got the row; nothing after the failure ran.
    assert_eq!(snapshot(&events), vec!["s read 1", "d1 write 1"]);
}

#[test]
fn test_source_error_propagates() {
    struct Flaky;

    impl Source for Flaky {
        fn rows(&mut self) -> RowStream<'_> {
            Box::new(
                vec![Ok(json!(1)), Err(anyhow::anyhow!("socket closed"))].into_iter(),
            )
        }
    }

    let events = Events::default();
    let flaky = ClassRef::new("Flaky", |_args: &[Value]| Ok(Component::source(Flaky)));
    let control = Control::new()
        .source(ComponentDefinition::class(flaky, vec![]))
        .destination(log_destination(&events, "d"));

    let err = run(&control).unwrap_err();
    assert_eq!(err.to_string(), "socket closed");
    assert_eq!(snapshot(&events), vec!["d write 1"]);
}

// =============================================================================
// Runner options and validation
// =============================================================================

#[test]
fn test_report_carries_run_context() {
    let ctx = RunContext::new("nightly-orders");
    let runner = PipelineRunner::with_options(RunnerOptions { progress_every: 1 });
    let events = Events::default();
    let control = Control::new()
        .source(list_source(&events, "s", vec![json!(1), json!(2), json!(3)]))
        .destination(log_destination(&events, "d"));

    let report = runner.run(&control, &ctx).unwrap();

    assert_eq!(report.job, "nightly-orders");
    assert_eq!(report.run_id, ctx.run_id);
    assert_eq!(report.rows_read(), 3);
    assert_eq!(report.sources[0].component, "ListSource");
    assert_eq!(report.destinations[0].component, "LogDestination");
}

#[test]
fn test_validate_does_not_construct() {
    let constructed = Arc::new(Mutex::new(false));
    let flag = constructed.clone();
    let class = ClassRef::new("Tracked", move |_args: &[Value]| {
        *flag.lock().unwrap() = true;
        Ok(Component::transform(AddOne))
    });
    let control = Control::new().transform(ComponentDefinition::class(class, vec![]));

    PipelineRunner::new().validate(&control).unwrap();
    assert!(!*constructed.lock().unwrap());
}

#[test]
fn test_validate_rejects_row_block_as_hook() {
    let control =
        Control::new().post_process(ComponentDefinition::row_block(|row| Ok(Some(row))));

    let err = PipelineRunner::new().validate(&control).unwrap_err();
    assert!(matches!(
        err,
        RunnerError::CapabilityMismatch { context: Context::PostProcess, expected: "hook", .. }
    ));

    // Running it fails the same way.
    let err = run(&control).unwrap_err();
    assert!(matches!(err, RunnerError::CapabilityMismatch { .. }));
}
