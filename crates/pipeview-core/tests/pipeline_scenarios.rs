//! End-to-end scenarios through the public pipeline API.

use pipeview_core::{
    enumerate_paths, parse_log, render_trace, Disassembler, EventGraph, EventType, KanataCommand,
    NodeKey, Schema, SchemaDocument, Terminal, Timeline, TraceConfig, TraceError,
};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// Leaves every token untouched.
struct Echo;

impl Disassembler for Echo {
    fn disassemble(&mut self, request: &str) -> Result<String, TraceError> {
        Ok(format!("{request}\n"))
    }
}

fn schema() -> Schema {
    Schema::try_from(SchemaDocument {
        event_names: vec![
            "fetch".to_string(),
            "rob_alloc".to_string(),
            "exec".to_string(),
            "retire".to_string(),
        ],
        start_stages: vec!["fetch".to_string()],
        split_stages: vec!["rob_alloc".to_string()],
        end_stages: vec!["retire".to_string()],
        event_types: vec![
            EventType::Pc,
            EventType::InstBytes,
            EventType::from("rob_id"),
            EventType::from("rob_id"),
        ],
    })
    .expect("schema is well formed")
}

fn render(log: &str, verbose: bool) -> String {
    let mut out = Vec::new();
    render_trace(
        parse_log(log),
        &schema(),
        &TraceConfig::default().with_verbose(verbose),
        &mut Echo,
        &mut out,
    )
    .expect("trace renders");
    String::from_utf8(out).expect("trace is utf-8")
}

#[test]
fn reused_counter_lifecycle() {
    let log = "fetch 1 0 0 8000\nretire 1 1 2 r\n";
    let decorated = pipeview_core::decorate(
        parse_log(log).records,
        &schema(),
        &TraceConfig::default(),
        &mut Echo,
    )
    .expect("decorates");
    let graph = EventGraph::build(decorated);

    let first = graph.index_of(NodeKey::new(1, 0)).expect("first occurrence");
    let second = graph.index_of(NodeKey::new(1, 1)).expect("second occurrence");
    assert_eq!(graph.children(first), &[second]);

    let paths = enumerate_paths(&graph, &schema());
    assert_eq!(paths.len(), 1);
    let cycles: Vec<_> = paths[0]
        .steps()
        .iter()
        .map(|s| (s.stage().to_string(), s.cycle()))
        .collect();
    assert_eq!(
        cycles,
        vec![
            ("fetch".to_string(), 0),
            ("retire".to_string(), 2),
            ("KONNATA_RET".to_string(), 3),
        ]
    );

    let commands = Timeline::merge(paths, false)
        .emit(&schema())
        .expect("emits");
    assert!(commands.contains(&KanataCommand::Start { id: 0, cycle: 0 }));
    assert!(commands.contains(&KanataCommand::Stage {
        id: 0,
        stage: "retire".to_string()
    }));
    assert_eq!(
        commands.last(),
        Some(&KanataCommand::Retire {
            id: 0,
            squashed: false
        })
    );
}

#[test]
fn fork_produces_retired_and_flushed_lifecycles() {
    let log = "\
fetch 1 0 0 8000
rob_alloc 2 1 1 00b3
exec 3 1 1 9
retire 2 2 3 9
";
    let graph = EventGraph::build(
        pipeview_core::decorate(
            parse_log(log).records,
            &schema(),
            &TraceConfig::default(),
            &mut Echo,
        )
        .expect("decorates"),
    );
    let paths = enumerate_paths(&graph, &schema());

    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].steps()[0], paths[1].steps()[0]);
    assert_eq!(paths[0].terminal(), Terminal::Retire);
    assert_eq!(paths[1].terminal(), Terminal::Flush);

    let quiet = Timeline::merge(paths.clone(), false);
    assert_eq!(quiet.paths(), &paths[..1]);
}

#[test]
fn full_trace_text_matches_kanata_layout() {
    let log = "\
fetch 1 0 0 8000
rob_alloc 2 1 1 00b3
exec 3 1 1 9
retire 2 2 3 9
";
    assert_eq!(
        render(log, true),
        "Kanata\t0004\n\
         C=\t0\n\
         I\t0\t0\t0\n\
         S\t0\t0\tfetch\n\
         L\t0\t0\tPC:8000 \n\
         I\t1\t0\t0\n\
         S\t1\t0\tfetch\n\
         L\t1\t0\tPC:8000 \n\
         C\t1\n\
         S\t0\t0\trob_alloc\n\
         L\t0\t0\tDASM(00b3)\\n\n\
         S\t1\t0\texec\n\
         L\t1\t1\t\\n9 \n\
         L\t1\t2\t\\n9 \n\
         C\t1\n\
         R\t1\t1\t1\n\
         C\t1\n\
         S\t0\t0\tretire\n\
         L\t0\t1\t\\n9 \n\
         L\t0\t2\t\\n9 \n\
         C\t1\n\
         R\t0\t0\t0\n"
    );
}

#[rstest]
#[case::quiet(false)]
#[case::verbose(true)]
fn quiet_trace_never_mentions_squashed_lifecycles(#[case] verbose: bool) {
    let log = "\
fetch 1 0 0 8000
exec 3 1 1 9
fetch 4 0 2 8004
retire 4 4 5 9
";
    let text = render(log, verbose);
    let retires: Vec<_> = text.lines().filter(|line| line.starts_with("R\t")).collect();
    assert_eq!(retires.iter().any(|line| line.ends_with("\t1")), verbose);
    assert_eq!(retires.len(), if verbose { 2 } else { 1 });
}

#[test]
fn unknown_stage_aborts_before_writing() {
    let mut out = Vec::new();
    let error = render_trace(
        parse_log("writeback 1 0 0 x\n"),
        &schema(),
        &TraceConfig::default(),
        &mut Echo,
        &mut out,
    )
    .expect_err("stage missing from schema");

    assert!(matches!(error, TraceError::UnknownEventType { .. }));
    assert!(out.is_empty());
}
