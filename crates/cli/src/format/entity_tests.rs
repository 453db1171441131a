use super::*;
use dbg_core::breakpoint::{Breakpoint, BreakpointSettings};
use dbg_core::id::BreakpointId;
use dbg_core::stack::{Frame, FrameSymbol, Stack};
use dbg_core::thread::{Thread, ThreadState};

fn physical_frame(pc: u64) -> Frame {
    Frame {
        pc,
        sp: 0x7000,
        bp: None,
        symbol_context: None,
        symbol: FrameSymbol::default(),
        is_inline: false,
        physical_index: 0,
    }
}

#[test]
fn render_location_covers_every_variant() {
    assert_eq!(render_location(&InputLocation::Symbol("main".into())), "main");
    assert_eq!(
        render_location(&InputLocation::FileLine { file: "a.cc".into(), line: 10 }),
        "a.cc:10"
    );
    assert_eq!(render_location(&InputLocation::Line(5)), "5");
    assert_eq!(render_location(&InputLocation::Address(0x1000)), "0x1000");
}

#[test]
fn render_frame_falls_back_to_address_without_symbols() {
    let frame = physical_frame(0x4000);
    let out = render_frame(0, &frame);
    assert!(out.as_plain_string().contains("0x0000000000004000"));
}

#[test]
fn render_frame_marks_inline_frames() {
    let mut frame = physical_frame(0x4000);
    frame.is_inline = true;
    frame.symbol = FrameSymbol { function_name: Some("Foo".into()), file: Some("a.cc".into()), line: Some(9) };
    let out = render_frame(1, &frame);
    let text = out.as_plain_string();
    assert!(text.contains("inline"));
    assert!(text.contains("Foo"));
    assert!(text.contains("a.cc:9"));
}

#[test]
fn render_stack_notes_partial_stacks() {
    let stack = Stack::new(vec![physical_frame(0x1000)], false);
    let out = render_stack(&stack);
    assert!(out.as_plain_string().contains("more frames available"));
}

#[test]
fn render_thread_summary_colors_by_state() {
    let mut thread = Thread::new(dbg_core::id::Koid::new(1), "worker".into());
    thread.set_state(ThreadState::Blocked("mutex".into()));
    let out = render_thread_summary(3, &thread);
    assert!(out.as_plain_string().contains("worker"));
    assert!(out.spans().iter().any(|s| s.syntax == Syntax::Warning));
}

#[test]
fn render_target_shows_process_name_and_koid_when_running() {
    use dbg_core::process::Process;
    use dbg_core::target::{StartOrigin, Target};

    let mut target = Target::new(dbg_core::id::TargetId::from(1));
    target.commit_process(Process::new(dbg_core::id::Koid::new(42), "my-app".into(), StartOrigin::Launch));
    let out = render_target(1, &target);
    let text = out.as_plain_string();
    assert!(text.contains("my-app"));
    assert!(text.contains("koid=42"));
}

#[test]
fn render_target_shows_none_state_for_empty_target() {
    let target = dbg_core::target::Target::new(dbg_core::id::TargetId::from(2));
    let out = render_target(2, &target);
    assert!(out.as_plain_string().contains("none"));
}

#[test]
fn render_filter_shows_pattern_and_job_scope() {
    use dbg_core::filter::{Filter, FilterPattern};

    let filter = Filter::new(
        dbg_core::id::FilterId::from(1),
        FilterPattern::Substring("zxdb".into()),
        Some(dbg_core::id::JobContextId::from(3)),
    );
    let out = render_filter(1, &filter);
    let text = out.as_plain_string();
    assert!(text.contains("zxdb"));
    assert!(text.contains("job 3"));
}

#[test]
fn render_breakpoint_marks_pending() {
    let bp = Breakpoint::new(
        BreakpointId::from(1),
        BreakpointSettings { locations: vec![InputLocation::Symbol("main".into())], ..Default::default() },
        false,
    );
    let out = render_breakpoint(&bp);
    assert!(out.as_plain_string().contains("(pending)"));
}
