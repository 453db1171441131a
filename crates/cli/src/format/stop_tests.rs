use super::*;
use dbg_core::id::{BreakpointId, TargetId, ThreadId};
use dbg_core::stack::{Frame, FrameSymbol};

fn frame_at(pc: u64, name: &str) -> Frame {
    Frame {
        pc,
        sp: 0x7000,
        bp: None,
        symbol_context: None,
        symbol: FrameSymbol { function_name: Some(name.into()), file: Some("a.cc".into()), line: Some(3) },
        is_inline: false,
        physical_index: 0,
    }
}

#[test]
fn describe_hit_breakpoints_joins_ids() {
    let ids = vec![BreakpointId::from(1), BreakpointId::from(2)];
    assert_eq!(describe_hit_breakpoints(&ids).as_deref(), Some("on bp 1,2"));
}

#[test]
fn describe_hit_breakpoints_is_none_when_empty() {
    assert_eq!(describe_hit_breakpoints(&[]), None);
}

#[test]
fn format_stop_elides_single_process_and_thread() {
    let frame = frame_at(0x1000, "main");
    let ctx = StopContext {
        target_id: TargetId::from(1),
        thread_id: ThreadId::from(1),
        total_targets: 1,
        total_threads_in_process: 1,
        exception: ExceptionKind::SoftwareBreakpoint,
        details: &ExceptionDetails::default(),
        frame0: Some(&frame),
        hit_breakpoints: &[],
    };
    let text = format_stop(&ctx).as_plain_string();
    assert!(!text.contains("Process"));
    assert!(!text.contains("Thread"));
    assert!(text.contains("stopped"));
    assert!(text.contains("main"));
}

#[test]
fn format_stop_names_process_and_thread_when_ambiguous() {
    let frame = frame_at(0x1000, "main");
    let ctx = StopContext {
        target_id: TargetId::from(2),
        thread_id: ThreadId::from(3),
        total_targets: 2,
        total_threads_in_process: 2,
        exception: ExceptionKind::SingleStep,
        details: &ExceptionDetails::default(),
        frame0: Some(&frame),
        hit_breakpoints: &[],
    };
    let text = format_stop(&ctx).as_plain_string();
    assert!(text.contains("Process 2"));
    assert!(text.contains("Thread 3"));
}

#[test]
fn format_stop_appends_hit_breakpoint_suffix() {
    let frame = frame_at(0x1000, "main");
    let ids = vec![BreakpointId::from(4)];
    let ctx = StopContext {
        target_id: TargetId::from(1),
        thread_id: ThreadId::from(1),
        total_targets: 1,
        total_threads_in_process: 1,
        exception: ExceptionKind::SoftwareBreakpoint,
        details: &ExceptionDetails::default(),
        frame0: Some(&frame),
        hit_breakpoints: &ids,
    };
    let text = format_stop(&ctx).as_plain_string();
    assert!(text.contains("on bp 4"));
}

#[test]
fn format_stop_uses_multiline_record_for_non_debug_exceptions() {
    let frame = frame_at(0x2000, "crash_here");
    let details = ExceptionDetails { faulting_address: Some(0xdead), description: Some("page fault".into()) };
    let ctx = StopContext {
        target_id: TargetId::from(1),
        thread_id: ThreadId::from(1),
        total_targets: 1,
        total_threads_in_process: 1,
        exception: ExceptionKind::PageFault,
        details: &details,
        frame0: Some(&frame),
        hit_breakpoints: &[],
    };
    let text = format_stop(&ctx).as_plain_string();
    assert!(text.contains("Exception: PageFault"));
    assert!(text.contains("0xdead"));
    assert!(text.contains("page fault"));
    assert!(text.contains("crash_here"));
}
