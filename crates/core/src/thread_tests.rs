use super::*;
use crate::stack::Frame;

fn frame(pc: u64, physical_index: usize) -> Frame {
    Frame {
        pc,
        sp: 0,
        bp: None,
        symbol_context: None,
        symbol: Default::default(),
        is_inline: false,
        physical_index,
    }
}

#[test]
fn new_thread_starts_running_with_empty_stack() {
    let thread = Thread::new(Koid::new(1), "main".into());
    assert_eq!(*thread.state(), ThreadState::Running);
    assert!(thread.stack().is_empty());
}

#[test]
fn apply_stop_marks_thread_suspended() {
    let mut thread = Thread::new(Koid::new(1), "main".into());
    thread.apply_stop(Stack::new(vec![frame(0x1000, 0)], false));
    assert_eq!(*thread.state(), ThreadState::Suspended);
    assert_eq!(thread.stack().len(), 1);
}

#[test]
fn exception_kind_debug_oriented_classification() {
    assert!(ExceptionKind::SoftwareBreakpoint.is_debug_oriented());
    assert!(ExceptionKind::SingleStep.is_debug_oriented());
    assert!(!ExceptionKind::PageFault.is_debug_oriented());
    assert!(!ExceptionKind::General.is_debug_oriented());
}

#[test]
fn notify_stopped_reaches_observer() {
    struct Probe(Option<ExceptionKind>);
    impl ThreadObserver for Probe {
        fn on_thread_stopped(&mut self, _thread: Koid, info: &StopInfo) {
            self.0 = Some(info.exception);
        }
    }

    let mut thread = Thread::new(Koid::new(1), "main".into());
    thread.add_observer(Box::new(Probe(None)));
    let info = StopInfo {
        exception: ExceptionKind::SoftwareBreakpoint,
        details: ExceptionDetails::default(),
        matched_breakpoint_locations: vec![7],
    };
    thread.notify_stopped(&info);
}
