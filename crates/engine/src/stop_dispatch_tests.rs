use super::*;
use dbg_core::breakpoint::{BreakpointLocation, BreakpointSettings, InputLocation};
use dbg_core::process::Process;
use dbg_core::protocol::{Reply, ReplyPayload, WireFrame};
use dbg_core::symbol_service::test_support::FakeSymbolService;
use dbg_core::target::{StartOrigin, TargetState};
use dbg_core::thread::Thread;
use dbg_core::transport::test_support::ScriptedTransport;

const PROCESS: Koid = Koid::new(5);
const THREAD: Koid = Koid::new(9);

async fn dispatch_with(
    replies: Vec<Reply>,
    symbols: FakeSymbolService,
) -> (StopDispatch, Arc<ScriptedTransport>, Arc<Mutex<System>>) {
    let transport = Arc::new(ScriptedTransport::new(replies));
    let system = Arc::new(Mutex::new(System::default()));
    {
        let mut sys = system.lock().await;
        let target_id = sys.create_target();
        let target = sys.target_mut(target_id).unwrap();
        target.begin_pending(TargetState::Attaching).unwrap();
        let mut process = Process::new(PROCESS, "a.out".into(), StartOrigin::Attach);
        process.did_create_thread(Thread::new(THREAD, "initial-thread".into()));
        target.commit_process(process);
    }
    let breakpoints = Arc::new(BreakpointEngine::new(transport.clone(), system.clone()));
    let dispatch = StopDispatch::new(system.clone(), transport.clone(), breakpoints, Arc::new(symbols));
    (dispatch, transport, system)
}

#[tokio::test]
async fn stop_with_no_controller_and_no_breakpoints_reports_immediately() {
    let (dispatch, transport, _system) = dispatch_with(vec![], FakeSymbolService::default()).await;

    let stop = dispatch
        .on_thread_stopped(
            PROCESS,
            THREAD,
            ExceptionKind::SoftwareBreakpoint,
            None,
            vec![WireFrame { pc: 0x1000, sp: 0x7000, bp: None }],
            true,
            vec![],
        )
        .await
        .unwrap();

    assert!(stop.is_some());
    // Nothing should have been resumed: no controller was active and no
    // breakpoint matched, so there's nothing to silently continue past.
    assert!(transport.sent_requests().is_empty());
}

#[tokio::test]
async fn stop_range_controller_resumes_silently_while_in_range() {
    let (dispatch, transport, _system) = dispatch_with(vec![], FakeSymbolService::default()).await;

    dispatch
        .push_controller(
            PROCESS,
            THREAD,
            Box::new(crate::controller::StepRangeController::new(0x1000, 0x1010)),
        )
        .await
        .unwrap();

    let stop = dispatch
        .on_thread_stopped(
            PROCESS,
            THREAD,
            ExceptionKind::SingleStep,
            None,
            vec![WireFrame { pc: 0x1004, sp: 0x7000, bp: None }],
            true,
            vec![],
        )
        .await
        .unwrap();

    assert!(stop.is_none(), "still inside the range, should continue silently");
    let sent = transport.sent_requests();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Request::Resume { mode: ResumeMode::StepRange { .. }, .. }));
}

#[tokio::test]
async fn stop_range_controller_reports_once_out_of_range() {
    let (dispatch, transport, _system) = dispatch_with(vec![], FakeSymbolService::default()).await;

    dispatch
        .push_controller(
            PROCESS,
            THREAD,
            Box::new(crate::controller::StepRangeController::new(0x1000, 0x1010)),
        )
        .await
        .unwrap();

    let stop = dispatch
        .on_thread_stopped(
            PROCESS,
            THREAD,
            ExceptionKind::SingleStep,
            None,
            vec![WireFrame { pc: 0x1010, sp: 0x7000, bp: None }],
            true,
            vec![],
        )
        .await
        .unwrap();

    assert!(stop.is_some());
    assert!(transport.sent_requests().is_empty());
}

#[tokio::test]
async fn a_missed_hit_mult_resumes_silently_even_with_matched_breakpoint_ids() {
    let (dispatch, transport, system) =
        dispatch_with(vec![Reply::Ok(ReplyPayload::Empty)], FakeSymbolService::default()).await;

    let bp_id = {
        let mut sys = system.lock().await;
        let id = sys
            .create_breakpoint(
                BreakpointSettings {
                    locations: vec![InputLocation::Address(0x2000)],
                    hit_mult: 2,
                    ..Default::default()
                },
                false,
            )
            .unwrap();
        sys.breakpoint_mut(id)
            .unwrap()
            .set_locations(vec![BreakpointLocation::new(PROCESS, 0x2000)]);
        id
    };

    let stop = dispatch
        .on_thread_stopped(
            PROCESS,
            THREAD,
            ExceptionKind::SoftwareBreakpoint,
            None,
            vec![WireFrame { pc: 0x2000, sp: 0x7000, bp: None }],
            true,
            vec![bp_id.get()],
        )
        .await
        .unwrap();

    assert!(stop.is_none(), "first of two required hits should resume silently");
    assert_eq!(system.lock().await.breakpoint(bp_id).unwrap().hit_count(), 1);
    let sent = transport.sent_requests();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Request::Resume { mode: ResumeMode::Continue, .. }));
}

#[tokio::test]
async fn cancel_all_drops_the_controller_stack() {
    let (dispatch, _transport, _system) = dispatch_with(vec![], FakeSymbolService::default()).await;

    dispatch
        .push_controller(
            PROCESS,
            THREAD,
            Box::new(crate::controller::StepRangeController::new(0x1000, 0x1010)),
        )
        .await
        .unwrap();
    dispatch.cancel_all(THREAD).await;

    // With the stack cleared, a fresh stop with no breakpoints reports
    // immediately rather than silently continuing.
    let stop = dispatch
        .on_thread_stopped(
            PROCESS,
            THREAD,
            ExceptionKind::SingleStep,
            None,
            vec![WireFrame { pc: 0x1004, sp: 0x7000, bp: None }],
            true,
            vec![],
        )
        .await
        .unwrap();
    assert!(stop.is_some());
}
