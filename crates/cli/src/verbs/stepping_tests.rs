use super::*;
use dbg_core::id::{TargetId, ThreadId};
use dbg_core::process::Process;
use dbg_core::protocol::ResumeMode;
use dbg_core::stack::{Frame, FrameSymbol, Stack};
use dbg_core::symbol_service::{test_support::FakeSymbolService, CallSite};
use dbg_core::target::{StartOrigin, TargetState};
use dbg_core::transport::test_support::ScriptedTransport;
use std::sync::Arc;

fn make_frame(pc: u64, sp: u64) -> Frame {
    Frame { pc, sp, bp: None, symbol_context: None, symbol: FrameSymbol::default(), is_inline: false, physical_index: 0 }
}

async fn context_with_stopped_thread(
    symbols: FakeSymbolService,
    pc: u64,
    sp: u64,
) -> (ConsoleContext, Arc<ScriptedTransport>, TargetId, ThreadId) {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let symbols = Arc::new(symbols);
    let mut ctx = ConsoleContext::new(transport.clone(), symbols);

    let target_id = {
        let mut system = ctx.system().lock().await;
        let target_id = system.create_target();
        let target = system.target_mut(target_id).unwrap();
        target.begin_pending(TargetState::Attaching).unwrap();
        let proc = Process::new(Koid::new(1), "a.out".into(), StartOrigin::Attach);
        target.commit_process(proc);
        target_id
    };
    ctx.handle_notification(dbg_core::protocol::Notification::ThreadStarting {
        process: Koid::new(1),
        thread: Koid::new(9),
        name: "main".into(),
    })
    .await
    .unwrap();
    let thread_id = ctx.thread_id_for_koid(target_id, Koid::new(9)).unwrap();
    {
        let mut system = ctx.system().lock().await;
        let target = system.target_mut(target_id).unwrap();
        let proc = target.process_mut().unwrap();
        proc.thread_mut(Koid::new(9)).unwrap().apply_stop(Stack::new(vec![make_frame(pc, sp)], true));
    }
    ctx.set_active_target(target_id);
    ctx.set_active_thread(target_id, thread_id);
    (ctx, transport, target_id, thread_id)
}

fn bound_for(target: TargetId, thread: ThreadId, args: Vec<&str>) -> BoundCommand {
    BoundCommand {
        target,
        thread,
        frame: 0,
        breakpoint: dbg_core::id::BreakpointId::NONE,
        filter: dbg_core::id::FilterId::NONE,
        job_context: dbg_core::id::JobContextId::NONE,
        sym_server: dbg_core::id::SymbolServerId::NONE,
        verb: None,
        switches: vec![],
        args: args.into_iter().map(str::to_string).collect(),
        listing_subject: None,
        listing_subject_had_index: false,
        mentioned_nouns: vec![],
    }
}

#[tokio::test]
async fn step_with_no_fragment_resumes_with_the_line_range() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x1000, (0x1000, 0x1010));
    let (mut ctx, transport, target, thread) = context_with_stopped_thread(symbols, 0x1000, 0x2000).await;
    let bound = bound_for(target, thread, vec![]);

    step(&bound, &mut ctx).await.unwrap();

    let sent = transport.sent_requests();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        sent[0],
        Request::Resume { mode: ResumeMode::StepRange { begin_inclusive: 0x1000, end_exclusive: 0x1010 }, .. }
    ));
}

#[tokio::test]
async fn step_with_fragment_only_matches_the_named_destination() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x1000, (0x1000, 0x1010));
    symbols.call_sites.insert(
        0x1000,
        vec![
            CallSite { call_address: 0x1004, range_end: 0x1006, destination: Some("GetFoo".into()) },
            CallSite { call_address: 0x1008, range_end: 0x100a, destination: Some("Print".into()) },
        ],
    );
    symbols.resolutions.insert("Print".into(), vec![0x4000]);
    let (mut ctx, transport, target, thread) = context_with_stopped_thread(symbols, 0x1000, 0x2000).await;
    let bound = bound_for(target, thread, vec!["Pri"]);

    let out = step(&bound, &mut ctx).await.unwrap();
    assert!(out.as_plain_string().contains("Pri"));
    assert_eq!(transport.sent_requests().len(), 1);
}

#[tokio::test]
async fn next_resumes_with_the_current_line_range() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x2000, (0x2000, 0x2008));
    let (mut ctx, transport, target, thread) = context_with_stopped_thread(symbols, 0x2000, 0x3000).await;
    let bound = bound_for(target, thread, vec![]);

    next(&bound, &mut ctx).await.unwrap();

    let sent = transport.sent_requests();
    assert!(matches!(
        sent[0],
        Request::Resume { mode: ResumeMode::StepRange { begin_inclusive: 0x2000, end_exclusive: 0x2008 }, .. }
    ));
}

#[tokio::test]
async fn stepi_resumes_with_a_single_instruction_range() {
    let (mut ctx, transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    stepi(&bound, &mut ctx).await.unwrap();

    let sent = transport.sent_requests();
    assert!(matches!(
        sent[0],
        Request::Resume { mode: ResumeMode::StepRange { begin_inclusive: 0x3000, end_exclusive: 0x3001 }, .. }
    ));
}

#[tokio::test]
async fn nexti_resumes_with_a_single_instruction_over_range() {
    let (mut ctx, transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    nexti(&bound, &mut ctx).await.unwrap();

    let sent = transport.sent_requests();
    assert!(matches!(
        sent[0],
        Request::Resume { mode: ResumeMode::StepRange { begin_inclusive: 0x3000, end_exclusive: 0x3001 }, .. }
    ));
}

#[tokio::test]
async fn finish_fails_when_the_caller_frame_is_not_synced() {
    let (mut ctx, _transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    let err = finish(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::WrongState(_)));
}

#[tokio::test]
async fn finish_resumes_once_the_caller_frame_is_known() {
    let (mut ctx, transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    {
        let mut system = ctx.system().lock().await;
        let proc = system.target_mut(target).unwrap().process_mut().unwrap();
        let thread_ref = proc.thread_mut(Koid::new(9)).unwrap();
        let mut caller = make_frame(0x2000, 0x5000);
        caller.physical_index = 1;
        thread_ref.stack_mut().mark_full(vec![make_frame(0x3000, 0x4000), caller]);
    }
    let bound = bound_for(target, thread, vec![]);

    finish(&bound, &mut ctx).await.unwrap();
    let sent = transport.sent_requests();
    assert!(matches!(sent[0], Request::Resume { mode: ResumeMode::StepInstruction, .. }));
}

#[tokio::test]
async fn until_requires_a_location_argument() {
    let (mut ctx, _transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    let err = until(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[tokio::test]
async fn until_installs_a_transient_breakpoint_and_resumes_with_continue() {
    let mut symbols = FakeSymbolService::default();
    symbols.resolutions.insert("done".into(), vec![0x9000]);
    let (mut ctx, transport, target, thread) = context_with_stopped_thread(symbols, 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec!["done"]);

    until(&bound, &mut ctx).await.unwrap();

    let sent = transport.sent_requests();
    assert!(sent.iter().any(|r| matches!(r, Request::AddOrChangeBreakpoint { .. })));
    assert!(matches!(sent.last().unwrap(), Request::Resume { mode: ResumeMode::Continue, .. }));
}

#[tokio::test]
async fn jump_writes_the_pc_register_and_updates_frame_zero() {
    let (mut ctx, transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec!["0x5000"]);

    let out = jump(&bound, &mut ctx).await.unwrap();
    assert!(out.as_plain_string().contains("0x0000000000005000"));

    let sent = transport.sent_requests();
    assert!(matches!(sent[0], Request::WriteRegisters { .. }));

    let system = ctx.system().lock().await;
    let proc = system.target(target).unwrap().process().unwrap();
    let pc = proc.thread(Koid::new(9)).unwrap().stack().frame(0).unwrap().pc;
    assert_eq!(pc, 0x5000);
}

#[tokio::test]
async fn steps_reports_a_warning_when_no_calls_are_on_the_line() {
    let (mut ctx, _transport, target, thread) =
        context_with_stopped_thread(FakeSymbolService::default(), 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    match steps(&bound, &mut ctx).await.unwrap() {
        VerbOutcome::Done(out) => assert!(out.as_plain_string().contains("no calls")),
        VerbOutcome::AwaitingStepsChoice(_) => panic!("expected Done"),
    }
}

#[tokio::test]
async fn steps_with_one_call_pushes_directly_without_prompting() {
    let mut symbols = FakeSymbolService::default();
    symbols.call_sites.insert(
        0x3000,
        vec![CallSite { call_address: 0x3004, range_end: 0x3006, destination: Some("Foo".into()) }],
    );
    let (mut ctx, transport, target, thread) = context_with_stopped_thread(symbols, 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    match steps(&bound, &mut ctx).await.unwrap() {
        VerbOutcome::Done(_) => {}
        VerbOutcome::AwaitingStepsChoice(_) => panic!("expected Done for a single call"),
    }
    assert_eq!(transport.sent_requests().len(), 1);
}

#[tokio::test]
async fn steps_with_multiple_calls_awaits_a_choice_then_completes() {
    let mut symbols = FakeSymbolService::default();
    symbols.call_sites.insert(
        0x3000,
        vec![
            CallSite { call_address: 0x3004, range_end: 0x3006, destination: Some("GetFoo".into()) },
            CallSite { call_address: 0x3008, range_end: 0x300a, destination: Some("Print".into()) },
        ],
    );
    let (mut ctx, transport, target, thread) = context_with_stopped_thread(symbols, 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    let state = match steps(&bound, &mut ctx).await.unwrap() {
        VerbOutcome::AwaitingStepsChoice(state) => state,
        VerbOutcome::Done(_) => panic!("expected a prompt for two calls"),
    };
    assert!(transport.sent_requests().is_empty());

    complete_steps(state, "2", &ctx).await.unwrap();
    let sent = transport.sent_requests();
    assert!(matches!(sent[0], Request::Resume { mode: ResumeMode::StepRange { .. }, .. }));
}

#[tokio::test]
async fn steps_choice_rejects_an_out_of_range_selection() {
    let mut symbols = FakeSymbolService::default();
    symbols.call_sites.insert(
        0x3000,
        vec![
            CallSite { call_address: 0x3004, range_end: 0x3006, destination: Some("GetFoo".into()) },
            CallSite { call_address: 0x3008, range_end: 0x300a, destination: Some("Print".into()) },
        ],
    );
    let (mut ctx, _transport, target, thread) = context_with_stopped_thread(symbols, 0x3000, 0x4000).await;
    let bound = bound_for(target, thread, vec![]);

    let state = match steps(&bound, &mut ctx).await.unwrap() {
        VerbOutcome::AwaitingStepsChoice(state) => state,
        VerbOutcome::Done(_) => panic!("expected a prompt"),
    };

    let err = complete_steps(state, "9", &ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}
