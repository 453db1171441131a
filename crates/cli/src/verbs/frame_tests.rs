use super::*;
use dbg_core::id::{Koid, TargetId, ThreadId};
use dbg_core::process::Process;
use dbg_core::protocol::Notification;
use dbg_core::stack::{Frame, FrameSymbol, Stack};
use dbg_core::symbol_service::test_support::FakeSymbolService;
use dbg_core::target::{StartOrigin, TargetState};
use dbg_core::transport::test_support::ScriptedTransport;
use std::sync::Arc;

fn make_frame(pc: u64, sp: u64) -> Frame {
    Frame { pc, sp, bp: None, symbol_context: None, symbol: FrameSymbol::default(), is_inline: false, physical_index: 0 }
}

async fn context_with_stopped_thread() -> (ConsoleContext, TargetId, ThreadId) {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let symbols = Arc::new(FakeSymbolService::default());
    let mut ctx = ConsoleContext::new(transport, symbols);

    let target_id = {
        let mut system = ctx.system().lock().await;
        let id = system.create_target();
        let target = system.target_mut(id).unwrap();
        target.begin_pending(TargetState::Attaching).unwrap();
        target.commit_process(Process::new(Koid::new(1), "a.out".into(), StartOrigin::Attach));
        id
    };
    ctx.handle_notification(Notification::ThreadStarting {
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
        proc.thread_mut(Koid::new(9)).unwrap().apply_stop(Stack::new(vec![make_frame(0x1000, 0x2000)], true));
    }
    ctx.set_active_target(target_id);
    ctx.set_active_thread(target_id, thread_id);
    (ctx, target_id, thread_id)
}

fn bound_for(target: TargetId, thread: ThreadId, frame: usize, had_index: bool) -> BoundCommand {
    BoundCommand {
        target,
        thread,
        frame,
        breakpoint: dbg_core::id::BreakpointId::NONE,
        filter: dbg_core::id::FilterId::NONE,
        job_context: dbg_core::id::JobContextId::NONE,
        sym_server: dbg_core::id::SymbolServerId::NONE,
        verb: None,
        switches: vec![],
        args: vec![],
        listing_subject: None,
        listing_subject_had_index: had_index,
        mentioned_nouns: vec![],
    }
}

#[tokio::test]
async fn stack_renders_every_frame() {
    let (ctx, target_id, thread_id) = context_with_stopped_thread().await;
    let bound = bound_for(target_id, thread_id, 0, false);

    let out = stack(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains("0x0000000000001000"));
}

#[tokio::test]
async fn list_or_select_without_index_renders_the_whole_stack() {
    let (ctx, target_id, thread_id) = context_with_stopped_thread().await;
    let bound = bound_for(target_id, thread_id, 0, false);

    let out = list_or_select(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains("0x0000000000001000"));
}

#[tokio::test]
async fn list_or_select_with_index_renders_just_that_frame() {
    let (ctx, target_id, thread_id) = context_with_stopped_thread().await;
    let bound = bound_for(target_id, thread_id, 0, true);

    let out = list_or_select(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains("0x0000000000001000"));
}

#[tokio::test]
async fn list_or_select_with_out_of_range_index_errors() {
    let (ctx, target_id, thread_id) = context_with_stopped_thread().await;
    let bound = bound_for(target_id, thread_id, 5, true);

    let err = list_or_select(&bound, &ctx).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
