use super::*;
use dbg_core::protocol::ReplyPayload;
use dbg_core::target::TargetState;
use dbg_core::transport::test_support::ScriptedTransport;
use dbg_core::symbol_service::test_support::FakeSymbolService;
use std::sync::Arc;

fn context_with(replies: Vec<Reply>) -> (ConsoleContext, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new(replies));
    let symbols = Arc::new(FakeSymbolService::default());
    (ConsoleContext::new(transport.clone(), symbols), transport)
}

fn bound_for(target: TargetId, args: Vec<&str>) -> BoundCommand {
    BoundCommand {
        target,
        thread: dbg_core::id::ThreadId::NONE,
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
async fn run_requires_a_program_path_or_component() {
    let (mut ctx, _transport) = context_with(vec![]);
    let target = { ctx.system().lock().await.create_target() };
    let bound = bound_for(target, vec![]);

    let err = run(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[tokio::test]
async fn run_commits_the_launched_process() {
    let replies = vec![Reply::Ok(ReplyPayload::Attached { koid: Koid::new(7), name: "a.out".into() })];
    let (mut ctx, transport) = context_with(replies);
    let target = { ctx.system().lock().await.create_target() };
    let bound = bound_for(target, vec!["a.out"]);

    let out = run(&bound, &mut ctx).await.unwrap();
    assert!(out.as_plain_string().contains("a.out"));
    assert!(matches!(transport.sent_requests()[0], Request::Launch { .. }));

    let system = ctx.system().lock().await;
    assert_eq!(system.target(target).unwrap().state(), TargetState::Running);
}

#[tokio::test]
async fn attach_requires_a_koid() {
    let (mut ctx, _transport) = context_with(vec![]);
    let target = { ctx.system().lock().await.create_target() };
    let bound = bound_for(target, vec![]);

    let err = attach(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[tokio::test]
async fn attach_commits_the_attached_process() {
    let replies = vec![Reply::Ok(ReplyPayload::Attached { koid: Koid::new(42), name: "target".into() })];
    let (mut ctx, _transport) = context_with(replies);
    let target = { ctx.system().lock().await.create_target() };
    let bound = bound_for(target, vec!["42"]);

    let out = attach(&bound, &mut ctx).await.unwrap();
    assert!(out.as_plain_string().contains("target"));
}

#[tokio::test]
async fn detach_destroys_the_process_and_reports_the_target() {
    let (mut ctx, _transport) = context_with(vec![]);
    let target = {
        let mut system = ctx.system().lock().await;
        let id = system.create_target();
        let t = system.target_mut(id).unwrap();
        t.begin_pending(TargetState::Attaching).unwrap();
        t.commit_process(Process::new(Koid::new(1), "a.out".into(), StartOrigin::Attach));
        id
    };
    let bound = bound_for(target, vec![]);

    detach(&bound, &mut ctx).await.unwrap();
    let system = ctx.system().lock().await;
    assert!(system.target(target).unwrap().process().is_none());
}

#[tokio::test]
async fn detach_of_an_untracked_koid_sends_an_explicit_detach_without_touching_any_target() {
    let (mut ctx, transport) = context_with(vec![Reply::Ok(ReplyPayload::Empty)]);
    let target = {
        let mut system = ctx.system().lock().await;
        let id = system.create_target();
        let t = system.target_mut(id).unwrap();
        t.begin_pending(TargetState::Attaching).unwrap();
        t.commit_process(Process::new(Koid::new(1), "a.out".into(), StartOrigin::Attach));
        id
    };
    let bound = bound_for(target, vec!["1546"]);

    let out = detach(&bound, &mut ctx).await.unwrap();
    assert!(out.as_plain_string().contains("Successfully detached from 1546"));
    assert!(matches!(transport.sent_requests()[0], Request::Detach { koid } if koid == Koid::new(1546)));

    let system = ctx.system().lock().await;
    assert!(system.target(target).unwrap().process().is_some());
}

#[tokio::test]
async fn kill_destroys_the_process() {
    let (mut ctx, _transport) = context_with(vec![]);
    let target = {
        let mut system = ctx.system().lock().await;
        let id = system.create_target();
        let t = system.target_mut(id).unwrap();
        t.begin_pending(TargetState::Attaching).unwrap();
        t.commit_process(Process::new(Koid::new(1), "a.out".into(), StartOrigin::Attach));
        id
    };
    let bound = bound_for(target, vec![]);

    kill(&bound, &mut ctx).await.unwrap();
    let system = ctx.system().lock().await;
    assert!(system.target(target).unwrap().process().is_none());
}

#[tokio::test]
async fn cont_requires_an_active_thread() {
    let (mut ctx, _transport) = context_with(vec![]);
    let target = { ctx.system().lock().await.create_target() };
    let bound = bound_for(target, vec![]);

    let err = cont(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::NotRunning(_)));
}

#[tokio::test]
async fn list_or_select_lists_every_target_with_no_index() {
    let (mut ctx, _transport) = context_with(vec![]);
    let target = { ctx.system().lock().await.create_target() };
    let bound = bound_for(target, vec![]);

    let out = list_or_select(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains(&target.get().to_string()));
}
