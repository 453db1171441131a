use super::*;
use crate::command::Noun;
use dbg_core::symbol_service::test_support::FakeSymbolService;
use dbg_core::transport::test_support::ScriptedTransport;
use std::sync::Arc;

fn new_ctx() -> ConsoleContext {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let symbols = Arc::new(FakeSymbolService::default());
    ConsoleContext::new(transport, symbols)
}

fn bound(verb: Option<&str>, listing_subject: Option<Noun>, had_index: bool) -> BoundCommand {
    BoundCommand {
        target: dbg_core::id::TargetId::NONE,
        thread: dbg_core::id::ThreadId::NONE,
        frame: 0,
        breakpoint: dbg_core::id::BreakpointId::NONE,
        filter: dbg_core::id::FilterId::NONE,
        job_context: dbg_core::id::JobContextId::NONE,
        sym_server: dbg_core::id::SymbolServerId::NONE,
        verb: verb.map(str::to_string),
        switches: vec![],
        args: vec![],
        listing_subject,
        listing_subject_had_index: had_index,
        mentioned_nouns: vec![],
    }
}

#[tokio::test]
async fn dispatch_rejects_an_unknown_verb() {
    let mut ctx = new_ctx();
    let bound = bound(Some("frobnicate"), None, false);

    let err = dispatch(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[tokio::test]
async fn dispatch_with_no_verb_and_no_listing_subject_is_empty() {
    let mut ctx = new_ctx();
    let bound = bound(None, None, false);

    let outcome = dispatch(&bound, &mut ctx).await.unwrap();
    match outcome {
        VerbOutcome::Done(out) => assert!(out.is_empty()),
        VerbOutcome::AwaitingStepsChoice(_) => panic!("expected Done"),
    }
}

#[tokio::test]
async fn dispatch_with_no_verb_lists_the_subject_noun() {
    let mut ctx = new_ctx();
    let target_id = { ctx.system().lock().await.create_target() };
    let bound = bound(None, Some(Noun::Process), false);

    let outcome = dispatch(&bound, &mut ctx).await.unwrap();
    match outcome {
        VerbOutcome::Done(out) => assert!(out.as_plain_string().contains(&target_id.get().to_string())),
        VerbOutcome::AwaitingStepsChoice(_) => panic!("expected Done"),
    }
}

#[tokio::test]
async fn dispatch_steps_returns_a_verb_outcome_directly() {
    let mut ctx = new_ctx();
    let bound = bound(Some("steps"), None, false);

    let err = dispatch(&bound, &mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::NotRunning(_)));
}

#[tokio::test]
async fn dispatch_global_noun_listing_is_empty() {
    let mut ctx = new_ctx();
    let bound = bound(None, Some(Noun::Global), false);

    let outcome = dispatch(&bound, &mut ctx).await.unwrap();
    match outcome {
        VerbOutcome::Done(out) => assert!(out.is_empty()),
        VerbOutcome::AwaitingStepsChoice(_) => panic!("expected Done"),
    }
}
