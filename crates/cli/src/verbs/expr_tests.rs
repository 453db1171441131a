use super::*;
use dbg_core::id::{TargetId, ThreadId};
use dbg_core::process::Process;
use dbg_core::protocol::ReplyPayload;
use dbg_core::stack::{Frame, FrameSymbol, Stack};
use dbg_core::symbol_service::test_support::FakeSymbolService;
use dbg_core::target::{StartOrigin, TargetState};
use dbg_core::transport::test_support::ScriptedTransport;
use std::sync::Arc;

fn make_frame(pc: u64) -> Frame {
    Frame {
        pc,
        sp: 0x2000,
        bp: None,
        symbol_context: None,
        symbol: FrameSymbol::default(),
        is_inline: false,
        physical_index: 0,
    }
}

async fn context_with_stopped_thread(
    replies: Vec<dbg_core::protocol::Reply>,
    symbols: FakeSymbolService,
) -> (ConsoleContext, TargetId, ThreadId, u64) {
    let transport = Arc::new(ScriptedTransport::new(replies));
    let symbols = Arc::new(symbols);
    let mut ctx = ConsoleContext::new(transport, symbols);

    let pc = 0x1000;
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
        proc.thread_mut(Koid::new(9)).unwrap().apply_stop(Stack::new(vec![make_frame(pc)], true));
    }
    ctx.set_active_target(target_id);
    ctx.set_active_thread(target_id, thread_id);
    (ctx, target_id, thread_id, pc)
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
async fn print_evaluates_against_the_active_frame() {
    let (ctx, target, thread, _pc) =
        context_with_stopped_thread(vec![], FakeSymbolService::default()).await;
    let bound = bound_for(target, thread, vec!["x", "+", "1"]);

    let out = print(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains("<unevaluated: x + 1>"));
}

#[tokio::test]
async fn print_with_no_expression_is_an_input_error() {
    let (ctx, target, thread, _pc) =
        context_with_stopped_thread(vec![], FakeSymbolService::default()).await;
    let bound = bound_for(target, thread, vec![]);

    let err = print(&bound, &ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[tokio::test]
async fn sym_info_reports_not_found_for_unresolved_symbol() {
    let (ctx, target, thread, _pc) =
        context_with_stopped_thread(vec![], FakeSymbolService::default()).await;
    let bound = bound_for(target, thread, vec!["missing_fn"]);

    let err = sym_info(&bound, &ctx).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn sym_info_lists_every_resolved_address() {
    let mut symbols = FakeSymbolService::default();
    symbols.resolutions.insert("main".into(), vec![0x1000, 0x1100]);
    symbols.line_ranges.insert(0x1000, (0x1000, 0x1010));
    let (ctx, target, thread, _pc) = context_with_stopped_thread(vec![], symbols).await;
    let bound = bound_for(target, thread, vec!["main"]);

    let out = sym_info(&bound, &ctx).await.unwrap();
    let text = out.as_plain_string();
    assert!(text.contains("0x0000000000001000"));
    assert!(text.contains("0x0000000000001100"));
    assert!(text.contains("range"));
}

#[tokio::test]
async fn sym_near_reports_no_symbol_information_when_unresolved() {
    let (ctx, target, thread, _pc) =
        context_with_stopped_thread(vec![], FakeSymbolService::default()).await;
    let bound = bound_for(target, thread, vec!["0x4000"]);

    let out = sym_near(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains("no symbol information"));
}

#[tokio::test]
async fn sym_near_names_the_innermost_inline_frame() {
    let mut symbols = FakeSymbolService::default();
    symbols.inline_chains.insert(
        0x4000,
        vec![dbg_core::symbol_service::InlineFrameSymbol {
            function_name: "inlined_fn".into(),
            file: Some("a.cc".into()),
            line: Some(7),
        }],
    );
    let (ctx, target, thread, _pc) = context_with_stopped_thread(vec![], symbols).await;
    let bound = bound_for(target, thread, vec!["0x4000"]);

    let out = sym_near(&bound, &ctx).await.unwrap();
    assert!(out.as_plain_string().contains("inlined_fn"));
    assert!(out.as_plain_string().contains("a.cc:7"));
}

#[tokio::test]
async fn mem_read_renders_a_hex_dump_of_the_reply() {
    let data: Vec<u8> = (0..16).collect();
    let replies = vec![dbg_core::protocol::Reply::Ok(ReplyPayload::Memory { data: data.clone() })];
    let (ctx, target, thread, _pc) = context_with_stopped_thread(replies, FakeSymbolService::default()).await;
    let mut bound = bound_for(target, thread, vec!["0x1000"]);
    bound.switches = vec![crate::command::Switch { name: "size".into(), value: Some("16".into()) }];

    let out = mem_read(&bound, &ctx).await.unwrap();
    let text = out.as_plain_string();
    assert!(text.contains("0x0000000000001000:"));
    assert!(text.contains("00 01 02 03"));
}

#[tokio::test]
async fn mem_read_requires_an_address_argument() {
    let (ctx, target, thread, _pc) =
        context_with_stopped_thread(vec![], FakeSymbolService::default()).await;
    let bound = bound_for(target, thread, vec![]);

    let err = mem_read(&bound, &ctx).await.unwrap_err();
    assert!(matches!(err, Error::Input(_)));
}

#[tokio::test]
async fn mem_analyze_annotates_words_that_look_like_pointers_into_known_symbols() {
    let mut word = vec![0u8; 8];
    word[0..8].copy_from_slice(&0x2000u64.to_le_bytes());
    let replies = vec![dbg_core::protocol::Reply::Ok(ReplyPayload::Memory { data: word })];

    let mut symbols = FakeSymbolService::default();
    symbols.inline_chains.insert(
        0x2000,
        vec![dbg_core::symbol_service::InlineFrameSymbol {
            function_name: "target_fn".into(),
            file: None,
            line: None,
        }],
    );
    let (ctx, target, thread, _pc) = context_with_stopped_thread(replies, symbols).await;
    let mut bound = bound_for(target, thread, vec!["0x3000"]);
    bound.switches = vec![
        crate::command::Switch { name: "num".into(), value: Some("1".into()) },
        crate::command::Switch { name: "size".into(), value: Some("8".into()) },
    ];

    let out = mem_analyze(&bound, &ctx).await.unwrap();
    let text = out.as_plain_string();
    assert!(text.contains("-> target_fn"));
}
