use super::*;
use dbg_core::id::Koid;
use dbg_core::stack::{Frame, FrameSymbol};
use dbg_core::symbol_service::test_support::FakeSymbolService;
use dbg_core::symbol_service::Prologue;
use dbg_core::thread::Thread;

fn frame_at(pc: u64, sp: u64, physical_index: usize) -> Frame {
    Frame { pc, sp, bp: None, symbol_context: None, symbol: FrameSymbol::default(), is_inline: false, physical_index }
}

fn stop_info() -> StopInfo {
    StopInfo { exception: dbg_core::thread::ExceptionKind::SingleStep, details: Default::default(), matched_breakpoint_locations: Vec::new() }
}

#[tokio::test]
async fn continues_while_inside_current_line() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x100, (0x100, 0x120));
    let mut thread = Thread::new(Koid::new(1), "t".into());
    thread.stack_mut().mark_full(vec![frame_at(0x100, 0x1000, 0)]);
    let mut controller = StepIntoController::new(false);
    let mut env = ControllerEnv { process: Koid::new(1), thread: &mut thread, symbols: &symbols };
    controller.init(&mut env).await.unwrap();

    env.thread.stack_mut().mark_full(vec![frame_at(0x110, 0x1000, 0)]);
    let decision = controller.on_thread_stopped(&mut env, &stop_info()).await.unwrap();
    assert_eq!(decision, Decision::Continue);
}

#[tokio::test]
async fn stops_when_line_changes_with_no_prologue() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x100, (0x100, 0x120));
    symbols.line_ranges.insert(0x130, (0x130, 0x140));
    let mut thread = Thread::new(Koid::new(1), "t".into());
    thread.stack_mut().mark_full(vec![frame_at(0x100, 0x1000, 0)]);
    let mut controller = StepIntoController::new(false);
    let mut env = ControllerEnv { process: Koid::new(1), thread: &mut thread, symbols: &symbols };
    controller.init(&mut env).await.unwrap();

    env.thread.stack_mut().mark_full(vec![frame_at(0x130, 0x1000, 0)]);
    let decision = controller.on_thread_stopped(&mut env, &stop_info()).await.unwrap();
    assert_eq!(decision, Decision::Stop);
}

#[tokio::test]
async fn skips_prologue_before_reporting_stop() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x100, (0x100, 0x120));
    symbols.line_ranges.insert(0x130, (0x130, 0x150));
    symbols.prologues.insert(0x130, Prologue { begin: 0x130, end: 0x138 });
    let mut thread = Thread::new(Koid::new(1), "t".into());
    thread.stack_mut().mark_full(vec![frame_at(0x100, 0x1000, 0)]);
    let mut controller = StepIntoController::new(false);
    let mut env = ControllerEnv { process: Koid::new(1), thread: &mut thread, symbols: &symbols };
    controller.init(&mut env).await.unwrap();

    // Left the caller's line and landed at the callee's entry (in the
    // prologue): should keep going rather than stop here.
    env.thread.stack_mut().mark_full(vec![frame_at(0x130, 0x900, 1)]);
    let decision = controller.on_thread_stopped(&mut env, &stop_info()).await.unwrap();
    assert_eq!(decision, Decision::Continue);

    // Past the prologue: now it stops.
    env.thread.stack_mut().mark_full(vec![frame_at(0x138, 0x900, 1)]);
    let decision = controller.on_thread_stopped(&mut env, &stop_info()).await.unwrap();
    assert_eq!(decision, Decision::Stop);
}

#[tokio::test]
async fn steps_back_out_of_code_with_no_symbols() {
    let mut symbols = FakeSymbolService::default();
    symbols.line_ranges.insert(0x100, (0x100, 0x120));
    symbols.line_ranges.insert(0x10a, (0x100, 0x120));
    // 0x9000 deliberately has no line_ranges entry -> Symbol error.
    let mut thread = Thread::new(Koid::new(1), "t".into());
    thread.stack_mut().mark_full(vec![frame_at(0x100, 0x1000, 0)]);
    let mut controller = StepIntoController::new(false);
    let mut env = ControllerEnv { process: Koid::new(1), thread: &mut thread, symbols: &symbols };
    controller.init(&mut env).await.unwrap();

    // Stepped into a PLT stub / code with no symbols, one level deeper.
    env.thread.stack_mut().mark_full(vec![frame_at(0x9000, 0x900, 0), frame_at(0x108, 0x1000, 1)]);
    let decision = controller.on_thread_stopped(&mut env, &stop_info()).await.unwrap();
    assert_eq!(decision, Decision::KeepSteppingWithNewPlan);
    assert_eq!(controller.get_resume_mode(), ResumeMode::StepInstruction);

    // Returned to the caller's frame (sp matches the parent's).
    env.thread.stack_mut().mark_full(vec![frame_at(0x10a, 0x1000, 0)]);
    let decision = controller.on_thread_stopped(&mut env, &stop_info()).await.unwrap();
    // Back with symbols and still on the original line -> keep stepping.
    assert_eq!(decision, Decision::Continue);
}
