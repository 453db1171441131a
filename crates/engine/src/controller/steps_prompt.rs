//! Pure logic backing the `steps` verb's interactive chooser (spec §2
//! supplement, grounded in `verb_steps.cc`): find the calls on the current
//! source line, let the user pick one, and build a
//! [`super::StepIntoSpecificController`] for it. No I/O lives here —
//! `dbg-cli` owns the prompt itself; this module only decides what to show
//! and what the selection means.

use dbg_core::error::{Error, Result};
use dbg_core::symbol_service::CallSite;

use super::StepIntoSpecificController;

/// One candidate call the user can step directly into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepsChoice {
    /// One-based, matching what's shown to the user (`verb_steps.cc` uses
    /// 1-based indices with "q" reserved for quit).
    pub index: usize,
    pub call_address: u64,
    pub destination: Option<String>,
}

/// Builds the choice list from every call on the line at or after
/// `current_pc` — calls strictly before it have already executed
/// (`verb_steps.cc`: "Skip anything already past").
pub fn build_choices(current_pc: u64, call_sites: &[CallSite]) -> Vec<StepsChoice> {
    call_sites
        .iter()
        .filter(|c| c.call_address >= current_pc)
        .enumerate()
        .map(|(i, c)| StepsChoice {
            index: i + 1,
            call_address: c.call_address,
            destination: c.destination.clone(),
        })
        .collect()
}

/// Parses the user's raw prompt input. `Ok(None)` means "quit" (`"q"`);
/// `Ok(Some(choice))` is the selected entry. Mirrors `CompleteSteps`'s
/// `sscanf`-and-range-check validation.
pub fn parse_selection<'a>(input: &str, choices: &'a [StepsChoice]) -> Result<Option<&'a StepsChoice>> {
    if input == "q" {
        return Ok(None);
    }
    let chosen: usize = input
        .trim()
        .parse()
        .map_err(|_| Error::Input(format!("invalid selection: {input}")))?;
    if chosen == 0 || chosen > choices.len() {
        return Err(Error::Input(format!("selection out of range: {input}")));
    }
    Ok(choices.get(chosen - 1))
}

/// Confirms the thread hasn't resumed in the background while the prompt
/// was awaiting input (`CompleteSteps`'s "Thread continued in the
/// background" guard).
pub fn validate_thread_unmoved(expected_pc: u64, current_pc: u64) -> Result<()> {
    if expected_pc != current_pc {
        return Err(Error::WrongState(
            "thread continued in the background, giving up on steps".into(),
        ));
    }
    Ok(())
}

/// Builds the controller that steps directly into `choice`'s call.
pub fn controller_for_choice(current_pc: u64, choice: &StepsChoice) -> StepIntoSpecificController {
    StepIntoSpecificController::new(current_pc, choice.call_address)
}

#[cfg(test)]
#[path = "steps_prompt_tests.rs"]
mod tests;
