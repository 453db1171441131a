//! The abstract styled-output model (spec §1, "Terminal rendering, line
//! editing, colorization beyond the abstract span/style model" is
//! out-of-scope): an [`OutputBuffer`] is a sequence of [`Span`]s, each
//! carrying a [`Syntax`] tag. Turning that into actual terminal escape
//! codes is the outer collaborator's job; this module stops at the span
//! model and a plain-text renderer, grounded in `output_buffer.h`.

mod entity;
mod stop;

pub use entity::{
    render_breakpoint, render_filter, render_frame, render_job_context, render_location,
    render_stack, render_symbol_server, render_target, render_thread_summary,
};
pub use stop::{describe_hit_breakpoints, format_stop, StopContext};

/// Semantic role of a span of output text. Distinct from raw color so the
/// outer terminal layer can remap roles to whatever palette it wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Normal,
    Heading,
    Comment,
    Variable,
    Special,
    Error,
    Warning,
    Reversed,
}

/// One run of text tagged with a [`Syntax`] role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub syntax: Syntax,
    pub text: String,
}

impl Span {
    pub fn new(syntax: Syntax, text: impl Into<String>) -> Self {
        Self { syntax, text: text.into() }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::new(Syntax::Normal, text)
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(Syntax::Heading, text)
    }
}

/// An ordered sequence of [`Span`]s: the unit every formatting function in
/// this crate produces. Never writes to a terminal itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    spans: Vec<Span>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, span: Span) -> &mut Self {
        self.spans.push(span);
        self
    }

    pub fn append_normal(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Span::normal(text))
    }

    pub fn append_newline(&mut self) -> &mut Self {
        self.append_normal("\n")
    }

    pub fn extend(&mut self, other: OutputBuffer) -> &mut Self {
        self.spans.extend(other.spans);
        self
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    /// Concatenates every span's text, discarding syntax tags. This is the
    /// only rendering this crate does on its own — no ANSI, no width
    /// measurement beyond what a plain terminal gives you for free.
    pub fn as_plain_string(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Trailing-newline-normalized form, used when one formatted block is
    /// concatenated with another (stop headers followed by source context,
    /// etc.) so callers don't have to track blank-line bookkeeping.
    pub fn trim_trailing_newlines(&self) -> String {
        self.as_plain_string().trim_end_matches('\n').to_string()
    }

    /// A normalized dump of spans and their syntax tags, one per line, used
    /// by tests that want to assert on structure instead of concatenated
    /// text (`output_buffer.h`'s `GetDebugString`).
    pub fn debug_string(&self) -> String {
        self.spans
            .iter()
            .map(|s| format!("[{:?}]{}", s.syntax, s.text))
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
