//! Process: an attached-to running process.

use crate::id::Koid;
use crate::simple_display;
use crate::target::StartOrigin;
use crate::thread::Thread;
use std::collections::{HashMap, VecDeque};

/// Per-stream cap on buffered stdio bytes before the oldest bytes are
/// evicted. Matches the agent-side ring buffer size this client mirrors.
pub const MAX_IO_BUFFER_SIZE: usize = 1024 * 1024;

/// A loaded module (shared library or the main executable image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub build_id: String,
    pub base: u64,
}

/// Which stdio stream a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStream {
    Stdout,
    Stderr,
}

simple_display! {
    IoStream {
        Stdout => "stdout",
        Stderr => "stderr",
    }
}

/// Bounded byte ring buffer; oldest bytes are evicted once `cap` is reached.
#[derive(Debug, Clone)]
pub struct IoRingBuffer {
    cap: usize,
    buf: VecDeque<u8>,
}

impl IoRingBuffer {
    pub fn new(cap: usize) -> Self {
        Self { cap, buf: VecDeque::with_capacity(cap.min(4096)) }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.buf.len() == self.cap {
                self.buf.pop_front();
            }
            self.buf.push_back(b);
        }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.buf.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for IoRingBuffer {
    fn default() -> Self {
        Self::new(MAX_IO_BUFFER_SIZE)
    }
}

/// An attached-to running process.
pub struct Process {
    koid: Koid,
    name: String,
    component_url: Option<String>,
    start_origin: StartOrigin,
    modules: Vec<Module>,
    threads: HashMap<Koid, Thread>,
    stdout: IoRingBuffer,
    stderr: IoRingBuffer,
    observers: Vec<Box<dyn ProcessObserver>>,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("koid", &self.koid)
            .field("name", &self.name)
            .field("start_origin", &self.start_origin)
            .field("threads", &self.threads.len())
            .finish()
    }
}

impl Process {
    pub fn new(koid: Koid, name: String, start_origin: StartOrigin) -> Self {
        Self {
            koid,
            name,
            component_url: None,
            start_origin,
            modules: Vec::new(),
            threads: HashMap::new(),
            stdout: IoRingBuffer::default(),
            stderr: IoRingBuffer::default(),
            observers: Vec::new(),
        }
    }

    pub fn koid(&self) -> Koid {
        self.koid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_url(&self) -> Option<&str> {
        self.component_url.as_deref()
    }

    pub fn set_component_url(&mut self, url: Option<String>) {
        self.component_url = url;
    }

    pub fn start_origin(&self) -> StartOrigin {
        self.start_origin
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn thread(&self, koid: Koid) -> Option<&Thread> {
        self.threads.get(&koid)
    }

    pub fn thread_mut(&mut self, koid: Koid) -> Option<&mut Thread> {
        self.threads.get_mut(&koid)
    }

    pub fn stdout(&self) -> &IoRingBuffer {
        &self.stdout
    }

    pub fn stderr(&self) -> &IoRingBuffer {
        &self.stderr
    }

    pub fn add_observer(&mut self, observer: Box<dyn ProcessObserver>) {
        self.observers.push(observer);
    }

    /// A new thread koid was reported. No-op if already known (duplicate
    /// ThreadStarting notifications are tolerated).
    pub fn did_create_thread(&mut self, thread: Thread) {
        let koid = thread.koid();
        if self.threads.contains_key(&koid) {
            return;
        }
        self.threads.insert(koid, thread);
        for observer in &mut self.observers {
            observer.did_create_thread(self.koid, koid);
        }
    }

    /// A ThreadExiting notification arrived. Fires observers before removing
    /// the thread so they can still inspect its final state.
    pub fn will_destroy_thread(&mut self, koid: Koid) {
        if !self.threads.contains_key(&koid) {
            return;
        }
        for observer in &mut self.observers {
            observer.will_destroy_thread(self.koid, koid);
        }
        self.threads.remove(&koid);
    }

    pub fn on_module_loaded(&mut self, module: Module) {
        self.modules.push(module.clone());
        for observer in &mut self.observers {
            observer.on_module_loaded(self.koid, &module);
        }
    }

    pub fn on_symbol_load_failure(&mut self, message: String) {
        for observer in &mut self.observers {
            observer.on_symbol_load_failure(self.koid, &message);
        }
    }

    pub fn on_stdio(&mut self, stream: IoStream, bytes: &[u8]) {
        match stream {
            IoStream::Stdout => self.stdout.push(bytes),
            IoStream::Stderr => self.stderr.push(bytes),
        }
        for observer in &mut self.observers {
            observer.on_stdio(self.koid, stream, bytes);
        }
    }
}

/// Non-owning observer of a single Process's thread/module/stdio lifecycle.
pub trait ProcessObserver {
    fn did_create_thread(&mut self, _process: Koid, _thread: Koid) {}
    fn will_destroy_thread(&mut self, _process: Koid, _thread: Koid) {}
    fn on_module_loaded(&mut self, _process: Koid, _module: &Module) {}
    fn on_symbol_load_failure(&mut self, _process: Koid, _message: &str) {}
    fn on_stdio(&mut self, _process: Koid, _stream: IoStream, _bytes: &[u8]) {}
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
