//! The session-task tree (spec §4.9): each compile phase is timed and
//! recorded as `{name, category, elapsed}`, mirroring the original's
//! `session::time_task`. Grounded on `compiler::session_task_t` in
//! `original_source/basecode/compiler/compiler_types.h`/`session.cpp`;
//! the original nests subtasks under a task stack, but this port's
//! 11-phase sequence is a flat, non-recursive list, so `TaskTree` keeps
//! a flat `Vec<Task>` instead of reproducing the stack.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskCategory {
    Compiler,
    ByteCodeEmitter,
    Assembler,
    VirtualMachine,
}

impl TaskCategory {
    pub const fn name(self) -> &'static str {
        match self {
            TaskCategory::Compiler => "compiler",
            TaskCategory::ByteCodeEmitter => "byte_code_emitter",
            TaskCategory::Assembler => "assembler",
            TaskCategory::VirtualMachine => "virtual_machine",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Task {
    pub name: String,
    pub category: TaskCategory,
    pub elapsed: Duration,
}

#[derive(Default, Debug)]
pub struct TaskTree {
    tasks: Vec<Task>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing a phase; the returned guard records the elapsed
    /// time into the tree when it is dropped, whether the phase
    /// succeeded or short-circuited early.
    pub fn start(&mut self, name: impl Into<String>, category: TaskCategory) -> TaskGuard<'_> {
        TaskGuard { tree: self, name: name.into(), category, start: Instant::now() }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Records a completed phase directly, for call sites that cannot
    /// hold a [`TaskGuard`] across the phase body (e.g. because the
    /// phase body itself needs a mutable borrow of the tree's owner).
    pub fn record(&mut self, name: impl Into<String>, category: TaskCategory, elapsed: Duration) {
        self.tasks.push(Task { name: name.into(), category, elapsed });
    }

    pub fn total_elapsed(&self) -> Duration {
        self.tasks.iter().map(|t| t.elapsed).sum()
    }
}

pub struct TaskGuard<'a> {
    tree: &'a mut TaskTree,
    name: String,
    category: TaskCategory,
    start: Instant,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.tree.tasks.push(Task { name: std::mem::take(&mut self.name), category: self.category, elapsed });
    }
}
