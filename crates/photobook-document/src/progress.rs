// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Maps stage-local progress onto the overall 0..=total range.

use photobook_assets::ProgressSink;
use photobook_core::{ExportProgress, ProgressSplit};

/// Forwards export progress to a sink, never going backwards.
pub struct ProgressReporter<'a> {
    /// Receives every reported value.
    sink: &'a dyn ProgressSink,
    /// Share of the total owned by each stage.
    split: ProgressSplit,
    /// Last value sent, so reports never repeat or go back.
    last: Option<u32>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink, split: ProgressSplit) -> Self {
        Self {
            sink,
            split,
            last: None,
        }
    }

    pub fn total(&self) -> u32 {
        self.split.total()
    }

    /// Last value handed to the sink.
    pub fn current(&self) -> u32 {
        self.last.unwrap_or(0)
    }

    pub fn start(&mut self) {
        self.emit(0);
    }

    /// `done` of `total` assets resolved.
    pub fn loading(&mut self, done: usize, total: usize) {
        self.emit(scaled(self.split.loading, done, total));
    }

    pub fn loaded(&mut self) {
        self.emit(self.split.loading);
    }

    /// `done` of `total` content pages handled.
    pub fn assembly(&mut self, done: usize, total: usize) {
        self.emit(self.split.loading + scaled(self.split.assembly, done, total));
    }

    pub fn assembled(&mut self) {
        self.emit(self.split.loading + self.split.assembly);
    }

    /// The document has been finalized; only hand-off remains.
    pub fn serialized(&mut self) {
        let done = self.split.loading + self.split.assembly;
        self.emit(done + self.split.serialization * 3 / 5);
    }

    pub fn finished(&mut self) {
        self.emit(self.total());
    }

    fn emit(&mut self, value: u32) {
        let value = value.min(self.total());
        if self.last.is_some_and(|last| value <= last) {
            return;
        }
        self.last = Some(value);
        self.sink.on_progress(ExportProgress::new(value, self.total()));
    }
}

fn scaled(share: u32, done: usize, total: usize) -> u32 {
    if total == 0 {
        return share;
    }
    let done = done.min(total) as u64;
    (u64::from(share) * done / total as u64) as u32
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recorded(events: &Mutex<Vec<u32>>) -> Vec<u32> {
        events.lock().expect("lock").clone()
    }

    #[test]
    fn default_split_hits_reference_milestones() {
        let events = Mutex::new(Vec::new());
        let sink = |p: ExportProgress| {
            assert_eq!(p.total, 100);
            events.lock().expect("lock").push(p.current);
        };
        let mut progress = ProgressReporter::new(&sink, ProgressSplit::default());

        progress.start();
        progress.loading(5, 10);
        progress.loaded();
        progress.assembly(1, 3);
        progress.assembled();
        progress.serialized();
        progress.finished();

        assert_eq!(recorded(&events), vec![0, 25, 50, 65, 95, 98, 100]);
    }

    #[test]
    fn never_goes_backwards_or_repeats() {
        let events = Mutex::new(Vec::new());
        let sink = |p: ExportProgress| events.lock().expect("lock").push(p.current);
        let mut progress = ProgressReporter::new(&sink, ProgressSplit::default());

        progress.loading(10, 10);
        progress.loaded();
        progress.loading(1, 10);
        progress.assembly(0, 4);
        progress.assembly(4, 4);
        progress.assembled();

        assert_eq!(recorded(&events), vec![50, 95]);
        assert_eq!(progress.current(), 95);
    }

    #[test]
    fn custom_split_scales_against_its_own_total() {
        let events = Mutex::new(Vec::new());
        let sink = |p: ExportProgress| events.lock().expect("lock").push(p.total);
        let split = ProgressSplit {
            loading: 2,
            assembly: 2,
            serialization: 1,
        };
        let mut progress = ProgressReporter::new(&sink, split);
        progress.start();
        progress.finished();
        assert_eq!(recorded(&events), vec![5, 5]);
    }

    #[test]
    fn empty_stage_counts_as_complete() {
        assert_eq!(scaled(45, 0, 0), 45);
        assert_eq!(scaled(50, 3, 2), 50);
    }
}
