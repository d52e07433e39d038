#![allow(dead_code)]

use prept::error::{Error, Result};
use prept::processor::{Progress, Reporter};
use prept::prompt::Prompter;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Prompter answering from a fixed script and recording what was asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    confirm: bool,
    pub asked: RefCell<Vec<String>>,
    pub summaries: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn confirming(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn summary(&self, text: &str) {
        self.summaries.borrow_mut().push(text.to_string());
    }

    fn input(&self, label: &str, _allow_empty: bool) -> Result<String> {
        self.asked.borrow_mut().push(label.to_string());
        self.answers.borrow_mut().pop_front().ok_or(Error::Interrupted)
    }

    fn confirm(&self, skip: bool, _prompt: String) -> Result<bool> {
        Ok(skip || self.confirm)
    }
}

/// Reporter recording written and skipped paths.
#[derive(Default)]
pub struct RecordingReporter {
    pub written: RefCell<Vec<PathBuf>>,
    pub skipped: RefCell<Vec<PathBuf>>,
}

impl Reporter for RecordingReporter {
    fn report(&self, event: Progress<'_>) {
        match event {
            Progress::Writing { .. } => {}
            Progress::Written { target } => self.written.borrow_mut().push(target.to_path_buf()),
            Progress::Skipped { source, .. } => self.skipped.borrow_mut().push(source.to_path_buf()),
        }
    }
}

/// Writes `files` (path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}
