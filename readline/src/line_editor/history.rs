// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Submitted lines, oldest first, with an append-only file behind them.
//!
//! The last item is always the line being edited right now. Navigating with
//! [`HistoryStore::prev`] and [`HistoryStore::next`] moves a cursor over the items. The
//! read loop calls [`HistoryStore::update`] after every key, which stores the edited
//! text as a draft on whatever item the cursor is on. Drafts belong to the current
//! "version": moving away from a recalled line and back shows the edit again, while
//! submitting or [`HistoryStore::revert`] bumps the version and every draft is
//! forgotten.

use std::{collections::VecDeque,
          fs::{File, OpenOptions},
          io::{self, BufRead, BufReader, BufWriter, Write},
          path::{Path, PathBuf}};

use crate::Config;

#[derive(Debug, Clone, Default)]
struct HistoryItem {
    source: Vec<char>,
    draft: Vec<char>,
    version: u64,
}

#[derive(Debug)]
pub struct HistoryStore {
    items: VecDeque<HistoryItem>,
    version: u64,
    current: Option<usize>,
    path: Option<PathBuf>,
    file: Option<File>,
    /// `None` when history is turned off altogether.
    limit: Option<usize>,
    enabled: bool,
}

impl HistoryStore {
    /// Loads `path` if given. A file that can't be opened is logged and history runs
    /// in memory only.
    pub fn new(path: Option<PathBuf>, limit: Option<usize>) -> Self {
        let mut store = Self {
            items: VecDeque::new(),
            version: 0,
            current: None,
            path: None,
            file: None,
            limit,
            enabled: true,
        };
        store.load(path);
        store
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.history_file.clone(), config.effective_history_limit())
    }

    fn is_off(&self) -> bool { self.limit.is_none() }

    fn load(&mut self, path: Option<PathBuf>) {
        if self.is_off() {
            return;
        }
        self.path = path;
        if let Some(path) = self.path.clone() {
            match self.read_file(&path) {
                Ok(total) => {
                    if self.limit.is_some_and(|limit| total > limit) {
                        self.rewrite();
                    }
                }
                Err(err) => {
                    tracing::warn!(message = "can't open history file", path = ?path, error = ?err);
                }
            }
        }
        self.version += 1;
        self.push(Vec::new());
    }

    /// Returns how many non-empty lines the file had.
    fn read_file(&mut self, path: &Path) -> io::Result<usize> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        let mut total = 0;
        for line in BufReader::new(&file).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            total += 1;
            self.push(line.chars().collect());
            self.compact();
        }
        self.file = Some(file);
        Ok(total)
    }

    /// Replaces the file with the in-memory entries, via a temp file and a rename.
    fn rewrite(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let mut tmp_path = path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let outcome = (|| -> io::Result<File> {
            {
                let mut writer = BufWriter::new(File::create(&tmp_path)?);
                for item in &self.items {
                    writeln!(writer, "{}", item.source.iter().collect::<String>())?;
                }
                writer.flush()?;
            }
            std::fs::rename(&tmp_path, &path)?;
            OpenOptions::new().append(true).open(&path)
        })();

        match outcome {
            Ok(file) => self.file = Some(file),
            Err(err) => {
                tracing::warn!(message = "can't rewrite history file", path = ?path, error = ?err);
            }
        }
    }

    fn push(&mut self, source: Vec<char>) {
        self.items.push_back(HistoryItem {
            source,
            ..Default::default()
        });
        self.current = Some(self.items.len() - 1);
    }

    fn compact(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        while self.items.len() > limit && !self.items.is_empty() {
            self.items.pop_front();
            // An evicted entry can't stay current; fall back to the newest one.
            self.current = self.current.and_then(|it| it.checked_sub(1));
        }
        if self.current.is_none() {
            self.current = self.back_index();
        }
    }

    fn back_index(&self) -> Option<usize> { self.items.len().checked_sub(1) }

    fn shown(&self, item: &HistoryItem) -> Vec<char> {
        if item.version == self.version {
            item.draft.clone()
        } else {
            item.source.clone()
        }
    }

    /// What the item at `index` shows right now: its draft if edited in this version.
    #[must_use]
    pub fn show(&self, index: usize) -> Option<Vec<char>> {
        self.items.get(index).map(|it| self.shown(it))
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> { self.current }

    pub fn set_current_index(&mut self, index: usize) {
        if index < self.items.len() {
            self.current = Some(index);
        }
    }

    /// Submitted lines, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|it| !it.source.is_empty())
            .map(|it| it.source.iter().collect())
            .collect()
    }

    /// One step toward older lines. `None` at the oldest one.
    pub fn prev(&mut self) -> Option<Vec<char>> {
        let index = self.current?.checked_sub(1)?;
        self.current = Some(index);
        self.show(index)
    }

    /// One step toward newer lines. `None` when already on the line being edited.
    pub fn next(&mut self) -> Option<Vec<char>> {
        let index = self.current? + 1;
        if index >= self.items.len() {
            return None;
        }
        self.current = Some(index);
        self.show(index)
    }

    /// Records a submitted line and appends it to the file.
    ///
    /// # Errors
    ///
    /// If the file append fails. The line is recorded in memory anyway.
    pub fn commit(&mut self, line: &[char]) -> io::Result<()> {
        if !self.enabled || self.is_off() {
            return Ok(());
        }

        // Resubmitting the previous line unchanged only resets the edit slot.
        if let Some(back) = self.back_index()
            && let Some(prev) = back.checked_sub(1)
            && self.items[prev].source == line
        {
            self.reset_edit_slot(back);
            return Ok(());
        }
        if line.is_empty()
            && let Some(back) = self.back_index()
        {
            self.reset_edit_slot(back);
            return Ok(());
        }

        if let (Some(current), Some(back)) = (self.current, self.back_index())
            && current != back
        {
            // A recalled line was submitted: it goes in as a new entry and the
            // recalled one keeps its original text.
            self.current = Some(back);
        }

        let outcome = self.update(line, true);
        self.version += 1;
        self.push(Vec::new());
        outcome
    }

    fn reset_edit_slot(&mut self, back: usize) {
        self.current = Some(back);
        let item = &mut self.items[back];
        item.source.clear();
        item.draft.clear();
        self.version += 1;
    }

    /// Forgets all drafts and goes back to the edit slot. Used on Ctrl+C and Ctrl+D.
    pub fn revert(&mut self) {
        self.version += 1;
        self.current = self.back_index();
    }

    /// Stores `line` on the current item: as its draft, or (with `commit`) as its text,
    /// which is also appended to the file.
    ///
    /// # Errors
    ///
    /// If the file append fails.
    pub fn update(&mut self, line: &[char], commit: bool) -> io::Result<()> {
        if self.is_off() {
            return Ok(());
        }
        let Some(current) = self.current else {
            self.push(line.to_vec());
            self.compact();
            return Ok(());
        };

        let version = self.version;
        let item = &mut self.items[current];
        item.version = version;
        let mut outcome = Ok(());
        if commit {
            item.source = line.to_vec();
            if let Some(file) = self.file.as_mut() {
                let record = format!("{}\n", line.iter().collect::<String>());
                outcome = file.write_all(record.as_bytes()).and_then(|()| file.flush());
            }
        } else {
            item.draft.clear();
            item.draft.extend_from_slice(line);
        }
        self.compact();
        outcome
    }

    /// Newest match at or before the cursor item. On the cursor item itself only the
    /// text before `start` is searched. Returns `(item index, match offset)`.
    #[must_use]
    pub fn find_bck(
        &self,
        is_new_search: bool,
        needle: &[char],
        start: usize,
        fold: bool,
    ) -> Option<(usize, usize)> {
        let current = self.current?;
        let mut start = start;
        for index in (0..=current).rev() {
            let mut item = self.show(index)?;
            if is_new_search {
                start += needle.len();
            }
            if index == current && item.len() >= start {
                item.truncate(start);
            }
            if let Some(offset) = rfind(&item, needle, fold) {
                return Some((index, offset));
            }
        }
        None
    }

    /// Oldest match at or after the cursor item. On the cursor item itself only the
    /// text from `start` on is searched.
    #[must_use]
    pub fn find_fwd(
        &self,
        is_new_search: bool,
        needle: &[char],
        start: usize,
        fold: bool,
    ) -> Option<(usize, usize)> {
        let current = self.current?;
        let mut start = start;
        for index in current..self.items.len() {
            let item = self.show(index)?;
            if is_new_search {
                start = start.saturating_sub(needle.len());
            }
            let (hay, base) = if index == current {
                if item.len() <= start {
                    continue;
                }
                (&item[start..], start)
            } else {
                (&item[..], 0)
            };
            if let Some(offset) = find(hay, needle, fold) {
                return Some((index, offset + base));
            }
        }
        None
    }

    /// Stop recording submitted lines. Existing entries stay.
    pub fn disable(&mut self) { self.enabled = false; }

    pub fn enable(&mut self) { self.enabled = true; }

    #[must_use]
    pub fn is_enabled(&self) -> bool { self.enabled && !self.is_off() }

    /// Forgets every entry in memory. The file is untouched.
    pub fn reset(&mut self) {
        self.items.clear();
        self.current = None;
    }

    /// Closes the current file and loads `path` instead.
    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.close();
        self.items.clear();
        self.current = None;
        self.load(path);
    }

    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take()
            && let Err(err) = file.flush()
        {
            tracing::warn!(message = "can't flush history file", error = ?err);
        }
    }
}

fn chars_match(a: char, b: char, fold: bool) -> bool {
    a == b || (fold && a.to_lowercase().eq(b.to_lowercase()))
}

fn matches_at(hay: &[char], needle: &[char], at: usize, fold: bool) -> bool {
    hay[at..at + needle.len()]
        .iter()
        .zip(needle)
        .all(|(a, b)| chars_match(*a, *b, fold))
}

/// First offset of `needle` in `hay`.
#[must_use]
pub fn find(hay: &[char], needle: &[char], fold: bool) -> Option<usize> {
    let last = hay.len().checked_sub(needle.len())?;
    (0..=last).find(|&at| matches_at(hay, needle, at, fold))
}

/// Last offset of `needle` in `hay`.
#[must_use]
pub fn rfind(hay: &[char], needle: &[char], fold: bool) -> Option<usize> {
    let last = hay.len().checked_sub(needle.len())?;
    (0..=last).rev().find(|&at| matches_at(hay, needle, at, fold))
}
