//! Log of the calls issued against the registry in this session.
//!
//! Entries are appended once and never removed. Undo and redo issue a new,
//! unlogged call against the remote service and only flip `undone` on the
//! existing entry once that call has succeeded.

use crate::mreg::error::HistoryError;
use crate::mreg::http::Transport;
use crate::mreg::util::Fields;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write;

/// Deletes are recorded as not redoable unless the caller says otherwise.
pub const DELETE_REDOABLE: bool = false;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub seq: usize,
    pub method: Method,
    /// target url, including any query string
    pub url: String,
    /// resource label, may be empty
    pub name: String,
    /// state before the call (undo of PATCH and DELETE)
    pub old_data: Fields,
    /// payload of the call (redo, and the identity used to undo a POST)
    pub new_data: Fields,
    pub undoable: bool,
    pub redoable: bool,
    pub undone: bool,
    pub recorded_at: DateTime<Local>,
}

impl HistoryEntry {
    /// Url of the resource a recorded POST created.
    fn created_url(&self) -> String {
        let base = self.url.split('?').next().unwrap_or_default();
        if base.ends_with('/') {
            format!("{}{}", base, self.name)
        } else {
            format!("{}/{}", base, self.name)
        }
    }

    /// Url of the collection a deleted resource belonged to.
    fn collection_url(&self) -> String {
        let base = self.url.split('?').next().unwrap_or_default();
        let trimmed = base.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(i) => String::from(&trimmed[..=i]),
            None => String::from(base),
        }
    }
}

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, seq: usize) -> Option<&HistoryEntry> {
        // sequence numbers are dense and start at 1
        seq.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    fn get_mut(&mut self, seq: usize) -> Option<&mut HistoryEntry> {
        seq.checked_sub(1).and_then(move |i| self.entries.get_mut(i))
    }

    fn push(
        &mut self,
        method: Method,
        url: &str,
        name: &str,
        old_data: Fields,
        new_data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> usize {
        let seq = self.entries.len() + 1;
        tracing::debug!(seq, %method, url, undoable, redoable, "recorded history entry");
        self.entries.push(HistoryEntry {
            seq,
            method,
            url: String::from(url),
            name: String::from(name),
            old_data,
            new_data,
            undoable,
            redoable,
            undone: false,
            recorded_at: Local::now(),
        });
        seq
    }

    pub fn record_get(&mut self, url: &str) -> usize {
        self.push(Method::Get, url, "", Fields::new(), Fields::new(), false, false)
    }

    pub fn record_post(
        &mut self,
        url: &str,
        name: &str,
        new_data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> usize {
        // without a name there is no url to delete on undo
        let undoable = undoable && !name.is_empty();
        self.push(Method::Post, url, name, Fields::new(), new_data, undoable, redoable)
    }

    pub fn record_patch(
        &mut self,
        url: &str,
        new_data: Fields,
        old_data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> usize {
        let new_keys: BTreeSet<&String> = new_data.keys().collect();
        let old_keys: BTreeSet<&String> = old_data.keys().collect();
        assert_eq!(
            new_keys, old_keys,
            "PATCH history for {} must snapshot the same fields before and after",
            url
        );
        self.push(Method::Patch, url, "", old_data, new_data, undoable, redoable)
    }

    pub fn record_delete(
        &mut self,
        url: &str,
        old_data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> usize {
        self.push(Method::Delete, url, "", old_data, Fields::new(), undoable, redoable)
    }

    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::from("history is empty\n");
        }
        let url_width = self.entries.iter().map(|e| e.url.len()).max().unwrap_or(0);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>4}  {:<8}  {:<6}  {:<uw$}  {:<24}  {}",
            "#",
            "time",
            "method",
            "url",
            "name",
            "flags",
            uw = url_width
        );
        for e in &self.entries {
            let mut flags = Vec::new();
            if e.undone {
                flags.push("undone");
            }
            if e.undoable {
                flags.push("undoable");
            }
            if e.redoable {
                flags.push("redoable");
            }
            let _ = writeln!(
                out,
                "{:>4}  {:<8}  {:<6}  {:<uw$}  {:<24}  {}",
                e.seq,
                e.recorded_at.format("%H:%M:%S"),
                e.method,
                e.url,
                e.name,
                flags.join(","),
                uw = url_width
            );
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    /// Reverses the effect of entry `seq` on the remote service.
    pub fn undo(&mut self, seq: usize, transport: &dyn Transport) -> Result<(), HistoryError> {
        let entry = self.get(seq).ok_or(HistoryError::InvalidArgument(seq))?;
        if !entry.undoable {
            return Err(HistoryError::NotUndoable(seq));
        }
        if entry.undone {
            return Err(HistoryError::AlreadyUndone(seq));
        }
        let res = match entry.method {
            Method::Post => transport.delete(&entry.created_url()),
            Method::Patch => transport.patch(&entry.url, &entry.old_data),
            Method::Delete => transport.post(&entry.collection_url(), &entry.old_data),
            Method::Get => return Err(HistoryError::NotUndoable(seq)),
        };
        res.map_err(|source| HistoryError::UpstreamFailure { seq, source })?;
        if let Some(entry) = self.get_mut(seq) {
            entry.undone = true;
        }
        tracing::info!(seq, "undid history entry");
        Ok(())
    }

    /// Re-issues the original call of an undone entry `seq`.
    pub fn redo(&mut self, seq: usize, transport: &dyn Transport) -> Result<(), HistoryError> {
        let entry = self.get(seq).ok_or(HistoryError::InvalidArgument(seq))?;
        if !entry.redoable {
            return Err(HistoryError::NotRedoable(seq));
        }
        if !entry.undone {
            return Err(HistoryError::AlreadyApplied(seq));
        }
        let res = match entry.method {
            Method::Post => transport.post(&entry.url, &entry.new_data),
            Method::Patch => transport.patch(&entry.url, &entry.new_data),
            Method::Delete => transport.delete(&entry.url),
            Method::Get => return Err(HistoryError::NotRedoable(seq)),
        };
        res.map_err(|source| HistoryError::UpstreamFailure { seq, source })?;
        if let Some(entry) = self.get_mut(seq) {
            entry.undone = false;
        }
        tracing::info!(seq, "redid history entry");
        Ok(())
    }
}
