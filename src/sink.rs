//! Output sinks for transcriptions and their translations.
//!
//! Transcriptions arrive on the worker thread; translations arrive
//! later, on runtime threads, and are applied to the most recent entry.
//! Sinks therefore take `&self` and synchronize internally.

use crate::error::Result;
use crate::types::{TranscriptionResult, TranslationResult};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Trait for transcript consumers.
pub trait DisplaySink: Send + Sync {
    /// Shows a new transcription entry.
    ///
    /// `level` is the input level at emission time, for sinks that
    /// render a meter alongside the caption.
    fn show_transcription(&self, result: &TranscriptionResult, level: f32) -> Result<()>;

    /// Attaches a translation to the most recent entry.
    ///
    /// Correlation is by recency: translations are dispatched in entry
    /// order and a late translation for an older entry is an accepted
    /// inaccuracy of live captioning.
    fn apply_translation(&self, translation: &TranslationResult) -> Result<()>;
}

/// Sink that prints timestamped captions to stdout.
///
/// Transcriptions print as `[HH:MM:SS] text`; translations print
/// indented beneath the entry they follow.
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a console sink.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for ConsoleSink {
    fn show_transcription(&self, result: &TranscriptionResult, _level: f32) -> Result<()> {
        println!("[{}] {}", Local::now().format("%H:%M:%S"), result.text);
        Ok(())
    }

    fn apply_translation(&self, translation: &TranslationResult) -> Result<()> {
        println!("    ➜ {}", translation.translated_text);
        Ok(())
    }
}

/// Sink that appends a session transcript to a file.
///
/// Each entry is one line, `HH:MM:SS<TAB>text`; translations append a
/// tab-indented line after their entry. The file survives crashes of
/// downstream consumers and doubles as a session log.
pub struct BackupSink {
    file: Mutex<File>,
}

impl BackupSink {
    /// Opens (or creates) the session file in append mode.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DisplaySink for BackupSink {
    fn show_transcription(&self, result: &TranscriptionResult, _level: f32) -> Result<()> {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(
            file,
            "{}\t{}",
            Local::now().format("%H:%M:%S"),
            result.text
        )?;
        file.flush()?;
        Ok(())
    }

    fn apply_translation(&self, translation: &TranslationResult) -> Result<()> {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(
            file,
            "\t({}) {}",
            translation.target_language, translation.translated_text
        )?;
        file.flush()?;
        Ok(())
    }
}

/// One collected entry: transcription text, the input level at emission
/// time, and the translation once it arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedEntry {
    pub text: String,
    pub level: f32,
    pub translation: Option<String>,
}

/// In-memory sink for tests and embedding.
#[derive(Default)]
pub struct CollectorSink {
    entries: Mutex<Vec<CollectedEntry>>,
}

impl CollectorSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all collected entries.
    pub fn entries(&self) -> Vec<CollectedEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of collected entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DisplaySink for CollectorSink {
    fn show_transcription(&self, result: &TranscriptionResult, level: f32) -> Result<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).push(CollectedEntry {
            text: result.text.clone(),
            level,
            translation: None,
        });
        Ok(())
    }

    fn apply_translation(&self, translation: &TranslationResult) -> Result<()> {
        if let Some(last) = self.entries.lock().unwrap_or_else(|e| e.into_inner()).last_mut() {
            last.translation = Some(translation.translated_text.clone());
        }
        Ok(())
    }
}

/// Fans a transcription out to several sinks; errors are logged per
/// sink so one failing sink does not starve the others.
pub struct MultiSink {
    sinks: Vec<Box<dyn DisplaySink>>,
}

impl MultiSink {
    /// Create a fan-out over the given sinks.
    pub fn new(sinks: Vec<Box<dyn DisplaySink>>) -> Self {
        Self { sinks }
    }
}

impl DisplaySink for MultiSink {
    fn show_transcription(&self, result: &TranscriptionResult, level: f32) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.show_transcription(result, level) {
                eprintln!("transvox: sink error: {}", e);
            }
        }
        Ok(())
    }

    fn apply_translation(&self, translation: &TranslationResult) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.apply_translation(translation) {
                eprintln!("transvox: sink error: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcription(text: &str) -> TranscriptionResult {
        TranscriptionResult::new(text.to_string(), "en".to_string(), 0.9)
    }

    fn translation(text: &str) -> TranslationResult {
        TranslationResult {
            translated_text: text.to_string(),
            source_language: "en".to_string(),
            target_language: "pt".to_string(),
        }
    }

    #[test]
    fn test_collector_records_entries_in_order() {
        let sink = CollectorSink::new();
        sink.show_transcription(&transcription("one"), 0.5).unwrap();
        sink.show_transcription(&transcription("two"), 0.5).unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "one");
        assert_eq!(entries[1].text, "two");
    }

    #[test]
    fn test_collector_applies_translation_to_last_entry() {
        let sink = CollectorSink::new();
        sink.show_transcription(&transcription("hello"), 0.5).unwrap();
        sink.show_transcription(&transcription("world"), 0.5).unwrap();
        sink.apply_translation(&translation("mundo")).unwrap();

        let entries = sink.entries();
        assert_eq!(entries[0].translation, None);
        assert_eq!(entries[1].translation.as_deref(), Some("mundo"));
    }

    #[test]
    fn test_collector_translation_without_entry_is_noop() {
        let sink = CollectorSink::new();
        sink.apply_translation(&translation("mundo")).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_backup_sink_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.txt");

        let sink = BackupSink::open(&path).unwrap();
        sink.show_transcription(&transcription("hello"), 0.5).unwrap();
        sink.apply_translation(&translation("olá")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let first = lines.next().unwrap();
        assert!(first.ends_with("\thello"), "got {:?}", first);
        assert_eq!(lines.next().unwrap(), "\t(pt) olá");
    }

    #[test]
    fn test_backup_sink_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.txt");

        {
            let sink = BackupSink::open(&path).unwrap();
            sink.show_transcription(&transcription("first"), 0.5).unwrap();
        }
        {
            let sink = BackupSink::open(&path).unwrap();
            sink.show_transcription(&transcription("second"), 0.5).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_multi_sink_fans_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.txt");

        let multi = MultiSink::new(vec![
            Box::new(CollectorSink::new()),
            Box::new(BackupSink::open(&path).unwrap()),
        ]);
        multi.show_transcription(&transcription("hello"), 0.5).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("hello"));
    }
}
