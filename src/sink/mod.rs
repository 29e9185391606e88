//! Extracted-record types and sinks
//!
//! A [`Record`] is the unit of extraction: an ordered mapping from
//! normalized field names to scalar or list values. Records are handed to a
//! [`RecordSink`] one at a time as leaves are processed; the sink decides
//! what persistence means. The crawler never retains a record after the
//! sink has accepted it, so partial output from an interrupted run stays
//! valid.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while emitting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// A single field value: scalar text or an ordered list of texts
///
/// Lists come from nested sub-lists on leaf pages (one level of nesting
/// only); everything else is a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// One extracted leaf record
///
/// Field names are normalized before insertion, so iteration order (and
/// serialized key order) is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar field, replacing any previous value under the key
    pub fn set_scalar(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields
            .insert(key.into(), FieldValue::Scalar(value.into()));
    }

    /// Sets a list field, replacing any previous value under the key
    pub fn set_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.fields.insert(key.into(), FieldValue::List(values));
    }

    /// Looks up a field by normalized name
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Number of fields in the record
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record carries no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in key order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

/// Trait for record consumers
///
/// Called once per successfully extracted leaf; no batching is implied.
pub trait RecordSink {
    /// Accepts one extracted record
    fn accept(&mut self, record: &Record) -> SinkResult<()>;
}

/// File-backed sink writing one JSON object per line
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the record file at `path`
    pub fn create(path: &Path) -> SinkResult<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn accept(&mut self, record: &Record) -> SinkResult<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", line)?;
        // One record per flush: records already emitted survive an
        // interrupted or cancelled run.
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink, used by tests and dry inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<Record>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records accepted so far, in arrival order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn accept(&mut self, record: &Record) -> SinkResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let mut record = Record::new();
        record.set_scalar("grape", "chardonnay");
        record.set_list("climate", vec!["cool".to_string(), "maritime".to_string()]);
        record
    }

    #[test]
    fn test_scalar_roundtrip() {
        let record = sample_record();
        assert_eq!(
            record.get("grape"),
            Some(&FieldValue::Scalar("chardonnay".to_string()))
        );
    }

    #[test]
    fn test_list_roundtrip() {
        let record = sample_record();
        assert_eq!(
            record.get("climate"),
            Some(&FieldValue::List(vec![
                "cool".to_string(),
                "maritime".to_string()
            ]))
        );
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"climate":["cool","maritime"],"grape":"chardonnay"}"#
        );
    }

    #[test]
    fn test_memory_sink_keeps_arrival_order() {
        let mut sink = MemorySink::new();
        let mut first = Record::new();
        first.set_scalar("title", "chablis");
        let mut second = Record::new();
        second.set_scalar("title", "meursault");

        sink.accept(&first).unwrap();
        sink.accept(&second).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("title"),
            Some(&FieldValue::Scalar("chablis".to_string()))
        );
        assert_eq!(
            records[1].get("title"),
            Some(&FieldValue::Scalar("meursault".to_string()))
        );
    }

    #[test]
    fn test_json_lines_sink_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");

        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.accept(&sample_record()).unwrap();
        sink.accept(&sample_record()).unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["grape"], "chardonnay");
        }
    }
}
