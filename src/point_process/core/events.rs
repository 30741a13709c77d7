//! Events and per-entity sequences — merging and corpus parsing.
//!
//! Purpose
//! -------
//! Provide the event tuple shared by every stage of the likelihood pass and
//! the two ways events enter the stack: merging a batch of per-entity
//! sequences into one globally time-sorted stream, and parsing the plain-text
//! corpus format used for single-mark data sets.
//!
//! Key behaviors
//! -------------
//! - [`Event`] carries `(time, entity, marks)`; the categorical label used for
//!   type prediction is the last mark.
//! - [`merge_sequences`] tags each raw `(time, marks)` pair with its batch
//!   position and sorts by `(time, entity, marks)`.
//! - [`parse_corpus`] reads one sequence per line from any `BufRead`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Event times are finite; [`merge_sequences`] rejects NaN/±inf.
//! - Entity ids are batch-local positions `0..N-1`.
//!
//! Conventions
//! -----------
//! - Raw sequences are not required to be sorted; merging sorts globally.
//! - This module performs no filtering against the modeling window; that is
//!   the grid builder's job.
//!
//! Testing notes
//! -------------
//! - Unit tests cover merge ordering and tagging, non-finite rejection, and
//!   corpus parsing (happy path, blank lines, malformed tokens, line caps).
use crate::point_process::errors::{PPError, PPResult};
use std::{cmp::Ordering, io::BufRead};

/// One raw observation inside an entity's sequence: `(time, marks)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub time: f64,
    pub marks: Vec<usize>,
}

impl RawEvent {
    pub fn new(time: f64, marks: Vec<usize>) -> RawEvent {
        RawEvent { time, marks }
    }

    /// Single-mark event, the shape produced by [`parse_corpus`].
    pub fn with_mark(time: f64, mark: usize) -> RawEvent {
        RawEvent { time, marks: vec![mark] }
    }
}

/// Ordered list of raw events belonging to one entity.
pub type Sequence = Vec<RawEvent>;

/// Event — a time-stamped, entity-tagged, marked observation.
///
/// Fields
/// ------
/// - `time`: `f64`
///   Event time. After grid alignment this is the rounded time.
/// - `entity`: `usize`
///   Batch-local id of the originating sequence.
/// - `marks`: `Vec<usize>`
///   Mark values; the last one is the categorical label.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: f64,
    pub entity: usize,
    pub marks: Vec<usize>,
}

impl Event {
    pub fn new(time: f64, entity: usize, marks: Vec<usize>) -> Event {
        Event { time, entity, marks }
    }

    /// Categorical label compared against the predicted mark.
    pub fn label(&self) -> Option<usize> {
        self.marks.last().copied()
    }

    /// Natural tuple order: time first, then entity, then marks.
    fn tuple_cmp(&self, other: &Event) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.entity.cmp(&other.entity))
            .then_with(|| self.marks.cmp(&other.marks))
    }
}

/// Merge a batch of per-entity sequences into one time-sorted event stream.
///
/// Parameters
/// ----------
/// - `batch`: `&[Sequence]`
///   One sequence per entity; position in the slice becomes the entity id.
///
/// Returns
/// -------
/// `PPResult<Vec<Event>>`
///   Every event of the batch, tagged with its entity and sorted by
///   `(time, entity, marks)`.
///
/// Errors
/// ------
/// - `PPError::EmptyBatch` when `batch` is empty.
/// - `PPError::NonFiniteTime` for the first NaN/±inf time found.
pub fn merge_sequences(batch: &[Sequence]) -> PPResult<Vec<Event>> {
    if batch.is_empty() {
        return Err(PPError::EmptyBatch);
    }
    let mut merged = Vec::with_capacity(batch.iter().map(Vec::len).sum());
    for (entity, sequence) in batch.iter().enumerate() {
        for (index, raw) in sequence.iter().enumerate() {
            if !raw.time.is_finite() {
                return Err(PPError::NonFiniteTime { entity, index, value: raw.time });
            }
            merged.push(Event::new(raw.time, entity, raw.marks.clone()));
        }
    }
    merged.sort_by(Event::tuple_cmp);
    Ok(merged)
}

/// Parse a single-mark corpus: one entity per line, the first `;`-delimited
/// field holds whitespace-separated timestamps, every event gets mark `0`.
///
/// At most `max_sequences` lines are read when a cap is given. Blank lines
/// become empty sequences.
///
/// # Errors
/// - `PPError::MalformedCorpus` for a token that does not parse as `f64`
///   (line numbers are 1-based). Read failures surface through the same
///   variant with the I/O message as token.
pub fn parse_corpus<R: BufRead>(reader: R, max_sequences: Option<usize>) -> PPResult<Vec<Sequence>> {
    let cap = max_sequences.unwrap_or(usize::MAX);
    let mut sequences = Vec::new();
    for (line_no, line) in reader.lines().take(cap).enumerate() {
        let line = line
            .map_err(|e| PPError::MalformedCorpus { line: line_no + 1, token: e.to_string() })?;
        let times_field = line.split(';').next().unwrap_or("");
        let sequence = times_field
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map(|t| RawEvent::with_mark(t, 0)).map_err(|_| {
                    PPError::MalformedCorpus { line: line_no + 1, token: token.to_string() }
                })
            })
            .collect::<PPResult<Sequence>>()?;
        sequences.push(sequence);
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Global ordering and entity tagging in `merge_sequences`.
    // - Rejection of empty batches and non-finite times.
    // - Corpus parsing through `parse_corpus`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that merging interleaves entities by time and tags each event
    // with its batch position.
    //
    // Given
    // -----
    // - Entity 0 at times {0.5, 2.0}, entity 1 at times {1.0, 0.2}.
    //
    // Expect
    // ------
    // - Order (0.2, 1), (0.5, 0), (1.0, 1), (2.0, 0).
    fn merge_sequences_sorts_globally_and_tags_entities() {
        let batch = vec![
            vec![RawEvent::with_mark(0.5, 0), RawEvent::with_mark(2.0, 1)],
            vec![RawEvent::with_mark(1.0, 0), RawEvent::with_mark(0.2, 2)],
        ];

        let merged = merge_sequences(&batch).unwrap();

        let order: Vec<(f64, usize)> = merged.iter().map(|e| (e.time, e.entity)).collect();
        assert_eq!(order, vec![(0.2, 1), (0.5, 0), (1.0, 1), (2.0, 0)]);
        assert_eq!(merged[0].label(), Some(2));
    }

    #[test]
    // Purpose
    // -------
    // Ties on time are broken by entity id, matching tuple order.
    fn merge_sequences_breaks_time_ties_by_entity() {
        let batch = vec![vec![RawEvent::with_mark(1.0, 0)], vec![RawEvent::with_mark(1.0, 0)]];

        let merged = merge_sequences(&batch).unwrap();

        assert_eq!(merged[0].entity, 0);
        assert_eq!(merged[1].entity, 1);
    }

    #[test]
    fn merge_sequences_rejects_empty_batch() {
        assert_eq!(merge_sequences(&[]).unwrap_err(), PPError::EmptyBatch);
    }

    #[test]
    // Purpose
    // -------
    // Non-finite times are reported with their entity and in-sequence index.
    fn merge_sequences_rejects_non_finite_time() {
        let batch = vec![vec![RawEvent::with_mark(0.1, 0)], vec![
            RawEvent::with_mark(0.3, 0),
            RawEvent::with_mark(f64::NAN, 0),
        ]];

        let err = merge_sequences(&batch).unwrap_err();

        assert!(matches!(err, PPError::NonFiniteTime { entity: 1, index: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify corpus parsing keeps only the first `;` field, assigns mark 0,
    // keeps blank lines as empty sequences, and honours the line cap.
    fn parse_corpus_reads_first_field_with_zero_marks() {
        let text = "0.5 1.25 3.0;ignored 9\n\n2.0\n4.0\n";

        let seqs = parse_corpus(Cursor::new(text), Some(3)).unwrap();

        assert_eq!(seqs.len(), 3);
        assert_eq!(seqs[0], vec![
            RawEvent::with_mark(0.5, 0),
            RawEvent::with_mark(1.25, 0),
            RawEvent::with_mark(3.0, 0),
        ]);
        assert!(seqs[1].is_empty());
        assert_eq!(seqs[2], vec![RawEvent::with_mark(2.0, 0)]);
    }

    #[test]
    fn parse_corpus_reports_malformed_token_with_line_number() {
        let text = "0.5 1.0\n0.7 abc\n";

        let err = parse_corpus(Cursor::new(text), None).unwrap_err();

        assert_eq!(err, PPError::MalformedCorpus { line: 2, token: "abc".to_string() });
    }
}
