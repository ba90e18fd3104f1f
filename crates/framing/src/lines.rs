use crate::FramingError;
use core_types::Line;

/// Default cap on a single buffered line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

/// Initial buffer capacity; capacity above `SHRINK_THRESHOLD` is released
/// whenever the buffer drains empty.
const INITIAL_CAPACITY: usize = 1024;
const SHRINK_THRESHOLD: usize = 64 * 1024;

/// Buffers input and emits a line whenever a newline is encountered.
///
/// The newline itself is not part of the emitted line. A `\r` preceding
/// the `\n` is left in place; interpreting it is the consumer's call.
///
/// One framer belongs to one connection. It is not internally
/// synchronized: callers that receive chunks from more than one thread wrap
/// it in a mutex and hold the lock until the `Lines` returned by
/// [`feed`](LineFramer::feed) is dropped.
pub struct LineFramer {
    buffer: Vec<u8>,
    // Absolute index in `buffer` up to which no newline exists.
    // Bytes before it are never rescanned.
    scan_from: usize,
    // Timestamp of the chunk that delivered the first byte currently buffered.
    start_timestamp_us: Option<u64>,
    max_line_len: Option<usize>,
    // Set after an overlong partial line was thrown away: everything up to
    // and including the next newline belongs to that line and is dropped too.
    discarding: bool,
}

impl LineFramer {
    /// Framer with the default line cap.
    pub fn new() -> Self {
        Self::with_max_line_len(Some(DEFAULT_MAX_LINE_LEN))
    }

    /// Framer that never discards, however long a line grows.
    pub fn unbounded() -> Self {
        Self::with_max_line_len(None)
    }

    pub fn with_max_line_len(max_line_len: Option<usize>) -> Self {
        Self {
            buffer: Vec::with_capacity(INITIAL_CAPACITY),
            scan_from: 0,
            start_timestamp_us: None,
            max_line_len,
            discarding: false,
        }
    }

    /// Append a chunk and return the lines it completes, lazily.
    ///
    /// Lines come out in arrival order, including complete lines left over
    /// from a previous `Lines` that was dropped before it was exhausted.
    /// Once the returned iterator is exhausted the buffer holds no newline.
    pub fn feed(&mut self, chunk: &[u8], timestamp_us: u64) -> Lines<'_> {
        // If buffer was empty, this chunk marks the start of the next line.
        if self.buffer.is_empty() {
            self.start_timestamp_us = Some(timestamp_us);
        }
        self.buffer.extend_from_slice(chunk);

        Lines {
            framer: self,
            consumed: 0,
            timestamp_us,
        }
    }

    /// Drop all buffered bytes and forget any partial line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scan_from = 0;
        self.start_timestamp_us = None;
        self.discarding = false;
        self.release_excess_capacity();
    }

    /// Bytes received but not yet resolved into a line.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_line_len(&self) -> Option<usize> {
        self.max_line_len
    }

    pub fn name(&self) -> &'static str {
        "Lines"
    }

    fn release_excess_capacity(&mut self) {
        if self.buffer.is_empty() && self.buffer.capacity() > SHRINK_THRESHOLD {
            self.buffer.shrink_to(INITIAL_CAPACITY);
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy sequence of lines produced by one [`LineFramer::feed`] call.
///
/// Each item is either a complete line or a report that an overlong line
/// was discarded. Dropping the iterator compacts the consumed prefix out of
/// the framer's buffer.
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
    // Logical front of the buffer: bytes before it have been emitted.
    consumed: usize,
    timestamp_us: u64,
}

impl Iterator for Lines<'_> {
    type Item = Result<Line, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let framer = &mut *self.framer;
            let newline = framer
                .buffer
                .get(framer.scan_from..)
                .and_then(|tail| tail.iter().position(|&b| b == b'\n'));

            let Some(offset) = newline else {
                return self.finish_partial();
            };

            let start = self.consumed;
            let end = framer.scan_from + offset;
            self.consumed = end + 1;
            framer.scan_from = self.consumed;

            let ts = framer.start_timestamp_us.unwrap_or(self.timestamp_us);
            // Whatever follows this newline arrived with the current chunk.
            framer.start_timestamp_us = Some(self.timestamp_us);

            if framer.discarding {
                framer.discarding = false;
                continue;
            }

            let len = end - start;
            if let Some(max) = framer.max_line_len {
                if len > max {
                    return Some(Err(FramingError::LineTooLong { discarded: len, max }));
                }
            }

            let bytes = framer
                .buffer
                .get(start..end)
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            return Some(Ok(Line::new(bytes, ts)));
        }
    }
}

impl Lines<'_> {
    /// No newline left: enforce the line cap on the trailing partial line.
    fn finish_partial(&mut self) -> Option<Result<Line, FramingError>> {
        let framer = &mut *self.framer;
        framer.scan_from = framer.buffer.len();

        let partial = framer.buffer.len() - self.consumed;
        if partial == 0 {
            return None;
        }

        if framer.discarding {
            framer.buffer.truncate(self.consumed);
            framer.scan_from = self.consumed;
            return None;
        }

        match framer.max_line_len {
            Some(max) if partial > max => {
                framer.buffer.truncate(self.consumed);
                framer.scan_from = self.consumed;
                framer.discarding = true;
                Some(Err(FramingError::LineTooLong {
                    discarded: partial,
                    max,
                }))
            }
            _ => None,
        }
    }
}

impl Drop for Lines<'_> {
    fn drop(&mut self) {
        let framer = &mut *self.framer;
        let consumed = self.consumed.min(framer.buffer.len());
        framer.buffer.drain(..consumed);
        framer.scan_from = framer.scan_from.saturating_sub(self.consumed);

        if framer.buffer.is_empty() {
            framer.scan_from = 0;
            framer.start_timestamp_us = None;
            framer.release_excess_capacity();
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn lines(framer: &mut LineFramer, chunk: &[u8], ts: u64) -> Vec<Vec<u8>> {
        framer
            .feed(chunk, ts)
            .map(|line| line.unwrap().bytes)
            .collect()
    }

    #[test]
    fn test_lines_simple() {
        let mut framer = LineFramer::new();
        let out: Vec<Line> = framer
            .feed(b"Hello\nWorld\n", 100)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bytes, b"Hello");
        assert_eq!(out[0].timestamp_us, 100);
        assert_eq!(out[1].bytes, b"World");
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_lines_split() {
        let mut framer = LineFramer::new();
        assert!(lines(&mut framer, b"Hel", 100).is_empty());
        assert_eq!(framer.pending(), b"Hel");

        let out: Vec<Line> = framer.feed(b"lo\n", 200).map(Result::unwrap).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bytes, b"Hello");
        // Should preserve the timestamp of the START of the line (T=100)
        assert_eq!(out[0].timestamp_us, 100);
    }

    #[test]
    fn test_line_started_mid_chunk_takes_that_chunk_timestamp() {
        let mut framer = LineFramer::new();
        assert_eq!(lines(&mut framer, b"a\nbc", 100), vec![b"a".to_vec()]);
        let out: Vec<Line> = framer.feed(b"d\n", 200).map(Result::unwrap).collect();
        assert_eq!(out[0].bytes, b"bcd");
        assert_eq!(out[0].timestamp_us, 100);
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        let mut framer = LineFramer::new();
        assert!(lines(&mut framer, b"", 100).is_empty());
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_lone_newline_is_empty_line() {
        let mut framer = LineFramer::new();
        assert_eq!(lines(&mut framer, b"\n", 100), vec![Vec::<u8>::new()]);
        assert_eq!(
            lines(&mut framer, b"\n\n", 100),
            vec![Vec::<u8>::new(), Vec::new()]
        );
    }

    #[test]
    fn test_crlf_preserved() {
        let mut framer = LineFramer::new();
        assert_eq!(lines(&mut framer, b"Test\r\n", 100), vec![b"Test\r".to_vec()]);
    }

    #[test]
    fn test_no_newline_buffered_after_feed() {
        let mut framer = LineFramer::new();
        let chunks: [&[u8]; 5] = [b"ab\ncd", b"\n\nef", b"g\nh", b"", b"\n"];
        for chunk in chunks {
            let _ = lines(&mut framer, chunk, 0);
            assert!(!framer.pending().contains(&b'\n'));
        }
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_every_split_point_yields_same_lines() {
        let input: &[u8] = b"abc=true\n\nxyz=false\r\nlast=fal";
        let expected = vec![b"abc=true".to_vec(), Vec::new(), b"xyz=false\r".to_vec()];

        for first in 0..=input.len() {
            for second in first..=input.len() {
                let mut framer = LineFramer::new();
                let mut out = lines(&mut framer, &input[..first], 1);
                out.extend(lines(&mut framer, &input[first..second], 2));
                out.extend(lines(&mut framer, &input[second..], 3));
                assert_eq!(out, expected, "split at {first}/{second}");
                assert_eq!(framer.pending(), b"last=fal");
            }
        }
    }

    #[test]
    fn test_early_drop_keeps_unread_lines() {
        let mut framer = LineFramer::new();
        {
            let mut it = framer.feed(b"one\ntwo\nthree\npart", 100);
            assert_eq!(it.next().unwrap().unwrap().bytes, b"one");
        }
        assert_eq!(framer.pending(), b"two\nthree\npart");

        assert_eq!(
            lines(&mut framer, b"ial\n", 200),
            vec![b"two".to_vec(), b"three".to_vec(), b"partial".to_vec()]
        );
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_complete_overlong_line_is_reported_and_dropped() {
        let mut framer = LineFramer::with_max_line_len(Some(4));
        let out: Vec<_> = framer.feed(b"ok\ntoolong\nfine\n", 0).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().bytes, b"ok");
        assert_eq!(
            out[1],
            Err(FramingError::LineTooLong {
                discarded: 7,
                max: 4
            })
        );
        assert_eq!(out[2].as_ref().unwrap().bytes, b"fine");
    }

    #[test]
    fn test_partial_overflow_discards_until_next_newline() {
        let mut framer = LineFramer::with_max_line_len(Some(4));

        let out: Vec<_> = framer.feed(b"abcdef", 0).collect();
        assert_eq!(
            out,
            vec![Err(FramingError::LineTooLong {
                discarded: 6,
                max: 4
            })]
        );
        assert_eq!(framer.pending_len(), 0);

        // Still inside the overlong line: dropped silently, reported once.
        assert!(framer.feed(b"ghijkl", 0).next().is_none());
        assert_eq!(framer.pending_len(), 0);

        // The newline ends the overlong line; the next one is framed normally.
        assert_eq!(lines(&mut framer, b"mn\nxy\n", 0), vec![b"xy".to_vec()]);
    }

    #[test]
    fn test_unbounded_accepts_long_lines() {
        let mut framer = LineFramer::unbounded();
        let long = vec![b'x'; 10_000];
        assert!(lines(&mut framer, &long, 0).is_empty());
        assert_eq!(framer.pending_len(), 10_000);
        assert_eq!(lines(&mut framer, b"\n", 0), vec![long]);
    }

    #[test]
    fn test_reset_clears_partial_and_discard_mode() {
        let mut framer = LineFramer::with_max_line_len(Some(2));
        let _ = framer.feed(b"abc", 0).count();
        framer.reset();
        assert_eq!(framer.pending_len(), 0);
        assert_eq!(lines(&mut framer, b"ok\n", 0), vec![b"ok".to_vec()]);

        let _ = lines(&mut framer, b"x", 0);
        framer.reset();
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_reset_releases_oversized_capacity() {
        let mut framer = LineFramer::unbounded();
        let _ = framer.feed(&vec![b'x'; 100_000], 0).count();
        assert!(framer.buffer.capacity() >= 100_000);

        framer.reset();
        assert!(framer.buffer.capacity() <= SHRINK_THRESHOLD);
    }

    #[test]
    fn test_drained_buffer_releases_oversized_capacity() {
        let mut framer = LineFramer::unbounded();
        let _ = framer.feed(&vec![b'x'; 100_000], 0).count();
        assert_eq!(lines(&mut framer, b"\n", 1).len(), 1);

        assert_eq!(framer.pending_len(), 0);
        assert!(framer.buffer.capacity() <= SHRINK_THRESHOLD);
    }

    #[test]
    fn test_name_and_defaults() {
        let framer = LineFramer::default();
        assert_eq!(framer.name(), "Lines");
        assert_eq!(framer.max_line_len(), Some(DEFAULT_MAX_LINE_LEN));
        assert_eq!(LineFramer::unbounded().max_line_len(), None);
    }
}
