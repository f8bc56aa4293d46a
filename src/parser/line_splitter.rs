//! Incremental line reassembly.
//!
//! Input arrives in chunks that have no relation to record boundaries.
//! `LineSplitter` hands out every complete line (terminator included) in
//! arrival order and carries the unterminated tail over to the next chunk.

use std::mem;

/// Splits a chunked byte stream into line-feed terminated records
///
/// **Public** - driven by the pipeline for every chunk read
#[derive(Debug, Default)]
pub struct LineSplitter {
    /// Unterminated bytes left over from previous chunks
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, calling `on_line` for each line it completes
    ///
    /// Lines are passed with their trailing `\n`. Stops at the first error
    /// returned by the callback.
    pub fn push<E, F>(&mut self, chunk: &[u8], mut on_line: F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (line, tail) = rest.split_at(pos + 1);
            rest = tail;

            if self.pending.is_empty() {
                on_line(line)?;
            } else {
                self.pending.extend_from_slice(line);
                let joined = mem::take(&mut self.pending);
                on_line(&joined)?;
            }
        }

        self.pending.extend_from_slice(rest);
        Ok(())
    }

    /// Take the final unterminated record, if any, at end of stream
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(mem::take(&mut self.pending))
        }
    }

    /// Bytes currently held back waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn collect(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
        let mut splitter = LineSplitter::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            splitter
                .push(chunk, |line| {
                    lines.push(line.to_vec());
                    Ok::<_, Infallible>(())
                })
                .unwrap();
        }
        lines.extend(splitter.finish());
        lines
    }

    #[test]
    fn test_single_chunk() {
        let lines = collect(&[b"a,b\nc,d\n"]);
        assert_eq!(lines, vec![b"a,b\n".to_vec(), b"c,d\n".to_vec()]);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let lines = collect(&[b"Sta", b"ck, 1", b",2\nT-", b"Start\n"]);
        assert_eq!(lines, vec![b"Stack, 1,2\n".to_vec(), b"T-Start\n".to_vec()]);
    }

    #[test]
    fn test_residual_delivered_once() {
        let mut splitter = LineSplitter::new();
        let mut count = 0;
        splitter
            .push(b"one\ntwo", |_| {
                count += 1;
                Ok::<_, Infallible>(())
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(splitter.pending_len(), 3);
        assert_eq!(splitter.finish(), Some(b"two".to_vec()));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_empty_lines_and_chunks() {
        let lines = collect(&[b"", b"\n", b"", b"\nx"]);
        assert_eq!(lines, vec![b"\n".to_vec(), b"\n".to_vec(), b"x".to_vec()]);
    }

    #[test]
    fn test_callback_error_stops_processing() {
        let mut splitter = LineSplitter::new();
        let mut seen = 0;
        let result = splitter.push(b"a\nb\nc\n", |_| {
            seen += 1;
            if seen == 2 {
                Err("boom")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(seen, 2);
    }
}
