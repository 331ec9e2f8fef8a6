//! Incremental decoder for the `data:` lines of an upstream event stream.
//!
//! Network chunks do not line up with SSE lines, so bytes are buffered until a
//! newline arrives. Only `data:` fields are surfaced; comments, `event:`/`id:`
//! fields and blank separators are skipped.

use thiserror::Error;

// a single chunk line is a few hundred bytes; anything this long is not SSE
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Data(String),
    Done,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("event stream line exceeds {limit} bytes")]
pub struct LineTooLong {
    pub limit: usize,
}

#[derive(Debug)]
pub struct SseDecoder {
    buf: Vec<u8>,
    // bytes of buf already known to hold no newline
    scanned: usize,
    max_line: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_line,
        }
    }

    /// Feed raw bytes, returning every complete `data:` line they finish.
    ///
    /// Fails once a line grows past the limit without a newline.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseLine>, LineTooLong> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let pos = self.scanned + offset;
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            self.scanned = 0;
            if let Some(line) = parse_line(&raw) {
                lines.push(line);
            }
        }
        self.scanned = self.buf.len();

        if self.buf.len() > self.max_line {
            self.buf.clear();
            self.scanned = 0;
            return Err(LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(lines)
    }

    /// Flush a trailing line that never got its newline.
    pub fn finish(&mut self) -> Option<SseLine> {
        let rest = std::mem::take(&mut self.buf);
        self.scanned = 0;
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseLine> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    match data {
        "" => None,
        "[DONE]" => Some(SseLine::Done),
        payload => Some(SseLine::Data(payload.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_events() {
        let mut dec = SseDecoder::new();
        let lines = dec.feed(b"data: {\"a\":1}\n\ndata: [DONE]\n\n").unwrap();
        assert_eq!(
            lines,
            vec![SseLine::Data("{\"a\":1}".to_string()), SseLine::Done]
        );
    }

    #[test]
    fn joins_lines_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"data: {\"con").unwrap().is_empty());
        assert!(dec.feed(b"tent\":\"hi\"}").unwrap().is_empty());
        assert_eq!(
            dec.feed(b"\r\n\r\n").unwrap(),
            vec![SseLine::Data("{\"content\":\"hi\"}".to_string())]
        );
    }

    #[test]
    fn keeps_multibyte_characters_split_mid_sequence() {
        let text = "data: héllo 😂\n".as_bytes();
        let mut dec = SseDecoder::new();
        let mut out = Vec::new();
        for byte in text {
            out.extend(dec.feed(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(out, vec![SseLine::Data("héllo 😂".to_string())]);
    }

    #[test]
    fn skips_non_data_fields() {
        let mut dec = SseDecoder::new();
        let lines = dec.feed(b": keep-alive\nevent: message\nid: 7\ndata:x\n").unwrap();
        assert_eq!(lines, vec![SseLine::Data("x".to_string())]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"data: [DONE]").unwrap().is_empty());
        assert_eq!(dec.finish(), Some(SseLine::Done));
        assert_eq!(dec.finish(), None);
    }

    #[test]
    fn overlong_line_is_rejected() {
        let mut dec = SseDecoder::with_max_line(16);
        assert!(dec.feed(b"data: 0123456789").unwrap().is_empty());
        assert_eq!(dec.feed(b"abcdef"), Err(LineTooLong { limit: 16 }));
    }

    #[test]
    fn long_stream_of_short_lines_is_fine() {
        let mut dec = SseDecoder::with_max_line(16);
        for _ in 0..100 {
            assert_eq!(dec.feed(b"data: ab\n").unwrap(), vec![SseLine::Data("ab".into())]);
        }
    }
}
