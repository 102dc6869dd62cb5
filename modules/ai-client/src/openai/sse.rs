//! Incremental decoder for `text/event-stream` bodies.

/// One decoded event. Only the `data:` lines matter for chat completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub data: String,
}

impl SseFrame {
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Buffers raw body bytes and yields complete frames. Network chunks can split
/// a frame (or a UTF-8 sequence) anywhere, so nothing is decoded until the
/// blank-line delimiter has arrived.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((end, delim_len)) = find_delimiter(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..end + delim_len).take(end).collect();
            if let Some(frame) = parse_frame(&raw) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Whatever is left once the body ends without a trailing blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let raw = std::mem::take(&mut self.buf);
        parse_frame(&raw)
    }
}

fn find_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    (0..buf.len()).find_map(|i| {
        if buf[i..].starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if buf[i..].starts_with(b"\n\n") {
            Some((i, 2))
        } else {
            None
        }
    })
}

fn parse_frame(bytes: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(bytes);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();
    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        data: data.join("\n"),
    })
}
