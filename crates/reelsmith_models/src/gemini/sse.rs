//! Incremental server-sent events decoder.

/// Splits a byte stream into SSE `data` payloads.
///
/// Bytes are buffered until a blank line ends an event, so events and
/// multi-byte characters may be split across network chunks.
///
/// # Examples
///
/// ```
/// use reelsmith_models::SseDecoder;
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.push(b"data: {\"a\"").is_empty());
/// assert_eq!(decoder.push(b":1}\n\ndata: 2\n\n"), vec!["{\"a\":1}", "2"]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed bytes, returning the payload of every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, separator)) = find_boundary(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + separator).collect();
            if let Some(data) = event_data(&event[..end]) {
                events.push(data);
            }
        }
        events
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        event_data(&rest)
    }
}

fn find_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|index| (index, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|index| (index, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn event_data(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
