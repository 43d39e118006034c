//! Incremental `text/event-stream` scanning.
//!
//! The scanner is an explicit buffer + line splitter + event accumulator,
//! deliberately independent of the transport's chunking granularity: an
//! event spanning several network reads, or a final chunk lacking its
//! trailing newline, parses the same as a cleanly framed one.

/// Accumulates SSE chunks and yields completed event payloads.
///
/// Per the event-stream framing, `data:` lines accumulate until a blank
/// line terminates one event; multi-line data is joined with `\n`.
/// Comment lines (leading `:`) and non-`data` fields are ignored.
#[derive(Debug, Default)]
pub struct EventStreamScanner {
    buffer: String,
    data_lines: Vec<String>,
}

impl EventStreamScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the data payloads of every event the
    /// chunk completed, in order.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.take_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes at end of input: a final line without a trailing newline
    /// still counts, and a pending data block becomes one last event.
    pub fn finish(&mut self) -> Option<String> {
        let mut last = None;
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            last = self.take_line(line.trim_end_matches('\r'));
        }
        if last.is_none() && !self.data_lines.is_empty() {
            last = Some(self.flush_event());
        }
        last
    }

    /// Everything fed so far, reassembled. Used for diagnostics when no
    /// event ever parsed.
    pub fn residue(&self) -> String {
        let mut out = self.data_lines.join("\n");
        if !self.buffer.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.buffer);
        }
        out
    }

    fn take_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            return Some(self.flush_event());
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(data) = line.strip_prefix("data:") {
            self.data_lines.push(data.strip_prefix(' ').unwrap_or(data).to_string());
        }
        None
    }

    fn flush_event(&mut self) -> String {
        std::mem::take(&mut self.data_lines).join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunks: &[&str]) -> Vec<String> {
        let mut scanner = EventStreamScanner::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(scanner.push(chunk));
        }
        events.extend(scanner.finish());
        events
    }

    #[test]
    fn test_single_event() {
        let events = collect(&["data: {\"x\":1}\n\n"]);
        assert_eq!(events, vec!["{\"x\":1}"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let events = collect(&["data: {\"x\"", ":1}\n", "\n"]);
        assert_eq!(events, vec!["{\"x\":1}"]);
    }

    #[test]
    fn test_one_byte_at_a_time() {
        let input = "data: [DONE]\n\ndata: {\"ok\":true}\n\n";
        let chunks: Vec<String> = input.chars().map(String::from).collect();
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        assert_eq!(collect(&refs), vec!["[DONE]", "{\"ok\":true}"]);
    }

    #[test]
    fn test_multi_line_data_joined() {
        let events = collect(&["data: line one\ndata: line two\n\n"]);
        assert_eq!(events, vec!["line one\nline two"]);
    }

    #[test]
    fn test_missing_trailing_newline_flushes_on_finish() {
        let events = collect(&["data: {\"x\":1}"]);
        assert_eq!(events, vec!["{\"x\":1}"]);
    }

    #[test]
    fn test_blank_line_without_data_yields_nothing() {
        assert!(collect(&["\n\n\n"]).is_empty());
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let events = collect(&[": keep-alive\nevent: message\nid: 7\ndata: payload\n\n"]);
        assert_eq!(events, vec!["payload"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = collect(&["data: {\"x\":1}\r\n\r\n"]);
        assert_eq!(events, vec!["{\"x\":1}"]);
    }

    #[test]
    fn test_data_without_space_after_colon() {
        let events = collect(&["data:{\"x\":1}\n\n"]);
        assert_eq!(events, vec!["{\"x\":1}"]);
    }

    #[test]
    fn test_residue_reports_partial_input() {
        let mut scanner = EventStreamScanner::new();
        scanner.push("data: partial");
        assert!(scanner.residue().contains("partial"));
    }
}
