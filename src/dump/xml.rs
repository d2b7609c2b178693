//! Minimal streaming XML reader for EXPDP metadata blocks.
//!
//! The DataPump DDL units are strictly nested and carry all information in
//! tag names and text content, so this walker only emits open/close/
//! self-close events with depth and trimmed text. Processing instructions,
//! comments and `<!...>` declarations are skipped. Attribute values are not
//! exposed.

/// One event produced by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// `<TAG>` — depth counted after the increment.
    Open { name: String, depth: usize },
    /// `</TAG>` — text accumulated since the previous tag, trimmed;
    /// depth counted before the decrement.
    Close {
        name: String,
        text: String,
        depth: usize,
    },
    /// `<TAG/>`.
    SelfClose { name: String, depth: usize },
}

impl XmlEvent {
    pub fn name(&self) -> &str {
        match self {
            XmlEvent::Open { name, .. }
            | XmlEvent::Close { name, .. }
            | XmlEvent::SelfClose { name, .. } => name,
        }
    }
}

/// Forward-only scanner over an in-memory XML buffer.
pub struct XmlReader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    text: Vec<u8>,
}

impl<'a> XmlReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
            text: Vec::new(),
        }
    }

    /// Produce the next tag event, or `None` at end of buffer.
    pub fn next_event(&mut self) -> Option<XmlEvent> {
        loop {
            // Accumulate character data up to the next '<'.
            while self.pos < self.buf.len() && self.buf[self.pos] != b'<' {
                self.text.push(self.buf[self.pos]);
                self.pos += 1;
            }
            if self.pos >= self.buf.len() {
                return None;
            }

            // self.buf[self.pos] == '<'
            if self.skip_non_element() {
                continue;
            }

            self.pos += 1; // consume '<'
            let closing = self.pos < self.buf.len() && self.buf[self.pos] == b'/';
            if closing {
                self.pos += 1;
            }

            let name = self.read_tag_name();
            let self_closed = self.skip_to_tag_end();

            if closing {
                let text = trimmed(&self.text);
                self.text.clear();
                let depth = self.depth;
                self.depth = self.depth.saturating_sub(1);
                return Some(XmlEvent::Close { name, text, depth });
            }

            self.text.clear();
            if self_closed {
                return Some(XmlEvent::SelfClose {
                    name,
                    depth: self.depth + 1,
                });
            }
            self.depth += 1;
            return Some(XmlEvent::Open {
                name,
                depth: self.depth,
            });
        }
    }

    /// Skip `<?...?>`, `<!--...-->` and `<!...>` without emitting an event.
    /// Returns true if something was skipped.
    fn skip_non_element(&mut self) -> bool {
        let rest = &self.buf[self.pos..];
        if rest.starts_with(b"<?") {
            self.pos += match find(rest, b"?>") {
                Some(i) => i + 2,
                None => rest.len(),
            };
            true
        } else if rest.starts_with(b"<!--") {
            self.pos += match find(rest, b"-->") {
                Some(i) => i + 3,
                None => rest.len(),
            };
            true
        } else if rest.starts_with(b"<!") {
            self.pos += match find(rest, b">") {
                Some(i) => i + 1,
                None => rest.len(),
            };
            true
        } else {
            false
        }
    }

    fn read_tag_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.buf.len() {
            match self.buf[self.pos] {
                b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n' => break,
                _ => self.pos += 1,
            }
        }
        String::from_utf8_lossy(&self.buf[start..self.pos]).into_owned()
    }

    /// Advance past the closing '>' of the current tag, skipping any
    /// attributes. Returns true for a self-closing tag.
    fn skip_to_tag_end(&mut self) -> bool {
        let mut self_closed = false;
        while self.pos < self.buf.len() {
            match self.buf[self.pos] {
                b'/' => self_closed = true,
                b'>' => {
                    self.pos += 1;
                    return self_closed;
                }
                _ => self_closed = false,
            }
            self.pos += 1;
        }
        self_closed
    }
}

fn trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<XmlEvent> {
        let mut r = XmlReader::new(xml.as_bytes());
        let mut out = Vec::new();
        while let Some(e) = r.next_event() {
            out.push(e);
        }
        out
    }

    #[test]
    fn test_open_close_with_text() {
        let ev = events("<A> hello </A>");
        assert_eq!(
            ev,
            vec![
                XmlEvent::Open {
                    name: "A".into(),
                    depth: 1
                },
                XmlEvent::Close {
                    name: "A".into(),
                    text: "hello".into(),
                    depth: 1
                },
            ]
        );
    }

    #[test]
    fn test_nested_depths() {
        let ev = events("<A><B>x</B></A>");
        assert_eq!(
            ev,
            vec![
                XmlEvent::Open {
                    name: "A".into(),
                    depth: 1
                },
                XmlEvent::Open {
                    name: "B".into(),
                    depth: 2
                },
                XmlEvent::Close {
                    name: "B".into(),
                    text: "x".into(),
                    depth: 2
                },
                XmlEvent::Close {
                    name: "A".into(),
                    text: "".into(),
                    depth: 1
                },
            ]
        );
    }

    #[test]
    fn test_prolog_comment_and_declaration_skipped() {
        let ev = events("<?xml version=\"1.0\"?><!-- note --><!DOCTYPE x><T>1</T>");
        assert_eq!(ev.len(), 2);
        assert_eq!(ev[0].name(), "T");
    }

    #[test]
    fn test_self_closing_tag() {
        let ev = events("<A><B/></A>");
        assert_eq!(
            ev[1],
            XmlEvent::SelfClose {
                name: "B".into(),
                depth: 2
            }
        );
        // Depth back at 1 for the close of A.
        assert_eq!(
            ev[2],
            XmlEvent::Close {
                name: "A".into(),
                text: "".into(),
                depth: 1
            }
        );
    }

    #[test]
    fn test_attributes_ignored() {
        let ev = events("<ROW num=\"1\">v</ROW>");
        assert_eq!(ev[0].name(), "ROW");
        assert_eq!(
            ev[1],
            XmlEvent::Close {
                name: "ROW".into(),
                text: "v".into(),
                depth: 1
            }
        );
    }
}
