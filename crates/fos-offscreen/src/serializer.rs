//! Serializer - bounded markup rendering
//!
//! Renders an element subtree depth-first into a caller-supplied buffer:
//!
//! ```text
//! <tag name="value" style="prop:value;prop:value !important;">content</tag>
//! ```
//!
//! Content is either the element's text or its serialized children. Values
//! are written as stored, without escaping. Fragments (empty tag) render
//! only their content.
//!
//! One byte of the buffer is reserved for a NUL terminator. Output that does
//! not fit is cut at a character boundary and reported as truncated; what was
//! written is always a prefix of the full rendering.

use crate::config::SerializerConfig;
use crate::containers::Sequence;
use crate::{DomError, DomResult, Element};

/// Outcome of a bounded render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serialized {
    /// Content bytes written, excluding the terminator
    pub written: usize,
    /// Did the rendering run out of room?
    pub truncated: bool,
}

/// Fixed-capacity output that stops at the first write that does not fit
struct BoundedWriter<'a> {
    buffer: &'a mut [u8],
    limit: usize,
    written: usize,
    truncated: bool,
}

impl<'a> BoundedWriter<'a> {
    fn new(buffer: &'a mut [u8]) -> Self {
        let limit = buffer.len().saturating_sub(1);
        Self {
            buffer,
            limit,
            written: 0,
            truncated: false,
        }
    }

    /// Returns false once output has been truncated
    fn write(&mut self, text: &str) -> bool {
        if self.truncated {
            return false;
        }
        let remaining = self.limit - self.written;
        let mut take = text.len();
        if take > remaining {
            take = remaining;
            while !text.is_char_boundary(take) {
                take -= 1;
            }
            self.truncated = true;
        }
        self.buffer[self.written..self.written + take].copy_from_slice(&text.as_bytes()[..take]);
        self.written += take;
        !self.truncated
    }

    fn finish(self) -> Serialized {
        if let Some(terminator) = self.buffer.get_mut(self.written) {
            *terminator = 0;
        }
        Serialized {
            written: self.written,
            truncated: self.truncated,
        }
    }
}

/// Element whose children are being written
struct Frame {
    element: Element,
    pending: std::vec::IntoIter<Element>,
}

/// Depth-first walk over an explicit stack; nesting depth never grows the
/// call stack.
fn write_tree(root: &Element, out: &mut BoundedWriter<'_>) -> bool {
    let Some(pending) = write_open(root, out) else {
        return false;
    };
    let mut stack = vec![Frame {
        element: root.clone(),
        pending,
    }];

    while let Some(frame) = stack.last_mut() {
        match frame.pending.next() {
            Some(child) => {
                let Some(pending) = write_open(&child, out) else {
                    return false;
                };
                stack.push(Frame {
                    element: child,
                    pending,
                });
            }
            None => {
                let Some(done) = stack.pop() else { break };
                if !write_close(&done.element, out) {
                    return false;
                }
            }
        }
    }
    true
}

/// Opening tag plus text. Returns the children still to be written, or
/// `None` once the output is truncated.
fn write_open(element: &Element, out: &mut BoundedWriter<'_>) -> Option<std::vec::IntoIter<Element>> {
    let data = element.data();
    let tag = data.tag.as_str();

    if !tag.is_empty() {
        if !(out.write("<") && out.write(tag)) {
            return None;
        }
        for (name, value) in data.attributes.iter() {
            if !(out.write(" ") && out.write(name.as_str()) && out.write("=\"") && out.write(value) && out.write("\"")) {
                return None;
            }
        }
        if !data.style.is_empty() {
            if !out.write(" style=\"") {
                return None;
            }
            for (property, value, important) in data.style.iter() {
                let suffix = if important { " !important;" } else { ";" };
                if !(out.write(property.as_str()) && out.write(":") && out.write(value) && out.write(suffix)) {
                    return None;
                }
            }
            if !out.write("\"") {
                return None;
            }
        }
        if !out.write(">") {
            return None;
        }
    }

    match &data.text {
        Some(text) => out.write(text).then(|| Vec::new().into_iter()),
        None => Some(
            Sequence::iter(&data.children)
                .cloned()
                .collect::<Vec<_>>()
                .into_iter(),
        ),
    }
}

fn write_close(element: &Element, out: &mut BoundedWriter<'_>) -> bool {
    let data = element.data();
    let tag = data.tag.as_str();
    tag.is_empty() || (out.write("</") && out.write(tag) && out.write(">"))
}

impl Element {
    /// Render this subtree into `buffer`
    pub fn serialize_into(&self, buffer: &mut [u8]) -> Serialized {
        let mut out = BoundedWriter::new(buffer);
        write_tree(self, &mut out);
        out.finish()
    }

    /// Render into `buffer`, returning the bytes written (terminator excluded)
    pub fn get_serialized_html(&self, buffer: &mut [u8]) -> usize {
        self.serialize_into(buffer).written
    }

    /// Render into an owned string, doubling the buffer while truncated
    pub fn outer_html(&self, config: &SerializerConfig) -> DomResult<String> {
        let mut size = config.initial_buffer_size.max(1);
        loop {
            let mut buffer = Vec::new();
            buffer.try_reserve_exact(size)?;
            buffer.resize(size, 0u8);

            let result = self.serialize_into(&mut buffer);
            if !result.truncated {
                buffer.truncate(result.written);
                return Ok(String::from_utf8(buffer)
                    .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()));
            }
            if size >= config.max_buffer_size {
                return Err(DomError::OutputTooLarge {
                    limit: config.max_buffer_size,
                });
            }
            let next = size.saturating_mul(2).min(config.max_buffer_size);
            tracing::debug!(id = self.id(), size, next, "serialized output truncated, retrying");
            size = next;
        }
    }
}
