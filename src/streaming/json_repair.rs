//! JSON repair utilities for streamed function-call arguments
//!
//! A function call's `arguments` string arrives a few characters at a time, so
//! almost every intermediate buffer is a truncated prefix of valid JSON. This
//! module turns such a prefix into the value it would most plausibly become
//! once closed, or reports "no value yet".
//!
//! Repairs are attempted most specific first and each one is re-parsed with
//! `serde_json`:
//! 1. close an open string literal (dropping an incomplete escape) and append
//!    the closing brackets for every container still open
//! 2. strip a dangling `,` or `:` before closing the containers
//! 3. trim a number cut inside its fraction or exponent back to its last digit
//! 4. cut back to the last point where every value was complete and close
//!    the containers open at that point
//!
//! With the `json-repair` feature enabled the `jsonrepair` crate is tried as a
//! last resort.

use serde_json::{Map, Value};

/// Parse JSON with automatic repair when json-repair feature is enabled
///
/// This is a drop-in replacement for `serde_json::from_str` used for SSE chunk
/// payloads. Valid JSON always takes the fast path.
#[cfg(feature = "json-repair")]
pub fn parse_json_with_repair<T: serde::de::DeserializeOwned>(
    json_str: &str,
) -> Result<T, serde_json::Error> {
    use jsonrepair::{Options, repair_json};

    match serde_json::from_str::<T>(json_str) {
        Ok(val) => Ok(val),
        Err(original_err) => {
            let opts = Options::default();
            match repair_json(json_str, &opts) {
                Ok(repaired) => match serde_json::from_str(&repaired) {
                    Ok(val) => {
                        tracing::debug!(
                            "JSON repaired successfully:\nOriginal: {}\nRepaired: {}",
                            json_str,
                            repaired
                        );
                        Ok(val)
                    }
                    Err(_) => {
                        tracing::warn!(
                            "JSON repair succeeded but parsing failed:\nOriginal: {}\nRepaired: {}",
                            json_str,
                            repaired
                        );
                        Err(original_err)
                    }
                },
                Err(repair_err) => {
                    tracing::debug!("JSON repair failed: {}", repair_err);
                    Err(original_err)
                }
            }
        }
    }
}

/// Parse JSON without repair (when json-repair feature is disabled)
#[cfg(not(feature = "json-repair"))]
#[inline]
pub fn parse_json_with_repair<T: serde::de::DeserializeOwned>(
    json_str: &str,
) -> Result<T, serde_json::Error> {
    serde_json::from_str(json_str)
}

/// Best-effort decode of a possibly truncated JSON document.
///
/// Returns `None` while nothing legible can be recovered yet (empty input,
/// a half-written literal with no complete container around it, or a closing
/// bracket that does not match its opener). Never panics on any input.
pub fn parse_partial_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    // A closer that does not match its opener cannot be repaired by closing
    if let Some(scan) = Scan::run(text) {
        for candidate in scan.candidates() {
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                return Some(value);
            }
        }
    }

    #[cfg(feature = "json-repair")]
    {
        if let Ok(value) = parse_json_with_repair::<Value>(text) {
            return Some(value);
        }
    }

    tracing::trace!(len = text.len(), "partial JSON not yet parseable");
    None
}

/// Like [`parse_partial_json`] but only yields JSON objects.
pub fn try_parse(text: &str) -> Option<Map<String, Value>> {
    match parse_partial_json(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    closer: char,
    /// Next string in this object is a key
    expect_key: bool,
}

#[derive(Debug, Clone)]
struct SafePoint {
    len: usize,
    closers: Vec<char>,
}

#[derive(Debug, Clone, Copy)]
struct Escape {
    start: usize,
    /// Characters still required to complete the escape
    remaining: u8,
    unicode: bool,
}

/// Single left-to-right pass over the input that normalizes string contents
/// and records how to close whatever is still open at the end.
#[derive(Debug, Default)]
struct Scan {
    out: String,
    frames: Vec<Frame>,
    in_string: bool,
    string_is_key: bool,
    escape: Option<Escape>,
    /// Byte range of a trailing high-surrogate `\uD8xx` escape
    high_surrogate: Option<(usize, usize)>,
    last_safe: Option<SafePoint>,
}

impl Scan {
    fn run(text: &str) -> Option<Self> {
        let mut scan = Self {
            out: String::with_capacity(text.len() + 8),
            ..Self::default()
        };
        for c in text.chars() {
            if scan.in_string {
                scan.string_char(c);
            } else {
                scan.structural_char(c)?;
            }
        }
        Some(scan)
    }

    fn string_char(&mut self, c: char) {
        if let Some(mut esc) = self.escape.take() {
            self.out.push(c);
            if !esc.unicode && esc.remaining == 1 && c == 'u' {
                esc.unicode = true;
                esc.remaining = 4;
                self.escape = Some(esc);
                return;
            }
            esc.remaining -= 1;
            if esc.remaining > 0 {
                self.escape = Some(esc);
            } else if esc.unicode {
                let hex = &self.out[esc.start + 2..];
                if let Ok(code) = u16::from_str_radix(hex, 16) {
                    if (0xD800..=0xDBFF).contains(&code) {
                        self.high_surrogate = Some((esc.start, self.out.len()));
                    }
                }
            }
            return;
        }

        match c {
            '"' => {
                self.out.push('"');
                self.in_string = false;
                self.high_surrogate = None;
                if !self.string_is_key {
                    self.mark_safe();
                }
            }
            '\\' => {
                self.escape = Some(Escape {
                    start: self.out.len(),
                    remaining: 1,
                    unicode: false,
                });
                self.out.push('\\');
            }
            '\n' => self.out.push_str("\\n"),
            '\r' => self.out.push_str("\\r"),
            '\t' => self.out.push_str("\\t"),
            c if (c as u32) < 0x20 => self.out.push_str(&format!("\\u{:04x}", c as u32)),
            c => self.out.push(c),
        }
    }

    fn structural_char(&mut self, c: char) -> Option<()> {
        match c {
            '"' => {
                self.in_string = true;
                self.string_is_key = self.frames.last().is_some_and(|f| f.expect_key);
                self.high_surrogate = None;
                self.out.push('"');
            }
            '{' | '[' => {
                self.frames.push(Frame {
                    closer: if c == '{' { '}' } else { ']' },
                    expect_key: c == '{',
                });
                self.out.push(c);
                self.mark_safe();
            }
            '}' | ']' => {
                if self.frames.last().map(|f| f.closer) != Some(c) {
                    return None;
                }
                self.frames.pop();
                self.out.push(c);
                self.mark_safe();
            }
            ',' => {
                self.mark_safe();
                self.out.push(',');
                if let Some(frame) = self.frames.last_mut() {
                    frame.expect_key = frame.closer == '}';
                }
            }
            ':' => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.expect_key = false;
                }
                self.out.push(':');
            }
            c => self.out.push(c),
        }
        Some(())
    }

    fn mark_safe(&mut self) {
        self.last_safe = Some(SafePoint {
            len: self.out.len(),
            closers: self.closers(),
        });
    }

    fn closers(&self) -> Vec<char> {
        self.frames.iter().map(|f| f.closer).collect()
    }

    /// Repair candidates, most specific first
    fn candidates(&self) -> Vec<String> {
        let mut candidates = Vec::with_capacity(4);
        let closers = self.closers();

        let mut closed = self.out.clone();
        if self.in_string {
            if let Some(esc) = self.escape {
                closed.truncate(esc.start);
            }
            // A high surrogate is only valid when its pair follows
            if let Some((start, end)) = self.high_surrogate {
                if end == closed.len() {
                    closed.truncate(start);
                }
            }
            closed.push('"');
        }
        candidates.push(close_with(closed, &closers));

        if !self.in_string {
            let trimmed = self.out.trim_end();
            if let Some(stripped) = trimmed
                .strip_suffix(',')
                .or_else(|| trimmed.strip_suffix(':'))
            {
                candidates.push(close_with(stripped.to_string(), &closers));
            }

            // Number cut inside its fraction or exponent (`1.`, `1e`, `2.5e-`)
            let number = self.out.trim_end_matches(['.', 'e', 'E', '+', '-']);
            if number.len() < self.out.len() && number.ends_with(|c: char| c.is_ascii_digit()) {
                candidates.push(close_with(number.to_string(), &closers));
            }
        }

        if let Some(safe) = &self.last_safe {
            candidates.push(close_with(self.out[..safe.len].to_string(), &safe.closers));
        }
        candidates
    }
}

fn close_with(mut text: String, closers: &[char]) -> String {
    text.extend(closers.iter().rev());
    text
}
