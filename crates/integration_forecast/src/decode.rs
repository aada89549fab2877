//! Incremental JSON array decoding
//!
//! Splits a byte stream carrying a JSON array into its top-level elements
//! without buffering more than one element at a time, and deserializes each
//! element as soon as its closing delimiter arrives. Element boundaries are
//! found by tracking brace/bracket depth and string/escape state, so the
//! decoder yields identical results regardless of how the input is chunked.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening `[`
    Start,
    /// After `[`, expecting the first element or `]`
    ExpectFirstElement,
    /// After a `,`, expecting another element
    ExpectElement,
    /// Inside an element, buffering its bytes
    InElement,
    /// After the closing `]`, only whitespace may follow
    Done,
}

/// Streaming decoder for a JSON array of `T`.
#[derive(Debug)]
pub struct JsonArrayDecoder<T> {
    state: State,
    buf: Vec<u8>,
    depth: u32,
    in_string: bool,
    escaped: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Default for JsonArrayDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> JsonArrayDecoder<T> {
    /// Create a decoder positioned before the opening bracket.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Start,
            buf: Vec::new(),
            depth: 0,
            in_string: false,
            escaped: false,
            _marker: PhantomData,
        }
    }

    /// Whether the closing bracket has been consumed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Consume one chunk of input, appending every element it completes to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` when the input is not a JSON array, an
    /// element fails to deserialize as `T`, or data follows the closing
    /// bracket. Elements completed earlier in the chunk are still appended
    /// to `out` before the error is returned, so where a failure lands
    /// relative to chunk boundaries never changes which records come out.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<T>) -> Result<(), FetchError> {
        for &byte in chunk {
            match self.state {
                State::Start => {
                    if byte.is_ascii_whitespace() {
                        continue;
                    }
                    if byte == b'[' {
                        self.state = State::ExpectFirstElement;
                    } else {
                        return Err(FetchError::Decode(
                            "expected a top-level JSON array".to_string(),
                        ));
                    }
                },
                State::ExpectFirstElement => {
                    if byte.is_ascii_whitespace() {
                        continue;
                    }
                    if byte == b']' {
                        self.state = State::Done;
                    } else {
                        self.begin_element();
                        if let Some(value) = self.element_byte(byte)? {
                            out.push(value);
                        }
                    }
                },
                State::ExpectElement => {
                    if byte.is_ascii_whitespace() {
                        continue;
                    }
                    if byte == b']' {
                        return Err(FetchError::Decode(
                            "expected a value after ','".to_string(),
                        ));
                    }
                    self.begin_element();
                    if let Some(value) = self.element_byte(byte)? {
                        out.push(value);
                    }
                },
                State::InElement => {
                    if let Some(value) = self.element_byte(byte)? {
                        out.push(value);
                    }
                },
                State::Done => {
                    if !byte.is_ascii_whitespace() {
                        return Err(FetchError::Decode(
                            "unexpected data after the array".to_string(),
                        ));
                    }
                },
            }
        }
        Ok(())
    }

    /// Signal end of input.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` when the array was not closed.
    pub fn finish(&self) -> Result<(), FetchError> {
        if self.state == State::Done {
            Ok(())
        } else {
            Err(FetchError::Decode(
                "unexpected end of JSON input".to_string(),
            ))
        }
    }

    fn begin_element(&mut self) {
        self.state = State::InElement;
        self.buf.clear();
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }

    /// Process one byte inside an element. Returns a value when the byte
    /// completes the element.
    fn element_byte(&mut self, byte: u8) -> Result<Option<T>, FetchError> {
        if self.in_string {
            self.buf.push(byte);
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            return Ok(None);
        }

        match byte {
            b'"' => {
                self.in_string = true;
                self.buf.push(byte);
            },
            b'{' | b'[' => {
                self.depth += 1;
                self.buf.push(byte);
            },
            b'}' => {
                if self.depth == 0 {
                    return Err(FetchError::Decode("unbalanced '}'".to_string()));
                }
                self.depth -= 1;
                self.buf.push(byte);
            },
            b']' => {
                if self.depth == 0 {
                    // Closing bracket of the array itself.
                    let value = self.parse_element()?;
                    self.state = State::Done;
                    return Ok(Some(value));
                }
                self.depth -= 1;
                self.buf.push(byte);
            },
            b',' if self.depth == 0 => {
                let value = self.parse_element()?;
                self.state = State::ExpectElement;
                return Ok(Some(value));
            },
            _ => self.buf.push(byte),
        }
        Ok(None)
    }

    fn parse_element(&mut self) -> Result<T, FetchError> {
        let result = serde_json::from_slice(&self.buf)
            .map_err(|e| FetchError::Decode(format!("invalid array element: {e}")));
        self.buf.clear();
        result
    }
}
