//! Running a DFA over input.
//!
//! Matching is a single pass: one ordered lookup per code point and no
//! backtracking, so it is linear in the input length whatever the pattern.
//! Inputs can be plain code point sequences, UTF-16 code units, or UTF-8 bytes
//! from a reader; all of them are decoded on the fly.

use std::io::{self, BufRead};

use super::dfa::Dfa;
use super::state::State;

/// Outcome of running an automaton over an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// The whole input was consumed and the automaton ended in an accepting state.
    pub matched: bool,
    /// Code points consumed before stopping. On a rejection caused by a missing
    /// transition this is the index of the offending code point.
    pub consumed: usize,
}

impl<S: State> Dfa<S> {
    pub fn match_code_points<I>(&self, input: I) -> MatchResult
    where
        I: IntoIterator<Item = u32>,
    {
        let mut current = self.initial();
        let mut consumed = 0;
        for code_point in input {
            match self.next_state(current, code_point) {
                Some(next) => current = next,
                None => {
                    return MatchResult {
                        matched: false,
                        consumed,
                    }
                }
            }
            consumed += 1;
        }
        MatchResult {
            matched: self.is_accepting(current),
            consumed,
        }
    }

    /// Like `match_code_points` but stops at the first I/O error.
    pub fn try_match_code_points<I>(&self, input: I) -> io::Result<MatchResult>
    where
        I: IntoIterator<Item = io::Result<u32>>,
    {
        let mut current = self.initial();
        let mut consumed = 0;
        for code_point in input {
            match self.next_state(current, code_point?) {
                Some(next) => current = next,
                None => {
                    return Ok(MatchResult {
                        matched: false,
                        consumed,
                    })
                }
            }
            consumed += 1;
        }
        Ok(MatchResult {
            matched: self.is_accepting(current),
            consumed,
        })
    }
}

/// Decode UTF-16 code units into code points.
///
/// A surrogate that is not part of a valid pair stands for itself.
pub fn utf16_code_points<I>(units: I) -> impl Iterator<Item = u32>
where
    I: IntoIterator<Item = u16>,
{
    char::decode_utf16(units).map(|decoded| match decoded {
        Ok(c) => c as u32,
        Err(e) => u32::from(e.unpaired_surrogate()),
    })
}

/// Decodes UTF-8 from a reader one scalar value at a time.
pub struct Utf8Chars<R> {
    reader: R,
}

impl<R: BufRead> Utf8Chars<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let Some(&byte) = buf.first() else {
                return Ok(None);
            };
            self.reader.consume(1);
            return Ok(Some(byte));
        }
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.read_byte()? else {
            return Ok(None);
        };
        let width = match lead {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(invalid_utf8(lead)),
        };
        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self.read_byte()?.ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "truncated UTF-8 sequence")
            })?;
        }
        let decoded = std::str::from_utf8(&bytes[..width]).map_err(|_| invalid_utf8(lead))?;
        Ok(decoded.chars().next())
    }
}

fn invalid_utf8(lead: u8) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("invalid UTF-8 sequence starting with byte {:#04x}", lead),
    )
}

impl<R: BufRead> Iterator for Utf8Chars<R> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_char().transpose()
    }
}
