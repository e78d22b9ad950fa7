//! Regex parsing.
//!
//! This module parses Java-flavoured regex strings into a `Node` tree.
//! Supports:
//! - literals, `.` (see `DotMatch`), `|` alternation
//! - `[...]` and `[^...]` classes with ranges and nested shorthand classes
//! - `\d \D \s \S \w \W \h \H`, `\p{..}` / `\P{..}` (POSIX names, Unicode
//!   general categories, scripts, blocks and binary properties, `java*` classes)
//! - escapes: `\n \r \t \f \a \e \b \v \B \xhh \x{h..} \uhhhh \0ooo`, plus
//!   `\Q...\E` quoting and `\R` line breaks
//! - `(...)`, `(?:...)`, `(?<name>...)`, lookahead `(?=...)` `(?!...)`,
//!   lookbehind `(?<=...)` `(?<!...)`
//! - greedy quantifiers `* + ? {n} {n,} {n,m}`
//! - embedded flags `(?xsdUiu)`, only at the very beginning of the pattern
//!
//! Rejected: reluctant and possessive quantifiers, anchors, back references,
//! control escapes.
//!
//! Case-insensitive and canonical-equivalence flags are applied while the tree
//! is built, see `Normalization`.

use super::classes::{horizontal_space, line_breaks, property, shorthand, DotMatch};
use super::normalize::{Normalization, Normalizer};
use super::tree::{complement_ranges, CharRange, Condition, Direction, Node};

/// Pattern compilation flags. Embedded flags at the start of a pattern add to
/// these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub dot_match: DotMatch,
    /// The whole pattern is a literal string.
    pub literal: bool,
    /// Whitespace and `#` comments in the pattern are ignored (`x`).
    pub comments: bool,
    /// Shorthand and POSIX classes use Unicode definitions (`U`).
    pub unicode_classes: bool,
    pub case_insensitive: bool,
    /// Case-insensitive matching folds all of Unicode, not only ASCII (`u`).
    pub unicode_case: bool,
    /// Canonically equivalent sequences match each other.
    pub canonical_eq: bool,
}

impl Flags {
    pub fn normalizer(&self) -> Normalizer {
        if !self.case_insensitive {
            Normalizer::None
        } else if self.unicode_case || self.unicode_classes {
            Normalizer::UnicodeLowercase
        } else {
            Normalizer::AsciiLowercase
        }
    }

    pub fn normalization(&self) -> Normalization {
        Normalization::new(self.normalizer(), self.canonical_eq)
    }

    fn apply_embedded(&mut self, letter: char) -> Result<(), String> {
        match letter {
            'x' => self.comments = true,
            's' => self.dot_match = DotMatch::All,
            'd' => {
                if self.dot_match != DotMatch::All {
                    self.dot_match = DotMatch::UnixLines;
                }
            }
            'U' => self.unicode_classes = true,
            'i' => self.case_insensitive = true,
            'u' => self.unicode_case = true,
            'm' => return Err("multiline mode is not supported (anchors are not supported)".into()),
            other => return Err(format!("invalid embedded flag `{}`", other)),
        }
        Ok(())
    }
}

/// Error type for pattern parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", offset_suffix(.offset))]
pub struct PatternError {
    pub message: String,
    /// Byte offset into the pattern, when the error has a location.
    pub offset: Option<usize>,
}

fn offset_suffix(offset: &Option<usize>) -> String {
    offset.map(|o| format!(" at offset {}", o)).unwrap_or_default()
}

impl PatternError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

/// Outcome of parsing one pattern.
#[derive(Clone, Debug)]
pub struct ParsedRegex {
    pub source: String,
    pub tree: Node,
    /// Mapping inputs must go through before being matched against `tree`.
    pub normalizer: Normalizer,
    pub canonical_eq: bool,
}

impl ParsedRegex {
    pub fn normalization(&self) -> Normalization {
        Normalization::new(self.normalizer, self.canonical_eq)
    }
}

/// Parse a pattern into a (normalized) tree.
pub fn parse(pattern: &str, flags: Flags) -> Result<ParsedRegex, PatternError> {
    let mut flags = flags;
    let tree = if flags.literal {
        let norm = flags.normalization();
        Node::juxt(norm.reorder_marks(pattern.chars().map(|c| norm.literal(c as u32)).collect()))
    } else {
        let (body, base) = split_embedded_flags(pattern, &mut flags)?;
        let text = if flags.comments {
            strip_comments(body)
        } else {
            body.to_string()
        };
        let mut parse = RegexpParse::new(&text, base, flags);
        let tree = parse.read_regex()?;
        if !parse.is_empty() {
            return Err(parse.error("unbalanced ')'"));
        }
        tree
    };
    Ok(ParsedRegex {
        source: pattern.to_string(),
        tree,
        normalizer: flags.normalizer(),
        canonical_eq: flags.canonical_eq,
    })
}

/// Consume a leading `(?letters)` group into `flags`, returning the rest of
/// the pattern and its byte offset.
fn split_embedded_flags<'p>(
    pattern: &'p str,
    flags: &mut Flags,
) -> Result<(&'p str, usize), PatternError> {
    let Some(rest) = pattern.strip_prefix("(?") else {
        return Ok((pattern, 0));
    };
    let letters_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    if !rest[letters_len..].starts_with(')') {
        // some other group construct
        return Ok((pattern, 0));
    }
    for (i, letter) in rest[..letters_len].char_indices() {
        flags
            .apply_embedded(letter)
            .map_err(|message| PatternError::at(message, 2 + i))?;
    }
    let consumed = 2 + letters_len + 1;
    Ok((&pattern[consumed..], consumed))
}

/// Drop unescaped whitespace and `#` comments.
fn strip_comments(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    let mut prev = None;
    while let Some(c) = chars.next() {
        let escaped = prev == Some('\\');
        if c == '#' && !escaped {
            for skipped in chars.by_ref() {
                if skipped == '\n' {
                    break;
                }
            }
            prev = Some(' ');
            continue;
        }
        prev = Some(c);
        if !escaped && matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r') {
            continue;
        }
        out.push(c);
    }
    out
}

/// What a backslash sequence stands for.
enum Escape {
    Char(u32),
    Class(Vec<CharRange>),
    Quote(String),
    LineBreak,
}

/// Parser state for regex parsing.
struct RegexpParse {
    /// Characters with their byte offsets into the original pattern.
    chars: Vec<(usize, char)>,
    end_offset: usize,
    index: usize,
    flags: Flags,
    norm: Normalization,
}

impl RegexpParse {
    fn new(text: &str, base: usize, flags: Flags) -> Self {
        Self {
            chars: text.char_indices().map(|(o, c)| (base + o, c)).collect(),
            end_offset: base + text.len(),
            index: 0,
            flags,
            norm: flags.normalization(),
        }
    }

    fn is_empty(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map_or(self.end_offset, |(offset, _)| *offset)
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).map(|(_, c)| *c)
    }

    fn next_rune(&mut self) -> Result<char, PatternError> {
        let c = self
            .peek()
            .ok_or_else(|| self.error("unexpected end of pattern"))?;
        self.index += 1;
        Ok(c)
    }

    fn bypass_optional(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> PatternError {
        PatternError::at(message, self.offset())
    }

    /// Alternatives separated by `|`.
    fn read_regex(&mut self) -> Result<Node, PatternError> {
        let mut branches = vec![self.read_branch()?];
        while self.bypass_optional('|') {
            branches.push(self.read_branch()?);
        }
        Ok(Node::disj(branches))
    }

    /// A sequence of pieces.
    fn read_branch(&mut self) -> Result<Node, PatternError> {
        let mut pieces = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            pieces.push(self.read_piece()?);
        }
        Ok(Node::juxt(self.norm.reorder_marks(pieces)))
    }

    /// An atom with an optional quantifier.
    fn read_piece(&mut self) -> Result<Node, PatternError> {
        let atom = self.read_atom()?;
        let Some((min, max)) = self.read_quantifier()? else {
            return Ok(atom);
        };
        match self.peek() {
            Some('?') => Err(self.error("reluctant quantifiers are not supported")),
            Some('+') => Err(self.error("possessive quantifiers are not supported")),
            _ => Ok(Node::rep(min, max, atom)),
        }
    }

    fn read_quantifier(&mut self) -> Result<Option<(u32, Option<u32>)>, PatternError> {
        let bounds = match self.peek() {
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('?') => (0, Some(1)),
            Some('{') => return self.read_bounds(),
            _ => return Ok(None),
        };
        self.index += 1;
        Ok(Some(bounds))
    }

    /// `{n}`, `{n,}` or `{n,m}`. Anything else starting with `{` is a literal.
    fn read_bounds(&mut self) -> Result<Option<(u32, Option<u32>)>, PatternError> {
        let start = self.index;
        let offset = self.offset();
        self.index += 1;
        let Some(min) = self.read_number()? else {
            self.index = start;
            return Ok(None);
        };
        let max = if self.bypass_optional(',') {
            self.read_number()?
        } else {
            Some(min)
        };
        if !self.bypass_optional('}') {
            self.index = start;
            return Ok(None);
        }
        if let Some(max) = max {
            if max < min {
                return Err(PatternError::at(
                    format!("illegal repetition range {{{},{}}}", min, max),
                    offset,
                ));
            }
        }
        Ok(Some((min, max)))
    }

    fn read_number(&mut self) -> Result<Option<u32>, PatternError> {
        let offset = self.offset();
        let mut value: Option<u32> = None;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.index += 1;
            let next = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| PatternError::at("repetition count is too large", offset))?;
            value = Some(next);
        }
        Ok(value)
    }

    fn read_atom(&mut self) -> Result<Node, PatternError> {
        let offset = self.offset();
        let c = self.next_rune()?;
        match c {
            '(' => self.read_group(offset),
            '[' => self.read_class(offset),
            '.' => Ok(self.norm.set(self.flags.dot_match.excluded(), true)),
            '\\' => self.read_escape_atom(),
            '^' | '$' => Err(PatternError::at("anchors are not supported", offset)),
            '*' | '+' | '?' => Err(PatternError::at(
                format!("dangling quantifier `{}`", c),
                offset,
            )),
            c => Ok(self.norm.literal(c as u32)),
        }
    }

    fn read_group(&mut self, open_offset: usize) -> Result<Node, PatternError> {
        let node = if self.bypass_optional('?') {
            let construct_offset = self.offset();
            match self.next_rune()? {
                ':' => self.read_regex()?,
                '=' => Node::lookaround(Direction::Ahead, Condition::Positive, self.read_regex()?),
                '!' => Node::lookaround(Direction::Ahead, Condition::Negative, self.read_regex()?),
                '<' if self.bypass_optional('=') => {
                    Node::lookaround(Direction::Behind, Condition::Positive, self.read_regex()?)
                }
                '<' if self.bypass_optional('!') => {
                    Node::lookaround(Direction::Behind, Condition::Negative, self.read_regex()?)
                }
                '<' => {
                    let name = self.read_group_name()?;
                    Node::NamedCaptureGroup {
                        name,
                        value: Box::new(self.read_regex()?),
                    }
                }
                c if c.is_ascii_alphabetic() || c == '-' || c == ')' => {
                    return Err(PatternError::at(
                        "embedded flags are only valid at the beginning of the pattern",
                        open_offset,
                    ))
                }
                c => {
                    return Err(PatternError::at(
                        format!("unknown group construct `(?{}`", c),
                        construct_offset,
                    ))
                }
            }
        } else {
            Node::CaptureGroup(Box::new(self.read_regex()?))
        };
        if !self.bypass_optional(')') {
            return Err(PatternError::at("unclosed group", open_offset));
        }
        Ok(node)
    }

    fn read_group_name(&mut self) -> Result<String, PatternError> {
        let offset = self.offset();
        let mut name = String::new();
        loop {
            match self.next_rune()? {
                '>' => break,
                c if c.is_ascii_alphabetic() || (c.is_ascii_digit() && !name.is_empty()) => {
                    name.push(c)
                }
                _ => return Err(PatternError::at("invalid capture group name", offset)),
            }
        }
        if name.is_empty() {
            return Err(PatternError::at("empty capture group name", offset));
        }
        Ok(name)
    }

    fn read_class(&mut self, open_offset: usize) -> Result<Node, PatternError> {
        let negated = self.bypass_optional('^');
        let mut ranges = Vec::new();
        let mut first = true;
        loop {
            let c = self
                .peek()
                .ok_or_else(|| PatternError::at("unclosed character class", open_offset))?;
            if c == ']' {
                if first {
                    return Err(PatternError::at("empty character class", open_offset));
                }
                self.index += 1;
                break;
            }
            first = false;

            let item_offset = self.offset();
            let lo = match self.read_class_item()? {
                Escape::Char(lo) => lo,
                Escape::Class(set) => {
                    ranges.extend(set);
                    continue;
                }
                Escape::Quote(text) => {
                    ranges.extend(text.chars().map(|c| CharRange::single(c as u32)));
                    continue;
                }
                Escape::LineBreak => {
                    return Err(PatternError::at(
                        "\\R is not allowed inside a character class",
                        item_offset,
                    ))
                }
            };

            let is_range = self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']');
            if !is_range {
                ranges.push(CharRange::single(lo));
                continue;
            }
            self.index += 1;
            match self.read_class_item()? {
                Escape::Char(hi) if hi >= lo => ranges.push(CharRange::new(lo, hi)),
                Escape::Char(_) => {
                    return Err(PatternError::at("illegal character range", item_offset))
                }
                _ => {
                    return Err(PatternError::at(
                        "a character range must end with a single character",
                        item_offset,
                    ))
                }
            }
        }
        Ok(self.norm.set(ranges, negated))
    }

    fn read_class_item(&mut self) -> Result<Escape, PatternError> {
        let c = self.next_rune()?;
        if c == '\\' {
            self.read_escape()
        } else {
            Ok(Escape::Char(c as u32))
        }
    }

    fn read_escape_atom(&mut self) -> Result<Node, PatternError> {
        Ok(match self.read_escape()? {
            Escape::Char(cp) => self.norm.literal(cp),
            Escape::Class(ranges) => self.norm.set(ranges, false),
            Escape::Quote(text) => {
                let literals = text.chars().map(|c| self.norm.literal(c as u32)).collect();
                Node::Juxt(self.norm.reorder_marks(literals))
            }
            Escape::LineBreak => Node::Disj(vec![
                Node::Juxt(vec![self.norm.literal(0x0D), self.norm.literal(0x0A)]),
                self.norm.set(line_breaks(), false),
            ]),
        })
    }

    /// Everything after a backslash.
    fn read_escape(&mut self) -> Result<Escape, PatternError> {
        let offset = self.offset().saturating_sub(1);
        let c = self
            .peek()
            .ok_or_else(|| PatternError::at("trailing backslash", offset))?;
        self.index += 1;
        let unicode = self.flags.unicode_classes;
        let escape = match c {
            'n' => Escape::Char(0x0A),
            'r' => Escape::Char(0x0D),
            't' => Escape::Char(0x09),
            'f' => Escape::Char(0x0C),
            'a' => Escape::Char(0x07),
            'e' => Escape::Char(0x1B),
            'b' => Escape::Char(0x08),
            'v' => Escape::Char(0x0B),
            'B' => Escape::Char('\\' as u32),
            'x' => Escape::Char(self.read_hex_escape(offset)?),
            'u' => Escape::Char(self.read_unicode_escape(offset)?),
            '0' => Escape::Char(self.read_octal_escape(offset)?),
            '1'..='9' | 'k' => {
                return Err(PatternError::at("back references are not supported", offset))
            }
            'c' => return Err(PatternError::at("control escapes are not supported", offset)),
            'A' | 'z' | 'Z' | 'G' => {
                return Err(PatternError::at("anchors are not supported", offset))
            }
            'd' | 's' | 'w' => Escape::Class(self.shorthand(c, offset)?),
            'D' | 'S' | 'W' => {
                let positive = self.shorthand(c.to_ascii_lowercase(), offset)?;
                Escape::Class(complement_ranges(&positive))
            }
            'h' => Escape::Class(horizontal_space()),
            'H' => Escape::Class(complement_ranges(&horizontal_space())),
            'p' | 'P' => {
                let name = if self.bypass_optional('{') {
                    let mut name = String::new();
                    loop {
                        match self.peek() {
                            Some('}') => break,
                            Some(ch) => {
                                name.push(ch);
                                self.index += 1;
                            }
                            None => {
                                return Err(PatternError::at("unclosed property name", offset))
                            }
                        }
                    }
                    self.index += 1;
                    name
                } else {
                    self.next_rune()?.to_string()
                };
                let ranges = property(&name, unicode).map_err(|m| PatternError::at(m, offset))?;
                if c == 'P' {
                    Escape::Class(complement_ranges(&ranges))
                } else {
                    Escape::Class(ranges)
                }
            }
            'Q' => {
                let mut text = String::new();
                while let Some(ch) = self.peek() {
                    if ch == '\\' && self.peek_at(1) == Some('E') {
                        self.index += 2;
                        break;
                    }
                    text.push(ch);
                    self.index += 1;
                }
                Escape::Quote(text)
            }
            'R' => Escape::LineBreak,
            c if c.is_ascii_alphanumeric() => {
                return Err(PatternError::at(
                    format!("unknown escape sequence `\\{}`", c),
                    offset,
                ))
            }
            c => Escape::Char(c as u32),
        };
        Ok(escape)
    }

    fn shorthand(&self, letter: char, offset: usize) -> Result<Vec<CharRange>, PatternError> {
        shorthand(letter, self.flags.unicode_classes)
            .ok_or_else(|| PatternError::at(format!("cannot resolve `\\{}`", letter), offset))
    }

    fn read_hex_digits(&mut self, count: usize, offset: usize) -> Result<u32, PatternError> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| PatternError::at("illegal hexadecimal escape sequence", offset))?;
            self.index += 1;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn read_hex_escape(&mut self, offset: usize) -> Result<u32, PatternError> {
        if !self.bypass_optional('{') {
            return self.read_hex_digits(2, offset);
        }
        let mut value = 0u32;
        let mut digits = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
            self.index += 1;
            digits += 1;
            value = value.saturating_mul(16).saturating_add(digit);
        }
        if digits == 0 || !self.bypass_optional('}') {
            return Err(PatternError::at("illegal hexadecimal escape sequence", offset));
        }
        if value > crate::automaton::MAX_CODE_POINT {
            return Err(PatternError::at("hexadecimal code point is out of range", offset));
        }
        Ok(value)
    }

    /// `\uhhhh`, combining a `\uD8xx\uDCxx` surrogate pair into one code point.
    fn read_unicode_escape(&mut self, offset: usize) -> Result<u32, PatternError> {
        let high = self.read_hex_digits(4, offset)?;
        if !(0xD800..=0xDBFF).contains(&high)
            || self.peek() != Some('\\')
            || self.peek_at(1) != Some('u')
        {
            return Ok(high);
        }
        let save = self.index;
        self.index += 2;
        match self.read_hex_digits(4, offset) {
            Ok(low) if (0xDC00..=0xDFFF).contains(&low) => {
                Ok(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
            }
            _ => {
                self.index = save;
                Ok(high)
            }
        }
    }

    /// `\0n`, `\0nn` or `\0mnn` with `m <= 3`.
    fn read_octal_escape(&mut self, offset: usize) -> Result<u32, PatternError> {
        let octal = |c: Option<char>| c.and_then(|c| c.to_digit(8));
        let Some(first) = octal(self.peek()) else {
            return Err(PatternError::at("illegal octal escape sequence", offset));
        };
        self.index += 1;
        let mut value = first;
        let max_digits = if first <= 3 { 3 } else { 2 };
        for _ in 1..max_digits {
            match octal(self.peek()) {
                Some(digit) => {
                    self.index += 1;
                    value = value * 8 + digit;
                }
                None => break,
            }
        }
        Ok(value)
    }
}
