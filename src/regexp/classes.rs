//! Predefined character classes: shorthand escapes, POSIX names and Unicode
//! properties.
//!
//! Unicode data comes from `regex-syntax`: a property name is resolved by
//! parsing `\p{name}` and reading the class out of the resulting HIR.

use regex_syntax::hir::{Class, HirKind};

use super::blocks;
use super::tree::CharRange;

/// Which code points `.` matches besides everything else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DotMatch {
    /// Every code point.
    All,
    /// Everything but `\n`, `\r`, U+0085, U+2028 and U+2029.
    #[default]
    JavaLines,
    /// Everything but `\n`.
    UnixLines,
}

impl DotMatch {
    /// Code points `.` must *not* match.
    pub fn excluded(self) -> Vec<CharRange> {
        match self {
            DotMatch::All => Vec::new(),
            DotMatch::JavaLines => vec![
                CharRange::single('\n' as u32),
                CharRange::single('\r' as u32),
                CharRange::single(0x85),
                CharRange::new(0x2028, 0x2029),
            ],
            DotMatch::UnixLines => vec![CharRange::single('\n' as u32)],
        }
    }
}

/// Code points accepted by `\R` as a single line break (`\r\n` is handled
/// by the parser).
pub fn line_breaks() -> Vec<CharRange> {
    vec![
        CharRange::new(0x0A, 0x0D),
        CharRange::single(0x85),
        CharRange::new(0x2028, 0x2029),
    ]
}

/// `\h`
pub fn horizontal_space() -> Vec<CharRange> {
    vec![
        CharRange::single('\t' as u32),
        CharRange::single(' ' as u32),
        CharRange::single(0xA0),
        CharRange::single(0x1680),
        CharRange::single(0x180E),
        CharRange::new(0x2000, 0x200A),
        CharRange::single(0x202F),
        CharRange::single(0x205F),
        CharRange::single(0x3000),
    ]
}

/// `\d`, `\s` or `\w` (lowercase letter only; the caller negates uppercase ones).
pub fn shorthand(letter: char, unicode: bool) -> Option<Vec<CharRange>> {
    if unicode {
        let expr = match letter {
            'd' => r"\p{Nd}",
            's' => r"\p{White_Space}",
            'w' => r"\w",
            _ => return None,
        };
        return resolve(expr);
    }
    let ranges = match letter {
        'd' => vec![CharRange::chars('0', '9')],
        's' => vec![CharRange::new(0x09, 0x0D), CharRange::single(' ' as u32)],
        'w' => vec![
            CharRange::chars('0', '9'),
            CharRange::chars('A', 'Z'),
            CharRange::single('_' as u32),
            CharRange::chars('a', 'z'),
        ],
        _ => return None,
    };
    Some(ranges)
}

/// POSIX class names, as ASCII and as Unicode expressions.
const POSIX: &[(&str, &str, &str)] = &[
    ("Lower", "[[:lower:]]", r"\p{Lowercase}"),
    ("Upper", "[[:upper:]]", r"\p{Uppercase}"),
    ("ASCII", "[[:ascii:]]", "[[:ascii:]]"),
    ("Alpha", "[[:alpha:]]", r"\p{Alphabetic}"),
    ("Digit", "[[:digit:]]", r"\p{Nd}"),
    ("Alnum", "[[:alnum:]]", r"[\p{Alphabetic}\p{Nd}]"),
    ("Punct", "[[:punct:]]", r"\p{P}"),
    ("Graph", "[[:graph:]]", r"[^\p{White_Space}\p{Cc}\p{Cs}\p{Cn}]"),
    ("Print", "[[:print:]]", r"[[^\p{White_Space}\p{Cc}\p{Cs}\p{Cn}]\p{Zs}]"),
    ("Blank", "[[:blank:]]", r"[\p{Zs}\t]"),
    ("Cntrl", "[[:cntrl:]]", r"\p{Cc}"),
    ("XDigit", "[[:xdigit:]]", r"[\p{Nd}\p{Hex_Digit}]"),
    ("Space", "[[:space:]]", r"\p{White_Space}"),
];

/// `\p{javaX}` classes, named after the `java.lang.Character.isX` predicate.
const JAVA: &[(&str, &str)] = &[
    ("LowerCase", r"\p{Lowercase}"),
    ("UpperCase", r"\p{Uppercase}"),
    ("TitleCase", r"\p{Lt}"),
    ("Alphabetic", r"\p{Alphabetic}"),
    ("Ideographic", r"\p{Ideographic}"),
    ("Digit", r"\p{Nd}"),
    ("Defined", r"\P{Cn}"),
    ("Letter", r"\p{L}"),
    ("LetterOrDigit", r"[\p{L}\p{Nd}]"),
    ("JavaIdentifierStart", r"[\p{L}\p{Nl}\p{Sc}\p{Pc}]"),
    (
        "JavaIdentifierPart",
        r"[\p{L}\p{Nl}\p{Sc}\p{Pc}\p{Nd}\p{Mn}\p{Mc}\x00-\x08\x0E-\x1B\x7F-\x9F\p{Cf}]",
    ),
    ("UnicodeIdentifierStart", r"\p{ID_Start}"),
    ("UnicodeIdentifierPart", r"[\p{ID_Continue}\x00-\x08\x0E-\x1B\x7F-\x9F\p{Cf}]"),
    ("IdentifierIgnorable", r"[\x00-\x08\x0E-\x1B\x7F-\x9F\p{Cf}]"),
    ("SpaceChar", r"\p{Z}"),
    (
        "Whitespace",
        r"[[\p{Z}\t\n\x0B\f\r\x1C-\x1F]&&[^\xA0\x{2007}\x{202F}]]",
    ),
    ("ISOControl", r"[\x00-\x1F\x7F-\x9F]"),
    ("Mirrored", r"\p{Bidi_Mirrored}"),
];

/// The code points of `\p{name}`.
pub fn property(name: &str, unicode: bool) -> Result<Vec<CharRange>, String> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' ' | '='))
    {
        return Err(format!("malformed property name `{}`", name));
    }
    if let Some(method) = name.strip_prefix("java") {
        let expr = JAVA
            .iter()
            .find(|(java, _)| *java == method)
            .map(|(_, expr)| *expr)
            .ok_or_else(|| format!("unknown java.lang.Character class `{}`", name))?;
        return resolve(expr).ok_or_else(|| format!("cannot resolve `{}`", name));
    }
    let block_name = name.strip_prefix("In").or_else(|| {
        let (key, value) = name.split_once('=')?;
        (key.eq_ignore_ascii_case("block") || key.eq_ignore_ascii_case("blk")).then_some(value)
    });
    if let Some(block_name) = block_name {
        return blocks::block(block_name)
            .map(|range| vec![range])
            .ok_or_else(|| format!("unknown Unicode block `{}`", name));
    }

    if let Some((_, ascii, uni)) = POSIX.iter().find(|(posix, _, _)| *posix == name) {
        let expr = if unicode { uni } else { ascii };
        return resolve(expr).ok_or_else(|| format!("cannot resolve POSIX class `{}`", name));
    }

    let bare = name.strip_prefix("Is").unwrap_or(name);
    resolve(&format!(r"\p{{{}}}", bare)).ok_or_else(|| format!("unknown character property `{}`", name))
}

/// Parse a one-class expression with regex-syntax and collect its ranges.
fn resolve(expr: &str) -> Option<Vec<CharRange>> {
    let hir = regex_syntax::ParserBuilder::new().build().parse(expr).ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => Some(
            class
                .ranges()
                .iter()
                .map(|r| CharRange::new(r.start() as u32, r.end() as u32))
                .collect(),
        ),
        // single code point classes come back as literals
        HirKind::Literal(literal) => {
            let text = std::str::from_utf8(&literal.0).ok()?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(vec![CharRange::single(c as u32)]),
                _ => None,
            }
        }
        _ => None,
    }
}
