//! Content stream tokenizer.
//!
//! Parses raw PDF content stream bytes into a sequence of [`Operator`]s,
//! each carrying its [`Operand`] arguments. Inline images (`BI ... ID ...
//! EI`) come back as a `BI` operator with their dictionary and data attached.

use crate::error::ScanError;

/// A PDF content stream operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f64),
    /// Name object, stored without the leading `/`.
    Name(String),
    /// Literal or hexadecimal string, as decoded bytes.
    String(Vec<u8>),
    Array(Vec<Operand>),
    Boolean(bool),
    Null,
    Dictionary(Vec<(String, Operand)>),
}

impl Operand {
    /// Numeric value of an integer or real operand.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            _ => None,
        }
    }
}

/// An inline image captured from a `BI`/`ID`/`EI` sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImageData {
    /// Dictionary entries between `BI` and `ID`, keys without `/`.
    pub dict: Vec<(String, Operand)>,
    /// Raw bytes between `ID` and `EI`.
    pub data: Vec<u8>,
}

impl InlineImageData {
    /// Look up an entry by its full or abbreviated key.
    pub fn get(&self, full: &str, short: &str) -> Option<&Operand> {
        self.dict
            .iter()
            .find(|(k, _)| k == full || k == short)
            .map(|(_, v)| v)
    }
}

/// A PDF content stream operator with its preceding operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Operator name (e.g. `"cm"`, `"re"`, `"Do"`).
    pub name: String,
    /// Operands that preceded this operator on the operand stack.
    pub operands: Vec<Operand>,
    /// Present only for `BI`.
    pub inline_image: Option<InlineImageData>,
}

impl Operator {
    fn new(name: String, operands: Vec<Operand>) -> Self {
        Self {
            name,
            operands,
            inline_image: None,
        }
    }

    /// Numeric operand at `index`.
    pub fn f64_at(&self, index: usize) -> Option<f64> {
        self.operands.get(index).and_then(Operand::as_f64)
    }

    /// All operands, if every one of the first `n` is numeric.
    pub fn numbers(&self, n: usize) -> Option<Vec<f64>> {
        if self.operands.len() < n {
            return None;
        }
        self.operands[self.operands.len() - n..]
            .iter()
            .map(Operand::as_f64)
            .collect()
    }
}

/// Parse PDF content stream bytes into a sequence of operators.
///
/// Comments are stripped. Unknown bytes at top level are skipped so that a
/// single stray byte does not lose the rest of the page.
///
/// # Errors
///
/// Returns [`ScanError::Parse`] for unterminated strings, arrays,
/// dictionaries and inline images.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, ScanError> {
    let mut ops = Vec::new();
    let mut stack: Vec<Operand> = Vec::new();
    let mut pos = 0;

    loop {
        skip_whitespace_and_comments(input, &mut pos);
        let Some(&b) = input.get(pos) else {
            break;
        };
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'*' | b'\'' | b'"' => {
                let keyword = parse_keyword(input, &mut pos);
                match keyword.as_str() {
                    "true" => stack.push(Operand::Boolean(true)),
                    "false" => stack.push(Operand::Boolean(false)),
                    "null" => stack.push(Operand::Null),
                    "BI" => {
                        let image = parse_inline_image(input, &mut pos)?;
                        stack.clear();
                        ops.push(Operator {
                            name: keyword,
                            operands: Vec::new(),
                            inline_image: Some(image),
                        });
                    }
                    _ => ops.push(Operator::new(keyword, std::mem::take(&mut stack))),
                }
            }
            b'(' | b'<' | b'[' | b'/' | b'0'..=b'9' | b'+' | b'-' | b'.' => {
                stack.push(parse_value(input, &mut pos)?);
            }
            _ => pos += 1,
        }
    }

    Ok(ops)
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn skip_whitespace_and_comments(input: &[u8], pos: &mut usize) {
    while let Some(&b) = input.get(*pos) {
        if is_whitespace(b) {
            *pos += 1;
        } else if b == b'%' {
            while input.get(*pos).is_some_and(|&c| c != b'\n' && c != b'\r') {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

/// Parse one operand value starting at `pos`.
fn parse_value(input: &[u8], pos: &mut usize) -> Result<Operand, ScanError> {
    let b = input
        .get(*pos)
        .copied()
        .ok_or_else(|| ScanError::Parse("unexpected end of content stream".to_string()))?;
    match b {
        b'(' => Ok(Operand::String(parse_literal_string(input, pos)?)),
        b'<' if input.get(*pos + 1) == Some(&b'<') => {
            Ok(Operand::Dictionary(parse_dictionary(input, pos)?))
        }
        b'<' => Ok(Operand::String(parse_hex_string(input, pos)?)),
        b'[' => {
            *pos += 1;
            Ok(Operand::Array(parse_array(input, pos)?))
        }
        b'/' => Ok(Operand::Name(parse_name(input, pos))),
        b'0'..=b'9' | b'+' | b'-' | b'.' => parse_number(input, pos),
        b'a'..=b'z' | b'A'..=b'Z' => {
            let keyword = parse_keyword(input, pos);
            Ok(match keyword.as_str() {
                "true" => Operand::Boolean(true),
                "false" => Operand::Boolean(false),
                "null" => Operand::Null,
                _ => Operand::Name(keyword),
            })
        }
        _ => Err(ScanError::Parse(format!(
            "unexpected byte in content stream: 0x{b:02X}"
        ))),
    }
}

/// Parse a literal string `(...)` with balanced parentheses and escapes.
fn parse_literal_string(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, ScanError> {
    *pos += 1;
    let mut result = Vec::new();
    let mut depth = 1u32;

    while let Some(&b) = input.get(*pos) {
        *pos += 1;
        match b {
            b'(' => {
                depth += 1;
                result.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(result);
                }
                result.push(b);
            }
            b'\\' => {
                let Some(&escaped) = input.get(*pos) else {
                    break;
                };
                *pos += 1;
                match escaped {
                    b'n' => result.push(b'\n'),
                    b'r' => result.push(b'\r'),
                    b't' => result.push(b'\t'),
                    b'b' => result.push(0x08),
                    b'f' => result.push(0x0C),
                    b'\r' => {
                        if input.get(*pos) == Some(&b'\n') {
                            *pos += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut val = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            match input.get(*pos) {
                                Some(&d @ b'0'..=b'7') => {
                                    val = val * 8 + u32::from(d - b'0');
                                    *pos += 1;
                                }
                                _ => break,
                            }
                        }
                        result.push((val & 0xFF) as u8);
                    }
                    other => result.push(other),
                }
            }
            _ => result.push(b),
        }
    }

    Err(ScanError::Parse("unterminated literal string".to_string()))
}

/// Parse a hex string `<...>`. An odd digit count gets a trailing 0.
fn parse_hex_string(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, ScanError> {
    *pos += 1;
    let mut digits = Vec::new();
    loop {
        let Some(&b) = input.get(*pos) else {
            return Err(ScanError::Parse("unterminated hex string".to_string()));
        };
        *pos += 1;
        if b == b'>' {
            break;
        }
        if !is_whitespace(b) {
            digits.push(hex_digit(b)?);
        }
    }
    if digits.len() % 2 != 0 {
        digits.push(0);
    }
    Ok(digits.chunks(2).map(|p| (p[0] << 4) | p[1]).collect())
}

fn hex_digit(b: u8) -> Result<u8, ScanError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(ScanError::Parse(format!(
            "invalid hex digit: {:?}",
            b as char
        ))),
    }
}

/// Parse an array until `]`. Assumes `[` already consumed.
fn parse_array(input: &[u8], pos: &mut usize) -> Result<Vec<Operand>, ScanError> {
    let mut elements = Vec::new();
    loop {
        skip_whitespace_and_comments(input, pos);
        match input.get(*pos) {
            None => return Err(ScanError::Parse("unterminated array".to_string())),
            Some(b']') => {
                *pos += 1;
                return Ok(elements);
            }
            Some(_) => elements.push(parse_value(input, pos)?),
        }
    }
}

/// Parse a dictionary `<< /Key value ... >>`.
fn parse_dictionary(input: &[u8], pos: &mut usize) -> Result<Vec<(String, Operand)>, ScanError> {
    *pos += 2;
    let mut entries = Vec::new();
    loop {
        skip_whitespace_and_comments(input, pos);
        match (input.get(*pos), input.get(*pos + 1)) {
            (None, _) => return Err(ScanError::Parse("unterminated dictionary".to_string())),
            (Some(b'>'), Some(b'>')) => {
                *pos += 2;
                return Ok(entries);
            }
            (Some(b'/'), _) => {
                let key = parse_name(input, pos);
                skip_whitespace_and_comments(input, pos);
                let value = parse_value(input, pos)?;
                entries.push((key, value));
            }
            _ => {
                return Err(ScanError::Parse(
                    "expected name key in dictionary".to_string(),
                ));
            }
        }
    }
}

/// Parse a `/Name` token, resolving `#XX` escapes.
fn parse_name(input: &[u8], pos: &mut usize) -> String {
    *pos += 1;
    let start = *pos;
    while input
        .get(*pos)
        .is_some_and(|&b| !is_whitespace(b) && !is_delimiter(b))
    {
        *pos += 1;
    }

    let raw = &input[start..*pos];
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Ok(hi), Ok(lo)) = (hex_digit(raw[i + 1]), hex_digit(raw[i + 2])) {
                name.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        name.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&name).into_owned()
}

/// Parse a number (integer or real).
fn parse_number(input: &[u8], pos: &mut usize) -> Result<Operand, ScanError> {
    let start = *pos;
    let mut has_dot = false;
    if matches!(input.get(*pos), Some(b'+' | b'-')) {
        *pos += 1;
    }
    while let Some(&b) = input.get(*pos) {
        if b == b'.' && !has_dot {
            has_dot = true;
        } else if !b.is_ascii_digit() {
            break;
        }
        *pos += 1;
    }

    let token = std::str::from_utf8(&input[start..*pos])
        .map_err(|_| ScanError::Parse("invalid number token".to_string()))?;
    // A lone sign or dot reads as zero, like most viewers do.
    if token.trim_start_matches(['+', '-']).trim_matches('.').is_empty() {
        return Ok(Operand::Integer(0));
    }
    if has_dot {
        token
            .parse()
            .map(Operand::Real)
            .map_err(|_| ScanError::Parse(format!("invalid real number: {token}")))
    } else {
        token
            .parse()
            .map(Operand::Integer)
            .map_err(|_| ScanError::Parse(format!("invalid integer: {token}")))
    }
}

/// Parse a keyword (alphabetic plus `*`, `'`, `"`, and trailing digits as in `d0`).
fn parse_keyword(input: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    while input
        .get(*pos)
        .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'*' || b == b'\'' || b == b'"')
    {
        *pos += 1;
    }
    String::from_utf8_lossy(&input[start..*pos]).into_owned()
}

/// Parse `<entries> ID <data> EI`. Called after `BI` has been consumed.
fn parse_inline_image(input: &[u8], pos: &mut usize) -> Result<InlineImageData, ScanError> {
    let mut dict = Vec::new();

    loop {
        skip_whitespace_and_comments(input, pos);
        match input.get(*pos) {
            None => {
                return Err(ScanError::Parse(
                    "unterminated inline image (missing ID)".to_string(),
                ));
            }
            Some(b'I')
                if input.get(*pos + 1) == Some(&b'D')
                    && input.get(*pos + 2).is_none_or(|&b| is_whitespace(b)) =>
            {
                *pos += 2;
                if input.get(*pos).is_some_and(|&b| is_whitespace(b)) {
                    *pos += 1;
                }
                break;
            }
            Some(b'/') => {
                let key = parse_name(input, pos);
                skip_whitespace_and_comments(input, pos);
                let value = parse_value(input, pos)?;
                dict.push((key, value));
            }
            Some(_) => {
                return Err(ScanError::Parse(
                    "expected name key in inline image dictionary".to_string(),
                ));
            }
        }
    }

    // EI must stand alone: whitespace before, whitespace or delimiter after.
    let data_start = *pos;
    while *pos + 1 < input.len() {
        let at_ei = input[*pos] == b'E'
            && input[*pos + 1] == b'I'
            && (*pos == data_start || is_whitespace(input[*pos - 1]))
            && input
                .get(*pos + 2)
                .is_none_or(|&b| is_whitespace(b) || is_delimiter(b));
        if at_ei {
            let mut end = *pos;
            if end > data_start && is_whitespace(input[end - 1]) {
                end -= 1;
            }
            let data = input[data_start..end].to_vec();
            *pos += 2;
            return Ok(InlineImageData { dict, data });
        }
        *pos += 1;
    }

    Err(ScanError::Parse(
        "unterminated inline image (missing EI)".to_string(),
    ))
}
