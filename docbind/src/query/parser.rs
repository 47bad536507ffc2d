use crate::common::{Value, OID};
use crate::document::{Document, ObjectId};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};

/// Deepest object and array nesting accepted in a query.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Parses bound query text into a [Document].
///
/// Accepts the relaxed JSON the store shell reads: keys may be unquoted or
/// quoted with `'` or `"`, strings may use either quote, trailing commas are
/// allowed, and `NaN`, `Infinity` and `-Infinity` are numbers. An object of
/// the single entry `$oid` with a valid hex string is read as an [ObjectId].
///
/// Errors carry the character offset at which parsing stopped.
pub fn parse_document(text: &str) -> DocBindResult<Document> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    if parser.peek() != Some('{') {
        return Err(parser.error("Query must be an object"));
    }

    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.peek().is_some() {
        return Err(parser.error("Unexpected trailing characters"));
    }

    match value {
        Value::Document(doc) => Ok(doc),
        _ => Err(parser.error("Query must be an object")),
    }
}

struct Parser {
    chars: Vec<char>,
    offset: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Parser {
            chars: text.chars().collect(),
            offset: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.offset += 1;
        }
    }

    fn expect(&mut self, expected: char) -> DocBindResult<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.offset += 1;
                Ok(())
            }
            Some(c) => Err(self.error(&format!("Expected '{}' but found '{}'", expected, c))),
            None => Err(self.error(&format!("Expected '{}' but reached end of query", expected))),
        }
    }

    fn error(&self, message: &str) -> DocBindError {
        log::error!("Query syntax error at offset {}: {}", self.offset, message);
        DocBindError::new(
            &format!("{} at offset {}", message, self.offset),
            ErrorKind::QuerySyntaxError { offset: self.offset },
        )
    }

    fn parse_value(&mut self) -> DocBindResult<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some(quote @ ('"' | '\'')) => {
                self.offset += 1;
                Ok(Value::String(self.parse_string(quote)?))
            }
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_word_char(c) => self.parse_keyword(),
            Some(c) => Err(self.error(&format!("Unexpected character '{}'", c))),
            None => Err(self.error("Unexpected end of query")),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> DocBindResult<Value>) -> DocBindResult<Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("Query nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_object(&mut self) -> DocBindResult<Value> {
        self.expect('{')?;
        let mut doc = Document::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.offset += 1;
                break;
            }

            let key = self.parse_key()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            doc.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                Some(c) => {
                    self.offset -= 1;
                    return Err(self.error(&format!("Expected ',' or '}}' but found '{}'", c)));
                }
                None => return Err(self.error("Unterminated object")),
            }
        }

        Ok(object_id_wrapper(&doc).map_or(Value::Document(doc), Value::ObjectId))
    }

    fn parse_array(&mut self) -> DocBindResult<Value> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.offset += 1;
                break;
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(c) => {
                    self.offset -= 1;
                    return Err(self.error(&format!("Expected ',' or ']' but found '{}'", c)));
                }
                None => return Err(self.error("Unterminated array")),
            }
        }

        Ok(Value::Array(items))
    }

    fn parse_key(&mut self) -> DocBindResult<String> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.offset += 1;
                self.parse_string(quote)
            }
            Some(c) if is_word_char(c) => {
                let start = self.offset;
                while matches!(self.peek(), Some(c) if is_word_char(c)) {
                    self.offset += 1;
                }
                Ok(self.chars[start..self.offset].iter().collect())
            }
            Some(c) => Err(self.error(&format!("Expected a key but found '{}'", c))),
            None => Err(self.error("Expected a key but reached end of query")),
        }
    }

    // opening quote already consumed
    fn parse_string(&mut self, quote: char) -> DocBindResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("Unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('u') => self.parse_unicode_escape()?,
                        Some(c) => c,
                        None => return Err(self.error("Unterminated escape sequence")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> DocBindResult<char> {
        let high = self.parse_hex4()?;
        if (0xD800..0xDC00).contains(&high) {
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(self.error("Unpaired surrogate in unicode escape"));
            }
            let low = self.parse_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error("Invalid low surrogate in unicode escape"));
            }
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(code).ok_or_else(|| self.error("Invalid unicode escape"));
        }
        char::from_u32(high).ok_or_else(|| self.error("Invalid unicode escape"))
    }

    fn parse_hex4(&mut self) -> DocBindResult<u32> {
        if self.offset + 4 > self.chars.len() {
            return Err(self.error("Truncated unicode escape"));
        }
        let hex: String = self.chars[self.offset..self.offset + 4].iter().collect();
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("Invalid unicode escape"))?;
        self.offset += 4;
        Ok(code)
    }

    fn parse_number(&mut self) -> DocBindResult<Value> {
        let start = self.offset;
        if matches!(self.peek(), Some('-' | '+')) {
            self.offset += 1;
        }

        if self.peek() == Some('I') {
            let word = self.read_word();
            if word != "Infinity" {
                self.offset = start;
                return Err(self.error(&format!("Unknown literal '{}'", word)));
            }
            let negative = self.chars[start] == '-';
            return Ok(Value::F64(if negative { f64::NEG_INFINITY } else { f64::INFINITY }));
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' | 'e' | 'E' => is_float = true,
                '-' | '+' if matches!(self.chars.get(self.offset.wrapping_sub(1)), Some('e' | 'E')) => {}
                _ => break,
            }
            self.offset += 1;
        }

        let text: String = self.chars[start..self.offset].iter().collect();
        let text = text.strip_prefix('+').unwrap_or(&text);
        let parsed = if is_float {
            text.parse::<f64>().ok().map(Value::F64)
        } else if let Ok(v) = text.parse::<i32>() {
            Some(Value::I32(v))
        } else if let Ok(v) = text.parse::<i64>() {
            Some(Value::I64(v))
        } else {
            text.parse::<f64>().ok().map(Value::F64)
        };

        parsed.ok_or_else(|| self.error(&format!("Invalid number '{}'", text)))
    }

    fn parse_keyword(&mut self) -> DocBindResult<Value> {
        let start = self.offset;
        let word = self.read_word();
        match word.as_str() {
            "null" => Ok(Value::Null),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "NaN" => Ok(Value::F64(f64::NAN)),
            "Infinity" => Ok(Value::F64(f64::INFINITY)),
            _ => {
                self.offset = start;
                Err(self.error(&format!("Unknown literal '{}'", word)))
            }
        }
    }

    fn read_word(&mut self) -> String {
        let start = self.offset;
        while matches!(self.peek(), Some(c) if is_word_char(c)) {
            self.offset += 1;
        }
        self.chars[start..self.offset].iter().collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.')
}

fn object_id_wrapper(doc: &Document) -> Option<ObjectId> {
    if doc.size() != 1 {
        return None;
    }
    match doc.get_ref(OID) {
        Some(Value::String(hex)) => ObjectId::parse(hex).ok(),
        _ => None,
    }
}
