use crate::error::{ParseError, ParseErrorKind};
use crate::value::{Document, KeyValues, Value};
use std::iter::Peekable;
use std::str::Chars;

/// Deepest block nesting accepted by [`parse`]. The root block is depth 1.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Text(String),
}

/// A token plus the position it started at.
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            kind,
        }
    }

    /// Skip whitespace, `//` comments and `[$CONDITION]` tags.
    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek().copied() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() != Some(&'/') {
                        return;
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('[') => {
                    while let Some(c) = self.bump() {
                        if c == ']' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn next(&mut self) -> Result<Option<Spanned>, ParseError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);
        let Some(c) = self.chars.peek().copied() else {
            return Ok(None);
        };

        let token = match c {
            '{' => {
                self.bump();
                Token::Open
            }
            '}' => {
                self.bump();
                Token::Close
            }
            '"' => {
                self.bump();
                Token::Text(self.quoted(line, column)?)
            }
            _ => Token::Text(self.unquoted()),
        };

        Ok(Some(Spanned {
            token,
            line,
            column,
        }))
    }

    fn quoted(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ParseError {
                        line,
                        column,
                        kind: ParseErrorKind::UnterminatedString,
                    })
                }
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    // Unknown escapes are kept verbatim; Windows paths show up unescaped.
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn unquoted(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

fn unexpected(spanned: Spanned) -> ParseError {
    let found = match spanned.token {
        Token::Open => "{".to_string(),
        Token::Close => "}".to_string(),
        Token::Text(s) => s,
    };
    ParseError {
        line: spanned.line,
        column: spanned.column,
        kind: ParseErrorKind::UnexpectedToken(found),
    }
}

/// Parse a KeyValues1 text document with a single root block.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut lexer = Lexer::new(text);

    let root_key = match lexer.next()? {
        Some(Spanned {
            token: Token::Text(key),
            ..
        }) => key,
        Some(other) => return Err(unexpected(other)),
        None => return Err(lexer.error(ParseErrorKind::UnexpectedEof)),
    };

    match lexer.next()? {
        Some(Spanned {
            token: Token::Open, ..
        }) => {}
        Some(other) => return Err(unexpected(other)),
        None => return Err(lexer.error(ParseErrorKind::UnexpectedEof)),
    }

    let root = parse_block(&mut lexer, 1)?;

    if let Some(extra) = lexer.next()? {
        return Err(ParseError {
            line: extra.line,
            column: extra.column,
            kind: ParseErrorKind::TrailingData,
        });
    }

    Ok(Document { root_key, root })
}

/// Parse entries up to and including the closing brace of the current block.
fn parse_block(lexer: &mut Lexer<'_>, depth: usize) -> Result<KeyValues, ParseError> {
    let mut block = KeyValues::new();

    loop {
        let key = match lexer.next()? {
            None => return Err(lexer.error(ParseErrorKind::UnexpectedEof)),
            Some(Spanned {
                token: Token::Close,
                ..
            }) => return Ok(block),
            Some(Spanned {
                token: Token::Text(key),
                ..
            }) => key,
            Some(other) => return Err(unexpected(other)),
        };

        match lexer.next()? {
            None => return Err(lexer.error(ParseErrorKind::UnexpectedEof)),
            Some(Spanned {
                token: Token::Text(value),
                ..
            }) => block.push(key, Value::String(value)),
            Some(Spanned {
                token: Token::Open,
                line,
                column,
            }) => {
                if depth >= MAX_DEPTH {
                    return Err(ParseError {
                        line,
                        column,
                        kind: ParseErrorKind::TooDeep,
                    });
                }
                let child = parse_block(lexer, depth + 1)?;
                block.push(key, Value::Object(child));
            }
            Some(other) => return Err(unexpected(other)),
        }
    }
}
