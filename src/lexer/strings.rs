use super::*;
use super::scanner::{bump, peek_nth};
use super::tokenizer::{is_ident_part, is_ident_start};

/// Accumulates literal text and placeholders while scanning a string body.
struct StringBuilder {
    parts: Vec<StrPart>,
    text: String,
}

impl StringBuilder {
    fn new() -> Self {
        Self { parts: Vec::new(), text: String::new() }
    }

    fn push_expr(&mut self, source: String, span: Span) {
        if !self.text.is_empty() {
            self.parts.push(StrPart::Text(std::mem::take(&mut self.text)));
        }
        self.parts.push(StrPart::Expr { source, span });
    }

    fn finish(mut self) -> TokenKind {
        if self.parts.is_empty() {
            return TokenKind::Str(self.text);
        }
        if !self.text.is_empty() {
            self.parts.push(StrPart::Text(self.text));
        }
        TokenKind::GString(self.parts)
    }
}

pub(super) fn tokenize_quoted(lexer: &mut Lexer, span: Span) -> Result<TokenKind> {
    let quote = lexer.peek.unwrap_or('"');
    let triple = peek_nth(lexer, 1) == Some(quote) && peek_nth(lexer, 2) == Some(quote);
    let interpolate = quote == '"';

    bump(lexer);
    if triple {
        bump(lexer);
        bump(lexer);
    } else if lexer.peek == Some(quote) {
        // empty string
        bump(lexer);
        return Ok(TokenKind::Str(String::new()));
    }

    let terminator = if triple { format!("{0}{0}{0}", quote) } else { quote.to_string() };
    let mut out = StringBuilder::new();

    loop {
        let Some(ch) = lexer.peek else {
            return Err(unterminated(lexer, span, &terminator));
        };

        if ch == quote {
            if !triple {
                bump(lexer);
                break;
            }
            if peek_nth(lexer, 1) == Some(quote) && peek_nth(lexer, 2) == Some(quote) {
                bump(lexer);
                bump(lexer);
                bump(lexer);
                break;
            }
            out.text.push(ch);
            bump(lexer);
            continue;
        }

        match ch {
            '\n' if !triple => return Err(unterminated(lexer, span, &terminator)),
            '\\' => read_escape(lexer, &mut out.text)?,
            '$' if interpolate => read_placeholder(lexer, &mut out)?,
            _ => {
                out.text.push(ch);
                bump(lexer);
            }
        }
    }

    Ok(out.finish())
}

/// `/pattern/` strings: backslashes are kept except in front of `/`, and `$` interpolates.
pub(super) fn tokenize_slashy(lexer: &mut Lexer, span: Span) -> Result<TokenKind> {
    bump(lexer);
    let mut out = StringBuilder::new();

    loop {
        let Some(ch) = lexer.peek else {
            return Err(unterminated(lexer, span, "/"));
        };
        match ch {
            '/' => {
                bump(lexer);
                break;
            }
            '\\' if peek_nth(lexer, 1) == Some('/') => {
                bump(lexer);
                bump(lexer);
                out.text.push('/');
            }
            '$' if peek_nth(lexer, 1).is_some_and(|c| c == '{' || is_ident_start(c)) => {
                read_placeholder(lexer, &mut out)?;
            }
            _ => {
                out.text.push(ch);
                bump(lexer);
            }
        }
    }

    Ok(out.finish())
}

fn unterminated(lexer: &Lexer, span: Span, terminator: &str) -> ConfigError {
    lexer.error(
        "Unterminated string literal",
        span,
        Some(&format!("Expected closing {}", terminator)),
        103,
    )
}

fn read_escape(lexer: &mut Lexer, out: &mut String) -> Result<()> {
    let span = lexer.span();
    bump(lexer); // consume '\'
    let Some(next) = bump(lexer) else {
        return Err(lexer.error("Trailing backslash in string", span, None, 103));
    };

    let escaped = match next {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        's' => ' ',
        '0' => '\0',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        '$' => '$',
        '/' => '/',
        // line continuation inside a string
        '\n' => return Ok(()),
        'u' => {
            let mut hex = String::new();
            for _ in 0..4 {
                match lexer.peek {
                    Some(c) if c.is_ascii_hexdigit() => {
                        hex.push(c);
                        bump(lexer);
                    }
                    _ => break,
                }
            }
            return u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|_| hex.len() == 4)
                .and_then(char::from_u32)
                .map(|c| out.push(c))
                .ok_or_else(|| {
                    lexer.error(
                        format!("Invalid unicode escape '\\u{}'", hex),
                        span,
                        Some("Unicode escapes take exactly four hex digits"),
                        106,
                    )
                });
        }
        other => {
            return Err(lexer.error(
                format!("Invalid escape sequence '\\{}'", other),
                span,
                Some("Valid escapes are \\n \\t \\r \\b \\f \\s \\\\ \\' \\\" \\$ \\uXXXX"),
                106,
            ));
        }
    };
    out.push(escaped);
    Ok(())
}

/// Reads `${ expr }` or `$name.path` starting at the `$`.
fn read_placeholder(lexer: &mut Lexer, out: &mut StringBuilder) -> Result<()> {
    let dollar = lexer.span();
    match peek_nth(lexer, 1) {
        Some('{') => {
            bump(lexer);
            bump(lexer);
            let span = lexer.span();
            let start = lexer.offset;
            let mut depth = 0usize;
            loop {
                match lexer.peek {
                    None => {
                        return Err(lexer.error(
                            "Unterminated string placeholder",
                            dollar,
                            Some("Expected closing '}'"),
                            103,
                        ));
                    }
                    Some('}') if depth == 0 => break,
                    Some('}') => depth -= 1,
                    Some('{') => depth += 1,
                    Some(q @ ('\'' | '"')) => {
                        bump(lexer);
                        while let Some(c) = lexer.peek {
                            if c == q {
                                break;
                            }
                            if c == '\\' {
                                bump(lexer);
                            }
                            bump(lexer);
                        }
                    }
                    Some(_) => {}
                }
                bump(lexer);
            }
            let source = lexer.slice(start).to_string();
            bump(lexer); // consume '}'
            out.push_expr(source, span);
        }
        Some(c) if is_ident_start(c) && c != '$' => {
            bump(lexer);
            let span = lexer.span();
            let start = lexer.offset;
            take_ident(lexer);
            // dotted continuation only when an identifier follows the dot
            while lexer.peek == Some('.') && peek_nth(lexer, 1).is_some_and(|c| is_ident_start(c) && c != '$') {
                bump(lexer);
                take_ident(lexer);
            }
            out.push_expr(lexer.slice(start).to_string(), span);
        }
        _ => {
            out.text.push('$');
            bump(lexer);
        }
    }
    Ok(())
}

fn take_ident(lexer: &mut Lexer) {
    while let Some(c) = lexer.peek {
        if is_ident_part(c) && c != '$' {
            bump(lexer);
        } else {
            break;
        }
    }
}
