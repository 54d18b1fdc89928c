use super::*;

/// Advance the character iterator and update offset/line/column tracking
pub(super) fn bump(lexer: &mut Lexer) -> Option<char> {
    let curr = lexer.peek;
    if let Some(c) = curr {
        lexer.offset += c.len_utf8();
        if c == '\n' {
            lexer.line += 1;
            lexer.column = 1;
        } else {
            lexer.column += 1;
        }
    }
    lexer.peek = lexer.input.next();
    curr
}

/// Look `n` characters past the current one without consuming anything.
pub(super) fn peek_nth(lexer: &Lexer, n: usize) -> Option<char> {
    if n == 0 {
        return lexer.peek;
    }
    lexer.input.clone().nth(n - 1)
}

/// Skip blanks, comments and escaped line breaks. Newlines are left in place.
pub(super) fn skip_whitespace_and_comments(lexer: &mut Lexer) -> Result<()> {
    // shebang line
    if lexer.offset == 0 && lexer.peek == Some('#') && peek_nth(lexer, 1) == Some('!') {
        skip_line_comment(lexer);
    }

    while let Some(c) = lexer.peek {
        match c {
            ' ' | '\t' | '\r' | '\u{c}' => {
                bump(lexer);
            }
            '\\' if matches!(peek_nth(lexer, 1), Some('\n')) => {
                bump(lexer);
                bump(lexer);
            }
            '\\' if peek_nth(lexer, 1) == Some('\r') && peek_nth(lexer, 2) == Some('\n') => {
                bump(lexer);
                bump(lexer);
                bump(lexer);
            }
            '/' if peek_nth(lexer, 1) == Some('/') => skip_line_comment(lexer),
            '/' if peek_nth(lexer, 1) == Some('*') => skip_block_comment(lexer)?,
            _ => break,
        }
    }
    Ok(())
}

fn skip_line_comment(lexer: &mut Lexer) {
    while let Some(ch) = lexer.peek {
        if ch == '\n' {
            break;
        }
        bump(lexer);
    }
}

fn skip_block_comment(lexer: &mut Lexer) -> Result<()> {
    let start = lexer.span();
    bump(lexer);
    bump(lexer);
    loop {
        match bump(lexer) {
            Some('*') if lexer.peek == Some('/') => {
                bump(lexer);
                return Ok(());
            }
            Some(_) => {}
            None => {
                return Err(lexer.error(
                    "Unterminated block comment",
                    start,
                    Some("Expected closing '*/'"),
                    105,
                ));
            }
        }
    }
}
