use crate::language::{
    errors::SyntaxError,
    span::Span,
    token::{Tag, Token},
};

/// Lexer output. `ignored` holds the comment spans in source order; the
/// parse-tree consumers use them to map positions back over trivia.
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub ignored: Vec<Span>,
    pub errors: Vec<SyntaxError>,
}

pub fn lex(source: &str) -> Lexed {
    let lexer = Lexer::new(source);
    lexer.run()
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
    current: Option<char>,
    offset: usize,
    out: Lexed,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let mut chars = src.chars();
        let current = chars.next();
        Self {
            src,
            chars,
            current,
            offset: 0,
            out: Lexed::default(),
        }
    }

    fn run(mut self) -> Lexed {
        while let Some(ch) = self.current {
            match ch {
                '/' if self.peek() == Some('/') => self.eat_line_comment(),
                '/' if self.peek() == Some('*') => self.eat_block_comment(),
                ch if ch.is_whitespace() => {
                    self.bump();
                }
                ch if ch.is_ascii_alphabetic() || ch == '_' => self.lex_identifier(),
                ch if ch.is_ascii_digit() => self.lex_number(),
                '.' if self.peek().is_some_and(|next| next.is_ascii_digit()) => self.lex_number(),
                _ => self.lex_symbol(),
            }
        }
        self.push_token(Tag::Eof, self.offset, self.offset);
        self.out
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            self.offset += ch.len_utf8();
        }
        self.current = self.chars.next();
        self.current
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn bump_with(&mut self, tag: Tag) -> Tag {
        self.bump();
        tag
    }

    fn push_token(&mut self, tag: Tag, start: usize, end: usize) {
        self.out.tokens.push(Token {
            tag,
            span: Span::new(start, end),
        });
    }

    fn eat_line_comment(&mut self) {
        let start = self.offset;
        self.bump();
        self.bump();
        while let Some(ch) = self.current {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
        self.out.ignored.push(Span::new(start, self.offset));
    }

    fn eat_block_comment(&mut self) {
        let start = self.offset;
        self.bump();
        self.bump();
        while let Some(ch) = self.current {
            if ch == '*' && self.peek() == Some('/') {
                self.bump();
                self.bump();
                self.out.ignored.push(Span::new(start, self.offset));
                return;
            }
            self.bump();
        }
        self.out.ignored.push(Span::new(start, self.offset));
        self.out.errors.push(
            SyntaxError::new("Unterminated block comment", Span::new(start, self.offset))
                .with_help("close the comment with `*/`"),
        );
    }

    fn lex_identifier(&mut self) {
        let start = self.offset;
        while let Some(ch) = self.current {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.offset];
        let tag = Tag::keyword(text).unwrap_or(Tag::Identifier);
        self.push_token(tag, start, self.offset);
    }

    fn lex_number(&mut self) {
        let start = self.offset;
        let mut previous = '\0';
        while let Some(ch) = self.current {
            let keep = ch.is_ascii_alphanumeric()
                || ch == '.'
                || ((ch == '+' || ch == '-') && matches!(previous, 'e' | 'E'));
            if !keep {
                break;
            }
            previous = ch;
            self.bump();
        }
        self.push_token(Tag::Number, start, self.offset);
    }

    fn lex_symbol(&mut self) {
        let start = self.offset;
        let first = self.current.unwrap_or('\0');
        self.bump();
        let second = self.current;
        let tag = match (first, second) {
            ('<', Some('<')) => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    Tag::ShlEq
                } else {
                    Tag::Shl
                }
            }
            ('>', Some('>')) => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    Tag::ShrEq
                } else {
                    Tag::Shr
                }
            }
            ('<', Some('=')) => self.bump_with(Tag::LtEq),
            ('>', Some('=')) => self.bump_with(Tag::GtEq),
            ('=', Some('=')) => self.bump_with(Tag::EqEq),
            ('!', Some('=')) => self.bump_with(Tag::BangEq),
            ('&', Some('&')) => self.bump_with(Tag::AmpAmp),
            ('|', Some('|')) => self.bump_with(Tag::PipePipe),
            ('^', Some('^')) => self.bump_with(Tag::CaretCaret),
            ('+', Some('+')) => self.bump_with(Tag::PlusPlus),
            ('-', Some('-')) => self.bump_with(Tag::MinusMinus),
            ('+', Some('=')) => self.bump_with(Tag::PlusEq),
            ('-', Some('=')) => self.bump_with(Tag::MinusEq),
            ('*', Some('=')) => self.bump_with(Tag::StarEq),
            ('/', Some('=')) => self.bump_with(Tag::SlashEq),
            ('%', Some('=')) => self.bump_with(Tag::PercentEq),
            ('&', Some('=')) => self.bump_with(Tag::AmpEq),
            ('^', Some('=')) => self.bump_with(Tag::CaretEq),
            ('|', Some('=')) => self.bump_with(Tag::PipeEq),
            ('(', _) => Tag::LParen,
            (')', _) => Tag::RParen,
            ('{', _) => Tag::LBrace,
            ('}', _) => Tag::RBrace,
            ('[', _) => Tag::LBracket,
            (']', _) => Tag::RBracket,
            (',', _) => Tag::Comma,
            (';', _) => Tag::Semi,
            ('.', _) => Tag::Dot,
            (':', _) => Tag::Colon,
            ('?', _) => Tag::Question,
            ('=', _) => Tag::Eq,
            ('+', _) => Tag::Plus,
            ('-', _) => Tag::Minus,
            ('*', _) => Tag::Star,
            ('/', _) => Tag::Slash,
            ('%', _) => Tag::Percent,
            ('<', _) => Tag::Lt,
            ('>', _) => Tag::Gt,
            ('&', _) => Tag::Amp,
            ('|', _) => Tag::Pipe,
            ('^', _) => Tag::Caret,
            ('!', _) => Tag::Bang,
            ('~', _) => Tag::Tilde,
            _ => Tag::Unknown,
        };
        self.push_token(tag, start, self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(source: &str) -> Vec<Tag> {
        lex(source).tokens.iter().map(|token| token.tag).collect()
    }

    #[test]
    fn lexes_declaration_tokens() {
        assert_eq!(
            tags("uniform vec4 color;"),
            vec![
                Tag::KeywordUniform,
                Tag::Identifier,
                Tag::Identifier,
                Tag::Semi,
                Tag::Eof
            ]
        );
    }

    #[test]
    fn lexes_compound_operators_longest_first() {
        assert_eq!(
            tags("a <<= b >> c <= d"),
            vec![
                Tag::Identifier,
                Tag::ShlEq,
                Tag::Identifier,
                Tag::Shr,
                Tag::Identifier,
                Tag::LtEq,
                Tag::Identifier,
                Tag::Eof
            ]
        );
    }

    #[test]
    fn lexes_numbers_with_suffix_and_exponent() {
        let lexed = lex("1.5e-3 42u 0xFFu .25f");
        let numbers: Vec<_> = lexed
            .tokens
            .iter()
            .filter(|token| token.tag == Tag::Number)
            .collect();
        assert_eq!(numbers.len(), 4);
        assert_eq!(numbers[0].span, Span::new(0, 6));
    }

    #[test]
    fn records_comment_spans_in_order() {
        let source = "/*1*/int x; // tail";
        let lexed = lex(source);
        assert_eq!(lexed.ignored.len(), 2);
        assert_eq!(lexed.ignored[0].text(source), "/*1*/");
        assert_eq!(lexed.ignored[1].text(source), "// tail");
        assert!(lexed.errors.is_empty());
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let lexed = lex("int x; /* open");
        assert_eq!(lexed.errors.len(), 1);
        assert!(lexed.errors[0].help.is_some());
        assert_eq!(lexed.ignored.len(), 1);
    }

    #[test]
    fn unknown_characters_become_unknown_tokens() {
        assert_eq!(
            tags("int $ x;"),
            vec![Tag::Identifier, Tag::Unknown, Tag::Identifier, Tag::Semi, Tag::Eof]
        );
    }
}
