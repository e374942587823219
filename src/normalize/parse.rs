//! Recursive-descent parser for raw type tokens.
//!
//! Grammar (whitespace-insensitive, `or` and `|` are interchangeable):
//!
//! ```text
//! union := alt (("or" | "|") alt)*
//! alt   := table | "(" union ")" | phrase
//! table := "{" [entry ("," entry)* [","]] "}"
//! entry := "..." | word ":" union          -- "..." only as the first entry
//! phrase:= word+                           -- e.g. `light userdata`
//! ```
//!
//! Union splitting is structural: an `or` inside `{...}` is consumed by the
//! field's own `union`, never by the enclosing one.

/// Parsed, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syn {
    /// One or more words joined by a single space.
    Phrase(String),
    Union(Vec<Syn>),
    Table { fields: Vec<(String, Syn)>, open: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Word(String),
    Or,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Colon,
    Ellipsis,
}

pub fn parse(src: &str) -> Result<Syn, ParseError> {
    let toks = lex(src)?;
    let mut p = Parser { toks, pos: 0, end: src.len() };
    let syn = p.union()?;
    match p.peek() {
        None => Ok(syn),
        Some(_) => Err(p.error("unexpected trailing input")),
    }
}

// ------------------------------- Lexer ----------------------------------- //

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn lex(src: &str) -> Result<Vec<(usize, Tok)>, ParseError> {
    let mut out = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        let single = match c {
            '{' => Some(Tok::LBrace),
            '}' => Some(Tok::RBrace),
            '(' => Some(Tok::LParen),
            ')' => Some(Tok::RParen),
            ',' => Some(Tok::Comma),
            ':' => Some(Tok::Colon),
            '|' => Some(Tok::Or),
            _ => None,
        };
        if let Some(tok) = single {
            out.push((i, tok));
            chars.next();
            continue;
        }
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if src[i..].starts_with("...") {
            out.push((i, Tok::Ellipsis));
            for _ in 0..3 { chars.next(); }
            continue;
        }
        if is_word_char(c) {
            let mut end = i;
            while let Some(&(j, d)) = chars.peek() {
                if !is_word_char(d) { break; }
                end = j + d.len_utf8();
                chars.next();
            }
            let word = &src[i..end];
            let tok = if word == "or" { Tok::Or } else { Tok::Word(word.to_string()) };
            out.push((i, tok));
            continue;
        }
        return Err(ParseError { offset: i, message: format!("unexpected character `{c}`") });
    }
    Ok(out)
}

// ------------------------------- Parser ---------------------------------- //

struct Parser {
    toks: Vec<(usize, Tok)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(_, t)| t)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        tok
    }

    fn offset(&self) -> usize {
        self.toks.get(self.pos).map(|(o, _)| *o).unwrap_or(self.end)
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError { offset: self.offset(), message: message.to_string() }
    }

    fn expect(&mut self, tok: Tok, what: &str) -> Result<(), ParseError> {
        if self.peek() == Some(&tok) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn union(&mut self) -> Result<Syn, ParseError> {
        let mut alts = vec![self.alt()?];
        while self.peek() == Some(&Tok::Or) {
            self.pos += 1;
            alts.push(self.alt()?);
        }
        Ok(if alts.len() == 1 { alts.remove(0) } else { Syn::Union(alts) })
    }

    fn alt(&mut self) -> Result<Syn, ParseError> {
        match self.peek() {
            Some(Tok::LBrace) => self.table(),
            Some(Tok::LParen) => {
                self.pos += 1;
                let inner = self.union()?;
                self.expect(Tok::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Tok::Word(_)) => {
                let mut words = Vec::new();
                while let Some(Tok::Word(w)) = self.peek() {
                    words.push(w.clone());
                    self.pos += 1;
                }
                Ok(Syn::Phrase(words.join(" ")))
            }
            _ => Err(self.error("expected a type")),
        }
    }

    fn table(&mut self) -> Result<Syn, ParseError> {
        self.expect(Tok::LBrace, "`{`")?;
        let mut fields = Vec::new();
        let mut open = false;
        loop {
            if self.peek() == Some(&Tok::RBrace) {
                self.pos += 1;
                break;
            }
            match self.bump() {
                Some(Tok::Ellipsis) if fields.is_empty() && !open => open = true,
                Some(Tok::Ellipsis) => {
                    self.pos -= 1;
                    return Err(self.error("`...` must be the first table entry"));
                }
                Some(Tok::Word(name)) => {
                    self.expect(Tok::Colon, "`:` after field name")?;
                    let ty = self.union()?;
                    fields.push((name, ty));
                }
                _ => {
                    self.pos -= 1;
                    return Err(self.error("expected a table field"));
                }
            }
            match self.bump() {
                Some(Tok::Comma) => {}
                Some(Tok::RBrace) => break,
                _ => {
                    self.pos -= 1;
                    return Err(self.error("expected `,` or `}`"));
                }
            }
        }
        Ok(Syn::Table { fields, open })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase(s: &str) -> Syn {
        Syn::Phrase(s.to_string())
    }

    #[test]
    fn splits_top_level_or() {
        assert_eq!(parse("number or string").unwrap(), Syn::Union(vec![phrase("number"), phrase("string")]));
        assert_eq!(parse("number|string").unwrap(), Syn::Union(vec![phrase("number"), phrase("string")]));
    }

    #[test]
    fn keeps_multi_word_phrases() {
        assert_eq!(parse("light userdata").unwrap(), phrase("light userdata"));
        assert_eq!(
            parse("light userdata or nil").unwrap(),
            Syn::Union(vec![phrase("light userdata"), phrase("nil")])
        );
    }

    #[test]
    fn or_inside_table_belongs_to_the_field() {
        let syn = parse("{x: number or string, y: number}").unwrap();
        assert_eq!(syn, Syn::Table {
            fields: vec![
                ("x".into(), Syn::Union(vec![phrase("number"), phrase("string")])),
                ("y".into(), phrase("number")),
            ],
            open: false,
        });
    }

    #[test]
    fn union_of_tables_and_atoms() {
        let syn = parse("{a: {b: string or nil}} or table").unwrap();
        let Syn::Union(alts) = syn else { panic!("expected union") };
        assert_eq!(alts.len(), 2);
        assert!(matches!(&alts[0], Syn::Table { fields, .. } if fields.len() == 1));
    }

    #[test]
    fn leading_ellipsis_opens_table() {
        assert_eq!(parse("{...}").unwrap(), Syn::Table { fields: vec![], open: true });
        assert_eq!(
            parse("{..., n: number}").unwrap(),
            Syn::Table { fields: vec![("n".into(), phrase("number"))], open: true }
        );
        assert!(parse("{n: number, ...}").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("number or").is_err());
        assert!(parse("{x number}").is_err());
        assert!(parse("{x: number").is_err());
        assert!(parse("table<string>").is_err());
    }

    #[test]
    fn parenthesized_groups() {
        assert_eq!(
            parse("(number or string) or nil").unwrap(),
            Syn::Union(vec![Syn::Union(vec![phrase("number"), phrase("string")]), phrase("nil")])
        );
    }
}
