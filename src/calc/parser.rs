//! Tokenizer and recursive-descent parser.
//!
//! Precedence, loosest first: `+ -`, then `* / %`, then unary `+ -`, then
//! right-associative `^`, then postfix `!`.

use super::CalcError;

/// Longest accepted expression, in characters.
const MAX_LEN: usize = 10_000;

/// Deepest accepted nesting of parentheses and unary operators.
const MAX_DEPTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Expr {
    /// Unsigned literal text, parsed by each number mode.
    Number(String),
    /// A bare identifier: a constant.
    Name(String),
    Negate(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Factorial(Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(String),
    Ident(String),
    Op(char),
    Open,
    Close,
    Comma,
}

/// Parse `input` into an expression tree.
pub(super) fn parse(input: &str) -> Result<Expr, CalcError> {
    let chars = input.chars().count();
    if chars > MAX_LEN {
        return Err(syntax(1, format!("expression longer than {MAX_LEN} characters")));
    }
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        next: 0,
        end: chars + 1,
        depth: 0,
    };
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some((position, token)) => Err(syntax(*position, format!("unexpected {}", describe(token)))),
    }
}

fn syntax(position: usize, message: impl Into<String>) -> CalcError {
    CalcError::Syntax {
        position,
        message: message.into(),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number '{n}'"),
        Token::Ident(name) => format!("name '{name}'"),
        Token::Op(op) => format!("'{op}'"),
        Token::Open => "'('".to_owned(),
        Token::Close => "')'".to_owned(),
        Token::Comma => "','".to_owned(),
    }
}

/// Tokens paired with their 1-based character column.
fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let position = i + 1;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent only when digits follow; `2e` lexes as `2` then `e`.
            if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                let mut j = i + 1;
                if j < chars.len() && matches!(chars[j], '+' | '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            if text.matches('.').count() > 1 || text.starts_with(".e") || text == "." {
                return Err(syntax(position, format!("malformed number '{text}'")));
            }
            tokens.push((position, Token::Number(text)));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push((position, Token::Ident(chars[start..i].iter().collect())));
            continue;
        }

        let token = match c {
            '+' | '-' | '*' | '/' | '%' | '^' | '!' => Token::Op(c),
            '(' => Token::Open,
            ')' => Token::Close,
            ',' => Token::Comma,
            other => return Err(syntax(position, format!("unexpected character '{other}'"))),
        };
        tokens.push((position, token));
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    next: usize,
    /// Column reported for errors at end of input.
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.next)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.next).cloned();
        if token.is_some() {
            self.next += 1;
        }
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some((_, Token::Op(op))) if ops.contains(op) => {
                let op = *op;
                self.next += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, wanted: Token) -> Result<(), CalcError> {
        match self.advance() {
            Some((_, token)) if token == wanted => Ok(()),
            Some((position, token)) => Err(syntax(
                position,
                format!("expected {}, found {}", describe(&wanted), describe(&token)),
            )),
            None => Err(syntax(self.end, format!("expected {}", describe(&wanted)))),
        }
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let position = self.peek().map_or(self.end, |(p, _)| *p);
            return Err(syntax(position, "expression nested too deeply"));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            let op = match op {
                '*' => BinaryOp::Mul,
                '/' => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, CalcError> {
        self.descend()?;
        let expr = match self.eat_op(&['+', '-']) {
            Some('-') => Expr::Negate(Box::new(self.unary()?)),
            Some(_) => self.unary()?,
            None => self.power()?,
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn power(&mut self) -> Result<Expr, CalcError> {
        let base = self.postfix()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, CalcError> {
        let mut expr = self.primary()?;
        while self.eat_op(&['!']).is_some() {
            expr = Expr::Factorial(Box::new(expr));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, CalcError> {
        match self.advance() {
            Some((_, Token::Number(text))) => Ok(Expr::Number(text)),
            Some((_, Token::Ident(name))) => {
                if self.peek().is_some_and(|(_, t)| *t == Token::Open) {
                    self.next += 1;
                    let args = self.arguments()?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some((_, Token::Open)) => {
                self.descend()?;
                let inner = self.expression()?;
                self.expect(Token::Close)?;
                self.depth -= 1;
                Ok(inner)
            }
            Some((position, token)) => Err(syntax(position, format!("unexpected {}", describe(&token)))),
            None => Err(syntax(self.end, "unexpected end of expression")),
        }
    }

    /// Comma-separated arguments after an opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Expr>, CalcError> {
        if self.peek().is_some_and(|(_, t)| *t == Token::Close) {
            self.next += 1;
            return Ok(Vec::new());
        }
        self.descend()?;
        let mut args = vec![self.expression()?];
        while self.peek().is_some_and(|(_, t)| *t == Token::Comma) {
            self.next += 1;
            args.push(self.expression()?);
        }
        self.expect(Token::Close)?;
        self.depth -= 1;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Box<Expr> {
        Box::new(Expr::Number(text.into()))
    }

    fn error_position(input: &str) -> usize {
        match parse(input) {
            Err(CalcError::Syntax { position, .. }) => position,
            other => panic!("{input}: expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            parse("1 + 2 * 3").expect("parse"),
            Expr::Binary(
                BinaryOp::Add,
                num("1"),
                Box::new(Expr::Binary(BinaryOp::Mul, num("2"), num("3")))
            )
        );
        assert_eq!(
            parse("2^3^2").expect("parse"),
            Expr::Binary(
                BinaryOp::Pow,
                num("2"),
                Box::new(Expr::Binary(BinaryOp::Pow, num("3"), num("2")))
            )
        );
        assert_eq!(
            parse("-2^2").expect("parse"),
            Expr::Negate(Box::new(Expr::Binary(BinaryOp::Pow, num("2"), num("2"))))
        );
        assert_eq!(
            parse("8 - 3 - 1").expect("parse"),
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Binary(BinaryOp::Sub, num("8"), num("3"))),
                num("1")
            )
        );
    }

    #[test]
    fn postfix_factorial_binds_tightest() {
        assert_eq!(
            parse("2^3!").expect("parse"),
            Expr::Binary(BinaryOp::Pow, num("2"), Box::new(Expr::Factorial(num("3"))))
        );
    }

    #[test]
    fn calls_constants_and_literals() {
        assert_eq!(
            parse("max(1, pi, 2.5e-3)").expect("parse"),
            Expr::Call(
                "max".into(),
                vec![
                    Expr::Number("1".into()),
                    Expr::Name("pi".into()),
                    Expr::Number("2.5e-3".into())
                ]
            )
        );
        assert_eq!(parse("f()").expect("parse"), Expr::Call("f".into(), vec![]));
        assert_eq!(parse("+ 4").expect("parse"), Expr::Number("4".into()));
    }

    #[test]
    fn trailing_e_is_not_an_exponent() {
        let tokens = tokenize("2e").expect("tokenize");
        assert_eq!(
            tokens,
            vec![(1, Token::Number("2".into())), (2, Token::Ident("e".into()))]
        );
    }

    #[test]
    fn errors_point_at_the_offending_column() {
        assert_eq!(error_position("2 +"), 4);
        assert_eq!(error_position("(1 + 2"), 7);
        assert_eq!(error_position("1 + # 2"), 5);
        assert_eq!(error_position("1 2"), 3);
        assert_eq!(error_position("1..2"), 1);
        assert_eq!(error_position("max(1,)"), 7);
        assert_eq!(error_position(""), 1);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        assert_eq!(error_position("ồ + $"), 5);
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(matches!(parse(&deep), Err(CalcError::Syntax { .. })));
        let negations = format!("{}1", "-".repeat(500));
        assert!(matches!(parse(&negations), Err(CalcError::Syntax { .. })));
        let fine = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse(&fine).is_ok());
    }

    #[test]
    fn overlong_input_is_rejected() {
        let long = "1+".repeat(MAX_LEN);
        assert!(matches!(parse(&long), Err(CalcError::Syntax { position: 1, .. })));
    }
}
