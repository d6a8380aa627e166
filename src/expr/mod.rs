//! Small arithmetic expression evaluator.
//!
//! Grammar (evaluated on the fly, no AST):
//!
//! - literals, `pi`, parentheses, unary `-`/`+`
//! - `+ - * /` with the usual precedence, right-associative `^`
//! - functions: `sqrt exp ln log10 sin cos tan atan abs floor ceil`
//! - function-parameter references `%name.param` (e.g. `%gauss.center`),
//!   resolved through [`ParamResolver`]
//!
//! Syntax problems and unknown names are reported as
//! `SessionError::Expression`; the resolver may raise its own kinds (a
//! reference to an uninitialized function is `NoFitYet`).

use crate::error::SessionError;

/// Resolves `%func.param` references against live session state.
pub trait ParamResolver {
    fn resolve(&self, func: &str, param: &str) -> Result<f64, SessionError>;
}

/// Evaluate `input` to a number.
pub fn evaluate(input: &str, resolver: &dyn ParamResolver) -> Result<f64, SessionError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        resolver,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(t) => Err(SessionError::expression(format!(
            "Unexpected '{}' after expression.",
            t.text()
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    /// `%name`
    FuncRef(String),
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Number(v) => v.to_string(),
            Token::Ident(s) => s.clone(),
            Token::FuncRef(s) => format!("%{s}"),
            Token::Dot => ".".to_string(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Caret => "^".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, SessionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' if !(c == '.' && !next_is_digit(&chars, i)) => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part.
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
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
                let value = text.parse::<f64>().map_err(|_| {
                    SessionError::expression(format!("Bad number: '{text}'."))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '%' => {
                i += 1;
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                if start == i {
                    return Err(SessionError::expression("Expected a name after '%'."));
                }
                tokens.push(Token::FuncRef(chars[start..i].iter().collect()));
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => {
                return Err(SessionError::expression(format!(
                    "Unexpected character '{other}' in expression."
                )));
            }
        }
    }

    Ok(tokens)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    resolver: &'a dyn ParamResolver,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: Token) -> Result<(), SessionError> {
        match self.advance() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(SessionError::expression(format!(
                "Expected '{}', found '{}'.",
                token.text(),
                t.text()
            ))),
            None => Err(SessionError::expression(format!(
                "Expected '{}', found end of expression.",
                token.text()
            ))),
        }
    }

    fn expr(&mut self) -> Result<f64, SessionError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, SessionError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    value /= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // Unary sign binds looser than '^': -2^2 == -(2^2).
    fn unary(&mut self) -> Result<f64, SessionError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, SessionError> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<f64, SessionError> {
        match self.advance() {
            Some(Token::Number(v)) => Ok(v),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::FuncRef(name)) => {
                self.expect(Token::Dot)?;
                match self.advance() {
                    Some(Token::Ident(param)) => self.resolver.resolve(&name, &param),
                    _ => Err(SessionError::expression(format!(
                        "Expected a parameter name after '%{name}.'."
                    ))),
                }
            }
            Some(Token::Ident(name)) => {
                if name == "pi" {
                    return Ok(std::f64::consts::PI);
                }
                self.expect(Token::LParen)?;
                let arg = self.expr()?;
                self.expect(Token::RParen)?;
                apply_function(&name, arg)
            }
            Some(t) => Err(SessionError::expression(format!(
                "Unexpected '{}' in expression.",
                t.text()
            ))),
            None => Err(SessionError::expression("Unexpected end of expression.")),
        }
    }
}

fn apply_function(name: &str, arg: f64) -> Result<f64, SessionError> {
    let value = match name {
        "sqrt" => arg.sqrt(),
        "exp" => arg.exp(),
        "ln" => arg.ln(),
        "log10" => arg.log10(),
        "sin" => arg.sin(),
        "cos" => arg.cos(),
        "tan" => arg.tan(),
        "atan" => arg.atan(),
        "abs" => arg.abs(),
        "floor" => arg.floor(),
        "ceil" => arg.ceil(),
        _ => {
            return Err(SessionError::expression(format!(
                "Unknown function: '{name}'."
            )));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoRefs;

    impl ParamResolver for NoRefs {
        fn resolve(&self, func: &str, _param: &str) -> Result<f64, SessionError> {
            Err(SessionError::expression(format!(
                "Undefined function: '%{func}'."
            )))
        }
    }

    struct OneGauss;

    impl ParamResolver for OneGauss {
        fn resolve(&self, func: &str, param: &str) -> Result<f64, SessionError> {
            match (func, param) {
                ("gauss", "center") => Ok(12.345),
                ("gauss", "height") => Ok(100.0),
                _ => Err(SessionError::expression("no such parameter".to_string())),
            }
        }
    }

    fn eval(s: &str) -> f64 {
        evaluate(s, &NoRefs).unwrap()
    }

    #[test]
    fn ln_two() {
        assert!((eval("ln(2)") - 0.693147181).abs() < 1e-6);
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("2+3*4"), 14.0);
        assert_eq!(eval("(2+3)*4"), 20.0);
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("-2^2"), -4.0);
        assert_eq!(eval("2^-1"), 0.5);
        assert_eq!(eval("10-4-3"), 3.0);
    }

    #[test]
    fn constants_and_functions() {
        assert!((eval("pi") - std::f64::consts::PI).abs() < 1e-15);
        assert!((eval("sqrt(2)^2") - 2.0).abs() < 1e-12);
        assert!((eval("exp(ln(7))") - 7.0).abs() < 1e-12);
        assert_eq!(eval("abs(-3.5)"), 3.5);
        assert_eq!(eval("ceil(1.2) + floor(1.8)"), 3.0);
        assert!((eval("log10(1e3)") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(eval("1.5e2"), 150.0);
        assert_eq!(eval("2E-2"), 0.02);
    }

    #[test]
    fn function_references() {
        assert!((evaluate("%gauss.center", &OneGauss).unwrap() - 12.345).abs() < 1e-12);
        assert!((evaluate("%gauss.height / 2", &OneGauss).unwrap() - 50.0).abs() < 1e-12);
        assert!(evaluate("%other.center", &OneGauss).is_err());
    }

    #[test]
    fn syntax_errors() {
        for bad in ["", "2 +", "ln 2", "(1+2", "2 3", "%", "%g.", "foo(1)"] {
            let err = evaluate(bad, &NoRefs).unwrap_err();
            assert!(
                matches!(err, SessionError::Expression { .. }),
                "input {bad:?} gave {err:?}"
            );
        }
    }
}
