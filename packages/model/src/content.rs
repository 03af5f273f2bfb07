//! Content expressions
//!
//! A content expression constrains the sequence of child types a node may hold:
//!
//! ```text
//! caption? thead? tbody* tfoot?
//! (p | flow)+
//! li{1,3}
//! ```
//!
//! Names refer to node types or groups. Expressions are tokenized with logos,
//! parsed into a small AST and compiled into an NFA. Matching walks sets of NFA
//! states, so a [`ContentMatch`] can be advanced one child type at a time.

use crate::error::{ModelError, ModelResult};
use logos::Logos;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum ExprToken<'src> {
    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Number(usize),

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("|")]
    Pipe,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Name(String),
    Seq(Vec<Expr>),
    Choice(Vec<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    Opt(Box<Expr>),
    Range {
        expr: Box<Expr>,
        min: usize,
        max: Option<usize>,
    },
}

struct ExprParser<'src> {
    source: &'src str,
    tokens: Vec<ExprToken<'src>>,
    pos: usize,
}

impl<'src> ExprParser<'src> {
    fn new(source: &'src str) -> ModelResult<Self> {
        let mut tokens = Vec::new();
        for (token, span) in ExprToken::lexer(source).spanned() {
            match token {
                Ok(token) => tokens.push(token),
                Err(()) => {
                    return Err(invalid(source, format!("unexpected input at {}", span.start)));
                }
            }
        }
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&ExprToken<'src>> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &ExprToken<'src>) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        invalid(self.source, message)
    }

    fn parse(mut self) -> ModelResult<Expr> {
        let expr = self.parse_choice()?;
        if self.pos < self.tokens.len() {
            return Err(self.error(format!("unexpected token {:?}", self.tokens[self.pos])));
        }
        Ok(expr)
    }

    fn parse_choice(&mut self) -> ModelResult<Expr> {
        let mut options = vec![self.parse_seq()?];
        while self.eat(&ExprToken::Pipe) {
            options.push(self.parse_seq()?);
        }
        Ok(if options.len() == 1 {
            options.remove(0)
        } else {
            Expr::Choice(options)
        })
    }

    fn parse_seq(&mut self) -> ModelResult<Expr> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, ExprToken::RParen | ExprToken::Pipe) {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Seq(items)
        })
    }

    fn parse_subscript(&mut self) -> ModelResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat(&ExprToken::Star) {
                expr = Expr::Star(Box::new(expr));
            } else if self.eat(&ExprToken::Plus) {
                expr = Expr::Plus(Box::new(expr));
            } else if self.eat(&ExprToken::Question) {
                expr = Expr::Opt(Box::new(expr));
            } else if self.eat(&ExprToken::LBrace) {
                expr = self.parse_range(expr)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_number(&mut self) -> ModelResult<usize> {
        match self.peek() {
            Some(ExprToken::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(n)
            }
            other => Err(self.error(format!("expected number, found {other:?}"))),
        }
    }

    fn parse_range(&mut self, expr: Expr) -> ModelResult<Expr> {
        let min = self.parse_number()?;
        let max = if self.eat(&ExprToken::Comma) {
            match self.peek() {
                Some(ExprToken::Number(_)) => Some(self.parse_number()?),
                _ => None,
            }
        } else {
            Some(min)
        };
        if !self.eat(&ExprToken::RBrace) {
            return Err(self.error("unclosed range"));
        }
        if let Some(max) = max {
            if max < min {
                return Err(self.error(format!("range maximum {max} below minimum {min}")));
            }
        }
        Ok(Expr::Range {
            expr: Box::new(expr),
            min,
            max,
        })
    }

    fn parse_atom(&mut self) -> ModelResult<Expr> {
        match self.peek().cloned() {
            Some(ExprToken::LParen) => {
                self.pos += 1;
                let expr = self.parse_choice()?;
                if !self.eat(&ExprToken::RParen) {
                    return Err(self.error("missing closing parenthesis"));
                }
                Ok(expr)
            }
            Some(ExprToken::Name(name)) => {
                self.pos += 1;
                Ok(Expr::Name(name.to_string()))
            }
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }
}

fn invalid(expr: &str, message: impl Into<String>) -> ModelError {
    ModelError::InvalidContentExpression {
        expr: expr.to_string(),
        message: message.into(),
    }
}

/// Thompson NFA over node type names. Epsilon edges carry no term.
#[derive(Debug, Default)]
struct Nfa {
    edges: Vec<Vec<(Option<String>, usize)>>,
    accept: usize,
}

impl Nfa {
    fn new_state(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    fn edge(&mut self, from: usize, term: Option<String>, to: usize) {
        self.edges[from].push((term, to));
    }

    fn compile(
        &mut self,
        expr: &Expr,
        from: usize,
        resolve: &dyn Fn(&str) -> Option<Vec<String>>,
        source: &str,
    ) -> ModelResult<usize> {
        match expr {
            Expr::Name(name) => {
                let types = resolve(name)
                    .ok_or_else(|| invalid(source, format!("no node type or group '{name}'")))?;
                let to = self.new_state();
                for type_name in types {
                    self.edge(from, Some(type_name), to);
                }
                Ok(to)
            }
            Expr::Seq(items) => {
                let mut cur = from;
                for item in items {
                    cur = self.compile(item, cur, resolve, source)?;
                }
                Ok(cur)
            }
            Expr::Choice(options) => {
                let to = self.new_state();
                for option in options {
                    let end = self.compile(option, from, resolve, source)?;
                    self.edge(end, None, to);
                }
                Ok(to)
            }
            Expr::Star(inner) => {
                let lp = self.new_state();
                self.edge(from, None, lp);
                let end = self.compile(inner, lp, resolve, source)?;
                self.edge(end, None, lp);
                Ok(lp)
            }
            Expr::Plus(inner) => {
                let end = self.compile(inner, from, resolve, source)?;
                self.compile(&Expr::Star(inner.clone()), end, resolve, source)
            }
            Expr::Opt(inner) => {
                let end = self.compile(inner, from, resolve, source)?;
                self.edge(from, None, end);
                Ok(end)
            }
            Expr::Range { expr, min, max } => {
                let mut cur = from;
                for _ in 0..*min {
                    cur = self.compile(expr, cur, resolve, source)?;
                }
                match max {
                    None => self.compile(&Expr::Star(expr.clone()), cur, resolve, source),
                    Some(max) => {
                        let mut ends = vec![cur];
                        for _ in *min..*max {
                            cur = self.compile(expr, cur, resolve, source)?;
                            ends.push(cur);
                        }
                        let to = self.new_state();
                        for end in ends {
                            self.edge(end, None, to);
                        }
                        Ok(to)
                    }
                }
            }
        }
    }

    /// Epsilon closure in discovery order
    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut work: VecDeque<usize> = seeds.into_iter().collect();
        while let Some(state) = work.pop_front() {
            if !seen.insert(state) {
                continue;
            }
            out.push(state);
            for (term, to) in &self.edges[state] {
                if term.is_none() {
                    work.push_back(*to);
                }
            }
        }
        out
    }
}

/// Position inside a content expression
#[derive(Debug, Clone)]
pub struct ContentMatch {
    nfa: Arc<Nfa>,
    states: Vec<usize>,
}

impl PartialEq for ContentMatch {
    fn eq(&self, other: &Self) -> bool {
        if !Arc::ptr_eq(&self.nfa, &other.nfa) {
            return false;
        }
        let mut a = self.states.clone();
        let mut b = other.states.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

impl ContentMatch {
    /// Compile an expression. `resolve` maps a name to the node types it stands
    /// for (a single type or the members of a group), or `None` if unknown.
    pub fn compile(expr: &str, resolve: &dyn Fn(&str) -> Option<Vec<String>>) -> ModelResult<Self> {
        let ast = ExprParser::new(expr)?.parse()?;
        let mut nfa = Nfa::default();
        let start = nfa.new_state();
        nfa.accept = nfa.compile(&ast, start, resolve, expr)?;
        let nfa = Arc::new(nfa);
        let states = nfa.closure([start]);
        Ok(Self { nfa, states })
    }

    /// Match for nodes without content
    pub fn empty() -> Self {
        let mut nfa = Nfa::default();
        let start = nfa.new_state();
        nfa.accept = start;
        Self {
            nfa: Arc::new(nfa),
            states: vec![start],
        }
    }

    /// Advance past one child of type `type_name`
    pub fn match_type(&self, type_name: &str) -> Option<ContentMatch> {
        let targets: Vec<usize> = self
            .states
            .iter()
            .flat_map(|state| self.nfa.edges[*state].iter())
            .filter(|(term, _)| term.as_deref() == Some(type_name))
            .map(|(_, to)| *to)
            .collect();
        if targets.is_empty() {
            return None;
        }
        Some(ContentMatch {
            nfa: self.nfa.clone(),
            states: self.nfa.closure(targets),
        })
    }

    /// Advance past a sequence of child types
    pub fn match_types<S: AsRef<str>>(&self, types: &[S]) -> Option<ContentMatch> {
        let mut cur = self.clone();
        for type_name in types {
            cur = cur.match_type(type_name.as_ref())?;
        }
        Some(cur)
    }

    /// Whether the content may end here
    pub fn valid_end(&self) -> bool {
        self.states.contains(&self.nfa.accept)
    }

    /// Types that may come next, in expression order
    pub fn next_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for state in &self.states {
            for (term, _) in &self.nfa.edges[*state] {
                if let Some(term) = term.as_deref() {
                    if !out.contains(&term) {
                        out.push(term);
                    }
                }
            }
        }
        out
    }

    /// Whether anything at all may follow
    pub fn is_terminal(&self) -> bool {
        self.next_types().is_empty()
    }

    /// Every type mentioned anywhere in the expression
    pub fn all_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for edges in &self.nfa.edges {
            for (term, _) in edges {
                if let Some(term) = term.as_deref() {
                    if !out.contains(&term) {
                        out.push(term);
                    }
                }
            }
        }
        out
    }

    /// Shortest sequence of fillable types to insert before `after` so that `after`
    /// matches, and the content may end when `to_end` is set.
    pub fn fill_before<S: AsRef<str>>(
        &self,
        after: &[S],
        to_end: bool,
        fillable: &dyn Fn(&str) -> bool,
    ) -> Option<Vec<String>> {
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut work: VecDeque<(ContentMatch, Vec<String>)> = VecDeque::new();
        work.push_back((self.clone(), Vec::new()));

        while let Some((current, path)) = work.pop_front() {
            let mut key = current.states.clone();
            key.sort_unstable();
            if !seen.insert(key) {
                continue;
            }
            if let Some(end) = current.match_types(after) {
                if !to_end || end.valid_end() {
                    return Some(path);
                }
            }
            for next in current.next_types() {
                if !fillable(next) {
                    continue;
                }
                if let Some(advanced) = current.match_type(next) {
                    let mut next_path = path.clone();
                    next_path.push(next.to_string());
                    work.push_back((advanced, next_path));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(name: &str) -> Option<Vec<String>> {
        match name {
            "flow" => Some(vec!["p".to_string(), "div".to_string()]),
            "p" | "div" | "li" | "caption" | "thead" | "tbody" | "tfoot" | "text" | "td" | "th" => {
                Some(vec![name.to_string()])
            }
            _ => None,
        }
    }

    fn compile(expr: &str) -> ContentMatch {
        ContentMatch::compile(expr, &resolver).unwrap()
    }

    fn accepts(expr: &str, types: &[&str]) -> bool {
        compile(expr)
            .match_types(types)
            .map(|m| m.valid_end())
            .unwrap_or(false)
    }

    #[test]
    fn test_sequence_and_optional() {
        let expr = "caption? thead? tbody* tfoot?";
        assert!(accepts(expr, &[]));
        assert!(accepts(expr, &["caption", "tbody", "tbody"]));
        assert!(accepts(expr, &["thead", "tfoot"]));
        assert!(!accepts(expr, &["tfoot", "thead"]));
    }

    #[test]
    fn test_plus_and_groups() {
        assert!(!accepts("li+", &[]));
        assert!(accepts("li+", &["li", "li"]));
        assert!(accepts("(p | flow)+", &["div", "p"]));
        assert!(!accepts("(p | flow)+", &["li"]));
    }

    #[test]
    fn test_ranges() {
        assert!(!accepts("li{2}", &["li"]));
        assert!(accepts("li{2}", &["li", "li"]));
        assert!(!accepts("li{2}", &["li", "li", "li"]));
        assert!(accepts("li{1,}", &["li", "li", "li"]));
        assert!(accepts("li{1,2}", &["li"]));
        assert!(!accepts("li{1,2}", &["li", "li", "li"]));
    }

    #[test]
    fn test_choice_of_cells() {
        assert!(accepts("(td | th)*", &["th", "td", "td"]));
    }

    #[test]
    fn test_empty_expression() {
        let m = compile("");
        assert!(m.valid_end());
        assert!(m.match_type("p").is_none());
    }

    #[test]
    fn test_next_types_in_order() {
        assert_eq!(compile("caption? thead? tbody*").next_types(), vec!["caption", "thead", "tbody"]);
    }

    #[test]
    fn test_fill_before() {
        let m = compile("caption thead tbody+");
        let fill = m.fill_before(&["tbody"], true, &|_| true).unwrap();
        assert_eq!(fill, vec!["caption", "thead"]);

        let none = m.fill_before(&["tbody"], true, &|t| t != "thead");
        assert_eq!(none, None);

        let end = compile("p+").fill_before::<&str>(&[], true, &|_| true).unwrap();
        assert_eq!(end, vec!["p"]);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(ContentMatch::compile("p |", &resolver).is_ok());
        assert!(matches!(
            ContentMatch::compile("(p", &resolver),
            Err(ModelError::InvalidContentExpression { .. })
        ));
        assert!(matches!(
            ContentMatch::compile("unknown+", &resolver),
            Err(ModelError::InvalidContentExpression { .. })
        ));
        assert!(matches!(
            ContentMatch::compile("li{3,1}", &resolver),
            Err(ModelError::InvalidContentExpression { .. })
        ));
    }
}
