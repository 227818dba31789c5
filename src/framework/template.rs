//! Miniature template and binding-expression language.
//!
//! Covers what shallow test templates actually use: text, `{{interpolation}}`
//! (with pipes), elements with plain attributes, `[prop]="expr"` bindings,
//! `(event)="expr"` listeners and the `*dir="expr"` structural shorthand.

use crate::error::{Result, ShallowError};
use crate::framework::registry::{TypeMeta, TypeRef};
use crate::framework::value::{Obj, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Num(f64),
    Bool(bool),
    /// `a.b.c`; the first segment may be `$event` inside listeners.
    Path(Vec<String>),
    /// `a.b(args)`
    Call { path: Vec<String>, args: Vec<Expr> },
    /// `input | name:arg1:arg2`
    Pipe {
        input: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Literal(String),
    Interpolation(Expr),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: String,
    /// Plain attributes as written.
    pub attrs: Vec<(String, String)>,
    /// `[name]="expr"` property bindings.
    pub inputs: Vec<(String, Expr)>,
    /// `(name)="expr"` event listeners.
    pub outputs: Vec<(String, Expr)>,
    /// `*name="expr"` structural shorthand (at most one per element).
    pub structural: Option<(String, Option<Expr>)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Text(Vec<TextPart>),
    Element(ElementNode),
}

/// Parses a template into its node list.
pub fn parse_template(source: &str) -> Result<Vec<Node>> {
    let chars: Vec<char> = source.chars().collect();
    let mut parser = TemplateParser { chars, pos: 0 };
    let nodes = parser.parse_children(None)?;
    Ok(nodes)
}

struct TemplateParser {
    chars: Vec<char>,
    pos: usize,
}

impl TemplateParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_children(&mut self, closing_tag: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    if let Some(tag) = closing_tag {
                        return Err(ShallowError::TemplateParse(format!(
                            "unexpected end of template, expected </{tag}>"
                        )));
                    }
                    flush_text(&mut text, &mut nodes)?;
                    return Ok(nodes);
                }
                Some('<') if self.peek_at(1) == Some('/') => {
                    flush_text(&mut text, &mut nodes)?;
                    let tag = self.parse_closing_tag()?;
                    match closing_tag {
                        Some(expected) if expected == tag => return Ok(nodes),
                        _ => {
                            return Err(ShallowError::TemplateParse(format!(
                                "unexpected closing tag </{tag}>"
                            )))
                        }
                    }
                }
                Some('<') => {
                    flush_text(&mut text, &mut nodes)?;
                    let element = self.parse_element()?;
                    nodes.push(Node::Element(element));
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_closing_tag(&mut self) -> Result<String> {
        self.pos += 2; // "</"
        let tag = self.parse_name();
        self.skip_whitespace();
        match self.bump() {
            Some('>') => Ok(tag),
            _ => Err(ShallowError::TemplateParse(format!(
                "malformed closing tag </{tag}"
            ))),
        }
    }

    fn parse_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn parse_element(&mut self) -> Result<ElementNode> {
        self.pos += 1; // '<'
        let tag = self.parse_name();
        if tag.is_empty() {
            return Err(ShallowError::TemplateParse(
                "expected element name after '<'".to_string(),
            ));
        }
        let mut element = ElementNode {
            tag,
            attrs: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            structural: None,
            children: Vec::new(),
        };
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    element.children = self.parse_children(Some(&element.tag.clone()))?;
                    return Ok(element);
                }
                Some('/') if self.peek_at(1) == Some('>') => {
                    self.pos += 2;
                    return Ok(element);
                }
                Some(_) => self.parse_attribute(&mut element)?,
                None => {
                    return Err(ShallowError::TemplateParse(format!(
                        "unterminated element <{}>",
                        element.tag
                    )))
                }
            }
        }
    }

    fn parse_attribute(&mut self, element: &mut ElementNode) -> Result<()> {
        enum Kind {
            Plain,
            Input,
            Output,
            Structural,
        }
        let kind = match self.peek() {
            Some('[') => {
                self.pos += 1;
                Kind::Input
            }
            Some('(') => {
                self.pos += 1;
                Kind::Output
            }
            Some('*') => {
                self.pos += 1;
                Kind::Structural
            }
            _ => Kind::Plain,
        };
        let name = self.parse_name();
        if name.is_empty() {
            return Err(ShallowError::TemplateParse(format!(
                "malformed attribute on <{}>",
                element.tag
            )));
        }
        match kind {
            Kind::Input => self.expect(']')?,
            Kind::Output => self.expect(')')?,
            _ => {}
        }
        let raw_value = if self.peek() == Some('=') {
            self.pos += 1;
            Some(self.parse_quoted()?)
        } else {
            None
        };
        match kind {
            Kind::Plain => element
                .attrs
                .push((name, raw_value.unwrap_or_default())),
            Kind::Input => {
                let raw = raw_value.ok_or_else(|| {
                    ShallowError::TemplateParse(format!("binding [{name}] has no value"))
                })?;
                element.inputs.push((name, parse_expression(&raw)?));
            }
            Kind::Output => {
                let raw = raw_value.ok_or_else(|| {
                    ShallowError::TemplateParse(format!("listener ({name}) has no value"))
                })?;
                element.outputs.push((name, parse_expression(&raw)?));
            }
            Kind::Structural => {
                if element.structural.is_some() {
                    return Err(ShallowError::TemplateParse(format!(
                        "<{}> has more than one structural directive",
                        element.tag
                    )));
                }
                let expr = match raw_value {
                    Some(raw) if !raw.trim().is_empty() => Some(parse_expression(&raw)?),
                    _ => None,
                };
                element.structural = Some((name, expr));
            }
        }
        Ok(())
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            other => Err(ShallowError::TemplateParse(format!(
                "expected '{expected}', found {other:?}"
            ))),
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            other => {
                return Err(ShallowError::TemplateParse(format!(
                    "expected quoted attribute value, found {other:?}"
                )))
            }
        };
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => {
                    return Err(ShallowError::TemplateParse(
                        "unterminated attribute value".to_string(),
                    ))
                }
            }
        }
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) -> Result<()> {
    if text.trim().is_empty() {
        text.clear();
        return Ok(());
    }
    let parts = parse_text_parts(text)?;
    nodes.push(Node::Text(parts));
    text.clear();
    Ok(())
}

/// Splits raw text into literal runs and `{{ ... }}` interpolations.
pub fn parse_text_parts(text: &str) -> Result<Vec<TextPart>> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let end = rest[start..].find("}}").map(|e| start + e).ok_or_else(|| {
            ShallowError::TemplateParse("unterminated interpolation".to_string())
        })?;
        if start > 0 {
            parts.push(TextPart::Literal(rest[..start].to_string()));
        }
        let expr_src = &rest[start + 2..end];
        parts.push(TextPart::Interpolation(parse_expression(expr_src)?));
        rest = &rest[end + 2..];
    }
    if !rest.is_empty() {
        parts.push(TextPart::Literal(rest.to_string()));
    }
    Ok(parts)
}

// --- expression parsing ---

/// Parses a binding expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let mut parser = ExprParser {
        chars: source.chars().collect(),
        pos: 0,
    };
    let expr = parser.parse_pipe()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(ShallowError::ExpressionParse(format!(
            "unexpected trailing input in '{source}'"
        )));
    }
    Ok(expr)
}

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_pipe(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                return Ok(expr);
            }
            self.pos += 1;
            self.skip_whitespace();
            let name = self.parse_ident()?;
            let mut args = Vec::new();
            loop {
                self.skip_whitespace();
                if self.peek() == Some(':') {
                    self.pos += 1;
                    self.skip_whitespace();
                    args.push(self.parse_primary()?);
                } else {
                    break;
                }
            }
            expr = Expr::Pipe {
                input: Box::new(expr),
                name,
                args,
            };
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        match self.peek() {
            Some('\'') | Some('"') => self.parse_string(),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => self.parse_path(),
            other => Err(ShallowError::ExpressionParse(format!(
                "unexpected character {other:?}"
            ))),
        }
    }

    fn parse_string(&mut self) -> Result<Expr> {
        let quote = self.chars[self.pos];
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(Expr::Str(value));
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
                None => {
                    return Err(ShallowError::ExpressionParse(
                        "unterminated string literal".to_string(),
                    ))
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expr> {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            text.push(self.chars[self.pos]);
            self.pos += 1;
        }
        text.parse::<f64>()
            .map(Expr::Num)
            .map_err(|_| ShallowError::ExpressionParse(format!("bad number '{text}'")))
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(ShallowError::ExpressionParse("expected identifier".to_string()));
        }
        Ok(name)
    }

    fn parse_path(&mut self) -> Result<Expr> {
        let mut path = vec![self.parse_ident()?];
        if path[0] == "true" {
            return Ok(Expr::Bool(true));
        }
        if path[0] == "false" {
            return Ok(Expr::Bool(false));
        }
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    path.push(self.parse_ident()?);
                }
                Some('(') => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    self.skip_whitespace();
                    if self.peek() != Some(')') {
                        loop {
                            args.push(self.parse_pipe()?);
                            self.skip_whitespace();
                            match self.peek() {
                                Some(',') => {
                                    self.pos += 1;
                                }
                                Some(')') => break,
                                other => {
                                    return Err(ShallowError::ExpressionParse(format!(
                                        "expected ',' or ')' in call, found {other:?}"
                                    )))
                                }
                            }
                        }
                    }
                    self.pos += 1; // ')'
                    return Ok(Expr::Call { path, args });
                }
                _ => return Ok(Expr::Path(path)),
            }
        }
    }
}

// --- expression evaluation ---

/// Pipe lookup used during evaluation: name -> pipe definition.
pub trait PipeLookup {
    fn pipe_by_name(&self, name: &str) -> Option<TypeRef>;
}

/// A lookup with no pipes (used for container bindings).
pub struct NoPipes;

impl PipeLookup for NoPipes {
    fn pipe_by_name(&self, _name: &str) -> Option<TypeRef> {
        None
    }
}

/// Evaluates `expr` against a component instance record. Missing properties
/// and non-callable call targets evaluate to `Undefined`, matching the loose
/// semantics of the host framework's template language.
pub fn evaluate(
    expr: &Expr,
    ctx: &Obj,
    event: Option<&Value>,
    pipes: &dyn PipeLookup,
) -> Result<Value> {
    match expr {
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Num(n) => Ok(Value::Num(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Path(path) => Ok(resolve_path(path, ctx, event)),
        Expr::Call { path, args } => {
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(evaluate(arg, ctx, event, pipes)?);
            }
            let (head, last) = path.split_at(path.len() - 1);
            let receiver = if head.is_empty() {
                Value::Obj(ctx.clone())
            } else {
                resolve_path(head, ctx, event)
            };
            match receiver {
                Value::Obj(obj) => match obj.get(&last[0]) {
                    Some(Value::Func(f)) => Ok(f.call(&arg_values)),
                    _ => Ok(Value::Undefined),
                },
                Value::Emitter(e) if last[0] == "emit" => {
                    e.emit(arg_values.into_iter().next().unwrap_or(Value::Undefined));
                    Ok(Value::Undefined)
                }
                _ => Ok(Value::Undefined),
            }
        }
        Expr::Pipe { input, name, args } => {
            let input_value = evaluate(input, ctx, event, pipes)?;
            let mut arg_values = vec![input_value];
            for arg in args {
                arg_values.push(evaluate(arg, ctx, event, pipes)?);
            }
            match pipes.pipe_by_name(name) {
                Some(pipe) => match pipe.meta() {
                    TypeMeta::Pipe(meta) => match &meta.transform {
                        Some(transform) => Ok(transform(&arg_values)),
                        None => Ok(Value::Undefined),
                    },
                    _ => Ok(Value::Undefined),
                },
                None => Err(ShallowError::TemplateParse(format!(
                    "no pipe named '{name}' is declared"
                ))),
            }
        }
    }
}

fn resolve_path(path: &[String], ctx: &Obj, event: Option<&Value>) -> Value {
    let mut current = if path[0] == "$event" {
        event.cloned().unwrap_or(Value::Undefined)
    } else {
        ctx.get(&path[0]).unwrap_or(Value::Undefined)
    };
    for segment in &path[1..] {
        current = match current {
            Value::Obj(obj) => obj.get(segment).unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        };
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interpolation_with_call() {
        let parts = parse_text_parts("{{service.color()}}").unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(
            &parts[0],
            TextPart::Interpolation(Expr::Call { path, args })
                if path == &vec!["service".to_string(), "color".to_string()] && args.is_empty()
        ));
    }

    #[test]
    fn parses_structural_shorthand() {
        let nodes = parse_template("<h1 *dir=\"'first'\">Hello</h1>").unwrap();
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::Element(el) => {
                assert_eq!(el.tag, "h1");
                let (name, expr) = el.structural.as_ref().unwrap();
                assert_eq!(name, "dir");
                assert_eq!(expr.as_ref().unwrap(), &Expr::Str("first".to_string()));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_bindings_and_listeners() {
        let nodes = parse_template("<some-tag [value]=\"count\" (changed)=\"onChanged($event)\"></some-tag>")
            .unwrap();
        match &nodes[0] {
            Node::Element(el) => {
                assert_eq!(el.inputs.len(), 1);
                assert_eq!(el.inputs[0].0, "value");
                assert_eq!(el.outputs.len(), 1);
                assert_eq!(el.outputs[0].0, "changed");
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn evaluates_paths_against_records() {
        let ctx = Obj::new();
        let nested = Obj::new();
        nested.set("b", Value::num(7.0));
        ctx.set("a", Value::Obj(nested));
        let expr = parse_expression("a.b").unwrap();
        let result = evaluate(&expr, &ctx, None, &NoPipes).unwrap();
        assert_eq!(result, Value::Num(7.0));
    }
}
