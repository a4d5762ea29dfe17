//! Template compilation and evaluation.
//!
//! # Syntax
//! ```text
//! <%= expr %>                  escaped output
//! <%== expr %>                 raw output
//! <% if expr %> … <% else %> … <% end %>
//! <% unless expr %> … <% end %>
//! <% for item in expr %> … <% end %>   binds item, item_key (objects), loop_index
//! <%# comment %>
//! ```
//! Expressions are dotted paths (`artist.name`, `tracks.0`), literals
//! (`"text"`, `42`, `true`, `null`) and helper calls (`url("/artists")`).
//!
//! # Design Decisions
//! - Parsing happens once per file; a unit renders any number of times
//! - Helper calls go to the binding context passed at render time
//! - Unknown variables render as empty, unknown helpers are errors
//! - `{{yield}}` is plain text here; composition splices it later

use std::borrow::Cow;
use std::fs;
use std::io;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::CharIndices;

use serde_json::{Map, Number, Value};

use crate::template::{TemplateError, TemplateId};

/// Receiver for helper calls made from inside a template.
pub trait BindingContext {
    /// Invoke helper `name` with evaluated arguments.
    ///
    /// Returns `None` when no helper of that name exists.
    fn call_helper(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>>;
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Output {
        expr: Expr,
        escape: bool,
        line: usize,
    },
    If {
        cond: Expr,
        negate: bool,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
        line: usize,
    },
    For {
        binding: String,
        source: Expr,
        body: Vec<Node>,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Call { helper: String, args: Vec<Expr> },
}

/// A compiled template or layout file.
#[derive(Debug)]
pub struct RenderingUnit {
    path: PathBuf,
    nodes: Vec<Node>,
}

/// Read and compile the file behind `id`.
pub fn compile(id: &TemplateId) -> Result<RenderingUnit, TemplateError> {
    id.ensure_exists()?;

    let source = fs::read_to_string(id.path()).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => id.not_found(),
        _ => TemplateError::Io {
            path: id.path().to_path_buf(),
            source: e,
        },
    })?;

    let unit = RenderingUnit::parse(id.path(), &source)?;
    tracing::debug!(
        kind = %id.kind(),
        name = %id.name(),
        path = %id.path().display(),
        "Template compiled"
    );
    Ok(unit)
}

impl RenderingUnit {
    /// Compile template source. `path` is used in error messages.
    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Self, TemplateError> {
        let path = path.into();
        let nodes = parse_nodes(&path, source)?;
        Ok(Self { path, nodes })
    }

    /// The file this unit was compiled from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render with `data` in scope and `context` receiving helper calls.
    pub fn render(
        &self,
        data: &Map<String, Value>,
        context: Option<&dyn BindingContext>,
    ) -> Result<String, TemplateError> {
        let mut evaluator = Evaluator {
            path: &self.path,
            data,
            context,
            locals: Vec::new(),
            out: String::new(),
        };
        evaluator.render_nodes(&self.nodes)?;
        Ok(evaluator.out)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

enum BlockKind {
    Root,
    If { cond: Expr, negate: bool },
    For { binding: String, source: Expr },
}

struct Block {
    kind: BlockKind,
    line: usize,
    nodes: Vec<Node>,
    else_nodes: Option<Vec<Node>>,
}

impl Block {
    fn new(kind: BlockKind, line: usize) -> Self {
        Self {
            kind,
            line,
            nodes: Vec::new(),
            else_nodes: None,
        }
    }

    fn current(&mut self) -> &mut Vec<Node> {
        match &mut self.else_nodes {
            Some(nodes) => nodes,
            None => &mut self.nodes,
        }
    }

    fn into_node(self) -> Option<Node> {
        match self.kind {
            BlockKind::Root => None,
            BlockKind::If { cond, negate } => Some(Node::If {
                cond,
                negate,
                then_branch: self.nodes,
                else_branch: self.else_nodes.unwrap_or_default(),
                line: self.line,
            }),
            BlockKind::For { binding, source } => Some(Node::For {
                binding,
                source,
                body: self.nodes,
                line: self.line,
            }),
        }
    }

    fn keyword(&self) -> &'static str {
        match self.kind {
            BlockKind::Root => "root",
            BlockKind::If { negate: false, .. } => "if",
            BlockKind::If { negate: true, .. } => "unless",
            BlockKind::For { .. } => "for",
        }
    }
}

struct Parser<'a> {
    path: &'a Path,
    stack: Vec<Block>,
}

fn parse_nodes(path: &Path, source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        path,
        stack: vec![Block::new(BlockKind::Root, 1)],
    };
    let mut rest = source;
    let mut line = 1;

    while let Some(start) = rest.find("<%") {
        let text = &rest[..start];
        parser.push_text(text);
        line += text.matches('\n').count();

        let after = &rest[start + 2..];
        let end = after
            .find("%>")
            .ok_or_else(|| parser.syntax(line, "unclosed `<%` tag"))?;
        let tag = &after[..end];
        parser.tag(tag, line)?;
        line += tag.matches('\n').count();
        rest = &after[end + 2..];
    }
    parser.push_text(rest);

    if parser.stack.len() > 1 {
        let open = &parser.stack[parser.stack.len() - 1];
        return Err(parser.syntax(
            open.line,
            format!("`{}` block is never closed with `<% end %>`", open.keyword()),
        ));
    }
    let root = parser.stack.pop().map(|b| b.nodes).unwrap_or_default();
    Ok(root)
}

impl Parser<'_> {
    fn top(&mut self) -> &mut Block {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, node: Node) {
        self.top().current().push(node);
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.push(Node::Text(text.to_string()));
        }
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn expr(&self, src: &str, line: usize) -> Result<Expr, TemplateError> {
        parse_expr(src).map_err(|message| self.syntax(line, message))
    }

    fn tag(&mut self, tag: &str, line: usize) -> Result<(), TemplateError> {
        if tag.starts_with('#') {
            return Ok(());
        }
        if let Some(src) = tag.strip_prefix("==") {
            let expr = self.expr(src, line)?;
            self.push(Node::Output {
                expr,
                escape: false,
                line,
            });
            return Ok(());
        }
        if let Some(src) = tag.strip_prefix('=') {
            let expr = self.expr(src, line)?;
            self.push(Node::Output {
                expr,
                escape: true,
                line,
            });
            return Ok(());
        }

        let statement = tag.trim();
        let (keyword, rest) = statement
            .split_once(char::is_whitespace)
            .map(|(k, r)| (k, r.trim()))
            .unwrap_or((statement, ""));

        match keyword {
            "if" | "unless" => {
                let cond = self.expr(rest, line)?;
                let negate = keyword == "unless";
                self.stack
                    .push(Block::new(BlockKind::If { cond, negate }, line));
            }
            "for" => {
                let (binding, source) = rest
                    .split_once(" in ")
                    .map(|(b, s)| (b.trim(), s))
                    .ok_or_else(|| self.syntax(line, "expected `for <name> in <expr>`"))?;
                if !is_identifier(binding) {
                    return Err(self.syntax(line, format!("invalid loop variable `{}`", binding)));
                }
                let source = self.expr(source, line)?;
                self.stack.push(Block::new(
                    BlockKind::For {
                        binding: binding.to_string(),
                        source,
                    },
                    line,
                ));
            }
            "else" => {
                if !rest.is_empty() {
                    return Err(self.syntax(line, "`else` takes no expression"));
                }
                let top = self.top();
                let in_if = matches!(top.kind, BlockKind::If { .. });
                let has_else = top.else_nodes.is_some();
                if !in_if {
                    return Err(self.syntax(line, "`else` outside of `if`"));
                }
                if has_else {
                    return Err(self.syntax(line, "duplicate `else`"));
                }
                self.top().else_nodes = Some(Vec::new());
            }
            "end" => {
                if !rest.is_empty() {
                    return Err(self.syntax(line, "`end` takes no expression"));
                }
                if self.stack.len() == 1 {
                    return Err(self.syntax(line, "`end` without an open block"));
                }
                if let Some(node) = self.stack.pop().and_then(Block::into_node) {
                    self.push(node);
                }
            }
            "" => return Err(self.syntax(line, "empty tag")),
            other => return Err(self.syntax(line, format!("unknown statement `{}`", other))),
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_expr(src: &str) -> Result<Expr, String> {
    let mut parser = ExprParser {
        src,
        chars: src.char_indices().peekable(),
    };
    let expr = parser.expr()?;
    parser.skip_ws();
    if let Some((_, c)) = parser.chars.peek() {
        return Err(format!("unexpected `{}` in expression `{}`", c, src.trim()));
    }
    Ok(expr)
}

struct ExprParser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl ExprParser<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        word
    }

    fn expr(&mut self) -> Result<Expr, String> {
        self.skip_ws();
        match self.peek() {
            None => Err(format!("expected an expression in `{}`", self.src.trim())),
            Some('"') | Some('\'') => self.string(),
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.path_or_call(),
            Some(c) => Err(format!("unexpected `{}` in expression `{}`", c, self.src.trim())),
        }
    }

    fn path_or_call(&mut self) -> Result<Expr, String> {
        let head = self.word();

        if self.peek() == Some('(') {
            self.chars.next();
            return Ok(Expr::Call {
                helper: head,
                args: self.args()?,
            });
        }

        match head.as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "null" => return Ok(Expr::Literal(Value::Null)),
            _ => {}
        }

        let mut segments = vec![head];
        while self.peek() == Some('.') {
            self.chars.next();
            let segment = self.word();
            if segment.is_empty() {
                return Err(format!("empty path segment in `{}`", self.src.trim()));
            }
            segments.push(segment);
        }
        Ok(Expr::Path(segments))
    }

    fn args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek() == Some(')') {
            self.chars.next();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            self.skip_ws();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ')')) => return Ok(args),
                _ => return Err(format!("unterminated helper call in `{}`", self.src.trim())),
            }
        }
    }

    fn string(&mut self) -> Result<Expr, String> {
        let quote = self.chars.next().map(|(_, c)| c);
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return Err(format!("unterminated string in `{}`", self.src.trim())),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c)) => value.push(c),
                    None => {
                        return Err(format!("unterminated string in `{}`", self.src.trim()))
                    }
                },
                Some((_, c)) if Some(c) == quote => break,
                Some((_, c)) => value.push(c),
            }
        }
        Ok(Expr::Literal(Value::String(value)))
    }

    fn number(&mut self) -> Result<Expr, String> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.chars.next();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        if let Ok(n) = text.parse::<i64>() {
            return Ok(Expr::Literal(Value::from(n)));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| Expr::Literal(Value::Number(n)))
            .ok_or_else(|| format!("invalid number `{}`", text))
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

struct Evaluator<'a> {
    path: &'a Path,
    data: &'a Map<String, Value>,
    context: Option<&'a dyn BindingContext>,
    locals: Vec<(String, Value)>,
    out: String,
}

impl Evaluator<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Render {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn render_nodes(&mut self, nodes: &[Node]) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Output { expr, escape, line } => {
                    let value = self.eval(expr, *line)?;
                    let text = display(&value);
                    if *escape {
                        escape_html(&text, &mut self.out);
                    } else {
                        self.out.push_str(&text);
                    }
                }
                Node::If {
                    cond,
                    negate,
                    then_branch,
                    else_branch,
                    line,
                } => {
                    let value = self.eval(cond, *line)?;
                    if truthy(&value) != *negate {
                        self.render_nodes(then_branch)?;
                    } else {
                        self.render_nodes(else_branch)?;
                    }
                }
                Node::For {
                    binding,
                    source,
                    body,
                    line,
                } => {
                    let value = self.eval(source, *line)?;
                    self.render_loop(binding, value, body, *line)?;
                }
            }
        }
        Ok(())
    }

    fn render_loop(
        &mut self,
        binding: &str,
        value: Value,
        body: &[Node],
        line: usize,
    ) -> Result<(), TemplateError> {
        let mark = self.locals.len();
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    self.locals.push((binding.to_string(), item));
                    self.locals.push(("loop_index".to_string(), Value::from(index)));
                    self.render_nodes(body)?;
                    self.locals.truncate(mark);
                }
            }
            Value::Object(map) => {
                for (index, (key, item)) in map.into_iter().enumerate() {
                    self.locals.push((binding.to_string(), item));
                    self.locals.push((format!("{}_key", binding), Value::String(key)));
                    self.locals.push(("loop_index".to_string(), Value::from(index)));
                    self.render_nodes(body)?;
                    self.locals.truncate(mark);
                }
            }
            other => {
                return Err(self.error(
                    line,
                    format!("cannot iterate over {} value", type_name(&other)),
                ))
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, line: usize) -> Result<Value, TemplateError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(segments) => Ok(self.lookup(segments)),
            Expr::Call { helper, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, line))
                    .collect::<Result<Vec<_>, _>>()?;
                let context = self.context.ok_or_else(|| {
                    self.error(
                        line,
                        format!("helper `{}` called without a binding context", helper),
                    )
                })?;
                match context.call_helper(helper, &args) {
                    Some(Ok(value)) => Ok(value),
                    Some(Err(message)) => Err(self.error(
                        line,
                        format!("helper `{}` failed: {}", helper, message),
                    )),
                    None => Err(self.error(line, format!("unknown helper `{}`", helper))),
                }
            }
        }
    }

    fn lookup(&self, segments: &[String]) -> Value {
        let head = &segments[0];
        let root = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| name == head)
            .map(|(_, value)| value)
            .or_else(|| self.data.get(head));

        let mut current = match root {
            Some(value) => value,
            None => {
                tracing::trace!(path = %self.path.display(), variable = %head, "Undefined variable");
                return Value::Null;
            }
        };
        for segment in &segments[1..] {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Value::Null,
            }
        }
        current.clone()
    }
}

fn display(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
