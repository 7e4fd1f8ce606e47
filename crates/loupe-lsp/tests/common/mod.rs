//! Shared test fixtures: a tiny line-oriented front end and a
//! programmable dependency resolver.
//!
//! Fixture syntax, one construct per line:
//!
//! ```text
//! import pkg.Type            import declaration
//! class Name ... end         class container
//! method name(a: T): R ...   method container (closed by `end`)
//! field name: T              field declaration
//! var name: T                variable declaration
//! use name                   reference
//! call name(a, b)            call with reference arguments
//! ?                          parse error diagnostic on this line
//! ```
//!
//! Any text containing `!!` fails compilation fatally. Positions are
//! 1-based, as the front-end contract requires; the adapter under test
//! shifts them to 0-based.

#![allow(dead_code)]

use loupe_core::{
    ClassInfo, CompiledUnit, DependencyResolver, Diagnostic, FrontEnd, FrontEndError, MemberKind,
    MemberSignature, NodeKind, ParamSig, Position, Range, ResolveError, SyntaxNode,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Front end over the fixture syntax.
pub struct FixtureFrontEnd {
    classes: Vec<ClassInfo>,
    scan_delay: Mutex<Duration>,
    fail_scans: bool,
    scans: AtomicU64,
}

impl FixtureFrontEnd {
    pub fn new() -> Self {
        Self::with_classes(Vec::new())
    }

    pub fn with_classes(classes: Vec<ClassInfo>) -> Self {
        Self {
            classes,
            scan_delay: Mutex::new(Duration::ZERO),
            fail_scans: false,
            scans: AtomicU64::new(0),
        }
    }

    pub fn failing_scans(mut self) -> Self {
        self.fail_scans = true;
        self
    }

    pub fn set_scan_delay(&self, delay: Duration) {
        *self.scan_delay.lock().unwrap() = delay;
    }

    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::SeqCst)
    }
}

impl FrontEnd for FixtureFrontEnd {
    fn compile_unit(
        &self,
        uri: &str,
        text: &str,
        _classpath: &[PathBuf],
    ) -> Result<CompiledUnit, FrontEndError> {
        if text.contains("!!") {
            return Err(FrontEndError::Compile {
                uri: uri.to_string(),
                message: "fatal parse failure".to_string(),
            });
        }
        Ok(parse_fixture(text))
    }

    fn scan_classpath(&self, _entries: &[PathBuf]) -> Result<Vec<ClassInfo>, FrontEndError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let delay = *self.scan_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if self.fail_scans {
            return Err(FrontEndError::Scan {
                message: "fixture scan failure".to_string(),
            });
        }
        Ok(self.classes.clone())
    }
}

/// Dependency resolver with a programmable result and delay.
pub struct FixtureResolver {
    result: Mutex<Result<Vec<PathBuf>, String>>,
    delay: Mutex<Duration>,
    calls: AtomicU64,
}

impl FixtureResolver {
    pub fn returning(entries: Vec<PathBuf>) -> Self {
        Self {
            result: Mutex::new(Ok(entries)),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Mutex::new(Err(message.to_string())),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicU64::new(0),
        }
    }

    pub fn set_result(&self, entries: Vec<PathBuf>) {
        *self.result.lock().unwrap() = Ok(entries);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DependencyResolver for FixtureResolver {
    fn discover(&self, project_root: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| ResolveError::Discovery {
                root: project_root.to_path_buf(),
                message,
            })
    }
}

/// A classpath type for completion/signature tests: `pkg.Type` with a
/// couple of members.
pub fn pkg_type_class() -> ClassInfo {
    ClassInfo::new("pkg.Type")
        .with_member(MemberSignature {
            name: "size".to_string(),
            kind: MemberKind::Method,
            params: vec![],
            type_name: Some("Int".to_string()),
            is_static: false,
        })
        .with_member(MemberSignature {
            name: "of".to_string(),
            kind: MemberKind::Method,
            params: vec!["Int".to_string()],
            type_name: Some("pkg.Type".to_string()),
            is_static: true,
        })
        .with_member(MemberSignature {
            name: "MAX".to_string(),
            kind: MemberKind::Field,
            params: vec![],
            type_name: Some("Int".to_string()),
            is_static: true,
        })
}

fn span(line: u32, start_col: u32, end_col: u32) -> Range {
    Range::new(Position::new(line, start_col), Position::new(line, end_col))
}

/// Parse fixture text into a 1-based tree.
pub fn parse_fixture(text: &str) -> CompiledUnit {
    let lines: Vec<&str> = text.lines().collect();
    let total_lines = lines.len().max(1) as u32;
    let last_len = lines.last().map_or(0, |l| l.len()) as u32;

    let root = SyntaxNode::new(
        NodeKind::Unit,
        Range::new(Position::new(1, 1), Position::new(total_lines, last_len + 1)),
    );
    let mut stack: Vec<SyntaxNode> = vec![root];
    let mut diagnostics = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let line_no = (i + 1) as u32;
        let line = raw.trim_start();
        let indent = raw.len() - line.len();
        let line_start = (indent + 1) as u32;
        let line_end = raw.len() as u32 + 1;

        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("import ") {
            let qualified = rest.trim();
            let simple = qualified.rsplit('.').next().unwrap_or(qualified);
            push_leaf(
                &mut stack,
                SyntaxNode::new(NodeKind::Import, span(line_no, line_start, line_end))
                    .with_name(simple)
                    .with_qualified_name(qualified),
            );
        } else if let Some(rest) = line.strip_prefix("class ") {
            stack.push(
                SyntaxNode::new(NodeKind::Class, span(line_no, line_start, line_end))
                    .with_name(rest.trim()),
            );
        } else if let Some(rest) = line.strip_prefix("method ") {
            if let Some(node) = parse_method(rest, indent + 7, line_no, line_start, line_end) {
                stack.push(node);
            }
        } else if line == "end" {
            if stack.len() > 1 {
                let mut node = stack.pop().unwrap();
                node.range.end = Position::new(line_no, line_end);
                push_leaf(&mut stack, node);
            }
        } else if let Some(rest) = line.strip_prefix("field ") {
            push_leaf(
                &mut stack,
                typed_decl(NodeKind::Field, rest, line_no, line_start, line_end),
            );
        } else if let Some(rest) = line.strip_prefix("var ") {
            push_leaf(
                &mut stack,
                typed_decl(NodeKind::Variable, rest, line_no, line_start, line_end),
            );
        } else if let Some(rest) = line.strip_prefix("use ") {
            let leading = rest.len() - rest.trim_start().len();
            let name = rest.trim();
            let col = (indent + 4 + leading + 1) as u32;
            push_leaf(
                &mut stack,
                SyntaxNode::new(NodeKind::Reference, span(line_no, col, col + name.len() as u32))
                    .with_name(name),
            );
        } else if let Some(rest) = line.strip_prefix("call ") {
            if let Some(node) = parse_call(rest, indent + 5, line_no, line_end) {
                push_leaf(&mut stack, node);
            }
        } else if line.starts_with('?') {
            diagnostics.push(Diagnostic::error(
                span(line_no, line_start, line_end),
                "syntax error",
            ));
        }
    }

    while stack.len() > 1 {
        let node = stack.pop().unwrap();
        push_leaf(&mut stack, node);
    }

    CompiledUnit {
        root: stack.pop().unwrap(),
        diagnostics,
    }
}

fn push_leaf(stack: &mut [SyntaxNode], node: SyntaxNode) {
    stack.last_mut().unwrap().children.push(node);
}

/// `name: Type` or bare `name` after a `var`/`field` keyword.
fn typed_decl(
    kind: NodeKind,
    rest: &str,
    line_no: u32,
    line_start: u32,
    line_end: u32,
) -> SyntaxNode {
    let mut node = SyntaxNode::new(kind, span(line_no, line_start, line_end));
    match rest.split_once(':') {
        Some((name, ty)) => {
            node = node.with_name(name.trim()).with_type_name(ty.trim());
        }
        None => {
            node = node.with_name(rest.trim());
        }
    }
    node
}

/// `name(a: T, b): Ret` after the `method` keyword. `rest_offset` is the
/// 0-based column where `rest` begins in the raw line.
fn parse_method(
    rest: &str,
    rest_offset: usize,
    line_no: u32,
    line_start: u32,
    line_end: u32,
) -> Option<SyntaxNode> {
    let paren = rest.find('(')?;
    let close = rest.find(')')?;
    let name = rest[..paren].trim();
    let params_str = &rest[paren + 1..close];
    let ret = rest[close + 1..].trim().strip_prefix(':').map(str::trim);

    let mut params = Vec::new();
    let mut children = Vec::new();
    let mut offset = paren + 1;
    for piece in params_str.split(',') {
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let leading = piece.len() - piece.trim_start().len();
            let (pname, ptype) = match trimmed.split_once(':') {
                Some((n, t)) => (n.trim(), Some(t.trim())),
                None => (trimmed, None),
            };
            params.push(ParamSig {
                name: pname.to_string(),
                type_name: ptype.map(str::to_string),
            });
            let col = (rest_offset + offset + leading + 1) as u32;
            let mut param =
                SyntaxNode::new(NodeKind::Parameter, span(line_no, col, col + pname.len() as u32))
                    .with_name(pname);
            if let Some(ty) = ptype {
                param = param.with_type_name(ty);
            }
            children.push(param);
        }
        offset += piece.len() + 1;
    }

    let mut node = SyntaxNode::new(NodeKind::Method, span(line_no, line_start, line_end))
        .with_name(name)
        .with_params(params);
    if let Some(ret) = ret {
        node = node.with_type_name(ret);
    }
    node.children = children;
    Some(node)
}

/// `name(a, b)` after the `call` keyword, with reference children for
/// bare identifier arguments.
fn parse_call(rest: &str, rest_offset: usize, line_no: u32, line_end: u32) -> Option<SyntaxNode> {
    let paren = rest.find('(')?;
    let close = rest.rfind(')')?;
    let name = rest[..paren].trim();
    let args = &rest[paren + 1..close];

    let mut node = SyntaxNode::new(
        NodeKind::Call,
        span(line_no, rest_offset as u32 + 1, line_end),
    )
    .with_name(name);

    let mut offset = paren + 1;
    for piece in args.split(',') {
        let trimmed = piece.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_alphanumeric() || c == '_') {
            let leading = piece.len() - piece.trim_start().len();
            let col = (rest_offset + offset + leading + 1) as u32;
            node.children.push(
                SyntaxNode::new(
                    NodeKind::Reference,
                    span(line_no, col, col + trimmed.len() as u32),
                )
                .with_name(trimmed),
            );
        }
        offset += piece.len() + 1;
    }

    Some(node)
}
