//! Externally-defined type and member information.
//!
//! A classpath scan yields one [`ClassInfo`] per reachable type. These are
//! plain data: the analysis layer stores them in an immutable snapshot and
//! serves completion/signature queries from them without going back to the
//! front end.

use serde::{Deserialize, Serialize};

/// The kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    /// A method.
    Method,
    /// A field.
    Field,
    /// A constructor.
    Constructor,
}

/// Signature of one member of an external type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSignature {
    /// Member name.
    pub name: String,
    /// Member kind.
    pub kind: MemberKind,
    /// Rendered parameter types, empty for fields.
    pub params: Vec<String>,
    /// Return type for methods, declared type for fields.
    pub type_name: Option<String>,
    /// Whether the member is static.
    pub is_static: bool,
}

impl MemberSignature {
    /// Render as `name(params): Type` or `name: Type`.
    pub fn render(&self) -> String {
        let suffix = self
            .type_name
            .as_ref()
            .map(|t| format!(": {t}"))
            .unwrap_or_default();
        match self.kind {
            MemberKind::Field => format!("{}{}", self.name, suffix),
            MemberKind::Method | MemberKind::Constructor => {
                format!("{}({}){}", self.name, self.params.join(", "), suffix)
            }
        }
    }
}

/// An external type discovered by a classpath scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Simple name, e.g. `List`.
    pub simple_name: String,
    /// Fully qualified name, e.g. `java.util.List`.
    pub qualified_name: String,
    /// Member signatures.
    pub members: Vec<MemberSignature>,
}

impl ClassInfo {
    /// Create a class with no members; the qualified name's last segment
    /// becomes the simple name.
    pub fn new(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let simple_name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name.as_str())
            .to_string();
        Self {
            simple_name,
            qualified_name,
            members: Vec::new(),
        }
    }

    /// Append a member.
    #[must_use]
    pub fn with_member(mut self, member: MemberSignature) -> Self {
        self.members.push(member);
        self
    }
}
