//! The stable diagnostic catalogue (spec §6.2) plus the per-session result
//! aggregate (spec §7: "components return a boolean success; failures are
//! appended to a per-session result aggregate").

use crate::span::SourceLocation;
use std::fmt;

/// Failure taxonomy (spec §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Parse,
    Resolution,
    Type,
    Semantic,
    Directive,
    Internal,
}

/// A stable diagnostic code from the catalogue in spec §6.2, plus the
/// generic placeholders (`X000`) used by handlers that have no dedicated
/// code yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    /// P004 unresolvable identifier
    UnresolvedIdentifier,
    /// P018 qualified name crosses non-namespace
    QualifiedNameCrossesNonNamespace,
    /// P019 cannot infer type
    CannotInferType,
    /// P027 target/source arity mismatch in multi-assignment
    ArityMismatch,
    /// P028 assignment to constant
    AssignToConstant,
    /// P029 constant-required kind declared with `:=`
    ConstantRequiresDoubleColon,
    /// P041 bad numeric literal
    BadNumericLiteral,
    /// P044 directive execution failed
    DirectiveFailed,
    /// P052 unknown identifier in binary operator
    UnknownIdentifierInBinaryOperator,
    /// P081 break/continue with no enclosing loop
    FlowControlOutsideLoop,
    /// C021 module file not found / failed to compile
    ModuleNotFound,
    /// C024 invalid statement
    InvalidStatement,
    /// C051 type mismatch
    TypeMismatch,
    /// C073 illegal cast
    IllegalCast,
    /// X000 generic error placeholder
    Generic,
}

impl Code {
    pub const fn id(self) -> &'static str {
        match self {
            Code::UnresolvedIdentifier => "P004",
            Code::QualifiedNameCrossesNonNamespace => "P018",
            Code::CannotInferType => "P019",
            Code::ArityMismatch => "P027",
            Code::AssignToConstant => "P028",
            Code::ConstantRequiresDoubleColon => "P029",
            Code::BadNumericLiteral => "P041",
            Code::DirectiveFailed => "P044",
            Code::UnknownIdentifierInBinaryOperator => "P052",
            Code::FlowControlOutsideLoop => "P081",
            Code::ModuleNotFound => "C021",
            Code::InvalidStatement => "C024",
            Code::TypeMismatch => "C051",
            Code::IllegalCast => "C073",
            Code::Generic => "X000",
        }
    }

    pub const fn category(self) -> Category {
        match self {
            Code::UnresolvedIdentifier
            | Code::QualifiedNameCrossesNonNamespace
            | Code::UnknownIdentifierInBinaryOperator => Category::Resolution,
            Code::CannotInferType | Code::TypeMismatch | Code::IllegalCast => Category::Type,
            Code::ArityMismatch
            | Code::AssignToConstant
            | Code::ConstantRequiresDoubleColon
            | Code::BadNumericLiteral
            | Code::FlowControlOutsideLoop
            | Code::InvalidStatement => Category::Semantic,
            Code::DirectiveFailed => Category::Directive,
            Code::ModuleNotFound => Category::Parse,
            Code::Generic => Category::Internal,
        }
    }
}

/// A single compiler diagnostic: a code, a rendered message, and an
/// optional source location (synthetic elements have none).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub code: Code,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(code: Code, message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self { code, message: message.into(), location }
    }

    pub fn category(&self) -> Category {
        self.code.category()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.id(), self.message)?;
        if let Some(loc) = self.location {
            write!(f, " ({}:{}..{})", loc.module, loc.span.start, loc.span.end)?;
        }
        Ok(())
    }
}

/// The per-session diagnostic aggregate (spec §7). Every phase appends
/// here instead of panicking or short-circuiting with `?`; the session
/// checks `is_failed()` at phase boundaries (spec §4.9, §7).
#[derive(Default, Debug, Clone)]
pub struct ResultMessage {
    diagnostics: Vec<Diagnostic>,
}

impl ResultMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, code: Code, message: impl Into<String>, location: Option<SourceLocation>) {
        self.diagnostics.push(Diagnostic::new(code, message, location));
    }

    pub fn is_failed(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn extend(&mut self, other: ResultMessage) {
        self.diagnostics.extend(other.diagnostics);
    }
}
