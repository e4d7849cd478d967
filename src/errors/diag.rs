// src/errors/diag.rs
//! Engine diagnostics: what went wrong during extraction, and how badly.

use thiserror::Error;

use crate::ir::Span;

/// How bad a diagnostic is. No severity aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    /// Unsupported construct; extraction continues with a partial entity.
    Warning,
    /// Consistency violation or malformed reference; extraction continues
    /// with the most defensible fallback.
    Severe,
}

/// Every condition the engine can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diag {
    #[error("unhandled builtin '{name}'")]
    UnhandledBuiltin { name: String },

    #[error("unexpected origin tag on call to '{name}'")]
    OriginMismatch { name: String },

    #[error("missing {side}")]
    MissingOperand { side: &'static str },

    #[error("extra arguments on operator call")]
    ExtraArguments,

    #[error("unexpected dispatch receiver on operator call")]
    UnexpectedDispatchReceiver,

    #[error("dispatch receiver not found")]
    MissingDispatchReceiver,

    #[error("break or continue without an enclosing loop")]
    MissingLoopTarget,

    #[error("property '{name}' has no getter")]
    PropertyWithoutGetter { name: String },

    #[error("mutable property '{name}' has no setter")]
    MutablePropertyWithoutSetter { name: String },

    #[error("immutable property '{name}' has a setter")]
    ImmutablePropertyWithSetter { name: String },

    #[error("enum constant owner '{name}' has type parameters")]
    EnumOwnerHasTypeParams { name: String },

    #[error("enum constant '{name}' is not owned by an enum")]
    EnumConstOwnerNotEnum { name: String },

    #[error("type parameters of alias '{name}' are not supported")]
    AliasTypeParams { name: String },

    #[error("expected a local routine declaration")]
    LocalRoutineExpected,

    #[error("'{name}' is not a singleton object")]
    NotAnObject { name: String },

    #[error("'{name}' is not a companion object")]
    NotACompanion { name: String },

    #[error("expected {expected} type arguments, found {found}")]
    WrongTypeArgCount { expected: usize, found: usize },

    #[error("expected {expected} arguments, found {found}")]
    WrongArgumentCount { expected: usize, found: usize },

    #[error("type argument is not an enum type")]
    EnumTypeExpected,

    #[error("intrinsic call does not produce an array type")]
    ArrayTypeExpected,

    #[error("enum type has no member '{name}'")]
    EnumMemberNotFound { name: String },

    #[error("expected a vararg argument in '{name}' call")]
    VarargExpected { name: String },

    #[error("read of value '{name}' that was never declared")]
    UnboundValue { name: String },

    #[error("statement outside of any routine")]
    NoCurrentRoutine,

    #[error("delegating constructor target is not a constructor")]
    DelegationTargetNotConstructor,
}

impl Diag {
    pub fn severity(&self) -> Severity {
        match self {
            Diag::AliasTypeParams { .. } => Severity::Warning,
            _ => Severity::Severe,
        }
    }
}

/// One recorded diagnostic, with the node location when one was at hand.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub diag: Diag,
    pub span: Option<Span>,
}

/// Collects diagnostics for one extraction run and mirrors them to tracing.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic at its own severity.
    pub fn report(&mut self, diag: Diag, span: Option<Span>) {
        let severity = diag.severity();
        match severity {
            Severity::Info => tracing::info!(%diag, ?span, "extraction note"),
            Severity::Warning => tracing::warn!(%diag, ?span, "extraction warning"),
            Severity::Severe => tracing::error!(%diag, ?span, "extraction inconsistency"),
        }
        self.entries.push(Diagnostic {
            severity,
            diag,
            span,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn severe_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Severe)
            .count()
    }

    /// True if any entry matches the predicate; test helper.
    pub fn any(&self, pred: impl Fn(&Diag) -> bool) -> bool {
        self.entries.iter().any(|d| pred(&d.diag))
    }
}
