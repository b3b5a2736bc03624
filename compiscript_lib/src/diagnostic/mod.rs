pub mod builder;

use std::{
    collections::LinkedList,
    fmt::{Debug, Display},
};

pub use builder::DiagnosticBuilder;

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    start: usize,
    length: usize,
}

impl From<std::ops::Range<usize>> for Span {
    fn from(value: std::ops::Range<usize>) -> Self {
        Self {
            start: value.start,
            length: value.len(),
        }
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(val: Span) -> Self {
        val.start..val.excl_end()
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.excl_end())
    }
}

impl Span {
    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.excl_end().max(other.excl_end());
        (start..end).into()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn excl_end(&self) -> usize {
        self.start + self.length
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

// WARNING: Don't change the order of these (error codes will change)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Syntax = 0,
    DuplicateDeclaration,
    UndeclaredIdentifier,
    UninitializedRead,
    TypeMismatch,
    ArityMismatch,
    BadCondition,
    BreakContinueOutsideLoop,
    ReturnOutsideFunction,
    ReturnTypeMismatch,
    MissingReturn,
    BadPropertyAccess,
    BadMethodCall,
    BadInheritance,
    ThisOutsideClass,
    AssignToImmutable,
    BadArrayLiteral,
    BadIndex,
    OverrideSignatureMismatch,
}

impl Code {
    fn as_code(&self) -> u32 {
        *self as u32
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:0>4x}", self.as_code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: Code,
    message: String,
    main_span: (Span, Option<String>),
    additional_spans: Vec<(Span, Option<String>)>,
}

impl Diagnostic {
    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> &String {
        &self.message
    }

    pub fn main_span(&self) -> &Span {
        &self.main_span.0
    }

    pub fn main_span_message(&self) -> Option<&String> {
        self.main_span.1.as_ref()
    }

    pub fn additional_spans(&self) -> impl Iterator<Item = (&Span, Option<&String>)> {
        self.additional_spans.iter().map(|(s, m)| (s, m.as_ref()))
    }

    pub fn additional_spans_len(&self) -> usize {
        self.additional_spans.len()
    }
}

/// Specifies the possible kinds of diagnostics.
///
/// Every diagnostic fails the compilation; the kind only records whether the
/// pass that produced it could keep a recovered value to continue checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// For recoverable diagnostics: the pass continued with a best-effort value.
    Rec,
    /// For non-recoverable diagnostics: no value could be produced.
    Err,
}

/// A result combining a value with aggregated diagnostics.
///
/// Can be in one of three states:
/// - _ok_: The result contains a value and has no diagnostics.
/// - _rec_: recoverable: The result contains a (recovered) value and has only diagnostics of the
///   kind [`DiagnosticKind::Rec`].
/// - _err_: non-recoverable: The result does not contain a value and has at least one diagnostic of
///   the kind [`DiagnosticKind::Err`].
///
/// It is guaranteed that the result will never be completely empty (i.e. no value nor diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    value: Option<T>,
    diagnostics: LinkedList<(DiagnosticKind, Diagnostic)>,
}

impl<T: Default> Default for AggregateResult<T> {
    fn default() -> Self {
        Self {
            value: Some(T::default()),
            diagnostics: LinkedList::default(),
        }
    }
}

impl<T> AggregateResult<T> {
    /// Creates an `AggregateResult` in an _ok_ state containing the specified value.
    pub fn new_ok(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostics: LinkedList::new(),
        }
    }

    /// Creates an `AggregateResult` in a _rec_ state containing the specified value and diagnostic.
    pub fn new_rec(value: T, diagnostic: Diagnostic) -> Self {
        Self {
            value: Some(value),
            diagnostics: LinkedList::from([(DiagnosticKind::Rec, diagnostic)]),
        }
    }

    /// Creates an `AggregateResult` in an _err_ state containing the specified diagnostic.
    pub fn new_err(diagnostic: Diagnostic) -> Self {
        Self {
            value: None,
            diagnostics: LinkedList::from([(DiagnosticKind::Err, diagnostic)]),
        }
    }

    /// Returns `true` if the result is in an _ok_ state: a value and no diagnostics.
    pub fn is_ok(&self) -> bool {
        self.value.is_some() && self.diagnostics.is_empty()
    }

    /// Returns `true` if the result is in a _rec_ state: a recovered value with diagnostics.
    pub fn is_rec(&self) -> bool {
        self.value.is_some() && !self.diagnostics.is_empty()
    }

    /// Returns `true` if the result is in an _err_ state: no value.
    pub fn is_err(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Returns an iterator over the diagnostics for _rec_ and _err_ results.
    pub fn diagnostics(&self) -> impl Iterator<Item = (DiagnosticKind, &Diagnostic)> {
        self.diagnostics.iter().map(|(dt, d)| (*dt, d))
    }

    /// Returns a consuming iterator over the diagnostics for _rec_ and _err_ results.
    pub fn into_diagnostics(self) -> impl Iterator<Item = (DiagnosticKind, Diagnostic)> {
        self.diagnostics.into_iter()
    }

    /// Adds a recoverable diagnostic to the result.
    ///
    /// An _ok_ result will become a _rec_ result.
    pub fn add_rec_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics
            .push_back((DiagnosticKind::Rec, diagnostic));
    }

    /// Adds a non-recoverable diagnostic to the result.
    ///
    /// The result will become an _err_ result, dropping a contained value.
    pub fn add_err(&mut self, diagnostic: Diagnostic) {
        self.value = None;
        self.diagnostics
            .push_back((DiagnosticKind::Err, diagnostic));
    }

    /// Runs the predicate for all recoverable diagnostics, turning the diagnostics where the
    /// predicate returns `true` into errors. This will also make the `AggregateResult` itself
    /// an _err_.
    pub fn upgrade_diagnostics<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&Diagnostic) -> bool,
    {
        for (kind, diagnostic) in &mut self.diagnostics {
            if *kind == DiagnosticKind::Err {
                continue;
            }
            if predicate(diagnostic) {
                *kind = DiagnosticKind::Err;
                self.value = None;
            }
        }
    }

    /// Maps an `AggregateResult<T>` to `AggregateResult<U>` by applying a function to a
    /// contained value, leaving diagnostics untouched.
    #[must_use]
    pub fn map<U, F>(self, op: F) -> AggregateResult<U>
    where
        F: FnOnce(T) -> U,
    {
        AggregateResult {
            value: self.value.map(op),
            diagnostics: self.diagnostics,
        }
    }

    /// Combines the values of `self` and `other` using `f`, aggregating their diagnostics.
    ///
    /// If either `self` or `other` is in an _err_ state, the returned result will be in an _err_
    /// state as well.
    #[must_use]
    pub fn combine<U, F, R>(mut self, mut other: AggregateResult<U>, f: F) -> AggregateResult<R>
    where
        F: FnOnce(T, U) -> R,
    {
        AggregateResult {
            value: self.value.and_then(|t| other.value.map(|u| f(t, u))),
            diagnostics: {
                self.diagnostics.append(&mut other.diagnostics);
                self.diagnostics
            },
        }
    }

    /// Aggregates the diagnostics of `other` with `self`, discarding the value of self.
    #[must_use]
    pub fn aggregate<U>(mut self, mut other: AggregateResult<U>) -> AggregateResult<U> {
        self.diagnostics.append(&mut other.diagnostics);
        other.diagnostics = self.diagnostics;
        other
    }

    /// Calls `op` if the result has a value, aggregating the diagnostics of `self` with the result
    /// returned by `op`.
    ///
    /// The value of `self` will always be discarded.
    #[must_use]
    pub fn and_then<U, F>(mut self, op: F) -> AggregateResult<U>
    where
        F: FnOnce(T) -> AggregateResult<U>,
    {
        match self.value {
            Some(t) => {
                let mut other = op(t);
                self.diagnostics.append(&mut other.diagnostics);
                other.diagnostics = self.diagnostics;
                other
            }
            None => AggregateResult {
                value: None,
                diagnostics: self.diagnostics,
            },
        }
    }

    /// Zips the values of `self` and `other`, aggregating their diagnostics.
    ///
    /// If either `self` or `other` is in an _err_ state, the returned result will be in an _err_
    /// state as well. Otherwise, the returned result will contain a tuple with the values of `self`
    /// and `other`.
    pub fn zip<U>(mut self, mut other: AggregateResult<U>) -> AggregateResult<(T, U)> {
        AggregateResult {
            value: self.value.zip(other.value),
            diagnostics: {
                self.diagnostics.append(&mut other.diagnostics);
                self.diagnostics
            },
        }
    }

    /// Add `self` to `other`, combining their values using `f`, and aggregating their diagnostics.
    ///
    /// Like [`combine`](AggregateResult::combine) except that `other` is modified in-place.
    pub fn add_to<U, F>(mut self, other: &mut AggregateResult<U>, f: F)
    where
        F: FnOnce(&mut U, T),
    {
        if let Some((u, t)) = other.value.as_mut().zip(self.value) {
            f(u, t);
        } else {
            other.value = None;
        }
        other.diagnostics.append(&mut self.diagnostics);
    }

    pub fn transpose_from(value: Option<Self>) -> AggregateResult<Option<T>> {
        match value {
            Some(res) => res.map(Some),
            None => AggregateResult::new_ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag() -> Diagnostic {
        DiagnosticBuilder::new(0..1).build_undeclared_ident("x")
    }

    #[test]
    fn states() {
        let ok = AggregateResult::new_ok(1);
        assert!(ok.is_ok() && !ok.is_rec() && !ok.is_err());

        let rec = AggregateResult::new_rec(1, diag());
        assert!(rec.is_rec() && !rec.is_ok() && !rec.is_err());
        assert_eq!(rec.value(), Some(&1));

        let err = AggregateResult::<i32>::new_err(diag());
        assert!(err.is_err());
        assert!(err.value().is_none());
    }

    #[test]
    fn zip_keeps_all_diagnostics() {
        let rec = AggregateResult::new_rec(1, diag());
        let err = AggregateResult::<i32>::new_err(diag());
        let zipped = rec.zip(err);
        assert!(zipped.is_err());
        assert_eq!(zipped.diagnostics().count(), 2);
    }

    #[test]
    fn upgrade_to_err_drops_value() {
        let mut rec = AggregateResult::new_rec(1, diag());
        rec.upgrade_diagnostics(|_| true);
        assert!(rec.is_err());
    }
}
