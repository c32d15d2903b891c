// Scenario Catalog
//
// One Scenario type replaces the per-endpoint handler duplication: a category
// tag plus an {unsafe, safe} pair of variants sharing one calling convention.
//
// - registry: the id -> Scenario lookup table, built once then read-only
// - catalog: assembles the built-in scenarios and owns the default registry
// - injection, access, crypto, deserialization, headers, ssrf: the families
//
// Variants never perform real I/O. Whatever the vulnerable code would have
// done (spawn a shell, open a socket, load a class) is described in the
// outcome's side effect instead.

pub mod access;
pub mod catalog;
pub mod crypto;
pub mod deserialization;
pub mod headers;
pub mod injection;
pub mod registry;
pub mod ssrf;

pub use catalog::{build_registry, default_registry};
pub use registry::ScenarioRegistry;

use crate::error::Result;
use crate::models::{Category, Subject, VariantKind};
use serde::Serialize;
use std::fmt;

/// What a variant receives: the raw request input and, when the dispatcher
/// resolved one, the session subject. Subject identity is never read from
/// `raw` by a safe variant.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub raw: &'a str,
    pub session: Option<&'a Subject>,
}

impl<'a> Invocation<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw, session: None }
    }

    pub fn with_session(mut self, subject: &'a Subject) -> Self {
        self.session = Some(subject);
        self
    }
}

/// A variant's response body plus a description of what it would have done
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub output: String,
    pub side_effect: String,
}

impl Outcome {
    pub fn new(output: impl Into<String>, side_effect: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            side_effect: side_effect.into(),
        }
    }
}

pub type VariantFn = Box<dyn Fn(&Invocation<'_>) -> Result<Outcome> + Send + Sync>;

/// A vulnerable/hardened pair
pub struct Scenario {
    pub id: String,
    pub category: Category,
    pub title: String,
    /// Input that shows the two variants diverging
    pub sample_input: String,
    unsafe_variant: VariantFn,
    safe_variant: VariantFn,
}

impl Scenario {
    pub fn new<U, S>(
        id: impl Into<String>,
        category: Category,
        title: impl Into<String>,
        unsafe_variant: U,
        safe_variant: S,
    ) -> Self
    where
        U: Fn(&Invocation<'_>) -> Result<Outcome> + Send + Sync + 'static,
        S: Fn(&Invocation<'_>) -> Result<Outcome> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            category,
            title: title.into(),
            sample_input: String::new(),
            unsafe_variant: Box::new(unsafe_variant),
            safe_variant: Box::new(safe_variant),
        }
    }

    pub fn with_sample_input(mut self, sample: impl Into<String>) -> Self {
        self.sample_input = sample.into();
        self
    }

    pub fn invoke(&self, kind: VariantKind, invocation: &Invocation<'_>) -> Result<Outcome> {
        match kind {
            VariantKind::Unsafe => (self.unsafe_variant)(invocation),
            VariantKind::Safe => (self.safe_variant)(invocation),
        }
    }

    pub fn run_unsafe(&self, invocation: &Invocation<'_>) -> Result<Outcome> {
        self.invoke(VariantKind::Unsafe, invocation)
    }

    pub fn run_safe(&self, invocation: &Invocation<'_>) -> Result<Outcome> {
        self.invoke(VariantKind::Safe, invocation)
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}
