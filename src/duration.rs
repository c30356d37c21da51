//! Duration resolver.
//!
//! Processes name their duration function by code. Callers link a function
//! to each code before planning; at ignition time every node of an order's
//! instance is evaluated once and the result becomes the node's fixed
//! duration in the configured time scale.
//!
//! The signature `(order, process) -> i64` is enforced by the
//! [`DurationFn`] bound when a function is linked. Negative results are
//! rejected at evaluation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DurationError;
use crate::graph::RecipeTemplate;
use crate::models::{Order, Process};

/// A pure duration function.
pub trait DurationFn: Send + Sync {
    /// Duration of `process` for `order`, in time-scale units.
    fn duration(&self, order: &Order, process: &Process) -> i64;
}

impl<F> DurationFn for F
where
    F: Fn(&Order, &Process) -> i64 + Send + Sync,
{
    fn duration(&self, order: &Order, process: &Process) -> i64 {
        self(order, process)
    }
}

/// A duration function returning the same value for every order.
pub fn fixed(units: i64) -> impl DurationFn {
    move |_: &Order, _: &Process| units
}

/// Named duration functions.
#[derive(Clone, Default)]
pub struct DurationRegistry {
    functions: HashMap<String, Arc<dyn DurationFn>>,
}

impl fmt::Debug for DurationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<&str> = self.codes().collect();
        codes.sort_unstable();
        f.debug_struct("DurationRegistry")
            .field("codes", &codes)
            .finish()
    }
}

impl DurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `function` to `code`, replacing any previous link.
    ///
    /// # Errors
    /// [`DurationError::InvalidCode`] if the code is empty or blank.
    pub fn link(
        &mut self,
        code: impl Into<String>,
        function: impl DurationFn + 'static,
    ) -> Result<(), DurationError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DurationError::InvalidCode(code));
        }
        self.functions.insert(code, Arc::new(function));
        Ok(())
    }

    pub fn is_linked(&self, code: &str) -> bool {
        self.functions.contains_key(code)
    }

    /// Linked codes, unordered.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Checks that every process of `template` has a linked function.
    pub fn check(&self, template: &RecipeTemplate) -> Result<(), DurationError> {
        match template.nodes().iter().find(|p| !self.is_linked(&p.duration_fn)) {
            Some(process) => Err(DurationError::Unlinked {
                code: process.duration_fn.clone(),
                process: process.code.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Evaluates one process.
    pub fn evaluate(&self, order: &Order, process: &Process) -> Result<i64, DurationError> {
        let function = self
            .functions
            .get(&process.duration_fn)
            .ok_or_else(|| DurationError::Unlinked {
                code: process.duration_fn.clone(),
                process: process.code.clone(),
            })?;
        let value = function.duration(order, process);
        if value < 0 {
            return Err(DurationError::Negative {
                code: process.duration_fn.clone(),
                process: process.code.clone(),
                order: order.code.clone(),
                value,
            });
        }
        Ok(value)
    }

    /// Per-node durations of `template` for `order`, indexed like its nodes.
    pub fn resolve(
        &self,
        template: &RecipeTemplate,
        order: &Order,
    ) -> Result<Vec<i64>, DurationError> {
        template
            .nodes()
            .iter()
            .map(|process| self.evaluate(order, process))
            .collect()
    }
}
