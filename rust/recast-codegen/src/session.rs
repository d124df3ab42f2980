//! Per-transpile session state and the statement bifurcation collector.

use recast_core::diag::Warnings;
use recast_core::options::TargetOptions;
use std::collections::BTreeSet;

/// Owns everything a single transpile accumulates: options, warnings, the
/// prelude/import requirement sets, and the defined-class registry. One
/// session per invocation; nothing is shared across transpiles.
pub struct TranspileSession {
    pub options: TargetOptions,
    pub warnings: Warnings,
    /// Prelude helper names the emitted code references (`_rotl32`,
    /// `safe_replace`, `Pack32BE`, …). Ordered so output is deterministic.
    pub preludes: BTreeSet<String>,
    /// Target-language module imports (`math`, `functools`, …).
    pub imports: BTreeSet<String>,
    /// Framework types referenced during transformation; resolved to stub
    /// declarations at emission.
    pub framework: BTreeSet<String>,
    /// Class names defined by the module; these keep PascalCase in every
    /// target and win over snake_case conversion.
    pub defined_classes: BTreeSet<String>,
    temp_counter: usize,
}

impl TranspileSession {
    pub fn new(options: TargetOptions) -> Self {
        Self {
            options,
            warnings: Warnings::new(),
            preludes: BTreeSet::new(),
            imports: BTreeSet::new(),
            framework: BTreeSet::new(),
            defined_classes: BTreeSet::new(),
            temp_counter: 0,
        }
    }

    pub fn require_prelude(&mut self, name: &str) {
        self.preludes.insert(name.to_string());
    }

    pub fn require_import(&mut self, name: &str) {
        self.imports.insert(name.to_string());
    }

    pub fn require_framework(&mut self, name: &str) {
        self.framework.insert(name.to_string());
    }

    pub fn fresh_temp(&mut self) -> String {
        let name = format!("_t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }
}

/// Scoped pre/post statement queues used while lowering one statement.
///
/// Passed by exclusive reference through expression lowering, never ambient:
/// a fresh collector is created per statement boundary and flattened as
/// `pre…, main, post…` afterwards (the ordering guarantee of the pipeline).
#[derive(Debug)]
pub struct StmtCollector<S> {
    pre: Vec<S>,
    post: Vec<S>,
}

impl<S> StmtCollector<S> {
    pub fn new() -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    pub fn push_pre(&mut self, stmt: S) {
        self.pre.push(stmt);
    }

    pub fn push_post(&mut self, stmt: S) {
        self.post.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }

    /// Flatten into `pre…, main…, post…`.
    pub fn wrap(self, main: Vec<S>) -> Vec<S> {
        let mut out = self.pre;
        out.extend(main);
        out.extend(self.post);
        out
    }

    /// Drain both queues into a single extracted list, pre first. Used for
    /// loop conditions where everything moves into the surrounding block.
    pub fn drain(&mut self) -> Vec<S> {
        let mut out = std::mem::take(&mut self.pre);
        out.append(&mut self.post);
        out
    }
}

impl<S> Default for StmtCollector<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_preserves_pre_main_post_order() {
        let mut c: StmtCollector<&'static str> = StmtCollector::new();
        c.push_pre("p1");
        c.push_pre("p2");
        c.push_post("q1");
        let out = c.wrap(vec!["main"]);
        assert_eq!(out, vec!["p1", "p2", "main", "q1"]);
    }

    #[test]
    fn temp_names_are_unique() {
        let mut session = TranspileSession::new(TargetOptions::default());
        let a = session.fresh_temp();
        let b = session.fresh_temp();
        assert_ne!(a, b);
    }
}
