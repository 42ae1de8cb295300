//! Per-stage memoization.
//!
//! Each pipeline stage owns a [`Memo`]: its last output together with the
//! key (the stage's own inputs) that produced it. Refreshing with an equal
//! key is free; a different key recomputes and bumps the generation, which
//! downstream stages fold into their own keys.

/// Cached output of one stage.
#[derive(Debug, Clone)]
pub(crate) struct Memo<K> {
    stage: &'static str,
    key: Option<K>,
    output: Vec<usize>,
    generation: u64,
    computations: u64,
}

impl<K: PartialEq> Memo<K> {
    pub(crate) fn new(stage: &'static str) -> Self {
        Memo {
            stage,
            key: None,
            output: Vec::new(),
            generation: 0,
            computations: 0,
        }
    }

    /// Recomputes the output unless `key` equals the cached key. Returns
    /// `true` if the stage ran.
    pub(crate) fn refresh(&mut self, key: K, compute: impl FnOnce() -> Vec<usize>) -> bool {
        if self.key.as_ref() == Some(&key) {
            tracing::trace!(stage = self.stage, "stage cache hit");
            return false;
        }
        self.output = compute();
        self.key = Some(key);
        self.generation += 1;
        self.computations += 1;
        tracing::debug!(
            stage = self.stage,
            generation = self.generation,
            output = self.output.len(),
            "stage recomputed"
        );
        true
    }

    /// Last computed output.
    pub(crate) fn output(&self) -> &[usize] {
        &self.output
    }

    /// Increments whenever the output is recomputed.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// How many times the stage has run.
    pub(crate) fn computations(&self) -> u64 {
        self.computations
    }
}
