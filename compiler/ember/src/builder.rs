//! `EnvironmentBuilder` for environments with non-default limits.

use ember_eval::DEFAULT_MAX_CALL_DEPTH;
use ember_ir::Settings;

use crate::Environment;

/// Bytes reserved for the execution stack: locals, arguments and
/// temporaries of every active call.
pub const DEFAULT_STACK_CAPACITY: usize = 256 * 1024;

/// Builder for an [`Environment`].
///
/// ```ignore
/// let env = EnvironmentBuilder::new()
///     .settings(Settings::DISALLOW_DYNAMIC_CAST)
///     .stack_capacity(16 * 1024)
///     .max_call_depth(64)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct EnvironmentBuilder {
    settings: Settings,
    stack_capacity: usize,
    max_call_depth: usize,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        EnvironmentBuilder {
            settings: Settings::empty(),
            stack_capacity: DEFAULT_STACK_CAPACITY,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Constructs rejected when scripts are parsed.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Size of the execution stack in bytes. Exhausting it raises
    /// `StackOverflow`.
    #[must_use]
    pub fn stack_capacity(mut self, bytes: usize) -> Self {
        self.stack_capacity = bytes;
        self
    }

    /// Nested script calls allowed before `CallDepthExceeded`.
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn build(self) -> Environment {
        Environment::with_limits(self.settings, self.stack_capacity, self.max_call_depth)
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
