/// What to do when a label is registered twice with different contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail with a [`RegistrationCollision`](crate::error::RegistrationCollision) error.
    #[default]
    Error,

    /// Log a warning and keep the first registration.
    Warn,
}

/// Options for a splitting run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitOptions {
    /// What to do when a label is registered twice with different contents.
    pub collisions: CollisionPolicy,

    /// The maximum depth of the expressions to split. Deeper expressions fail with an
    /// [`ExpressionTooDeep`](crate::error::ExpressionTooDeep) error.
    pub max_depth: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            collisions: CollisionPolicy::default(),
            max_depth: 512,
        }
    }
}

impl SplitOptions {
    /// Creates the default options: collisions are errors, and expressions may be 512 levels
    /// deep.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collision policy.
    pub fn collisions(mut self, collisions: CollisionPolicy) -> Self {
        self.collisions = collisions;
        self
    }

    /// Sets the maximum depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
