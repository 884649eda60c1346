//! Load Configuration

/// How the store's declared dimension is chosen after loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DimensionPolicy {
    /// Length of the last row that was inserted
    #[default]
    LastRow,
    /// Most frequent row length; ties go to the longer length
    MostCommon,
}

/// Model load configuration
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Print progress while loading
    pub verbose: bool,
    /// Abort on the first malformed row instead of skipping it
    pub strict: bool,
    /// Dimension selection
    pub dimension_policy: DimensionPolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            strict: true,
            dimension_policy: DimensionPolicy::LastRow,
        }
    }
}

impl LoadConfig {
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_dimension_policy(mut self, policy: DimensionPolicy) -> Self {
        self.dimension_policy = policy;
        self
    }
}
