use std::default;

/// Options which change how the `Vm` explores configurations.
#[derive(Clone, Debug, Default)]
pub struct Options {
    max_configurations: Option<usize>,
}

impl Options {
    /// Create a new set of Options with the default settings.
    pub fn new() -> Options {
        Options::default()
    }

    /// Set the maximum number of configurations to visit.
    pub fn set_max_configurations(&mut self, max_configurations: Option<usize>) {
        self.max_configurations = max_configurations;
    }

    /// The maximum number of configurations the `Vm` may visit before giving
    /// up with `Error::ExplorationLimit`.
    ///
    /// The configuration space of a program is always finite, so exploration
    /// terminates without a limit. The limit guards against programs whose
    /// configuration space is simply too large to be worth exploring. By
    /// default there is no limit.
    pub fn max_configurations(&self) -> Option<usize> {
        self.max_configurations
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `vm::Options`
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder for vm options.
    pub fn new() -> OptionsBuilder {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    /// Set the, "Max configurations," option. By default this is `None`.
    pub fn max_configurations(mut self, max_configurations: usize) -> OptionsBuilder {
        self.options.set_max_configurations(Some(max_configurations));
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl default::Default for OptionsBuilder {
    fn default() -> OptionsBuilder {
        OptionsBuilder::new()
    }
}
