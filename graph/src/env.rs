use envconfig::Envconfig;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::str::FromStr;

lazy_static! {
    pub static ref ENV_VARS: EnvVars =
        EnvVars::from_env().expect("invalid BOOKSHELF_* environment variable");
}

#[derive(Clone, Debug)]
pub struct EnvVars {
    inner: Inner,
}

impl EnvVars {
    pub fn from_env() -> Result<Self, envconfig::Error> {
        let inner = Inner::init_from_env()?;
        Ok(Self { inner })
    }

    /// Builds the configuration from an explicit map instead of the process
    /// environment.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, envconfig::Error> {
        let inner = Inner::init_from_hashmap(vars)?;
        Ok(Self { inner })
    }

    /// Log level filter in `slog-envlogger` syntax, e.g. `info,bookshelf_graphql=debug`.
    ///
    /// Set by the environment variable `BOOKSHELF_LOG`. Unset by default.
    pub fn log_levels(&self) -> Option<&str> {
        self.inner.log_levels.as_deref()
    }

    /// Whether the runner logs how long each GraphQL operation took.
    ///
    /// Set by the environment variable `BOOKSHELF_LOG_QUERY_TIMING`. The
    /// default is `false`.
    pub fn log_query_timing(&self) -> bool {
        self.inner.log_query_timing.0
    }

    /// Maximum nesting of selection sets accepted by validation.
    ///
    /// Set by the environment variable `BOOKSHELF_GRAPHQL_MAX_DEPTH`. The
    /// default is 16.
    pub fn graphql_max_depth(&self) -> u8 {
        self.inner.graphql_max_depth
    }

    /// Maximum number of fields an operation may select once all its
    /// fragments are expanded.
    ///
    /// Set by the environment variable `BOOKSHELF_GRAPHQL_MAX_COMPLEXITY`.
    /// The default is 10000.
    pub fn graphql_max_complexity(&self) -> u64 {
        self.inner.graphql_max_complexity
    }

    /// Maximum size in bytes of the operation text in a request.
    ///
    /// Set by the environment variable `BOOKSHELF_GRAPHQL_MAX_QUERY_LENGTH`.
    /// The default is 65536.
    pub fn graphql_max_query_length(&self) -> usize {
        self.inner.graphql_max_query_length
    }
}

impl Default for EnvVars {
    fn default() -> Self {
        Self::from_map(&HashMap::new()).expect("defaults are valid")
    }
}

#[derive(Clone, Debug, Envconfig)]
struct Inner {
    #[envconfig(from = "BOOKSHELF_LOG")]
    log_levels: Option<String>,
    #[envconfig(from = "BOOKSHELF_LOG_QUERY_TIMING", default = "false")]
    log_query_timing: EnvVarBoolean,
    #[envconfig(from = "BOOKSHELF_GRAPHQL_MAX_DEPTH", default = "16")]
    graphql_max_depth: u8,
    #[envconfig(from = "BOOKSHELF_GRAPHQL_MAX_COMPLEXITY", default = "10000")]
    graphql_max_complexity: u64,
    #[envconfig(from = "BOOKSHELF_GRAPHQL_MAX_QUERY_LENGTH", default = "65536")]
    graphql_max_query_length: usize,
}

#[derive(Copy, Clone, Debug)]
struct EnvVarBoolean(pub bool);

impl FromStr for EnvVarBoolean {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" | "1" => Ok(Self(true)),
            "false" | "0" => Ok(Self(false)),
            _ => Err("Invalid env. var. flag, expected true / false / 1 / 0".to_string()),
        }
    }
}
