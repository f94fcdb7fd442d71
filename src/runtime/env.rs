//! Environment operations.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn current_dir_impl(&self) -> Result<PathBuf> {
        env::current_dir().context("Failed to get current directory")
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_env() {
        let runtime = RealRuntime;

        // PATH should exist on all systems
        assert!(runtime.env_var("PATH").is_ok());
        assert!(
            runtime
                .env_var("BOLETO_TEST_SURELY_UNSET_VARIABLE")
                .is_err()
        );

        let cwd = runtime.current_dir().unwrap();
        assert!(cwd.is_absolute());
    }
}
