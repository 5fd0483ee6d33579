//! Invalid environment overrides, in their own test binary: they mutate
//! process state that other config tests read.

use std::env;

use tempfile::TempDir;

use finter::cli::error::CliError;
use finter::config::Settings;
use finter::exitcode;

#[test]
fn given_non_boolean_fill_gaps_env_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    env::set_var("FINTER_FILL_GAPS", "bogus");

    // Act
    let result = Settings::load(Some(dir.path()));
    env::remove_var("FINTER_FILL_GAPS");

    // Assert
    let err = result.unwrap_err();
    assert!(matches!(err, CliError::Config { .. }));
    assert!(err.to_string().contains("FINTER_FILL_GAPS"));
    assert_eq!(err.exit_code(), exitcode::CONFIG);
}
