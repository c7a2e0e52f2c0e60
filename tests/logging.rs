//! Global subscriber installation. Kept in its own test binary because only
//! one subscriber can ever be installed per process.

use servicekit::config::LoggingSettings;
use servicekit::observability::{init_logging, try_init_logging};
use servicekit::Error;

#[test]
fn test_second_install_fails_and_try_init_ignores_it() {
    let settings = LoggingSettings { level: "info".to_string(), json: true };

    init_logging(&settings).unwrap();
    tracing::info!(secret_id = "svc/dev1/db-pwd", "Logging from the test binary");

    let err = init_logging(&settings).unwrap_err();
    assert!(matches!(err, Error::Internal { .. }), "{:?}", err);
    assert!(try_init_logging(&settings).is_ok());
}
