use mvnget_util::errors::MvnGetError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = MvnGetError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = MvnGetError::Config {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Configuration error: bad syntax");
}

#[test]
fn test_network_error_display() {
    let err = MvnGetError::Network {
        message: "timeout".to_string(),
    };
    assert_eq!(err.to_string(), "Network error: timeout");
}

#[test]
fn test_parse_error_display() {
    let err = MvnGetError::Parse {
        message: "unexpected end of file".to_string(),
    };
    assert_eq!(err.to_string(), "Parse error: unexpected end of file");
}

#[test]
fn test_version_error_display() {
    let err = MvnGetError::Version {
        message: "1--2".to_string(),
    };
    assert_eq!(err.to_string(), "Invalid version: 1--2");
}

#[test]
fn test_generic_error_display() {
    let err = MvnGetError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: MvnGetError = io_err.into();
    assert!(matches!(err, MvnGetError::Io(_)));
}
