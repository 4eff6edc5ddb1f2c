use mvnget_util::process::{is_available, CommandBuilder};

#[cfg(unix)]
#[test]
fn test_builder_simple_command() {
    let output = CommandBuilder::new("echo").arg("hello").exec().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "hello");
}

#[cfg(unix)]
#[test]
fn test_exec_stdout_ignores_exit_status() {
    let stdout = CommandBuilder::new("sh")
        .args(["-c", "echo '[GNUPG:] NO_PUBKEY ABCDEF'; exit 2"])
        .exec_stdout()
        .unwrap();
    assert_eq!(stdout.trim(), "[GNUPG:] NO_PUBKEY ABCDEF");
}

#[cfg(unix)]
#[test]
fn test_builder_with_env() {
    let output = CommandBuilder::new("sh")
        .arg("-c")
        .arg("echo $GNUPGHOME")
        .env("GNUPGHOME", "/tmp/mvnget-gnupg")
        .exec()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "/tmp/mvnget-gnupg");
}

#[test]
fn test_builder_nonexistent_program() {
    let result = CommandBuilder::new("nonexistent_program_xyz_123").exec();
    assert!(result.is_err());
    assert!(!is_available("nonexistent_program_xyz_123"));
}
