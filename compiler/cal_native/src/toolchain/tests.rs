use super::*;
use crate::OptLevel;
use pretty_assertions::assert_eq;
use std::ffi::OsStr;

fn args(cmd: &Command) -> Vec<String> {
    cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[test]
fn test_command_shape() {
    let config = NativeConfig::default();
    let cmd = compile_command(&config, Path::new("/tmp/x/evaluate.c"), Path::new("/tmp/x/libevaluate.so"));
    assert_eq!(cmd.get_program(), OsStr::new("cc"));
    assert_eq!(
        args(&cmd),
        vec![
            "-shared",
            "-fPIC",
            "-fwrapv",
            "-O2",
            "-o",
            "/tmp/x/libevaluate.so",
            "/tmp/x/evaluate.c",
        ]
    );
}

#[test]
fn test_command_with_config() {
    let config = NativeConfig::default()
        .with_compiler("clang")
        .with_opt_level(OptLevel::O0)
        .with_flag("-g");
    let cmd = compile_command(&config, Path::new("a.c"), Path::new("a.so"));
    assert_eq!(cmd.get_program(), OsStr::new("clang"));
    assert_eq!(
        args(&cmd),
        vec!["-shared", "-fPIC", "-fwrapv", "-O0", "-g", "-o", "a.so", "a.c"]
    );
}

#[test]
fn test_missing_compiler() {
    let config = NativeConfig::default().with_compiler("cal-no-such-compiler-7f3a");
    let result = compile(&config, Path::new("a.c"), Path::new("a.so"));
    assert!(matches!(result, Err(NativeError::CompilerNotFound { .. })));
}

#[cfg(unix)]
#[test]
fn test_failing_compiler() {
    // `false` accepts any arguments and exits 1.
    let config = NativeConfig::default().with_compiler("false");
    match compile(&config, Path::new("a.c"), Path::new("a.so")) {
        Err(NativeError::CompilationFailed { exit_code, command, .. }) => {
            assert_eq!(exit_code, Some(1));
            assert!(command.contains("-fwrapv"));
        }
        other => panic!("expected compilation failure, got {other:?}"),
    }
}
