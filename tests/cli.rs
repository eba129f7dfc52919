use std::io::Write;
use std::path::PathBuf;
use clap::Parser as ClapParser;
use feebl::error::Error;
use feebl::Config;
use tempfile::NamedTempFile;

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn config(input: Option<PathBuf>) -> Config {
    Config { input, debug: false, verbose: false }
}

#[test]
fn parse_no_args() {
    let config = Config::try_parse_from(["feebl"]).unwrap();

    assert_eq!(config.input, None);
    assert!(!config.debug);
    assert!(!config.verbose);
}

#[test]
fn parse_input_and_flags() {
    let config = Config::try_parse_from(["feebl", "-d", "-v", "script.fbl"]).unwrap();

    assert_eq!(config.input, Some(PathBuf::from("script.fbl")));
    assert!(config.debug);
    assert!(config.verbose);

    let config = Config::try_parse_from(["feebl", "--debug", "script.fbl"]).unwrap();
    assert!(config.debug);
    assert!(!config.verbose);
}

#[test]
fn parse_rejects_unknown_flags() {
    assert!(Config::try_parse_from(["feebl", "--fast"]).is_err());
    assert!(Config::try_parse_from(["feebl", "a.fbl", "b.fbl"]).is_err());
}

#[test]
fn runs_script_file() {
    let file = script("let a = 2; if (a * a == 4) { a = a + 1; }");

    assert!(feebl::run(&config(Some(file.path().to_path_buf()))).is_ok());
}

#[test]
fn script_with_syntax_errors() {
    let file = script("let = 1;");
    let error = feebl::run(&config(Some(file.path().to_path_buf()))).unwrap_err();

    assert!(matches!(error, Error::Syntax(_)));
    assert_eq!(error.exit_code(), 1);
}

#[test]
fn script_with_runtime_error() {
    let file = script("let a = nil;\na = a + 1;");
    let error = feebl::run(&config(Some(file.path().to_path_buf()))).unwrap_err();

    assert_eq!(error.to_string(), "[line 2 column 7] Operands must be two numbers or two strings.");
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn missing_script() {
    let dir = tempfile::tempdir().unwrap();
    let error = feebl::run(&config(Some(dir.path().join("missing.fbl")))).unwrap_err();

    assert!(matches!(error, Error::ReadFile { .. }));
    assert_eq!(error.exit_code(), 1);
}
