//! Unit tests for start-up and failure reporting.

use std::io::{self, Write};

use rstest::rstest;
use tdrelay::TransportError;
use tdrelay_config::Config;

use crate::{AppError, LoginError, StaticConfigLoader, bootstrap_with, report_failure};

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
#[case::transport(AppError::Transport(TransportError::Closed))]
#[case::login(AppError::Login(LoginError::StreamClosed))]
fn failures_are_reported_on_one_line(#[case] error: AppError) {
    let mut sink = Vec::new();

    report_failure(&error, &mut sink).expect("in-memory sink accepts writes");

    let report = String::from_utf8(sink).expect("report is UTF-8");
    assert_eq!(report, format!("tdrelay-login: {error}\n"));
}

#[rstest]
fn write_failures_are_returned_to_the_caller() {
    let error = AppError::Login(LoginError::StreamClosed);

    let outcome = report_failure(&error, &mut BrokenPipe);

    assert!(matches!(outcome, Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
}

#[rstest]
fn repeated_bootstraps_share_one_subscriber() {
    let loader = StaticConfigLoader::new(Config::default());

    let first = bootstrap_with(&loader).expect("first bootstrap succeeds");
    let second = bootstrap_with(&loader).expect("second bootstrap succeeds");

    assert_eq!(first.telemetry(), second.telemetry());
    assert_eq!(first.telemetry().format(), Config::default().log_format());
}
