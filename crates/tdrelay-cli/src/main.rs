use std::io;
use std::process::ExitCode;

use tdrelay::{ConsoleCredentials, NativeTransport};
use tdrelay_cli::{SystemConfigLoader, report_failure, run};

fn main() -> ExitCode {
    let mut credentials = ConsoleCredentials::stdio();
    let mut output = io::stdout().lock();

    match run(
        &SystemConfigLoader,
        NativeTransport::create,
        &mut credentials,
        &mut output,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "tdrelay_cli", %error, "tdrelay-login failed");
            if let Err(write_error) = report_failure(&error, &mut io::stderr()) {
                tracing::warn!(
                    target: "tdrelay_cli",
                    %write_error,
                    "failed to report the failure on stderr"
                );
            }
            ExitCode::FAILURE
        }
    }
}
