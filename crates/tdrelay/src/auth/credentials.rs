//! Sources of interactive login input.

use std::fmt;
use std::io::{self, BufRead, Write};

/// A value the user must supply during login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    /// Phone number in international format.
    PhoneNumber,
    /// Confirmation code delivered to the user.
    Code,
    /// Two-step verification password.
    Password,
}

impl Credential {
    /// Prompt shown before reading the credential.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::PhoneNumber => "Enter phone: ",
            Self::Code => "Enter code: ",
            Self::Password => "Enter password: ",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::PhoneNumber => "phone number",
            Self::Code => "code",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Supplies credentials to the authorization driver.
///
/// Each call answers exactly one prompt.
pub trait CredentialSource {
    /// Reads the value for `credential`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when no value can be obtained.
    fn read(&mut self, credential: Credential) -> io::Result<String>;
}

impl<C: CredentialSource + ?Sized> CredentialSource for &mut C {
    fn read(&mut self, credential: Credential) -> io::Result<String> {
        (**self).read(credential)
    }
}

/// Prompts on a writer and reads one line per credential from a reader.
#[derive(Debug)]
pub struct ConsoleCredentials<R, W> {
    input: R,
    prompt: W,
}

impl<R: BufRead, W: Write> ConsoleCredentials<R, W> {
    /// Wraps the given input and prompt streams.
    pub const fn new(input: R, prompt: W) -> Self {
        Self { input, prompt }
    }

    /// Returns the wrapped streams.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.prompt)
    }
}

impl ConsoleCredentials<io::StdinLock<'static>, io::Stderr> {
    /// Reads from standard input and prompts on standard error.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> CredentialSource for ConsoleCredentials<R, W> {
    fn read(&mut self, credential: Credential) -> io::Result<String> {
        self.prompt.write_all(credential.prompt().as_bytes())?;
        self.prompt.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input closed before a {credential} was entered"),
            ));
        }
        Ok(line.trim().to_owned())
    }
}
