//! Credential source that replays canned answers.

use std::collections::VecDeque;
use std::io;

use crate::auth::{Credential, CredentialSource};

/// Replays queued answers and records every credential asked for.
#[derive(Debug, Default)]
pub struct ScriptedCredentials {
    answers: VecDeque<String>,
    asked: Vec<Credential>,
}

impl ScriptedCredentials {
    /// Queues an answer for the next prompt.
    pub fn answer(&mut self, value: impl Into<String>) {
        self.answers.push_back(value.into());
    }

    /// Credentials requested so far.
    #[must_use]
    pub fn asked(&self) -> &[Credential] {
        &self.asked
    }
}

impl CredentialSource for ScriptedCredentials {
    fn read(&mut self, credential: Credential) -> io::Result<String> {
        self.asked.push(credential);
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer"))
    }
}
