use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::attachment::GenerationRequest;
use crate::client::{is_overload_error, GenerationClient};

pub const MAX_ATTEMPTS: u32 = 3;

/// Retry bookkeeping for a single invocation. `attempt` counts the calls
/// already issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self {
            attempt: 0,
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Result of an invocation together with the retry state it ended in.
#[derive(Debug)]
pub struct Attempted<T> {
    pub state: RetryState,
    pub result: Result<T>,
}

impl<T> Attempted<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempted<U> {
        Attempted {
            state: self.state,
            result: self.result.map(f),
        }
    }
}

/// Issues one model call, retrying only transient overloads with a fixed
/// delay. Other errors and the last overload are returned as they came.
pub struct RetryingInvoker<'a> {
    client: &'a dyn GenerationClient,
    backoff: Duration,
}

impl<'a> RetryingInvoker<'a> {
    pub fn new(client: &'a dyn GenerationClient, backoff: Duration) -> Self {
        Self { client, backoff }
    }

    pub fn invoke(
        &self,
        request: &GenerationRequest,
        mut state: RetryState,
        mut on_retry: impl FnMut(&RetryState, &anyhow::Error),
    ) -> Attempted<String> {
        loop {
            state.attempt += 1;
            match self.client.generate_text(request) {
                Ok(text) => {
                    return Attempted {
                        state,
                        result: Ok(text),
                    }
                }
                Err(err) => {
                    if !is_overload_error(&err) || state.exhausted() {
                        return Attempted {
                            state,
                            result: Err(err),
                        };
                    }
                    on_retry(&state, &err);
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }
    }
}
