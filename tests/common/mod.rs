#![allow(dead_code)]

use adbutil::errors::{AdbError, AdbResult};
use adbutil::runners::{CommandRunner, EventStream, ProcessEvent, SpawnOptions};
use async_trait::async_trait;
use futures_util::stream;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted stand in for the process backed runner: hands back queued
/// replies in order and records every invocation for assertions.
#[derive(Default)]
pub struct FakeRunner {
    outputs: Mutex<VecDeque<Result<String, String>>>,
    streams: Mutex<VecDeque<Vec<ProcessEvent>>>,
    calls: Mutex<Vec<(String, Vec<String>, Option<SpawnOptions>)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful `output` reply.
    pub fn reply(self, output: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .push_back(Ok(output.to_string()));
        self
    }

    /// Queue a failing `output` reply.
    pub fn reply_err(self, reason: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
        self
    }

    /// Queue the events of one `stream` invocation.
    pub fn reply_events(self, events: Vec<ProcessEvent>) -> Self {
        self.streams.lock().unwrap().push_back(events);
        self
    }

    /// Every invocation seen so far. The third slot carries the spawn
    /// options for `stream` calls and is `None` for `output` calls.
    pub fn calls(&self) -> Vec<(String, Vec<String>, Option<SpawnOptions>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn output(&self, program: &str, args: &[String]) -> AdbResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec(), None));
        match self.outputs.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(reason)) => Err(AdbError::command_failed(
                format!("{} {}", program, args.join(" ")),
                reason,
            )),
            None => Ok(String::new()),
        }
    }

    async fn stream(
        &self,
        program: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> AdbResult<EventStream> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec(), Some(options)));
        match self.streams.lock().unwrap().pop_front() {
            Some(events) => Ok(Box::pin(stream::iter(events))),
            None => Err(AdbError::unknown("no scripted stream")),
        }
    }
}
