//! Test and helper mocks for glove_core

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use glove_traits::{BoxError, Sink, SpiBus};

type ReadHook = Box<dyn FnMut(usize) + Send>;

/// A bus that answers each transfer with the next scripted sample (or error)
/// using the converter's reply framing. Clones share the request log.
#[derive(Clone)]
pub struct ScriptedBus {
    script: Arc<Mutex<VecDeque<Result<u16, String>>>>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    hook: Arc<Mutex<Option<ReadHook>>>,
}

impl ScriptedBus {
    pub fn new(script: impl IntoIterator<Item = Result<u16, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
            hook: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience for an all-success script.
    pub fn samples(samples: impl IntoIterator<Item = u16>) -> Self {
        Self::new(samples.into_iter().map(Ok))
    }

    /// Run `hook(n)` inside the n-th transfer (1-based), after the reply is
    /// produced. Lets a test act while a transaction is in flight.
    pub fn with_hook(self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        if let Ok(mut h) = self.hook.lock() {
            *h = Some(Box::new(hook));
        }
        self
    }

    /// Request frames as they were before each transfer overwrote them.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn reads(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl SpiBus for ScriptedBus {
    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), BoxError> {
        if buf.is_empty() {
            return Err("empty transfer".into());
        }
        let n = {
            let mut reqs = self.requests.lock().map_err(|_| "request log poisoned")?;
            reqs.push(buf.to_vec());
            reqs.len()
        };
        let next = self
            .script
            .lock()
            .map_err(|_| "script poisoned")?
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        let outcome = match next {
            Ok(sample) => {
                buf.fill(0xFF);
                if let [_, hi, lo, ..] = buf {
                    *hi = 0xF8 | ((sample >> 8) as u8 & 0x03);
                    *lo = (sample & 0xFF) as u8;
                }
                Ok(())
            }
            Err(msg) => Err(msg.into()),
        };
        if let Ok(mut h) = self.hook.lock()
            && let Some(hook) = h.as_mut()
        {
            hook(n);
        }
        outcome
    }
}

/// A sink that records every message. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
    fail_on: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the n-th send (1-based) and every send after it.
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or(false)
    }
}

impl Sink for RecordingSink {
    fn send(&mut self, msg: &str) -> Result<(), BoxError> {
        if self.is_closed() {
            return Err("sink closed".into());
        }
        let mut log = self.messages.lock().map_err(|_| "sink log poisoned")?;
        if self.fail_on.is_some_and(|n| log.len() + 1 >= n) {
            return Err("connection reset".into());
        }
        log.push(msg.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        let mut c = self.closed.lock().map_err(|_| "sink state poisoned")?;
        *c = true;
        Ok(())
    }
}
