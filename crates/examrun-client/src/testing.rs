//! Scripted in-memory runner for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;
use crate::transport::{Connector, Request, Response, Transport};

/// One scripted answer.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Answer(Response),
    Unreachable,
}

impl Reply {
    pub(crate) fn status(status: u16) -> Self {
        Self::Answer(Response::new(status, Vec::new()))
    }

    pub(crate) fn ok_json(body: &str) -> Self {
        Self::Answer(Response::new(200, body.as_bytes().to_vec()))
    }
}

type Hook = Arc<dyn Fn(&Request) + Send + Sync>;

#[derive(Default)]
struct State {
    queued: HashMap<String, VecDeque<Reply>>,
    defaults: HashMap<String, Reply>,
    requests: Vec<Request>,
    opened: usize,
    open_handles: usize,
    hook: Option<Hook>,
}

/// Answers calls by path. Queued replies are used once, in order; after that
/// the path's default applies, and unscripted paths answer 200 with `{}`.
#[derive(Clone, Default)]
pub(crate) struct FakeRunner {
    state: Arc<Mutex<State>>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn session(&self) -> Session {
        self.session_with(|_| {})
    }

    pub(crate) fn session_with(&self, tweak: impl FnOnce(&mut ClientConfig)) -> Session {
        let mut config = ClientConfig::new("http://runner.test/examRest");
        tweak(&mut config);
        Session::with_connector(config, Arc::new(self.clone()))
    }

    pub(crate) fn reply(&self, path: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap();
        state
            .queued
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn set_default(&self, path: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap();
        state.defaults.insert(path.to_string(), reply);
    }

    /// Run `hook` on every request before it is answered.
    pub(crate) fn on_request(&self, hook: impl Fn(&Request) + Send + Sync + 'static) {
        self.state.lock().unwrap().hook = Some(Arc::new(hook));
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Targets (path plus query) of all requests so far.
    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().iter().map(Request::target).collect()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub(crate) fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub(crate) fn open_handles(&self) -> usize {
        self.state.lock().unwrap().open_handles
    }

    fn answer(&self, request: Request) -> Result<Response, ClientError> {
        let hook = self.state.lock().unwrap().hook.clone();
        if let Some(hook) = hook {
            hook(&request);
        }

        let mut state = self.state.lock().unwrap();
        let queued = state
            .queued
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| state.defaults.get(&request.path).cloned());
        state.requests.push(request);

        match reply {
            Some(Reply::Answer(response)) => Ok(response),
            Some(Reply::Unreachable) => Err(ClientError::Transport(
                "connection refused".to_string(),
            )),
            None => Ok(Response::new(200, b"{}".to_vec())),
        }
    }
}

impl Connector for FakeRunner {
    fn open(&self, _base_url: &str) -> Result<Box<dyn Transport>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.opened += 1;
        state.open_handles += 1;
        Ok(Box::new(FakeHandle {
            runner: self.clone(),
        }))
    }
}

struct FakeHandle {
    runner: FakeRunner,
}

#[async_trait]
impl Transport for FakeHandle {
    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.runner.answer(request)
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        if let Ok(mut state) = self.runner.state.lock() {
            state.open_handles -= 1;
        }
    }
}
