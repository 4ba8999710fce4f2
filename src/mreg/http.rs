use crate::mreg::error::TransportError;
use crate::mreg::history::Method;
use crate::mreg::util::Fields;
use serde_json::Value;
use std::time::Duration;

/// Blocking access to the registry API. Every call fails on a non-2xx status.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Value, TransportError>;
    fn post(&self, url: &str, fields: &Fields) -> Result<(), TransportError>;
    fn patch(&self, url: &str, fields: &Fields) -> Result<(), TransportError>;
    fn delete(&self, url: &str) -> Result<(), TransportError>;
}

pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("mreg-cli/", env!("CARGO_PKG_VERSION")))
            .build();
        HttpClient { agent }
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        fields: Option<&Fields>,
    ) -> Result<ureq::Response, TransportError> {
        tracing::debug!(%method, url, "request");
        let req = self
            .agent
            .request(method.as_str(), url)
            .set("Accept", "application/json");
        let res = match fields {
            Some(f) => req.send_json(f),
            None => req.call(),
        };
        match res {
            Ok(r) => Ok(r),
            Err(ureq::Error::Status(code, r)) => {
                let body = r.into_string().unwrap_or_default();
                tracing::warn!(%method, url, code, "request rejected");
                Err(TransportError::Status {
                    method,
                    url: String::from(url),
                    code,
                    body,
                })
            }
            Err(ureq::Error::Transport(e)) => Err(TransportError::Request {
                method,
                url: String::from(url),
                message: e.to_string(),
            }),
        }
    }
}

impl Transport for HttpClient {
    fn get(&self, url: &str) -> Result<Value, TransportError> {
        self.send(Method::Get, url, None)?
            .into_json()
            .map_err(|e| TransportError::Decode {
                url: String::from(url),
                message: e.to_string(),
            })
    }

    fn post(&self, url: &str, fields: &Fields) -> Result<(), TransportError> {
        self.send(Method::Post, url, Some(fields)).map(|_| ())
    }

    fn patch(&self, url: &str, fields: &Fields) -> Result<(), TransportError> {
        self.send(Method::Patch, url, Some(fields)).map(|_| ())
    }

    fn delete(&self, url: &str) -> Result<(), TransportError> {
        self.send(Method::Delete, url, None).map(|_| ())
    }
}

/// Fetches every item of a list endpoint, following `next` links when the
/// server paginates with `{"results": [...], "next": ...}`.
pub fn get_list(transport: &dyn Transport, url: &str) -> Result<Vec<Value>, TransportError> {
    let mut items = Vec::new();
    let mut next = Some(String::from(url));
    while let Some(cur) = next.take() {
        match transport.get(&cur)? {
            Value::Array(page) => items.extend(page),
            Value::Object(mut obj) => {
                match obj.remove("results") {
                    Some(Value::Array(page)) => items.extend(page),
                    _ => {
                        return Err(TransportError::Decode {
                            url: cur,
                            message: String::from("expected a \"results\" list"),
                        })
                    }
                }
                next = obj.get("next").and_then(Value::as_str).map(String::from);
            }
            _ => {
                return Err(TransportError::Decode {
                    url: cur,
                    message: String::from("expected a list"),
                })
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Post(String, Fields),
        Patch(String, Fields),
        Delete(String),
    }

    #[derive(Default)]
    struct State {
        calls: Vec<Call>,
        gets: Vec<String>,
        responses: HashMap<String, Value>,
        failures: VecDeque<u16>,
    }

    /// In-memory transport. Clones share state, so a test can keep a handle
    /// after moving one into a `Context`.
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        state: Rc<RefCell<State>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Mutating calls issued so far, in order.
        pub fn calls(&self) -> Vec<Call> {
            self.state.borrow().calls.clone()
        }

        pub fn gets(&self) -> Vec<String> {
            self.state.borrow().gets.clone()
        }

        pub fn respond(&self, url: &str, value: Value) {
            self.state.borrow_mut().responses.insert(String::from(url), value);
        }

        /// Makes the next call of any kind fail with `code`.
        pub fn fail_next(&self, code: u16) {
            self.state.borrow_mut().failures.push_back(code);
        }

        fn check(&self, method: Method, url: &str) -> Result<(), TransportError> {
            match self.state.borrow_mut().failures.pop_front() {
                Some(code) => Err(TransportError::Status {
                    method,
                    url: String::from(url),
                    code,
                    body: String::new(),
                }),
                None => Ok(()),
            }
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> Result<Value, TransportError> {
            self.check(Method::Get, url)?;
            let mut state = self.state.borrow_mut();
            state.gets.push(String::from(url));
            state.responses.get(url).cloned().ok_or(TransportError::Status {
                method: Method::Get,
                url: String::from(url),
                code: 404,
                body: String::new(),
            })
        }

        fn post(&self, url: &str, fields: &Fields) -> Result<(), TransportError> {
            self.check(Method::Post, url)?;
            let call = Call::Post(String::from(url), fields.clone());
            self.state.borrow_mut().calls.push(call);
            Ok(())
        }

        fn patch(&self, url: &str, fields: &Fields) -> Result<(), TransportError> {
            self.check(Method::Patch, url)?;
            let call = Call::Patch(String::from(url), fields.clone());
            self.state.borrow_mut().calls.push(call);
            Ok(())
        }

        fn delete(&self, url: &str) -> Result<(), TransportError> {
            self.check(Method::Delete, url)?;
            self.state.borrow_mut().calls.push(Call::Delete(String::from(url)));
            Ok(())
        }
    }
}
