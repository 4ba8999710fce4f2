use crate::mreg::config::Config;
use crate::mreg::error::TransportError;
use crate::mreg::history::History;
use crate::mreg::http::{self, Transport};
use crate::mreg::util::Fields;
use serde_json::Value;

/// Session state handed to every command handler.
pub struct Context {
    pub config: Config,
    pub transport: Box<dyn Transport>,
    pub history: History,
}

impl Context {
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        Context {
            config,
            transport,
            history: History::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    pub fn get(&self, url: &str) -> Result<Value, TransportError> {
        self.transport.get(url)
    }

    pub fn get_list(&self, url: &str) -> Result<Vec<Value>, TransportError> {
        http::get_list(self.transport.as_ref(), url)
    }

    /// A lookup worth keeping in the audit trail.
    pub fn get_list_recorded(&mut self, url: &str) -> Result<Vec<Value>, TransportError> {
        let items = self.get_list(url)?;
        self.history.record_get(url);
        Ok(items)
    }

    pub fn post(
        &mut self,
        url: &str,
        name: &str,
        data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> Result<usize, TransportError> {
        self.transport.post(url, &data)?;
        Ok(self.history.record_post(url, name, data, undoable, redoable))
    }

    pub fn patch(
        &mut self,
        url: &str,
        new_data: Fields,
        old_data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> Result<usize, TransportError> {
        self.transport.patch(url, &new_data)?;
        Ok(self.history.record_patch(url, new_data, old_data, undoable, redoable))
    }

    pub fn delete(
        &mut self,
        url: &str,
        old_data: Fields,
        undoable: bool,
        redoable: bool,
    ) -> Result<usize, TransportError> {
        self.transport.delete(url)?;
        Ok(self.history.record_delete(url, old_data, undoable, redoable))
    }
}
