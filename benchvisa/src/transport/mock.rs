//! An in-memory transport for exercising sessions without an instrument.
//!
//! Replies are keyed by the written command (line ending stripped) and queued
//! for the next read. A read with nothing queued times out.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Attribute, RawResult, Transport, ViSession, ViStatus};
use benchvisa_protocol::status::{VI_ERROR_RSRC_NFOUND, VI_ERROR_TMO};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    OpenDefaultRm,
    Open,
    Close,
    Write,
    Read,
    SetAttribute,
    FindResources,
    Clear,
    ReadStb,
}

#[derive(Default)]
struct State {
    next_handle: ViSession,
    live: HashSet<ViSession>,
    closed: Vec<ViSession>,
    opened: Vec<String>,
    writes: Vec<String>,
    attributes: Vec<(Attribute, u64)>,
    replies: HashMap<String, String>,
    pending: VecDeque<Vec<u8>>,
    failures: HashMap<Operation, ViStatus>,
    resources: Vec<String>,
    status_byte: u16,
    clears: usize,
}

impl State {
    fn fail(&mut self, op: Operation) -> RawResult<()> {
        match self.failures.remove(&op) {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn handle(&mut self) -> ViSession {
        self.next_handle += 1;
        self.live.insert(self.next_handle);
        self.next_handle
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every later write of `command` with `response`.
    pub fn reply<C: Into<String>, R: Into<String>>(&self, command: C, response: R) -> &Self {
        self.lock().replies.insert(command.into(), response.into());
        self
    }

    /// Queue raw bytes for the next read regardless of what was written.
    pub fn push_response<T: Into<Vec<u8>>>(&self, data: T) {
        self.lock().pending.push_back(data.into());
    }

    /// Make the next call of `op` fail with `code`.
    pub fn fail(&self, op: Operation, code: ViStatus) {
        self.lock().failures.insert(op, code);
    }

    pub fn set_resources<T: Into<String>, I: IntoIterator<Item = T>>(&self, resources: I) {
        self.lock().resources = resources.into_iter().map(Into::into).collect();
    }

    pub fn set_status_byte(&self, stb: u16) {
        self.lock().status_byte = stb;
    }

    /// Everything written so far, decoded lossily.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub fn attributes(&self) -> Vec<(Attribute, u64)> {
        self.lock().attributes.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    pub fn closed(&self) -> Vec<ViSession> {
        self.lock().closed.clone()
    }

    pub fn live_handles(&self) -> usize {
        self.lock().live.len()
    }

    pub fn clears(&self) -> usize {
        self.lock().clears
    }
}

impl Transport for MockTransport {
    fn open_default_rm(&self) -> RawResult<ViSession> {
        let mut state = self.lock();
        state.fail(Operation::OpenDefaultRm)?;
        Ok(state.handle())
    }

    fn open(&self, _rm: ViSession, resource: &str) -> RawResult<ViSession> {
        let mut state = self.lock();
        state.fail(Operation::Open)?;
        state.opened.push(resource.to_string());
        Ok(state.handle())
    }

    fn close(&self, handle: ViSession) -> RawResult<()> {
        let mut state = self.lock();
        state.live.remove(&handle);
        state.closed.push(handle);
        state.fail(Operation::Close)
    }

    fn write(&self, _instr: ViSession, data: &[u8]) -> RawResult<usize> {
        let mut state = self.lock();
        state.fail(Operation::Write)?;
        let text = String::from_utf8_lossy(data).to_string();
        let key = text.trim_end_matches(&['\r', '\n'][..]);
        if let Some(reply) = state.replies.get(key).cloned() {
            state.pending.push_back(reply.into_bytes());
        }
        state.writes.push(text);
        Ok(data.len())
    }

    fn read(&self, _instr: ViSession, max_len: usize) -> RawResult<Vec<u8>> {
        let mut state = self.lock();
        state.fail(Operation::Read)?;
        let mut data = state.pending.pop_front().ok_or(VI_ERROR_TMO)?;
        data.truncate(max_len);
        Ok(data)
    }

    fn set_attribute(&self, _instr: ViSession, attr: Attribute, value: u64) -> RawResult<()> {
        let mut state = self.lock();
        state.fail(Operation::SetAttribute)?;
        state.attributes.push((attr, value));
        Ok(())
    }

    fn status_desc(&self, _handle: ViSession, status: ViStatus) -> String {
        format!("mock status {:#X}", status as u32)
    }

    fn find_resources(&self, _rm: ViSession, _pattern: &str) -> RawResult<Vec<String>> {
        let mut state = self.lock();
        state.fail(Operation::FindResources)?;
        if state.resources.is_empty() {
            return Err(VI_ERROR_RSRC_NFOUND);
        }
        Ok(state.resources.clone())
    }

    fn clear(&self, _instr: ViSession) -> RawResult<()> {
        let mut state = self.lock();
        state.fail(Operation::Clear)?;
        state.clears += 1;
        Ok(())
    }

    fn read_stb(&self, _instr: ViSession) -> RawResult<u16> {
        let mut state = self.lock();
        state.fail(Operation::ReadStb)?;
        Ok(state.status_byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_follow_writes() {
        let mock = MockTransport::new();
        mock.reply("*IDN?", "ACME,PSU,1,1.0\n");
        let rm = mock.open_default_rm().unwrap();
        let instr = mock.open(rm, "TCPIP::1.2.3.4::INSTR").unwrap();
        assert_eq!(mock.read(instr, 64), Err(VI_ERROR_TMO));
        mock.write(instr, b"*IDN?\n").unwrap();
        assert_eq!(mock.read(instr, 64).unwrap(), b"ACME,PSU,1,1.0\n".to_vec());
        assert_eq!(mock.live_handles(), 2);
    }

    #[test]
    fn failures_are_one_shot() {
        let mock = MockTransport::new();
        mock.fail(Operation::OpenDefaultRm, VI_ERROR_TMO);
        assert_eq!(mock.open_default_rm(), Err(VI_ERROR_TMO));
        assert_eq!(mock.open_default_rm(), Ok(1));
    }
}
