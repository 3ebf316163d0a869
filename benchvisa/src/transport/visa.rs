use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use dlopen::wrapper::{Container, WrapperApi};

use super::{Attribute, RawResult, Transport, ViSession, ViStatus, VI_NULL};
use crate::{Error, Result};
use benchvisa_protocol::status::{is_error, VI_ERROR_INV_EXPR, VI_ERROR_INV_RSRC_NAME};

/// Overrides the location of the VISA shared library.
pub const LIBRARY_ENV: &str = "BENCHVISA_VISA_LIBRARY";

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        const DEFAULT_LIBRARY: &str = "visa64.dll";
    } else if #[cfg(target_os = "macos")] {
        const DEFAULT_LIBRARY: &str = "/Library/Frameworks/VISA.framework/VISA";
    } else {
        const DEFAULT_LIBRARY: &str = "libvisa.so";
    }
}

type ViAccessMode = u32;
type ViAttr = u32;
type ViAttrState = u64;
type ViFindList = u32;

const VI_NO_LOCK: ViAccessMode = 0;
const VI_TMO_IMMEDIATE: u32 = 0;
const VI_FIND_BUFLEN: usize = 256;
const STATUS_DESC_LEN: usize = 256;

#[derive(WrapperApi)]
struct Api {
    viOpenDefaultRM: unsafe extern "C" fn(vi: *mut ViSession) -> ViStatus,
    viOpen: unsafe extern "C" fn(
        session: ViSession,
        rsrc: *const c_char,
        access_mode: ViAccessMode,
        timeout: u32,
        vi: *mut ViSession,
    ) -> ViStatus,
    viClose: unsafe extern "C" fn(vi: ViSession) -> ViStatus,
    viSetAttribute: unsafe extern "C" fn(vi: ViSession, attr: ViAttr, value: ViAttrState) -> ViStatus,
    viStatusDesc: unsafe extern "C" fn(vi: ViSession, status: ViStatus, desc: *mut c_char) -> ViStatus,
    viRead: unsafe extern "C" fn(vi: ViSession, buf: *mut u8, cnt: u32, cnt_ret: *mut u32) -> ViStatus,
    viWrite: unsafe extern "C" fn(vi: ViSession, buf: *const u8, cnt: u32, cnt_ret: *mut u32) -> ViStatus,
    viClear: unsafe extern "C" fn(vi: ViSession) -> ViStatus,
    viReadSTB: unsafe extern "C" fn(vi: ViSession, status: *mut u16) -> ViStatus,
    viFindRsrc: unsafe extern "C" fn(
        rm: ViSession,
        expr: *const c_char,
        list: *mut ViFindList,
        count: *mut u32,
        desc: *mut c_char,
    ) -> ViStatus,
    viFindNext: unsafe extern "C" fn(list: ViFindList, desc: *mut c_char) -> ViStatus,
}

/// A VISA implementation loaded from a shared library at run time.
pub struct VisaLibrary {
    api: Container<Api>,
    path: String,
}

lazy_static! {
    static ref SYSTEM: Result<Arc<VisaLibrary>> = VisaLibrary::load(&library_path()).map(Arc::new);
}

/// Path of the VISA library used by [`system`].
pub fn library_path() -> String {
    std::env::var(LIBRARY_ENV).unwrap_or_else(|_| DEFAULT_LIBRARY.to_string())
}

/// The process-wide VISA library, loaded on first use.
pub fn system() -> Result<Arc<VisaLibrary>> {
    SYSTEM.clone()
}

fn check(status: ViStatus) -> RawResult<ViStatus> {
    if is_error(status) {
        Err(status)
    } else {
        Ok(status)
    }
}

fn buffer_to_string(data: &[c_char]) -> String {
    unsafe { CStr::from_ptr(data.as_ptr()) }.to_string_lossy().into_owned()
}

impl VisaLibrary {
    pub fn load(path: &str) -> Result<Self> {
        log::debug!("Loading VISA library from `{}`", path);
        let api: Container<Api> = unsafe { Container::load(path) }
            .map_err(|err| Error::connection(format!("Cannot load VISA library `{}`: {}", path, err)))?;
        Ok(VisaLibrary {
            api,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for VisaLibrary {
    fn open_default_rm(&self) -> RawResult<ViSession> {
        let mut rm: ViSession = VI_NULL;
        check(unsafe { self.api.viOpenDefaultRM(&mut rm as *mut ViSession) })?;
        Ok(rm)
    }

    fn open(&self, rm: ViSession, resource: &str) -> RawResult<ViSession> {
        let rsrc = CString::new(resource).map_err(|_| VI_ERROR_INV_RSRC_NAME)?;
        let mut instr: ViSession = VI_NULL;
        check(unsafe {
            self.api
                .viOpen(rm, rsrc.as_ptr(), VI_NO_LOCK, VI_TMO_IMMEDIATE, &mut instr as *mut ViSession)
        })?;
        Ok(instr)
    }

    fn close(&self, handle: ViSession) -> RawResult<()> {
        check(unsafe { self.api.viClose(handle) }).map(|_| ())
    }

    fn write(&self, instr: ViSession, data: &[u8]) -> RawResult<usize> {
        let len = data.len().min(u32::MAX as usize) as u32;
        let mut written = 0_u32;
        check(unsafe { self.api.viWrite(instr, data.as_ptr(), len, &mut written as *mut u32) })?;
        if (written as usize) < data.len() && len < u32::MAX {
            log::warn!("Short write: {} of {} bytes", written, data.len());
        }
        Ok(written as usize)
    }

    fn read(&self, instr: ViSession, max_len: usize) -> RawResult<Vec<u8>> {
        let len = max_len.min(u32::MAX as usize);
        let mut data = vec![0_u8; len];
        let mut actually_read = 0_u32;
        check(unsafe {
            self.api
                .viRead(instr, data.as_mut_ptr(), len as u32, &mut actually_read as *mut u32)
        })?;
        data.truncate(actually_read as usize);
        Ok(data)
    }

    fn set_attribute(&self, instr: ViSession, attr: Attribute, value: u64) -> RawResult<()> {
        check(unsafe { self.api.viSetAttribute(instr, attr.code(), value) }).map(|_| ())
    }

    fn status_desc(&self, handle: ViSession, status: ViStatus) -> String {
        let mut data = [0 as c_char; STATUS_DESC_LEN];
        let ret = unsafe { self.api.viStatusDesc(handle, status, data.as_mut_ptr()) };
        if is_error(ret) {
            return format!("Unknown status code {:#X}", status as u32);
        }
        buffer_to_string(&data)
    }

    fn find_resources(&self, rm: ViSession, pattern: &str) -> RawResult<Vec<String>> {
        let expr = CString::new(pattern).map_err(|_| VI_ERROR_INV_EXPR)?;
        let mut list: ViFindList = VI_NULL;
        let mut count = 0_u32;
        let mut desc = [0 as c_char; VI_FIND_BUFLEN];
        check(unsafe {
            self.api.viFindRsrc(
                rm,
                expr.as_ptr(),
                &mut list as *mut ViFindList,
                &mut count as *mut u32,
                desc.as_mut_ptr(),
            )
        })?;
        let mut ret = Vec::with_capacity(count as usize);
        ret.push(buffer_to_string(&desc));
        for _ in 1..count {
            if check(unsafe { self.api.viFindNext(list, desc.as_mut_ptr()) }).is_err() {
                break;
            }
            ret.push(buffer_to_string(&desc));
        }
        unsafe { self.api.viClose(list) };
        Ok(ret)
    }

    fn clear(&self, instr: ViSession) -> RawResult<()> {
        check(unsafe { self.api.viClear(instr) }).map(|_| ())
    }

    fn read_stb(&self, instr: ViSession) -> RawResult<u16> {
        let mut stb = 0_u16;
        check(unsafe { self.api.viReadSTB(instr, &mut stb as *mut u16) })?;
        Ok(stb)
    }
}

impl std::fmt::Debug for VisaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisaLibrary").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_a_connection_error() {
        let err = VisaLibrary::load("/nonexistent/libvisa-missing.so").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Connection);
        assert!(err.to_string().contains("libvisa-missing.so"));
    }

    #[test]
    fn attribute_codes() {
        assert_eq!(Attribute::TimeoutValue.code(), 0x3FFF001A);
        assert_eq!(Attribute::TermChar.code(), 0x3FFF0018);
        assert_eq!(Attribute::TermCharEnabled.code(), 0x3FFF0038);
        assert_eq!(Attribute::SendEndEnabled.code(), 0x3FFF0016);
    }
}
