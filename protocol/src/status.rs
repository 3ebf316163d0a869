//! VISA completion and error codes.
//!
//! Negative codes signal failure. The codes listed here are the ones the error
//! taxonomy distinguishes, plus a few used by transport implementations.

use crate::error::ErrorKind;

pub type ViStatus = i32;

pub const VI_SUCCESS: ViStatus = 0;

pub const VI_ERROR_SYSTEM_ERROR: ViStatus = 0xBFFF0000_u32 as i32;
pub const VI_ERROR_INV_OBJECT: ViStatus = 0xBFFF000E_u32 as i32;
pub const VI_ERROR_RSRC_LOCKED: ViStatus = 0xBFFF000F_u32 as i32;
pub const VI_ERROR_INV_EXPR: ViStatus = 0xBFFF0010_u32 as i32;
pub const VI_ERROR_RSRC_NFOUND: ViStatus = 0xBFFF0011_u32 as i32;
pub const VI_ERROR_INV_RSRC_NAME: ViStatus = 0xBFFF0012_u32 as i32;
pub const VI_ERROR_TMO: ViStatus = 0xBFFF0015_u32 as i32;
pub const VI_ERROR_NSUP_ATTR: ViStatus = 0xBFFF001D_u32 as i32;
pub const VI_ERROR_IO: ViStatus = 0xBFFF003E_u32 as i32;
pub const VI_ERROR_NLISTENERS: ViStatus = 0xBFFF005F_u32 as i32;
pub const VI_ERROR_CONN_LOST: ViStatus = 0xBFFF00A6_u32 as i32;

pub fn is_error(status: ViStatus) -> bool {
    status < VI_SUCCESS
}

/// Which taxonomy member a failing status code belongs to.
pub fn classify(status: ViStatus) -> ErrorKind {
    match status {
        VI_ERROR_TMO => ErrorKind::Timeout,
        VI_ERROR_RSRC_NFOUND | VI_ERROR_RSRC_LOCKED | VI_ERROR_CONN_LOST => ErrorKind::Connection,
        VI_ERROR_INV_EXPR | VI_ERROR_NLISTENERS => ErrorKind::Command,
        _ => ErrorKind::Visa,
    }
}
