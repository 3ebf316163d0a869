use log::Level;

use crate::logging::Logger;
use crate::transport::{Transport, ViSession, ViStatus};
use crate::{Error, VisaStatus};

/// Convert a failed transport status into an [`Error`], logging it on the way.
///
/// The single place where transport codes enter the error taxonomy.
pub(crate) fn status_error(
    transport: &dyn Transport,
    handle: ViSession,
    logger: &Logger,
    function: &str,
    code: ViStatus,
) -> Error {
    let description = transport.status_desc(handle, code);
    let status = VisaStatus::new(function, code, description);
    logger.log(Level::Error, &status);
    Error::from_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::transport::mock::MockTransport;
    use crate::ErrorKind;
    use benchvisa_protocol::status::{VI_ERROR_RSRC_LOCKED, VI_ERROR_TMO};
    use std::sync::Arc;

    #[test]
    fn maps_and_logs() {
        let sink = MemorySink::new();
        let logger = Logger::new(Arc::new(sink.clone()));
        let mock = MockTransport::new();

        let err = status_error(&mock, 0, &logger, "viRead", VI_ERROR_TMO);
        assert_eq!(err.kind(), ErrorKind::Timeout);
        let err = status_error(&mock, 0, &logger, "viOpen", VI_ERROR_RSRC_LOCKED);
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("viOpen"));
        assert!(err.to_string().contains("mock status"));

        assert!(sink.contains(Level::Error, "viRead"));
        assert_eq!(sink.records().len(), 2);
    }
}
