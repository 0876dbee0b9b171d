pub(crate) mod session_logging;
