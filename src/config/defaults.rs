use super::constants::*;

pub(crate) fn log_level() -> Option<String> {
    Some("info".to_string())
}

pub(crate) fn log_file_path() -> String {
    LOG_FILE_PATH.to_string()
}

pub(crate) fn page_size() -> usize {
    PAGE_SIZE
}

pub(crate) fn ack_timeout_secs() -> u64 {
    ACK_TIMEOUT_SECS
}
