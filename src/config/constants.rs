use std::time::Duration;

pub const LOG_FILE_PATH: &str = "/tmp/errtracker.log";

/// Items requested per `listTasks` page
pub const PAGE_SIZE: usize = 100;

/// Time to wait for the realtime endpoint to acknowledge `connection_init`
pub const ACK_TIMEOUT_SECS: u64 = 10;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time to wait for the server to confirm a websocket close
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// UI refresh interval when no event arrives
pub const FRAME_DURATION: Duration = Duration::from_millis(250);

pub const NOTICE_DURATION: Duration = Duration::from_secs(4);

/// How long shutdown waits for in-flight requests
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);
