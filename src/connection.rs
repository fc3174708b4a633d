use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use getset::CopyGetters;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionID(pub u64);

impl fmt::Display for ConnectionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
pub struct ConnectionIDFactory {
    last_connection_id: AtomicU64,
}

impl ConnectionIDFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_connection_id(&self) -> ConnectionID {
        let connection_id = self.last_connection_id.fetch_add(1, Ordering::Relaxed) + 1;

        ConnectionID(connection_id)
    }
}

/// Identifies one FastCGI request: the socket connection it arrived on plus
/// the request id the web server assigned within that connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct RequestID {
    connection_id: u64,
    request_id: u16,
}

impl RequestID {
    pub fn new(connection_id: ConnectionID, request_id: u16) -> Self {
        Self {
            connection_id: connection_id.0,
            request_id,
        }
    }
}

impl fmt::Display for RequestID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.connection_id, self.request_id)
    }
}
