use std::fmt;

/// Position of a connection in the request/response exchange.
///
/// "Local" and "remote" are relative to this endpoint: a client that sent its
/// whole request is [`HalfClosedLocal`](State::HalfClosedLocal) until the
/// response body has been read, a server that read the whole request is
/// [`HalfClosedRemote`](State::HalfClosedRemote) until it finished writing
/// the response.
///
/// ```text
///            open             end of local stream
///   Idle ----------> Open ---------------------------> HalfClosedLocal
///    ^                |                                      |
///    |                | end of remote stream                 | end of remote stream
///    |                v                                      v
///    |         HalfClosedRemote --- end of local stream ---> exchange complete
///    |                                                       |
///    +---------------------- persistent ---------------------+---- otherwise ----> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No exchange in progress, ready for the next request
    Idle,
    /// Both directions of the exchange are in progress
    Open,
    /// The local endpoint finished sending
    HalfClosedLocal,
    /// The peer finished sending
    HalfClosedRemote,
    /// The connection can't carry any more exchanges
    Closed,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Open => "open",
            State::HalfClosedLocal => "half_closed_local",
            State::HalfClosedRemote => "half_closed_remote",
            State::Closed => "closed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
