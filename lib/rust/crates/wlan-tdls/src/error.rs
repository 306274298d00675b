// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::mac::StatusCode, thiserror::Error};

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("error parsing frame: {0}")]
pub struct FrameParseError(pub &'static str);

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("error writing frame: {0}")]
pub struct FrameWriteError(pub &'static str);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("{0}")]
    ParsingFrame(#[from] FrameParseError),
    #[error("{0}")]
    WritingFrame(#[from] FrameWriteError),
    #[error("no free TDLS entry left")]
    TableFull,
    #[error("TDLS entry already exists for peer")]
    DuplicatePeer,
    #[error("no TDLS entry for peer")]
    UnknownPeer,
    #[error("frame not expected in current link state")]
    InvalidState,
    #[error("dialog token mismatch; expected {0}, got {1}")]
    TokenMismatch(u8, u8),
    #[error("MIC verification failed")]
    MicMismatch,
    #[error("rejected with status {0:?}")]
    Status(StatusCode),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("device error: {0}")]
    Device(String),
}

impl From<StatusCode> for Error {
    fn from(status: StatusCode) -> Self {
        Error::Status(status)
    }
}

impl Error {
    /// Status code echoed to a peer when this error aborts the handling of its frame.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Status(status) => *status,
            Error::ParsingFrame(_) => StatusCode::INVALID_ELEMENT,
            _ => StatusCode::REQUEST_DECLINED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_into_status_code() {
        assert_eq!(Error::TableFull.status_code(), StatusCode::REQUEST_DECLINED);
        assert_eq!(Error::MicMismatch.status_code(), StatusCode::REQUEST_DECLINED);
        assert_eq!(
            Error::Status(StatusCode::INVALID_AKMP).status_code(),
            StatusCode::INVALID_AKMP
        );
        assert_eq!(
            Error::from(FrameParseError("too short")).status_code(),
            StatusCode::INVALID_ELEMENT
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(
            format!("{}", Error::from(FrameParseError("too short"))),
            "error parsing frame: too short"
        );
        assert_eq!(
            format!("{}", Error::TokenMismatch(3, 4)),
            "dialog token mismatch; expected 3, got 4"
        );
    }
}
