// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::mac::MacAddr, std::time::Duration};

/// TDLS_TIMEOUT: how long a pending setup waits for the next handshake message.
pub const SETUP_TIMEOUT_MILLIS: u64 = 1200;
/// dot11TDLSResponseTimeout
pub const TRAFFIC_RESPONSE_TIMEOUT_SECONDS: u64 = 5;

pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_millis(SETUP_TIMEOUT_MILLIS);
pub const DEFAULT_TRAFFIC_RESPONSE_TIMEOUT: Duration =
    Duration::from_secs(TRAFFIC_RESPONSE_TIMEOUT_SECONDS);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SetupTimeout(SetupTimeout),
    TrafficResponseTimeout(TrafficResponseTimeout),
}
impl From<SetupTimeout> for Event {
    fn from(timeout: SetupTimeout) -> Self {
        Event::SetupTimeout(timeout)
    }
}
impl From<TrafficResponseTimeout> for Event {
    fn from(timeout: TrafficResponseTimeout) -> Self {
        Event::TrafficResponseTimeout(timeout)
    }
}

/// Armed whenever an entry waits for a Setup Response or Confirm. The token ties the fire
/// to the handshake that armed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupTimeout {
    pub peer: MacAddr,
    pub token: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficResponseTimeout {
    pub peer: MacAddr,
}
