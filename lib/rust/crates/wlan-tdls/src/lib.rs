// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! IEEE Std 802.11-2016 Tunneled Direct Link Setup (TDLS) for a station associated to an AP.
//! The crate covers the setup handshake with its TPK key exchange, teardown, discovery with
//! signal-driven auto-link and Peer U-APSD traffic indication. See [`sm::TdlsSm`].
//!
//! Frames, timers and the hardware MAC table are reached through [`device::DeviceOps`] and
//! [`timer::Scheduler`], which the embedding driver implements.

pub mod autolink;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod frame;
pub mod ie;
pub mod key;
pub mod mac;
pub mod sm;
pub mod store;
pub mod timer;

pub use {
    config::TdlsConfig,
    error::Error,
    sm::{MlmeRequest, TdlsSm},
    store::LinkStatus,
};
