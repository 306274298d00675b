// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod handshake;
pub mod mic;
pub mod tpk;

pub use {
    handshake::*,
    mic::{setup_mic_input, teardown_mic_input, MicBuilder},
    tpk::Tpk,
};
