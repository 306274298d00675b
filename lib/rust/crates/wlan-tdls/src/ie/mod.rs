// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod fields;
mod reader;
pub mod rsne;
mod write;

pub use {fields::*, reader::*, write::*};

use zerocopy::{AsBytes, FromBytes, Unaligned};

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct Header {
    pub id: Id,
    pub body_len: u8,
}

/// IEEE Std 802.11-2016, 9.4.2.1, Table 9-77
#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Id(pub u8);

impl Id {
    pub const SUPPORTED_RATES: Self = Self(1);
    pub const COUNTRY: Self = Self(7);
    pub const SUPPORTED_CHANNELS: Self = Self(36);
    pub const HT_CAPABILITIES: Self = Self(45);
    pub const QOS_CAPABILITY: Self = Self(46);
    pub const RSNE: Self = Self(48);
    pub const EXT_SUPPORTED_RATES: Self = Self(50);
    pub const FTIE: Self = Self(55);
    pub const TIMEOUT_INTERVAL: Self = Self(56);
    pub const SUPPORTED_REGULATORY_CLASSES: Self = Self(59);
    pub const HT_OPERATION: Self = Self(61);
    pub const BSS_COEXISTENCE: Self = Self(72);
    pub const LINK_IDENTIFIER: Self = Self(101);
    pub const PU_BUFFER_STATUS: Self = Self(106);
    pub const EXT_CAPABILITIES: Self = Self(127);
    pub const VENDOR_SPECIFIC: Self = Self(221);
}
