// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        error::FrameParseError,
        mac::{Bssid, MacAddr},
    },
    bitfield::bitfield,
    zerocopy::{
        byteorder::{LittleEndian, U32},
        AsBytes, FromBytes, LayoutVerified, Unaligned,
    },
};

pub const NONCE_LEN: usize = 32;
pub const MIC_LEN: usize = 16;

// IEEE Std 802.11-2016, 9.4.2.62
#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
pub struct LinkIdentifier {
    pub bssid: Bssid,
    pub initiator: MacAddr,
    pub responder: MacAddr,
}

impl LinkIdentifier {
    pub fn parse(body: &[u8]) -> Result<Self, FrameParseError> {
        LayoutVerified::<_, LinkIdentifier>::new_unaligned(body)
            .map(|l| *l)
            .ok_or(FrameParseError("invalid Link Identifier length"))
    }
}

// IEEE Std 802.11-2016, 9.4.2.49
#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
pub struct TimeoutInterval {
    pub ti_type: u8,
    pub value: U32<LittleEndian>,
}

impl TimeoutInterval {
    // IEEE Std 802.11-2016, Table 9-188
    pub const KEY_LIFETIME: u8 = 2;

    pub fn key_lifetime(seconds: u32) -> Self {
        Self { ti_type: Self::KEY_LIFETIME, value: U32::new(seconds) }
    }

    pub fn parse(body: &[u8]) -> Option<Self> {
        LayoutVerified::<_, TimeoutInterval>::new_unaligned(body).map(|ti| *ti)
    }
}

// IEEE Std 802.11-2016, 9.4.2.48
// Only the fixed part is carried in TDLS frames; no optional subelements.
#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct Ftie {
    pub mic_control: [u8; 2],
    pub mic: [u8; MIC_LEN],
    pub anonce: [u8; NONCE_LEN],
    pub snonce: [u8; NONCE_LEN],
}

impl Ftie {
    pub fn new(anonce: [u8; NONCE_LEN], snonce: [u8; NONCE_LEN]) -> Self {
        Self { mic_control: [0; 2], mic: [0; MIC_LEN], anonce, snonce }
    }

    /// Returns `None` unless `body` is exactly the fixed FTIE length.
    pub fn parse(body: &[u8]) -> Option<Self> {
        LayoutVerified::<_, Ftie>::new_unaligned(body).map(|ftie| *ftie)
    }

    pub fn with_zeroed_mic(&self) -> Self {
        Self { mic: [0; MIC_LEN], ..*self }
    }
}

impl PartialEq for Ftie {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::fmt::Debug for Ftie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Nonces and MIC are omitted.
        write!(f, "Ftie {{ mic_control: {:?} }}", { self.mic_control })
    }
}

// IEEE Std 802.11-2016, 9.4.1.4, Figure 9-68
bitfield! {
    pub struct RsnCapabilities(u16);
    impl Debug;
    pub preauth, set_preauth: 0;
    pub no_pairwise, set_no_pairwise: 1;
    pub ptksa_replay_counter, set_ptksa_replay_counter: 3, 2;
    pub gtksa_replay_counter, set_gtksa_replay_counter: 5, 4;
    pub mgmt_frame_protection_req, set_mgmt_frame_protection_req: 6;
    pub mgmt_frame_protection_cap, set_mgmt_frame_protection_cap: 7;
    pub joint_multiband, set_joint_multiband: 8;
    pub peerkey_enabled, set_peerkey_enabled: 9;
    pub value, _: 15, 0;
}

// IEEE Std 802.11-2016, 9.4.2.194
bitfield! {
    pub struct PuBufferStatus(u8);
    impl Debug;
    pub ac_bk, set_ac_bk: 0;
    pub ac_be, set_ac_be: 1;
    pub ac_vi, set_ac_vi: 2;
    pub ac_vo, set_ac_vo: 3;
    // Bits 4-7 reserved.
    pub value, _: 7, 0;
}

impl PuBufferStatus {
    /// Keeps the four access category bits.
    pub fn from_ac_bitmap(bits: u8) -> Self {
        Self(bits & 0x0f)
    }
}
