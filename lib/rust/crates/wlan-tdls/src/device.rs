// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        error::Error,
        frame::Elements,
        mac::{MacAddr, MacFmt},
    },
    std::fmt,
    zeroize::Zeroize,
};

#[cfg(test)]
pub use test_utils::*;

/// Index of a peer in the hardware MAC table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wcid(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    Ccmp128,
}

/// Pairwise key for a direct link. The key bytes are cleared when dropped.
#[derive(Clone, PartialEq)]
pub struct KeyConfig {
    pub peer: MacAddr,
    pub wcid: Wcid,
    pub cipher: CipherSuite,
    pub key: Vec<u8>,
}

impl Drop for KeyConfig {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("peer", &self.peer.to_mac_str())
            .field("wcid", &self.wcid)
            .field("cipher", &self.cipher)
            .finish()
    }
}

/// Capabilities a peer advertised during setup, used to program its MAC table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCapabilities {
    pub capability_info: u16,
    pub supported_rates: Vec<u8>,
    pub ext_supported_rates: Vec<u8>,
    pub ht_capabilities: Option<Vec<u8>>,
    pub ext_capabilities: Option<Vec<u8>>,
    pub qos_info: Option<u8>,
}

impl PeerCapabilities {
    pub fn from_elements(capability_info: u16, elements: &Elements) -> Self {
        Self {
            capability_info,
            supported_rates: elements.supported_rates.clone().unwrap_or_default(),
            ext_supported_rates: elements.ext_supported_rates.clone().unwrap_or_default(),
            ht_capabilities: elements.ht_capabilities.clone(),
            ext_capabilities: elements.ext_capabilities.clone(),
            qos_info: elements.qos_capability.as_ref().and_then(|qos| qos.first().copied()),
        }
    }
}

/// Services the embedding driver provides to the TDLS state machine.
pub trait DeviceOps {
    /// Sends an Ethernet II frame carrying a TDLS action. Frames sent `via_ap` are relayed
    /// by the AP instead of using the direct link.
    fn send_frame(&mut self, frame: Vec<u8>, via_ap: bool) -> Result<(), Error>;
    /// Sends a public action frame body to `dst`.
    fn send_public_action(&mut self, dst: MacAddr, body: Vec<u8>) -> Result<(), Error>;
    /// Adds the peer to the MAC table.
    fn configure_peer(&mut self, peer: &MacAddr, caps: &PeerCapabilities) -> Result<Wcid, Error>;
    fn set_key(&mut self, key: KeyConfig) -> Result<(), Error>;
    /// Removes the peer's key and MAC table entry.
    fn clear_peer(&mut self, wcid: Wcid, peer: &MacAddr) -> Result<(), Error>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_capabilities_from_elements() {
        let elements = Elements {
            supported_rates: Some(vec![0x82, 0x84]),
            qos_capability: Some(vec![0x0f]),
            ht_capabilities: Some(vec![0x6e; 26]),
            ..Default::default()
        };
        let caps = PeerCapabilities::from_elements(0x0421, &elements);
        assert_eq!(caps.capability_info, 0x0421);
        assert_eq!(caps.supported_rates, vec![0x82, 0x84]);
        assert!(caps.ext_supported_rates.is_empty());
        assert_eq!(caps.qos_info, Some(0x0f));
        assert_eq!(caps.ht_capabilities, Some(vec![0x6e; 26]));
    }

    #[test]
    fn key_config_debug_hides_key() {
        let key = KeyConfig {
            peer: [1; 6],
            wcid: Wcid(3),
            cipher: CipherSuite::Ccmp128,
            key: vec![0xab; 16],
        };
        let debug = format!("{:?}", key);
        assert!(debug.contains("01:01:01:01:01:01"));
        assert!(!debug.contains("171"));
    }

    #[test]
    fn fake_device_clear_peer() {
        let mut device = FakeDevice::new();
        let wcid = device.configure_peer(&[1; 6], &PeerCapabilities::default()).expect("add");
        device
            .set_key(KeyConfig { peer: [1; 6], wcid, cipher: CipherSuite::Ccmp128, key: vec![1] })
            .expect("set key");
        device.clear_peer(wcid, &[1; 6]).expect("clear");
        assert!(device.peers.is_empty());
        assert!(device.keys.is_empty());
        assert_eq!(device.cleared, vec![(wcid, [1; 6])]);
    }
}
