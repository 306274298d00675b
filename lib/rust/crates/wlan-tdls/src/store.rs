// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        device::{PeerCapabilities, Wcid},
        error::Error,
        key::{HandshakeAddrs, Nonce, Tpk},
        mac::{Bssid, MacAddr},
        timer::EventId,
    },
    slab::Slab,
    zeroize::Zeroize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    None,
    /// Setup Request sent, waiting for the Setup Response.
    WaitResponse,
    /// Setup Response sent, waiting for the Setup Confirm.
    WaitConfirm,
    Connected,
}

impl LinkStatus {
    pub fn is_established(&self) -> bool {
        *self == LinkStatus::Connected
    }

    pub fn is_pending(&self) -> bool {
        match self {
            LinkStatus::WaitResponse | LinkStatus::WaitConfirm => true,
            LinkStatus::None | LinkStatus::Connected => false,
        }
    }
}

/// Per-peer link state. Nonces are cleared on drop and the TPK clears itself.
#[derive(Debug)]
pub struct TdlsEntry {
    pub peer_addr: MacAddr,
    pub status: LinkStatus,
    pub dialog_token: u8,
    pub is_initiator: bool,
    pub anonce: Nonce,
    pub snonce: Nonce,
    pub tpk: Option<Tpk>,
    pub key_lifetime: u32,
    pub peer_caps: PeerCapabilities,
    pub timeout: Option<EventId>,
    pub wcid: Option<Wcid>,
    pub awaiting_traffic_response: bool,
}

impl TdlsEntry {
    pub fn new(peer_addr: MacAddr) -> Self {
        Self {
            peer_addr,
            status: LinkStatus::None,
            dialog_token: 0,
            is_initiator: false,
            anonce: [0; 32],
            snonce: [0; 32],
            tpk: None,
            key_lifetime: 0,
            peer_caps: PeerCapabilities::default(),
            timeout: None,
            wcid: None,
            awaiting_traffic_response: false,
        }
    }

    /// Addresses of the link by role, with `own_addr` on the side this entry says we are on.
    pub fn handshake_addrs(&self, own_addr: &MacAddr, bssid: &Bssid) -> HandshakeAddrs {
        if self.is_initiator {
            HandshakeAddrs { initiator: *own_addr, responder: self.peer_addr, bssid: *bssid }
        } else {
            HandshakeAddrs { initiator: self.peer_addr, responder: *own_addr, bssid: *bssid }
        }
    }
}

impl Drop for TdlsEntry {
    fn drop(&mut self) {
        self.anonce.zeroize();
        self.snonce.zeroize();
    }
}

/// Fixed-capacity table of TDLS entries, at most one per peer.
pub struct EntryStore {
    entries: Slab<TdlsEntry>,
    capacity: usize,
}

impl EntryStore {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Slab::with_capacity(capacity), capacity }
    }

    pub fn find(&self, peer: &MacAddr) -> Option<EntryId> {
        self.entries.iter().find(|(_, entry)| entry.peer_addr == *peer).map(|(id, _)| EntryId(id))
    }

    pub fn allocate(&mut self, peer: MacAddr) -> Result<EntryId, Error> {
        if self.find(&peer).is_some() {
            return Err(Error::DuplicatePeer);
        }
        if self.is_full() {
            return Err(Error::TableFull);
        }
        Ok(EntryId(self.entries.insert(TdlsEntry::new(peer))))
    }

    pub fn release(&mut self, id: EntryId) -> Option<TdlsEntry> {
        if self.entries.contains(id.0) {
            Some(self.entries.remove(id.0))
        } else {
            None
        }
    }

    pub fn get(&self, id: EntryId) -> Option<&TdlsEntry> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut TdlsEntry> {
        self.entries.get_mut(id.0)
    }

    pub fn by_peer(&self, peer: &MacAddr) -> Option<&TdlsEntry> {
        self.find(peer).and_then(|id| self.get(id))
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|(id, _)| EntryId(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}
