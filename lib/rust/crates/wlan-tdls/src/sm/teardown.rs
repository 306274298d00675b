// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{link_id_element, TdlsSm},
    crate::{
        device::DeviceOps,
        error::Error,
        frame::{Elements, TdlsAction, Teardown},
        key::{build_teardown_ftie, validate_link_id, verify_teardown},
        mac::{MacAddr, MacFmt, ReasonCode},
        store::{EntryId, LinkStatus},
    },
    log::{error, info},
    zerocopy::AsBytes,
};

impl<D: DeviceOps> TdlsSm<D> {
    /// Tears down the link to `peer`. A Teardown frame is only sent for an established link;
    /// pending handshakes are abandoned silently. Unknown peers are ignored.
    pub(super) fn teardown(&mut self, peer: &MacAddr, reason: ReasonCode) -> Result<(), Error> {
        let id = match self.store.find(peer) {
            Some(id) => id,
            None => {
                info!("no TDLS link to {}", peer.to_mac_str());
                return Ok(());
            }
        };
        // IEEE Std 802.11-2016, 11.23.5: an unreachable peer is notified through the AP.
        let via_ap = reason == ReasonCode::TDLS_PEER_UNREACHABLE;
        self.send_teardown_if_connected(id, reason, via_ap);
        self.reset_entry(id);
        Ok(())
    }

    pub(super) fn teardown_all(&mut self, direct: bool) {
        let (reason, via_ap) = if direct {
            (ReasonCode::TDLS_UNSPECIFIED_REASON, false)
        } else {
            (ReasonCode::TDLS_PEER_UNREACHABLE, true)
        };
        for id in self.store.ids() {
            self.send_teardown_if_connected(id, reason, via_ap);
            self.reset_entry(id);
        }
        self.timer.cancel_all();
        self.auto_link.clear();
    }

    fn send_teardown_if_connected(&mut self, id: EntryId, reason: ReasonCode, via_ap: bool) {
        let peer = match self.store.get(id) {
            Some(entry) if entry.status.is_established() => entry.peer_addr,
            _ => return,
        };
        if let Err(e) = self.send_teardown(id, reason, via_ap) {
            error!("failed to send teardown to {}: {}", peer.to_mac_str(), e);
        }
    }

    // IEEE Std 802.11-2016, 9.6.13.5
    fn send_teardown(
        &mut self,
        id: EntryId,
        reason: ReasonCode,
        via_ap: bool,
    ) -> Result<(), Error> {
        let entry = self.store.get(id).ok_or(Error::UnknownPeer)?;
        let peer = entry.peer_addr;
        let link_id = entry.handshake_addrs(&self.own_addr, &self.bssid).link_id();
        let mut elements = Elements { link_id: link_id_element(&link_id), ..Default::default() };
        if let Some(tpk) = entry.tpk.as_ref().filter(|_| self.config.security_enabled) {
            let ftie = build_teardown_ftie(
                tpk,
                &link_id,
                reason,
                entry.dialog_token,
                &entry.anonce,
                &entry.snonce,
            )?;
            elements.ftie = Some(ftie.as_bytes().to_vec());
        }
        info!("tearing down link to {}, reason {}", peer.to_mac_str(), reason.0);
        self.send_action(peer, TdlsAction::Teardown(Teardown { reason, elements }), via_ap)
    }

    pub(super) fn on_teardown(&mut self, peer: MacAddr, teardown: Teardown) -> Result<(), Error> {
        let id = self.store.find(&peer).ok_or(Error::UnknownPeer)?;
        let link_id = validate_link_id(teardown.elements.link_id.as_deref(), &self.bssid)?;
        let entry = self.store.get(id).ok_or(Error::UnknownPeer)?;
        if link_id != entry.handshake_addrs(&self.own_addr, &self.bssid).link_id() {
            return Err(Error::InvalidState);
        }
        if entry.status == LinkStatus::Connected && self.config.security_enabled {
            if let Some(tpk) = entry.tpk.as_ref() {
                let token = entry.dialog_token;
                verify_teardown(&teardown.elements, tpk, &link_id, teardown.reason, token)?;
            }
        }

        info!("{} tore down the link, reason {}", peer.to_mac_str(), teardown.reason.0);
        self.reset_entry(id);
        if self.auto_link.enabled() {
            self.auto_link.on_peer_teardown(&peer);
        }
        Ok(())
    }
}
