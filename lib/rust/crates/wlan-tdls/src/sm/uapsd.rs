// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{link_id_element, TdlsSm},
    crate::{
        device::DeviceOps,
        error::Error,
        event::TrafficResponseTimeout,
        frame::{Elements, PeerTrafficIndication, PeerTrafficResponse, TdlsAction},
        ie::PuBufferStatus,
        key::validate_link_id_for,
        mac::{MacAddr, MacFmt, ReasonCode},
        store::LinkStatus,
        timer::EventId,
    },
    log::{info, warn},
};

// IEEE Std 802.11-2016, 11.2.3.14: Peer U-APSD.
impl<D: DeviceOps> TdlsSm<D> {
    /// Tells a sleeping peer that traffic is buffered for it. The indication goes through the
    /// AP and the link is torn down if no Peer Traffic Response arrives in time.
    pub(super) fn send_traffic_indication(
        &mut self,
        peer: MacAddr,
        buffer_status: PuBufferStatus,
    ) -> Result<(), Error> {
        let id = self.store.find(&peer).ok_or(Error::UnknownPeer)?;
        let link_id = match self.store.get(id) {
            Some(entry) if entry.status.is_established() => {
                entry.handshake_addrs(&self.own_addr, &self.bssid).link_id()
            }
            _ => return Err(Error::InvalidState),
        };
        let token = self.tokens.next();
        let elements = Elements {
            link_id: link_id_element(&link_id),
            pu_buffer_status: Some(vec![buffer_status.value()]),
            ..Default::default()
        };
        let ind = PeerTrafficIndication { token, elements };
        self.send_action(peer, TdlsAction::PeerTrafficIndication(ind), true)?;

        if let Some(entry) = self.store.get_mut(id) {
            entry.awaiting_traffic_response = true;
        }
        self.arm_timeout(id, TrafficResponseTimeout { peer }.into());
        Ok(())
    }

    pub(super) fn on_traffic_indication(
        &mut self,
        peer: MacAddr,
        ind: PeerTrafficIndication,
    ) -> Result<(), Error> {
        let addrs = match self.store.by_peer(&peer) {
            Some(entry) if entry.status == LinkStatus::Connected => {
                entry.handshake_addrs(&self.own_addr, &self.bssid)
            }
            _ => return Err(Error::InvalidState),
        };
        let link_id = validate_link_id_for(ind.elements.link_id.as_deref(), &addrs)?;
        let elements = Elements { link_id: link_id_element(&link_id), ..Default::default() };
        let rsp = PeerTrafficResponse { token: ind.token, elements };
        self.send_action(peer, TdlsAction::PeerTrafficResponse(rsp), false)
    }

    pub(super) fn on_traffic_response(
        &mut self,
        peer: MacAddr,
        _rsp: PeerTrafficResponse,
    ) -> Result<(), Error> {
        let id = self.store.find(&peer).ok_or(Error::UnknownPeer)?;
        let awaiting = self.store.get(id).map_or(false, |entry| entry.awaiting_traffic_response);
        if !awaiting {
            return Err(Error::InvalidState);
        }
        self.cancel_timeout(id);
        if let Some(entry) = self.store.get_mut(id) {
            entry.awaiting_traffic_response = false;
        }
        Ok(())
    }

    pub(super) fn on_traffic_response_timeout(
        &mut self,
        event_id: EventId,
        timeout: TrafficResponseTimeout,
    ) {
        let id = match self.store.find(&timeout.peer) {
            Some(id) => id,
            None => return,
        };
        let expired = self.store.get_mut(id).map_or(false, |entry| {
            let expired = entry.status.is_established()
                && entry.awaiting_traffic_response
                && entry.timeout == Some(event_id);
            if expired {
                entry.timeout = None;
            }
            expired
        });
        if !expired {
            warn!("stale traffic response timeout for {}", timeout.peer.to_mac_str());
            return;
        }
        info!("no Peer Traffic Response from {}", timeout.peer.to_mac_str());
        if let Err(e) = self.teardown(&timeout.peer, ReasonCode::TDLS_PEER_UNREACHABLE) {
            warn!("failed to tear down link to {}: {}", timeout.peer.to_mac_str(), e);
        }
    }
}
