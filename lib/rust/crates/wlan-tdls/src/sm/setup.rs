// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{link_id_element, TdlsSm},
    crate::{
        device::{DeviceOps, PeerCapabilities},
        error::Error,
        event::SetupTimeout,
        frame::{Elements, SetupConfirm, SetupRequest, SetupResponse, TdlsAction},
        ie::{LinkIdentifier, NONCE_LEN},
        key::{
            build_msg1, build_msg2, build_msg3, generate_nonce, validate_link_id_for,
            validate_msg1, validate_msg2, validate_msg3, HandshakeAddrs, Msg1, Tpk,
        },
        mac::{MacAddr, MacFmt, StatusCode},
        store::{EntryId, LinkStatus},
        timer::EventId,
    },
    log::{info, warn},
};

impl<D: DeviceOps> TdlsSm<D> {
    /// Starts a handshake as initiator. The request is relayed by the AP.
    pub(super) fn start_setup(&mut self, peer: MacAddr) -> Result<(), Error> {
        if peer == self.own_addr {
            return Err(Error::InvalidState);
        }
        if self.store.find(&peer).is_some() {
            warn!("TDLS entry for {} already exists", peer.to_mac_str());
            return Err(Error::DuplicatePeer);
        }
        let id = self.store.allocate(peer)?;

        let token = self.tokens.next();
        let key_lifetime = self.config.key_lifetime;
        let snonce = if self.config.security_enabled { generate_nonce() } else { [0; NONCE_LEN] };
        if let Some(entry) = self.store.get_mut(id) {
            entry.is_initiator = true;
            entry.dialog_token = token;
            entry.snonce = snonce;
            entry.key_lifetime = key_lifetime;
        }

        let mut elements = self.capability_elements();
        if self.config.security_enabled {
            build_msg1(&snonce, key_lifetime).apply(&mut elements);
        }
        let link_id =
            LinkIdentifier { bssid: self.bssid, initiator: self.own_addr, responder: peer };
        elements.link_id = link_id_element(&link_id);
        let req = SetupRequest { token, capability_info: self.config.capability_info, elements };
        if let Err(e) = self.send_action(peer, TdlsAction::SetupRequest(req), true) {
            self.reset_entry(id);
            return Err(e);
        }

        self.set_status(id, LinkStatus::WaitResponse);
        self.arm_timeout(id, SetupTimeout { peer, token }.into());
        Ok(())
    }

    // IEEE Std 802.11-2016, 11.23.4
    pub(super) fn on_setup_request(
        &mut self,
        peer: MacAddr,
        req: SetupRequest,
    ) -> Result<(), Error> {
        let token = req.token;
        let addrs = HandshakeAddrs { initiator: peer, responder: self.own_addr, bssid: self.bssid };
        let msg1 = match self.check_setup_request(&peer, &addrs, &req) {
            Ok(msg1) => msg1,
            Err(status) => {
                self.send_setup_failure(peer, token, status);
                return Err(status.into());
            }
        };
        // The existing entry is only replaced once the request is known to be acceptable.
        if let Some(id) = self.store.find(&peer) {
            self.replace_existing(id, token)?;
        }

        let id = match self.store.allocate(peer) {
            Ok(id) => id,
            Err(e) => {
                self.send_setup_failure(peer, token, e.status_code());
                return Err(e);
            }
        };

        let mut elements = self.capability_elements();
        if let Some(msg1) = msg1 {
            let anonce = generate_nonce();
            let derived = Tpk::derive(&peer, &self.own_addr, &anonce, &msg1.snonce, &self.bssid)
                .and_then(|tpk| {
                    build_msg2(&tpk, &addrs, &anonce, &msg1.snonce, msg1.key_lifetime)
                        .map(|security| (tpk, security))
                });
            let (tpk, security) = match derived {
                Ok(derived) => derived,
                Err(e) => {
                    self.reset_entry(id);
                    self.send_setup_failure(peer, token, e.status_code());
                    return Err(e);
                }
            };
            security.apply(&mut elements);
            if let Some(entry) = self.store.get_mut(id) {
                entry.anonce = anonce;
                entry.snonce = msg1.snonce;
                entry.tpk = Some(tpk);
                entry.key_lifetime = msg1.key_lifetime;
            }
        }
        if let Some(entry) = self.store.get_mut(id) {
            entry.is_initiator = false;
            entry.dialog_token = token;
            entry.peer_caps = PeerCapabilities::from_elements(req.capability_info, &req.elements);
        }

        elements.link_id = link_id_element(&addrs.link_id());
        let rsp = SetupResponse {
            status: StatusCode::SUCCESS,
            token,
            capability_info: self.config.capability_info,
            elements,
        };
        if let Err(e) = self.send_action(peer, TdlsAction::SetupResponse(rsp), true) {
            self.reset_entry(id);
            return Err(e);
        }

        self.set_status(id, LinkStatus::WaitConfirm);
        self.arm_timeout(id, SetupTimeout { peer, token }.into());
        Ok(())
    }

    /// Runs every policy check on a Setup Request without touching the entry store. Returns
    /// the security parameters of message 1 when security is enabled.
    fn check_setup_request(
        &self,
        peer: &MacAddr,
        addrs: &HandshakeAddrs,
        req: &SetupRequest,
    ) -> Result<Option<Msg1>, StatusCode> {
        validate_link_id_for(req.elements.link_id.as_deref(), addrs)?;
        if self.auto_link.enabled() && self.auto_link.is_black_listed(peer) {
            info!("declining setup from black-listed peer {}", peer.to_mac_str());
            return Err(StatusCode::REQUEST_DECLINED);
        }
        if self.config.security_enabled {
            validate_msg1(&req.elements).map(Some)
        } else if req.elements.rsne.is_some() {
            Err(StatusCode::SECURITY_DISABLED)
        } else {
            Ok(None)
        }
    }

    /// Decides whether a Setup Request may replace the peer's existing entry. Returns an error
    /// when the request must be dropped.
    fn replace_existing(&mut self, id: EntryId, token: u8) -> Result<(), Error> {
        let (peer, status, is_initiator, current_token) = match self.store.get(id) {
            Some(entry) => (entry.peer_addr, entry.status, entry.is_initiator, entry.dialog_token),
            None => return Ok(()),
        };
        match status {
            // IEEE Std 802.11-2016, 11.23.4: the station with the lower MAC address stays
            // initiator.
            LinkStatus::WaitResponse if peer < self.own_addr => {
                info!("setup collision with {}; continuing as responder", peer.to_mac_str());
                self.reset_entry(id);
                Ok(())
            }
            LinkStatus::WaitResponse => {
                info!("setup collision with {}; keeping own request", peer.to_mac_str());
                Err(Error::InvalidState)
            }
            LinkStatus::Connected if is_initiator => {
                info!("{} restarted setup; tearing down existing link", peer.to_mac_str());
                self.reset_entry(id);
                Ok(())
            }
            _ if current_token == token => Err(Error::DuplicatePeer),
            LinkStatus::Connected | LinkStatus::WaitConfirm | LinkStatus::None => {
                info!("{} restarted setup with token {}", peer.to_mac_str(), token);
                self.reset_entry(id);
                Ok(())
            }
        }
    }

    fn send_setup_failure(&mut self, peer: MacAddr, token: u8, status: StatusCode) {
        let link_id =
            LinkIdentifier { bssid: self.bssid, initiator: peer, responder: self.own_addr };
        let rsp = SetupResponse {
            status,
            token,
            capability_info: 0,
            elements: Elements { link_id: link_id_element(&link_id), ..Default::default() },
        };
        info!("rejecting setup from {} with status {}", peer.to_mac_str(), status.0);
        self.send_or_log(peer, TdlsAction::SetupResponse(rsp), true);
    }

    pub(super) fn on_setup_response(
        &mut self,
        peer: MacAddr,
        rsp: SetupResponse,
    ) -> Result<(), Error> {
        let id = self.store.find(&peer).ok_or(Error::UnknownPeer)?;
        let (status, token) = match self.store.get(id) {
            Some(entry) => (entry.status, entry.dialog_token),
            None => return Err(Error::UnknownPeer),
        };
        if status != LinkStatus::WaitResponse {
            return Err(Error::InvalidState);
        }
        if rsp.token != token {
            return Err(Error::TokenMismatch(token, rsp.token));
        }

        self.cancel_timeout(id);
        if !rsp.status.is_success() {
            info!("{} declined setup with status {}", peer.to_mac_str(), rsp.status.0);
            self.reset_entry(id);
            return Ok(());
        }

        match self.accept_setup_response(id, &rsp) {
            Ok(elements) => {
                let cfm = SetupConfirm { status: StatusCode::SUCCESS, token, elements };
                if let Err(e) = self.send_action(peer, TdlsAction::SetupConfirm(cfm), true) {
                    self.reset_entry(id);
                    return Err(e);
                }
                self.install_link(id)
            }
            Err(Error::Status(status)) => {
                self.send_confirm_failure(id, status);
                self.reset_entry(id);
                Err(status.into())
            }
            Err(e) => {
                self.reset_entry(id);
                Err(e)
            }
        }
    }

    /// Validates message 2 and returns the elements of the Setup Confirm.
    fn accept_setup_response(
        &mut self,
        id: EntryId,
        rsp: &SetupResponse,
    ) -> Result<Elements, Error> {
        let entry = self.store.get_mut(id).ok_or(Error::UnknownPeer)?;
        let addrs = entry.handshake_addrs(&self.own_addr, &self.bssid);
        validate_link_id_for(rsp.elements.link_id.as_deref(), &addrs)?;
        entry.peer_caps = PeerCapabilities::from_elements(rsp.capability_info, &rsp.elements);

        let mut elements = Elements::default();
        if self.config.security_enabled {
            let msg2 =
                validate_msg2(&rsp.elements, &addrs, &entry.snonce, self.config.min_key_lifetime)?;
            let security =
                build_msg3(&msg2.tpk, &addrs, &msg2.anonce, &entry.snonce, msg2.key_lifetime)?;
            security.apply(&mut elements);
            entry.anonce = msg2.anonce;
            entry.key_lifetime = msg2.key_lifetime;
            entry.tpk = Some(msg2.tpk);
        } else if rsp.elements.rsne.is_some() {
            return Err(StatusCode::SECURITY_DISABLED.into());
        }
        elements.wmm_parameter = self.config.wmm_parameter.clone();
        // IEEE Std 802.11-2016, 9.6.13.4: HT Operation is present when both peers are HT.
        if entry.peer_caps.ht_capabilities.is_some() && self.config.ht_capabilities.is_some() {
            elements.ht_operation = self.config.ht_operation.map(|ht| ht.to_vec());
        }
        elements.link_id = link_id_element(&addrs.link_id());
        Ok(elements)
    }

    fn send_confirm_failure(&mut self, id: EntryId, status: StatusCode) {
        let (peer, token, link_id) = match self.store.get(id) {
            Some(entry) => (
                entry.peer_addr,
                entry.dialog_token,
                entry.handshake_addrs(&self.own_addr, &self.bssid).link_id(),
            ),
            None => return,
        };
        let cfm = SetupConfirm {
            status,
            token,
            elements: Elements { link_id: link_id_element(&link_id), ..Default::default() },
        };
        self.send_or_log(peer, TdlsAction::SetupConfirm(cfm), true);
    }

    pub(super) fn on_setup_confirm(
        &mut self,
        peer: MacAddr,
        cfm: SetupConfirm,
    ) -> Result<(), Error> {
        let id = self.store.find(&peer).ok_or(Error::UnknownPeer)?;
        let (status, token) = match self.store.get(id) {
            Some(entry) => (entry.status, entry.dialog_token),
            None => return Err(Error::UnknownPeer),
        };
        if status == LinkStatus::Connected && cfm.token == token {
            info!("ignoring repeated Setup Confirm from {}", peer.to_mac_str());
            return Ok(());
        }
        if status != LinkStatus::WaitConfirm {
            self.reset_entry(id);
            return Err(Error::InvalidState);
        }
        if cfm.token != token {
            return Err(Error::TokenMismatch(token, cfm.token));
        }

        self.cancel_timeout(id);
        if !cfm.status.is_success() {
            info!("{} aborted setup with status {}", peer.to_mac_str(), cfm.status.0);
            self.reset_entry(id);
            return Ok(());
        }
        if let Err(e) = self.accept_setup_confirm(id, &cfm) {
            self.reset_entry(id);
            return Err(e);
        }
        self.install_link(id)
    }

    fn accept_setup_confirm(&self, id: EntryId, cfm: &SetupConfirm) -> Result<(), Error> {
        let entry = self.store.get(id).ok_or(Error::UnknownPeer)?;
        let addrs = entry.handshake_addrs(&self.own_addr, &self.bssid);
        validate_link_id_for(cfm.elements.link_id.as_deref(), &addrs)?;
        if !self.config.security_enabled {
            return Ok(());
        }
        let tpk = entry.tpk.as_ref().ok_or(Error::InvalidState)?;
        validate_msg3(&cfm.elements, &addrs, tpk, &entry.anonce, &entry.snonce, entry.key_lifetime)
    }

    /// Abandons a handshake that is still pending. Setup is not retried.
    pub(super) fn on_setup_timeout(&mut self, event_id: EventId, timeout: SetupTimeout) {
        let id = match self.store.find(&timeout.peer) {
            Some(id) => id,
            None => return,
        };
        let expired = self.store.get_mut(id).map_or(false, |entry| {
            let expired = entry.status.is_pending()
                && entry.dialog_token == timeout.token
                && entry.timeout == Some(event_id);
            if expired {
                entry.timeout = None;
            }
            expired
        });
        if expired {
            info!("TDLS setup with {} timed out", timeout.peer.to_mac_str());
            self.reset_entry(id);
        } else {
            warn!("stale setup timeout for {}", timeout.peer.to_mac_str());
        }
    }
}
