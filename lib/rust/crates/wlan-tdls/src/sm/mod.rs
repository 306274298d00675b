// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod discovery;
mod setup;
mod teardown;
mod uapsd;

use {
    crate::{
        autolink::AutoLink,
        config::TdlsConfig,
        device::{CipherSuite, DeviceOps, KeyConfig},
        error::Error,
        event::Event,
        frame::{DiscoveryResponse, Elements, TdlsAction, TdlsFrame},
        ie::{LinkIdentifier, PuBufferStatus},
        mac::{Bssid, MacAddr, MacFmt, ReasonCode},
        store::{EntryId, EntryStore, LinkStatus, TdlsEntry},
        timer::{EventId, Scheduler, Timer},
    },
    log::{error, info, warn},
    std::sync::Arc,
    zerocopy::AsBytes,
};

/// Requests from the station management entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MlmeRequest {
    Setup { peer: MacAddr },
    Teardown { peer: MacAddr, reason: ReasonCode },
    /// Tears down every link, over the direct link or through the AP.
    TeardownAll { direct: bool },
    Discovery { peer: MacAddr },
    PeerTrafficIndication { peer: MacAddr, ac_bitmap: u8 },
}

/// Session-wide dialog token source. Zero is never handed out.
#[derive(Debug, Default)]
struct DialogTokens(u8);

impl DialogTokens {
    fn next(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        if self.0 == 0 {
            self.0 = 1;
        }
        self.0
    }
}

/// TDLS link management for one station interface. Every input runs to completion; timer
/// fires come back through `handle_timeout`.
pub struct TdlsSm<D> {
    config: TdlsConfig,
    own_addr: MacAddr,
    bssid: Bssid,
    device: D,
    store: EntryStore,
    timer: Timer<Event>,
    tokens: DialogTokens,
    auto_link: Arc<AutoLink>,
}

impl<D: DeviceOps> TdlsSm<D> {
    pub fn new(
        config: TdlsConfig,
        own_addr: MacAddr,
        bssid: Bssid,
        device: D,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        let auto_link = Arc::new(AutoLink::new(config.auto_link.clone()));
        Self {
            store: EntryStore::new(config.max_entries),
            config,
            own_addr,
            bssid,
            device,
            timer: Timer::new(scheduler),
            tokens: DialogTokens::default(),
            auto_link,
        }
    }

    pub fn handle_mlme_request(&mut self, req: MlmeRequest) -> Result<(), Error> {
        match req {
            MlmeRequest::Setup { peer } => self.start_setup(peer),
            MlmeRequest::Teardown { peer, reason } => self.teardown(&peer, reason),
            MlmeRequest::TeardownAll { direct } => {
                self.teardown_all(direct);
                Ok(())
            }
            MlmeRequest::Discovery { peer } => self.send_discovery_request(peer),
            MlmeRequest::PeerTrafficIndication { peer, ac_bitmap } => {
                self.send_traffic_indication(peer, PuBufferStatus::from_ac_bitmap(ac_bitmap))
            }
        }
    }

    /// Handles an Ethernet frame with the TDLS EtherType addressed to this station.
    pub fn on_eth_frame(&mut self, bytes: &[u8]) {
        let frame = match TdlsFrame::parse(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping TDLS frame: {}", e);
                return;
            }
        };
        if frame.da != self.own_addr || frame.sa == self.own_addr {
            warn!(
                "dropping TDLS frame from {} to {}",
                frame.sa.to_mac_str(),
                frame.da.to_mac_str()
            );
            return;
        }
        let peer = frame.sa;
        let result = match frame.action {
            TdlsAction::SetupRequest(req) => self.on_setup_request(peer, req),
            TdlsAction::SetupResponse(rsp) => self.on_setup_response(peer, rsp),
            TdlsAction::SetupConfirm(cfm) => self.on_setup_confirm(peer, cfm),
            TdlsAction::Teardown(teardown) => self.on_teardown(peer, teardown),
            TdlsAction::PeerTrafficIndication(ind) => self.on_traffic_indication(peer, ind),
            TdlsAction::PeerTrafficResponse(rsp) => self.on_traffic_response(peer, rsp),
            TdlsAction::DiscoveryRequest(req) => self.on_discovery_request(peer, req),
        };
        log_result(&peer, result);
    }

    /// Handles a public action frame. Only TDLS Discovery Responses are of interest.
    pub fn on_public_action(&mut self, src: MacAddr, body: &[u8], rssi: i8) {
        let rsp = match DiscoveryResponse::parse_public_action_body(body) {
            Ok(rsp) => rsp,
            Err(e) => {
                warn!("dropping public action from {}: {}", src.to_mac_str(), e);
                return;
            }
        };
        let result = self.on_discovery_response(src, rsp, rssi);
        log_result(&src, result);
    }

    pub fn handle_timeout(&mut self, event_id: EventId) {
        match self.timer.triggered(&event_id) {
            Some(Event::SetupTimeout(timeout)) => self.on_setup_timeout(event_id, timeout),
            Some(Event::TrafficResponseTimeout(timeout)) => {
                self.on_traffic_response_timeout(event_id, timeout)
            }
            None => (),
        }
    }

    pub fn link_status(&self, peer: &MacAddr) -> LinkStatus {
        self.store.by_peer(peer).map_or(LinkStatus::None, |entry| entry.status)
    }

    pub fn entry(&self, peer: &MacAddr) -> Option<&TdlsEntry> {
        self.store.by_peer(peer)
    }

    pub fn auto_link(&self) -> Arc<AutoLink> {
        Arc::clone(&self.auto_link)
    }

    pub fn own_addr(&self) -> &MacAddr {
        &self.own_addr
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn send_action(
        &mut self,
        peer: MacAddr,
        action: TdlsAction,
        via_ap: bool,
    ) -> Result<(), Error> {
        let bytes = TdlsFrame::new(peer, self.own_addr, action).to_bytes()?;
        self.device.send_frame(bytes, via_ap)
    }

    /// Sends a frame whose delivery does not affect the link state.
    fn send_or_log(&mut self, peer: MacAddr, action: TdlsAction, via_ap: bool) {
        if let Err(e) = self.send_action(peer, action, via_ap) {
            error!("failed to send TDLS frame to {}: {}", peer.to_mac_str(), e);
        }
    }

    /// Elements describing our own capabilities.
    fn capability_elements(&self) -> Elements {
        Elements {
            supported_rates: Some(self.config.supported_rates.clone()),
            ext_supported_rates: Some(self.config.ext_supported_rates.clone())
                .filter(|rates| !rates.is_empty()),
            ext_capabilities: self.config.ext_capabilities.clone(),
            qos_capability: self.config.qos_info.map(|qos| vec![qos]),
            ht_capabilities: self.config.ht_capabilities.map(|ht| ht.to_vec()),
            ..Default::default()
        }
    }

    fn arm_timeout(&mut self, id: EntryId, event: Event) {
        let timeout = match event {
            Event::SetupTimeout(_) => self.config.setup_timeout,
            Event::TrafficResponseTimeout(_) => self.config.traffic_response_timeout,
        };
        self.cancel_timeout(id);
        let event_id = self.timer.schedule_after(timeout, event);
        if let Some(entry) = self.store.get_mut(id) {
            entry.timeout = Some(event_id);
        }
    }

    fn cancel_timeout(&mut self, id: EntryId) {
        if let Some(event_id) = self.store.get_mut(id).and_then(|entry| entry.timeout.take()) {
            self.timer.cancel_event(event_id);
        }
    }

    /// Returns the entry to `None`: the timer is cancelled, the key and MAC table entry are
    /// removed and the key material is cleared.
    fn reset_entry(&mut self, id: EntryId) {
        self.cancel_timeout(id);
        let entry = match self.store.release(id) {
            Some(entry) => entry,
            None => return,
        };
        if let Some(wcid) = entry.wcid {
            if let Err(e) = self.device.clear_peer(wcid, &entry.peer_addr) {
                error!("failed to remove TDLS peer {}: {}", entry.peer_addr.to_mac_str(), e);
            }
        }
        info!("TDLS link to {}: {:?} -> None", entry.peer_addr.to_mac_str(), entry.status);
    }

    fn set_status(&mut self, id: EntryId, status: LinkStatus) {
        if let Some(entry) = self.store.get_mut(id) {
            let peer = entry.peer_addr.to_mac_str();
            info!("TDLS link to {}: {:?} -> {:?}", peer, entry.status, status);
            entry.status = status;
        }
    }

    /// Programs the peer and its key into the device and completes the link. If the peer
    /// cannot be programmed the entry is reset.
    fn install_link(&mut self, id: EntryId) -> Result<(), Error> {
        let (peer, caps) = match self.store.get(id) {
            Some(entry) => (entry.peer_addr, entry.peer_caps.clone()),
            None => return Err(Error::UnknownPeer),
        };
        let wcid = match self.device.configure_peer(&peer, &caps) {
            Ok(wcid) => wcid,
            Err(e) => {
                error!("failed to add TDLS peer {}: {}", peer.to_mac_str(), e);
                self.reset_entry(id);
                return Err(e);
            }
        };
        let tk = self.store.get_mut(id).and_then(|entry| {
            entry.wcid = Some(wcid);
            entry.tpk.as_ref().map(|tpk| tpk.tk().to_vec())
        });
        if let Some(key) = tk.filter(|_| self.config.security_enabled) {
            let key = KeyConfig { peer, wcid, cipher: CipherSuite::Ccmp128, key };
            if let Err(e) = self.device.set_key(key) {
                error!("failed to install key for {}: {}", peer.to_mac_str(), e);
            }
        }
        self.set_status(id, LinkStatus::Connected);
        if self.auto_link.enabled() {
            self.auto_link.on_connected(&peer);
        }
        Ok(())
    }
}

fn link_id_element(link_id: &LinkIdentifier) -> Option<Vec<u8>> {
    Some(link_id.as_bytes().to_vec())
}

fn log_result(peer: &MacAddr, result: Result<(), Error>) {
    match result {
        Ok(()) => (),
        Err(Error::MicMismatch) => error!("TDLS handshake with {} aborted", peer.to_mac_str()),
        Err(e @ Error::Status(_)) => {
            info!("TDLS frame from {} rejected: {}", peer.to_mac_str(), e)
        }
        Err(e @ Error::Device(_)) | Err(e @ Error::Crypto(_)) => {
            error!("TDLS frame from {}: {}", peer.to_mac_str(), e)
        }
        Err(e) => warn!("dropping TDLS frame from {}: {}", peer.to_mac_str(), e),
    }
}
