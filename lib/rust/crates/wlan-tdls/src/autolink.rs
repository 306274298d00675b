// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        config::AutoLinkConfig,
        mac::{MacAddr, MacFmt},
    },
    log::info,
    parking_lot::Mutex,
    std::collections::HashMap,
};

/// Exponentially weighted moving average of a peer's signal strength, kept as an f64 so that
/// small updates still move the average.
#[derive(Clone, Debug, PartialEq)]
pub struct EwmaRssi {
    current: f64,
    weighting_factor: f64,
}

impl EwmaRssi {
    pub fn new(n: u8, initial_dbm: i8) -> Self {
        Self { current: initial_dbm.into(), weighting_factor: n.into() }
    }

    pub fn dbm(&self) -> i8 {
        self.current.round() as i8
    }

    pub fn update_average(&mut self, dbm: i8) {
        let weight = 2.0 / (1.0 + self.weighting_factor);
        self.current = weight * f64::from(dbm) + (1.0 - weight) * self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Idle,
    FirstTime,
    ToSetup,
    ToSetupFail,
    ToSetupDone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryPeer {
    pub state: DiscoveryState,
    pub avg_rssi: Option<EwmaRssi>,
    pub last_rssi: Option<i8>,
    pub retry_count: u8,
    pub connected: bool,
    pub connected_first_time: bool,
}

impl DiscoveryPeer {
    fn new() -> Self {
        Self {
            state: DiscoveryState::Idle,
            avg_rssi: None,
            last_rssi: None,
            retry_count: 0,
            connected: false,
            connected_first_time: false,
        }
    }

    fn avg_dbm(&self) -> Option<i8> {
        self.avg_rssi.as_ref().map(EwmaRssi::dbm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackListReason {
    /// The peer tore the link down; its setup requests are declined.
    ByTeardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLinkAction {
    None,
    Setup(MacAddr),
    Teardown(MacAddr),
}

/// Signal-driven link decisions. Shared between the state machine and whoever discovers peers,
/// so each list sits behind its own lock and no lock is held across calls out.
pub struct AutoLink {
    config: AutoLinkConfig,
    discovery: Mutex<HashMap<MacAddr, DiscoveryPeer>>,
    black_list: Mutex<HashMap<MacAddr, BlackListReason>>,
}

impl AutoLink {
    pub fn new(config: AutoLinkConfig) -> Self {
        Self {
            config,
            discovery: Mutex::new(HashMap::new()),
            black_list: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Records that a Discovery Request was sent to `peer`. For a connected peer this starts
    /// a new round of teardown samples.
    pub fn on_local_discovery(&self, peer: &MacAddr) {
        let mut discovery = self.discovery.lock();
        let entry = discovery.entry(*peer).or_insert_with(DiscoveryPeer::new);
        if entry.connected && entry.retry_count == 0 {
            entry.retry_count = self.config.teardown_retry_count;
        }
    }

    /// Decides on a link from a Discovery Response. `link_exists` tells whether the state
    /// machine already holds an entry for the peer.
    pub fn on_discovery_response(
        &self,
        peer: &MacAddr,
        rssi: i8,
        link_exists: bool,
    ) -> AutoLinkAction {
        if !self.config.enabled {
            return AutoLinkAction::None;
        }
        let (action, now_connected) = {
            let mut discovery = self.discovery.lock();
            let entry = match discovery.get_mut(peer) {
                Some(entry) => entry,
                None => {
                    info!("no discovery entry for {}", peer.to_mac_str());
                    return AutoLinkAction::None;
                }
            };
            entry.last_rssi = Some(rssi);
            let was_connected = entry.connected;
            let action = if was_connected {
                self.connected_peer_sample(entry, peer, rssi)
            } else {
                self.new_peer_sample(entry, peer, rssi, link_exists)
            };
            let now_connected = !was_connected && entry.connected;
            if let AutoLinkAction::Teardown(_) = action {
                discovery.remove(peer);
            }
            (action, now_connected)
        };
        if now_connected {
            self.black_list.lock().remove(peer);
        }
        action
    }

    fn connected_peer_sample(
        &self,
        entry: &mut DiscoveryPeer,
        peer: &MacAddr,
        rssi: i8,
    ) -> AutoLinkAction {
        let threshold = self.config.teardown_rssi_threshold;
        match entry.retry_count {
            1 if entry.connected_first_time => {
                entry.avg_rssi = Some(EwmaRssi::new(self.config.ewma_weight, rssi));
                entry.retry_count -= 1;
                entry.connected_first_time = false;
                AutoLinkAction::None
            }
            1 => {
                let weak_avg = entry.avg_dbm().map_or(true, |avg| avg < threshold);
                if rssi < threshold && weak_avg {
                    info!("signal of {} below {} dBm; tearing down", peer.to_mac_str(), threshold);
                    AutoLinkAction::Teardown(*peer)
                } else {
                    self.record(entry, rssi);
                    entry.retry_count -= 1;
                    AutoLinkAction::None
                }
            }
            n if n > 1 => {
                if rssi < threshold {
                    info!("signal of {} below {} dBm; tearing down", peer.to_mac_str(), threshold);
                    AutoLinkAction::Teardown(*peer)
                } else {
                    self.record(entry, rssi);
                    entry.retry_count = 0;
                    AutoLinkAction::None
                }
            }
            _ => AutoLinkAction::None,
        }
    }

    fn new_peer_sample(
        &self,
        entry: &mut DiscoveryPeer,
        peer: &MacAddr,
        rssi: i8,
        link_exists: bool,
    ) -> AutoLinkAction {
        match entry.state {
            DiscoveryState::Idle => {
                entry.state = DiscoveryState::FirstTime;
                entry.avg_rssi = Some(EwmaRssi::new(self.config.ewma_weight, rssi));
                AutoLinkAction::None
            }
            DiscoveryState::FirstTime => {
                let threshold = self.config.setup_rssi_threshold;
                let strong_avg = entry.avg_dbm().map_or(false, |avg| avg > threshold);
                self.record(entry, rssi);
                if !(strong_avg && rssi > threshold) {
                    entry.state = DiscoveryState::ToSetupFail;
                    return AutoLinkAction::None;
                }
                if link_exists {
                    Self::mark_connected(entry);
                    AutoLinkAction::None
                } else {
                    info!("auto setup to {}", peer.to_mac_str());
                    entry.state = DiscoveryState::ToSetup;
                    AutoLinkAction::Setup(*peer)
                }
            }
            _ => AutoLinkAction::None,
        }
    }

    fn record(&self, entry: &mut DiscoveryPeer, rssi: i8) {
        match entry.avg_rssi.as_mut() {
            Some(avg) => avg.update_average(rssi),
            None => entry.avg_rssi = Some(EwmaRssi::new(self.config.ewma_weight, rssi)),
        }
    }

    fn mark_connected(entry: &mut DiscoveryPeer) {
        entry.connected = true;
        entry.connected_first_time = true;
        entry.retry_count = 0;
        entry.state = DiscoveryState::ToSetupDone;
    }

    /// A direct link to `peer` was established.
    pub fn on_connected(&self, peer: &MacAddr) {
        {
            let mut discovery = self.discovery.lock();
            let entry = discovery.entry(*peer).or_insert_with(DiscoveryPeer::new);
            Self::mark_connected(entry);
        }
        self.black_list.lock().remove(peer);
    }

    /// The peer tore the link down.
    pub fn on_peer_teardown(&self, peer: &MacAddr) {
        self.black_list.lock().insert(*peer, BlackListReason::ByTeardown);
        self.discovery.lock().remove(peer);
    }

    pub fn is_black_listed(&self, peer: &MacAddr) -> bool {
        self.black_list.lock().get(peer) == Some(&BlackListReason::ByTeardown)
    }

    pub fn discovery_peer(&self, peer: &MacAddr) -> Option<DiscoveryPeer> {
        self.discovery.lock().get(peer).cloned()
    }

    pub fn clear(&self) {
        self.discovery.lock().clear();
        self.black_list.lock().clear();
    }
}
