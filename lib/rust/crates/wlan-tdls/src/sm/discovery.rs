// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{link_id_element, TdlsSm},
    crate::{
        autolink::AutoLinkAction,
        device::DeviceOps,
        error::Error,
        frame::{DiscoveryRequest, DiscoveryResponse, Elements, TdlsAction},
        ie::LinkIdentifier,
        key::{build_msg1, generate_nonce, validate_link_id},
        mac::{MacAddr, MacFmt, ReasonCode, StatusCode},
    },
    log::info,
};

// IEEE Std 802.11-2016, 11.23.2
impl<D: DeviceOps> TdlsSm<D> {
    /// Probes `peer` through the AP. The peer answers directly with a public action frame.
    pub(super) fn send_discovery_request(&mut self, peer: MacAddr) -> Result<(), Error> {
        let token = self.tokens.next();
        let link_id =
            LinkIdentifier { bssid: self.bssid, initiator: self.own_addr, responder: peer };
        let elements = Elements { link_id: link_id_element(&link_id), ..Default::default() };
        let req = DiscoveryRequest { token, elements };
        self.send_action(peer, TdlsAction::DiscoveryRequest(req), true)?;
        if self.auto_link.enabled() {
            self.auto_link.on_local_discovery(&peer);
        }
        Ok(())
    }

    pub(super) fn on_discovery_request(
        &mut self,
        peer: MacAddr,
        req: DiscoveryRequest,
    ) -> Result<(), Error> {
        let link_id = validate_link_id(req.elements.link_id.as_deref(), &self.bssid)?;
        if link_id.responder != self.own_addr || link_id.initiator != peer {
            return Err(StatusCode::NOT_IN_SAME_BSS.into());
        }

        let mut elements = self.capability_elements();
        if self.config.security_enabled {
            build_msg1(&generate_nonce(), self.config.key_lifetime).apply(&mut elements);
        }
        elements.link_id = link_id_element(&link_id);
        let rsp = DiscoveryResponse {
            token: req.token,
            capability_info: self.config.capability_info,
            elements,
        };
        let body = rsp.to_public_action_body()?;
        self.device.send_public_action(peer, body)
    }

    /// Feeds the response's signal strength to auto-link and acts on its decision.
    pub(super) fn on_discovery_response(
        &mut self,
        peer: MacAddr,
        rsp: DiscoveryResponse,
        rssi: i8,
    ) -> Result<(), Error> {
        let link_id = validate_link_id(rsp.elements.link_id.as_deref(), &self.bssid)?;
        if link_id.initiator != self.own_addr {
            return Err(StatusCode::NOT_IN_SAME_BSS.into());
        }
        let link_exists = self.store.find(&peer).is_some();
        match self.auto_link.on_discovery_response(&peer, rssi, link_exists) {
            AutoLinkAction::None => Ok(()),
            AutoLinkAction::Setup(peer) => {
                info!("auto-link setting up {}", peer.to_mac_str());
                self.start_setup(peer)
            }
            AutoLinkAction::Teardown(peer) => {
                info!("auto-link tearing down {}", peer.to_mac_str());
                self.teardown(&peer, ReasonCode::TDLS_UNSPECIFIED_REASON)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            config::TdlsConfig,
            frame::TdlsFrame,
            ie::{rsne, Ftie, TimeoutInterval},
            mac::Bssid,
            sm::{test_utils::*, MlmeRequest},
            store::LinkStatus,
        },
        assert_matches::assert_matches,
    };

    fn auto_link_station(addr: MacAddr) -> Station {
        let mut config = TdlsConfig::default();
        config.auto_link.enabled = true;
        Station::with_config(addr, config)
    }

    /// Runs one discovery round from `from` to `to` and returns the response body.
    fn discover(from: &mut Station, to: &mut Station) -> Vec<u8> {
        let peer = *to.sm.own_addr();
        from.sm.handle_mlme_request(MlmeRequest::Discovery { peer }).expect("discovery");
        to.receive_from(from);
        let mut actions = std::mem::take(&mut to.sm.device_mut().public_actions);
        assert_eq!(actions.len(), 1);
        let (dst, body) = actions.remove(0);
        assert_eq!(dst, *from.sm.own_addr());
        body
    }

    #[test]
    fn discovery_request_answered() {
        let mut a = Station::new(ADDR_A);
        let mut b = Station::new(ADDR_B);
        a.sm.handle_mlme_request(MlmeRequest::Discovery { peer: ADDR_B }).expect("discovery");
        let frames = a.sm.device_mut().take_frames();
        let token = match &frames[..] {
            [(TdlsFrame { action: TdlsAction::DiscoveryRequest(req), .. }, true)] => req.token,
            other => panic!("expected Discovery Request, got {:?}", other),
        };
        for (frame, _) in frames {
            b.sm.on_eth_frame(&frame.to_bytes().expect("write frame")[..]);
        }

        let mut responses = b.sm.device_mut().take_discovery_responses();
        assert_eq!(responses.len(), 1);
        let (dst, rsp) = responses.remove(0);
        assert_eq!(dst, ADDR_A);
        assert_eq!(rsp.token, token);
        assert_eq!(rsp.capability_info, 0x0421);
        assert!(rsp.elements.supported_rates.is_some());
        assert_matches!(rsne::validate_tdls_rsne(rsp.elements.rsne.as_deref()), Ok(_));
        let ti = rsp.elements.timeout_interval.as_deref().and_then(TimeoutInterval::parse);
        assert_eq!(ti.map(|ti| ti.value.get()), Some(3600));
        let ftie = rsp.elements.ftie.as_deref().and_then(Ftie::parse).expect("FTIE");
        assert_eq!(ftie.mic_control, [0; 2]);
        assert_eq!(ftie.mic, [0; 16]);
        assert_eq!(ftie.anonce, [0; 32]);
        assert_ne!(ftie.snonce, [0; 32]);
        let link_id = LinkIdentifier::parse(rsp.elements.link_id.as_deref().expect("link id"))
            .expect("parse link id");
        assert_eq!(link_id, LinkIdentifier { bssid: BSSID, initiator: ADDR_A, responder: ADDR_B });
        assert_eq!(b.sm.link_status(&ADDR_A), LinkStatus::None);
    }

    #[test]
    fn discovery_response_without_security() {
        let config = TdlsConfig { security_enabled: false, ..Default::default() };
        let mut a = Station::new(ADDR_A);
        let mut b = Station::with_config(ADDR_B, config);
        a.sm.handle_mlme_request(MlmeRequest::Discovery { peer: ADDR_B }).expect("discovery");
        b.receive_from(&mut a);

        let mut responses = b.sm.device_mut().take_discovery_responses();
        assert_eq!(responses.len(), 1);
        let (_, rsp) = responses.remove(0);
        assert_eq!(rsp.elements.rsne, None);
        assert_eq!(rsp.elements.ftie, None);
        assert_eq!(rsp.elements.timeout_interval, None);
        assert!(rsp.elements.link_id.is_some());
    }

    #[test]
    fn discovery_request_for_other_station_ignored() {
        let mut b = Station::new(ADDR_B);
        let link_id = LinkIdentifier { bssid: BSSID, initiator: ADDR_A, responder: ADDR_C };
        let req = DiscoveryRequest {
            token: 1,
            elements: Elements { link_id: link_id_element(&link_id), ..Default::default() },
        };
        assert_matches!(
            b.sm.on_discovery_request(ADDR_A, req),
            Err(Error::Status(StatusCode::NOT_IN_SAME_BSS))
        );
        assert!(b.sm.device().public_actions.is_empty());
    }

    #[test]
    fn discovery_response_without_auto_link_ignored() {
        let mut a = Station::new(ADDR_A);
        let mut b = Station::new(ADDR_B);
        for _ in 0..3 {
            let body = discover(&mut a, &mut b);
            a.sm.on_public_action(ADDR_B, &body[..], -30);
        }
        assert!(a.take_frames().is_empty());
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::None);
    }

    #[test]
    fn strong_signal_sets_up_link() {
        let mut a = auto_link_station(ADDR_A);
        let mut b = Station::new(ADDR_B);

        let body = discover(&mut a, &mut b);
        a.sm.on_public_action(ADDR_B, &body[..], -40);
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::None);

        let body = discover(&mut a, &mut b);
        a.sm.on_public_action(ADDR_B, &body[..], -40);
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::WaitResponse);

        b.receive_from(&mut a);
        a.receive_from(&mut b);
        b.receive_from(&mut a);
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::Connected);
        assert_eq!(b.sm.link_status(&ADDR_A), LinkStatus::Connected);
        assert_matches!(
            a.sm.auto_link().discovery_peer(&ADDR_B),
            Some(peer) => assert!(peer.connected)
        );
    }

    #[test]
    fn weak_signal_keeps_peer_unlinked() {
        let mut a = auto_link_station(ADDR_A);
        let mut b = Station::new(ADDR_B);
        for _ in 0..3 {
            let body = discover(&mut a, &mut b);
            a.sm.on_public_action(ADDR_B, &body[..], -75);
        }
        assert!(a.take_frames().is_empty());
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::None);
    }

    #[test]
    fn fading_signal_tears_down_link() {
        let mut a = auto_link_station(ADDR_A);
        let mut b = Station::new(ADDR_B);
        connect(&mut a, &mut b);

        // The first sample after connecting seeds the average.
        let body = discover(&mut a, &mut b);
        a.sm.on_public_action(ADDR_B, &body[..], -50);
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::Connected);

        let body = discover(&mut a, &mut b);
        a.sm.on_public_action(ADDR_B, &body[..], -90);
        assert_eq!(a.sm.link_status(&ADDR_B), LinkStatus::None);
        let frames = a.sm.device_mut().take_frames();
        assert_matches!(
            &frames[..],
            [(TdlsFrame { action: TdlsAction::Teardown(teardown), .. }, false)] => {
                assert_eq!(teardown.reason, ReasonCode::TDLS_UNSPECIFIED_REASON);
            }
        );
    }

    #[test]
    fn response_from_other_bss_ignored() {
        let mut a = auto_link_station(ADDR_A);
        a.sm.auto_link().on_local_discovery(&ADDR_B);
        let link_id = LinkIdentifier { bssid: Bssid([7; 6]), initiator: ADDR_A, responder: ADDR_B };
        let rsp = DiscoveryResponse {
            token: 1,
            capability_info: 0,
            elements: Elements { link_id: link_id_element(&link_id), ..Default::default() },
        };
        let body = rsp.to_public_action_body().expect("write response");
        a.sm.on_public_action(ADDR_B, &body[..], -30);
        a.sm.on_public_action(ADDR_B, &body[..], -30);
        assert!(a.take_frames().is_empty());
        assert_eq!(a.sm.auto_link().discovery_peer(&ADDR_B).and_then(|p| p.last_rssi), None);
    }
}
