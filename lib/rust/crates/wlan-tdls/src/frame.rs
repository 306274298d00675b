// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        error::{FrameParseError, FrameWriteError},
        ie::{self, Id},
        mac::{
            EthernetFrame, EthernetIIHdr, MacAddr, ReasonCode, StatusCode, ETHER_TYPE_TDLS,
            PAYLOAD_TYPE_TDLS,
        },
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::io::Cursor,
    zerocopy::{byteorder::U16, AsBytes},
};

// IEEE Std 802.11-2016, 9.4.1.11, Table 9-47
pub const CATEGORY_PUBLIC: u8 = 4;
pub const CATEGORY_TDLS: u8 = 12;

// IEEE Std 802.11-2016, 9.6.8.1, Table 9-307
pub const PUBLIC_ACTION_TDLS_DISCOVERY_RESPONSE: u8 = 14;

// IEEE Std 802.11-2016, 9.6.13.1, Table 9-363
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ActionCode(pub u8);

impl ActionCode {
    pub const SETUP_REQUEST: Self = Self(0);
    pub const SETUP_RESPONSE: Self = Self(1);
    pub const SETUP_CONFIRM: Self = Self(2);
    pub const TEARDOWN: Self = Self(3);
    pub const PEER_TRAFFIC_INDICATION: Self = Self(4);
    pub const PEER_TRAFFIC_RESPONSE: Self = Self(9);
    pub const DISCOVERY_REQUEST: Self = Self(10);
}

// IEEE Std 802.11-2016, 9.6.13.2
const SETUP_REQUEST_IES: &[Id] = &[
    Id::SUPPORTED_RATES,
    Id::COUNTRY,
    Id::EXT_SUPPORTED_RATES,
    Id::SUPPORTED_CHANNELS,
    Id::RSNE,
    Id::EXT_CAPABILITIES,
    Id::QOS_CAPABILITY,
    Id::FTIE,
    Id::TIMEOUT_INTERVAL,
    Id::SUPPORTED_REGULATORY_CLASSES,
    Id::HT_CAPABILITIES,
    Id::BSS_COEXISTENCE,
    Id::LINK_IDENTIFIER,
];

// IEEE Std 802.11-2016, 9.6.13.3
const SETUP_RESPONSE_IES: &[Id] = &[
    Id::SUPPORTED_RATES,
    Id::COUNTRY,
    Id::EXT_SUPPORTED_RATES,
    Id::SUPPORTED_CHANNELS,
    Id::RSNE,
    Id::EXT_CAPABILITIES,
    Id::QOS_CAPABILITY,
    Id::FTIE,
    Id::TIMEOUT_INTERVAL,
    Id::SUPPORTED_REGULATORY_CLASSES,
    Id::HT_CAPABILITIES,
    Id::BSS_COEXISTENCE,
    Id::LINK_IDENTIFIER,
];

// IEEE Std 802.11-2016, 9.6.13.4
const SETUP_CONFIRM_IES: &[Id] = &[
    Id::RSNE,
    Id::VENDOR_SPECIFIC,
    Id::FTIE,
    Id::TIMEOUT_INTERVAL,
    Id::HT_OPERATION,
    Id::LINK_IDENTIFIER,
];

// IEEE Std 802.11-2016, 9.6.13.5
const TEARDOWN_IES: &[Id] = &[Id::FTIE, Id::LINK_IDENTIFIER];

// IEEE Std 802.11-2016, 9.6.13.6 and 9.6.13.10
const PEER_TRAFFIC_INDICATION_IES: &[Id] = &[Id::LINK_IDENTIFIER, Id::PU_BUFFER_STATUS];
const PEER_TRAFFIC_RESPONSE_IES: &[Id] = &[Id::LINK_IDENTIFIER];

// IEEE Std 802.11-2016, 9.6.13.11
const DISCOVERY_REQUEST_IES: &[Id] = &[Id::LINK_IDENTIFIER];

// IEEE Std 802.11-2016, 9.6.8.16
const DISCOVERY_RESPONSE_IES: &[Id] = &[
    Id::SUPPORTED_RATES,
    Id::EXT_SUPPORTED_RATES,
    Id::SUPPORTED_CHANNELS,
    Id::RSNE,
    Id::EXT_CAPABILITIES,
    Id::FTIE,
    Id::TIMEOUT_INTERVAL,
    Id::SUPPORTED_REGULATORY_CLASSES,
    Id::HT_CAPABILITIES,
    Id::BSS_COEXISTENCE,
    Id::LINK_IDENTIFIER,
];

/// Raw bodies of the elements a TDLS frame may carry. Fixed-layout elements are kept as
/// received so that policy checks can report length errors with the right status code and
/// so MICs are computed over the exact bytes on the wire.
#[derive(Default, PartialEq, Eq, Clone, Debug)]
pub struct Elements {
    pub supported_rates: Option<Vec<u8>>,
    pub ext_supported_rates: Option<Vec<u8>>,
    pub country: Option<Vec<u8>>,
    pub supported_channels: Option<Vec<u8>>,
    pub rsne: Option<Vec<u8>>,
    pub ext_capabilities: Option<Vec<u8>>,
    pub qos_capability: Option<Vec<u8>>,
    pub ftie: Option<Vec<u8>>,
    pub timeout_interval: Option<Vec<u8>>,
    pub supported_regulatory_classes: Option<Vec<u8>>,
    pub ht_capabilities: Option<Vec<u8>>,
    pub ht_operation: Option<Vec<u8>>,
    pub bss_coexistence: Option<Vec<u8>>,
    pub wmm_parameter: Option<Vec<u8>>,
    pub link_id: Option<Vec<u8>>,
    pub pu_buffer_status: Option<Vec<u8>>,
}

impl Elements {
    /// Collects known elements. The first occurrence of an element wins and unknown
    /// elements are skipped.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut elements = Elements::default();
        for (id, body) in ie::Reader::new(bytes) {
            if let Some(slot) = elements.slot_mut(id) {
                if slot.is_none() {
                    slot.replace(body.to_vec());
                }
            }
        }
        elements
    }

    pub fn get(&self, id: Id) -> Option<&[u8]> {
        let slot = match id {
            Id::SUPPORTED_RATES => &self.supported_rates,
            Id::EXT_SUPPORTED_RATES => &self.ext_supported_rates,
            Id::COUNTRY => &self.country,
            Id::SUPPORTED_CHANNELS => &self.supported_channels,
            Id::RSNE => &self.rsne,
            Id::EXT_CAPABILITIES => &self.ext_capabilities,
            Id::QOS_CAPABILITY => &self.qos_capability,
            Id::FTIE => &self.ftie,
            Id::TIMEOUT_INTERVAL => &self.timeout_interval,
            Id::SUPPORTED_REGULATORY_CLASSES => &self.supported_regulatory_classes,
            Id::HT_CAPABILITIES => &self.ht_capabilities,
            Id::HT_OPERATION => &self.ht_operation,
            Id::BSS_COEXISTENCE => &self.bss_coexistence,
            Id::VENDOR_SPECIFIC => &self.wmm_parameter,
            Id::LINK_IDENTIFIER => &self.link_id,
            Id::PU_BUFFER_STATUS => &self.pu_buffer_status,
            _ => return None,
        };
        slot.as_ref().map(|body| &body[..])
    }

    fn slot_mut(&mut self, id: Id) -> Option<&mut Option<Vec<u8>>> {
        let slot = match id {
            Id::SUPPORTED_RATES => &mut self.supported_rates,
            Id::EXT_SUPPORTED_RATES => &mut self.ext_supported_rates,
            Id::COUNTRY => &mut self.country,
            Id::SUPPORTED_CHANNELS => &mut self.supported_channels,
            Id::RSNE => &mut self.rsne,
            Id::EXT_CAPABILITIES => &mut self.ext_capabilities,
            Id::QOS_CAPABILITY => &mut self.qos_capability,
            Id::FTIE => &mut self.ftie,
            Id::TIMEOUT_INTERVAL => &mut self.timeout_interval,
            Id::SUPPORTED_REGULATORY_CLASSES => &mut self.supported_regulatory_classes,
            Id::HT_CAPABILITIES => &mut self.ht_capabilities,
            Id::HT_OPERATION => &mut self.ht_operation,
            Id::BSS_COEXISTENCE => &mut self.bss_coexistence,
            Id::VENDOR_SPECIFIC => &mut self.wmm_parameter,
            Id::LINK_IDENTIFIER => &mut self.link_id,
            Id::PU_BUFFER_STATUS => &mut self.pu_buffer_status,
            _ => return None,
        };
        Some(slot)
    }

    fn write(&self, buf: &mut Vec<u8>, order: &[Id]) -> Result<(), FrameWriteError> {
        for id in order {
            ie::write_opt_ie(buf, *id, self.get(*id))?;
        }
        Ok(())
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SetupRequest {
    pub token: u8,
    pub capability_info: u16,
    pub elements: Elements,
}

/// The capability field is only present on the wire when `status` is success.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SetupResponse {
    pub status: StatusCode,
    pub token: u8,
    pub capability_info: u16,
    pub elements: Elements,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SetupConfirm {
    pub status: StatusCode,
    pub token: u8,
    pub elements: Elements,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Teardown {
    pub reason: ReasonCode,
    pub elements: Elements,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct PeerTrafficIndication {
    pub token: u8,
    pub elements: Elements,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct PeerTrafficResponse {
    pub token: u8,
    pub elements: Elements,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DiscoveryRequest {
    pub token: u8,
    pub elements: Elements,
}

/// Sent as a public action frame rather than over the direct link.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DiscoveryResponse {
    pub token: u8,
    pub capability_info: u16,
    pub elements: Elements,
}

/// A TDLS action frame carried in an Ethernet frame with the TDLS EtherType.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum TdlsAction {
    SetupRequest(SetupRequest),
    SetupResponse(SetupResponse),
    SetupConfirm(SetupConfirm),
    Teardown(Teardown),
    PeerTrafficIndication(PeerTrafficIndication),
    PeerTrafficResponse(PeerTrafficResponse),
    DiscoveryRequest(DiscoveryRequest),
}

impl TdlsAction {
    pub fn action_code(&self) -> ActionCode {
        match self {
            TdlsAction::SetupRequest(_) => ActionCode::SETUP_REQUEST,
            TdlsAction::SetupResponse(_) => ActionCode::SETUP_RESPONSE,
            TdlsAction::SetupConfirm(_) => ActionCode::SETUP_CONFIRM,
            TdlsAction::Teardown(_) => ActionCode::TEARDOWN,
            TdlsAction::PeerTrafficIndication(_) => ActionCode::PEER_TRAFFIC_INDICATION,
            TdlsAction::PeerTrafficResponse(_) => ActionCode::PEER_TRAFFIC_RESPONSE,
            TdlsAction::DiscoveryRequest(_) => ActionCode::DISCOVERY_REQUEST,
        }
    }

    pub fn elements(&self) -> &Elements {
        match self {
            TdlsAction::SetupRequest(f) => &f.elements,
            TdlsAction::SetupResponse(f) => &f.elements,
            TdlsAction::SetupConfirm(f) => &f.elements,
            TdlsAction::Teardown(f) => &f.elements,
            TdlsAction::PeerTrafficIndication(f) => &f.elements,
            TdlsAction::PeerTrafficResponse(f) => &f.elements,
            TdlsAction::DiscoveryRequest(f) => &f.elements,
        }
    }

    fn write_body(&self, buf: &mut Vec<u8>) -> Result<(), FrameWriteError> {
        match self {
            TdlsAction::SetupRequest(f) => {
                buf.push(f.token);
                write_u16(buf, f.capability_info);
                f.elements.write(buf, SETUP_REQUEST_IES)
            }
            TdlsAction::SetupResponse(f) => {
                write_u16(buf, f.status.0);
                buf.push(f.token);
                if f.status.is_success() {
                    write_u16(buf, f.capability_info);
                }
                f.elements.write(buf, SETUP_RESPONSE_IES)
            }
            TdlsAction::SetupConfirm(f) => {
                write_u16(buf, f.status.0);
                buf.push(f.token);
                f.elements.write(buf, SETUP_CONFIRM_IES)
            }
            TdlsAction::Teardown(f) => {
                write_u16(buf, f.reason.0);
                f.elements.write(buf, TEARDOWN_IES)
            }
            TdlsAction::PeerTrafficIndication(f) => {
                buf.push(f.token);
                f.elements.write(buf, PEER_TRAFFIC_INDICATION_IES)
            }
            TdlsAction::PeerTrafficResponse(f) => {
                buf.push(f.token);
                f.elements.write(buf, PEER_TRAFFIC_RESPONSE_IES)
            }
            TdlsAction::DiscoveryRequest(f) => {
                buf.push(f.token);
                f.elements.write(buf, DISCOVERY_REQUEST_IES)
            }
        }
    }

    fn parse_body(action: ActionCode, body: &[u8]) -> Result<Self, FrameParseError> {
        let mut rdr = Cursor::new(body);
        let frame = match action {
            ActionCode::SETUP_REQUEST => {
                let token = read_u8(&mut rdr)?;
                let capability_info = read_u16(&mut rdr)?;
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::SetupRequest(SetupRequest { token, capability_info, elements })
            }
            ActionCode::SETUP_RESPONSE => {
                let status = StatusCode(read_u16(&mut rdr)?);
                let token = read_u8(&mut rdr)?;
                let capability_info = if status.is_success() { read_u16(&mut rdr)? } else { 0 };
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::SetupResponse(SetupResponse {
                    status,
                    token,
                    capability_info,
                    elements,
                })
            }
            ActionCode::SETUP_CONFIRM => {
                let status = StatusCode(read_u16(&mut rdr)?);
                let token = read_u8(&mut rdr)?;
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::SetupConfirm(SetupConfirm { status, token, elements })
            }
            ActionCode::TEARDOWN => {
                let reason = ReasonCode(read_u16(&mut rdr)?);
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::Teardown(Teardown { reason, elements })
            }
            ActionCode::PEER_TRAFFIC_INDICATION => {
                let token = read_u8(&mut rdr)?;
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::PeerTrafficIndication(PeerTrafficIndication { token, elements })
            }
            ActionCode::PEER_TRAFFIC_RESPONSE => {
                let token = read_u8(&mut rdr)?;
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::PeerTrafficResponse(PeerTrafficResponse { token, elements })
            }
            ActionCode::DISCOVERY_REQUEST => {
                let token = read_u8(&mut rdr)?;
                let elements = Elements::parse(rest(&rdr));
                TdlsAction::DiscoveryRequest(DiscoveryRequest { token, elements })
            }
            _ => return Err(FrameParseError("unsupported TDLS action code")),
        };
        Ok(frame)
    }
}

/// A parsed direct-link TDLS frame together with its Ethernet addressing.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TdlsFrame {
    pub da: MacAddr,
    pub sa: MacAddr,
    pub action: TdlsAction,
}

impl TdlsFrame {
    pub fn new(da: MacAddr, sa: MacAddr, action: TdlsAction) -> Self {
        Self { da, sa, action }
    }

    // IEEE Std 802.11-2016, 11.23.1: TDLS frames are encapsulated in data frames.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FrameWriteError> {
        let hdr = EthernetIIHdr { da: self.da, sa: self.sa, ether_type: U16::new(ETHER_TYPE_TDLS) };
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(hdr.as_bytes());
        buf.push(PAYLOAD_TYPE_TDLS);
        buf.push(CATEGORY_TDLS);
        buf.push(self.action.action_code().0);
        self.action.write_body(&mut buf)?;
        Ok(buf)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FrameParseError> {
        let eth = EthernetFrame::parse(bytes)
            .ok_or(FrameParseError("frame too short for Ethernet header"))?;
        if eth.hdr.ether_type.get() != ETHER_TYPE_TDLS {
            return Err(FrameParseError("not a TDLS EtherType"));
        }
        let body = eth.body;
        if body.len() < 3 {
            return Err(FrameParseError("frame too short for TDLS action header"));
        }
        if body[0] != PAYLOAD_TYPE_TDLS {
            return Err(FrameParseError("unexpected payload type"));
        }
        if body[1] != CATEGORY_TDLS {
            return Err(FrameParseError("unexpected action category"));
        }
        let action = TdlsAction::parse_body(ActionCode(body[2]), &body[3..])?;
        Ok(Self { da: eth.hdr.da, sa: eth.hdr.sa, action })
    }
}

impl DiscoveryResponse {
    pub fn to_public_action_body(&self) -> Result<Vec<u8>, FrameWriteError> {
        let mut buf = Vec::with_capacity(256);
        buf.push(CATEGORY_PUBLIC);
        buf.push(PUBLIC_ACTION_TDLS_DISCOVERY_RESPONSE);
        buf.push(self.token);
        write_u16(&mut buf, self.capability_info);
        self.elements.write(&mut buf, DISCOVERY_RESPONSE_IES)?;
        Ok(buf)
    }

    pub fn parse_public_action_body(body: &[u8]) -> Result<Self, FrameParseError> {
        let mut rdr = Cursor::new(body);
        if read_u8(&mut rdr)? != CATEGORY_PUBLIC {
            return Err(FrameParseError("not a public action frame"));
        }
        if read_u8(&mut rdr)? != PUBLIC_ACTION_TDLS_DISCOVERY_RESPONSE {
            return Err(FrameParseError("not a TDLS Discovery Response"));
        }
        let token = read_u8(&mut rdr)?;
        let capability_info = read_u16(&mut rdr)?;
        let elements = Elements::parse(rest(&rdr));
        Ok(Self { token, capability_info, elements })
    }
}

fn write_u16(buf: &mut Vec<u8>, value: u16) {
    // Writes into a Vec are infallible.
    let _ = buf.write_u16::<LittleEndian>(value);
}

fn read_u8(rdr: &mut Cursor<&[u8]>) -> Result<u8, FrameParseError> {
    rdr.read_u8().map_err(|_| FrameParseError("frame body too short"))
}

fn read_u16(rdr: &mut Cursor<&[u8]>) -> Result<u16, FrameParseError> {
    rdr.read_u16::<LittleEndian>().map_err(|_| FrameParseError("frame body too short"))
}

fn rest<'a>(rdr: &Cursor<&'a [u8]>) -> &'a [u8] {
    let bytes: &'a [u8] = *rdr.get_ref();
    let pos = std::cmp::min(rdr.position() as usize, bytes.len());
    &bytes[pos..]
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            ie::{rsne::Rsne, Ftie, LinkIdentifier, TimeoutInterval},
            mac::Bssid,
        },
        assert_matches::assert_matches,
    };

    const DA: MacAddr = [0xd0; 6];
    const SA: MacAddr = [0x5a; 6];

    fn link_id_body() -> Vec<u8> {
        LinkIdentifier { bssid: Bssid([0xbb; 6]), initiator: SA, responder: DA }.as_bytes().to_vec()
    }

    fn security_elements() -> Elements {
        let mut rsne = vec![];
        Rsne::tdls().write_body(&mut rsne);
        Elements {
            supported_rates: Some(vec![0x82, 0x84, 0x8b, 0x96]),
            ext_supported_rates: Some(vec![0x6c]),
            rsne: Some(rsne),
            ext_capabilities: Some(vec![0, 0, 0, 0x10, 0x20]),
            ftie: Some(Ftie::new([0; 32], [7; 32]).as_bytes().to_vec()),
            timeout_interval: Some(TimeoutInterval::key_lifetime(3600).as_bytes().to_vec()),
            ht_capabilities: Some(vec![0x6e; 26]),
            link_id: Some(link_id_body()),
            ..Default::default()
        }
    }

    fn round_trip(action: TdlsAction) {
        let frame = TdlsFrame::new(DA, SA, action);
        let bytes = frame.to_bytes().expect("write frame");
        assert_eq!(TdlsFrame::parse(&bytes[..]), Ok(frame));
    }

    #[test]
    fn setup_request_header_layout() {
        let frame = TdlsFrame::new(
            DA,
            SA,
            TdlsAction::SetupRequest(SetupRequest {
                token: 1,
                capability_info: 0x0421,
                elements: Elements { link_id: Some(link_id_body()), ..Default::default() },
            }),
        );
        let bytes = frame.to_bytes().expect("write frame");
        #[rustfmt::skip]
        assert_eq!(&bytes[..20], &[
            0xd0, 0xd0, 0xd0, 0xd0, 0xd0, 0xd0, // da
            0x5a, 0x5a, 0x5a, 0x5a, 0x5a, 0x5a, // sa
            0x89, 0x0d, // EtherType
            2, 12, 0, // payload type, category, action
            1, // token
            0x21, 0x04, // capability info
        ][..]);
        assert_eq!(&bytes[20..22], &[101, 18][..]);
    }

    #[test]
    fn setup_request_round_trip() {
        round_trip(TdlsAction::SetupRequest(SetupRequest {
            token: 7,
            capability_info: 0x0421,
            elements: security_elements(),
        }));
    }

    #[test]
    fn setup_response_round_trip() {
        round_trip(TdlsAction::SetupResponse(SetupResponse {
            status: StatusCode::SUCCESS,
            token: 7,
            capability_info: 0x0421,
            elements: security_elements(),
        }));
    }

    #[test]
    fn setup_response_failure_omits_capability() {
        let frame = TdlsFrame::new(
            DA,
            SA,
            TdlsAction::SetupResponse(SetupResponse {
                status: StatusCode::REQUEST_DECLINED,
                token: 7,
                capability_info: 0,
                elements: Elements { link_id: Some(link_id_body()), ..Default::default() },
            }),
        );
        let bytes = frame.to_bytes().expect("write frame");
        assert_eq!(&bytes[17..20], &[37, 0, 7][..]);
        assert_eq!(bytes[20], 101);
        assert_eq!(TdlsFrame::parse(&bytes[..]), Ok(frame));
    }

    #[test]
    fn setup_confirm_round_trip() {
        let mut elements = security_elements();
        elements.wmm_parameter = Some(vec![0x00, 0x50, 0xf2, 0x02, 0x01, 0x01, 0x00]);
        elements.supported_rates = None;
        elements.ext_supported_rates = None;
        elements.ext_capabilities = None;
        elements.ht_capabilities = None;
        round_trip(TdlsAction::SetupConfirm(SetupConfirm {
            status: StatusCode::SUCCESS,
            token: 7,
            elements,
        }));
    }

    #[test]
    fn teardown_round_trip() {
        round_trip(TdlsAction::Teardown(Teardown {
            reason: ReasonCode::TDLS_UNSPECIFIED_REASON,
            elements: Elements {
                ftie: Some(Ftie::new([1; 32], [2; 32]).as_bytes().to_vec()),
                link_id: Some(link_id_body()),
                ..Default::default()
            },
        }));
    }

    #[test]
    fn discovery_and_traffic_round_trip() {
        let link_only = Elements { link_id: Some(link_id_body()), ..Default::default() };
        round_trip(TdlsAction::DiscoveryRequest(DiscoveryRequest {
            token: 3,
            elements: link_only.clone(),
        }));
        round_trip(TdlsAction::PeerTrafficResponse(PeerTrafficResponse {
            token: 4,
            elements: link_only.clone(),
        }));
        round_trip(TdlsAction::PeerTrafficIndication(PeerTrafficIndication {
            token: 5,
            elements: Elements { pu_buffer_status: Some(vec![0b1000]), ..link_only },
        }));
    }

    #[test]
    fn discovery_response_public_action_round_trip() {
        let rsp = DiscoveryResponse {
            token: 9,
            capability_info: 0x0421,
            elements: security_elements(),
        };
        let body = rsp.to_public_action_body().expect("write public action");
        assert_eq!(&body[..3], &[CATEGORY_PUBLIC, PUBLIC_ACTION_TDLS_DISCOVERY_RESPONSE, 9][..]);
        assert_eq!(DiscoveryResponse::parse_public_action_body(&body[..]), Ok(rsp));
    }

    #[test]
    fn elements_order_follows_frame_kind() {
        let frame = TdlsFrame::new(
            DA,
            SA,
            TdlsAction::Teardown(Teardown {
                reason: ReasonCode::TDLS_UNSPECIFIED_REASON,
                elements: security_elements(),
            }),
        );
        let bytes = frame.to_bytes().expect("write frame");
        // Only FTIE and Link Identifier belong in a Teardown.
        let ids: Vec<_> = ie::Reader::new(&bytes[19..]).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![Id::FTIE, Id::LINK_IDENTIFIER]);
    }

    #[test]
    fn elements_first_occurrence_wins() {
        let bytes = [101, 1, 0xaa, 101, 1, 0xbb, 200, 1, 0xcc];
        let elements = Elements::parse(&bytes[..]);
        assert_eq!(elements.link_id, Some(vec![0xaa]));
        assert_eq!(elements.get(Id(200)), None);
    }

    #[test]
    fn empty_rsne_is_kept() {
        let elements = Elements::parse(&[48, 0][..]);
        assert_eq!(elements.rsne, Some(vec![]));
    }

    #[test]
    fn parse_rejects_foreign_frames() {
        let mut bytes = TdlsFrame::new(
            DA,
            SA,
            TdlsAction::DiscoveryRequest(DiscoveryRequest {
                token: 1,
                elements: Elements::default(),
            }),
        )
        .to_bytes()
        .expect("write frame");
        bytes[12] = 0x88;
        bytes[13] = 0x8e;
        assert_matches!(TdlsFrame::parse(&bytes[..]), Err(_));
        bytes[12] = 0x89;
        bytes[13] = 0x0d;
        bytes[14] = 1;
        assert_matches!(TdlsFrame::parse(&bytes[..]), Err(_));
        bytes[14] = PAYLOAD_TYPE_TDLS;
        bytes[16] = 6;
        assert_matches!(TdlsFrame::parse(&bytes[..]), Err(FrameParseError(_)));
    }

    #[test]
    fn parse_rejects_truncated_fixed_fields() {
        let mut bytes = vec![0xd0; 12];
        bytes.extend_from_slice(&[0x89, 0x0d, 2, 12, 1, 0]);
        assert_eq!(TdlsFrame::parse(&bytes[..]), Err(FrameParseError("frame body too short")));
    }
}
