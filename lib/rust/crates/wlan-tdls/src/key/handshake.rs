// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        mic::{setup_mic_input, teardown_mic_input, SEQ_SETUP_CONFIRM, SEQ_SETUP_RESPONSE},
        tpk::Tpk,
    },
    crate::{
        error::Error,
        frame::Elements,
        ie::{
            rsne::{self, Rsne},
            Ftie, LinkIdentifier, TimeoutInterval, MIC_LEN, NONCE_LEN,
        },
        mac::{Bssid, MacAddr, ReasonCode, StatusCode},
    },
    rand::Rng,
    zerocopy::AsBytes,
};

pub type Nonce = [u8; NONCE_LEN];

pub fn generate_nonce() -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce[..]);
    nonce
}

/// RSNE, FTIE and Timeout Interval as carried by the messages of a TPK handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityElements {
    pub rsne: Vec<u8>,
    pub ftie: Ftie,
    pub timeout_interval: TimeoutInterval,
}

/// Body of the RSNE advertised in TDLS frames.
fn tdls_rsne_body() -> Vec<u8> {
    let rsne = Rsne::tdls();
    let mut body = Vec::with_capacity(rsne.body_len());
    rsne.write_body(&mut body);
    body
}

impl SecurityElements {
    fn new(ftie: Ftie, key_lifetime: u32) -> Self {
        Self {
            rsne: tdls_rsne_body(),
            ftie,
            timeout_interval: TimeoutInterval::key_lifetime(key_lifetime),
        }
    }

    pub fn apply(&self, elements: &mut Elements) {
        elements.rsne = Some(self.rsne.clone());
        elements.ftie = Some(self.ftie.as_bytes().to_vec());
        elements.timeout_interval = Some(self.timeout_interval.as_bytes().to_vec());
    }
}

/// Addressing of a TPK handshake, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeAddrs {
    pub initiator: MacAddr,
    pub responder: MacAddr,
    pub bssid: Bssid,
}

impl HandshakeAddrs {
    pub fn link_id(&self) -> LinkIdentifier {
        LinkIdentifier { bssid: self.bssid, initiator: self.initiator, responder: self.responder }
    }
}

/// Checks the Link Identifier of a received frame against our BSS.
pub fn validate_link_id(body: Option<&[u8]>, bssid: &Bssid) -> Result<LinkIdentifier, StatusCode> {
    let link_id = body
        .and_then(|body| LinkIdentifier::parse(body).ok())
        .ok_or(StatusCode::NOT_IN_SAME_BSS)?;
    if link_id.bssid != *bssid {
        return Err(StatusCode::NOT_IN_SAME_BSS);
    }
    Ok(link_id)
}

/// Checks the Link Identifier of a received frame against our BSS and the addresses of both
/// stations in their handshake roles.
pub fn validate_link_id_for(
    body: Option<&[u8]>,
    addrs: &HandshakeAddrs,
) -> Result<LinkIdentifier, StatusCode> {
    let link_id = validate_link_id(body, &addrs.bssid)?;
    if link_id.initiator != addrs.initiator || link_id.responder != addrs.responder {
        return Err(StatusCode::NOT_IN_SAME_BSS);
    }
    Ok(link_id)
}

fn validate_timeout_interval(body: Option<&[u8]>) -> Result<TimeoutInterval, StatusCode> {
    match body.and_then(TimeoutInterval::parse) {
        Some(ti) if ti.ti_type == TimeoutInterval::KEY_LIFETIME => Ok(ti),
        _ => Err(StatusCode::UNACCEPTABLE_LIFETIME),
    }
}

fn parse_ftie(body: Option<&[u8]>) -> Result<Ftie, StatusCode> {
    let ftie = body.and_then(Ftie::parse).ok_or(StatusCode::INVALID_FTIE)?;
    if ftie.mic_control != [0; 2] {
        return Err(StatusCode::INVALID_FTIE);
    }
    Ok(ftie)
}

// IEEE Std 802.11-2016, 12.7.8.4.2

/// Security parameters offered by the initiator of a Setup Request.
#[derive(Debug, Clone, PartialEq)]
pub struct Msg1 {
    pub snonce: Nonce,
    pub key_lifetime: u32,
}

pub fn validate_msg1(elements: &Elements) -> Result<Msg1, StatusCode> {
    rsne::validate_tdls_rsne(elements.rsne.as_deref())?;

    let ftie = parse_ftie(elements.ftie.as_deref())?;
    if ftie.mic != [0; MIC_LEN] || ftie.anonce != [0; NONCE_LEN] {
        return Err(StatusCode::INVALID_FTIE);
    }

    // Any lifetime is accepted here. The responder echoes it back.
    let ti = validate_timeout_interval(elements.timeout_interval.as_deref())?;
    Ok(Msg1 { snonce: ftie.snonce, key_lifetime: ti.value.get() })
}

pub fn build_msg1(snonce: &Nonce, key_lifetime: u32) -> SecurityElements {
    SecurityElements::new(Ftie::new([0; NONCE_LEN], *snonce), key_lifetime)
}

/// Builds the security elements of a Setup Response. The TPK is derived by the caller and
/// retained in the entry for confirming message 3.
pub fn build_msg2(
    tpk: &Tpk,
    addrs: &HandshakeAddrs,
    anonce: &Nonce,
    snonce: &Nonce,
    key_lifetime: u32,
) -> Result<SecurityElements, Error> {
    build_with_mic(tpk, addrs, SEQ_SETUP_RESPONSE, anonce, snonce, key_lifetime)
}

pub fn build_msg3(
    tpk: &Tpk,
    addrs: &HandshakeAddrs,
    anonce: &Nonce,
    snonce: &Nonce,
    key_lifetime: u32,
) -> Result<SecurityElements, Error> {
    build_with_mic(tpk, addrs, SEQ_SETUP_CONFIRM, anonce, snonce, key_lifetime)
}

fn build_with_mic(
    tpk: &Tpk,
    addrs: &HandshakeAddrs,
    seq: u8,
    anonce: &Nonce,
    snonce: &Nonce,
    key_lifetime: u32,
) -> Result<SecurityElements, Error> {
    let mut elements = SecurityElements::new(Ftie::new(*anonce, *snonce), key_lifetime);
    elements.ftie.mic = setup_mic_input(
        &addrs.initiator,
        &addrs.responder,
        seq,
        &addrs.link_id(),
        &elements.rsne[..],
        &elements.timeout_interval,
        &elements.ftie,
    )
    .compute(tpk.kck())?;
    Ok(elements)
}

/// Outcome of a verified Setup Response, as seen by the initiator.
#[derive(Debug)]
pub struct Msg2 {
    pub anonce: Nonce,
    pub key_lifetime: u32,
    pub tpk: Tpk,
}

/// Validates message 2 on the initiator. Policy failures surface as `Error::Status`, a bad
/// MIC as `Error::MicMismatch`.
pub fn validate_msg2(
    elements: &Elements,
    addrs: &HandshakeAddrs,
    snonce: &Nonce,
    min_key_lifetime: u32,
) -> Result<Msg2, Error> {
    let rsne_body = elements.rsne.as_deref();
    rsne::validate_tdls_rsne(rsne_body)?;

    let ftie = parse_ftie(elements.ftie.as_deref())?;
    if ftie.snonce != *snonce {
        return Err(StatusCode::INVALID_FTIE.into());
    }

    let ti = validate_timeout_interval(elements.timeout_interval.as_deref())?;
    if ti.value.get() < min_key_lifetime {
        return Err(StatusCode::UNACCEPTABLE_LIFETIME.into());
    }

    let tpk = Tpk::derive(&addrs.initiator, &addrs.responder, &ftie.anonce, snonce, &addrs.bssid)?;
    setup_mic_input(
        &addrs.initiator,
        &addrs.responder,
        SEQ_SETUP_RESPONSE,
        &addrs.link_id(),
        rsne_body.unwrap_or(&[]),
        &ti,
        &ftie,
    )
    .verify(tpk.kck(), &ftie.mic[..])?;

    Ok(Msg2 { anonce: ftie.anonce, key_lifetime: ti.value.get(), tpk })
}

/// Validates message 3 on the responder against the TPK derived when message 2 was sent.
pub fn validate_msg3(
    elements: &Elements,
    addrs: &HandshakeAddrs,
    tpk: &Tpk,
    anonce: &Nonce,
    snonce: &Nonce,
    key_lifetime: u32,
) -> Result<(), Error> {
    let rsne_body = elements.rsne.as_deref();
    rsne::validate_tdls_rsne(rsne_body)?;

    let ftie = parse_ftie(elements.ftie.as_deref())?;
    if ftie.snonce != *snonce || ftie.anonce != *anonce {
        return Err(StatusCode::INVALID_FTIE.into());
    }

    let ti = validate_timeout_interval(elements.timeout_interval.as_deref())?;
    if ti.value.get() < key_lifetime {
        return Err(StatusCode::UNACCEPTABLE_LIFETIME.into());
    }

    setup_mic_input(
        &addrs.initiator,
        &addrs.responder,
        SEQ_SETUP_CONFIRM,
        &addrs.link_id(),
        rsne_body.unwrap_or(&[]),
        &ti,
        &ftie,
    )
    .verify(tpk.kck(), &ftie.mic[..])
}

// IEEE Std 802.11-2016, 12.7.8.5.4
pub fn build_teardown_ftie(
    tpk: &Tpk,
    link_id: &LinkIdentifier,
    reason: ReasonCode,
    token: u8,
    anonce: &Nonce,
    snonce: &Nonce,
) -> Result<Ftie, Error> {
    let mut ftie = Ftie::new(*anonce, *snonce);
    ftie.mic = teardown_mic_input(link_id, reason, token, &ftie).compute(tpk.kck())?;
    Ok(ftie)
}

pub fn verify_teardown(
    elements: &Elements,
    tpk: &Tpk,
    link_id: &LinkIdentifier,
    reason: ReasonCode,
    token: u8,
) -> Result<(), Error> {
    let ftie = parse_ftie(elements.ftie.as_deref())?;
    teardown_mic_input(link_id, reason, token, &ftie).verify(tpk.kck(), &ftie.mic[..])
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches, test_case::test_case};

    const BSSID: Bssid = Bssid([0x0b; 6]);
    const MAC_I: MacAddr = [0x02, 0, 0, 0, 1, 0];
    const MAC_R: MacAddr = [0x02, 0, 0, 0, 2, 0];
    const ANONCE: Nonce = [0xa1; NONCE_LEN];
    const SNONCE: Nonce = [0x51; NONCE_LEN];
    const LIFETIME: u32 = 3600;

    fn addrs() -> HandshakeAddrs {
        HandshakeAddrs { initiator: MAC_I, responder: MAC_R, bssid: BSSID }
    }

    fn tpk() -> Tpk {
        Tpk::derive(&MAC_R, &MAC_I, &ANONCE, &SNONCE, &BSSID).expect("derive tpk")
    }

    fn to_elements(security: &SecurityElements) -> Elements {
        let mut elements = Elements::default();
        security.apply(&mut elements);
        elements
    }

    fn msg2_elements() -> Elements {
        to_elements(&build_msg2(&tpk(), &addrs(), &ANONCE, &SNONCE, LIFETIME).expect("msg2"))
    }

    fn msg3_elements() -> Elements {
        to_elements(&build_msg3(&tpk(), &addrs(), &ANONCE, &SNONCE, LIFETIME).expect("msg3"))
    }

    #[test]
    fn msg1_accepted() {
        let elements = to_elements(&build_msg1(&SNONCE, 7200));
        assert_eq!(validate_msg1(&elements), Ok(Msg1 { snonce: SNONCE, key_lifetime: 7200 }));
    }

    #[test]
    fn msg1_accepts_short_lifetime() {
        let elements = to_elements(&build_msg1(&SNONCE, 10));
        assert_matches!(validate_msg1(&elements), Ok(Msg1 { key_lifetime: 10, .. }));
    }

    #[test]
    fn msg1_empty_rsne() {
        let mut elements = to_elements(&build_msg1(&SNONCE, LIFETIME));
        elements.rsne = Some(vec![]);
        assert_eq!(validate_msg1(&elements), Err(StatusCode::INVALID_ELEMENT));
    }

    #[test]
    fn msg1_checks_rsne_before_ftie() {
        let mut elements = to_elements(&build_msg1(&SNONCE, LIFETIME));
        elements.rsne = None;
        elements.ftie = None;
        assert_eq!(validate_msg1(&elements), Err(StatusCode::INVALID_ELEMENT));
    }

    #[test_case(0; "mic control")]
    #[test_case(2; "mic")]
    #[test_case(18; "anonce")]
    fn msg1_ftie_must_be_zeroed(offset: usize) {
        let mut elements = to_elements(&build_msg1(&SNONCE, LIFETIME));
        if let Some(ftie) = elements.ftie.as_mut() {
            ftie[offset] = 1;
        }
        assert_eq!(validate_msg1(&elements), Err(StatusCode::INVALID_FTIE));
    }

    #[test]
    fn msg1_ftie_wrong_length() {
        let mut elements = to_elements(&build_msg1(&SNONCE, LIFETIME));
        if let Some(ftie) = elements.ftie.as_mut() {
            ftie.push(0);
        }
        assert_eq!(validate_msg1(&elements), Err(StatusCode::INVALID_FTIE));
    }

    #[test_case(vec![2, 0x10, 0x0e, 0]; "short")]
    #[test_case(vec![1, 0x10, 0x0e, 0, 0]; "reassociation deadline type")]
    fn msg1_bad_timeout_interval(ti: Vec<u8>) {
        let mut elements = to_elements(&build_msg1(&SNONCE, LIFETIME));
        elements.timeout_interval = Some(ti);
        assert_eq!(validate_msg1(&elements), Err(StatusCode::UNACCEPTABLE_LIFETIME));
    }

    #[test]
    fn msg2_accepted() {
        let msg2 = validate_msg2(&msg2_elements(), &addrs(), &SNONCE, LIFETIME).expect("msg2");
        assert_eq!(msg2.anonce, ANONCE);
        assert_eq!(msg2.key_lifetime, LIFETIME);
        assert_eq!(msg2.tpk, tpk());
    }

    #[test]
    fn msg2_snonce_not_echoed() {
        let result = validate_msg2(&msg2_elements(), &addrs(), &[0x52; NONCE_LEN], LIFETIME);
        assert_matches!(result, Err(Error::Status(StatusCode::INVALID_FTIE)));
    }

    #[test]
    fn msg2_lifetime_too_short() {
        let elements =
            to_elements(&build_msg2(&tpk(), &addrs(), &ANONCE, &SNONCE, 60).expect("msg2"));
        let result = validate_msg2(&elements, &addrs(), &SNONCE, LIFETIME);
        assert_matches!(result, Err(Error::Status(StatusCode::UNACCEPTABLE_LIFETIME)));
    }

    #[test]
    fn msg2_tampered_mic() {
        let mut elements = msg2_elements();
        if let Some(ftie) = elements.ftie.as_mut() {
            ftie[2] ^= 0x01;
        }
        let result = validate_msg2(&elements, &addrs(), &SNONCE, LIFETIME);
        assert_matches!(result, Err(Error::MicMismatch));
    }

    #[test]
    fn msg2_with_swapped_roles_fails_mic() {
        let swapped = HandshakeAddrs { initiator: MAC_R, responder: MAC_I, bssid: BSSID };
        let result = validate_msg2(&msg2_elements(), &swapped, &SNONCE, LIFETIME);
        assert_matches!(result, Err(Error::MicMismatch));
    }

    #[test]
    fn msg3_accepted() {
        assert_eq!(
            validate_msg3(&msg3_elements(), &addrs(), &tpk(), &ANONCE, &SNONCE, LIFETIME),
            Ok(())
        );
    }

    #[test]
    fn msg3_anonce_not_echoed() {
        let result =
            validate_msg3(&msg3_elements(), &addrs(), &tpk(), &[0; NONCE_LEN], &SNONCE, LIFETIME);
        assert_eq!(result, Err(Error::Status(StatusCode::INVALID_FTIE)));
    }

    #[test]
    fn msg3_lifetime_below_negotiated() {
        let result =
            validate_msg3(&msg3_elements(), &addrs(), &tpk(), &ANONCE, &SNONCE, LIFETIME + 1);
        assert_eq!(result, Err(Error::Status(StatusCode::UNACCEPTABLE_LIFETIME)));
    }

    #[test]
    fn msg3_rejects_msg2_mic() {
        // A confirm carrying the MIC computed for sequence number 2.
        let result = validate_msg3(&msg2_elements(), &addrs(), &tpk(), &ANONCE, &SNONCE, LIFETIME);
        assert_eq!(result, Err(Error::MicMismatch));
    }

    #[test]
    fn link_id_checks() {
        let link_id = addrs().link_id();
        assert_eq!(validate_link_id(Some(link_id.as_bytes()), &BSSID), Ok(link_id));
        assert_eq!(
            validate_link_id(Some(link_id.as_bytes()), &Bssid([1; 6])),
            Err(StatusCode::NOT_IN_SAME_BSS)
        );
        assert_eq!(
            validate_link_id(Some(&link_id.as_bytes()[..17]), &BSSID),
            Err(StatusCode::NOT_IN_SAME_BSS)
        );
        assert_eq!(validate_link_id(None, &BSSID), Err(StatusCode::NOT_IN_SAME_BSS));
    }

    #[test]
    fn link_id_roles_checked() {
        let link_id = addrs().link_id();
        assert_eq!(validate_link_id_for(Some(link_id.as_bytes()), &addrs()), Ok(link_id));

        let swapped = HandshakeAddrs { initiator: MAC_R, responder: MAC_I, bssid: BSSID };
        assert_eq!(
            validate_link_id_for(Some(link_id.as_bytes()), &swapped),
            Err(StatusCode::NOT_IN_SAME_BSS)
        );
        let other = LinkIdentifier { responder: [0x02, 0, 0, 0, 3, 0], ..link_id };
        assert_eq!(
            validate_link_id_for(Some(other.as_bytes()), &addrs()),
            Err(StatusCode::NOT_IN_SAME_BSS)
        );
    }

    #[test]
    fn teardown_mic() {
        let link_id = addrs().link_id();
        let reason = ReasonCode::TDLS_UNSPECIFIED_REASON;
        let ftie = build_teardown_ftie(&tpk(), &link_id, reason, 5, &ANONCE, &SNONCE)
            .expect("teardown ftie");
        let elements = Elements { ftie: Some(ftie.as_bytes().to_vec()), ..Default::default() };
        assert_eq!(verify_teardown(&elements, &tpk(), &link_id, reason, 5), Ok(()));
        assert_eq!(
            verify_teardown(&elements, &tpk(), &link_id, reason, 6),
            Err(Error::MicMismatch)
        );
        assert_eq!(
            verify_teardown(&elements, &tpk(), &link_id, ReasonCode::TDLS_PEER_UNREACHABLE, 5),
            Err(Error::MicMismatch)
        );
    }

    #[test]
    fn nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
