// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        error::Error,
        ie::{Ftie, Id, LinkIdentifier, TimeoutInterval, MIC_LEN},
        mac::{MacAddr, ReasonCode},
    },
    aes::Aes128,
    cmac::{Cmac, Mac, NewMac},
    zerocopy::AsBytes,
};

// IEEE Std 802.11-2016, 12.7.8.5.2 and 12.7.8.5.3
pub const SEQ_SETUP_RESPONSE: u8 = 2;
pub const SEQ_SETUP_CONFIRM: u8 = 3;
pub const SEQ_TEARDOWN: u8 = 4;

/// Accumulates the MIC input of a TPK handshake message. Every element is appended with its
/// element header, exactly as it appears on the wire.
#[derive(Default)]
pub struct MicBuilder {
    buf: Vec<u8>,
}

impl MicBuilder {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(256) }
    }

    pub fn addr(mut self, addr: &MacAddr) -> Self {
        self.buf.extend_from_slice(&addr[..]);
        self
    }

    pub fn seq(mut self, seq: u8) -> Self {
        self.buf.push(seq);
        self
    }

    pub fn link_id(self, link_id: &LinkIdentifier) -> Self {
        self.element(Id::LINK_IDENTIFIER, link_id.as_bytes())
    }

    pub fn rsne(self, rsne_body: &[u8]) -> Self {
        self.element(Id::RSNE, rsne_body)
    }

    pub fn timeout_interval(self, ti: &TimeoutInterval) -> Self {
        self.element(Id::TIMEOUT_INTERVAL, ti.as_bytes())
    }

    pub fn ftie_zeroed_mic(self, ftie: &Ftie) -> Self {
        self.element(Id::FTIE, ftie.with_zeroed_mic().as_bytes())
    }

    pub fn reason_code(mut self, reason: ReasonCode) -> Self {
        self.buf.extend_from_slice(&reason.0.to_le_bytes()[..]);
        self
    }

    pub fn dialog_token(mut self, token: u8) -> Self {
        self.buf.push(token);
        self
    }

    fn element(mut self, id: Id, body: &[u8]) -> Self {
        self.buf.push(id.0);
        self.buf.push(body.len() as u8);
        self.buf.extend_from_slice(body);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf[..]
    }

    pub fn compute(&self, kck: &[u8]) -> Result<[u8; MIC_LEN], Error> {
        let mut mac = new_cmac(kck)?;
        mac.update(&self.buf[..]);
        let mut mic = [0u8; MIC_LEN];
        mic.copy_from_slice(&mac.finalize().into_bytes()[..]);
        Ok(mic)
    }

    /// Compares in constant time. A mismatch carries no detail about where it occurred.
    pub fn verify(&self, kck: &[u8], expected: &[u8]) -> Result<(), Error> {
        let mut mac = new_cmac(kck)?;
        mac.update(&self.buf[..]);
        mac.verify(expected).map_err(|_| Error::MicMismatch)
    }
}

fn new_cmac(kck: &[u8]) -> Result<Cmac<Aes128>, Error> {
    Cmac::<Aes128>::new_from_slice(kck).map_err(|e| Error::Crypto(format!("invalid KCK: {}", e)))
}

/// MIC input for TPK handshake messages 2 and 3. Both peers order the addresses by role,
/// initiator first.
pub fn setup_mic_input(
    initiator: &MacAddr,
    responder: &MacAddr,
    seq: u8,
    link_id: &LinkIdentifier,
    rsne_body: &[u8],
    ti: &TimeoutInterval,
    ftie: &Ftie,
) -> MicBuilder {
    MicBuilder::new()
        .addr(initiator)
        .addr(responder)
        .seq(seq)
        .link_id(link_id)
        .rsne(rsne_body)
        .timeout_interval(ti)
        .ftie_zeroed_mic(ftie)
}

/// MIC input for the Teardown frame of a secured link.
pub fn teardown_mic_input(
    link_id: &LinkIdentifier,
    reason: ReasonCode,
    token: u8,
    ftie: &Ftie,
) -> MicBuilder {
    MicBuilder::new()
        .link_id(link_id)
        .reason_code(reason)
        .dialog_token(token)
        .seq(SEQ_TEARDOWN)
        .ftie_zeroed_mic(ftie)
}
