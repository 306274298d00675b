// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::RsnCapabilities,
    crate::{error::FrameParseError, mac::StatusCode},
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::io::{Cursor, Read},
};

pub const OUI_DOT11: [u8; 3] = [0x00, 0x0F, 0xAC];

// IEEE Std 802.11-2016, 9.4.2.25.2, Table 9-131
pub const CIPHER_CCMP_128: u8 = 4;
pub const CIPHER_GROUP_ADDRESSED_NOT_ALLOWED: u8 = 7;

// IEEE Std 802.11-2016, 9.4.2.25.3, Table 9-133
pub const AKM_TDLS: u8 = 7;

pub const RSNE_VERSION: u16 = 1;

const MAX_BODY_LEN: usize = 253;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Suite {
    pub oui: [u8; 3],
    pub suite_type: u8,
}

impl Suite {
    pub const fn dot11(suite_type: u8) -> Self {
        Self { oui: OUI_DOT11, suite_type }
    }
}

// IEEE Std 802.11-2016, 9.4.2.25.1
#[derive(PartialEq, Debug, Clone)]
pub struct Rsne {
    pub version: u16,
    pub group_data_cipher_suite: Option<Suite>,
    pub pairwise_cipher_suites: Vec<Suite>,
    pub akm_suites: Vec<Suite>,
    pub rsn_capabilities: Option<u16>,
}

impl Rsne {
    /// The single RSNE profile used in TDLS frames: no group cipher, CCMP-128 pairwise,
    /// TPK handshake AKM and PeerKey enabled.
    pub fn tdls() -> Self {
        let mut caps = RsnCapabilities(0);
        caps.set_peerkey_enabled(true);
        Rsne {
            version: RSNE_VERSION,
            group_data_cipher_suite: Some(Suite::dot11(CIPHER_GROUP_ADDRESSED_NOT_ALLOWED)),
            pairwise_cipher_suites: vec![Suite::dot11(CIPHER_CCMP_128)],
            akm_suites: vec![Suite::dot11(AKM_TDLS)],
            rsn_capabilities: Some(caps.value()),
        }
    }

    pub fn body_len(&self) -> usize {
        let mut len = 2;
        if self.group_data_cipher_suite.is_some() {
            len += 4;
        }
        len += 2 + 4 * self.pairwise_cipher_suites.len();
        len += 2 + 4 * self.akm_suites.len();
        if self.rsn_capabilities.is_some() {
            len += 2;
        }
        len
    }

    pub fn write_body(&self, buf: &mut Vec<u8>) {
        // Writes into a Vec are infallible.
        let _ = self.write_body_inner(buf);
    }

    fn write_body_inner(&self, buf: &mut Vec<u8>) -> std::io::Result<()> {
        buf.write_u16::<LittleEndian>(self.version)?;
        if let Some(suite) = self.group_data_cipher_suite.as_ref() {
            write_suite(buf, suite);
        }
        buf.write_u16::<LittleEndian>(self.pairwise_cipher_suites.len() as u16)?;
        self.pairwise_cipher_suites.iter().for_each(|s| write_suite(buf, s));
        buf.write_u16::<LittleEndian>(self.akm_suites.len() as u16)?;
        self.akm_suites.iter().for_each(|s| write_suite(buf, s));
        if let Some(caps) = self.rsn_capabilities {
            buf.write_u16::<LittleEndian>(caps)?;
        }
        Ok(())
    }
}

fn write_suite(buf: &mut Vec<u8>, suite: &Suite) {
    buf.extend_from_slice(&suite.oui[..]);
    buf.push(suite.suite_type);
}

fn remaining(rdr: &Cursor<&[u8]>) -> usize {
    rdr.get_ref().len().saturating_sub(rdr.position() as usize)
}

fn read_suite(rdr: &mut Cursor<&[u8]>) -> Result<Suite, FrameParseError> {
    if remaining(rdr) < 4 {
        return Err(FrameParseError("RSNE suite selector too short"));
    }
    let mut oui = [0; 3];
    rdr.read_exact(&mut oui).map_err(|_| FrameParseError("RSNE suite selector too short"))?;
    let suite_type = rdr.read_u8().map_err(|_| FrameParseError("RSNE suite selector too short"))?;
    Ok(Suite { oui, suite_type })
}

fn read_suite_list(rdr: &mut Cursor<&[u8]>) -> Result<Vec<Suite>, FrameParseError> {
    let count = rdr
        .read_u16::<LittleEndian>()
        .map_err(|_| FrameParseError("RSNE suite count too short"))?;
    (0..count).map(|_| read_suite(rdr)).collect()
}

/// Parses an RSNE body. Trailing PMKID and group management fields are ignored since TDLS
/// never carries them.
pub fn from_bytes(body: &[u8]) -> Result<Rsne, FrameParseError> {
    if body.len() > MAX_BODY_LEN {
        return Err(FrameParseError("RSNE too long"));
    }
    let mut rdr = Cursor::new(body);
    let version =
        rdr.read_u16::<LittleEndian>().map_err(|_| FrameParseError("RSNE too short"))?;
    let mut rsne = Rsne {
        version,
        group_data_cipher_suite: None,
        pairwise_cipher_suites: vec![],
        akm_suites: vec![],
        rsn_capabilities: None,
    };

    if remaining(&rdr) == 0 {
        return Ok(rsne);
    }
    rsne.group_data_cipher_suite = Some(read_suite(&mut rdr)?);

    if remaining(&rdr) == 0 {
        return Ok(rsne);
    }
    rsne.pairwise_cipher_suites = read_suite_list(&mut rdr)?;

    if remaining(&rdr) == 0 {
        return Ok(rsne);
    }
    rsne.akm_suites = read_suite_list(&mut rdr)?;

    if remaining(&rdr) < 2 {
        return Ok(rsne);
    }
    rsne.rsn_capabilities = rdr.read_u16::<LittleEndian>().ok();
    Ok(rsne)
}

/// Applies the TDLS RSNE policy to a received RSNE body.
/// Checks run in a fixed order and the first failure determines the returned status.
pub fn validate_tdls_rsne(body: Option<&[u8]>) -> Result<Rsne, StatusCode> {
    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return Err(StatusCode::INVALID_ELEMENT),
    };
    let rsne = from_bytes(body).map_err(|_| StatusCode::INVALID_ELEMENT)?;
    if rsne.version < RSNE_VERSION {
        return Err(StatusCode::UNSUPPORTED_RSNE_VERSION);
    }
    if !rsne.akm_suites.contains(&Suite::dot11(AKM_TDLS)) {
        return Err(StatusCode::INVALID_AKMP);
    }
    let caps = RsnCapabilities(rsne.rsn_capabilities.unwrap_or(0));
    if caps.no_pairwise() || !caps.peerkey_enabled() {
        return Err(StatusCode::INVALID_RSNE_CAPABILITIES);
    }
    Ok(rsne)
}
