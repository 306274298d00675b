// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        error::Error,
        ie::NONCE_LEN,
        mac::{Bssid, MacAddr},
    },
    hmac::{Hmac, Mac, NewMac},
    sha2::{Digest, Sha256},
    std::{cmp, fmt},
    zeroize::Zeroize,
};

pub const TPK_LEN: usize = 32;
pub const KCK_LEN: usize = 16;
pub const TK_LEN: usize = 16;
pub const TPK_NAME_LEN: usize = 16;

const TPK_LABEL: &[u8] = b"TDLS PMK";
const TPK_NAME_LABEL: &[u8] = b"TDLS PMKN";

// IEEE Std 802.11-2016, 12.7.1.7.2
fn kdf_sha256(key: &[u8], label: &[u8], context: &[u8], bits: u16) -> Result<Vec<u8>, Error> {
    let len = (bits as usize + 7) / 8;
    let mut out = Vec::with_capacity(len + 32);
    let mut i: u16 = 1;
    while out.len() < len {
        let mut hmac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|e| Error::Crypto(format!("invalid KDF key: {}", e)))?;
        hmac.update(&i.to_le_bytes()[..]);
        hmac.update(label);
        hmac.update(context);
        hmac.update(&bits.to_le_bytes()[..]);
        out.extend_from_slice(&hmac.finalize().into_bytes()[..]);
        i += 1;
    }
    out.truncate(len);
    Ok(out)
}

/// TDLS Peer Key. The first half is the KCK protecting handshake MICs, the second half the
/// TK installed for the direct link. Key material is cleared when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct Tpk {
    key: [u8; TPK_LEN],
    name: [u8; TPK_NAME_LEN],
}

impl Tpk {
    // IEEE Std 802.11-2016, 12.7.8.5.1
    pub fn derive(
        initiator: &MacAddr,
        responder: &MacAddr,
        anonce: &[u8; NONCE_LEN],
        snonce: &[u8; NONCE_LEN],
        bssid: &Bssid,
    ) -> Result<Self, Error> {
        let (nonce_lo, nonce_hi) = ordered(&snonce[..], &anonce[..]);
        let mut key_input = Sha256::new();
        key_input.update(nonce_lo);
        key_input.update(nonce_hi);
        let mut key_input = key_input.finalize();

        let (addr_lo, addr_hi) = ordered(&initiator[..], &responder[..]);
        let mut context = Vec::with_capacity(18);
        context.extend_from_slice(addr_lo);
        context.extend_from_slice(addr_hi);
        context.extend_from_slice(&bssid.0[..]);

        let mut derived = kdf_sha256(&key_input[..], TPK_LABEL, &context[..], 8 * TPK_LEN as u16)?;
        let mut key = [0u8; TPK_LEN];
        key.copy_from_slice(&derived[..]);
        derived[..].zeroize();

        let mut name_hash = Sha256::new();
        name_hash.update(&key_input[..]);
        name_hash.update(TPK_NAME_LABEL);
        name_hash.update(&context[..]);
        let mut name = [0u8; TPK_NAME_LEN];
        name.copy_from_slice(&name_hash.finalize()[..TPK_NAME_LEN]);
        key_input[..].zeroize();

        Ok(Self { key, name })
    }

    pub fn kck(&self) -> &[u8] {
        &self.key[..KCK_LEN]
    }

    pub fn tk(&self) -> &[u8] {
        &self.key[KCK_LEN..]
    }

    pub fn name(&self) -> &[u8; TPK_NAME_LEN] {
        &self.name
    }
}

impl Drop for Tpk {
    fn drop(&mut self) {
        self.key[..].zeroize();
        self.name[..].zeroize();
    }
}

impl fmt::Debug for Tpk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tpk { .. }")
    }
}

fn ordered<'a>(a: &'a [u8], b: &'a [u8]) -> (&'a [u8], &'a [u8]) {
    match a.cmp(b) {
        cmp::Ordering::Greater => (b, a),
        _ => (a, b),
    }
}
