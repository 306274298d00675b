// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {super::Id, crate::error::FrameWriteError};

const IE_MAX_BODY_LEN: usize = 255;

pub fn write_ie(buf: &mut Vec<u8>, id: Id, body: &[u8]) -> Result<(), FrameWriteError> {
    if body.len() > IE_MAX_BODY_LEN {
        return Err(FrameWriteError("element body too long"));
    }
    buf.push(id.0);
    buf.push(body.len() as u8);
    buf.extend_from_slice(body);
    Ok(())
}

/// Writes any optional element whose body is present.
pub fn write_opt_ie(
    buf: &mut Vec<u8>,
    id: Id,
    body: Option<&[u8]>,
) -> Result<(), FrameWriteError> {
    match body {
        Some(body) => write_ie(buf, id, body),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_ie_header() {
        let mut buf = vec![];
        write_ie(&mut buf, Id::QOS_CAPABILITY, &[0x0f]).expect("write ie");
        assert_eq!(&buf[..], &[46, 1, 0x0f][..]);
    }

    #[test]
    fn write_ie_too_long() {
        let mut buf = vec![];
        assert!(write_ie(&mut buf, Id::VENDOR_SPECIFIC, &[0; 256][..]).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn write_optional_element() {
        let mut buf = vec![];
        write_opt_ie(&mut buf, Id::HT_CAPABILITIES, None).expect("skip");
        assert!(buf.is_empty());
        write_opt_ie(&mut buf, Id::BSS_COEXISTENCE, Some(&[1][..])).expect("write");
        assert_eq!(&buf[..], &[72, 1, 1][..]);
    }
}
