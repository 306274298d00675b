// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{Header, Id},
    zerocopy::{ByteSlice, LayoutVerified},
};

/// Iterates over a chain of IEs, yielding each element's id and body.
/// Iteration stops at the first element whose body runs past the end of the buffer.
pub struct Reader<B> {
    remaining: Option<B>,
}

impl<B: ByteSlice> Reader<B> {
    pub fn new(bytes: B) -> Self {
        Reader { remaining: Some(bytes) }
    }
}

impl<B: ByteSlice> Iterator for Reader<B> {
    type Item = (Id, B);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.remaining.take()?;
        let (header, rest) = LayoutVerified::<B, Header>::new_unaligned_from_prefix(bytes)?;
        let body_len = header.body_len as usize;
        if rest.len() < body_len {
            return None;
        }
        let (body, rest) = rest.split_at(body_len);
        self.remaining = Some(rest);
        Some((header.id, body))
    }
}
