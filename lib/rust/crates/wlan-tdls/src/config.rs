// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::event::{DEFAULT_SETUP_TIMEOUT, DEFAULT_TRAFFIC_RESPONSE_TIMEOUT},
    std::time::Duration,
};

/// TDLS_KEY_TIMEOUT: the shortest key lifetime accepted in a Setup Response.
pub const MIN_KEY_LIFETIME_SECONDS: u32 = 3600;
/// MAX_NUM_OF_TDLS_ENTRY
pub const MAX_NUM_OF_TDLS_ENTRY: usize = 8;

// IEEE Std 802.11-2016, 9.4.1.4: ESS, short preamble, short slot time.
pub const DEFAULT_CAPABILITY_INFO: u16 = 0x0421;

// IEEE Std 802.11-2016, 9.4.1.17: U-APSD for all four access categories.
pub const DEFAULT_QOS_INFO: u8 = 0x0f;

// WMM Parameter element body: OUI 00-50-F2, type 2, subtype 1, version 1, QoS info,
// reserved, then the BE, BK, VI and VO parameter records.
pub const DEFAULT_WMM_PARAMETER: [u8; 24] = [
    0x00, 0x50, 0xf2, 0x02, 0x01, 0x01, DEFAULT_QOS_INFO, 0x00, //
    0x03, 0xa4, 0x00, 0x00, //
    0x27, 0xa4, 0x00, 0x00, //
    0x42, 0x43, 0x5e, 0x00, //
    0x62, 0x32, 0x2f, 0x00,
];

#[derive(Debug, Clone, PartialEq)]
pub struct TdlsConfig {
    /// When disabled, no RSNE, FTIE or Timeout Interval is exchanged and no key installed.
    pub security_enabled: bool,
    /// Lifetime offered in Setup Requests, in seconds.
    pub key_lifetime: u32,
    pub min_key_lifetime: u32,
    pub setup_timeout: Duration,
    pub traffic_response_timeout: Duration,
    pub max_entries: usize,
    pub capability_info: u16,
    pub supported_rates: Vec<u8>,
    pub ext_supported_rates: Vec<u8>,
    pub ht_capabilities: Option<[u8; 26]>,
    /// Sent in the Setup Confirm when both peers support HT.
    pub ht_operation: Option<[u8; 22]>,
    pub ext_capabilities: Option<Vec<u8>>,
    /// Body of the QoS Capability element.
    pub qos_info: Option<u8>,
    /// Body of the WMM Parameter element sent in the Setup Confirm.
    pub wmm_parameter: Option<Vec<u8>>,
    pub auto_link: AutoLinkConfig,
}

impl Default for TdlsConfig {
    fn default() -> Self {
        Self {
            security_enabled: true,
            key_lifetime: MIN_KEY_LIFETIME_SECONDS,
            min_key_lifetime: MIN_KEY_LIFETIME_SECONDS,
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
            traffic_response_timeout: DEFAULT_TRAFFIC_RESPONSE_TIMEOUT,
            max_entries: MAX_NUM_OF_TDLS_ENTRY,
            capability_info: DEFAULT_CAPABILITY_INFO,
            supported_rates: vec![0x82, 0x84, 0x8b, 0x96, 0x0c, 0x12, 0x18, 0x24],
            ext_supported_rates: vec![0x30, 0x48, 0x60, 0x6c],
            ht_capabilities: None,
            ht_operation: None,
            // Extended Capabilities with TDLS Support (bit 37) set.
            ext_capabilities: Some(vec![0, 0, 0, 0, 0x20]),
            qos_info: Some(DEFAULT_QOS_INFO),
            wmm_parameter: Some(DEFAULT_WMM_PARAMETER.to_vec()),
            auto_link: AutoLinkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoLinkConfig {
    pub enabled: bool,
    /// dBm; links are set up above this signal strength.
    pub setup_rssi_threshold: i8,
    /// dBm; links are torn down below this signal strength.
    pub teardown_rssi_threshold: i8,
    pub teardown_retry_count: u8,
    /// Number of samples of the RSSI moving average.
    pub ewma_weight: u8,
}

impl Default for AutoLinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            setup_rssi_threshold: -60,
            teardown_rssi_threshold: -80,
            teardown_retry_count: 2,
            ewma_weight: 4,
        }
    }
}
