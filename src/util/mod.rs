// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Common utility functions.

mod certificates;
mod env;
mod from_msg_data;
mod network;

pub use certificates::create_single_cert_server_config;
pub use env::*;
pub use from_msg_data::DeserializeMsgData;
pub use network::*;
