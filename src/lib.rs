// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! `tickagg` is a library of time-ordered aggregate kernels for columnar
//! query engines: `first_s(value, key)` returns the value paired with the
//! smallest ordering key observed in a group, `last_s` the value paired
//! with the largest. The host engine owns grouping, planning, scheduling
//! and row storage; this crate owns the per-group reduction states and
//! their bind-time type resolution.

pub mod common;
pub mod exec;
pub mod runtime;

pub use common::app_config as tickagg_config;
pub use common::logging as tickagg_logging;

pub use exec::expr::agg::registry;

/// One-shot initialization for embedding hosts: load the optional config
/// file and install the logging subscriber. Safe to call more than once.
pub fn init() {
    let cfg = tickagg_config::config_or_default();
    match cfg.log_filter.as_deref() {
        Some(filter) => tickagg_logging::init_with_level(filter),
        None => tickagg_logging::init_with_level(&cfg.log_level),
    }
}
