// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// enhancer-server — HTTP front end for the image enhancer.
//
// Accepts image uploads over plain HTTP/1.1, runs them through the
// enhancement pipeline, and returns PNG downloads or JSON metadata.

pub mod http;
pub mod routes;
pub mod server;
pub mod settings;

pub use routes::Router;
pub use server::EnhanceServer;
