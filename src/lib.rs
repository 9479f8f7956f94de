//! # dfacture
//!
//! Client for the DFacture CFDI 4.0 stamping service (`WSTimbradoSOAP`).
//!
//! A signed *comprobante* is sent to the certification provider, which
//! registers it with the SAT and returns it with a `TimbreFiscalDigital`
//! complement. This crate submits documents, recovers stamps by UUID and
//! cancels stamped documents. Building and signing the CFDI itself is the
//! caller's job.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dfacture::*;
//!
//! let config = ClientConfig::builder("DEMODaysoft", "cfdi")
//!     .url(URL_TEST)
//!     .build()?;
//! let client = StampClient::new(config);
//!
//! let stamp = client.get_stamp("H&E951128469", "25d0b1b7-2fae-4e92-bde1-cf26aa1fba22")?;
//! println!("{} stamped at {}", stamp.uuid, stamp.fecha_timbrado);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `http` (default) | Blocking `reqwest` transport ([`client::HttpTransport`]) |
//!
//! Without `http` the client still works over any [`client::Transport`].

pub mod cfdi;
pub mod client;
pub mod core;

// Re-export the everyday types at crate root
pub use crate::cfdi::{Cfdi, Complement, Document};
pub use crate::client::{ClientConfig, SecurityMode, StampClient, TrustPolicy, URL_PRODUCTION, URL_TEST};
pub use crate::core::*;
