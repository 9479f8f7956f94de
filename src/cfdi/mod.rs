//! The document contract the client relies on, plus a minimal CFDI reader.
//!
//! A full CFDI object model (concepts, taxes, signing) lives outside this
//! crate. The client only needs to turn a document into bytes, read the
//! stamped document back, and look through its complements. Any type that
//! implements [`Document`] can be plugged into
//! [`StampClient`](crate::client::StampClient).
//!
//! # Example
//!
//! ```
//! use dfacture::cfdi::{Cfdi, Document};
//!
//! let xml = r#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Version="4.0"/>"#;
//! let cfdi = Cfdi::from_xml_str(xml).unwrap();
//! assert!(cfdi.find_stamp().is_none());
//! ```

mod complement;
mod comprobante;
pub(crate) mod xml_utils;

pub use complement::{Complement, RawComplement, TimbreFiscalDigital};
pub use comprobante::Cfdi;

use crate::core::DocumentError;

/// A tax document that can be sent to and read back from the stamping service.
pub trait Document: Sized {
    /// Canonical XML bytes, exactly as signed.
    fn to_xml_bytes(&self) -> Result<Vec<u8>, DocumentError>;

    /// Parse a document returned by the service.
    fn from_xml_bytes(bytes: &[u8]) -> Result<Self, DocumentError>;

    /// Complements in document order.
    fn complements(&self) -> &[Complement];

    /// First `TimbreFiscalDigital` among the complements.
    fn find_stamp(&self) -> Option<&TimbreFiscalDigital> {
        self.complements().iter().find_map(Complement::as_stamp)
    }
}
