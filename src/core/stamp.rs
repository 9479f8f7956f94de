use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use super::DocumentError;
use crate::cfdi::TimbreFiscalDigital;
use crate::cfdi::xml_utils::XmlWriter;

/// `tfd` namespace URI.
pub const TFD_NAMESPACE: &str = "http://www.sat.gob.mx/TimbreFiscalDigital";

/// Schema location of `TimbreFiscalDigital` 1.1.
pub const TFD_SCHEMA_LOCATION: &str = "http://www.sat.gob.mx/TimbreFiscalDigital http://www.sat.gob.mx/sitio_internet/cfd/TimbreFiscalDigital/TimbreFiscalDigitalv11.xsd";

/// Version written on rendered stamps.
pub const TFD_VERSION: &str = "1.1";

/// Date-time layout used by `FechaTimbrado`.
pub const FECHA_TIMBRADO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The stamp issued by the certification provider for a registered document.
///
/// Only returned by successful stamp and retrieval calls. It is a detached
/// copy of the seven authoritative `TimbreFiscalDigital` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct StampResult {
    /// Folio fiscal of the stamped document (`UUID`).
    pub uuid: String,
    /// Stamping time, local to the provider (`FechaTimbrado`).
    pub fecha_timbrado: NaiveDateTime,
    /// Signature of the issuer over the document (`SelloCFD`).
    pub sello_cfd: String,
    /// Serial number of the SAT certificate used to stamp (`NoCertificadoSAT`).
    pub no_certificado_sat: String,
    /// SAT signature over the stamp (`SelloSAT`).
    pub sello_sat: String,
    /// Optional legal disclaimer (`Leyenda`).
    pub leyenda: Option<String>,
    /// RFC of the certification provider (`RfcProvCertif`).
    pub rfc_prov_certif: String,
}

impl StampResult {
    pub(crate) fn from_complement(tfd: &TimbreFiscalDigital) -> Self {
        Self {
            uuid: tfd.uuid.clone(),
            fecha_timbrado: tfd.fecha_timbrado,
            sello_cfd: tfd.sello_cfd.clone(),
            no_certificado_sat: tfd.no_certificado_sat.clone(),
            sello_sat: tfd.sello_sat.clone(),
            leyenda: tfd.leyenda.clone(),
            rfc_prov_certif: tfd.rfc_prov_certif.clone(),
        }
    }

    /// Cadena original del complemento de certificación.
    ///
    /// `||1.1|UUID|FechaTimbrado|RfcProvCertif|[Leyenda|]SelloCFD|NoCertificadoSAT||`
    pub fn original_string(&self) -> String {
        let mut s = format!(
            "||{TFD_VERSION}|{}|{}|{}|",
            self.uuid,
            self.fecha_timbrado.format(FECHA_TIMBRADO_FORMAT),
            self.rfc_prov_certif
        );
        if let Some(leyenda) = self.leyenda.as_deref().filter(|l| !l.is_empty()) {
            s.push_str(leyenda);
            s.push('|');
        }
        s.push_str(&self.sello_cfd);
        s.push('|');
        s.push_str(&self.no_certificado_sat);
        s.push_str("||");
        s
    }

    /// Render the stamp as a standalone `tfd:TimbreFiscalDigital` element.
    pub fn to_xml_string(&self) -> Result<String, DocumentError> {
        let fecha = self.fecha_timbrado.format(FECHA_TIMBRADO_FORMAT).to_string();
        let mut attrs: Vec<(&str, &str)> = vec![
            ("xmlns:tfd", TFD_NAMESPACE),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ("xsi:schemaLocation", TFD_SCHEMA_LOCATION),
            ("Version", TFD_VERSION),
            ("UUID", self.uuid.as_str()),
            ("FechaTimbrado", fecha.as_str()),
            ("RfcProvCertif", self.rfc_prov_certif.as_str()),
        ];
        if let Some(leyenda) = &self.leyenda {
            attrs.push(("Leyenda", leyenda.as_str()));
        }
        attrs.push(("SelloCFD", self.sello_cfd.as_str()));
        attrs.push(("NoCertificadoSAT", self.no_certificado_sat.as_str()));
        attrs.push(("SelloSAT", self.sello_sat.as_str()));

        let mut w = XmlWriter::new()?;
        w.empty_element_with_attrs("tfd:TimbreFiscalDigital", &attrs)?;
        w.into_string()
    }
}

impl fmt::Display for StampResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original_string())
    }
}
