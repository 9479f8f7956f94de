use chrono::NaiveDateTime;
use serde::Serialize;

use super::xml_utils::local_name;
use crate::core::DocumentError;

/// An extension element found under `cfdi:Complemento`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Complement {
    /// `tfd:TimbreFiscalDigital`, the certification stamp.
    Stamp(TimbreFiscalDigital),
    /// `nomina12:Nomina`.
    Payroll(RawComplement),
    /// `pago20:Pagos`.
    Payments(RawComplement),
    /// `implocal:ImpuestosLocales`.
    LocalTaxes(RawComplement),
    /// Anything else.
    Other(RawComplement),
}

impl Complement {
    pub fn as_stamp(&self) -> Option<&TimbreFiscalDigital> {
        match self {
            Self::Stamp(tfd) => Some(tfd),
            _ => None,
        }
    }

    /// Qualified element name as it appeared in the document.
    pub fn name(&self) -> &str {
        match self {
            Self::Stamp(_) => "tfd:TimbreFiscalDigital",
            Self::Payroll(raw) | Self::Payments(raw) | Self::LocalTaxes(raw) | Self::Other(raw) => {
                &raw.name
            }
        }
    }

    /// Classify a complement element by its local name.
    pub(crate) fn from_element(
        name: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<Self, DocumentError> {
        let raw = || RawComplement {
            name: name.to_string(),
            attributes: attributes.clone(),
        };
        Ok(match local_name(name) {
            "TimbreFiscalDigital" => Self::Stamp(TimbreFiscalDigital::from_attributes(&attributes)?),
            "Nomina" => Self::Payroll(raw()),
            "Pagos" => Self::Payments(raw()),
            "ImpuestosLocales" => Self::LocalTaxes(raw()),
            _ => Self::Other(raw()),
        })
    }
}

/// A complement this crate does not model: its name and top-level attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawComplement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl RawComplement {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// `TimbreFiscalDigital` 1.1 as parsed from a stamped document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimbreFiscalDigital {
    pub version: String,
    pub uuid: String,
    pub fecha_timbrado: NaiveDateTime,
    pub rfc_prov_certif: String,
    pub leyenda: Option<String>,
    pub sello_cfd: String,
    pub no_certificado_sat: String,
    pub sello_sat: String,
}

impl TimbreFiscalDigital {
    fn from_attributes(attributes: &[(String, String)]) -> Result<Self, DocumentError> {
        let get = |key: &str| {
            attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| DocumentError::Missing(format!("TimbreFiscalDigital@{key}")))
        };

        let fecha = required("FechaTimbrado")?;
        let fecha_timbrado = NaiveDateTime::parse_from_str(&fecha, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| DocumentError::InvalidValue {
                field: "TimbreFiscalDigital@FechaTimbrado".into(),
                value: fecha.clone(),
            })?;

        Ok(Self {
            version: get("Version").unwrap_or_else(|| crate::core::TFD_VERSION.to_string()),
            uuid: required("UUID")?,
            fecha_timbrado,
            rfc_prov_certif: required("RfcProvCertif")?,
            leyenda: get("Leyenda"),
            sello_cfd: required("SelloCFD")?,
            no_certificado_sat: required("NoCertificadoSAT")?,
            sello_sat: required("SelloSAT")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn tfd_attrs() -> Vec<(String, String)> {
        attrs(&[
            ("Version", "1.1"),
            ("UUID", "25D0B1B7-2FAE-4E92-BDE1-CF26AA1FBA22"),
            ("FechaTimbrado", "2022-03-14T10:11:12"),
            ("RfcProvCertif", "SPR190613I52"),
            ("SelloCFD", "c2VsbG9DRkQ="),
            ("NoCertificadoSAT", "30001000000400002495"),
            ("SelloSAT", "c2VsbG9TQVQ="),
        ])
    }

    #[test]
    fn stamp_element_becomes_stamp_variant() {
        let c = Complement::from_element("tfd:TimbreFiscalDigital", tfd_attrs()).unwrap();
        let tfd = c.as_stamp().unwrap();
        assert_eq!(tfd.uuid, "25D0B1B7-2FAE-4E92-BDE1-CF26AA1FBA22");
        assert_eq!(tfd.leyenda, None);
        assert_eq!(tfd.fecha_timbrado.to_string(), "2022-03-14 10:11:12");
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        let mut a = tfd_attrs();
        a[2].1 = "2022-03-14T10:11:12.345".into();
        assert!(Complement::from_element("tfd:TimbreFiscalDigital", a).is_ok());
    }

    #[test]
    fn missing_uuid_is_reported() {
        let a: Vec<_> = tfd_attrs().into_iter().filter(|(k, _)| k != "UUID").collect();
        assert_eq!(
            Complement::from_element("tfd:TimbreFiscalDigital", a),
            Err(DocumentError::Missing("TimbreFiscalDigital@UUID".into()))
        );
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let mut a = tfd_attrs();
        a[2].1 = "14/03/2022".into();
        assert!(matches!(
            Complement::from_element("tfd:TimbreFiscalDigital", a),
            Err(DocumentError::InvalidValue { .. })
        ));
    }

    #[test]
    fn known_complements_are_classified() {
        let nomina = Complement::from_element("nomina12:Nomina", attrs(&[("Version", "1.2")]))
            .unwrap();
        assert!(matches!(nomina, Complement::Payroll(_)));
        assert_eq!(nomina.name(), "nomina12:Nomina");

        let pagos = Complement::from_element("pago20:Pagos", vec![]).unwrap();
        assert!(matches!(pagos, Complement::Payments(_)));

        let implocal =
            Complement::from_element("implocal:ImpuestosLocales", vec![]).unwrap();
        assert!(matches!(implocal, Complement::LocalTaxes(_)));

        let other = Complement::from_element("leyendasFisc:LeyendasFiscales", vec![]).unwrap();
        assert!(matches!(other, Complement::Other(_)));
        assert!(other.as_stamp().is_none());
    }

    #[test]
    fn raw_attribute_lookup() {
        let c = Complement::from_element("nomina12:Nomina", attrs(&[("TipoNomina", "O")]))
            .unwrap();
        let Complement::Payroll(raw) = c else {
            panic!("expected payroll");
        };
        assert_eq!(raw.attribute("TipoNomina"), Some("O"));
        assert_eq!(raw.attribute("Version"), None);
    }
}
