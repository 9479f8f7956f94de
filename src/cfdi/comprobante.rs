use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::xml_utils::local_name;
use super::{Complement, Document};
use crate::core::DocumentError;

/// Minimal read-only view of a CFDI `Comprobante`.
///
/// Keeps the exact bytes it was read from, so serializing it again sends
/// the document unchanged (the signature covers those bytes).
#[derive(Debug, Clone)]
pub struct Cfdi {
    pub version: Option<String>,
    pub serie: Option<String>,
    pub folio: Option<String>,
    pub fecha: Option<String>,
    pub total: Option<String>,
    pub moneda: Option<String>,
    pub tipo_de_comprobante: Option<String>,
    pub no_certificado: Option<String>,
    pub emisor_rfc: Option<String>,
    pub receptor_rfc: Option<String>,
    pub complements: Vec<Complement>,
    raw: Vec<u8>,
}

impl Cfdi {
    pub fn from_xml_str(xml: &str) -> Result<Self, DocumentError> {
        Self::from_xml_bytes(xml.as_bytes())
    }

    /// The bytes this document was parsed from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl Document for Cfdi {
    fn to_xml_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(self.raw.clone())
    }

    fn from_xml_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let xml =
            std::str::from_utf8(bytes).map_err(|e| DocumentError::Encoding(e.to_string()))?;
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut cfdi = Cfdi {
            version: None,
            serie: None,
            folio: None,
            fecha: None,
            total: None,
            moneda: None,
            tipo_de_comprobante: None,
            no_certificado: None,
            emisor_rfc: None,
            receptor_rfc: None,
            complements: Vec::new(),
            raw: bytes.to_vec(),
        };
        let mut path: Vec<String> = Vec::new();
        let mut seen_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = element_name(e);
                    cfdi.handle_element(&path, &name, e, &mut seen_root)?;
                    path.push(name);
                }
                Ok(Event::Empty(ref e)) => {
                    let name = element_name(e);
                    cfdi.handle_element(&path, &name, e, &mut seen_root)?;
                }
                Ok(Event::End(_)) => {
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(DocumentError::Xml(format!(
                        "parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                _ => {}
            }
        }

        if !seen_root {
            return Err(DocumentError::Missing("cfdi:Comprobante root element".into()));
        }
        Ok(cfdi)
    }

    fn complements(&self) -> &[Complement] {
        &self.complements
    }
}

impl Cfdi {
    fn handle_element(
        &mut self,
        path: &[String],
        name: &str,
        e: &BytesStart<'_>,
        seen_root: &mut bool,
    ) -> Result<(), DocumentError> {
        let local = local_name(name);
        let parent = path.last().map(|p| local_name(p));

        match (path.len(), parent, local) {
            (0, _, "Comprobante") => {
                *seen_root = true;
                for (k, v) in attributes(e)? {
                    match k.as_str() {
                        "Version" => self.version = Some(v),
                        "Serie" => self.serie = Some(v),
                        "Folio" => self.folio = Some(v),
                        "Fecha" => self.fecha = Some(v),
                        "Total" => self.total = Some(v),
                        "Moneda" => self.moneda = Some(v),
                        "TipoDeComprobante" => self.tipo_de_comprobante = Some(v),
                        "NoCertificado" => self.no_certificado = Some(v),
                        _ => {}
                    }
                }
            }
            (0, _, _) => {
                return Err(DocumentError::Missing(format!(
                    "cfdi:Comprobante root element (found {name})"
                )));
            }
            (1, _, "Emisor") => self.emisor_rfc = attribute(e, "Rfc")?,
            (1, _, "Receptor") => self.receptor_rfc = attribute(e, "Rfc")?,
            (2, Some("Complemento"), _) => {
                let attrs = attributes(e)?
                    .into_iter()
                    .filter(|(k, _)| !k.starts_with("xmlns") && !k.starts_with("xsi:"))
                    .collect();
                self.complements.push(Complement::from_element(name, attrs)?);
            }
            _ => {}
        }
        Ok(())
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, DocumentError> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|err| DocumentError::Xml(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| DocumentError::Xml(err.to_string()))?
                .into_owned();
            Ok((key, value))
        })
        .collect()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, DocumentError> {
    Ok(attributes(e)?.into_iter().find(|(k, _)| k == key).map(|(_, v)| v))
}
