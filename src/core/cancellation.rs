//! Cancellation request and result types.
//!
//! Reasons follow the SAT catalog `c_MotivoCancelacion` used by CFDI 4.0.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SAT cancellation reason (`Motivo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellationReason {
    /// 01: issued with errors, replaced by a related document.
    ErrorsWithRelation,
    /// 02: issued with errors, no replacement.
    ErrorsWithoutRelation,
    /// 03: the operation did not take place.
    OperationNotCarriedOut,
    /// 04: nominative operation related to a global invoice.
    NominativeInGlobalInvoice,
}

impl CancellationReason {
    /// Two-digit code sent to the service.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ErrorsWithRelation => "01",
            Self::ErrorsWithoutRelation => "02",
            Self::OperationNotCarriedOut => "03",
            Self::NominativeInGlobalInvoice => "04",
        }
    }

    /// Reason `01` is the only one that names a substitute document.
    pub fn expects_related_uuid(&self) -> bool {
        matches!(self, Self::ErrorsWithRelation)
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown reason code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cancellation reason code {0:?}")]
pub struct UnknownReason(pub String);

impl FromStr for CancellationReason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "01" => Ok(Self::ErrorsWithRelation),
            "02" => Ok(Self::ErrorsWithoutRelation),
            "03" => Ok(Self::OperationNotCarriedOut),
            "04" => Ok(Self::NominativeInGlobalInvoice),
            other => Err(UnknownReason(other.to_string())),
        }
    }
}

/// Accepted cancellation state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CancellationStatus {
    /// 201: cancellation request accepted.
    Requested,
    /// 202: the document was already cancelled.
    PreviouslyCancelled,
    /// 214: request registered, waiting on the recipient or the SAT.
    InProcess,
}

impl CancellationStatus {
    /// Map a result code onto an accepted state. Other codes are rejections.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "201" => Some(Self::Requested),
            "202" => Some(Self::PreviouslyCancelled),
            "214" => Some(Self::InProcess),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Requested => "201",
            Self::PreviouslyCancelled => "202",
            Self::InProcess => "214",
        }
    }
}

/// Parameters of a cancellation call.
///
/// Certificate and private key are the issuer's CSD files, base64-encoded by
/// the caller. The total is sent exactly as given.
#[derive(Clone)]
pub struct CancellationRequest {
    pub issuer: String,
    pub recipient: String,
    pub uuid: String,
    pub total: String,
    pub certificate_base64: String,
    pub private_key_base64: String,
    pub private_key_password: String,
    pub reason: CancellationReason,
    /// Substitute document for reason `01`.
    pub related_uuid: Option<String>,
}

impl CancellationRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        issuer: impl Into<String>,
        recipient: impl Into<String>,
        uuid: impl Into<String>,
        total: impl Into<String>,
        certificate_base64: impl Into<String>,
        private_key_base64: impl Into<String>,
        private_key_password: impl Into<String>,
        reason: CancellationReason,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            recipient: recipient.into(),
            uuid: uuid.into(),
            total: total.into(),
            certificate_base64: certificate_base64.into(),
            private_key_base64: private_key_base64.into(),
            private_key_password: private_key_password.into(),
            reason,
            related_uuid: None,
        }
    }

    /// Set the substitute document (`FolioSustitucion`).
    pub fn related_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.related_uuid = Some(uuid.into());
        self
    }
}

impl fmt::Debug for CancellationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationRequest")
            .field("issuer", &self.issuer)
            .field("recipient", &self.recipient)
            .field("uuid", &self.uuid)
            .field("total", &self.total)
            .field("reason", &self.reason)
            .field("related_uuid", &self.related_uuid)
            .finish_non_exhaustive()
    }
}
