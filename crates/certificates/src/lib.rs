//! `certportal-certificates` — the issued credential, one-to-one with a
//! completed application.

pub mod certificate;

pub use certificate::{Certificate, CertificateId, CertificateStatus, ValidityPolicy};
