//! Domain aggregates and master-data records.

pub mod bill;
pub mod master;
pub mod patient;
pub mod prescription;
pub mod visit;

pub use bill::{Bill, Payment, PaymentMode};
pub use master::{AdviceItem, Doctor, Dose, Medicine};
pub use patient::{Gender, Patient};
pub use prescription::{AdviceLine, MedicineLine, Prescription};
pub use visit::{Visit, VisitStatus, Vitals, VitalsUpdate};
