//! Billing applier: records the request's payment against the resolved bill.
//!
//! Discount and tax application happen during bill resolution; this module
//! covers the payment step. A payment is recorded only when the request
//! supplies one with an amount greater than zero.

use crate::actor::Actor;
use crate::entities::Bill;
use crate::workflow::request::PaymentRequest;
use crate::OpdResult;
use chrono::{DateTime, Utc};

pub(super) fn apply_payment(
    bill: &mut Bill,
    payment: Option<&PaymentRequest>,
    received_by: &Actor,
    now: DateTime<Utc>,
) -> OpdResult<()> {
    let Some(payment) = payment else {
        return Ok(());
    };
    if payment.amount.is_zero() {
        return Ok(());
    }

    bill.record_payment(
        payment.amount,
        payment.mode,
        payment.transaction_id.clone(),
        received_by,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PaymentMode;
    use opd_types::{Money, NonEmptyText, VisitId};
    use rust_decimal_macros::dec;

    fn cashier() -> Actor {
        Actor::new(
            NonEmptyText::new("R. Osei").unwrap(),
            NonEmptyText::new("Receptionist").unwrap(),
        )
    }

    #[test]
    fn zero_amount_payments_are_skipped() {
        let mut bill = Bill::open(VisitId::new(), Money::new(dec!(100)).unwrap(), Utc::now());
        apply_payment(
            &mut bill,
            Some(&PaymentRequest {
                amount: Money::zero(),
                mode: PaymentMode::Cash,
                transaction_id: None,
            }),
            &cashier(),
            Utc::now(),
        )
        .expect("zero payment is skipped, not an error");

        assert!(bill.payments().is_empty());
    }

    #[test]
    fn positive_payments_are_recorded() {
        let mut bill = Bill::open(VisitId::new(), Money::new(dec!(100)).unwrap(), Utc::now());
        apply_payment(
            &mut bill,
            Some(&PaymentRequest {
                amount: Money::new(dec!(40)).unwrap(),
                mode: PaymentMode::Online,
                transaction_id: Some("TXN-7".into()),
            }),
            &cashier(),
            Utc::now(),
        )
        .expect("payment should record");

        assert_eq!(bill.paid().amount(), dec!(40));
        assert_eq!(bill.due().amount(), dec!(60));
    }
}
