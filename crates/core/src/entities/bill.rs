//! The Bill aggregate: the financial record of a visit.
//!
//! Derived totals (total, paid, due) are never stored independently of their
//! inputs — every mutation recomputes them from the fee, items subtotal,
//! discount, tax and payment lines, so they cannot drift.
//!
//! Pricing rule:
//!
//! ```text
//! total = (consultation_fee + items_subtotal)
//!         * (1 - discount% / 100)
//!         * (1 + tax% / 100)        rounded to 2 dp
//! due   = total - paid
//! ```
//!
//! Overpayment is rejected: `paid` may never exceed `total`. The invariant
//! is enforced from both directions — a payment above the outstanding
//! balance fails, and so does a pricing change that would drop the total
//! below what has already been paid.

use crate::actor::Actor;
use crate::{OpdError, OpdResult};
use chrono::{DateTime, Utc};
use opd_types::{BillId, Money, Percentage, VisitId};
use rust_decimal::Decimal;

/// How a payment was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Card,
    Online,
}

/// One recorded payment against a bill.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Payment {
    pub amount: Money,
    pub mode: PaymentMode,
    pub external_txn_id: Option<String>,
    pub received_by: Actor,
    pub received_at: DateTime<Utc>,
}

/// The financial record tied to exactly one visit.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Bill {
    id: BillId,
    visit_id: VisitId,
    consultation_fee: Money,
    items_subtotal: Money,
    discount: Percentage,
    tax: Percentage,
    payments: Vec<Payment>,
    total: Money,
    created_at: DateTime<Utc>,
}

impl Bill {
    /// Opens a new bill for a visit with the given consultation fee.
    pub fn open(visit_id: VisitId, consultation_fee: Money, created_at: DateTime<Utc>) -> Self {
        Self {
            id: BillId::new(),
            visit_id,
            consultation_fee,
            items_subtotal: Money::zero(),
            discount: Percentage::zero(),
            tax: Percentage::zero(),
            payments: Vec::new(),
            total: consultation_fee.rounded(),
            created_at,
        }
    }

    pub fn id(&self) -> BillId {
        self.id
    }

    pub fn visit_id(&self) -> VisitId {
        self.visit_id
    }

    pub fn consultation_fee(&self) -> Money {
        self.consultation_fee
    }

    pub fn items_subtotal(&self) -> Money {
        self.items_subtotal
    }

    pub fn discount(&self) -> Percentage {
        self.discount
    }

    pub fn tax(&self) -> Percentage {
        self.tax
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The amount owed for the visit after discount and tax.
    pub fn total(&self) -> Money {
        self.total
    }

    /// The sum of recorded payments.
    pub fn paid(&self) -> Money {
        self.payments
            .iter()
            .fold(Money::zero(), |acc, p| acc.plus(p.amount))
    }

    /// The outstanding balance.
    pub fn due(&self) -> Money {
        self.total.saturating_sub(self.paid())
    }

    pub fn is_fully_paid(&self) -> bool {
        self.due().is_zero()
    }

    /// Recomputes the total from prospective pricing inputs and commits them
    /// only when the result still covers the recorded payments.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the adjusted total would fall below `paid`,
    /// which would turn already-accepted payments into an overpayment. The
    /// bill is left untouched on error.
    fn set_pricing(
        &mut self,
        discount: Percentage,
        tax: Percentage,
        items_subtotal: Money,
    ) -> OpdResult<()> {
        let subtotal = self.consultation_fee.plus(items_subtotal).amount();
        let discounted = subtotal * (Decimal::ONE - discount.fraction());
        let taxed = discounted * (Decimal::ONE + tax.fraction());
        let total = Money::new(taxed)?.rounded();

        let paid = self.paid();
        if paid > total {
            return Err(OpdError::Validation(format!(
                "recorded payments of {paid} exceed the adjusted total of {total}"
            )));
        }

        self.discount = discount;
        self.tax = tax;
        self.items_subtotal = items_subtotal;
        self.total = total;
        Ok(())
    }

    /// Sets the discount percentage and recomputes totals.
    pub fn apply_discount(&mut self, discount: Percentage) -> OpdResult<()> {
        self.set_pricing(discount, self.tax, self.items_subtotal)
    }

    /// Sets the tax percentage and recomputes totals.
    pub fn apply_tax(&mut self, tax: Percentage) -> OpdResult<()> {
        self.set_pricing(self.discount, tax, self.items_subtotal)
    }

    /// Adds a service-item charge to the bill and recomputes totals.
    pub fn add_item_charge(&mut self, amount: Money) -> OpdResult<()> {
        self.set_pricing(self.discount, self.tax, self.items_subtotal.plus(amount))
    }

    /// Records a payment. Payments are additive; several may accumulate
    /// towards the total.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a zero amount, or when the payment would
    /// push `paid` above `total` (overpayment is rejected, not clamped).
    pub fn record_payment(
        &mut self,
        amount: Money,
        mode: PaymentMode,
        external_txn_id: Option<String>,
        received_by: &Actor,
        received_at: DateTime<Utc>,
    ) -> OpdResult<()> {
        if amount.is_zero() {
            return Err(OpdError::Validation(
                "payment amount must be greater than zero".into(),
            ));
        }

        let would_be_paid = self.paid().plus(amount);
        if would_be_paid > self.total {
            return Err(OpdError::Validation(format!(
                "payment of {amount} would exceed the outstanding balance of {}",
                self.due()
            )));
        }

        self.payments.push(Payment {
            amount,
            mode,
            external_txn_id: external_txn_id.filter(|s| !s.is_empty()),
            received_by: received_by.clone(),
            received_at,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_types::NonEmptyText;
    use rust_decimal_macros::dec;

    fn cashier() -> Actor {
        Actor::new(
            NonEmptyText::new("R. Osei").unwrap(),
            NonEmptyText::new("Receptionist").unwrap(),
        )
    }

    fn money(value: Decimal) -> Money {
        Money::new(value).expect("test amounts are non-negative")
    }

    fn pct(value: Decimal) -> Percentage {
        Percentage::new(value).expect("test percentages are in range")
    }

    #[test]
    fn discount_then_tax_produces_the_documented_total() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(300)), Utc::now());
        bill.apply_discount(pct(dec!(10))).expect("valid discount");
        bill.apply_tax(pct(dec!(5))).expect("valid tax");

        // 300 * 0.9 * 1.05 = 283.5
        assert_eq!(bill.total().amount(), dec!(283.50));
        assert_eq!(bill.due().amount(), dec!(283.50));
        assert!(!bill.is_fully_paid());
    }

    #[test]
    fn full_payment_clears_the_balance() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(300)), Utc::now());
        bill.apply_discount(pct(dec!(10))).expect("valid discount");
        bill.apply_tax(pct(dec!(5))).expect("valid tax");

        bill.record_payment(
            money(dec!(283.5)),
            PaymentMode::Card,
            Some("TXN-1001".into()),
            &cashier(),
            Utc::now(),
        )
        .expect("exact payment should be accepted");

        assert!(bill.is_fully_paid());
        assert!(bill.due().is_zero());
        assert_eq!(bill.paid().amount(), dec!(283.5));
    }

    #[test]
    fn payments_accumulate() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(200)), Utc::now());

        bill.record_payment(money(dec!(150)), PaymentMode::Cash, None, &cashier(), Utc::now())
            .expect("first payment");
        bill.record_payment(money(dec!(50)), PaymentMode::Online, None, &cashier(), Utc::now())
            .expect("second payment");

        assert_eq!(bill.payments().len(), 2);
        assert!(bill.is_fully_paid());
    }

    #[test]
    fn overpayment_is_rejected() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(100)), Utc::now());

        let err = bill
            .record_payment(money(dec!(100.01)), PaymentMode::Cash, None, &cashier(), Utc::now())
            .expect_err("overpayment should be rejected");
        assert!(matches!(err, OpdError::Validation(_)));
        assert!(bill.payments().is_empty(), "rejected payment must not be recorded");
    }

    #[test]
    fn pricing_changes_cannot_undercut_recorded_payments() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(300)), Utc::now());
        bill.record_payment(money(dec!(300)), PaymentMode::Cash, None, &cashier(), Utc::now())
            .expect("full payment");

        let err = bill
            .apply_discount(pct(dec!(50)))
            .expect_err("a discount below the paid amount should be rejected");
        assert!(matches!(err, OpdError::Validation(_)));

        // The rejected change must not leave the bill half-updated.
        assert_eq!(bill.total().amount(), dec!(300));
        assert_eq!(bill.discount(), Percentage::zero());
        assert!(bill.is_fully_paid());
    }

    #[test]
    fn zero_payment_is_rejected() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(100)), Utc::now());
        let err = bill
            .record_payment(Money::zero(), PaymentMode::Cash, None, &cashier(), Utc::now())
            .expect_err("zero payment should be rejected");
        assert!(matches!(err, OpdError::Validation(_)));
    }

    #[test]
    fn totals_recompute_deterministically_from_inputs() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(250)), Utc::now());
        bill.add_item_charge(money(dec!(50))).expect("item charge");
        bill.apply_tax(pct(dec!(20))).expect("valid tax");
        assert_eq!(bill.total().amount(), dec!(360.00));

        // Re-applying the same inputs must not change the answer.
        bill.apply_tax(pct(dec!(20))).expect("valid tax");
        assert_eq!(bill.total().amount(), dec!(360.00));

        bill.apply_discount(pct(dec!(100))).expect("full discount");
        assert_eq!(bill.total(), Money::zero());
        assert!(bill.is_fully_paid(), "a zero bill has nothing outstanding");
    }

    #[test]
    fn fractional_totals_round_to_two_decimals() {
        let mut bill = Bill::open(VisitId::new(), money(dec!(99.99)), Utc::now());
        bill.apply_discount(pct(dec!(33.33))).expect("valid discount");
        // 99.99 * 0.6667 = 66.6633... -> 66.66
        assert_eq!(bill.total().amount(), dec!(66.66));
    }
}
