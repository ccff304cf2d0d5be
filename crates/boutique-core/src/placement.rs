//! # Order Placement
//!
//! The save-order workflow: number the order, store it with its lines, and
//! take stock for every line of a Sale order. Also creates new sales.
//!
//! ## Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(draft, lines)                                              │
//! │    1. validate lines, total and payment                                 │
//! │    2. Sale orders: dry-run every deduction against current stock        │
//! │    3. allocator.create_order()      ORD-20261016-0008                   │
//! │    4. store.add_order_item() × N                                        │
//! │    5. Sale orders: engine.deduct() per line                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 2 catches missing SKUs and short stock before anything is written,
//! so a bad line never leaves a half-placed order behind. It does not lock
//! anything; step 5 still re-checks under the version guard.

use std::collections::HashMap;

use tracing::{error, info, warn};

use crate::allocator::OrderNumberAllocator;
use crate::clock::Clock;
use crate::deduction::InventoryDeductionEngine;
use crate::error::{CoreError, CoreResult, StoreError, ValidationError};
use crate::inventory::{self, apply_deduction, stock_value, total_items};
use crate::money::Money;
use crate::order_number::next_sale_number;
use crate::store::{OrderStore, SaleStore};
use crate::types::{
    AvailableSku, NewOrderItem, NewSale, Order, OrderDraft, OrderItem, PaymentStatus, Sale,
    SaleDraft,
};
use crate::validation::{validate_name, validate_price, validate_quantity, validate_sku, validate_sku_items};
use crate::MAX_ORDER_LINES;

/// Attempts at claiming a fresh sale number.
const SALE_NUMBER_ATTEMPTS: u32 = 3;

/// Result of a successful [`OrderPlacement::place_order`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Sales as persisted after the deductions, one entry per deduction.
    pub updated_sales: Vec<Sale>,
}

/// Ties the allocator and the deduction engine together.
pub struct OrderPlacement<O, S, C> {
    allocator: OrderNumberAllocator<O, C>,
    engine: InventoryDeductionEngine<S>,
}

impl<O, S, C> OrderPlacement<O, S, C>
where
    O: OrderStore,
    S: SaleStore,
    C: Clock,
{
    pub fn new(allocator: OrderNumberAllocator<O, C>, engine: InventoryDeductionEngine<S>) -> Self {
        OrderPlacement { allocator, engine }
    }

    pub fn allocator(&self) -> &OrderNumberAllocator<O, C> {
        &self.allocator
    }

    pub fn engine(&self) -> &InventoryDeductionEngine<S> {
        &self.engine
    }

    /// Places an order with its lines.
    ///
    /// `total_amount` is recomputed from the lines when any are given, and
    /// the paid and remaining amounts follow the payment status.
    pub async fn place_order(
        &self,
        draft: OrderDraft,
        lines: Vec<NewOrderItem>,
    ) -> CoreResult<PlacedOrder> {
        validate_lines(&draft, &lines)?;

        let mut draft = draft;
        if !lines.is_empty() {
            draft.total_amount = order_total(&lines)?;
        }
        validate_payment(&draft)?;

        if draft.order_type.deducts_stock() {
            self.preflight(&lines).await?;
        }

        let deducts = draft.order_type.deducts_stock();

        let order = self.allocator.create_order(draft).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = self
                .allocator
                .store()
                .add_order_item(&order.id, line)
                .await?;
            items.push(item);
        }

        let mut updated_sales = Vec::new();
        if deducts {
            for item in &items {
                let (Some(sale_id), Some(sku_code)) = (item.sale_id.as_deref(), item.sku_code.as_deref())
                else {
                    continue;
                };

                match self.engine.deduct(sale_id, sku_code, item.quantity).await {
                    Ok(sale) => updated_sales.push(sale),
                    Err(e) => {
                        error!(
                            order_number = %order.order_number,
                            sale_id,
                            sku_code,
                            error = %e,
                            "Order saved but stock was not deducted"
                        );
                        return Err(e);
                    }
                }
            }
        }

        info!(
            order_number = %order.order_number,
            lines = items.len(),
            deductions = updated_sales.len(),
            total = %order.total_amount,
            "Order placed"
        );

        Ok(PlacedOrder {
            order,
            items,
            updated_sales,
        })
    }

    /// Dry-runs every deduction of a Sale order against current stock.
    async fn preflight(&self, lines: &[NewOrderItem]) -> CoreResult<()> {
        let mut snapshots: HashMap<String, Sale> = HashMap::new();

        for line in lines {
            let Some((sale_id, sku_code)) = line.stock_reference() else {
                continue;
            };

            if !snapshots.contains_key(sale_id) {
                let sale = self
                    .engine
                    .store()
                    .get_sale_by_id(sale_id)
                    .await?
                    .ok_or_else(|| CoreError::sale_not_found(sale_id))?;
                snapshots.insert(sale_id.to_string(), sale);
            }

            if let Some(sale) = snapshots.get_mut(sale_id) {
                let update = apply_deduction(sale, sku_code, line.quantity, self.engine.settings().policy)?;
                sale.sku_items = update.sku_items;
                sale.total_items = update.total_items;
            }
        }

        Ok(())
    }

    /// Numbers and stores a new sale.
    ///
    /// `total_items` and `total_stock_value` are computed from the SKU list.
    pub async fn create_sale(&self, draft: SaleDraft) -> CoreResult<Sale> {
        validate_sku_items(&draft.sku_items)?;
        if let Some(name) = draft.sales_name.as_deref() {
            validate_name("sales_name", name)?;
        }
        if let Some(price) = draft.purchase_price_per_item {
            validate_price("purchase_price_per_item", price)?;
        }

        let total = total_items(&draft.sku_items);
        let value = stock_value(draft.purchase_price_per_item, total)?;
        let store = self.engine.store();

        for attempt in 1..=SALE_NUMBER_ATTEMPTS {
            let existing = store.find_sale_numbers().await?;
            let sale_number = next_sale_number(&existing);

            let new_sale = NewSale {
                sale_number,
                sales_name: draft.sales_name.clone(),
                sale_date: draft.sale_date,
                customer_id: draft.customer_id.clone(),
                sku_items: draft.sku_items.clone(),
                total_items: total,
                purchase_price_per_item: draft.purchase_price_per_item,
                total_stock_value: value,
                notes: draft.notes.clone(),
            };

            match store.create_sale(new_sale).await {
                Ok(sale) => {
                    info!(sale_number = %sale.sale_number, total_items = total, "Sale created");
                    return Ok(sale);
                }
                Err(StoreError::Duplicate { value, .. }) => {
                    warn!(sale_number = %value, attempt, "Sale number already taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::AllocationFailed {
            attempts: SALE_NUMBER_ATTEMPTS,
        })
    }

    /// SKUs with stock left, for the order form.
    pub async fn available_skus(&self) -> CoreResult<Vec<AvailableSku>> {
        let sales = self.engine.store().list_sales().await?;
        Ok(inventory::available_skus(&sales))
    }
}

fn validate_lines(draft: &OrderDraft, lines: &[NewOrderItem]) -> CoreResult<()> {
    if lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "order_items".to_string(),
            min: 0,
            max: MAX_ORDER_LINES as i64,
        }
        .into());
    }

    for line in lines {
        validate_name("product_type", &line.product_type)?;
        validate_quantity(line.quantity)?;
        validate_price("price", line.price)?;

        if draft.order_type.deducts_stock() {
            let (_, sku_code) = line.stock_reference().ok_or_else(|| ValidationError::Required {
                field: "sku_code".to_string(),
            })?;
            validate_sku(sku_code)?;
        }
    }

    Ok(())
}

/// Sum of the line totals, checked for overflow.
fn order_total(lines: &[NewOrderItem]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        line.price
            .checked_multiply_quantity(line.quantity)
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| CoreError::overflow("total_amount"))
    })
}

/// A partial payment must lie between zero and the order total.
fn validate_payment(draft: &OrderDraft) -> CoreResult<()> {
    if draft.payment_status != PaymentStatus::Remaining {
        return Ok(());
    }

    let paid = draft.amount_paid;
    if paid.is_negative() || paid > draft.total_amount {
        return Err(ValidationError::OutOfRange {
            field: "amount_paid".to_string(),
            min: 0,
            max: draft.total_amount.minor(),
        }
        .into());
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::memory::{MemoryOrderStore, MemorySaleStore};
    use crate::types::{OrderType, SkuRecord};
    use chrono::NaiveDate;
    use std::sync::Arc;

    type Placement = OrderPlacement<Arc<MemoryOrderStore>, Arc<MemorySaleStore>, Arc<ManualClock>>;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn placement() -> Placement {
        let clock = Arc::new(ManualClock::on(today()));
        OrderPlacement::new(
            OrderNumberAllocator::new(Arc::new(MemoryOrderStore::default()), clock),
            InventoryDeductionEngine::new(Arc::new(MemorySaleStore::default())),
        )
    }

    fn sale_draft(items: Vec<SkuRecord>, price: Option<i64>) -> SaleDraft {
        SaleDraft {
            sales_name: Some("Eid lawn".into()),
            sale_date: today(),
            customer_id: None,
            sku_items: items,
            purchase_price_per_item: price.map(Money::from_major),
            notes: None,
        }
    }

    fn order_draft(order_type: OrderType) -> OrderDraft {
        OrderDraft {
            customer_id: Some("c-1".into()),
            order_date: today(),
            order_type,
            order_status: "Pending".into(),
            total_amount: Money::zero(),
            payment_status: PaymentStatus::Remaining,
            amount_paid: Money::zero(),
            notes: None,
        }
    }

    fn line(sale: &Sale, sku: &str, qty: i64, price: i64) -> NewOrderItem {
        NewOrderItem {
            product_type: sku.into(),
            quantity: qty,
            price: Money::from_major(price),
            sale_id: Some(sale.id.clone()),
            sku_code: Some(sku.into()),
        }
    }

    #[tokio::test]
    async fn test_create_sale_numbers_and_totals() {
        let p = placement();

        let first = p
            .create_sale(sale_draft(
                vec![SkuRecord::new("RED-M", 20), SkuRecord::new("RED-L", 15)],
                Some(100),
            ))
            .await
            .unwrap();
        assert_eq!(first.sale_number, "SALE-001");
        assert_eq!(first.total_items, 35);
        assert_eq!(first.total_stock_value, Some(Money::from_major(3500)));

        let second = p
            .create_sale(sale_draft(vec![SkuRecord::new("BLUE-S", 4)], None))
            .await
            .unwrap();
        assert_eq!(second.sale_number, "SALE-002");
        assert_eq!(second.total_stock_value, None);
    }

    #[tokio::test]
    async fn test_create_sale_rejects_bad_sku_list() {
        let p = placement();
        let result = p
            .create_sale(sale_draft(
                vec![SkuRecord::new("RED-M", 2), SkuRecord::new("RED-M", 3)],
                None,
            ))
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sale_order_deducts_each_line() {
        let p = placement();
        let sale = p
            .create_sale(sale_draft(
                vec![SkuRecord::new("RED-M", 20), SkuRecord::new("RED-L", 15)],
                Some(100),
            ))
            .await
            .unwrap();

        let placed = p
            .place_order(
                order_draft(OrderType::Sale),
                vec![line(&sale, "RED-M", 5, 1200), line(&sale, "RED-L", 2, 1300)],
            )
            .await
            .unwrap();

        assert_eq!(placed.order.order_number, "ORD-20261016-0001");
        assert_eq!(placed.order.total_amount, Money::from_major(8600));
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.updated_sales.len(), 2);

        let stored = p.engine().store().get(&sale.id).unwrap();
        assert_eq!(stored.sku("RED-M").unwrap().quantity, 15);
        assert_eq!(stored.sku("RED-L").unwrap().quantity, 13);
        assert_eq!(stored.total_items, 28);
        assert_eq!(stored.total_stock_value, Some(Money::from_major(2800)));
    }

    #[tokio::test]
    async fn test_oversized_prices_are_rejected() {
        let p = placement();
        let huge = i64::MAX / 2;

        let mut draft = sale_draft(vec![SkuRecord::new("A", 3)], None);
        draft.purchase_price_per_item = Some(Money::from_minor(huge));
        let result = p.create_sale(draft).await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. }))
                if field == "purchase_price_per_item"
        ));
        assert!(p.engine().store().sales.lock().unwrap().is_empty());

        let line = NewOrderItem {
            product_type: "Stitching".into(),
            quantity: 3,
            price: Money::from_minor(huge),
            sale_id: None,
            sku_code: None,
        };
        let result = p
            .place_order(order_draft(OrderType::CustomerOrder), vec![line])
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(p.allocator().store().numbers().is_empty());
    }

    #[test]
    fn test_order_total_overflow_is_an_error() {
        let line = NewOrderItem {
            product_type: "Stitching".into(),
            quantity: 3,
            price: Money::from_minor(i64::MAX / 2),
            sale_id: None,
            sku_code: None,
        };
        assert!(matches!(
            order_total(&[line]),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    #[tokio::test]
    async fn test_payment_amounts_follow_status() {
        let p = placement();
        let sale = p
            .create_sale(sale_draft(vec![SkuRecord::new("RED-M", 20)], None))
            .await
            .unwrap();

        let mut half = order_draft(OrderType::Sale);
        half.payment_status = PaymentStatus::HalfPayment;
        let placed = p
            .place_order(half, vec![line(&sale, "RED-M", 3, 1000)])
            .await
            .unwrap();
        assert_eq!(placed.order.total_amount, Money::from_major(3000));
        assert_eq!(placed.order.amount_paid, Money::from_major(1500));
        assert_eq!(placed.order.amount_remaining, Money::from_major(1500));

        let mut partial = order_draft(OrderType::CustomerOrder);
        partial.amount_paid = Money::from_major(500);
        let placed = p
            .place_order(partial, vec![line(&sale, "RED-M", 1, 2000)])
            .await
            .unwrap();
        assert_eq!(placed.order.payment_status, PaymentStatus::Remaining);
        assert_eq!(placed.order.amount_remaining, Money::from_major(1500));

        // Paying more than the total is refused before anything is written.
        let mut overpaid = order_draft(OrderType::Sale);
        overpaid.amount_paid = Money::from_major(5000);
        let result = p
            .place_order(overpaid, vec![line(&sale, "RED-M", 1, 2000)])
            .await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "amount_paid"
        ));
        assert_eq!(p.allocator().store().numbers().len(), 2);
        assert_eq!(p.engine().store().get(&sale.id).unwrap().total_items, 17);
    }

    #[tokio::test]
    async fn test_customer_order_leaves_stock_alone() {
        let p = placement();
        let sale = p
            .create_sale(sale_draft(vec![SkuRecord::new("RED-M", 20)], None))
            .await
            .unwrap();

        let placed = p
            .place_order(
                order_draft(OrderType::CustomerOrder),
                vec![line(&sale, "RED-M", 5, 1200)],
            )
            .await
            .unwrap();

        assert!(placed.updated_sales.is_empty());
        assert_eq!(p.engine().store().get(&sale.id).unwrap().total_items, 20);
    }

    #[tokio::test]
    async fn test_short_stock_writes_nothing() {
        let p = placement();
        let sale = p
            .create_sale(sale_draft(vec![SkuRecord::new("RED-M", 6)], None))
            .await
            .unwrap();

        // Each line fits on its own; together they exceed stock.
        let result = p
            .place_order(
                order_draft(OrderType::Sale),
                vec![line(&sale, "RED-M", 4, 1200), line(&sale, "RED-M", 4, 1200)],
            )
            .await;

        assert!(matches!(result, Err(CoreError::InsufficientStock { .. })));
        assert!(p.allocator().store().numbers().is_empty());
        assert_eq!(p.engine().store().get(&sale.id).unwrap().total_items, 6);
    }

    #[tokio::test]
    async fn test_sale_order_needs_stock_reference() {
        let p = placement();
        let mut bare = NewOrderItem {
            product_type: "Kurta".into(),
            quantity: 1,
            price: Money::from_major(1500),
            sale_id: None,
            sku_code: None,
        };

        let result = p
            .place_order(order_draft(OrderType::Sale), vec![bare.clone()])
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        bare.quantity = 0;
        let result = p
            .place_order(order_draft(OrderType::CustomerOrder), vec![bare])
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_available_skus_after_orders() {
        let p = placement();
        let sale = p
            .create_sale(sale_draft(
                vec![SkuRecord::new("RED-M", 2), SkuRecord::new("RED-L", 1)],
                None,
            ))
            .await
            .unwrap();

        p.place_order(order_draft(OrderType::Sale), vec![line(&sale, "RED-M", 2, 1200)])
            .await
            .unwrap();

        let available = p.available_skus().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].sku_code, "RED-L");
    }
}
