//! # Validation Module
//!
//! Input validation for Lotus POS.
//!
//! ## Validation Strategy
//! Three layers catch different errors:
//! 1. The HTTP layer validates request shape (deserialization).
//! 2. THIS MODULE validates business rules before any write is attempted.
//! 3. The database enforces NOT NULL / UNIQUE / foreign-key constraints.
//!
//! A failed validation means the operation was never attempted - nothing is
//! persisted.

use crate::error::ValidationError;
use crate::types::{NewProduct, OrderDraft, OrderLineDraft, PurchaseLineDraft};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Alphanumeric, hyphens and underscores only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, customer, supplier, category).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Line quantities must be at least 1.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::QuantityTooSmall {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Monetary amounts entered by users (discounts, prices, costs) must not be
/// negative.
pub fn validate_non_negative(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Draft Validators
// =============================================================================

/// Validates a product insert payload.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name(&product.name)?;
    validate_sku(&product.sku)?;
    validate_non_negative("cost_price", product.cost_price_cents)?;
    validate_non_negative("selling_price", product.selling_price_cents)?;
    Ok(())
}

/// Validates an order draft and its lines.
///
/// Zero-line orders are rejected here - the transaction manager never opens
/// a transaction for them, so no order record is left behind.
pub fn validate_order_draft(draft: &OrderDraft, lines: &[OrderLineDraft]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyLines);
    }
    for line in lines {
        validate_quantity(line.quantity)?;
    }
    validate_non_negative("discount", draft.discount_cents)?;
    Ok(())
}

/// Validates purchase lines.
pub fn validate_purchase_lines(lines: &[PurchaseLineDraft]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyLines);
    }
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_non_negative("unit_cost", line.unit_cost_cents)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderStatus, PaymentMethod};

    fn order_draft(discount_cents: i64) -> OrderDraft {
        OrderDraft {
            customer_id: None,
            user_id: 1,
            status: OrderStatus::Pending,
            discount_cents,
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Coca-Cola 330ml").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_empty_lines_rejected() {
        let err = validate_order_draft(&order_draft(0), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyLines));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let lines = vec![OrderLineDraft { product_id: 1, quantity: 0 }];
        assert!(validate_order_draft(&order_draft(0), &lines).is_err());

        let lines = vec![OrderLineDraft { product_id: 1, quantity: -2 }];
        assert!(validate_order_draft(&order_draft(0), &lines).is_err());
    }

    #[test]
    fn test_negative_discount_rejected() {
        let lines = vec![OrderLineDraft { product_id: 1, quantity: 1 }];
        assert!(validate_order_draft(&order_draft(-100), &lines).is_err());
        assert!(validate_order_draft(&order_draft(0), &lines).is_ok());
    }

    #[test]
    fn test_purchase_lines() {
        assert!(validate_purchase_lines(&[]).is_err());

        let good = vec![PurchaseLineDraft { product_id: 1, quantity: 5, unit_cost_cents: 900 }];
        assert!(validate_purchase_lines(&good).is_ok());

        let bad = vec![PurchaseLineDraft { product_id: 1, quantity: 5, unit_cost_cents: -1 }];
        assert!(validate_purchase_lines(&bad).is_err());
    }
}
