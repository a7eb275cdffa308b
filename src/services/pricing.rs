use crate::models::{ProductRef, ValidationError, ValidationResult};

/// Sum of unit prices; an empty selection costs nothing
pub fn total_price(products: &[ProductRef]) -> ValidationResult<u64> {
    products
        .iter()
        .try_fold(0u64, |total, product| total.checked_add(product.price))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "total_price".to_string(),
            value: products.len().to_string(),
            reason: "Sum of unit prices overflows".to_string(),
        })
}
