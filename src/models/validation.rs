use std::collections::HashMap;

use chrono::NaiveDate;

use super::{
    AddCartItemRequest, BoxSize, CreateProductRequest, CreateSubscriptionRequest,
    SubscriptionQuantity, SubscriptionQuoteRequest, UpdateAllergiesRequest, ValidationError,
    ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_ALLERGY_LENGTH: usize = 100;
pub const MAX_ALLERGIES_COUNT: usize = 30;
pub const MAX_IMAGE_URL_LENGTH: usize = 500;
pub const MAX_PRICE: u64 = 100_000_000;
pub const MAX_CART_QUANTITY: u32 = 1000;
pub const MIN_CART_QUANTITY: u32 = 1;
pub const MAX_EMAIL_LENGTH: usize = 254;

/// A subscription request with every required field present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubscriptionRequest {
    pub category_id: u64,
    pub box_size: BoxSize,
    pub quantity: SubscriptionQuantity,
    pub food_start: Option<NaiveDate>,
    pub product_ids: Option<Vec<u64>>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        validate_description(&self.description)?;
        validate_price(self.price)?;
        validate_allergies(&self.allergies)?;
        if let Some(image_url) = &self.image_url {
            validate_image_url(image_url)?;
        }
        Ok(())
    }
}

impl Validate for UpdateAllergiesRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_allergies(&self.allergies)
    }
}

impl Validate for AddCartItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_cart_quantity(self.quantity)
    }
}

impl TryFrom<CreateSubscriptionRequest> for ValidatedSubscriptionRequest {
    type Error = ValidationError;

    fn try_from(request: CreateSubscriptionRequest) -> ValidationResult<Self> {
        let category_id = required(request.category_id, "category_id")?;
        let box_size = required(request.box_size, "box_size")?;
        let quantity = SubscriptionQuantity::new(
            required(request.food_day_count, "food_day_count")?,
            required(request.food_week_count, "food_week_count")?,
            required(request.food_period, "food_period")?,
        );

        if let Some(product_ids) = &request.product_ids {
            if product_ids.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "product_ids".to_string(),
                    value: "[]".to_string(),
                    reason: "Explicit product list cannot be empty".to_string(),
                });
            }
        }

        Ok(Self {
            category_id,
            box_size,
            quantity,
            food_start: request.food_start,
            product_ids: request.product_ids,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::RequiredField {
        field: field.to_string(),
    })
}

/// Read a required non-negative integer from query parameters
pub fn required_u64_param(params: &HashMap<String, String>, field: &str) -> ValidationResult<u64> {
    let raw = params
        .get(field)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ValidationError::RequiredField {
            field: field.to_string(),
        })?;

    raw.parse::<u64>()
        .map_err(|_| ValidationError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "Must be a non-negative integer".to_string(),
        })
}

/// Parse the quantity query of a subscription quote or price request
pub fn parse_quote_params(
    params: &HashMap<String, String>,
) -> ValidationResult<SubscriptionQuoteRequest> {
    Ok(SubscriptionQuoteRequest {
        category_id: required_u64_param(params, "category_id")?,
        quantity: SubscriptionQuantity::new(
            required_u64_param(params, "food_day_count")?,
            required_u64_param(params, "food_week_count")?,
            required_u64_param(params, "food_period")?,
        ),
    })
}

/// Compute the food count, rejecting overflow and counts above `max`
pub fn validate_food_count(quantity: &SubscriptionQuantity, max: u64) -> ValidationResult<u64> {
    let food_count = quantity
        .food_count()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "food_count".to_string(),
            value: format!(
                "{}x{}x{}",
                quantity.food_day_count, quantity.food_week_count, quantity.food_period
            ),
            reason: "Product of quantity factors overflows".to_string(),
        })?;

    if food_count > max {
        return Err(ValidationError::OutOfRange {
            field: "food_count".to_string(),
            min: "0".to_string(),
            max: max.to_string(),
            value: food_count.to_string(),
        });
    }

    Ok(food_count)
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }

    if trimmed.len() > MAX_PRODUCT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_PRODUCT_NAME_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    let trimmed = description.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "description".to_string(),
        });
    }

    if trimmed.len() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max_length: MAX_DESCRIPTION_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    Ok(())
}

pub fn validate_price(price: u64) -> ValidationResult<()> {
    if price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: "0".to_string(),
            max: MAX_PRICE.to_string(),
            value: price.to_string(),
        });
    }

    Ok(())
}

pub fn validate_allergies(allergies: &[String]) -> ValidationResult<()> {
    if allergies.len() > MAX_ALLERGIES_COUNT {
        return Err(ValidationError::InvalidValue {
            field: "allergies".to_string(),
            value: allergies.len().to_string(),
            reason: format!("Too many allergies, maximum allowed: {}", MAX_ALLERGIES_COUNT),
        });
    }

    for (index, allergy) in allergies.iter().enumerate() {
        let trimmed = allergy.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("allergies[{}]", index),
                value: allergy.clone(),
                reason: "Allergy cannot be empty".to_string(),
            });
        }

        if trimmed.len() > MAX_ALLERGY_LENGTH {
            return Err(ValidationError::TooLong {
                field: format!("allergies[{}]", index),
                max_length: MAX_ALLERGY_LENGTH,
                actual_length: trimmed.len(),
            });
        }
    }

    Ok(())
}

pub fn validate_image_url(image_url: &str) -> ValidationResult<()> {
    let trimmed = image_url.trim();

    if trimmed.len() > MAX_IMAGE_URL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "image_url".to_string(),
            max_length: MAX_IMAGE_URL_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ValidationError::InvalidFormat {
            field: "image_url".to_string(),
            expected: "Absolute http(s) URL".to_string(),
        });
    }

    Ok(())
}

pub fn validate_cart_quantity(quantity: u32) -> ValidationResult<()> {
    if !(MIN_CART_QUANTITY..=MAX_CART_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: MAX_CART_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }

    Ok(())
}

/// Validate the email carried in the identity header
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "email".to_string(),
        });
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max_length: MAX_EMAIL_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            expected: "local@domain".to_string(),
        }),
    }
}
