//! Order payload assembly and the backend's confirmation shape.
//!
//! The payload is an output artifact: built once at confirmation from
//! the cart and the accumulated draft, sent, and not retained beyond the
//! result view. Field names follow the backend's wire contract, which
//! renames `full_name` to `name`, `phone` to `phoneNumber`, and `city`
//! to `province`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use linen_core::{Price, ProductId, UserId};

use crate::cart::CartItem;
use crate::checkout::validation::ShippingInfo;
use crate::checkout::{PaymentMethod, ShippingMethod};
use crate::models::session::CurrentUser;

/// Customer block of the order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub user_id: UserId,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub province: String,
    pub district: String,
    pub ward: String,
}

/// One order line as the backend expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    /// First product image, or empty when the product has none.
    pub image: String,
    pub size: String,
}

impl OrderItem {
    fn from_cart_item(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            name: item.product.title.clone(),
            price: item.product.sale_price,
            // Quantities below one cannot be built through the cart, but
            // the backend rejects zero, so coerce defensively.
            quantity: item.quantity.max(1),
            image: item.product.images.first().cloned().unwrap_or_default(),
            size: item.size.clone(),
        }
    }
}

/// The complete order creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub customer_info: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub shipping_type: String,
    pub shipping_cost: Price,
    pub payment_method: String,
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
}

impl OrderPayload {
    /// Build the payload from the authenticated user, the cart lines,
    /// and the completed draft sections.
    ///
    /// Total is `subtotal + shipping_cost - discount`; discounts are not
    /// offered yet, so the discount is always zero.
    #[must_use]
    pub fn assemble(
        user: &CurrentUser,
        items: &[CartItem],
        shipping_info: &ShippingInfo,
        shipping_method: ShippingMethod,
        payment_method: PaymentMethod,
    ) -> Self {
        let items: Vec<OrderItem> = items.iter().map(OrderItem::from_cart_item).collect();
        let subtotal: Price = items.iter().map(|item| item.price * item.quantity).sum();
        let shipping_cost = shipping_method.price();
        let discount = Price::ZERO;

        Self {
            customer_info: CustomerInfo {
                user_id: user.id.clone(),
                name: shipping_info.full_name.clone(),
                phone_number: shipping_info.phone.clone(),
                email: shipping_info.email.clone(),
                address: shipping_info.address.clone(),
                province: shipping_info.city.clone(),
                district: shipping_info.district.clone(),
                ward: shipping_info.ward.clone(),
            },
            items,
            shipping_type: shipping_method.id().to_owned(),
            shipping_cost,
            payment_method: payment_method.id().to_owned(),
            subtotal,
            discount,
            total: subtotal + shipping_cost - discount,
        }
    }
}

/// What the backend returns for a created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    /// Human-facing order code.
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub customer_info: CustomerInfo,
    pub shipping_type: String,
    pub shipping_cost: Price,
    pub payment_method: String,
    /// Merchandise amount before shipping.
    pub amount: Price,
    pub total_amount: Price,
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::ProductRef;
    use linen_core::Email;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new("usr_1"),
            name: "Hoa".into(),
            email: Email::parse("hoa@example.com").unwrap(),
        }
    }

    fn shipping_info() -> ShippingInfo {
        ShippingInfo {
            full_name: "Nguyen Thi Hoa".into(),
            phone: "0901234567".into(),
            email: Some("hoa@example.com".into()),
            address: "12 Hang Gai".into(),
            city: "Ha Noi".into(),
            city_code: "01".into(),
            district: "Hoan Kiem".into(),
            district_code: "002".into(),
            ward: "Hang Trong".into(),
            ward_code: "00070".into(),
        }
    }

    fn cart_item(id: &str, price: i64, quantity: u32, images: Vec<String>) -> CartItem {
        CartItem {
            product: ProductRef {
                id: ProductId::new(id),
                title: format!("Product {id}"),
                slug: format!("product-{id}"),
                images,
                sale_price: Price::from(price),
                original_price: Price::from(price),
                sizes: vec!["M".into()],
            },
            size: "M".into(),
            quantity,
        }
    }

    #[test]
    fn test_assemble_renames_customer_fields() {
        let payload = OrderPayload::assemble(
            &user(),
            &[cart_item("p1", 100_000, 1, vec!["a.jpg".into()])],
            &shipping_info(),
            ShippingMethod::Standard,
            PaymentMethod::CashOnDelivery,
        );

        assert_eq!(payload.customer_info.name, "Nguyen Thi Hoa");
        assert_eq!(payload.customer_info.phone_number, "0901234567");
        assert_eq!(payload.customer_info.province, "Ha Noi");

        let json = serde_json::to_value(&payload).unwrap();
        let customer = &json["customerInfo"];
        assert!(customer.get("phoneNumber").is_some());
        assert!(customer.get("province").is_some());
        assert!(customer.get("fullName").is_none());
        assert!(customer.get("city").is_none());
    }

    #[test]
    fn test_assemble_totals() {
        let payload = OrderPayload::assemble(
            &user(),
            &[
                cart_item("p1", 100_000, 2, vec!["a.jpg".into()]),
                cart_item("p2", 50_000, 1, vec![]),
            ],
            &shipping_info(),
            ShippingMethod::Express,
            PaymentMethod::BankTransfer,
        );

        assert_eq!(payload.subtotal, Price::from(250_000));
        assert_eq!(payload.discount, Price::ZERO);
        assert_eq!(
            payload.total,
            Price::from(250_000) + ShippingMethod::Express.price()
        );
    }

    #[test]
    fn test_item_image_is_first_or_empty() {
        let payload = OrderPayload::assemble(
            &user(),
            &[
                cart_item("p1", 100, 1, vec!["first.jpg".into(), "second.jpg".into()]),
                cart_item("p2", 100, 1, vec![]),
            ],
            &shipping_info(),
            ShippingMethod::Standard,
            PaymentMethod::CashOnDelivery,
        );

        assert_eq!(payload.items[0].image, "first.jpg");
        assert_eq!(payload.items[1].image, "");
    }

    #[test]
    fn test_confirmation_round_trip() {
        let json = r#"{
            "code": "LN-20250812-0042",
            "createdAt": "2025-08-12T09:30:00Z",
            "customerInfo": {
                "userId": "usr_1",
                "name": "Nguyen Thi Hoa",
                "phoneNumber": "0901234567",
                "address": "12 Hang Gai",
                "province": "Ha Noi",
                "district": "Hoan Kiem",
                "ward": "Hang Trong"
            },
            "shippingType": "standard",
            "shippingCost": 30000,
            "paymentMethod": "cod",
            "amount": 250000,
            "totalAmount": 280000,
            "status": "pending"
        }"#;

        let confirmation: OrderConfirmation = serde_json::from_str(json).unwrap();
        assert_eq!(confirmation.code, "LN-20250812-0042");
        assert_eq!(confirmation.total_amount, Price::from(280_000));
    }
}
