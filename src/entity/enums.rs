use async_graphql::Enum;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[graphql(rename_items = "PascalCase")]
pub enum Role {
    #[sea_orm(string_value = "Buyer")]
    Buyer,
    #[sea_orm(string_value = "Seller")]
    Seller,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => "Buyer",
            Role::Seller => "Seller",
            Role::Admin => "Admin",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Enum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "RETURNED")]
    Returned,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
        }
    }

    /// Position on the fulfilment path. Cancelled and returned orders are off the path.
    pub fn fulfilment_rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled | OrderStatus::Returned => None,
        }
    }

    pub fn next_allowed(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered => &[Returned],
            Cancelled | Returned => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_allowed().contains(&next)
    }

    /// Transitions the order's buyer may request on their own.
    pub fn buyer_may_request(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending | OrderStatus::Confirmed, OrderStatus::Cancelled)
                | (OrderStatus::Delivered, OrderStatus::Returned)
        )
    }

    /// Orders leaving the system this way give their stock back.
    pub fn releases_stock(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Enum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "CARD")]
    Card,
    #[sea_orm(string_value = "PAYPAL")]
    Paypal,
    #[sea_orm(string_value = "CASH_ON_DELIVERY")]
    CashOnDelivery,
    #[sea_orm(string_value = "BANK_TRANSFER")]
    BankTransfer,
    #[sea_orm(string_value = "WALLET")]
    Wallet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Enum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
}

impl PaymentStatus {
    /// Payment status that follows an order entering `status`, if it changes at all.
    pub fn after_order_status(self, status: OrderStatus) -> Option<PaymentStatus> {
        match (self, status) {
            (PaymentStatus::Pending, OrderStatus::Delivered) => Some(PaymentStatus::Success),
            (PaymentStatus::Pending | PaymentStatus::Failed, OrderStatus::Cancelled) => {
                Some(PaymentStatus::Cancelled)
            }
            (PaymentStatus::Success, OrderStatus::Cancelled | OrderStatus::Returned) => {
                Some(PaymentStatus::Refunded)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn terminal_statuses_have_no_exits() {
        assert!(OrderStatus::Cancelled.next_allowed().is_empty());
        assert!(OrderStatus::Returned.next_allowed().is_empty());
    }

    #[test]
    fn fulfilment_path_moves_one_step_at_a_time() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn every_allowed_transition_moves_forward() {
        for status in OrderStatus::iter() {
            for next in status.next_allowed() {
                assert_ne!(status, *next);
                if let (Some(from), Some(to)) = (status.fulfilment_rank(), next.fulfilment_rank()) {
                    assert_eq!(to, from + 1, "{status:?} -> {next:?}");
                }
            }
        }
    }

    #[test]
    fn buyer_requests_are_a_subset_of_allowed_transitions() {
        for status in OrderStatus::iter() {
            for next in OrderStatus::iter() {
                if status.buyer_may_request(next) {
                    assert!(status.can_transition_to(next), "{status:?} -> {next:?}");
                }
            }
        }
        assert!(!OrderStatus::Processing.buyer_may_request(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.buyer_may_request(OrderStatus::Confirmed));
    }

    #[test]
    fn payment_follows_order_outcome() {
        assert_eq!(
            PaymentStatus::Pending.after_order_status(OrderStatus::Delivered),
            Some(PaymentStatus::Success)
        );
        assert_eq!(
            PaymentStatus::Pending.after_order_status(OrderStatus::Cancelled),
            Some(PaymentStatus::Cancelled)
        );
        assert_eq!(
            PaymentStatus::Success.after_order_status(OrderStatus::Returned),
            Some(PaymentStatus::Refunded)
        );
        assert_eq!(PaymentStatus::Pending.after_order_status(OrderStatus::Shipped), None);
    }
}
