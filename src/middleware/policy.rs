use uuid::Uuid;

use crate::{entity::enums::Role, error::AppError, middleware::auth::AuthUser};

/// Guarded operations exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ViewCatalog,
    ManageProducts,
    ManageCategories,
    ManageCart,
    PlaceOrder,
    ViewOrders,
    UpdateOrderStatus,
    TrackOrder,
    ManageReviews,
    ManageWishlist,
    ManageAddresses,
    ManageAccount,
}

const EVERYONE: &[Role] = &[Role::Buyer, Role::Seller, Role::Admin];
const BUYERS: &[Role] = &[Role::Buyer];
const SELLERS: &[Role] = &[Role::Seller];
const ADMINS: &[Role] = &[Role::Admin];
const BUYERS_AND_ADMINS: &[Role] = &[Role::Buyer, Role::Admin];

pub fn allowed_roles(operation: Operation) -> &'static [Role] {
    match operation {
        Operation::ViewCatalog | Operation::ManageAddresses | Operation::ManageAccount => EVERYONE,
        Operation::ManageProducts => SELLERS,
        Operation::ManageCategories => ADMINS,
        Operation::ManageCart
        | Operation::PlaceOrder
        | Operation::ManageReviews
        | Operation::ManageWishlist => BUYERS,
        Operation::ViewOrders | Operation::UpdateOrderStatus | Operation::TrackOrder => {
            BUYERS_AND_ADMINS
        }
    }
}

pub fn allows(operation: Operation, role: Role) -> bool {
    allowed_roles(operation).contains(&role)
}

/// Records scoped to one user are visible to that user and to admins.
pub fn ensure_self_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.role == Role::Admin || user.user_id == owner_id {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_open_to_every_role() {
        for role in [Role::Buyer, Role::Seller, Role::Admin] {
            assert!(allows(Operation::ViewCatalog, role));
        }
    }

    #[test]
    fn only_sellers_manage_products() {
        assert!(allows(Operation::ManageProducts, Role::Seller));
        assert!(!allows(Operation::ManageProducts, Role::Buyer));
        assert!(!allows(Operation::ManageProducts, Role::Admin));
    }

    #[test]
    fn cart_and_checkout_are_buyer_only() {
        for op in [Operation::ManageCart, Operation::PlaceOrder] {
            assert_eq!(allowed_roles(op), &[Role::Buyer]);
        }
    }

    #[test]
    fn order_status_is_shared_by_buyers_and_admins() {
        assert!(allows(Operation::UpdateOrderStatus, Role::Admin));
        assert!(allows(Operation::UpdateOrderStatus, Role::Buyer));
        assert!(!allows(Operation::UpdateOrderStatus, Role::Seller));
    }

    #[test]
    fn self_or_admin_guard() {
        let owner = Uuid::new_v4();
        let buyer = AuthUser {
            user_id: owner,
            role: Role::Buyer,
        };
        let stranger = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Seller,
        };
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };

        assert!(ensure_self_or_admin(&buyer, owner).is_ok());
        assert!(ensure_self_or_admin(&admin, owner).is_ok());
        assert!(matches!(
            ensure_self_or_admin(&stranger, owner),
            Err(AppError::Forbidden)
        ));
    }
}
