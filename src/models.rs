use async_graphql::{ComplexObject, Context, Result, SimpleObject};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    entity::{
        addresses, categories,
        enums::{OrderStatus, PaymentMethod, PaymentStatus, Role},
        orders, payments, products, reviews, users, wishlist_items,
    },
    graphql::{IntoGql, owner_scope, request_parts},
    pricing,
    services::{
        address_service, cart_service, category_service, order_service, product_service,
        review_service, user_service,
    },
    tracking::TrackingEvent,
};

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Relations below are visible to the user themselves and to admins.
#[ComplexObject]
impl User {
    async fn addresses(&self, ctx: &Context<'_>) -> Result<Vec<Address>> {
        let state = owner_scope(ctx, self.id)?;
        address_service::list_for_user(&state.orm, self.id)
            .await
            .into_gql()
    }

    async fn orders(&self, ctx: &Context<'_>) -> Result<Vec<Order>> {
        let state = owner_scope(ctx, self.id)?;
        order_service::list_for_user(&state.orm, self.id)
            .await
            .into_gql()
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let state = owner_scope(ctx, self.id)?;
        review_service::list_for_user(&state.orm, self.id)
            .await
            .into_gql()
    }

    async fn payments(&self, ctx: &Context<'_>) -> Result<Vec<Payment>> {
        let state = owner_scope(ctx, self.id)?;
        order_service::payments_for_user(&state.orm, self.id)
            .await
            .into_gql()
    }

    async fn cart(&self, ctx: &Context<'_>) -> Result<Option<Cart>> {
        let state = owner_scope(ctx, self.id)?;
        cart_service::find_cart(&state.orm, self.id).await.into_gql()
    }

    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<Product>> {
        let state = owner_scope(ctx, self.id)?;
        product_service::list_for_seller(&state.orm, self.id, true)
            .await
            .into_gql()
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    /// Percentage off the list price.
    pub discount: Decimal,
    pub stock: i32,
    pub brand: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[ComplexObject]
impl Product {
    #[graphql(name = "discounted_price")]
    async fn discounted_price(&self) -> Decimal {
        pricing::discounted_price(self.price, self.discount)
    }

    async fn seller(&self, ctx: &Context<'_>) -> Result<User> {
        let (state, _) = request_parts(ctx)?;
        user_service::find_user(&state.orm, self.seller_id)
            .await
            .into_gql()
    }

    async fn category(&self, ctx: &Context<'_>) -> Result<Category> {
        let (state, _) = request_parts(ctx)?;
        category_service::find_category(&state.orm, self.category_id)
            .await
            .into_gql()
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let (state, _) = request_parts(ctx)?;
        review_service::list_for_product(&state.orm, self.id)
            .await
            .into_gql()
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct ProductSuggestion {
    pub id: Uuid,
    pub title: String,
    pub brand: String,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[ComplexObject]
impl Category {
    async fn parent(&self, ctx: &Context<'_>) -> Result<Option<Category>> {
        let Some(parent_id) = self.parent_id else {
            return Ok(None);
        };
        let (state, _) = request_parts(ctx)?;
        category_service::find_category(&state.orm, parent_id)
            .await
            .map(Some)
            .into_gql()
    }

    async fn children(&self, ctx: &Context<'_>) -> Result<Vec<Category>> {
        let (state, _) = request_parts(ctx)?;
        category_service::children_of(&state.orm, self.id)
            .await
            .into_gql()
    }

    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<Product>> {
        let (state, _) = request_parts(ctx)?;
        product_service::list_active_in_category(&state.orm, self.id)
            .await
            .into_gql()
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    /// Sum of list price times quantity over all lines.
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CartItem {
    pub id: Uuid,
    pub quantity: i32,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub city: String,
    pub country: String,
    pub phone: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct OrderItem {
    pub id: Uuid,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub product: Product,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub address: Address,
    pub payment: Option<Payment>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct OrderTracking {
    pub order: Order,
    pub tracking: Vec<TrackingEvent>,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub review_date: DateTime<Utc>,
}

#[ComplexObject]
impl Review {
    async fn product(&self, ctx: &Context<'_>) -> Result<Product> {
        let (state, _) = request_parts(ctx)?;
        product_service::find_product(&state.orm, self.product_id)
            .await
            .map(product_from_entity)
            .into_gql()
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct WishlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub product: Product,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct WishlistResponse {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

pub fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        seller_id: model.seller_id,
        category_id: model.category_id,
        title: model.title,
        description: model.description,
        price: model.price,
        discount: model.discount,
        stock: model.stock,
        brand: model.brand,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn suggestion_from_entity(model: products::Model) -> ProductSuggestion {
    ProductSuggestion {
        id: model.id,
        title: model.title,
        brand: model.brand,
    }
}

pub fn category_from_entity(model: categories::Model) -> Category {
    Category {
        id: model.id,
        name: model.name,
        parent_id: model.parent_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn address_from_entity(model: addresses::Model) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        full_name: model.full_name,
        city: model.city,
        country: model.country,
        phone: model.phone,
        is_default: model.is_default,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn payment_from_entity(model: payments::Model) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        transaction_id: model.transaction_id,
        amount: model.amount,
        paid_at: model.paid_at.map(|at| at.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        rating: model.rating,
        comment: model.comment,
        review_date: model.review_date.with_timezone(&Utc),
    }
}

pub fn wishlist_item_from_entity(
    model: wishlist_items::Model,
    product: products::Model,
) -> WishlistItem {
    WishlistItem {
        id: model.id,
        user_id: model.user_id,
        created_at: model.created_at.with_timezone(&Utc),
        product: product_from_entity(product),
    }
}

pub fn order_from_entity(
    model: orders::Model,
    address: addresses::Model,
    payment: Option<payments::Model>,
    items: Vec<OrderItem>,
) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        total_amount: model.total_amount,
        order_date: model.order_date.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        address: address_from_entity(address),
        payment: payment.map(payment_from_entity),
        items,
    }
}
