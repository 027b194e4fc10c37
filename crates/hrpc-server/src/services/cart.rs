//! Shopping cart service over a pluggable [`CartStore`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use hrpc_core::method::Method;
use hrpc_core::protocol::envelope::Metadata;
use hrpc_core::status::Status;

use crate::dispatch::{handler_fn, Dispatcher};
use crate::services::Empty;

pub const SERVICE: &str = "cart";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CartItem {
    #[prost(string, tag = "1")]
    pub product_id: String,
    #[prost(int32, tag = "2")]
    pub quantity: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddItemRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
    #[prost(message, optional, tag = "2")]
    pub item: Option<CartItem>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetCartRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmptyCartRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Cart {
    #[prost(string, tag = "1")]
    pub user_id: String,
    #[prost(message, repeated, tag = "2")]
    pub items: Vec<CartItem>,
}

pub const ADD_ITEM: Method<AddItemRequest, Empty> = Method::new(SERVICE, "add-item");
pub const GET_CART: Method<GetCartRequest, Cart> = Method::new(SERVICE, "get-cart");
pub const EMPTY_CART: Method<EmptyCartRequest, Empty> = Method::new(SERVICE, "empty-cart");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cart store unavailable: {0}")]
    Unavailable(String),
    #[error("cart store failure: {0}")]
    Backend(String),
}

impl From<StoreError> for Status {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => Status::unavailable(e.to_string()),
            StoreError::Backend(_) => Status::from_error(&e),
        }
    }
}

/// Cart persistence. Implementations synchronize internally.
#[async_trait]
pub trait CartStore: Send + Sync + 'static {
    /// Add `quantity` of a product, merging with an existing line.
    async fn add_item(&self, user_id: &str, product_id: &str, quantity: i32) -> Result<(), StoreError>;
    /// The user's cart; an unknown user has an empty one.
    async fn get_cart(&self, user_id: &str) -> Result<Cart, StoreError>;
    async fn empty_cart(&self, user_id: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryCartStore {
    carts: DashMap<String, Cart>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        tracing::info!("initializing in-memory cart store");
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn add_item(&self, user_id: &str, product_id: &str, quantity: i32) -> Result<(), StoreError> {
        tracing::debug!(user_id, product_id, quantity, "add item");
        let mut cart = self.carts.entry(user_id.to_string()).or_insert_with(|| Cart {
            user_id: user_id.to_string(),
            items: Vec::new(),
        });
        match cart.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => cart.items.push(CartItem {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
        Ok(())
    }

    async fn get_cart(&self, user_id: &str) -> Result<Cart, StoreError> {
        Ok(self
            .carts
            .get(user_id)
            .map(|c| c.value().clone())
            .unwrap_or_else(|| Cart {
                user_id: user_id.to_string(),
                items: Vec::new(),
            }))
    }

    async fn empty_cart(&self, user_id: &str) -> Result<(), StoreError> {
        self.carts.remove(user_id);
        Ok(())
    }
}

fn require_user(user_id: &str) -> Result<(), Status> {
    if user_id.trim().is_empty() {
        return Err(Status::invalid_argument("user_id must not be empty"));
    }
    Ok(())
}

async fn add_item(store: &dyn CartStore, req: AddItemRequest) -> Result<Empty, Status> {
    require_user(&req.user_id)?;
    let item = req
        .item
        .ok_or_else(|| Status::invalid_argument("item must be set"))?;
    if item.product_id.is_empty() {
        return Err(Status::invalid_argument("item.product_id must not be empty"));
    }
    if item.quantity <= 0 {
        return Err(Status::invalid_argument("item.quantity must be positive"));
    }
    store.add_item(&req.user_id, &item.product_id, item.quantity).await?;
    Ok(Empty {})
}

async fn get_cart(store: &dyn CartStore, req: GetCartRequest) -> Result<Cart, Status> {
    require_user(&req.user_id)?;
    Ok(store.get_cart(&req.user_id).await?)
}

async fn empty_cart(store: &dyn CartStore, req: EmptyCartRequest) -> Result<Empty, Status> {
    require_user(&req.user_id)?;
    store.empty_cart(&req.user_id).await?;
    Ok(Empty {})
}

pub fn register(dispatcher: &Dispatcher, store: Arc<dyn CartStore>) {
    let s = Arc::clone(&store);
    dispatcher.register(
        ADD_ITEM,
        handler_fn(move |req: AddItemRequest, _md: Metadata| {
            let store = Arc::clone(&s);
            async move { add_item(store.as_ref(), req).await }
        }),
    );

    let s = Arc::clone(&store);
    dispatcher.register_default(
        GET_CART,
        handler_fn(move |req: GetCartRequest, _md: Metadata| {
            let store = Arc::clone(&s);
            async move { get_cart(store.as_ref(), req).await }
        }),
    );

    dispatcher.register(
        EMPTY_CART,
        handler_fn(move |req: EmptyCartRequest, _md: Metadata| {
            let store = Arc::clone(&store);
            async move { empty_cart(store.as_ref(), req).await }
        }),
    );
}
