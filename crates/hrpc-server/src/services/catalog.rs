//! Read-only product catalog backed by a JSON document.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use hrpc_core::error::{Error, Result};
use hrpc_core::method::Method;
use hrpc_core::protocol::envelope::Metadata;
use hrpc_core::status::Status;

use crate::dispatch::{Dispatcher, Handler};
use crate::services::Empty;

pub const SERVICE: &str = "catalog";

const BUILTIN_CATALOG: &str = include_str!("../../data/products.json");

#[derive(Clone, PartialEq, ::prost::Message, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Money {
    #[prost(string, tag = "1")]
    pub currency_code: String,
    #[prost(int64, tag = "2")]
    pub units: i64,
    #[prost(int32, tag = "3")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, ::prost::Message, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub picture: String,
    #[prost(message, optional, tag = "5")]
    pub price_usd: Option<Money>,
    #[prost(string, repeated, tag = "6")]
    pub categories: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Deserialize)]
#[serde(default)]
pub struct ListProductsResponse {
    #[prost(message, repeated, tag = "1")]
    pub products: Vec<Product>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProductRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchProductsRequest {
    #[prost(string, tag = "1")]
    pub query: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchProductsResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<Product>,
}

pub const LIST_PRODUCTS: Method<Empty, ListProductsResponse> = Method::new(SERVICE, "list-products");
pub const GET_PRODUCT: Method<GetProductRequest, Product> = Method::new(SERVICE, "get-product");
pub const SEARCH_PRODUCTS: Method<SearchProductsRequest, SearchProductsResponse> =
    Method::new(SERVICE, "search-products");

pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a `{"products": [...]}` document.
    pub fn from_json(s: &str) -> Result<Self> {
        let doc: ListProductsResponse = serde_json::from_str(s)
            .map_err(|e| Error::Config(format!("failed to parse catalog JSON: {e}")))?;
        Ok(Self::new(doc.products))
    }

    /// Catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn list(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Case-insensitive substring match over name and description.
    pub fn search(&self, query: &str) -> Vec<Product> {
        let q = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&q) || p.description.to_lowercase().contains(&q))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Handler<Empty, ListProductsResponse> for Catalog {
    async fn call(&self, _req: Empty, _md: Metadata) -> std::result::Result<ListProductsResponse, Status> {
        Ok(ListProductsResponse {
            products: self.products.clone(),
        })
    }
}

#[async_trait]
impl Handler<GetProductRequest, Product> for Catalog {
    async fn call(&self, req: GetProductRequest, _md: Metadata) -> std::result::Result<Product, Status> {
        self.get(&req.id)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("no product with ID {}", req.id)))
    }
}

#[async_trait]
impl Handler<SearchProductsRequest, SearchProductsResponse> for Catalog {
    async fn call(
        &self,
        req: SearchProductsRequest,
        _md: Metadata,
    ) -> std::result::Result<SearchProductsResponse, Status> {
        Ok(SearchProductsResponse {
            results: self.search(&req.query),
        })
    }
}

pub fn register(dispatcher: &Dispatcher, catalog: Arc<Catalog>) {
    dispatcher.register_default(LIST_PRODUCTS, Arc::clone(&catalog));
    dispatcher.register(GET_PRODUCT, Arc::clone(&catalog));
    dispatcher.register(SEARCH_PRODUCTS, catalog);
}
