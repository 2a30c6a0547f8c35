pub mod events;
pub mod order;
pub mod portfolio;
pub mod price;

pub use events::{OrderEvent, OrderUpdate, ServerMessage};
pub use order::{
    Order, OrderFilter, OrderKind, OrderPage, OrderSortField, OrderStatus, PlaceOrderRequest,
    SortDirection,
};
pub use portfolio::{Holding, HoldingView, PortfolioAnalytics};
pub use price::{PriceQuote, PriceTick};
