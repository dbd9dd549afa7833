//! HTTP API handlers for vestry-ui

pub mod composer;
pub mod health;
pub mod images;
pub mod items;
pub mod outfits;
pub mod sse;
pub mod ui;

pub use composer::composer_routes;
pub use health::health_routes;
pub use images::image_routes;
pub use items::item_routes;
pub use outfits::outfit_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
