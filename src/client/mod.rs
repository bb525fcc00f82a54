//! Client side of the nutrition tracker: a typed state controller for the
//! day view (`NutritionView`) and the HTTP client it drives (`RestClient`).
//! The view never merges concurrent edits; it replaces its local log with
//! whatever the server last returned.

pub mod api;
pub mod rest;
pub mod view;

pub use api::{ClientError, NutritionApi};
pub use rest::RestClient;
pub use view::{Notice, NoticeLevel, NutritionView, Tab, TabView};
