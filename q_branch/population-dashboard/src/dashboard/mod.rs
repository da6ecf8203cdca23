//! Population dashboard library module.
//!
//! # Architecture
//!
//! - `country` - Country record, year columns and the input form
//! - `table` - Tabular result decoded from API JSON
//! - `client` - Remote API client behind the `PopulationApi` seam
//! - `transform` - Selection filter, statistics, melt and top-N
//! - `event` - User interaction events and their form decoding
//! - `session` - Per-session state carried between events
//! - `view` - Renderable page description
//! - `pages` - `render(state, event)` and the individual pages
//! - `chart` - SVG rendering for bar, line and choropleth blocks
//! - `html` - HTML rendering of a view
//! - `server` - HTTP server and session table

pub mod chart;
pub mod client;
pub mod country;
pub mod event;
pub mod html;
pub mod pages;
pub mod server;
pub mod session;
pub mod table;
pub mod transform;
pub mod view;

pub use client::{HttpPopulationApi, PopulationApi, DEFAULT_API_URL};
pub use country::{Country, CountryForm, PopulationYear};
pub use event::Event;
pub use pages::render;
pub use server::{run_server, ServerConfig};
pub use session::{Page, SessionState};
pub use table::Table;
pub use view::View;
