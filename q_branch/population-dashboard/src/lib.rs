//! Analytics dashboard over the world population REST API.
//!
//! The dashboard is a presentation client: every aggregation, filter and
//! write happens behind a remote API backed by a document database. This
//! crate only builds requests, turns JSON answers into tables, reshapes them
//! and renders pages.
//!
//! ## Architecture
//!
//! 1. **API client** (`dashboard::client`) - one operation per remote
//!    endpoint. Failures never escape: they are logged and surface as `None`.
//!
//! 2. **Transforms** (`dashboard::transform`) - pure client-side filtering,
//!    summary statistics, melt and top-N selection over a [`dashboard::Table`].
//!
//! 3. **Pages** (`dashboard::pages`) - `render(api, state, event)` produces the
//!    next session state and a [`dashboard::View`], which the HTTP server
//!    (`dashboard::server`) serves as HTML or JSON.
//!
//! ## Usage
//!
//! ```bash
//! popdash --port 8501
//! popdash --api-url http://127.0.0.1:8000 --no-browser
//! ```

pub mod dashboard;
