//! Page rendering.
//!
//! [`render`] is the whole interaction model: it takes the session state and
//! one event, performs whatever API calls the current page needs and returns
//! the updated state together with the page to display. Every page is redrawn
//! from scratch on every event.
//!
//! # Pages
//!
//! - `home` - filter sidebar, collection table, summary cards, charts
//! - `iud` - insert, update and delete a country
//! - `area` - countries ranked by area
//! - `maps` - population choropleths
//! - `lookups` - fixed requests against the API
//! - `custom` - free-text aggregation, find and distinct queries

mod area;
mod custom;
mod home;
mod iud;
mod lookups;
mod maps;

use tracing::debug;

use crate::dashboard::client::PopulationApi;
use crate::dashboard::event::Event;
use crate::dashboard::session::{Page, SessionState};
use crate::dashboard::table::Table;
use crate::dashboard::view::{Block, Field, Form, FormAction, View};

/// Shown whenever a read returns no result.
pub const FETCH_ERROR: &str = "Error when recovering data!";
pub const FETCH_SUCCESS: &str = "The data has been successfully recovered.";

/// Blocks of one rendered page.
#[derive(Debug, Default)]
pub(crate) struct PageBlocks {
    pub sidebar: Vec<Block>,
    pub main: Vec<Block>,
}

/// Apply `event` to `state` and draw the resulting page.
pub async fn render<A: PopulationApi>(api: &A, mut state: SessionState, event: Event) -> (SessionState, View) {
    state.apply(&event);
    if !state.started {
        return (state, start_view());
    }
    debug!(page = state.page.slug(), ?event, "rendering page");

    let page = match state.page {
        Page::Home => home::render(api, &state).await,
        Page::Iudc => iud::render(api, &state, &event).await,
        Page::Area => area::render(api, &state).await,
        Page::Maps => maps::render(api, &event).await,
        Page::Specific => lookups::render(api, &state, &event).await,
        Page::Personalized => custom::render(api, &state, &event).await,
    };

    let mut sidebar = vec![navigation(state.page)];
    sidebar.extend(page.sidebar);
    (state, View::new(sidebar, page.main))
}

/// Page shown until the session is started.
fn start_view() -> View {
    View::new(
        Vec::new(),
        vec![
            Block::info("Press Start to load the dashboard."),
            Block::Form(Form::new("start", "Start")),
        ],
    )
}

fn navigation(current: Page) -> Block {
    let form = Form {
        fields: vec![Field::hidden("event", "navigate")],
        actions: Page::ALL
            .into_iter()
            .map(|page| FormAction {
                name: "page".to_string(),
                value: page.slug().to_string(),
                label: page.label().to_string(),
            })
            .collect(),
    };
    Block::Expander {
        title: format!("Menu: {}", current.label()),
        blocks: vec![Block::Form(form)],
    }
}

/// Success message and table, or the fetch error.
pub(crate) fn fetched(table: Option<Table>) -> Vec<Block> {
    match table {
        Some(table) => vec![Block::success(FETCH_SUCCESS), Block::table(table)],
        None => vec![Block::error(FETCH_ERROR)],
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned API for page tests.

    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::render;
    use crate::dashboard::client::PopulationApi;
    use crate::dashboard::country::{Country, PopulationYear};
    use crate::dashboard::event::Event;
    use crate::dashboard::session::{Page, SessionState};
    use crate::dashboard::table::Table;

    /// Answers every read with `table`, every write with `ack`; records calls.
    #[derive(Default)]
    pub struct StubApi {
        pub table: Option<Table>,
        pub ack: Option<Value>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubApi {
        pub fn with_rows(rows: Value) -> Self {
            Self {
                table: Table::from_json(rows).ok(),
                ack: Some(json!({"message": "ok"})),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl PopulationApi for StubApi {
        async fn insert_country(&self, country: &Country) -> Option<Value> {
            self.record(format!("insert {}", country.country));
            self.ack.clone()
        }
        async fn update_country(&self, id: &str, country: &Country) -> Option<Value> {
            self.record(format!("update {id} {}", country.country));
            self.ack.clone()
        }
        async fn delete_country(&self, id: &str) -> Option<Value> {
            self.record(format!("delete {id}"));
            self.ack.clone()
        }
        async fn countries(&self) -> Option<Table> {
            self.record("countries".to_string());
            self.table.clone()
        }
        async fn countries_by_density(&self, min: f64, max: f64) -> Option<Table> {
            self.record(format!("density {min} {max}"));
            self.table.clone()
        }
        async fn most_populated(&self, year: PopulationYear) -> Option<Table> {
            self.record(format!("most {year}"));
            self.table.clone()
        }
        async fn least_populated(&self, year: PopulationYear) -> Option<Table> {
            self.record(format!("least {year}"));
            self.table.clone()
        }
        async fn countries_population(&self) -> Option<Table> {
            self.record("population".to_string());
            self.table.clone()
        }
        async fn country_by_name(&self, name: &str) -> Option<Table> {
            self.record(format!("country {name}"));
            self.table.clone()
        }
        async fn world_average(&self) -> Option<Table> {
            self.record("average".to_string());
            self.table.clone()
        }
        async fn countries_by_area(&self, min: f64, max: f64) -> Option<Table> {
            self.record(format!("area {min} {max}"));
            self.table.clone()
        }
        async fn custom_aggregation(&self, query: &str) -> Option<Table> {
            self.record(format!("aggregation {query}"));
            self.table.clone()
        }
        async fn custom_find(&self, query: &str) -> Option<Table> {
            self.record(format!("find {query}"));
            self.table.clone()
        }
        async fn custom_distinct(&self, query: &str) -> Option<Table> {
            self.record(format!("distinct {query}"));
            self.table.clone()
        }
        async fn count_above_average(&self, year: PopulationYear) -> Option<Value> {
            self.record(format!("above {year}"));
            self.ack.clone()
        }
        async fn count_below_average(&self, year: PopulationYear) -> Option<Value> {
            self.record(format!("below {year}"));
            self.ack.clone()
        }
    }

    /// Started session sitting on `page`.
    pub async fn started<A: PopulationApi>(api: &A, page: Page) -> SessionState {
        let (state, _) = render(api, SessionState::default(), Event::Start).await;
        let (state, _) = render(api, state, Event::Navigate { page }).await;
        state
    }

    pub fn sample_rows() -> Value {
        json!([
            {"country": "China", "place": 156, "density": 151.2, "area": 9706961.0,
             "pop1980": 982372466, "pop2000": 1264099069, "pop2010": 1348191368,
             "pop2023": 1425671352, "pop2030": 1415605906, "pop2050": 1312636325},
            {"country": "India", "place": 356, "density": 480.0, "area": 3287590.0,
             "pop1980": 696828385, "pop2000": 1059633675, "pop2010": 1240613620,
             "pop2023": 1428627663, "pop2030": 1514994080, "pop2050": 1670490596},
            {"country": "Monaco", "place": 492, "density": 18148.5, "area": 2.0,
             "pop1980": 27076, "pop2000": 32465, "pop2010": 35611,
             "pop2023": 36297, "pop2030": 36986, "pop2050": 38335}
        ])
    }
}
