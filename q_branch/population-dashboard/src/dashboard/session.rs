//! Per-session state carried between events.
//!
//! Everything a page needs to redraw itself lives here: the start flag, the
//! current page and the last value of every widget. The state is owned by the
//! session table and handed to `render` one event at a time.

use serde::{Deserialize, Serialize};

use crate::dashboard::country::{CountryForm, PopulationYear};
use crate::dashboard::event::{Comparison, Event, IudAction, QueryKind};
use crate::dashboard::transform::Selection;

/// Sidebar destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Home,
    Iudc,
    Area,
    Maps,
    Specific,
    Personalized,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::Iudc,
        Page::Area,
        Page::Maps,
        Page::Specific,
        Page::Personalized,
    ];

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Iudc => "IUDC",
            Page::Area => "Countries and their area",
            Page::Maps => "Map of the population in 2000, 2010 and 2023",
            Page::Specific => "Specific Requests",
            Page::Personalized => "Personalized Requests",
        }
    }

    /// Identifier used in forms and JSON.
    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Iudc => "iudc",
            Page::Area => "area",
            Page::Maps => "maps",
            Page::Specific => "specific",
            Page::Personalized => "personalized",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }
}

/// Default row count of the area ranking.
pub const DEFAULT_AREA_COUNT: usize = 10;
pub const MAX_AREA_COUNT: usize = 250;

pub const DEFAULT_AREA_MIN: f64 = 10.0;
pub const DEFAULT_AREA_MAX: f64 = 20.0;

/// Text and range inputs of the request pages, echoed back on every render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestInputs {
    pub country_name: String,
    pub area_min: f64,
    pub area_max: f64,
    pub density_min: f64,
    pub density_max: f64,
    pub aggregation: String,
    pub find: String,
    pub distinct: String,
}

impl Default for RequestInputs {
    fn default() -> Self {
        Self {
            country_name: String::new(),
            area_min: DEFAULT_AREA_MIN,
            area_max: DEFAULT_AREA_MAX,
            density_min: 0.0,
            density_max: 0.0,
            aggregation: String::new(),
            find: String::new(),
            distinct: String::new(),
        }
    }
}

impl RequestInputs {
    pub fn query(&self, kind: QueryKind) -> &str {
        match kind {
            QueryKind::Aggregation => &self.aggregation,
            QueryKind::Find => &self.find,
            QueryKind::Distinct => &self.distinct,
        }
    }

    fn query_mut(&mut self, kind: QueryKind) -> &mut String {
        match kind {
            QueryKind::Aggregation => &mut self.aggregation,
            QueryKind::Find => &mut self.find,
            QueryKind::Distinct => &mut self.distinct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub started: bool,
    pub page: Page,
    pub selection: Selection,
    /// `None` shows every column.
    pub visible_columns: Option<Vec<String>>,
    /// `None` follows the filtered row count.
    pub top_n: Option<usize>,
    pub iud_action: IudAction,
    pub record_id: String,
    pub country_form: CountryForm,
    pub area_count: usize,
    pub year: PopulationYear,
    pub comparison: Option<Comparison>,
    pub threshold_year: PopulationYear,
    pub inputs: RequestInputs,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            started: false,
            page: Page::Home,
            selection: Selection::default(),
            visible_columns: None,
            top_n: None,
            iud_action: IudAction::Insert,
            record_id: String::new(),
            country_form: CountryForm::default(),
            area_count: DEFAULT_AREA_COUNT,
            year: PopulationYear::Y1980,
            comparison: None,
            threshold_year: PopulationYear::Y1980,
            inputs: RequestInputs::default(),
        }
    }
}

impl SessionState {
    /// Record the widget values carried by `event`.
    ///
    /// Only `Start` is honoured before the session has started. Actions
    /// themselves (API calls) are performed by the pages, not here.
    pub fn apply(&mut self, event: &Event) {
        if !self.started {
            if matches!(event, Event::Start) {
                self.started = true;
            }
            return;
        }
        match event {
            Event::Refresh | Event::Start | Event::ShowMaps | Event::WorldAverage => {}
            Event::Navigate { page } => self.page = *page,
            Event::Filter { selection } => self.selection = selection.clone(),
            Event::ChooseColumns { columns } => self.visible_columns = Some(columns.clone()),
            Event::SetTopN { n } => self.top_n = Some(*n),
            Event::ChooseAction { action } => self.iud_action = *action,
            Event::SubmitCountry { action, id, form } => {
                self.iud_action = *action;
                self.record_id = id.clone();
                self.country_form = form.clone();
            }
            Event::SetAreaCount { count } => {
                self.area_count = (*count).clamp(1, MAX_AREA_COUNT);
            }
            Event::FindCountry { name } => self.inputs.country_name = name.clone(),
            Event::MostPopulated { year } | Event::LeastPopulated { year } => self.year = *year,
            Event::AreaRange { min, max } => {
                self.inputs.area_min = *min;
                self.inputs.area_max = *max;
            }
            Event::DensityRange { min, max } => {
                self.inputs.density_min = *min;
                self.inputs.density_max = *max;
            }
            Event::ChooseComparison { comparison } => self.comparison = *comparison,
            Event::CountVsAverage { comparison, year } => {
                self.comparison = Some(*comparison);
                self.threshold_year = *year;
            }
            Event::CustomQuery { kind, query } => {
                *self.inputs.query_mut(*kind) = query.clone();
            }
        }
    }
}
