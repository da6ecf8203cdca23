//! User interaction events.
//!
//! JSON clients send events as `{"event": "<name>", ...}`. HTML forms send
//! flat `name=value` pairs with the event name in the `event` field; those are
//! decoded by [`Event::from_form`].

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dashboard::country::{CountryForm, PopulationYear};
use crate::dashboard::session::Page;
use crate::dashboard::transform::Selection;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("missing form field `{0}`")]
    MissingField(String),

    #[error("invalid value for `{field}`: {value:?}")]
    InvalidValue { field: String, value: String },

    #[error("unknown event `{0}`")]
    UnknownEvent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IudAction {
    #[default]
    Insert,
    Update,
    Delete,
}

impl IudAction {
    pub const ALL: [IudAction; 3] = [IudAction::Insert, IudAction::Update, IudAction::Delete];

    pub fn label(&self) -> &'static str {
        match self {
            IudAction::Insert => "Insert",
            IudAction::Update => "Update",
            IudAction::Delete => "Delete",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(label))
    }
}

/// Side of the yearly average to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Less,
    Greater,
}

impl Comparison {
    /// Placeholder entry of the comparison selector.
    pub const PLACEHOLDER: &'static str = "select";

    pub fn label(&self) -> &'static str {
        match self {
            Comparison::Less => "Less than",
            Comparison::Greater => "Greater than",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Comparison::Less, Comparison::Greater]
            .into_iter()
            .find(|c| c.label() == label)
    }
}

/// Free-text query panels of the personalized requests page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Aggregation,
    Find,
    Distinct,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [QueryKind::Aggregation, QueryKind::Find, QueryKind::Distinct];

    pub fn slug(&self) -> &'static str {
        match self {
            QueryKind::Aggregation => "aggregation",
            QueryKind::Find => "find",
            QueryKind::Distinct => "distinct",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Redraw the current page.
    Refresh,
    Start,
    Navigate {
        page: Page,
    },
    Filter {
        #[serde(default)]
        selection: Selection,
    },
    ChooseColumns {
        columns: Vec<String>,
    },
    SetTopN {
        n: usize,
    },
    ChooseAction {
        action: IudAction,
    },
    SubmitCountry {
        action: IudAction,
        #[serde(default)]
        id: String,
        #[serde(default)]
        form: CountryForm,
    },
    SetAreaCount {
        count: usize,
    },
    ShowMaps,
    FindCountry {
        name: String,
    },
    MostPopulated {
        #[serde(deserialize_with = "selectable_year")]
        year: PopulationYear,
    },
    LeastPopulated {
        #[serde(deserialize_with = "selectable_year")]
        year: PopulationYear,
    },
    AreaRange {
        min: f64,
        max: f64,
    },
    DensityRange {
        min: f64,
        max: f64,
    },
    WorldAverage,
    ChooseComparison {
        comparison: Option<Comparison>,
    },
    CountVsAverage {
        comparison: Comparison,
        #[serde(deserialize_with = "selectable_year")]
        year: PopulationYear,
    },
    CustomQuery {
        kind: QueryKind,
        query: String,
    },
}

/// Year of a selector: any known year except the ones the selectors hide.
fn selectable_year<'de, D>(deserializer: D) -> Result<PopulationYear, D::Error>
where
    D: Deserializer<'de>,
{
    let year = PopulationYear::deserialize(deserializer)?;
    if !year.is_selectable() {
        return Err(serde::de::Error::custom(format!("population year {year} cannot be selected")));
    }
    Ok(year)
}

/// Lookup helpers over submitted `name=value` pairs.
struct FormFields<'a>(&'a [(String, String)]);

impl<'a> FormFields<'a> {
    fn get(&self, name: &str) -> Option<&'a str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, name: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn required(&self, name: &str) -> Result<&'a str, EventError> {
        self.get(name)
            .ok_or_else(|| EventError::MissingField(name.to_string()))
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<T, EventError> {
        let raw = self.required(name)?;
        raw.trim().parse().map_err(|_| invalid(name, raw))
    }

    /// Missing or blank fields take `default`.
    fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, EventError> {
        match self.get(name) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| invalid(name, raw)),
            _ => Ok(default),
        }
    }

    fn year(&self, name: &str) -> Result<PopulationYear, EventError> {
        let year: PopulationYear = self.parse(name)?;
        if !year.is_selectable() {
            return Err(invalid(name, &year.to_string()));
        }
        Ok(year)
    }

    fn country_form(&self) -> Result<CountryForm, EventError> {
        let d = CountryForm::default();
        Ok(CountryForm {
            country: self.get("country").unwrap_or_default().to_string(),
            rank: self.parse_or("rank", d.rank)?,
            area: self.parse_or("area", d.area)?,
            land_area_km: self.parse_or("landAreaKm", d.land_area_km)?,
            cca2: self.get("cca2").unwrap_or_default().to_string(),
            cca3: self.get("cca3").unwrap_or_default().to_string(),
            net_change: self.parse_or("netChange", d.net_change)?,
            growth_rate: self.parse_or("growthRate", d.growth_rate)?,
            world_percentage: self.parse_or("worldPercentage", d.world_percentage)?,
            density: self.parse_or("density", d.density)?,
            density_mi: self.parse_or("densityMi", d.density_mi)?,
            place: self.parse_or("place", d.place)?,
            pop1980: self.parse_or("pop1980", d.pop1980)?,
            pop2000: self.parse_or("pop2000", d.pop2000)?,
            pop2010: self.parse_or("pop2010", d.pop2010)?,
            pop2022: self.parse_or("pop2022", d.pop2022)?,
            pop2023: self.parse_or("pop2023", d.pop2023)?,
            pop2030: self.parse_or("pop2030", d.pop2030)?,
            pop2050: self.parse_or("pop2050", d.pop2050)?,
        })
    }
}

fn invalid(field: &str, value: &str) -> EventError {
    EventError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

impl Event {
    /// Decode an HTML form submission.
    pub fn from_form(pairs: &[(String, String)]) -> Result<Self, EventError> {
        let form = FormFields(pairs);
        let name = form.required("event")?;
        let event = match name {
            "refresh" => Event::Refresh,
            "start" => Event::Start,
            "navigate" => {
                let slug = form.required("page")?;
                let page = Page::from_slug(slug).ok_or_else(|| invalid("page", slug))?;
                Event::Navigate { page }
            }
            "filter" => Event::Filter {
                selection: Selection {
                    countries: form.all("country"),
                    places: form.all("place"),
                    densities: form.all("density"),
                },
            },
            "choose_columns" => Event::ChooseColumns {
                columns: form.all("column"),
            },
            "set_top_n" => Event::SetTopN { n: form.parse("n")? },
            "choose_action" => {
                let raw = form.required("action")?;
                let action = IudAction::from_label(raw).ok_or_else(|| invalid("action", raw))?;
                Event::ChooseAction { action }
            }
            "submit_country" => {
                let raw = form.required("action")?;
                let action = IudAction::from_label(raw).ok_or_else(|| invalid("action", raw))?;
                Event::SubmitCountry {
                    action,
                    id: form.get("id").unwrap_or_default().trim().to_string(),
                    form: form.country_form()?,
                }
            }
            "set_area_count" => Event::SetAreaCount {
                count: form.parse("count")?,
            },
            "show_maps" => Event::ShowMaps,
            "find_country" => Event::FindCountry {
                name: form.get("name").unwrap_or_default().to_string(),
            },
            "most_populated" => Event::MostPopulated {
                year: form.year("year")?,
            },
            "least_populated" => Event::LeastPopulated {
                year: form.year("year")?,
            },
            "area_range" => Event::AreaRange {
                min: form.parse("min")?,
                max: form.parse("max")?,
            },
            "density_range" => Event::DensityRange {
                min: form.parse("min")?,
                max: form.parse("max")?,
            },
            "world_average" => Event::WorldAverage,
            "choose_comparison" => {
                let raw = form.required("comparison")?;
                let comparison = match raw {
                    Comparison::PLACEHOLDER => None,
                    label => Some(Comparison::from_label(label).ok_or_else(|| invalid("comparison", raw))?),
                };
                Event::ChooseComparison { comparison }
            }
            "count_vs_average" => {
                let raw = form.required("comparison")?;
                let comparison = Comparison::from_label(raw).ok_or_else(|| invalid("comparison", raw))?;
                Event::CountVsAverage {
                    comparison,
                    year: form.year("year")?,
                }
            }
            "custom_query" => {
                let raw = form.required("kind")?;
                let kind = QueryKind::from_slug(raw).ok_or_else(|| invalid("kind", raw))?;
                Event::CustomQuery {
                    kind,
                    query: form.get("query").unwrap_or_default().to_string(),
                }
            }
            other => return Err(EventError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_event_name() {
        let err = Event::from_form(&pairs(&[("page", "home")])).unwrap_err();
        assert_eq!(err, EventError::MissingField("event".to_string()));
    }

    #[test]
    fn test_unknown_event_name() {
        let err = Event::from_form(&pairs(&[("event", "explode")])).unwrap_err();
        assert_eq!(err, EventError::UnknownEvent("explode".to_string()));
    }

    #[test]
    fn test_navigate() {
        let event = Event::from_form(&pairs(&[("event", "navigate"), ("page", "maps")])).unwrap();
        assert_eq!(event, Event::Navigate { page: Page::Maps });

        let err = Event::from_form(&pairs(&[("event", "navigate"), ("page", "moon")])).unwrap_err();
        assert!(matches!(err, EventError::InvalidValue { .. }));
    }

    #[test]
    fn test_filter_collects_repeated_fields() {
        let event = Event::from_form(&pairs(&[
            ("event", "filter"),
            ("country", "China"),
            ("country", "India"),
            ("density", "480.0"),
        ]))
        .unwrap();
        let Event::Filter { selection } = event else {
            panic!("expected filter");
        };
        assert_eq!(selection.countries, ["China", "India"]);
        assert!(selection.places.is_empty());
        assert_eq!(selection.densities, ["480.0"]);
    }

    #[test]
    fn test_submit_country_defaults_missing_numbers() {
        let event = Event::from_form(&pairs(&[
            ("event", "submit_country"),
            ("action", "Insert"),
            ("country", "Atlantis"),
            ("pop2023", "12"),
            ("rank", ""),
        ]))
        .unwrap();
        let Event::SubmitCountry { action, id, form } = event else {
            panic!("expected submit");
        };
        assert_eq!(action, IudAction::Insert);
        assert_eq!(id, "");
        assert_eq!(form.country, "Atlantis");
        assert_eq!(form.pop2023, 12);
        assert_eq!(form.rank, 0);
        assert_eq!(form.area, crate::dashboard::country::AREA_SENTINEL);
    }

    #[test]
    fn test_submit_country_rejects_garbage_number() {
        let err = Event::from_form(&pairs(&[
            ("event", "submit_country"),
            ("action", "Update"),
            ("area", "lots"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            EventError::InvalidValue {
                field: "area".to_string(),
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn test_year_must_be_selectable() {
        let ok = Event::from_form(&pairs(&[("event", "most_populated"), ("year", "2023")])).unwrap();
        assert_eq!(
            ok,
            Event::MostPopulated {
                year: PopulationYear::Y2023
            }
        );
        assert!(Event::from_form(&pairs(&[("event", "least_populated"), ("year", "2022")])).is_err());
        assert!(Event::from_form(&pairs(&[("event", "least_populated"), ("year", "1999")])).is_err());
    }

    #[test]
    fn test_comparison_placeholder() {
        let event = Event::from_form(&pairs(&[("event", "choose_comparison"), ("comparison", "select")])).unwrap();
        assert_eq!(event, Event::ChooseComparison { comparison: None });

        let event = Event::from_form(&pairs(&[
            ("event", "count_vs_average"),
            ("comparison", "Greater than"),
            ("year", "2050"),
        ]))
        .unwrap();
        assert_eq!(
            event,
            Event::CountVsAverage {
                comparison: Comparison::Greater,
                year: PopulationYear::Y2050
            }
        );
    }

    #[test]
    fn test_custom_query_kept_verbatim() {
        let query = r#"[{"$match": {"rank": {"$lt": 5}}}]"#;
        let event = Event::from_form(&pairs(&[
            ("event", "custom_query"),
            ("kind", "aggregation"),
            ("query", query),
        ]))
        .unwrap();
        assert_eq!(
            event,
            Event::CustomQuery {
                kind: QueryKind::Aggregation,
                query: query.to_string()
            }
        );
    }

    #[test]
    fn test_json_shape() {
        let event: Event = serde_json::from_str(r#"{"event": "density_range", "min": 0, "max": 0}"#).unwrap();
        assert_eq!(event, Event::DensityRange { min: 0.0, max: 0.0 });

        let event: Event = serde_json::from_str(r#"{"event": "navigate", "page": "specific"}"#).unwrap();
        assert_eq!(event, Event::Navigate { page: Page::Specific });

        let event: Event = serde_json::from_str(
            r#"{"event": "submit_country", "action": "insert", "form": {"country": "Atlantis", "growthRate": 0.5}}"#,
        )
        .unwrap();
        let Event::SubmitCountry { form, .. } = event else {
            panic!("expected submit");
        };
        assert_eq!(form.growth_rate, 0.5);
        assert_eq!(form.area, crate::dashboard::country::AREA_SENTINEL);

        let event: Event = serde_json::from_str(r#"{"event": "most_populated", "year": 2023}"#).unwrap();
        assert_eq!(event, Event::MostPopulated { year: PopulationYear::Y2023 });
        for hidden in [
            r#"{"event": "most_populated", "year": 2022}"#,
            r#"{"event": "least_populated", "year": 2022}"#,
            r#"{"event": "count_vs_average", "comparison": "less", "year": 2022}"#,
        ] {
            let err = serde_json::from_str::<Event>(hidden).unwrap_err();
            assert!(err.to_string().contains("2022"), "{hidden}: {err}");
        }
    }
}
