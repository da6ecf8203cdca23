use std::future::Future;

use crate::dashboard::client::PopulationApi;
use crate::dashboard::country::PopulationYear;
use crate::dashboard::event::{Comparison, Event};
use crate::dashboard::session::{SessionState, DEFAULT_AREA_MAX, DEFAULT_AREA_MIN};
use crate::dashboard::table::Table;
use crate::dashboard::view::{key_values, Block, Field, Form, FormAction, Input};

use super::{fetched, PageBlocks, FETCH_ERROR, FETCH_SUCCESS};

const RANGE_ERROR: &str = "The minimum value must be less than the maximum value!";
const NOT_A_NUMBER: &str = "The minimum and maximum values must be numbers!";

fn year_options() -> Vec<String> {
    PopulationYear::SELECTABLE.iter().map(|y| y.to_string()).collect()
}

pub(super) async fn render<A: PopulationApi>(api: &A, state: &SessionState, event: &Event) -> PageBlocks {
    let inputs = &state.inputs;
    let mut main = vec![Block::header("Specific Requests")];

    main.push(Block::Form(Form::new("find_country", "Find Country").field(Field::new(
        "name",
        "Country Name",
        Input::Text {
            value: inputs.country_name.clone(),
        },
    ))));
    if let Event::FindCountry { name } = event {
        main.extend(match api.country_by_name(name).await {
            Some(table) => vec![Block::success(FETCH_SUCCESS), Block::table(table)],
            None => vec![Block::error("Country not found!")],
        });
    }

    main.push(Block::Divider);
    main.push(Block::subheader("Find the most or least populated country following the year"));
    let extremes = Form::new("most_populated", "Search The Most Populated Country")
        .action(FormAction {
            name: "event".to_string(),
            value: "least_populated".to_string(),
            label: "Search The Least Populated Country".to_string(),
        })
        .field(Field::new(
            "year",
            "Year",
            Input::Radio {
                options: year_options(),
                selected: state.year.to_string(),
            },
        ));
    main.push(Block::Form(extremes));
    match event {
        Event::MostPopulated { year } => main.extend(fetched(api.most_populated(*year).await)),
        Event::LeastPopulated { year } => main.extend(fetched(api.least_populated(*year).await)),
        _ => {}
    }

    main.push(Block::Divider);
    main.push(Block::subheader("Find countries whose area is between two values"));
    main.push(Block::Form(range_form(
        "area_range",
        inputs.area_min,
        inputs.area_max,
        (DEFAULT_AREA_MIN, DEFAULT_AREA_MAX),
    )));
    if let Event::AreaRange { min, max } = event {
        main.extend(ranged(*min, *max, || api.countries_by_area(*min, *max)).await);
    }

    main.push(Block::Divider);
    main.push(Block::subheader("Find countries whose density is between two values"));
    main.push(Block::Form(range_form(
        "density_range",
        inputs.density_min,
        inputs.density_max,
        (0.0, 0.0),
    )));
    if let Event::DensityRange { min, max } = event {
        main.extend(ranged(*min, *max, || api.countries_by_density(*min, *max)).await);
    }

    main.push(Block::Divider);
    main.push(Block::subheader("Display the average world population for each year"));
    main.push(Block::Form(Form::new("world_average", "Search Average Population")));
    if let Event::WorldAverage = event {
        main.extend(fetched(api.world_average().await));
    }

    main.push(Block::Divider);
    main.extend(threshold(api, state, event).await);

    PageBlocks {
        sidebar: vec![comparison_selector(state.comparison)],
        main,
    }
}

fn range_form(event: &str, min: f64, max: f64, floors: (f64, f64)) -> Form {
    Form::new(event, "Search Countries")
        .field(Field::new("min", "Minimum value", Input::decimal(min, Some(floors.0), None)))
        .field(Field::new("max", "Maximum value", Input::decimal(max, Some(floors.1), None)))
}

/// Reject inverted or non-finite ranges before asking the API. Equal bounds are sent.
async fn ranged<F, Fut>(min: f64, max: f64, fetch: F) -> Vec<Block>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<Table>>,
{
    if !(min.is_finite() && max.is_finite()) {
        return vec![Block::error(NOT_A_NUMBER)];
    }
    if min > max {
        return vec![Block::error(RANGE_ERROR)];
    }
    fetched(fetch().await)
}

fn comparison_selector(current: Option<Comparison>) -> Block {
    let selected = current.map_or(Comparison::PLACEHOLDER, |c| c.label());
    Block::Expander {
        title: "Selection between less than or greater than".to_string(),
        blocks: vec![Block::Form(Form::new("choose_comparison", "Select").field(Field::new(
            "comparison",
            "Comparison",
            Input::Select {
                options: vec![
                    Comparison::PLACEHOLDER.to_string(),
                    Comparison::Less.label().to_string(),
                    Comparison::Greater.label().to_string(),
                ],
                selected: selected.to_string(),
            },
        )))],
    }
}

/// Count of countries below or above the yearly average.
async fn threshold<A: PopulationApi>(api: &A, state: &SessionState, event: &Event) -> Vec<Block> {
    let Some(comparison) = state.comparison else {
        return vec![Block::text("Please select an option")];
    };
    let side = match comparison {
        Comparison::Less => "less",
        Comparison::Greater => "greater",
    };
    let form = Form::new("count_vs_average", "Enter")
        .field(Field::hidden("comparison", comparison.label()))
        .field(Field::new(
            "year",
            "Select years",
            Input::Select {
                options: year_options(),
                selected: state.threshold_year.to_string(),
            },
        ));
    let mut blocks = vec![
        Block::subheader(format!("Find number of countries with a population {side} than average")),
        Block::Form(form),
    ];

    if let Event::CountVsAverage { comparison, year } = event {
        let summary = match comparison {
            Comparison::Less => api.count_below_average(*year).await,
            Comparison::Greater => api.count_above_average(*year).await,
        };
        blocks.extend(match summary {
            Some(summary) => vec![
                Block::success(FETCH_SUCCESS),
                Block::KeyValues {
                    entries: key_values(&summary),
                },
            ],
            None => vec![Block::error(FETCH_ERROR)],
        });
    }
    blocks
}
