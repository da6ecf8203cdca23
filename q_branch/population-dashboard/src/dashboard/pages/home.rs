use crate::dashboard::client::PopulationApi;
use crate::dashboard::country::PopulationYear;
use crate::dashboard::session::SessionState;
use crate::dashboard::table::Table;
use crate::dashboard::transform::{
    clamp_count, column_options, filter_selection, melt, summary_statistics, top_n, COUNTRY_COLUMN,
    DENSITY_COLUMN, PLACE_COLUMN, POPULATION_COLUMN, YEAR_COLUMN,
};
use crate::dashboard::view::{Block, Chart, Field, Form, Input, MetricCard};

use super::{PageBlocks, FETCH_ERROR};

const RANKING_COLUMN: &str = "pop2023";

pub(super) async fn render<A: PopulationApi>(api: &A, state: &SessionState) -> PageBlocks {
    let Some(countries) = api.countries().await else {
        return PageBlocks {
            sidebar: Vec::new(),
            main: vec![Block::error(FETCH_ERROR)],
        };
    };

    let filtered = filter_selection(&countries, &state.selection);
    let mut main = vec![Block::header("World population")];
    main.push(collection(&filtered, state));
    main.push(metrics(&filtered));
    main.push(Block::Divider);
    main.extend(ranking(&filtered, state));
    main.push(Block::Divider);
    main.extend(trends(&filtered));

    PageBlocks {
        sidebar: vec![filter_form(&countries, state)],
        main,
    }
}

fn filter_form(countries: &Table, state: &SessionState) -> Block {
    let multi = |name: &str, label: &str, column: &str, selected: &[String]| {
        Field::new(
            name,
            label,
            Input::MultiSelect {
                options: column_options(countries, column),
                selected: selected.to_vec(),
            },
        )
    };
    let selection = &state.selection;
    Block::Expander {
        title: "Filter by".to_string(),
        blocks: vec![Block::Form(
            Form::new("filter", "Apply")
                .field(multi("country", "Country", COUNTRY_COLUMN, &selection.countries))
                .field(multi("place", "Place", PLACE_COLUMN, &selection.places))
                .field(multi("density", "Density", DENSITY_COLUMN, &selection.densities)),
        )],
    }
}

/// Filtered rows with the column chooser.
fn collection(filtered: &Table, state: &SessionState) -> Block {
    let all: Vec<String> = filtered.columns().to_vec();
    let visible = state.visible_columns.clone().unwrap_or_else(|| all.clone());
    let chooser = Form::new("choose_columns", "Show columns").field(Field::new(
        "column",
        "Columns",
        Input::MultiSelect {
            options: all,
            selected: visible.clone(),
        },
    ));
    Block::Expander {
        title: "My MongoDB's Collection WorkBook".to_string(),
        blocks: vec![Block::Form(chooser), Block::table(filtered.select_columns(&visible))],
    }
}

fn metrics(filtered: &Table) -> Block {
    let stats = summary_statistics(&filtered.numeric_column(RANKING_COLUMN));
    Block::Metrics {
        cards: vec![
            MetricCard::new("Total Population", stats.total),
            MetricCard::new("Population Mode", stats.mode),
            MetricCard::new("Population Mean", stats.mean),
            MetricCard::new("Population Median", stats.median),
        ],
    }
}

fn ranking(filtered: &Table, state: &SessionState) -> Vec<Block> {
    let rows = filtered.len();
    let n = clamp_count(state.top_n.unwrap_or(rows), rows);
    let top = top_n(filtered, RANKING_COLUMN, n);
    let form = Form::new("set_top_n", "Update").field(Field::new(
        "n",
        "Number of countries",
        Input::integer(n as i64, Some(1), Some(rows.max(1) as i64)),
    ));
    vec![
        Block::subheader(format!("Top {n} most populated countries in 2023")),
        Block::Form(form),
        Block::Chart(
            Chart::bars(&top, COUNTRY_COLUMN, RANKING_COLUMN, format!("Top {n} countries by population"))
                .with_labels("Country", "Population 2023"),
        ),
    ]
}

fn trends(filtered: &Table) -> Vec<Block> {
    let long = melt(filtered, &PopulationYear::SELECTABLE);
    vec![
        Block::subheader("Demographic trends for selected countries"),
        Block::Chart(Chart::lines(
            &long,
            YEAR_COLUMN,
            POPULATION_COLUMN,
            COUNTRY_COLUMN,
            "Population from 1980 to 2050",
        )),
    ]
}

#[cfg(test)]
mod tests {
    use crate::dashboard::event::Event;
    use crate::dashboard::pages::render;
    use crate::dashboard::pages::testing::{sample_rows, started, StubApi};
    use crate::dashboard::session::Page;
    use crate::dashboard::transform::Selection;
    use crate::dashboard::view::{Block, ChartKind, MessageLevel};

    #[tokio::test]
    async fn test_empty_selection_shows_nothing() {
        let api = StubApi::with_rows(sample_rows());
        let state = started(&api, Page::Home).await;
        let (_, view) = render(&api, state, Event::Refresh).await;

        let tables = view.tables();
        assert_eq!(tables.len(), 1);
        assert!(tables[0].is_empty());
        let cards = view
            .all_blocks()
            .into_iter()
            .find_map(|b| match b {
                Block::Metrics { cards } => Some(cards.clone()),
                _ => None,
            })
            .unwrap();
        assert!(cards.iter().all(|c| c.value == "0"));
    }

    #[tokio::test]
    async fn test_filter_drives_cards_and_charts() {
        let api = StubApi::with_rows(sample_rows());
        let state = started(&api, Page::Home).await;
        let selection = Selection {
            countries: vec!["China".to_string(), "India".to_string()],
            ..Default::default()
        };
        let (state, view) = render(&api, state, Event::Filter { selection }).await;
        assert_eq!(state.selection.countries.len(), 2);

        assert_eq!(view.tables()[0].len(), 2);
        let blocks = view.all_blocks();
        let cards = blocks
            .iter()
            .find_map(|b| match b {
                Block::Metrics { cards } => Some(cards),
                _ => None,
            })
            .unwrap();
        assert_eq!(cards[0].value, "2,854,299,015");

        let charts: Vec<_> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Chart(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].kind, ChartKind::Bar);
        assert_eq!(charts[0].series[0].name, "India");
        assert_eq!(charts[1].kind, ChartKind::Line);
        assert_eq!(charts[1].series.len(), 2);
        assert_eq!(charts[1].series[0].points.len(), 6);
    }

    #[tokio::test]
    async fn test_top_n_clamped_to_filtered_rows() {
        let api = StubApi::with_rows(sample_rows());
        let state = started(&api, Page::Home).await;
        let selection = Selection {
            countries: vec!["China".to_string(), "India".to_string(), "Monaco".to_string()],
            ..Default::default()
        };
        let (state, _) = render(&api, state, Event::Filter { selection }).await;
        let (_, view) = render(&api, state, Event::SetTopN { n: 50 }).await;
        assert!(view
            .all_blocks()
            .iter()
            .any(|b| matches!(b, Block::Subheader { text } if text == "Top 3 most populated countries in 2023")));
    }

    #[tokio::test]
    async fn test_column_chooser() {
        let api = StubApi::with_rows(sample_rows());
        let state = started(&api, Page::Home).await;
        let (state, _) = render(
            &api,
            state,
            Event::Filter {
                selection: Selection {
                    countries: vec!["Monaco".to_string()],
                    ..Default::default()
                },
            },
        )
        .await;
        let columns = vec!["country".to_string(), "area".to_string()];
        let (_, view) = render(&api, state, Event::ChooseColumns { columns }).await;
        assert_eq!(view.tables()[0].columns(), ["country", "area"]);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let api = StubApi::failing();
        let state = started(&api, Page::Home).await;
        let (_, view) = render(&api, state, Event::Refresh).await;
        assert_eq!(view.messages(MessageLevel::Error), ["Error when recovering data!"]);
    }
}
