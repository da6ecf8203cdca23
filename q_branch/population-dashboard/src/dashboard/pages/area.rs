use crate::dashboard::client::PopulationApi;
use crate::dashboard::session::{SessionState, MAX_AREA_COUNT};
use crate::dashboard::transform::{AREA_COLUMN, COUNTRY_COLUMN};
use crate::dashboard::view::{Block, Chart, Field, Form, Input};

use super::{PageBlocks, FETCH_ERROR};

/// First N countries in API order, with their area.
pub(super) async fn render<A: PopulationApi>(api: &A, state: &SessionState) -> PageBlocks {
    let count = state.area_count;
    let form = Form::new("set_area_count", "Show").field(Field::new(
        "count",
        "Number of countries",
        Input::integer(count as i64, Some(1), Some(MAX_AREA_COUNT as i64)),
    ));
    let mut main = vec![Block::header("Countries and their area"), Block::Form(form)];

    match api.countries().await {
        Some(countries) => {
            let head = countries
                .head(count)
                .select_columns(&[COUNTRY_COLUMN.to_string(), AREA_COLUMN.to_string()]);
            main.push(Block::Chart(
                Chart::bars(&head, COUNTRY_COLUMN, AREA_COLUMN, "Area of countries")
                    .with_labels("Country", "Area (km²)"),
            ));
            main.push(Block::table(head));
        }
        None => main.push(Block::error(FETCH_ERROR)),
    }

    PageBlocks {
        sidebar: Vec::new(),
        main,
    }
}
