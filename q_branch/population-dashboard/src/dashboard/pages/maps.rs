use crate::dashboard::client::PopulationApi;
use crate::dashboard::country::PopulationYear;
use crate::dashboard::event::Event;
use crate::dashboard::transform::COUNTRY_COLUMN;
use crate::dashboard::view::{Block, Choropleth, Form};

use super::{PageBlocks, FETCH_ERROR};

const MAP_YEARS: [PopulationYear; 3] = [PopulationYear::Y2000, PopulationYear::Y2010, PopulationYear::Y2023];

/// Population series and maps, fetched only when "Show Maps" is pressed.
pub(super) async fn render<A: PopulationApi>(api: &A, event: &Event) -> PageBlocks {
    let mut main = vec![
        Block::header("Map of the population in 2000, 2010 and 2023"),
        Block::Form(Form::new("show_maps", "Show Maps")),
    ];

    if matches!(event, Event::ShowMaps) {
        match api.countries_population().await {
            Some(population) => {
                for year in MAP_YEARS {
                    main.push(Block::Choropleth(Choropleth::from_table(
                        &population,
                        COUNTRY_COLUMN,
                        year.column(),
                        format!("World population in {year}"),
                    )));
                }
                main.push(Block::table(population));
            }
            None => main.push(Block::error(FETCH_ERROR)),
        }
    }

    PageBlocks {
        sidebar: Vec::new(),
        main,
    }
}
