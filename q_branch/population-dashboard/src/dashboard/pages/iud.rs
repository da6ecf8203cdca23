use serde_json::Value;
use tracing::info;

use crate::dashboard::client::PopulationApi;
use crate::dashboard::country::{CountryForm, AREA_SENTINEL, GROWTH_RATE_SENTINEL};
use crate::dashboard::event::{Event, IudAction};
use crate::dashboard::session::SessionState;
use crate::dashboard::table::display_value;
use crate::dashboard::view::{key_values, Block, Field, Form, Input};

use super::PageBlocks;

pub(super) async fn render<A: PopulationApi>(api: &A, state: &SessionState, event: &Event) -> PageBlocks {
    let action = state.iud_action;
    let chooser = Form::new("choose_action", "Choose").field(Field::new(
        "action",
        "Action",
        Input::Radio {
            options: IudAction::ALL.iter().map(|a| a.label().to_string()).collect(),
            selected: action.label().to_string(),
        },
    ));

    let mut main = vec![
        Block::subheader("Insert, Update and Delete a Country"),
        Block::Form(chooser),
        Block::Form(record_form(action, &state.record_id, &state.country_form)),
    ];

    if let Event::SubmitCountry { action, id, form } = event {
        main.extend(submit(api, *action, id, form).await);
    }

    PageBlocks {
        sidebar: Vec::new(),
        main,
    }
}

async fn submit<A: PopulationApi>(api: &A, action: IudAction, id: &str, form: &CountryForm) -> Vec<Block> {
    if action == IudAction::Delete {
        return match api.delete_country(id).await {
            Some(ack) => {
                info!(id, "country deleted");
                let mut entries = vec![("id".to_string(), id.to_string())];
                entries.extend(acknowledgement(&ack));
                vec![Block::success("Successfully deleted data."), Block::KeyValues { entries }]
            }
            None => vec![Block::error("Error deleting data.")],
        };
    }

    let country = match form.clone().into_country() {
        Ok(country) => country,
        Err(e) => return vec![Block::error(e.to_string())],
    };
    let (ack, done, failed) = if action == IudAction::Insert {
        (
            api.insert_country(&country).await,
            "Successfully inserted data.",
            "Error inserting data.",
        )
    } else {
        (
            api.update_country(id, &country).await,
            "Successfully updated data.",
            "Error updating data.",
        )
    };
    match ack {
        Some(_) => {
            info!(country = %country.country, ?action, "country written");
            let entries = country
                .field_values()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            vec![Block::success(done), Block::KeyValues { entries }]
        }
        None => vec![Block::error(failed)],
    }
}

/// Acknowledgement fields other than nested documents.
fn acknowledgement(ack: &Value) -> Vec<(String, String)> {
    match ack {
        Value::Object(obj) => obj
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect(),
        Value::Null => Vec::new(),
        other => key_values(other),
    }
}

/// Inputs for `action`: an id for update and delete, the country fields for
/// insert and update.
fn record_form(action: IudAction, id: &str, values: &CountryForm) -> Form {
    let mut form = Form::new("submit_country", action.label()).field(Field::hidden("action", action.label()));
    if action != IudAction::Insert {
        form = form.field(Field::new("id", "ID", Input::Text { value: id.to_string() }));
    }
    if action != IudAction::Delete {
        for field in country_fields(values) {
            form = form.field(field);
        }
    }
    form
}

fn country_fields(v: &CountryForm) -> Vec<Field> {
    let text = |name: &str, label: &str, value: &str| {
        Field::new(name, label, Input::Text { value: value.to_string() })
    };
    let int = |name: &str, label: &str, value: i64, max: Option<i64>| {
        Field::new(name, label, Input::integer(value, Some(0), max))
    };
    let dec = |name: &str, label: &str, value: f64, min: f64, max: Option<f64>| {
        Field::new(name, label, Input::decimal(value, Some(min), max))
    };
    vec![
        text("country", "Country", &v.country),
        int("rank", "Rank", v.rank, Some(250)),
        dec("area", "Area", v.area, AREA_SENTINEL, None),
        dec("landAreaKm", "Land Area (km²)", v.land_area_km, 0.0, None),
        text("cca2", "CCA2", &v.cca2),
        text("cca3", "CCA3", &v.cca3),
        dec("netChange", "Net Change", v.net_change, 0.0, None),
        dec("growthRate", "Growth Rate", v.growth_rate, GROWTH_RATE_SENTINEL, Some(1.0)),
        dec("worldPercentage", "World Percentage", v.world_percentage, 0.0, Some(1.0)),
        dec("density", "Density", v.density, 0.0, None),
        dec("densityMi", "Density (mi²)", v.density_mi, 0.0, None),
        int("place", "Place", v.place, None),
        int("pop1980", "Population in 1980", v.pop1980, None),
        int("pop2000", "Population in 2000", v.pop2000, None),
        int("pop2010", "Population in 2010", v.pop2010, None),
        int("pop2022", "Population in 2022", v.pop2022, None),
        int("pop2023", "Population in 2023", v.pop2023, None),
        int("pop2030", "Population in 2030", v.pop2030, None),
        int("pop2050", "Population in 2050", v.pop2050, None),
    ]
}
