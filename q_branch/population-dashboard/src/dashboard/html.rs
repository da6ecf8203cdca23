//! HTML rendering of a [`View`].
//!
//! Every form posts back to `/session/{id}`; the server decodes the fields
//! into an [`Event`](crate::dashboard::Event) and answers with the next page.

use maud::{html, Markup, DOCTYPE};

use crate::dashboard::chart::{render_chart, render_choropleth};
use crate::dashboard::table::{display_value, Table};
use crate::dashboard::view::{Block, Field, Form, Input, MessageLevel, View, DASHBOARD_TITLE};

/// Embedded stylesheet, served at `/static/style.css`.
pub const STYLESHEET: &str = include_str!("static/style.css");

fn document(title: &str, sidebar: Markup, main: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width,initial-scale=1";
                title { (title) }
                link rel="stylesheet" href="/static/style.css";
            }
            body {
                aside { (sidebar) }
                main {
                    h1 { (title) }
                    (main)
                }
            }
        }
    }
}

/// Full page for session `session_id`.
pub fn render_page(view: &View, session_id: &str) -> String {
    let action = format!("/session/{session_id}");
    let sidebar = html! {
        (blocks(&view.sidebar, &action))
        hr;
        form method="post" action={ (action) "/end" } {
            button type="submit" { "End session" }
        }
    };
    document(&view.title, sidebar, blocks(&view.blocks, &action)).into_string()
}

/// Page shown once a session has ended.
pub fn render_ended() -> String {
    let main = html! {
        div.msg.info { "Session ended." }
        p { a href="/" { "Start a new session" } }
    };
    document(DASHBOARD_TITLE, html! {}, main).into_string()
}

fn blocks(items: &[Block], action: &str) -> Markup {
    html! {
        @for item in items {
            (block(item, action))
        }
    }
}

fn level_class(level: &MessageLevel) -> &'static str {
    match level {
        MessageLevel::Info => "info",
        MessageLevel::Success => "success",
        MessageLevel::Error => "error",
    }
}

fn block(item: &Block, action: &str) -> Markup {
    match item {
        Block::Header { text } => html! { h2 { (text) } },
        Block::Subheader { text } => html! { h3 { (text) } },
        Block::Text { text } => html! { p { (text) } },
        Block::Divider => html! { hr; },
        Block::Message { level, text } => html! {
            div class={ "msg " (level_class(level)) } { (text) }
        },
        Block::Metrics { cards } => html! {
            div.metrics {
                @for card in cards {
                    div.metric {
                        div.label { (card.label) }
                        div.value { (card.value) }
                    }
                }
            }
        },
        Block::Table { table } => data_table(table),
        Block::KeyValues { entries } => html! {
            ul.kv {
                @for (key, value) in entries {
                    li { b { (key) } ": " (value) }
                }
            }
        },
        Block::Chart(chart) => render_chart(chart),
        Block::Choropleth(map) => render_choropleth(map),
        Block::Form(form) => render_form(form, action),
        Block::Expander { title, blocks: inner } => html! {
            details open {
                summary { (title) }
                (blocks(inner, action))
            }
        },
    }
}

fn data_table(table: &Table) -> Markup {
    html! {
        div.data {
            table {
                thead {
                    tr {
                        @for column in table.columns() {
                            th { (column) }
                        }
                    }
                }
                tbody {
                    @for row in table.rows() {
                        tr {
                            @for value in row {
                                td class=[value.is_number().then_some("num")] { (display_value(value)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_form(form: &Form, action: &str) -> Markup {
    html! {
        form method="post" action=(action) {
            @for field in &form.fields {
                (render_field(field))
            }
            @for submit in &form.actions {
                button type="submit" name=(submit.name) value=(submit.value) { (submit.label) }
            }
        }
    }
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn render_field(field: &Field) -> Markup {
    let name = field.name.as_str();
    let control = match &field.input {
        Input::Hidden { value } => {
            return html! { input type="hidden" name=(name) value=(value); };
        }
        Input::Radio { options, selected } => {
            return html! {
                fieldset {
                    legend { (field.label) }
                    @for choice in options {
                        label {
                            input type="radio" name=(name) value=(choice) checked[choice == selected];
                            (choice)
                        }
                    }
                }
            };
        }
        Input::Text { value } => html! { input type="text" name=(name) value=(value); },
        Input::TextArea { value } => html! { textarea name=(name) { (value) } },
        Input::Number { value, min, max, step } => html! {
            input type="number"
                name=(name)
                value=(number(*value))
                step=(step.map_or_else(|| "any".to_string(), number))
                min=[min.map(number)]
                max=[max.map(number)];
        },
        Input::Select { options, selected } => html! {
            select name=(name) {
                @for choice in options {
                    option value=(choice) selected[choice == selected] { (choice) }
                }
            }
        },
        Input::MultiSelect { options, selected } => html! {
            select name=(name) multiple size=(options.len().clamp(1, 8)) {
                @for choice in options {
                    option value=(choice) selected[selected.contains(choice)] { (choice) }
                }
            }
        },
    };
    html! {
        label { (field.label) (control) }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dashboard::view::{FormAction, MetricCard};

    #[test]
    fn test_text_is_escaped() {
        let html = block(&Block::text(r#"<a href="x">Tom & Jerry</a>"#), "/session/x").into_string();
        assert_eq!(html, "<p>&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;</p>");
    }

    #[test]
    fn test_forms_post_to_session() {
        let view = View::new(
            Vec::new(),
            vec![Block::Form(
                Form::new("most_populated", "Most")
                    .action(FormAction {
                        name: "event".to_string(),
                        value: "least_populated".to_string(),
                        label: "Least".to_string(),
                    })
                    .field(Field::new(
                        "year",
                        "Year",
                        Input::Radio {
                            options: vec!["1980".to_string(), "2023".to_string()],
                            selected: "2023".to_string(),
                        },
                    )),
            )],
        );
        let html = render_page(&view, "abc");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<form method="post" action="/session/abc">"#));
        assert!(html.contains(r#"action="/session/abc/end""#));
        assert!(html.contains(r#"name="event" value="least_populated""#));
        assert!(html.contains(r#"value="2023" checked"#));
        assert!(!html.contains(r#"value="1980" checked"#));
    }

    #[test]
    fn test_number_inputs() {
        let int = render_field(&Field::new("count", "Count", Input::integer(10, Some(1), Some(250)))).into_string();
        assert!(int.contains(r#"value="10" step="1" min="1" max="250""#));

        let dec = render_field(&Field::new("growthRate", "Growth Rate", Input::decimal(-1.1, Some(-1.1), Some(1.0))))
            .into_string();
        assert!(dec.contains(r#"value="-1.1" step="any" min="-1.1" max="1""#));
    }

    #[test]
    fn test_selects_mark_chosen_options() {
        let multi = render_field(&Field::new(
            "countries",
            "Countries",
            Input::MultiSelect {
                options: vec!["India".to_string(), "China".to_string()],
                selected: vec!["China".to_string()],
            },
        ))
        .into_string();
        assert!(multi.contains(r#"<select name="countries" multiple size="2">"#));
        assert!(multi.contains(r#"<option value="China" selected>"#));
        assert!(multi.contains(r#"<option value="India">"#));
    }

    #[test]
    fn test_table_and_cards() {
        let table = Table::from_json(json!([{"country": "<script>", "pop2023": 5}])).unwrap();
        let html = blocks(
            &[
                Block::table(table),
                Block::Metrics {
                    cards: vec![MetricCard::new("Total Population", 1234567.0)],
                },
            ],
            "/session/x",
        )
        .into_string();
        assert!(html.contains("<th>country</th>"));
        assert!(html.contains("<td>&lt;script&gt;</td>"));
        assert!(html.contains(r#"<td class="num">5</td>"#));
        assert!(html.contains("1,234,567"));
    }

    #[test]
    fn test_ended_page_links_home() {
        assert!(render_ended().contains(r#"<a href="/">"#));
    }
}
