use crate::dashboard::client::PopulationApi;
use crate::dashboard::event::{Event, QueryKind};
use crate::dashboard::session::SessionState;
use crate::dashboard::view::{Block, Field, Form, Input};

use super::{fetched, PageBlocks};

fn title(kind: QueryKind) -> &'static str {
    match kind {
        QueryKind::Aggregation => "Custom aggregation request",
        QueryKind::Find => "Custom find request",
        QueryKind::Distinct => "Custom distinct request",
    }
}

/// Free-text queries, passed to the API as typed.
pub(super) async fn render<A: PopulationApi>(api: &A, state: &SessionState, event: &Event) -> PageBlocks {
    let mut main = vec![Block::header("Personalized Requests")];

    for (i, kind) in QueryKind::ALL.into_iter().enumerate() {
        if i > 0 {
            main.push(Block::Divider);
        }
        main.push(Block::subheader(title(kind)));
        let form = Form::new("custom_query", "Search")
            .field(Field::hidden("kind", kind.slug()))
            .field(Field::new(
                "query",
                "Query",
                Input::TextArea {
                    value: state.inputs.query(kind).to_string(),
                },
            ));
        main.push(Block::Form(form));

        if let Event::CustomQuery { kind: submitted, query } = event {
            if *submitted == kind {
                let table = match kind {
                    QueryKind::Aggregation => api.custom_aggregation(query).await,
                    QueryKind::Find => api.custom_find(query).await,
                    QueryKind::Distinct => api.custom_distinct(query).await,
                };
                main.extend(fetched(table));
            }
        }
    }

    PageBlocks {
        sidebar: Vec::new(),
        main,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::dashboard::event::{Event, QueryKind};
    use crate::dashboard::pages::render;
    use crate::dashboard::pages::testing::{started, StubApi};
    use crate::dashboard::session::Page;
    use crate::dashboard::view::{Input, MessageLevel};

    #[tokio::test]
    async fn test_query_passed_verbatim() {
        let api = StubApi::with_rows(json!([{"_id": "Asia"}, {"_id": "Europe"}]));
        let state = started(&api, Page::Personalized).await;
        let query = r#"[{"$group": {"_id": "$continent"}}] / ?x=1"#;
        let (_, view) = render(
            &api,
            state,
            Event::CustomQuery {
                kind: QueryKind::Aggregation,
                query: query.to_string(),
            },
        )
        .await;
        assert!(api.calls().contains(&format!("aggregation {query}")));
        assert_eq!(view.tables()[0].len(), 2);

        let echoed = view
            .forms()
            .into_iter()
            .filter_map(|f| f.fields.iter().find(|f| f.name == "query"))
            .map(|f| match &f.input {
                Input::TextArea { value } => value.clone(),
                _ => String::new(),
            })
            .collect::<Vec<_>>();
        assert_eq!(echoed, [query.to_string(), String::new(), String::new()]);
    }

    #[tokio::test]
    async fn test_failure_reported_under_its_panel() {
        let api = StubApi::failing();
        let state = started(&api, Page::Personalized).await;
        let (_, view) = render(
            &api,
            state,
            Event::CustomQuery {
                kind: QueryKind::Distinct,
                query: "continent".to_string(),
            },
        )
        .await;
        assert!(api.calls().contains(&"distinct continent".to_string()));
        assert_eq!(view.messages(MessageLevel::Error), ["Error when recovering data!"]);
    }
}
