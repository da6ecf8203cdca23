//! API client against a local mock of the population API.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use population_dashboard::dashboard::country::{Country, CountryForm};
use population_dashboard::dashboard::{HttpPopulationApi, PopulationApi, PopulationYear};
use serde_json::{json, Value};

type Log = Arc<Mutex<Vec<String>>>;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn record(log: &Log, entry: String) {
    log.lock().unwrap().push(entry);
}

fn mock_api(log: Log) -> Router {
    Router::new()
        .route(
            "/insert_country/",
            post(|State(log): State<Log>, Json(body): Json<Value>| async move {
                record(&log, format!("insert {body}"));
                Json(json!({"message": "Country inserted", "id": "65a1"}))
            }),
        )
        .route(
            "/update_country/:id",
            put(|State(log): State<Log>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                record(&log, format!("update {id} {}", body["country"]));
                Json(json!({"message": "Country updated"}))
            }),
        )
        .route(
            "/delete_country/:id",
            delete(|State(log): State<Log>, Path(id): Path<String>| async move {
                record(&log, format!("delete {id}"));
                Json(json!({"message": "Country deleted"}))
            }),
        )
        .route(
            "/countries_info/",
            get(|| async {
                Json(json!([
                    {"country": "India", "area": 3287590, "landAreaKm": null, "netChange": "11454490",
                     "growthRate": 0.0081, "worldPercentage": 0.1785, "density": 480, "pop2023": 1428627663},
                    {"country": "China", "area": 9706961, "landAreaKm": null, "netChange": -215985,
                     "growthRate": -0.0002, "worldPercentage": 0.1781, "density": 151.2, "pop2023": 1425671352},
                    {"country": "Tuvalu", "area": 26, "landAreaKm": null, "netChange": 86,
                     "growthRate": 0.0076, "worldPercentage": 0.0, "density": "431.5", "pop2023": 11396}
                ]))
            }),
        )
        .route(
            "/countries_density/:min/:max",
            get(
                |State(log): State<Log>, Path((min, max)): Path<(String, String)>| async move {
                    record(&log, format!("density {min} {max}"));
                    if min == "0.0" && max == "0.0" {
                        Json(json!([]))
                    } else {
                        Json(json!([{"country": "Tuvalu", "density": 431.5}]))
                    }
                },
            ),
        )
        .route(
            "/country/:name",
            get(|State(log): State<Log>, Path(name): Path<String>| async move {
                record(&log, format!("country {name}"));
                Json(json!([{"country": name, "rank": 1}]))
            }),
        )
        .route(
            "/custom_find/:query",
            get(|State(log): State<Log>, Path(query): Path<String>| async move {
                record(&log, format!("find {query}"));
                Json(json!([{"country": "India"}, {"country": "China"}]))
            }),
        )
        .route(
            "/countries_pop/",
            get(|| async {
                Json(json!({
                    "country": ["India", "China"],
                    "pop2000": [1059633675, 1264099069],
                    "pop2010": [1240613620, 1348191368],
                    "pop2023": [1428627663, 1425671352]
                }))
            }),
        )
        .route("/average_pop/", get(|| async { "<html>maintenance</html>" }))
        .route(
            "/nb_countries_supavg/:year",
            get(|Path(year): Path<u16>| async move { Json(json!({"year": year, "count": 42})) }),
        )
        .with_state(log)
}

async fn client() -> (HttpPopulationApi, Log) {
    let log = Log::default();
    let url = spawn(mock_api(log.clone())).await;
    (HttpPopulationApi::new(&url).unwrap(), log)
}

fn sample_country() -> Country {
    CountryForm {
        country: "Atlantis".to_string(),
        rank: 42,
        pop2023: 12,
        ..Default::default()
    }
    .into_country()
    .unwrap()
}

/// Every operation, each reporting whether it produced a result.
async fn call_everything(api: &HttpPopulationApi) -> Vec<(&'static str, bool)> {
    let country = sample_country();
    let y = PopulationYear::Y2023;
    vec![
        ("insert", api.insert_country(&country).await.is_some()),
        ("update", api.update_country("65a1", &country).await.is_some()),
        ("delete", api.delete_country("65a1").await.is_some()),
        ("countries", api.countries().await.is_some()),
        ("density", api.countries_by_density(1.0, 2.0).await.is_some()),
        ("most", api.most_populated(y).await.is_some()),
        ("least", api.least_populated(y).await.is_some()),
        ("population", api.countries_population().await.is_some()),
        ("country", api.country_by_name("India").await.is_some()),
        ("average", api.world_average().await.is_some()),
        ("area", api.countries_by_area(10.0, 20.0).await.is_some()),
        ("aggregation", api.custom_aggregation("[]").await.is_some()),
        ("find", api.custom_find("{}").await.is_some()),
        ("distinct", api.custom_distinct("country").await.is_some()),
        ("above", api.count_above_average(y).await.is_some()),
        ("below", api.count_below_average(y).await.is_some()),
    ]
}

#[tokio::test]
async fn test_non_200_is_none_everywhere() {
    for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR, StatusCode::CREATED] {
        let app = Router::new().fallback(move || async move { (status, Json(json!([{"country": "x"}]))).into_response() });
        let api = HttpPopulationApi::new(&spawn(app).await).unwrap();
        for (name, produced) in call_everything(&api).await {
            assert!(!produced, "{name} produced a result for status {status}");
        }
    }
}

#[tokio::test]
async fn test_unreachable_api_is_none() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpPopulationApi::new(&format!("http://{addr}")).unwrap();
    assert!(api.countries().await.is_none());
    assert!(api.delete_country("65a1").await.is_none());
}

#[tokio::test]
async fn test_countries_coerces_float_columns() {
    let (api, _) = client().await;
    let table = api.countries().await.unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.cell(0, "area").unwrap(), &json!(3287590.0));
    assert_eq!(table.cell(0, "netChange").unwrap(), &json!(11454490.0));
    assert_eq!(table.cell(2, "density").unwrap(), &json!(431.5));
    // all-null column is left alone
    assert_eq!(table.cell(1, "landAreaKm").unwrap(), &Value::Null);
    // other columns are not touched
    assert_eq!(table.cell(0, "pop2023").unwrap(), &json!(1428627663));
}

#[tokio::test]
async fn test_column_oriented_answer() {
    let (api, _) = client().await;
    let table = api.countries_population().await.unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.columns(), ["country", "pop2000", "pop2010", "pop2023"]);
}

#[tokio::test]
async fn test_undecodable_body_is_none() {
    let (api, _) = client().await;
    assert!(api.world_average().await.is_none());
}

#[tokio::test]
async fn test_zero_density_range_is_sent() {
    let (api, log) = client().await;
    let table = api.countries_by_density(0.0, 0.0).await.unwrap();
    assert!(table.is_empty());
    assert_eq!(log.lock().unwrap().as_slice(), ["density 0.0 0.0"]);
}

#[tokio::test]
async fn test_insert_sends_normalised_record() {
    let (api, log) = client().await;
    let ack = api.insert_country(&sample_country()).await.unwrap();
    assert_eq!(ack["message"], "Country inserted");

    let entries = log.lock().unwrap().clone();
    let body: Value = serde_json::from_str(entries[0].strip_prefix("insert ").unwrap()).unwrap();
    assert_eq!(body["country"], "Atlantis");
    assert_eq!(body["area"], json!(0.0));
    assert_eq!(body["growthRate"], json!(0.0));
    assert_eq!(body["landAreaKm"], json!(0.0));
    assert_eq!(body["pop2023"], json!(12));
    assert_eq!(body.as_object().unwrap().len(), 19);
}

#[tokio::test]
async fn test_update_and_delete_address_the_id() {
    let (api, log) = client().await;
    assert!(api.update_country("65a1", &sample_country()).await.is_some());
    assert!(api.delete_country("65a1").await.is_some());
    assert_eq!(
        log.lock().unwrap().as_slice(),
        ["update 65a1 \"Atlantis\"", "delete 65a1"]
    );
}

#[tokio::test]
async fn test_path_parameters_are_single_segments() {
    let (api, log) = client().await;
    let query = r#"{"country": {"$in": ["Guinea-Bissau", "Trinidad/Tobago"]}}"#;
    let table = api.custom_find(query).await.unwrap();
    assert_eq!(table.len(), 2);

    let table = api.country_by_name("Côte d'Ivoire").await.unwrap();
    assert_eq!(table.cell(0, "country").unwrap(), "Côte d'Ivoire");

    assert_eq!(
        log.lock().unwrap().as_slice(),
        [format!("find {query}"), "country Côte d'Ivoire".to_string()]
    );
}

#[tokio::test]
async fn test_count_summary_returned_as_is() {
    let (api, _) = client().await;
    let summary = api.count_above_average(PopulationYear::Y2010).await.unwrap();
    assert_eq!(summary, json!({"year": 2010, "count": 42}));
}
