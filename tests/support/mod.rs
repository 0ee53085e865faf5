//! In-process fake of the marketplace API, following the real server's
//! rules: availability windows, overlap with approved bookings, one review
//! per reservation, reviews only after the stay ends.

#![allow(dead_code)]

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use rental_scout::config::Config;
use rental_scout::models::{Id, User, UserType};
use rental_scout::session::{Session, SessionStore};
use rental_scout::views::RecordingNotifier;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    name: String,
    email: String,
    user_type: String,
}

#[derive(Debug, Clone)]
struct StoredProperty {
    id: i64,
    owner_id: i64,
    title: String,
    description: String,
    address: String,
    city: String,
    price_per_day: f64,
    available_from: NaiveDate,
    available_until: NaiveDate,
    image_url: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredReservation {
    id: String,
    property_id: i64,
    renter_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    approved: Option<bool>,
}

#[derive(Debug, Clone)]
struct StoredReview {
    reservation_id: String,
    rating: i64,
    comment: String,
}

#[derive(Debug, Default)]
struct Data {
    next_id: i64,
    users: Vec<StoredUser>,
    properties: Vec<StoredProperty>,
    reservations: Vec<StoredReservation>,
    reviews: Vec<StoredReview>,
    requests: Vec<String>,
}

impl Data {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn property_json(&self, p: &StoredProperty, with_total: bool) -> Value {
        let reservation_ids: Vec<&str> = self
            .reservations
            .iter()
            .filter(|r| r.property_id == p.id)
            .map(|r| r.id.as_str())
            .collect();
        let ratings: Vec<i64> = self
            .reviews
            .iter()
            .filter(|rv| reservation_ids.contains(&rv.reservation_id.as_str()))
            .map(|rv| rv.rating)
            .collect();
        let average = if ratings.is_empty() {
            Value::Null
        } else {
            let avg = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
            json!((avg * 10.0).round() / 10.0)
        };

        let mut value = json!({
            "id": p.id,
            "title": p.title,
            "description": p.description,
            "address": p.address,
            "price_per_day": p.price_per_day,
            "available_from": p.available_from,
            "available_until": p.available_until,
            "image_url": p.image_url,
            "average_rating": average,
        });
        if with_total {
            value["total_reservas"] = json!(reservation_ids.len());
        }
        value
    }
}

/// Handle on the running fake
#[derive(Clone, Default)]
pub struct FakeMarketplace {
    data: Arc<Mutex<Data>>,
}

impl FakeMarketplace {
    pub fn add_user(&self, name: &str, email: &str, user_type: UserType) -> Id {
        let mut data = self.data.lock().unwrap();
        let id = data.next();
        data.users.push(StoredUser {
            id,
            name: name.into(),
            email: email.into(),
            user_type: user_type.as_str().into(),
        });
        Id::Num(id)
    }

    pub fn add_property(&self, owner: &Id, title: &str, address: &str, price: f64, from: &str, until: &str) -> Id {
        let mut data = self.data.lock().unwrap();
        let id = data.next();
        data.properties.push(StoredProperty {
            id,
            owner_id: num(owner),
            title: title.into(),
            description: String::new(),
            address: address.into(),
            city: String::new(),
            price_per_day: price,
            available_from: date(from),
            available_until: date(until),
            image_url: None,
        });
        Id::Num(id)
    }

    pub fn add_reservation(&self, property: &Id, renter: &Id, start: &str, end: &str, approved: Option<bool>) -> Id {
        let mut data = self.data.lock().unwrap();
        let id = format!("res-{}", data.next());
        data.reservations.push(StoredReservation {
            id: id.clone(),
            property_id: num(property),
            renter_id: num(renter),
            start_date: date(start),
            end_date: date(end),
            approved,
        });
        Id::Text(id)
    }

    pub fn add_review(&self, reservation: &Id, rating: i64, comment: &str) {
        self.data.lock().unwrap().reviews.push(StoredReview {
            reservation_id: reservation.to_string(),
            rating,
            comment: comment.into(),
        });
    }

    pub fn approval_of(&self, reservation: &Id) -> Option<Option<bool>> {
        let key = reservation.to_string();
        self.data
            .lock()
            .unwrap()
            .reservations
            .iter()
            .find(|r| r.id == key)
            .map(|r| r.approved)
    }

    pub fn review_count(&self) -> usize {
        self.data.lock().unwrap().reviews.len()
    }

    /// `"METHOD /path"` of every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.data.lock().unwrap().requests.clone()
    }

    pub fn requests_matching(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn num(id: &Id) -> i64 {
    match id {
        Id::Num(n) => *n,
        Id::Text(s) => s.parse().unwrap(),
    }
}

fn parse_id(raw: &str) -> i64 {
    raw.parse().unwrap_or(-1)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn record(State(fake): State<FakeMarketplace>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    fake.data.lock().unwrap().requests.push(line);
    next.run(request).await
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    user_type: String,
}

async fn register(State(fake): State<FakeMarketplace>, Json(body): Json<RegisterBody>) -> Response {
    let mut data = fake.data.lock().unwrap();
    if body.name.is_empty() || body.email.is_empty() || !["locador", "locatario"].contains(&body.user_type.as_str()) {
        return error(StatusCode::BAD_REQUEST, "Dados inválidos");
    }
    if data.users.iter().any(|u| u.email == body.email) {
        return error(StatusCode::CONFLICT, "E-mail já cadastrado");
    }
    let id = data.next();
    data.users.push(StoredUser {
        id,
        name: body.name,
        email: body.email,
        user_type: body.user_type,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Usuário cadastrado com sucesso", "user_id": id })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
}

async fn login(State(fake): State<FakeMarketplace>, Json(body): Json<LoginBody>) -> Response {
    let data = fake.data.lock().unwrap();
    match data.users.iter().find(|u| u.email == body.email) {
        Some(u) => Json(json!({
            "message": "Login bem-sucedido",
            "user": { "id": u.id, "name": u.name, "email": u.email, "user_type": u.user_type }
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "Usuário não encontrado"),
    }
}

#[derive(Deserialize)]
struct EditBody {
    id: i64,
    name: String,
    email: String,
}

async fn edit(State(fake): State<FakeMarketplace>, Json(body): Json<EditBody>) -> Response {
    let mut data = fake.data.lock().unwrap();
    match data.users.iter_mut().find(|u| u.id == body.id) {
        Some(user) => {
            if !body.name.is_empty() {
                user.name = body.name;
            }
            if !body.email.is_empty() {
                user.email = body.email;
            }
            Json(json!({ "message": "Dados atualizados com sucesso" })).into_response()
        }
        None => error(StatusCode::BAD_REQUEST, "Usuário não encontrado"),
    }
}

async fn owned_properties(State(fake): State<FakeMarketplace>, Path(owner): Path<String>) -> Response {
    let data = fake.data.lock().unwrap();
    let owner = parse_id(&owner);
    let list: Vec<Value> = data
        .properties
        .iter()
        .filter(|p| p.owner_id == owner)
        .map(|p| data.property_json(p, true))
        .collect();
    Json(list).into_response()
}

#[derive(Deserialize)]
struct PropertyBody {
    title: String,
    description: String,
    address: String,
    #[serde(default)]
    city: Option<String>,
    price_per_day: f64,
    available_from: NaiveDate,
    available_until: NaiveDate,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    owner_id: Option<i64>,
}

async fn create_property(State(fake): State<FakeMarketplace>, Json(body): Json<PropertyBody>) -> Response {
    let mut data = fake.data.lock().unwrap();
    let Some(owner_id) = body.owner_id else {
        return error(StatusCode::BAD_REQUEST, "owner_id é obrigatório");
    };
    let id = data.next();
    data.properties.push(StoredProperty {
        id,
        owner_id,
        title: body.title,
        description: body.description,
        address: body.address,
        city: body.city.unwrap_or_default(),
        price_per_day: body.price_per_day,
        available_from: body.available_from,
        available_until: body.available_until,
        image_url: body.image_url,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Imóvel cadastrado", "property_id": id })),
    )
        .into_response()
}

async fn update_property(
    State(fake): State<FakeMarketplace>,
    Path(id): Path<String>,
    Json(body): Json<PropertyBody>,
) -> Response {
    let mut data = fake.data.lock().unwrap();
    let id = parse_id(&id);
    match data.properties.iter_mut().find(|p| p.id == id) {
        Some(p) => {
            p.title = body.title;
            p.description = body.description;
            p.address = body.address;
            p.price_per_day = body.price_per_day;
            p.available_from = body.available_from;
            p.available_until = body.available_until;
            p.image_url = body.image_url;
            Json(json!({ "message": "Imóvel atualizado" })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Imóvel não encontrado"),
    }
}

async fn delete_property(State(fake): State<FakeMarketplace>, Path(id): Path<String>) -> Response {
    let mut data = fake.data.lock().unwrap();
    let id = parse_id(&id);
    let before = data.properties.len();
    data.properties.retain(|p| p.id != id);
    if data.properties.len() < before {
        Json(json!({ "message": "Imóvel removido" })).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Imóvel não encontrado")
    }
}

async fn received_reservations(State(fake): State<FakeMarketplace>, Path(owner): Path<String>) -> Response {
    let data = fake.data.lock().unwrap();
    let owner = parse_id(&owner);
    let owned: Vec<i64> = data
        .properties
        .iter()
        .filter(|p| p.owner_id == owner)
        .map(|p| p.id)
        .collect();
    let list: Vec<Value> = data
        .reservations
        .iter()
        .filter(|r| owned.contains(&r.property_id))
        .map(|r| {
            let renter = data.users.iter().find(|u| u.id == r.renter_id);
            json!({
                "reservation_id": r.id,
                "property_id": r.property_id,
                "renter_name": renter.map(|u| u.name.as_str()).unwrap_or("Unknown"),
                "start_date": r.start_date,
                "end_date": r.end_date,
                "approved": r.approved,
            })
        })
        .collect();
    Json(list).into_response()
}

#[derive(Deserialize)]
struct ApprovalBody {
    approved: bool,
}

async fn set_approval(
    State(fake): State<FakeMarketplace>,
    Path(id): Path<String>,
    Json(body): Json<ApprovalBody>,
) -> Response {
    let mut data = fake.data.lock().unwrap();
    match data.reservations.iter_mut().find(|r| r.id == id) {
        Some(r) => {
            r.approved = Some(body.approved);
            Json(json!({ "message": "Reserva atualizada" })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Reserva não encontrada"),
    }
}

async fn search(State(fake): State<FakeMarketplace>, Query(params): Query<HashMap<String, String>>) -> Response {
    let data = fake.data.lock().unwrap();
    let city = params.get("city").cloned().unwrap_or_default().to_lowercase();
    let min: f64 = params.get("min_price").and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let max: f64 = params.get("max_price").and_then(|v| v.parse().ok()).unwrap_or(1e9);
    let start = params.get("start_date").filter(|v| !v.is_empty()).map(|v| date(v));
    let end = params.get("end_date").filter(|v| !v.is_empty()).map(|v| date(v));

    let list: Vec<Value> = data
        .properties
        .iter()
        .filter(|p| min <= p.price_per_day && p.price_per_day <= max)
        .filter(|p| {
            city.is_empty()
                || p.address.to_lowercase().contains(&city)
                || p.city.to_lowercase().contains(&city)
        })
        .filter(|p| match (start, end) {
            (Some(s), Some(e)) => s >= p.available_from && e <= p.available_until,
            _ => true,
        })
        .map(|p| data.property_json(p, false))
        .collect();
    Json(list).into_response()
}

#[derive(Deserialize)]
struct ReserveBody {
    property_id: i64,
    renter_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn reserve(State(fake): State<FakeMarketplace>, Json(body): Json<ReserveBody>) -> Response {
    let mut data = fake.data.lock().unwrap();
    let property = data.properties.iter().find(|p| p.id == body.property_id).cloned();
    let renter_ok = data
        .users
        .iter()
        .any(|u| u.id == body.renter_id && u.user_type == "locatario");
    let Some(property) = property.filter(|_| renter_ok) else {
        return error(StatusCode::BAD_REQUEST, "Dados inválidos");
    };
    if body.start_date < property.available_from || body.end_date > property.available_until {
        return error(StatusCode::BAD_REQUEST, "Datas fora do período disponível");
    }
    let overlaps = data.reservations.iter().any(|r| {
        r.property_id == property.id
            && r.approved == Some(true)
            && body.start_date <= r.end_date
            && r.start_date <= body.end_date
    });
    if overlaps {
        return error(StatusCode::CONFLICT, "Já existe uma reserva nesse período");
    }

    let id = format!("res-{}", data.next());
    data.reservations.push(StoredReservation {
        id: id.clone(),
        property_id: body.property_id,
        renter_id: body.renter_id,
        start_date: body.start_date,
        end_date: body.end_date,
        approved: None,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Reserva solicitada com sucesso", "reservation_id": id })),
    )
        .into_response()
}

async fn my_reservations(State(fake): State<FakeMarketplace>, Path(renter): Path<String>) -> Response {
    let data = fake.data.lock().unwrap();
    let renter = parse_id(&renter);
    if !data.users.iter().any(|u| u.id == renter && u.user_type == "locatario") {
        return error(StatusCode::FORBIDDEN, "Usuário inválido");
    }
    let list: Vec<Value> = data
        .reservations
        .iter()
        .filter(|r| r.renter_id == renter)
        .map(|r| {
            let property = data.properties.iter().find(|p| p.id == r.property_id);
            let review = data
                .reviews
                .iter()
                .find(|rv| rv.reservation_id == r.id)
                .map(|rv| json!({ "reservation_id": rv.reservation_id, "rating": rv.rating, "comment": rv.comment }));
            json!({
                "reservation_id": r.id,
                "property_id": r.property_id,
                "property_title": property.map(|p| p.title.as_str()).unwrap_or("Desconhecido"),
                "start_date": r.start_date,
                "end_date": r.end_date,
                "approved": r.approved,
                "image_url": property.and_then(|p| p.image_url.clone()),
                "review": review,
            })
        })
        .collect();
    Json(list).into_response()
}

#[derive(Deserialize)]
struct ReviewBody {
    reservation_id: String,
    rating: i64,
    comment: String,
}

async fn review(State(fake): State<FakeMarketplace>, Json(body): Json<ReviewBody>) -> Response {
    let mut data = fake.data.lock().unwrap();
    if !(1..=5).contains(&body.rating) {
        return error(StatusCode::BAD_REQUEST, "Nota deve ser entre 1 e 5");
    }
    let Some(reservation) = data.reservations.iter().find(|r| r.id == body.reservation_id) else {
        return error(StatusCode::NOT_FOUND, "Reserva não encontrada");
    };
    if reservation.end_date > Utc::now().date_naive() {
        return error(StatusCode::BAD_REQUEST, "Só é possível avaliar após o fim da reserva");
    }
    if data.reviews.iter().any(|rv| rv.reservation_id == body.reservation_id) {
        return error(StatusCode::BAD_REQUEST, "Reserva já foi avaliada");
    }
    data.reviews.push(StoredReview {
        reservation_id: body.reservation_id,
        rating: body.rating,
        comment: body.comment,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Avaliação registrada com sucesso" })),
    )
        .into_response()
}

async fn property_reviews(State(fake): State<FakeMarketplace>, Path(property): Path<String>) -> Response {
    let data = fake.data.lock().unwrap();
    let property = parse_id(&property);
    let list: Vec<Value> = data
        .reservations
        .iter()
        .filter(|r| r.property_id == property)
        .filter_map(|r| {
            let review = data.reviews.iter().find(|rv| rv.reservation_id == r.id)?;
            let renter = data.users.iter().find(|u| u.id == r.renter_id);
            Some(json!({
                "rating": review.rating,
                "comment": review.comment,
                "renter_name": renter.map(|u| u.name.as_str()).unwrap_or("Anônimo"),
            }))
        })
        .collect();
    Json(list).into_response()
}

fn router(fake: FakeMarketplace) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/edit", put(edit))
        .route("/locador/properties", post(create_property))
        .route("/locador/properties/:owner_id", get(owned_properties))
        .route("/locador/property/:id", put(update_property).delete(delete_property))
        .route("/locador/reservations/:owner_id", get(received_reservations))
        .route("/locador/reservation/:id", put(set_approval))
        .route("/locatario/search", get(search))
        .route("/locatario/reserve", post(reserve))
        .route("/locatario/my-reservations/:renter_id", get(my_reservations))
        .route("/locatario/review", post(review))
        .route("/locatario/property/:id/reviews", get(property_reviews));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(fake.clone(), record))
        .with_state(fake)
}

/// Fake server plus a client configuration pointing at it
pub struct Harness {
    pub fake: FakeMarketplace,
    pub config: Config,
    pub notifier: Arc<RecordingNotifier>,
    _dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        let fake = FakeMarketplace::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(fake.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_url: format!("http://{}/api", addr),
            session_file: dir.path().join("session.json"),
            ..Config::default()
        };

        Self {
            fake,
            config,
            notifier: Arc::new(RecordingNotifier::default()),
            _dir: dir,
        }
    }

    pub fn api(&self) -> rental_scout::api::HttpApi {
        rental_scout::api::HttpApi::from_config(&self.config).unwrap()
    }

    pub fn store(&self) -> SessionStore {
        SessionStore::at_path(&self.config.session_file)
    }

    /// Persist `user` as the session record, as a prior login would
    pub fn session_for(&self, id: &Id, name: &str, email: &str, user_type: UserType) -> Session {
        self.store()
            .save(&User {
                id: id.clone(),
                name: name.into(),
                email: email.into(),
                user_type,
                extra: Default::default(),
            })
            .unwrap();
        Session::open(self.store())
    }
}
