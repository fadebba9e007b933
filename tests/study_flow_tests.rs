// tests/study_flow_tests.rs
//
// End-to-end flow against a real Postgres. Skipped when DATABASE_URL is not set.

use concurso_backend::{
    config::Config, models::user::ROLE_ADMIN, routes, state::AppState, utils::hash::hash_password,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

struct TestApp {
    address: String,
    pool: PgPool,
    client: Client,
}

async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some("flow_test_secret".to_string()),
        "JWT_EXPIRATION" => Some("600".to_string()),
        "RUST_LOG" => Some("error".to_string()),
        _ => None,
    })
    .expect("test config");

    let app = routes::create_router(AppState {
        pool: pool.clone(),
        config,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: Client::new(),
    })
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn seed_admin(&self) -> String {
        let username = unique("adm");
        sqlx::query(
            "INSERT INTO users (username, email, password, role, is_active) VALUES ($1, $2, $3, $4, TRUE)",
        )
        .bind(&username)
        .bind(format!("{}@localhost", username))
        .bind(hash_password("admin123").unwrap())
        .bind(ROLE_ADMIN)
        .execute(&self.pool)
        .await
        .unwrap();
        username
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Login failed")
    }

    async fn token(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> reqwest::Response {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await.expect("request failed")
    }
}

#[tokio::test]
async fn study_flow_from_registration_to_simulado() {
    let Some(app) = spawn_app().await else {
        return;
    };

    // 1. Registration leaves the account pending
    let admin_name = app.seed_admin().await;
    let username = unique("u");
    let password = "password123";

    let register = app
        .client
        .post(app.url("/api/register/"))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": password
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(register.status(), StatusCode::CREATED);
    let registered: Value = register.json().await.unwrap();
    assert_eq!(registered["is_active"], false);
    assert!(registered.get("password").is_none());
    let user_id = registered["id"].as_i64().unwrap();

    let duplicate = app
        .client
        .post(app.url("/api/register/"))
        .json(&json!({
            "username": username,
            "email": format!("other_{}@example.com", username),
            "password": password
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    assert_eq!(app.login(&username, password).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.login(&username, "wrong").await.status(), StatusCode::UNAUTHORIZED);

    // 2. Admin approves, user logs in by email
    let admin = app.token(&admin_name, "admin123").await;
    let approve = app
        .send(reqwest::Method::PATCH, &format!("/api/users/{}/approve", user_id), &admin, None)
        .await;
    assert_eq!(approve.status(), StatusCode::OK);
    let user = app.token(&format!("{}@example.com", username), password).await;

    // 3. Admin creates questions in a subject nobody else uses
    let materia = unique("Materia");
    let mut question_ids = Vec::new();
    for i in 0..3 {
        let created = app
            .send(
                reqwest::Method::POST,
                "/api/questions/",
                &admin,
                Some(json!({
                    "enunciado": format!("<p>Questão {}</p>", i),
                    "item_a": "Alfa", "item_b": "Beta", "item_c": "Gama",
                    "item_d": "Delta", "item_e": "Épsilon",
                    "materia": materia,
                    "assunto": "Assunto único",
                    "banca": "FGV",
                    "ano": 2024,
                    "gabarito": "A"
                })),
            )
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let body: Value = created.json().await.unwrap();
        assert_eq!(body["correta"], 0);
        question_ids.push(body["id"].as_i64().unwrap());
    }

    let forbidden = app
        .send(reqwest::Method::DELETE, &format!("/api/questions/{}", question_ids[0]), &user, None)
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let question = app
        .send(reqwest::Method::GET, &format!("/api/questions/{}", question_ids[0]), &user, None)
        .await;
    assert_eq!(question.status(), StatusCode::OK);
    let question: Value = question.json().await.unwrap();
    assert_eq!(question["alternativas"].as_array().unwrap().len(), 5);
    assert_eq!(question["is_favorited"], false);

    // 4. Notebook progress drives the stats
    let notebook = app
        .send(
            reqwest::Method::POST,
            "/api/notebooks/",
            &user,
            Some(json!({"nome": "Meu caderno", "questoes_ids": question_ids})),
        )
        .await;
    assert_eq!(notebook.status(), StatusCode::CREATED);
    let notebook_id = notebook.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let mut respostas = serde_json::Map::new();
    respostas.insert(question_ids[0].to_string(), json!(0));
    respostas.insert(question_ids[1].to_string(), json!(2));
    let saved = app
        .send(
            reqwest::Method::PATCH,
            &format!("/api/notebooks/{}/progress", notebook_id),
            &user,
            Some(json!({"index": 2, "respostas": respostas})),
        )
        .await;
    assert_eq!(saved.status(), StatusCode::OK);

    let notebooks: Value = app
        .send(reqwest::Method::GET, "/api/notebooks/", &user, None)
        .await
        .json()
        .await
        .unwrap();
    let overview = notebooks
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == notebook_id)
        .unwrap();
    assert_eq!(overview["total_questoes"], 3);
    assert_eq!(overview["respondidas"], 2);
    assert_eq!(overview["acertos"], 1);

    let stats: Value = app
        .send(reqwest::Method::GET, "/api/users/me/stats", &user, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_questoes_resolvidas"], 2);

    let wrong: Value = app
        .send(reqwest::Method::GET, "/api/users/me/wrong-questions", &user, None)
        .await
        .json()
        .await
        .unwrap();
    let wrong = wrong.as_array().unwrap();
    assert_eq!(wrong.len(), 1);
    assert_eq!(wrong[0]["question_id"], question_ids[1]);

    // 5. Comment voting
    let comment = app
        .send(
            reqwest::Method::POST,
            &format!("/api/questions/{}/comments", question_ids[0]),
            &user,
            Some(json!({"content": "<script>x</script>Dica: leia o enunciado."})),
        )
        .await;
    assert_eq!(comment.status(), StatusCode::CREATED);
    let comment: Value = comment.json().await.unwrap();
    assert_eq!(comment["points"], 1);
    assert!(!comment["content"].as_str().unwrap().contains("script"));
    let comment_id = comment["id"].as_i64().unwrap();

    let own_vote = app
        .send(
            reqwest::Method::PATCH,
            &format!("/api/questions/comments/{}/vote?type=upvote", comment_id),
            &user,
            None,
        )
        .await;
    assert_eq!(own_vote.status(), StatusCode::FORBIDDEN);

    let vote_path = format!("/api/questions/comments/{}/vote?type=upvote", comment_id);
    let first: Value = app
        .send(reqwest::Method::PATCH, &vote_path, &admin, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["points"], 2);
    assert_eq!(first["voted_by_me"], "upvote");

    let toggled: Value = app
        .send(reqwest::Method::PATCH, &vote_path, &admin, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(toggled["points"], 1);
    assert!(toggled["voted_by_me"].is_null());

    // 6. Simulado: generate, submit, refuse resubmission
    let generated = app
        .send(
            reqwest::Method::POST,
            "/api/simulados/generate/",
            &user,
            Some(json!({
                "tempo_limite_minutos": 30,
                "materias_config": [{
                    "materia": materia,
                    "quantidade_total": 3,
                    "assuntos": []
                }]
            })),
        )
        .await;
    assert_eq!(generated.status(), StatusCode::CREATED);
    let generated: Value = generated.json().await.unwrap();
    let simulado_id = generated["id"].as_i64().unwrap();
    assert_eq!(generated["questoes"].as_array().unwrap().len(), 3);

    let answers: Vec<Value> = question_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            // the last question is left unanswered
            let selected = if i == 2 { -1 } else { 0 };
            json!({"question_id": id, "selected_alternative_id": selected})
        })
        .collect();

    let submit_path = format!("/api/simulados/submit/{}", simulado_id);
    let body = json!({"answers": answers, "time_taken_seconds": 600});
    let result = app
        .send(reqwest::Method::POST, &submit_path, &user, Some(body.clone()))
        .await;
    assert_eq!(result.status(), StatusCode::OK);
    let result: Value = result.json().await.unwrap();
    assert_eq!(result["acertos_total"], 2);
    assert_eq!(result["erros_total"], 1);
    assert_eq!(result["tempo_utilizado"], 600);
    assert_eq!(result["feedback_questoes"].as_array().unwrap().len(), 3);

    let again = app
        .send(reqwest::Method::POST, &submit_path, &user, Some(body))
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let too_many = app
        .send(
            reqwest::Method::POST,
            "/api/simulados/generate/",
            &user,
            Some(json!({
                "tempo_limite_minutos": 30,
                "materias_config": [{"materia": materia, "quantidade_total": 4}]
            })),
        )
        .await;
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
}
