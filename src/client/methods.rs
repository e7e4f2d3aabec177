use super::models;

use crate::{error::CoffeeShopError, utils::join_url};
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::warn;

pub fn drinks_request(http_client: &Client, base_url: &str) -> Result<RequestBuilder, CoffeeShopError> {
    Ok(http_client.get(join_url(base_url, "/drinks")?))
}

pub fn drinks_detail_request(
    http_client: &Client,
    base_url: &str,
    access_token: &str,
) -> Result<RequestBuilder, CoffeeShopError> {
    Ok(http_client
        .get(join_url(base_url, "/drinks-detail")?)
        .bearer_auth(access_token))
}

pub fn create_drink_request(
    http_client: &Client,
    base_url: &str,
    access_token: &str,
    body: &models::DrinkBody,
) -> Result<RequestBuilder, CoffeeShopError> {
    Ok(http_client
        .post(join_url(base_url, "/drinks")?)
        .bearer_auth(access_token)
        .json(body))
}

pub fn update_drink_request(
    http_client: &Client,
    base_url: &str,
    access_token: &str,
    id: i64,
    body: &models::DrinkBody,
) -> Result<RequestBuilder, CoffeeShopError> {
    Ok(http_client
        .patch(join_url(base_url, &format!("/drinks/{id}"))?)
        .bearer_auth(access_token)
        .json(body))
}

pub fn delete_drink_request(
    http_client: &Client,
    base_url: &str,
    access_token: &str,
    id: i64,
) -> Result<RequestBuilder, CoffeeShopError> {
    Ok(http_client
        .delete(join_url(base_url, &format!("/drinks/{id}"))?)
        .bearer_auth(access_token))
}

/// Send a prepared request and decode the JSON reply, mapping error bodies to
/// [`CoffeeShopError::ApiError`].
pub fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CoffeeShopError> {
    read_response(request.send()?)
}

fn read_response<T: DeserializeOwned>(response: Response) -> Result<T, CoffeeShopError> {
    let status = response.status();
    let text = response.text()?;
    decode_body(status, &text)
}

pub fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, CoffeeShopError> {
    if status.is_success() {
        return Ok(serde_json::from_str(body)?);
    }

    let message = match serde_json::from_str::<models::ErrorResponse>(body) {
        Ok(error) => error.to_string(),
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };

    if status == StatusCode::UNAUTHORIZED {
        // Implicit-flow tokens cannot be refreshed from here.
        warn!("Access token was rejected ({message}), log in again");
    }

    Err(CoffeeShopError::ApiError { status, message })
}

/// The drinks list of a successful reply, or an error if the backend flagged failure.
pub fn into_drinks(response: models::DrinksResponse) -> Result<Vec<models::Drink>, CoffeeShopError> {
    if response.success {
        Ok(response.drinks)
    } else {
        Err(CoffeeShopError::ApiError {
            status: StatusCode::OK,
            message: "backend reported failure".into(),
        })
    }
}

pub fn into_deleted_id(response: models::DeleteResponse) -> Result<i64, CoffeeShopError> {
    if response.success {
        Ok(response.delete)
    } else {
        Err(CoffeeShopError::ApiError {
            status: StatusCode::OK,
            message: "backend reported failure".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{DrinkBody, DrinksResponse, Ingredient};
    use reqwest::{header::AUTHORIZATION, Method};
    use serde_json::{json, Value};

    const BASE: &str = "http://127.0.0.1:5000";

    fn body_json(request: &reqwest::blocking::Request) -> Value {
        let bytes = request.body().and_then(|body| body.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_public_drinks_request_has_no_token() {
        let client = Client::new();
        let request = drinks_request(&client, BASE).unwrap().build().unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().as_str(), "http://127.0.0.1:5000/drinks");
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_detail_request_carries_bearer_token() {
        let client = Client::new();
        let request = drinks_detail_request(&client, BASE, "a.b.c")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/drinks-detail");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer a.b.c");
    }

    #[test]
    fn test_create_and_update_requests() {
        let client = Client::new();
        let recipe = vec![Ingredient {
            name: Some("milk".into()),
            color: "white".into(),
            parts: 2,
        }];
        let body = DrinkBody {
            title: Some("milk"),
            recipe: Some(&recipe),
        };

        let create = create_drink_request(&client, BASE, "t", &body)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(create.method(), Method::POST);
        assert_eq!(create.url().as_str(), "http://127.0.0.1:5000/drinks");
        assert_eq!(
            body_json(&create),
            json!({"title": "milk", "recipe": [{"name": "milk", "color": "white", "parts": 2}]})
        );

        let rename = DrinkBody {
            title: Some("warm milk"),
            ..DrinkBody::default()
        };
        let update = update_drink_request(&client, BASE, "t", 7, &rename)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(update.method(), Method::PATCH);
        assert_eq!(update.url().as_str(), "http://127.0.0.1:5000/drinks/7");
        assert_eq!(body_json(&update), json!({"title": "warm milk"}));
    }

    #[test]
    fn test_delete_request() {
        let client = Client::new();
        let request = delete_drink_request(&client, "https://api.example.com/v1/", "t", 3)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.url().as_str(), "https://api.example.com/v1/drinks/3");
    }

    #[test]
    fn test_decode_success_body() {
        let response: DrinksResponse = decode_body(
            StatusCode::OK,
            r#"{"success": true, "drinks": [{"id": 1, "title": "water", "recipe": []}]}"#,
        )
        .unwrap();
        let drinks = into_drinks(response).unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].title, "water");

        let deleted =
            into_deleted_id(decode_body(StatusCode::OK, r#"{"success": true, "delete": 4}"#).unwrap())
                .unwrap();
        assert_eq!(deleted, 4);
    }

    #[test]
    fn test_decode_error_bodies() {
        let err = decode_body::<DrinksResponse>(
            StatusCode::NOT_FOUND,
            r#"{"success": false, "error": 404, "message": "resource not found"}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoffeeShopError::ApiError { status, ref message }
                if status == StatusCode::NOT_FOUND && message == "resource not found (404)"
        ));

        let err = decode_body::<DrinksResponse>(
            StatusCode::FORBIDDEN,
            r#"{"code": "unauthorized", "description": "Permission not found."}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoffeeShopError::ApiError { status, ref message }
                if status == StatusCode::FORBIDDEN && message == "unauthorized: Permission not found."
        ));

        let err = decode_body::<DrinksResponse>(StatusCode::BAD_GATEWAY, "").unwrap_err();
        assert!(matches!(
            err,
            CoffeeShopError::ApiError { ref message, .. } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_decode_unauthorized_keeps_status() {
        let err = decode_body::<DrinksResponse>(
            StatusCode::UNAUTHORIZED,
            r#"{"code": "token_expired", "description": "Token expired."}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoffeeShopError::ApiError { status, ref message }
                if status == StatusCode::UNAUTHORIZED && message == "token_expired: Token expired."
        ));
    }

    #[test]
    fn test_unsuccessful_flag_is_an_error() {
        let response: DrinksResponse =
            decode_body(StatusCode::OK, r#"{"success": false, "drinks": []}"#).unwrap();
        assert!(into_drinks(response).is_err());
    }
}
